/* Copyright 2020 @TwoCookingMice */

use crate::core::image::ImageSink;
use crate::io::image_writer::ImageWriteError;

use exr::prelude::write_rgba_file;

// Write EXR Image to file
pub fn write_exr_to_file<I: ImageSink + ?Sized>(image: &I, file_path: &str) -> Result<(), ImageWriteError> {
    log::info!("Starting writing openexr images: {}.", file_path);

    write_rgba_file(file_path, image.width(), image.height(), |x, y| {
        let pixel = image.get_pixel(x, y);
        (pixel[0], pixel[1], pixel[2], pixel[3])
    })?;

    log::info!("EXR written to: {}.", file_path);
    Ok(())
}
