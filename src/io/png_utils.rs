// Copyright @yucwang 2026

use crate::core::image::ImageSink;
use crate::io::image_writer::ImageWriteError;
use crate::math::constants::Float;

use image::{ ImageBuffer, Rgba };

/// Clamps to `[0, 1]` and scales to a byte.
pub fn float_to_byte(value: Float) -> u8 {
    let v = if value.is_nan() { 0.0 } else { value.max(0.0).min(1.0) };
    (v * 255.0) as u8
}

pub fn to_rgba8<I: ImageSink + ?Sized>(image: &I) -> ImageBuffer<Rgba<u8>, Vec<u8>> {
    ImageBuffer::from_fn(image.width() as u32, image.height() as u32, |x, y| {
        let pixel = image.get_pixel(x as usize, y as usize);
        Rgba([float_to_byte(pixel[0]),
              float_to_byte(pixel[1]),
              float_to_byte(pixel[2]),
              float_to_byte(pixel[3])])
    })
}

pub fn write_png_to_file<I: ImageSink + ?Sized>(image: &I, file_path: &str) -> Result<(), ImageWriteError> {
    log::info!("Starting writing png image: {}.", file_path);
    to_rgba8(image).save(file_path)?;
    log::info!("PNG written to: {}.", file_path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{ float_to_byte, to_rgba8 };
    use crate::core::image::ImageSink;
    use crate::math::bitmap::Bitmap;
    use crate::math::constants::Vector4f;

    #[test]
    fn test_float_to_byte_clamps() {
        assert_eq!(float_to_byte(-3.0), 0);
        assert_eq!(float_to_byte(0.0), 0);
        assert_eq!(float_to_byte(0.5), 127);
        assert_eq!(float_to_byte(1.0), 255);
        assert_eq!(float_to_byte(40.0), 255);
        assert_eq!(float_to_byte(std::f32::NAN), 0);
    }

    #[test]
    fn test_rgba8_layout() {
        let mut bitmap = Bitmap::new(3, 2);
        bitmap.set_pixel(2, 1, &Vector4f::new(1.0, 0.0, 2.0, 1.0));
        let buffer = to_rgba8(&bitmap);
        assert_eq!(buffer.dimensions(), (3, 2));
        assert_eq!(buffer.get_pixel(2, 1).0, [255, 0, 255, 255]);
        assert_eq!(buffer.get_pixel(0, 0).0, [0, 0, 0, 0]);
    }
}
