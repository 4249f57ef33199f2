// Copyright @yucwang 2026

use crate::core::image::ImageSink;
use crate::io::exr_utils::write_exr_to_file;
use crate::io::png_utils::write_png_to_file;

use std::fmt;
use std::path::Path;

#[derive(Debug)]
pub enum ImageWriteError {
    Exr(exr::error::Error),
    Png(image::ImageError),
    UnknownFormat(String),
}

impl From<exr::error::Error> for ImageWriteError {
    fn from(err: exr::error::Error) -> Self {
        ImageWriteError::Exr(err)
    }
}

impl From<image::ImageError> for ImageWriteError {
    fn from(err: image::ImageError) -> Self {
        ImageWriteError::Png(err)
    }
}

impl fmt::Display for ImageWriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageWriteError::Exr(err) => write!(f, "exr error: {}", err),
            ImageWriteError::Png(err) => write!(f, "png error: {}", err),
            ImageWriteError::UnknownFormat(ext) => write!(f, "unknown image format: {}", ext),
        }
    }
}

impl std::error::Error for ImageWriteError {}

/// Picks the encoder from the file extension (`.png` or `.exr`).
pub fn write_image<I: ImageSink + ?Sized>(image: &I, file_path: &str) -> Result<(), ImageWriteError> {
    let extension = Path::new(file_path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "png" => write_png_to_file(image, file_path),
        "exr" => write_exr_to_file(image, file_path),
        _ => Err(ImageWriteError::UnknownFormat(extension)),
    }
}
