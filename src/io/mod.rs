// Copyright @yucwang 2021

pub mod exr_utils;
pub mod image_writer;
pub mod obj_utils;
pub mod png_utils;
pub mod settings;
