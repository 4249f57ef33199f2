// Copyright @yucwang 2023

pub mod diffuse;
pub mod white_light;
