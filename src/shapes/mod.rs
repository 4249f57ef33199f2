pub mod cube;
pub mod rectangle;
pub mod sphere;
pub mod triangle;
