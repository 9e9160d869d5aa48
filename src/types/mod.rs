//! Core types: typed vector spaces, transforms, and image-plane geometry

pub mod geometry;
pub mod spaces;
pub mod transforms;
