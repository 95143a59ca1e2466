pub mod layer;
pub mod shape;
