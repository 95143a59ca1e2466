pub mod batch;
pub mod orbit;
pub mod point;
pub mod scene;
