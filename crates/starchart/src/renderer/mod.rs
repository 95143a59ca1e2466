pub mod view;
pub mod viewport;

// Re-export key types for convenient access
pub use view::{MapView, ToggleButton};
pub use viewport::Viewport;
