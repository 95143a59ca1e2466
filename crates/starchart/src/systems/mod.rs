pub mod galaxy_map;
pub mod system_map;
