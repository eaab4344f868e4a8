pub mod resources;
pub mod summary;
