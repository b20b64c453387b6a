pub mod courses;
pub mod directory;
pub mod sessions;
