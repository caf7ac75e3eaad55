pub mod project;
pub mod version;
