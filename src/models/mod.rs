// Data models for storage API responses

pub mod object;

pub use object::{index_by_name, ObjectEntry};
