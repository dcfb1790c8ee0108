pub mod api;
pub mod local;
pub mod memory;

pub use api::{CacheAPI, MapAPI};
