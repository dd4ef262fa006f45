pub mod host;
pub mod interface;
pub mod probe;
pub mod subnet;
