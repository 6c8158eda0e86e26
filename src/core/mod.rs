pub mod cache;
pub mod frame;
