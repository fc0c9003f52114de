pub mod handle;
pub mod monitor;
pub mod store;
