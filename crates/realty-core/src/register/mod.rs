pub mod analysis;
pub mod store;
