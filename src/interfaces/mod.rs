pub mod engines;
pub mod store;
