pub mod core;
pub mod soft_deletable;
pub mod store_object;

pub use core::GenericStore;
