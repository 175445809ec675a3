mod config;
pub use config::*;

mod consistency;
pub use consistency::*;

mod entity;
pub use entity::*;

mod errors;
pub use errors::*;

pub mod bridge;
pub mod operations;
pub mod query;
pub mod template;

#[cfg(test)]
pub mod testing;
