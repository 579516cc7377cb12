pub mod error;
pub mod resolver;
