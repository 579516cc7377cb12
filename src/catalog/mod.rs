//! Remote catalog tables: typed records, equality filters and the HTTP loader.

pub mod error;
pub mod filter;
pub mod loader;
pub mod records;
