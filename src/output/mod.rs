pub mod error;
pub mod units;
pub mod writer;
