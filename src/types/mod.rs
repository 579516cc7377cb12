pub mod metadata;
pub mod period;
