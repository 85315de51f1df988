pub mod classification;
pub mod config;
pub mod error;
pub mod models;
pub mod normalization;
pub mod pipeline;
pub mod scoring;
pub mod types;

pub use error::DistressError;
pub use types::*;

/// Standard result type for all distress-core computations
pub type DistressResult<T> = Result<T, DistressError>;
