pub mod classifier;
pub mod regions;
