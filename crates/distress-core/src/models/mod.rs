pub mod registry;
pub mod selector;
