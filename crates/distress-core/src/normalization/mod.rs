pub mod reconciler;
pub mod resolver;
pub mod rules;
pub mod schema;
