pub mod engine;
pub mod validator;
