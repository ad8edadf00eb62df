pub mod config;
pub mod dispatcher;
pub mod langsmith;
pub mod llm;
pub mod mention;
pub mod platform;
pub mod prompt;
