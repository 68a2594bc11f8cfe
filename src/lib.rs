pub mod cli;
pub mod config;
pub mod generator;
pub mod llm;
pub mod logging;
pub mod search;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use generator::workflow::{Job, WriteMode, launch, run};
