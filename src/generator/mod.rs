pub mod compose;
pub mod context;
pub mod outlet;
pub mod preprocess;
pub mod research;
pub mod types;
pub mod workflow;
