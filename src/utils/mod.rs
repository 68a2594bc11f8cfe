pub mod retry;
pub mod structured;
pub mod text;
pub mod threads;
