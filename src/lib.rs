pub mod config;
pub mod console;
pub mod error;
pub mod launcher;
pub mod scheduler;
