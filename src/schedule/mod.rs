/// Birthday scheduling modules
mod birthday_tasks;
mod manager;
mod types;

// Re-export public types and functions
pub use birthday_tasks::CelebrationEngine;
pub use manager::start_birthday_scheduler;
pub use types::ScanSummary;
