// Command modules
mod birthday;

// Re-export all commands
pub use birthday::birthday;
