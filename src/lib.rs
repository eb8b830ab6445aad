pub mod lang;

// Utility modules
pub mod pitch;
