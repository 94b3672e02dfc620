// Common module - shared types and utilities across all modules

pub mod config;
pub mod error;
pub mod helpers;
pub mod sequence;
pub mod validation;

// Re-export commonly used types for convenience
pub use config::{ConfigError, ConsoleConfig, PollConfig};
pub use error::{ConsoleError, ErrorResponse, Operation};
pub use sequence::{RequestSequence, Ticket};
pub use validation::{ValidationError, ValidationResult, Validator};
