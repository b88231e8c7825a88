// All formatting lives in mdrules-core
// This CLI is a thin wrapper: config lookup, file/stdin I/O, status output

// CLI-specific modules
pub mod config_locator;

// Re-export core types for convenience
pub use mdrules_core::*;

pub use config_locator::ConfigSource;
