//! Command implementations
