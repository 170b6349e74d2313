//! API request handlers.

/// Service info, status, health and statistics.
pub mod system;
/// Task submission and polling.
pub mod tasks;
