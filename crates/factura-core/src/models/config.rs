//! Fixed pipeline limits and supported formats.
//!
//! These are deliberate constants, not configuration: the per-cycle
//! cap and cooldown mirror the quota of the extraction service.

use std::time::Duration;

/// Maximum items processed per cycle before the lockout engages.
pub const CYCLE_LIMIT: usize = 15;

/// Fixed lockout duration once the cycle limit is reached.
pub const COOLDOWN: Duration = Duration::from_secs(60);

/// Filename extensions accepted from archives and standalone input.
pub const SUPPORTED_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "webp", "pdf"];
