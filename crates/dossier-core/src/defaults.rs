//! Centralized default constants for dossier.
//!
//! **This module is the single source of truth** for all shared default
//! values. Crates reference these constants instead of defining their own
//! magic numbers.

// =============================================================================
// PAGINATION
// =============================================================================

/// Default page size for application listings.
pub const PAGE_LIMIT: i64 = 20;

/// Default page offset.
pub const PAGE_OFFSET: i64 = 0;

// =============================================================================
// STATISTICS
// =============================================================================

/// Trailing window (days) for the "recent" application count.
pub const RECENT_WINDOW_DAYS: i64 = 30;

// =============================================================================
// GENERATION
// =============================================================================

/// Default OpenAI-compatible endpoint.
pub const GENERATION_URL: &str = "https://api.openai.com/v1";

/// Default generation model.
pub const GENERATION_MODEL: &str = "gpt-4o-mini";

/// Timeout for generation requests (seconds).
pub const GENERATION_TIMEOUT_SECS: u64 = 120;

/// Cap on completion tokens for document rewrites.
pub const GENERATION_MAX_TOKENS: u32 = 8192;

// =============================================================================
// DATABASE
// =============================================================================

/// Default maximum number of connections in the pool.
pub const MAX_CONNECTIONS: u32 = 10;

/// Default connection timeout in seconds.
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default idle timeout in seconds.
pub const IDLE_TIMEOUT_SECS: u64 = 600;
