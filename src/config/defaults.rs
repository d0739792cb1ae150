//! System-wide default constants.
//!
//! Centralises capacities and intervals used across subsystems.

// ============================================================================
// Engine
// ============================================================================

/// History buffer capacity per fleet metric (ETA / speed / risk samples).
pub const HISTORY_CAPACITY: usize = 30;

/// Alert log capacity, FIFO-evicted.
pub const ALERT_LOG_CAPACITY: usize = 200;

/// Per-truck rolling speed window capacity.
pub const SPEED_WINDOW_CAPACITY: usize = 8;

/// Default interval between ticks (seconds).
pub const DEFAULT_TICK_INTERVAL_SECS: u64 = 2;

/// Default number of trucks seeded at startup.
pub const DEFAULT_FLEET_SIZE: usize = 7;

/// Floor applied to rolling average speed so ETA saturates instead of
/// diverging when a truck is near-stopped (mph).
pub const AVG_SPEED_FLOOR_MPH: f64 = 1.0;

/// Earth radius for great-circle distances (miles).
pub const EARTH_RADIUS_MILES: f64 = 3959.0;

/// Simulated travel time elapsing per real second of tick time.
///
/// Cross-country legs complete in minutes of wall clock instead of days.
pub const SIM_TIME_COMPRESSION: f64 = 120.0;

/// Minimum speed-window samples before the speed-drop rule can evaluate.
pub const SPEED_DROP_MIN_SAMPLES: usize = 3;

// ============================================================================
// Broadcast Hub
// ============================================================================

/// Broadcast channel depth; a receiver further behind than this lags and
/// skips ticks rather than accumulating a backlog.
pub const BROADCAST_CHANNEL_CAPACITY: usize = 16;

/// Per-session outbound queue depth; a full queue drops the current update
/// for that session only.
pub const SESSION_OUTBOUND_CAPACITY: usize = 32;

/// Recent alerts included in the `initial_state` handshake.
pub const RECENT_ALERTS_ON_CONNECT: usize = 20;

// ============================================================================
// Assistant
// ============================================================================

/// Default collaborator request timeout (seconds).
pub const ASSISTANT_TIMEOUT_SECS: u64 = 30;

/// Token budget reported in `ai_response.max_tokens`.
pub const ASSISTANT_MAX_TOKENS: u64 = 10_000;

/// Flat token cost accounted per rule-based answer.
pub const RULE_BASED_TOKEN_COST: u64 = 25;
