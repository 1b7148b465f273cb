#![forbid(unsafe_code)]

//! Logging targets and optional subscriber setup.
//!
//! Library code only emits `tracing` events; installing a subscriber is the
//! host's job. Hosts that want structured output can enable the
//! `tracing-json` feature and call [`init_json_logging`].

/// Target for task store mutations and notifications.
pub const TARGET_STORE: &str = "sched.store";
/// Target for projection rebuilds.
pub const TARGET_PROJECTION: &str = "sched.projection";
/// Target for column controller actions.
pub const TARGET_SCHEDULE: &str = "sched.schedule";
/// Target for touch gesture transitions.
pub const TARGET_GESTURE: &str = "sched.gesture";
/// Target for synthetic touch dispatch.
pub const TARGET_SYNTH: &str = "sched.synth";

/// Environment variable holding the `EnvFilter` directive.
pub const LOG_ENV: &str = "SCHED_LOG";

/// Install a global JSON subscriber filtered by `SCHED_LOG` (default `info`).
///
/// Returns `false` if a global subscriber was already installed.
#[cfg(feature = "tracing-json")]
pub fn init_json_logging() -> bool {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_current_span(true)
        .try_init()
        .is_ok()
}
