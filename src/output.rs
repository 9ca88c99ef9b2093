//! Switch for the human-facing progress lines printed by `ui`
//!
//! Logs go through `tracing` regardless; this only silences stdout chatter.

use std::sync::OnceLock;

/// Environment variable that silences the progress lines
pub const QUIET_ENV: &str = "CODEQUALITY_QUIET";

static QUIET: OnceLock<bool> = OnceLock::new();

/// Whether `CODEQUALITY_QUIET` asks for silence; read once per process
pub fn is_quiet() -> bool {
    *QUIET.get_or_init(|| std::env::var(QUIET_ENV).is_ok_and(|v| quiet_requested(&v)))
}

fn quiet_requested(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
