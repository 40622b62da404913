//! Unit tests for the reconciliation engine.

use std::time::Duration;

use super::PollSettings;

/// Fast cadence with a generous budget, for scripted sequences.
const fn fast_settings() -> PollSettings {
    PollSettings::new(Duration::from_millis(1), Duration::from_secs(5))
}
