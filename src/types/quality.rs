//! Broadcast quality tiers.
//!
//! A quality tier is the named preset that picks the throttle interval for
//! outbound cursor updates.

use std::fmt;
use std::time::Duration;

/// The throttling preset controlling how often local positions are broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum QualityTier {
    /// Every movement is sent
    #[default]
    High,
    /// At most one update per 10ms
    Middle,
    /// At most one update per 30ms
    Low,
}

impl QualityTier {
    /// Gets the minimum spacing between two emitted updates
    pub fn interval(&self) -> Duration {
        match self {
            QualityTier::High => Duration::ZERO,
            QualityTier::Middle => Duration::from_millis(10),
            QualityTier::Low => Duration::from_millis(30),
        }
    }

    /// Parses a tier name, falling back to `High` for anything unrecognized.
    ///
    /// Quality is not validated: an unknown value simply means unthrottled.
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "middle" => QualityTier::Middle,
            "low" => QualityTier::Low,
            _ => QualityTier::High,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QualityTier::High => "high",
            QualityTier::Middle => "middle",
            QualityTier::Low => "low",
        }
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
