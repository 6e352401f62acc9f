//! Timestamps for pose history entries

use std::fmt;

use serde::{Deserialize, Serialize};

/// Nanoseconds since the epoch. `Timestamp::ZERO` is the "no time" value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Timestamp(u64);

impl Timestamp {
    pub const ZERO: Timestamp = Timestamp(0);

    pub fn from_nanos(nanos: u64) -> Self {
        Self(nanos)
    }

    /// Negative or non-finite seconds map to `ZERO`
    pub fn from_secs_f64(secs: f64) -> Self {
        if secs.is_finite() && secs > 0.0 {
            Self((secs * 1e9).round() as u64)
        } else {
            Self::ZERO
        }
    }

    pub fn as_nanos(&self) -> u64 {
        self.0
    }

    pub fn as_secs_f64(&self) -> f64 {
        self.0 as f64 * 1e-9
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:09}", self.0 / 1_000_000_000, self.0 % 1_000_000_000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secs_conversion() {
        let t = Timestamp::from_secs_f64(12.5);
        assert_eq!(t.as_nanos(), 12_500_000_000);
        assert_eq!(t.to_string(), "12.500000000");
        assert!(Timestamp::from_secs_f64(-1.0).is_zero());
    }

    #[test]
    fn test_ordering() {
        assert!(Timestamp::from_nanos(1) < Timestamp::from_nanos(2));
        assert!(Timestamp::ZERO < Timestamp::from_secs_f64(0.1));
    }
}
