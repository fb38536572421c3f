use serde::{Deserialize, Serialize};

/// A point in time represented as a number of seconds since the start of the
/// vision stream.
///
/// This instant is guaranteed to be:
///  - non-negative
///  - finite and non-NaN
#[derive(Serialize, Deserialize, Clone, Debug, Copy, Default, PartialEq, PartialOrd)]
#[serde(from = "f64", into = "f64")]
pub struct DiesInstant(f64);

impl DiesInstant {
    pub const ZERO: DiesInstant = DiesInstant(0.0);

    /// Create an instant from seconds. Negative or non-finite values are mapped
    /// to zero.
    pub fn from_secs(value: f64) -> Self {
        if value.is_finite() && value >= 0.0 {
            Self(value)
        } else {
            Self(0.0)
        }
    }

    /// Get the underlying floating point value.
    pub fn as_secs_f64(&self) -> f64 {
        self.0
    }

    /// Get the duration between this instant and another instant.
    ///
    /// If the other instant is after this instant, the result is 0, therefore this
    /// value is guaranteed to be non-negative.
    pub fn duration_since(&self, other: &Self) -> f64 {
        if self.0 < other.0 {
            return 0.0;
        }
        self.0 - other.0
    }

    /// The later of the two instants.
    pub fn max(self, other: Self) -> Self {
        if other.0 > self.0 {
            other
        } else {
            self
        }
    }
}

impl From<f64> for DiesInstant {
    fn from(value: f64) -> Self {
        Self::from_secs(value)
    }
}

impl From<DiesInstant> for f64 {
    fn from(value: DiesInstant) -> Self {
        value.0
    }
}

impl std::ops::Add<f64> for DiesInstant {
    type Output = Self;

    fn add(self, rhs: f64) -> Self::Output {
        Self::from_secs(self.0 + rhs.max(0.0))
    }
}

impl std::fmt::Display for DiesInstant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.3}s", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_values_map_to_zero() {
        assert_eq!(DiesInstant::from_secs(-1.0), DiesInstant::ZERO);
        assert_eq!(DiesInstant::from_secs(f64::NAN), DiesInstant::ZERO);
        assert_eq!(DiesInstant::from_secs(f64::INFINITY), DiesInstant::ZERO);
    }

    #[test]
    fn duration_since_is_non_negative() {
        let a = DiesInstant::from_secs(1.0);
        let b = DiesInstant::from_secs(2.5);
        assert_eq!(b.duration_since(&a), 1.5);
        assert_eq!(a.duration_since(&b), 0.0);
    }
}
