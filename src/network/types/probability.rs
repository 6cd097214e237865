use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Formatter;
use std::str::FromStr;
use thiserror::Error;

/// Error type for probability operations
#[derive(Debug, Error)]
pub enum ProbabilityError {
    /// Returned when a percentage is above 100
    #[error("{0}% is not in the valid chance range of 0 to 100")]
    OutOfRange(u32),

    /// Returned when a string can't be parsed as a whole percentage
    #[error("'{0}' is not a valid percentage")]
    ParseError(String),
}

/// Chance of applying an effect to a single packet, stored as a whole
/// percentage between 0 (never) and 100 (always).
///
/// Configuration files and command lines express chances as integer
/// percentages, so this type keeps that representation and only converts
/// to a fraction at the moment a roll is made.
///
/// # Example
///
/// ```
/// use laggard::network::types::probability::Probability;
///
/// let p = Probability::from_percent(25).unwrap();
/// assert_eq!(p.percent(), 25);
/// assert!(Probability::from_percent(101).is_err());
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Probability(u8);

impl Probability {
    /// Always apply.
    pub const ALWAYS: Probability = Probability(100);
    /// Never apply.
    pub const NEVER: Probability = Probability(0);

    /// Creates a probability from a percentage in `0..=100`.
    pub fn from_percent(percent: u32) -> Result<Self, ProbabilityError> {
        if percent > 100 {
            return Err(ProbabilityError::OutOfRange(percent));
        }

        Ok(Probability(percent as u8))
    }

    pub fn percent(&self) -> u32 {
        u32::from(self.0)
    }

    /// Returns the chance as a fraction between 0.0 and 1.0.
    pub fn value(&self) -> f64 {
        f64::from(self.0) / 100.0
    }

    pub fn is_never(&self) -> bool {
        self.0 == 0
    }

    /// Rolls the dice once. `ALWAYS` and `NEVER` never consume randomness.
    pub fn roll<R: Rng + ?Sized>(&self, rng: &mut R) -> bool {
        match self.0 {
            0 => false,
            100 => true,
            p => rng.random_range(0..100u8) < p,
        }
    }
}

impl TryFrom<u32> for Probability {
    type Error = ProbabilityError;

    fn try_from(percent: u32) -> Result<Self, Self::Error> {
        Probability::from_percent(percent)
    }
}

impl From<Probability> for u32 {
    fn from(prob: Probability) -> Self {
        prob.percent()
    }
}

impl FromStr for Probability {
    type Err = ProbabilityError;

    /// Parses a whole percentage, with or without a trailing `%`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_end_matches('%');
        let value: u32 = trimmed
            .parse()
            .map_err(|_| ProbabilityError::ParseError(s.to_string()))?;
        Probability::from_percent(value)
    }
}

impl Default for Probability {
    /// Effects apply to every packet unless configured otherwise.
    fn default() -> Self {
        Probability::ALWAYS
    }
}

impl fmt::Display for Probability {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
