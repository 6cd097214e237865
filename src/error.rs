use crate::network::types::probability::ProbabilityError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LaggardError {
    /// Module start-up could not reserve the memory it needs.
    #[error("Allocation failed for {what}: {reason}")]
    Allocation { what: &'static str, reason: String },

    /// A configuration value is outside its accepted range
    #[error("Invalid setting `{name}`: {value} (allowed {min}..={max})")]
    InvalidSetting {
        name: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    /// Error when a mutex/rwlock is poisoned
    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),

    /// The injection side refused a packet
    #[error("Failed to send packet: {0}")]
    Sink(String),

    #[error(transparent)]
    Probability(#[from] ProbabilityError),

    /// Configuration file could not be decoded
    #[error("Config decode error: {0}")]
    ConfigDecode(#[from] toml::de::Error),

    /// Configuration could not be encoded
    #[error("Config encode error: {0}")]
    ConfigEncode(#[from] toml::ser::Error),

    /// I/O errors from file operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A convenient Result type alias using `LaggardError`.
pub type Result<T> = std::result::Result<T, LaggardError>;

impl LaggardError {
    /// Creates a new lock poisoned error with a descriptive message.
    pub fn lock_poisoned(resource: &str) -> Self {
        Self::LockPoisoned(format!("Failed to acquire lock on {}", resource))
    }

    /// Creates an allocation error for the named resource.
    pub fn allocation(what: &'static str, reason: impl ToString) -> Self {
        Self::Allocation {
            what,
            reason: reason.to_string(),
        }
    }

    /// Checks `value` against an inclusive range, producing `InvalidSetting` on failure.
    pub fn check_range(name: &'static str, value: i64, min: i64, max: i64) -> Result<()> {
        if (min..=max).contains(&value) {
            return Ok(());
        }
        Err(Self::InvalidSetting {
            name,
            value,
            min,
            max,
        })
    }
}
