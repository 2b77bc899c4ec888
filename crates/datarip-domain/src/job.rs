//! Job identifiers

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for an extraction job based on UUIDv7
///
/// UUIDv7 keeps identifiers chronologically sortable, which makes persisted
/// snapshots of successive jobs easy to order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(uuid::Uuid);

impl JobId {
    /// Generate a new UUIDv7-based JobId
    ///
    /// # Examples
    ///
    /// ```
    /// use datarip_domain::JobId;
    ///
    /// let id = JobId::new();
    /// assert!(id.value() > 0);
    /// ```
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7())
    }

    /// The nil identifier, used by the idle snapshot before any job exists
    pub fn nil() -> Self {
        Self(uuid::Uuid::nil())
    }

    /// Create a JobId from a raw u128 value
    pub fn from_value(value: u128) -> Self {
        Self(uuid::Uuid::from_u128(value))
    }

    /// Parse a JobId from its string form
    ///
    /// # Examples
    ///
    /// ```
    /// use datarip_domain::JobId;
    ///
    /// let id = JobId::new();
    /// let parsed = JobId::from_string(&id.to_string()).unwrap();
    /// assert_eq!(id, parsed);
    /// ```
    pub fn from_string(s: &str) -> Result<Self, String> {
        uuid::Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| format!("Invalid job id: {}", e))
    }

    /// Get the raw u128 value
    pub fn value(&self) -> u128 {
        self.0.as_u128()
    }

    /// Whether this is the nil identifier
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::nil()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
