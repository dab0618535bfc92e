// Copyright (c) 2022 MASSA LABS <info@massa.net>
//! Unsigned millisecond time used for configuration durations and throttling
#![warn(missing_docs)]
#![warn(unused_crate_dependencies)]

mod error;
pub use error::TimeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// Milliseconds, either since 01/01/1970 or as a plain duration.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CairnTime(u64);

impl fmt::Display for CairnTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_millis())
    }
}

impl TryFrom<Duration> for CairnTime {
    type Error = TimeError;

    /// Conversion from `std::time::Duration`.
    /// ```
    /// # use std::time::Duration;
    /// # use cairn_time::*;
    /// let duration: Duration = Duration::from_millis(42);
    /// assert_eq!(CairnTime::from_millis(42), CairnTime::try_from(duration).unwrap());
    /// ```
    fn try_from(value: Duration) -> Result<Self, Self::Error> {
        Ok(CairnTime(
            value
                .as_millis()
                .try_into()
                .map_err(|_| TimeError::ConversionError)?,
        ))
    }
}

impl From<CairnTime> for Duration {
    fn from(value: CairnTime) -> Self {
        value.to_duration()
    }
}

impl FromStr for CairnTime {
    type Err = TimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(CairnTime(
            u64::from_str(s).map_err(|_| TimeError::ConversionError)?,
        ))
    }
}

impl CairnTime {
    /// Conversion from `u64`, representing milliseconds.
    pub const fn from_millis(value: u64) -> Self {
        CairnTime(value)
    }

    /// Conversion from whole seconds.
    /// ```
    /// # use cairn_time::*;
    /// assert_eq!(CairnTime::from_secs(5), CairnTime::from_millis(5_000));
    /// ```
    pub const fn from_secs(value: u64) -> Self {
        CairnTime(value.saturating_mul(1000))
    }

    /// Gets current UNIX timestamp (resolution: milliseconds).
    pub fn now() -> Result<Self, TimeError> {
        let now: u64 = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|_| TimeError::TimeOverflowError)?
            .as_millis()
            .try_into()
            .map_err(|_| TimeError::TimeOverflowError)?;
        Ok(CairnTime(now))
    }

    /// Conversion to `std::time::Duration`.
    pub fn to_duration(&self) -> Duration {
        Duration::from_millis(self.0)
    }

    /// Conversion to `u64`, representing milliseconds.
    pub const fn to_millis(&self) -> u64 {
        self.0
    }

    /// ```
    /// # use cairn_time::*;
    /// let res = CairnTime::from_millis(42).saturating_sub(CairnTime::from_millis(50));
    /// assert_eq!(res, CairnTime::from_millis(0))
    /// ```
    #[must_use]
    pub fn saturating_sub(self, t: CairnTime) -> Self {
        CairnTime(self.0.saturating_sub(t.0))
    }

    /// Saturating addition.
    #[must_use]
    pub fn saturating_add(self, t: CairnTime) -> Self {
        CairnTime(self.0.saturating_add(t.0))
    }

    /// Checked subtraction.
    pub fn checked_sub(self, t: CairnTime) -> Result<Self, TimeError> {
        self.0
            .checked_sub(t.0)
            .ok_or_else(|| TimeError::CheckedOperationError("subtraction error".to_string()))
            .map(CairnTime)
    }

    /// Time elapsed between `self` and now, zero if `self` is in the future.
    pub fn elapsed(self) -> Result<CairnTime, TimeError> {
        Ok(CairnTime::now()?.saturating_sub(self))
    }

    /// Formats a UNIX timestamp given in seconds, as block times are.
    /// ```
    /// # use cairn_time::*;
    /// assert_eq!(CairnTime::format_unix_secs(1_640_995_200).unwrap(), "2022-01-01T00:00:00Z")
    /// ```
    pub fn format_unix_secs(secs: u64) -> Result<String, TimeError> {
        let secs: i64 = secs.try_into().map_err(|_| TimeError::ConversionError)?;
        OffsetDateTime::from_unix_timestamp(secs)
            .map_err(|_| TimeError::ConversionError)?
            .format(&Rfc3339)
            .map_err(|_| TimeError::ConversionError)
    }
}
