// Copyright (c) 2022 MASSA LABS <info@massa.net>
use crate::ModelsError;
use serde::de::Unexpected;
use std::{fmt, str::FromStr};

/// Software version, `major.minor.revision`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    /// major
    pub major: u32,
    /// minor
    pub minor: u32,
    /// revision
    pub revision: u32,
}

impl Version {
    /// Build a version
    pub const fn new(major: u32, minor: u32, revision: u32) -> Self {
        Version {
            major,
            minor,
            revision,
        }
    }
}

struct VersionVisitor;

impl<'de> serde::de::Visitor<'de> for VersionVisitor {
    type Value = Version;

    fn visit_str<E>(self, value: &str) -> Result<Version, E>
    where
        E: serde::de::Error,
    {
        Version::from_str(value).map_err(|_| E::invalid_value(Unexpected::Str(value), &self))
    }

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "a version identifier like 1.2.3")
    }
}

impl<'de> serde::Deserialize<'de> for Version {
    fn deserialize<D>(deserializer: D) -> Result<Version, D::Error>
    where
        D: serde::de::Deserializer<'de>,
    {
        deserializer.deserialize_str(VersionVisitor)
    }
}

impl serde::Serialize for Version {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.revision)
    }
}

impl FromStr for Version {
    type Err = ModelsError;

    /// ```rust
    /// # use cairn_models::Version;
    /// # use std::str::FromStr;
    /// let v = Version::from_str("10.1.2").unwrap();
    /// assert_eq!(v, Version::new(10, 1, 2));
    /// assert!(Version::from_str("10.1").is_err());
    /// ```
    fn from_str(str_version: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = str_version.split('.').collect();
        if parts.len() != 3 {
            return Err(ModelsError::InvalidVersionError(str_version.to_string()));
        }
        let parse = |part: &str| {
            u32::from_str(part).map_err(|_| ModelsError::InvalidVersionError(str_version.to_string()))
        };
        Ok(Version {
            major: parse(parts[0])?,
            minor: parse(parts[1])?,
            revision: parse(parts[2])?,
        })
    }
}
