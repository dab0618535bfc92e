use crate::error::VersionError;
use cairn_models::Version;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// A published protocol change and the minimum version supporting it
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProtocolChange {
    /// activation height
    pub block_index: u64,
    /// minimum major
    pub minimum_version_major: u32,
    /// minimum minor
    pub minimum_version_minor: u32,
    /// minimum revision
    pub minimum_version_revision: u32,
}

impl ProtocolChange {
    /// Minimum version as a `Version`
    pub fn minimum_version(&self) -> Version {
        Version::new(
            self.minimum_version_major,
            self.minimum_version_minor,
            self.minimum_version_revision,
        )
    }
}

/// Protocol changes by name
pub type ProtocolChanges = BTreeMap<String, ProtocolChange>;

/// Where the published requirements document comes from
#[cfg_attr(any(test, feature = "test-exports"), mockall::automock)]
pub trait VersionSource: Send {
    /// Raw JSON document of the protocol changes
    fn fetch_requirements(&self) -> Result<String, VersionError>;
}

/// Decodes the requirements document
pub fn parse_requirements(document: &str) -> Result<ProtocolChanges, VersionError> {
    serde_json::from_str(document).map_err(|err| VersionError::VersionCheck(err.to_string()))
}

/// Fails when `current` is too old for a change already active at `current_block`.
///
/// Changes activating later only log a warning.
pub fn check_change(
    change: &ProtocolChange,
    name: &str,
    current: &Version,
    current_block: u64,
) -> Result<(), VersionError> {
    let required = change.minimum_version();
    if *current >= required {
        return Ok(());
    }
    if current_block >= change.block_index {
        return Err(VersionError::VersionUpdateRequired {
            name: name.to_string(),
            required,
            current: *current,
            block_index: change.block_index,
        });
    }
    warn!(
        "A new version ({}) is required from block {} for protocol change `{}`. Please upgrade.",
        required, change.block_index, name
    );
    Ok(())
}

/// Checks every published change. `force` skips the check entirely.
pub fn check_software_version(
    source: &dyn VersionSource,
    current: &Version,
    current_block: u64,
    force: bool,
) -> Result<(), VersionError> {
    if force {
        debug!("Skipping software version check.");
        return Ok(());
    }
    debug!("Checking software version...");
    let changes = parse_requirements(&source.fetch_requirements()?)?;
    for (name, change) in &changes {
        check_change(change, name, current, current_block)?;
    }
    debug!("Software version is up to date.");
    Ok(())
}
