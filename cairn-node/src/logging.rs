use crate::error::SettingsError;
use crate::settings::LoggingSettings;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Installs the global fmt subscriber, filtered by `settings.level`
pub fn init_logging(settings: &LoggingSettings) -> Result<(), SettingsError> {
    let filter = EnvFilter::try_new(&settings.level)
        .map_err(|err| SettingsError::Logging(err.to_string()))?;
    let tracing_layer = tracing_subscriber::fmt::layer().with_filter(filter);
    tracing_subscriber::registry()
        .with(tracing_layer)
        .try_init()
        .map_err(|err| SettingsError::Logging(err.to_string()))
}
