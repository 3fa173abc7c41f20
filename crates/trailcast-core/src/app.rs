use std::path::Path;
use std::sync::Arc;

use trailcast_weather::ForecastStore;

use crate::error::{AppError, ConfigError};
use crate::Config;

/// Main application state and lifecycle manager.
///
/// Owns the single [`ForecastStore`] of the process. Presentation code gets
/// the shared handle from [`App::forecasts`] instead of reaching for a global.
pub struct App {
    config: Arc<Config>,
    forecasts: Arc<ForecastStore>,
}

impl App {
    /// Create the application from the user's configuration file
    pub fn new() -> Result<Self, AppError> {
        let (config, _) = Config::load_validated().map_err(config_error)?;
        Self::open(config)
    }

    /// Create the application from an explicit configuration file
    pub fn from_config_path(path: &Path) -> Result<Self, AppError> {
        let (config, _) = Config::load_validated_from(path).map_err(config_error)?;
        Self::open(config)
    }

    /// Validate `config` and open the location store it points at
    pub fn with_config(config: Config) -> Result<Self, AppError> {
        let (config, _) = config.into_validated()?;
        Self::open(config)
    }

    fn open(config: Config) -> Result<Self, AppError> {
        let forecasts = ForecastStore::open(&config.data_dir, config.store.recent_capacity)?;
        tracing::info!(
            "Application initialized with {} saved locations",
            forecasts.len()
        );

        Ok(Self {
            config: Arc::new(config),
            forecasts: Arc::new(forecasts),
        })
    }

    /// Get reference to application config
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Shared handle to the process-wide location store
    pub fn forecasts(&self) -> Arc<ForecastStore> {
        Arc::clone(&self.forecasts)
    }

    /// Shutdown the application.
    ///
    /// Every store write is already on disk, so this only reports state.
    pub fn shutdown(&mut self) -> Result<(), AppError> {
        tracing::info!(
            "Shutting down with {} saved locations ({} favourites)",
            self.forecasts.len(),
            self.forecasts.get_favourites().len()
        );
        Ok(())
    }
}

/// Keep validation failures typed; anything else is a load failure.
fn config_error(err: anyhow::Error) -> ConfigError {
    match err.downcast::<ConfigError>() {
        Ok(err) => err,
        Err(err) => ConfigError::Load(format!("{err:#}")),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use tempfile::tempdir;
    use trailcast_weather::Location;

    fn test_config(dir: &Path) -> Config {
        Config {
            data_dir: dir.join("data"),
            ..Config::default()
        }
    }

    #[test]
    fn test_forecasts_is_one_shared_instance() {
        let dir = tempdir().unwrap();
        let app = App::with_config(test_config(dir.path())).unwrap();

        let first = app.forecasts();
        let second = app.forecasts();
        assert!(Arc::ptr_eq(&first, &second));

        first.add_new_location(Location::new(1.0, 2.0)).unwrap();
        assert_eq!(second.len(), 1);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let dir = tempdir().unwrap();
        let mut config = test_config(dir.path());
        config.store.recent_capacity = 0;

        let err = App::with_config(config).err().unwrap();
        assert!(matches!(err, AppError::Config(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_from_config_path_reopens_saved_state() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        test_config(dir.path()).save_to(&config_path).unwrap();

        {
            let mut app = App::from_config_path(&config_path).unwrap();
            let store = app.forecasts();
            let home = Location::with_name(51.5, -0.12, "Home");
            store.add_new_location(home.clone()).unwrap();
            store.make_favourite(&home).unwrap();
            app.shutdown().unwrap();
        }

        let app = App::from_config_path(&config_path).unwrap();
        let favourites = app.forecasts().get_favourites();
        assert_eq!(favourites.len(), 1);
        assert_eq!(favourites[0].name(), Some("Home"));
    }

    #[test]
    fn test_invalid_config_file_is_invalid_error() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        let mut config = test_config(dir.path());
        config.store.recent_capacity = 0;
        config.save_to(&config_path).unwrap();

        let err = App::from_config_path(&config_path).err().unwrap();
        assert!(matches!(err, AppError::Config(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_malformed_config_file_is_load_error() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        std::fs::write(&config_path, "data_dir = [").unwrap();

        let err = App::from_config_path(&config_path).err().unwrap();
        assert!(matches!(err, AppError::Config(ConfigError::Load(_))));
    }
}
