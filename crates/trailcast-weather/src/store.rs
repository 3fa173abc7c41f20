//! File-backed store of tracked locations and their cached forecasts.
//!
//! Layout under the data directory:
//!
//! ```text
//! <data_dir>/locations/<key>.json   one file per location
//! <data_dir>/recent.json            recently viewed keys, most recent first
//! ```
//!
//! Every mutation is written to disk before it is applied in memory, so after
//! a failed write the store still holds the last state that reached disk.

use parking_lot::RwLock;
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{StoreError, StoreResult};
use crate::identity::{Coordinates, LocationKey};
use crate::location::{sort_for_display, Location};
use crate::types::{sort_forecast, ForecastEntry};
use crate::warnings::{Severity, Warning, WarningsContainer};

const LOCATIONS_DIR: &str = "locations";
const RECENT_FILE: &str = "recent.json";

/// Default number of entries kept in the recently viewed list
pub const DEFAULT_RECENT_CAPACITY: usize = 5;

/// Full contents of a location file.
#[derive(Serialize)]
struct LocationRecord<'a> {
    latitude: f64,
    longitude: f64,
    name: Option<&'a str>,
    favourite: bool,
    warnings: &'a WarningsContainer,
    #[serde(skip_serializing_if = "Option::is_none")]
    forecast: Option<&'a [ForecastEntry]>,
}

/// Metadata read at startup. The forecast is only checked for syntax here
/// and parsed on first use.
#[derive(Deserialize)]
struct LocationHeader {
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    favourite: bool,
    #[serde(default)]
    warnings: WarningsContainer,
    #[serde(default)]
    #[allow(dead_code)]
    forecast: Option<IgnoredAny>,
}

#[derive(Deserialize)]
struct ForecastSection {
    #[serde(default)]
    forecast: Option<Vec<ForecastEntry>>,
}

#[derive(Debug, Clone)]
enum ForecastSlot {
    /// Still only on disk.
    Unloaded,
    Loaded(Option<Vec<ForecastEntry>>),
}

#[derive(Debug, Default)]
struct StoreState {
    locations: HashMap<LocationKey, Location>,
    forecasts: HashMap<LocationKey, ForecastSlot>,
    recent: VecDeque<LocationKey>,
}

/// The store of known locations.
///
/// One instance is shared per process (see `trailcast_core::App`). Mutations
/// are serialized behind a write lock; reads share a read lock and always see
/// a consistent snapshot.
pub struct ForecastStore {
    data_dir: PathBuf,
    recent_capacity: usize,
    state: RwLock<StoreState>,
}

impl ForecastStore {
    /// Open the store rooted at `data_dir`, creating the directory layout if
    /// needed and rebuilding the index from the files found there.
    pub fn open(data_dir: impl Into<PathBuf>, recent_capacity: usize) -> StoreResult<Self> {
        let data_dir = data_dir.into();
        let locations_dir = data_dir.join(LOCATIONS_DIR);
        fs::create_dir_all(&locations_dir).map_err(|e| StoreError::io(&locations_dir, e))?;

        let store = Self {
            data_dir,
            recent_capacity: recent_capacity.max(1),
            state: RwLock::new(StoreState::default()),
        };

        let mut state = StoreState::default();
        for location in store.scan_locations()? {
            state
                .forecasts
                .insert(location.key().clone(), ForecastSlot::Unloaded);
            state.locations.insert(location.key().clone(), location);
        }
        state.recent = store.read_recent(&state.locations);

        tracing::info!(
            "Opened forecast store at {:?} with {} locations",
            store.data_dir,
            state.locations.len()
        );
        *store.state.write() = state;
        Ok(store)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn recent_capacity(&self) -> usize {
        self.recent_capacity
    }

    /// Path of the file holding a location's data.
    pub fn location_path(&self, location: &Location) -> PathBuf {
        self.path_for(location.key())
    }

    fn path_for(&self, key: &LocationKey) -> PathBuf {
        self.data_dir.join(LOCATIONS_DIR).join(key.file_name())
    }

    fn recent_path(&self) -> PathBuf {
        self.data_dir.join(RECENT_FILE)
    }

    /// Register a location. Returns `false` if one with the same coordinates
    /// is already known; the existing entry is kept untouched.
    ///
    /// Coordinates must be finite. Callers check user input with
    /// [`Coordinates::validate`] first; a non-finite value would not survive
    /// a reload.
    pub fn add_new_location(&self, location: Location) -> StoreResult<bool> {
        debug_assert!(
            location.latitude().is_finite() && location.longitude().is_finite(),
            "non-finite coordinates {}",
            location.coordinates()
        );
        let mut state = self.state.write();
        if state.locations.contains_key(location.key()) {
            tracing::debug!("Location {} already registered", location.key());
            return Ok(false);
        }

        self.write_location(&location, None)?;
        let key = location.key().clone();
        tracing::info!("Added location {} ({})", location.display_name(), key);
        state.forecasts.insert(key.clone(), ForecastSlot::Loaded(None));
        state.locations.insert(key, location);
        Ok(true)
    }

    /// Forget a location and delete its file, cached forecast, warnings and
    /// recents entry. Returns `false` if it was not known.
    ///
    /// The file is deleted first; if that fails nothing changes. Once the file
    /// is gone the location is removed even if rewriting the recents file
    /// fails, since a reload drops recents keys without a location file.
    pub fn remove_location(&self, location: &Location) -> StoreResult<bool> {
        let mut state = self.state.write();
        let key = location.key();
        if !state.locations.contains_key(key) {
            tracing::debug!("Remove ignored, unknown location {}", key);
            return Ok(false);
        }

        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(StoreError::io(path, e)),
        }

        state.locations.remove(key);
        state.forecasts.remove(key);
        if state.recent.contains(key) {
            state.recent.retain(|k| k != key);
            if let Err(e) = self.write_recent(&state.recent) {
                tracing::warn!("Failed to rewrite recents after removing {}: {}", key, e);
            }
        }
        tracing::info!("Removed location {}", key);
        Ok(true)
    }

    /// Mark a location as favourite. No-op if it already is one or is unknown.
    pub fn make_favourite(&self, location: &Location) -> StoreResult<bool> {
        self.set_favourite(location.key(), true)
    }

    /// Clear the favourite mark. No-op if it is not set or the location is
    /// unknown.
    pub fn remove_favourite(&self, location: &Location) -> StoreResult<bool> {
        self.set_favourite(location.key(), false)
    }

    fn set_favourite(&self, key: &LocationKey, favourite: bool) -> StoreResult<bool> {
        self.update_location(key, |location| {
            if location.is_favourite() == favourite {
                return false;
            }
            location.toggle_favourite();
            true
        })
    }

    /// Rename a location. Its identity and file stay the same.
    pub fn rename_location(&self, location: &Location, new_name: &str) -> StoreResult<bool> {
        self.update_location(location.key(), |location| {
            let before = location.name().map(str::to_owned);
            location.rename(new_name);
            location.name() != before.as_deref()
        })
    }

    /// Apply `change` to a copy of the stored location, persist the copy and
    /// only then commit it. `change` returns whether anything changed.
    fn update_location<F>(&self, key: &LocationKey, change: F) -> StoreResult<bool>
    where
        F: FnOnce(&mut Location) -> bool,
    {
        let mut state = self.state.write();
        let Some(mut updated) = state.locations.get(key).cloned() else {
            tracing::debug!("Update ignored, unknown location {}", key);
            return Ok(false);
        };
        if !change(&mut updated) {
            return Ok(false);
        }

        let forecast = self.forecast_for_rewrite(&mut state, key)?;
        self.write_location(&updated, forecast.as_deref())?;
        state.locations.insert(key.clone(), updated);
        Ok(true)
    }

    /// Current favourites in display order, derived from the location flags.
    pub fn get_favourites(&self) -> Vec<Location> {
        let state = self.state.read();
        let mut favourites: Vec<Location> = state
            .locations
            .values()
            .filter(|l| l.is_favourite())
            .cloned()
            .collect();
        sort_for_display(&mut favourites);
        favourites
    }

    /// Recently viewed locations, most recent first.
    pub fn get_recent(&self) -> Vec<Location> {
        let state = self.state.read();
        state
            .recent
            .iter()
            .filter_map(|key| state.locations.get(key).cloned())
            .collect()
    }

    /// Every known location in display order.
    pub fn locations(&self) -> Vec<Location> {
        let state = self.state.read();
        let mut all: Vec<Location> = state.locations.values().cloned().collect();
        sort_for_display(&mut all);
        all
    }

    /// Stored version of `location`, which may carry a newer name or flag
    /// than the caller's copy.
    pub fn get(&self, location: &Location) -> Option<Location> {
        self.state.read().locations.get(location.key()).cloned()
    }

    pub fn get_location(&self, latitude: f64, longitude: f64) -> Option<Location> {
        let key = Coordinates::new(latitude, longitude).key();
        self.state.read().locations.get(&key).cloned()
    }

    pub fn contains(&self, location: &Location) -> bool {
        self.state.read().locations.contains_key(location.key())
    }

    pub fn len(&self) -> usize {
        self.state.read().locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().locations.is_empty()
    }

    /// Record that a location was viewed, moving it to the front of the
    /// recents list and evicting the oldest entry past capacity.
    pub fn mark_viewed(&self, location: &Location) -> StoreResult<bool> {
        let mut state = self.state.write();
        let key = location.key();
        if !state.locations.contains_key(key) {
            tracing::debug!("View ignored, unknown location {}", key);
            return Ok(false);
        }

        let mut recent = state.recent.clone();
        recent.retain(|k| k != key);
        recent.push_front(key.clone());
        recent.truncate(self.recent_capacity);
        if recent == state.recent {
            return Ok(false);
        }

        self.write_recent(&recent)?;
        state.recent = recent;
        Ok(true)
    }

    /// Cached forecast for a location, loading it from disk on first use.
    ///
    /// `Ok(None)` if no forecast was ever supplied, the location is unknown,
    /// or the stored forecast is malformed. A failed read is returned as an
    /// error and the forecast stays unloaded, so a later call retries.
    pub fn get_forecast(&self, location: &Location) -> StoreResult<Option<Vec<ForecastEntry>>> {
        let key = location.key();
        {
            let state = self.state.read();
            match state.forecasts.get(key) {
                Some(ForecastSlot::Loaded(forecast)) => return Ok(forecast.clone()),
                Some(ForecastSlot::Unloaded) => {}
                None => return Ok(None),
            }
        }

        // Another reader may have loaded it while the lock was released.
        let mut state = self.state.write();
        self.forecast_for_rewrite(&mut state, key)
    }

    /// Replace the cached forecast of a location with a freshly fetched one.
    ///
    /// Entries are stored in ascending time order. Returns `false` for an
    /// unknown location.
    pub fn set_forecast(
        &self,
        location: &Location,
        mut entries: Vec<ForecastEntry>,
    ) -> StoreResult<bool> {
        let mut state = self.state.write();
        let key = location.key();
        let Some(stored) = state.locations.get(key) else {
            tracing::debug!("Forecast ignored, unknown location {}", key);
            return Ok(false);
        };

        sort_forecast(&mut entries);
        self.write_location(stored, Some(&entries))?;
        tracing::debug!("Cached {} forecast entries for {}", entries.len(), key);
        state
            .forecasts
            .insert(key.clone(), ForecastSlot::Loaded(Some(entries)));
        Ok(true)
    }

    /// Queue a warning on a location. Returns `false` for an unknown location.
    pub fn push_warning(
        &self,
        location: &Location,
        message: &str,
        severity: Severity,
    ) -> StoreResult<bool> {
        self.update_location(location.key(), |location| {
            location.warnings_mut().add_warning(message, severity);
            true
        })
    }

    /// Most urgent unacknowledged warning for a location.
    pub fn next_warning(&self, location: &Location) -> Option<Warning> {
        let state = self.state.read();
        state
            .locations
            .get(location.key())?
            .warnings()
            .next_warning()
            .cloned()
    }

    /// Acknowledge the warning [`Self::next_warning`] reports and return it.
    pub fn acknowledge_warning(&self, location: &Location) -> StoreResult<Option<Warning>> {
        let mut acknowledged = None;
        self.update_location(location.key(), |location| {
            acknowledged = location.warnings_mut().acknowledge_warning();
            acknowledged.is_some()
        })?;
        Ok(acknowledged)
    }

    /// Loaded forecast of a location, pulling it from disk if it was never
    /// loaded. Metadata writes go through here so they never drop a forecast
    /// that is still only on disk.
    fn forecast_for_rewrite(
        &self,
        state: &mut StoreState,
        key: &LocationKey,
    ) -> StoreResult<Option<Vec<ForecastEntry>>> {
        match state.forecasts.get(key) {
            Some(ForecastSlot::Loaded(forecast)) => return Ok(forecast.clone()),
            Some(ForecastSlot::Unloaded) => {}
            None => return Ok(None),
        }
        let forecast = self.read_forecast(key)?;
        state
            .forecasts
            .insert(key.clone(), ForecastSlot::Loaded(forecast.clone()));
        Ok(forecast)
    }

    fn write_location(
        &self,
        location: &Location,
        forecast: Option<&[ForecastEntry]>,
    ) -> StoreResult<()> {
        let record = LocationRecord {
            latitude: location.latitude(),
            longitude: location.longitude(),
            name: location.name(),
            favourite: location.is_favourite(),
            warnings: location.warnings(),
            forecast,
        };
        let json = serde_json::to_string_pretty(&record)?;
        let path = self.location_path(location);
        fs::write(&path, json).map_err(|e| StoreError::io(&path, e))
    }

    /// Parse the forecast section of a location file. A missing file or
    /// malformed section counts as no forecast.
    fn read_forecast(&self, key: &LocationKey) -> StoreResult<Option<Vec<ForecastEntry>>> {
        let path = self.path_for(key);
        let json = match fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::io(path, e)),
        };
        match serde_json::from_str::<ForecastSection>(&json) {
            Ok(section) => Ok(section.forecast),
            Err(e) => {
                tracing::warn!("Ignoring malformed forecast in {:?}: {}", path, e);
                Ok(None)
            }
        }
    }

    fn scan_locations(&self) -> StoreResult<Vec<Location>> {
        let dir = self.data_dir.join(LOCATIONS_DIR);
        let entries = fs::read_dir(&dir).map_err(|e| StoreError::io(&dir, e))?;

        let mut locations = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry in {:?}: {}", dir, e);
                    continue;
                }
            };
            let file_name = entry.file_name();
            let Some(key) = file_name.to_str().and_then(LocationKey::parse_file_name) else {
                tracing::debug!("Skipping unrelated file {:?}", entry.path());
                continue;
            };

            let path = entry.path();
            let json = match fs::read_to_string(&path) {
                Ok(json) => json,
                Err(e) => {
                    tracing::warn!("Dropping unreadable location file {:?}: {}", path, e);
                    continue;
                }
            };
            let header: LocationHeader = match serde_json::from_str(&json) {
                Ok(header) => header,
                Err(e) => {
                    tracing::warn!("Dropping malformed location file {:?}: {}", path, e);
                    continue;
                }
            };

            let coordinates = Coordinates::new(header.latitude, header.longitude);
            if coordinates.key() != key {
                tracing::warn!(
                    "Dropping location file {:?}: name does not match coordinates {}",
                    path,
                    coordinates
                );
                continue;
            }

            locations.push(Location::restore(
                coordinates,
                header.name,
                header.favourite,
                header.warnings,
            ));
        }
        Ok(locations)
    }

    fn read_recent(&self, known: &HashMap<LocationKey, Location>) -> VecDeque<LocationKey> {
        let path = self.recent_path();
        let json = match fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => return VecDeque::new(),
            Err(e) => {
                tracing::warn!("Failed to read {:?}: {}", path, e);
                return VecDeque::new();
            }
        };
        let keys: Vec<LocationKey> = match serde_json::from_str(&json) {
            Ok(keys) => keys,
            Err(e) => {
                tracing::warn!("Ignoring malformed recents file {:?}: {}", path, e);
                return VecDeque::new();
            }
        };

        let mut recent = VecDeque::with_capacity(self.recent_capacity);
        for key in keys {
            if known.contains_key(&key) && !recent.contains(&key) {
                recent.push_back(key);
            }
        }
        recent.truncate(self.recent_capacity);
        recent
    }

    fn write_recent(&self, recent: &VecDeque<LocationKey>) -> StoreResult<()> {
        let json = serde_json::to_string_pretty(recent)?;
        let path = self.recent_path();
        fs::write(&path, json).map_err(|e| StoreError::io(&path, e))
    }
}

impl std::fmt::Debug for ForecastStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForecastStore")
            .field("data_dir", &self.data_dir)
            .field("recent_capacity", &self.recent_capacity)
            .field("locations", &self.state.read().locations.len())
            .finish()
    }
}
