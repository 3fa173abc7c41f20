//! Integration tests for ForecastStore persistence.
//!
//! Each test writes through one store instance and reopens the same data
//! directory with a fresh instance, the way the app does on restart.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::fs;
use std::sync::Arc;
use std::thread;

use chrono::{TimeZone, Utc};
use tempfile::tempdir;
use trailcast_weather::{
    ForecastEntry, ForecastStore, Location, Severity, StoreError, WeatherCondition,
};

fn sample_forecast() -> Vec<ForecastEntry> {
    vec![
        ForecastEntry::new(
            Utc.with_ymd_and_hms(2026, 8, 14, 6, 0, 0).unwrap(),
            4.5,
            WeatherCondition::Fog,
        ),
        ForecastEntry::new(
            Utc.with_ymd_and_hms(2026, 8, 14, 12, 0, 0).unwrap(),
            13.0,
            WeatherCondition::PartlyCloudy,
        ),
        ForecastEntry::new(
            Utc.with_ymd_and_hms(2026, 8, 14, 18, 0, 0).unwrap(),
            9.25,
            WeatherCondition::Thunderstorm,
        ),
    ]
}

#[test]
fn test_reload_reconstructs_locations_and_forecast() {
    let dir = tempdir().unwrap();
    let snowdon = Location::with_name(53.0685, -4.0763, "Snowdon");
    let cairngorm = Location::new(57.1167, -3.6436);

    {
        let store = ForecastStore::open(dir.path(), 5).unwrap();
        store.add_new_location(snowdon.clone()).unwrap();
        store.add_new_location(cairngorm.clone()).unwrap();
        store.make_favourite(&snowdon).unwrap();
        store.set_forecast(&snowdon, sample_forecast()).unwrap();
    }

    let store = ForecastStore::open(dir.path(), 5).unwrap();
    assert_eq!(store.len(), 2);

    let reloaded = store.get(&snowdon).unwrap();
    assert_eq!(reloaded.name(), Some("Snowdon"));
    assert!(reloaded.is_favourite());
    assert_eq!(reloaded.latitude().to_bits(), 53.0685_f64.to_bits());
    assert_eq!(reloaded.longitude().to_bits(), (-4.0763_f64).to_bits());

    assert_eq!(store.get_forecast(&snowdon).unwrap().unwrap(), sample_forecast());
    assert!(store.get_forecast(&cairngorm).unwrap().is_none());
    assert_eq!(store.get_favourites(), vec![snowdon]);
}

#[test]
fn test_negative_zero_survives_reload_as_distinct_identity() {
    let dir = tempdir().unwrap();
    {
        let store = ForecastStore::open(dir.path(), 5).unwrap();
        store.add_new_location(Location::new(0.0, 10.0)).unwrap();
        store.add_new_location(Location::new(-0.0, 10.0)).unwrap();
        assert_eq!(store.len(), 2);
    }
    let store = ForecastStore::open(dir.path(), 5).unwrap();
    assert_eq!(store.len(), 2);
    assert!(store.get_location(-0.0, 10.0).is_some());
}

#[test]
fn test_recents_and_warnings_survive_reload() {
    let dir = tempdir().unwrap();
    let x = Location::new(1.0, 1.0);
    let y = Location::new(2.0, 2.0);
    let z = Location::new(3.0, 3.0);

    {
        let store = ForecastStore::open(dir.path(), 2).unwrap();
        for l in [&x, &y, &z] {
            store.add_new_location(l.clone()).unwrap();
            store.mark_viewed(l).unwrap();
        }
        store.push_warning(&y, "w1", Severity(5)).unwrap();
        store.push_warning(&y, "w2", Severity(9)).unwrap();
        store.push_warning(&y, "w3", Severity(9)).unwrap();
        store.acknowledge_warning(&y).unwrap();
    }

    let store = ForecastStore::open(dir.path(), 2).unwrap();
    assert_eq!(store.get_recent(), vec![z, y.clone()]);
    assert_eq!(store.next_warning(&y).unwrap().message(), "w3");
    store.push_warning(&y, "w4", Severity(9)).unwrap();
    store.acknowledge_warning(&y).unwrap();
    assert_eq!(store.next_warning(&y).unwrap().message(), "w4");
}

#[test]
fn test_metadata_change_keeps_unloaded_forecast() {
    let dir = tempdir().unwrap();
    let location = Location::new(46.5, 8.0);
    {
        let store = ForecastStore::open(dir.path(), 5).unwrap();
        store.add_new_location(location.clone()).unwrap();
        store.set_forecast(&location, sample_forecast()).unwrap();
    }

    {
        // Rename before the forecast was ever read in this session.
        let store = ForecastStore::open(dir.path(), 5).unwrap();
        store.rename_location(&location, "Eiger base").unwrap();
    }

    let store = ForecastStore::open(dir.path(), 5).unwrap();
    assert_eq!(store.get(&location).unwrap().name(), Some("Eiger base"));
    assert_eq!(store.get_forecast(&location).unwrap().unwrap(), sample_forecast());
}

#[test]
fn test_corrupt_forecast_is_treated_as_absent() {
    let dir = tempdir().unwrap();
    let location = Location::with_name(45.83, 6.86, "Refuge");
    let path = {
        let store = ForecastStore::open(dir.path(), 5).unwrap();
        store.add_new_location(location.clone()).unwrap();
        store.location_path(&location)
    };

    fs::write(
        &path,
        r#"{
            "latitude": 45.83,
            "longitude": 6.86,
            "name": "Refuge",
            "favourite": true,
            "forecast": [{ "time": "yesterday", "temperature": "warm" }]
        }"#,
    )
    .unwrap();

    let store = ForecastStore::open(dir.path(), 5).unwrap();
    let reloaded = store.get(&location).unwrap();
    assert_eq!(reloaded.name(), Some("Refuge"));
    assert!(reloaded.is_favourite());
    assert!(store.get_forecast(&location).unwrap().is_none());
}

#[test]
fn test_unreadable_files_are_skipped() {
    let dir = tempdir().unwrap();
    let good = Location::new(10.0, 20.0);
    let bad = Location::new(30.0, 40.0);
    let (bad_path, locations_dir) = {
        let store = ForecastStore::open(dir.path(), 5).unwrap();
        store.add_new_location(good.clone()).unwrap();
        store.add_new_location(bad.clone()).unwrap();
        store.mark_viewed(&bad).unwrap();
        let bad_path = store.location_path(&bad);
        let locations_dir = bad_path.parent().unwrap().to_path_buf();
        (bad_path, locations_dir)
    };

    fs::write(&bad_path, "{ not json").unwrap();
    fs::write(locations_dir.join("README.txt"), "not a location").unwrap();
    // Stem that does not match the coordinates inside.
    fs::copy(
        locations_dir.join(good.file_name()),
        locations_dir.join(Location::new(1.0, 1.0).file_name()),
    )
    .unwrap();

    let store = ForecastStore::open(dir.path(), 5).unwrap();
    assert_eq!(store.locations(), vec![good]);
    assert!(store.get_recent().is_empty());
}

#[test]
fn test_non_utf8_and_directory_entries_are_skipped() {
    let dir = tempdir().unwrap();
    let good = Location::with_name(10.0, 20.0, "Good");
    let binary = Location::new(30.0, 40.0);
    let (binary_path, blocked_path) = {
        let store = ForecastStore::open(dir.path(), 5).unwrap();
        store.add_new_location(good.clone()).unwrap();
        store.add_new_location(binary.clone()).unwrap();
        let blocked = Location::new(50.0, 60.0);
        (store.location_path(&binary), store.location_path(&blocked))
    };

    fs::write(&binary_path, [0xff, 0xfe, b'{']).unwrap();
    fs::create_dir(&blocked_path).unwrap();

    let store = ForecastStore::open(dir.path(), 5).unwrap();
    assert_eq!(store.locations(), vec![good.clone()]);
    assert_eq!(store.get(&good).unwrap().name(), Some("Good"));
}

#[test]
fn test_forecast_read_failure_is_reported_and_retried() {
    let dir = tempdir().unwrap();
    let location = Location::with_name(46.55, 7.98, "Jungfrau");
    {
        let store = ForecastStore::open(dir.path(), 5).unwrap();
        store.add_new_location(location.clone()).unwrap();
        store.set_forecast(&location, sample_forecast()).unwrap();
    }

    // Reopen so the forecast is still only on disk, then make it unreadable.
    let store = ForecastStore::open(dir.path(), 5).unwrap();
    let path = store.location_path(&location);
    let saved = fs::read(&path).unwrap();
    fs::remove_file(&path).unwrap();
    fs::create_dir(&path).unwrap();

    let err = store.get_forecast(&location).unwrap_err();
    assert!(matches!(err, StoreError::Io { .. }));
    let err = store.rename_location(&location, "Blocked").unwrap_err();
    assert!(matches!(err, StoreError::Io { .. }));
    assert_eq!(store.get(&location).unwrap().name(), Some("Jungfrau"));

    fs::remove_dir(&path).unwrap();
    fs::write(&path, saved).unwrap();

    assert!(store.rename_location(&location, "Jungfraujoch").unwrap());
    assert_eq!(store.get_forecast(&location).unwrap().unwrap(), sample_forecast());

    let reopened = ForecastStore::open(dir.path(), 5).unwrap();
    assert_eq!(reopened.get_forecast(&location).unwrap().unwrap(), sample_forecast());
}

#[test]
fn test_malformed_recents_file_yields_empty_list() {
    let dir = tempdir().unwrap();
    let location = Location::new(5.0, 5.0);
    {
        let store = ForecastStore::open(dir.path(), 5).unwrap();
        store.add_new_location(location.clone()).unwrap();
        store.mark_viewed(&location).unwrap();
    }
    fs::write(dir.path().join("recent.json"), "[1, 2").unwrap();

    let store = ForecastStore::open(dir.path(), 5).unwrap();
    assert!(store.get_recent().is_empty());
    assert!(store.contains(&location));
}

#[test]
fn test_removed_location_stays_removed_after_reload() {
    let dir = tempdir().unwrap();
    let keep = Location::new(1.0, 2.0);
    let gone = Location::new(3.0, 4.0);
    {
        let store = ForecastStore::open(dir.path(), 5).unwrap();
        store.add_new_location(keep.clone()).unwrap();
        store.add_new_location(gone.clone()).unwrap();
        store.mark_viewed(&gone).unwrap();
        store.set_forecast(&gone, sample_forecast()).unwrap();
        store.remove_location(&gone).unwrap();
    }

    let store = ForecastStore::open(dir.path(), 5).unwrap();
    assert_eq!(store.locations(), vec![keep]);
    assert!(store.get_forecast(&gone).unwrap().is_none());
    assert!(store.get_recent().is_empty());
}

#[test]
fn test_concurrent_writers_and_readers() {
    let dir = tempdir().unwrap();
    let store = Arc::new(ForecastStore::open(dir.path(), 5).unwrap());

    let writers: Vec<_> = (0..4)
        .map(|t| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for i in 0..10 {
                    let location = Location::new(f64::from(t), f64::from(i));
                    store.add_new_location(location.clone()).unwrap();
                    if i % 2 == 0 {
                        store.make_favourite(&location).unwrap();
                    }
                    store.mark_viewed(&location).unwrap();
                }
            })
        })
        .collect();

    let readers: Vec<_> = (0..2)
        .map(|_| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for _ in 0..50 {
                    assert!(store.get_favourites().iter().all(Location::is_favourite));
                    assert!(store.get_recent().len() <= 5);
                }
            })
        })
        .collect();

    for handle in writers.into_iter().chain(readers) {
        handle.join().unwrap();
    }

    assert_eq!(store.len(), 40);
    assert_eq!(store.get_favourites().len(), 20);
    assert_eq!(store.get_recent().len(), 5);

    let reopened = ForecastStore::open(dir.path(), 5).unwrap();
    assert_eq!(reopened.len(), 40);
    assert_eq!(reopened.get_recent(), store.get_recent());
}
