//! The tracked location entity.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use crate::identity::{Coordinates, LocationKey};
use crate::warnings::WarningsContainer;

/// A geographic point tracked by the user.
///
/// Identity is the coordinate pair alone: `==` and `Hash` ignore the name,
/// the favourite flag and pending warnings.
#[derive(Debug, Clone)]
pub struct Location {
    coordinates: Coordinates,
    key: LocationKey,
    name: Option<String>,
    favourite: bool,
    warnings: WarningsContainer,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        let coordinates = Coordinates::new(latitude, longitude);
        Self {
            key: coordinates.key(),
            coordinates,
            name: None,
            favourite: false,
            warnings: WarningsContainer::new(),
        }
    }

    pub fn with_name(latitude: f64, longitude: f64, name: impl Into<String>) -> Self {
        let mut location = Self::new(latitude, longitude);
        location.rename(name);
        location
    }

    pub(crate) fn restore(
        coordinates: Coordinates,
        name: Option<String>,
        favourite: bool,
        warnings: WarningsContainer,
    ) -> Self {
        Self {
            key: coordinates.key(),
            coordinates,
            name,
            favourite,
            warnings,
        }
    }

    pub fn latitude(&self) -> f64 {
        self.coordinates.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.coordinates.longitude
    }

    pub fn coordinates(&self) -> Coordinates {
        self.coordinates
    }

    /// Identity key, fixed at construction.
    pub fn key(&self) -> &LocationKey {
        &self.key
    }

    /// Name of the file holding this location's persisted data.
    pub fn file_name(&self) -> String {
        self.key.file_name()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Name if set, otherwise the coordinates as `(lat,lon)`.
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => self.coordinates.to_string(),
        }
    }

    /// Replace the display name. A blank name clears it.
    pub fn rename(&mut self, new_name: impl Into<String>) {
        let new_name = new_name.into();
        self.name = if new_name.trim().is_empty() {
            None
        } else {
            Some(new_name)
        };
    }

    pub fn is_favourite(&self) -> bool {
        self.favourite
    }

    pub fn toggle_favourite(&mut self) {
        self.favourite = !self.favourite;
    }

    pub fn warnings(&self) -> &WarningsContainer {
        &self.warnings
    }

    pub fn warnings_mut(&mut self) -> &mut WarningsContainer {
        &mut self.warnings
    }

    /// Order used for favourite and location lists.
    ///
    /// Favourites first, then by name with unnamed locations leading, then by
    /// latitude and longitude.
    pub fn display_cmp(&self, other: &Self) -> Ordering {
        other
            .favourite
            .cmp(&self.favourite)
            .then_with(|| match (&self.name, &other.name) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
                (Some(a), Some(b)) => a.cmp(b),
            })
            .then_with(|| self.latitude().total_cmp(&other.latitude()))
            .then_with(|| self.longitude().total_cmp(&other.longitude()))
    }
}

impl PartialEq for Location {
    fn eq(&self, other: &Self) -> bool {
        self.coordinates == other.coordinates
    }
}

impl Eq for Location {}

impl Hash for Location {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.coordinates.hash(state);
    }
}

/// Sort locations into display order.
pub fn sort_for_display(locations: &mut [Location]) {
    locations.sort_by(Location::display_cmp);
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use crate::warnings::Severity;
    use std::collections::HashSet;

    fn favourite(mut location: Location) -> Location {
        location.toggle_favourite();
        location
    }

    #[test]
    fn test_identity_ignores_name_and_favourite() {
        let a = Location::with_name(46.0, 7.0, "Grindelwald");
        let b = favourite(Location::with_name(46.0, 7.0, "Somewhere else"));
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(!set.insert(b));
        assert!(set.insert(Location::new(46.0, 7.000001)));
    }

    #[test]
    fn test_rename_keeps_identity_and_file() {
        let mut location = Location::new(56.7969, -5.0036);
        let key = location.key().clone();
        let file = location.file_name();

        location.rename("Ben Nevis");
        assert_eq!(location.name(), Some("Ben Nevis"));
        assert_eq!(location.key(), &key);
        assert_eq!(location.file_name(), file);
        assert_eq!(location, Location::new(56.7969, -5.0036));
    }

    #[test]
    fn test_blank_rename_clears_name() {
        let mut location = Location::with_name(1.0, 2.0, "Camp");
        location.rename("   ");
        assert_eq!(location.name(), None);
        assert_eq!(location.display_name(), "(1,2)");
    }

    #[test]
    fn test_toggle_favourite() {
        let mut location = Location::new(0.5, 0.5);
        assert!(!location.is_favourite());
        location.toggle_favourite();
        assert!(location.is_favourite());
        location.toggle_favourite();
        assert!(!location.is_favourite());
    }

    #[test]
    fn test_display_order_favourites_then_unnamed_then_name() {
        let a = Location::with_name(10.0, 10.0, "Zed");
        let b = favourite(Location::with_name(20.0, 20.0, "Ant"));
        let c = favourite(Location::new(30.0, 30.0));

        let mut list = vec![a.clone(), b.clone(), c.clone()];
        sort_for_display(&mut list);
        assert_eq!(list, vec![c, b, a]);
    }

    #[test]
    fn test_display_order_tie_breaks_on_coordinates() {
        let north = Location::with_name(50.0, 1.0, "Hut");
        let south = Location::with_name(40.0, 9.0, "Hut");
        let south_east = Location::with_name(40.0, 10.0, "Hut");

        let mut list = vec![north.clone(), south_east.clone(), south.clone()];
        sort_for_display(&mut list);
        assert_eq!(list, vec![south, south_east, north]);
    }

    #[test]
    fn test_display_cmp_is_consistent() {
        let samples = vec![
            Location::new(1.0, 1.0),
            Location::new(-1.0, 1.0),
            Location::with_name(1.0, 2.0, "B"),
            Location::with_name(1.0, 3.0, "A"),
            favourite(Location::new(5.0, 5.0)),
            favourite(Location::with_name(6.0, 6.0, "A")),
        ];
        for x in &samples {
            assert_eq!(x.display_cmp(x), Ordering::Equal);
            for y in &samples {
                assert_eq!(x.display_cmp(y), y.display_cmp(x).reverse());
            }
        }
    }

    #[test]
    fn test_warnings_are_owned_per_location() {
        let mut location = Location::new(45.8326, 6.8652);
        location
            .warnings_mut()
            .add_warning("Thunderstorms after 14:00", Severity::WARNING);
        assert_eq!(location.warnings().len(), 1);
        assert!(Location::new(45.8326, 6.8652).warnings().is_empty());
    }
}
