use serde::Serialize;

use crate::model::City;

/// Favorite cities, most recently added first, without duplicates.
///
/// There is no capacity bound.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FavoriteCities(Vec<City>);

impl FavoriteCities {
    /// Prepend `city` unless it is already in the list.
    ///
    /// Returns `false` when nothing changed.
    pub fn add(&mut self, city: City) -> bool {
        if self.contains(&city) {
            return false;
        }
        self.0.insert(0, city);
        true
    }

    /// Drop the oldest entry (the tail), keeping the order of the rest.
    pub fn remove_oldest(&mut self) -> Option<City> {
        self.0.pop()
    }

    pub fn contains(&self, city: &City) -> bool {
        self.0.contains(city)
    }

    pub fn as_slice(&self) -> &[City] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, City> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a FavoriteCities {
    type Item = &'a City;
    type IntoIter = std::slice::Iter<'a, City>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
