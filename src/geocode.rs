use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::types::{Coordinate, Employee, Target};

/// Turns a free-text location query into a coordinate.
pub trait Geocoder {
    fn locate(&self, query: &str) -> Option<Coordinate>;
}

/// A fixed lookup table of already geocoded queries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaceBook(pub BTreeMap<String, Coordinate>);

impl PlaceBook {
    pub fn insert(&mut self, query: impl Into<String>, location: Coordinate) {
        self.0.insert(query.into(), location);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Geocoder for PlaceBook {
    fn locate(&self, query: &str) -> Option<Coordinate> {
        self.0.get(query).copied()
    }
}

pub fn employee_query(employee: &Employee, country: &str) -> String {
    format!("{}, {}, {}", employee.city, employee.address, country)
}

pub fn target_query(target: &Target) -> String {
    format!("{}, {}, {}", target.city, target.address, target.country)
}

/// Fill in every missing location. Known locations are never overwritten.
/// Returns how many lookups failed; those entries keep `None`.
pub fn geocode_all(
    geocoder: &impl Geocoder,
    employees: &mut [Employee],
    targets: &mut [Target],
    country: &str,
) -> usize {
    let mut misses = 0;

    for target in targets.iter_mut().filter(|t| t.location.is_none()) {
        let query = target_query(target);
        match geocoder.locate(&query) {
            Some(location) => {
                debug!(number = target.number, ?location, "geocoded target");
                target.location = Some(location);
            }
            None => {
                warn!(number = target.number, %query, "could not geocode target");
                misses += 1;
            }
        }
    }

    for employee in employees.iter_mut().filter(|e| e.location.is_none()) {
        let query = employee_query(employee, country);
        match geocoder.locate(&query) {
            Some(location) => {
                debug!(employee = %employee.name, ?location, "geocoded employee");
                employee.location = Some(location);
            }
            None => {
                warn!(employee = %employee.name, %query, "could not geocode employee");
                misses += 1;
            }
        }
    }

    misses
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queries_follow_city_address_country() {
        let mut employee = Employee::new(1, "Anna");
        employee.city = "Utrecht".into();
        employee.address = "Stationsplein 1".into();
        assert_eq!(
            employee_query(&employee, "Netherlands"),
            "Utrecht, Stationsplein 1, Netherlands"
        );

        let mut target = Target::new(3, 1);
        target.city = "Gent".into();
        target.address = "Korenmarkt 2".into();
        target.country = "Belgium".into();
        assert_eq!(target_query(&target), "Gent, Korenmarkt 2, Belgium");
    }

    #[test]
    fn only_missing_locations_are_filled() {
        let known = Coordinate::new(1.0, 1.0);
        let looked_up = Coordinate::new(2.0, 2.0);

        let mut book = PlaceBook::default();
        book.insert(", , Netherlands", looked_up);
        book.insert(", , ", looked_up);

        let mut employees = vec![Employee::new(1, "Anna").at(known), Employee::new(2, "Bob")];
        let mut targets = vec![Target::new(1, 1)];

        let misses = geocode_all(&book, &mut employees, &mut targets, "Netherlands");

        assert_eq!(misses, 0);
        assert_eq!(employees[0].location, Some(known));
        assert_eq!(employees[1].location, Some(looked_up));
        assert_eq!(targets[0].location, Some(looked_up));
    }

    #[test]
    fn misses_are_counted_and_left_empty() {
        let mut employees = vec![Employee::new(1, "Anna")];
        let mut targets = vec![Target::new(1, 1)];

        let misses = geocode_all(&PlaceBook::default(), &mut employees, &mut targets, "Netherlands");

        assert_eq!(misses, 2);
        assert!(employees[0].location.is_none());
        assert!(targets[0].location.is_none());
    }
}
