//! Charge stations and the map that locates them (SPEC_FULL.md §3).
//!
//! Kept as two clean, distinct types rather than the
//! `SimulationMap{charge_stations: dict[str, Charge]}` conflation in the
//! reference implementation, where a charge station and a charge *task*
//! were the same object. Here a station is plain data; the ephemeral
//! `Task::Charge` an agent binds to is synthesized from it on demand.

use indexmap::IndexMap;
use modutask_core::Coordinate;

#[derive(Debug, Clone)]
pub struct ChargeStation {
    pub name: String,
    coordinate: Coordinate,
    pub charging_speed: f64,
}

impl ChargeStation {
    pub fn new(name: impl Into<String>, coordinate: Coordinate, charging_speed: f64) -> Self {
        Self {
            name: name.into(),
            coordinate,
            charging_speed,
        }
    }

    pub fn coordinate(&self) -> Coordinate {
        self.coordinate
    }
}

#[derive(Debug, Clone, Default)]
pub struct SimulationMap {
    pub stations: IndexMap<String, ChargeStation>,
}

impl SimulationMap {
    pub fn new(stations: IndexMap<String, ChargeStation>) -> Self {
        Self { stations }
    }

    /// Nearest station to `from` by Euclidean distance; ties broken by
    /// catalog (insertion) order.
    pub fn nearest_station(&self, from: Coordinate) -> Option<&ChargeStation> {
        self.stations
            .values()
            .min_by(|a, b| {
                from.distance(&a.coordinate())
                    .partial_cmp(&from.distance(&b.coordinate()))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearest_station_picks_closest() {
        let mut stations = IndexMap::new();
        stations.insert(
            "far".to_string(),
            ChargeStation::new("far", Coordinate::new(100.0, 0.0), 1.0),
        );
        stations.insert(
            "near".to_string(),
            ChargeStation::new("near", Coordinate::new(1.0, 0.0), 1.0),
        );
        let map = SimulationMap::new(stations);
        let nearest = map.nearest_station(Coordinate::new(0.0, 0.0)).unwrap();
        assert_eq!(nearest.name, "near");
    }
}
