use std::fmt;

use serde::{Deserialize, Serialize};

/// A position on the game's native grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
}

impl Coord {
    pub const ORIGIN: Coord = Coord { x: 0, y: 0 };

    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Capital-relative projection: this coordinate translated so `origin`
    /// sits at (0,0).
    pub fn offset_from(self, origin: Coord) -> Coord {
        Coord::new(self.x - origin.x, self.y - origin.y)
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

/// Movement-cost approximation for the game's staggered hex grid.
///
/// Downstream thresholds (fog caps, interest filters) are tuned against this
/// metric; do not substitute Euclidean or plain Chebyshev distance.
pub fn distance(a: Coord, b: Coord) -> i32 {
    let dx = (a.x - b.x).abs();
    let dy = (a.y - b.y).abs();
    dx.max(dy) + dx.min(dy) / 2
}

/// The single sorting routine behind every list-valued snapshot section:
/// stable ascending by distance from the capital, ties keeping input order.
/// Records with no resolvable coordinate sort after all records with one,
/// also in input order.
pub fn sort_by_capital_distance<T>(
    items: &mut [T],
    capital: Coord,
    coord_of: impl Fn(&T) -> Option<Coord>,
) {
    items.sort_by_key(|item| match coord_of(item) {
        Some(coord) => distance(coord, capital),
        None => i32::MAX,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_to_self_is_zero() {
        for coord in [Coord::ORIGIN, Coord::new(7, -3), Coord::new(-20, 41)] {
            assert_eq!(distance(coord, coord), 0);
        }
    }

    #[test]
    fn distance_is_symmetric() {
        let a = Coord::new(3, 9);
        let b = Coord::new(-4, 2);
        assert_eq!(distance(a, b), distance(b, a));
    }

    #[test]
    fn hex_metric_beats_chebyshev_on_diagonals() {
        // Straight line: same as Chebyshev.
        assert_eq!(distance(Coord::ORIGIN, Coord::new(3, 0)), 3);
        // Diagonal movement pays half the minor axis.
        assert_eq!(distance(Coord::ORIGIN, Coord::new(2, 3)), 4);
        assert_eq!(distance(Coord::ORIGIN, Coord::new(5, 5)), 7);
    }

    #[test]
    fn sort_is_stable_for_equal_distances() {
        let capital = Coord::ORIGIN;
        let mut items = vec![
            ("far", Coord::new(4, 0)),
            ("a", Coord::new(0, 2)),
            ("b", Coord::new(2, 0)),
            ("c", Coord::new(-2, 0)),
        ];
        sort_by_capital_distance(&mut items, capital, |item| Some(item.1));
        let names: Vec<&str> = items.iter().map(|item| item.0).collect();
        assert_eq!(names, vec!["a", "b", "c", "far"]);
    }

    #[test]
    fn coordless_records_sort_last_in_input_order() {
        let mut items: Vec<(&str, Option<Coord>)> = vec![
            ("x", None),
            ("near", Some(Coord::new(1, 0))),
            ("y", None),
        ];
        sort_by_capital_distance(&mut items, Coord::ORIGIN, |item| item.1);
        let names: Vec<&str> = items.iter().map(|item| item.0).collect();
        assert_eq!(names, vec!["near", "x", "y"]);
    }
}
