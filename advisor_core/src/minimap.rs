//! Capital-centered tactical mini-map.
//!
//! Projects absolute coordinates into capital-relative space and renders a
//! bounded grid of two-character glyphs. The grid is a visual aid only:
//! entities outside the radius stay in the flat text lists, they are just
//! not drawn.

use std::fmt;

use serde::Serialize;

use crate::spatial::Coord;
use crate::tables::{unit_glyph, GLYPH_LEGEND};
use crate::wire::{ThreatSighting, TileObservation, UnitSighting};

/// Hard ceiling on the configured radius; a 25x25 grid is already at the
/// edge of readable.
pub const MAX_RADIUS: i32 = 12;

const FOG_GLYPH: &str = "??";
const VOID_GLYPH: &str = "  ";
const OPEN_GLYPH: &str = "--";

/// City position as the renderer needs it.
#[derive(Debug, Clone, Copy)]
pub struct CityMarker {
    pub coord: Coord,
    pub is_capital: bool,
}

/// Cell classification, lowest to highest precedence. Ties resolve by this
/// order, never by insertion order. Fog is the initial fill and the only
/// class nothing ever places, so any observation replaces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum CellPriority {
    Fog,
    Open,
    Feature,
    OwnUnit,
    BarbarianUnit,
    HostileUnit,
    City,
    Capital,
}

#[derive(Debug, Clone)]
struct Cell {
    glyph: String,
    priority: CellPriority,
}

/// Rendered grid plus the legend of glyphs it actually uses.
#[derive(Debug, Clone, Serialize)]
pub struct MiniMap {
    pub radius: i32,
    pub centered_on: String,
    pub rows: Vec<String>,
    pub legend: Vec<String>,
}

impl fmt::Display for MiniMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dim = 2 * self.radius + 1;
        writeln!(
            f,
            "Tactical View ({dim}x{dim}, {}-centered):",
            self.centered_on
        )?;
        if !self.legend.is_empty() {
            writeln!(f, "Legend: {}", self.legend.join(" "))?;
        }
        for row in &self.rows {
            writeln!(f, "{row}")?;
        }
        Ok(())
    }
}

/// Render the scene around `reference` (drawn at the grid center).
pub fn render(
    cities: &[CityMarker],
    units: &[UnitSighting],
    threats: &[ThreatSighting],
    tiles: &[TileObservation],
    reference: Coord,
    radius: i32,
    centered_on: &str,
) -> MiniMap {
    let radius = radius.clamp(1, MAX_RADIUS);
    let dim = (2 * radius + 1) as usize;
    let mut cells = vec![
        Cell {
            glyph: FOG_GLYPH.to_string(),
            priority: CellPriority::Fog,
        };
        dim * dim
    ];

    let index_of = |coord: Coord| -> Option<usize> {
        let rel = coord.offset_from(reference);
        if rel.x.abs() > radius || rel.y.abs() > radius {
            return None;
        }
        let col = (rel.x + radius) as usize;
        let row = (radius - rel.y) as usize;
        Some(row * dim + col)
    };

    let mut place = |coord: Coord, priority: CellPriority, glyph: String| {
        if let Some(index) = index_of(coord) {
            let cell = &mut cells[index];
            if priority > cell.priority {
                *cell = Cell { glyph, priority };
            }
        }
    };

    for tile in tiles {
        let (glyph, priority) = tile_glyph(tile);
        place(tile.coord, priority, glyph.to_string());
    }
    for unit in units {
        if let Some(coord) = unit.coord {
            place(coord, CellPriority::OwnUnit, unit_glyph(&unit.kind));
        }
    }
    for threat in threats {
        if let Some(coord) = threat.coord {
            if threat.is_barbarian() {
                place(coord, CellPriority::BarbarianUnit, "!B".to_string());
            } else {
                place(coord, CellPriority::HostileUnit, "!E".to_string());
            }
        }
    }
    for city in cities {
        if city.is_capital {
            place(city.coord, CellPriority::Capital, "C*".to_string());
        } else {
            place(city.coord, CellPriority::City, "Ct".to_string());
        }
    }

    void_deep_fog(&mut cells, dim);

    let mut used: Vec<&str> = Vec::new();
    for cell in &cells {
        if cell.glyph != VOID_GLYPH && !used.contains(&cell.glyph.as_str()) {
            used.push(cell.glyph.as_str());
        }
    }
    let legend = GLYPH_LEGEND
        .iter()
        .filter(|(glyph, _)| used.contains(glyph))
        .map(|(glyph, label)| format!("{glyph}={label}"))
        .collect();

    let mut rows = Vec::with_capacity(dim);
    for row in 0..dim {
        let rel_y = radius - row as i32;
        let label = if rel_y == 0 {
            "  0".to_string()
        } else {
            format!("{rel_y:+3}")
        };
        let line = cells[row * dim..(row + 1) * dim]
            .iter()
            .map(|cell| format!("[{}]", cell.glyph))
            .collect::<Vec<_>>()
            .join(" ");
        rows.push(format!("{label} {line}"));
    }

    MiniMap {
        radius,
        centered_on: centered_on.to_string(),
        rows,
        legend,
    }
}

fn tile_glyph(tile: &TileObservation) -> (&'static str, CellPriority) {
    let content = tile.description.to_ascii_lowercase();
    let glyph = if content.contains("mountain") {
        "^^"
    } else if content.contains("hill") {
        "/\\"
    } else if content.contains("forest") {
        "Fo"
    } else if content.contains("jungle") || content.contains("rainforest") {
        "Jg"
    } else if content.contains("marsh") {
        "Ms"
    } else if content.contains("desert") {
        ".."
    } else if content.contains("ocean") || content.contains("coast") {
        "::"
    } else if tile.improved {
        "Im"
    } else {
        return (OPEN_GLYPH, CellPriority::Open);
    };
    (glyph, CellPriority::Feature)
}

/// Replace fog cells with blank space when every in-grid neighbour is also
/// fog; the reader only needs the fog frontier, not a wall of `??`.
fn void_deep_fog(cells: &mut [Cell], dim: usize) {
    let fog: Vec<bool> = cells
        .iter()
        .map(|cell| cell.priority == CellPriority::Fog)
        .collect();
    for row in 0..dim {
        for col in 0..dim {
            let index = row * dim + col;
            if !fog[index] {
                continue;
            }
            let mut deep = true;
            'neighbours: for dr in -1i32..=1 {
                for dc in -1i32..=1 {
                    if dr == 0 && dc == 0 {
                        continue;
                    }
                    let nr = row as i32 + dr;
                    let nc = col as i32 + dc;
                    if nr < 0 || nc < 0 || nr >= dim as i32 || nc >= dim as i32 {
                        continue;
                    }
                    if !fog[nr as usize * dim + nc as usize] {
                        deep = false;
                        break 'neighbours;
                    }
                }
            }
            if deep {
                cells[index].glyph = VOID_GLYPH.to_string();
                cells[index].priority = CellPriority::Open;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene() -> (Vec<CityMarker>, Vec<UnitSighting>, Vec<ThreatSighting>, Vec<TileObservation>) {
        let cities = vec![CityMarker {
            coord: Coord::new(5, 5),
            is_capital: true,
        }];
        let units = vec![UnitSighting::parse("UNIT_WARRIOR 4,5 100hp 2/2m").unwrap()];
        let threats =
            vec![ThreatSighting::parse("UNIT_BARBARIAN_WARRIOR (Barbarian) 6,6 d2").unwrap()];
        let tiles = vec![
            TileObservation::parse("5,6: Plains Forest (2f,2p)").unwrap(),
            TileObservation::parse("3,3: Desert (0f,1p)").unwrap(),
        ];
        (cities, units, threats, tiles)
    }

    #[test]
    fn capital_lands_at_the_grid_center() {
        let (cities, units, threats, tiles) = scene();
        let map = render(&cities, &units, &threats, &tiles, Coord::new(5, 5), 2, "Capital");
        assert_eq!(map.rows.len(), 5);
        // Center row, center cell.
        assert_eq!(map.rows[2], "  0 [??] [Wr] [C*] [??] [??]");
    }

    #[test]
    fn out_of_radius_entities_are_omitted_from_the_grid() {
        let (cities, mut units, threats, tiles) = scene();
        units.push(UnitSighting::parse("UNIT_SCOUT 8,5 100hp 3/3m").unwrap());
        let map = render(&cities, &units, &threats, &tiles, Coord::new(5, 5), 2, "Capital");
        let body = map.rows.join("\n");
        assert!(!body.contains("Sc"));
        // The in-radius warrior still renders.
        assert!(body.contains("[Wr]"));
    }

    #[test]
    fn priority_resolves_stacked_cells() {
        let cities = vec![CityMarker {
            coord: Coord::new(5, 5),
            is_capital: true,
        }];
        // A threat and a tile share the capital's cell; the capital wins.
        let threats =
            vec![ThreatSighting::parse("UNIT_BARBARIAN_WARRIOR (Barbarian) 5,5 d0").unwrap()];
        let tiles = vec![TileObservation::parse("5,5: Plains Forest (2f,2p)").unwrap()];
        let map = render(&cities, &[], &threats, &tiles, Coord::new(5, 5), 1, "Capital");
        assert_eq!(map.rows[1], "  0 [??] [C*] [??]");
    }

    #[test]
    fn explored_open_ground_replaces_fog() {
        let cities = vec![CityMarker {
            coord: Coord::new(5, 5),
            is_capital: true,
        }];
        let tiles = vec![TileObservation::parse("6,5: Grassland (2f,1p)").unwrap()];
        let map = render(&cities, &[], &[], &tiles, Coord::new(5, 5), 1, "Capital");
        assert_eq!(map.rows[1], "  0 [??] [C*] [--]");
    }

    #[test]
    fn deep_fog_is_voided_but_the_frontier_survives() {
        let (cities, units, threats, tiles) = scene();
        let map = render(&cities, &units, &threats, &tiles, Coord::new(5, 5), 2, "Capital");
        assert_eq!(
            map.rows,
            vec![
                " +2 [  ] [??] [??] [??] [??]",
                " +1 [??] [??] [Fo] [!B] [??]",
                "  0 [??] [Wr] [C*] [??] [??]",
                " -1 [??] [??] [??] [??] [  ]",
                " -2 [..] [??] [  ] [  ] [  ]",
            ]
        );
    }

    #[test]
    fn legend_lists_only_used_glyphs_in_importance_order() {
        let (cities, units, threats, tiles) = scene();
        let map = render(&cities, &units, &threats, &tiles, Coord::new(5, 5), 2, "Capital");
        insta::assert_snapshot!(
            map.legend.join(" "),
            @"C*=Capital(0,0) !B=Barb Wr=Warrior Fo=Forest ..=Desert ??=Fog"
        );
    }

    #[test]
    fn display_carries_header_and_legend() {
        let (cities, units, threats, tiles) = scene();
        let map = render(&cities, &units, &threats, &tiles, Coord::new(5, 5), 2, "Capital");
        let text = map.to_string();
        assert!(text.starts_with("Tactical View (5x5, Capital-centered):\n"));
        assert!(text.contains("Legend: C*=Capital(0,0)"));
    }
}
