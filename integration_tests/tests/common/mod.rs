//! Shared fixtures: a scripted host API and temp-file helpers.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use advisor_core::wire::TileYields;
use advisor_core::{CityFacts, Coord, HostGameApi, TileFacts};

/// A host whose answers follow a small scripted campaign: turn 1 is a
/// settler on the move, turn 2 has Rome founded.
pub struct ScriptedHost {
    pub turn: i64,
}

impl ScriptedHost {
    pub fn founded(&self) -> bool {
        self.turn >= 2
    }
}

impl HostGameApi for ScriptedHost {
    fn current_turn(&self) -> Option<i64> {
        Some(self.turn)
    }

    fn era_index(&self) -> Option<i64> {
        Some(0)
    }

    fn civilization_type(&self) -> Option<String> {
        Some("CIVILIZATION_ROME".to_string())
    }

    fn leader_type(&self) -> Option<String> {
        Some("LEADER_TRAJAN".to_string())
    }

    fn treasury(&self) -> Option<f64> {
        Some(60.0 + self.turn as f64 * 2.45)
    }

    fn gold_per_turn(&self) -> Option<f64> {
        Some(3.14159)
    }

    fn science_per_turn(&self) -> Option<f64> {
        Some(1.5)
    }

    fn current_tech(&self) -> Option<String> {
        self.founded().then(|| "TECH_MINING".to_string())
    }

    fn tech_progress_pct(&self) -> Option<f64> {
        self.founded().then_some(20.0)
    }

    fn cities(&self) -> Option<Vec<CityFacts>> {
        if !self.founded() {
            return None;
        }
        Some(vec![CityFacts {
            name: "Rome".to_string(),
            coord: Some(Coord::new(18, 20)),
            population: 1,
            production: Some("BUILDING_MONUMENT".to_string()),
            production_turns: Some(4),
            growth_turns: Some(6),
            districts: Vec::new(),
            buildings: vec![("BUILDING_PALACE".to_string(), false)],
            wonders: Vec::new(),
        }])
    }

    fn unit_sightings(&self) -> Option<Vec<String>> {
        if self.founded() {
            Some(vec!["UNIT_WARRIOR 19,21 100hp 0/2m".to_string()])
        } else {
            Some(vec![
                "UNIT_SETTLER 18,20 2/2m".to_string(),
                "UNIT_WARRIOR 19,20 100hp 2/2m".to_string(),
            ])
        }
    }

    fn threat_sightings(&self) -> Option<Vec<String>> {
        self.founded()
            .then(|| vec!["UNIT_BARBARIAN_WARRIOR (Barbarian) 21,23 d4".to_string()])
    }

    fn visible_tiles(&self) -> Option<Vec<TileFacts>> {
        if !self.founded() {
            return None;
        }
        let mut tiles = vec![
            tile(18, 21, "TERRAIN_PLAINS", Some("FEATURE_FOREST"), None, 3, 2),
            tile(19, 20, "TERRAIN_GRASSLAND", None, None, 2, 1),
            tile(17, 19, "TERRAIN_GRASSLAND", None, Some("RESOURCE_RICE"), 3, 1),
            tile(24, 20, "TERRAIN_DESERT", None, Some("RESOURCE_IRON"), 1, 2),
        ];
        for x in 10..18 {
            tiles.push(tile(x, 20, "TERRAIN_GRASSLAND", None, None, 2, 1));
        }
        Some(tiles)
    }
}

fn tile(
    x: i32,
    y: i32,
    terrain: &str,
    feature: Option<&str>,
    resource: Option<&str>,
    food: i32,
    production: i32,
) -> TileFacts {
    TileFacts {
        coord: Coord::new(x, y),
        terrain: Some(terrain.to_string()),
        feature: feature.map(str::to_string),
        resource: resource.map(str::to_string),
        yields: TileYields {
            food,
            production,
            ..TileYields::default()
        },
        structure: None,
        improved: false,
    }
}

static NEXT_FILE: AtomicUsize = AtomicUsize::new(0);

/// Unique temp path per test invocation.
pub fn temp_log(tag: &str) -> PathBuf {
    let unique = NEXT_FILE.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!(
        "turn_advisor_{tag}_{}_{unique}.log",
        std::process::id()
    ))
}

pub fn append(path: &PathBuf, text: &str) -> anyhow::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(text.as_bytes())?;
    Ok(())
}
