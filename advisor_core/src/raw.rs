//! Typed view of one decoded snapshot block, exactly as the producer wrote
//! it. Decoding is defensive end to end: the producer's API surface is
//! unreliable across execution contexts, so every field may be absent and an
//! absent list means the same thing as an empty one. A malformed record is
//! dropped, never fatal.

use serde::Serialize;
use state_codec::{Value, ValueMap};
use tracing::debug;

use crate::spatial::Coord;
use crate::wire::parse_coord_pair;

/// Producer sentinel for "no production chosen". A production item actually
/// named "None" would misfire here; kept as-is pending upstream clarification.
pub const NO_PRODUCTION_SENTINEL: &str = "None";
/// Producer sentinel for an unknown turn counter.
pub const UNKNOWN_TURN: i64 = -1;

/// The era field arrives as a host index or an already-resolved name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum EraField {
    Index(i64),
    Name(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletedItem {
    pub name: String,
    pub cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CityRecord {
    pub name: String,
    pub coord_text: Option<String>,
    pub population: i64,
    /// Raw production name; [`NO_PRODUCTION_SENTINEL`] or empty means idle.
    pub production: Option<String>,
    pub production_turns: Option<i64>,
    pub growth_turns: Option<i64>,
    /// District names, `*`-suffixed while under construction.
    pub districts: Vec<String>,
    /// Building names, `!`-suffixed for wonders.
    pub buildings: Vec<String>,
    /// Wonder placements, `"Name x,y"`.
    pub wonders: Vec<String>,
}

impl CityRecord {
    pub fn coord(&self) -> Option<Coord> {
        self.coord_text.as_deref().and_then(parse_coord_pair)
    }

    pub fn needs_production(&self) -> bool {
        match self.production.as_deref() {
            None | Some("") | Some(NO_PRODUCTION_SENTINEL) => true,
            Some(_) => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiploEntry {
    pub civ: String,
    pub status: String,
    pub leader: Option<String>,
    pub score: Option<i64>,
    pub military: Option<i64>,
    pub culture_per_turn: Option<f64>,
    pub science_per_turn: Option<f64>,
    pub tourism: Option<i64>,
    pub gold: Option<f64>,
}

impl DiploEntry {
    /// Membership key for delta tracking.
    pub fn key(&self) -> String {
        format!("{}:{}", self.civ, self.status)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawSnapshot {
    pub turn: i64,
    pub era: Option<EraField>,
    pub civilization: Option<String>,
    pub leader: Option<String>,
    pub gold: f64,
    pub gold_per_turn: f64,
    pub science_per_turn: f64,
    pub culture_per_turn: f64,
    pub faith_per_turn: f64,
    pub faith_balance: f64,
    pub tech: Option<String>,
    pub tech_pct: f64,
    pub needs_tech_hint: bool,
    pub civic: Option<String>,
    pub civic_pct: f64,
    pub needs_civic_hint: bool,
    pub completed_techs: Vec<CompletedItem>,
    pub completed_civics: Vec<CompletedItem>,
    pub cities: Vec<CityRecord>,
    pub units: Vec<String>,
    pub threats: Vec<String>,
    pub diplomacy: Vec<DiploEntry>,
    pub city_states: Vec<String>,
    pub trade_routes: Vec<String>,
    pub foreign_cities: Vec<String>,
    pub foreign_tiles: Vec<String>,
    pub tiles: Vec<String>,
}

impl Default for RawSnapshot {
    fn default() -> Self {
        Self {
            turn: UNKNOWN_TURN,
            era: None,
            civilization: None,
            leader: None,
            gold: 0.0,
            gold_per_turn: 0.0,
            science_per_turn: 0.0,
            culture_per_turn: 0.0,
            faith_per_turn: 0.0,
            faith_balance: 0.0,
            tech: None,
            tech_pct: 0.0,
            needs_tech_hint: false,
            civic: None,
            civic_pct: 0.0,
            needs_civic_hint: false,
            completed_techs: Vec::new(),
            completed_civics: Vec::new(),
            cities: Vec::new(),
            units: Vec::new(),
            threats: Vec::new(),
            diplomacy: Vec::new(),
            city_states: Vec::new(),
            trade_routes: Vec::new(),
            foreign_cities: Vec::new(),
            foreign_tiles: Vec::new(),
            tiles: Vec::new(),
        }
    }
}

impl RawSnapshot {
    pub fn from_value(value: &Value) -> RawSnapshot {
        let Some(map) = value.as_map() else {
            debug!(
                target: "turn_advisor::raw",
                "snapshot root is not a map; treating as empty"
            );
            return RawSnapshot::default();
        };

        RawSnapshot {
            turn: int_field(map, "turn", UNKNOWN_TURN),
            era: era_field(map),
            civilization: text_field(map, "civ"),
            leader: text_field(map, "leader"),
            gold: num_field(map, "gold"),
            gold_per_turn: num_field(map, "gpt"),
            science_per_turn: num_field(map, "sci"),
            culture_per_turn: num_field(map, "cul"),
            faith_per_turn: num_field(map, "faith"),
            faith_balance: num_field(map, "faithBal"),
            tech: text_field(map, "tech"),
            tech_pct: num_field(map, "techPct"),
            needs_tech_hint: bool_field(map, "needsTech"),
            civic: text_field(map, "civic"),
            civic_pct: num_field(map, "civicPct"),
            needs_civic_hint: bool_field(map, "needsCivic"),
            completed_techs: completed_list(map, "completed_techs"),
            completed_civics: completed_list(map, "completed_civics"),
            cities: city_list(map),
            units: text_list(map, "units"),
            threats: text_list(map, "threats"),
            diplomacy: diplo_list(map),
            city_states: text_list(map, "cs"),
            trade_routes: text_list(map, "trade"),
            foreign_cities: text_list(map, "foreign_cities"),
            foreign_tiles: text_list(map, "foreign_tiles"),
            tiles: text_list(map, "tiles"),
        }
    }
}

fn text_field(map: &ValueMap, key: &str) -> Option<String> {
    map.get(key)
        .and_then(|value| value.as_str().map(str::to_string))
        .filter(|text| !text.is_empty())
}

fn num_field(map: &ValueMap, key: &str) -> f64 {
    map.get(key).and_then(|value| value.as_f64()).unwrap_or(0.0)
}

fn int_field(map: &ValueMap, key: &str, default: i64) -> i64 {
    map.get(key)
        .and_then(|value| value.as_i64())
        .unwrap_or(default)
}

fn bool_field(map: &ValueMap, key: &str) -> bool {
    map.get(key)
        .and_then(|value| value.as_bool())
        .unwrap_or(false)
}

fn era_field(map: &ValueMap) -> Option<EraField> {
    match map.get("era") {
        Some(Value::Number(n)) => Some(EraField::Index(n as i64)),
        Some(Value::Text(name)) if !name.is_empty() => Some(EraField::Name(name)),
        _ => None,
    }
}

/// Flat string list; absent and empty are the same thing, non-string items
/// are dropped.
fn text_list(map: &ValueMap, key: &str) -> Vec<String> {
    let Some(value) = map.get(key) else {
        return Vec::new();
    };
    let Some(list) = value.as_list() else {
        debug!(target: "turn_advisor::raw", field = key, "expected a list; ignoring");
        return Vec::new();
    };
    let result = list.items()
        .iter()
        .filter_map(|item| item.as_str().map(str::to_string))
        .collect();
    result
}

fn completed_list(map: &ValueMap, key: &str) -> Vec<CompletedItem> {
    let Some(list) = map.get(key).and_then(|value| value.as_list().cloned()) else {
        return Vec::new();
    };
    let result = list.items()
        .iter()
        .filter_map(|item| {
            let entry = item.as_map()?;
            Some(CompletedItem {
                name: text_field(entry, "name")?,
                cost: num_field(entry, "cost"),
            })
        })
        .collect();
    result
}

fn city_list(map: &ValueMap) -> Vec<CityRecord> {
    let Some(list) = map.get("cities").and_then(|value| value.as_list().cloned()) else {
        return Vec::new();
    };
    let result = list.items()
        .iter()
        .filter_map(|item| {
            let Some(entry) = item.as_map() else {
                debug!(target: "turn_advisor::raw", "dropping malformed city record");
                return None;
            };
            Some(CityRecord {
                name: text_field(entry, "n").unwrap_or_else(|| "?".to_string()),
                coord_text: text_field(entry, "xy"),
                population: int_field(entry, "pop", 0),
                production: text_field(entry, "bld"),
                production_turns: match int_field(entry, "turns", -1) {
                    turns if turns >= 0 => Some(turns),
                    _ => None,
                },
                growth_turns: match int_field(entry, "grow", -1) {
                    turns if turns >= 0 => Some(turns),
                    _ => None,
                },
                districts: string_items(entry, "districts"),
                buildings: string_items(entry, "buildings"),
                wonders: string_items(entry, "wonders"),
            })
        })
        .collect();
    result
}

fn string_items(map: &ValueMap, key: &str) -> Vec<String> {
    map.get(key)
        .and_then(|value| value.as_list().cloned())
        .map(|list| {
            list.items()
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

fn diplo_list(map: &ValueMap) -> Vec<DiploEntry> {
    let Some(list) = map.get("diplo").and_then(|value| value.as_list().cloned()) else {
        return Vec::new();
    };
    let result = list.items()
        .iter()
        .filter_map(|item| {
            let entry = item.as_map()?;
            Some(DiploEntry {
                civ: text_field(entry, "civ")?,
                status: text_field(entry, "status").unwrap_or_else(|| "?".to_string()),
                leader: text_field(entry, "leader"),
                score: opt_int(entry, "score"),
                military: opt_int(entry, "military"),
                culture_per_turn: opt_num(entry, "culture_pt"),
                science_per_turn: opt_num(entry, "science_pt"),
                tourism: opt_int(entry, "tourism"),
                gold: opt_num(entry, "gold"),
            })
        })
        .collect();
    result
}

fn opt_int(map: &ValueMap, key: &str) -> Option<i64> {
    map.get(key).and_then(|value| value.as_i64())
}

fn opt_num(map: &ValueMap, key: &str) -> Option<f64> {
    map.get(key).and_then(|value| value.as_f64())
}
