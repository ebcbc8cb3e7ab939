//! Enrichment pipeline: one raw snapshot in, one prompt-ready enriched
//! snapshot plus a change set out.
//!
//! The pipeline owns the previous-snapshot reference exclusively; nothing
//! else reads or replaces it. Failures stay record-local: a malformed entry
//! is dropped with a debug event and enrichment continues.

use serde::Serialize;
use tracing::{debug, info};

use crate::config::AdvisorConfig;
use crate::delta::{compute_delta, ChangeSet};
use crate::fog::trim_tiles;
use crate::minimap::{render, CityMarker, MiniMap};
use crate::normalize::{normalize, normalize_in_text};
use crate::raw::{CityRecord, EraField, RawSnapshot};
use crate::spatial::{distance, sort_by_capital_distance, Coord};
use crate::tables::era_name;
use crate::wire::{
    trailing_coord, ThreatSighting, TileObservation, UnitSighting, WonderSite,
};

/// What the coordinate projection is anchored on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReferenceKind {
    Capital,
    Settler,
    Unit,
    Origin,
}

impl ReferenceKind {
    pub fn label(self) -> &'static str {
        match self {
            ReferenceKind::Capital => "Capital",
            ReferenceKind::Settler => "Settler",
            ReferenceKind::Unit => "Unit",
            ReferenceKind::Origin => "Origin",
        }
    }
}

/// Resolved projection anchor. `capital_missing` is true whenever no city
/// supplied the anchor, including the settled-nothing opening turns; callers
/// surface it instead of silently mis-projecting.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ReferencePoint {
    pub coord: Coord,
    pub kind: ReferenceKind,
    pub capital_missing: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct District {
    pub name: String,
    pub under_construction: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Building {
    pub name: String,
    pub is_wonder: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct WonderPlacement {
    pub name: String,
    /// Capital-relative location, when the site is known.
    pub offset: Option<Coord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnrichedCity {
    pub name: String,
    pub coord: Option<Coord>,
    pub offset: Option<Coord>,
    pub capital_distance: Option<i32>,
    pub population: i64,
    pub production: Option<String>,
    pub production_turns: Option<i64>,
    pub growth_turns: Option<i64>,
    pub needs_production: bool,
    pub is_capital: bool,
    pub districts: Vec<District>,
    pub buildings: Vec<Building>,
    pub wonders: Vec<WonderPlacement>,
}

/// Immediate-decision digest surfaced ahead of everything else.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Decisions {
    pub cities_idle: Vec<String>,
    pub units_with_moves: Vec<String>,
    pub has_settler: bool,
    pub settler_location: Option<Coord>,
    pub threat_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnrichedSnapshot {
    pub turn: i64,
    pub era: String,
    pub civilization: String,
    pub leader: String,
    pub reference: ReferencePoint,
    pub needs_tech: bool,
    pub needs_civic: bool,
    pub needs_production: bool,
    pub cities: Vec<EnrichedCity>,
    pub units: Vec<UnitSighting>,
    pub threats: Vec<ThreatSighting>,
    /// Fog-trimmed, distance-sorted.
    pub tiles: Vec<TileObservation>,
    pub foreign_tiles: Vec<TileObservation>,
    pub foreign_cities: Vec<String>,
    pub city_states: Vec<String>,
    pub trade_routes: Vec<String>,
    pub completed_techs: Vec<String>,
    pub completed_civics: Vec<String>,
    pub decisions: Decisions,
    pub mini_map: MiniMap,
    pub changes: ChangeSet,
    pub raw: RawSnapshot,
}

/// Pipeline state: the exclusive owner of the previous snapshot and the
/// last-processed-turn marker. One instance per consumer; calls are
/// serialized by the caller.
pub struct Enricher {
    config: AdvisorConfig,
    previous: Option<RawSnapshot>,
    last_turn: Option<i64>,
}

impl Enricher {
    pub fn new(config: AdvisorConfig) -> Self {
        Self {
            config,
            previous: None,
            last_turn: None,
        }
    }

    pub fn last_turn(&self) -> Option<i64> {
        self.last_turn
    }

    pub fn enrich(&mut self, raw: RawSnapshot) -> EnrichedSnapshot {
        let changes = compute_delta(&raw, self.previous.as_ref());

        let mut units: Vec<UnitSighting> = parse_list(&raw.units, UnitSighting::parse, "units");
        let mut threats: Vec<ThreatSighting> =
            parse_list(&raw.threats, ThreatSighting::parse, "threats");

        let reference = resolve_reference(&raw.cities, &units);
        if reference.capital_missing {
            info!(
                target: "turn_advisor::enrich",
                anchor = reference.kind.label(),
                "no capital in snapshot; projecting from fallback anchor"
            );
        }
        let capital = reference.coord;

        let mut cities: Vec<EnrichedCity> = raw
            .cities
            .iter()
            .enumerate()
            .map(|(index, record)| enrich_city(record, index == 0, capital))
            .collect();

        sort_by_capital_distance(&mut cities, capital, |city| city.coord);
        sort_by_capital_distance(&mut units, capital, |unit| unit.coord);
        sort_by_capital_distance(&mut threats, capital, |threat| threat.coord);

        let mut tiles: Vec<TileObservation> =
            parse_list(&raw.tiles, TileObservation::parse, "tiles");
        sort_by_capital_distance(&mut tiles, capital, |tile| Some(tile.coord));
        let tiles = trim_tiles(
            tiles,
            self.config.fog.visible_tile_cap,
            self.config.fog.interest_yield_floor,
        );

        let mut foreign_tiles: Vec<TileObservation> =
            parse_list(&raw.foreign_tiles, TileObservation::parse, "foreign_tiles");
        sort_by_capital_distance(&mut foreign_tiles, capital, |tile| Some(tile.coord));
        let foreign_tiles = trim_tiles(
            foreign_tiles,
            self.config.fog.foreign_tile_cap,
            self.config.fog.interest_yield_floor,
        );

        let mut foreign_cities = raw.foreign_cities.clone();
        sort_by_capital_distance(&mut foreign_cities, capital, |city| trailing_coord(city));
        let foreign_cities = foreign_cities
            .iter()
            .map(|city| normalize_in_text(city))
            .collect();

        let mut city_states = raw.city_states.clone();
        sort_by_capital_distance(&mut city_states, capital, |entry| trailing_coord(entry));
        let city_states = city_states
            .iter()
            .map(|entry| normalize_in_text(entry))
            .collect();

        let mut trade_routes = raw.trade_routes.clone();
        sort_by_capital_distance(&mut trade_routes, capital, |route| trailing_coord(route));
        let trade_routes = trade_routes
            .iter()
            .map(|route| normalize_in_text(route))
            .collect();

        let mini_map = render(
            &city_markers(&cities),
            &units,
            &threats,
            &tiles,
            capital,
            self.config.minimap.radius,
            reference.kind.label(),
        );

        let needs_tech = raw.needs_tech_hint || raw.tech.as_deref().unwrap_or("").is_empty();
        let needs_civic = raw.needs_civic_hint || raw.civic.as_deref().unwrap_or("").is_empty();
        let needs_production = cities.iter().any(|city| city.needs_production);

        let decisions = extract_decisions(&cities, &units, &threats);

        // The previous snapshot is replaced wholesale, and only when the
        // turn actually advanced: a re-emission of the same turn must not
        // collapse the next turn's delta to nothing.
        if self.last_turn != Some(raw.turn) {
            self.previous = Some(raw.clone());
            self.last_turn = Some(raw.turn);
        }

        EnrichedSnapshot {
            turn: raw.turn,
            era: era_display(raw.era.as_ref()),
            civilization: normalize(raw.civilization.as_deref().unwrap_or("Unknown")),
            leader: normalize(raw.leader.as_deref().unwrap_or("Unknown")),
            reference,
            needs_tech,
            needs_civic,
            needs_production,
            cities,
            units,
            threats,
            tiles,
            foreign_tiles,
            foreign_cities,
            city_states,
            trade_routes,
            completed_techs: raw
                .completed_techs
                .iter()
                .map(|item| normalize(&item.name))
                .collect(),
            completed_civics: raw
                .completed_civics
                .iter()
                .map(|item| normalize(&item.name))
                .collect(),
            decisions,
            mini_map,
            changes,
            raw,
        }
    }
}

fn parse_list<T>(
    raw: &[String],
    parse: impl Fn(&str) -> Option<T>,
    field: &'static str,
) -> Vec<T> {
    let mut parsed = Vec::with_capacity(raw.len());
    let mut dropped = 0usize;
    for entry in raw {
        match parse(entry) {
            Some(value) => parsed.push(value),
            None => dropped += 1,
        }
    }
    if dropped > 0 {
        debug!(
            target: "turn_advisor::enrich",
            field,
            dropped,
            "dropping malformed records"
        );
    }
    parsed
}

/// Anchor resolution: capital (first city with a coordinate), else a
/// settler, else any unit, else the origin.
fn resolve_reference(cities: &[CityRecord], units: &[UnitSighting]) -> ReferencePoint {
    if let Some(coord) = cities.iter().find_map(|city| city.coord()) {
        return ReferencePoint {
            coord,
            kind: ReferenceKind::Capital,
            capital_missing: false,
        };
    }
    if let Some(coord) = units
        .iter()
        .filter(|unit| unit.is_settler())
        .find_map(|unit| unit.coord)
    {
        return ReferencePoint {
            coord,
            kind: ReferenceKind::Settler,
            capital_missing: true,
        };
    }
    if let Some(coord) = units.iter().find_map(|unit| unit.coord) {
        return ReferencePoint {
            coord,
            kind: ReferenceKind::Unit,
            capital_missing: true,
        };
    }
    ReferencePoint {
        coord: Coord::ORIGIN,
        kind: ReferenceKind::Origin,
        capital_missing: true,
    }
}

fn enrich_city(record: &CityRecord, is_first: bool, capital: Coord) -> EnrichedCity {
    let coord = record.coord();
    let offset = coord.map(|c| c.offset_from(capital));
    let capital_distance = coord.map(|c| distance(c, capital));

    let districts = record
        .districts
        .iter()
        .map(|name| {
            let under_construction = name.ends_with('*');
            District {
                name: normalize(name.trim_end_matches('*')),
                under_construction,
            }
        })
        .collect();
    let buildings = record
        .buildings
        .iter()
        .map(|name| {
            let is_wonder = name.ends_with('!');
            Building {
                name: normalize(name.trim_end_matches('!')),
                is_wonder,
            }
        })
        .collect();
    let wonders = record
        .wonders
        .iter()
        .filter_map(|entry| WonderSite::parse(entry))
        .map(|site| WonderPlacement {
            name: site.name,
            offset: site.coord.map(|c| c.offset_from(capital)),
        })
        .collect();

    EnrichedCity {
        name: record.name.clone(),
        coord,
        offset,
        capital_distance,
        population: record.population,
        production: record
            .production
            .as_deref()
            .filter(|_| !record.needs_production())
            .map(normalize),
        production_turns: record.production_turns,
        growth_turns: record.growth_turns,
        needs_production: record.needs_production(),
        is_capital: is_first && coord.is_some(),
        districts,
        buildings,
        wonders,
    }
}

fn city_markers(cities: &[EnrichedCity]) -> Vec<CityMarker> {
    cities
        .iter()
        .filter_map(|city| {
            city.coord.map(|coord| CityMarker {
                coord,
                is_capital: city.is_capital,
            })
        })
        .collect()
}

fn extract_decisions(
    cities: &[EnrichedCity],
    units: &[UnitSighting],
    threats: &[ThreatSighting],
) -> Decisions {
    let mut decisions = Decisions {
        threat_count: threats.len(),
        ..Decisions::default()
    };
    for city in cities {
        if city.needs_production {
            decisions.cities_idle.push(city.name.clone());
        }
    }
    for unit in units {
        if unit.is_settler() {
            decisions.has_settler = true;
            if decisions.settler_location.is_none() {
                decisions.settler_location = unit.coord;
            }
        }
        if unit.has_moves_left() {
            decisions.units_with_moves.push(unit.display.clone());
        }
    }
    decisions
}

fn era_display(era: Option<&EraField>) -> String {
    match era {
        Some(EraField::Index(index)) => era_name(*index),
        Some(EraField::Name(name)) => normalize(name),
        None => "?".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use state_codec::decode;

    fn raw_from(payload: &str) -> RawSnapshot {
        RawSnapshot::from_value(&decode(payload).expect("test payload should decode"))
    }

    fn settled_snapshot(turn: i64) -> RawSnapshot {
        raw_from(&format!(
            "{{\"turn\":{turn},\"era\":0,\"civ\":\"CIVILIZATION_ROME\",\
             \"leader\":\"LEADER_TRAJAN\",\"gold\":62.5,\"gpt\":3.1,\
             \"tech\":\"TECH_MINING\",\"techPct\":40,\
             \"cities\":[{{\"n\":\"Rome\",\"xy\":\"18,20\",\"pop\":3,\
             \"bld\":\"BUILDING_MONUMENT\",\"turns\":4,\"grow\":6,\
             \"districts\":[\"DISTRICT_CAMPUS*\"],\
             \"buildings\":[\"BUILDING_PALACE\",\"BUILDING_PYRAMIDS!\"],\
             \"wonders\":[\"BUILDING_PYRAMIDS 18,21\"]}},\
             {{\"n\":\"Antium\",\"xy\":\"22,20\",\"pop\":1,\"bld\":\"None\",\
             \"turns\":-1}}],\
             \"units\":[\"UNIT_WARRIOR 19,20 100hp 2/2m\",\"UNIT_SETTLER 17,20 1/2m\"],\
             \"threats\":[\"UNIT_BARBARIAN_WARRIOR (Barbarian) 21,24 d5\"],\
             \"tiles\":[\"18,21: Plains Forest (3f,2p)\",\"19,21: Grassland (2f,1p)\",\
             \"17,19: Grassland Rice (3f,1p)\"]}}"
        ))
    }

    #[test]
    fn capital_anchors_the_projection() {
        let mut enricher = Enricher::new(AdvisorConfig::default());
        let enriched = enricher.enrich(settled_snapshot(10));
        assert_eq!(enriched.reference.kind, ReferenceKind::Capital);
        assert!(!enriched.reference.capital_missing);
        assert_eq!(enriched.reference.coord, Coord::new(18, 20));
        let capital = &enriched.cities[0];
        assert!(capital.is_capital);
        assert_eq!(capital.offset, Some(Coord::ORIGIN));
        assert_eq!(capital.capital_distance, Some(0));
        assert_eq!(enriched.cities[1].offset, Some(Coord::new(4, 0)));
    }

    #[test]
    fn missing_capital_falls_back_and_flags() {
        let mut enricher = Enricher::new(AdvisorConfig::default());
        let enriched = enricher.enrich(raw_from(
            "{\"turn\":1,\"units\":[\"UNIT_SETTLER 4,9 2/2m\",\"UNIT_WARRIOR 5,9 2/2m\"]}",
        ));
        assert!(enriched.reference.capital_missing);
        assert_eq!(enriched.reference.kind, ReferenceKind::Settler);
        assert_eq!(enriched.reference.coord, Coord::new(4, 9));

        let enriched = enricher.enrich(raw_from("{\"turn\":2}"));
        assert_eq!(enriched.reference.kind, ReferenceKind::Origin);
        assert_eq!(enriched.reference.coord, Coord::ORIGIN);
    }

    #[test]
    fn names_and_flags_are_derived() {
        let mut enricher = Enricher::new(AdvisorConfig::default());
        let enriched = enricher.enrich(settled_snapshot(10));
        assert_eq!(enriched.civilization, "Rome");
        assert_eq!(enriched.leader, "Trajan");
        assert_eq!(enriched.era, "Ancient");
        assert!(!enriched.needs_tech);
        assert!(enriched.needs_civic);
        assert!(enriched.needs_production);
        assert_eq!(enriched.decisions.cities_idle, vec!["Antium"]);
        assert!(enriched.decisions.has_settler);
        assert_eq!(enriched.decisions.settler_location, Some(Coord::new(17, 20)));
        assert_eq!(enriched.decisions.threat_count, 1);
    }

    #[test]
    fn city_details_are_normalized() {
        let mut enricher = Enricher::new(AdvisorConfig::default());
        let enriched = enricher.enrich(settled_snapshot(10));
        let capital = &enriched.cities[0];
        assert_eq!(capital.production.as_deref(), Some("Monument"));
        assert_eq!(capital.districts[0].name, "Campus");
        assert!(capital.districts[0].under_construction);
        assert_eq!(capital.buildings[1].name, "Pyramids");
        assert!(capital.buildings[1].is_wonder);
        assert!(!capital.buildings[0].is_wonder);
        assert_eq!(capital.wonders[0].name, "Pyramids");
        assert_eq!(capital.wonders[0].offset, Some(Coord::new(0, 1)));
    }

    #[test]
    fn lists_come_back_distance_sorted_and_trimmed() {
        let mut enricher = Enricher::new(AdvisorConfig::default());
        let enriched = enricher.enrich(settled_snapshot(10));
        // Dull grassland tile is trimmed; the other two stay, in stable
        // distance order.
        assert_eq!(enriched.tiles.len(), 2);
        assert_eq!(enriched.tiles[0].coord, Coord::new(18, 21));
        assert_eq!(enriched.tiles[1].coord, Coord::new(17, 19));
        // Equal-distance units keep input order.
        assert_eq!(enriched.units.len(), 2);
        assert_eq!(enriched.units[0].kind, "Warrior");
        assert_eq!(enriched.units[1].kind, "Settler");
    }

    #[test]
    fn previous_snapshot_replaces_only_on_turn_advance() {
        let mut enricher = Enricher::new(AdvisorConfig::default());
        let first = enricher.enrich(settled_snapshot(10));
        assert!(first.changes.first_turn);

        // Same turn re-emitted: delta still computed against turn 10's
        // predecessor state (none), previous unchanged.
        let again = enricher.enrich(settled_snapshot(10));
        assert!(!again.changes.first_turn);
        assert!(again.changes.is_empty());

        let mut advanced = settled_snapshot(11);
        advanced.gold = 70.0;
        let second = enricher.enrich(advanced);
        assert!(!second.changes.first_turn);
        assert!(second
            .changes
            .scalars
            .iter()
            .any(|change| change.field == "turn"));
        assert_eq!(enricher.last_turn(), Some(11));
    }

    #[test]
    fn malformed_records_never_abort_enrichment() {
        let mut enricher = Enricher::new(AdvisorConfig::default());
        let enriched = enricher.enrich(raw_from(
            "{\"turn\":4,\"cities\":[{\"n\":\"Rome\",\"xy\":\"18,20\",\"pop\":2,\
             \"bld\":\"None\",\"turns\":-1}],\
             \"threats\":[\"not a threat record\"],\
             \"tiles\":[\"garbage tile\",\"18,21: Plains Forest (3f,2p)\"]}",
        ));
        assert_eq!(enriched.threats.len(), 0);
        assert_eq!(enriched.tiles.len(), 1);
        assert_eq!(enriched.turn, 4);
    }
}
