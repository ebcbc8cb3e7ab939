//! Producer-side turn report.
//!
//! Runs once per turn-start inside the host's single-threaded scripting
//! context, so it must never block and never raise: every host read goes
//! through a fallback chain, the result is a value-model map framed for the
//! log. Emission (the actual append) belongs to the host.

use state_codec::{encode, frame_chunked, Value, ValueMap};

use crate::normalize::{normalize, strip_redundant_terrain};
use crate::probe::FallbackChain;
use crate::raw::{NO_PRODUCTION_SENTINEL, UNKNOWN_TURN};
use crate::spatial::Coord;
use crate::tables::era_name;
use crate::wire::TileYields;

/// Sentinel for names no probe could resolve.
pub const UNKNOWN_NAME: &str = "Unknown";

/// One visible tile as the host exposes it, before wire formatting.
#[derive(Debug, Clone, Default)]
pub struct TileFacts {
    pub coord: Coord,
    pub terrain: Option<String>,
    pub feature: Option<String>,
    pub resource: Option<String>,
    pub yields: TileYields,
    /// District or improvement occupying the tile.
    pub structure: Option<String>,
    pub improved: bool,
}

/// City facts as the host exposes them, before wire formatting.
#[derive(Debug, Clone, Default)]
pub struct CityFacts {
    pub name: String,
    pub coord: Option<Coord>,
    pub population: i64,
    pub production: Option<String>,
    pub production_turns: Option<i64>,
    pub growth_turns: Option<i64>,
    /// `(name, under_construction)`
    pub districts: Vec<(String, bool)>,
    /// `(name, is_wonder)`
    pub buildings: Vec<(String, bool)>,
    pub wonders: Vec<(String, Option<Coord>)>,
}

/// Scoreboard facts for one known civilization.
#[derive(Debug, Clone, Default)]
pub struct DiploFacts {
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

/// The capability-probe surface over the host game API. Every accessor may
/// be unavailable in the current execution context; `None` is normal, not an
/// error.
pub trait HostGameApi {
    fn current_turn(&self) -> Option<i64> {
        None
    }
    /// Turn number derived from the last processed turn-start event, for
    /// contexts where the primary counter is unavailable.
    fn observed_turn(&self) -> Option<i64> {
        None
    }
    fn era_name(&self) -> Option<String> {
        None
    }
    fn era_index(&self) -> Option<i64> {
        None
    }
    fn civilization_name(&self) -> Option<String> {
        None
    }
    fn civilization_type(&self) -> Option<String> {
        None
    }
    fn leader_type(&self) -> Option<String> {
        None
    }
    fn treasury(&self) -> Option<f64> {
        None
    }
    fn gold_per_turn(&self) -> Option<f64> {
        None
    }
    fn science_per_turn(&self) -> Option<f64> {
        None
    }
    fn culture_per_turn(&self) -> Option<f64> {
        None
    }
    fn faith_per_turn(&self) -> Option<f64> {
        None
    }
    fn faith_balance(&self) -> Option<f64> {
        None
    }
    fn current_tech(&self) -> Option<String> {
        None
    }
    fn tech_progress_pct(&self) -> Option<f64> {
        None
    }
    fn current_civic(&self) -> Option<String> {
        None
    }
    fn civic_progress_pct(&self) -> Option<f64> {
        None
    }
    fn completed_techs(&self) -> Option<Vec<(String, f64)>> {
        None
    }
    fn completed_civics(&self) -> Option<Vec<(String, f64)>> {
        None
    }
    fn cities(&self) -> Option<Vec<CityFacts>> {
        None
    }
    fn unit_sightings(&self) -> Option<Vec<String>> {
        None
    }
    fn threat_sightings(&self) -> Option<Vec<String>> {
        None
    }
    fn diplomacy(&self) -> Option<Vec<DiploFacts>> {
        None
    }
    fn city_states(&self) -> Option<Vec<String>> {
        None
    }
    fn trade_routes(&self) -> Option<Vec<String>> {
        None
    }
    fn foreign_cities(&self) -> Option<Vec<String>> {
        None
    }
    fn foreign_tiles(&self) -> Option<Vec<TileFacts>> {
        None
    }
    fn visible_tiles(&self) -> Option<Vec<TileFacts>> {
        None
    }
}

/// Round to one decimal place; the encoder expects callers to have done
/// this already.
fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Assemble one turn's report map from whatever the host will answer.
/// Fields whose natural value would be an empty list are omitted entirely.
pub fn collect_report(api: &dyn HostGameApi) -> Value {
    let root = Value::map();

    let turn = FallbackChain::new("turn")
        .probe("current_turn", || api.current_turn())
        .probe("observed_turn", || api.observed_turn())
        .resolve(UNKNOWN_TURN);
    root.insert("turn", Value::from(turn));

    let era = FallbackChain::new("era")
        .probe("era_name", || api.era_name())
        .probe("era_index", || api.era_index().map(era_name))
        .resolve(UNKNOWN_NAME.to_string());
    root.insert("era", Value::from(era));

    let civ = FallbackChain::new("civ")
        .probe("civilization_name", || api.civilization_name())
        .probe("civilization_type", || {
            api.civilization_type().map(|id| normalize(&id))
        })
        .resolve(UNKNOWN_NAME.to_string());
    root.insert("civ", Value::from(civ));

    let leader = FallbackChain::new("leader")
        .probe("leader_type", || api.leader_type())
        .resolve(UNKNOWN_NAME.to_string());
    root.insert("leader", Value::from(leader));

    root.insert("gold", Value::from(round1(api.treasury().unwrap_or(0.0))));
    root.insert(
        "gpt",
        Value::from(round1(api.gold_per_turn().unwrap_or(0.0))),
    );
    root.insert(
        "sci",
        Value::from(round1(api.science_per_turn().unwrap_or(0.0))),
    );
    root.insert(
        "cul",
        Value::from(round1(api.culture_per_turn().unwrap_or(0.0))),
    );
    root.insert(
        "faith",
        Value::from(round1(api.faith_per_turn().unwrap_or(0.0))),
    );
    root.insert(
        "faithBal",
        Value::from(round1(api.faith_balance().unwrap_or(0.0))),
    );

    let tech = api.current_tech().filter(|name| !name.is_empty());
    root.insert("needsTech", Value::Bool(tech.is_none()));
    if let Some(tech) = tech {
        root.insert("tech", Value::from(tech));
        root.insert(
            "techPct",
            Value::from(round1(api.tech_progress_pct().unwrap_or(0.0))),
        );
    }

    let civic = api.current_civic().filter(|name| !name.is_empty());
    root.insert("needsCivic", Value::Bool(civic.is_none()));
    if let Some(civic) = civic {
        root.insert("civic", Value::from(civic));
        root.insert(
            "civicPct",
            Value::from(round1(api.civic_progress_pct().unwrap_or(0.0))),
        );
    }

    insert_completed(&root, "completed_techs", api.completed_techs());
    insert_completed(&root, "completed_civics", api.completed_civics());

    let cities = api.cities().unwrap_or_default();
    root.insert(
        "needsProd",
        Value::Bool(cities.iter().any(|city| {
            matches!(city.production.as_deref(), None | Some("") | Some(NO_PRODUCTION_SENTINEL))
        })),
    );
    if !cities.is_empty() {
        let list = Value::list();
        for city in cities {
            list.push(Value::Map(city_map(&city)));
        }
        root.insert("cities", Value::List(list));
    }

    insert_text_list(&root, "units", api.unit_sightings());
    insert_text_list(&root, "threats", api.threat_sightings());

    if let Some(entries) = api.diplomacy() {
        if !entries.is_empty() {
            let list = Value::list();
            for entry in entries {
                list.push(Value::Map(diplo_map(&entry)));
            }
            root.insert("diplo", Value::List(list));
        }
    }

    insert_text_list(&root, "cs", api.city_states());
    insert_text_list(&root, "trade", api.trade_routes());
    insert_text_list(&root, "foreign_cities", api.foreign_cities());
    insert_text_list(
        &root,
        "foreign_tiles",
        api.foreign_tiles()
            .map(|tiles| tiles.iter().map(format_tile).collect()),
    );
    insert_text_list(
        &root,
        "tiles",
        api.visible_tiles()
            .map(|tiles| tiles.iter().map(format_tile).collect()),
    );

    Value::Map(root)
}

/// Render one tile observation line: `"18,20: Plains Forest Spices
/// (3f,3p,3g) [Farm] i"`. Feature names that end in their underlying
/// terrain's name are deduplicated.
fn format_tile(tile: &TileFacts) -> String {
    let mut words: Vec<String> = Vec::new();
    let terrain = tile.terrain.as_deref().map(normalize).unwrap_or_default();
    if !terrain.is_empty() {
        words.push(terrain.clone());
    }
    if let Some(feature) = tile.feature.as_deref() {
        let feature = strip_redundant_terrain(&normalize(feature), &terrain);
        if !feature.is_empty() {
            words.push(feature);
        }
    }
    if let Some(resource) = tile.resource.as_deref() {
        words.push(normalize(resource));
    }

    let mut line = format!("{}: {}", tile.coord, words.join(" "));
    let yields = format_yields(tile.yields);
    if !yields.is_empty() {
        line.push_str(&format!(" ({yields})"));
    }
    if let Some(structure) = tile.structure.as_deref() {
        line.push_str(&format!(" [{}]", normalize(structure)));
    }
    if tile.improved {
        line.push_str(" i");
    }
    line
}

fn format_yields(yields: TileYields) -> String {
    let mut parts: Vec<String> = Vec::new();
    for (amount, letter) in [
        (yields.food, 'f'),
        (yields.production, 'p'),
        (yields.gold, 'g'),
        (yields.science, 's'),
        (yields.culture, 'c'),
        (yields.faith, 'h'),
    ] {
        if amount != 0 {
            parts.push(format!("{amount}{letter}"));
        }
    }
    parts.join(",")
}

/// Encode and frame a report, chunking payloads past `max_chunk` bytes.
pub fn report_lines(report: &Value, max_chunk: usize) -> Vec<String> {
    frame_chunked(&encode(report), max_chunk)
}

fn insert_text_list(root: &ValueMap, key: &str, items: Option<Vec<String>>) {
    if let Some(items) = items {
        if !items.is_empty() {
            let list = Value::list();
            for item in items {
                list.push(Value::from(item));
            }
            root.insert(key, Value::List(list));
        }
    }
}

fn insert_completed(root: &ValueMap, key: &str, items: Option<Vec<(String, f64)>>) {
    let Some(items) = items else {
        return;
    };
    if items.is_empty() {
        return;
    }
    let list = Value::list();
    for (name, cost) in items {
        let entry = Value::map();
        entry.insert("name", Value::from(name));
        entry.insert("cost", Value::from(round1(cost)));
        list.push(Value::Map(entry));
    }
    root.insert(key, Value::List(list));
}

fn city_map(city: &CityFacts) -> ValueMap {
    let entry = Value::map();
    entry.insert("n", Value::from(city.name.clone()));
    if let Some(coord) = city.coord {
        entry.insert("xy", Value::from(coord.to_string()));
    }
    entry.insert("pop", Value::from(city.population));
    entry.insert(
        "bld",
        Value::from(
            city.production
                .clone()
                .unwrap_or_else(|| NO_PRODUCTION_SENTINEL.to_string()),
        ),
    );
    entry.insert("turns", Value::from(city.production_turns.unwrap_or(-1)));
    if let Some(growth) = city.growth_turns {
        entry.insert("grow", Value::from(growth));
    }
    if !city.districts.is_empty() {
        let list = Value::list();
        for (name, under_construction) in &city.districts {
            let mut text = name.clone();
            if *under_construction {
                text.push('*');
            }
            list.push(Value::from(text));
        }
        entry.insert("districts", Value::List(list));
    }
    if !city.buildings.is_empty() {
        let list = Value::list();
        for (name, is_wonder) in &city.buildings {
            let mut text = name.clone();
            if *is_wonder {
                text.push('!');
            }
            list.push(Value::from(text));
        }
        entry.insert("buildings", Value::List(list));
    }
    if !city.wonders.is_empty() {
        let list = Value::list();
        for (name, coord) in &city.wonders {
            match coord {
                Some(coord) => list.push(Value::from(format!("{name} {coord}"))),
                None => list.push(Value::from(name.clone())),
            }
        }
        entry.insert("wonders", Value::List(list));
    }
    entry
}

fn diplo_map(entry_facts: &DiploFacts) -> ValueMap {
    let entry = Value::map();
    entry.insert("civ", Value::from(entry_facts.civ.clone()));
    entry.insert("status", Value::from(entry_facts.status.clone()));
    if let Some(leader) = &entry_facts.leader {
        entry.insert("leader", Value::from(leader.clone()));
    }
    if let Some(score) = entry_facts.score {
        entry.insert("score", Value::from(score));
    }
    if let Some(military) = entry_facts.military {
        entry.insert("military", Value::from(military));
    }
    if let Some(culture) = entry_facts.culture_per_turn {
        entry.insert("culture_pt", Value::from(round1(culture)));
    }
    if let Some(science) = entry_facts.science_per_turn {
        entry.insert("science_pt", Value::from(round1(science)));
    }
    if let Some(tourism) = entry_facts.tourism {
        entry.insert("tourism", Value::from(tourism));
    }
    if let Some(gold) = entry_facts.gold {
        entry.insert("gold", Value::from(round1(gold)));
    }
    entry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct StubHost {
        turn: Option<i64>,
        observed: Option<i64>,
        era_index: Option<i64>,
        tech: Option<String>,
        cities: Option<Vec<CityFacts>>,
        units: Option<Vec<String>>,
    }

    impl HostGameApi for StubHost {
        fn current_turn(&self) -> Option<i64> {
            self.turn
        }
        fn observed_turn(&self) -> Option<i64> {
            self.observed
        }
        fn era_index(&self) -> Option<i64> {
            self.era_index
        }
        fn treasury(&self) -> Option<f64> {
            Some(83.547)
        }
        fn current_tech(&self) -> Option<String> {
            self.tech.clone()
        }
        fn cities(&self) -> Option<Vec<CityFacts>> {
            self.cities.clone()
        }
        fn unit_sightings(&self) -> Option<Vec<String>> {
            self.units.clone()
        }
    }

    #[test]
    fn unavailable_accessors_resolve_to_sentinels() {
        let report = collect_report(&StubHost::default());
        let map = report.as_map().unwrap();
        assert_eq!(map.get("turn").unwrap().as_i64(), Some(UNKNOWN_TURN));
        assert_eq!(map.get("era").unwrap().as_str(), Some(UNKNOWN_NAME));
        assert_eq!(map.get("civ").unwrap().as_str(), Some(UNKNOWN_NAME));
        assert_eq!(map.get("needsTech").unwrap().as_bool(), Some(true));
    }

    #[test]
    fn secondary_probes_supply_dropped_primaries() {
        let host = StubHost {
            observed: Some(41),
            era_index: Some(2),
            ..StubHost::default()
        };
        let report = collect_report(&host);
        let map = report.as_map().unwrap();
        assert_eq!(map.get("turn").unwrap().as_i64(), Some(41));
        assert_eq!(map.get("era").unwrap().as_str(), Some("Medieval"));
    }

    #[test]
    fn floats_are_rounded_to_one_decimal_before_encoding() {
        let report = collect_report(&StubHost::default());
        let map = report.as_map().unwrap();
        assert_eq!(map.get("gold").unwrap().as_f64(), Some(83.5));
    }

    #[test]
    fn empty_lists_are_entirely_absent() {
        let host = StubHost {
            units: Some(Vec::new()),
            cities: Some(Vec::new()),
            ..StubHost::default()
        };
        let report = collect_report(&host);
        let map = report.as_map().unwrap();
        assert!(!map.contains_key("units"));
        assert!(!map.contains_key("cities"));
        assert!(!map.contains_key("threats"));
    }

    #[test]
    fn city_records_carry_wire_suffixes() {
        let host = StubHost {
            turn: Some(9),
            cities: Some(vec![CityFacts {
                name: "Rome".to_string(),
                coord: Some(Coord::new(18, 20)),
                population: 4,
                production: None,
                districts: vec![("DISTRICT_CAMPUS".to_string(), true)],
                buildings: vec![("BUILDING_PYRAMIDS".to_string(), true)],
                wonders: vec![("BUILDING_PYRAMIDS".to_string(), Some(Coord::new(18, 21)))],
                ..CityFacts::default()
            }]),
            ..StubHost::default()
        };
        let report = collect_report(&host);
        let map = report.as_map().unwrap();
        assert_eq!(map.get("needsProd").unwrap().as_bool(), Some(true));
        let cities = map.get("cities").unwrap().as_list().cloned().unwrap();
        let city = cities.get(0).unwrap();
        let city = city.as_map().unwrap();
        assert_eq!(city.get("bld").unwrap().as_str(), Some("None"));
        assert_eq!(city.get("turns").unwrap().as_i64(), Some(-1));
        let districts = city.get("districts").unwrap().as_list().cloned().unwrap();
        assert_eq!(districts.get(0).unwrap().as_str(), Some("DISTRICT_CAMPUS*"));
        let buildings = city.get("buildings").unwrap().as_list().cloned().unwrap();
        assert_eq!(buildings.get(0).unwrap().as_str(), Some("BUILDING_PYRAMIDS!"));
        let wonders = city.get("wonders").unwrap().as_list().cloned().unwrap();
        assert_eq!(
            wonders.get(0).unwrap().as_str(),
            Some("BUILDING_PYRAMIDS 18,21")
        );
    }

    #[test]
    fn tile_lines_deduplicate_feature_terrain() {
        let tile = TileFacts {
            coord: Coord::new(18, 21),
            terrain: Some("TERRAIN_GRASSLAND".to_string()),
            feature: Some("FEATURE_FLOODPLAINS_GRASSLAND".to_string()),
            resource: Some("RESOURCE_RICE".to_string()),
            yields: TileYields {
                food: 3,
                production: 1,
                ..TileYields::default()
            },
            structure: None,
            improved: true,
        };
        assert_eq!(
            format_tile(&tile),
            "18,21: Grassland Floodplains Rice (3f,1p) i"
        );

        let bare = TileFacts {
            coord: Coord::new(4, 4),
            terrain: Some("TERRAIN_DESERT".to_string()),
            ..TileFacts::default()
        };
        assert_eq!(format_tile(&bare), "4,4: Desert");
    }

    #[test]
    fn report_lines_frame_the_encoded_payload() {
        let host = StubHost {
            turn: Some(3),
            ..StubHost::default()
        };
        let report = collect_report(&host);
        let lines = report_lines(&report, 4000);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with(">>>GAMESTATE>>>"));
        assert!(lines[0].ends_with("<<<END<<<"));
    }
}
