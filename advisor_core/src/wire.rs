//! Parsers for the flat display strings the producer packs into list fields.
//!
//! These strings are built for humans first (`"Warrior 18,18 100hp 2/2m"`),
//! so parsing is tolerant token scanning: a malformed record yields `None`
//! and the caller drops it, never the whole snapshot.

use serde::Serialize;

use crate::normalize::{normalize, normalize_in_text};
use crate::spatial::Coord;
use crate::tables::{mentions_notable_feature, mentions_resource};

/// Parse `"x,y"` into a coordinate.
pub fn parse_coord_pair(text: &str) -> Option<Coord> {
    let (x, y) = text.split_once(',')?;
    Some(Coord::new(
        x.trim().parse().ok()?,
        y.trim().parse().ok()?,
    ))
}

/// Last `"x,y"`-shaped token in a display string, if any.
pub fn trailing_coord(text: &str) -> Option<Coord> {
    text.split_whitespace().rev().find_map(parse_coord_pair)
}

/// One of the player's own units, as observed on the wire.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitSighting {
    pub kind: String,
    pub display: String,
    pub coord: Option<Coord>,
    pub hp: Option<i32>,
    pub moves: Option<(i32, i32)>,
    pub raw: String,
}

impl UnitSighting {
    /// Parse `"UNIT_WARRIOR 18,18 100hp 2/2m"` (hp and moves optional).
    pub fn parse(raw: &str) -> Option<Self> {
        let mut tokens = raw.split_whitespace();
        let kind_raw = tokens.next()?;
        let mut coord = None;
        let mut hp = None;
        let mut moves = None;
        for token in tokens {
            if coord.is_none() {
                if let Some(parsed) = parse_coord_pair(token) {
                    coord = Some(parsed);
                    continue;
                }
            }
            if let Some(rest) = token.strip_suffix("hp") {
                let current = rest.split('/').next().unwrap_or(rest);
                hp = current.parse().ok();
                continue;
            }
            if let Some(rest) = token.strip_suffix('m') {
                if let Some((left, total)) = rest.split_once('/') {
                    if let (Ok(left), Ok(total)) = (left.parse(), total.parse()) {
                        moves = Some((left, total));
                    }
                }
            }
        }
        Some(Self {
            kind: normalize(kind_raw),
            display: normalize_in_text(raw),
            coord,
            hp,
            moves,
            raw: raw.to_string(),
        })
    }

    pub fn is_settler(&self) -> bool {
        self.kind.to_ascii_lowercase().contains("settler")
    }

    pub fn has_moves_left(&self) -> bool {
        matches!(self.moves, Some((left, _)) if left > 0)
    }
}

/// Classification of who owns a hostile unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ThreatOwner {
    Barbarian,
    Civilization(String),
}

/// A hostile unit observation: any visible unit owned by the barbarian
/// player or a civilization the local player is at war with.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThreatSighting {
    pub kind: String,
    pub owner: ThreatOwner,
    pub coord: Option<Coord>,
    pub reported_distance: Option<i32>,
    pub display: String,
    pub raw: String,
}

impl ThreatSighting {
    /// Parse `"UNIT_BARBARIAN_WARRIOR (Barbarian) 18,22 d4"`.
    pub fn parse(raw: &str) -> Option<Self> {
        let open = raw.find('(')?;
        let close = open + raw[open..].find(')')?;
        let kind_raw = raw[..open].trim();
        if kind_raw.is_empty() {
            return None;
        }
        let owner_raw = raw[open + 1..close].trim();
        let rest = &raw[close + 1..];

        let mut coord = None;
        let mut reported_distance = None;
        for token in rest.split_whitespace() {
            if coord.is_none() {
                if let Some(parsed) = parse_coord_pair(token) {
                    coord = Some(parsed);
                    continue;
                }
            }
            if let Some(tail) = token.strip_prefix('d') {
                if let Ok(value) = tail.trim_start_matches(':').parse() {
                    reported_distance = Some(value);
                }
            }
        }

        let barbarian = owner_raw.eq_ignore_ascii_case("barbarian")
            || kind_raw.to_ascii_uppercase().contains("BARBARIAN");
        let owner = if barbarian {
            ThreatOwner::Barbarian
        } else {
            ThreatOwner::Civilization(normalize_in_text(owner_raw))
        };

        Some(Self {
            kind: normalize_in_text(kind_raw),
            owner,
            coord,
            reported_distance,
            display: normalize_in_text(raw),
            raw: raw.to_string(),
        })
    }

    pub fn is_barbarian(&self) -> bool {
        matches!(self.owner, ThreatOwner::Barbarian)
    }
}

/// Per-tile yields keyed by the wire's suffix letters (f/p/g/s/c/h).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TileYields {
    pub food: i32,
    pub production: i32,
    pub gold: i32,
    pub science: i32,
    pub culture: i32,
    pub faith: i32,
}

/// One visible or foreign tile observation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TileObservation {
    pub coord: Coord,
    pub description: String,
    pub structure: Option<String>,
    pub yields: TileYields,
    pub improved: bool,
    pub has_resource: bool,
    pub notable_feature: bool,
    pub raw: String,
}

impl TileObservation {
    /// Parse `"18,20: Plains Forest Spices (3f,3p,3g) [Farm] i"`.
    pub fn parse(raw: &str) -> Option<Self> {
        let (coord_part, content) = raw.split_once(':')?;
        let coord = parse_coord_pair(coord_part.trim())?;

        let mut yields = TileYields::default();
        let mut structure: Option<String> = None;
        let mut bracket_run: Option<Vec<String>> = None;
        let mut improved = false;
        let mut words: Vec<&str> = Vec::new();

        for token in content.split_whitespace() {
            if let Some(run) = bracket_run.as_mut() {
                if let Some(inner) = token.strip_suffix(']') {
                    run.push(inner.to_string());
                    structure = Some(normalize_in_text(&run.join(" ")));
                    bracket_run = None;
                } else {
                    run.push(token.to_string());
                }
                continue;
            }
            if let Some(inner) = token.strip_prefix('(') {
                yields = parse_yields(inner.trim_end_matches(')'));
                continue;
            }
            if let Some(inner) = token.strip_prefix('[') {
                if let Some(done) = inner.strip_suffix(']') {
                    structure = Some(normalize_in_text(done));
                } else {
                    bracket_run = Some(vec![inner.to_string()]);
                }
                continue;
            }
            if token == "i" {
                improved = true;
                continue;
            }
            words.push(token);
        }

        let description = normalize_in_text(&words.join(" "));
        let lower = description.to_ascii_lowercase();
        Some(Self {
            coord,
            has_resource: mentions_resource(&lower),
            notable_feature: mentions_notable_feature(&lower),
            description,
            structure,
            yields,
            improved,
            raw: raw.to_string(),
        })
    }

    /// Fog-trimmer interest test: worth keeping if the tile carries a
    /// resource, a district/improvement, or yields above the floor.
    pub fn interesting(&self, yield_floor: i32) -> bool {
        self.has_resource
            || self.structure.is_some()
            || self.improved
            || self.yields.food > yield_floor
            || self.yields.production > yield_floor
    }
}

fn parse_yields(text: &str) -> TileYields {
    let mut yields = TileYields::default();
    for part in text.split(',') {
        let part = part.trim();
        if part.len() < 2 || !part.is_ascii() {
            continue;
        }
        let (amount, suffix) = part.split_at(part.len() - 1);
        let Ok(amount) = amount.parse::<i32>() else {
            continue;
        };
        match suffix.to_ascii_lowercase().as_str() {
            "f" => yields.food = amount,
            "p" => yields.production = amount,
            "g" => yields.gold = amount,
            "s" => yields.science = amount,
            "c" => yields.culture = amount,
            "h" => yields.faith = amount,
            _ => {}
        }
    }
    yields
}

/// A wonder placement: `"BUILDING_COLOSSEUM 18,20"`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WonderSite {
    pub name: String,
    pub coord: Option<Coord>,
}

impl WonderSite {
    pub fn parse(raw: &str) -> Option<Self> {
        let tokens: Vec<&str> = raw.split_whitespace().collect();
        if tokens.is_empty() {
            return None;
        }
        if let Some(coord) = tokens.last().and_then(|token| parse_coord_pair(token)) {
            let name = tokens[..tokens.len() - 1].join(" ");
            if name.is_empty() {
                return None;
            }
            Some(Self {
                name: normalize(&name),
                coord: Some(coord),
            })
        } else {
            Some(Self {
                name: normalize(raw.trim()),
                coord: None,
            })
        }
    }
}
