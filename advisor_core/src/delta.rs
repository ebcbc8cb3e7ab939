//! Turn-over-turn change tracking.
//!
//! A pure function of exactly two snapshots: no hidden state, shallow and
//! field-oriented rather than a structural patch. The consumer surfaces the
//! result both as data and as a compact one-line digest.

use std::collections::HashSet;

use serde::Serialize;

use crate::format::trim_number;
use crate::normalize::normalize;
use crate::raw::{EraField, RawSnapshot};
use crate::tables::era_name;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScalarChange {
    pub field: &'static str,
    pub previous: Option<String>,
    pub current: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListChange {
    pub field: &'static str,
    /// Keys present now but not previously, in current-snapshot order.
    pub added: Vec<String>,
    /// Keys present previously but gone now, in previous-snapshot order.
    pub removed: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChangeSet {
    pub first_turn: bool,
    pub scalars: Vec<ScalarChange>,
    pub lists: Vec<ListChange>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        !self.first_turn && self.scalars.is_empty() && self.lists.is_empty()
    }

    fn scalar(&self, field: &str) -> Option<&ScalarChange> {
        self.scalars.iter().find(|change| change.field == field)
    }

    fn list(&self, field: &str) -> Option<&ListChange> {
        self.lists.iter().find(|change| change.field == field)
    }

    /// Compact pipe-joined digest of what moved this turn.
    pub fn summary(&self) -> String {
        if self.first_turn {
            return "First turn of session - sending full state.".to_string();
        }
        if self.is_empty() {
            return "Same turn - no changes.".to_string();
        }

        let mut pieces: Vec<String> = Vec::new();
        if let Some(turn) = self.scalar("turn") {
            match &turn.previous {
                Some(previous) => pieces.push(format!("Turn {} -> {}", previous, turn.current)),
                None => pieces.push(format!("Turn {}", turn.current)),
            }
        }
        if let Some(gold) = self.scalar("gold") {
            if let Some(previous) = &gold.previous {
                pieces.push(format!("Gold {} -> {}", previous, gold.current));
            }
        }
        if let Some(tech) = self.scalar("tech") {
            if let Some(previous) = tech.previous.as_deref() {
                if !previous.is_empty() {
                    pieces.push(format!("Tech '{previous}' completed"));
                }
            }
            if !tech.current.is_empty() {
                pieces.push(format!("Now researching: {}", tech.current));
            }
        }
        if let Some(civic) = self.scalar("civic") {
            if let Some(previous) = civic.previous.as_deref() {
                if !previous.is_empty() {
                    pieces.push(format!("Civic '{previous}' completed"));
                }
            }
            if !civic.current.is_empty() {
                pieces.push(format!("Now developing: {}", civic.current));
            }
        }
        if let Some(cities) = self.list("cities") {
            if !cities.added.is_empty() {
                pieces.push(format!("New city: {}", cities.added.join(", ")));
            }
            if !cities.removed.is_empty() {
                pieces.push(format!("Lost city: {}", cities.removed.join(", ")));
            }
        }
        if let Some(units) = self.list("units") {
            let gained = units.added.len();
            let lost = units.removed.len();
            if gained > lost {
                pieces.push(format!("+{} unit(s)", gained - lost));
            } else if lost > gained {
                pieces.push(format!("-{} unit(s)", lost - gained));
            }
        }
        if let Some(threats) = self.list("threats") {
            if !threats.added.is_empty() {
                pieces.push("New threat(s)!".to_string());
            } else if !threats.removed.is_empty() {
                pieces.push("Threats reduced".to_string());
            }
        }

        if pieces.len() <= 1 {
            pieces.push("No significant changes.".to_string());
        }
        pieces.join(" | ")
    }
}

/// Compare two snapshots. With no previous snapshot, everything is new and
/// `first_turn` is set.
pub fn compute_delta(current: &RawSnapshot, previous: Option<&RawSnapshot>) -> ChangeSet {
    let mut changes = ChangeSet {
        first_turn: previous.is_none(),
        ..ChangeSet::default()
    };

    for (field, previous_value, current_value) in scalar_fields(current, previous) {
        let changed = match &previous_value {
            Some(previous_value) => *previous_value != current_value,
            None => true,
        };
        if changed {
            changes.scalars.push(ScalarChange {
                field,
                previous: previous_value,
                current: current_value,
            });
        }
    }

    for (field, current_keys, previous_keys) in list_fields(current, previous) {
        let (added, removed) = diff_keys(&current_keys, &previous_keys);
        if !added.is_empty() || !removed.is_empty() {
            changes.lists.push(ListChange {
                field,
                added,
                removed,
            });
        }
    }

    changes
}

type ScalarRow = (&'static str, Option<String>, String);

fn scalar_fields(current: &RawSnapshot, previous: Option<&RawSnapshot>) -> Vec<ScalarRow> {
    fn render(snapshot: &RawSnapshot) -> Vec<(&'static str, String)> {
        vec![
            ("turn", snapshot.turn.to_string()),
            ("era", era_display(snapshot.era.as_ref())),
            (
                "civ",
                normalize(snapshot.civilization.as_deref().unwrap_or("")),
            ),
            ("leader", normalize(snapshot.leader.as_deref().unwrap_or(""))),
            ("gold", trim_number(snapshot.gold)),
            ("gpt", trim_number(snapshot.gold_per_turn)),
            ("sci", trim_number(snapshot.science_per_turn)),
            ("cul", trim_number(snapshot.culture_per_turn)),
            ("faith", trim_number(snapshot.faith_per_turn)),
            ("faithBal", trim_number(snapshot.faith_balance)),
            ("tech", normalize(snapshot.tech.as_deref().unwrap_or(""))),
            ("techPct", trim_number(snapshot.tech_pct)),
            ("civic", normalize(snapshot.civic.as_deref().unwrap_or(""))),
            ("civicPct", trim_number(snapshot.civic_pct)),
        ]
    }

    let current_rows = render(current);
    match previous {
        Some(previous) => {
            let previous_rows = render(previous);
            current_rows
                .into_iter()
                .zip(previous_rows)
                .map(|((field, current_value), (_, previous_value))| {
                    (field, Some(previous_value), current_value)
                })
                .collect()
        }
        None => current_rows
            .into_iter()
            .map(|(field, current_value)| (field, None, current_value))
            .collect(),
    }
}

fn era_display(era: Option<&EraField>) -> String {
    match era {
        Some(EraField::Index(index)) => era_name(*index),
        Some(EraField::Name(name)) => normalize(name),
        None => String::new(),
    }
}

type ListRow = (&'static str, Vec<String>, Vec<String>);

fn list_fields(current: &RawSnapshot, previous: Option<&RawSnapshot>) -> Vec<ListRow> {
    fn keys(snapshot: &RawSnapshot) -> Vec<(&'static str, Vec<String>)> {
        vec![
            (
                "cities",
                snapshot.cities.iter().map(|city| city.name.clone()).collect(),
            ),
            ("units", snapshot.units.clone()),
            ("threats", snapshot.threats.clone()),
            (
                "diplo",
                snapshot.diplomacy.iter().map(|entry| entry.key()).collect(),
            ),
            ("cs", snapshot.city_states.clone()),
            ("trade", snapshot.trade_routes.clone()),
            ("foreign_cities", snapshot.foreign_cities.clone()),
            ("foreign_tiles", snapshot.foreign_tiles.clone()),
            ("tiles", snapshot.tiles.clone()),
            (
                "completed_techs",
                snapshot
                    .completed_techs
                    .iter()
                    .map(|item| item.name.clone())
                    .collect(),
            ),
            (
                "completed_civics",
                snapshot
                    .completed_civics
                    .iter()
                    .map(|item| item.name.clone())
                    .collect(),
            ),
        ]
    }

    let current_keys = keys(current);
    match previous {
        Some(previous) => {
            let previous_keys = keys(previous);
            current_keys
                .into_iter()
                .zip(previous_keys)
                .map(|((field, current_list), (_, previous_list))| {
                    (field, current_list, previous_list)
                })
                .collect()
        }
        None => current_keys
            .into_iter()
            .map(|(field, current_list)| (field, current_list, Vec::new()))
            .collect(),
    }
}

/// Set difference in both directions, preserving source order.
fn diff_keys(current: &[String], previous: &[String]) -> (Vec<String>, Vec<String>) {
    let current_set: HashSet<&String> = current.iter().collect();
    let previous_set: HashSet<&String> = previous.iter().collect();
    let added = current
        .iter()
        .filter(|key| !previous_set.contains(*key))
        .cloned()
        .collect();
    let removed = previous
        .iter()
        .filter(|key| !current_set.contains(*key))
        .cloned()
        .collect();
    (added, removed)
}
