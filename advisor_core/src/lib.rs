//! Consumer and producer core for the turn advisor pipeline.
//!
//! The producer half ([`report`], [`probe`]) assembles one marker-framed
//! state block per turn from an unreliable host API. The consumer half
//! follows the host log ([`watcher`]), decodes raw snapshots ([`raw`]) and
//! enriches them ([`enrich`]) into bounded, prompt-ready summaries: capital-
//! centered projection and mini-map, fog-trimmed tile lists, and a
//! turn-over-turn change set.

pub mod config;
pub mod delta;
pub mod enrich;
pub mod fog;
pub mod format;
pub mod minimap;
pub mod normalize;
pub mod probe;
pub mod raw;
pub mod report;
pub mod spatial;
pub mod tables;
pub mod watcher;
pub mod wire;

pub use config::{AdvisorConfig, ConfigError, FogTrimConfig, MiniMapConfig, WatcherConfig};
pub use delta::{compute_delta, ChangeSet, ListChange, ScalarChange};
pub use enrich::{
    Decisions, EnrichedCity, EnrichedSnapshot, Enricher, ReferenceKind, ReferencePoint,
};
pub use fog::trim_tiles;
pub use minimap::{render as render_minimap, CityMarker, MiniMap};
pub use normalize::{normalize, normalize_in_text, strip_redundant_terrain};
pub use probe::FallbackChain;
pub use raw::{CityRecord, DiploEntry, RawSnapshot, NO_PRODUCTION_SENTINEL, UNKNOWN_TURN};
pub use report::{collect_report, report_lines, CityFacts, DiploFacts, HostGameApi, TileFacts};
pub use spatial::{distance, sort_by_capital_distance, Coord};
pub use watcher::LogWatcher;
pub use wire::{ThreatSighting, TileObservation, UnitSighting};
