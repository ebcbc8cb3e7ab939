//! Fog trimming: bound spatial observation lists to the downstream token
//! budget while keeping the tiles worth reasoning about.

use tracing::debug;

use crate::wire::TileObservation;

/// Trim a distance-sorted tile list: drop uninteresting tiles first, then
/// cap the count keeping the closest entries.
///
/// The interest filter runs before the cap on purpose — a belt of dull
/// near tiles must not crowd a distant resource out of the budget.
pub fn trim_tiles(
    tiles: Vec<TileObservation>,
    cap: usize,
    interest_yield_floor: i32,
) -> Vec<TileObservation> {
    let total = tiles.len();
    let mut kept: Vec<TileObservation> = tiles
        .into_iter()
        .filter(|tile| tile.interesting(interest_yield_floor))
        .collect();
    let filtered = total - kept.len();
    let capped = kept.len().saturating_sub(cap);
    kept.truncate(cap);
    if filtered > 0 || capped > 0 {
        debug!(
            target: "turn_advisor::fog",
            filtered,
            capped,
            kept = kept.len(),
            "tiles.trimmed"
        );
    }
    kept
}
