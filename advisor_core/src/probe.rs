//! Capability probes over the unreliable host API.
//!
//! Any host accessor may be unavailable in a given execution context, so
//! every producer-side read goes through an explicit, ordered priority list:
//! primary accessor, secondary derivation, static-table lookup, sentinel
//! default. The chain is data, not nested guards, which keeps the fallback
//! order testable on its own.

use tracing::trace;

/// Ordered list of named probes for one report field.
pub struct FallbackChain<'a, T> {
    field: &'static str,
    steps: Vec<ProbeStep<'a, T>>,
}

struct ProbeStep<'a, T> {
    name: &'static str,
    probe: Box<dyn Fn() -> Option<T> + 'a>,
}

impl<'a, T> FallbackChain<'a, T> {
    pub fn new(field: &'static str) -> Self {
        Self {
            field,
            steps: Vec::new(),
        }
    }

    /// Append a probe; earlier probes win.
    pub fn probe(mut self, name: &'static str, probe: impl Fn() -> Option<T> + 'a) -> Self {
        self.steps.push(ProbeStep {
            name,
            probe: Box::new(probe),
        });
        self
    }

    /// First successful probe, or `None` when every step came up empty.
    /// Later probes are never invoked once one succeeds.
    pub fn resolve_opt(self) -> Option<T> {
        for step in &self.steps {
            if let Some(value) = (step.probe)() {
                trace!(
                    target: "turn_advisor::probe",
                    field = self.field,
                    step = step.name,
                    "probe.resolved"
                );
                return Some(value);
            }
        }
        trace!(target: "turn_advisor::probe", field = self.field, "probe.exhausted");
        None
    }

    /// First successful probe, or the typed sentinel default.
    pub fn resolve(self, default: T) -> T {
        self.resolve_opt().unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn earlier_probes_win() {
        let value = FallbackChain::new("turn")
            .probe("primary", || Some(7))
            .probe("secondary", || Some(99))
            .resolve(-1);
        assert_eq!(value, 7);
    }

    #[test]
    fn chain_falls_through_to_later_probes() {
        let value = FallbackChain::new("turn")
            .probe("primary", || None)
            .probe("secondary", || Some(42))
            .resolve(-1);
        assert_eq!(value, 42);
    }

    #[test]
    fn exhausted_chain_yields_the_sentinel() {
        let value: i64 = FallbackChain::new("turn")
            .probe("primary", || None)
            .probe("secondary", || None)
            .resolve(-1);
        assert_eq!(value, -1);

        let name = FallbackChain::<String>::new("civ").resolve("Unknown".to_string());
        assert_eq!(name, "Unknown");
    }

    #[test]
    fn later_probes_are_not_invoked_after_a_hit() {
        let calls = Cell::new(0);
        let value = FallbackChain::new("turn")
            .probe("primary", || Some(1))
            .probe("secondary", || {
                calls.set(calls.get() + 1);
                Some(2)
            })
            .resolve(-1);
        assert_eq!(value, 1);
        assert_eq!(calls.get(), 0);
    }
}
