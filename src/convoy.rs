//! Convoy chain routing.
//!
//! Enumerates the acyclic chains of water-stationed fleets that could
//! carry an army between two coastal provinces. The full chain set for a
//! (origin, destination, fleet set) triple is memoized; the counterfactual
//! queries adjudication needs ("is there still a route through this
//! fleet", "without that one") filter the memoized set instead of walking
//! the map again. The memo is only valid for one phase's unit positions,
//! so the game clears it on every phase advance.

use std::collections::HashMap;

use tracing::trace;

use crate::board::{OrderClass, ProvinceId, Topology, UnitKind};

/// Narrows a chain query for counterfactual checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainConstraint {
    /// Any chain counts.
    Any,
    /// Only chains carrying the convoy through this fleet's province.
    Through(ProvinceId),
    /// Only chains that do not touch this fleet's province.
    Avoiding(ProvinceId),
}

impl ChainConstraint {
    fn admits(self, chain: &[ProvinceId]) -> bool {
        match self {
            ChainConstraint::Any => true,
            ChainConstraint::Through(p) => chain.contains(&p),
            ChainConstraint::Avoiding(p) => !chain.contains(&p),
        }
    }
}

/// Memoizing convoy route finder.
#[derive(Debug, Default)]
pub struct ConvoyRouter {
    memo: HashMap<(ProvinceId, ProvinceId, Vec<ProvinceId>), Vec<Vec<ProvinceId>>>,
}

impl ConvoyRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every acyclic fleet chain from `origin` to `dest` using only the
    /// given fleet provinces, narrowed by the constraint. Chains come back
    /// in a deterministic order.
    pub fn chains(
        &mut self,
        topo: &Topology,
        origin: ProvinceId,
        dest: ProvinceId,
        fleets: &[ProvinceId],
        constraint: ChainConstraint,
    ) -> Vec<Vec<ProvinceId>> {
        if origin == dest {
            return Vec::new();
        }
        let mut key_fleets: Vec<ProvinceId> = fleets.to_vec();
        key_fleets.sort();
        key_fleets.dedup();
        let key = (origin, dest, key_fleets);
        if let Some(cached) = self.memo.get(&key) {
            return cached
                .iter()
                .filter(|c| constraint.admits(c))
                .cloned()
                .collect();
        }
        let chains = enumerate(topo, origin, dest, &key.2);
        trace!(
            origin = %topo.province(origin).code,
            dest = %topo.province(dest).code,
            chains = chains.len(),
            "enumerated convoy chains"
        );
        let out = chains
            .iter()
            .filter(|c| constraint.admits(c))
            .cloned()
            .collect();
        self.memo.insert(key, chains);
        out
    }

    /// Whether at least one admissible chain exists.
    pub fn has_chain(
        &mut self,
        topo: &Topology,
        origin: ProvinceId,
        dest: ProvinceId,
        fleets: &[ProvinceId],
        constraint: ChainConstraint,
    ) -> bool {
        !self.chains(topo, origin, dest, fleets, constraint).is_empty()
    }

    /// Drops every memoized chain set. Unit positions change at each phase
    /// boundary, so nothing memoized before it can be reused after.
    pub fn clear(&mut self) {
        self.memo.clear();
    }
}

/// Depth-first enumeration of acyclic chains. A fleet can both complete a
/// chain and carry longer ones past itself, so completion does not stop
/// the walk.
fn enumerate(
    topo: &Topology,
    origin: ProvinceId,
    dest: ProvinceId,
    fleets: &[ProvinceId],
) -> Vec<Vec<ProvinceId>> {
    let hop = |from: ProvinceId, to: ProvinceId| {
        topo.reachable(UnitKind::Fleet, OrderClass::Convoy, from, to)
    };

    let mut chains = Vec::new();
    let mut path: Vec<ProvinceId> = Vec::new();

    fn dfs(
        at: ProvinceId,
        dest: ProvinceId,
        fleets: &[ProvinceId],
        hop: &dyn Fn(ProvinceId, ProvinceId) -> bool,
        path: &mut Vec<ProvinceId>,
        chains: &mut Vec<Vec<ProvinceId>>,
    ) {
        path.push(at);
        if hop(at, dest) {
            chains.push(path.clone());
        }
        for &next in fleets {
            if !path.contains(&next) && hop(at, next) {
                dfs(next, dest, fleets, hop, path, chains);
            }
        }
        path.pop();
    }

    for &first in fleets {
        if hop(first, origin) {
            dfs(first, dest, fleets, &hop, &mut path, &mut chains);
        }
    }
    chains
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::variant;

    fn topo() -> Topology {
        Topology::load(&variant::standard()).expect("standard map loads")
    }

    fn p(t: &Topology, code: &str) -> ProvinceId {
        t.find_province(code).expect("known province")
    }

    #[test]
    fn single_fleet_chain() {
        let t = topo();
        let mut router = ConvoyRouter::new();
        let chains = router.chains(
            &t,
            p(&t, "lon"),
            p(&t, "bre"),
            &[p(&t, "eng")],
            ChainConstraint::Any,
        );
        assert_eq!(chains, vec![vec![p(&t, "eng")]]);
    }

    #[test]
    fn two_hop_chain() {
        let t = topo();
        let mut router = ConvoyRouter::new();
        let chains = router.chains(
            &t,
            p(&t, "bre"),
            p(&t, "nwy"),
            &[p(&t, "eng"), p(&t, "nth")],
            ChainConstraint::Any,
        );
        assert_eq!(chains, vec![vec![p(&t, "eng"), p(&t, "nth")]]);
    }

    #[test]
    fn alternative_routes_and_constraints() {
        let t = topo();
        let mut router = ConvoyRouter::new();
        let (lon, bel) = (p(&t, "lon"), p(&t, "bel"));
        let (eng, nth) = (p(&t, "eng"), p(&t, "nth"));
        let fleets = [eng, nth];

        // Both seas touch both shores, so single-fleet and doubled chains
        // all count.
        let all = router.chains(&t, lon, bel, &fleets, ChainConstraint::Any);
        assert_eq!(all.len(), 4);
        assert!(all.contains(&vec![eng]));
        assert!(all.contains(&vec![nth]));
        assert!(all.contains(&vec![eng, nth]));
        assert!(all.contains(&vec![nth, eng]));

        let through = router.chains(&t, lon, bel, &fleets, ChainConstraint::Through(nth));
        assert_eq!(through.len(), 3);
        assert!(through.iter().all(|c| c.contains(&nth)));

        let avoiding = router.chains(&t, lon, bel, &fleets, ChainConstraint::Avoiding(nth));
        assert_eq!(avoiding, vec![vec![eng]]);
    }

    #[test]
    fn no_route_cases() {
        let t = topo();
        let mut router = ConvoyRouter::new();
        // No fleets at all.
        assert!(!router.has_chain(&t, p(&t, "lon"), p(&t, "bre"), &[], ChainConstraint::Any));
        // Fleet in the wrong sea.
        assert!(!router.has_chain(
            &t,
            p(&t, "lon"),
            p(&t, "bre"),
            &[p(&t, "nth")],
            ChainConstraint::Any
        ));
        // Landlocked origin.
        assert!(!router.has_chain(
            &t,
            p(&t, "mun"),
            p(&t, "lon"),
            &[p(&t, "eng"), p(&t, "nth")],
            ChainConstraint::Any
        ));
        // Degenerate origin == destination.
        assert!(!router.has_chain(
            &t,
            p(&t, "lon"),
            p(&t, "lon"),
            &[p(&t, "eng")],
            ChainConstraint::Any
        ));
    }

    #[test]
    fn coastal_fleets_never_carry() {
        let t = topo();
        let mut router = ConvoyRouter::new();
        // A fleet parked in Brest is on land as far as convoys go.
        assert!(!router.has_chain(
            &t,
            p(&t, "lon"),
            p(&t, "gas"),
            &[p(&t, "bre")],
            ChainConstraint::Any
        ));
    }

    #[test]
    fn memo_survives_repeat_queries_and_clear_resets() {
        let t = topo();
        let mut router = ConvoyRouter::new();
        let (lon, bel) = (p(&t, "lon"), p(&t, "bel"));
        let fleets = [p(&t, "eng"), p(&t, "nth")];
        let first = router.chains(&t, lon, bel, &fleets, ChainConstraint::Any);
        let second = router.chains(&t, lon, bel, &fleets, ChainConstraint::Any);
        assert_eq!(first, second);
        router.clear();
        let third = router.chains(&t, lon, bel, &fleets, ChainConstraint::Any);
        assert_eq!(first, third);
        // A different fleet set is a different memo entry, not a collision.
        let narrowed = router.chains(&t, lon, bel, &fleets[..1], ChainConstraint::Any);
        assert_eq!(narrowed, vec![vec![p(&t, "eng")]]);
    }
}
