//! Mutable game position and the serializable views of it.

use serde::Serialize;

use crate::board::{Location, PhaseMarker, PowerId, ProvinceId, Topology, Unit};
use crate::judge::Dislodgement;

/// The full position of one game between phases.
#[derive(Debug, Clone)]
pub struct GameState {
    pub units: Vec<Unit>,
    /// Supply-center ownership by province index; `None` is unowned.
    pub owners: Vec<Option<PowerId>>,
    /// Units awaiting retreat orders.
    pub dislodged: Vec<Dislodgement>,
    /// Provinces left contested by the last movement phase.
    pub standoffs: Vec<ProvinceId>,
    pub marker: PhaseMarker,
}

impl GameState {
    /// The variant's opening position.
    pub fn opening(topo: &Topology) -> GameState {
        let mut owners = vec![None; topo.province_count()];
        let mut units = Vec::new();
        for pw in topo.power_ids() {
            let meta = topo.power(pw);
            for &c in &meta.initial_centers {
                owners[c.index()] = Some(pw);
            }
            for &(kind, p, coast) in &meta.initial_units {
                units.push(Unit::new(pw, kind, Location::with_coast(p, coast)));
            }
        }
        GameState {
            units,
            owners,
            dislodged: Vec::new(),
            standoffs: Vec::new(),
            marker: topo.first_marker().unwrap_or(PhaseMarker::Completed),
        }
    }

    pub fn unit_at(&self, p: ProvinceId) -> Option<&Unit> {
        self.units.iter().find(|u| u.location.province == p)
    }

    pub fn units_of(&self, pw: PowerId) -> impl Iterator<Item = &Unit> {
        self.units.iter().filter(move |u| u.power == pw)
    }

    pub fn centers_of(&self, pw: PowerId) -> Vec<ProvinceId> {
        self.owners
            .iter()
            .enumerate()
            .filter(|(_, o)| **o == Some(pw))
            .map(|(i, _)| ProvinceId(i as u16))
            .collect()
    }

    pub fn center_count(&self, pw: PowerId) -> usize {
        self.owners.iter().filter(|o| **o == Some(pw)).count()
    }

    /// Centers minus units; positive means builds may be owed, negative
    /// means disbands are.
    pub fn build_balance(&self, pw: PowerId) -> i32 {
        self.center_count(pw) as i32 - self.units_of(pw).count() as i32
    }

    /// Owned home centers with nothing standing on them.
    pub fn vacant_owned_homes(&self, topo: &Topology, pw: PowerId) -> Vec<ProvinceId> {
        topo.power(pw)
            .home_centers
            .iter()
            .copied()
            .filter(|&h| self.owners[h.index()] == Some(pw) && self.unit_at(h).is_none())
            .collect()
    }

    /// Whether the power still has a stake in the game.
    pub fn alive(&self, pw: PowerId) -> bool {
        self.center_count(pw) > 0 || self.units_of(pw).next().is_some()
    }

    /// Hands every occupied supply center to its occupant. Called at the
    /// adjustment boundary only; ownership never changes mid-year.
    pub fn transfer_centers(&mut self, topo: &Topology) {
        for u in &self.units {
            let p = u.location.province;
            if topo.province(p).is_supply_center {
                self.owners[p.index()] = Some(u.power);
            }
        }
    }
}

/// A power's slice of a [`GameSnapshot`].
#[derive(Debug, Clone, Serialize)]
pub struct PowerSnapshot {
    pub name: String,
    /// Unit texts; dislodged units carry a leading `*`.
    pub units: Vec<String>,
    /// Open retreats: dislodged unit text to its legal destinations.
    pub retreats: Vec<RetreatOption>,
    pub centers: Vec<String>,
    pub homes: Vec<String>,
    /// Builds owed (positive, already capped) or disbands owed (negative).
    pub builds: i32,
    pub civil_disorder: bool,
}

/// Legal destinations of one pending retreat.
#[derive(Debug, Clone, Serialize)]
pub struct RetreatOption {
    pub unit: String,
    pub to: Vec<String>,
}

/// Serializable view of a game for clients; strings only, stable shapes.
#[derive(Debug, Clone, Serialize)]
pub struct GameSnapshot {
    pub variant: String,
    pub phase: String,
    pub phase_abbr: String,
    /// "forming", "active", or "completed".
    pub status: String,
    pub winner: Option<String>,
    pub powers: Vec<PowerSnapshot>,
}

/// One submitted order with its adjudicated outcome, as text.
#[derive(Debug, Clone, Serialize)]
pub struct OrderRecord {
    pub order: String,
    pub outcome: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PowerOrderRecord {
    pub power: String,
    pub results: Vec<OrderRecord>,
}

/// One processed phase: what was ordered, how it resolved, and the
/// position afterward.
#[derive(Debug, Clone, Serialize)]
pub struct PhaseRecord {
    /// Short name of the phase that resolved, e.g. "S1901M".
    pub phase: String,
    pub orders: Vec<PowerOrderRecord>,
    pub state: GameSnapshot,
}
