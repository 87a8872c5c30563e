//! The game aggregate: persistent state plus the order lifecycle.
//!
//! A [`Game`] owns the board position and drives it through the phase
//! sequence. Powers submit order text, the judges adjudicate a snapshot,
//! and the report is applied atomically. Everything a client sees comes
//! out as serializable snapshots or canonical order text.

mod legal;
mod state;

pub use legal::{orderable_locations, possible_orders, retreat_destinations};
pub use state::{
    GameSnapshot, GameState, OrderRecord, PhaseRecord, PowerOrderRecord, PowerSnapshot,
    RetreatOption,
};

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::board::{
    Location, Order, OrderClass, PhaseKind, PhaseMarker, PowerId, ProvinceId, Topology, Unit,
    UnitKind,
};
use crate::convoy::{ChainConstraint, ConvoyRouter};
use crate::judge::{
    self, AdjustmentReport, MovementReport, OrderOutcome, PhaseError, PhaseReport, Resolver,
    RetreatReport,
};
use crate::parse::{parse_order, OrderParseError};

/// Why one submitted order line was rejected. Rejected lines are simply
/// not recorded; the unit holds (or the build is waived) by default.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Parse(#[from] OrderParseError),
    #[error("no power named `{0}`")]
    UnknownPower(String),
    #[error("{0} is not yours to order")]
    IllegalUnit(String),
    #[error("no convoy route from {from} to {to}")]
    NoConvoyRoute { from: String, to: String },
    #[error("the game is over")]
    GameOver,
}

/// One running game over a shared topology.
#[derive(Debug)]
pub struct Game {
    topo: Arc<Topology>,
    state: GameState,
    orders: Vec<(PowerId, Order)>,
    submitted: Vec<bool>,
    civil_disorder: Vec<bool>,
    history: Vec<PhaseRecord>,
    resolver: Resolver,
    router: ConvoyRouter,
    winner: Option<PowerId>,
}

impl Game {
    /// Opens a game at the variant's starting position.
    pub fn new(topo: Arc<Topology>) -> Game {
        let state = GameState::opening(&topo);
        Game::from_state(topo, state)
    }

    /// Resumes a game from a mid-campaign position.
    pub fn from_state(topo: Arc<Topology>, state: GameState) -> Game {
        let pc = topo.power_count();
        Game {
            topo,
            state,
            orders: Vec::new(),
            submitted: vec![false; pc],
            civil_disorder: vec![false; pc],
            history: Vec::new(),
            resolver: Resolver::new(),
            router: ConvoyRouter::new(),
            winner: None,
        }
    }

    pub fn topology(&self) -> &Topology {
        &self.topo
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn phase(&self) -> PhaseMarker {
        self.state.marker
    }

    pub fn phase_name(&self) -> String {
        self.topo.phase_name(self.state.marker)
    }

    pub fn phase_abbr(&self) -> String {
        self.topo.phase_abbr(self.state.marker)
    }

    pub fn is_over(&self) -> bool {
        matches!(self.state.marker, PhaseMarker::Completed)
    }

    /// Winning power's name, once there is one.
    pub fn winner(&self) -> Option<&str> {
        self.winner.map(|pw| self.topo.power(pw).name.as_str())
    }

    pub fn history(&self) -> &[PhaseRecord] {
        &self.history
    }

    /// Parses and validates a batch of order lines for one power.
    ///
    /// Returns one entry per line: the canonical text the order was
    /// recorded as, or the error that kept it off the books. A later
    /// order for the same unit replaces the earlier one. Submitting
    /// anything at all, even an empty list, counts as handing orders in
    /// for the civil-disorder bookkeeping.
    pub fn submit_orders(
        &mut self,
        power: &str,
        lines: &[&str],
    ) -> Vec<Result<String, CommandError>> {
        let pw = match self.topo.find_power(power) {
            Some(pw) => pw,
            None => return vec![Err(CommandError::UnknownPower(power.to_string()))],
        };
        let kind = match self.topo.phase_kind(self.state.marker) {
            Some(kind) => kind,
            None => return lines.iter().map(|_| Err(CommandError::GameOver)).collect(),
        };
        self.submitted[pw.index()] = true;
        self.civil_disorder[pw.index()] = false;
        lines.iter().map(|line| self.accept(pw, kind, line)).collect()
    }

    /// Pending orders as canonical text. With no power given, every
    /// power's orders come back prefixed with its name.
    pub fn submitted_orders(&self, power: Option<&str>) -> Result<Vec<String>, CommandError> {
        match power {
            Some(name) => {
                let pw = self
                    .topo
                    .find_power(name)
                    .ok_or_else(|| CommandError::UnknownPower(name.to_string()))?;
                Ok(self
                    .orders
                    .iter()
                    .filter(|(p, _)| *p == pw)
                    .map(|(_, o)| o.to_text(&self.topo))
                    .collect())
            }
            None => Ok(self
                .orders
                .iter()
                .map(|(p, o)| {
                    format!("{}: {}", self.topo.power(*p).name, o.to_text(&self.topo))
                })
                .collect()),
        }
    }

    /// The full legal-order menu for a power in the current phase.
    pub fn possible_orders(&mut self, power: &str) -> Result<Vec<String>, CommandError> {
        let pw = self
            .topo
            .find_power(power)
            .ok_or_else(|| CommandError::UnknownPower(power.to_string()))?;
        Ok(legal::possible_orders(
            &self.topo,
            &self.state,
            &mut self.router,
            pw,
        ))
    }

    /// Province codes the power has anything to order this phase.
    pub fn orderable_locations(&self, power: &str) -> Result<Vec<String>, CommandError> {
        let pw = self
            .topo
            .find_power(power)
            .ok_or_else(|| CommandError::UnknownPower(power.to_string()))?;
        Ok(legal::orderable_locations(&self.topo, &self.state, pw)
            .iter()
            .map(|&p| self.topo.province(p).code.clone())
            .collect())
    }

    /// Adjudicates the current phase and applies the result.
    ///
    /// Units without orders hold; powers without submissions are flagged
    /// in civil disorder. The report is applied in full or, on a
    /// validation error, not at all. Afterwards the marker advances,
    /// retreat phases with nothing dislodged are skipped, centers change
    /// hands at the adjustment boundary, and the phase lands in history.
    pub fn process_phase(&mut self) -> Result<PhaseReport, PhaseError> {
        let kind = self
            .topo
            .phase_kind(self.state.marker)
            .ok_or(PhaseError::GameOver)?;
        let processed = self.state.marker;
        let busy = self.busy_powers(kind);

        let report = match kind {
            PhaseKind::Movement => {
                let rep = self.resolver.resolve(
                    &self.topo,
                    &mut self.router,
                    &self.state.units,
                    &self.orders,
                );
                self.apply_movement(&rep);
                PhaseReport::Movement(rep)
            }
            PhaseKind::Retreat => {
                let rep = judge::retreat::resolve(
                    &self.topo,
                    &self.state.units,
                    &self.state.dislodged,
                    &self.state.standoffs,
                    &self.orders,
                );
                self.apply_retreat(&rep);
                PhaseReport::Retreat(rep)
            }
            PhaseKind::Adjustment => {
                let rep = judge::adjustment::resolve(
                    &self.topo,
                    &self.state.units,
                    &self.state.owners,
                    &self.orders,
                    &self.submitted,
                )?;
                self.apply_adjustment(&rep);
                PhaseReport::Adjustment(rep)
            }
        };

        for (i, was_busy) in busy.iter().enumerate() {
            if *was_busy && !self.submitted[i] {
                self.civil_disorder[i] = true;
            }
        }

        self.advance_marker();

        let record = PhaseRecord {
            phase: self.topo.phase_abbr(processed),
            orders: self.group_results(&report),
            state: self.snapshot(),
        };
        self.history.push(record);

        self.orders.clear();
        self.submitted.iter_mut().for_each(|s| *s = false);
        self.router.clear();

        info!(
            phase = %self.topo.phase_abbr(processed),
            next = %self.phase_abbr(),
            "phase resolved"
        );
        Ok(report)
    }

    /// Serializable view of the whole position.
    pub fn snapshot(&self) -> GameSnapshot {
        let status = match self.state.marker {
            PhaseMarker::Forming => "forming",
            PhaseMarker::At { .. } => "active",
            PhaseMarker::Completed => "completed",
        };
        let powers = (0..self.topo.power_count())
            .map(|i| self.power_snapshot(PowerId(i as u8)))
            .collect();
        GameSnapshot {
            variant: self.topo.name().to_string(),
            phase: self.phase_name(),
            phase_abbr: self.phase_abbr(),
            status: status.to_string(),
            winner: self.winner().map(str::to_string),
            powers,
        }
    }

    fn power_snapshot(&self, pw: PowerId) -> PowerSnapshot {
        let mut units: Vec<String> = self
            .state
            .units_of(pw)
            .map(|u| u.text(&self.topo))
            .collect();
        let mut retreats = Vec::new();
        for d in self.state.dislodged.iter().filter(|d| d.unit.power == pw) {
            units.push(format!("*{}", d.unit.text(&self.topo)));
            retreats.push(RetreatOption {
                unit: d.unit.text(&self.topo),
                to: legal::retreat_destinations(&self.topo, &self.state, d)
                    .iter()
                    .map(|loc| loc.text(&self.topo))
                    .collect(),
            });
        }
        units.sort();
        let mut centers: Vec<String> = self
            .state
            .centers_of(pw)
            .iter()
            .map(|&p| self.topo.province(p).code.clone())
            .collect();
        centers.sort();
        let meta = self.topo.power(pw);
        let homes = meta
            .home_centers
            .iter()
            .map(|&p| self.topo.province(p).code.clone())
            .collect();
        let balance = self.state.build_balance(pw);
        let builds = if balance > 0 {
            balance.min(self.state.vacant_owned_homes(&self.topo, pw).len() as i32)
        } else {
            balance
        };
        PowerSnapshot {
            name: meta.name.clone(),
            units,
            retreats,
            centers,
            homes,
            builds,
            civil_disorder: self.civil_disorder[pw.index()],
        }
    }

    fn accept(&mut self, pw: PowerId, kind: PhaseKind, line: &str) -> Result<String, CommandError> {
        let order = parse_order(&self.topo, kind, line)?;
        self.check_ownership(pw, kind, &order)?;
        self.check_convoy_route(&order)?;
        // A later order for the same unit replaces the earlier one.
        if let Some(p) = order.province() {
            self.orders
                .retain(|(opw, o)| !(*opw == pw && o.province() == Some(p)));
        }
        let text = order.to_text(&self.topo);
        self.orders.push((pw, order));
        Ok(text)
    }

    /// The order must name a unit (or, for retreats, a dislodged unit)
    /// the power actually controls. Builds name no existing unit and are
    /// judged at adjudication instead.
    fn check_ownership(
        &self,
        pw: PowerId,
        kind: PhaseKind,
        order: &Order,
    ) -> Result<(), CommandError> {
        let ou = match order.unit() {
            Some(ou) => ou,
            None => return Ok(()),
        };
        let p = ou.location.province;
        let owned = match kind {
            PhaseKind::Movement => self.state.unit_at(p).is_some_and(|u| {
                u.power == pw && u.kind == ou.kind && coast_lax(u.location, ou.location)
            }),
            PhaseKind::Retreat => self.state.dislodged.iter().any(|d| {
                d.unit.power == pw
                    && d.unit.kind == ou.kind
                    && d.unit.location.province == p
            }),
            PhaseKind::Adjustment => match order {
                Order::Build { .. } => true,
                _ => self.state.units_of(pw).any(|u| {
                    u.kind == ou.kind && coast_lax(u.location, ou.location)
                        && u.location.province == p
                }),
            },
        };
        if owned {
            Ok(())
        } else {
            Err(CommandError::IllegalUnit(ou.text(&self.topo)))
        }
    }

    /// An army move that needs the sea is rejected up front when no fleet
    /// chain could possibly carry it.
    fn check_convoy_route(&mut self, order: &Order) -> Result<(), CommandError> {
        let Order::Move { unit, dest, via_convoy } = *order else {
            return Ok(());
        };
        if unit.kind != UnitKind::Army {
            return Ok(());
        }
        let from = unit.location.province;
        let direct = self
            .topo
            .reachable(UnitKind::Army, OrderClass::Move, from, dest.province);
        if direct && !via_convoy {
            return Ok(());
        }
        let fleets: Vec<ProvinceId> = self
            .state
            .units
            .iter()
            .filter(|u| u.kind == UnitKind::Fleet && self.topo.is_water(u.location.province))
            .map(|u| u.location.province)
            .collect();
        if self
            .router
            .has_chain(&self.topo, from, dest.province, &fleets, ChainConstraint::Any)
        {
            Ok(())
        } else {
            Err(CommandError::NoConvoyRoute {
                from: self.topo.province(from).code.clone(),
                to: self.topo.province(dest.province).code.clone(),
            })
        }
    }

    fn busy_powers(&self, kind: PhaseKind) -> Vec<bool> {
        (0..self.topo.power_count())
            .map(|i| {
                let pw = PowerId(i as u8);
                match kind {
                    PhaseKind::Movement => self.state.units_of(pw).next().is_some(),
                    PhaseKind::Retreat => {
                        self.state.dislodged.iter().any(|d| d.unit.power == pw)
                    }
                    PhaseKind::Adjustment => self.state.build_balance(pw) != 0,
                }
            })
            .collect()
    }

    fn apply_movement(&mut self, rep: &MovementReport) {
        let mut moved: Vec<(ProvinceId, Location)> = Vec::new();
        for ro in &rep.orders {
            if ro.outcome == OrderOutcome::Succeeded {
                if let Order::Move { unit, dest, .. } = ro.order {
                    moved.push((unit.location.province, dest));
                }
            }
        }
        let lost: Vec<Unit> = rep.dislodged.iter().map(|d| d.unit).collect();
        self.state.units.retain(|u| !lost.contains(u));
        for u in &mut self.state.units {
            if let Some((_, dest)) = moved.iter().find(|(from, _)| *from == u.location.province) {
                u.location = *dest;
            }
        }
        self.state.dislodged = rep.dislodged.clone();
        self.state.standoffs = rep.standoffs.clone();
    }

    fn apply_retreat(&mut self, rep: &RetreatReport) {
        for ro in &rep.orders {
            if ro.outcome == OrderOutcome::Succeeded {
                if let Order::Retreat { unit, dest } = ro.order {
                    self.state.units.push(Unit::new(ro.power, unit.kind, dest));
                }
            }
        }
        self.state.dislodged.clear();
        self.state.standoffs.clear();
    }

    fn apply_adjustment(&mut self, rep: &AdjustmentReport) {
        self.state.units.extend(rep.built.iter().copied());
        for gone in &rep.disbanded {
            if let Some(i) = self.state.units.iter().position(|u| u == gone) {
                self.state.units.remove(i);
            }
        }
    }

    /// Moves the marker to the next playable phase. Retreat phases are
    /// skipped outright when nothing was dislodged; crossing into an
    /// adjustment phase is where centers change hands, victory is
    /// checked, and eliminations land.
    fn advance_marker(&mut self) {
        let mut next = self.topo.find_next_phase(self.state.marker, None, 0);
        while let Some(m) = next {
            if self.topo.phase_kind(m) == Some(PhaseKind::Retreat)
                && self.state.dislodged.is_empty()
            {
                next = self.topo.find_next_phase(m, None, 0);
            } else {
                break;
            }
        }
        let m = match next {
            Some(m) => m,
            None => {
                self.state.marker = PhaseMarker::Completed;
                return;
            }
        };

        if self.topo.phase_kind(m) == Some(PhaseKind::Adjustment) {
            self.state.transfer_centers(&self.topo);
            if let PhaseMarker::At { year, .. } = m {
                let need = self.topo.victory_threshold(year) as usize;
                let won = (0..self.topo.power_count())
                    .map(|i| PowerId(i as u8))
                    .find(|&pw| self.state.center_count(pw) >= need);
                if let Some(pw) = won {
                    self.winner = Some(pw);
                    self.state.marker = PhaseMarker::Completed;
                    return;
                }
            }
        }

        let survivors: Vec<PowerId> = (0..self.topo.power_count())
            .map(|i| PowerId(i as u8))
            .filter(|&pw| self.state.alive(pw))
            .collect();
        if survivors.len() <= 1 {
            self.winner = survivors.first().copied();
            self.state.marker = PhaseMarker::Completed;
            return;
        }

        self.state.marker = m;
    }

    fn group_results(&self, report: &PhaseReport) -> Vec<PowerOrderRecord> {
        let mut out = Vec::new();
        for i in 0..self.topo.power_count() {
            let pw = PowerId(i as u8);
            let results: Vec<OrderRecord> = report
                .orders()
                .iter()
                .filter(|ro| ro.power == pw)
                .map(|ro| OrderRecord {
                    order: ro.order.to_text(&self.topo),
                    outcome: ro.outcome.label().to_string(),
                })
                .collect();
            if !results.is_empty() {
                out.push(PowerOrderRecord {
                    power: self.topo.power(pw).name.clone(),
                    results,
                });
            }
        }
        out
    }
}

/// Order text may leave a coast off a unit reference; the position fills
/// it in.
fn coast_lax(actual: Location, given: Location) -> bool {
    actual.province == given.province
        && (given.coast == actual.coast || given.coast == crate::board::Coast::None)
}
