//! Movement-phase adjudication.
//!
//! Resolution runs as bounded iterative relaxation over a flat arena of
//! order records with mutable strength and status fields. Each pass:
//! convoy viability, then support counting with cuts, then a combat sweep
//! per contested province until move statuses reach a fixed point. When a
//! pass dislodges a unit whose own uncut support or unbroken convoy was
//! still counting, that contribution is removed and the whole pass
//! re-runs. Contributions are only ever removed, never restored, so the
//! number of passes is bounded by the number of units.
//!
//! Strength rules, in the classic reading: strictly greatest strength
//! wins and a strict tie bounces everyone; a bounced move keeps its full
//! prevent strength unless it lost a head-to-head battle; supports given
//! by the defender's power never count toward a dislodgement, and no move
//! may dislodge a unit of its own power; convoyed moves never fight
//! head-to-head.

use tracing::debug;

use crate::board::{Coast, Order, OrderClass, PowerId, ProvinceId, Topology, Unit, UnitKind};
use crate::convoy::{ChainConstraint, ConvoyRouter};

use super::report::{Dislodgement, MovementReport, OrderOutcome, ResolvedOrder};

const NONE: u16 = u16::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MoveStatus {
    Pending,
    Moves,
    Bounced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecKind {
    Hold,
    Move,
    Support,
    Convoy,
}

/// Per-unit tracking for one resolution. Cross-references are arena
/// indexes with `NONE` as the null.
#[derive(Debug, Clone)]
struct Rec {
    power: PowerId,
    unit: Unit,
    order: Order,
    kind: RecKind,
    void: bool,
    // Movers.
    dest: ProvinceId,
    dest_coast: Coast,
    via_convoy: bool,
    convoy_ok: bool,
    status: MoveStatus,
    head_to_head: u16,
    hh_lost: bool,
    // Supports.
    supported: u16,
    support_dest: ProvinceId,
    cut: bool,
    // Convoys.
    carries: u16,
    // Everyone.
    support_ids: Vec<u16>,
    dislodged_by: u16,
}

impl Rec {
    fn holding(power: PowerId, unit: Unit) -> Self {
        Rec {
            power,
            unit,
            order: Order::Hold {
                unit: unit.as_order_unit(),
            },
            kind: RecKind::Hold,
            void: false,
            dest: unit.location.province,
            dest_coast: Coast::None,
            via_convoy: false,
            convoy_ok: false,
            status: MoveStatus::Pending,
            head_to_head: NONE,
            hh_lost: false,
            supported: NONE,
            support_dest: unit.location.province,
            cut: false,
            carries: NONE,
            support_ids: Vec::new(),
            dislodged_by: NONE,
        }
    }

    fn is_mover(&self) -> bool {
        self.kind == RecKind::Move && !self.void
    }

    /// Competing weight against other movers for the same destination.
    fn prevent(&self) -> usize {
        if self.hh_lost {
            0
        } else {
            1 + self.support_ids.len()
        }
    }

    fn attack(&self) -> usize {
        1 + self.support_ids.len()
    }

    /// Attack weight for dislodging a unit of `defender`: that power's
    /// own supports never help drive it out.
    fn attack_against(&self, recs: &[Rec], defender: PowerId) -> usize {
        1 + self
            .support_ids
            .iter()
            .filter(|&&s| recs[s as usize].power != defender)
            .count()
    }
}

fn rec_at(lookup: &[i16], province: ProvinceId) -> Option<usize> {
    let i = lookup[province.index()];
    if i < 0 {
        None
    } else {
        Some(i as usize)
    }
}

/// Reusable movement resolver; allocate once, call
/// [`resolve`](Resolver::resolve) per phase.
#[derive(Debug, Default)]
pub struct Resolver {
    lookup: Vec<i16>,
    recs: Vec<Rec>,
    forced_cut: Vec<bool>,
    forced_disrupted: Vec<bool>,
    extra: Vec<ResolvedOrder>,
}

impl Resolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adjudicates one movement phase. Every unit resolves to exactly one
    /// outcome; unordered units hold. Orders that match no unit of the
    /// issuing power come back `Void` without touching resolution.
    pub fn resolve(
        &mut self,
        topo: &Topology,
        router: &mut ConvoyRouter,
        units: &[Unit],
        orders: &[(PowerId, Order)],
    ) -> MovementReport {
        self.init(topo, units, orders);

        let mut passes = 0usize;
        loop {
            passes += 1;
            self.pass(topo, router);
            self.sweep();
            self.mark_dislodged();
            if !self.remove_lost_contributions() || passes > self.recs.len() + 1 {
                break;
            }
        }

        let report = self.build_report();
        debug!(
            passes,
            units = self.recs.len(),
            dislodged = report.dislodged.len(),
            standoffs = report.standoffs.len(),
            "movement resolved"
        );
        report
    }

    fn init(&mut self, topo: &Topology, units: &[Unit], orders: &[(PowerId, Order)]) {
        self.recs.clear();
        self.extra.clear();
        self.lookup.clear();
        self.lookup.resize(topo.province_count(), -1);

        for u in units {
            self.lookup[u.location.province.index()] = self.recs.len() as i16;
            self.recs.push(Rec::holding(u.power, *u));
        }
        self.forced_cut = vec![false; self.recs.len()];
        self.forced_disrupted = vec![false; self.recs.len()];

        for (power, order) in orders {
            let matched = order.unit().and_then(|ou| {
                rec_at(&self.lookup, ou.location.province).filter(|&i| {
                    let r = &self.recs[i];
                    r.power == *power
                        && r.unit.kind == ou.kind
                        && (ou.location.coast == Coast::None
                            || ou.location.coast == r.unit.location.coast)
                })
            });
            match matched {
                Some(i) => {
                    let unit = self.recs[i].unit;
                    let power = self.recs[i].power;
                    let mut rec = Rec::holding(power, unit);
                    rec.order = *order;
                    match order {
                        Order::Hold { .. } => {}
                        Order::Move { dest, via_convoy, .. } => {
                            rec.kind = RecKind::Move;
                            rec.dest = dest.province;
                            rec.dest_coast = dest.coast;
                            rec.via_convoy = *via_convoy;
                        }
                        Order::SupportHold { supported, .. } => {
                            rec.kind = RecKind::Support;
                            rec.support_dest = supported.location.province;
                        }
                        Order::SupportMove { dest, .. } => {
                            rec.kind = RecKind::Support;
                            rec.support_dest = dest.province;
                        }
                        Order::Convoy { .. } => {
                            rec.kind = RecKind::Convoy;
                        }
                        // Retreat-phase and adjustment-phase orders cannot
                        // reach the movement judge through the game, but a
                        // direct caller gets a Void, not a panic.
                        _ => {
                            rec.void = true;
                        }
                    }
                    self.recs[i] = rec;
                }
                None => self.extra.push(ResolvedOrder {
                    power: *power,
                    order: *order,
                    outcome: OrderOutcome::Void,
                    supports: 0,
                }),
            }
        }
    }

    /// One full pass of convoy viability, validity, and support counting.
    fn pass(&mut self, topo: &Topology, router: &mut ConvoyRouter) {
        let n = self.recs.len();

        for i in 0..n {
            let forced_cut = self.forced_cut[i];
            let r = &mut self.recs[i];
            r.void = matches!(
                r.order,
                Order::Retreat { .. } | Order::Disband { .. } | Order::Build { .. } | Order::Waive
            );
            r.convoy_ok = false;
            r.status = MoveStatus::Pending;
            r.head_to_head = NONE;
            r.hh_lost = false;
            r.supported = NONE;
            r.cut = forced_cut;
            r.carries = NONE;
            r.support_ids.clear();
            r.dislodged_by = NONE;
        }

        // Movers: board legality, and whether the move travels by sea.
        for i in 0..n {
            if self.recs[i].kind != RecKind::Move {
                continue;
            }
            let (void, via) = {
                let r = &self.recs[i];
                let from = r.unit.location.province;
                if r.dest == from {
                    (true, false)
                } else {
                    match r.unit.kind {
                        UnitKind::Fleet => (
                            !topo.fleet_move_ok(
                                from,
                                r.unit.location.coast,
                                r.dest,
                                r.dest_coast,
                            ),
                            false,
                        ),
                        UnitKind::Army => {
                            let direct = topo.army_move_ok(from, r.dest);
                            if r.via_convoy || !direct {
                                // By sea, stated or implied; no falling
                                // back to a land route.
                                let landable =
                                    topo.unit_can_stand(UnitKind::Army, r.dest, Coast::None);
                                (!landable, true)
                            } else {
                                (false, false)
                            }
                        }
                    }
                }
            };
            let r = &mut self.recs[i];
            r.void = r.void || void;
            r.via_convoy = via;
        }

        // Convoy orders hook onto the sea-going move they carry.
        for i in 0..n {
            if self.recs[i].kind != RecKind::Convoy {
                continue;
            }
            let (void, carries) = {
                let r = &self.recs[i];
                let own = r.unit.location.province;
                if r.unit.kind != UnitKind::Fleet || !topo.is_water(own) {
                    (true, NONE)
                } else if let Order::Convoy {
                    convoyed_from,
                    convoyed_to,
                    ..
                } = r.order
                {
                    match rec_at(&self.lookup, convoyed_from.province) {
                        Some(j) => {
                            let m = &self.recs[j];
                            let matches = m.kind == RecKind::Move
                                && m.unit.kind == UnitKind::Army
                                && m.via_convoy
                                && !m.void
                                && m.dest == convoyed_to.province;
                            if matches {
                                (false, j as u16)
                            } else {
                                (true, NONE)
                            }
                        }
                        None => (true, NONE),
                    }
                } else {
                    (true, NONE)
                }
            };
            let r = &mut self.recs[i];
            r.void = void;
            r.carries = carries;
        }

        // A sea-going move needs a live chain of fleets actually ordered
        // to carry it.
        let mut chain_checks: Vec<(usize, bool)> = Vec::new();
        for i in 0..n {
            let r = &self.recs[i];
            if !(r.kind == RecKind::Move && r.via_convoy && !r.void) {
                continue;
            }
            let fleets: Vec<ProvinceId> = self
                .recs
                .iter()
                .enumerate()
                .filter(|(c, f)| {
                    f.kind == RecKind::Convoy
                        && !f.void
                        && !self.forced_disrupted[*c]
                        && f.carries == i as u16
                })
                .map(|(_, f)| f.unit.location.province)
                .collect();
            let ok = router.has_chain(
                topo,
                r.unit.location.province,
                r.dest,
                &fleets,
                ChainConstraint::Any,
            );
            chain_checks.push((i, ok));
        }
        for (i, ok) in chain_checks {
            let r = &mut self.recs[i];
            r.convoy_ok = ok;
            if !ok {
                r.void = true;
            }
        }

        // Direct opposing movers fight head-to-head; convoyed moves slip
        // past each other.
        let mut pairs: Vec<(usize, u16)> = Vec::new();
        for i in 0..n {
            let r = &self.recs[i];
            if !r.is_mover() || r.via_convoy {
                continue;
            }
            if let Some(j) = rec_at(&self.lookup, r.dest) {
                let o = &self.recs[j];
                if o.is_mover() && !o.via_convoy && o.dest == r.unit.location.province {
                    pairs.push((i, j as u16));
                }
            }
        }
        for (i, j) in pairs {
            self.recs[i].head_to_head = j;
        }

        // Supports: legality, cuts, then attach to their target.
        let mut attach: Vec<(usize, u16)> = Vec::new();
        for i in 0..n {
            if self.recs[i].kind != RecKind::Support {
                continue;
            }
            let (void, cut, target) = {
                let r = &self.recs[i];
                let own = r.unit.location.province;
                let reach = match r.unit.kind {
                    UnitKind::Army => {
                        topo.reachable(UnitKind::Army, OrderClass::Support, own, r.support_dest)
                    }
                    UnitKind::Fleet => !topo
                        .fleet_coasts_to(own, r.unit.location.coast, r.support_dest)
                        .is_empty(),
                };
                let target = match r.order {
                    Order::SupportHold { supported, .. } => {
                        rec_at(&self.lookup, supported.location.province).filter(|&j| {
                            let t = &self.recs[j];
                            t.unit.kind == supported.kind && t.kind != RecKind::Move
                        })
                    }
                    Order::SupportMove { supported, dest, .. } => {
                        rec_at(&self.lookup, supported.location.province).filter(|&j| {
                            let t = &self.recs[j];
                            t.unit.kind == supported.kind
                                && t.kind == RecKind::Move
                                && !t.void
                                && t.dest == dest.province
                        })
                    }
                    _ => None,
                };
                let void = !reach || target.is_none();
                // An attack out of the very province the support points
                // into cannot cut it, and a power never cuts its own
                // support.
                let cut = self.recs.iter().any(|m| {
                    m.is_mover()
                        && m.dest == own
                        && m.power != r.power
                        && m.unit.location.province != r.support_dest
                });
                (void, cut, target)
            };
            let r = &mut self.recs[i];
            r.void = void;
            r.cut = r.cut || cut;
            if let Some(j) = target {
                r.supported = j as u16;
                if !r.void && !r.cut {
                    attach.push((j, i as u16));
                }
            }
        }
        for (target, supporter) in attach {
            self.recs[target as usize].support_ids.push(supporter);
        }
    }

    /// Combat relaxation: decide movers until nothing changes, then
    /// finalize rotation cycles, until every mover is settled.
    fn sweep(&mut self) {
        let movers: Vec<usize> = (0..self.recs.len())
            .filter(|&i| self.recs[i].is_mover())
            .collect();

        let limit = self.recs.len() * self.recs.len() + 8;
        let mut rounds = 0usize;
        loop {
            rounds += 1;
            if rounds > limit {
                for &i in &movers {
                    if self.recs[i].status == MoveStatus::Pending {
                        self.recs[i].status = MoveStatus::Bounced;
                    }
                }
                break;
            }
            let mut progress = false;

            // A mover whose head-to-head opponent got through has lost
            // the battle and stops preventing anyone.
            for &i in &movers {
                let hh = self.recs[i].head_to_head;
                if hh != NONE
                    && !self.recs[i].hh_lost
                    && self.recs[hh as usize].status == MoveStatus::Moves
                {
                    self.recs[i].hh_lost = true;
                    progress = true;
                }
            }

            for &i in &movers {
                if self.recs[i].status != MoveStatus::Pending {
                    continue;
                }
                if let Some(decided) = decide(&self.recs, &self.lookup, i) {
                    self.recs[i].status = decided;
                    progress = true;
                }
            }

            if progress {
                continue;
            }

            let pending: Vec<usize> = movers
                .iter()
                .copied()
                .filter(|&i| self.recs[i].status == MoveStatus::Pending)
                .collect();
            if pending.is_empty() {
                break;
            }

            // What is left is circular: chains of movers each waiting on
            // the next origin to empty. Members of clean rotations all
            // advance; anyone contested out of the rotation bounces.
            let mut member = vec![false; self.recs.len()];
            for &i in &pending {
                member[i] = true;
            }
            let mut shrunk = true;
            while shrunk {
                shrunk = false;
                for &i in &pending {
                    if !member[i] {
                        continue;
                    }
                    let dest = self.recs[i].dest;
                    let occupant_in_cycle =
                        rec_at(&self.lookup, dest).map(|j| member[j]).unwrap_or(false);
                    let blocked = self.recs.iter().enumerate().any(|(j, o)| {
                        j != i
                            && o.is_mover()
                            && o.dest == dest
                            && (member[j] || o.prevent() >= self.recs[i].attack())
                    });
                    if !occupant_in_cycle || blocked {
                        member[i] = false;
                        shrunk = true;
                    }
                }
            }

            let mut advanced = false;
            for &i in &pending {
                if member[i] {
                    self.recs[i].status = MoveStatus::Moves;
                    advanced = true;
                }
            }
            if !advanced {
                for &i in &pending {
                    self.recs[i].status = MoveStatus::Bounced;
                }
            }
        }
    }

    fn mark_dislodged(&mut self) {
        let n = self.recs.len();
        let mut hits: Vec<(usize, u16)> = Vec::new();
        for i in 0..n {
            let r = &self.recs[i];
            let stays = match r.kind {
                RecKind::Move => r.void || r.status == MoveStatus::Bounced,
                _ => true,
            };
            if !stays {
                continue;
            }
            let winner = self.recs.iter().position(|w| {
                w.is_mover()
                    && w.status == MoveStatus::Moves
                    && w.dest == r.unit.location.province
            });
            if let Some(w) = winner {
                hits.push((i, w as u16));
            }
        }
        for (i, w) in hits {
            self.recs[i].dislodged_by = w;
        }
    }

    /// Removes the board contribution of every newly dislodged supporter
    /// or convoyer. Returns whether anything changed, i.e. whether the
    /// pass must re-run.
    fn remove_lost_contributions(&mut self) -> bool {
        let mut changed = false;
        for i in 0..self.recs.len() {
            let r = &self.recs[i];
            if r.dislodged_by == NONE || r.void {
                continue;
            }
            match r.kind {
                RecKind::Support => {
                    if !r.cut && !self.forced_cut[i] {
                        self.forced_cut[i] = true;
                        changed = true;
                    }
                }
                RecKind::Convoy => {
                    if !self.forced_disrupted[i] {
                        self.forced_disrupted[i] = true;
                        changed = true;
                    }
                }
                _ => {}
            }
        }
        changed
    }

    fn build_report(&self) -> MovementReport {
        let mut report = MovementReport::default();

        for (i, r) in self.recs.iter().enumerate() {
            let dislodged = r.dislodged_by != NONE;
            let outcome = match r.kind {
                RecKind::Hold => {
                    if dislodged {
                        OrderOutcome::Dislodged
                    } else if r.void {
                        // Off-phase order on a real unit; it held.
                        OrderOutcome::Void
                    } else {
                        OrderOutcome::Succeeded
                    }
                }
                RecKind::Move => {
                    if r.void {
                        OrderOutcome::Void
                    } else if r.status == MoveStatus::Moves {
                        OrderOutcome::Succeeded
                    } else if dislodged {
                        OrderOutcome::Dislodged
                    } else {
                        OrderOutcome::Bounced
                    }
                }
                RecKind::Support => {
                    if r.void {
                        OrderOutcome::Void
                    } else if r.cut || self.forced_cut[i] {
                        OrderOutcome::Cut
                    } else {
                        OrderOutcome::Succeeded
                    }
                }
                RecKind::Convoy => {
                    if r.void {
                        OrderOutcome::Void
                    } else if self.forced_disrupted[i] {
                        OrderOutcome::Disrupted
                    } else {
                        OrderOutcome::Succeeded
                    }
                }
            };
            report.orders.push(ResolvedOrder {
                power: r.power,
                order: r.order,
                outcome,
                supports: r.support_ids.len().min(u8::MAX as usize) as u8,
            });
            if dislodged {
                report.dislodged.push(Dislodgement {
                    unit: r.unit,
                    attacker_from: self.recs[r.dislodged_by as usize]
                        .unit
                        .location
                        .province,
                });
            }
        }
        report.orders.extend(self.extra.iter().cloned());

        // Standoffs: contested destinations nobody entered.
        let mut contested: Vec<ProvinceId> = self
            .recs
            .iter()
            .filter(|r| r.is_mover() && r.status == MoveStatus::Bounced)
            .map(|r| r.dest)
            .collect();
        contested.sort();
        contested.dedup();
        report.standoffs = contested
            .into_iter()
            .filter(|&p| {
                !self
                    .recs
                    .iter()
                    .any(|r| r.is_mover() && r.status == MoveStatus::Moves && r.dest == p)
            })
            .collect();

        report
    }
}

/// Tries to settle one pending move. `None` means the board around it is
/// still undecided.
fn decide(recs: &[Rec], lookup: &[i16], i: usize) -> Option<MoveStatus> {
    let m = &recs[i];
    let attack = m.attack();

    // Head-to-head first: the opponent's defense uses its move supports,
    // and driving it out of its own province is a dislodgement like any
    // other.
    if m.head_to_head != NONE {
        let o = &recs[m.head_to_head as usize];
        if o.status == MoveStatus::Moves || m.hh_lost {
            return Some(MoveStatus::Bounced);
        }
        if o.power == m.power {
            return Some(MoveStatus::Bounced);
        }
        let defend = 1 + o.support_ids.len();
        if m.attack_against(recs, o.power) <= defend {
            return Some(MoveStatus::Bounced);
        }
    }

    // Versus every other mover on the same destination. A rival's
    // prevent can still fall to zero while its own head-to-head battle
    // is open, so losing to its current weight is only final once that
    // battle is settled; beating its current weight is always final.
    let mut beats_all = true;
    for (j, o) in recs.iter().enumerate() {
        if j == i || !o.is_mover() || o.dest != m.dest {
            continue;
        }
        let hh_open = o.head_to_head != NONE
            && !o.hh_lost
            && recs[o.head_to_head as usize].status == MoveStatus::Pending;
        let hh_beaten = o.hh_lost
            || (o.head_to_head != NONE
                && recs[o.head_to_head as usize].status == MoveStatus::Moves);
        let ceiling = if hh_beaten { 0 } else { o.prevent() };
        if attack <= ceiling {
            beats_all = false;
            if !hh_open {
                return Some(MoveStatus::Bounced);
            }
        }
    }

    // Versus the standing occupant.
    let occupant_idx = rec_at(lookup, m.dest);
    let occ_ok = match occupant_idx.map(|j| (j, &recs[j])) {
        None => Some(true),
        Some((j, o)) => {
            if m.head_to_head == j as u16 {
                // Already beaten above.
                Some(true)
            } else if o.kind == RecKind::Move && !o.void {
                match o.status {
                    MoveStatus::Moves => Some(true),
                    MoveStatus::Bounced => Some(stays_beaten(recs, m, o.power, 1)),
                    MoveStatus::Pending => {
                        // Could stay or go; only a result that wins both
                        // ways is final.
                        if stays_beaten(recs, m, o.power, 1) {
                            Some(true)
                        } else {
                            None
                        }
                    }
                }
            } else {
                let hold = 1 + o.support_ids.len();
                Some(stays_beaten(recs, m, o.power, hold))
            }
        }
    };

    match occ_ok {
        Some(true) if beats_all => Some(MoveStatus::Moves),
        Some(false) => Some(MoveStatus::Bounced),
        _ => None,
    }
}

/// Whether `m` gets past an occupant of `power` holding with the given
/// strength. Own units are never driven out, and the defender's own
/// supports never count against it.
fn stays_beaten(recs: &[Rec], m: &Rec, power: PowerId, hold: usize) -> bool {
    m.power != power && m.attack_against(recs, power) > hold
}

/// One-shot convenience over a fresh [`Resolver`].
pub fn resolve(
    topo: &Topology,
    router: &mut ConvoyRouter,
    units: &[Unit],
    orders: &[(PowerId, Order)],
) -> MovementReport {
    Resolver::new().resolve(topo, router, units, orders)
}
