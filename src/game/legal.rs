//! Legal-order menus.
//!
//! Everything here enumerates by the same rules the judges apply, so a
//! menu entry submitted verbatim is never rejected and never resolves
//! `Void` for board-legality reasons. Entries are canonical order text,
//! sorted and deduplicated.

use std::collections::BTreeSet;

use crate::board::{
    Location, Order, OrderClass, OrderUnit, PhaseKind, PowerId, ProvinceId, Terrain, Topology,
    Unit, UnitKind,
};
use crate::convoy::{ChainConstraint, ConvoyRouter};
use crate::judge::Dislodgement;

use super::state::GameState;

/// Provinces the power has anything to order in the current phase.
pub fn orderable_locations(topo: &Topology, state: &GameState, pw: PowerId) -> Vec<ProvinceId> {
    let mut out: Vec<ProvinceId> = match topo.phase_kind(state.marker) {
        Some(PhaseKind::Movement) => state.units_of(pw).map(|u| u.location.province).collect(),
        Some(PhaseKind::Retreat) => state
            .dislodged
            .iter()
            .filter(|d| d.unit.power == pw)
            .map(|d| d.unit.location.province)
            .collect(),
        Some(PhaseKind::Adjustment) => {
            let balance = state.build_balance(pw);
            if balance > 0 {
                state.vacant_owned_homes(topo, pw)
            } else if balance < 0 {
                state.units_of(pw).map(|u| u.location.province).collect()
            } else {
                Vec::new()
            }
        }
        None => Vec::new(),
    };
    out.sort();
    out
}

/// Every order the power could submit this phase, as canonical text.
pub fn possible_orders(
    topo: &Topology,
    state: &GameState,
    router: &mut ConvoyRouter,
    pw: PowerId,
) -> Vec<String> {
    let mut out = Vec::new();
    match topo.phase_kind(state.marker) {
        Some(PhaseKind::Movement) => movement_menu(topo, state, router, pw, &mut out),
        Some(PhaseKind::Retreat) => retreat_menu(topo, state, pw, &mut out),
        Some(PhaseKind::Adjustment) => adjustment_menu(topo, state, pw, &mut out),
        None => {}
    }
    out.sort();
    out.dedup();
    out
}

/// Where a dislodged unit may legally retreat.
pub fn retreat_destinations(
    topo: &Topology,
    state: &GameState,
    d: &Dislodgement,
) -> Vec<Location> {
    let from = d.unit.location;
    let mut dests: Vec<Location> = match d.unit.kind {
        UnitKind::Army => topo
            .adj_from(from.province)
            .iter()
            .filter(|e| e.army_ok)
            .map(|e| Location::new(e.to))
            .collect(),
        UnitKind::Fleet => topo
            .adj_from(from.province)
            .iter()
            .filter(|e| e.fleet_ok && e.from_coast == from.coast)
            .map(|e| Location::with_coast(e.to, e.to_coast))
            .collect(),
    };
    dests.retain(|loc| {
        loc.province != d.attacker_from
            && !state.standoffs.contains(&loc.province)
            && state.unit_at(loc.province).is_none()
    });
    dests.sort_by_key(|loc| (loc.province, loc.coast));
    dests.dedup();
    dests
}

fn movement_menu(
    topo: &Topology,
    state: &GameState,
    router: &mut ConvoyRouter,
    pw: PowerId,
    out: &mut Vec<String>,
) {
    let fleets: Vec<ProvinceId> = state
        .units
        .iter()
        .filter(|u| u.kind == UnitKind::Fleet && topo.is_water(u.location.province))
        .map(|u| u.location.province)
        .collect();

    let own: Vec<Unit> = state.units_of(pw).copied().collect();
    for u in &own {
        let unit = u.as_order_unit();
        let from = u.location;

        out.push(Order::Hold { unit }.to_text(topo));

        match u.kind {
            UnitKind::Army => {
                for e in topo.adj_from(from.province) {
                    if e.army_ok {
                        out.push(
                            Order::Move {
                                unit,
                                dest: Location::new(e.to),
                                via_convoy: false,
                            }
                            .to_text(topo),
                        );
                    }
                }
                for dest in sea_reachable(topo, router, &fleets, from.province) {
                    out.push(
                        Order::Move {
                            unit,
                            dest: Location::new(dest),
                            via_convoy: true,
                        }
                        .to_text(topo),
                    );
                }
            }
            UnitKind::Fleet => {
                for e in topo.adj_from(from.province) {
                    if e.fleet_ok && e.from_coast == from.coast {
                        out.push(
                            Order::Move {
                                unit,
                                dest: Location::with_coast(e.to, e.to_coast),
                                via_convoy: false,
                            }
                            .to_text(topo),
                        );
                    }
                }
            }
        }

        // Supports for anything this unit can lend weight to.
        for v in &state.units {
            if v.location.province == from.province {
                continue;
            }
            if support_reach(topo, u, v.location.province) {
                out.push(
                    Order::SupportHold {
                        unit,
                        supported: v.as_order_unit(),
                    }
                    .to_text(topo),
                );
            }
            for dest in move_targets(topo, router, &fleets, v) {
                if dest != from.province && support_reach(topo, u, dest) {
                    out.push(
                        Order::SupportMove {
                            unit,
                            supported: v.as_order_unit(),
                            dest: Location::new(dest),
                        }
                        .to_text(topo),
                    );
                }
            }
        }

        // Convoys this fleet could carry.
        if u.kind == UnitKind::Fleet && topo.is_water(from.province) {
            for a in &state.units {
                if a.kind != UnitKind::Army {
                    continue;
                }
                for dest in topo.province_ids() {
                    if dest == a.location.province
                        || topo.province(dest).terrain != Terrain::Coastal
                    {
                        continue;
                    }
                    if router.has_chain(
                        topo,
                        a.location.province,
                        dest,
                        &fleets,
                        ChainConstraint::Through(from.province),
                    ) {
                        out.push(
                            Order::Convoy {
                                unit,
                                convoyed_from: Location::new(a.location.province),
                                convoyed_to: Location::new(dest),
                            }
                            .to_text(topo),
                        );
                    }
                }
            }
        }
    }
}

/// Province-level move targets of a unit, direct and by sea, for support
/// enumeration.
fn move_targets(
    topo: &Topology,
    router: &mut ConvoyRouter,
    fleets: &[ProvinceId],
    v: &Unit,
) -> BTreeSet<ProvinceId> {
    let mut dests = BTreeSet::new();
    match v.kind {
        UnitKind::Army => {
            for e in topo.adj_from(v.location.province) {
                if e.army_ok {
                    dests.insert(e.to);
                }
            }
            for p in sea_reachable(topo, router, fleets, v.location.province) {
                dests.insert(p);
            }
        }
        UnitKind::Fleet => {
            for e in topo.adj_from(v.location.province) {
                if e.fleet_ok && e.from_coast == v.location.coast {
                    dests.insert(e.to);
                }
            }
        }
    }
    dests
}

/// Coastal provinces an army could reach by convoy through the fleets
/// currently at sea.
fn sea_reachable(
    topo: &Topology,
    router: &mut ConvoyRouter,
    fleets: &[ProvinceId],
    from: ProvinceId,
) -> Vec<ProvinceId> {
    if topo.province(from).terrain != Terrain::Coastal || fleets.is_empty() {
        return Vec::new();
    }
    topo.province_ids()
        .filter(|&dest| {
            dest != from
                && topo.province(dest).terrain == Terrain::Coastal
                && router.has_chain(topo, from, dest, fleets, ChainConstraint::Any)
        })
        .collect()
}

fn support_reach(topo: &Topology, u: &Unit, target: ProvinceId) -> bool {
    match u.kind {
        UnitKind::Army => topo.reachable(
            UnitKind::Army,
            OrderClass::Support,
            u.location.province,
            target,
        ),
        UnitKind::Fleet => !topo
            .fleet_coasts_to(u.location.province, u.location.coast, target)
            .is_empty(),
    }
}

fn retreat_menu(topo: &Topology, state: &GameState, pw: PowerId, out: &mut Vec<String>) {
    for d in &state.dislodged {
        if d.unit.power != pw {
            continue;
        }
        let unit = d.unit.as_order_unit();
        out.push(Order::Disband { unit }.to_text(topo));
        for dest in retreat_destinations(topo, state, d) {
            out.push(Order::Retreat { unit, dest }.to_text(topo));
        }
    }
}

fn adjustment_menu(topo: &Topology, state: &GameState, pw: PowerId, out: &mut Vec<String>) {
    let balance = state.build_balance(pw);
    if balance > 0 {
        for h in state.vacant_owned_homes(topo, pw) {
            let meta = topo.province(h);
            if meta.terrain.allows(UnitKind::Army) {
                out.push(
                    Order::Build {
                        unit: OrderUnit::new(UnitKind::Army, Location::new(h)),
                    }
                    .to_text(topo),
                );
            }
            if meta.terrain.allows(UnitKind::Fleet) {
                if meta.is_split_coast() {
                    for &c in &meta.coasts {
                        out.push(
                            Order::Build {
                                unit: OrderUnit::new(
                                    UnitKind::Fleet,
                                    Location::with_coast(h, c),
                                ),
                            }
                            .to_text(topo),
                        );
                    }
                } else {
                    out.push(
                        Order::Build {
                            unit: OrderUnit::new(UnitKind::Fleet, Location::new(h)),
                        }
                        .to_text(topo),
                    );
                }
            }
        }
        out.push(Order::Waive.to_text(topo));
    } else if balance < 0 {
        for u in state.units_of(pw) {
            out.push(
                Order::Disband {
                    unit: u.as_order_unit(),
                }
                .to_text(topo),
            );
        }
    }
}
