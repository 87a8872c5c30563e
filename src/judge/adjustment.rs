//! Adjustment-phase adjudication: winter builds and disbands.
//!
//! A power builds up to its center surplus, capped by vacant owned home
//! centers; waives burn build slots; everything over the cap or otherwise
//! illegal is void. A power under its unit count must disband exactly the
//! difference, and a short or long disband set rejects the whole phase
//! before anything mutates. Powers that hand in nothing while owing
//! disbands fall into civil disorder and lose their units farthest from
//! home.

use std::collections::VecDeque;

use tracing::debug;

use crate::board::{Coast, Order, PowerId, Topology, Unit};

use super::report::{AdjustmentReport, OrderOutcome, PhaseError, ResolvedOrder};

/// Adjudicates one adjustment phase. `owners` is center ownership by
/// province index; `submitted` says, per power index, whether the power
/// handed in an order set at all (an empty set still counts as handed
/// in).
pub fn resolve(
    topo: &Topology,
    units: &[Unit],
    owners: &[Option<PowerId>],
    orders: &[(PowerId, Order)],
    submitted: &[bool],
) -> Result<AdjustmentReport, PhaseError> {
    let n = topo.province_count();
    let pc = topo.power_count();

    let mut unit_at = vec![false; n];
    let mut unit_count = vec![0i32; pc];
    for u in units {
        unit_at[u.location.province.index()] = true;
        unit_count[u.power.index()] += 1;
    }
    let mut center_count = vec![0i32; pc];
    for p in topo.supply_centers() {
        if let Some(o) = owners[p.index()] {
            center_count[o.index()] += 1;
        }
    }
    let delta: Vec<i32> = (0..pc)
        .map(|i| center_count[i] - unit_count[i])
        .collect();

    // Disband sets are all-or-nothing: reject before any mutation.
    for pw in topo.power_ids() {
        let need = -delta[pw.index()];
        if need <= 0 || !submitted[pw.index()] {
            continue;
        }
        let valid = count_valid_disbands(units, orders, pw);
        if valid != need as usize {
            return Err(PhaseError::OrderCountMismatch {
                power: topo.power(pw).name.clone(),
                required: need as usize,
                submitted: valid,
            });
        }
    }

    let mut slots = vec![0i32; pc];
    for pw in topo.power_ids() {
        let d = delta[pw.index()];
        if d <= 0 {
            continue;
        }
        let vacant_homes = topo
            .power(pw)
            .home_centers
            .iter()
            .filter(|h| owners[h.index()] == Some(pw) && !unit_at[h.index()])
            .count() as i32;
        slots[pw.index()] = d.min(vacant_homes);
    }

    let mut report = AdjustmentReport::default();
    let mut gone = vec![false; n];

    for (power, order) in orders {
        let pi = power.index();
        let outcome = match order {
            Order::Build { unit } => {
                let p = unit.location.province;
                let legal = delta[pi] > 0
                    && topo.power(*power).home_centers.contains(&p)
                    && owners[p.index()] == Some(*power)
                    && !unit_at[p.index()]
                    && topo.unit_can_stand(unit.kind, p, unit.location.coast);
                if legal && slots[pi] > 0 {
                    slots[pi] -= 1;
                    unit_at[p.index()] = true;
                    report.built.push(Unit::new(*power, unit.kind, unit.location));
                    OrderOutcome::Succeeded
                } else {
                    OrderOutcome::Void
                }
            }
            Order::Waive => {
                if slots[pi] > 0 {
                    slots[pi] -= 1;
                    OrderOutcome::Succeeded
                } else {
                    OrderOutcome::Void
                }
            }
            Order::Disband { unit } => {
                let target = if delta[pi] < 0 {
                    units.iter().find(|u| {
                        u.power == *power
                            && u.kind == unit.kind
                            && u.location.province == unit.location.province
                            && !gone[u.location.province.index()]
                            && (unit.location.coast == Coast::None
                                || unit.location.coast == u.location.coast)
                    })
                } else {
                    None
                };
                match target {
                    Some(u) => {
                        gone[u.location.province.index()] = true;
                        report.disbanded.push(*u);
                        OrderOutcome::Succeeded
                    }
                    None => OrderOutcome::Void,
                }
            }
            _ => OrderOutcome::Void,
        };
        report.orders.push(ResolvedOrder {
            power: *power,
            order: *order,
            outcome,
            supports: 0,
        });
    }

    // Civil disorder: no orders at all while owing disbands.
    for pw in topo.power_ids() {
        let need = -delta[pw.index()];
        if need <= 0 || submitted[pw.index()] {
            continue;
        }
        report.civil_disorder.push(pw);
        let dist = home_distances(topo, pw);
        let mut own: Vec<Unit> = units.iter().filter(|u| u.power == pw).copied().collect();
        own.sort_by(|a, b| {
            let da = dist[a.location.province.index()];
            let db = dist[b.location.province.index()];
            db.cmp(&da)
                .then(a.location.province.cmp(&b.location.province))
        });
        for u in own.into_iter().take(need as usize) {
            report.orders.push(ResolvedOrder {
                power: pw,
                order: Order::Disband {
                    unit: u.as_order_unit(),
                },
                outcome: OrderOutcome::Succeeded,
                supports: 0,
            });
            report.disbanded.push(u);
        }
    }

    debug!(
        built = report.built.len(),
        disbanded = report.disbanded.len(),
        civil_disorder = report.civil_disorder.len(),
        "adjustments resolved"
    );
    Ok(report)
}

/// Distinct own units named by the power's disband orders.
fn count_valid_disbands(units: &[Unit], orders: &[(PowerId, Order)], pw: PowerId) -> usize {
    let mut seen: Vec<Unit> = Vec::new();
    for (power, order) in orders {
        if *power != pw {
            continue;
        }
        if let Order::Disband { unit } = order {
            let hit = units.iter().find(|u| {
                u.power == pw
                    && u.kind == unit.kind
                    && u.location.province == unit.location.province
                    && (unit.location.coast == Coast::None
                        || unit.location.coast == u.location.coast)
            });
            if let Some(u) = hit {
                if !seen.contains(u) {
                    seen.push(*u);
                }
            }
        }
    }
    seen.len()
}

/// Breadth-first distance from any of the power's home centers, walking
/// every adjacency regardless of unit kind. Unreached provinces stay at
/// `u32::MAX` and count as farthest.
fn home_distances(topo: &Topology, pw: PowerId) -> Vec<u32> {
    let mut dist = vec![u32::MAX; topo.province_count()];
    let mut queue = VecDeque::new();
    for &h in &topo.power(pw).home_centers {
        dist[h.index()] = 0;
        queue.push_back(h);
    }
    while let Some(p) = queue.pop_front() {
        let d = dist[p.index()];
        for e in topo.adj_from(p) {
            if dist[e.to.index()] == u32::MAX {
                dist[e.to.index()] = d + 1;
                queue.push_back(e.to);
            }
        }
    }
    dist
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::variant;
    use crate::board::{Location, PhaseKind, ProvinceId, UnitKind};
    use crate::parse::parse_order;

    fn topo() -> Topology {
        Topology::load(&variant::standard()).expect("standard map loads")
    }

    fn p(t: &Topology, code: &str) -> ProvinceId {
        t.find_province(code).expect("known province")
    }

    fn power(t: &Topology, name: &str) -> PowerId {
        t.find_power(name).expect("known power")
    }

    fn army(t: &Topology, who: &str, code: &str) -> Unit {
        Unit::new(power(t, who), UnitKind::Army, Location::new(p(t, code)))
    }

    fn orders(t: &Topology, lines: &[&str]) -> Vec<(PowerId, Order)> {
        lines
            .iter()
            .map(|line| {
                let (who, rest) = line.split_once(':').expect("Power: order");
                let order = parse_order(t, PhaseKind::Adjustment, rest).expect(rest);
                (power(t, who.trim()), order)
            })
            .collect()
    }

    /// Ownership map with the given (power, province) claims.
    fn owners(t: &Topology, claims: &[(&str, &str)]) -> Vec<Option<PowerId>> {
        let mut v = vec![None; t.province_count()];
        for (who, code) in claims {
            v[p(t, code).index()] = Some(power(t, who));
        }
        v
    }

    fn all_submitted(t: &Topology) -> Vec<bool> {
        vec![true; t.power_count()]
    }

    #[test]
    fn builds_fill_vacant_owned_homes() {
        let t = topo();
        let units = vec![army(&t, "France", "par")];
        let owners = owners(&t, &[("France", "par"), ("France", "bre"), ("France", "mar")]);
        let report = resolve(
            &t,
            &units,
            &owners,
            &orders(&t, &["France: A bre B", "France: F mar B"]),
            &all_submitted(&t),
        )
        .expect("no disbands owed");
        assert_eq!(report.orders[0].outcome, OrderOutcome::Succeeded);
        assert_eq!(report.orders[1].outcome, OrderOutcome::Succeeded);
        assert_eq!(report.built.len(), 2);
        assert!(report.disbanded.is_empty());
        assert!(report.civil_disorder.is_empty());
    }

    #[test]
    fn builds_beyond_the_surplus_are_void() {
        let t = topo();
        // Two centers, one unit: one build allowed despite two vacant homes.
        let units = vec![army(&t, "France", "par")];
        let owners = owners(&t, &[("France", "par"), ("France", "bre")]);
        let report = resolve(
            &t,
            &units,
            &owners,
            &orders(&t, &["France: A bre B", "France: A mar B"]),
            &all_submitted(&t),
        )
        .expect("no disbands owed");
        assert_eq!(report.orders[0].outcome, OrderOutcome::Succeeded);
        assert_eq!(report.orders[1].outcome, OrderOutcome::Void);
        assert_eq!(report.built.len(), 1);
    }

    #[test]
    fn surplus_capped_by_vacant_homes() {
        let t = topo();
        // Surplus of three but only Brest free: one build, quietly.
        let units = vec![army(&t, "France", "par"), army(&t, "France", "mar")];
        let owners = owners(
            &t,
            &[
                ("France", "par"),
                ("France", "bre"),
                ("France", "mar"),
                ("France", "spa"),
                ("France", "por"),
            ],
        );
        let report = resolve(
            &t,
            &units,
            &owners,
            &orders(&t, &["France: A bre B", "France: A par B"]),
            &all_submitted(&t),
        )
        .expect("no disbands owed");
        assert_eq!(report.orders[0].outcome, OrderOutcome::Succeeded);
        // Paris is occupied; the build is void and no slot is left anyway.
        assert_eq!(report.orders[1].outcome, OrderOutcome::Void);
        assert_eq!(report.built.len(), 1);
    }

    #[test]
    fn illegal_builds_are_void() {
        let t = topo();
        let units = vec![army(&t, "France", "par")];
        let mut own = owners(&t, &[("France", "par"), ("France", "bre"), ("France", "spa")]);
        own[p(&t, "mar").index()] = Some(power(&t, "Italy"));
        let report = resolve(
            &t,
            &units,
            &own,
            &orders(
                &t,
                &[
                    "France: A spa B",  // not a home center
                    "France: A mar B",  // home lost to Italy
                    "France: F par B",  // fleets cannot stand inland
                    "France: A bre B",  // fine
                ],
            ),
            &all_submitted(&t),
        )
        .expect("no disbands owed");
        assert_eq!(report.orders[0].outcome, OrderOutcome::Void);
        assert_eq!(report.orders[1].outcome, OrderOutcome::Void);
        assert_eq!(report.orders[2].outcome, OrderOutcome::Void);
        assert_eq!(report.orders[3].outcome, OrderOutcome::Succeeded);
        assert_eq!(report.built.len(), 1);
    }

    #[test]
    fn split_coast_fleet_builds_need_a_coast() {
        let t = topo();
        let units = vec![army(&t, "Russia", "mos")];
        let owners = owners(&t, &[("Russia", "mos"), ("Russia", "stp"), ("Russia", "war")]);
        let report = resolve(
            &t,
            &units,
            &owners,
            &orders(&t, &["Russia: B F stp", "Russia: F stp/sc B"]),
            &all_submitted(&t),
        )
        .expect("no disbands owed");
        assert_eq!(report.orders[0].outcome, OrderOutcome::Void);
        assert_eq!(report.orders[1].outcome, OrderOutcome::Succeeded);
        assert_eq!(report.built.len(), 1);
        assert_eq!(report.built[0].location.coast, Coast::South);
    }

    #[test]
    fn waives_burn_slots() {
        let t = topo();
        let units = vec![army(&t, "France", "par")];
        let owners = owners(&t, &[("France", "par"), ("France", "bre")]);
        let report = resolve(
            &t,
            &units,
            &owners,
            &orders(&t, &["France: W", "France: A bre B"]),
            &all_submitted(&t),
        )
        .expect("no disbands owed");
        assert_eq!(report.orders[0].outcome, OrderOutcome::Succeeded);
        assert_eq!(report.orders[1].outcome, OrderOutcome::Void);
        assert!(report.built.is_empty());
    }

    #[test]
    fn short_disband_sets_reject_the_phase() {
        let t = topo();
        let units = vec![army(&t, "Austria", "vie"), army(&t, "Austria", "tyr")];
        let owners = owners(&t, &[]);
        let err = resolve(&t, &units, &owners, &[], &all_submitted(&t))
            .expect_err("two disbands owed");
        assert_eq!(
            err,
            PhaseError::OrderCountMismatch {
                power: "Austria".into(),
                required: 2,
                submitted: 0,
            }
        );
    }

    #[test]
    fn exact_disband_sets_apply() {
        let t = topo();
        let units = vec![army(&t, "Austria", "vie"), army(&t, "Austria", "tyr")];
        let owners = owners(&t, &[("Austria", "vie")]);
        let report = resolve(
            &t,
            &units,
            &owners,
            &orders(&t, &["Austria: A tyr D"]),
            &all_submitted(&t),
        )
        .expect("count matches");
        assert_eq!(report.orders[0].outcome, OrderOutcome::Succeeded);
        assert_eq!(report.disbanded, vec![army(&t, "Austria", "tyr")]);
    }

    #[test]
    fn disbands_without_a_deficit_are_void() {
        let t = topo();
        let units = vec![army(&t, "Austria", "vie")];
        let owners = owners(&t, &[("Austria", "vie"), ("Austria", "bud")]);
        let report = resolve(
            &t,
            &units,
            &owners,
            &orders(&t, &["Austria: A vie D"]),
            &all_submitted(&t),
        )
        .expect("no disbands owed");
        assert_eq!(report.orders[0].outcome, OrderOutcome::Void);
        assert!(report.disbanded.is_empty());
    }

    #[test]
    fn civil_disorder_loses_units_farthest_from_home() {
        let t = topo();
        let units = vec![army(&t, "Russia", "mos"), army(&t, "Russia", "tus")];
        let owners = owners(&t, &[("Russia", "mos")]);
        let mut submitted = all_submitted(&t);
        submitted[power(&t, "Russia").index()] = false;
        let report = resolve(&t, &units, &owners, &[], &submitted).expect("auto-disbands");
        assert_eq!(report.civil_disorder, vec![power(&t, "Russia")]);
        assert_eq!(report.disbanded, vec![army(&t, "Russia", "tus")]);
        assert_eq!(report.orders.len(), 1);
        assert!(matches!(report.orders[0].order, Order::Disband { .. }));
    }
}
