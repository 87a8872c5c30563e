//! Retreat-phase adjudication.
//!
//! Dislodged units may retreat to an adjacent province that is empty, not
//! the province their attacker came from, and not left contested by a
//! standoff. Everything else disbands: units given no order, units whose
//! retreat is illegal, and units whose retreats collide. Only retreats
//! that were individually legal compete for a province; an illegal
//! retreat disbands without blocking anyone.

use tracing::debug;

use crate::board::{Coast, Order, PowerId, ProvinceId, Topology, Unit, UnitKind};

use super::report::{Dislodgement, OrderOutcome, ResolvedOrder, RetreatReport};

/// Adjudicates one retreat phase. `occupied` is the board as it stands
/// after movement, dislodged units excluded. Orders that match no
/// dislodged unit come back `Void` and touch nothing.
pub fn resolve(
    topo: &Topology,
    occupied: &[Unit],
    dislodged: &[Dislodgement],
    standoffs: &[ProvinceId],
    orders: &[(PowerId, Order)],
) -> RetreatReport {
    let n = topo.province_count();
    let mut blocked = vec![false; n];
    for u in occupied {
        blocked[u.location.province.index()] = true;
    }
    for &p in standoffs {
        blocked[p.index()] = true;
    }

    let mut report = RetreatReport::default();
    let mut handled = vec![false; dislodged.len()];
    // (index into report.orders, retreating unit, destination province)
    let mut claims: Vec<(usize, Unit, ProvinceId)> = Vec::new();

    for (power, order) in orders {
        let matched = order.unit().and_then(|ou| {
            dislodged.iter().position(|d| {
                d.unit.power == *power
                    && d.unit.kind == ou.kind
                    && d.unit.location.province == ou.location.province
                    && (ou.location.coast == Coast::None
                        || ou.location.coast == d.unit.location.coast)
            })
        });
        let slot = report.orders.len();
        let mut outcome = OrderOutcome::Void;
        match (order, matched) {
            (Order::Retreat { dest, .. }, Some(di)) if !handled[di] => {
                handled[di] = true;
                let d = &dislodged[di];
                let from = d.unit.location;
                let reach = match d.unit.kind {
                    UnitKind::Army => topo.army_move_ok(from.province, dest.province),
                    UnitKind::Fleet => {
                        topo.fleet_move_ok(from.province, from.coast, dest.province, dest.coast)
                    }
                };
                let legal = reach
                    && dest.province != d.attacker_from
                    && !blocked[dest.province.index()];
                if legal {
                    claims.push((slot, d.unit, dest.province));
                    outcome = OrderOutcome::Succeeded;
                } else {
                    report.disbanded.push(d.unit);
                }
            }
            (Order::Disband { .. }, Some(di)) if !handled[di] => {
                handled[di] = true;
                report.disbanded.push(dislodged[di].unit);
                outcome = OrderOutcome::Succeeded;
            }
            _ => {}
        }
        report.orders.push(ResolvedOrder {
            power: *power,
            order: *order,
            outcome,
            supports: 0,
        });
    }

    // Legal retreats aiming at the same province all fail and disband.
    let mut targets = vec![0u8; n];
    for (_, _, dest) in &claims {
        targets[dest.index()] = targets[dest.index()].saturating_add(1);
    }
    for (slot, unit, dest) in claims {
        if targets[dest.index()] > 1 {
            report.orders[slot].outcome = OrderOutcome::Bounced;
            report.disbanded.push(unit);
        }
    }

    // No order means no retreat.
    for (di, d) in dislodged.iter().enumerate() {
        if handled[di] {
            continue;
        }
        report.orders.push(ResolvedOrder {
            power: d.unit.power,
            order: Order::Disband {
                unit: d.unit.as_order_unit(),
            },
            outcome: OrderOutcome::Succeeded,
            supports: 0,
        });
        report.disbanded.push(d.unit);
    }

    debug!(
        dislodged = dislodged.len(),
        disbanded = report.disbanded.len(),
        "retreats resolved"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::variant;
    use crate::board::{Location, PhaseKind};
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

    fn fleet(t: &Topology, who: &str, code: &str) -> Unit {
        Unit::new(power(t, who), UnitKind::Fleet, Location::new(p(t, code)))
    }

    fn orders(t: &Topology, lines: &[&str]) -> Vec<(PowerId, Order)> {
        lines
            .iter()
            .map(|line| {
                let (who, rest) = line.split_once(':').expect("Power: order");
                let order = parse_order(t, PhaseKind::Retreat, rest).expect(rest);
                (power(t, who.trim()), order)
            })
            .collect()
    }

    #[test]
    fn retreat_to_an_open_province_succeeds() {
        let t = topo();
        let dislodged = vec![Dislodgement {
            unit: army(&t, "Austria", "tyr"),
            attacker_from: p(&t, "mun"),
        }];
        let occupied = vec![army(&t, "Germany", "tyr")];
        let report = resolve(
            &t,
            &occupied,
            &dislodged,
            &[],
            &orders(&t, &["Austria: A tyr R boh"]),
        );
        assert_eq!(report.orders.len(), 1);
        assert_eq!(report.orders[0].outcome, OrderOutcome::Succeeded);
        assert!(report.disbanded.is_empty());
    }

    #[test]
    fn attacker_origin_standoffs_and_occupied_provinces_are_barred() {
        let t = topo();
        let dislodged = vec![Dislodgement {
            unit: army(&t, "Austria", "tyr"),
            attacker_from: p(&t, "mun"),
        }];
        let occupied = vec![army(&t, "Germany", "tyr"), army(&t, "Italy", "ven")];
        let standoffs = vec![p(&t, "boh")];
        for bad in ["A tyr R mun", "A tyr R boh", "A tyr R ven"] {
            let report = resolve(
                &t,
                &occupied,
                &dislodged,
                &standoffs,
                &orders(&t, &[&format!("Austria: {bad}")]),
            );
            assert_eq!(report.orders[0].outcome, OrderOutcome::Void, "{bad}");
            assert_eq!(report.disbanded, vec![dislodged[0].unit], "{bad}");
        }
    }

    #[test]
    fn nonadjacent_retreat_is_void() {
        let t = topo();
        let dislodged = vec![Dislodgement {
            unit: army(&t, "Austria", "tyr"),
            attacker_from: p(&t, "mun"),
        }];
        let report = resolve(
            &t,
            &[],
            &dislodged,
            &[],
            &orders(&t, &["Austria: A tyr R war"]),
        );
        assert_eq!(report.orders[0].outcome, OrderOutcome::Void);
        assert_eq!(report.disbanded, vec![dislodged[0].unit]);
    }

    #[test]
    fn colliding_retreats_all_disband() {
        let t = topo();
        let dislodged = vec![
            Dislodgement {
                unit: army(&t, "Austria", "tyr"),
                attacker_from: p(&t, "mun"),
            },
            Dislodgement {
                unit: army(&t, "Russia", "gal"),
                attacker_from: p(&t, "war"),
            },
        ];
        let report = resolve(
            &t,
            &[],
            &dislodged,
            &[],
            &orders(&t, &["Austria: A tyr R boh", "Russia: A gal R boh"]),
        );
        assert_eq!(report.orders[0].outcome, OrderOutcome::Bounced);
        assert_eq!(report.orders[1].outcome, OrderOutcome::Bounced);
        assert_eq!(report.disbanded.len(), 2);
    }

    #[test]
    fn an_illegal_retreat_exerts_no_claim() {
        let t = topo();
        // Galicia's retreat to Bohemia is not even adjacent to it, so
        // Tyrolia's legal retreat there goes through alone.
        let dislodged = vec![
            Dislodgement {
                unit: army(&t, "Austria", "tyr"),
                attacker_from: p(&t, "mun"),
            },
            Dislodgement {
                unit: army(&t, "Russia", "ukr"),
                attacker_from: p(&t, "war"),
            },
        ];
        let report = resolve(
            &t,
            &[],
            &dislodged,
            &[],
            &orders(&t, &["Austria: A tyr R boh", "Russia: A ukr R boh"]),
        );
        assert_eq!(report.orders[0].outcome, OrderOutcome::Succeeded);
        assert_eq!(report.orders[1].outcome, OrderOutcome::Void);
        assert_eq!(report.disbanded, vec![dislodged[1].unit]);
    }

    #[test]
    fn unordered_dislodged_units_disband() {
        let t = topo();
        let dislodged = vec![Dislodgement {
            unit: fleet(&t, "England", "nth"),
            attacker_from: p(&t, "hel"),
        }];
        let report = resolve(&t, &[], &dislodged, &[], &[]);
        assert_eq!(report.orders.len(), 1);
        assert!(matches!(report.orders[0].order, Order::Disband { .. }));
        assert_eq!(report.orders[0].outcome, OrderOutcome::Succeeded);
        assert_eq!(report.disbanded, vec![dislodged[0].unit]);
    }

    #[test]
    fn disband_orders_are_honored() {
        let t = topo();
        let dislodged = vec![Dislodgement {
            unit: army(&t, "France", "bur"),
            attacker_from: p(&t, "mun"),
        }];
        let report = resolve(
            &t,
            &[],
            &dislodged,
            &[],
            &orders(&t, &["France: A bur D"]),
        );
        assert_eq!(report.orders[0].outcome, OrderOutcome::Succeeded);
        assert_eq!(report.disbanded, vec![dislodged[0].unit]);
    }

    #[test]
    fn fleet_retreats_land_on_the_reachable_coast() {
        let t = topo();
        let dislodged = vec![Dislodgement {
            unit: fleet(&t, "France", "gol"),
            attacker_from: p(&t, "tys"),
        }];
        let report = resolve(
            &t,
            &[],
            &dislodged,
            &[],
            &orders(&t, &["France: F gol R spa"]),
        );
        assert_eq!(report.orders[0].outcome, OrderOutcome::Succeeded);
        if let Order::Retreat { dest, .. } = report.orders[0].order {
            assert_eq!(dest.coast, Coast::South);
        } else {
            panic!("expected a retreat order");
        }
        assert!(report.disbanded.is_empty());
    }

    #[test]
    fn orders_for_standing_units_are_void() {
        let t = topo();
        let report = resolve(
            &t,
            &[army(&t, "Austria", "vie")],
            &[],
            &[],
            &orders(&t, &["Austria: A vie R boh"]),
        );
        assert_eq!(report.orders[0].outcome, OrderOutcome::Void);
        assert!(report.disbanded.is_empty());
    }
}
