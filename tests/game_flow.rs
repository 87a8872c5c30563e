//! End-to-end games driven through the public [`Game`] API: powers submit
//! order text, phases adjudicate, and everything a client would read
//! comes out of snapshots and history records.

use std::sync::Arc;

use entente::board::{variant, Location, PhaseKind, Topology, Unit, UnitKind};
use entente::game::{CommandError, Game, GameSnapshot, GameState, PhaseRecord, PowerSnapshot};
use entente::judge::PhaseError;

fn standard() -> Arc<Topology> {
    Arc::new(Topology::load(&variant::standard()).expect("standard map loads"))
}

fn ok_all(results: &[Result<String, CommandError>]) {
    for r in results {
        assert!(r.is_ok(), "rejected: {:?}", r);
    }
}

fn power<'a>(snap: &'a GameSnapshot, name: &str) -> &'a PowerSnapshot {
    snap.powers
        .iter()
        .find(|p| p.name == name)
        .expect("known power")
}

/// The recorded outcome of one order in a history record.
fn outcome_of<'a>(rec: &'a PhaseRecord, power: &str, order: &str) -> &'a str {
    rec.orders
        .iter()
        .find(|po| po.power == power)
        .unwrap_or_else(|| panic!("no orders recorded for {}", power))
        .results
        .iter()
        .find(|r| r.order == order)
        .unwrap_or_else(|| panic!("no record of `{}` for {}", order, power))
        .outcome
        .as_str()
}

#[test]
fn unsupported_attacks_on_the_same_province_all_bounce() {
    let mut g = Game::new(standard());
    ok_all(&g.submit_orders("France", &["A par - bur"]));
    ok_all(&g.submit_orders("Germany", &["A mun - bur"]));
    g.process_phase().expect("spring movement");
    // Nothing was dislodged, so the retreat entry is skipped entirely.
    assert_eq!(g.phase_abbr(), "F1901M");
    let rec = &g.history()[0];
    assert_eq!(outcome_of(rec, "France", "A par - bur"), "bounced");
    assert_eq!(outcome_of(rec, "Germany", "A mun - bur"), "bounced");
    let snap = g.snapshot();
    assert!(power(&snap, "France").units.contains(&"A par".to_string()));
    assert!(power(&snap, "Germany").units.contains(&"A mun".to_string()));
}

#[test]
fn cutting_the_support_saves_the_defender() {
    let mut g = Game::new(standard());
    // Spring: Italy climbs into Tyrolia and refills Venice behind it.
    ok_all(&g.submit_orders("Italy", &["A ven - tyr", "A rom - ven"]));
    g.process_phase().expect("spring movement");
    // Fall: the supported attack would take Trieste two to one, but
    // Vienna's poke at the supporter drops it back to one against one.
    ok_all(&g.submit_orders("Italy", &["A ven - tri", "A tyr S A ven - tri"]));
    ok_all(&g.submit_orders("Austria", &["A tri H", "A vie - tyr"]));
    g.process_phase().expect("fall movement");
    let rec = g.history().last().expect("fall record");
    assert_eq!(outcome_of(rec, "Italy", "A tyr S A ven - tri"), "cut");
    assert_eq!(outcome_of(rec, "Italy", "A ven - tri"), "bounced");
    assert_eq!(outcome_of(rec, "Austria", "A vie - tyr"), "bounced");
    assert_eq!(outcome_of(rec, "Austria", "A tri H"), "succeeded");
    assert_eq!(g.phase_abbr(), "W1901A");
    assert!(power(&g.snapshot(), "Austria")
        .units
        .contains(&"A tri".to_string()));
}

#[test]
fn a_dead_convoy_voids_the_move_despite_the_land_border() {
    let mut g = Game::new(standard());
    // Spring: France puts a fleet in the Channel and an army on Picardy.
    ok_all(&g.submit_orders("France", &["F bre - eng", "A par - pic"]));
    ok_all(&g.submit_orders("England", &["F edi - nth"]));
    g.process_phase().expect("spring movement");
    // Fall: Picardy rides the Channel to Belgium while England breaks
    // the Channel open. The army does not fall back to the land border.
    ok_all(&g.submit_orders("France", &["A pic - bel via", "F eng C A pic - bel"]));
    ok_all(&g.submit_orders("England", &["F lon - eng", "F nth S F lon - eng"]));
    g.process_phase().expect("fall movement");
    assert_eq!(g.phase_abbr(), "F1901R");
    let rec = g.history().last().expect("fall record");
    assert_eq!(outcome_of(rec, "France", "A pic - bel via"), "void");
    assert_eq!(outcome_of(rec, "France", "F eng C A pic - bel"), "disrupted");
    assert_eq!(outcome_of(rec, "England", "F lon - eng"), "succeeded");
    let snap = g.snapshot();
    let france = power(&snap, "France");
    assert!(france.units.contains(&"A pic".to_string()));
    assert!(france.units.contains(&"*F eng".to_string()));
    assert!(snap
        .powers
        .iter()
        .all(|p| !p.units.iter().any(|u| u.ends_with("bel"))));
}

#[test]
fn builds_cap_at_open_home_centers() {
    let topo = standard();
    let mut st = GameState::opening(&topo);
    // France: five centers, three units, and Marseilles the only open
    // home. The surplus of two permits a single build.
    let france = topo.find_power("France").expect("france");
    let mar = topo.find_province("mar").expect("mar");
    let spa = topo.find_province("spa").expect("spa");
    let por = topo.find_province("por").expect("por");
    st.units
        .retain(|u| !(u.power == france && u.location.province == mar));
    st.units
        .push(Unit::new(france, UnitKind::Army, Location::new(spa)));
    st.owners[spa.index()] = Some(france);
    st.owners[por.index()] = Some(france);
    let first = topo.first_marker().expect("playable phase");
    st.marker = topo
        .find_next_phase(first, Some(PhaseKind::Adjustment), 0)
        .expect("adjustment entry");
    let mut g = Game::from_state(topo, st);

    assert_eq!(g.phase_abbr(), "W1901A");
    let snap = g.snapshot();
    let fr = power(&snap, "France");
    assert_eq!(fr.centers.len(), 5);
    assert_eq!(fr.builds, 1);

    ok_all(&g.submit_orders("France", &["A mar B", "A par B"]));
    g.process_phase().expect("winter adjudicates");
    let rec = g.history().last().expect("winter record");
    assert_eq!(outcome_of(rec, "France", "A mar B"), "succeeded");
    assert_eq!(outcome_of(rec, "France", "A par B"), "void");
    assert_eq!(power(&g.snapshot(), "France").units.len(), 4);
}

#[test]
fn the_year_turns_exactly_once_per_cycle() {
    let mut g = Game::new(standard());
    let mut seen = vec![g.phase_abbr()];
    // One quiet conquest: Marseilles takes Spain and winters there.
    ok_all(&g.submit_orders("France", &["A mar - spa"]));
    g.process_phase().expect("spring");
    seen.push(g.phase_abbr());
    g.submit_orders("France", &[]);
    g.process_phase().expect("fall");
    seen.push(g.phase_abbr());
    ok_all(&g.submit_orders("France", &["A mar B"]));
    g.process_phase().expect("winter");
    seen.push(g.phase_abbr());
    assert_eq!(seen, vec!["S1901M", "F1901M", "W1901A", "S1902M"]);
    let hist: Vec<&str> = g.history().iter().map(|r| r.phase.as_str()).collect();
    assert_eq!(hist, vec!["S1901M", "F1901M", "W1901A"]);
    let snap = g.snapshot();
    let fr = power(&snap, "France");
    assert_eq!(fr.units.len(), 4);
    assert!(fr.centers.contains(&"spa".to_string()));
}

#[test]
fn snapshots_serialize_for_clients() {
    let g = Game::new(standard());
    let v = serde_json::to_value(g.snapshot()).expect("snapshot serializes");
    assert_eq!(v["variant"], "standard");
    assert_eq!(v["phase_abbr"], "S1901M");
    assert_eq!(v["status"], "active");
    assert!(v["winner"].is_null());
    let powers = v["powers"].as_array().expect("powers array");
    assert_eq!(powers.len(), 7);
    let austria = &powers[0];
    assert_eq!(austria["name"], "Austria");
    assert_eq!(austria["units"].as_array().expect("units").len(), 3);
    assert_eq!(austria["builds"], 0);
    assert_eq!(austria["civil_disorder"], false);
    assert!(austria["retreats"].as_array().expect("retreats").is_empty());
}

#[test]
fn reaching_the_center_threshold_ends_the_game() {
    let topo = standard();
    let mut st = GameState::opening(&topo);
    // Hand England the twelve neutral centers and, with Turkey wiped
    // out, the Turkish homes too: eighteen in all after the fall.
    let england = topo.find_power("England").expect("england");
    for code in [
        "nwy", "swe", "den", "hol", "bel", "spa", "por", "tun", "bul", "rum", "gre", "ser",
        "ank", "con", "smy",
    ] {
        let p = topo.find_province(code).expect("supply center");
        st.owners[p.index()] = Some(england);
    }
    let turkey = topo.find_power("Turkey").expect("turkey");
    st.units.retain(|u| u.power != turkey);
    let mut g = Game::from_state(topo, st);

    g.process_phase().expect("spring");
    // Victory is only checked at the adjustment boundary.
    assert!(!g.is_over());
    g.process_phase().expect("fall");
    assert!(g.is_over());
    assert_eq!(g.winner(), Some("England"));
    assert_eq!(g.snapshot().status, "completed");
    assert!(matches!(g.process_phase(), Err(PhaseError::GameOver)));
    let fb = g.submit_orders("England", &["F lon H"]);
    assert!(matches!(fb[0], Err(CommandError::GameOver)));
}

#[test]
fn the_last_power_standing_wins() {
    let topo = standard();
    let mut st = GameState::opening(&topo);
    let england = topo.find_power("England").expect("england");
    st.units.retain(|u| u.power == england);
    for o in st.owners.iter_mut() {
        if o.is_some_and(|pw| pw != england) {
            *o = None;
        }
    }
    let mut g = Game::from_state(topo, st);
    g.process_phase().expect("spring");
    assert!(g.is_over());
    assert_eq!(g.winner(), Some("England"));
}
