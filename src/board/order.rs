//! Order types for all phases.
//!
//! Represents the full set of legal orders: hold, move, support, convoy,
//! retreat, disband, build, and waive. Orders reference provinces by id, so
//! rendering them as text needs the topology that issued those ids.

use super::province::{Coast, ProvinceId};
use super::topology::Topology;
use super::unit::UnitKind;

/// A location on the board: a province with an optional coast specifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Location {
    pub province: ProvinceId,
    pub coast: Coast,
}

impl Location {
    /// Creates a location without a coast.
    pub fn new(province: ProvinceId) -> Self {
        Self { province, coast: Coast::None }
    }

    /// Creates a location with a coast specifier.
    pub fn with_coast(province: ProvinceId, coast: Coast) -> Self {
        Self { province, coast }
    }

    /// Renders as `code` or `code/coast`, e.g. `stp/nc`.
    pub fn text(&self, topo: &Topology) -> String {
        let code = &topo.province(self.province).code;
        match self.coast {
            Coast::None => code.clone(),
            c => format!("{}/{}", code, c.abbr()),
        }
    }
}

/// A unit reference in an order: the unit kind and its current location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OrderUnit {
    pub kind: UnitKind,
    pub location: Location,
}

impl OrderUnit {
    pub fn new(kind: UnitKind, location: Location) -> Self {
        Self { kind, location }
    }

    /// Renders as `A par` or `F stp/nc`.
    pub fn text(&self, topo: &Topology) -> String {
        format!("{} {}", self.kind.letter(), self.location.text(topo))
    }
}

/// Words the parser recognizes besides names; what a topology's lexicon
/// maps order vocabulary to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderKeyword {
    Hold,
    Support,
    Convoy,
    MoveTo,
    Retreat,
    Disband,
    Build,
    Waive,
    Via,
}

/// An order covering all three phase kinds.
///
/// Each variant carries exactly the data needed to unambiguously specify
/// the order; [`to_text`](Order::to_text) renders the canonical notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Order {
    /// Hold: `A vie H`
    Hold {
        unit: OrderUnit,
    },

    /// Move: `A bud - rum`, `F nrg - stp/nc`, or `A lon - bre via`
    Move {
        unit: OrderUnit,
        dest: Location,
        /// The move goes by convoy even where a land route exists. A move
        /// with this flag set never falls back to marching overland.
        via_convoy: bool,
    },

    /// Support hold: `A tyr S A vie H`
    SupportHold {
        unit: OrderUnit,
        supported: OrderUnit,
    },

    /// Support move: `A gal S A bud - rum`
    SupportMove {
        unit: OrderUnit,
        supported: OrderUnit,
        dest: Location,
    },

    /// Convoy: `F mao C A bre - spa`
    Convoy {
        unit: OrderUnit,
        convoyed_from: Location,
        convoyed_to: Location,
    },

    /// Retreat: `A vie R boh`
    Retreat {
        unit: OrderUnit,
        dest: Location,
    },

    /// Disband: `F tri D` (retreat phase) or `A war D` (adjustment phase)
    Disband {
        unit: OrderUnit,
    },

    /// Build: `A vie B` or `F stp/sc B`
    Build {
        unit: OrderUnit,
    },

    /// Waive: `W` (voluntarily skip one build)
    Waive,
}

impl Order {
    /// The unit carrying out the order, if the order names one.
    pub fn unit(&self) -> Option<OrderUnit> {
        match self {
            Order::Hold { unit }
            | Order::Move { unit, .. }
            | Order::SupportHold { unit, .. }
            | Order::SupportMove { unit, .. }
            | Order::Convoy { unit, .. }
            | Order::Retreat { unit, .. }
            | Order::Disband { unit }
            | Order::Build { unit } => Some(*unit),
            Order::Waive => None,
        }
    }

    /// The province whose unit this order belongs to, if any.
    pub fn province(&self) -> Option<ProvinceId> {
        self.unit().map(|u| u.location.province)
    }

    /// Canonical text rendering. `parse_order` accepts everything this
    /// produces.
    pub fn to_text(&self, topo: &Topology) -> String {
        match self {
            Order::Hold { unit } => {
                format!("{} H", unit.text(topo))
            }
            Order::Move { unit, dest, via_convoy } => {
                let mut s = format!("{} - {}", unit.text(topo), dest.text(topo));
                if *via_convoy {
                    s.push_str(" via");
                }
                s
            }
            Order::SupportHold { unit, supported } => {
                format!("{} S {} H", unit.text(topo), supported.text(topo))
            }
            Order::SupportMove { unit, supported, dest } => {
                format!(
                    "{} S {} - {}",
                    unit.text(topo),
                    supported.text(topo),
                    dest.text(topo)
                )
            }
            Order::Convoy { unit, convoyed_from, convoyed_to } => {
                format!(
                    "{} C A {} - {}",
                    unit.text(topo),
                    convoyed_from.text(topo),
                    convoyed_to.text(topo)
                )
            }
            Order::Retreat { unit, dest } => {
                format!("{} R {}", unit.text(topo), dest.text(topo))
            }
            Order::Disband { unit } => {
                format!("{} D", unit.text(topo))
            }
            Order::Build { unit } => {
                format!("{} B", unit.text(topo))
            }
            Order::Waive => "W".to_string(),
        }
    }
}

/// Formats a slice of orders as a ` ; `-separated string.
pub fn format_orders(topo: &Topology, orders: &[Order]) -> String {
    orders
        .iter()
        .map(|o| o.to_text(topo))
        .collect::<Vec<_>>()
        .join(" ; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::topology::Topology;
    use crate::board::variant;

    fn topo() -> Topology {
        Topology::load(&variant::standard()).expect("standard map loads")
    }

    fn loc(topo: &Topology, code: &str) -> Location {
        Location::new(topo.find_province(code).expect("known province"))
    }

    fn loc_c(topo: &Topology, code: &str, coast: Coast) -> Location {
        Location::with_coast(topo.find_province(code).expect("known province"), coast)
    }

    #[test]
    fn location_text_includes_coast_only_when_set() {
        let t = topo();
        assert_eq!(loc(&t, "par").text(&t), "par");
        assert_eq!(loc_c(&t, "stp", Coast::North).text(&t), "stp/nc");
    }

    #[test]
    fn canonical_notation() {
        let t = topo();
        let army = |code: &str| OrderUnit::new(UnitKind::Army, loc(&t, code));
        let fleet = |code: &str| OrderUnit::new(UnitKind::Fleet, loc(&t, code));

        assert_eq!(Order::Hold { unit: army("vie") }.to_text(&t), "A vie H");
        assert_eq!(
            Order::Move { unit: army("bud"), dest: loc(&t, "rum"), via_convoy: false }
                .to_text(&t),
            "A bud - rum"
        );
        assert_eq!(
            Order::Move { unit: army("lon"), dest: loc(&t, "bre"), via_convoy: true }
                .to_text(&t),
            "A lon - bre via"
        );
        assert_eq!(
            Order::Move {
                unit: fleet("nrg"),
                dest: loc_c(&t, "stp", Coast::North),
                via_convoy: false,
            }
            .to_text(&t),
            "F nrg - stp/nc"
        );
        assert_eq!(
            Order::SupportHold { unit: army("tyr"), supported: army("vie") }.to_text(&t),
            "A tyr S A vie H"
        );
        assert_eq!(
            Order::SupportMove {
                unit: army("gal"),
                supported: army("bud"),
                dest: loc(&t, "rum"),
            }
            .to_text(&t),
            "A gal S A bud - rum"
        );
        assert_eq!(
            Order::Convoy {
                unit: fleet("mao"),
                convoyed_from: loc(&t, "bre"),
                convoyed_to: loc(&t, "spa"),
            }
            .to_text(&t),
            "F mao C A bre - spa"
        );
        assert_eq!(
            Order::Retreat { unit: army("vie"), dest: loc(&t, "boh") }.to_text(&t),
            "A vie R boh"
        );
        assert_eq!(Order::Disband { unit: fleet("tri") }.to_text(&t), "F tri D");
        assert_eq!(
            Order::Build {
                unit: OrderUnit::new(UnitKind::Fleet, loc_c(&t, "stp", Coast::South)),
            }
            .to_text(&t),
            "F stp/sc B"
        );
        assert_eq!(Order::Waive.to_text(&t), "W");
    }

    #[test]
    fn order_list_formatting() {
        let t = topo();
        let orders = vec![
            Order::Hold {
                unit: OrderUnit::new(UnitKind::Army, loc(&t, "vie")),
            },
            Order::Waive,
        ];
        assert_eq!(format_orders(&t, &orders), "A vie H ; W");
    }

    #[test]
    fn orders_report_their_province() {
        let t = topo();
        let unit = OrderUnit::new(UnitKind::Army, loc(&t, "vie"));
        assert_eq!(Order::Hold { unit }.province(), Some(unit.location.province));
        assert_eq!(Order::Waive.province(), None);
    }
}
