//! Units and unit kinds.
//!
//! Armies move over land, fleets over water and along coasts.

use serde::{Deserialize, Serialize};

use super::order::{Location, OrderUnit};
use super::province::PowerId;
use super::topology::Topology;

/// The kind of a military unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitKind {
    Army,
    Fleet,
}

impl UnitKind {
    /// Returns the uppercase abbreviation used in order notation.
    pub const fn letter(self) -> char {
        match self {
            UnitKind::Army => 'A',
            UnitKind::Fleet => 'F',
        }
    }

    /// Parses a unit kind from its abbreviation, either case.
    pub fn from_letter(c: char) -> Option<UnitKind> {
        match c {
            'A' | 'a' => Some(UnitKind::Army),
            'F' | 'f' => Some(UnitKind::Fleet),
            _ => None,
        }
    }
}

/// A unit standing on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Unit {
    pub power: PowerId,
    pub kind: UnitKind,
    pub location: Location,
}

impl Unit {
    pub fn new(power: PowerId, kind: UnitKind, location: Location) -> Self {
        Self {
            power,
            kind,
            location,
        }
    }

    /// The unit as an order would reference it.
    pub fn as_order_unit(&self) -> OrderUnit {
        OrderUnit::new(self.kind, self.location)
    }

    /// Renders as `A par` or `F stp/nc`.
    pub fn text(&self, topo: &Topology) -> String {
        self.as_order_unit().text(topo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letter_roundtrip() {
        assert_eq!(UnitKind::from_letter('A'), Some(UnitKind::Army));
        assert_eq!(UnitKind::from_letter('f'), Some(UnitKind::Fleet));
        assert_eq!(UnitKind::from_letter('x'), None);
        assert_eq!(UnitKind::Army.letter(), 'A');
        assert_eq!(UnitKind::Fleet.letter(), 'F');
    }
}
