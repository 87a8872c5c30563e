//! Province and power registries.
//!
//! Provinces and powers are runtime data owned by a
//! [`Topology`](super::topology::Topology) rather than compile-time enums,
//! so arbitrary variant maps can load. Everything else in the crate refers
//! to them through the dense indices defined here.

use serde::{Deserialize, Serialize};

use super::unit::UnitKind;

/// Dense index of a province within its topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProvinceId(pub u16);

impl ProvinceId {
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Dense index of a power within its topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PowerId(pub u8);

impl PowerId {
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Terrain class of a province.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Terrain {
    /// Landlocked; armies only.
    Inland,
    /// Land with a coastline; armies and fleets.
    Coastal,
    /// Open sea; fleets only.
    Water,
    /// Map decoration no unit may enter.
    Impassable,
}

impl Terrain {
    /// Whether a unit of the given kind may occupy this terrain at all.
    pub const fn allows(self, kind: UnitKind) -> bool {
        match self {
            Terrain::Inland => matches!(kind, UnitKind::Army),
            Terrain::Coastal => true,
            Terrain::Water => matches!(kind, UnitKind::Fleet),
            Terrain::Impassable => false,
        }
    }
}

/// Coast specifier for split-coast provinces.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Coast {
    /// No coast distinction; the ordinary case.
    #[default]
    None,
    North,
    East,
    South,
    West,
}

impl Coast {
    /// Returns the 2-letter abbreviation (empty string for None).
    pub const fn abbr(self) -> &'static str {
        match self {
            Coast::None => "",
            Coast::North => "nc",
            Coast::South => "sc",
            Coast::East => "ec",
            Coast::West => "wc",
        }
    }

    /// Parses a coast from its 2-letter abbreviation.
    pub fn from_abbr(s: &str) -> Option<Coast> {
        match s {
            "" => Some(Coast::None),
            "nc" => Some(Coast::North),
            "sc" => Some(Coast::South),
            "ec" => Some(Coast::East),
            "wc" => Some(Coast::West),
            _ => Option::None,
        }
    }
}

/// Registry metadata for one province.
#[derive(Debug, Clone)]
pub struct ProvinceMeta {
    /// Canonical lowercase short code ("stp").
    pub code: String,
    /// Full display name ("St Petersburg").
    pub name: String,
    pub terrain: Terrain,
    /// Named coasts for split-coast provinces, empty otherwise.
    pub coasts: Vec<Coast>,
    pub is_supply_center: bool,
    /// Additional lookup names beyond the code and display name.
    pub aliases: Vec<String>,
}

impl ProvinceMeta {
    /// True if fleet positions here must name a coast.
    pub fn is_split_coast(&self) -> bool {
        !self.coasts.is_empty()
    }

    /// Whether `coast` is a valid coast value for this province.
    pub fn coast_valid(&self, coast: Coast) -> bool {
        if self.coasts.is_empty() {
            coast == Coast::None
        } else {
            coast == Coast::None || self.coasts.contains(&coast)
        }
    }
}

/// Registry metadata for one power.
#[derive(Debug, Clone)]
pub struct PowerMeta {
    /// Display name ("England").
    pub name: String,
    /// Single-letter tag for compact listings.
    pub initial: char,
    /// Centers where this power may build.
    pub home_centers: Vec<ProvinceId>,
    /// Centers owned at game start; usually the homes.
    pub initial_centers: Vec<ProvinceId>,
    /// Units on the board at game start.
    pub initial_units: Vec<(UnitKind, ProvinceId, Coast)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terrain_unit_legality() {
        assert!(Terrain::Inland.allows(UnitKind::Army));
        assert!(!Terrain::Inland.allows(UnitKind::Fleet));
        assert!(Terrain::Coastal.allows(UnitKind::Army));
        assert!(Terrain::Coastal.allows(UnitKind::Fleet));
        assert!(!Terrain::Water.allows(UnitKind::Army));
        assert!(Terrain::Water.allows(UnitKind::Fleet));
        assert!(!Terrain::Impassable.allows(UnitKind::Army));
        assert!(!Terrain::Impassable.allows(UnitKind::Fleet));
    }

    #[test]
    fn coast_abbr_roundtrip() {
        for c in [Coast::None, Coast::North, Coast::South, Coast::East, Coast::West] {
            assert_eq!(Coast::from_abbr(c.abbr()), Some(c));
        }
        assert_eq!(Coast::from_abbr("xc"), None);
    }

    #[test]
    fn coast_validity_against_meta() {
        let plain = ProvinceMeta {
            code: "ber".into(),
            name: "Berlin".into(),
            terrain: Terrain::Coastal,
            coasts: vec![],
            is_supply_center: true,
            aliases: vec![],
        };
        assert!(plain.coast_valid(Coast::None));
        assert!(!plain.coast_valid(Coast::North));

        let split = ProvinceMeta {
            code: "stp".into(),
            name: "St Petersburg".into(),
            terrain: Terrain::Coastal,
            coasts: vec![Coast::North, Coast::South],
            is_supply_center: true,
            aliases: vec![],
        };
        assert!(split.is_split_coast());
        assert!(split.coast_valid(Coast::North));
        assert!(split.coast_valid(Coast::South));
        assert!(!split.coast_valid(Coast::East));
        // Army positions in a split-coast province carry no coast.
        assert!(split.coast_valid(Coast::None));
    }
}
