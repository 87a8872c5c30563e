//! Board representation: map topology, phase sequencing, and order types.
//!
//! Contains the core data structures for provinces, powers, adjacency,
//! orders, and the phase calendar, all driven by a loaded variant.

pub mod order;
pub mod phase;
pub mod province;
pub mod topology;
pub mod unit;
pub mod variant;

pub use order::{format_orders, Location, Order, OrderKeyword, OrderUnit};
pub use phase::{PhaseKind, PhaseMarker, PhaseSequence, SeqEntry};
pub use province::{Coast, PowerId, PowerMeta, ProvinceId, ProvinceMeta, Terrain};
pub use topology::{
    AdjacencyEntry, AliasTarget, MapFormatError, OrderClass, Topology, TopologyWarning,
};
pub use unit::{Unit, UnitKind};
pub use variant::VariantSpec;
