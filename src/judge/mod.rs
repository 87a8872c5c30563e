//! Phase adjudication: movement, retreats, and winter adjustments.
//!
//! Each phase judge is a pure function over a topology, a board, and an
//! order list; nothing here mutates game state. The [`game`](crate::game)
//! layer owns applying the reports it gets back.

pub mod adjustment;
pub mod movement;
pub mod report;
pub mod retreat;

pub use movement::Resolver;
pub use report::{
    AdjustmentReport, Dislodgement, MovementReport, OrderOutcome, PhaseError, PhaseReport,
    ResolvedOrder, RetreatReport,
};
