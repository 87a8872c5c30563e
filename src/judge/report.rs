//! Resolution reports: what adjudication hands back to the game.
//!
//! Every accepted order appears exactly once with a single outcome. The
//! dislodgement list, not the outcome value, is authoritative for which
//! units must retreat; a dislodged supporter reports `Cut` and a dislodged
//! convoyer `Disrupted`, with the unit itself listed alongside.

use thiserror::Error;

use crate::board::{Order, PowerId, ProvinceId, Unit};

/// How one order fared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderOutcome {
    /// Moves arrive, holds stand, supports count, convoys carry.
    Succeeded,
    /// A move or retreat lost its contest.
    Bounced,
    /// Legal text, impossible on the board.
    Void,
    /// A support severed by an attack or by dislodgement.
    Cut,
    /// A convoy broken by the dislodgement of a carrying fleet.
    Disrupted,
    /// The unit was driven out while holding or bounced.
    Dislodged,
}

impl OrderOutcome {
    /// Lowercase label for reports and history.
    pub fn label(self) -> &'static str {
        match self {
            OrderOutcome::Succeeded => "succeeded",
            OrderOutcome::Bounced => "bounced",
            OrderOutcome::Void => "void",
            OrderOutcome::Cut => "cut",
            OrderOutcome::Disrupted => "disrupted",
            OrderOutcome::Dislodged => "dislodged",
        }
    }
}

/// A resolved order paired with its outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedOrder {
    pub power: PowerId,
    pub order: Order,
    pub outcome: OrderOutcome,
    /// Valid supports counted for this unit's move or hold.
    pub supports: u8,
}

/// A unit driven out of its province, with the attacker's origin. The
/// origin is barred as a retreat target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dislodgement {
    pub unit: Unit,
    pub attacker_from: ProvinceId,
}

/// Outcome of one movement phase.
#[derive(Debug, Clone, Default)]
pub struct MovementReport {
    pub orders: Vec<ResolvedOrder>,
    pub dislodged: Vec<Dislodgement>,
    /// Provinces where attacks collided and nobody entered. Barred as
    /// retreat targets.
    pub standoffs: Vec<ProvinceId>,
}

/// Outcome of one retreat phase.
#[derive(Debug, Clone, Default)]
pub struct RetreatReport {
    pub orders: Vec<ResolvedOrder>,
    /// Every unit removed this phase, whether by order, by collision, or
    /// by silence.
    pub disbanded: Vec<Unit>,
}

/// Outcome of one adjustment phase.
#[derive(Debug, Clone, Default)]
pub struct AdjustmentReport {
    pub orders: Vec<ResolvedOrder>,
    pub built: Vec<Unit>,
    pub disbanded: Vec<Unit>,
    /// Powers whose mandatory disbands were chosen for them.
    pub civil_disorder: Vec<PowerId>,
}

/// The phase-shaped union the game records in history.
#[derive(Debug, Clone)]
pub enum PhaseReport {
    Movement(MovementReport),
    Retreat(RetreatReport),
    Adjustment(AdjustmentReport),
}

impl PhaseReport {
    /// Resolved orders regardless of phase shape.
    pub fn orders(&self) -> &[ResolvedOrder] {
        match self {
            PhaseReport::Movement(r) => &r.orders,
            PhaseReport::Retreat(r) => &r.orders,
            PhaseReport::Adjustment(r) => &r.orders,
        }
    }
}

/// Failures that stop a phase from being processed at all. Everything
/// else resolves to a per-order outcome instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PhaseError {
    #[error("{power} must disband exactly {required} unit(s), got {submitted} valid disband order(s)")]
    OrderCountMismatch {
        power: String,
        required: usize,
        submitted: usize,
    },
    #[error("the game is over")]
    GameOver,
}
