//! Order text parsing.
//!
//! Accepts the canonical notation (`A par - bur`, `F stp/nc R nwy`) and
//! the looser phrasings players actually type: full province names, word
//! keywords ("army paris supports fleet brest"), a leading power name,
//! missing or trailing move dashes. The reading is phase-sensitive; the
//! same text can be a move in a movement phase and a retreat in a retreat
//! phase. Parsing never touches game state.

pub mod lexer;

use thiserror::Error;

use crate::board::{
    Coast, Location, Order, OrderKeyword, OrderUnit, PhaseKind, Topology, UnitKind,
};

use lexer::Token;

/// Why a piece of order text did not yield an order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderParseError {
    #[error("empty order text")]
    Empty,
    #[error("unrecognized word `{0}`")]
    UnknownWord(String),
    #[error("expected {expected}, found `{found}`")]
    UnexpectedToken { expected: String, found: String },
    #[error("order ended early, expected {0}")]
    UnexpectedEnd(String),
    #[error("{order} orders are not valid in a {phase} phase")]
    WrongPhase {
        order: &'static str,
        phase: &'static str,
    },
    #[error("move to {province} needs a coast ({choices})")]
    AmbiguousCoast { province: String, choices: String },
}

/// Parses one order as the given phase kind would read it.
pub fn parse_order(
    topo: &Topology,
    phase: PhaseKind,
    text: &str,
) -> Result<Order, OrderParseError> {
    let toks = lexer::tokenize(topo, text);
    if toks.is_empty() {
        return Err(OrderParseError::Empty);
    }
    for t in &toks {
        if let Token::Unknown(w) = t {
            return Err(OrderParseError::UnknownWord(w.clone()));
        }
    }

    let mut i = 0;
    // A leading power name is legal decoration; ownership is checked at
    // submission, not here.
    if matches!(toks.get(i), Some(Token::Power(_))) {
        i += 1;
    }

    if matches!(toks.get(i), Some(Token::Keyword(OrderKeyword::Waive))) {
        if phase != PhaseKind::Adjustment {
            return Err(OrderParseError::WrongPhase {
                order: "waive",
                phase: phase.label(),
            });
        }
        i += 1;
        expect_end(topo, &toks, i)?;
        return Ok(Order::Waive);
    }

    // "B F stp/sc" and "D A war" put the keyword first; rotate it behind
    // the unit.
    let leading = match toks.get(i) {
        Some(Token::Keyword(OrderKeyword::Build)) => {
            i += 1;
            Some(true)
        }
        Some(Token::Keyword(OrderKeyword::Disband)) => {
            i += 1;
            Some(false)
        }
        _ => None,
    };

    let kind = match toks.get(i) {
        Some(Token::Unit(k)) => *k,
        Some(other) => {
            return Err(OrderParseError::UnexpectedToken {
                expected: "a unit kind (A or F)".into(),
                found: other.describe(topo),
            })
        }
        None => return Err(OrderParseError::UnexpectedEnd("a unit kind (A or F)".into())),
    };
    i += 1;
    let unit = OrderUnit::new(kind, take_location(topo, &toks, &mut i, "the unit's location")?);

    if let Some(build) = leading {
        expect_end(topo, &toks, i)?;
        return adjustment_order(build, unit, phase);
    }

    match toks.get(i) {
        // A bare unit holds; anything else needs more.
        None => {
            if phase == PhaseKind::Movement {
                Ok(Order::Hold { unit })
            } else {
                Err(OrderParseError::UnexpectedEnd("an order for the unit".into()))
            }
        }
        Some(Token::Province(_)) => {
            let dest = take_location(topo, &toks, &mut i, "a destination")?;
            finish_move(topo, phase, unit, dest, &toks, &mut i)
        }
        Some(Token::Keyword(kw)) => {
            let kw = *kw;
            i += 1;
            match kw {
                OrderKeyword::Hold => {
                    expect_end(topo, &toks, i)?;
                    if phase != PhaseKind::Movement {
                        return Err(OrderParseError::WrongPhase {
                            order: "hold",
                            phase: phase.label(),
                        });
                    }
                    Ok(Order::Hold { unit })
                }
                OrderKeyword::MoveTo => {
                    let dest = take_location(topo, &toks, &mut i, "a destination")?;
                    finish_move(topo, phase, unit, dest, &toks, &mut i)
                }
                OrderKeyword::Retreat => {
                    if phase != PhaseKind::Retreat {
                        return Err(OrderParseError::WrongPhase {
                            order: "retreat",
                            phase: phase.label(),
                        });
                    }
                    let dest = take_location(topo, &toks, &mut i, "a retreat destination")?;
                    finish_move(topo, phase, unit, dest, &toks, &mut i)
                }
                OrderKeyword::Support => parse_support(topo, phase, unit, &toks, &mut i),
                OrderKeyword::Convoy => parse_convoy(topo, phase, unit, &toks, &mut i),
                OrderKeyword::Disband => {
                    expect_end(topo, &toks, i)?;
                    adjustment_order(false, unit, phase)
                }
                OrderKeyword::Build => {
                    expect_end(topo, &toks, i)?;
                    adjustment_order(true, unit, phase)
                }
                OrderKeyword::Waive | OrderKeyword::Via => Err(OrderParseError::UnexpectedToken {
                    expected: "an order for the unit".into(),
                    found: Token::Keyword(kw).describe(topo),
                }),
            }
        }
        Some(other) => Err(OrderParseError::UnexpectedToken {
            expected: "an order for the unit".into(),
            found: other.describe(topo),
        }),
    }
}

fn take_location(
    topo: &Topology,
    toks: &[Token],
    i: &mut usize,
    what: &str,
) -> Result<Location, OrderParseError> {
    match toks.get(*i) {
        Some(Token::Province(p)) => {
            *i += 1;
            let mut loc = Location::new(*p);
            if let Some(Token::Coast(c)) = toks.get(*i) {
                loc.coast = *c;
                *i += 1;
            }
            Ok(loc)
        }
        Some(other) => Err(OrderParseError::UnexpectedToken {
            expected: what.to_string(),
            found: other.describe(topo),
        }),
        None => Err(OrderParseError::UnexpectedEnd(what.to_string())),
    }
}

fn expect_end(topo: &Topology, toks: &[Token], i: usize) -> Result<(), OrderParseError> {
    match toks.get(i) {
        None => Ok(()),
        Some(other) => Err(OrderParseError::UnexpectedToken {
            expected: "end of order".into(),
            found: other.describe(topo),
        }),
    }
}

fn adjustment_order(
    build: bool,
    unit: OrderUnit,
    phase: PhaseKind,
) -> Result<Order, OrderParseError> {
    if build {
        if phase != PhaseKind::Adjustment {
            return Err(OrderParseError::WrongPhase {
                order: "build",
                phase: phase.label(),
            });
        }
        Ok(Order::Build { unit })
    } else {
        // Disbands are legal in both retreat and adjustment phases.
        if phase == PhaseKind::Movement {
            return Err(OrderParseError::WrongPhase {
                order: "disband",
                phase: phase.label(),
            });
        }
        Ok(Order::Disband { unit })
    }
}

/// Move-shaped tail: optional trailing dash word, optional `via`, then
/// phase decides between Move and Retreat.
fn finish_move(
    topo: &Topology,
    phase: PhaseKind,
    unit: OrderUnit,
    mut dest: Location,
    toks: &[Token],
    i: &mut usize,
) -> Result<Order, OrderParseError> {
    let mut via = false;
    loop {
        match toks.get(*i) {
            Some(Token::Keyword(OrderKeyword::Via)) => {
                via = true;
                *i += 1;
            }
            // "a par bur -" puts the separator last; tolerate it.
            Some(Token::Keyword(OrderKeyword::MoveTo)) => {
                *i += 1;
            }
            None => break,
            Some(other) => {
                return Err(OrderParseError::UnexpectedToken {
                    expected: "end of order".into(),
                    found: other.describe(topo),
                })
            }
        }
    }
    match phase {
        PhaseKind::Movement => {
            if via && unit.kind == UnitKind::Fleet {
                return Err(OrderParseError::UnexpectedToken {
                    expected: "an army as the convoyed unit".into(),
                    found: "via".into(),
                });
            }
            infer_dest_coast(topo, unit, &mut dest)?;
            Ok(Order::Move {
                unit,
                dest,
                via_convoy: via,
            })
        }
        PhaseKind::Retreat => {
            if via {
                return Err(OrderParseError::UnexpectedToken {
                    expected: "end of order".into(),
                    found: "via".into(),
                });
            }
            infer_dest_coast(topo, unit, &mut dest)?;
            Ok(Order::Retreat { unit, dest })
        }
        PhaseKind::Adjustment => Err(OrderParseError::WrongPhase {
            order: "move",
            phase: phase.label(),
        }),
    }
}

/// Fills in the destination coast for a fleet move when the map leaves
/// exactly one choice. Unreachable destinations pass through untouched;
/// adjudication voids them with better context than the parser has.
fn infer_dest_coast(
    topo: &Topology,
    unit: OrderUnit,
    dest: &mut Location,
) -> Result<(), OrderParseError> {
    if unit.kind != UnitKind::Fleet || dest.coast != Coast::None {
        return Ok(());
    }
    let meta = topo.province(dest.province);
    if !meta.is_split_coast() {
        return Ok(());
    }
    let mut coasts =
        topo.fleet_coasts_to(unit.location.province, unit.location.coast, dest.province);
    coasts.sort();
    coasts.dedup();
    match coasts.as_slice() {
        [] => Ok(()),
        [only] => {
            dest.coast = *only;
            Ok(())
        }
        many => Err(OrderParseError::AmbiguousCoast {
            province: meta.code.clone(),
            choices: many
                .iter()
                .map(|c| c.abbr())
                .collect::<Vec<_>>()
                .join(" or "),
        }),
    }
}

fn parse_support(
    topo: &Topology,
    phase: PhaseKind,
    unit: OrderUnit,
    toks: &[Token],
    i: &mut usize,
) -> Result<Order, OrderParseError> {
    if phase != PhaseKind::Movement {
        return Err(OrderParseError::WrongPhase {
            order: "support",
            phase: phase.label(),
        });
    }
    let kind = match toks.get(*i) {
        Some(Token::Unit(k)) => *k,
        Some(other) => {
            return Err(OrderParseError::UnexpectedToken {
                expected: "the supported unit's kind (A or F)".into(),
                found: other.describe(topo),
            })
        }
        None => {
            return Err(OrderParseError::UnexpectedEnd(
                "the supported unit's kind (A or F)".into(),
            ))
        }
    };
    *i += 1;
    let supported = OrderUnit::new(
        kind,
        take_location(topo, toks, i, "the supported unit's location")?,
    );
    match toks.get(*i) {
        None => Ok(Order::SupportHold { unit, supported }),
        Some(Token::Keyword(OrderKeyword::Hold)) => {
            *i += 1;
            expect_end(topo, toks, *i)?;
            Ok(Order::SupportHold { unit, supported })
        }
        Some(Token::Keyword(OrderKeyword::MoveTo)) => {
            *i += 1;
            let dest = take_location(topo, toks, i, "the supported move's destination")?;
            expect_end(topo, toks, *i)?;
            Ok(Order::SupportMove {
                unit,
                supported,
                dest,
            })
        }
        Some(Token::Province(_)) => {
            let dest = take_location(topo, toks, i, "the supported move's destination")?;
            expect_end(topo, toks, *i)?;
            Ok(Order::SupportMove {
                unit,
                supported,
                dest,
            })
        }
        Some(other) => Err(OrderParseError::UnexpectedToken {
            expected: "H or the supported move's destination".into(),
            found: other.describe(topo),
        }),
    }
}

fn parse_convoy(
    topo: &Topology,
    phase: PhaseKind,
    unit: OrderUnit,
    toks: &[Token],
    i: &mut usize,
) -> Result<Order, OrderParseError> {
    if phase != PhaseKind::Movement {
        return Err(OrderParseError::WrongPhase {
            order: "convoy",
            phase: phase.label(),
        });
    }
    if unit.kind != UnitKind::Fleet {
        return Err(OrderParseError::UnexpectedToken {
            expected: "a fleet as the convoying unit".into(),
            found: "unit kind A".into(),
        });
    }
    match toks.get(*i) {
        Some(Token::Unit(UnitKind::Army)) => {
            *i += 1;
        }
        Some(Token::Unit(UnitKind::Fleet)) => {
            return Err(OrderParseError::UnexpectedToken {
                expected: "A (only armies travel by convoy)".into(),
                found: "unit kind F".into(),
            })
        }
        _ => {}
    }
    let from = take_location(topo, toks, i, "the convoyed army's location")?;
    if matches!(toks.get(*i), Some(Token::Keyword(OrderKeyword::MoveTo))) {
        *i += 1;
    }
    let to = take_location(topo, toks, i, "the convoy destination")?;
    expect_end(topo, toks, *i)?;
    Ok(Order::Convoy {
        unit,
        convoyed_from: from,
        convoyed_to: to,
    })
}
