//! Phase sequencing.
//!
//! A variant declares its year as an ordered list of entries: playable
//! season phases and new-year markers. Markers are never playable; walking
//! across one while advancing shifts the year. All phase arithmetic lives
//! here so the game loop and history code never reimplement the walk.

use serde::{Deserialize, Serialize};

/// What gets adjudicated in a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PhaseKind {
    Movement,
    Retreat,
    Adjustment,
}

impl PhaseKind {
    /// Returns the single-character abbreviation used in short phase names.
    pub const fn letter(self) -> char {
        match self {
            PhaseKind::Movement => 'M',
            PhaseKind::Retreat => 'R',
            PhaseKind::Adjustment => 'A',
        }
    }

    /// Returns the display label used in long phase names.
    pub const fn label(self) -> &'static str {
        match self {
            PhaseKind::Movement => "Movement",
            PhaseKind::Retreat => "Retreat",
            PhaseKind::Adjustment => "Adjustment",
        }
    }
}

/// One entry of a variant's declared year.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeqEntry {
    /// Year boundary; crossing it shifts the year by one.
    NewYear,
    /// A playable phase within the year.
    Phase { season: String, kind: PhaseKind },
}

/// A game's position in phase time.
///
/// The derived ordering is the phase ordering: `Forming` sorts before any
/// dated marker, `Completed` after all, and dated markers compare by year
/// then sequence position.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum PhaseMarker {
    /// Before the first phase.
    Forming,
    /// A concrete playable phase; `entry` indexes the declared sequence.
    At { year: u16, entry: u16 },
    /// After the game ended.
    Completed,
}

/// The declared cycle of phases, fixed per topology.
#[derive(Debug, Clone)]
pub struct PhaseSequence {
    first_year: u16,
    entries: Vec<SeqEntry>,
}

impl PhaseSequence {
    /// Builds a sequence. Callers must have checked that at least one
    /// playable entry exists; the walk functions rely on it.
    pub fn new(first_year: u16, entries: Vec<SeqEntry>) -> PhaseSequence {
        PhaseSequence {
            first_year,
            entries,
        }
    }

    pub fn first_year(&self) -> u16 {
        self.first_year
    }

    pub fn entries(&self) -> &[SeqEntry] {
        &self.entries
    }

    pub fn has_playable(&self) -> bool {
        self.entries
            .iter()
            .any(|e| matches!(e, SeqEntry::Phase { .. }))
    }

    fn has_kind(&self, kind: PhaseKind) -> bool {
        self.entries
            .iter()
            .any(|e| matches!(e, SeqEntry::Phase { kind: k, .. } if *k == kind))
    }

    /// The game's starting marker: the first playable entry of the first
    /// year. Leading new-year markers do not shift the year.
    pub fn first_marker(&self) -> Option<PhaseMarker> {
        self.entries
            .iter()
            .position(|e| matches!(e, SeqEntry::Phase { .. }))
            .map(|i| PhaseMarker::At {
                year: self.first_year,
                entry: i as u16,
            })
    }

    /// Kind of the playable entry at `entry`, if it is one.
    pub fn kind_at(&self, entry: u16) -> Option<PhaseKind> {
        match self.entries.get(entry as usize) {
            Some(SeqEntry::Phase { kind, .. }) => Some(*kind),
            _ => None,
        }
    }

    /// Season label of the playable entry at `entry`, if it is one.
    pub fn season_at(&self, entry: u16) -> Option<&str> {
        match self.entries.get(entry as usize) {
            Some(SeqEntry::Phase { season, .. }) => Some(season),
            _ => None,
        }
    }

    /// Walks forward to the next playable phase, circularly, crossing
    /// new-year markers as year increments. With `want`, stops only at
    /// entries of that kind; `skip` passes over that many matches first.
    ///
    /// `Forming` and `Completed` are fixed points. Returns `None` when the
    /// sequence has no entry of the wanted kind.
    pub fn find_next(
        &self,
        from: PhaseMarker,
        want: Option<PhaseKind>,
        skip: usize,
    ) -> Option<PhaseMarker> {
        let (mut year, mut ix) = match from {
            PhaseMarker::Forming | PhaseMarker::Completed => return Some(from),
            PhaseMarker::At { year, entry } => (year, entry as usize),
        };
        if let Some(kind) = want {
            if !self.has_kind(kind) {
                return None;
            }
        } else if !self.has_playable() {
            return None;
        }
        let mut remaining = skip;
        loop {
            ix += 1;
            if ix == self.entries.len() {
                ix = 0;
            }
            match &self.entries[ix] {
                SeqEntry::NewYear => year += 1,
                SeqEntry::Phase { kind, .. } => {
                    if want.is_none() || want == Some(*kind) {
                        if remaining == 0 {
                            return Some(PhaseMarker::At {
                                year,
                                entry: ix as u16,
                            });
                        }
                        remaining -= 1;
                    }
                }
            }
        }
    }

    /// Walks backward to the previous playable phase; the mirror of
    /// [`find_next`](Self::find_next). Walking back across the first year's
    /// start yields `Forming`.
    pub fn find_previous(
        &self,
        from: PhaseMarker,
        want: Option<PhaseKind>,
        skip: usize,
    ) -> Option<PhaseMarker> {
        let (mut year, mut ix) = match from {
            PhaseMarker::Forming | PhaseMarker::Completed => return Some(from),
            PhaseMarker::At { year, entry } => (year, entry as usize),
        };
        if let Some(kind) = want {
            if !self.has_kind(kind) {
                return None;
            }
        } else if !self.has_playable() {
            return None;
        }
        let mut remaining = skip;
        loop {
            if ix == 0 {
                ix = self.entries.len();
            }
            ix -= 1;
            match &self.entries[ix] {
                SeqEntry::NewYear => {
                    if year == self.first_year {
                        return Some(PhaseMarker::Forming);
                    }
                    year -= 1;
                }
                SeqEntry::Phase { kind, .. } => {
                    if want.is_none() || want == Some(*kind) {
                        if remaining == 0 {
                            return Some(PhaseMarker::At {
                                year,
                                entry: ix as u16,
                            });
                        }
                        remaining -= 1;
                    }
                }
            }
        }
    }

    /// Long display name, e.g. "Spring 1901 Movement".
    pub fn phase_name(&self, marker: PhaseMarker) -> String {
        match marker {
            PhaseMarker::Forming => "Forming".to_string(),
            PhaseMarker::Completed => "Completed".to_string(),
            PhaseMarker::At { year, entry } => {
                match (self.season_at(entry), self.kind_at(entry)) {
                    (Some(season), Some(kind)) => {
                        format!("{} {} {}", season, year, kind.label())
                    }
                    _ => format!("Unknown {}", year),
                }
            }
        }
    }

    /// Short name, e.g. "S1901M".
    pub fn phase_abbr(&self, marker: PhaseMarker) -> String {
        match marker {
            PhaseMarker::Forming => "FORMING".to_string(),
            PhaseMarker::Completed => "COMPLETED".to_string(),
            PhaseMarker::At { year, entry } => {
                match (self.season_at(entry), self.kind_at(entry)) {
                    (Some(season), Some(kind)) => {
                        let initial = season
                            .chars()
                            .next()
                            .map(|c| c.to_ascii_uppercase())
                            .unwrap_or('?');
                        format!("{}{}{}", initial, year, kind.letter())
                    }
                    _ => format!("?{}?", year),
                }
            }
        }
    }
}
