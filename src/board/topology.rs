//! Runtime topology: the loaded, validated form of a variant map.
//!
//! A `Topology` owns the province and power registries, the full adjacency
//! index, the alias lexicon the parser consults, and the phase sequence.
//! It is immutable once loaded and is shared across games behind an `Arc`.
//!
//! Adjacency is held two ways: a directed entry list sorted by source
//! province for coast-exact queries, and a dense per-pair bit table for the
//! province-level reachability checks adjudication hammers on.

use std::collections::{HashMap, HashSet};

use thiserror::Error;
use tracing::warn;

use super::order::OrderKeyword;
use super::phase::{PhaseKind, PhaseMarker, PhaseSequence, SeqEntry};
use super::province::{Coast, PowerId, PowerMeta, ProvinceId, ProvinceMeta, Terrain};
use super::unit::UnitKind;
use super::variant::{SeqDecl, VariantSpec};

/// Fatal problems constructing a topology.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapFormatError {
    #[error("no provinces declared")]
    EmptyMap,
    #[error("duplicate province code `{0}`")]
    DuplicateProvince(String),
    #[error("duplicate power name `{0}`")]
    DuplicatePower(String),
    #[error("name `{0}` refers to more than one thing")]
    AliasCollision(String),
    #[error("unknown province `{code}` in {context}")]
    UnknownProvince { code: String, context: String },
    #[error("coast {coast:?} is not valid for `{code}` in {context}")]
    BadCoast {
        code: String,
        coast: Coast,
        context: String,
    },
    #[error("phase sequence has no playable entry")]
    NoPlayablePhase,
    #[error("strict load rejected {count} validation finding(s), first: {first}")]
    Strict { count: usize, first: TopologyWarning },
}

/// Non-fatal validation findings. Kept on the topology and logged; a
/// strict load turns them into [`MapFormatError::Strict`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopologyWarning {
    #[error("adjacency {from} -> {to} has no matching reverse entry")]
    OneWayAdjacency { from: String, to: String },
    #[error("only {0} power(s) declared")]
    FewerThanTwoPowers(usize),
    #[error("home center `{center}` claimed by both {first} and {second}")]
    SharedHomeCenter {
        center: String,
        first: String,
        second: String,
    },
    #[error("{power} starting {kind:?} cannot stand in `{code}`")]
    BadStartingUnit {
        power: String,
        kind: UnitKind,
        code: String,
    },
    #[error("more than one starting unit placed in `{0}`")]
    DuplicateStartingUnit(String),
}

/// A single directed adjacency between two provinces.
#[derive(Debug, Clone, Copy)]
pub struct AdjacencyEntry {
    pub from: ProvinceId,
    pub from_coast: Coast,
    pub to: ProvinceId,
    pub to_coast: Coast,
    pub army_ok: bool,
    pub fleet_ok: bool,
}

/// How an order references a destination, for reachability queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderClass {
    /// Moving there; coast-exact rules apply at the detailed level.
    Move,
    /// Supporting into it; any coast of the destination counts.
    Support,
    /// Carrying a convoy through it; water provinces only.
    Convoy,
}

/// What a recognized name resolves to in the lexicon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AliasTarget {
    Province(ProvinceId),
    Power(PowerId),
    Coast(Coast),
    Unit(UnitKind),
    Keyword(OrderKeyword),
}

// Bit layout of the dense reachability table.
const ARMY_MOVE: u8 = 1 << 0;
const FLEET_MOVE: u8 = 1 << 1;
const ARMY_SUPPORT: u8 = 1 << 2;
const FLEET_SUPPORT: u8 = 1 << 3;
const FLEET_CONVOY: u8 = 1 << 4;

/// The loaded, validated form of a variant map.
#[derive(Debug)]
pub struct Topology {
    name: String,
    victory: Vec<u16>,
    provinces: Vec<ProvinceMeta>,
    powers: Vec<PowerMeta>,
    lexicon: HashMap<String, AliasTarget>,
    max_alias_words: usize,
    power_by_name: HashMap<String, PowerId>,
    entries: Vec<AdjacencyEntry>,
    offsets: Vec<(u32, u32)>,
    reach: Vec<u8>,
    seq: PhaseSequence,
    warnings: Vec<TopologyWarning>,
}

impl Topology {
    /// Builds a topology from a variant description. Validation findings
    /// that do not prevent play are logged and kept on the result; see
    /// [`load_strict`](Self::load_strict) to refuse them.
    pub fn load(spec: &VariantSpec) -> Result<Topology, MapFormatError> {
        if spec.provinces.is_empty() {
            return Err(MapFormatError::EmptyMap);
        }

        let mut lexicon: HashMap<String, AliasTarget> = HashMap::new();
        let mut reserve = |key: String, target: AliasTarget| -> Result<(), MapFormatError> {
            if key.is_empty() {
                return Ok(());
            }
            match lexicon.insert(key.clone(), target) {
                Some(prev) if prev != target => Err(MapFormatError::AliasCollision(key)),
                _ => Ok(()),
            }
        };

        for (kw, names) in KEYWORD_ALIASES {
            for n in *names {
                reserve(n.to_string(), AliasTarget::Keyword(*kw))?;
            }
        }
        reserve("a".into(), AliasTarget::Unit(UnitKind::Army))?;
        reserve("army".into(), AliasTarget::Unit(UnitKind::Army))?;
        reserve("f".into(), AliasTarget::Unit(UnitKind::Fleet))?;
        reserve("fleet".into(), AliasTarget::Unit(UnitKind::Fleet))?;
        for coast in [Coast::North, Coast::South, Coast::East, Coast::West] {
            reserve(coast.abbr().to_string(), AliasTarget::Coast(coast))?;
        }
        reserve("north coast".into(), AliasTarget::Coast(Coast::North))?;
        reserve("south coast".into(), AliasTarget::Coast(Coast::South))?;
        reserve("east coast".into(), AliasTarget::Coast(Coast::East))?;
        reserve("west coast".into(), AliasTarget::Coast(Coast::West))?;

        // Province registry.
        let mut provinces = Vec::with_capacity(spec.provinces.len());
        for (ix, decl) in spec.provinces.iter().enumerate() {
            let id = ProvinceId(ix as u16);
            let code = normalize(&decl.code);
            if code.is_empty() || provinces.iter().any(|m: &ProvinceMeta| m.code == code) {
                return Err(MapFormatError::DuplicateProvince(decl.code.clone()));
            }
            reserve(code.clone(), AliasTarget::Province(id))?;
            reserve(normalize(&decl.name), AliasTarget::Province(id))?;
            for alias in &decl.aliases {
                reserve(normalize(alias), AliasTarget::Province(id))?;
            }
            provinces.push(ProvinceMeta {
                code,
                name: decl.name.clone(),
                terrain: decl.terrain,
                coasts: decl.coasts.clone(),
                is_supply_center: decl.is_supply_center,
                aliases: decl.aliases.clone(),
            });
        }

        let find = |code: &str, context: &str| -> Result<ProvinceId, MapFormatError> {
            let key = normalize(code);
            provinces
                .iter()
                .position(|m| m.code == key)
                .map(|i| ProvinceId(i as u16))
                .ok_or_else(|| MapFormatError::UnknownProvince {
                    code: code.to_string(),
                    context: context.to_string(),
                })
        };
        let coast_check =
            |p: ProvinceId, coast: Coast, context: &str| -> Result<(), MapFormatError> {
                if provinces[p.index()].coast_valid(coast) {
                    Ok(())
                } else {
                    Err(MapFormatError::BadCoast {
                        code: provinces[p.index()].code.clone(),
                        coast,
                        context: context.to_string(),
                    })
                }
            };

        // Adjacency entries, sorted by source with per-province offsets.
        let mut entries = Vec::with_capacity(spec.links.len());
        for link in &spec.links {
            let from = find(&link.from, "adjacency")?;
            let to = find(&link.to, "adjacency")?;
            coast_check(from, link.from_coast, "adjacency")?;
            coast_check(to, link.to_coast, "adjacency")?;
            entries.push(AdjacencyEntry {
                from,
                from_coast: link.from_coast,
                to,
                to_coast: link.to_coast,
                army_ok: link.army,
                fleet_ok: link.fleet,
            });
        }
        entries.sort_by_key(|e| (e.from, e.to, e.from_coast, e.to_coast));
        let mut offsets = vec![(0u32, 0u32); provinces.len()];
        {
            let mut start = 0usize;
            for p in 0..provinces.len() {
                let mut end = start;
                while end < entries.len() && entries[end].from.index() == p {
                    end += 1;
                }
                offsets[p] = (start as u32, end as u32);
                start = end;
            }
        }

        // Dense reachability table.
        let n = provinces.len();
        let mut reach = vec![0u8; n * n];
        for e in &entries {
            let cell = &mut reach[e.from.index() * n + e.to.index()];
            if e.army_ok {
                *cell |= ARMY_MOVE | ARMY_SUPPORT;
            }
            if e.fleet_ok {
                *cell |= FLEET_MOVE | FLEET_SUPPORT;
                if provinces[e.from.index()].terrain == Terrain::Water {
                    *cell |= FLEET_CONVOY;
                }
            }
        }

        let mut warnings = Vec::new();

        // Symmetry: every directed entry needs a reverse covering the same
        // unit channels.
        for e in &entries {
            let (s, t) = offsets[e.to.index()];
            let covered = entries[s as usize..t as usize].iter().any(|r| {
                r.to == e.from
                    && r.from_coast == e.to_coast
                    && r.to_coast == e.from_coast
                    && (!e.army_ok || r.army_ok)
                    && (!e.fleet_ok || r.fleet_ok)
            });
            if !covered {
                warnings.push(TopologyWarning::OneWayAdjacency {
                    from: provinces[e.from.index()].code.clone(),
                    to: provinces[e.to.index()].code.clone(),
                });
            }
        }

        // Power registry.
        let mut powers = Vec::with_capacity(spec.powers.len());
        let mut power_by_name = HashMap::new();
        for (ix, decl) in spec.powers.iter().enumerate() {
            let id = PowerId(ix as u8);
            let key = normalize(&decl.name);
            if power_by_name.insert(key.clone(), id).is_some() {
                return Err(MapFormatError::DuplicatePower(decl.name.clone()));
            }
            reserve(key, AliasTarget::Power(id))?;
            let context = format!("power {}", decl.name);
            let mut homes = Vec::with_capacity(decl.homes.len());
            for h in &decl.homes {
                homes.push(find(h, &context)?);
            }
            let centers = if decl.centers.is_empty() {
                homes.clone()
            } else {
                let mut cs = Vec::with_capacity(decl.centers.len());
                for c in &decl.centers {
                    cs.push(find(c, &context)?);
                }
                cs
            };
            let mut units = Vec::with_capacity(decl.units.len());
            for (kind, code, coast) in &decl.units {
                let p = find(code, &context)?;
                coast_check(p, *coast, &context)?;
                units.push((*kind, p, *coast));
            }
            powers.push(PowerMeta {
                name: decl.name.clone(),
                initial: decl.initial,
                home_centers: homes,
                initial_centers: centers,
                initial_units: units,
            });
        }

        if powers.len() < 2 {
            warnings.push(TopologyWarning::FewerThanTwoPowers(powers.len()));
        }
        let mut home_claims: HashMap<ProvinceId, PowerId> = HashMap::new();
        for (ix, p) in powers.iter().enumerate() {
            for h in &p.home_centers {
                match home_claims.insert(*h, PowerId(ix as u8)) {
                    Some(first) if first.index() != ix => {
                        warnings.push(TopologyWarning::SharedHomeCenter {
                            center: provinces[h.index()].code.clone(),
                            first: powers[first.index()].name.clone(),
                            second: p.name.clone(),
                        });
                    }
                    _ => {}
                }
            }
        }
        let mut occupied: HashSet<ProvinceId> = HashSet::new();
        for p in &powers {
            for (kind, prov, coast) in &p.initial_units {
                let meta = &provinces[prov.index()];
                let standable = meta.terrain.allows(*kind)
                    && match kind {
                        UnitKind::Army => *coast == Coast::None,
                        UnitKind::Fleet => {
                            if meta.is_split_coast() {
                                meta.coasts.contains(coast)
                            } else {
                                *coast == Coast::None
                            }
                        }
                    };
                if !standable {
                    warnings.push(TopologyWarning::BadStartingUnit {
                        power: p.name.clone(),
                        kind: *kind,
                        code: meta.code.clone(),
                    });
                }
                if !occupied.insert(*prov) {
                    warnings.push(TopologyWarning::DuplicateStartingUnit(meta.code.clone()));
                }
            }
        }

        // Phase sequence.
        let seq_entries: Vec<SeqEntry> = spec
            .sequence
            .iter()
            .map(|d| match d {
                SeqDecl::NewYear => SeqEntry::NewYear,
                SeqDecl::Phase { season, kind } => SeqEntry::Phase {
                    season: season.clone(),
                    kind: *kind,
                },
            })
            .collect();
        let seq = PhaseSequence::new(spec.first_year, seq_entries);
        if !seq.has_playable() {
            return Err(MapFormatError::NoPlayablePhase);
        }

        let victory = if spec.victory.is_empty() {
            let centers = provinces.iter().filter(|m| m.is_supply_center).count() as u16;
            vec![centers / 2 + 1]
        } else {
            spec.victory.clone()
        };

        for w in &warnings {
            warn!(variant = %spec.name, finding = %w, "map validation");
        }

        let max_alias_words = lexicon
            .keys()
            .map(|k| k.split(' ').count())
            .max()
            .unwrap_or(1);

        Ok(Topology {
            name: spec.name.clone(),
            victory,
            provinces,
            powers,
            lexicon,
            max_alias_words,
            power_by_name,
            entries,
            offsets,
            reach,
            seq,
            warnings,
        })
    }

    /// Like [`load`](Self::load), but any validation finding is fatal.
    pub fn load_strict(spec: &VariantSpec) -> Result<Topology, MapFormatError> {
        let topo = Topology::load(spec)?;
        match topo.warnings.first() {
            Some(first) => Err(MapFormatError::Strict {
                count: topo.warnings.len(),
                first: first.clone(),
            }),
            None => Ok(topo),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn warnings(&self) -> &[TopologyWarning] {
        &self.warnings
    }

    pub fn province_count(&self) -> usize {
        self.provinces.len()
    }

    pub fn province(&self, id: ProvinceId) -> &ProvinceMeta {
        &self.provinces[id.index()]
    }

    pub fn province_ids(&self) -> impl Iterator<Item = ProvinceId> {
        (0..self.provinces.len() as u16).map(ProvinceId)
    }

    /// Resolves any recognized name or code for a province.
    pub fn find_province(&self, name: &str) -> Option<ProvinceId> {
        match self.lexicon.get(&normalize(name)) {
            Some(AliasTarget::Province(p)) => Some(*p),
            _ => None,
        }
    }

    pub fn power_count(&self) -> usize {
        self.powers.len()
    }

    pub fn power(&self, id: PowerId) -> &PowerMeta {
        &self.powers[id.index()]
    }

    pub fn power_ids(&self) -> impl Iterator<Item = PowerId> {
        (0..self.powers.len() as u8).map(PowerId)
    }

    pub fn find_power(&self, name: &str) -> Option<PowerId> {
        self.power_by_name.get(&normalize(name)).copied()
    }

    pub fn is_water(&self, p: ProvinceId) -> bool {
        self.provinces[p.index()].terrain == Terrain::Water
    }

    pub fn supply_centers(&self) -> impl Iterator<Item = ProvinceId> + '_ {
        self.province_ids()
            .filter(|p| self.provinces[p.index()].is_supply_center)
    }

    /// Victory threshold in effect for the given year.
    pub fn victory_threshold(&self, year: u16) -> u16 {
        let ix = year.saturating_sub(self.seq.first_year()) as usize;
        self.victory[ix.min(self.victory.len() - 1)]
    }

    /// Whether a unit of this kind may stand in the province, with the
    /// coast discipline split-coast provinces demand.
    pub fn unit_can_stand(&self, kind: UnitKind, province: ProvinceId, coast: Coast) -> bool {
        let meta = &self.provinces[province.index()];
        if !meta.terrain.allows(kind) {
            return false;
        }
        match kind {
            UnitKind::Army => coast == Coast::None,
            UnitKind::Fleet => {
                if meta.is_split_coast() {
                    meta.coasts.contains(&coast)
                } else {
                    coast == Coast::None
                }
            }
        }
    }

    /// All directed adjacency entries leaving a province.
    pub fn adj_from(&self, p: ProvinceId) -> &[AdjacencyEntry] {
        let (s, t) = self.offsets[p.index()];
        &self.entries[s as usize..t as usize]
    }

    /// Province-level reachability, precomputed for every
    /// (kind, class, from, to).
    pub fn reachable(
        &self,
        kind: UnitKind,
        class: OrderClass,
        from: ProvinceId,
        to: ProvinceId,
    ) -> bool {
        let cell = self.reach[from.index() * self.provinces.len() + to.index()];
        let bit = match (kind, class) {
            (UnitKind::Army, OrderClass::Move) => ARMY_MOVE,
            (UnitKind::Army, OrderClass::Support) => ARMY_SUPPORT,
            (UnitKind::Army, OrderClass::Convoy) => return false,
            (UnitKind::Fleet, OrderClass::Move) => FLEET_MOVE,
            (UnitKind::Fleet, OrderClass::Support) => FLEET_SUPPORT,
            (UnitKind::Fleet, OrderClass::Convoy) => FLEET_CONVOY,
        };
        cell & bit != 0
    }

    /// Coast-exact army movement check.
    pub fn army_move_ok(&self, from: ProvinceId, to: ProvinceId) -> bool {
        self.reachable(UnitKind::Army, OrderClass::Move, from, to)
    }

    /// Coast-exact fleet movement check.
    pub fn fleet_move_ok(
        &self,
        from: ProvinceId,
        from_coast: Coast,
        to: ProvinceId,
        to_coast: Coast,
    ) -> bool {
        self.adj_from(from).iter().any(|e| {
            e.fleet_ok
                && e.to == to
                && e.from_coast == from_coast
                && e.to_coast == to_coast
        })
    }

    /// Destination coasts a fleet could arrive on, given its current coast.
    pub fn fleet_coasts_to(
        &self,
        from: ProvinceId,
        from_coast: Coast,
        to: ProvinceId,
    ) -> Vec<Coast> {
        self.adj_from(from)
            .iter()
            .filter(|e| e.fleet_ok && e.to == to && e.from_coast == from_coast)
            .map(|e| e.to_coast)
            .collect()
    }

    /// Lexicon lookup for the parser; `name` is already normalized.
    pub fn lookup_alias(&self, name: &str) -> Option<AliasTarget> {
        self.lexicon.get(name).copied()
    }

    /// Longest alias length in words, bounding the tokenizer's window.
    pub fn max_alias_words(&self) -> usize {
        self.max_alias_words
    }

    // Phase arithmetic, delegated to the declared sequence.

    pub fn sequence(&self) -> &PhaseSequence {
        &self.seq
    }

    pub fn first_marker(&self) -> Option<PhaseMarker> {
        self.seq.first_marker()
    }

    pub fn find_next_phase(
        &self,
        from: PhaseMarker,
        want: Option<PhaseKind>,
        skip: usize,
    ) -> Option<PhaseMarker> {
        self.seq.find_next(from, want, skip)
    }

    pub fn find_previous_phase(
        &self,
        from: PhaseMarker,
        want: Option<PhaseKind>,
        skip: usize,
    ) -> Option<PhaseMarker> {
        self.seq.find_previous(from, want, skip)
    }

    pub fn compare_phases(&self, a: PhaseMarker, b: PhaseMarker) -> std::cmp::Ordering {
        a.cmp(&b)
    }

    pub fn phase_kind(&self, marker: PhaseMarker) -> Option<PhaseKind> {
        match marker {
            PhaseMarker::At { entry, .. } => self.seq.kind_at(entry),
            _ => None,
        }
    }

    pub fn phase_name(&self, marker: PhaseMarker) -> String {
        self.seq.phase_name(marker)
    }

    pub fn phase_abbr(&self, marker: PhaseMarker) -> String {
        self.seq.phase_abbr(marker)
    }
}

/// Keyword vocabulary shared by every topology's lexicon.
const KEYWORD_ALIASES: &[(OrderKeyword, &[&str])] = &[
    (OrderKeyword::Hold, &["h", "hold", "holds", "stand", "stands"]),
    (OrderKeyword::Support, &["s", "support", "supports", "sup"]),
    (OrderKeyword::Convoy, &["c", "convoy", "convoys", "conv"]),
    (OrderKeyword::MoveTo, &["to", "m", "move", "moves", "move to", "attack", "attacks"]),
    (OrderKeyword::Retreat, &["r", "retreat", "retreats"]),
    (OrderKeyword::Disband, &["d", "disband", "disbands", "remove"]),
    (OrderKeyword::Build, &["b", "build", "builds"]),
    (OrderKeyword::Waive, &["w", "waive", "waives", "waived"]),
    (OrderKeyword::Via, &["via", "via convoy", "by convoy"]),
];

/// Canonical form for lexicon keys and parser tokens: lowercase, with
/// punctuation and hyphenation collapsed to single spaces. The move dash
/// dissolves here too, which is deliberate; token order alone carries the
/// meaning.
pub fn normalize(text: &str) -> String {
    let mut flat = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '-' | '_' | '.' | ',' | ':' | ';' | '(' | ')' | '\'' | '/' | '>' => flat.push(' '),
            c => {
                for lower in c.to_lowercase() {
                    flat.push(lower);
                }
            }
        }
    }
    let mut out = String::with_capacity(flat.len());
    for word in flat.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}
