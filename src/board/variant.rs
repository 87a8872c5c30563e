//! Variant map descriptions.
//!
//! A [`VariantSpec`] is the structured form a [`Topology`] loads from:
//! province declarations, adjacency links, powers with homes and starting
//! units, and the phase sequence. Whatever text format a deployment stores
//! its maps in, the loader for it produces one of these. The full standard
//! map ships here as [`standard`].
//!
//! [`Topology`]: super::topology::Topology

use super::phase::PhaseKind;
use super::province::{Coast, Terrain};
use super::unit::UnitKind;

/// Declares one province of a variant map.
#[derive(Debug, Clone)]
pub struct ProvinceDecl {
    pub code: String,
    pub name: String,
    pub terrain: Terrain,
    pub coasts: Vec<Coast>,
    pub is_supply_center: bool,
    pub aliases: Vec<String>,
}

impl ProvinceDecl {
    /// Marks the province as a supply center.
    pub fn center(&mut self) -> &mut Self {
        self.is_supply_center = true;
        self
    }

    /// Declares named coasts, making this a split-coast province.
    pub fn coasts(&mut self, coasts: &[Coast]) -> &mut Self {
        self.coasts = coasts.to_vec();
        self
    }

    /// Adds an extra lookup name.
    pub fn alias(&mut self, alias: &str) -> &mut Self {
        self.aliases.push(alias.to_string());
        self
    }
}

/// One directed adjacency declaration.
///
/// The symmetric helpers on [`VariantSpec`] emit both directions; a loader
/// translating per-province neighbor lists emits single directions via
/// [`VariantSpec::edge`] and relies on load-time symmetry checking.
#[derive(Debug, Clone)]
pub struct LinkDecl {
    pub from: String,
    pub from_coast: Coast,
    pub to: String,
    pub to_coast: Coast,
    pub army: bool,
    pub fleet: bool,
}

/// Declares one power: name, homes, starting forces.
#[derive(Debug, Clone)]
pub struct PowerDecl {
    pub name: String,
    pub initial: char,
    pub homes: Vec<String>,
    /// Centers owned at start; empty means "same as homes".
    pub centers: Vec<String>,
    pub units: Vec<(UnitKind, String, Coast)>,
}

impl PowerDecl {
    pub fn homes(&mut self, codes: &[&str]) -> &mut Self {
        self.homes = codes.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn centers(&mut self, codes: &[&str]) -> &mut Self {
        self.centers = codes.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn army(&mut self, code: &str) -> &mut Self {
        self.units
            .push((UnitKind::Army, code.to_string(), Coast::None));
        self
    }

    pub fn fleet(&mut self, code: &str) -> &mut Self {
        self.units
            .push((UnitKind::Fleet, code.to_string(), Coast::None));
        self
    }

    pub fn fleet_at(&mut self, code: &str, coast: Coast) -> &mut Self {
        self.units.push((UnitKind::Fleet, code.to_string(), coast));
        self
    }
}

/// One entry of the declared phase cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeqDecl {
    NewYear,
    Phase { season: String, kind: PhaseKind },
}

/// A complete structured variant description.
#[derive(Debug, Clone)]
pub struct VariantSpec {
    pub name: String,
    pub first_year: u16,
    /// Victory thresholds; the value for year `n` past the first clamps to
    /// the last entry.
    pub victory: Vec<u16>,
    pub provinces: Vec<ProvinceDecl>,
    pub links: Vec<LinkDecl>,
    pub powers: Vec<PowerDecl>,
    pub sequence: Vec<SeqDecl>,
}

impl VariantSpec {
    pub fn new(name: &str, first_year: u16) -> VariantSpec {
        VariantSpec {
            name: name.to_string(),
            first_year,
            victory: Vec::new(),
            provinces: Vec::new(),
            links: Vec::new(),
            powers: Vec::new(),
            sequence: Vec::new(),
        }
    }

    pub fn victory(&mut self, thresholds: &[u16]) -> &mut Self {
        self.victory = thresholds.to_vec();
        self
    }

    fn push_province(&mut self, code: &str, name: &str, terrain: Terrain) -> &mut ProvinceDecl {
        self.provinces.push(ProvinceDecl {
            code: code.to_string(),
            name: name.to_string(),
            terrain,
            coasts: Vec::new(),
            is_supply_center: false,
            aliases: Vec::new(),
        });
        let ix = self.provinces.len() - 1;
        &mut self.provinces[ix]
    }

    /// Declares an open-sea province.
    pub fn water(&mut self, code: &str, name: &str) -> &mut ProvinceDecl {
        self.push_province(code, name, Terrain::Water)
    }

    /// Declares a coastal land province.
    pub fn coastal(&mut self, code: &str, name: &str) -> &mut ProvinceDecl {
        self.push_province(code, name, Terrain::Coastal)
    }

    /// Declares a landlocked province.
    pub fn inland(&mut self, code: &str, name: &str) -> &mut ProvinceDecl {
        self.push_province(code, name, Terrain::Inland)
    }

    /// Adds a single directed adjacency. Prefer the symmetric helpers;
    /// this exists for loaders that mirror per-province neighbor lists.
    pub fn edge(
        &mut self,
        from: &str,
        from_coast: Coast,
        to: &str,
        to_coast: Coast,
        army: bool,
        fleet: bool,
    ) -> &mut Self {
        self.links.push(LinkDecl {
            from: from.to_string(),
            from_coast,
            to: to.to_string(),
            to_coast,
            army,
            fleet,
        });
        self
    }

    fn symmetric(
        &mut self,
        a: &str,
        ac: Coast,
        b: &str,
        bc: Coast,
        army: bool,
        fleet: bool,
    ) -> &mut Self {
        self.edge(a, ac, b, bc, army, fleet);
        self.edge(b, bc, a, ac, army, fleet)
    }

    /// Army-passable link, both directions.
    pub fn army(&mut self, a: &str, b: &str) -> &mut Self {
        self.symmetric(a, Coast::None, b, Coast::None, true, false)
    }

    /// Fleet-passable link, both directions, no coast distinction.
    pub fn fleet(&mut self, a: &str, b: &str) -> &mut Self {
        self.symmetric(a, Coast::None, b, Coast::None, false, true)
    }

    /// Fleet-passable link touching specific coasts.
    pub fn fleet_coast(&mut self, a: &str, ac: Coast, b: &str, bc: Coast) -> &mut Self {
        self.symmetric(a, ac, b, bc, false, true)
    }

    /// Link passable by both unit kinds.
    pub fn both(&mut self, a: &str, b: &str) -> &mut Self {
        self.symmetric(a, Coast::None, b, Coast::None, true, true)
    }

    pub fn power(&mut self, name: &str, initial: char) -> &mut PowerDecl {
        self.powers.push(PowerDecl {
            name: name.to_string(),
            initial,
            homes: Vec::new(),
            centers: Vec::new(),
            units: Vec::new(),
        });
        let ix = self.powers.len() - 1;
        &mut self.powers[ix]
    }

    pub fn new_year(&mut self) -> &mut Self {
        self.sequence.push(SeqDecl::NewYear);
        self
    }

    pub fn phase(&mut self, season: &str, kind: PhaseKind) -> &mut Self {
        self.sequence.push(SeqDecl::Phase {
            season: season.to_string(),
            kind,
        });
        self
    }
}

/// The standard seven-power map: 75 provinces, 34 supply centers,
/// victory at 18.
pub fn standard() -> VariantSpec {
    use Coast::{East as EC, North as NC, South as SC};
    const N: Coast = Coast::None;

    let mut m = VariantSpec::new("standard", 1901);
    m.victory(&[18]);

    m.new_year();
    m.phase("Spring", PhaseKind::Movement);
    m.phase("Spring", PhaseKind::Retreat);
    m.phase("Fall", PhaseKind::Movement);
    m.phase("Fall", PhaseKind::Retreat);
    m.phase("Winter", PhaseKind::Adjustment);

    // Provinces, alphabetical by code.
    m.water("adr", "Adriatic Sea");
    m.water("aeg", "Aegean Sea");
    m.coastal("alb", "Albania");
    m.coastal("ank", "Ankara").center();
    m.coastal("apu", "Apulia");
    m.coastal("arm", "Armenia");
    m.water("bal", "Baltic Sea");
    m.water("bar", "Barents Sea");
    m.coastal("bel", "Belgium").center();
    m.coastal("ber", "Berlin").center();
    m.water("bla", "Black Sea");
    m.inland("boh", "Bohemia");
    m.water("bot", "Gulf of Bothnia");
    m.coastal("bre", "Brest").center();
    m.inland("bud", "Budapest").center();
    m.coastal("bul", "Bulgaria").center().coasts(&[EC, SC]);
    m.inland("bur", "Burgundy");
    m.coastal("cly", "Clyde");
    m.coastal("con", "Constantinople").center();
    m.coastal("den", "Denmark").center();
    m.water("eas", "Eastern Mediterranean");
    m.coastal("edi", "Edinburgh").center();
    m.water("eng", "English Channel");
    m.coastal("fin", "Finland");
    m.inland("gal", "Galicia");
    m.coastal("gas", "Gascony");
    m.water("gol", "Gulf of Lyon").alias("gulf of lyons");
    m.coastal("gre", "Greece").center();
    m.water("hel", "Heligoland Bight");
    m.coastal("hol", "Holland").center();
    m.water("ion", "Ionian Sea");
    m.water("iri", "Irish Sea");
    m.coastal("kie", "Kiel").center();
    m.coastal("lon", "London").center();
    m.coastal("lvn", "Livonia");
    m.coastal("lvp", "Liverpool").center();
    m.water("mao", "Mid-Atlantic Ocean").alias("mid atlantic");
    m.coastal("mar", "Marseilles").center();
    m.inland("mos", "Moscow").center();
    m.inland("mun", "Munich").center();
    m.coastal("naf", "North Africa");
    m.water("nao", "North Atlantic Ocean");
    m.coastal("nap", "Naples").center();
    m.water("nrg", "Norwegian Sea");
    m.water("nth", "North Sea");
    m.coastal("nwy", "Norway").center();
    m.inland("par", "Paris").center();
    m.coastal("pic", "Picardy");
    m.coastal("pie", "Piedmont");
    m.coastal("por", "Portugal").center();
    m.coastal("pru", "Prussia");
    m.coastal("rom", "Rome").center();
    m.inland("ruh", "Ruhr");
    m.coastal("rum", "Rumania").center();
    m.inland("ser", "Serbia").center();
    m.coastal("sev", "Sevastopol").center();
    m.inland("sil", "Silesia");
    m.water("ska", "Skagerrak");
    m.coastal("smy", "Smyrna").center();
    m.coastal("spa", "Spain").center().coasts(&[NC, SC]);
    m.coastal("stp", "St Petersburg")
        .center()
        .coasts(&[NC, SC])
        .alias("saint petersburg");
    m.coastal("swe", "Sweden").center();
    m.coastal("syr", "Syria");
    m.coastal("tri", "Trieste").center();
    m.coastal("tun", "Tunisia").center();
    m.coastal("tus", "Tuscany");
    m.inland("tyr", "Tyrolia");
    m.water("tys", "Tyrrhenian Sea");
    m.inland("ukr", "Ukraine");
    m.coastal("ven", "Venice").center();
    m.inland("vie", "Vienna").center();
    m.coastal("wal", "Wales");
    m.inland("war", "Warsaw").center();
    m.water("wes", "Western Mediterranean");
    m.coastal("yor", "Yorkshire");

    // sea-to-sea (fleet only)
    m.fleet("adr", "ion");
    m.fleet("aeg", "eas");
    m.fleet("aeg", "ion");
    m.fleet("bal", "bot");
    m.fleet("eng", "iri");
    m.fleet("eng", "mao");
    m.fleet("eng", "nth");
    m.fleet("gol", "tys");
    m.fleet("gol", "wes");
    m.fleet("hel", "nth");
    m.fleet("ion", "eas");
    m.fleet("ion", "tys");
    m.fleet("iri", "mao");
    m.fleet("iri", "nao");
    m.fleet("mao", "nao");
    m.fleet("mao", "wes");
    m.fleet("nao", "nrg");
    m.fleet("nth", "nrg");
    m.fleet("nth", "ska");
    m.fleet("nrg", "bar");
    m.fleet("tys", "wes");
    // sea-to-coastal (fleet only)
    m.fleet("adr", "alb");
    m.fleet("adr", "apu");
    m.fleet("adr", "tri");
    m.fleet("adr", "ven");
    m.fleet_coast("aeg", N, "bul", SC);
    m.fleet("aeg", "con");
    m.fleet("aeg", "gre");
    m.fleet("aeg", "smy");
    m.fleet("bal", "ber");
    m.fleet("bal", "den");
    m.fleet("bal", "kie");
    m.fleet("bal", "lvn");
    m.fleet("bal", "pru");
    m.fleet("bal", "swe");
    m.fleet("bar", "nwy");
    m.fleet_coast("bar", N, "stp", NC);
    m.fleet("bla", "ank");
    m.fleet("bla", "arm");
    m.fleet_coast("bla", N, "bul", EC);
    m.fleet("bla", "con");
    m.fleet("bla", "rum");
    m.fleet("bla", "sev");
    m.fleet("bot", "fin");
    m.fleet("bot", "lvn");
    m.fleet_coast("bot", N, "stp", SC);
    m.fleet("bot", "swe");
    m.fleet("eas", "smy");
    m.fleet("eas", "syr");
    m.fleet("eng", "bel");
    m.fleet("eng", "bre");
    m.fleet("eng", "lon");
    m.fleet("eng", "pic");
    m.fleet("eng", "wal");
    m.fleet("gol", "mar");
    m.fleet("gol", "pie");
    m.fleet_coast("gol", N, "spa", SC);
    m.fleet("gol", "tus");
    m.fleet("hel", "den");
    m.fleet("hel", "hol");
    m.fleet("hel", "kie");
    m.fleet("ion", "alb");
    m.fleet("ion", "apu");
    m.fleet("ion", "gre");
    m.fleet("ion", "nap");
    m.fleet("ion", "tun");
    m.fleet("iri", "lvp");
    m.fleet("iri", "wal");
    m.fleet("mao", "bre");
    m.fleet("mao", "gas");
    m.fleet("mao", "naf");
    m.fleet("mao", "por");
    m.fleet_coast("mao", N, "spa", NC);
    m.fleet_coast("mao", N, "spa", SC);
    m.fleet("nao", "cly");
    m.fleet("nao", "lvp");
    m.fleet("nth", "bel");
    m.fleet("nth", "den");
    m.fleet("nth", "edi");
    m.fleet("nth", "hol");
    m.fleet("nth", "lon");
    m.fleet("nth", "nwy");
    m.fleet("nth", "yor");
    m.fleet("nrg", "cly");
    m.fleet("nrg", "edi");
    m.fleet("nrg", "nwy");
    m.fleet("ska", "den");
    m.fleet("ska", "nwy");
    m.fleet("ska", "swe");
    m.fleet("tys", "nap");
    m.fleet("tys", "rom");
    m.fleet("tys", "tun");
    m.fleet("tys", "tus");
    m.fleet("wes", "naf");
    m.fleet_coast("wes", N, "spa", SC);
    m.fleet("wes", "tun");
    // inland-to-inland (army only)
    m.army("boh", "gal");
    m.army("boh", "mun");
    m.army("boh", "sil");
    m.army("boh", "tyr");
    m.army("boh", "vie");
    m.army("bud", "gal");
    m.army("bud", "vie");
    m.army("bur", "mun");
    m.army("bur", "par");
    m.army("bur", "ruh");
    m.army("gal", "sil");
    m.army("gal", "ukr");
    m.army("gal", "vie");
    m.army("gal", "war");
    m.army("mos", "ukr");
    m.army("mos", "war");
    m.army("mun", "ruh");
    m.army("mun", "sil");
    m.army("mun", "tyr");
    m.army("sil", "war");
    m.army("tyr", "vie");
    m.army("ukr", "war");
    // inland-to-coastal (army only)
    m.army("bud", "rum");
    m.army("bud", "ser");
    m.army("bud", "tri");
    m.army("bur", "bel");
    m.army("bur", "gas");
    m.army("bur", "mar");
    m.army("bur", "pic");
    m.army("gal", "rum");
    m.army("gas", "mar");
    m.army("mos", "lvn");
    m.army("mos", "sev");
    m.army("mos", "stp");
    m.army("mun", "ber");
    m.army("mun", "kie");
    m.army("par", "bre");
    m.army("par", "gas");
    m.army("par", "pic");
    m.army("ruh", "bel");
    m.army("ruh", "hol");
    m.army("ruh", "kie");
    m.army("ser", "alb");
    m.army("ser", "bul");
    m.army("ser", "gre");
    m.army("ser", "rum");
    m.army("ser", "tri");
    m.army("sil", "ber");
    m.army("sil", "pru");
    m.army("tyr", "pie");
    m.army("tyr", "tri");
    m.army("tyr", "ven");
    m.army("ukr", "rum");
    m.army("ukr", "sev");
    m.army("vie", "tri");
    m.army("war", "lvn");
    m.army("war", "pru");
    // coastal-to-coastal, both kinds
    m.both("alb", "gre");
    m.both("alb", "tri");
    m.both("ank", "arm");
    m.both("ank", "con");
    m.both("apu", "nap");
    m.both("apu", "ven");
    m.both("bel", "hol");
    m.both("bel", "pic");
    m.both("ber", "kie");
    m.both("ber", "pru");
    m.both("bre", "gas");
    m.both("bre", "pic");
    m.both("cly", "edi");
    m.both("cly", "lvp");
    m.both("con", "smy");
    m.both("den", "kie");
    m.both("den", "swe");
    m.army("edi", "lvp");
    m.both("edi", "yor");
    m.army("fin", "nwy");
    m.both("fin", "swe");
    m.both("hol", "kie");
    m.both("lon", "wal");
    m.both("lon", "yor");
    m.both("lvp", "wal");
    m.both("mar", "pie");
    m.both("naf", "tun");
    m.both("nwy", "swe");
    m.both("pie", "tus");
    m.army("pie", "ven");
    m.both("pru", "lvn");
    m.both("rom", "nap");
    m.both("rom", "tus");
    m.army("rom", "ven");
    m.both("sev", "arm");
    m.both("sev", "rum");
    m.army("smy", "arm");
    m.both("smy", "syr");
    m.both("tri", "ven");
    m.army("wal", "yor");
    // split-coast fleet approaches
    m.fleet_coast("con", N, "bul", EC);
    m.fleet_coast("con", N, "bul", SC);
    m.fleet_coast("gre", N, "bul", SC);
    m.fleet_coast("rum", N, "bul", EC);
    m.fleet_coast("gas", N, "spa", NC);
    m.fleet_coast("mar", N, "spa", SC);
    m.fleet_coast("por", N, "spa", NC);
    m.fleet_coast("por", N, "spa", SC);
    m.fleet_coast("fin", N, "stp", SC);
    m.fleet_coast("lvn", N, "stp", SC);
    m.fleet_coast("nwy", N, "stp", NC);
    // split-coast and cross-face army approaches
    m.army("con", "bul");
    m.army("gre", "bul");
    m.army("rum", "bul");
    m.army("gas", "spa");
    m.army("mar", "spa");
    m.army("por", "spa");
    m.army("fin", "stp");
    m.army("lvn", "stp");
    m.army("nwy", "stp");
    m.army("ank", "smy");
    m.army("apu", "rom");
    m.army("lvp", "yor");
    m.army("tus", "ven");
    m.army("arm", "syr");

    m.power("Austria", 'A')
        .homes(&["bud", "tri", "vie"])
        .army("vie")
        .army("bud")
        .fleet("tri");
    m.power("England", 'E')
        .homes(&["edi", "lon", "lvp"])
        .fleet("lon")
        .fleet("edi")
        .army("lvp");
    m.power("France", 'F')
        .homes(&["bre", "mar", "par"])
        .fleet("bre")
        .army("par")
        .army("mar");
    m.power("Germany", 'G')
        .homes(&["ber", "kie", "mun"])
        .fleet("kie")
        .army("ber")
        .army("mun");
    m.power("Italy", 'I')
        .homes(&["nap", "rom", "ven"])
        .fleet("nap")
        .army("rom")
        .army("ven");
    m.power("Russia", 'R')
        .homes(&["mos", "sev", "stp", "war"])
        .fleet_at("stp", Coast::South)
        .army("mos")
        .army("war")
        .fleet("sev");
    m.power("Turkey", 'T')
        .homes(&["ank", "con", "smy"])
        .fleet("ank")
        .army("con")
        .army("smy");

    m
}
