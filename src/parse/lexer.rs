//! Tokenizing raw order text against a topology's lexicon.
//!
//! Normalization has already dissolved case, punctuation, and the move
//! dash by the time words reach the lexicon, so tokens carry meaning by
//! kind and position alone. Multi-word names ("gulf of lyons", "north
//! coast", "via convoy") collapse to single tokens by longest-prefix
//! lookup.

use crate::board::topology::{normalize, AliasTarget};
use crate::board::{Coast, OrderKeyword, PowerId, ProvinceId, Topology, UnitKind};

/// A classified word, or collapsed word group, of order text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Unit(UnitKind),
    Province(ProvinceId),
    Coast(Coast),
    Power(PowerId),
    Keyword(OrderKeyword),
    Unknown(String),
}

impl Token {
    /// Short rendering for error messages.
    pub fn describe(&self, topo: &Topology) -> String {
        match self {
            Token::Unit(k) => format!("unit kind {}", k.letter()),
            Token::Province(p) => topo.province(*p).code.clone(),
            Token::Coast(c) => c.abbr().to_string(),
            Token::Power(p) => topo.power(*p).name.clone(),
            Token::Keyword(k) => {
                let word = match k {
                    OrderKeyword::Hold => "hold",
                    OrderKeyword::Support => "support",
                    OrderKeyword::Convoy => "convoy",
                    OrderKeyword::MoveTo => "to",
                    OrderKeyword::Retreat => "retreat",
                    OrderKeyword::Disband => "disband",
                    OrderKeyword::Build => "build",
                    OrderKeyword::Waive => "waive",
                    OrderKeyword::Via => "via",
                };
                word.to_string()
            }
            Token::Unknown(w) => w.clone(),
        }
    }
}

/// Splits normalized text into classified tokens, collapsing the longest
/// known multi-word phrase at each position. Words the lexicon does not
/// know come back as [`Token::Unknown`].
pub fn tokenize(topo: &Topology, text: &str) -> Vec<Token> {
    let norm = normalize(text);
    let words: Vec<&str> = norm.split(' ').filter(|w| !w.is_empty()).collect();
    let mut out = Vec::with_capacity(words.len());
    let mut i = 0;
    while i < words.len() {
        let window = topo.max_alias_words().min(words.len() - i);
        let mut consumed = 0;
        for len in (1..=window).rev() {
            let candidate = words[i..i + len].join(" ");
            if let Some(target) = topo.lookup_alias(&candidate) {
                out.push(match target {
                    AliasTarget::Province(p) => Token::Province(p),
                    AliasTarget::Power(p) => Token::Power(p),
                    AliasTarget::Coast(c) => Token::Coast(c),
                    AliasTarget::Unit(k) => Token::Unit(k),
                    AliasTarget::Keyword(k) => Token::Keyword(k),
                });
                consumed = len;
                break;
            }
        }
        if consumed == 0 {
            out.push(Token::Unknown(words[i].to_string()));
            consumed = 1;
        }
        i += consumed;
    }
    out
}
