//! Table-driven rewrite rules and the catalogue of known-good rules.
//!
//! A rule packs two 8-entry lookup tables into one integer. Both tables
//! are indexed by the node's *case*:
//!
//! `case = sum(neighbor states) + own_state * 4`, so `case ∈ [0, 7]`.
//!
//! - bit `case` gives the node's next state,
//! - bit `case + 8` says whether the node divides this generation.
//!
//! Bits above 15 are never read.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Number of distinct case values.
pub const CASE_COUNT: usize = 8;

/// A packed state/division rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rule(pub u32);

impl Rule {
    /// State a node with the given case takes next.
    #[inline]
    pub fn next_state(self, case: usize) -> u8 {
        ((self.0 >> case) & 1) as u8
    }

    /// Whether a node with the given case divides.
    #[inline]
    pub fn divides(self, case: usize) -> bool {
        (self.0 >> (case + CASE_COUNT)) & 1 == 1
    }

    /// Low byte: the state table.
    pub fn state_table(self) -> u8 {
        (self.0 & 0xff) as u8
    }

    /// Second byte: the division table.
    pub fn division_table(self) -> u8 {
        ((self.0 >> 8) & 0xff) as u8
    }
}

impl Default for Rule {
    fn default() -> Self {
        Rule(0x886)
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl FromStr for Rule {
    type Err = ConfigError;

    /// Accepts decimal (`2182`) or hex (`0x886`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = s.trim();
        let parsed = match t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")) {
            Some(hex) => u32::from_str_radix(hex, 16),
            None => t.parse::<u32>(),
        };
        parsed
            .map(Rule)
            .map_err(|_| ConfigError::InvalidRule(s.to_string()))
    }
}

/// Rules that produce interesting growth from the seed graph.
pub const CURATED_RULES: [Rule; 20] = [
    Rule(0x426),
    Rule(0x8a2),
    Rule(0x8ae),
    Rule(0x886),
    Rule(0x887),
    Rule(0x8bc),
    Rule(0x457),
    Rule(0x26a),
    Rule(0x409),
    Rule(0x1016),
    Rule(0x897),
    Rule(0x4625),
    Rule(0x4621),
    Rule(0x6621),
    Rule(0x56cc),
    Rule(0xcbc),
    Rule(0x3051),
    Rule(0x1082),
    Rule(0x289),
    Rule(0x21f2),
];

/// Mutation probabilities offered alongside rules.
pub const FLIP_PROB_CHOICES: [f64; 5] = [0.0, 1e-3, 1e-4, 5e-5, 1e-5];

/// A named rule and mutation probability pair.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Preset {
    pub name: &'static str,
    pub rule: Rule,
    pub flip_prob: f64,
}

pub const PRESETS: [Preset; 10] = [
    Preset { name: "quartatic", rule: Rule(2182), flip_prob: 0.0 },
    Preset { name: "quartatic - mutations", rule: Rule(2182), flip_prob: 5e-5 },
    Preset { name: "two branches", rule: Rule(3260), flip_prob: 0.0 },
    Preset { name: "exp tree", rule: Rule(2236), flip_prob: 0.0 },
    Preset { name: "exp hyper", rule: Rule(618), flip_prob: 0.0 },
    Preset { name: "exp fractal", rule: Rule(649), flip_prob: 0.0 },
    Preset { name: "exp symmetry", rule: Rule(1111), flip_prob: 0.0 },
    Preset { name: "robust linear", rule: Rule(22220), flip_prob: 1e-3 },
    Preset { name: "stable explosion", rule: Rule(8690), flip_prob: 1e-3 },
    Preset { name: "fancy tentacles", rule: Rule(17953), flip_prob: 5e-5 },
];

/// Looks a preset up by name.
pub fn preset(name: &str) -> Option<&'static Preset> {
    PRESETS.iter().find(|p| p.name == name)
}

/// Result of [`pick_random`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RulePick {
    pub rule: Rule,
    pub flip_prob: f64,
    /// Set when the pick came from [`PRESETS`].
    pub preset: Option<&'static str>,
}

/// Picks a rule for an unattended run.
///
/// 10% of the time a preset, 20% a curated rule, otherwise a synthetic
/// rule with a random state table and one or two division cases.
pub fn pick_random(rng: &mut impl Rng) -> RulePick {
    let r: f64 = rng.random();
    if r < 0.1 {
        let p = &PRESETS[rng.random_range(0..PRESETS.len())];
        return RulePick {
            rule: p.rule,
            flip_prob: p.flip_prob,
            preset: Some(p.name),
        };
    }

    let rule = if r < 0.3 {
        CURATED_RULES[rng.random_range(0..CURATED_RULES.len())]
    } else {
        let lower: u32 = rng.random_range(0..256);
        let bit1: u32 = rng.random_range(0..8);
        let bit2: u32 = rng.random_range(0..8);
        let upper = (1 << bit1) | (1 << bit2);
        Rule((upper << 8) | lower)
    };

    RulePick {
        rule,
        flip_prob: FLIP_PROB_CHOICES[rng.random_range(0..FLIP_PROB_CHOICES.len())],
        preset: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    #[test]
    fn quartatic_tables_match_bits() {
        let rule = Rule(0x886);
        // 0x86 = 1000_0110: cases 1, 2 and 7 turn on.
        let states: Vec<u8> = (0..CASE_COUNT).map(|c| rule.next_state(c)).collect();
        assert_eq!(states, vec![0, 1, 1, 0, 0, 0, 0, 1]);
        // 0x08: only case 3 divides.
        let divides: Vec<bool> = (0..CASE_COUNT).map(|c| rule.divides(c)).collect();
        assert_eq!(divides, vec![false, false, false, true, false, false, false, false]);
    }

    #[test]
    fn high_bits_are_ignored() {
        let a = Rule(0x886);
        let b = Rule(0xffff_0886);
        for c in 0..CASE_COUNT {
            assert_eq!(a.next_state(c), b.next_state(c));
            assert_eq!(a.divides(c), b.divides(c));
        }
    }

    #[test]
    fn parses_decimal_and_hex() {
        assert_eq!("2182".parse::<Rule>().unwrap(), Rule(0x886));
        assert_eq!("0x886".parse::<Rule>().unwrap(), Rule(2182));
        assert_eq!(" 0X21f2 ".parse::<Rule>().unwrap(), Rule(0x21f2));
        assert!(matches!("rule".parse::<Rule>(), Err(ConfigError::InvalidRule(_))));
    }

    #[test]
    fn display_is_hex() {
        assert_eq!(Rule(2182).to_string(), "0x886");
    }

    #[test]
    fn preset_lookup_by_name() {
        let p = preset("fancy tentacles").unwrap();
        assert_eq!(p.rule, Rule(17953));
        assert!(preset("nope").is_none());
    }

    #[test]
    fn random_picks_stay_in_catalogue_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let pick = pick_random(&mut rng);
            assert!(FLIP_PROB_CHOICES.contains(&pick.flip_prob) || pick.preset.is_some());
            assert!(pick.rule.0 <= 0xffff);
            // Every pick can divide somewhere, otherwise growth would be dead on arrival.
            assert_ne!(pick.rule.division_table(), 0);
            if let Some(name) = pick.preset {
                assert_eq!(preset(name).unwrap().rule, pick.rule);
            }
        }
    }
}
