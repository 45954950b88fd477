use std::fmt;
use std::ops::BitOr;

use serde::{Deserialize, Serialize};

/// Gameplay modifier bitmask, using the scoring service's bit values
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Mods(u32);

impl Mods {
    pub const NONE: Mods = Mods(0);
    pub const NO_FAIL: Mods = Mods(1);
    pub const EASY: Mods = Mods(2);
    pub const HIDDEN: Mods = Mods(8);
    pub const HARD_ROCK: Mods = Mods(16);
    pub const SUDDEN_DEATH: Mods = Mods(32);
    pub const DOUBLE_TIME: Mods = Mods(64);
    pub const HALF_TIME: Mods = Mods(256);
    pub const NIGHTCORE: Mods = Mods(512);
    pub const FLASHLIGHT: Mods = Mods(1024);
    pub const SPUN_OUT: Mods = Mods(4096);
    pub const PERFECT: Mods = Mods(16384);

    /// Modifiers that take part in canonical names, in naming order
    const NAMED: [(Mods, &'static str); 5] = [
        (Mods::HARD_ROCK, "HR"),
        (Mods::DOUBLE_TIME, "DT"),
        (Mods::FLASHLIGHT, "FL"),
        (Mods::HIDDEN, "HD"),
        (Mods::EASY, "EZ"),
    ];

    pub const fn from_bits(bits: u32) -> Self {
        Mods(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn union(self, other: Mods) -> Self {
        Mods(self.0 | other.0)
    }

    pub const fn contains(self, other: Mods) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Concatenated two-letter codes in HR, DT, FL, HD, EZ order.
    ///
    /// Only these five modifiers contribute; other bits are ignored.
    pub fn canonical_name(self) -> String {
        Self::NAMED
            .iter()
            .filter(|(mods, _)| self.contains(*mods))
            .map(|(_, code)| *code)
            .collect()
    }
}

impl BitOr for Mods {
    type Output = Mods;

    fn bitor(self, rhs: Mods) -> Mods {
        self.union(rhs)
    }
}

impl From<u32> for Mods {
    fn from(bits: u32) -> Self {
        Mods(bits)
    }
}

impl fmt::Display for Mods {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.canonical_name();
        if name.is_empty() {
            write!(f, "NM")
        } else {
            write!(f, "{}", name)
        }
    }
}

const HR: Mods = Mods::HARD_ROCK;
const DT: Mods = Mods::DOUBLE_TIME;
const FL: Mods = Mods::FLASHLIGHT;
const HD: Mods = Mods::HIDDEN;
const EZ: Mods = Mods::EASY;

/// Every modifier combination a chart's performance is computed under.
///
/// All non-empty combinations of HR, DT, FL, HD and EZ except those holding
/// both HR and EZ.
pub const MOD_COMBINATIONS: [(Mods, &str); 23] = [
    (HR, "HR"),
    (DT, "DT"),
    (FL, "FL"),
    (HD, "HD"),
    (EZ, "EZ"),
    (HR.union(DT), "HRDT"),
    (HR.union(FL), "HRFL"),
    (HR.union(HD), "HRHD"),
    (DT.union(FL), "DTFL"),
    (DT.union(HD), "DTHD"),
    (DT.union(EZ), "DTEZ"),
    (FL.union(HD), "FLHD"),
    (FL.union(EZ), "FLEZ"),
    (HD.union(EZ), "HDEZ"),
    (HR.union(DT).union(FL), "HRDTFL"),
    (HR.union(DT).union(HD), "HRDTHD"),
    (HR.union(FL).union(HD), "HRFLHD"),
    (DT.union(FL).union(HD), "DTFLHD"),
    (DT.union(FL).union(EZ), "DTFLEZ"),
    (DT.union(HD).union(EZ), "DTHDEZ"),
    (FL.union(HD).union(EZ), "FLHDEZ"),
    (HR.union(DT).union(FL).union(HD), "HRDTFLHD"),
    (DT.union(FL).union(HD).union(EZ), "DTFLHDEZ"),
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_canonical_name_order() {
        let all = HD | EZ | FL | DT | HR;
        assert_eq!(all.canonical_name(), "HRDTFLHDEZ");
        assert_eq!((HD | DT).canonical_name(), "DTHD");
        assert_eq!((EZ | HD).canonical_name(), "HDEZ");
        assert_eq!(Mods::NONE.canonical_name(), "");
    }

    #[test]
    fn test_canonical_name_ignores_other_bits() {
        let mods = Mods::NO_FAIL | Mods::HIDDEN | Mods::SPUN_OUT;
        assert_eq!(mods.canonical_name(), "HD");
    }

    #[test]
    fn test_table_names_match_bitmasks() {
        for (mods, name) in MOD_COMBINATIONS {
            assert_eq!(mods.canonical_name(), name, "bits {}", mods.bits());
        }
    }

    #[test]
    fn test_table_is_unique_and_excludes_hr_ez() {
        let names: HashSet<&str> = MOD_COMBINATIONS.iter().map(|(_, n)| *n).collect();
        let bits: HashSet<u32> = MOD_COMBINATIONS.iter().map(|(m, _)| m.bits()).collect();
        assert_eq!(names.len(), 23);
        assert_eq!(bits.len(), 23);

        for (mods, _) in MOD_COMBINATIONS {
            assert!(!mods.is_empty());
            assert!(!(mods.contains(HR) && mods.contains(EZ)));
        }
    }

    #[test]
    fn test_table_is_complete() {
        // 31 non-empty subsets of five modifiers, minus the 8 holding both HR and EZ
        let expected = (1u32..32)
            .map(|subset| {
                Mods::NAMED
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| subset & (1u32 << *i) != 0)
                    .fold(Mods::NONE, |acc, (_, (m, _))| acc | *m)
            })
            .filter(|m| !(m.contains(HR) && m.contains(EZ)))
            .count();
        assert_eq!(expected, MOD_COMBINATIONS.len());
    }

    #[test]
    fn test_known_bit_values() {
        assert_eq!((HR | DT).bits(), 80);
        assert_eq!((DT | FL | HD | EZ).bits(), 1098);
        assert_eq!(Mods::from(72).to_string(), "DTHD");
        assert_eq!(Mods::NONE.to_string(), "NM");
    }
}
