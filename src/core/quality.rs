//! Hypocenter quality classification

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Ordered classification of solution confidence.
///
/// Variants are declared best to worst; [`QualityClass::rank`] is the
/// declaration index, so a lower rank means a more trustworthy solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum QualityClass {
    S,
    A,
    B,
    C,
    D,
}

impl QualityClass {
    /// All classes, best first
    pub const ALL: [QualityClass; 5] = [Self::S, Self::A, Self::B, Self::C, Self::D];

    /// The worst class, used when an upstream solution carries no quality summary
    pub const WORST: QualityClass = Self::D;

    /// Rank of this class (0 = best)
    pub fn rank(self) -> u8 {
        self as u8
    }

    /// Look up a class by rank
    pub fn from_rank(rank: u8) -> Option<Self> {
        Self::ALL.get(rank as usize).copied()
    }
}

impl fmt::Display for QualityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::S => "S",
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
        };
        f.write_str(name)
    }
}

impl FromStr for QualityClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "S" => Ok(Self::S),
            "A" => Ok(Self::A),
            "B" => Ok(Self::B),
            "C" => Ok(Self::C),
            "D" => Ok(Self::D),
            other => Err(format!("unknown quality class '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_follows_declaration_order() {
        assert_eq!(QualityClass::S.rank(), 0);
        assert_eq!(QualityClass::D.rank(), 4);
        assert!(QualityClass::A < QualityClass::C);

        for class in QualityClass::ALL {
            assert_eq!(QualityClass::from_rank(class.rank()), Some(class));
        }
        assert_eq!(QualityClass::from_rank(5), None);
    }

    #[test]
    fn test_parse() {
        assert_eq!("b".parse::<QualityClass>(), Ok(QualityClass::B));
        assert!("x".parse::<QualityClass>().is_err());
    }
}
