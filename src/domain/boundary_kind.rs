//! The political level a polygon describes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed enumeration of political levels a boundary can describe.
///
/// The kind determines authority rules (which sources are legally
/// primary) and redistricting-gap behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryKind {
    /// National legislative lower chamber (e.g. U.S. House).
    NationalLegislativeLower,
    /// National legislative upper chamber (e.g. U.S. Senate).
    NationalLegislativeUpper,
    /// State legislative upper chamber.
    StateUpper,
    /// State legislative lower chamber.
    StateLower,
    /// County.
    County,
    /// Municipality.
    Municipality,
    /// Council district.
    CouncilDistrict,
    /// School district.
    SchoolDistrict,
    /// Voting precinct.
    VotingPrecinct,
    /// Any other special-purpose district.
    OtherSpecial,
}

impl BoundaryKind {
    /// Whether this kind is a legislative kind for redistricting-gap purposes.
    pub fn is_legislative(self) -> bool {
        matches!(
            self,
            Self::NationalLegislativeLower
                | Self::NationalLegislativeUpper
                | Self::StateUpper
                | Self::StateLower
                | Self::CouncilDistrict
        )
    }

    /// Whether this kind is a voting precinct.
    pub fn is_precinct(self) -> bool {
        matches!(self, Self::VotingPrecinct)
    }

    /// Gap-period confidence multiplier for this boundary kind (§4.B).
    pub fn gap_multiplier(self) -> f64 {
        if self.is_legislative() {
            0.3
        } else if self.is_precinct() || matches!(self, Self::SchoolDistrict) {
            0.6
        } else {
            0.8
        }
    }

    /// All boundary kinds, for registry-wide iteration.
    pub fn all() -> &'static [BoundaryKind] {
        &[
            Self::NationalLegislativeLower,
            Self::NationalLegislativeUpper,
            Self::StateUpper,
            Self::StateLower,
            Self::County,
            Self::Municipality,
            Self::CouncilDistrict,
            Self::SchoolDistrict,
            Self::VotingPrecinct,
            Self::OtherSpecial,
        ]
    }
}

impl fmt::Display for BoundaryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NationalLegislativeLower => "national_legislative_lower",
            Self::NationalLegislativeUpper => "national_legislative_upper",
            Self::StateUpper => "state_upper",
            Self::StateLower => "state_lower",
            Self::County => "county",
            Self::Municipality => "municipality",
            Self::CouncilDistrict => "council_district",
            Self::SchoolDistrict => "school_district",
            Self::VotingPrecinct => "voting_precinct",
            Self::OtherSpecial => "other_special",
        };
        write!(f, "{}", s)
    }
}

/// Error returned when parsing an unrecognized boundary kind string.
#[derive(Debug, thiserror::Error)]
#[error("unknown boundary kind: {0}")]
pub struct UnknownBoundaryKind(pub String);

impl FromStr for BoundaryKind {
    type Err = UnknownBoundaryKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "national_legislative_lower" => Ok(Self::NationalLegislativeLower),
            "national_legislative_upper" => Ok(Self::NationalLegislativeUpper),
            "state_upper" => Ok(Self::StateUpper),
            "state_lower" => Ok(Self::StateLower),
            "county" => Ok(Self::County),
            "municipality" => Ok(Self::Municipality),
            "council_district" => Ok(Self::CouncilDistrict),
            "school_district" => Ok(Self::SchoolDistrict),
            "voting_precinct" => Ok(Self::VotingPrecinct),
            "other_special" => Ok(Self::OtherSpecial),
            other => Err(UnknownBoundaryKind(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legislative_kinds() {
        assert!(BoundaryKind::StateLower.is_legislative());
        assert!(!BoundaryKind::County.is_legislative());
    }

    #[test]
    fn gap_multipliers() {
        assert_eq!(BoundaryKind::StateUpper.gap_multiplier(), 0.3);
        assert_eq!(BoundaryKind::VotingPrecinct.gap_multiplier(), 0.6);
        assert_eq!(BoundaryKind::County.gap_multiplier(), 0.8);
    }

    #[test]
    fn roundtrip_display_parse() {
        for kind in BoundaryKind::all() {
            let s = kind.to_string();
            let parsed: BoundaryKind = s.parse().unwrap();
            assert_eq!(*kind, parsed);
        }
    }

    #[test]
    fn unknown_kind_errors() {
        assert!("bogus".parse::<BoundaryKind>().is_err());
    }
}
