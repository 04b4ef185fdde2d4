//! SBAS message classes and assurance levels
use crate::{error::Error, prelude::Duration};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// [AssuranceLevel] (navigation mode) the receiver operates at.
/// Each level has its own set of mandatory messages and alarm limits.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AssuranceLevel {
    /// Precision Approach
    #[default]
    #[cfg_attr(feature = "serde", serde(alias = "pa"))]
    PA,
    /// Non Precision Approach
    #[cfg_attr(feature = "serde", serde(alias = "npa"))]
    NPA,
}

impl AssuranceLevel {
    /// Next (less stringent) level we may degrade to
    pub fn degraded(&self) -> Option<Self> {
        match self {
            Self::PA => Some(Self::NPA),
            Self::NPA => None,
        }
    }
}

impl std::fmt::Display for AssuranceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::PA => write!(f, "PA"),
            Self::NPA => write!(f, "NPA"),
        }
    }
}

impl std::str::FromStr for AssuranceLevel {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pa" => Ok(Self::PA),
            "npa" => Ok(Self::NPA),
            _ => Err(Error::UnknownAssuranceLevel(s.to_string())),
        }
    }
}

/// Correction data category. Each [MessageClass] has its own validity timeout.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MessageClass {
    /// PRN mask (MT1)
    PrnMask,
    /// Fast corrections (MT2 to MT5)
    FastCorrections,
    /// Integrity information, UDREI (MT6)
    Integrity,
    /// Fast correction degradation factors (MT7)
    FastCorrectionDegradation,
    /// GEO navigation message (MT9)
    GeoNavigation,
    /// Degradation parameters (MT10)
    DegradationParameters,
    /// Long term satellite corrections (MT24, MT25)
    LongTermCorrections,
    /// Ionospheric grid point mask (MT18)
    IonoGridMask,
    /// Ionospheric grid delays (MT26)
    IonoDelays,
}

impl MessageClass {
    /// All classes, in message type order
    pub const ALL: [Self; 9] = [
        Self::PrnMask,
        Self::FastCorrections,
        Self::Integrity,
        Self::FastCorrectionDegradation,
        Self::GeoNavigation,
        Self::DegradationParameters,
        Self::IonoGridMask,
        Self::LongTermCorrections,
        Self::IonoDelays,
    ];

    /// Standard timeout interval for this class at given [AssuranceLevel]
    pub fn default_timeout(&self, level: AssuranceLevel) -> Duration {
        let (pa, npa) = match self {
            Self::PrnMask => (600.0, 600.0),
            Self::FastCorrections | Self::Integrity => (12.0, 18.0),
            Self::FastCorrectionDegradation => (240.0, 360.0),
            Self::GeoNavigation => (240.0, 360.0),
            Self::DegradationParameters => (240.0, 360.0),
            Self::LongTermCorrections => (240.0, 360.0),
            Self::IonoGridMask => (1200.0, 1200.0),
            Self::IonoDelays => (600.0, 600.0),
        };
        match level {
            AssuranceLevel::PA => Duration::from_seconds(pa),
            AssuranceLevel::NPA => Duration::from_seconds(npa),
        }
    }

    /// True if this class must be valid to navigate at this [AssuranceLevel].
    /// NPA does not require ionospheric corrections,
    /// GEO navigation is only needed when ranging on the GEO itself.
    pub fn is_mandatory(&self, level: AssuranceLevel) -> bool {
        match self {
            Self::GeoNavigation => false,
            Self::IonoGridMask | Self::IonoDelays => level == AssuranceLevel::PA,
            _ => true,
        }
    }

    /// Iterates the mandatory classes for this [AssuranceLevel]
    pub fn mandatory(level: AssuranceLevel) -> impl Iterator<Item = Self> {
        Self::ALL.into_iter().filter(move |c| c.is_mandatory(level))
    }
}

impl std::fmt::Display for MessageClass {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::PrnMask => write!(f, "prn-mask"),
            Self::FastCorrections => write!(f, "fast-corr"),
            Self::Integrity => write!(f, "integrity"),
            Self::FastCorrectionDegradation => write!(f, "fast-corr-degradation"),
            Self::GeoNavigation => write!(f, "geo-nav"),
            Self::DegradationParameters => write!(f, "degradation"),
            Self::LongTermCorrections => write!(f, "long-term-corr"),
            Self::IonoGridMask => write!(f, "igp-mask"),
            Self::IonoDelays => write!(f, "iono-delays"),
        }
    }
}

impl std::str::FromStr for MessageClass {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "prn-mask" | "mt1" => Ok(Self::PrnMask),
            "fast-corr" | "mt2" | "mt3" | "mt4" | "mt5" => Ok(Self::FastCorrections),
            "integrity" | "mt6" => Ok(Self::Integrity),
            "fast-corr-degradation" | "mt7" => Ok(Self::FastCorrectionDegradation),
            "geo-nav" | "mt9" => Ok(Self::GeoNavigation),
            "degradation" | "mt10" => Ok(Self::DegradationParameters),
            "igp-mask" | "mt18" => Ok(Self::IonoGridMask),
            "long-term-corr" | "mt24" | "mt25" => Ok(Self::LongTermCorrections),
            "iono-delays" | "mt26" => Ok(Self::IonoDelays),
            _ => Err(Error::UnknownMessageClass(s.to_string())),
        }
    }
}

#[cfg(test)]
mod test {
    use super::{AssuranceLevel, MessageClass};
    use rstest::*;
    use std::str::FromStr;

    #[test]
    fn npa_is_strict_subset_of_pa() {
        let pa = MessageClass::mandatory(AssuranceLevel::PA).collect::<Vec<_>>();
        let npa = MessageClass::mandatory(AssuranceLevel::NPA).collect::<Vec<_>>();
        assert!(npa.len() < pa.len());
        for class in npa.iter() {
            assert!(pa.contains(class), "{} is not PA mandatory", class);
        }
    }

    #[rstest]
    #[case("mt1", MessageClass::PrnMask)]
    #[case("MT4", MessageClass::FastCorrections)]
    #[case("degradation", MessageClass::DegradationParameters)]
    #[case(" iono-delays", MessageClass::IonoDelays)]
    fn message_class_parsing(#[case] s: &str, #[case] expected: MessageClass) {
        assert_eq!(MessageClass::from_str(s).unwrap(), expected);
        let formatted = expected.to_string();
        assert_eq!(MessageClass::from_str(&formatted).unwrap(), expected);
    }

    #[test]
    fn assurance_level_parsing() {
        assert_eq!(AssuranceLevel::from_str("PA").unwrap(), AssuranceLevel::PA);
        assert_eq!(AssuranceLevel::from_str("npa").unwrap(), AssuranceLevel::NPA);
        assert!(AssuranceLevel::from_str("apv").is_err());
        assert_eq!(AssuranceLevel::PA.degraded(), Some(AssuranceLevel::NPA));
        assert_eq!(AssuranceLevel::NPA.degraded(), None);
    }

    #[test]
    fn pa_timeouts_are_stricter() {
        for class in MessageClass::ALL {
            assert!(
                class.default_timeout(AssuranceLevel::PA)
                    <= class.default_timeout(AssuranceLevel::NPA)
            );
        }
    }
}
