use crate::{
    error::Error,
    prelude::{AssuranceLevel, Duration},
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use log::warn;

fn default_geo_switching() -> bool {
    true
}

fn default_level_switching() -> bool {
    true
}

fn default_min_switch_time() -> f64 {
    0.0
}

fn default_max_switches() -> usize {
    2
}

fn default_acquisition_time() -> f64 {
    0.0
}

/// [SwitchPolicy] defines how we behave once we switched away from
/// the initial GEO.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub enum SwitchPolicy {
    /// No preference: avoid bouncing back to the previous GEO
    #[default]
    None,
    /// Stick to the GEO we switched to
    Maintain,
    /// Return to the initial GEO as soon as it is usable again
    Fallback,
}

impl std::fmt::Display for SwitchPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Maintain => write!(f, "maintain"),
            Self::Fallback => write!(f, "fallback"),
        }
    }
}

/// GEO and navigation mode switching options
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SwitchingOpts {
    /// Allow switching to another GEO when the active one is not usable
    #[cfg_attr(feature = "serde", serde(default = "default_geo_switching"))]
    pub geo_switching: bool,
    /// Allow degrading from PA to NPA when no GEO is usable in PA
    #[cfg_attr(feature = "serde", serde(default = "default_level_switching"))]
    pub level_switching: bool,
    /// Force the navigation mode: disables mode switching
    #[cfg_attr(feature = "serde", serde(default))]
    pub forced_level: Option<AssuranceLevel>,
    /// Minimal time between two switches [s]. 0 allows several
    /// switches within the same epoch.
    #[cfg_attr(feature = "serde", serde(default = "default_min_switch_time"))]
    pub minimum_switch_time: f64,
    /// Maximal number of switches within one epoch
    #[cfg_attr(feature = "serde", serde(default = "default_max_switches"))]
    pub max_switches_per_epoch: usize,
    /// Continuous usability period [s] a GEO needs before
    /// we would abandon a usable GEO for it
    #[cfg_attr(feature = "serde", serde(default = "default_acquisition_time"))]
    pub acquisition_time: f64,
    /// Keep the GEO we switched to
    #[cfg_attr(feature = "serde", serde(default))]
    pub maintain: bool,
    /// Return to the initial GEO when possible. Prevails over [Self::maintain].
    #[cfg_attr(feature = "serde", serde(default))]
    pub fallback: bool,
}

impl Default for SwitchingOpts {
    fn default() -> Self {
        Self {
            geo_switching: default_geo_switching(),
            level_switching: default_level_switching(),
            forced_level: None,
            minimum_switch_time: default_min_switch_time(),
            max_switches_per_epoch: default_max_switches(),
            acquisition_time: default_acquisition_time(),
            maintain: false,
            fallback: false,
        }
    }
}

impl SwitchingOpts {
    /// Resolved [SwitchPolicy]: fallback prevails
    pub fn policy(&self) -> SwitchPolicy {
        if self.fallback {
            SwitchPolicy::Fallback
        } else if self.maintain {
            SwitchPolicy::Maintain
        } else {
            SwitchPolicy::None
        }
    }

    /// Navigation mode we start in
    pub fn initial_level(&self) -> AssuranceLevel {
        self.forced_level.unwrap_or_default()
    }

    /// True if we may degrade to a lower navigation mode
    pub fn level_switching_allowed(&self) -> bool {
        self.level_switching && self.forced_level.is_none()
    }

    pub fn minimum_switch_duration(&self) -> Duration {
        Duration::from_seconds(self.minimum_switch_time)
    }

    pub fn acquisition_duration(&self) -> Duration {
        Duration::from_seconds(self.acquisition_time)
    }

    pub(crate) fn validate(&self) -> Result<(), Error> {
        if self.minimum_switch_time < 0.0 || !self.minimum_switch_time.is_finite() {
            return Err(Error::NegativeDuration(self.minimum_switch_time));
        }
        if self.acquisition_time < 0.0 || !self.acquisition_time.is_finite() {
            return Err(Error::NegativeDuration(self.acquisition_time));
        }
        if self.max_switches_per_epoch == 0 {
            return Err(Error::InvalidSwitchBound);
        }
        if !self.geo_switching && (self.maintain || self.fallback) {
            return Err(Error::ConflictingPolicy);
        }
        if self.maintain && self.fallback {
            warn!("both maintain and fallback policies are set: fallback prevails");
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::{SwitchPolicy, SwitchingOpts};
    use crate::{error::Error, prelude::AssuranceLevel};

    #[test]
    fn fallback_prevails() {
        let mut opts = SwitchingOpts::default();
        assert_eq!(opts.policy(), SwitchPolicy::None);

        opts.maintain = true;
        assert_eq!(opts.policy(), SwitchPolicy::Maintain);

        opts.fallback = true;
        assert_eq!(opts.policy(), SwitchPolicy::Fallback);
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn switching_validation() {
        let mut opts = SwitchingOpts::default();
        opts.max_switches_per_epoch = 0;
        assert_eq!(opts.validate(), Err(Error::InvalidSwitchBound));

        let mut opts = SwitchingOpts::default();
        opts.minimum_switch_time = -1.0;
        assert_eq!(opts.validate(), Err(Error::NegativeDuration(-1.0)));

        let mut opts = SwitchingOpts::default();
        opts.minimum_switch_time = f64::NAN;
        assert!(matches!(opts.validate(), Err(Error::NegativeDuration(_))));

        let mut opts = SwitchingOpts::default();
        opts.acquisition_time = f64::INFINITY;
        assert!(matches!(opts.validate(), Err(Error::NegativeDuration(_))));

        let mut opts = SwitchingOpts::default();
        opts.geo_switching = false;
        opts.fallback = true;
        assert_eq!(opts.validate(), Err(Error::ConflictingPolicy));
    }

    #[test]
    fn forced_level() {
        let mut opts = SwitchingOpts::default();
        assert_eq!(opts.initial_level(), AssuranceLevel::PA);
        assert!(opts.level_switching_allowed());

        opts.forced_level = Some(AssuranceLevel::NPA);
        assert_eq!(opts.initial_level(), AssuranceLevel::NPA);
        assert!(!opts.level_switching_allowed());
    }
}
