use std::collections::HashMap;

use gnss::prelude::SV;
use log::info;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    error::Error,
    prelude::{AssuranceLevel, Duration, MessageClass},
};

mod grid;
mod switching;

pub use grid::{CoverageOpts, GridOpts, Rectangle};
pub use switching::{SwitchPolicy, SwitchingOpts};

fn default_window_size() -> usize {
    15
}

fn default_pa_limits() -> AlarmLimits {
    // APV-I
    AlarmLimits {
        hal: 40.0,
        val: Some(50.0),
    }
}

fn default_npa_limits() -> AlarmLimits {
    AlarmLimits {
        hal: 556.0,
        val: None,
    }
}

/// Alarm limits [m] a protection level must not exceed
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AlarmLimits {
    /// Horizontal Alarm Limit [m]
    pub hal: f64,
    /// Vertical Alarm Limit [m]: no vertical guidance when None
    #[cfg_attr(feature = "serde", serde(default))]
    pub val: Option<f64>,
}

impl AlarmLimits {
    /// True if both protection levels are within limits
    pub fn bounds(&self, hpl: f64, vpl: f64) -> bool {
        if hpl > self.hal {
            return false;
        }
        match self.val {
            Some(val) => vpl <= val,
            None => true,
        }
    }

    fn validate(&self) -> Result<(), Error> {
        if self.hal <= 0.0 || !self.hal.is_finite() {
            return Err(Error::InvalidAlarmLimit(self.hal));
        }
        if let Some(val) = self.val {
            if val <= 0.0 || !val.is_finite() {
                return Err(Error::InvalidAlarmLimit(val));
            }
        }
        Ok(())
    }
}

/// Timeout interval override
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TimeoutOverride {
    pub class: MessageClass,
    /// Applies to both levels when None
    #[cfg_attr(feature = "serde", serde(default))]
    pub level: Option<AssuranceLevel>,
    /// Timeout [s]
    pub seconds: f64,
}

/// Continuity options
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ContinuityOpts {
    /// Sliding window size, in epochs
    #[cfg_attr(feature = "serde", serde(default = "default_window_size"))]
    pub window_size: usize,
}

impl Default for ContinuityOpts {
    fn default() -> Self {
        Self {
            window_size: default_window_size(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Config {
    /// GEO and mode switching
    #[cfg_attr(feature = "serde", serde(default))]
    pub switching: SwitchingOpts,
    /// Preferred initial GEO: first GEO we hear from when None
    #[cfg_attr(feature = "serde", serde(default))]
    pub preferred_source: Option<SV>,
    /// GEOs we never select
    #[cfg_attr(feature = "serde", serde(default))]
    pub excluded_sources: Vec<SV>,
    /// User defined timeouts
    #[cfg_attr(feature = "serde", serde(default))]
    pub timeouts: Vec<TimeoutOverride>,
    /// Message classes disabled by the operator: they never time out.
    #[cfg_attr(feature = "serde", serde(default))]
    pub disabled_classes: Vec<MessageClass>,
    /// PA alarm limits
    #[cfg_attr(feature = "serde", serde(default = "default_pa_limits"))]
    pub pa_limits: AlarmLimits,
    /// NPA alarm limits
    #[cfg_attr(feature = "serde", serde(default = "default_npa_limits"))]
    pub npa_limits: AlarmLimits,
    /// Continuity risk estimation
    #[cfg_attr(feature = "serde", serde(default))]
    pub continuity: ContinuityOpts,
    /// Availability maps
    #[cfg_attr(feature = "serde", serde(default))]
    pub grid: GridOpts,
    /// Correction coverage map, not generated when None
    #[cfg_attr(feature = "serde", serde(default))]
    pub coverage: Option<CoverageOpts>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            switching: Default::default(),
            preferred_source: None,
            excluded_sources: Default::default(),
            timeouts: Default::default(),
            disabled_classes: Default::default(),
            pa_limits: default_pa_limits(),
            npa_limits: default_npa_limits(),
            continuity: Default::default(),
            grid: Default::default(),
            coverage: None,
        }
    }
}

impl Config {
    /// Verifies this [Config], to be used prior any processing.
    pub fn validate(&self) -> Result<(), Error> {
        self.switching.validate()?;
        self.pa_limits.validate()?;
        self.npa_limits.validate()?;
        if self.continuity.window_size == 0 {
            return Err(Error::InvalidWindowSize);
        }
        for timeout in self.timeouts.iter() {
            if timeout.seconds < 0.0 || !timeout.seconds.is_finite() {
                return Err(Error::InvalidTimeout(
                    timeout.seconds,
                    timeout.class.to_string(),
                ));
            }
        }
        self.grid.validate()?;
        if let Some(coverage) = &self.coverage {
            coverage.validate()?;
        }
        info!(
            "switching policy: {} (geo switch: {}, mode switch: {})",
            self.switching.policy(),
            self.switching.geo_switching,
            self.switching.level_switching_allowed()
        );
        Ok(())
    }

    /// Alarm limits that apply to this [AssuranceLevel]
    pub fn alarm_limits(&self, level: AssuranceLevel) -> &AlarmLimits {
        match level {
            AssuranceLevel::PA => &self.pa_limits,
            AssuranceLevel::NPA => &self.npa_limits,
        }
    }

    /// Resolved timeout table: user overrides, then standard values.
    /// Level specific overrides win over overrides that apply to both levels.
    pub fn timeout_table(&self) -> HashMap<(MessageClass, AssuranceLevel), Duration> {
        let mut table = HashMap::with_capacity(2 * MessageClass::ALL.len());
        for class in MessageClass::ALL {
            for level in [AssuranceLevel::PA, AssuranceLevel::NPA] {
                table.insert((class, level), class.default_timeout(level));
            }
        }
        for timeout in self.timeouts.iter().filter(|t| t.level.is_none()) {
            for level in [AssuranceLevel::PA, AssuranceLevel::NPA] {
                table.insert(
                    (timeout.class, level),
                    Duration::from_seconds(timeout.seconds),
                );
            }
        }
        for timeout in self.timeouts.iter() {
            if let Some(level) = timeout.level {
                table.insert(
                    (timeout.class, level),
                    Duration::from_seconds(timeout.seconds),
                );
            }
        }
        table
    }
}
