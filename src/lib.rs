#![doc = include_str!("../README.md")]
#![cfg_attr(docrs, feature(doc_cfg))]

extern crate gnss_rs as gnss;

// private modules
mod cfg;
mod continuity;
mod error;
mod evaluator;
mod grid;
mod message;
mod selector;
mod simulation;
mod validity;

#[cfg(test)]
mod tests;

// prelude
pub mod prelude {
    pub use crate::cfg::{
        AlarmLimits, Config, ContinuityOpts, CoverageOpts, GridOpts, Rectangle, SwitchPolicy,
        SwitchingOpts, TimeoutOverride,
    };
    pub use crate::continuity::{ContinuityTracker, DiscontinuityEvent, SlidingWindow};
    pub use crate::evaluator::{
        AvailabilityVerdict, Coordinates, CorrectionCoverage, CoverageEvaluator,
        InsufficientGeometry, IntegritySolver, PointEvaluator, ProtectionLevels, VerdictStatus,
    };
    pub use crate::grid::{AreaFilter, CoverageCell, GridCell, GridSpec, HourlyBucket};
    pub use crate::message::{AssuranceLevel, MessageClass};
    pub use crate::selector::{SelectionResult, SourceSelector, SwitchState};
    pub use crate::simulation::{HourlyMaps, Map, Simulation, SimulationReport, NOT_COMPUTED};
    pub use crate::validity::{MessageEvent, ValidityTable, ValidityTracker};
    // re-export
    pub use gnss::prelude::{Constellation, SV};
    pub use hifitime::{Duration, Epoch, TimeScale};
}

// pub export
pub use error::Error;
