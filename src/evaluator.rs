//! Service availability evaluation, at one location
use log::debug;
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    cfg::AlarmLimits,
    prelude::{
        AssuranceLevel, Config, Epoch, SelectionResult, SourceSelector, SwitchState,
        ValidityTracker, SV,
    },
};

/// Geodetic coordinates of the user
#[derive(Debug, Copy, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Coordinates {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub altitude_m: f64,
}

impl Coordinates {
    pub fn new(latitude_deg: f64, longitude_deg: f64, altitude_m: f64) -> Self {
        Self {
            latitude_deg,
            longitude_deg,
            altitude_m,
        }
    }
}

/// Protection levels [m]
#[derive(Debug, Copy, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ProtectionLevels {
    /// Horizontal Protection Level [m]
    pub hpl: f64,
    /// Vertical Protection Level [m]
    pub vpl: f64,
}

/// The navigation attempt did not gather enough usable satellites.
/// Collaborator failures are reported the same way.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Error)]
#[error("insufficient geometry")]
pub struct InsufficientGeometry;

/// [IntegritySolver] is implemented by the navigation solver: it computes
/// the protection levels at a location, using the corrections of one GEO.
pub trait IntegritySolver {
    fn solve(
        &self,
        t: Epoch,
        position: &Coordinates,
        source: SV,
        level: AssuranceLevel,
    ) -> Result<ProtectionLevels, InsufficientGeometry>;
}

/// [CorrectionCoverage] is implemented by the correction interpolator:
/// it tells whether a position fixed correction term (ionospheric correction)
/// may be obtained at this location, from this GEO.
pub trait CorrectionCoverage {
    fn is_covered(&self, t: Epoch, position: &Coordinates, source: SV, level: AssuranceLevel)
        -> bool;
}

/// Reason for a [AvailabilityVerdict]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum VerdictStatus {
    /// Protection levels within alarm limits
    Available,
    /// Protection levels computed but exceed the alarm limits
    AlarmLimitExceeded,
    /// No usable satellite geometry with any of the attempted GEOs
    InsufficientGeometry,
    /// No GEO usable: protection levels not computed
    Degraded,
}

/// Outcome of the evaluation of one location, at one instant.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct AvailabilityVerdict {
    pub t: Epoch,
    /// GEO that was used, if any
    pub source: Option<SV>,
    /// Navigation mode, if any
    pub level: Option<AssuranceLevel>,
    /// Protection levels: None when not computed
    pub protection: Option<ProtectionLevels>,
    pub status: VerdictStatus,
}

impl AvailabilityVerdict {
    fn unavailable(t: Epoch, status: VerdictStatus) -> Self {
        Self {
            t,
            status,
            source: None,
            level: None,
            protection: None,
        }
    }

    pub fn is_available(&self) -> bool {
        self.status == VerdictStatus::Available
    }

    pub fn hpl(&self) -> Option<f64> {
        self.protection.map(|pl| pl.hpl)
    }

    pub fn vpl(&self) -> Option<f64> {
        self.protection.map(|pl| pl.vpl)
    }
}

/// [PointEvaluator] drives the [SourceSelector] and the [IntegritySolver]
/// for one location at a time.
pub struct PointEvaluator<'a, S: IntegritySolver + ?Sized> {
    selector: &'a SourceSelector,
    solver: &'a S,
    pa_limits: AlarmLimits,
    npa_limits: AlarmLimits,
    max_attempts: usize,
}

impl<'a, S: IntegritySolver + ?Sized> PointEvaluator<'a, S> {
    pub fn new(cfg: &Config, selector: &'a SourceSelector, solver: &'a S) -> Self {
        Self {
            selector,
            solver,
            pa_limits: cfg.pa_limits,
            npa_limits: cfg.npa_limits,
            max_attempts: cfg.switching.max_switches_per_epoch + 1,
        }
    }

    fn alarm_limits(&self, level: AssuranceLevel) -> &AlarmLimits {
        match level {
            AssuranceLevel::PA => &self.pa_limits,
            AssuranceLevel::NPA => &self.npa_limits,
        }
    }

    /// Evaluates service availability at `position`.
    /// When the selected GEO does not allow navigation, it is excluded for this epoch
    /// and the selection is attempted again, up to max_switches_per_epoch times.
    pub fn evaluate(
        &self,
        t: Epoch,
        position: &Coordinates,
        state: &mut SwitchState,
        tracker: &ValidityTracker,
    ) -> AvailabilityVerdict {
        let mut excluded = Vec::<SV>::with_capacity(self.max_attempts);

        for _ in 0..self.max_attempts {
            let (source, level) = match self.selector.select(state, tracker, t, &excluded) {
                SelectionResult::Selected(source, level) => (source, level),
                SelectionResult::Degraded => {
                    return if excluded.is_empty() {
                        AvailabilityVerdict::unavailable(t, VerdictStatus::Degraded)
                    } else {
                        AvailabilityVerdict::unavailable(t, VerdictStatus::InsufficientGeometry)
                    };
                },
            };

            match self.solver.solve(t, position, source, level) {
                Ok(protection) => {
                    let status = if self
                        .alarm_limits(level)
                        .bounds(protection.hpl, protection.vpl)
                    {
                        VerdictStatus::Available
                    } else {
                        VerdictStatus::AlarmLimitExceeded
                    };
                    return AvailabilityVerdict {
                        t,
                        status,
                        source: Some(source),
                        level: Some(level),
                        protection: Some(protection),
                    };
                },
                Err(InsufficientGeometry) => {
                    debug!("{} ({}) insufficient geometry with {}", t, source, level);
                    excluded.push(source);
                },
            }
        }

        AvailabilityVerdict::unavailable(t, VerdictStatus::InsufficientGeometry)
    }
}

/// [CoverageEvaluator] is the reduced evaluator: it only verifies that the
/// correction term is obtainable. The navigation solver is not involved.
pub struct CoverageEvaluator<'a, C: CorrectionCoverage + ?Sized> {
    selector: &'a SourceSelector,
    coverage: &'a C,
}

impl<'a, C: CorrectionCoverage + ?Sized> CoverageEvaluator<'a, C> {
    pub fn new(selector: &'a SourceSelector, coverage: &'a C) -> Self {
        Self { selector, coverage }
    }

    pub fn evaluate(
        &self,
        t: Epoch,
        position: &Coordinates,
        state: &mut SwitchState,
        tracker: &ValidityTracker,
    ) -> bool {
        match self.selector.select(state, tracker, t, &[]) {
            SelectionResult::Selected(source, level) => {
                self.coverage.is_covered(t, position, source, level)
            },
            SelectionResult::Degraded => false,
        }
    }
}

#[cfg(test)]
mod test {
    use super::{
        Coordinates, CorrectionCoverage, CoverageEvaluator, InsufficientGeometry, IntegritySolver,
        PointEvaluator, ProtectionLevels, VerdictStatus,
    };
    use crate::{
        prelude::{
            AssuranceLevel, Config, Constellation, Duration, Epoch, MessageClass, SourceSelector,
            ValidityTracker, SV,
        },
        tests::init_logger,
        validity::MessageEvent,
    };
    use std::{cell::RefCell, str::FromStr};

    fn geo(prn: u8) -> SV {
        SV::new(Constellation::SBAS, prn)
    }

    /// Solver that fails for a list of GEOs and records every attempt
    struct BlindSolver {
        blind: Vec<SV>,
        protection: ProtectionLevels,
        attempts: RefCell<Vec<SV>>,
    }

    impl IntegritySolver for BlindSolver {
        fn solve(
            &self,
            _: Epoch,
            _: &Coordinates,
            source: SV,
            _: AssuranceLevel,
        ) -> Result<ProtectionLevels, InsufficientGeometry> {
            self.attempts.borrow_mut().push(source);
            if self.blind.contains(&source) {
                Err(InsufficientGeometry)
            } else {
                Ok(self.protection)
            }
        }
    }

    struct NorthernCoverage;

    impl CorrectionCoverage for NorthernCoverage {
        fn is_covered(&self, _: Epoch, position: &Coordinates, _: SV, _: AssuranceLevel) -> bool {
            position.latitude_deg >= 30.0
        }
    }

    fn setup(sources: &[SV], t: Epoch) -> ValidityTracker {
        let mut tracker = ValidityTracker::new(&Config::default());
        for source in sources {
            for class in MessageClass::ALL {
                for event in MessageEvent::receptions(t, *source, class) {
                    tracker.ingest(&event);
                }
            }
        }
        tracker.new_epoch(t);
        tracker
    }

    #[test]
    fn alarm_limits_verdict() {
        init_logger();
        let cfg = Config::default();
        let t = Epoch::from_str("2020-06-25T00:00:00 GPST").unwrap();
        let tracker = setup(&[geo(23)], t);
        let selector = SourceSelector::new(&cfg);
        let position = Coordinates::new(45.0, 2.0, 0.0);

        for (hpl, vpl, status) in [
            (10.0, 20.0, VerdictStatus::Available),
            (41.0, 20.0, VerdictStatus::AlarmLimitExceeded),
            (10.0, 51.0, VerdictStatus::AlarmLimitExceeded),
        ] {
            let solver = BlindSolver {
                blind: vec![],
                protection: ProtectionLevels { hpl, vpl },
                attempts: Default::default(),
            };
            let evaluator = PointEvaluator::new(&cfg, &selector, &solver);
            let mut state = selector.initial_state();
            let verdict = evaluator.evaluate(t, &position, &mut state, &tracker);
            assert_eq!(verdict.status, status);
            assert_eq!(verdict.source, Some(geo(23)));
            assert_eq!(verdict.level, Some(AssuranceLevel::PA));
            assert_eq!(verdict.hpl(), Some(hpl));
            assert_eq!(verdict.vpl(), Some(vpl));
        }
    }

    #[test]
    fn degraded_verdict_has_no_protection_levels() {
        let cfg = Config::default();
        let t = Epoch::from_str("2020-06-25T00:00:00 GPST").unwrap();
        let tracker = setup(&[geo(23)], t);
        let selector = SourceSelector::new(&cfg);
        let solver = BlindSolver {
            blind: vec![],
            protection: Default::default(),
            attempts: Default::default(),
        };
        let evaluator = PointEvaluator::new(&cfg, &selector, &solver);
        let mut state = selector.initial_state();

        let later = t + Duration::from_seconds(3600.0);
        let verdict = evaluator.evaluate(later, &Default::default(), &mut state, &tracker);

        assert_eq!(verdict.status, VerdictStatus::Degraded);
        assert!(!verdict.is_available());
        assert!(verdict.protection.is_none());
        assert!(solver.attempts.borrow().is_empty());
    }

    #[test]
    fn insufficient_geometry_retry() {
        init_logger();
        let cfg = Config::default();
        let t = Epoch::from_str("2020-06-25T00:00:00 GPST").unwrap();
        let tracker = setup(&[geo(23), geo(36)], t);
        let selector = SourceSelector::new(&cfg);
        let solver = BlindSolver {
            blind: vec![geo(23)],
            protection: ProtectionLevels {
                hpl: 10.0,
                vpl: 10.0,
            },
            attempts: Default::default(),
        };
        let evaluator = PointEvaluator::new(&cfg, &selector, &solver);
        let mut state = selector.initial_state();

        let verdict = evaluator.evaluate(t, &Default::default(), &mut state, &tracker);
        assert!(verdict.is_available());
        assert_eq!(verdict.source, Some(geo(36)));
        assert_eq!(*solver.attempts.borrow(), vec![geo(23), geo(36)]);
        assert_eq!(state.switches_this_epoch(), 1);
    }

    #[test]
    fn retry_is_bounded() {
        let mut cfg = Config::default();
        cfg.switching.max_switches_per_epoch = 1;

        let t = Epoch::from_str("2020-06-25T00:00:00 GPST").unwrap();
        let tracker = setup(&[geo(23), geo(36), geo(24)], t);
        let selector = SourceSelector::new(&cfg);
        let solver = BlindSolver {
            blind: vec![geo(23), geo(24), geo(36)],
            protection: Default::default(),
            attempts: Default::default(),
        };
        let evaluator = PointEvaluator::new(&cfg, &selector, &solver);
        let mut state = selector.initial_state();

        let verdict = evaluator.evaluate(t, &Default::default(), &mut state, &tracker);
        assert_eq!(verdict.status, VerdictStatus::InsufficientGeometry);
        assert!(verdict.protection.is_none());
        assert_eq!(solver.attempts.borrow().len(), 2);
        assert!(state.switches_this_epoch() <= 1);
    }

    #[test]
    fn coverage_evaluation() {
        let cfg = Config::default();
        let t = Epoch::from_str("2020-06-25T00:00:00 GPST").unwrap();
        let tracker = setup(&[geo(23)], t);
        let selector = SourceSelector::new(&cfg);
        let evaluator = CoverageEvaluator::new(&selector, &NorthernCoverage);
        let mut state = selector.initial_state();

        for (lat, covered) in [(45.0, true), (10.0, false)] {
            let position = Coordinates::new(lat, 0.0, 0.0);
            assert_eq!(
                evaluator.evaluate(t, &position, &mut state, &tracker),
                covered
            );
        }

        let later = t + Duration::from_seconds(3600.0);
        let position = Coordinates::new(45.0, 0.0, 0.0);
        assert!(!evaluator.evaluate(later, &position, &mut state, &tracker));
    }
}
