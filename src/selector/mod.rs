//! GEO and navigation mode selection
use log::debug;

use crate::{
    cfg::{SwitchPolicy, SwitchingOpts},
    prelude::{AssuranceLevel, Config, Epoch, ValidityTracker, SV},
};

mod state;
pub use state::SwitchState;

/// Outcome of one selection
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SelectionResult {
    /// Navigate using this GEO, at this level
    Selected(SV, AssuranceLevel),
    /// No GEO may be used at any permitted level
    Degraded,
}

impl SelectionResult {
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded)
    }
}

/// [SourceSelector] is the GEO / mode switching state machine.
/// It holds no receiver state: each receiver owns its [SwitchState],
/// so one [SourceSelector] may serve many receivers.
///
/// A degraded navigation mode is left as soon as the initial mode is recovered,
/// whatever the policy.
///
/// Among usable candidates, the ranking is:
/// 1. policy preference (initial GEO in fallback, active GEO in maintain)
/// 2. GEOs that completed their acquisition period
/// 3. without policy, GEOs other than the previously active one
/// 4. ascending GEO identity
#[derive(Debug, Clone)]
pub struct SourceSelector {
    opts: SwitchingOpts,
    policy: SwitchPolicy,
    preferred: Option<SV>,
    excluded: Vec<SV>,
}

impl SourceSelector {
    pub fn new(cfg: &Config) -> Self {
        Self {
            opts: cfg.switching.clone(),
            policy: cfg.switching.policy(),
            preferred: cfg.preferred_source,
            excluded: cfg.excluded_sources.clone(),
        }
    }

    /// Creates a fresh [SwitchState] for a new receiver
    pub fn initial_state(&self) -> SwitchState {
        SwitchState::new(self.opts.initial_level())
    }

    pub fn policy(&self) -> SwitchPolicy {
        self.policy
    }

    fn is_excluded(&self, source: SV, excluded: &[SV]) -> bool {
        self.excluded.contains(&source) || excluded.contains(&source)
    }

    /// Picks the initial GEO: user preference, otherwise first GEO we heard from.
    fn bootstrap(&self, state: &mut SwitchState, tracker: &ValidityTracker) -> Option<SV> {
        let source = self
            .preferred
            .filter(|sv| !self.excluded.contains(sv))
            .or_else(|| {
                tracker
                    .sources()
                    .iter()
                    .find(|sv| !self.excluded.contains(sv))
                    .copied()
            })?;
        debug!("initial GEO {}({})", source, state.active_level);
        state.initialize(source);
        Some(source)
    }

    /// Runs the state machine once for epoch `t`.
    /// `excluded` lists GEOs that must not be used during this epoch
    /// (retry after a failed navigation attempt).
    pub fn select(
        &self,
        state: &mut SwitchState,
        tracker: &ValidityTracker,
        t: Epoch,
        excluded: &[SV],
    ) -> SelectionResult {
        state.begin_epoch(t);

        let current = match state.active_source {
            Some(source) => source,
            None => match self.bootstrap(state, tracker) {
                Some(source) => source,
                None => return SelectionResult::Degraded,
            },
        };

        let level = state.active_level;

        let usable =
            !self.is_excluded(current, excluded) && tracker.is_source_usable(current, level, t);

        if usable {
            if state.can_switch(t, &self.opts) {
                let target = match self.policy {
                    SwitchPolicy::Fallback => self
                        .fallback_target(state, tracker, t, excluded)
                        .or_else(|| self.level_recovery(state, tracker, t, excluded)),
                    _ => self.level_recovery(state, tracker, t, excluded),
                };
                if let Some((source, level)) = target {
                    state.switch(t, source, level);
                    return SelectionResult::Selected(source, level);
                }
            }
            return SelectionResult::Selected(current, level);
        }

        if !state.can_switch(t, &self.opts) {
            debug!("{} {}({}) unusable: switch not permitted", t, current, level);
            return SelectionResult::Degraded;
        }

        // GEO switch first, to preserve the navigation mode
        if self.opts.geo_switching {
            if let Some(source) = self.best_candidate(state, tracker, t, level, excluded, false) {
                state.switch(t, source, level);
                return SelectionResult::Selected(source, level);
            }
        }

        if self.opts.level_switching_allowed() {
            let mut lower = level;
            while let Some(degraded) = lower.degraded() {
                lower = degraded;
                if let Some(source) = self.best_candidate(state, tracker, t, lower, excluded, true)
                {
                    state.switch(t, source, lower);
                    return SelectionResult::Selected(source, lower);
                }
            }
        }

        debug!("{} no usable GEO", t);
        SelectionResult::Degraded
    }

    /// Fallback target, when we're not operating on the initial (GEO, level) pair.
    /// Level recovery is attempted first.
    fn fallback_target(
        &self,
        state: &SwitchState,
        tracker: &ValidityTracker,
        t: Epoch,
        excluded: &[SV],
    ) -> Option<(SV, AssuranceLevel)> {
        let initial = state.initial_source?;
        if self.is_excluded(initial, excluded) {
            return None;
        }

        let active = (state.active_source?, state.active_level);
        let acquisition = self.opts.acquisition_duration();

        [state.initial_level, state.active_level]
            .into_iter()
            .filter(|level| *level <= state.active_level)
            .map(|level| (initial, level))
            .filter(|target| *target != active)
            .find(|(source, level)| {
                tracker.is_source_usable(*source, *level, t)
                    && tracker.is_acquired(*source, *level, t, acquisition)
            })
    }

    /// Return to the initial level, after a mode switch.
    /// The active GEO is preferred, other candidates are ranked as usual.
    /// The target must have completed its acquisition period.
    fn level_recovery(
        &self,
        state: &SwitchState,
        tracker: &ValidityTracker,
        t: Epoch,
        excluded: &[SV],
    ) -> Option<(SV, AssuranceLevel)> {
        let level = state.initial_level;
        if state.active_level <= level {
            return None;
        }

        let acquisition = self.opts.acquisition_duration();
        let recoverable = |source: SV| {
            !self.is_excluded(source, excluded)
                && tracker.is_source_usable(source, level, t)
                && tracker.is_acquired(source, level, t, acquisition)
        };

        let source = state
            .active_source
            .filter(|active| recoverable(*active))
            .or_else(|| {
                self.best_candidate(state, tracker, t, level, excluded, false)
                    .filter(|candidate| recoverable(*candidate))
            })?;

        debug!("{} {}({}) recovered", t, source, level);
        Some((source, level))
    }

    /// Best usable candidate at this level, if any.
    fn best_candidate(
        &self,
        state: &SwitchState,
        tracker: &ValidityTracker,
        t: Epoch,
        level: AssuranceLevel,
        excluded: &[SV],
        include_active: bool,
    ) -> Option<SV> {
        let active = state.active_source;
        let acquisition = self.opts.acquisition_duration();

        let candidates = tracker
            .sources()
            .iter()
            .copied()
            .filter(|sv| include_active || Some(*sv) != active)
            .filter(|sv| self.opts.geo_switching || Some(*sv) == active)
            .filter(|sv| !self.is_excluded(*sv, excluded))
            .filter(|sv| tracker.is_source_usable(*sv, level, t))
            .collect::<Vec<_>>();

        let alternates = candidates
            .iter()
            .filter(|sv| Some(**sv) != active)
            .count();

        candidates.into_iter().min_by_key(|sv| {
            let preference = match self.policy {
                SwitchPolicy::Fallback => Some(*sv) != state.initial_source,
                SwitchPolicy::Maintain => {
                    !(Some(*sv) == active && active != state.initial_source)
                },
                SwitchPolicy::None => false,
            };
            let acquiring = !tracker.is_acquired(*sv, level, t, acquisition);
            let previous = self.policy == SwitchPolicy::None
                && alternates > 1
                && Some(*sv) == state.previous_source;
            (preference, acquiring, previous, *sv)
        })
    }
}
