use log::debug;

use crate::{
    cfg::SwitchingOpts,
    prelude::{AssuranceLevel, Duration, Epoch, SV},
};

/// [SwitchState] of one receiver (one grid cell).
/// It persists across epochs, the switch counter is reset on every new epoch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SwitchState {
    /// Active GEO, None until we heard from at least one GEO
    pub(crate) active_source: Option<SV>,
    /// Active navigation mode
    pub(crate) active_level: AssuranceLevel,
    /// GEO selected at initialization
    pub(crate) initial_source: Option<SV>,
    /// Navigation mode at initialization
    pub(crate) initial_level: AssuranceLevel,
    /// GEO that was active prior the latest GEO switch
    pub(crate) previous_source: Option<SV>,
    /// Latest switch
    pub(crate) last_switch_time: Option<Epoch>,
    /// Switches performed during the ongoing epoch
    pub(crate) switches_this_epoch: usize,
    /// Ongoing epoch
    pub(crate) epoch: Option<Epoch>,
    /// Total number of switches
    pub(crate) total_switches: usize,
}

impl SwitchState {
    /// Creates a new [SwitchState] starting in this [AssuranceLevel]
    pub fn new(level: AssuranceLevel) -> Self {
        Self {
            active_level: level,
            initial_level: level,
            ..Default::default()
        }
    }

    /// Creates a new [SwitchState] with a known initial GEO
    pub fn with_initial_source(level: AssuranceLevel, source: SV) -> Self {
        let mut s = Self::new(level);
        s.active_source = Some(source);
        s.initial_source = Some(source);
        s
    }

    pub fn active_source(&self) -> Option<SV> {
        self.active_source
    }

    pub fn active_level(&self) -> AssuranceLevel {
        self.active_level
    }

    pub fn initial_source(&self) -> Option<SV> {
        self.initial_source
    }

    pub fn previous_source(&self) -> Option<SV> {
        self.previous_source
    }

    pub fn last_switch_time(&self) -> Option<Epoch> {
        self.last_switch_time
    }

    pub fn switches_this_epoch(&self) -> usize {
        self.switches_this_epoch
    }

    pub fn total_switches(&self) -> usize {
        self.total_switches
    }

    /// Resets the epoch counter when `t` is a new epoch
    pub(crate) fn begin_epoch(&mut self, t: Epoch) {
        if self.epoch != Some(t) {
            self.epoch = Some(t);
            self.switches_this_epoch = 0;
        }
    }

    /// True if a switch is permitted at `t`
    pub(crate) fn can_switch(&self, t: Epoch, opts: &SwitchingOpts) -> bool {
        if self.switches_this_epoch >= opts.max_switches_per_epoch {
            return false;
        }
        let min_switch = opts.minimum_switch_duration();
        if min_switch <= Duration::ZERO {
            return true;
        }
        match self.last_switch_time {
            Some(last) => t - last >= min_switch,
            None => true,
        }
    }

    pub(crate) fn initialize(&mut self, source: SV) {
        self.active_source = Some(source);
        self.initial_source = Some(source);
    }

    pub(crate) fn switch(&mut self, t: Epoch, source: SV, level: AssuranceLevel) {
        debug!(
            "{} switch {:?}({}) -> {}({})",
            t, self.active_source, self.active_level, source, level
        );
        if self.active_source != Some(source) {
            self.previous_source = self.active_source;
        }
        self.active_source = Some(source);
        self.active_level = level;
        self.last_switch_time = Some(t);
        self.switches_this_epoch += 1;
        self.total_switches += 1;
    }
}

#[cfg(test)]
mod test {
    use super::SwitchState;
    use crate::{
        cfg::SwitchingOpts,
        prelude::{AssuranceLevel, Constellation, Duration, Epoch, SV},
    };
    use std::str::FromStr;

    #[test]
    fn switch_bookkeeping() {
        let t = Epoch::from_str("2020-06-25T00:00:00 GPST").unwrap();
        let g23 = SV::new(Constellation::SBAS, 23);
        let g36 = SV::new(Constellation::SBAS, 36);

        let mut state = SwitchState::with_initial_source(AssuranceLevel::PA, g23);
        state.begin_epoch(t);
        state.switch(t, g36, AssuranceLevel::PA);

        assert_eq!(state.active_source(), Some(g36));
        assert_eq!(state.previous_source(), Some(g23));
        assert_eq!(state.initial_source(), Some(g23));
        assert_eq!(state.switches_this_epoch(), 1);
        assert_eq!(state.last_switch_time(), Some(t));

        // mode switch only: previous GEO is preserved
        state.switch(t, g36, AssuranceLevel::NPA);
        assert_eq!(state.previous_source(), Some(g23));
        assert_eq!(state.switches_this_epoch(), 2);
        assert_eq!(state.total_switches(), 2);

        // same epoch: counter preserved
        state.begin_epoch(t);
        assert_eq!(state.switches_this_epoch(), 2);

        state.begin_epoch(t + Duration::from_seconds(1.0));
        assert_eq!(state.switches_this_epoch(), 0);
        assert_eq!(state.total_switches(), 2);
    }

    #[test]
    fn switch_permissions() {
        let t = Epoch::from_str("2020-06-25T00:00:00 GPST").unwrap();
        let g23 = SV::new(Constellation::SBAS, 23);
        let g36 = SV::new(Constellation::SBAS, 36);

        let mut opts = SwitchingOpts::default();
        opts.minimum_switch_time = 30.0;
        opts.max_switches_per_epoch = 2;

        let mut state = SwitchState::with_initial_source(AssuranceLevel::PA, g23);
        state.begin_epoch(t);
        assert!(state.can_switch(t, &opts));
        state.switch(t, g36, AssuranceLevel::PA);
        assert!(!state.can_switch(t, &opts));

        let t29 = t + Duration::from_seconds(29.0);
        state.begin_epoch(t29);
        assert!(!state.can_switch(t29, &opts));

        let t30 = t + Duration::from_seconds(30.0);
        state.begin_epoch(t30);
        assert!(state.can_switch(t30, &opts));

        // null minimum switch time: bounded by max switches per epoch
        opts.minimum_switch_time = 0.0;
        state.switch(t30, g23, AssuranceLevel::PA);
        assert!(state.can_switch(t30, &opts));
        state.switch(t30, g36, AssuranceLevel::PA);
        assert!(!state.can_switch(t30, &opts));
    }
}
