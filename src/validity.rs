//! Correction validity tracking
use std::collections::{BTreeMap, HashMap};

use log::{debug, trace};

use crate::prelude::{AssuranceLevel, Config, Duration, Epoch, MessageClass, SV};

/// Decoded message fact, as provided by the message reader.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum MessageEvent {
    /// Valid reception of a [MessageClass], usable at this [AssuranceLevel]
    Reception {
        t: Epoch,
        source: SV,
        class: MessageClass,
        level: AssuranceLevel,
    },
    /// "Do not use" alarm (MT0): all data previously received
    /// from this GEO must be discarded.
    Alarm { t: Epoch, source: SV },
}

impl MessageEvent {
    /// Builds the [MessageEvent::Reception]s of a message valid in both PA and NPA
    pub fn receptions(t: Epoch, source: SV, class: MessageClass) -> [Self; 2] {
        [AssuranceLevel::PA, AssuranceLevel::NPA].map(|level| Self::Reception {
            t,
            source,
            class,
            level,
        })
    }

    pub fn t(&self) -> Epoch {
        match self {
            Self::Reception { t, .. } | Self::Alarm { t, .. } => *t,
        }
    }

    pub fn source(&self) -> SV {
        match self {
            Self::Reception { source, .. } | Self::Alarm { source, .. } => *source,
        }
    }
}

/// Last valid reception [Epoch] per (GEO, class, level).
/// A missing entry means we never received this message.
#[derive(Debug, Clone, Default)]
pub struct ValidityTable {
    inner: BTreeMap<(SV, MessageClass, AssuranceLevel), Epoch>,
}

impl ValidityTable {
    /// Updates the table. Returns false when the reception is older
    /// than what we already have (dropped).
    pub fn update(
        &mut self,
        source: SV,
        class: MessageClass,
        level: AssuranceLevel,
        t: Epoch,
    ) -> bool {
        let entry = self.inner.entry((source, class, level)).or_insert(t);
        if t < *entry {
            false
        } else {
            *entry = t;
            true
        }
    }

    pub fn last_valid(
        &self,
        source: SV,
        class: MessageClass,
        level: AssuranceLevel,
    ) -> Option<Epoch> {
        self.inner.get(&(source, class, level)).copied()
    }
}

/// [ValidityTracker] answers whether a GEO broadcasts valid corrections
/// for a given [AssuranceLevel], at a given instant.
#[derive(Debug, Clone)]
pub struct ValidityTracker {
    table: ValidityTable,
    /// Resolved timeouts
    timeouts: HashMap<(MessageClass, AssuranceLevel), Duration>,
    /// Classes disabled by the operator
    disabled: Vec<MessageClass>,
    /// GEOs, in order of appearance
    sources: Vec<SV>,
    /// Latest alarm, per GEO
    alarms: BTreeMap<SV, Epoch>,
    /// Start of the ongoing continuous usability period
    usable_since: BTreeMap<(SV, AssuranceLevel), Epoch>,
}

impl ValidityTracker {
    pub fn new(cfg: &Config) -> Self {
        Self {
            table: ValidityTable::default(),
            timeouts: cfg.timeout_table(),
            disabled: cfg.disabled_classes.clone(),
            sources: Vec::with_capacity(4),
            alarms: BTreeMap::new(),
            usable_since: BTreeMap::new(),
        }
    }

    fn observe(&mut self, source: SV) {
        if !self.sources.contains(&source) {
            debug!("{} new GEO", source);
            self.sources.push(source);
        }
    }

    /// Known GEOs, in order of appearance
    pub fn sources(&self) -> &[SV] {
        &self.sources
    }

    /// First GEO we heard from
    pub fn first_seen(&self) -> Option<SV> {
        self.sources.first().copied()
    }

    /// Ingests a [MessageEvent]
    pub fn ingest(&mut self, event: &MessageEvent) {
        match *event {
            MessageEvent::Reception {
                t,
                source,
                class,
                level,
            } => self.record_reception(source, class, level, t),
            MessageEvent::Alarm { t, source } => self.record_alarm(source, t),
        }
    }

    /// Stores a valid reception
    pub fn record_reception(
        &mut self,
        source: SV,
        class: MessageClass,
        level: AssuranceLevel,
        t: Epoch,
    ) {
        self.observe(source);
        if !self.table.update(source, class, level, t) {
            trace!("{} ({}) {} out of order reception dropped", t, source, class);
        }
    }

    /// Stores an alarm: everything received up to this instant is invalidated
    pub fn record_alarm(&mut self, source: SV, t: Epoch) {
        self.observe(source);
        debug!("{} ({}) alarm", t, source);
        let latest = self.alarms.entry(source).or_insert(t);
        if t > *latest {
            *latest = t;
        }
    }

    /// Timeout interval of this class, at this level
    pub fn timeout(&self, class: MessageClass, level: AssuranceLevel) -> Duration {
        self.timeouts
            .get(&(class, level))
            .copied()
            .unwrap_or_else(|| class.default_timeout(level))
    }

    pub fn last_valid(
        &self,
        source: SV,
        class: MessageClass,
        level: AssuranceLevel,
    ) -> Option<Epoch> {
        self.table.last_valid(source, class, level)
    }

    /// True if this message was never received or last received more than `threshold` ago
    pub fn is_timed_out(
        &self,
        source: SV,
        class: MessageClass,
        level: AssuranceLevel,
        t: Epoch,
        threshold: Duration,
    ) -> bool {
        match self.table.last_valid(source, class, level) {
            Some(last) => t - last > threshold,
            None => true,
        }
    }

    /// Remaining time until this message times out.
    /// None when it is already timed out.
    pub fn time_to_timeout(
        &self,
        source: SV,
        class: MessageClass,
        level: AssuranceLevel,
        t: Epoch,
    ) -> Option<Duration> {
        let threshold = self.timeout(class, level);
        let last = self.table.last_valid(source, class, level)?;
        let remaining = threshold - (t - last);
        if remaining < Duration::ZERO {
            None
        } else {
            Some(remaining)
        }
    }

    /// True if every mandatory class is valid at `t`
    pub fn is_source_usable(&self, source: SV, level: AssuranceLevel, t: Epoch) -> bool {
        let alarm = self.alarms.get(&source);
        MessageClass::mandatory(level)
            .filter(|class| !self.disabled.contains(class))
            .all(|class| {
                let threshold = self.timeout(class, level);
                if self.is_timed_out(source, class, level, t, threshold) {
                    return false;
                }
                match (alarm, self.table.last_valid(source, class, level)) {
                    (Some(alarm), Some(last)) => last > *alarm,
                    _ => true,
                }
            })
    }

    /// Updates the continuous usability periods. Call once per epoch,
    /// after message ingestion and before any selection.
    pub fn new_epoch(&mut self, t: Epoch) {
        for source in self.sources.iter() {
            for level in [AssuranceLevel::PA, AssuranceLevel::NPA] {
                if self.is_source_usable(*source, level, t) {
                    self.usable_since.entry((*source, level)).or_insert(t);
                } else if self.usable_since.remove(&(*source, level)).is_some() {
                    debug!("{} ({}) lost {} usability", t, source, level);
                }
            }
        }
    }

    /// True if this GEO has been continuously usable for at least `acquisition`.
    /// Always true when `acquisition` is null.
    pub fn is_acquired(
        &self,
        source: SV,
        level: AssuranceLevel,
        t: Epoch,
        acquisition: Duration,
    ) -> bool {
        if acquisition <= Duration::ZERO {
            return true;
        }
        match self.usable_since.get(&(source, level)) {
            Some(since) => t - *since >= acquisition,
            None => false,
        }
    }
}
