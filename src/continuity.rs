//! Continuity risk and discontinuity events
use std::collections::VecDeque;

use log::debug;

use crate::prelude::{AvailabilityVerdict, Coordinates, Duration, Epoch};

/// Fixed capacity history of availability outcomes, oldest first.
#[derive(Debug, Clone, PartialEq)]
pub struct SlidingWindow {
    capacity: usize,
    inner: VecDeque<bool>,
}

impl SlidingWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            inner: VecDeque::with_capacity(capacity),
        }
    }

    /// Pushes a new outcome, evicting the oldest one once full.
    /// A null capacity window retains nothing.
    pub fn push(&mut self, available: bool) {
        if self.capacity == 0 {
            return;
        }
        if self.inner.len() == self.capacity {
            self.inner.pop_front();
        }
        self.inner.push_back(available);
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.inner.len() == self.capacity
    }

    /// Number of unavailable outcomes within the window
    pub fn failures(&self) -> usize {
        self.inner.iter().filter(|available| !**available).count()
    }

    /// Windowed discontinuity probability, only defined once the window is full
    pub fn risk(&self) -> Option<f64> {
        if self.is_full() && self.capacity > 0 {
            Some(self.failures() as f64 / self.capacity as f64)
        } else {
            None
        }
    }
}

/// Loss of service, from the first unavailable epoch to the first available one.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DiscontinuityEvent {
    pub position: Coordinates,
    pub start_time: Epoch,
    pub end_time: Epoch,
    /// end_time - start_time
    pub duration: Duration,
    /// Duration of the available period that preceded this event
    pub preceding_stable_duration: Duration,
}

/// [ContinuityTracker] of one grid cell
#[derive(Debug, Clone)]
pub struct ContinuityTracker {
    position: Coordinates,
    window: SlidingWindow,
    /// Latest outcome
    last_state: Option<bool>,
    /// Latest unavailable to available transition
    available_since: Option<Epoch>,
    /// Ongoing event: (start, preceding stable duration)
    pending: Option<(Epoch, Duration)>,
    /// Finalized events
    events: Vec<DiscontinuityEvent>,
    /// Worst windowed risk so far
    max_risk: Option<f64>,
}

impl ContinuityTracker {
    pub fn new(position: Coordinates, window_size: usize) -> Self {
        Self {
            position,
            window: SlidingWindow::new(window_size),
            last_state: None,
            available_since: None,
            pending: None,
            events: Vec::new(),
            max_risk: None,
        }
    }

    /// Accumulates a new [AvailabilityVerdict].
    /// Returns the windowed risk, once defined.
    pub fn record(&mut self, verdict: &AvailabilityVerdict) -> Option<f64> {
        let t = verdict.t;
        let available = verdict.is_available();

        self.window.push(available);

        match (self.last_state, available) {
            (None, true) | (Some(false), true) => {
                if let Some((start, preceding)) = self.pending.take() {
                    self.close(start, t, preceding);
                }
                self.available_since = Some(t);
            },
            (Some(true), false) => {
                let preceding = match self.available_since {
                    Some(since) => t - since,
                    None => Duration::ZERO,
                };
                self.pending = Some((t, preceding));
            },
            _ => {},
        }

        self.last_state = Some(available);

        let risk = self.window.risk();
        if let Some(risk) = risk {
            self.max_risk = Some(self.max_risk.map_or(risk, |max| max.max(risk)));
        }
        risk
    }

    fn close(&mut self, start: Epoch, end: Epoch, preceding: Duration) {
        let event = DiscontinuityEvent {
            position: self.position,
            start_time: start,
            end_time: end,
            duration: end - start,
            preceding_stable_duration: preceding,
        };
        debug!(
            "{} discontinuity at ({:.2}°, {:.2}°): {}",
            start, self.position.latitude_deg, self.position.longitude_deg, event.duration
        );
        self.events.push(event);
    }

    /// Closes the ongoing event, if any (end of simulation)
    pub fn finalize(&mut self, t: Epoch) {
        if let Some((start, preceding)) = self.pending.take() {
            self.close(start, t, preceding);
        }
    }

    /// Ongoing event, as if it were to end at `t`
    pub fn pending_event(&self, t: Epoch) -> Option<DiscontinuityEvent> {
        let (start, preceding) = self.pending?;
        Some(DiscontinuityEvent {
            position: self.position,
            start_time: start,
            end_time: t,
            duration: t - start,
            preceding_stable_duration: preceding,
        })
    }

    pub fn window(&self) -> &SlidingWindow {
        &self.window
    }

    /// Current windowed risk
    pub fn risk(&self) -> Option<f64> {
        self.window.risk()
    }

    /// Worst windowed risk so far
    pub fn max_risk(&self) -> Option<f64> {
        self.max_risk
    }

    pub fn events(&self) -> &[DiscontinuityEvent] {
        &self.events
    }
}
