//! Service availability simulation over a grid
use std::sync::atomic::{AtomicBool, Ordering};

use log::{info, trace, warn};
use rayon::prelude::*;

use crate::{
    error::Error,
    evaluator::{CorrectionCoverage, CoverageEvaluator, IntegritySolver, PointEvaluator},
    grid::{AreaFilter, CoverageCell, GridCell, GridSpec},
    prelude::{Config, Coordinates, Duration, Epoch, SourceSelector, ValidityTracker},
    validity::MessageEvent,
};

mod report;
pub use report::{HourlyMaps, Map, SimulationReport, NOT_COMPUTED};

/// Coverage grid and its sampling
struct CoverageGrid {
    grid: GridSpec,
    cells: Vec<CoverageCell>,
    step: Duration,
    next: Epoch,
}

/// [Simulation] of the service over a geographic grid and a time span.
/// Each grid cell is an independent receiver with its own [SwitchState](crate::prelude::SwitchState),
/// cells are evaluated in parallel for each epoch, epochs are processed in order.
pub struct Simulation<'a> {
    cfg: Config,
    start: Epoch,
    end: Epoch,
    step: Duration,
    selector: SourceSelector,
    tracker: ValidityTracker,
    /// Messages, in chronological order
    events: Vec<MessageEvent>,
    next_event: usize,
    solver: &'a (dyn IntegritySolver + Sync),
    coverage: Option<&'a (dyn CorrectionCoverage + Sync)>,
    grid: GridSpec,
    cells: Vec<GridCell>,
    coverage_grid: Option<CoverageGrid>,
    /// Flushed hourly maps
    hourly: Vec<HourlyMaps>,
    hour: u32,
    /// Next epoch to process
    next: Epoch,
    /// Latest processed epoch
    last: Option<Epoch>,
    epochs: usize,
}

impl<'a> Simulation<'a> {
    /// Builds a new [Simulation].
    /// ## Inputs
    /// - cfg: [Config], verified here
    /// - start: first simulated [Epoch]
    /// - events: decoded [MessageEvent]s, in any order
    /// - solver: [IntegritySolver] that computes the protection levels
    pub fn new(
        cfg: &Config,
        start: Epoch,
        mut events: Vec<MessageEvent>,
        solver: &'a (dyn IntegritySolver + Sync),
    ) -> Result<Self, Error> {
        cfg.validate()?;

        // stable: simultaneous messages keep their order
        events.sort_by(|a, b| a.t().cmp(&b.t()));

        let selector = SourceSelector::new(cfg);
        let filter = AreaFilter::from_opts(&cfg.grid);
        let grid = GridSpec::new(&cfg.grid.bounds(), cfg.grid.lat_step, cfg.grid.lon_step);

        let cells = grid
            .filtered_indexes(&filter)
            .map(|(i, j)| {
                let position =
                    Coordinates::new(grid.latitude(i), grid.longitude(j), cfg.grid.altitude);
                GridCell::new(cfg, i, j, position, selector.initial_state())
            })
            .collect::<Vec<_>>();

        if cells.is_empty() {
            warn!("no grid cell to process");
        }

        info!(
            "{} - {} grid cells ({}x{}) selected for processing",
            start,
            cells.len(),
            grid.n_lat,
            grid.n_lon
        );

        Ok(Self {
            start,
            end: start + Duration::from_seconds(cfg.grid.duration),
            step: Duration::from_seconds(cfg.grid.time_step),
            tracker: ValidityTracker::new(cfg),
            cfg: cfg.clone(),
            selector,
            events,
            next_event: 0,
            solver,
            coverage: None,
            grid,
            cells,
            coverage_grid: None,
            hourly: Vec::new(),
            hour: 0,
            next: start,
            last: None,
            epochs: 0,
        })
    }

    /// Enables the correction coverage map, using this [CorrectionCoverage] provider.
    /// Has no effect when [Config] does not define the coverage options.
    pub fn with_coverage(mut self, coverage: &'a (dyn CorrectionCoverage + Sync)) -> Self {
        let opts = match &self.cfg.coverage {
            Some(opts) => opts.clone(),
            None => {
                warn!("coverage options not defined: coverage map disabled");
                return self;
            },
        };

        let filter = AreaFilter::from_opts(&self.cfg.grid);
        let grid = GridSpec::new(&self.cfg.grid.bounds(), opts.lat_step, opts.lon_step);
        let cells = grid
            .filtered_indexes(&filter)
            .map(|(i, j)| {
                let position = Coordinates::new(
                    grid.latitude(i),
                    grid.longitude(j),
                    self.cfg.grid.altitude,
                );
                CoverageCell::new(i, j, position, self.selector.initial_state())
            })
            .collect::<Vec<_>>();

        info!("{} coverage cells selected for processing", cells.len());

        self.coverage = Some(coverage);
        self.coverage_grid = Some(CoverageGrid {
            grid,
            cells,
            step: Duration::from_seconds(opts.time_step),
            next: self.start,
        });
        self
    }

    pub fn cells(&self) -> &[GridCell] {
        &self.cells
    }

    pub fn tracker(&self) -> &ValidityTracker {
        &self.tracker
    }

    /// True once the whole time span was processed
    pub fn is_complete(&self) -> bool {
        self.next >= self.end
    }

    /// Latest processed [Epoch]
    pub fn last_epoch(&self) -> Option<Epoch> {
        self.last
    }

    fn hour_of(&self, t: Epoch) -> u32 {
        ((t - self.start).to_seconds() / 3600.0).floor() as u32
    }

    /// Ingests all messages up to `t` (included)
    fn ingest(&mut self, t: Epoch) {
        while let Some(event) = self.events.get(self.next_event) {
            if event.t() > t {
                break;
            }
            trace!("{} ingesting {:?}", t, event);
            self.tracker.ingest(event);
            self.next_event += 1;
        }
        self.tracker.new_epoch(t);
    }

    fn hourly_maps(&self, hour: u32) -> HourlyMaps {
        let mut availability = Map::new(self.grid);
        let mut continuity_risk = Map::new(self.grid);
        for cell in self.cells.iter() {
            availability.set(cell.lat_index, cell.lon_index, cell.hourly.availability());
            continuity_risk.set(cell.lat_index, cell.lon_index, cell.hourly.max_risk);
        }
        HourlyMaps {
            hour,
            availability,
            continuity_risk,
        }
    }

    fn flush_hour(&mut self) {
        let maps = self.hourly_maps(self.hour);
        self.hourly.push(maps);
        for cell in self.cells.iter_mut() {
            cell.hourly = Default::default();
        }
    }

    /// Processes the next epoch. Returns false once the time span is complete.
    pub fn step(&mut self) -> bool {
        if self.is_complete() {
            return false;
        }

        let t = self.next;

        if self.cfg.grid.hourly_maps {
            let hour = self.hour_of(t);
            if hour != self.hour {
                self.flush_hour();
                self.hour = hour;
            }
        }

        self.ingest(t);

        let hourly = self.cfg.grid.hourly_maps;
        let tracker = &self.tracker;
        let evaluator = PointEvaluator::new(&self.cfg, &self.selector, self.solver);

        self.cells.par_iter_mut().for_each(|cell| {
            let verdict = evaluator.evaluate(t, &cell.position, &mut cell.state, tracker);
            let available = verdict.is_available();
            cell.epochs += 1;
            if available {
                cell.available += 1;
            }
            let risk = cell.continuity.record(&verdict);
            if hourly {
                cell.hourly.update(available, risk);
            }
        });

        if let (Some(coverage), Some(coverage_grid)) = (self.coverage, &mut self.coverage_grid) {
            if t >= coverage_grid.next {
                let evaluator = CoverageEvaluator::new(&self.selector, coverage);
                coverage_grid.cells.par_iter_mut().for_each(|cell| {
                    cell.epochs += 1;
                    if evaluator.evaluate(t, &cell.position, &mut cell.state, tracker) {
                        cell.covered += 1;
                    }
                });
                while coverage_grid.next <= t {
                    coverage_grid.next += coverage_grid.step;
                }
            }
        }

        self.last = Some(t);
        self.next = t + self.step;
        self.epochs += 1;
        true
    }

    /// Runs the simulation until completion, or until `abort` is raised.
    /// The abort flag is only checked between epochs.
    pub fn run(&mut self, abort: &AtomicBool) -> SimulationReport {
        while !abort.load(Ordering::Relaxed) {
            if !self.step() {
                break;
            }
        }
        if !self.is_complete() {
            warn!("simulation aborted after {} epochs", self.epochs);
        }
        self.report()
    }

    /// Instant at which pending discontinuities are closed:
    /// end of time span once complete, latest processed epoch otherwise.
    fn closing_epoch(&self) -> Epoch {
        if self.is_complete() {
            self.end
        } else {
            self.last.unwrap_or(self.start)
        }
    }

    /// Builds the [SimulationReport] of what has been processed so far.
    /// Pending discontinuities are reported as ending at the closing epoch.
    pub fn report(&self) -> SimulationReport {
        let closing = self.closing_epoch();

        let mut availability = Map::new(self.grid);
        let mut continuity_risk = Map::new(self.grid);
        let mut switches = Map::new(self.grid);
        let mut discontinuities = Vec::new();

        for cell in self.cells.iter() {
            let (i, j) = (cell.lat_index, cell.lon_index);
            availability.set(i, j, cell.availability());
            continuity_risk.set(i, j, cell.continuity.max_risk());
            if cell.epochs > 0 {
                switches.set(i, j, Some(cell.state.total_switches() as f64));
            }
            discontinuities.extend_from_slice(cell.continuity.events());
            if let Some(pending) = cell.continuity.pending_event(closing) {
                discontinuities.push(pending);
            }
        }

        let coverage = self.coverage_grid.as_ref().map(|coverage_grid| {
            let mut map = Map::new(coverage_grid.grid);
            for cell in coverage_grid.cells.iter() {
                map.set(cell.lat_index, cell.lon_index, cell.coverage());
            }
            map
        });

        let mut hourly = self.hourly.clone();
        if self.cfg.grid.hourly_maps && self.last.is_some() {
            hourly.push(self.hourly_maps(self.hour));
        }

        SimulationReport {
            epochs: self.epochs,
            complete: self.is_complete(),
            availability,
            continuity_risk,
            switches,
            coverage,
            hourly,
            discontinuities,
        }
    }

    /// Terminates the [Simulation]: pending discontinuities are finalized.
    pub fn finish(mut self) -> SimulationReport {
        let closing = self.closing_epoch();
        for cell in self.cells.iter_mut() {
            cell.continuity.finalize(closing);
        }
        self.report()
    }
}
