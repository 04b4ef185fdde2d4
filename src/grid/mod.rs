//! Service area grid
use crate::{
    cfg::Rectangle,
    prelude::{Config, ContinuityTracker, Coordinates, SwitchState},
};

mod area;
pub use area::AreaFilter;

/// Regular latitude / longitude sampling of a [Rectangle]
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GridSpec {
    pub min_lat: f64,
    pub min_lon: f64,
    pub lat_step: f64,
    pub lon_step: f64,
    pub n_lat: usize,
    pub n_lon: usize,
}

impl GridSpec {
    /// Builds a [GridSpec] covering `bounds`, both bounds included
    /// when they fall on the resolution.
    pub fn new(bounds: &Rectangle, lat_step: f64, lon_step: f64) -> Self {
        let n_lat = ((bounds.max_lat - bounds.min_lat) / lat_step + 1.0E-9).floor() as usize + 1;
        let n_lon = ((bounds.max_lon - bounds.min_lon) / lon_step + 1.0E-9).floor() as usize + 1;
        Self {
            n_lat,
            n_lon,
            lat_step,
            lon_step,
            min_lat: bounds.min_lat,
            min_lon: bounds.min_lon,
        }
    }

    pub fn latitude(&self, lat_index: usize) -> f64 {
        self.min_lat + lat_index as f64 * self.lat_step
    }

    pub fn longitude(&self, lon_index: usize) -> f64 {
        self.min_lon + lon_index as f64 * self.lon_step
    }

    pub fn len(&self) -> usize {
        self.n_lat * self.n_lon
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// (lat_index, lon_index) of the cells that pass the [AreaFilter],
    /// latitude major.
    pub fn filtered_indexes<'a>(
        &'a self,
        filter: &'a AreaFilter,
    ) -> impl Iterator<Item = (usize, usize)> + 'a {
        (0..self.n_lat)
            .flat_map(move |i| (0..self.n_lon).map(move |j| (i, j)))
            .filter(move |(i, j)| filter.accepts(self.latitude(*i), self.longitude(*j)))
    }
}

/// Counters of one hour
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct HourlyBucket {
    pub epochs: u32,
    pub available: u32,
    pub max_risk: Option<f64>,
}

impl HourlyBucket {
    pub(crate) fn update(&mut self, available: bool, risk: Option<f64>) {
        self.epochs += 1;
        if available {
            self.available += 1;
        }
        if let Some(risk) = risk {
            self.max_risk = Some(self.max_risk.map_or(risk, |max| max.max(risk)));
        }
    }

    pub fn availability(&self) -> Option<f64> {
        if self.epochs > 0 {
            Some(self.available as f64 / self.epochs as f64)
        } else {
            None
        }
    }
}

/// [GridCell] of the availability grid: one hypothetical receiver.
#[derive(Debug, Clone)]
pub struct GridCell {
    pub lat_index: usize,
    pub lon_index: usize,
    pub position: Coordinates,
    /// Evaluated epochs
    pub epochs: u32,
    /// Available epochs
    pub available: u32,
    pub(crate) state: SwitchState,
    pub(crate) continuity: ContinuityTracker,
    pub(crate) hourly: HourlyBucket,
}

impl GridCell {
    pub(crate) fn new(
        cfg: &Config,
        lat_index: usize,
        lon_index: usize,
        position: Coordinates,
        state: SwitchState,
    ) -> Self {
        Self {
            lat_index,
            lon_index,
            position,
            state,
            epochs: 0,
            available: 0,
            continuity: ContinuityTracker::new(position, cfg.continuity.window_size),
            hourly: HourlyBucket::default(),
        }
    }

    /// Availability ratio, once at least one epoch was evaluated
    pub fn availability(&self) -> Option<f64> {
        if self.epochs > 0 {
            Some(self.available as f64 / self.epochs as f64)
        } else {
            None
        }
    }

    pub fn switch_state(&self) -> &SwitchState {
        &self.state
    }

    pub fn continuity(&self) -> &ContinuityTracker {
        &self.continuity
    }
}

/// [CoverageCell] of the (reduced) correction coverage grid
#[derive(Debug, Clone)]
pub struct CoverageCell {
    pub lat_index: usize,
    pub lon_index: usize,
    pub position: Coordinates,
    pub epochs: u32,
    pub covered: u32,
    pub(crate) state: SwitchState,
}

impl CoverageCell {
    pub(crate) fn new(
        lat_index: usize,
        lon_index: usize,
        position: Coordinates,
        state: SwitchState,
    ) -> Self {
        Self {
            lat_index,
            lon_index,
            position,
            state,
            epochs: 0,
            covered: 0,
        }
    }

    pub fn coverage(&self) -> Option<f64> {
        if self.epochs > 0 {
            Some(self.covered as f64 / self.epochs as f64)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod test {
    use super::{AreaFilter, GridSpec, HourlyBucket};
    use crate::cfg::Rectangle;

    #[test]
    fn grid_dimensions() {
        let bounds = Rectangle::new(-10.0, 10.0, 40.0, 50.0).unwrap();

        let grid = GridSpec::new(&bounds, 1.0, 2.0);
        assert_eq!(grid.n_lat, 11);
        assert_eq!(grid.n_lon, 11);
        assert_eq!(grid.len(), 121);
        assert_eq!(grid.latitude(10), 50.0);
        assert_eq!(grid.longitude(0), -10.0);
        assert_eq!(grid.longitude(10), 10.0);

        let grid = GridSpec::new(&bounds, 0.1, 3.0);
        assert_eq!(grid.n_lat, 101);
        assert_eq!(grid.n_lon, 7);

        let point = Rectangle::new(0.0, 0.0, 0.0, 0.0).unwrap();
        let grid = GridSpec::new(&point, 1.0, 1.0);
        assert_eq!(grid.len(), 1);
    }

    #[test]
    fn filtered_cells() {
        let bounds = Rectangle::new(0.0, 4.0, 0.0, 4.0).unwrap();
        let grid = GridSpec::new(&bounds, 1.0, 1.0);

        let filter = AreaFilter::new(
            vec![Rectangle::new(0.0, 2.0, 0.0, 2.0).unwrap()],
            vec![Rectangle::new(1.0, 1.0, 1.0, 1.0).unwrap()],
        );

        let cells = grid.filtered_indexes(&filter).collect::<Vec<_>>();
        assert_eq!(cells.len(), 8);
        assert!(!cells.contains(&(1, 1)));
        assert!(!cells.contains(&(3, 0)));
        assert_eq!(cells[0], (0, 0));
    }

    #[test]
    fn hourly_bucket() {
        let mut bucket = HourlyBucket::default();
        assert_eq!(bucket.availability(), None);

        bucket.update(true, None);
        bucket.update(false, Some(0.2));
        bucket.update(true, Some(0.1));
        assert_eq!(bucket.epochs, 3);
        assert_eq!(bucket.availability(), Some(2.0 / 3.0));
        assert_eq!(bucket.max_risk, Some(0.2));
    }
}
