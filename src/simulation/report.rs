use std::io::{Result as IoResult, Write};

use itertools::Itertools;
use nalgebra::DMatrix;

use crate::{continuity::DiscontinuityEvent, grid::GridSpec};

/// Marker of cells that were not computed (filtered out, or undefined statistic)
pub const NOT_COMPUTED: &str = "-";

/// [Map] of one statistic over a [GridSpec], latitude major.
#[derive(Debug, Clone, PartialEq)]
pub struct Map {
    pub grid: GridSpec,
    pub values: DMatrix<Option<f64>>,
}

impl Map {
    pub fn new(grid: GridSpec) -> Self {
        Self {
            values: DMatrix::from_element(grid.n_lat, grid.n_lon, None),
            grid,
        }
    }

    pub fn get(&self, lat_index: usize, lon_index: usize) -> Option<f64> {
        self.values[(lat_index, lon_index)]
    }

    pub(crate) fn set(&mut self, lat_index: usize, lon_index: usize, value: Option<f64>) {
        self.values[(lat_index, lon_index)] = value;
    }

    /// Value at (lat, lon) if it falls on the grid
    pub fn at(&self, lat: f64, lon: f64) -> Option<f64> {
        if !lat.is_finite() || !lon.is_finite() {
            return None;
        }
        let i = ((lat - self.grid.min_lat) / self.grid.lat_step).round();
        let j = ((lon - self.grid.min_lon) / self.grid.lon_step).round();
        if i < 0.0 || j < 0.0 {
            return None;
        }
        let (i, j) = (i as usize, j as usize);
        if i < self.grid.n_lat && j < self.grid.n_lon {
            self.get(i, j)
        } else {
            None
        }
    }

    /// Number of computed cells
    pub fn computed(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }

    /// Ratio of computed cells where value >= threshold
    pub fn fraction_above(&self, threshold: f64) -> Option<f64> {
        let computed = self.computed();
        if computed == 0 {
            return None;
        }
        let above = self.values.iter().flatten().filter(|v| **v >= threshold).count();
        Some(above as f64 / computed as f64)
    }

    /// Writes the [Map] as "latitude longitude value" lines, latitude major.
    pub fn write<W: Write>(&self, w: &mut W) -> IoResult<()> {
        for i in 0..self.grid.n_lat {
            for j in 0..self.grid.n_lon {
                let value = match self.get(i, j) {
                    Some(value) => format!("{:.6}", value),
                    None => NOT_COMPUTED.to_string(),
                };
                writeln!(
                    w,
                    "{:8.3} {:8.3} {}",
                    self.grid.latitude(i),
                    self.grid.longitude(j),
                    value
                )?;
            }
        }
        Ok(())
    }

    /// Writes the [Map] as a matrix: header row of longitudes, then one row per latitude.
    pub fn write_matrix<W: Write>(&self, w: &mut W) -> IoResult<()> {
        let header = (0..self.grid.n_lon)
            .map(|j| format!("{:.3}", self.grid.longitude(j)))
            .join(" ");
        writeln!(w, "lat\\lon {}", header)?;
        for i in 0..self.grid.n_lat {
            let row = (0..self.grid.n_lon)
                .map(|j| match self.get(i, j) {
                    Some(value) => format!("{:.6}", value),
                    None => NOT_COMPUTED.to_string(),
                })
                .join(" ");
            writeln!(w, "{:.3} {}", self.grid.latitude(i), row)?;
        }
        Ok(())
    }
}

/// Maps of one hour
#[derive(Debug, Clone, PartialEq)]
pub struct HourlyMaps {
    /// Hour index, from simulation start
    pub hour: u32,
    pub availability: Map,
    pub continuity_risk: Map,
}

/// [SimulationReport] gathers all simulation outputs
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationReport {
    /// Number of processed epochs
    pub epochs: usize,
    /// True if the whole time span was processed
    pub complete: bool,
    /// Available epochs ratio
    pub availability: Map,
    /// Worst windowed continuity risk
    pub continuity_risk: Map,
    /// GEO / mode switches
    pub switches: Map,
    /// Correction coverage ratio
    pub coverage: Option<Map>,
    pub hourly: Vec<HourlyMaps>,
    /// Discontinuity log, per cell (latitude major) then chronological
    pub discontinuities: Vec<DiscontinuityEvent>,
}

impl SimulationReport {
    /// Ratio of the processed area where availability reaches `target`
    pub fn service_area(&self, target: f64) -> Option<f64> {
        self.availability.fraction_above(target)
    }

    /// Writes the discontinuity log, one event per line:
    /// latitude, longitude, start, end, duration [s], preceding stable duration [s]
    pub fn write_discontinuities<W: Write>(&self, w: &mut W) -> IoResult<()> {
        for event in self.discontinuities.iter() {
            writeln!(
                w,
                "{:8.3} {:8.3} {} {} {:.1} {:.1}",
                event.position.latitude_deg,
                event.position.longitude_deg,
                event.start_time,
                event.end_time,
                event.duration.to_seconds(),
                event.preceding_stable_duration.to_seconds()
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::{Map, NOT_COMPUTED};
    use crate::{cfg::Rectangle, grid::GridSpec};

    fn map() -> Map {
        let bounds = Rectangle::new(0.0, 2.0, 40.0, 41.0).unwrap();
        let mut map = Map::new(GridSpec::new(&bounds, 1.0, 1.0));
        map.set(0, 0, Some(1.0));
        map.set(0, 1, Some(0.5));
        map.set(1, 2, Some(0.99));
        map
    }

    #[test]
    fn map_statistics() {
        let map = map();
        assert_eq!(map.computed(), 3);
        assert_eq!(map.fraction_above(0.99), Some(2.0 / 3.0));
        assert_eq!(map.at(41.0, 2.0), Some(0.99));
        assert_eq!(map.at(41.0, 1.0), None);
        assert_eq!(map.at(39.0, 1.0), None);
        assert_eq!(map.at(50.0, 1.0), None);
        assert_eq!(map.at(f64::NAN, 0.0), None);
        assert_eq!(map.at(40.0, f64::NAN), None);
        assert_eq!(map.at(f64::INFINITY, f64::INFINITY), None);

        let empty = Map::new(map.grid);
        assert_eq!(empty.fraction_above(0.5), None);
    }

    #[test]
    fn map_writers() {
        let map = map();

        let mut buf = Vec::<u8>::new();
        map.write(&mut buf).unwrap();
        let content = String::from_utf8(buf).unwrap();
        let lines = content.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], "  40.000    0.000 1.000000");
        assert!(lines[2].ends_with(NOT_COMPUTED));

        let mut buf = Vec::<u8>::new();
        map.write_matrix(&mut buf).unwrap();
        let content = String::from_utf8(buf).unwrap();
        let lines = content.lines().collect::<Vec<_>>();
        assert_eq!(lines[0], "lat\\lon 0.000 1.000 2.000");
        assert_eq!(lines[1], "40.000 1.000000 0.500000 -");
        assert_eq!(lines[2], "41.000 - - 0.990000");
    }
}
