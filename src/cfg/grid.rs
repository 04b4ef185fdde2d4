use crate::error::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

fn default_min_lat() -> f64 {
    25.0
}

fn default_max_lat() -> f64 {
    75.0
}

fn default_min_lon() -> f64 {
    -30.0
}

fn default_max_lon() -> f64 {
    40.0
}

fn default_grid_step() -> f64 {
    1.0
}

fn default_time_step() -> f64 {
    1.0
}

fn default_coverage_time_step() -> f64 {
    300.0
}

fn default_coverage_step() -> f64 {
    0.5
}

fn default_day_duration() -> f64 {
    86400.0
}

pub(crate) fn validate_latitude(lat: f64) -> Result<(), Error> {
    if (-90.0..=90.0).contains(&lat) {
        Ok(())
    } else {
        Err(Error::InvalidLatitude(lat))
    }
}

pub(crate) fn validate_longitude(lon: f64) -> Result<(), Error> {
    if (-180.0..=180.0).contains(&lon) {
        Ok(())
    } else {
        Err(Error::InvalidLongitude(lon))
    }
}

/// Geographic [Rectangle], bounds are inclusive and expressed in degrees.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Rectangle {
    pub min_lon: f64,
    pub max_lon: f64,
    pub min_lat: f64,
    pub max_lat: f64,
}

impl Rectangle {
    /// Builds a new [Rectangle], in the (min-lon, max-lon, min-lat, max-lat) order
    pub fn new(min_lon: f64, max_lon: f64, min_lat: f64, max_lat: f64) -> Result<Self, Error> {
        let rect = Self {
            min_lon,
            max_lon,
            min_lat,
            max_lat,
        };
        rect.validate()?;
        Ok(rect)
    }

    /// True if (lat, lon) lies within [Rectangle]
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.min_lat && lat <= self.max_lat && lon >= self.min_lon && lon <= self.max_lon
    }

    pub(crate) fn validate(&self) -> Result<(), Error> {
        validate_latitude(self.min_lat)?;
        validate_latitude(self.max_lat)?;
        validate_longitude(self.min_lon)?;
        validate_longitude(self.max_lon)?;
        if self.max_lat < self.min_lat {
            return Err(Error::InvalidBounds(self.min_lat, self.max_lat));
        }
        if self.max_lon < self.min_lon {
            return Err(Error::InvalidBounds(self.min_lon, self.max_lon));
        }
        Ok(())
    }
}

/// Service area grid and time sampling of the availability maps
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GridOpts {
    #[cfg_attr(feature = "serde", serde(default = "default_min_lat"))]
    pub min_lat: f64,
    #[cfg_attr(feature = "serde", serde(default = "default_max_lat"))]
    pub max_lat: f64,
    #[cfg_attr(feature = "serde", serde(default = "default_min_lon"))]
    pub min_lon: f64,
    #[cfg_attr(feature = "serde", serde(default = "default_max_lon"))]
    pub max_lon: f64,
    /// Latitude resolution [°]
    #[cfg_attr(feature = "serde", serde(default = "default_grid_step"))]
    pub lat_step: f64,
    /// Longitude resolution [°]
    #[cfg_attr(feature = "serde", serde(default = "default_grid_step"))]
    pub lon_step: f64,
    /// User altitude above the ellipsoid [m]
    #[cfg_attr(feature = "serde", serde(default))]
    pub altitude: f64,
    /// Sampling period [s]
    #[cfg_attr(feature = "serde", serde(default = "default_time_step"))]
    pub time_step: f64,
    /// Simulated time span [s]
    #[cfg_attr(feature = "serde", serde(default = "default_day_duration"))]
    pub duration: f64,
    /// Only process cells within one of these areas (when not empty)
    #[cfg_attr(feature = "serde", serde(default))]
    pub inclusion: Vec<Rectangle>,
    /// Never process cells within these areas
    #[cfg_attr(feature = "serde", serde(default))]
    pub exclusion: Vec<Rectangle>,
    /// Also produce hourly maps
    #[cfg_attr(feature = "serde", serde(default))]
    pub hourly_maps: bool,
}

impl Default for GridOpts {
    fn default() -> Self {
        Self {
            min_lat: default_min_lat(),
            max_lat: default_max_lat(),
            min_lon: default_min_lon(),
            max_lon: default_max_lon(),
            lat_step: default_grid_step(),
            lon_step: default_grid_step(),
            altitude: 0.0,
            time_step: default_time_step(),
            duration: default_day_duration(),
            inclusion: Default::default(),
            exclusion: Default::default(),
            hourly_maps: false,
        }
    }
}

impl GridOpts {
    /// Grid bounds, as a [Rectangle]
    pub fn bounds(&self) -> Rectangle {
        Rectangle {
            min_lon: self.min_lon,
            max_lon: self.max_lon,
            min_lat: self.min_lat,
            max_lat: self.max_lat,
        }
    }

    pub(crate) fn validate(&self) -> Result<(), Error> {
        self.bounds().validate()?;
        for step in [self.lat_step, self.lon_step] {
            if step <= 0.0 || !step.is_finite() {
                return Err(Error::InvalidGridStep(step));
            }
        }
        if self.time_step <= 0.0 || !self.time_step.is_finite() {
            return Err(Error::InvalidTimeStep(self.time_step));
        }
        if self.duration <= 0.0 || !self.duration.is_finite() {
            return Err(Error::EmptyTimeSpan);
        }
        for rect in self.inclusion.iter().chain(self.exclusion.iter()) {
            rect.validate()?;
        }
        Ok(())
    }
}

/// Correction coverage map options (reduced evaluation, no navigation)
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CoverageOpts {
    /// Sampling period [s]
    #[cfg_attr(feature = "serde", serde(default = "default_coverage_time_step"))]
    pub time_step: f64,
    /// Latitude resolution [°]
    #[cfg_attr(feature = "serde", serde(default = "default_coverage_step"))]
    pub lat_step: f64,
    /// Longitude resolution [°]
    #[cfg_attr(feature = "serde", serde(default = "default_coverage_step"))]
    pub lon_step: f64,
}

impl Default for CoverageOpts {
    fn default() -> Self {
        Self {
            time_step: default_coverage_time_step(),
            lat_step: default_coverage_step(),
            lon_step: default_coverage_step(),
        }
    }
}

impl CoverageOpts {
    pub(crate) fn validate(&self) -> Result<(), Error> {
        for step in [self.lat_step, self.lon_step] {
            if step <= 0.0 || !step.is_finite() {
                return Err(Error::InvalidGridStep(step));
            }
        }
        if self.time_step <= 0.0 || !self.time_step.is_finite() {
            return Err(Error::InvalidTimeStep(self.time_step));
        }
        Ok(())
    }
}
