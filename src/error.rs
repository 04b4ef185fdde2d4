use thiserror::Error;

/// Setup errors. Everything that may go wrong during a simulation run
/// (no usable GEO, insufficient geometry..) is an outcome and not an [Error].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Latitude must lie within [-90°, 90°]
    #[error("invalid latitude {0}°")]
    InvalidLatitude(f64),

    /// Longitude must lie within [-180°, 180°]
    #[error("invalid longitude {0}°")]
    InvalidLongitude(f64),

    /// Area or grid bounds where max < min
    #[error("invalid bounds: max ({1}) < min ({0})")]
    InvalidBounds(f64, f64),

    /// Grid resolution must be strictly positive
    #[error("invalid grid step {0}°")]
    InvalidGridStep(f64),

    /// Time steps must be strictly positive
    #[error("invalid time step {0}s")]
    InvalidTimeStep(f64),

    /// Sliding window needs at least one sample
    #[error("sliding window size must be > 0")]
    InvalidWindowSize,

    /// Alarm limits are expressed in meters and must be > 0
    #[error("invalid alarm limit {0}m")]
    InvalidAlarmLimit(f64),

    /// Timeout overrides are expressed in seconds and must be >= 0
    #[error("invalid timeout {0}s for {1}")]
    InvalidTimeout(f64, String),

    /// Negative durations make no sense in the switching options
    #[error("negative duration: {0}s")]
    NegativeDuration(f64),

    /// At least one switch per epoch must be allowed
    #[error("max switches per epoch must be > 0")]
    InvalidSwitchBound,

    /// A switching policy was requested while GEO switching is disabled
    #[error("switching policy requires geo switching")]
    ConflictingPolicy,

    /// Simulated time span is empty
    #[error("empty simulation time span")]
    EmptyTimeSpan,

    #[error("unknown message class \"{0}\"")]
    UnknownMessageClass(String),

    #[error("unknown assurance level \"{0}\"")]
    UnknownAssuranceLevel(String),
}
