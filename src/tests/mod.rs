
use log::LevelFilter;
use std::str::FromStr;
use std::sync::Once;

use crate::prelude::{
    AssuranceLevel, Constellation, Coordinates, Duration, Epoch, InsufficientGeometry,
    IntegritySolver, MessageClass, MessageEvent, ProtectionLevels, SV,
};

static INIT: Once = Once::new();

pub fn init_logger() {
    INIT.call_once(|| {
        env_logger::builder()
            .is_test(true)
            .filter_level(LevelFilter::Debug)
            .init();
    });
}

pub fn geo(prn: u8) -> SV {
    SV::new(Constellation::SBAS, prn)
}

pub fn t0() -> Epoch {
    Epoch::from_str("2020-06-25T00:00:00 GPST").unwrap()
}

/// Instant, in seconds from [t0]
pub fn at(seconds: f64) -> Epoch {
    t0() + Duration::from_seconds(seconds)
}

/// Every message class, broadcasted by `source` every `period` seconds,
/// from `start` (included) to `end` (excluded), in seconds from [t0].
pub fn broadcast(source: SV, start: u32, end: u32, period: u32) -> Vec<MessageEvent> {
    (start..end)
        .step_by(period as usize)
        .flat_map(|s| {
            MessageClass::ALL
                .into_iter()
                .flat_map(move |class| MessageEvent::receptions(at(s as f64), source, class))
        })
        .collect()
}

/// [IntegritySolver] that always returns the same protection levels
pub struct ConstantSolver {
    pub protection: ProtectionLevels,
}

impl ConstantSolver {
    pub fn nominal() -> Self {
        Self {
            protection: ProtectionLevels {
                hpl: 15.0,
                vpl: 25.0,
            },
        }
    }
}

impl IntegritySolver for ConstantSolver {
    fn solve(
        &self,
        _: Epoch,
        _: &Coordinates,
        _: SV,
        _: AssuranceLevel,
    ) -> Result<ProtectionLevels, InsufficientGeometry> {
        Ok(self.protection)
    }
}
