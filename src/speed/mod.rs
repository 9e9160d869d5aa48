//! Line-crossing speed measurement

pub mod protocol;
pub mod units;

pub use protocol::{FrameTiming, SpeedOutcome, SpeedProtocol};
pub use units::{Speed, UnitSystem};
pub use crate::tracker::SpeedStatus;
