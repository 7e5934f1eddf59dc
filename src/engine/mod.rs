pub mod config;
pub mod counter;
pub mod gate;
pub mod geometry;
pub mod smoother;

pub use config::EngineConfig;
pub use counter::{RepCounter, Stage};
pub use gate::{check_posture, PostureFault};
pub use smoother::AngleSmoother;
