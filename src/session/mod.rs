pub mod controller;
pub mod state;

pub use controller::{SessionEvent, WorkoutSession};
pub use state::{Phase, SessionSnapshot, SessionStatus};
