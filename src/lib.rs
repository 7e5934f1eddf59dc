pub mod engine;
pub mod feed;
pub mod models;
pub mod pose;
pub mod session;
pub mod settings;

pub use engine::{EngineConfig, PostureFault, Stage};
pub use feed::FrameFeed;
pub use models::SessionRecord;
pub use pose::{Body, Joint, Keypoint, PoseFrame};
pub use session::{Phase, SessionEvent, SessionSnapshot, SessionStatus, WorkoutSession};
pub use settings::ConfigStore;
