mod adaptive_controller;
mod stream_lifecycle;
mod stream_status;

pub use adaptive_controller::{AdaptiveController, Evaluation, QualityStep};
pub use stream_lifecycle::{StateTransition, StreamLifecycle};
pub use stream_status::StreamStatus;
