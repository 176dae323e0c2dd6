//! Camera-based inference scaffold.
//!
//! The actual models (drowsiness, emotion) are external collaborators hidden
//! behind the [`Classifier`] trait; the core only smooths their labels and
//! ferries results back to the owning task. Camera capture runs on a plain
//! OS thread because it is blocking I/O; results cross back over a tokio
//! channel so workers never touch shared state directly.

mod smoothing;
mod worker;

pub use smoothing::{MajorityVote, SmoothedLabel};
pub use worker::CameraWorker;

use chrono::{DateTime, Utc};

#[derive(Debug, thiserror::Error)]
pub enum VisionError {
    #[error("camera error: {0}")]
    Camera(String),
    #[error("classifier error: {0}")]
    Classifier(String),
}

/// Which camera feature produced a detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DetectionFeature {
    Drowsiness,
    Emotion,
}

impl DetectionFeature {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Drowsiness => "drowsiness",
            Self::Emotion => "emotion",
        }
    }
}

/// A captured camera frame, opaque to the core.
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// One classifier output.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub label: String,
    pub confidence: f32,
}

/// Black-box model invocation (external collaborator).
pub trait Classifier: Send {
    fn predict(&self, frame: &Frame) -> Result<Prediction, VisionError>;
}

/// Frame supplier, typically a webcam; synthetic in tests.
pub trait FrameSource: Send {
    fn capture(&mut self) -> Result<Frame, VisionError>;
}

/// Smoothed detection handed back to the owning task.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionUpdate {
    pub feature: DetectionFeature,
    pub label: String,
    pub confidence: f32,
    pub smoothed_label: String,
    pub smoothed_share: f64,
    pub at: DateTime<Utc>,
}
