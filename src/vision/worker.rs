use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

use super::smoothing::MajorityVote;
use super::{Classifier, DetectionFeature, DetectionUpdate, FrameSource};

/// Background camera inference worker.
///
/// One OS thread per enabled feature: capture a frame, run the classifier,
/// smooth the label and send the result to the owning task. The loop polls
/// a stop flag each iteration; [`CameraWorker::stop`] sets it and joins with
/// a bounded timeout so a wedged capture cannot block shutdown.
pub struct CameraWorker {
    feature: DetectionFeature,
    stop: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl CameraWorker {
    pub fn spawn(
        feature: DetectionFeature,
        mut source: Box<dyn FrameSource>,
        classifier: Box<dyn Classifier>,
        smoothing_window: usize,
        interval: Duration,
        updates: UnboundedSender<DetectionUpdate>,
    ) -> std::io::Result<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);

        let handle = thread::Builder::new()
            .name(format!("camera-{}", feature.as_str()))
            .spawn(move || {
                debug!(feature = feature.as_str(), "camera worker started");
                let mut vote = MajorityVote::new(smoothing_window);

                while !stop_flag.load(Ordering::Relaxed) {
                    let frame = match source.capture() {
                        Ok(frame) => frame,
                        Err(err) => {
                            // Hardware failure degrades the feature, never
                            // the core.
                            warn!(
                                feature = feature.as_str(),
                                error = %err,
                                "camera unavailable, stopping detection"
                            );
                            break;
                        }
                    };

                    match classifier.predict(&frame) {
                        Ok(prediction) => {
                            let smoothed = vote.push(&prediction.label);
                            let update = DetectionUpdate {
                                feature,
                                label: prediction.label,
                                confidence: prediction.confidence,
                                smoothed_label: smoothed.label,
                                smoothed_share: smoothed.share,
                                at: Utc::now(),
                            };
                            if updates.send(update).is_err() {
                                debug!(
                                    feature = feature.as_str(),
                                    "detection receiver dropped, stopping worker"
                                );
                                break;
                            }
                        }
                        Err(err) => {
                            debug!(
                                feature = feature.as_str(),
                                error = %err,
                                "prediction failed, skipping frame"
                            );
                        }
                    }

                    thread::sleep(interval);
                }

                debug!(feature = feature.as_str(), "camera worker stopped");
            })?;

        Ok(Self {
            feature,
            stop: Arc::clone(&stop),
            handle: Some(handle),
        })
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    /// Signal the worker and wait up to `timeout` for it to exit. A worker
    /// that misses the deadline is detached rather than blocking shutdown.
    pub fn stop(mut self, timeout: Duration) {
        self.stop.store(true, Ordering::Relaxed);
        let Some(handle) = self.handle.take() else {
            return;
        };

        let deadline = std::time::Instant::now() + timeout;
        while !handle.is_finished() && std::time::Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }

        if handle.is_finished() {
            let _ = handle.join();
        } else {
            warn!(
                feature = self.feature.as_str(),
                "camera worker did not stop within timeout, detaching"
            );
        }
    }
}

impl Drop for CameraWorker {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}
