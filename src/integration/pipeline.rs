//! Per-frame entry point combining the adapter, normalizer and latency clock.

use std::sync::{Mutex, TryLockError};
use std::time::Instant;

use tracing::{debug, info, trace, warn};

use crate::backend::{BackendId, Capabilities, select_backend};
use crate::config::PipelineConfig;
use crate::error::{PerceptionError, Result};
use crate::frame::Frame;

use super::adapter::{IdentifiedBox, TrackingAdapter, TrackingCapability};
use super::normalize::{TrackedObject, normalize};
use super::render::annotate;

/// What one call to [`PerceptionPipeline::process`] produces.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameOutput {
    /// The frame with every reported box drawn on it.
    pub annotated: Frame,
    pub observations: Vec<TrackedObject>,
    /// Wall-clock time of the capability call alone, in milliseconds.
    pub latency_ms: f64,
}

impl FrameOutput {
    pub fn into_parts(self) -> (Frame, Vec<TrackedObject>, f64) {
        (self.annotated, self.observations, self.latency_ms)
    }
}

/// Turns frames into tracked-object observations.
///
/// Call [`process`](Self::process) once per frame from a single control loop.
/// Each instance owns its own tracking state, so independent pipelines can
/// live side by side, one per thread if needed. Nothing here times out: a hung
/// capability blocks the caller.
pub struct PerceptionPipeline<C: TrackingCapability> {
    adapter: TrackingAdapter<C>,
    config: PipelineConfig,
}

impl<C: TrackingCapability> PerceptionPipeline<C> {
    /// Build a pipeline, selecting the backend from what the capability
    /// reports it can run on.
    pub fn new(capability: C, config: PipelineConfig) -> Result<Self> {
        let caps = capability.capabilities();
        Self::with_capabilities(capability, config, &caps)
    }

    /// Build a pipeline against explicit accelerator flags.
    pub fn with_capabilities(
        capability: C,
        config: PipelineConfig,
        caps: &Capabilities,
    ) -> Result<Self> {
        config.validate()?;
        let backend = select_backend(caps, config.backend_preference);
        info!(
            model = %config.model_reference,
            backend = %backend,
            confidence = config.confidence_threshold,
            "perception pipeline ready"
        );
        Ok(Self {
            adapter: TrackingAdapter::new(capability, backend),
            config,
        })
    }

    /// Process one frame.
    ///
    /// Either every identity-bearing detection comes back normalized, or an
    /// error does and nothing else; adapter errors are passed through as is.
    /// `latency_ms` covers the adapter call alone: drawing and normalization
    /// happen after the clock stops.
    pub fn process(&mut self, frame: &Frame) -> Result<FrameOutput> {
        let start = Instant::now();
        let mut raw = self.adapter.infer_and_track(
            frame,
            self.config.confidence_threshold,
            &self.config.target_classes,
        )?;
        let latency_ms = start.elapsed().as_secs_f64() * 1000.0;

        let annotated = match raw.annotated.take() {
            Some(rendered) => rendered,
            None => annotate(frame, &raw.boxes, &raw.identities),
        };
        let identified: Vec<IdentifiedBox> = raw.identified().collect();
        let observations = normalize(&identified, frame.width(), frame.height());

        debug!(
            detections = raw.len(),
            observations = observations.len(),
            latency_ms,
            "frame processed"
        );
        for obj in &observations {
            trace!(id = obj.id, x = obj.abs_center.0, y = obj.abs_center.1, "tracking");
        }

        Ok(FrameOutput {
            annotated,
            observations,
            latency_ms,
        })
    }

    pub fn backend(&self) -> BackendId {
        self.adapter.backend()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn capability(&self) -> &C {
        self.adapter.capability()
    }

    /// Drop all tracks. Identities issued afterwards are still new ones.
    pub fn reset_tracking(&mut self) {
        self.adapter.reset();
    }

    /// Wrap for sharing across threads with a fail-fast reentrancy guard.
    pub fn into_shared(self) -> SharedPipeline<C> {
        SharedPipeline {
            inner: Mutex::new(self),
        }
    }
}

/// A pipeline behind a non-blocking guard.
///
/// Concurrent calls never queue: a call made while another frame is in
/// flight fails with [`PerceptionError::ConcurrentUse`]. A frame that panicked
/// may have left the tracker half updated, so the next call starts from
/// reset tracks.
pub struct SharedPipeline<C: TrackingCapability> {
    inner: Mutex<PerceptionPipeline<C>>,
}

impl<C: TrackingCapability> SharedPipeline<C> {
    pub fn process(&self, frame: &Frame) -> Result<FrameOutput> {
        let mut pipeline = match self.inner.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::WouldBlock) => return Err(PerceptionError::ConcurrentUse),
            Err(TryLockError::Poisoned(poisoned)) => {
                let mut pipeline = poisoned.into_inner();
                warn!("previous frame panicked, resetting tracks");
                pipeline.reset_tracking();
                self.inner.clear_poison();
                pipeline
            }
        };
        pipeline.process(frame)
    }

    pub fn into_inner(self) -> PerceptionPipeline<C> {
        self.inner.into_inner().unwrap_or_else(|poisoned| {
            let mut pipeline = poisoned.into_inner();
            pipeline.reset_tracking();
            pipeline
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integration::{InferParams, RawResult};

    /// Blocks inside `infer` until told to continue.
    struct Gate {
        entered: std::sync::mpsc::Sender<()>,
        release: std::sync::mpsc::Receiver<()>,
    }

    impl TrackingCapability for Gate {
        type State = ();
        type Error = std::convert::Infallible;

        fn init_state(&self) -> Self::State {}

        fn infer(
            &mut self,
            frame: &Frame,
            _params: &InferParams<'_>,
            _state: &mut (),
        ) -> std::result::Result<RawResult, Self::Error> {
            let _ = self.entered.send(());
            let _ = self.release.recv();
            Ok(RawResult::empty())
        }
    }

    /// Counts frames since the last reset and panics on the chosen one.
    struct Fragile {
        panic_on: u64,
    }

    impl TrackingCapability for Fragile {
        type State = u64;
        type Error = std::convert::Infallible;

        fn init_state(&self) -> u64 {
            0
        }

        fn infer(
            &mut self,
            _frame: &Frame,
            _params: &InferParams<'_>,
            frames: &mut u64,
        ) -> std::result::Result<RawResult, Self::Error> {
            *frames += 1;
            if *frames == self.panic_on {
                panic!("capability crashed");
            }
            let mut raw = RawResult::empty();
            raw.boxes.push(crate::integration::RawBox::new(2.0, 2.0, 2.0, 2.0));
            raw.class_ids.push(0);
            raw.confidences.push(0.9);
            raw.identities.push(crate::tracker::Identity::Assigned(*frames));
            Ok(raw)
        }
    }

    #[test]
    fn test_shared_pipeline_resets_after_panic() {
        let pipeline = PerceptionPipeline::with_capabilities(
            Fragile { panic_on: 2 },
            PipelineConfig::default(),
            &Capabilities::cpu_only(),
        )
        .unwrap()
        .into_shared();
        let frame = Frame::blank(4, 4, 3);

        assert_eq!(pipeline.process(&frame).unwrap().observations[0].id, 1);
        std::thread::scope(|s| {
            assert!(s.spawn(|| pipeline.process(&frame)).join().is_err());
        });

        // Counting starts over instead of resuming from the crashed frame.
        assert_eq!(pipeline.process(&frame).unwrap().observations[0].id, 1);
        assert_eq!(pipeline.process(&frame).unwrap().observations[0].id, 2);
    }

    #[test]
    fn test_shared_pipeline_rejects_reentry() {
        let (entered_tx, entered_rx) = std::sync::mpsc::channel();
        let (release_tx, release_rx) = std::sync::mpsc::channel();
        let pipeline = PerceptionPipeline::with_capabilities(
            Gate {
                entered: entered_tx,
                release: release_rx,
            },
            PipelineConfig::default(),
            &Capabilities::cpu_only(),
        )
        .unwrap()
        .into_shared();

        std::thread::scope(|s| {
            let first = s.spawn(|| pipeline.process(&Frame::blank(4, 4, 3)));
            entered_rx.recv().unwrap();

            let err = pipeline.process(&Frame::blank(4, 4, 3)).unwrap_err();
            assert!(matches!(err, PerceptionError::ConcurrentUse));

            release_tx.send(()).unwrap();
            let out = first.join().unwrap().unwrap();
            assert!(out.observations.is_empty());
        });
    }

    #[test]
    fn test_invalid_config_rejected() {
        let (entered, _rx) = std::sync::mpsc::channel();
        let (_tx, release) = std::sync::mpsc::channel();
        let config = PipelineConfig {
            confidence_threshold: 2.0,
            ..PipelineConfig::default()
        };
        let err = PerceptionPipeline::new(Gate { entered, release }, config)
            .err()
            .unwrap();
        assert!(matches!(err, PerceptionError::Config(_)));
    }
}
