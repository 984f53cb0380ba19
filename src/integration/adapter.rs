//! Adapter around the external detection-and-tracking capability.
//!
//! The capability is a black box: given a frame and its own persistent
//! tracking state it returns boxes, classes, confidences and per-box
//! identities, optionally with its own rendering of the frame. The adapter owns
//! that state for the lifetime of a pipeline and is the only thing that hands
//! it to the capability.

use tracing::debug;

use crate::backend::{BackendId, Capabilities};
use crate::config::ClassFilter;
use crate::error::{PerceptionError, Result};
use crate::frame::Frame;
use crate::tracker::{Identity, Rect};

/// Box in center-width-height pixel form.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RawBox {
    pub cx: f32,
    pub cy: f32,
    pub w: f32,
    pub h: f32,
}

impl RawBox {
    pub fn new(cx: f32, cy: f32, w: f32, h: f32) -> Self {
        Self { cx, cy, w, h }
    }
}

impl From<Rect> for RawBox {
    fn from(rect: Rect) -> Self {
        let [cx, cy, w, h] = rect.to_xywh();
        Self { cx, cy, w, h }
    }
}

/// Everything the capability reports for one frame, as parallel vectors.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResult {
    pub boxes: Vec<RawBox>,
    pub class_ids: Vec<u32>,
    pub confidences: Vec<f32>,
    pub identities: Vec<Identity>,
    /// The capability's own rendering, if it draws one. Without it the
    /// pipeline draws the boxes itself once the frame is timed.
    pub annotated: Option<Frame>,
}

/// A box that carries an identity this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IdentifiedBox {
    pub id: u64,
    pub bbox: RawBox,
    pub class_id: u32,
    pub confidence: f32,
}

impl RawResult {
    /// A result with no detections.
    pub fn empty() -> Self {
        Self {
            boxes: Vec::new(),
            class_ids: Vec::new(),
            confidences: Vec::new(),
            identities: Vec::new(),
            annotated: None,
        }
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    fn check_lengths(&self) -> Result<()> {
        let n = self.boxes.len();
        if self.class_ids.len() != n
            || self.confidences.len() != n
            || self.identities.len() != n
        {
            return Err(PerceptionError::backend_msg(format!(
                "capability returned mismatched outputs: \
                 {} boxes, {} classes, {} confidences, {} identities",
                n,
                self.class_ids.len(),
                self.confidences.len(),
                self.identities.len()
            )));
        }
        Ok(())
    }

    /// Boxes with an assigned identity, in the order the capability reported them.
    pub fn identified(&self) -> impl Iterator<Item = IdentifiedBox> + '_ {
        self.boxes
            .iter()
            .zip(&self.class_ids)
            .zip(&self.confidences)
            .zip(&self.identities)
            .filter_map(|(((bbox, &class_id), &confidence), identity)| {
                identity.id().map(|id| IdentifiedBox {
                    id,
                    bbox: *bbox,
                    class_id,
                    confidence,
                })
            })
    }
}

/// Per-call settings forwarded to the capability.
#[derive(Debug, Clone, Copy)]
pub struct InferParams<'a> {
    /// Detections below this confidence are dropped by the capability.
    pub confidence_threshold: f32,
    /// Only these classes are considered.
    pub target_classes: &'a ClassFilter,
    pub backend: BackendId,
}

/// The external detection-and-tracking capability.
pub trait TrackingCapability {
    /// Persistent tracker memory, owned by the adapter between calls.
    type State;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Fresh state for a new pipeline.
    fn init_state(&self) -> Self::State;

    /// Forget every track in `state`.
    ///
    /// Identities issued after a reset must still never repeat one issued
    /// before it, so implementations that keep an id counter in the state
    /// override this to carry it over.
    fn reset_state(&self, state: &mut Self::State) {
        *state = self.init_state();
    }

    /// Accelerators this capability can run on, queried once when a pipeline
    /// is built.
    fn capabilities(&self) -> Capabilities {
        Capabilities::cpu_only()
    }

    /// Detect and track objects in one frame, updating `state`.
    fn infer(
        &mut self,
        frame: &Frame,
        params: &InferParams<'_>,
        state: &mut Self::State,
    ) -> std::result::Result<RawResult, Self::Error>;
}

/// Owns a capability together with its tracking state.
pub struct TrackingAdapter<C: TrackingCapability> {
    capability: C,
    state: C::State,
    backend: BackendId,
}

impl<C: TrackingCapability> TrackingAdapter<C> {
    pub fn new(capability: C, backend: BackendId) -> Self {
        let state = capability.init_state();
        Self {
            capability,
            state,
            backend,
        }
    }

    /// Run the capability on `frame` with persistent tracking state.
    ///
    /// Fails with `InvalidFrame` for malformed input and `InferenceBackend`
    /// when the capability fails or returns inconsistent outputs. Nothing is
    /// retried.
    pub fn infer_and_track(
        &mut self,
        frame: &Frame,
        confidence_threshold: f32,
        target_classes: &ClassFilter,
    ) -> Result<RawResult> {
        frame.validate()?;

        let params = InferParams {
            confidence_threshold,
            target_classes,
            backend: self.backend,
        };
        let raw = self
            .capability
            .infer(frame, &params, &mut self.state)
            .map_err(PerceptionError::backend)?;
        raw.check_lengths()?;

        debug!(
            boxes = raw.len(),
            unassigned = raw.identities.iter().filter(|i| !i.is_assigned()).count(),
            "capability returned"
        );
        Ok(raw)
    }

    /// Forget every track; identities keep counting up from where they were.
    pub fn reset(&mut self) {
        self.capability.reset_state(&mut self.state);
    }

    pub fn backend(&self) -> BackendId {
        self.backend
    }

    pub fn capability(&self) -> &C {
        &self.capability
    }
}
