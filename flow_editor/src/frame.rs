//! Animation-frame scheduling supplied by the host.

use std::cell::RefCell;
use std::rc::Rc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub u64);

/// The host's animation-frame source, e.g. `requestAnimationFrame`.
///
/// After `request_frame` the host calls [`crate::FlowEditor::on_frame`] once,
/// unless the handle is cancelled first.
pub trait FrameScheduler {
    fn request_frame(&mut self) -> FrameHandle;
    fn cancel_frame(&mut self, handle: FrameHandle);
}

/// Keeps at most one frame request outstanding.
pub(crate) struct FrameLoop {
    scheduler: Box<dyn FrameScheduler>,
    outstanding: Option<FrameHandle>,
}

impl FrameLoop {
    pub fn new(scheduler: Box<dyn FrameScheduler>) -> FrameLoop {
        FrameLoop {
            scheduler,
            outstanding: None,
        }
    }

    pub fn is_scheduled(&self) -> bool {
        self.outstanding.is_some()
    }

    pub fn ensure_scheduled(&mut self) {
        if self.outstanding.is_none() {
            self.outstanding = Some(self.scheduler.request_frame());
        }
    }

    /// The outstanding frame fired; a new one must be requested explicitly.
    pub fn frame_started(&mut self) {
        self.outstanding = None;
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.outstanding.take() {
            tracing::trace!("Cancelling frame {:?}", handle);
            self.scheduler.cancel_frame(handle);
        }
    }
}

impl Drop for FrameLoop {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[derive(Debug, Default)]
struct ManualFrames {
    next_handle: u64,
    pending: Vec<FrameHandle>,
    requested: usize,
    cancelled: usize,
}

/// A scheduler driven by hand, for headless hosts and tests. Clones share
/// state, so one clone can be handed to the editor and the other inspected.
#[derive(Clone, Debug, Default)]
pub struct ManualScheduler {
    frames: Rc<RefCell<ManualFrames>>,
}

impl ManualScheduler {
    /// Frames requested and not yet fired or cancelled.
    pub fn pending(&self) -> usize {
        self.frames.borrow().pending.len()
    }

    pub fn requested(&self) -> usize {
        self.frames.borrow().requested
    }

    pub fn cancelled(&self) -> usize {
        self.frames.borrow().cancelled
    }

    /// Consumes a pending frame. Returns false when nothing was requested.
    pub fn fire(&self) -> bool {
        let mut frames = self.frames.borrow_mut();
        if frames.pending.is_empty() {
            return false;
        }
        frames.pending.remove(0);
        true
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self) -> FrameHandle {
        let mut frames = self.frames.borrow_mut();
        frames.next_handle += 1;
        frames.requested += 1;
        let handle = FrameHandle(frames.next_handle);
        frames.pending.push(handle);
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        let mut frames = self.frames.borrow_mut();
        frames.pending.retain(|pending| *pending != handle);
        frames.cancelled += 1;
    }
}
