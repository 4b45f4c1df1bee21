//! Pointer gesture arbitration.
//!
//! Tracks which gesture owns the pointer and coalesces pointer moves so the
//! active gesture is updated at most once per animation frame.

use glam::Vec2;
use workflow::block::BlockId;

/// Mutually exclusive pointer gestures.
///
/// A pending connection click is tracked separately, by
/// [`workflow::protocol::ConnectionProtocol`], and may coexist with any of these.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum InteractionState {
    #[default]
    Idle,
    PanningCanvas,
    DraggingBlock(BlockId),
    DrawingMarquee,
    DraggingSelection,
}

/// What the pointer went down on, as hit-tested by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PointerTarget {
    Canvas,
    Block(BlockId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ZoomIn,
    ZoomOut,
    /// Held to draw a marquee instead of panning.
    SelectionModifier,
    Escape,
}

/// Pointer positions, in screen pixels, for one coalesced gesture update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerStep {
    pub from: Vec2,
    pub to: Vec2,
}

impl PointerStep {
    pub fn delta(&self) -> Vec2 {
        self.to - self.from
    }
}

/// Picks the gesture a pointer-down starts, highest priority first: inside
/// the selection, modifier held, on a block, anywhere else.
pub fn resolve_pointer_down(
    inside_selection: bool,
    modifier_held: bool,
    target: &PointerTarget,
) -> InteractionState {
    if inside_selection {
        InteractionState::DraggingSelection
    } else if modifier_held {
        InteractionState::DrawingMarquee
    } else if let PointerTarget::Block(id) = target {
        InteractionState::DraggingBlock(id.clone())
    } else {
        InteractionState::PanningCanvas
    }
}

#[derive(Debug, Default)]
pub struct Interaction {
    state: InteractionState,
    modifier_held: bool,
    /// Latest pointer position seen, whether or not a gesture is active.
    last_pointer: Option<Vec2>,
    /// Position the active gesture was last updated to.
    applied_pointer: Vec2,
    /// Move waiting for the next frame.
    queued_pointer: Option<Vec2>,
}

impl Interaction {
    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == InteractionState::Idle
    }

    pub fn modifier_held(&self) -> bool {
        self.modifier_held
    }

    pub fn set_modifier_held(&mut self, held: bool) {
        self.modifier_held = held;
    }

    pub fn last_pointer(&self) -> Option<Vec2> {
        self.last_pointer
    }

    pub fn has_queued_move(&self) -> bool {
        self.queued_pointer.is_some()
    }

    /// Starts `state` with the pointer at `pointer`.
    pub fn begin(&mut self, state: InteractionState, pointer: Vec2) {
        assert!(self.is_idle(), "gesture started while another is active");
        self.transition_to(state);
        self.last_pointer = Some(pointer);
        self.applied_pointer = pointer;
        self.queued_pointer = None;
    }

    pub fn note_pointer(&mut self, pointer: Vec2) {
        self.last_pointer = Some(pointer);
    }

    /// Records a pointer move. Returns whether a gesture wants a frame for it.
    pub fn queue_move(&mut self, pointer: Vec2) -> bool {
        self.note_pointer(pointer);
        if self.is_idle() {
            return false;
        }
        self.queued_pointer = Some(pointer);
        true
    }

    /// The coalesced move since the last update, if any.
    pub fn take_step(&mut self) -> Option<PointerStep> {
        let to = self.queued_pointer.take()?;
        let step = PointerStep {
            from: self.applied_pointer,
            to,
        };
        self.applied_pointer = to;
        Some(step)
    }

    /// Ends the active gesture and returns it.
    pub fn end(&mut self) -> InteractionState {
        self.queued_pointer = None;
        let ended = std::mem::take(&mut self.state);
        if ended != InteractionState::Idle {
            tracing::info!("Flow editor transitioning to {:?}", InteractionState::Idle);
        }
        ended
    }

    fn transition_to(&mut self, state: InteractionState) {
        tracing::info!("Flow editor transitioning to {:?}", state);
        self.state = state;
    }
}
