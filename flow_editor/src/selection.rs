//! Marquee selection and group translation.

use glam::Vec2;
use workflow::block::BlockId;
use workflow::constants::{BLOCK_AREA, MARQUEE_MEMBERSHIP_PERCENT, MARQUEE_MIN_SIZE};
use workflow::graph::Workflow;
use workflow::rect::CanvasRect;

/// A marquee being drawn, in canvas coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Marquee {
    pub anchor: Vec2,
    pub current: Vec2,
}

impl Marquee {
    pub fn rect(&self) -> CanvasRect {
        CanvasRect::from_points(self.anchor, self.current)
    }

    /// Whether the rectangle is larger than pointer jitter on both axes.
    pub fn is_significant(&self) -> bool {
        let rect = self.rect();
        rect.width() > MARQUEE_MIN_SIZE && rect.height() > MARQUEE_MIN_SIZE
    }
}

/// Whether a marquee `rect` covers enough of `footprint` to capture the block.
pub fn captures(rect: &CanvasRect, footprint: &CanvasRect) -> bool {
    rect.overlap_area(footprint) / BLOCK_AREA * 100.0 >= MARQUEE_MEMBERSHIP_PERCENT
}

/// Ids of the blocks `rect` captures, in graph order.
pub fn captured_blocks(workflow: &Workflow, rect: &CanvasRect) -> Vec<BlockId> {
    workflow
        .blocks()
        .iter()
        .filter(|block| captures(rect, &block.footprint()))
        .map(|block| block.id.clone())
        .collect()
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Selection {
    rect: Option<CanvasRect>,
    blocks: Vec<BlockId>,
    marquee: Option<Marquee>,
}

impl Selection {
    pub fn rect(&self) -> Option<CanvasRect> {
        self.rect
    }

    pub fn blocks(&self) -> &[BlockId] {
        &self.blocks
    }

    pub fn contains_block(&self, id: &BlockId) -> bool {
        self.blocks.contains(id)
    }

    /// The marquee currently being drawn, if any.
    pub fn marquee(&self) -> Option<&Marquee> {
        self.marquee.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.rect.is_none()
    }

    /// Whether `point` lies inside the committed selection rectangle.
    pub fn contains(&self, point: Vec2) -> bool {
        self.rect.is_some_and(|rect| rect.contains(point))
    }

    /// Drops the committed selection. Returns whether there was one.
    pub fn clear(&mut self) -> bool {
        self.blocks.clear();
        self.rect.take().is_some()
    }

    pub fn begin_marquee(&mut self, anchor: Vec2) {
        self.clear();
        self.marquee = Some(Marquee {
            anchor,
            current: anchor,
        });
    }

    pub fn update_marquee(&mut self, current: Vec2) {
        if let Some(marquee) = self.marquee.as_mut() {
            marquee.current = current;
        }
    }

    pub fn cancel_marquee(&mut self) {
        self.marquee = None;
    }

    /// Commits the marquee as the selection if it is large enough.
    ///
    /// Returns whether a selection was committed.
    pub fn finish_marquee(&mut self, workflow: &Workflow) -> bool {
        let Some(marquee) = self.marquee.take() else {
            return false;
        };
        if !marquee.is_significant() {
            tracing::debug!("Marquee below minimum size, ignored");
            return false;
        }

        let rect = marquee.rect();
        self.blocks = captured_blocks(workflow, &rect);
        self.rect = Some(rect);
        tracing::debug!("Marquee selected {} blocks", self.blocks.len());
        true
    }

    /// Moves every captured block and the rectangle by `delta` canvas units.
    /// Blocks are clamped individually; the rectangle is not.
    pub fn translate(&mut self, workflow: &mut Workflow, delta: Vec2) -> Vec<(BlockId, Vec2)> {
        let Some(rect) = self.rect else {
            return Vec::new();
        };
        self.rect = Some(rect.translate(delta));
        workflow.translate_blocks(self.blocks.iter(), delta)
    }

    /// Forgets a block that left the graph.
    pub fn remove_block(&mut self, id: &BlockId) {
        self.blocks.retain(|selected| selected != id);
    }
}
