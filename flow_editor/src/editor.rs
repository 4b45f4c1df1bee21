//! One editing session over a workflow graph.

use glam::Vec2;
use workflow::block::{BlockId, BlockType};
use workflow::connection::{ConnectionId, PortRef};
use workflow::constants::{CANVAS_SIZE, KEYBOARD_ZOOM_STEP};
use workflow::document::WorkflowDocument;
use workflow::error::Rejection;
use workflow::graph::{BlockPatch, Cascade, Workflow};
use workflow::paths::unterminated_paths;
use workflow::protocol::{ConnectionProtocol, PortClickOutcome};
use workflow::rect::CanvasRect;

use crate::feedback::{BlockMove, EditorAction, EditorFeedback, Notice};
use crate::frame::{FrameLoop, FrameScheduler};
use crate::geometry::{GeometryTable, Wire};
use crate::inertia::Inertia;
use crate::interaction::{
    resolve_pointer_down, Interaction, InteractionState, Key, PointerStep, PointerTarget,
};
use crate::persistence::LoadOutcome;
use crate::selection::Selection;
use crate::viewport::Viewport;


/// Editor session: routes host input to the graph, view and selection, and
/// queues what the host should render or report.
///
/// All mutation is synchronous. Screen positions are pixels relative to the
/// editor container.
pub struct FlowEditor {
    workflow: Workflow,
    viewport: Viewport,
    inertia: Inertia,
    selection: Selection,
    protocol: ConnectionProtocol,
    interaction: Interaction,
    geometry: GeometryTable,
    feedback: EditorFeedback,
    frames: FrameLoop,
    /// Grab point relative to the dragged block's top-left corner, in canvas units.
    grab_offset: Vec2,
}

impl FlowEditor {
    /// Starts a session centred on the start block.
    pub fn new(
        workflow: Workflow,
        container_size: Vec2,
        scheduler: Box<dyn FrameScheduler>,
    ) -> FlowEditor {
        let mut viewport = Viewport::new(container_size);
        let focus = workflow
            .start_block()
            .map(|start| start.footprint().center())
            .or_else(|| workflow.bounding_box().map(|bounds| bounds.center()))
            .unwrap_or(CANVAS_SIZE * 0.5);
        viewport.center_on(focus);

        tracing::info!(
            "Flow editor session opened with {} blocks",
            workflow.blocks().len()
        );

        FlowEditor {
            geometry: GeometryTable::from_workflow(&workflow),
            workflow,
            viewport,
            inertia: Inertia::default(),
            selection: Selection::default(),
            protocol: ConnectionProtocol::default(),
            interaction: Interaction::default(),
            feedback: EditorFeedback::default(),
            frames: FrameLoop::new(scheduler),
            grab_offset: Vec2::ZERO,
        }
    }

    /// Starts a session from a load result, surfacing its notice if any.
    pub fn from_load(
        outcome: LoadOutcome,
        container_size: Vec2,
        scheduler: Box<dyn FrameScheduler>,
    ) -> FlowEditor {
        let notice = outcome.notice();
        let mut editor = FlowEditor::new(outcome.into_workflow(), container_size, scheduler);
        if let Some(notice) = notice {
            editor.feedback.add_notice(notice);
        }
        editor
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn workflow(&self) -> &Workflow {
        &self.workflow
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn state(&self) -> &InteractionState {
        self.interaction.state()
    }

    pub fn geometry(&self) -> &GeometryTable {
        &self.geometry
    }

    pub fn pending_port(&self) -> Option<&PortRef> {
        self.protocol.pending()
    }

    pub fn is_awaiting_second_click(&self) -> bool {
        self.protocol.is_awaiting_second_click()
    }

    pub fn is_coasting(&self) -> bool {
        self.inertia.is_running()
    }

    pub fn take_feedback(&mut self) -> EditorFeedback {
        self.feedback.take()
    }

    // ------------------------------------------------------------------------
    // Graph edits
    // ------------------------------------------------------------------------

    /// Creates a block with its top-left corner under `screen`.
    pub fn add_block_at(&mut self, kind: BlockType, screen: Vec2) -> Result<BlockId, Rejection> {
        let at = self.viewport.screen_to_canvas(screen);
        let id = self
            .workflow
            .add_block(kind, at)
            .map_err(|rejection| self.rejected(rejection))?;

        if let Some(block) = self.workflow.block(id.as_str()) {
            self.geometry.insert(block);
        }
        self.feedback.add_action(EditorAction::BlockAdded {
            block_id: id.clone(),
        });
        Ok(id)
    }

    pub fn update_block(&mut self, id: &str, patch: BlockPatch) -> Result<(), Rejection> {
        let moved = patch.position.is_some();
        let cascade = self
            .workflow
            .update_block(id, patch)
            .map_err(|rejection| self.rejected(rejection))?;

        if moved {
            if let Some(block) = self.workflow.block(id) {
                self.geometry.move_to(&block.id, block.pos());
            }
        }
        self.feedback.add_action(EditorAction::BlockUpdated {
            block_id: BlockId::from(id),
        });
        self.record_cascade(cascade);
        Ok(())
    }

    pub fn delete_block(&mut self, id: &str) -> Result<(), Rejection> {
        let (block, cascade) = self
            .workflow
            .delete_block(id)
            .map_err(|rejection| self.rejected(rejection))?;

        if *self.interaction.state() == InteractionState::DraggingBlock(block.id.clone()) {
            self.end_gesture();
        }
        self.geometry.remove(id);
        if self.selection.contains_block(&block.id) {
            self.selection.remove_block(&block.id);
            self.record_selection();
        }
        if self
            .protocol
            .pending()
            .is_some_and(|port| port.block_id == block.id)
        {
            self.protocol.clear();
        }

        self.feedback.add_action(EditorAction::BlockRemoved { block_id: block.id });
        self.record_cascade(cascade);
        Ok(())
    }

    /// Feeds a port click into the two-click connection protocol.
    pub fn port_clicked(&mut self, port: PortRef) -> PortClickOutcome {
        let outcome = self.protocol.click(&mut self.workflow, port);
        match &outcome {
            PortClickOutcome::Connected(id) => self.record_connection_added(id),
            PortClickOutcome::Rejected(rejection) => self.feedback.reject(rejection),
            PortClickOutcome::Pending(_) | PortClickOutcome::Deselected => {}
        }
        outcome
    }

    /// A click on a rendered wire removes that connection.
    pub fn connection_clicked(&mut self, id: &str) -> Result<(), Rejection> {
        let (connection, cascade) = self
            .workflow
            .delete_connection(id)
            .map_err(|rejection| self.rejected(rejection))?;

        self.feedback.add_action(EditorAction::ConnectionRemoved {
            connection_id: connection.id,
        });
        self.record_cascade(cascade);
        Ok(())
    }

    /// Replaces the nominal rectangle of a block with one the renderer measured.
    pub fn report_block_rect(&mut self, id: &str, rect: CanvasRect) {
        if let Some(block) = self.workflow.block(id) {
            self.geometry.set(block.id.clone(), rect);
        }
    }

    fn rejected(&mut self, rejection: Rejection) -> Rejection {
        self.feedback.reject(&rejection);
        rejection
    }

    fn record_connection_added(&mut self, id: &ConnectionId) {
        self.feedback.add_action(EditorAction::ConnectionAdded {
            connection_id: id.clone(),
        });

        let Some(connection) = self.workflow.connection(id.as_str()) else {
            return;
        };
        let bound = self
            .workflow
            .block(connection.to.as_str())
            .is_some_and(|target| target.condition_id.as_ref() == Some(&connection.from));
        if bound {
            let block_id = connection.to.clone();
            self.feedback.add_action(EditorAction::BlockUpdated { block_id });
        }
    }

    fn record_cascade(&mut self, cascade: Cascade) {
        for connection in cascade.removed_connections {
            self.feedback.add_action(EditorAction::ConnectionRemoved {
                connection_id: connection.id,
            });
        }
        for block_id in cascade.cleared_conditions {
            self.feedback.add_action(EditorAction::BlockUpdated { block_id });
        }
    }

    fn record_selection(&mut self) {
        self.feedback.add_action(EditorAction::SelectionChanged {
            selected: self.selection.blocks().to_vec(),
        });
    }

    fn clear_selection(&mut self) {
        if self.selection.clear() {
            self.record_selection();
        }
    }

    // ------------------------------------------------------------------------
    // Pointer and keyboard
    // ------------------------------------------------------------------------

    pub fn pointer_down(&mut self, screen: Vec2, target: PointerTarget) {
        if !self.interaction.is_idle() {
            tracing::debug!("Pointer down during a gesture, ending it first");
            self.pointer_up();
        }
        if self.inertia.is_running() {
            self.inertia.stop();
            self.feedback.flush();
        }

        let canvas = self.viewport.screen_to_canvas(screen);
        let target = match target {
            PointerTarget::Block(id) if self.workflow.block(id.as_str()).is_none() => {
                PointerTarget::Canvas
            }
            target => target,
        };

        let state = resolve_pointer_down(
            self.selection.contains(canvas),
            self.interaction.modifier_held(),
            &target,
        );
        match &state {
            InteractionState::DraggingSelection => {}
            InteractionState::DrawingMarquee => {
                self.clear_selection();
                self.selection.begin_marquee(canvas);
            }
            InteractionState::DraggingBlock(id) => {
                self.clear_selection();
                let origin = self.workflow.block(id.as_str()).map_or(canvas, |b| b.pos());
                self.grab_offset = canvas - origin;
            }
            InteractionState::PanningCanvas => {
                self.clear_selection();
                self.protocol.clear();
            }
            InteractionState::Idle => {}
        }
        self.interaction.begin(state, screen);
    }

    /// Queues `screen` for the next frame; only the latest position per frame is applied.
    pub fn pointer_move(&mut self, screen: Vec2) {
        if self.interaction.queue_move(screen) {
            self.frames.ensure_scheduled();
        }
    }

    /// Applies any queued move, then ends the active gesture.
    pub fn pointer_up(&mut self) {
        if let Some(step) = self.interaction.take_step() {
            self.apply_step(step);
        }

        match self.interaction.end() {
            InteractionState::PanningCanvas => {
                if self.inertia.release() {
                    self.frames.ensure_scheduled();
                }
            }
            InteractionState::DrawingMarquee => {
                if self.selection.finish_marquee(&self.workflow) {
                    self.record_selection();
                }
            }
            _ => {}
        }

        if !self.inertia.is_running() {
            self.feedback.flush();
            self.frames.cancel();
        }
    }

    pub fn key_down(&mut self, key: Key) {
        match key {
            Key::ZoomIn => self.zoom_at_pointer(KEYBOARD_ZOOM_STEP),
            Key::ZoomOut => self.zoom_at_pointer(-KEYBOARD_ZOOM_STEP),
            Key::SelectionModifier => self.interaction.set_modifier_held(true),
            Key::Escape => self.cancel(),
        }
    }

    pub fn key_up(&mut self, key: Key) {
        if key == Key::SelectionModifier {
            self.interaction.set_modifier_held(false);
        }
    }

    /// Zooms by `delta_percent` around `screen`.
    pub fn wheel(&mut self, delta_percent: i32, screen: Vec2) {
        self.interaction.note_pointer(screen);
        let before = self.view_snapshot();
        self.viewport.zoom_by(delta_percent, screen);
        self.record_view_change(before);
    }

    fn zoom_at_pointer(&mut self, delta_percent: i32) {
        let anchor = self
            .interaction
            .last_pointer()
            .unwrap_or(self.viewport.container_size() * 0.5);
        let before = self.view_snapshot();
        self.viewport.zoom_by(delta_percent, anchor);
        self.record_view_change(before);
    }

    /// Drops the pending connection click, a marquee in progress and the selection.
    fn cancel(&mut self) {
        self.protocol.clear();
        if *self.interaction.state() == InteractionState::DrawingMarquee {
            self.selection.cancel_marquee();
            self.end_gesture();
        }
        self.clear_selection();
    }

    /// Ends the active gesture without applying its queued move.
    fn end_gesture(&mut self) {
        self.interaction.end();
        if !self.inertia.is_running() {
            self.feedback.flush();
            self.frames.cancel();
        }
    }

    // ------------------------------------------------------------------------
    // Frames
    // ------------------------------------------------------------------------

    /// Host callback for a requested animation frame. Returns whether another
    /// frame has been requested.
    pub fn on_frame(&mut self) -> bool {
        self.frames.frame_started();

        let panning = *self.interaction.state() == InteractionState::PanningCanvas;
        let moved = match self.interaction.take_step() {
            Some(step) => {
                self.apply_step(step);
                true
            }
            None => {
                // A pointer held still during a pan carries no release velocity.
                if panning {
                    self.inertia.track(Vec2::ZERO);
                }
                false
            }
        };

        if self.inertia.is_running() {
            let before = self.view_snapshot();
            let coasting = self.inertia.step(&mut self.viewport);
            self.record_view_change(before);
            if !coasting {
                self.feedback.flush();
            }
        }

        // One frame past the last pan move observes whether the pointer stopped.
        let more = self.inertia.is_running()
            || self.interaction.has_queued_move()
            || (panning && moved);
        if more {
            self.frames.ensure_scheduled();
        }
        more
    }

    fn apply_step(&mut self, step: PointerStep) {
        match self.interaction.state().clone() {
            InteractionState::PanningCanvas => {
                let before = self.view_snapshot();
                let applied = self.viewport.pan_by(step.delta());
                self.inertia.track(applied);
                self.record_view_change(before);
            }
            InteractionState::DraggingBlock(id) => {
                let Some(before) = self.workflow.block(id.as_str()).map(|b| b.pos()) else {
                    return;
                };
                let target = self.viewport.screen_to_canvas(step.to) - self.grab_offset;
                let Ok(after) = self.workflow.move_block(id.as_str(), target) else {
                    return;
                };
                self.geometry.move_to(&id, after);
                if after != before {
                    self.feedback.add_action(EditorAction::BlockMoved {
                        block_ids: vec![id],
                        moves: vec![BlockMove { before, after }],
                    });
                }
            }
            InteractionState::DrawingMarquee => {
                let current = self.viewport.screen_to_canvas(step.to);
                self.selection.update_marquee(current);
            }
            InteractionState::DraggingSelection => {
                let delta = step.delta() / self.viewport.scale();
                let before: Vec<Vec2> = self
                    .selection
                    .blocks()
                    .iter()
                    .filter_map(|id| self.workflow.block(id.as_str()).map(|b| b.pos()))
                    .collect();
                let moved = self.selection.translate(&mut self.workflow, delta);
                for (id, position) in &moved {
                    self.geometry.move_to(id, *position);
                }
                if !moved.is_empty() && moved.len() == before.len() {
                    let moves = before
                        .into_iter()
                        .zip(moved.iter())
                        .map(|(before, (_, after))| BlockMove {
                            before,
                            after: *after,
                        })
                        .collect();
                    self.feedback.add_action(EditorAction::BlockMoved {
                        block_ids: moved.into_iter().map(|(id, _)| id).collect(),
                        moves,
                    });
                }
            }
            InteractionState::Idle => {}
        }
    }

    // ------------------------------------------------------------------------
    // View
    // ------------------------------------------------------------------------

    pub fn fit_to_view(&mut self) {
        let before = self.view_snapshot();
        self.viewport.fit_to_view(self.workflow.bounding_box());
        self.record_view_change(before);
    }

    pub fn reset_view(&mut self) {
        let before = self.view_snapshot();
        self.viewport.reset();
        self.record_view_change(before);
    }

    pub fn resize(&mut self, container_size: Vec2) {
        let before = self.view_snapshot();
        self.viewport.set_container_size(container_size);
        self.record_view_change(before);
    }

    fn view_snapshot(&self) -> (Vec2, u16) {
        (self.viewport.pan(), self.viewport.zoom_percent())
    }

    fn record_view_change(&mut self, (before_pan, before_zoom): (Vec2, u16)) {
        let (after_pan, after_zoom) = self.view_snapshot();
        if before_pan != after_pan || before_zoom != after_zoom {
            self.feedback.add_action(EditorAction::ViewChanged {
                before_pan,
                before_zoom,
                after_pan,
                after_zoom,
            });
        }
    }

    // ------------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------------

    pub fn wires(&self) -> Vec<Wire> {
        self.geometry.wires(&self.workflow)
    }

    /// Preview from the pending port to the pointer.
    pub fn pending_wire(&self) -> Option<Wire> {
        let port = self.protocol.pending()?;
        let block = self.workflow.block(port.block_id.as_str())?;
        let from = self.geometry.port_anchor(block, port)?;
        let to = self
            .interaction
            .last_pointer()
            .map_or(from, |pointer| self.viewport.screen_to_canvas(pointer));
        Some(Wire {
            connection_id: None,
            from,
            to,
            from_port: port.port,
        })
    }

    // ------------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------------

    /// The document to submit on save. Unterminated paths produce a warning
    /// but never block the save.
    pub fn document_for_save(&mut self, website_id: &str) -> WorkflowDocument {
        let issues = unterminated_paths(&self.workflow);
        if let Some(first) = issues.first() {
            self.feedback.add_notice(Notice::warning(format!(
                "{} path(s) in this workflow do not reach an end block, e.g. {first}",
                issues.len()
            )));
        }

        WorkflowDocument::from_workflow(&self.workflow)
            .with_metadata(website_id, common::timestamp::now_rfc3339())
    }

    /// Reports the outcome of a save started with [`FlowEditor::document_for_save`].
    pub fn save_finished(&mut self, result: anyhow::Result<()>) {
        let notice = match result {
            Ok(()) => Notice::info("Workflow saved"),
            Err(err) => Notice::error(format!("Failed to save the workflow: {err:#}")),
        };
        self.feedback.add_notice(notice);
    }
}

impl Drop for FlowEditor {
    fn drop(&mut self) {
        self.frames.cancel();
        self.geometry.clear();
        tracing::info!("Flow editor session closed");
    }
}
