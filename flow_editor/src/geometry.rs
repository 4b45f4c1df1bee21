//! Per-session block geometry and wire curves.

use glam::Vec2;
use hashbrown::HashMap;
use workflow::block::{Block, BlockId};
use workflow::connection::{Connection, ConnectionId, PortRef, PortType};
use workflow::graph::Workflow;
use workflow::rect::CanvasRect;

const MIN_CONTROL_OFFSET: f32 = 40.0;

/// Canvas-space rectangle of every block, keyed by id.
///
/// Owned by a single editor session. Wire geometry reads it; only the editor
/// and the host renderer write it.
#[derive(Debug, Default, Clone)]
pub struct GeometryTable {
    rects: HashMap<BlockId, CanvasRect>,
}

impl GeometryTable {
    pub fn from_workflow(workflow: &Workflow) -> GeometryTable {
        let mut table = GeometryTable::default();
        for block in workflow.blocks() {
            table.insert(block);
        }
        table
    }

    pub fn get(&self, id: &str) -> Option<CanvasRect> {
        self.rects.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.rects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    /// Records the nominal footprint of `block`.
    pub fn insert(&mut self, block: &Block) {
        self.rects.insert(block.id.clone(), block.footprint());
    }

    /// Moves the rectangle of `id` so its top-left corner is at `position`,
    /// keeping a measured size if one was reported.
    pub fn move_to(&mut self, id: &BlockId, position: Vec2) {
        match self.rects.get_mut(id) {
            Some(rect) => *rect = CanvasRect::from_min_size(position, rect.size()),
            None => {
                self.rects
                    .insert(id.clone(), CanvasRect::block_footprint(position));
            }
        }
    }

    /// Replaces the rectangle of `id` with one measured by the renderer.
    pub fn set(&mut self, id: BlockId, rect: CanvasRect) {
        self.rects.insert(id, rect);
    }

    pub fn remove(&mut self, id: &str) {
        self.rects.remove(id);
    }

    pub fn clear(&mut self) {
        self.rects.clear();
    }

    /// Canvas position of `port` on `block`, or `None` if the block has no
    /// such port or no recorded geometry.
    pub fn port_anchor(&self, block: &Block, port: &PortRef) -> Option<Vec2> {
        if !block.exposes(port) {
            return None;
        }
        let rect = self.get(block.id.as_str())?;
        let mid_y = rect.center().y;

        let anchor = match (port.port, port.option_index) {
            (PortType::Input, _) => Vec2::new(rect.min.x, mid_y),
            (PortType::Output, None) => Vec2::new(rect.max.x, mid_y),
            (PortType::Output, Some(index)) => {
                let slots = (block.output_count() + 1) as f32;
                let y = rect.min.y + rect.height() * (index + 1) as f32 / slots;
                Vec2::new(rect.max.x, y)
            }
        };
        Some(anchor)
    }

    pub fn wire(&self, workflow: &Workflow, connection: &Connection) -> Option<Wire> {
        let source = workflow.block(connection.from.as_str())?;
        let target = workflow.block(connection.to.as_str())?;
        Some(Wire {
            connection_id: Some(connection.id.clone()),
            from: self.port_anchor(source, &connection.source_port())?,
            to: self.port_anchor(target, &connection.target_port())?,
            from_port: PortType::Output,
        })
    }

    pub fn wires(&self, workflow: &Workflow) -> Vec<Wire> {
        workflow
            .connections()
            .iter()
            .filter_map(|connection| self.wire(workflow, connection))
            .collect()
    }
}

/// A connection curve in canvas space.
#[derive(Clone, Debug, PartialEq)]
pub struct Wire {
    /// `None` for the preview of a connection being created.
    pub connection_id: Option<ConnectionId>,
    pub from: Vec2,
    pub to: Vec2,
    /// Kind of port at `from`. Output curves leave rightwards, input curves leftwards.
    pub from_port: PortType,
}

impl Wire {
    pub fn control_offset(&self) -> f32 {
        ((self.to.x - self.from.x).abs() * 0.5).max(MIN_CONTROL_OFFSET)
    }

    /// The four cubic Bézier control points.
    pub fn control_points(&self) -> [Vec2; 4] {
        let offset = self.control_offset();
        let (from_sign, to_sign) = match self.from_port {
            PortType::Output => (1.0, -1.0),
            PortType::Input => (-1.0, 1.0),
        };
        [
            self.from,
            self.from + Vec2::new(offset * from_sign, 0.0),
            self.to + Vec2::new(offset * to_sign, 0.0),
            self.to,
        ]
    }

    pub fn point_at(&self, t: f32) -> Vec2 {
        let [p0, p1, p2, p3] = self.control_points();
        let one_minus = 1.0 - t;
        p0 * (one_minus * one_minus * one_minus)
            + p1 * (3.0 * one_minus * one_minus * t)
            + p2 * (3.0 * one_minus * t * t)
            + p3 * (t * t * t)
    }

    /// `steps + 1` points along the curve, endpoints included.
    pub fn sample(&self, steps: usize) -> Vec<Vec2> {
        assert!(steps >= 2, "wire sampling steps must be at least 2");
        (0..=steps)
            .map(|i| self.point_at(i as f32 / steps as f32))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use common::Vec2Ext;
    use workflow::block::BlockType;
    use workflow::graph::BlockPatch;

    use super::*;

    fn workflow_with_option(options: &[&str]) -> (Workflow, BlockId) {
        let mut workflow = Workflow::with_default_start();
        let option = workflow
            .add_block(BlockType::Option, Vec2::new(1000.0, 1000.0))
            .unwrap();
        workflow
            .update_block(option.as_str(), BlockPatch::options(options.iter().copied()))
            .unwrap();
        (workflow, option)
    }

    #[test]
    fn anchors_follow_port_layout() {
        let (workflow, option) = workflow_with_option(&["A", "B", "C"]);
        let table = GeometryTable::from_workflow(&workflow);
        let block = workflow.block(option.as_str()).unwrap();

        assert_eq!(
            table.port_anchor(block, &PortRef::input(option.clone())),
            Some(Vec2::new(1000.0, 1100.0))
        );
        assert_eq!(
            table.port_anchor(block, &PortRef::option_output(option.clone(), 0)),
            Some(Vec2::new(1320.0, 1050.0))
        );
        assert_eq!(
            table.port_anchor(block, &PortRef::option_output(option.clone(), 2)),
            Some(Vec2::new(1320.0, 1150.0))
        );
        assert_eq!(table.port_anchor(block, &PortRef::option_output(option, 3)), None);

        let start = workflow.start_block().unwrap();
        assert_eq!(
            table.port_anchor(start, &PortRef::output(start.id.clone())),
            Some(Vec2::new(10_160.0, 10_000.0))
        );
        assert_eq!(table.port_anchor(start, &PortRef::input(start.id.clone())), None);
    }

    #[test]
    fn moves_keep_measured_size() {
        let (workflow, option) = workflow_with_option(&["A"]);
        let mut table = GeometryTable::from_workflow(&workflow);
        table.set(
            option.clone(),
            CanvasRect::from_min_size(Vec2::new(1000.0, 1000.0), Vec2::new(320.0, 260.0)),
        );

        table.move_to(&option, Vec2::new(0.0, 0.0));

        assert_eq!(
            table.get(option.as_str()),
            Some(CanvasRect::from_min_size(Vec2::ZERO, Vec2::new(320.0, 260.0)))
        );
    }

    #[test]
    fn one_wire_per_connection() {
        let (mut workflow, option) = workflow_with_option(&["A", "B"]);
        let end = workflow.add_block(BlockType::End, Vec2::new(2000.0, 1000.0)).unwrap();
        workflow.add_connection(&"start".into(), &option, None).unwrap();
        let id = workflow.add_connection(&option, &end, Some(1)).unwrap();
        let table = GeometryTable::from_workflow(&workflow);

        let wires = table.wires(&workflow);

        assert_eq!(wires.len(), 2);
        let wire = wires.iter().find(|w| w.connection_id.as_ref() == Some(&id)).unwrap();
        assert!(wire.from.approximately_eq(Vec2::new(1320.0, 1000.0 + 200.0 * 2.0 / 3.0)));
        assert_eq!(wire.to, Vec2::new(2000.0, 1100.0));
    }

    #[test]
    fn control_offset_has_a_floor() {
        let close = Wire {
            connection_id: None,
            from: Vec2::new(0.0, 0.0),
            to: Vec2::new(30.0, 100.0),
            from_port: PortType::Output,
        };
        let far = Wire {
            to: Vec2::new(300.0, 100.0),
            ..close.clone()
        };

        assert_eq!(close.control_offset(), 40.0);
        assert_eq!(far.control_offset(), 150.0);
        assert_eq!(close.control_points()[1], Vec2::new(40.0, 0.0));
        assert_eq!(close.control_points()[2], Vec2::new(-10.0, 100.0));
    }

    #[test]
    fn input_side_preview_bends_left() {
        let wire = Wire {
            connection_id: None,
            from: Vec2::new(500.0, 0.0),
            to: Vec2::new(100.0, 0.0),
            from_port: PortType::Input,
        };

        let [_, p1, p2, _] = wire.control_points();

        assert_eq!(p1, Vec2::new(300.0, 0.0));
        assert_eq!(p2, Vec2::new(300.0, 0.0));
    }

    #[test]
    fn samples_include_endpoints() {
        let wire = Wire {
            connection_id: None,
            from: Vec2::new(10.0, 20.0),
            to: Vec2::new(400.0, 220.0),
            from_port: PortType::Output,
        };

        let points = wire.sample(8);

        assert_eq!(points.len(), 9);
        assert!(points[0].approximately_eq(wire.from));
        assert!(points[8].approximately_eq(wire.to));
    }
}
