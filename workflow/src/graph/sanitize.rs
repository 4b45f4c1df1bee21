use hashbrown::{HashMap, HashSet};

use super::Workflow;
use crate::block::{Block, BlockId, BlockType, START_BLOCK_ID};
use crate::connection::{Connection, ConnectionId, PortType};
use crate::constants::clamp_block_position;

/// What [`Workflow::from_records`] had to drop or repair to restore the invariants.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SanitizeReport {
    pub dropped_blocks: Vec<BlockId>,
    pub dropped_connections: Vec<ConnectionId>,
    pub repaired_blocks: Vec<BlockId>,
}

impl SanitizeReport {
    pub fn is_clean(&self) -> bool {
        self.dropped_blocks.is_empty()
            && self.dropped_connections.is_empty()
            && self.repaired_blocks.is_empty()
    }

    fn repaired(&mut self, id: &BlockId) {
        if !self.repaired_blocks.contains(id) {
            self.repaired_blocks.push(id.clone());
        }
    }
}

impl Workflow {
    /// Rebuilds a graph from stored records, dropping or repairing whatever
    /// violates the current invariants. Never fails.
    pub fn from_records(
        blocks: Vec<Block>,
        connections: Vec<Connection>,
    ) -> (Workflow, SanitizeReport) {
        let mut report = SanitizeReport::default();
        let mut workflow = Workflow::new();

        for mut block in blocks {
            if block.kind != BlockType::Start && block.id == START_BLOCK_ID {
                tracing::warn!("Dropping {} block that claims the start id", block.kind);
                report.dropped_blocks.push(block.id);
                continue;
            }
            if workflow.blocks.contains_key(block.id.as_str()) {
                tracing::warn!("Dropping block with duplicate id {}", block.id);
                report.dropped_blocks.push(block.id);
                continue;
            }
            if block.kind == BlockType::Start
                && (block.id != START_BLOCK_ID || workflow.start_block().is_some())
            {
                tracing::warn!("Dropping extra start block {}", block.id);
                report.dropped_blocks.push(block.id);
                continue;
            }

            let clamped = clamp_block_position(block.pos());
            if clamped != block.pos() {
                tracing::warn!("Clamping block {} into the canvas", block.id);
                block.position = clamped.into();
                report.repaired(&block.id);
            }
            if block.kind != BlockType::Option && block.options.is_some() {
                block.options = None;
                report.repaired(&block.id);
            }
            workflow.blocks.push(block);
        }

        repair_condition_bindings(&mut workflow, &mut report);

        let mut seen = HashSet::new();
        for connection in connections {
            let valid = seen.insert(connection.id.clone())
                && connection.from_type == PortType::Output
                && connection.to_type == PortType::Input
                && connection.from != connection.to
                && workflow.check_port(&connection.source_port()).is_ok()
                && workflow.check_port(&connection.target_port()).is_ok();
            if valid {
                workflow.connections.push(connection);
            } else {
                tracing::warn!(
                    "Dropping invalid connection {} ({} -> {})",
                    connection.id,
                    connection.from,
                    connection.to
                );
                report.dropped_connections.push(connection.id);
            }
        }

        rebuild_output_bookkeeping(&mut workflow, &mut report);

        if !report.is_clean() {
            tracing::warn!(
                "Stored workflow repaired: {} blocks dropped, {} connections dropped, {} blocks repaired",
                report.dropped_blocks.len(),
                report.dropped_connections.len(),
                report.repaired_blocks.len()
            );
        }

        workflow.debug_validate();
        (workflow, report)
    }
}

fn repair_condition_bindings(workflow: &mut Workflow, report: &mut SanitizeReport) {
    let options_by_id: HashMap<BlockId, Vec<String>> = workflow
        .blocks
        .iter()
        .filter(|block| block.kind == BlockType::Option)
        .map(|block| (block.id.clone(), block.options().to_vec()))
        .collect();

    for block in workflow.blocks.iter_mut() {
        let options = block
            .condition_id
            .as_ref()
            .and_then(|option_id| options_by_id.get(option_id));

        match options {
            Some(_) if block.kind != BlockType::Condition => {
                block.condition_id = None;
                block.selected_condition = None;
                report.repaired(&block.id);
            }
            None if block.condition_id.is_some() || block.selected_condition.is_some() => {
                tracing::warn!("Clearing dangling option binding of block {}", block.id);
                block.condition_id = None;
                block.selected_condition = None;
                report.repaired(&block.id);
            }
            Some(options) => {
                let stale = block
                    .selected_condition
                    .as_ref()
                    .is_some_and(|selected| !options.contains(selected));
                if stale {
                    block.selected_condition = None;
                    report.repaired(&block.id);
                }
            }
            None => {}
        }
    }
}

/// Makes `connections.output` list exactly the block's outgoing connection ids,
/// keeping the stored order where it is still valid.
fn rebuild_output_bookkeeping(workflow: &mut Workflow, report: &mut SanitizeReport) {
    let mut outgoing: HashMap<BlockId, Vec<ConnectionId>> = HashMap::new();
    for connection in workflow.connections.iter() {
        outgoing
            .entry(connection.from.clone())
            .or_default()
            .push(connection.id.clone());
    }

    for block in workflow.blocks.iter_mut() {
        let actual = outgoing.remove(&block.id).unwrap_or_default();
        let mut rebuilt: Vec<ConnectionId> = Vec::with_capacity(actual.len());
        for id in block.connections.output.iter() {
            if actual.contains(id) && !rebuilt.contains(id) {
                rebuilt.push(id.clone());
            }
        }
        for id in actual {
            if !rebuilt.contains(&id) {
                rebuilt.push(id);
            }
        }

        if rebuilt != block.connections.output {
            block.connections.output = rebuilt;
            report.repaired(&block.id);
        }
    }
}
