//! The workflow graph: blocks, connections and the invariants tying them together.
//!
//! [`Workflow`] is the single source of truth for the editor. Every mutation
//! either succeeds completely, including its silent cascades, or returns a
//! [`Rejection`] and leaves the graph untouched.

mod sanitize;
#[cfg(test)]
mod tests;

use glam::Vec2;
use hashbrown::HashMap;

use crate::block::{Block, BlockId, BlockType, START_BLOCK_ID};
use crate::connection::{Connection, ConnectionId, PortRef, PortType};
use crate::constants::{canvas_center_block_position, clamp_block_position};
use crate::error::Rejection;
use crate::rect::CanvasRect;
use common::key_index_vec::{KeyIndexKey, KeyIndexVec};
use common::{is_debug, timestamp};

pub use sanitize::SanitizeReport;

impl KeyIndexKey<BlockId> for Block {
    fn key(&self) -> &BlockId {
        &self.id
    }
}

impl KeyIndexKey<ConnectionId> for Connection {
    fn key(&self) -> &ConnectionId {
        &self.id
    }
}

/// Partial update for [`Workflow::update_block`]. `None` leaves a field unchanged.
///
/// The nested options of `condition_id` and `selected_condition` allow clearing:
/// `Some(None)` removes the value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BlockPatch {
    pub name: Option<String>,
    pub message: Option<String>,
    pub description: Option<String>,
    pub position: Option<Vec2>,
    pub options: Option<Vec<String>>,
    pub condition_id: Option<Option<BlockId>>,
    pub selected_condition: Option<Option<String>>,
}

impl BlockPatch {
    pub fn options<S: Into<String>>(options: impl IntoIterator<Item = S>) -> BlockPatch {
        BlockPatch {
            options: Some(options.into_iter().map(Into::into).collect()),
            ..Default::default()
        }
    }

    pub fn position(position: Vec2) -> BlockPatch {
        BlockPatch {
            position: Some(position),
            ..Default::default()
        }
    }
}

/// Side effects a mutation performed on records other than its direct target.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Cascade {
    pub removed_connections: Vec<Connection>,
    /// Condition blocks whose `conditionId` or `selectedCondition` was cleared.
    pub cleared_conditions: Vec<BlockId>,
}

impl Cascade {
    pub fn is_empty(&self) -> bool {
        self.removed_connections.is_empty() && self.cleared_conditions.is_empty()
    }

    fn note_cleared(&mut self, block_id: &BlockId) {
        if !self.cleared_conditions.contains(block_id) {
            self.cleared_conditions.push(block_id.clone());
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Workflow {
    blocks: KeyIndexVec<BlockId, Block>,
    connections: KeyIndexVec<ConnectionId, Connection>,
    /// Highest id suffix ever handed out per block type in this session.
    id_high_water: HashMap<BlockType, u32>,
}

impl Workflow {
    pub fn new() -> Workflow {
        Workflow::default()
    }

    /// A graph holding only the start block, centred on the canvas.
    pub fn with_default_start() -> Workflow {
        let mut workflow = Workflow::new();
        let start = Block::new(
            BlockId::from(START_BLOCK_ID),
            BlockType::Start,
            canvas_center_block_position(),
        );
        workflow.blocks.push(start);
        workflow
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    pub fn blocks(&self) -> &[Block] {
        self.blocks.as_slice()
    }

    pub fn connections(&self) -> &[Connection] {
        self.connections.as_slice()
    }

    pub fn block(&self, id: &str) -> Option<&Block> {
        self.blocks.by_key(id)
    }

    pub fn connection(&self, id: &str) -> Option<&Connection> {
        self.connections.by_key(id)
    }

    pub fn start_block(&self) -> Option<&Block> {
        self.block(START_BLOCK_ID)
            .filter(|block| block.kind == BlockType::Start)
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Connections arriving at the input port of `id`.
    pub fn incoming<'a>(&'a self, id: &'a BlockId) -> impl Iterator<Item = &'a Connection> + 'a {
        self.connections.iter().filter(move |c| c.to == *id)
    }

    /// Connections leaving the given output port of `id`.
    pub fn outgoing<'a>(
        &'a self,
        id: &'a BlockId,
        option_index: Option<usize>,
    ) -> impl Iterator<Item = &'a Connection> + 'a {
        self.connections
            .iter()
            .filter(move |c| c.from == *id && c.from_option_index == option_index)
    }

    /// Union of all block footprints.
    pub fn bounding_box(&self) -> Option<CanvasRect> {
        self.blocks
            .iter()
            .map(Block::footprint)
            .reduce(|acc, rect| acc.union(&rect))
    }

    /// Checks that `port` exists on an existing block.
    pub fn check_port(&self, port: &PortRef) -> Result<&Block, Rejection> {
        let block = self
            .block(port.block_id.as_str())
            .ok_or_else(|| Rejection::BlockNotFound(port.block_id.clone()))?;
        if block.kind == BlockType::Start && port.port == PortType::Input {
            return Err(Rejection::StartHasNoInput);
        }
        if !block.exposes(port) {
            return Err(Rejection::PortNotExposed {
                block_id: block.id.clone(),
                port: port.port,
            });
        }
        Ok(block)
    }

    // ------------------------------------------------------------------------
    // Blocks
    // ------------------------------------------------------------------------

    /// Creates a block of `kind` with its top-left corner at `at` (clamped).
    pub fn add_block(&mut self, kind: BlockType, at: Vec2) -> Result<BlockId, Rejection> {
        if kind == BlockType::Start && self.start_block().is_some() {
            tracing::info!("Rejected second start block");
            return Err(Rejection::DuplicateStart);
        }

        let id = self.next_block_id(kind);
        let block = Block::new(id.clone(), kind, at);
        tracing::debug!("Adding block {} at {:?}", id, block.position);
        self.blocks.push(block);

        self.debug_validate();
        Ok(id)
    }

    fn next_block_id(&mut self, kind: BlockType) -> BlockId {
        if kind == BlockType::Start {
            return BlockId::from(START_BLOCK_ID);
        }

        let prefix = kind.wire_name();
        let existing_max = self
            .blocks
            .iter()
            .filter(|block| block.kind == kind)
            .filter_map(|block| id_suffix(block.id.as_str(), prefix))
            .max()
            .unwrap_or(0);
        let high_water = self.id_high_water.entry(kind).or_insert(0);
        let Some(mut next) = (*high_water).max(existing_max).checked_add(1) else {
            return self.lowest_free_block_id(prefix);
        };
        *high_water = next;

        // A loaded document may hold e.g. "option7" on a block of another type.
        while self.blocks.contains_key(format!("{prefix}{next}").as_str()) {
            let Some(bumped) = next.checked_add(1) else {
                return self.lowest_free_block_id(prefix);
            };
            next = bumped;
            *high_water = next;
        }
        BlockId::new(format!("{prefix}{next}"))
    }

    /// Fallback once a loaded suffix has exhausted the counter.
    fn lowest_free_block_id(&self, prefix: &str) -> BlockId {
        tracing::warn!("Id suffixes for {prefix} exhausted, reusing the lowest free one");
        (1..=u32::MAX)
            .map(|suffix| format!("{prefix}{suffix}"))
            .find(|id| !self.blocks.contains_key(id.as_str()))
            .map(BlockId::new)
            .unwrap_or_else(|| BlockId::new(format!("{prefix}0")))
    }

    /// Applies `patch` to block `id`.
    ///
    /// Shrinking an option list drops connections from vanished outputs and
    /// clears `selectedCondition` on bound conditions that lost their option.
    pub fn update_block(&mut self, id: &str, patch: BlockPatch) -> Result<Cascade, Rejection> {
        let block = self
            .block(id)
            .ok_or_else(|| Rejection::BlockNotFound(BlockId::from(id)))?;
        let kind = block.kind;

        if patch.options.is_some() && kind != BlockType::Option {
            return Err(Rejection::OptionsNotSupported(kind));
        }
        let touches_condition =
            patch.condition_id.is_some() || patch.selected_condition.is_some();
        if touches_condition && kind != BlockType::Condition {
            return Err(Rejection::ConditionNotSupported(kind));
        }

        let condition_id = match &patch.condition_id {
            Some(new) => new.clone(),
            None => block.condition_id.clone(),
        };
        // A binding carried by an option wire only changes with that wire.
        if patch.condition_id.is_some() {
            let wired = self
                .incoming(&block.id)
                .find(|connection| {
                    self.block(connection.from.as_str())
                        .is_some_and(|source| source.kind == BlockType::Option)
                })
                .map(|connection| connection.from.clone());
            if let Some(wired) = wired {
                if condition_id.as_ref() != Some(&wired) {
                    return Err(Rejection::ConditionAlreadyBound {
                        condition: block.id.clone(),
                        option: wired,
                    });
                }
            }
        }
        let bound_option = match &condition_id {
            Some(option_id) => Some(
                self.block(option_id.as_str())
                    .filter(|option| option.kind == BlockType::Option)
                    .ok_or_else(|| Rejection::NotAnOptionBlock(option_id.clone()))?,
            ),
            None => None,
        };
        let selected_condition = match &patch.selected_condition {
            Some(Some(selected)) => {
                let option = bound_option.ok_or(Rejection::ConditionNotBound)?;
                if !option.has_option(selected) {
                    return Err(Rejection::UnknownOption(selected.clone()));
                }
                Some(selected.clone())
            }
            Some(None) => None,
            // A rebinding silently drops a selection the new option block lacks.
            None => block
                .selected_condition
                .clone()
                .filter(|selected| bound_option.is_some_and(|option| option.has_option(selected))),
        };

        let block = self
            .blocks
            .by_key_mut(id)
            .expect("block existence checked above");
        if let Some(name) = patch.name {
            block.name = name;
        }
        if let Some(message) = patch.message {
            block.message = message;
        }
        if let Some(description) = patch.description {
            block.description = description;
        }
        if let Some(position) = patch.position {
            block.position = clamp_block_position(position).into();
        }
        if kind == BlockType::Condition {
            block.condition_id = condition_id;
            block.selected_condition = selected_condition;
        }

        let mut cascade = Cascade::default();
        if let Some(options) = patch.options {
            block.options = Some(options);
            let block_id = block.id.clone();
            self.cascade_option_change(&block_id, &mut cascade);
        }

        tracing::debug!("Updated block {id}");
        self.debug_validate();
        Ok(cascade)
    }

    fn cascade_option_change(&mut self, option_id: &BlockId, cascade: &mut Cascade) {
        let option_count = self
            .block(option_id.as_str())
            .map(Block::output_count)
            .unwrap_or(0);
        let removed = self.connections.retain_with(|connection| {
            !(connection.from == *option_id
                && connection
                    .from_option_index
                    .map_or(true, |index| index >= option_count))
        });
        for connection in removed {
            tracing::debug!(
                "Removed connection {} from vanished output of {}",
                connection.id,
                option_id
            );
            self.detach_connection(&connection, cascade);
            cascade.removed_connections.push(connection);
        }

        let options: Vec<String> = self
            .block(option_id.as_str())
            .map(|block| block.options().to_vec())
            .unwrap_or_default();
        for block in self.blocks.iter_mut() {
            if block.kind != BlockType::Condition || block.condition_id.as_ref() != Some(option_id)
            {
                continue;
            }
            let stale = block
                .selected_condition
                .as_ref()
                .is_some_and(|selected| !options.contains(selected));
            if stale {
                block.selected_condition = None;
                cascade.note_cleared(&block.id);
            }
        }
    }

    /// Moves block `id` so its top-left corner is at `position`, clamped. Returns the applied position.
    pub fn move_block(&mut self, id: &str, position: Vec2) -> Result<Vec2, Rejection> {
        let block = self
            .blocks
            .by_key_mut(id)
            .ok_or_else(|| Rejection::BlockNotFound(BlockId::from(id)))?;
        let clamped = clamp_block_position(position);
        block.position = clamped.into();
        Ok(clamped)
    }

    /// Shifts every listed block by `delta`, clamping each one on its own.
    ///
    /// Unknown ids are skipped. Returns the new position of every moved block.
    pub fn translate_blocks<'a>(
        &mut self,
        ids: impl IntoIterator<Item = &'a BlockId>,
        delta: Vec2,
    ) -> Vec<(BlockId, Vec2)> {
        let mut moved = Vec::new();
        for id in ids {
            if let Some(block) = self.blocks.by_key_mut(id.as_str()) {
                let position = clamp_block_position(block.pos() + delta);
                block.position = position.into();
                moved.push((id.clone(), position));
            }
        }
        moved
    }

    /// Removes block `id` together with every connection touching it.
    pub fn delete_block(&mut self, id: &str) -> Result<(Block, Cascade), Rejection> {
        let removed = self
            .blocks
            .remove_by_key(id)
            .ok_or_else(|| Rejection::BlockNotFound(BlockId::from(id)))?;

        let mut cascade = Cascade::default();
        let detached = self
            .connections
            .retain_with(|connection| !connection.touches(&removed.id));
        for connection in detached {
            self.detach_connection(&connection, &mut cascade);
            cascade.removed_connections.push(connection);
        }

        if removed.kind == BlockType::Option {
            for block in self.blocks.iter_mut() {
                if block.condition_id.as_ref() == Some(&removed.id) {
                    block.condition_id = None;
                    block.selected_condition = None;
                    cascade.note_cleared(&block.id);
                }
            }
        }

        tracing::info!(
            "Deleted block {} ({} connections removed)",
            removed.id,
            cascade.removed_connections.len()
        );
        self.debug_validate();
        Ok((removed, cascade))
    }

    // ------------------------------------------------------------------------
    // Connections
    // ------------------------------------------------------------------------

    /// Adds an edge from an output of `from` to the input of `to`.
    ///
    /// Only structural rules are enforced here; port occupancy is the job of
    /// [`crate::protocol::ConnectionProtocol`]. An option→condition edge binds
    /// the condition to the option block.
    pub fn add_connection(
        &mut self,
        from: &BlockId,
        to: &BlockId,
        from_option_index: Option<usize>,
    ) -> Result<ConnectionId, Rejection> {
        let source = PortRef {
            block_id: from.clone(),
            port: PortType::Output,
            option_index: from_option_index,
        };
        let target = PortRef::input(to.clone());

        let target_kind = self.check_port(&target)?.kind;
        let source_kind = self.check_port(&source)?.kind;
        if from == to {
            return Err(Rejection::SelfConnection);
        }

        let id = self.unique_connection_id(from, to, from_option_index);
        let connection = Connection {
            id: id.clone(),
            from: from.clone(),
            to: to.clone(),
            from_type: PortType::Output,
            to_type: PortType::Input,
            from_option_index,
        };
        self.connections.push(connection);

        self.blocks
            .by_key_mut(from.as_str())
            .expect("source checked above")
            .connections
            .output
            .push(id.clone());

        if source_kind == BlockType::Option && target_kind == BlockType::Condition {
            let condition = self
                .blocks
                .by_key_mut(to.as_str())
                .expect("target checked above");
            if condition.condition_id.as_ref() != Some(from) {
                condition.condition_id = Some(from.clone());
                condition.selected_condition = None;
            }
        }

        tracing::info!("Connected {} -> {} ({})", from, to, id);
        self.debug_validate();
        Ok(id)
    }

    fn unique_connection_id(
        &self,
        from: &BlockId,
        to: &BlockId,
        from_option_index: Option<usize>,
    ) -> ConnectionId {
        let mut millis = timestamp::now_millis();
        loop {
            let id = Connection::make_id(from, to, from_option_index, millis);
            if !self.connections.contains_key(id.as_str()) {
                return id;
            }
            millis += 1;
        }
    }

    /// Removes connection `id`, undoing an option→condition binding it carried.
    pub fn delete_connection(&mut self, id: &str) -> Result<(Connection, Cascade), Rejection> {
        let removed = self
            .connections
            .remove_by_key(id)
            .ok_or_else(|| Rejection::ConnectionNotFound(ConnectionId::from(id)))?;

        let mut cascade = Cascade::default();
        self.detach_connection(&removed, &mut cascade);

        tracing::info!("Removed connection {}", removed.id);
        self.debug_validate();
        Ok((removed, cascade))
    }

    /// Fixes up block bookkeeping after `connection` left the connection list.
    fn detach_connection(&mut self, connection: &Connection, cascade: &mut Cascade) {
        if let Some(source) = self.blocks.by_key_mut(connection.from.as_str()) {
            source.connections.output.retain(|id| *id != connection.id);
        }

        let from_is_option = self
            .block(connection.from.as_str())
            .is_some_and(|block| block.kind == BlockType::Option);
        if !from_is_option {
            return;
        }
        if let Some(target) = self.blocks.by_key_mut(connection.to.as_str()) {
            if target.kind == BlockType::Condition
                && target.condition_id.as_ref() == Some(&connection.from)
            {
                target.condition_id = None;
                target.selected_condition = None;
                cascade.note_cleared(&target.id);
            }
        }
    }

    // ------------------------------------------------------------------------
    // Validation
    // ------------------------------------------------------------------------

    /// Verifies every structural invariant and reports the first violation.
    pub fn validate(&self) -> anyhow::Result<()> {
        let starts: Vec<&Block> = self
            .blocks
            .iter()
            .filter(|block| block.kind == BlockType::Start)
            .collect();
        if starts.len() > 1 {
            anyhow::bail!("more than one start block");
        }
        if let Some(start) = starts.first() {
            if start.id != START_BLOCK_ID {
                anyhow::bail!("start block must have id '{START_BLOCK_ID}'");
            }
        }

        for block in self.blocks.iter() {
            if clamp_block_position(block.pos()) != block.pos() {
                anyhow::bail!("block {} is outside the canvas", block.id);
            }
            if block.options.is_some() && block.kind != BlockType::Option {
                anyhow::bail!("non-option block {} carries options", block.id);
            }
            if let Some(condition_id) = &block.condition_id {
                let option = self
                    .block(condition_id.as_str())
                    .filter(|option| option.kind == BlockType::Option)
                    .ok_or_else(|| {
                        anyhow::anyhow!("block {} bound to missing option block", block.id)
                    })?;
                if let Some(selected) = &block.selected_condition {
                    if !option.has_option(selected) {
                        anyhow::bail!("block {} selects an unknown option", block.id);
                    }
                }
            } else if block.selected_condition.is_some() {
                anyhow::bail!("block {} selects an option without a binding", block.id);
            }

            let expected: Vec<&ConnectionId> = self
                .connections
                .iter()
                .filter(|connection| connection.from == block.id)
                .map(|connection| &connection.id)
                .collect();
            let mut recorded: Vec<&ConnectionId> = block.connections.output.iter().collect();
            let mut expected_sorted = expected.clone();
            recorded.sort();
            expected_sorted.sort();
            if recorded != expected_sorted {
                anyhow::bail!("output bookkeeping of block {} is stale", block.id);
            }
        }

        for connection in self.connections.iter() {
            let source = self
                .check_port(&connection.source_port())
                .map_err(|err| anyhow::anyhow!("connection {}: {err}", connection.id))?;
            self.check_port(&connection.target_port())
                .map_err(|err| anyhow::anyhow!("connection {}: {err}", connection.id))?;
            if connection.from_type != PortType::Output || connection.to_type != PortType::Input
            {
                anyhow::bail!("connection {} has inverted port types", connection.id);
            }
            debug_assert!(source.id == connection.from);
        }

        Ok(())
    }

    fn debug_validate(&self) {
        if is_debug() {
            if let Err(err) = self.validate() {
                panic!("workflow invariant broken: {err}");
            }
        }
    }
}

/// Numeric suffix of `id` after `prefix`, e.g. `option12` -> 12.
fn id_suffix(id: &str, prefix: &str) -> Option<u32> {
    id.strip_prefix(prefix)?.parse().ok()
}
