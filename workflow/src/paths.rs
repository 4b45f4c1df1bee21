//! Advisory reachability check run before a save.

use std::collections::VecDeque;
use std::fmt;

use hashbrown::HashSet;

use crate::block::{BlockId, BlockType};
use crate::graph::Workflow;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PathIssue {
    MissingStart,
    /// A reachable block that is not an end block and leads nowhere.
    DeadEnd(BlockId),
    UnconnectedOption { block_id: BlockId, option_index: usize },
}

impl fmt::Display for PathIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathIssue::MissingStart => write!(f, "the workflow has no start block"),
            PathIssue::DeadEnd(id) => write!(f, "block {id} does not lead anywhere"),
            PathIssue::UnconnectedOption {
                block_id,
                option_index,
            } => write!(f, "option {} of block {block_id} is not connected", option_index + 1),
        }
    }
}

/// Walks every path from the start block and reports the ones that stop
/// before reaching an end block. Blocks not reachable from start are ignored.
pub fn unterminated_paths(workflow: &Workflow) -> Vec<PathIssue> {
    let Some(start) = workflow.start_block() else {
        return vec![PathIssue::MissingStart];
    };

    let mut issues = Vec::new();
    let mut visited: HashSet<BlockId> = HashSet::new();
    let mut queue = VecDeque::from([start.id.clone()]);
    visited.insert(start.id.clone());

    while let Some(id) = queue.pop_front() {
        let Some(block) = workflow.block(id.as_str()) else {
            continue;
        };

        match block.kind {
            BlockType::End => {}
            BlockType::Option if block.output_count() > 0 => {
                for option_index in 0..block.output_count() {
                    if workflow.outgoing(&id, Some(option_index)).next().is_none() {
                        issues.push(PathIssue::UnconnectedOption {
                            block_id: id.clone(),
                            option_index,
                        });
                    }
                }
            }
            _ => {
                if workflow.connections().iter().all(|c| c.from != id) {
                    issues.push(PathIssue::DeadEnd(id.clone()));
                }
            }
        }

        for connection in workflow.connections().iter().filter(|c| c.from == id) {
            if visited.insert(connection.to.clone()) {
                queue.push_back(connection.to.clone());
            }
        }
    }

    issues
}
