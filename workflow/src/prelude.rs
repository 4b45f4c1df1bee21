pub use crate::block::{Block, BlockId, BlockType, Position, START_BLOCK_ID};
pub use crate::connection::{Connection, ConnectionId, PortRef, PortType};
pub use crate::document::{DocumentMetadata, WorkflowDocument};
pub use crate::error::Rejection;
pub use crate::graph::{BlockPatch, Cascade, SanitizeReport, Workflow};
pub use crate::protocol::{ConnectionProtocol, PortClickOutcome};
pub use crate::rect::CanvasRect;
