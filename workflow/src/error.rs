use thiserror::Error;

use crate::block::{BlockId, BlockType};
use crate::connection::{ConnectionId, PortType};

/// A mutation refused because it would break a graph invariant.
///
/// Rejections are always recoverable: the graph is left exactly as it was and
/// the message is meant to be shown to the user as-is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("Only one start block is allowed")]
    DuplicateStart,

    #[error("Block '{0}' does not exist")]
    BlockNotFound(BlockId),

    #[error("Connection '{0}' does not exist")]
    ConnectionNotFound(ConnectionId),

    #[error("Block '{block_id}' has no such {port} port")]
    PortNotExposed { block_id: BlockId, port: PortType },

    #[error("The start block cannot receive connections")]
    StartHasNoInput,

    #[error("A block cannot be connected to itself")]
    SelfConnection,

    #[error("Block '{0}' already has an incoming connection")]
    InputOccupied(BlockId),

    #[error("This output of block '{0}' is already connected")]
    OutputOccupied(BlockId),

    #[error("Condition '{condition}' is already bound to option block '{option}'")]
    ConditionAlreadyBound { condition: BlockId, option: BlockId },

    #[error("Only option blocks can have options, '{0}' blocks cannot")]
    OptionsNotSupported(BlockType),

    #[error("Only condition blocks can be bound to an option, '{0}' blocks cannot")]
    ConditionNotSupported(BlockType),

    #[error("Block '{0}' is not an option block")]
    NotAnOptionBlock(BlockId),

    #[error("Bind the condition to an option block before choosing an option")]
    ConditionNotBound,

    #[error("\"{0}\" is not one of the bound option block's options")]
    UnknownOption(String),
}
