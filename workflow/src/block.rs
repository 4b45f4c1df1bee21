use glam::Vec2;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::connection::{ConnectionId, PortRef, PortType};
use crate::constants::clamp_block_position;
use crate::rect::CanvasRect;
use common::string_id_type;

string_id_type!(BlockId);

/// Id of the single start block.
pub const START_BLOCK_ID: &str = "start";

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum BlockType {
    Start,
    Option,
    Condition,
    Message,
    End,
    UserResponse,
}

impl BlockType {
    /// Name used on the wire and as the id prefix, e.g. `userResponse`.
    pub fn wire_name(self) -> &'static str {
        self.into()
    }

    pub fn has_input(self) -> bool {
        self != BlockType::Start
    }

    /// Multi-output blocks address each output by index.
    pub fn has_indexed_outputs(self) -> bool {
        self == BlockType::Option
    }

    pub fn default_name(self) -> &'static str {
        match self {
            BlockType::Start => "Start",
            BlockType::Option => "Options",
            BlockType::Condition => "Condition",
            BlockType::Message => "Message",
            BlockType::End => "End",
            BlockType::UserResponse => "User Response",
        }
    }

    pub fn default_message(self) -> &'static str {
        match self {
            BlockType::Start => "Hello! How can I help you today?",
            BlockType::Option => "Please choose one of the following options:",
            BlockType::Condition => "Continue when the visitor picked the selected option",
            BlockType::Message => "Enter your message here",
            BlockType::End => "Thanks for chatting! A member of our team will take it from here.",
            BlockType::UserResponse => "Waiting for the visitor to reply",
        }
    }

    pub fn default_description(self) -> &'static str {
        match self {
            BlockType::Start => "Entry point of the conversation",
            BlockType::Option => "Offers the visitor a list of choices",
            BlockType::Condition => "Branches on an option chosen earlier",
            BlockType::Message => "Sends a message to the visitor",
            BlockType::End => "Hands the conversation over to a human agent",
            BlockType::UserResponse => "Collects free-form input from the visitor",
        }
    }

    fn default_options(self) -> Option<Vec<String>> {
        (self == BlockType::Option).then(|| vec!["Option 1".to_string(), "Option 2".to_string()])
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl From<Vec2> for Position {
    fn from(value: Vec2) -> Self {
        Position {
            x: value.x,
            y: value.y,
        }
    }
}

impl From<Position> for Vec2 {
    fn from(value: Position) -> Self {
        Vec2::new(value.x, value.y)
    }
}

#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct BlockConnections {
    /// Carried through untouched; older documents store arbitrary data here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub output: Vec<ConnectionId>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub id: BlockId,
    #[serde(rename = "type")]
    pub kind: BlockType,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub description: String,
    pub position: Position,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition_id: Option<BlockId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_condition: Option<String>,
    #[serde(default)]
    pub connections: BlockConnections,
}

impl Block {
    /// A block of `kind` with the type's default texts, clamped into the canvas.
    pub fn new(id: BlockId, kind: BlockType, position: Vec2) -> Block {
        Block {
            id,
            kind,
            name: kind.default_name().to_string(),
            message: kind.default_message().to_string(),
            description: kind.default_description().to_string(),
            position: clamp_block_position(position).into(),
            options: kind.default_options(),
            condition_id: None,
            selected_condition: None,
            connections: BlockConnections::default(),
        }
    }

    pub fn pos(&self) -> Vec2 {
        self.position.into()
    }

    pub fn footprint(&self) -> CanvasRect {
        CanvasRect::block_footprint(self.pos())
    }

    pub fn options(&self) -> &[String] {
        self.options.as_deref().unwrap_or(&[])
    }

    pub fn has_option(&self, option: &str) -> bool {
        self.options().iter().any(|candidate| candidate == option)
    }

    /// Number of output ports this block exposes.
    pub fn output_count(&self) -> usize {
        match self.kind {
            BlockType::End => 0,
            BlockType::Option => self.options().len(),
            _ => 1,
        }
    }

    /// Whether `port` addresses a port this block actually has.
    pub fn exposes(&self, port: &PortRef) -> bool {
        assert!(port.block_id == self.id, "port must belong to this block");

        match port.port {
            PortType::Input => self.kind.has_input() && port.option_index.is_none(),
            PortType::Output if self.kind.has_indexed_outputs() => port
                .option_index
                .is_some_and(|index| index < self.output_count()),
            PortType::Output => self.output_count() == 1 && port.option_index.is_none(),
        }
    }
}
