use serde::{Deserialize, Serialize};
use strum_macros::Display;

use crate::block::BlockId;
use common::string_id_type;

string_id_type!(ConnectionId);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum PortType {
    Input,
    Output,
}

impl PortType {
    pub fn opposite(self) -> PortType {
        match self {
            PortType::Input => PortType::Output,
            PortType::Output => PortType::Input,
        }
    }
}

/// Address of a single port: a block, a side, and for option blocks the output index.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PortRef {
    pub block_id: BlockId,
    pub port: PortType,
    pub option_index: Option<usize>,
}

impl PortRef {
    pub fn input(block_id: BlockId) -> PortRef {
        PortRef {
            block_id,
            port: PortType::Input,
            option_index: None,
        }
    }

    pub fn output(block_id: BlockId) -> PortRef {
        PortRef {
            block_id,
            port: PortType::Output,
            option_index: None,
        }
    }

    pub fn option_output(block_id: BlockId, option_index: usize) -> PortRef {
        PortRef {
            block_id,
            port: PortType::Output,
            option_index: Some(option_index),
        }
    }
}

fn output_port_type() -> PortType {
    PortType::Output
}

fn input_port_type() -> PortType {
    PortType::Input
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub id: ConnectionId,
    pub from: BlockId,
    pub to: BlockId,
    #[serde(default = "output_port_type")]
    pub from_type: PortType,
    #[serde(default = "input_port_type")]
    pub to_type: PortType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_option_index: Option<usize>,
}

impl Connection {
    pub fn source_port(&self) -> PortRef {
        PortRef {
            block_id: self.from.clone(),
            port: PortType::Output,
            option_index: self.from_option_index,
        }
    }

    pub fn target_port(&self) -> PortRef {
        PortRef::input(self.to.clone())
    }

    pub fn touches(&self, block_id: &BlockId) -> bool {
        self.from == *block_id || self.to == *block_id
    }

    /// `"<from>-<to>-<optionIndex or ''>-<millis>"`
    pub fn make_id(
        from: &BlockId,
        to: &BlockId,
        from_option_index: Option<usize>,
        millis: i64,
    ) -> ConnectionId {
        let index = from_option_index
            .map(|index| index.to_string())
            .unwrap_or_default();
        ConnectionId::new(format!("{from}-{to}-{index}-{millis}"))
    }
}
