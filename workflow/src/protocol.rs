//! Two-click connection creation.
//!
//! The first click on a port arms a pending selection; the second click on a
//! port of the opposite type attempts the pairing. Clicking the armed port
//! again, or any port of the same type, just disarms it.

use crate::block::BlockType;
use crate::connection::{ConnectionId, PortRef, PortType};
use crate::error::Rejection;
use crate::graph::Workflow;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PortClickOutcome {
    /// The port is now the pending first half of a connection.
    Pending(PortRef),
    /// The pending selection was dropped without error.
    Deselected,
    Connected(ConnectionId),
    Rejected(Rejection),
}

#[derive(Debug, Default, Clone)]
pub struct ConnectionProtocol {
    pending: Option<PortRef>,
}

impl ConnectionProtocol {
    pub fn pending(&self) -> Option<&PortRef> {
        self.pending.as_ref()
    }

    pub fn is_awaiting_second_click(&self) -> bool {
        self.pending.is_some()
    }

    pub fn clear(&mut self) {
        if self.pending.take().is_some() {
            tracing::debug!("Pending connection cleared");
        }
    }

    /// Handles a click on `port`. The pending selection never survives a
    /// second click, whatever its outcome.
    pub fn click(&mut self, workflow: &mut Workflow, port: PortRef) -> PortClickOutcome {
        if let Err(rejection) = workflow.check_port(&port) {
            tracing::info!("Port click rejected: {rejection}");
            self.pending = None;
            return PortClickOutcome::Rejected(rejection);
        }

        let Some(first) = self.pending.take() else {
            tracing::debug!("Pending connection from {:?}", port);
            self.pending = Some(port.clone());
            return PortClickOutcome::Pending(port);
        };

        if first == port || first.port == port.port {
            tracing::debug!("Pending connection deselected");
            return PortClickOutcome::Deselected;
        }

        let (output, input) = match first.port {
            PortType::Output => (first, port),
            PortType::Input => (port, first),
        };

        let result = check_pairing(workflow, &output, &input).and_then(|()| {
            workflow.add_connection(&output.block_id, &input.block_id, output.option_index)
        });
        match result {
            Ok(id) => PortClickOutcome::Connected(id),
            Err(rejection) => {
                tracing::info!("Connection rejected: {rejection}");
                PortClickOutcome::Rejected(rejection)
            }
        }
    }
}

/// Port-occupancy rules for connecting `output` to `input`, checked in order.
pub fn check_pairing(
    workflow: &Workflow,
    output: &PortRef,
    input: &PortRef,
) -> Result<(), Rejection> {
    assert_eq!(output.port, PortType::Output);
    assert_eq!(input.port, PortType::Input);

    let source = workflow.check_port(output)?;
    let target = workflow.check_port(input)?;

    if source.id == target.id {
        return Err(Rejection::SelfConnection);
    }

    let option_to_condition =
        source.kind == BlockType::Option && target.kind == BlockType::Condition;
    if option_to_condition {
        let bound_elsewhere = workflow.incoming(&target.id).find(|connection| {
            workflow
                .block(connection.from.as_str())
                .is_some_and(|block| block.kind == BlockType::Option)
        });
        if let Some(existing) = bound_elsewhere {
            return Err(Rejection::ConditionAlreadyBound {
                condition: target.id.clone(),
                option: existing.from.clone(),
            });
        }
    } else if workflow.incoming(&target.id).next().is_some() {
        return Err(Rejection::InputOccupied(target.id.clone()));
    }

    let condition_to_option =
        source.kind == BlockType::Condition && target.kind == BlockType::Option;
    if !condition_to_option
        && workflow
            .outgoing(&source.id, output.option_index)
            .next()
            .is_some()
    {
        return Err(Rejection::OutputOccupied(source.id.clone()));
    }

    Ok(())
}
