use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::block::Block;
use crate::connection::Connection;
use crate::graph::{SanitizeReport, Workflow};

/// Format version written into `metadata.version`.
pub const DOCUMENT_VERSION: &str = "1.0";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    pub website_id: String,
    /// RFC 3339, UTC.
    pub created_at: String,
    pub version: String,
}

/// The persisted form of a workflow: `{blocks, connections, metadata?}`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowDocument {
    #[serde(default)]
    pub blocks: Vec<Block>,
    #[serde(default)]
    pub connections: Vec<Connection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<DocumentMetadata>,
}

impl WorkflowDocument {
    pub fn from_workflow(workflow: &Workflow) -> WorkflowDocument {
        WorkflowDocument {
            blocks: workflow.blocks().to_vec(),
            connections: workflow.connections().to_vec(),
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, website_id: impl Into<String>, created_at: String) -> Self {
        self.metadata = Some(DocumentMetadata {
            website_id: website_id.into(),
            created_at,
            version: DOCUMENT_VERSION.to_string(),
        });
        self
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        serde_json::to_string(self).context("Failed to serialize workflow document")
    }

    pub fn from_json(json: &str) -> anyhow::Result<WorkflowDocument> {
        serde_json::from_str(json).context("Failed to parse workflow document")
    }

    pub fn into_workflow(self) -> (Workflow, SanitizeReport) {
        Workflow::from_records(self.blocks, self.connections)
    }

    /// Interprets the stored `workflow` field of a website record.
    ///
    /// Returns `None` when the field is absent, blank, unparsable or holds no
    /// blocks; older records predate the editor and carry any of these.
    pub fn parse_stored(stored: Option<&str>) -> Option<WorkflowDocument> {
        let stored = stored?.trim();
        if stored.is_empty() {
            return None;
        }
        match WorkflowDocument::from_json(stored) {
            Ok(document) if document.blocks.is_empty() => None,
            Ok(document) => Some(document),
            Err(err) => {
                tracing::debug!("Ignoring stored workflow: {err:#}");
                None
            }
        }
    }
}
