//! Load and save of the workflow document through the website service.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use workflow::document::WorkflowDocument;
use workflow::graph::{SanitizeReport, Workflow};

use crate::feedback::Notice;

/// The part of a website configuration record the editor reads.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WebsiteRecord {
    pub id: String,
    /// JSON-encoded [`WorkflowDocument`]; absent on records that predate the editor.
    #[serde(default)]
    pub workflow: Option<String>,
}

/// Partial update submitted on save.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebsitePatch {
    pub workflow: String,
    pub owner_id: String,
}

/// The remote service that stores website configuration records.
#[async_trait]
pub trait WebsiteStore: Send + Sync {
    async fn fetch_website(&self, website_id: &str) -> anyhow::Result<WebsiteRecord>;
    async fn update_website(&self, website_id: &str, patch: WebsitePatch) -> anyhow::Result<()>;
}

/// In-process store for tests and demos.
#[derive(Debug, Default)]
pub struct MemoryWebsiteStore {
    records: Mutex<HashMap<String, WebsiteRecord>>,
    patches: Mutex<Vec<(String, WebsitePatch)>>,
    failing: AtomicBool,
}

impl MemoryWebsiteStore {
    pub fn with_record(record: WebsiteRecord) -> MemoryWebsiteStore {
        let mut records = HashMap::new();
        records.insert(record.id.clone(), record);
        MemoryWebsiteStore {
            records: Mutex::new(records),
            ..Default::default()
        }
    }

    /// Makes every following call fail as a network error would.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn record(&self, website_id: &str) -> Option<WebsiteRecord> {
        self.records.lock().await.get(website_id).cloned()
    }

    /// Every patch accepted so far, oldest first.
    pub async fn patches(&self) -> Vec<(String, WebsitePatch)> {
        self.patches.lock().await.clone()
    }

    fn check_online(&self) -> anyhow::Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            anyhow::bail!("website service unreachable");
        }
        Ok(())
    }
}

#[async_trait]
impl WebsiteStore for MemoryWebsiteStore {
    async fn fetch_website(&self, website_id: &str) -> anyhow::Result<WebsiteRecord> {
        self.check_online()?;
        self.records
            .lock()
            .await
            .get(website_id)
            .cloned()
            .with_context(|| format!("Website {website_id} not found"))
    }

    async fn update_website(&self, website_id: &str, patch: WebsitePatch) -> anyhow::Result<()> {
        self.check_online()?;
        let mut records = self.records.lock().await;
        let record = records
            .get_mut(website_id)
            .with_context(|| format!("Website {website_id} not found"))?;
        record.workflow = Some(patch.workflow.clone());
        self.patches
            .lock()
            .await
            .push((website_id.to_string(), patch));
        Ok(())
    }
}

/// Result of loading the stored workflow. Every variant carries a usable graph.
#[derive(Debug)]
pub enum LoadOutcome {
    Loaded {
        workflow: Workflow,
        report: SanitizeReport,
    },
    /// The record holds no usable document; the default graph is used.
    NoDocument { workflow: Workflow },
    /// The service could not be reached; the default graph is used.
    Failed {
        workflow: Workflow,
        error: anyhow::Error,
    },
}

impl LoadOutcome {
    pub fn workflow(&self) -> &Workflow {
        match self {
            LoadOutcome::Loaded { workflow, .. }
            | LoadOutcome::NoDocument { workflow }
            | LoadOutcome::Failed { workflow, .. } => workflow,
        }
    }

    pub fn into_workflow(self) -> Workflow {
        match self {
            LoadOutcome::Loaded { workflow, .. }
            | LoadOutcome::NoDocument { workflow }
            | LoadOutcome::Failed { workflow, .. } => workflow,
        }
    }

    /// What the user should be told, if anything.
    pub fn notice(&self) -> Option<Notice> {
        match self {
            LoadOutcome::Failed { error, .. } => Some(Notice::error(format!(
                "Failed to load the workflow: {error:#}"
            ))),
            _ => None,
        }
    }
}

/// Bridges one website's stored document and the in-memory graph.
#[derive(Clone)]
pub struct PersistenceAdapter {
    store: Arc<dyn WebsiteStore>,
    website_id: String,
}

impl PersistenceAdapter {
    pub fn new(store: Arc<dyn WebsiteStore>, website_id: impl Into<String>) -> PersistenceAdapter {
        PersistenceAdapter {
            store,
            website_id: website_id.into(),
        }
    }

    pub fn website_id(&self) -> &str {
        &self.website_id
    }

    pub async fn load(&self) -> LoadOutcome {
        tracing::info!("Loading workflow of website {}", self.website_id);
        let record = match self.store.fetch_website(&self.website_id).await {
            Ok(record) => record,
            Err(error) => {
                tracing::warn!("Workflow load failed: {error:#}");
                return LoadOutcome::Failed {
                    workflow: Workflow::with_default_start(),
                    error,
                };
            }
        };

        match WorkflowDocument::parse_stored(record.workflow.as_deref()) {
            Some(document) => {
                let (workflow, report) = document.into_workflow();
                tracing::info!(
                    "Loaded workflow with {} blocks and {} connections",
                    workflow.blocks().len(),
                    workflow.connections().len()
                );
                LoadOutcome::Loaded { workflow, report }
            }
            None => {
                tracing::info!("No stored workflow, starting from the default graph");
                LoadOutcome::NoDocument {
                    workflow: Workflow::with_default_start(),
                }
            }
        }
    }

    /// Submits `document` as a partial update of the website record.
    pub async fn save(&self, document: &WorkflowDocument, owner_id: &str) -> anyhow::Result<()> {
        let patch = WebsitePatch {
            workflow: document.to_json()?,
            owner_id: owner_id.to_string(),
        };
        tracing::info!(
            "Saving workflow of website {} ({} blocks)",
            self.website_id,
            document.blocks.len()
        );
        self.store
            .update_website(&self.website_id, patch)
            .await
            .with_context(|| format!("Failed to save workflow of website {}", self.website_id))
    }

    /// Runs [`PersistenceAdapter::save`] in the background so editing can go on.
    pub fn spawn_save(
        &self,
        document: WorkflowDocument,
        owner_id: impl Into<String>,
    ) -> JoinHandle<anyhow::Result<()>> {
        let adapter = self.clone();
        let owner_id = owner_id.into();
        tokio::spawn(async move { adapter.save(&document, &owner_id).await })
    }
}
