//! Testing utilities for the DGO workspace
//!
//! Shared fixtures: scripted capabilities, canned connectors, a recording
//! notifier, and document builders in known lifecycle states.

#![allow(missing_docs)]

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use uuid::Uuid;

use dgo_content::DashboardConfig;
use dgo_engine::{
    ConnectorError, NotifyError, RefreshNotice, RefreshNotifier, SourceConnector, SourceFetch,
};
use dgo_ledger::{ScopeId, UsageMetrics};
use dgo_store::{Document, GenerationStatus, SyncSource};
use dgo_strategy::{
    CapabilityError, GenerationCapability, GenerationOutput, GenerationRequest,
};

/// A dashboard artifact with recognizable content
pub fn sample_config(title: &str) -> DashboardConfig {
    DashboardConfig::new(
        title,
        serde_json::json!({"charts": [{"kind": "bar"}]}),
        format!("<html><body><h1>{title}</h1></body></html>"),
        format!("{title} overview"),
    )
}

/// CSV content used across tests
pub fn sample_csv() -> String {
    "region,revenue\nwest,100\neast,200\n".to_string()
}

/// A completed, sync-linked document ready for refresh scenarios
pub fn completed_synced_document(
    scope: ScopeId,
    slug: &str,
    raw_content: &str,
    last_synced_at: Option<DateTime<Utc>>,
) -> Document {
    let mut doc = Document::new(slug, scope, raw_content).with_sync(SyncSource {
        connection_id: Uuid::new_v4(),
        resource_id: format!("{slug}-resource"),
        enabled: true,
        last_synced_at,
    });
    doc.status = GenerationStatus::Completed;
    doc.config = Some(sample_config(slug));
    doc.generation_completed_at = Some(Utc::now());
    doc
}

/// A document parked in an in-flight status since `started_at`
pub fn in_flight_document(
    scope: ScopeId,
    slug: &str,
    status: GenerationStatus,
    started_at: DateTime<Utc>,
) -> Document {
    let mut doc = Document::new(slug, scope, "a,b\n1,2\n");
    doc.status = status;
    doc.generation_started_at = Some(started_at);
    doc
}

/// One scripted response of a [`ScriptedCapability`]
pub type ScriptedResponse = Result<GenerationOutput, CapabilityError>;

/// Capability that replays scripted responses and records requests
#[derive(Debug)]
pub struct ScriptedCapability {
    name: &'static str,
    script: Mutex<VecDeque<ScriptedResponse>>,
    fallback: ScriptedResponse,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedCapability {
    /// Capability that always succeeds with a canned artifact and usage
    pub fn succeeding(name: &'static str, usage: UsageMetrics) -> Arc<Self> {
        Arc::new(Self {
            name,
            script: Mutex::new(VecDeque::new()),
            fallback: Ok(GenerationOutput {
                config: sample_config(name),
                change_summary: format!("produced by {name}"),
                usage,
            }),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Capability that always fails
    pub fn failing(name: &'static str, message: &str) -> Arc<Self> {
        Arc::new(Self {
            name,
            script: Mutex::new(VecDeque::new()),
            fallback: Err(CapabilityError::Generation(message.to_string())),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Queue a one-shot response consumed before the fallback applies
    pub fn push_response(&self, response: ScriptedResponse) {
        self.script.lock().push_back(response);
    }

    /// Number of generation calls received
    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Instructions of every received request, in order
    pub fn seen_instructions(&self) -> Vec<String> {
        self.requests
            .lock()
            .iter()
            .map(|r| r.instructions.clone())
            .collect()
    }
}

#[async_trait::async_trait]
impl GenerationCapability for ScriptedCapability {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationOutput, CapabilityError> {
        self.requests.lock().push(request.clone());
        if let Some(scripted) = self.script.lock().pop_front() {
            return scripted;
        }
        self.fallback.clone()
    }
}

/// Connector serving mutable in-memory content for any connection
#[derive(Debug)]
pub struct StaticConnector {
    content: Mutex<String>,
    fetch_count: Mutex<usize>,
}

impl StaticConnector {
    pub fn new(content: &str) -> Arc<Self> {
        Arc::new(Self {
            content: Mutex::new(content.to_string()),
            fetch_count: Mutex::new(0),
        })
    }

    /// Replace the served content (an "upstream edit")
    pub fn set_content(&self, content: &str) {
        *self.content.lock() = content.to_string();
    }

    pub fn fetch_count(&self) -> usize {
        *self.fetch_count.lock()
    }
}

#[async_trait::async_trait]
impl SourceConnector for StaticConnector {
    async fn fetch_latest(
        &self,
        _connection_id: Uuid,
        _resource_id: &str,
    ) -> Result<SourceFetch, ConnectorError> {
        *self.fetch_count.lock() += 1;
        Ok(SourceFetch::new(self.content.lock().clone()))
    }
}

/// Connector with per-resource behavior
///
/// Unrouted resources fail with a fetch error, which makes one document's
/// upstream outage easy to stage next to healthy siblings.
#[derive(Debug, Default)]
pub struct RoutedConnector {
    routes: Mutex<std::collections::HashMap<String, String>>,
}

impl RoutedConnector {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Serve `content` for `resource_id`
    pub fn route(&self, resource_id: &str, content: &str) {
        self.routes
            .lock()
            .insert(resource_id.to_string(), content.to_string());
    }

    /// Remove a route so the resource fails to fetch
    pub fn unroute(&self, resource_id: &str) {
        self.routes.lock().remove(resource_id);
    }
}

#[async_trait::async_trait]
impl SourceConnector for RoutedConnector {
    async fn fetch_latest(
        &self,
        _connection_id: Uuid,
        resource_id: &str,
    ) -> Result<SourceFetch, ConnectorError> {
        self.routes
            .lock()
            .get(resource_id)
            .map(|content| SourceFetch::new(content.clone()))
            .ok_or_else(|| ConnectorError::Fetch(format!("no upstream for {resource_id}")))
    }
}

/// Connector that always fails
#[derive(Debug, Default)]
pub struct FailingConnector;

#[async_trait::async_trait]
impl SourceConnector for FailingConnector {
    async fn fetch_latest(
        &self,
        _connection_id: Uuid,
        _resource_id: &str,
    ) -> Result<SourceFetch, ConnectorError> {
        Err(ConnectorError::Fetch("upstream unreachable".to_string()))
    }
}

/// Notifier that records delivered notices
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<RefreshNotice>>,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn notices(&self) -> Vec<RefreshNotice> {
        self.notices.lock().clone()
    }
}

#[async_trait::async_trait]
impl RefreshNotifier for RecordingNotifier {
    async fn notify_refreshed(&self, notice: RefreshNotice) -> Result<(), NotifyError> {
        self.notices.lock().push(notice);
        Ok(())
    }
}

/// Notifier that always fails delivery
#[derive(Debug, Default)]
pub struct FailingNotifier;

#[async_trait::async_trait]
impl RefreshNotifier for FailingNotifier {
    async fn notify_refreshed(&self, _notice: RefreshNotice) -> Result<(), NotifyError> {
        Err(NotifyError("smtp unreachable".to_string()))
    }
}
