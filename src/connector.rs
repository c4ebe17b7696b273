//! Event dispatcher
//!
//! One invocation handles one event and answers with one signal. The
//! checkpoint is read and written in place; persisting it between
//! invocations is the caller's job.

use crate::asana::AsanaClient;
use crate::config::ConnectorConfig;
use crate::discovery::discover_sync_units;
use crate::engine::{Invocation, PhaseRunner, RunnerConfig};
use crate::error::{Error, Result};
use crate::event::{AirdropEvent, EventType, Phase, Signal};
use crate::http::{Classifier, ErrorClass};
use crate::loading::{LoadResult, Loader, StaticMapper};
use crate::normalize::NormalizeContext;
use crate::output::ItemSink;
use crate::state::{Checkpoint, CheckpointStore, LoaderCursor};
use crate::types::JsonValue;
use chrono::Utc;
use tracing::{error, info};

/// Item type the metadata document is pushed under
pub const METADATA_ITEM_TYPE: &str = "external_domain_metadata";

const EXTERNAL_DOMAIN_METADATA: &str = include_str!("asana/external_domain_metadata.json");

/// The static description of Asana record types and fields
pub fn external_domain_metadata() -> Result<JsonValue> {
    Ok(serde_json::from_str(EXTERNAL_DOMAIN_METADATA)?)
}

/// Handles platform events against Asana
#[derive(Debug, Clone, Default)]
pub struct Connector {
    config: ConnectorConfig,
}

impl Connector {
    /// Create a connector
    pub fn new(config: ConnectorConfig) -> Self {
        Self { config }
    }

    /// Connector configuration
    pub fn config(&self) -> &ConnectorConfig {
        &self.config
    }

    /// Handle one event. `store`, when given, receives per-page checkpoint
    /// flushes during extraction.
    pub async fn handle(
        &self,
        event: &AirdropEvent,
        checkpoint: &mut Checkpoint,
        sink: &mut dyn ItemSink,
        store: Option<&dyn CheckpointStore>,
    ) -> Signal {
        let phase = event.phase();
        info!(
            event_type = ?event.event_type,
            sync_unit = %event.event_context.external_sync_unit_id,
            "Handling event"
        );

        let signal = match phase {
            Phase::Metadata => self.extract_metadata(sink).await,
            Phase::ExternalSyncUnits => self.discover(event).await,
            Phase::Data => self.extract_data(event, checkpoint, sink, store).await,
            Phase::DataLoading | Phase::AttachmentLoading => self.load(event, checkpoint).await,
        };

        info!(signal = ?signal.signal_type, "Event handled");
        signal
    }

    async fn extract_metadata(&self, sink: &mut dyn ItemSink) -> Signal {
        let pushed = match external_domain_metadata() {
            Ok(metadata) => sink.push(METADATA_ITEM_TYPE, vec![metadata]).await,
            Err(err) => Err(err),
        };

        match pushed {
            Ok(()) => Signal::done(Phase::Metadata),
            Err(err) => {
                error!(error = %err, "Failed to extract metadata");
                Signal::error(Phase::Metadata, format!("Failed to extract metadata: {err}"))
            }
        }
    }

    async fn discover(&self, event: &AirdropEvent) -> Signal {
        let phase = Phase::ExternalSyncUnits;
        let client = match self.client(event, false) {
            Ok(client) => client,
            Err(err) => return Signal::error(phase, err.to_string()),
        };

        match discover_sync_units(&client).await {
            Ok(units) => {
                let mut signal = Signal::done(phase);
                signal.data.external_sync_units = Some(units);
                signal
            }
            Err(err) => match self.classifier().classify(&err) {
                ErrorClass::RetryAfter(seconds) => Signal::delay(phase, seconds),
                ErrorClass::Fatal(message) => {
                    error!(%message, "Failed to discover external sync units");
                    Signal::error(phase, format!("Failed to list projects: {message}"))
                }
            },
        }
    }

    async fn extract_data(
        &self,
        event: &AirdropEvent,
        checkpoint: &mut Checkpoint,
        sink: &mut dyn ItemSink,
        store: Option<&dyn CheckpointStore>,
    ) -> Signal {
        let client = match self.client(event, true) {
            Ok(client) => client,
            Err(err) => return Signal::error(Phase::Data, err.to_string()),
        };

        let context = NormalizeContext {
            app_base: self.config.app_base.clone(),
            project_id: client.project_id().to_string(),
            extracted_at: Utc::now(),
        };

        let mut runner =
            PhaseRunner::new(&client, context).with_config(self.runner_config());
        if let Some(store) = store {
            runner = runner.with_store(store);
        }

        let result = runner
            .run(&event.extraction_request(), checkpoint, sink)
            .await;

        Signal::from_outcome(Phase::Data, &result.outcome).with_report(result.report)
    }

    async fn load(&self, event: &AirdropEvent, checkpoint: &mut Checkpoint) -> Signal {
        let phase = event.phase();
        let client = match self.client(event, true) {
            Ok(client) => client,
            Err(err) => return Signal::error(phase, err.to_string()),
        };

        let mapper = StaticMapper::from(event.event_data.mappings.clone());
        let runner_config = self.runner_config();
        let loader = Loader::new(&client, &mapper, client.project_id())
            .with_mapper_scope(event.event_context.mapper_sync_unit())
            .with_config(&runner_config);

        let result = match event.event_type {
            EventType::StartLoadingData | EventType::ContinueLoadingData => {
                let cursor = loader_cursor(&mut checkpoint.data_loading, event.event_type);
                loader.load_tasks(&event.event_data.items, cursor).await
            }
            _ => {
                let cursor = loader_cursor(&mut checkpoint.attachment_loading, event.event_type);
                loader
                    .load_attachments(&event.event_data.attachments, cursor)
                    .await
            }
        };

        loading_signal(phase, result)
    }

    fn client(&self, event: &AirdropEvent, needs_project: bool) -> Result<AsanaClient> {
        let project_id = &event.event_context.external_sync_unit_id;
        if needs_project && project_id.is_empty() {
            return Err(Error::event("event_context.external_sync_unit_id is required"));
        }
        if event.connection_data.org_id.is_empty() && !needs_project {
            return Err(Error::event("connection_data.org_id is required"));
        }

        AsanaClient::new(
            &self.config,
            &event.connection_data.key,
            event.connection_data.org_id.clone(),
            project_id.clone(),
        )
    }

    fn runner_config(&self) -> RunnerConfig {
        RunnerConfig::from(&self.config.extraction)
    }

    fn classifier(&self) -> Classifier {
        Classifier::new(self.config.extraction.default_retry_after_secs)
    }
}

/// Loader cursor for an event; start events begin from the first item
fn loader_cursor(cursor: &mut LoaderCursor, event_type: EventType) -> &mut LoaderCursor {
    if event_type.invocation() == Invocation::Start {
        *cursor = LoaderCursor::default();
    }
    cursor
}

fn loading_signal(phase: Phase, result: LoadResult) -> Signal {
    let mut signal = Signal::from_outcome(phase, &result.outcome).with_report(result.report);
    signal.data.loaded = Some(result.loaded);
    signal
}
