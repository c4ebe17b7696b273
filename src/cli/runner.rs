//! CLI runner - executes commands
//!
//! Acts as a local orchestrator: it plays the platform's part by building
//! events, persisting the checkpoint between invocations and re-invoking
//! continue events when asked to follow a phase.

use crate::cli::commands::{Cli, Commands, Credentials};
use crate::config::ConnectorConfig;
use crate::connector::{external_domain_metadata, Connector};
use crate::error::{Error, Result};
use crate::event::{
    AirdropEvent, ConnectionData, EventData, EventType, Signal, SignalKind,
};
use crate::loading::LoadedItem;
use crate::output::{ItemSink, JsonLinesSink, MemorySink};
use crate::state::StateManager;
use crate::types::SyncMode;
use chrono::{DateTime, Utc};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        let config = self.load_config()?;

        match &self.cli.command {
            Commands::Handle { event, follow } => {
                let event = read_event(event)?;
                self.drive(&Connector::new(config), event, *follow).await?;
                Ok(())
            }
            Commands::Discover { credentials } => {
                let event = build_event(
                    EventType::ExtractionExternalSyncUnitsStart,
                    credentials,
                    String::new(),
                );
                self.drive(&Connector::new(config), event, false).await?;
                Ok(())
            }
            Commands::Metadata => {
                let metadata = external_domain_metadata()?;
                println!("{}", serde_json::to_string_pretty(&metadata)?);
                Ok(())
            }
            Commands::Extract {
                credentials,
                project,
                mode,
                extract_from,
                reset_extract_from,
                reset,
                resume,
            } => {
                if *reset {
                    self.state_manager()?.clear().await?;
                    info!(path = %self.cli.state.display(), "Checkpoint reset");
                }

                let event_type = if *resume {
                    EventType::ExtractionDataContinue
                } else {
                    EventType::ExtractionDataStart
                };
                let mut event = build_event(event_type, credentials, project.clone());
                apply_extraction_flags(
                    &mut event,
                    SyncMode::from(*mode),
                    *extract_from,
                    *reset_extract_from,
                );

                self.drive(&Connector::new(config), event, true).await?;
                Ok(())
            }
            Commands::Load {
                credentials,
                project,
                items,
            } => {
                let data = read_event_data(items)?;
                self.load(&Connector::new(config), credentials, project, data)
                    .await
            }
            Commands::Serve { port } => {
                let server_config = crate::cli::ServerConfig { connector: config };
                crate::cli::serve(server_config, *port).await
            }
        }
    }

    /// Load the connector configuration, defaults when no file is given
    fn load_config(&self) -> Result<ConnectorConfig> {
        match &self.cli.config {
            Some(path) => ConnectorConfig::from_file(path),
            None => Ok(ConnectorConfig::default()),
        }
    }

    fn state_manager(&self) -> Result<StateManager> {
        StateManager::from_file(&self.cli.state)
    }

    /// Invoke `event`, and with `follow` keep invoking its continuation
    /// until the phase settles. Every signal is printed; all of them are
    /// returned in order.
    async fn drive(
        &self,
        connector: &Connector,
        event: AirdropEvent,
        follow: bool,
    ) -> Result<Vec<Signal>> {
        let state = self.state_manager()?;
        let mut sink = JsonLinesSink::new(&self.cli.output)?;
        let mut signals = Vec::new();
        let mut event = event;

        loop {
            let signal = invoke(connector, &event, &state, &mut sink).await?;
            println!("{}", serde_json::to_string(&signal)?);

            let next = if follow && signal.needs_continuation() {
                event.continued()
            } else {
                None
            };
            if next.is_some() {
                if let Some(seconds) = signal.data.delay {
                    info!(seconds, "Waiting before continuing");
                    tokio::time::sleep(Duration::from_secs(seconds)).await;
                }
            }

            let kind = signal.kind();
            let message = signal.data.error.as_ref().map(|e| e.message.clone());
            signals.push(signal);

            match next {
                Some(continued) => event = continued,
                None if kind == SignalKind::Error => {
                    return Err(Error::Other(message.unwrap_or_else(|| "Phase failed".to_string())));
                }
                None => break,
            }
        }

        for (item_type, rows) in sink.rows_written() {
            info!(%item_type, rows, path = %sink.path_for(item_type).display(), "Items written");
        }
        Ok(signals)
    }

    /// Load tasks, then the attachments, resolving attachment parents
    /// through the mappings given plus every task created on the way
    async fn load(
        &self,
        connector: &Connector,
        credentials: &Credentials,
        project: &str,
        data: EventData,
    ) -> Result<()> {
        let mut event = build_event(EventType::StartLoadingData, credentials, project.to_string());
        event.event_data = data;

        let signals = self.drive(connector, event.clone(), true).await?;
        for item in loaded_items(&signals) {
            event
                .event_data
                .mappings
                .insert(item.reference_id.clone(), item.external_id.clone());
        }

        if event.event_data.attachments.is_empty() {
            return Ok(());
        }
        event.event_type = EventType::StartLoadingAttachments;
        self.drive(connector, event, true).await?;
        Ok(())
    }
}

/// Run one invocation with the persisted checkpoint and store the result
pub async fn invoke(
    connector: &Connector,
    event: &AirdropEvent,
    state: &StateManager,
    sink: &mut dyn ItemSink,
) -> Result<Signal> {
    let mut checkpoint = state.checkpoint().await;
    let signal = connector
        .handle(event, &mut checkpoint, sink, Some(state))
        .await;
    state.store(checkpoint).await?;

    if signal.kind() == SignalKind::Error {
        warn!(signal = ?signal.signal_type, "Phase reported an error");
    }
    Ok(signal)
}

/// Run one invocation collecting items in memory
pub async fn invoke_in_memory(
    connector: &Connector,
    event: &AirdropEvent,
    state: &StateManager,
) -> Result<(Signal, MemorySink)> {
    let mut sink = MemorySink::new();
    let signal = invoke(connector, event, state, &mut sink).await?;
    Ok((signal, sink))
}

fn build_event(event_type: EventType, credentials: &Credentials, project: String) -> AirdropEvent {
    let mut event = AirdropEvent::new(
        event_type,
        ConnectionData {
            key: credentials.key.clone(),
            org_id: credentials.workspace.clone(),
        },
    );
    event.event_context.external_sync_unit_id = project;
    event
}

fn apply_extraction_flags(
    event: &mut AirdropEvent,
    mode: SyncMode,
    extract_from: Option<DateTime<Utc>>,
    reset_extract_from: bool,
) {
    let context = &mut event.event_context;
    context.mode = mode;
    context.extract_from = extract_from;
    context.reset_extract_from = reset_extract_from.then_some(true);
}

fn loaded_items(signals: &[Signal]) -> impl Iterator<Item = &LoadedItem> {
    signals
        .iter()
        .filter_map(|signal| signal.data.loaded.as_ref())
        .flatten()
}

fn read_event(path: &Path) -> Result<AirdropEvent> {
    let contents = fs::read_to_string(path)
        .map_err(|e| Error::event(format!("Failed to read event file: {e}")))?;
    serde_json::from_str(&contents).map_err(|e| Error::event(format!("Invalid event JSON: {e}")))
}

fn read_event_data(path: &Path) -> Result<EventData> {
    let contents = fs::read_to_string(path)
        .map_err(|e| Error::event(format!("Failed to read items file: {e}")))?;
    serde_json::from_str(&contents).map_err(|e| Error::event(format!("Invalid items JSON: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::SignalData;
    use crate::event::{Phase, SignalType};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_extraction_flags() {
        let credentials = Credentials {
            key: "pat".to_string(),
            workspace: "w1".to_string(),
        };
        let mut event = build_event(EventType::ExtractionDataStart, &credentials, "p1".to_string());
        apply_extraction_flags(&mut event, SyncMode::Incremental, None, true);

        assert_eq!(event.connection_data.org_id, "w1");
        assert_eq!(event.event_context.external_sync_unit_id, "p1");
        assert_eq!(event.event_context.reset_extract_from, Some(true));

        apply_extraction_flags(&mut event, SyncMode::Full, None, false);
        assert_eq!(event.event_context.reset_extract_from, None);
    }

    #[test]
    fn test_loaded_items_across_signals() {
        let mut first = Signal::progress(Phase::DataLoading, 50);
        first.data.loaded = Some(vec![LoadedItem {
            reference_id: "don:1".to_string(),
            external_id: "t1".to_string(),
        }]);
        let second = Signal {
            signal_type: SignalType::DataLoadingDone,
            data: SignalData {
                loaded: Some(vec![LoadedItem {
                    reference_id: "don:2".to_string(),
                    external_id: "t2".to_string(),
                }]),
                ..SignalData::default()
            },
        };

        let signals = [first, second];
        let ids: Vec<&str> = loaded_items(&signals)
            .map(|item| item.external_id.as_str())
            .collect();
        assert_eq!(ids, vec!["t1", "t2"]);
    }

    #[test]
    fn test_read_event_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("event.json");
        fs::write(
            &path,
            r#"{"event_type": "EXTRACTION_DATA_START", "event_context": {"external_sync_unit_id": "p1"}}"#,
        )
        .unwrap();

        let event = read_event(&path).unwrap();
        assert_eq!(event.event_type, EventType::ExtractionDataStart);

        fs::write(&path, "not json").unwrap();
        assert!(read_event(&path).is_err());
    }

    #[tokio::test]
    async fn test_invoke_persists_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let state = StateManager::from_file(&path).unwrap();

        let event = AirdropEvent::new(EventType::ExtractionMetadataStart, ConnectionData::default());
        let (signal, sink) = invoke_in_memory(&Connector::default(), &event, &state)
            .await
            .unwrap();

        assert_eq!(signal.signal_type, SignalType::ExtractionMetadataDone);
        assert_eq!(sink.len(), 1);
        assert!(path.exists());
    }
}
