//! Event and signal types

use crate::discovery::ExternalSyncUnit;
use crate::engine::{Invocation, ItemReport};
use crate::loading::LoadedItem;
use crate::normalize::{LoaderAttachment, LoaderItem};
use crate::types::SyncMode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

// ============================================================================
// Inbound
// ============================================================================

/// Event type sent by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    ExtractionExternalSyncUnitsStart,
    ExtractionMetadataStart,
    ExtractionDataStart,
    ExtractionDataContinue,
    StartLoadingData,
    ContinueLoadingData,
    StartLoadingAttachments,
    ContinueLoadingAttachments,
}

impl EventType {
    /// Phase this event runs
    pub fn phase(self) -> Phase {
        match self {
            EventType::ExtractionExternalSyncUnitsStart => Phase::ExternalSyncUnits,
            EventType::ExtractionMetadataStart => Phase::Metadata,
            EventType::ExtractionDataStart | EventType::ExtractionDataContinue => Phase::Data,
            EventType::StartLoadingData | EventType::ContinueLoadingData => Phase::DataLoading,
            EventType::StartLoadingAttachments | EventType::ContinueLoadingAttachments => {
                Phase::AttachmentLoading
            }
        }
    }

    /// Whether the event opens its phase or continues it
    pub fn invocation(self) -> Invocation {
        match self {
            EventType::ExtractionDataContinue
            | EventType::ContinueLoadingData
            | EventType::ContinueLoadingAttachments => Invocation::Continue,
            _ => Invocation::Start,
        }
    }

    /// Event that continues this event's phase, for phases that can suspend
    pub fn continuation(self) -> Option<EventType> {
        match self.phase() {
            Phase::Data => Some(EventType::ExtractionDataContinue),
            Phase::DataLoading => Some(EventType::ContinueLoadingData),
            Phase::AttachmentLoading => Some(EventType::ContinueLoadingAttachments),
            Phase::ExternalSyncUnits | Phase::Metadata => None,
        }
    }
}

/// Unit of work selected by an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    ExternalSyncUnits,
    Metadata,
    Data,
    DataLoading,
    AttachmentLoading,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::ExternalSyncUnits => "external_sync_units",
            Phase::Metadata => "metadata",
            Phase::Data => "data",
            Phase::DataLoading => "data_loading",
            Phase::AttachmentLoading => "attachment_loading",
        };
        f.write_str(name)
    }
}

/// Credentials of the Asana connection
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionData {
    /// Personal access token
    #[serde(default)]
    pub key: String,
    /// Workspace gid
    #[serde(default)]
    pub org_id: String,
}

impl fmt::Debug for ConnectionData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionData")
            .field("key", &"[REDACTED]")
            .field("org_id", &self.org_id)
            .finish()
    }
}

/// Scope and mode of the run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventContext {
    /// Project gid scoping every query
    #[serde(default)]
    pub external_sync_unit_id: String,
    /// Platform-side sync unit, used for mapper lookups
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_unit: Option<String>,
    #[serde(default)]
    pub mode: SyncMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extract_from: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset_extract_from: Option<bool>,
}

impl EventContext {
    /// Sync unit for mapper lookups, falling back to the project
    pub fn mapper_sync_unit(&self) -> &str {
        self.sync_unit
            .as_deref()
            .unwrap_or(&self.external_sync_unit_id)
    }
}

/// Items handed over for loading
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventData {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<LoaderItem>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<LoaderAttachment>,
    /// Platform id to Asana gid
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub mappings: HashMap<String, String>,
}

/// An event received from the platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirdropEvent {
    pub event_type: EventType,
    #[serde(default)]
    pub connection_data: ConnectionData,
    #[serde(default)]
    pub event_context: EventContext,
    #[serde(default)]
    pub event_data: EventData,
}

impl AirdropEvent {
    /// Create an event with empty context
    pub fn new(event_type: EventType, connection_data: ConnectionData) -> Self {
        Self {
            event_type,
            connection_data,
            event_context: EventContext::default(),
            event_data: EventData::default(),
        }
    }

    /// Phase this event runs
    pub fn phase(&self) -> Phase {
        self.event_type.phase()
    }

    /// The same event, retyped as the continuation of its phase
    pub fn continued(&self) -> Option<Self> {
        let event_type = self.event_type.continuation()?;
        Some(Self {
            event_type,
            ..self.clone()
        })
    }
}

// ============================================================================
// Outbound
// ============================================================================

/// Signal sent back to the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalType {
    ExtractionExternalSyncUnitsDone,
    ExtractionExternalSyncUnitsError,
    ExtractionMetadataDone,
    ExtractionMetadataError,
    ExtractionDataDone,
    ExtractionDataProgress,
    ExtractionDataDelay,
    ExtractionDataError,
    DataLoadingDone,
    DataLoadingProgress,
    DataLoadingDelay,
    DataLoadingError,
    AttachmentLoadingDone,
    AttachmentLoadingProgress,
    AttachmentLoadingDelay,
    AttachmentLoadingError,
}

/// Kind of a signal, independent of its phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    Done,
    Progress,
    Delay,
    Error,
}

impl SignalType {
    /// Signal of `kind` for `phase`. Phases that can't suspend report
    /// progress and delays as errors.
    pub fn for_phase(phase: Phase, kind: SignalKind) -> Self {
        use SignalKind::{Delay, Done, Error, Progress};
        match (phase, kind) {
            (Phase::ExternalSyncUnits, Done) => Self::ExtractionExternalSyncUnitsDone,
            (Phase::ExternalSyncUnits, _) => Self::ExtractionExternalSyncUnitsError,
            (Phase::Metadata, Done) => Self::ExtractionMetadataDone,
            (Phase::Metadata, _) => Self::ExtractionMetadataError,
            (Phase::Data, Done) => Self::ExtractionDataDone,
            (Phase::Data, Progress) => Self::ExtractionDataProgress,
            (Phase::Data, Delay) => Self::ExtractionDataDelay,
            (Phase::Data, Error) => Self::ExtractionDataError,
            (Phase::DataLoading, Done) => Self::DataLoadingDone,
            (Phase::DataLoading, Progress) => Self::DataLoadingProgress,
            (Phase::DataLoading, Delay) => Self::DataLoadingDelay,
            (Phase::DataLoading, Error) => Self::DataLoadingError,
            (Phase::AttachmentLoading, Done) => Self::AttachmentLoadingDone,
            (Phase::AttachmentLoading, Progress) => Self::AttachmentLoadingProgress,
            (Phase::AttachmentLoading, Delay) => Self::AttachmentLoadingDelay,
            (Phase::AttachmentLoading, Error) => Self::AttachmentLoadingError,
        }
    }

    /// Kind of this signal
    pub fn kind(self) -> SignalKind {
        match self {
            Self::ExtractionExternalSyncUnitsDone
            | Self::ExtractionMetadataDone
            | Self::ExtractionDataDone
            | Self::DataLoadingDone
            | Self::AttachmentLoadingDone => SignalKind::Done,
            Self::ExtractionDataProgress
            | Self::DataLoadingProgress
            | Self::AttachmentLoadingProgress => SignalKind::Progress,
            Self::ExtractionDataDelay | Self::DataLoadingDelay | Self::AttachmentLoadingDelay => {
                SignalKind::Delay
            }
            Self::ExtractionExternalSyncUnitsError
            | Self::ExtractionMetadataError
            | Self::ExtractionDataError
            | Self::DataLoadingError
            | Self::AttachmentLoadingError => SignalKind::Error,
        }
    }
}

/// Error carried by an error signal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalError {
    pub message: String,
}

/// Payload of a signal
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SignalData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_sync_units: Option<Vec<ExternalSyncUnit>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<SignalError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reports: Option<ItemReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loaded: Option<Vec<LoadedItem>>,
}

/// The answer to one event
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Signal {
    pub signal_type: SignalType,
    #[serde(flatten)]
    pub data: SignalData,
}

impl Signal {
    /// Create a signal without payload
    pub fn new(phase: Phase, kind: SignalKind) -> Self {
        Self {
            signal_type: SignalType::for_phase(phase, kind),
            data: SignalData::default(),
        }
    }

    /// Done signal
    pub fn done(phase: Phase) -> Self {
        Self::new(phase, SignalKind::Done)
    }

    /// Progress signal
    pub fn progress(phase: Phase, percent: u8) -> Self {
        let mut signal = Self::new(phase, SignalKind::Progress);
        signal.data.progress = Some(percent);
        signal
    }

    /// Delay signal. Phases without a delay signal report an error that
    /// still carries the delay.
    pub fn delay(phase: Phase, seconds: u64) -> Self {
        let mut signal = Self::new(phase, SignalKind::Delay);
        signal.data.delay = Some(seconds);
        if signal.kind() == SignalKind::Error {
            signal.data.error = Some(SignalError {
                message: format!("Rate limited, retry after {seconds} seconds"),
            });
        }
        signal
    }

    /// Error signal
    pub fn error(phase: Phase, message: impl Into<String>) -> Self {
        let mut signal = Self::new(phase, SignalKind::Error);
        signal.data.error = Some(SignalError {
            message: message.into(),
        });
        signal
    }

    /// Attach an item report
    #[must_use]
    pub fn with_report(mut self, report: ItemReport) -> Self {
        self.data.reports = Some(report);
        self
    }

    /// Kind of this signal
    pub fn kind(&self) -> SignalKind {
        self.signal_type.kind()
    }

    /// Check whether the phase needs another invocation
    pub fn needs_continuation(&self) -> bool {
        matches!(self.kind(), SignalKind::Progress | SignalKind::Delay)
    }
}
