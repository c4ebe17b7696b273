//! Event module
//!
//! Inbound events select a phase; every invocation answers with exactly
//! one outbound signal.

mod types;

pub use types::{
    AirdropEvent, ConnectionData, EventContext, EventData, EventType, Phase, Signal, SignalData,
    SignalError, SignalKind, SignalType,
};

use crate::engine::{ExtractionRequest, PhaseOutcome};

impl AirdropEvent {
    /// Data phase request described by this event
    pub fn extraction_request(&self) -> ExtractionRequest {
        let context = &self.event_context;
        ExtractionRequest {
            invocation: self.event_type.invocation(),
            mode: context.mode,
            extract_from: context.extract_from,
            reset_extract_from: context.reset_extract_from.unwrap_or(false),
        }
    }
}

impl Signal {
    /// Signal reporting how a phase invocation ended
    pub fn from_outcome(phase: Phase, outcome: &PhaseOutcome) -> Self {
        match outcome {
            PhaseOutcome::Done => {
                let mut signal = Self::done(phase);
                if matches!(phase, Phase::Data | Phase::DataLoading | Phase::AttachmentLoading) {
                    signal.data.progress = Some(100);
                }
                signal
            }
            PhaseOutcome::Progress { percent } => Self::progress(phase, *percent),
            PhaseOutcome::Delayed { seconds } => Self::delay(phase, *seconds),
            PhaseOutcome::Failed { message } => Self::error(phase, message.clone()),
        }
    }
}
