//! Engine event types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single observability event published by the engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineEvent {
    /// Type of event
    pub event_type: EventType,

    /// Event-specific payload data
    pub payload: Value,

    /// When the event was published
    pub timestamp: DateTime<Utc>,
}

impl EngineEvent {
    pub fn new(event_type: EventType, payload: Value) -> Self {
        Self {
            event_type,
            payload,
            timestamp: Utc::now(),
        }
    }

    /// Convenience accessor for a string field of the payload
    pub fn payload_str(&self, key: &str) -> Option<&str> {
        self.payload.get(key).and_then(|v| v.as_str())
    }
}

/// Event types published by the registry, contexts and container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    // Registration events
    #[serde(rename = "registry.set.registered")]
    SetRegistered,
    #[serde(rename = "registry.dependency.registered")]
    DependencyRegistered,
    #[serde(rename = "registry.candidate.registered")]
    CandidateRegistered,
    #[serde(rename = "registry.mask.registered")]
    MaskRegistered,

    // Context events
    #[serde(rename = "context.circumstance.set")]
    CircumstanceSet,
    #[serde(rename = "context.circumstance.removed")]
    CircumstanceRemoved,
    #[serde(rename = "context.mask.set")]
    MaskSet,
    #[serde(rename = "context.mask.removed")]
    MaskRemoved,
    #[serde(rename = "context.scope.opened")]
    ScopeOpened,
    #[serde(rename = "context.scope.closed")]
    ScopeClosed,

    // Resolution events
    #[serde(rename = "resolver.candidate.found")]
    CandidateFound,
    #[serde(rename = "resolver.candidate.not_found")]
    CandidateNotFound,

    // Instance events
    #[serde(rename = "instance.created")]
    InstanceCreated,
    #[serde(rename = "instance.shared")]
    InstanceShared,
    #[serde(rename = "instance.failed")]
    InstanceFailed,
}

impl EventType {
    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::SetRegistered => "registry.set.registered",
            EventType::DependencyRegistered => "registry.dependency.registered",
            EventType::CandidateRegistered => "registry.candidate.registered",
            EventType::MaskRegistered => "registry.mask.registered",
            EventType::CircumstanceSet => "context.circumstance.set",
            EventType::CircumstanceRemoved => "context.circumstance.removed",
            EventType::MaskSet => "context.mask.set",
            EventType::MaskRemoved => "context.mask.removed",
            EventType::ScopeOpened => "context.scope.opened",
            EventType::ScopeClosed => "context.scope.closed",
            EventType::CandidateFound => "resolver.candidate.found",
            EventType::CandidateNotFound => "resolver.candidate.not_found",
            EventType::InstanceCreated => "instance.created",
            EventType::InstanceShared => "instance.shared",
            EventType::InstanceFailed => "instance.failed",
        }
    }

    /// Check if this is a registration event
    pub fn is_registration_event(&self) -> bool {
        matches!(
            self,
            EventType::SetRegistered
                | EventType::DependencyRegistered
                | EventType::CandidateRegistered
                | EventType::MaskRegistered
        )
    }

    /// Check if this is a context event
    pub fn is_context_event(&self) -> bool {
        matches!(
            self,
            EventType::CircumstanceSet
                | EventType::CircumstanceRemoved
                | EventType::MaskSet
                | EventType::MaskRemoved
                | EventType::ScopeOpened
                | EventType::ScopeClosed
        )
    }

    /// Check if this event reports a failure
    pub fn is_failure(&self) -> bool {
        matches!(self, EventType::CandidateNotFound | EventType::InstanceFailed)
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for EventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "registry.set.registered" => Ok(EventType::SetRegistered),
            "registry.dependency.registered" => Ok(EventType::DependencyRegistered),
            "registry.candidate.registered" => Ok(EventType::CandidateRegistered),
            "registry.mask.registered" => Ok(EventType::MaskRegistered),
            "context.circumstance.set" => Ok(EventType::CircumstanceSet),
            "context.circumstance.removed" => Ok(EventType::CircumstanceRemoved),
            "context.mask.set" => Ok(EventType::MaskSet),
            "context.mask.removed" => Ok(EventType::MaskRemoved),
            "context.scope.opened" => Ok(EventType::ScopeOpened),
            "context.scope.closed" => Ok(EventType::ScopeClosed),
            "resolver.candidate.found" => Ok(EventType::CandidateFound),
            "resolver.candidate.not_found" => Ok(EventType::CandidateNotFound),
            "instance.created" => Ok(EventType::InstanceCreated),
            "instance.shared" => Ok(EventType::InstanceShared),
            "instance.failed" => Ok(EventType::InstanceFailed),
            _ => Err(format!("Unknown event type: {}", s)),
        }
    }
}
