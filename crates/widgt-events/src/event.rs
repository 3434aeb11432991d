//! Lifecycle event types.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use widgt_core::WidgetModel;

/// Metadata attached to every lifecycle event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMetadata {
    /// Unique identifier for this event instance.
    pub event_id: Uuid,
    /// When the event was published.
    pub timestamp: DateTime<Utc>,
}

impl EventMetadata {
    /// Create metadata stamped with the current time.
    #[must_use]
    pub fn new() -> Self {
        Self {
            event_id: Uuid::new_v4(),
            timestamp: Utc::now(),
        }
    }
}

impl Default for EventMetadata {
    fn default() -> Self {
        Self::new()
    }
}

/// The kind of a lifecycle event, used for filtered subscriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// A widget finished deploying.
    Deployed,
    /// A widget was removed.
    Undeployed,
}

/// A lifecycle event published by the deployment engine.
#[derive(Debug, Clone)]
pub enum WidgtEvent {
    /// A widget finished deploying and is registered for serving.
    Deployed {
        /// Event metadata.
        metadata: EventMetadata,
        /// The deployed widget model.
        model: Arc<WidgetModel>,
    },
    /// A widget was undeployed and its registration removed.
    Undeployed {
        /// Event metadata.
        metadata: EventMetadata,
        /// The model that was removed.
        model: Arc<WidgetModel>,
    },
}

impl WidgtEvent {
    /// Build a `Deployed` event for the given model.
    #[must_use]
    pub fn deployed(model: impl Into<Arc<WidgetModel>>) -> Self {
        Self::Deployed {
            metadata: EventMetadata::new(),
            model: model.into(),
        }
    }

    /// Build an `Undeployed` event for the given model.
    #[must_use]
    pub fn undeployed(model: impl Into<Arc<WidgetModel>>) -> Self {
        Self::Undeployed {
            metadata: EventMetadata::new(),
            model: model.into(),
        }
    }

    /// The event's kind.
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Deployed { .. } => EventKind::Deployed,
            Self::Undeployed { .. } => EventKind::Undeployed,
        }
    }

    /// A stable string name for the event kind.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Deployed { .. } => "deployed",
            Self::Undeployed { .. } => "undeployed",
        }
    }

    /// The event's metadata.
    #[must_use]
    pub fn metadata(&self) -> &EventMetadata {
        match self {
            Self::Deployed { metadata, .. } | Self::Undeployed { metadata, .. } => metadata,
        }
    }

    /// The widget model the event carries.
    #[must_use]
    pub fn model(&self) -> &Arc<WidgetModel> {
        match self {
            Self::Deployed { model, .. } | Self::Undeployed { model, .. } => model,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use widgt_core::WidgetManifest;

    #[test]
    fn event_type_matches_kind() {
        let model = WidgetModel::new(WidgetManifest::default(), "/tmp/w".into());
        let event = WidgtEvent::deployed(model.clone());
        assert_eq!(event.event_type(), "deployed");
        assert_eq!(event.kind(), EventKind::Deployed);

        let event = WidgtEvent::undeployed(model);
        assert_eq!(event.event_type(), "undeployed");
        assert_eq!(event.kind(), EventKind::Undeployed);
    }
}
