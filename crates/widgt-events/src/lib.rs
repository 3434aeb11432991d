//! Lifecycle event stream for the widgt deployment engine.
//!
//! The engine publishes a [`WidgtEvent`] to a [`LifecycleBus`] after every
//! committed deploy or undeploy. Subscribers get their own broadcast
//! receiver: delivery is FIFO per publisher, a slow subscriber lags and
//! drops events rather than blocking the mutation that already committed,
//! and dropping the receiver ends the subscription.
//!
//! # Example
//!
//! ```rust
//! use widgt_events::{LifecycleBus, WidgtEvent};
//! use widgt_core::{WidgetManifest, WidgetModel};
//!
//! # async fn example() {
//! let bus = LifecycleBus::new();
//! let mut receiver = bus.subscribe();
//!
//! let model = WidgetModel::new(WidgetManifest::default(), "/tmp/w".into());
//! bus.publish(WidgtEvent::deployed(model));
//!
//! let event = receiver.recv().await.unwrap();
//! assert_eq!(event.event_type(), "deployed");
//! # }
//! ```

mod bus;
mod event;

pub use bus::{DEFAULT_CHANNEL_CAPACITY, EventReceiver, LifecycleBus};
pub use event::{EventKind, EventMetadata, WidgtEvent};
