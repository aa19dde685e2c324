//! Notification delivery for Cadence.
//!
//! The escalation engine and other platform components submit notifications
//! here; this crate owns routing, channel transports, and focus-window
//! suppression. Delivery is best-effort: callers receive a delivered flag,
//! not an error, when a channel is down.
//!
//! ## Features
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `webhook` | ✅ | HTTP-POST channel (Slack, SMS gateways, phone bridges) |
//! | `email` | ✅ | SMTP channel via lettre |
//!
//! ## Example
//!
//! ```rust,no_run
//! use cadence_notify::{DeliveryChannel, Dispatcher, Notification, Priority};
//! use cadence_notify::channels::ConsoleChannel;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let dispatcher = Dispatcher::new();
//!     dispatcher
//!         .register(Arc::new(ConsoleChannel::new("in-app", DeliveryChannel::InApp)))
//!         .await;
//!
//!     let delivered = dispatcher
//!         .submit(&Notification::new(
//!             "user-1",
//!             DeliveryChannel::InApp,
//!             Priority::Normal,
//!             "Overdue commitment",
//!             "\"Send the board deck\" is two days overdue.",
//!             "user-1",
//!         ))
//!         .await?;
//!     assert!(delivered);
//!     Ok(())
//! }
//! ```

pub mod channels;
pub mod dispatcher;
pub mod error;
pub mod notification;

pub use channels::{ChannelRegistry, ConsoleChannel, MemoryChannel, NotificationChannel};
pub use dispatcher::{Dispatcher, QuietHours};
pub use error::{Error, Result};
pub use notification::{DeliveryChannel, Notification, NotificationId, Priority};

#[cfg(feature = "webhook")]
pub use channels::WebhookChannel;

#[cfg(feature = "email")]
pub use channels::EmailChannel;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
