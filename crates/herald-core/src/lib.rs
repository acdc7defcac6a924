//! # Herald Core
//!
//! Transport-facing abstractions for the Herald chat bot framework.
//!
//! The chat platform itself (connection lifecycle, mention resolution,
//! nickname and channel-name substitution) lives outside this workspace.
//! Herald only sees it through two traits:
//!
//! - [`Message`]: one inbound chat message, already decoded by the transport.
//! - [`Client`]: the capability to open a message stream, send text back, and
//!   answer role questions about the author of a message.
//!
//! ```text
//! ┌──────────────┐  MessageStream  ┌──────────────┐
//! │ Client impl  │────────────────▶│  herald bot  │
//! │ (platform)   │◀────────────────│  dispatcher  │
//! └──────────────┘  send_message   └──────────────┘
//! ```
//!
//! With the `mock` feature enabled, [`mock`] provides an in-memory transport
//! that tests and demos can drive directly.

pub mod client;
pub mod error;
pub mod message;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use client::{BoxedClient, Client, MessageStream};
pub use error::{TransportError, TransportResult};
pub use message::{BoxedMessage, Message};
