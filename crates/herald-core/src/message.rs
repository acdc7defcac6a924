//! The inbound message abstraction.

use std::fmt::Debug;
use std::sync::Arc;
use std::time::SystemTime;

/// A single inbound chat message as decoded by the transport.
///
/// Messages are shared between every dispatch task spawned for them, so
/// implementations must be cheap to read concurrently. Any lazily computed
/// value (resolved nicknames, processed text) has to be cached behind the
/// implementation's own synchronisation.
pub trait Message: Debug + Send + Sync + 'static {
    /// Identifier of the channel the message was posted in.
    fn channel(&self) -> &str;

    /// Display name of the author.
    fn user_name(&self) -> &str;

    /// Platform identifier of the author.
    fn user_id(&self) -> &str;

    /// Platform identifier of the message itself.
    fn message_id(&self) -> &str {
        ""
    }

    /// The unprocessed message text exactly as received.
    fn raw_message(&self) -> &str;

    /// Human readable text, with mentions, role names and channel names
    /// replaced by their display form.
    ///
    /// Defaults to the raw text for transports that do no substitution.
    fn message(&self) -> &str {
        self.raw_message()
    }

    /// Checks whether the message opens with an @-mention of the bot followed
    /// by `word`.
    ///
    /// Returns the matched leading text (mention plus word, as it appears in
    /// [`raw_message`](Self::raw_message)) so it can be stripped before
    /// argument extraction.
    fn mention_trigger(&self, word: &str) -> Option<String>;

    /// When the platform says the message was sent, if known.
    fn timestamp(&self) -> Option<SystemTime> {
        None
    }
}

/// A shared, type-erased message.
pub type BoxedMessage = Arc<dyn Message>;
