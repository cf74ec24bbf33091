//! Messaging-transport collaborator boundary
//!
//! The surrounding bot implements these traits over its chat platform; the
//! engine only ever sends, edits, and deletes one status message per
//! supervised operation, and fetches user-supplied attachments by their
//! transport file id.

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

/// Opaque identifier of one status message, as assigned by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageId(pub i64);

/// Transport-side failure (network, rate limit, deleted chat).
#[derive(Debug, Error)]
#[error("transport failure: {0}")]
pub struct TransportError(pub String);

/// Single-message status surface in the user-facing channel.
#[async_trait]
pub trait StatusChannel: Send + Sync {
    /// Send a new status message and return its identifier.
    async fn send_status(&self, scope_id: i64, text: &str) -> Result<MessageId, TransportError>;

    /// Replace the text of a previously sent status message.
    async fn edit_status(
        &self,
        scope_id: i64,
        message: MessageId,
        text: &str,
    ) -> Result<(), TransportError>;

    /// Delete a previously sent status message.
    async fn delete_status(&self, scope_id: i64, message: MessageId) -> Result<(), TransportError>;
}

/// Retrieval of user-supplied audio attachments from the chat platform.
#[async_trait]
pub trait AttachmentFetcher: Send + Sync {
    /// Download the attachment behind `file_ref` and write it to `dest`.
    async fn fetch(&self, file_ref: &str, dest: &Path) -> Result<(), TransportError>;
}
