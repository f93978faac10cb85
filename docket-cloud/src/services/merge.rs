//! Concurrent-safe partial updates for shared message records
//!
//! Concurrent writers each send only the fields they own (a streaming
//! generator replaces content, a delivery tracker patches one
//! metadata key); the merge keeps both effects instead of letting the
//! last whole-record write win.

use std::sync::Arc;

use serde_json::{Map, Value};
use uuid::Uuid;

use shared::models::{Message, MergePatch};
use shared::util::now_millis;

use crate::db::{MessageStore, StoreError, StoreResult};
use crate::services::fallback::{self, FallbackContext};

#[derive(Clone)]
pub struct MergeService {
    store: Arc<dyn MessageStore>,
}

impl MergeService {
    pub fn new(store: Arc<dyn MessageStore>) -> Self {
        Self { store }
    }

    pub async fn create_message(
        &self,
        content: String,
        metadata: Map<String, Value>,
    ) -> StoreResult<Message> {
        let now = now_millis();
        let message = Message {
            id: Uuid::new_v4().to_string(),
            content,
            metadata,
            created_at: now,
            updated_at: now,
        };
        self.store.create_message(&message).await?;
        Ok(message)
    }

    pub async fn find_message(&self, id: &str) -> StoreResult<Option<Message>> {
        self.store.find_message(id).await
    }

    /// Apply a partial update to a message.
    ///
    /// An empty patch returns without touching the store at all.
    /// [`StoreError::NotFound`] when the message does not exist.
    pub async fn merge_update(&self, message_id: &str, patch: &MergePatch) -> StoreResult<()> {
        if patch.is_empty() {
            return Ok(());
        }

        fallback::execute(
            self.store
                .merge_message(message_id, patch.content.as_deref(), patch.metadata.as_ref()),
            || self.merge_degraded(message_id, patch),
            FallbackContext {
                operation: "update_record_merge",
                target: message_id,
            },
        )
        .await
    }

    /// Read-merge-write for schemas without `update_record_merge`.
    ///
    /// A concurrent update landing between the read and the write
    /// below is overwritten. Accepted for deployments still missing
    /// the atomic procedure.
    async fn merge_degraded(&self, message_id: &str, patch: &MergePatch) -> StoreResult<()> {
        let message = self
            .store
            .find_message(message_id)
            .await?
            .ok_or(StoreError::NotFound)?;

        let mut metadata = message.metadata;
        if let Some(meta_patch) = &patch.metadata {
            meta_patch.apply(&mut metadata);
        }
        let content = patch.content.as_deref().unwrap_or(&message.content);

        self.store
            .replace_message(message_id, content, &metadata)
            .await
    }
}
