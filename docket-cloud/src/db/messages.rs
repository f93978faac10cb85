//! Message database operations

use serde_json::{Map, Value};
use sqlx::PgPool;

use shared::models::{Message, MetadataPatch};

/// Message row as stored
#[derive(Debug, sqlx::FromRow)]
struct MessageRow {
    id: String,
    content: String,
    metadata: Value,
    created_at: i64,
    updated_at: i64,
}

impl MessageRow {
    fn into_model(self) -> Message {
        // metadata is jsonb and always written as an object
        let metadata = match self.metadata {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Message {
            id: self.id,
            content: self.content,
            metadata,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

pub async fn create(pool: &PgPool, message: &Message) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO messages (id, content, metadata, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(&message.id)
    .bind(&message.content)
    .bind(Value::Object(message.metadata.clone()))
    .bind(message.created_at)
    .bind(message.updated_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Message>, sqlx::Error> {
    let row = sqlx::query_as::<_, MessageRow>(
        r#"
        SELECT id, content, metadata, created_at, updated_at
        FROM messages
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(MessageRow::into_model))
}

/// Atomic partial update through the `update_record_merge` procedure.
/// NULL arguments leave the corresponding part of the record untouched.
pub async fn merge_atomic(
    pool: &PgPool,
    id: &str,
    content: Option<&str>,
    patch: Option<&MetadataPatch>,
) -> Result<(), sqlx::Error> {
    let patch_json = patch.map(|p| {
        let mut object = Map::new();
        object.insert(p.key.clone(), p.value.clone());
        Value::Object(object)
    });

    sqlx::query("SELECT update_record_merge($1, $2, $3)")
        .bind(id)
        .bind(content)
        .bind(patch_json)
        .execute(pool)
        .await?;
    Ok(())
}

/// Whole-record write-back; returns the affected row count
pub async fn replace(
    pool: &PgPool,
    id: &str,
    content: &str,
    metadata: &Map<String, Value>,
    updated_at: i64,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE messages
        SET content = $2, metadata = $3, updated_at = $4
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(content)
    .bind(Value::Object(metadata.clone()))
    .bind(updated_at)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
