use serde_json::{Map, Value};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};

/// A row of `dds.srv_wf_settings`, one per synchronization workflow.
#[derive(Debug, Clone, FromRow)]
pub struct WorkflowSettingsRow {
    pub id: i64,
    pub workflow_key: String,
    pub workflow_settings: Json<Map<String, Value>>,
}

/// Fetches the settings row of `workflow_key`, if the workflow ever checkpointed.
pub async fn get_workflow_settings(
    pool: &PgPool,
    workflow_key: &str,
) -> sqlx::Result<Option<WorkflowSettingsRow>> {
    sqlx::query_as::<_, WorkflowSettingsRow>(
        r#"
        select id, workflow_key, workflow_settings
        from dds.srv_wf_settings
        where workflow_key = $1
        "#,
    )
    .bind(workflow_key)
    .fetch_optional(pool)
    .await
}

/// Inserts or replaces the settings of `workflow_key`.
pub async fn upsert_workflow_settings(
    pool: &PgPool,
    workflow_key: &str,
    workflow_settings: &Map<String, Value>,
) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        insert into dds.srv_wf_settings (workflow_key, workflow_settings)
        values ($1, $2)
        on conflict (workflow_key) do update
        set workflow_settings = excluded.workflow_settings
        "#,
    )
    .bind(workflow_key)
    .bind(Json(workflow_settings))
    .execute(pool)
    .await?;

    Ok(())
}
