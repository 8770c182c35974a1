//! Pull request / CI -> task execution state pipeline

use std::sync::Arc;

use taskbridge_domain::constants::{EXECUTION_STATE_PROPERTY, LAST_SYNC_PROPERTY};
use taskbridge_domain::{ActionResult, Reason, RetryPolicy, RetryStage, TaskRecord};
use tracing::{info, instrument, warn};

use super::matcher::{fetch_schema, match_pages, tracked};
use super::ports::{FilterCondition, PageDatabase, PageFilter, PageProperties, PropertyValue};
use super::reconciler::{decide, Decision};
use super::RunContext;
use crate::schema::TaskProperties;

/// Mirrors code-host activity into the task page's execution state.
///
/// A task page missing from the database is created with a placeholder
/// title so the state change is not lost.
pub struct TaskStateSync {
    database: Arc<dyn PageDatabase>,
    policy: RetryPolicy,
}

impl TaskStateSync {
    pub fn new(database: Arc<dyn PageDatabase>, policy: RetryPolicy) -> Self {
        Self { database, policy }
    }

    #[instrument(skip_all, fields(task_key = %record.task_key))]
    pub async fn run(&self, record: &TaskRecord) -> ActionResult {
        let mut ctx = RunContext::new(
            record,
            self.policy,
            &[RetryStage::Schema, RetryStage::Query, RetryStage::Write],
        );

        let schema = match fetch_schema(self.database.as_ref(), &mut ctx.retry).await {
            Ok(Some(schema)) => schema,
            Ok(None) => return ctx.fail(Reason::InvalidDatabaseProperties).into(),
            Err(failure) => {
                return ctx
                    .remote_failure(failure, Reason::NotionDbHttpError, Reason::NotionDbError)
                    .into();
            }
        };
        let props = match TaskProperties::resolve(&schema) {
            Ok(props) => props,
            Err(reason) => return ctx.fail(reason).into(),
        };

        let filter = PageFilter::new(
            props.task_id.name.as_str(),
            FilterCondition::RichTextEquals(record.task_key.clone()),
        );
        let matches = match match_pages(self.database.as_ref(), &filter, &mut ctx.retry).await {
            Ok(matches) => matches,
            Err(failure) => {
                return ctx
                    .remote_failure(failure, Reason::NotionQueryHttpError, Reason::NotionQueryError)
                    .into();
            }
        };

        let state = state_properties(&props, record);
        let (written, created) = match decide(matches) {
            Decision::Reject { match_count } => {
                warn!(match_count, "multiple task pages share the task key");
                return ctx.fail(Reason::DuplicateTaskMatch).with_match_count(match_count).into();
            }
            Decision::Update(page) => {
                let result = tracked(
                    self.database.update_page(&page.id, &state).await,
                    RetryStage::Write,
                    &mut ctx.retry,
                );
                match result {
                    Ok(_) => (page.id, false),
                    Err(failure) => {
                        return ctx
                            .remote_failure(
                                failure,
                                Reason::NotionWriteHttpError,
                                Reason::NotionWriteError,
                            )
                            .into();
                    }
                }
            }
            Decision::Create => {
                let properties = create_properties(&props, record, state);
                let result = tracked(
                    self.database.create_page(&properties).await,
                    RetryStage::Write,
                    &mut ctx.retry,
                );
                match result {
                    Ok(page) => (page.id, true),
                    Err(failure) => {
                        return ctx
                            .remote_failure(
                                failure,
                                Reason::NotionCreateHttpError,
                                Reason::NotionCreateError,
                            )
                            .into();
                    }
                }
            }
        };

        let mut applied = ctx.applied(record).with_ignored_fields(ignored_fields(&props));
        applied.notion_page_id = Some(written);
        applied.task_id_property_name = Some(props.task_id.name.clone());

        info!(
            created,
            state = %record.fields.execution_state,
            retries = ctx.retry.total(),
            "task state reconciled"
        );
        if created {
            ActionResult::Create(applied)
        } else {
            ActionResult::Update(applied)
        }
    }
}

/// State properties present in the database with the expected type.
fn state_properties(props: &TaskProperties, record: &TaskRecord) -> PageProperties {
    let mut properties = PageProperties::new();
    if let Some(name) = &props.execution_state {
        properties.insert(
            name.as_str(),
            PropertyValue::Select(record.fields.execution_state.as_str().to_string()),
        );
    }
    if let Some(name) = &props.last_sync {
        properties.insert(name.as_str(), PropertyValue::Date(record.fields.last_sync.clone()));
    }
    properties
}

fn create_properties(
    props: &TaskProperties,
    record: &TaskRecord,
    state: PageProperties,
) -> PageProperties {
    let mut properties = PageProperties::new();
    properties.insert(
        props.title.name.as_str(),
        PropertyValue::title(&format!("[{}] auto-created by sync", record.task_key)),
    );
    properties.insert(props.task_id.name.as_str(), PropertyValue::rich_text(&record.task_key));
    for (name, value) in state.iter() {
        properties.insert(name, value.clone());
    }
    properties
}

fn ignored_fields(props: &TaskProperties) -> Vec<String> {
    let mut ignored = Vec::new();
    if props.execution_state.is_none() {
        ignored.push(EXECUTION_STATE_PROPERTY.to_string());
    }
    if props.last_sync.is_none() {
        ignored.push(LAST_SYNC_PROPERTY.to_string());
    }
    ignored
}
