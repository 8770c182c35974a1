//! Pull request -> knowledge page pipeline

use std::sync::Arc;

use taskbridge_domain::constants::TITLE_FALLBACK_MARKER;
use taskbridge_domain::{
    ActionResult, KnowledgeFields, KnowledgeRecord, Reason, RetryPolicy, RetryStage,
};
use tracing::{info, instrument, warn};

use super::matcher::{fetch_schema, match_pages, tracked};
use super::ports::{FilterCondition, PageDatabase, PageFilter, PageProperties, PropertyValue};
use super::reconciler::{decide, Decision};
use super::RunContext;
use crate::schema::KnowledgeProperties;

/// Upserts one knowledge page per pull-request URL.
pub struct KnowledgeSync {
    database: Arc<dyn PageDatabase>,
    policy: RetryPolicy,
    link_property: String,
}

impl KnowledgeSync {
    /// `link_property` is the preferred name of the URL property holding the
    /// canonical link.
    pub fn new(
        database: Arc<dyn PageDatabase>,
        policy: RetryPolicy,
        link_property: impl Into<String>,
    ) -> Self {
        Self { database, policy, link_property: link_property.into() }
    }

    #[instrument(skip_all, fields(link = %record.canonical_link))]
    pub async fn run(&self, record: &KnowledgeRecord) -> ActionResult {
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
        let props = match KnowledgeProperties::resolve(&schema, &self.link_property) {
            Ok(props) => props,
            Err(reason) => return ctx.fail(reason).into(),
        };
        let link_name = props.link_name().unwrap_or(TITLE_FALLBACK_MARKER).to_string();

        let filter = query_filter(&props, record);
        let matches = match match_pages(self.database.as_ref(), &filter, &mut ctx.retry).await {
            Ok(matches) => matches,
            Err(failure) => {
                return ctx
                    .remote_failure(failure, Reason::NotionQueryHttpError, Reason::NotionQueryError)
                    .with_link_property(link_name)
                    .into();
            }
        };

        let properties = page_properties(&props, &record.fields);
        let (written, created) = match decide(matches) {
            Decision::Reject { match_count } => {
                warn!(match_count, "multiple knowledge pages share the canonical link");
                return ctx
                    .fail(Reason::DuplicateKnowledgeMatch)
                    .with_match_count(match_count)
                    .into();
            }
            Decision::Update(page) => (
                tracked(
                    self.database.update_page(&page.id, &properties).await,
                    RetryStage::Write,
                    &mut ctx.retry,
                )
                .map(|_| page.id),
                false,
            ),
            Decision::Create => (
                tracked(
                    self.database.create_page(&properties).await,
                    RetryStage::Write,
                    &mut ctx.retry,
                )
                .map(|page| page.id),
                true,
            ),
        };

        let page_id = match written {
            Ok(page_id) => page_id,
            Err(failure) => {
                return ctx
                    .remote_failure(failure, Reason::NotionWriteHttpError, Reason::NotionWriteError)
                    .into();
            }
        };

        let mut applied = ctx.applied(record).with_ignored_fields(ignored_fields(&props));
        applied.notion_page_id = Some(page_id);
        applied.link_property_name = Some(link_name);

        info!(created, retries = ctx.retry.total(), "knowledge page reconciled");
        if created {
            ActionResult::Create(applied)
        } else {
            ActionResult::Update(applied)
        }
    }
}

/// URL equality on the link property, or title equality when the database
/// has no URL property.
fn query_filter(props: &KnowledgeProperties, record: &KnowledgeRecord) -> PageFilter {
    match props.link_name() {
        Some(link) => {
            PageFilter::new(link, FilterCondition::UrlEquals(record.canonical_link.clone()))
        }
        None => PageFilter::new(
            props.title.name.as_str(),
            FilterCondition::TitleEquals(record.fields.title.clone()),
        ),
    }
}

/// Title, link and summary are the only properties this system owns.
fn page_properties(props: &KnowledgeProperties, fields: &KnowledgeFields) -> PageProperties {
    let mut properties = PageProperties::new();
    properties.insert(props.title.name.as_str(), PropertyValue::title(&fields.title));
    if let Some(link) = props.link_name() {
        properties.insert(link, PropertyValue::Url(fields.canonical_link.clone()));
    }
    if let Some(summary) = props.summary_name() {
        properties.insert(summary, PropertyValue::rich_text(&fields.summary));
    }
    properties
}

/// Normalized fields that had no destination property.
fn ignored_fields(props: &KnowledgeProperties) -> Vec<String> {
    let mut written = vec!["Title"];
    if props.link_name().is_some() {
        written.push("GitHub Canonical Link");
    }
    if props.summary_name().is_some() {
        written.push("Summary");
    }

    KnowledgeFields::NAMES
        .iter()
        .filter(|name| !written.contains(name))
        .map(ToString::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use taskbridge_domain::{DatabaseSchema, PropertyKind, SchemaProperty};

    use super::*;

    fn fields() -> KnowledgeFields {
        KnowledgeFields {
            title: "PR #1: x".into(),
            knowledge_id: "KNW-PR-1".into(),
            record_type: "RUN".into(),
            canonical_link: "https://github.com/o/r/pull/1".into(),
            summary: "s".repeat(2500),
            status: "Draft".into(),
            owner: String::new(),
            source_path: String::new(),
            last_sync: "2026-01-01T00:00:00Z".into(),
        }
    }

    #[test]
    fn writes_only_owned_properties() {
        let schema = DatabaseSchema::new(vec![
            SchemaProperty::new("Name", PropertyKind::Title),
            SchemaProperty::new("GitHub URL", PropertyKind::Url),
            SchemaProperty::new("Summary", PropertyKind::RichText),
            SchemaProperty::new("Status", PropertyKind::Select),
        ]);
        let props = KnowledgeProperties::resolve(&schema, "GitHub Canonical Link").unwrap();

        let properties = page_properties(&props, &fields());

        assert_eq!(properties.names(), vec!["Name", "GitHub URL", "Summary"]);
        let Some(PropertyValue::RichText(summary)) = properties.get("Summary") else {
            panic!("summary missing");
        };
        assert_eq!(summary.len(), 1900);
        assert_eq!(
            ignored_fields(&props),
            vec!["Knowledge ID", "Record Type", "Status", "Owner", "Source Path", "Last Sync"]
        );
    }

    #[test]
    fn title_filter_without_link_property() {
        let schema = DatabaseSchema::new(vec![SchemaProperty::new("Title", PropertyKind::Title)]);
        let props = KnowledgeProperties::resolve(&schema, "").unwrap();
        let record = KnowledgeRecord {
            event_type: "github.pr.opened".into(),
            canonical_link: "https://github.com/o/r/pull/1".into(),
            repo: None,
            pr_number: Some("1".into()),
            task_key: None,
            timestamp_utc: "2026-01-01T00:00:00Z".into(),
            fields: fields(),
            ignored_fields: Vec::new(),
        };

        let filter = query_filter(&props, &record);

        assert_eq!(
            filter,
            PageFilter::new("Title", FilterCondition::TitleEquals("PR #1: x".into()))
        );
        assert_eq!(
            ignored_fields(&props).len(),
            KnowledgeFields::NAMES.len() - 1
        );
    }
}
