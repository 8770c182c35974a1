//! Wire types of the page database API

use serde::de::IgnoredAny;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use taskbridge_core::{FilterCondition, PageFilter, PageProperties, PropertyValue, RemotePage};
use taskbridge_domain::constants::QUERY_PAGE_SIZE;
use taskbridge_domain::DatabaseSchema;

/// `GET /v1/databases/{id}` response, reduced to its property schema.
#[derive(Debug, Deserialize)]
pub struct DatabaseResponse {
    #[serde(default = "PropertiesField::absent")]
    properties: PropertiesField,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PropertiesField {
    Mapping(DatabaseSchema),
    Other(IgnoredAny),
}

impl PropertiesField {
    fn absent() -> Self {
        Self::Mapping(DatabaseSchema::new(Vec::new()))
    }
}

impl DatabaseResponse {
    /// The schema, or `None` when `properties` is present but not a mapping.
    /// A response without `properties` has an empty schema.
    pub fn into_schema(self) -> Option<DatabaseSchema> {
        match self.properties {
            PropertiesField::Mapping(schema) => Some(schema),
            PropertiesField::Other(_) => None,
        }
    }
}

/// Page object returned by query, create and update.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageResponse {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub url: Option<String>,
}

impl From<PageResponse> for RemotePage {
    fn from(value: PageResponse) -> Self {
        RemotePage { id: value.id, url: value.url }
    }
}

/// `POST /v1/databases/{id}/query` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    results: Vec<Value>,
}

impl QueryResponse {
    /// Every result counts as a match, even one without an id.
    pub fn into_pages(self) -> Vec<RemotePage> {
        self.results
            .into_iter()
            .map(|item| serde_json::from_value::<PageResponse>(item).unwrap_or_default())
            .map(RemotePage::from)
            .collect()
    }
}

fn text_block(content: &str) -> Value {
    json!([{ "text": { "content": content } }])
}

/// Property value in the shape the page API expects.
pub fn property_json(value: &PropertyValue) -> Value {
    match value {
        PropertyValue::Title(text) => json!({ "title": text_block(text) }),
        PropertyValue::RichText(text) => json!({ "rich_text": text_block(text) }),
        PropertyValue::Url(url) => json!({ "url": url }),
        PropertyValue::Select(name) => json!({ "select": { "name": name } }),
        PropertyValue::Date(start) => json!({ "date": { "start": start } }),
    }
}

pub fn properties_json(properties: &PageProperties) -> Value {
    let map: Map<String, Value> = properties
        .iter()
        .map(|(name, value)| (name.to_string(), property_json(value)))
        .collect();
    Value::Object(map)
}

/// Query body: one equality filter and the page size cap.
pub fn query_json(filter: &PageFilter) -> Value {
    let (kind, expected) = match &filter.condition {
        FilterCondition::UrlEquals(value) => ("url", value),
        FilterCondition::TitleEquals(value) => ("title", value),
        FilterCondition::RichTextEquals(value) => ("rich_text", value),
    };

    let mut condition = Map::new();
    condition.insert("property".into(), Value::String(filter.property.clone()));
    condition.insert(kind.into(), json!({ "equals": expected }));

    json!({ "filter": condition, "page_size": QUERY_PAGE_SIZE })
}

#[cfg(test)]
mod tests {
    use taskbridge_domain::PropertyKind;

    use super::*;

    #[test]
    fn schema_keeps_remote_order() {
        let response: DatabaseResponse = serde_json::from_value(json!({
            "object": "database",
            "properties": {
                "Zeta": {"type": "url"},
                "Name": {"type": "title"},
                "Alpha": {"type": "url"}
            }
        }))
        .unwrap();

        let schema = response.into_schema().unwrap();
        let names: Vec<_> = schema.properties().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Zeta", "Name", "Alpha"]);
        assert_eq!(schema.first_of(&PropertyKind::Url).unwrap().name, "Zeta");
    }

    #[test]
    fn non_mapping_properties_have_no_schema() {
        let response: DatabaseResponse =
            serde_json::from_value(json!({"properties": ["Name"]})).unwrap();
        assert!(response.into_schema().is_none());
    }

    #[test]
    fn missing_properties_is_an_empty_schema() {
        let response: DatabaseResponse = serde_json::from_value(json!({"id": "db"})).unwrap();
        assert!(response.into_schema().unwrap().is_empty());
    }

    #[test]
    fn renders_each_property_shape() {
        let mut properties = PageProperties::new();
        properties.insert("Title", PropertyValue::title("PR #7: Fix"));
        properties.insert("Link", PropertyValue::Url("https://github.com/acme/app/pull/7".into()));
        properties.insert("Execution State", PropertyValue::Select("Merged".into()));
        properties.insert("Last Sync", PropertyValue::Date("2026-01-01T00:00:00Z".into()));

        assert_eq!(
            properties_json(&properties),
            json!({
                "Title": {"title": [{"text": {"content": "PR #7: Fix"}}]},
                "Link": {"url": "https://github.com/acme/app/pull/7"},
                "Execution State": {"select": {"name": "Merged"}},
                "Last Sync": {"date": {"start": "2026-01-01T00:00:00Z"}}
            })
        );
    }

    #[test]
    fn query_filters_on_one_property() {
        let filter =
            PageFilter::new("Task ID", FilterCondition::RichTextEquals("TSK-20260101-0001".into()));
        assert_eq!(
            query_json(&filter),
            json!({
                "filter": {"property": "Task ID", "rich_text": {"equals": "TSK-20260101-0001"}},
                "page_size": 5
            })
        );
    }

    #[test]
    fn query_results_without_id_still_count() {
        let response: QueryResponse =
            serde_json::from_value(json!({"results": [{"id": "p1"}, 42]})).unwrap();
        let pages = response.into_pages();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].id, "p1");
        assert_eq!(pages[1].id, "");
    }
}
