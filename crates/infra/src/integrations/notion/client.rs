//! Page database client implementing the page database port

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use serde_json::{json, Map, Value};
use taskbridge_core::{PageDatabase, PageFilter, PageProperties, RemotePage, RemoteResult};
use taskbridge_domain::constants::NOTION_VERSION;
use taskbridge_domain::{DatabaseSchema, NotionSettings, RetryPolicy, TaskBridgeError};
use tracing::{debug, instrument};

use super::types::{properties_json, query_json, DatabaseResponse, PageResponse, QueryResponse};
use crate::http::HttpClient;

const NOTION_VERSION_HEADER: &str = "notion-version";

/// One database (knowledge or tasks) of the task tracker.
pub struct NotionDatabase {
    http: HttpClient,
    api_base: String,
    database_id: String,
}

impl NotionDatabase {
    /// Bind a client to `database_id`, retrying every call under `policy`.
    ///
    /// # Errors
    /// Returns `TaskBridgeError::Config` when the token cannot be sent as a
    /// header or the HTTP client cannot be built.
    pub fn new(
        settings: &NotionSettings,
        database_id: impl Into<String>,
        policy: RetryPolicy,
    ) -> Result<Self, TaskBridgeError> {
        let http = HttpClient::builder()
            .retry_policy(policy)
            .default_headers(default_headers(&settings.token)?)
            .build()?;

        Ok(Self {
            http,
            api_base: settings.api_base.trim_end_matches('/').to_string(),
            database_id: database_id.into(),
        })
    }

    fn database_url(&self) -> String {
        format!("{}/v1/databases/{}", self.api_base, self.database_id)
    }

    fn pages_url(&self) -> String {
        format!("{}/v1/pages", self.api_base)
    }

    /// Add property definitions to the database schema.
    ///
    /// Existing properties named in `definitions` are replaced by the remote,
    /// so callers pass only the ones that are missing.
    #[instrument(skip_all, fields(database_id = %self.database_id, count = definitions.len()))]
    pub async fn add_properties(&self, definitions: &Map<String, Value>) -> RemoteResult<()> {
        let body = json!({ "properties": definitions });
        let response = self.http.execute(Method::PATCH, &self.database_url(), Some(&body)).await?;
        Ok(response.map(|_| ()))
    }

    async fn write_page(
        &self,
        method: Method,
        url: &str,
        body: &Value,
    ) -> RemoteResult<RemotePage> {
        let response = self.http.execute_json::<PageResponse>(method, url, Some(body)).await?;
        debug!(page_id = %response.value.id, retries = response.retries, "page written");
        Ok(response.map(RemotePage::from))
    }
}

fn default_headers(token: &str) -> Result<HeaderMap, TaskBridgeError> {
    let mut authorization = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
        TaskBridgeError::Config("NOTION_TOKEN contains characters not allowed in a header".into())
    })?;
    authorization.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, authorization);
    headers.insert(
        HeaderName::from_static(NOTION_VERSION_HEADER),
        HeaderValue::from_static(NOTION_VERSION),
    );
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Ok(headers)
}

#[async_trait]
impl PageDatabase for NotionDatabase {
    fn database_id(&self) -> &str {
        &self.database_id
    }

    #[instrument(skip(self), fields(database_id = %self.database_id))]
    async fn retrieve_schema(&self) -> RemoteResult<Option<DatabaseSchema>> {
        let response = self
            .http
            .execute_json::<DatabaseResponse>(Method::GET, &self.database_url(), None)
            .await?;
        Ok(response.map(DatabaseResponse::into_schema))
    }

    #[instrument(skip(self), fields(database_id = %self.database_id))]
    async fn query(&self, filter: &PageFilter) -> RemoteResult<Vec<RemotePage>> {
        let url = format!("{}/query", self.database_url());
        let body = query_json(filter);
        let response =
            self.http.execute_json::<QueryResponse>(Method::POST, &url, Some(&body)).await?;
        Ok(response.map(QueryResponse::into_pages))
    }

    #[instrument(skip_all, fields(database_id = %self.database_id))]
    async fn create_page(&self, properties: &PageProperties) -> RemoteResult<RemotePage> {
        let body = json!({
            "parent": { "database_id": self.database_id },
            "properties": properties_json(properties),
        });
        self.write_page(Method::POST, &self.pages_url(), &body).await
    }

    #[instrument(skip(self, properties), fields(database_id = %self.database_id))]
    async fn update_page(
        &self,
        page_id: &str,
        properties: &PageProperties,
    ) -> RemoteResult<RemotePage> {
        let url = format!("{}/{page_id}", self.pages_url());
        let body = json!({ "properties": properties_json(properties) });
        let mut written = self.write_page(Method::PATCH, &url, &body).await?;
        if written.value.id.is_empty() {
            written.value.id = page_id.to_string();
        }
        Ok(written)
    }
}
