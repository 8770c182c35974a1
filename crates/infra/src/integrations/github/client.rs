//! Code-host REST client implementing the issue tracker port

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::Method;
use serde_json::{json, Value};
use taskbridge_core::{IssueTracker, RemoteIssue, RemoteResult};
use taskbridge_domain::constants::{GITHUB_ACCEPT, GITHUB_API_VERSION, ISSUE_PAGE_SIZE};
use taskbridge_domain::{GithubSettings, IssueFields, RetryPolicy, TaskBridgeError};
use tracing::{debug, instrument};

use super::types::{IssueResponse, SearchResponse};
use crate::http::HttpClient;

const API_VERSION_HEADER: &str = "x-github-api-version";

/// Issue tracker bound to one `owner/repo`.
pub struct GithubIssueTracker {
    http: HttpClient,
    api_base: String,
    owner: String,
    repo: String,
}

impl GithubIssueTracker {
    /// Create a tracker from settings, retrying every call under `policy`.
    ///
    /// # Errors
    /// Returns `TaskBridgeError::Config` when the token cannot be sent as a
    /// header or the HTTP client cannot be built.
    pub fn new(settings: &GithubSettings, policy: RetryPolicy) -> Result<Self, TaskBridgeError> {
        let http = HttpClient::builder()
            .retry_policy(policy)
            .default_headers(default_headers(&settings.token)?)
            .build()?;

        Ok(Self {
            http,
            api_base: settings.api_base.trim_end_matches('/').to_string(),
            owner: settings.owner.clone(),
            repo: settings.repo.clone(),
        })
    }

    fn issues_url(&self) -> String {
        format!("{}/repos/{}/{}/issues", self.api_base, self.owner, self.repo)
    }

    async fn write(
        &self,
        method: Method,
        url: &str,
        fields: &IssueFields,
    ) -> RemoteResult<RemoteIssue> {
        let body = issue_body(fields);
        let response = self.http.execute_json::<IssueResponse>(method, url, Some(&body)).await?;
        debug!(number = response.value.number, retries = response.retries, "issue written");
        Ok(response.map(RemoteIssue::from))
    }
}

fn default_headers(token: &str) -> Result<HeaderMap, TaskBridgeError> {
    let mut authorization = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
        TaskBridgeError::Config("GITHUB_TOKEN contains characters not allowed in a header".into())
    })?;
    authorization.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, authorization);
    headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_ACCEPT));
    headers.insert(
        HeaderName::from_static(API_VERSION_HEADER),
        HeaderValue::from_static(GITHUB_API_VERSION),
    );
    Ok(headers)
}

fn issue_body(fields: &IssueFields) -> Value {
    json!({
        "title": fields.title,
        "body": fields.body,
        "labels": fields.labels,
    })
}

#[async_trait]
impl IssueTracker for GithubIssueTracker {
    fn owner(&self) -> &str {
        &self.owner
    }

    fn repo(&self) -> &str {
        &self.repo
    }

    #[instrument(skip(self), fields(owner = %self.owner, repo = %self.repo))]
    async fn list_by_label(&self, label: &str) -> RemoteResult<Vec<RemoteIssue>> {
        let url = format!(
            "{}?state=all&labels={}&per_page={}",
            self.issues_url(),
            urlencoding::encode(label),
            ISSUE_PAGE_SIZE
        );
        let listing = self.http.execute_json::<Value>(Method::GET, &url, None).await?;

        Ok(listing.map(|value| {
            IssueResponse::from_listing(value).into_iter().map(RemoteIssue::from).collect()
        }))
    }

    #[instrument(skip(self))]
    async fn search(&self, query: &str) -> RemoteResult<Vec<RemoteIssue>> {
        let url = format!("{}/search/issues?q={}", self.api_base, urlencoding::encode(query));
        let found = self.http.execute_json::<SearchResponse>(Method::GET, &url, None).await?;

        Ok(found.map(|response| {
            response
                .items
                .into_iter()
                .map(IssueResponse::from_item)
                .map(RemoteIssue::from)
                .collect()
        }))
    }

    #[instrument(skip_all, fields(owner = %self.owner, repo = %self.repo))]
    async fn create_issue(&self, fields: &IssueFields) -> RemoteResult<RemoteIssue> {
        self.write(Method::POST, &self.issues_url(), fields).await
    }

    #[instrument(skip(self, fields), fields(owner = %self.owner, repo = %self.repo))]
    async fn update_issue(&self, number: u64, fields: &IssueFields) -> RemoteResult<RemoteIssue> {
        let url = format!("{}/{number}", self.issues_url());
        let mut written = self.write(Method::PATCH, &url, fields).await?;
        written.value.number = number;
        Ok(written)
    }
}
