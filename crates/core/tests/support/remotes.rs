//! In-memory issue tracker and page database

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use taskbridge_core::{
    Attempted, FilterCondition, IssueTracker, PageDatabase, PageFilter, PageProperties,
    PropertyValue, RemoteError, RemoteFailure, RemoteIssue, RemotePage, RemoteResult,
};
use taskbridge_domain::{DatabaseSchema, IssueFields, PropertyKind, SchemaProperty};

/// Remote operation kinds that can be scripted and counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Call {
    List,
    Search,
    CreateIssue,
    UpdateIssue,
    Schema,
    Query,
    CreatePage,
    UpdatePage,
}

/// Scripted outcome for the next call of one kind.
#[derive(Debug, Clone)]
pub enum Scripted {
    /// Succeed after consuming this many retries.
    Retries(u32),
    Fail(RemoteFailure),
}

impl Scripted {
    pub fn http(status: u16, retries: u32) -> Self {
        Self::Fail(RemoteFailure::new(RemoteError::Http { status, body: None }, retries))
    }
}

#[derive(Debug, Default)]
struct Script {
    outcomes: Mutex<HashMap<Call, VecDeque<Scripted>>>,
    calls: Mutex<Vec<Call>>,
}

impl Script {
    fn push(&self, call: Call, scripted: Scripted) {
        self.outcomes.lock().unwrap().entry(call).or_default().push_back(scripted);
    }

    /// Records the call and returns the retries it should report.
    fn next(&self, call: Call) -> Result<u32, RemoteFailure> {
        self.calls.lock().unwrap().push(call);
        match self.outcomes.lock().unwrap().get_mut(&call).and_then(VecDeque::pop_front) {
            Some(Scripted::Fail(failure)) => Err(failure),
            Some(Scripted::Retries(retries)) => Ok(retries),
            None => Ok(0),
        }
    }

    fn count(&self, call: Call) -> usize {
        self.calls.lock().unwrap().iter().filter(|made| **made == call).count()
    }
}

fn not_found(retries: u32) -> RemoteFailure {
    RemoteFailure::new(RemoteError::Http { status: 404, body: None }, retries)
}

#[derive(Debug, Clone)]
struct StoredIssue {
    number: u64,
    title: String,
    labels: Vec<String>,
}

/// Issue tracker holding issues in memory.
#[derive(Debug, Default)]
pub struct InMemoryTracker {
    script: Script,
    issues: Mutex<Vec<StoredIssue>>,
    lagging_index: Mutex<(bool, bool)>,
}

impl InMemoryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds an issue carrying `label`, returning its number.
    pub fn with_issue(self, label: &str) -> Self {
        let mut issues = self.issues.lock().unwrap();
        let number = issues.len() as u64 + 1;
        issues.push(StoredIssue { number, title: String::new(), labels: vec![label.to_string()] });
        drop(issues);
        self
    }

    /// Hides issues from the label listing and, optionally, from search.
    pub fn lag_index(&self, listing: bool, search: bool) {
        *self.lagging_index.lock().unwrap() = (listing, search);
    }

    pub fn script(&self, call: Call, scripted: Scripted) {
        self.script.push(call, scripted);
    }

    pub fn calls(&self, call: Call) -> usize {
        self.script.count(call)
    }

    pub fn issue_count(&self) -> usize {
        self.issues.lock().unwrap().len()
    }

    pub fn title_of(&self, number: u64) -> Option<String> {
        self.issues.lock().unwrap().iter().find(|i| i.number == number).map(|i| i.title.clone())
    }

    fn labelled(&self, label: &str) -> Vec<RemoteIssue> {
        self.issues
            .lock()
            .unwrap()
            .iter()
            .filter(|issue| issue.labels.iter().any(|l| l == label))
            .map(|issue| remote(issue.number))
            .collect()
    }
}

fn remote(number: u64) -> RemoteIssue {
    RemoteIssue { number, html_url: Some(format!("https://github.test/acme/app/issues/{number}")) }
}

#[async_trait]
impl IssueTracker for InMemoryTracker {
    fn owner(&self) -> &str {
        "acme"
    }

    fn repo(&self) -> &str {
        "app"
    }

    async fn list_by_label(&self, label: &str) -> RemoteResult<Vec<RemoteIssue>> {
        let retries = self.script.next(Call::List)?;
        let hidden = self.lagging_index.lock().unwrap().0;
        let issues = if hidden { Vec::new() } else { self.labelled(label) };
        Ok(Attempted::new(issues, retries))
    }

    async fn search(&self, query: &str) -> RemoteResult<Vec<RemoteIssue>> {
        let retries = self.script.next(Call::Search)?;
        let hidden = self.lagging_index.lock().unwrap().1;
        let label = query.rsplit("label:").next().unwrap_or_default();
        let issues = if hidden { Vec::new() } else { self.labelled(label) };
        Ok(Attempted::new(issues, retries))
    }

    async fn create_issue(&self, fields: &IssueFields) -> RemoteResult<RemoteIssue> {
        let retries = self.script.next(Call::CreateIssue)?;
        let mut issues = self.issues.lock().unwrap();
        let number = issues.len() as u64 + 1;
        issues.push(StoredIssue {
            number,
            title: fields.title.clone(),
            labels: fields.labels.clone(),
        });
        Ok(Attempted::new(remote(number), retries))
    }

    async fn update_issue(&self, number: u64, fields: &IssueFields) -> RemoteResult<RemoteIssue> {
        let retries = self.script.next(Call::UpdateIssue)?;
        let mut issues = self.issues.lock().unwrap();
        let issue =
            issues.iter_mut().find(|i| i.number == number).ok_or_else(|| not_found(retries))?;
        issue.title = fields.title.clone();
        issue.labels = fields.labels.clone();
        Ok(Attempted::new(remote(number), retries))
    }
}

#[derive(Debug, Clone)]
struct StoredPage {
    id: String,
    properties: PageProperties,
}

/// Page database holding pages in memory.
#[derive(Debug)]
pub struct InMemoryDatabase {
    script: Script,
    schema: Option<DatabaseSchema>,
    pages: Mutex<Vec<StoredPage>>,
}

impl InMemoryDatabase {
    pub fn new(properties: &[(&str, PropertyKind)]) -> Self {
        let schema = DatabaseSchema::new(
            properties
                .iter()
                .map(|(name, kind)| SchemaProperty::new(*name, kind.clone()))
                .collect(),
        );
        Self { script: Script::default(), schema: Some(schema), pages: Mutex::new(Vec::new()) }
    }

    /// Database whose schema response carries no property mapping.
    pub fn without_properties() -> Self {
        Self { script: Script::default(), schema: None, pages: Mutex::new(Vec::new()) }
    }

    pub fn with_page(self, properties: PageProperties) -> Self {
        let mut pages = self.pages.lock().unwrap();
        let id = format!("page-{}", pages.len() + 1);
        pages.push(StoredPage { id, properties });
        drop(pages);
        self
    }

    pub fn script(&self, call: Call, scripted: Scripted) {
        self.script.push(call, scripted);
    }

    pub fn calls(&self, call: Call) -> usize {
        self.script.count(call)
    }

    pub fn page_count(&self) -> usize {
        self.pages.lock().unwrap().len()
    }

    pub fn property(&self, page_id: &str, name: &str) -> Option<PropertyValue> {
        self.pages
            .lock()
            .unwrap()
            .iter()
            .find(|page| page.id == page_id)
            .and_then(|page| page.properties.get(name).cloned())
    }
}

fn matches_filter(properties: &PageProperties, filter: &PageFilter) -> bool {
    let value = properties.get(&filter.property);
    match (&filter.condition, value) {
        (FilterCondition::UrlEquals(want), Some(PropertyValue::Url(have)))
        | (FilterCondition::TitleEquals(want), Some(PropertyValue::Title(have)))
        | (FilterCondition::RichTextEquals(want), Some(PropertyValue::RichText(have))) => {
            want == have
        }
        _ => false,
    }
}

#[async_trait]
impl PageDatabase for InMemoryDatabase {
    fn database_id(&self) -> &str {
        "db-test"
    }

    async fn retrieve_schema(&self) -> RemoteResult<Option<DatabaseSchema>> {
        let retries = self.script.next(Call::Schema)?;
        Ok(Attempted::new(self.schema.clone(), retries))
    }

    async fn query(&self, filter: &PageFilter) -> RemoteResult<Vec<RemotePage>> {
        let retries = self.script.next(Call::Query)?;
        let pages = self
            .pages
            .lock()
            .unwrap()
            .iter()
            .filter(|page| matches_filter(&page.properties, filter))
            .map(|page| RemotePage { id: page.id.clone(), url: None })
            .collect();
        Ok(Attempted::new(pages, retries))
    }

    async fn create_page(&self, properties: &PageProperties) -> RemoteResult<RemotePage> {
        let retries = self.script.next(Call::CreatePage)?;
        let mut pages = self.pages.lock().unwrap();
        let id = format!("page-{}", pages.len() + 1);
        pages.push(StoredPage { id: id.clone(), properties: properties.clone() });
        Ok(Attempted::new(RemotePage { id, url: None }, retries))
    }

    async fn update_page(
        &self,
        page_id: &str,
        properties: &PageProperties,
    ) -> RemoteResult<RemotePage> {
        let retries = self.script.next(Call::UpdatePage)?;
        let mut pages = self.pages.lock().unwrap();
        let page =
            pages.iter_mut().find(|page| page.id == page_id).ok_or_else(|| not_found(retries))?;
        for (name, value) in properties.iter() {
            page.properties.insert(name, value.clone());
        }
        Ok(Attempted::new(RemotePage { id: page.id.clone(), url: None }, retries))
    }
}
