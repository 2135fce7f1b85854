use std::collections::BTreeMap;
use std::env;
use std::str::FromStr;
use std::thread::sleep;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result, bail};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::WikiConfig;
use crate::error::{AuthError, is_auth_error_code};

pub const NS_MAIN: i32 = 0;
pub const NS_TEMPLATE: i32 = 10;

const TITLE_BATCH: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemotePage {
    pub title: String,
    pub namespace: i32,
    pub page_id: i64,
    pub revision_id: i64,
    pub timestamp: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryMember {
    pub title: String,
    pub page_id: i64,
    pub namespace: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    Page,
    Subcategory,
}

impl MemberKind {
    fn as_api(self) -> &'static str {
        match self {
            Self::Page => "page",
            Self::Subcategory => "subcat",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub title: String,
    pub namespace: i32,
    pub page_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditResult {
    pub title: String,
    pub new_revision_id: Option<i64>,
    pub no_change: bool,
}

pub trait WikiReadApi {
    fn get_page_contents(&mut self, titles: &[String]) -> Result<Vec<RemotePage>>;
    fn get_page_content(&mut self, title: &str) -> Result<Option<RemotePage>> {
        Ok(self
            .get_page_contents(&[title.to_string()])?
            .into_iter()
            .next())
    }
    /// Members of `category` (with or without namespace prefix).
    fn get_category_members(
        &mut self,
        category: &str,
        kind: MemberKind,
        namespace: Option<i32>,
    ) -> Result<Vec<CategoryMember>>;
    /// Visible categories of a page, namespace prefix removed.
    fn get_page_categories(&mut self, title: &str) -> Result<Vec<String>>;
    /// Templates transcluded by a page, namespace prefix removed.
    fn get_page_templates(&mut self, title: &str) -> Result<Vec<String>>;
    /// Wikidata item ids keyed by the requested title.
    fn get_wikibase_items(&mut self, titles: &[String]) -> Result<BTreeMap<String, String>>;
    /// Sitelink titles on `site` keyed by Wikidata item id.
    fn get_sitelinks(&mut self, ids: &[String], site: &str) -> Result<BTreeMap<String, String>>;
    fn search(&mut self, query: &str, namespace: i32, limit: usize) -> Result<Vec<SearchHit>>;
    fn request_count(&self) -> usize;
}

pub trait WikiWriteApi: WikiReadApi {
    fn login(&mut self, username: &str, password: &str) -> Result<()>;
    fn edit_page(
        &mut self,
        title: &str,
        content: &str,
        summary: &str,
        minor: bool,
    ) -> Result<EditResult>;
}

#[derive(Debug, Clone)]
pub struct MediaWikiClientConfig {
    pub api_url: String,
    pub user_agent: String,
    pub timeout_ms: u64,
    pub rate_limit_read_ms: u64,
    pub rate_limit_write_ms: u64,
    pub max_retries: usize,
    pub max_write_retries: usize,
    pub retry_delay_ms: u64,
}

impl MediaWikiClientConfig {
    pub fn from_config(config: &WikiConfig) -> Self {
        Self::from_env_with_defaults(&config.api_url(), &config.user_agent())
    }

    /// Same HTTP settings aimed at another wiki (source edition, Wikidata).
    pub fn for_api(&self, api_url: &str) -> Self {
        Self {
            api_url: api_url.to_string(),
            ..self.clone()
        }
    }

    fn from_env_with_defaults(api_url: &str, user_agent: &str) -> Self {
        Self {
            api_url: api_url.to_string(),
            user_agent: user_agent.to_string(),
            timeout_ms: env_number("WIKI_HTTP_TIMEOUT_MS", 30_000),
            rate_limit_read_ms: env_number("WIKI_RATE_LIMIT_READ", 300),
            rate_limit_write_ms: env_number("WIKI_RATE_LIMIT_WRITE", 1_000),
            max_retries: env_number("WIKI_HTTP_RETRIES", 2),
            max_write_retries: env_number("WIKI_HTTP_WRITE_RETRIES", 1),
            retry_delay_ms: env_number("WIKI_HTTP_RETRY_DELAY_MS", 500),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verb {
    Get,
    Post,
}

pub struct MediaWikiClient {
    client: Client,
    config: MediaWikiClientConfig,
    last_request_at: Option<Instant>,
    request_count: usize,
    csrf_token: Option<String>,
    logged_in: bool,
}

impl MediaWikiClient {
    pub fn new(config: MediaWikiClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .cookie_store(true)
            .build()
            .context("failed to build MediaWiki HTTP client")?;

        Ok(Self {
            client,
            config,
            last_request_at: None,
            request_count: 0,
            csrf_token: None,
            logged_in: false,
        })
    }

    pub fn api_url(&self) -> &str {
        &self.config.api_url
    }

    fn get(&mut self, params: &[(&str, String)]) -> Result<Value> {
        self.call(Verb::Get, params)
    }

    /// Every POST the bots send changes state (login, edit), so POSTs use
    /// the write pacing and retry budget.
    fn post(&mut self, params: &[(&str, String)]) -> Result<Value> {
        self.call(Verb::Post, params)
    }

    fn call(&mut self, verb: Verb, params: &[(&str, String)]) -> Result<Value> {
        let is_write = verb == Verb::Post;
        let budget = if is_write {
            self.config.max_write_retries
        } else {
            self.config.max_retries
        };
        let pairs = request_pairs(params);
        let mut attempt = 0usize;

        loop {
            self.apply_rate_limit(is_write);
            let request = match verb {
                Verb::Get => self.client.get(self.config.api_url.as_str()).query(&pairs),
                Verb::Post => self.client.post(self.config.api_url.as_str()).form(&pairs),
            };
            let sent = request
                .header("User-Agent", self.config.user_agent.as_str())
                .send();

            let retry = match &sent {
                Ok(response) => is_retryable_status(response.status()),
                Err(error) => is_retryable_error(error),
            };
            if retry && attempt < budget {
                self.wait_before_retry(attempt, is_write);
                attempt += 1;
                continue;
            }

            let response = sent
                .with_context(|| format!("failed to call {}", self.config.api_url))?;
            let status = response.status();
            if !status.is_success() {
                bail!("{} answered HTTP {status}", self.config.api_url);
            }
            let payload: Value = response
                .json()
                .context("failed to decode MediaWiki API JSON response")?;
            check_api_error(&payload)?;
            return Ok(payload);
        }
    }

    fn apply_rate_limit(&mut self, is_write: bool) {
        let delay = if is_write {
            Duration::from_millis(self.config.rate_limit_write_ms)
        } else {
            Duration::from_millis(self.config.rate_limit_read_ms)
        };
        if let Some(last) = self.last_request_at {
            let elapsed = last.elapsed();
            if elapsed < delay {
                sleep(delay - elapsed);
            }
        }
        self.last_request_at = Some(Instant::now());
        self.request_count += 1;
    }

    fn wait_before_retry(&self, attempt: usize, is_write: bool) {
        let exponent = u32::try_from(attempt).unwrap_or(16);
        let base = self
            .config
            .retry_delay_ms
            .saturating_mul(2u64.saturating_pow(exponent));
        let jitter = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|duration| u64::from(duration.subsec_millis() % 100))
            .unwrap_or(0);
        let multiplier = if is_write { 2u64 } else { 1u64 };
        let wait = base.saturating_mul(multiplier).saturating_add(jitter);
        tracing::warn!(
            api = %self.config.api_url,
            attempt = attempt + 1,
            wait_ms = wait,
            "retrying MediaWiki request"
        );
        sleep(Duration::from_millis(wait));
    }

    fn ensure_csrf_token(&mut self) -> Result<String> {
        if let Some(token) = &self.csrf_token {
            return Ok(token.clone());
        }
        let response = self.get(&[
            ("action", "query".to_string()),
            ("meta", "tokens".to_string()),
        ])?;
        let parsed: TokenQueryResponse =
            serde_json::from_value(response).context("failed to decode csrf token response")?;
        let token = parsed
            .query
            .tokens
            .as_ref()
            .and_then(|tokens| tokens.csrftoken.as_ref())
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("failed to get MediaWiki csrf token"))?;
        self.csrf_token = Some(token.clone());
        Ok(token)
    }

    /// Runs a `prop=` query for one page, following continuation, and hands
    /// every returned page item to `collect`.
    fn query_page_prop(
        &mut self,
        title: &str,
        params: Vec<(&'static str, String)>,
        continue_key: fn(&ContinuationPayload) -> Option<(&'static str, String)>,
        mut collect: impl FnMut(PageQueryItem),
    ) -> Result<()> {
        let mut continuation: Option<(&'static str, String)> = None;
        loop {
            let mut request = params.clone();
            request.push(("action", "query".to_string()));
            request.push(("titles", title.to_string()));
            if let Some((key, value)) = &continuation {
                request.push((*key, value.clone()));
            }

            let response = self.get(&request)?;
            let parsed: QueryResponse = serde_json::from_value(response)
                .with_context(|| format!("failed to decode page query response for {title}"))?;
            for page in parsed.query.pages {
                collect(page);
            }

            continuation = parsed.continuation.as_ref().and_then(continue_key);
            if continuation.is_none() {
                break;
            }
        }
        Ok(())
    }
}

impl WikiReadApi for MediaWikiClient {
    fn get_page_contents(&mut self, titles: &[String]) -> Result<Vec<RemotePage>> {
        let mut results = Vec::new();
        for batch in titles.chunks(TITLE_BATCH) {
            let params = vec![
                ("action", "query".to_string()),
                ("titles", batch.join("|")),
                ("prop", "revisions".to_string()),
                ("rvprop", "content|timestamp|ids".to_string()),
                ("rvslots", "main".to_string()),
            ];

            let response = self.get(&params)?;
            let parsed: QueryResponse = serde_json::from_value(response)
                .context("failed to decode page content API response")?;

            for page in parsed.query.pages {
                if page.missing.unwrap_or(false) {
                    continue;
                }
                let Some(revision) = page.revisions.first() else {
                    continue;
                };
                let Some(slot) = revision.slots.as_ref().and_then(|slots| slots.main.as_ref())
                else {
                    continue;
                };
                let Some(page_id) = page.pageid else {
                    continue;
                };

                results.push(RemotePage {
                    title: page.title,
                    namespace: page.ns,
                    page_id,
                    revision_id: revision.revid,
                    timestamp: revision.timestamp.clone(),
                    content: slot.content.clone(),
                });
            }
        }
        Ok(results)
    }

    fn get_category_members(
        &mut self,
        category: &str,
        kind: MemberKind,
        namespace: Option<i32>,
    ) -> Result<Vec<CategoryMember>> {
        let mut members = Vec::new();
        let mut continue_token: Option<String> = None;
        let category_title = api_category_title(category);

        loop {
            let mut params = vec![
                ("action", "query".to_string()),
                ("list", "categorymembers".to_string()),
                ("cmtitle", category_title.clone()),
                ("cmtype", kind.as_api().to_string()),
                ("cmprop", "ids|title".to_string()),
                ("cmlimit", "500".to_string()),
            ];
            if let Some(namespace) = namespace {
                params.push(("cmnamespace", namespace.to_string()));
            }
            if let Some(token) = &continue_token {
                params.push(("cmcontinue", token.clone()));
            }

            let response = self.get(&params)?;
            let parsed: QueryResponse = serde_json::from_value(response)
                .context("failed to decode categorymembers API response")?;
            for item in parsed.query.categorymembers {
                members.push(CategoryMember {
                    title: item.title,
                    page_id: item.pageid,
                    namespace: item.ns,
                });
            }

            continue_token = parsed.continuation.and_then(|cont| cont.cmcontinue);
            if continue_token.is_none() {
                break;
            }
        }

        tracing::debug!(category = %category_title, count = members.len(), "fetched category members");
        Ok(members)
    }

    fn get_page_categories(&mut self, title: &str) -> Result<Vec<String>> {
        let mut categories = Vec::new();
        self.query_page_prop(
            title,
            vec![
                ("prop", "categories".to_string()),
                ("clshow", "!hidden".to_string()),
                ("cllimit", "max".to_string()),
            ],
            |cont| cont.clcontinue.clone().map(|value| ("clcontinue", value)),
            |page| {
                categories.extend(
                    page.categories
                        .into_iter()
                        .map(|item| strip_namespace_prefix(&item.title)),
                );
            },
        )?;
        Ok(categories)
    }

    fn get_page_templates(&mut self, title: &str) -> Result<Vec<String>> {
        let mut templates = Vec::new();
        self.query_page_prop(
            title,
            vec![
                ("prop", "templates".to_string()),
                ("tlnamespace", NS_TEMPLATE.to_string()),
                ("tllimit", "max".to_string()),
            ],
            |cont| cont.tlcontinue.clone().map(|value| ("tlcontinue", value)),
            |page| {
                templates.extend(
                    page.templates
                        .into_iter()
                        .map(|item| strip_namespace_prefix(&item.title)),
                );
            },
        )?;
        Ok(templates)
    }

    fn get_wikibase_items(&mut self, titles: &[String]) -> Result<BTreeMap<String, String>> {
        let mut items = BTreeMap::new();
        for batch in titles.chunks(TITLE_BATCH) {
            let response = self.get(&[
                ("action", "query".to_string()),
                ("prop", "pageprops".to_string()),
                ("ppprop", "wikibase_item".to_string()),
                ("titles", batch.join("|")),
            ])?;
            let parsed: QueryResponse = serde_json::from_value(response)
                .context("failed to decode pageprops API response")?;

            let requested: BTreeMap<String, String> = parsed
                .query
                .normalized
                .into_iter()
                .map(|entry| (entry.to, entry.from))
                .collect();
            for page in parsed.query.pages {
                let Some(item) = page.pageprops.and_then(|props| props.wikibase_item) else {
                    continue;
                };
                let title = requested.get(&page.title).cloned().unwrap_or(page.title);
                items.insert(title, item);
            }
        }
        Ok(items)
    }

    fn get_sitelinks(&mut self, ids: &[String], site: &str) -> Result<BTreeMap<String, String>> {
        let mut links = BTreeMap::new();
        for batch in ids.chunks(TITLE_BATCH) {
            let response = self.get(&[
                ("action", "wbgetentities".to_string()),
                ("ids", batch.join("|")),
                ("props", "sitelinks".to_string()),
                ("sitefilter", site.to_string()),
            ])?;
            let parsed: EntitiesResponse = serde_json::from_value(response)
                .context("failed to decode wbgetentities API response")?;
            for (id, entity) in parsed.entities {
                if let Some(link) = entity.sitelinks.get(site) {
                    links.insert(id, link.title.clone());
                }
            }
        }
        Ok(links)
    }

    fn search(&mut self, query: &str, namespace: i32, limit: usize) -> Result<Vec<SearchHit>> {
        let params = vec![
            ("action", "query".to_string()),
            ("list", "search".to_string()),
            ("srsearch", query.to_string()),
            ("srnamespace", namespace.to_string()),
            ("srlimit", limit.clamp(1, 500).to_string()),
        ];

        let response = self.get(&params)?;
        let parsed: QueryResponse =
            serde_json::from_value(response).context("failed to decode search API response")?;

        Ok(parsed
            .query
            .search
            .into_iter()
            .map(|item| SearchHit {
                title: item.title,
                namespace: item.ns,
                page_id: item.pageid,
            })
            .collect())
    }

    fn request_count(&self) -> usize {
        self.request_count
    }
}

impl WikiWriteApi for MediaWikiClient {
    fn login(&mut self, username: &str, password: &str) -> Result<()> {
        let token_response = self.get(&[
            ("action", "query".to_string()),
            ("meta", "tokens".to_string()),
            ("type", "login".to_string()),
        ])?;
        let token_payload: TokenQueryResponse = serde_json::from_value(token_response)
            .context("failed to decode login token response")?;
        let login_token = token_payload
            .query
            .tokens
            .as_ref()
            .and_then(|tokens| tokens.logintoken.as_ref())
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("failed to get MediaWiki login token"))?;

        let login_response = self.post(&[
            ("action", "login".to_string()),
            ("lgname", username.to_string()),
            ("lgpassword", password.to_string()),
            ("lgtoken", login_token),
        ])?;
        let login_payload: LoginResponse =
            serde_json::from_value(login_response).context("failed to decode login response")?;
        match login_payload.login.result.as_deref() {
            Some("Success") => {
                self.csrf_token = None;
                self.logged_in = true;
                tracing::info!(user = username, api = %self.config.api_url, "logged in");
                Ok(())
            }
            other => Err(AuthError::new(
                login_payload
                    .login
                    .reason
                    .or_else(|| other.map(ToString::to_string))
                    .unwrap_or_else(|| "unknown error".to_string()),
            )
            .into()),
        }
    }

    fn edit_page(
        &mut self,
        title: &str,
        content: &str,
        summary: &str,
        minor: bool,
    ) -> Result<EditResult> {
        let token = self.ensure_csrf_token()?;
        let params = edit_params(title, content, summary, minor, self.logged_in, token);
        let response = self.post(&params)?;
        let edit_payload: EditResponse =
            serde_json::from_value(response).context("failed to decode edit response")?;
        let edit = edit_payload
            .edit
            .ok_or_else(|| anyhow::anyhow!("missing edit payload in API response"))?;
        if edit.result.as_deref() != Some("Success") {
            bail!(
                "MediaWiki edit failed for {}: {}",
                title,
                edit.result.unwrap_or_else(|| "unknown".to_string())
            );
        }

        Ok(EditResult {
            title: title.to_string(),
            new_revision_id: edit.newrevid,
            no_change: edit.nochange.unwrap_or(false),
        })
    }
}

/// `Category:`-prefixed title for API queries; any local prefix is replaced.
pub fn api_category_title(category: &str) -> String {
    let trimmed = category.trim();
    let bare = match trimmed.split_once(':') {
        Some((prefix, rest))
            if ["category", "kategori"].contains(&prefix.trim().to_lowercase().as_str()) =>
        {
            rest.trim()
        }
        _ => trimmed,
    };
    format!("Category:{bare}")
}

fn strip_namespace_prefix(title: &str) -> String {
    title
        .split_once(':')
        .map(|(_, rest)| rest)
        .unwrap_or(title)
        .to_string()
}

fn request_pairs(params: &[(&str, String)]) -> Vec<(String, String)> {
    let mut pairs = Vec::with_capacity(params.len() + 2);
    pairs.push(("format".to_string(), "json".to_string()));
    pairs.push(("formatversion".to_string(), "2".to_string()));
    for (key, value) in params {
        pairs.push(((*key).to_string(), value.clone()));
    }
    pairs
}

/// Form fields of an edit. `text` is always sent, even when empty; the
/// `minor` and `assert` flags only when set.
fn edit_params(
    title: &str,
    content: &str,
    summary: &str,
    minor: bool,
    assert_user: bool,
    token: String,
) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("action", "edit".to_string()),
        ("title", title.to_string()),
        ("text", content.to_string()),
        ("summary", summary.to_string()),
        ("bot", "1".to_string()),
    ];
    if minor {
        params.push(("minor", "1".to_string()));
    }
    if assert_user {
        params.push(("assert", "user".to_string()));
    }
    params.push(("token", token));
    params
}

/// Turns an `error` object in an API payload into an error. Session and
/// permission codes become [`AuthError`].
fn check_api_error(payload: &Value) -> Result<()> {
    let Some(error) = payload.get("error") else {
        return Ok(());
    };
    let code = error
        .get("code")
        .and_then(Value::as_str)
        .unwrap_or("unknown_error");
    let info = error
        .get("info")
        .and_then(Value::as_str)
        .unwrap_or("unknown info");
    if is_auth_error_code(code) {
        return Err(AuthError::new(format!("[{code}] {info}")).into());
    }
    bail!("MediaWiki API error [{code}]: {info}")
}

fn env_number<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}

fn is_retryable_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::REQUEST_TIMEOUT
            | StatusCode::TOO_MANY_REQUESTS
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    )
}

fn is_retryable_error(error: &reqwest::Error) -> bool {
    error.is_timeout() || error.is_connect() || error.is_request()
}

#[derive(Debug, Deserialize, Default)]
struct QueryResponse {
    #[serde(default)]
    query: QueryPayload,
    #[serde(default, rename = "continue")]
    continuation: Option<ContinuationPayload>,
}

#[derive(Debug, Deserialize, Default)]
struct QueryPayload {
    #[serde(default)]
    categorymembers: Vec<MemberQueryItem>,
    #[serde(default)]
    pages: Vec<PageQueryItem>,
    #[serde(default)]
    search: Vec<SearchQueryItem>,
    #[serde(default)]
    normalized: Vec<NormalizedTitle>,
}

#[derive(Debug, Deserialize, Default)]
struct ContinuationPayload {
    cmcontinue: Option<String>,
    clcontinue: Option<String>,
    tlcontinue: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MemberQueryItem {
    pageid: i64,
    ns: i32,
    title: String,
}

#[derive(Debug, Deserialize)]
struct PageQueryItem {
    pageid: Option<i64>,
    #[serde(default)]
    ns: i32,
    title: String,
    missing: Option<bool>,
    #[serde(default)]
    revisions: Vec<RevisionQueryItem>,
    #[serde(default)]
    categories: Vec<LinkedTitle>,
    #[serde(default)]
    templates: Vec<LinkedTitle>,
    pageprops: Option<PagePropsPayload>,
}

#[derive(Debug, Deserialize)]
struct RevisionQueryItem {
    revid: i64,
    timestamp: String,
    slots: Option<RevisionSlotContainer>,
}

#[derive(Debug, Deserialize)]
struct RevisionSlotContainer {
    main: Option<RevisionMainSlot>,
}

#[derive(Debug, Deserialize)]
struct RevisionMainSlot {
    content: String,
}

#[derive(Debug, Deserialize)]
struct LinkedTitle {
    title: String,
}

#[derive(Debug, Deserialize)]
struct PagePropsPayload {
    wikibase_item: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NormalizedTitle {
    from: String,
    to: String,
}

#[derive(Debug, Deserialize)]
struct SearchQueryItem {
    title: String,
    ns: i32,
    pageid: i64,
}

#[derive(Debug, Deserialize, Default)]
struct EntitiesResponse {
    #[serde(default)]
    entities: BTreeMap<String, EntityPayload>,
}

#[derive(Debug, Deserialize, Default)]
struct EntityPayload {
    #[serde(default)]
    sitelinks: BTreeMap<String, SitelinkPayload>,
}

#[derive(Debug, Deserialize)]
struct SitelinkPayload {
    title: String,
}

#[derive(Debug, Deserialize, Default)]
struct TokenQueryResponse {
    #[serde(default)]
    query: TokenQueryPayload,
}

#[derive(Debug, Deserialize, Default)]
struct TokenQueryPayload {
    tokens: Option<TokenPayload>,
}

#[derive(Debug, Deserialize, Default)]
struct TokenPayload {
    logintoken: Option<String>,
    csrftoken: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct LoginResponse {
    #[serde(default)]
    login: LoginPayload,
}

#[derive(Debug, Deserialize, Default)]
struct LoginPayload {
    result: Option<String>,
    reason: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct EditResponse {
    edit: Option<EditPayload>,
}

#[derive(Debug, Deserialize, Default)]
struct EditPayload {
    result: Option<String>,
    newrevid: Option<i64>,
    nochange: Option<bool>,
}
