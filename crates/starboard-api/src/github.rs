// GitHub REST client for the starred-repositories listing
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::link_header::{parse_link_header, LinkHeaderError, PageLinks};

const GITHUB_API_BASE: &str = "https://api.github.com";
const API_VERSION: &str = "2022-11-28";

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("per_page must be between 1 and 100, got {0}")]
    InvalidPageSize(u32),

    #[error("username must be a non-empty string")]
    EmptyUsername,

    #[error("user not found: {0}")]
    UserNotFound(String),

    #[error("rate limit exceeded (HTTP {status})")]
    RateLimited { status: u16 },

    #[error("GitHub API returned HTTP {status} for page {page}")]
    Status { page: u32, status: u16 },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("failed to parse Link header: {0}")]
    LinkHeader(#[from] LinkHeaderError),

    #[error("fetch of page {page} failed: {source}")]
    Page {
        page: u32,
        #[source]
        source: Box<FetchError>,
    },

    #[error("{} page fetches failed: [{}]", .0.len(), describe_pages(.0))]
    Aggregate(Vec<FetchError>),
}

fn describe_pages(failures: &[FetchError]) -> String {
    failures
        .iter()
        .map(|error| error.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl FetchError {
    /// Whether this failure is eligible for the graceful-degradation gate.
    ///
    /// Transport and API failures after some pages already succeeded may be
    /// tolerated; validation failures never are.
    pub fn is_degradable(&self) -> bool {
        match self {
            FetchError::InvalidPageSize(_)
            | FetchError::EmptyUsername
            | FetchError::LinkHeader(_) => false,
            FetchError::UserNotFound(_)
            | FetchError::RateLimited { .. }
            | FetchError::Status { .. }
            | FetchError::Network(_) => true,
            FetchError::Page { source, .. } => source.is_degradable(),
            FetchError::Aggregate(failures) => failures.iter().all(FetchError::is_degradable),
        }
    }
}

pub type Result<T> = std::result::Result<T, FetchError>;

/// One page of a starred-repositories listing, exactly as fetched.
#[derive(Debug, Clone)]
pub struct StarredPage {
    pub page: u32,
    pub repos: Vec<GitHubRepo>,
    pub links: PageLinks,
}

/// Anything that can serve pages of a user's starred repositories.
///
/// The seam exists so the paginated fetcher can be exercised against scripted
/// sources with controlled delays and failures.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StarredPageSource: Send + Sync {
    async fn starred_page(&self, username: &str, per_page: u32, page: u32)
        -> Result<StarredPage>;
}

pub struct GitHubClient {
    client: reqwest::Client,
    token: Option<String>,
    base_url: String,
}

impl GitHubClient {
    pub fn new(token: Option<String>) -> Self {
        Self::with_base_url(token, GITHUB_API_BASE.to_string())
    }

    /// For GitHub Enterprise or testing with a local mock server.
    pub fn with_base_url(token: Option<String>, base_url: String) -> Self {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static("starboard/0.1.0"),
        );
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            reqwest::header::HeaderValue::from_static(API_VERSION),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            token,
            base_url,
        }
    }
}

#[async_trait]
impl StarredPageSource for GitHubClient {
    async fn starred_page(
        &self,
        username: &str,
        per_page: u32,
        page: u32,
    ) -> Result<StarredPage> {
        let url = format!("{}/users/{}/starred", self.base_url, username);

        let mut request = self.client.get(&url).query(&[
            ("per_page", per_page.to_string()),
            ("page", page.to_string()),
            // Newest updated go first.
            ("sort", "updated".to_string()),
            ("direction", "desc".to_string()),
        ]);

        if let Some(ref token) = self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::UserNotFound(username.to_string()));
        }

        if status == reqwest::StatusCode::FORBIDDEN
            || status == reqwest::StatusCode::TOO_MANY_REQUESTS
        {
            return Err(FetchError::RateLimited {
                status: status.as_u16(),
            });
        }

        if !status.is_success() {
            return Err(FetchError::Status {
                page,
                status: status.as_u16(),
            });
        }

        let links = parse_link_header(
            response
                .headers()
                .get(reqwest::header::LINK)
                .and_then(|value| value.to_str().ok()),
        )?;

        // Any field-shape mismatch in the body fails this page's fetch here,
        // rather than being silently dropped.
        let entries: Vec<StarredEntry> = response.json().await?;

        debug!(page, repos = entries.len(), "fetched starred page");

        Ok(StarredPage {
            page,
            repos: entries.into_iter().map(StarredEntry::into_repo).collect(),
            links,
        })
    }
}

/// Raw repository record, mirroring the GitHub API fields we consume.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GitHubRepo {
    pub name: String,
    pub owner: GitHubOwner,
    pub stargazers_count: u32,
    pub forks_count: u32,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub is_template: bool,
    pub pushed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GitHubOwner {
    pub login: String,
}

/// With `Accept: application/vnd.github.star+json` the API wraps each repo in
/// a `{ starred_at, repo }` envelope; with the plain media type it returns the
/// repo object itself. Accept both.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StarredEntry {
    Wrapped { repo: GitHubRepo },
    Plain(GitHubRepo),
}

impl StarredEntry {
    fn into_repo(self) -> GitHubRepo {
        match self {
            StarredEntry::Wrapped { repo } => repo,
            StarredEntry::Plain(repo) => repo,
        }
    }
}
