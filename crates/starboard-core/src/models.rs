use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use starboard_api::GitHubRepo;

/// Repository model - the star of the show. Identity is `(owner, name)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Repository {
    pub name: String,
    pub owner: String,
    pub stars: u32,
    pub forks: u32,
    pub is_archived: bool,
    pub is_template: bool,
    pub pushed_at: Option<DateTime<Utc>>,
}

impl Repository {
    /// `owner/name`, the form GitHub uses everywhere.
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    pub fn url(&self) -> String {
        format!("https://github.com/{}/{}", self.owner, self.name)
    }
}

/// Convert a raw GitHub API record into our normalized model.
impl From<GitHubRepo> for Repository {
    fn from(raw: GitHubRepo) -> Self {
        Self {
            name: raw.name,
            owner: raw.owner.login,
            stars: raw.stargazers_count,
            forks: raw.forks_count,
            is_archived: raw.archived,
            is_template: raw.is_template,
            pushed_at: raw.pushed_at,
        }
    }
}
