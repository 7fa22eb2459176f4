// GitHub API plumbing: the client, Link-header pagination, and the racing
// paginated fetcher.
pub mod fetcher;
pub mod github;
pub mod link_header;
pub mod race;

// Re-export common types
pub use fetcher::{starred_repos_of_user, MAX_REQUESTS_PER_RUN};
pub use github::{FetchError, GitHubClient, GitHubOwner, GitHubRepo, StarredPage, StarredPageSource};
pub use link_header::{parse_link_header, LinkHeaderError, PageLink, PageLinks};
pub use race::{race, Race, RaceError, RaceOutcome};
