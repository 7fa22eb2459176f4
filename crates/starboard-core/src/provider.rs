// Bridges the raw paginated fetcher to the domain model.
use std::sync::Arc;

use futures::stream::{Stream, StreamExt};

use starboard_api::{starred_repos_of_user, FetchError, StarredPageSource};

use crate::models::Repository;

/// Stream the repositories `username` both owns and has starred, normalized
/// into the domain model.
///
/// Fetching every starred repo and filtering by owner costs one paginated
/// listing; asking the API per-repo whether the owner starred it would cost
/// a request per repository. The listing wins by a wide margin for any
/// account with more repos than starred pages.
///
/// Fetch errors pass through unfiltered; delivery order across pages is
/// completion order, as documented on [`starred_repos_of_user`].
pub fn self_starred_repos_of_user<S>(
    source: Arc<S>,
    username: &str,
    per_page: u32,
) -> Result<impl Stream<Item = Result<Repository, FetchError>>, FetchError>
where
    S: StarredPageSource + 'static,
{
    let owner = username.to_string();
    let inner = starred_repos_of_user(source, username, per_page)?;

    Ok(inner.filter_map(move |item| {
        let mapped = match item {
            Ok(raw) if raw.owner.login == owner => Some(Ok(Repository::from(raw))),
            Ok(_) => None,
            Err(error) => Some(Err(error)),
        };
        futures::future::ready(mapped)
    }))
}
