// Paginated starred-repositories fetcher.
//
// Page 1 is fetched sequentially to learn the page count from the Link
// header; the remaining pages are raced in fail-late mode and their items
// republished in completion order. Within a page the API's ordering is
// preserved; across pages the ordering is whatever the network decided.
use std::sync::Arc;

use futures::stream::{Stream, StreamExt};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::github::{FetchError, GitHubRepo, Result, StarredPageSource};
use crate::race::{race, RaceError, RaceOutcome};

/// Self-imposed ceiling on requests per fetch run, guarding against
/// pathological pagination metadata (a cycle, or a missing termination
/// signal). Hitting it ends the fetch early instead of looping forever.
pub const MAX_REQUESTS_PER_RUN: u32 = 50;

const CHANNEL_CAPACITY: usize = 64;

/// Fetch every starred repository of `username`, `per_page` items per
/// request, as a lazy stream.
///
/// Validation happens before any request is sent. A page-fetch failure ends
/// the stream with that error as its final item; everything fetched before
/// the failure has already been delivered. Dropping the stream stops the
/// producer at its next send.
pub fn starred_repos_of_user<S>(
    source: Arc<S>,
    username: &str,
    per_page: u32,
) -> Result<impl Stream<Item = Result<GitHubRepo>>>
where
    S: StarredPageSource + 'static,
{
    if per_page == 0 || per_page > 100 {
        return Err(FetchError::InvalidPageSize(per_page));
    }

    if username.is_empty() {
        return Err(FetchError::EmptyUsername);
    }

    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
    tokio::spawn(run_fetch(source, username.to_string(), per_page, tx));

    Ok(futures::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|item| (item, rx))
    }))
}

async fn run_fetch<S>(
    source: Arc<S>,
    username: String,
    per_page: u32,
    tx: mpsc::Sender<Result<GitHubRepo>>,
) where
    S: StarredPageSource + 'static,
{
    info!("started fetching pages of {username}'s starred repos");

    let first = match source.starred_page(&username, per_page, 1).await {
        Ok(page) => page,
        Err(error) => {
            let _ = tx.send(Err(error)).await;
            return;
        }
    };

    let links = first.links.clone();

    for repo in first.repos {
        if tx.send(Ok(repo)).await.is_err() {
            return;
        }
    }

    let Some(next) = links.next else {
        info!("{username}'s starred repos fit on a single page");
        return;
    };

    match links.last {
        Some(last) => {
            let last_page = if last.page > MAX_REQUESTS_PER_RUN {
                warn!(
                    last_page = last.page,
                    ceiling = MAX_REQUESTS_PER_RUN,
                    "pagination metadata exceeds the request ceiling, fetch will end early"
                );
                MAX_REQUESTS_PER_RUN
            } else {
                last.page
            };

            info!("racing pages 2..={last_page} of {username}'s starred repos");
            race_remaining_pages(source, username, per_page, last_page, tx).await;
        }
        None => {
            // The API told us there is a next page but not how many there
            // are. Walk the next links one request at a time.
            walk_next_links(source, username, per_page, next.page, tx).await;
        }
    }
}

async fn race_remaining_pages<S>(
    source: Arc<S>,
    username: String,
    per_page: u32,
    last_page: u32,
    tx: mpsc::Sender<Result<GitHubRepo>>,
) where
    S: StarredPageSource + 'static,
{
    let operations: Vec<_> = (2..=last_page)
        .map(|page| {
            let source = Arc::clone(&source);
            let username = username.clone();
            async move {
                source
                    .starred_page(&username, per_page, page)
                    .await
                    .map_err(|error| FetchError::Page {
                        page,
                        source: Box::new(error),
                    })
            }
        })
        .collect();

    if operations.is_empty() {
        return;
    }

    let mut outcomes = race(operations, true);

    while let Some(outcome) = outcomes.next().await {
        match outcome {
            Ok(RaceOutcome { value: page, .. }) => {
                for repo in page.repos {
                    if tx.send(Ok(repo)).await.is_err() {
                        return;
                    }
                }
            }
            Err(race_error) => {
                let _ = tx.send(Err(flatten_race_error(race_error))).await;
                return;
            }
        }
    }
}

async fn walk_next_links<S>(
    source: Arc<S>,
    username: String,
    per_page: u32,
    mut next_page: u32,
    tx: mpsc::Sender<Result<GitHubRepo>>,
) where
    S: StarredPageSource + 'static,
{
    let mut sent_requests = 1u32; // page 1 is already behind us

    loop {
        if sent_requests >= MAX_REQUESTS_PER_RUN {
            warn!(
                ceiling = MAX_REQUESTS_PER_RUN,
                "request ceiling reached while following next links, ending fetch early"
            );
            return;
        }
        sent_requests += 1;

        let page = match source.starred_page(&username, per_page, next_page).await {
            Ok(page) => page,
            Err(error) => {
                let _ = tx
                    .send(Err(FetchError::Page {
                        page: next_page,
                        source: Box::new(error),
                    }))
                    .await;
                return;
            }
        };

        for repo in page.repos {
            if tx.send(Ok(repo)).await.is_err() {
                return;
            }
        }

        match page.links.next {
            Some(next) => next_page = next.page,
            None => return,
        }
    }
}

fn flatten_race_error(error: RaceError<FetchError>) -> FetchError {
    match error {
        RaceError::Operation { source, .. } => source,
        RaceError::Aggregate(failures) => {
            FetchError::Aggregate(failures.into_iter().map(|(_, error)| error).collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::{GitHubOwner, MockStarredPageSource, StarredPage};
    use crate::link_header::{PageLink, PageLinks};
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;
    use tokio::time::sleep;

    fn repo(owner: &str, name: &str) -> GitHubRepo {
        GitHubRepo {
            name: name.to_string(),
            owner: GitHubOwner {
                login: owner.to_string(),
            },
            stargazers_count: 0,
            forks_count: 0,
            archived: false,
            is_template: false,
            pushed_at: None,
        }
    }

    fn page_link(page: u32) -> PageLink {
        PageLink {
            url: format!("https://api.github.com/users/u/starred?page={page}"),
            page,
            per_page: Some(100),
        }
    }

    /// Serves one page per entry of `counts` (items on that page), with a
    /// configurable delay per page so completion order can be controlled.
    struct ScriptedSource {
        counts: Vec<u32>,
        delays_ms: Vec<u64>,
        failing_pages: Vec<u32>,
        requests: AtomicU32,
    }

    impl ScriptedSource {
        fn new(counts: Vec<u32>, delays_ms: Vec<u64>) -> Self {
            Self {
                counts,
                delays_ms,
                failing_pages: Vec::new(),
                requests: AtomicU32::new(0),
            }
        }

        fn failing_on(mut self, pages: Vec<u32>) -> Self {
            self.failing_pages = pages;
            self
        }
    }

    #[async_trait::async_trait]
    impl StarredPageSource for ScriptedSource {
        async fn starred_page(
            &self,
            _username: &str,
            _per_page: u32,
            page: u32,
        ) -> Result<StarredPage> {
            self.requests.fetch_add(1, Ordering::SeqCst);

            if let Some(delay) = self.delays_ms.get(page as usize - 1) {
                sleep(Duration::from_millis(*delay)).await;
            }

            if self.failing_pages.contains(&page) {
                return Err(FetchError::Status { page, status: 502 });
            }

            let total_pages = self.counts.len() as u32;
            let count = self.counts.get(page as usize - 1).copied().unwrap_or(0);
            let repos = (0..count)
                .map(|i| repo("u", &format!("repo-{page}-{i}")))
                .collect();

            let links = PageLinks {
                next: (page < total_pages).then(|| page_link(page + 1)),
                last: Some(page_link(total_pages)),
                ..PageLinks::default()
            };

            Ok(StarredPage { page, repos, links })
        }
    }

    #[tokio::test]
    async fn rejects_out_of_range_page_size_before_any_request() {
        let source = Arc::new(MockStarredPageSource::new());

        for bad in [0u32, 101] {
            match starred_repos_of_user(Arc::clone(&source), "octocat", bad) {
                Err(FetchError::InvalidPageSize(got)) => assert_eq!(got, bad),
                other => panic!("expected InvalidPageSize, got {:?}", other.is_ok()),
            }
        }
    }

    #[tokio::test]
    async fn rejects_empty_username_before_any_request() {
        let source = Arc::new(MockStarredPageSource::new());
        assert!(matches!(
            starred_repos_of_user(source, "", 100),
            Err(FetchError::EmptyUsername)
        ));
    }

    #[tokio::test]
    async fn yields_all_items_across_pages_exactly_once() {
        // 250 repos at 100 per page is 3 pages; the delays make page 3 land
        // before page 2, scrambling cross-page arrival order.
        let source = Arc::new(ScriptedSource::new(vec![100, 100, 50], vec![0, 40, 10]));

        let stream = starred_repos_of_user(Arc::clone(&source), "u", 100).unwrap();
        let items: Vec<_> = stream.collect().await;

        let mut seen = HashSet::new();
        for item in items {
            let repo = item.expect("no page failed");
            assert!(seen.insert(repo.name.clone()), "duplicate {}", repo.name);
        }

        assert_eq!(seen.len(), 250);
        assert_eq!(source.requests.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn within_page_ordering_is_preserved() {
        let source = Arc::new(ScriptedSource::new(vec![5, 5], vec![0, 0]));

        let stream = starred_repos_of_user(source, "u", 5).unwrap();
        let names: Vec<_> = stream
            .map(|item| item.expect("no failures scripted").name)
            .collect()
            .await;

        let page_one: Vec<_> = names.iter().filter(|n| n.starts_with("repo-1-")).collect();
        let expected: Vec<_> = (0..5).map(|i| format!("repo-1-{i}")).collect();
        assert_eq!(page_one, expected.iter().collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn page_failure_surfaces_after_surviving_pages() {
        let source =
            Arc::new(ScriptedSource::new(vec![10, 10, 10], vec![0, 10, 20]).failing_on(vec![2]));

        let stream = starred_repos_of_user(source, "u", 10).unwrap();
        let items: Vec<_> = stream.collect().await;

        let successes = items.iter().filter(|item| item.is_ok()).count();
        assert_eq!(successes, 20, "pages 1 and 3 still delivered");

        match items.last().expect("stream is non-empty") {
            Err(FetchError::Page { page, .. }) => assert_eq!(*page, 2),
            other => panic!("expected trailing page error, got ok={}", other.is_ok()),
        }
    }

    #[tokio::test]
    async fn several_failed_pages_aggregate() {
        let source = Arc::new(
            ScriptedSource::new(vec![10, 10, 10, 10], vec![0, 0, 0, 0]).failing_on(vec![2, 4]),
        );

        let stream = starred_repos_of_user(source, "u", 10).unwrap();
        let items: Vec<_> = stream.collect().await;

        match items.last().expect("stream is non-empty") {
            Err(FetchError::Aggregate(failures)) => assert_eq!(failures.len(), 2),
            other => panic!("expected aggregate error, got ok={}", other.is_ok()),
        }
    }

    #[tokio::test]
    async fn first_page_failure_delivers_nothing_but_the_error() {
        let source = Arc::new(ScriptedSource::new(vec![10, 10, 10], vec![0]).failing_on(vec![1]));

        let stream = starred_repos_of_user(source, "u", 10).unwrap();
        let items: Vec<_> = stream.collect().await;

        assert_eq!(items.len(), 1);
        assert!(matches!(
            items.first(),
            Some(Err(FetchError::Status { page: 1, .. }))
        ));
    }

    /// A source whose pagination metadata never terminates: always a next
    /// link, never a last page.
    struct CyclicSource {
        requests: AtomicU32,
    }

    #[async_trait::async_trait]
    impl StarredPageSource for CyclicSource {
        async fn starred_page(
            &self,
            _username: &str,
            _per_page: u32,
            page: u32,
        ) -> Result<StarredPage> {
            self.requests.fetch_add(1, Ordering::SeqCst);
            Ok(StarredPage {
                page,
                repos: vec![repo("u", &format!("repo-{page}"))],
                links: PageLinks {
                    next: Some(page_link(page + 1)),
                    ..PageLinks::default()
                },
            })
        }
    }

    #[tokio::test]
    async fn request_ceiling_terminates_a_cycle_early() {
        let source = Arc::new(CyclicSource {
            requests: AtomicU32::new(0),
        });

        let stream = starred_repos_of_user(Arc::clone(&source), "u", 100).unwrap();
        let items: Vec<_> = stream.collect().await;

        // Ends cleanly, no trailing error.
        assert!(items.iter().all(|item| item.is_ok()));
        assert_eq!(source.requests.load(Ordering::SeqCst), MAX_REQUESTS_PER_RUN);
    }

    #[tokio::test]
    async fn dropping_the_stream_stops_the_producer() {
        // Page 1 alone overflows the delivery channel, so the producer is
        // still blocked inside page 1 when the consumer walks away - the
        // remaining 39 pages are never requested.
        let source = Arc::new(ScriptedSource::new(vec![200; 40], vec![0; 40]));

        let mut stream = Box::pin(starred_repos_of_user(Arc::clone(&source), "u", 100).unwrap());

        for _ in 0..5 {
            assert!(stream.next().await.is_some());
        }
        drop(stream);

        // Give the producer a moment to notice the closed channel.
        sleep(Duration::from_millis(50)).await;
        assert_eq!(source.requests.load(Ordering::SeqCst), 1);
    }
}
