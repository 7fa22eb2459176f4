// Racing multiplexer - wait-any over a batch of independent operations
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::future::{BoxFuture, FutureExt};
use futures::stream::{FuturesUnordered, Stream, StreamExt};
use thiserror::Error;

/// A settled operation, tagged with the index it was submitted under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RaceOutcome<T> {
    pub index: usize,
    pub value: T,
}

/// Failure of a race, keyed by the submission index of the losing operation.
#[derive(Error, Debug)]
pub enum RaceError<E>
where
    E: std::error::Error + 'static,
{
    #[error("racing operation {index} failed: {source}")]
    Operation {
        index: usize,
        #[source]
        source: E,
    },

    #[error("{} racing operations failed: {}", .0.len(), describe_failures(.0))]
    Aggregate(Vec<(usize, E)>),
}

fn describe_failures<E: std::fmt::Display>(failures: &[(usize, E)]) -> String {
    failures
        .iter()
        .map(|(index, error)| format!("[{index}] {error}"))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Race a batch of operations, yielding each outcome as soon as it settles.
///
/// Consumption order is completion order, not submission order. With
/// `fail_late = false` the stream ends at the first failure and the rest of
/// the batch is abandoned. With `fail_late = true` every operation is drained
/// first; a single recorded failure is re-raised as [`RaceError::Operation`],
/// several as [`RaceError::Aggregate`].
///
/// An empty batch produces an empty stream; callers are expected not to
/// submit one.
pub fn race<T, E, F>(operations: Vec<F>, fail_late: bool) -> Race<T, E>
where
    F: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: std::error::Error + Send + 'static,
{
    let pending = operations
        .into_iter()
        .enumerate()
        .map(|(index, operation)| async move { (index, operation.await) }.boxed())
        .collect::<FuturesUnordered<_>>();

    Race {
        pending,
        fail_late,
        failures: Vec::new(),
        finished: false,
    }
}

/// Stream over the outcomes of [`race`]. Finite and non-restartable: each
/// outcome is observable exactly once.
pub struct Race<T, E> {
    // Index-keyed pending set; entries leave exactly once, on settle or abort.
    pending: FuturesUnordered<BoxFuture<'static, (usize, Result<T, E>)>>,
    fail_late: bool,
    failures: Vec<(usize, E)>,
    finished: bool,
}

impl<T, E> Stream for Race<T, E>
where
    E: std::error::Error + Unpin + 'static,
{
    type Item = Result<RaceOutcome<T>, RaceError<E>>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        if this.finished {
            return Poll::Ready(None);
        }

        loop {
            match this.pending.poll_next_unpin(cx) {
                Poll::Ready(Some((index, Ok(value)))) => {
                    return Poll::Ready(Some(Ok(RaceOutcome { index, value })));
                }
                Poll::Ready(Some((index, Err(source)))) => {
                    if this.fail_late {
                        this.failures.push((index, source));
                        continue;
                    }
                    // Fail-fast: abandon whatever is still in flight.
                    this.finished = true;
                    this.pending = FuturesUnordered::new();
                    return Poll::Ready(Some(Err(RaceError::Operation { index, source })));
                }
                Poll::Ready(None) => {
                    this.finished = true;
                    return Poll::Ready(match this.failures.len() {
                        0 => None,
                        1 => this
                            .failures
                            .pop()
                            .map(|(index, source)| Err(RaceError::Operation { index, source })),
                        _ => Some(Err(RaceError::Aggregate(std::mem::take(
                            &mut this.failures,
                        )))),
                    });
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
