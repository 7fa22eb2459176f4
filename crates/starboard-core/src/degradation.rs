// Graceful-degradation gate for partial fetch results.

/// Decide whether a partial result set is good enough to publish.
///
/// `previous_count` is how many items the currently published document
/// renders; `fetched_count` is how many we managed to fetch before the
/// failure. The floor is `previous_count * fatal_loss_percent / 100`, and
/// acceptance is strictly above it - fetching exactly the floor is a reject.
///
/// Pure accept/reject: the caller decides what acceptance means (publish the
/// partial table, defer the original error until after the write).
pub fn should_accept_partial(
    fetched_count: usize,
    previous_count: usize,
    fatal_loss_percent: u32,
) -> bool {
    let minimum_acceptable = previous_count as f64 * fatal_loss_percent as f64 / 100.0;
    fetched_count as f64 > minimum_acceptable
}
