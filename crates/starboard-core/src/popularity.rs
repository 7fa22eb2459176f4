// Display ordering for the pin table.
//
// Hand-tuned, not scientific: showcase-worthy repos (effect-related work,
// templates, boilerplates) float to the top, archived and throwaway repos
// sink, and the rest are ranked by a publicity class derived from stars and
// forks, then by push recency.
use std::cmp::Reverse;

use crate::models::Repository;

/// Sort repositories in the order their pins should appear. Stable, so repos
/// tied on every factor keep their arrival order.
pub fn sort_by_probable_popularity(repos: &mut [Repository]) {
    let min_stars = repos.iter().map(|r| r.stars).min().unwrap_or(0);
    let max_stars = repos.iter().map(|r| r.stars).max().unwrap_or(0);
    let min_forks = repos.iter().map(|r| r.forks).min().unwrap_or(0);
    let max_forks = repos.iter().map(|r| r.forks).max().unwrap_or(0);

    let publicity_class = |repo: &Repository| -> u32 {
        let stars_factor = normalized(repo.stars, min_stars, max_stars);
        // Fork counts are tiny compared to stars, so a single fork would
        // otherwise swing the class too hard.
        let forks_factor = normalized(repo.forks, min_forks, max_forks) * 0.25;
        // 0 .. 1.25 split into quarter-wide classes; zero gets its own class
        // at the bottom.
        ((stars_factor + forks_factor) / 0.25).ceil() as u32
    };

    repos.sort_by_key(|repo| {
        (
            Reverse(repo.name.contains("effect")),
            Reverse(repo.is_template),
            Reverse(repo.name.contains("boiler")),
            repo.is_archived,
            repo.name.contains("hackathon"),
            repo.name.contains("experiment"),
            Reverse(publicity_class(repo)),
            // Never-pushed repos go to the very bottom.
            Reverse(repo.pushed_at.map(|t| t.timestamp()).unwrap_or(i64::MIN)),
        )
    });
}

fn normalized(value: u32, min: u32, max: u32) -> f64 {
    if max == min {
        0.0
    } else {
        f64::from(value - min) / f64::from(max - min)
    }
}
