// JSON snapshot of the fetched repositories.
//
// Written after every successful fetch so CI can publish it as an artifact,
// and read back when running against the mock API instead of GitHub.
use std::path::Path;

use tracing::{info, warn};

use crate::models::Repository;
use crate::Result;

pub fn write_snapshot(path: &Path, repos: &[Repository]) -> Result<()> {
    let json = serde_json::to_string_pretty(repos)?;
    std::fs::write(path, json)?;
    info!("wrote snapshot of {} repos to {}", repos.len(), path.display());
    Ok(())
}

pub fn read_snapshot(path: &Path) -> Result<Vec<Repository>> {
    let contents = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

/// Repos for an offline run: the snapshot if one exists, otherwise a couple
/// of hardcoded stand-ins so the pipeline still has something to render.
pub fn mock_repos(path: &Path, owner: &str) -> Vec<Repository> {
    match read_snapshot(path) {
        Ok(repos) => repos,
        Err(error) => {
            warn!(
                "no usable snapshot at {} ({error}), falling back to built-in mock repos",
                path.display()
            );
            ["mock-repo-one", "mock-repo-two"]
                .into_iter()
                .map(|name| Repository {
                    name: name.to_string(),
                    owner: owner.to_string(),
                    stars: 0,
                    forks: 0,
                    is_archived: false,
                    is_template: false,
                    pushed_at: Some(chrono::Utc::now()),
                })
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn sample() -> Vec<Repository> {
        vec![Repository {
            name: "puzzle".into(),
            owner: "octocat".into(),
            stars: 12,
            forks: 3,
            is_archived: false,
            is_template: true,
            pushed_at: Utc.with_ymd_and_hms(2024, 2, 2, 12, 0, 0).single(),
        }]
    }

    #[test]
    fn snapshot_survives_a_write_read_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");

        write_snapshot(&path, &sample()).unwrap();
        let restored = read_snapshot(&path).unwrap();

        assert_eq!(restored, sample());
    }

    #[test]
    fn mock_repos_prefers_the_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");
        write_snapshot(&path, &sample()).unwrap();

        let repos = mock_repos(&path, "whoever");
        assert_eq!(repos, sample());
    }

    #[test]
    fn mock_repos_falls_back_when_the_snapshot_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nowhere.json");

        let repos = mock_repos(&path, "octocat");
        assert_eq!(repos.len(), 2);
        assert!(repos.iter().all(|r| r.owner == "octocat"));
    }
}
