// Markdown pin rendering, and recovery of pins from a previously published
// table.
//
// A pin is a clickable stats card:
//   [![{name} repo]({stats-image-url})](https://github.com/{owner}/{name})
use regex::Regex;
use url::Url;

use crate::error::Error;
use crate::models::Repository;
use crate::Result;

const STATS_SERVICE_BASE: &str = "https://github-readme-stats.vercel.app/api/pin/";

const PIN_PATTERN: &str = r"\[!\[(?P<name>[^\[\]()]+) repo\]\((?P<image>https://github-readme-stats\.vercel\.app/[^\[\]()]+)\)\]\((?P<url>[^\[\]()]+)\)";

/// Render one repository as a markdown pin.
pub fn render_pin(repo: &Repository, theme: &str) -> String {
    format!(
        "[![{name} repo]({STATS_SERVICE_BASE}?username={owner}&repo={name}&theme={theme})]({repo_url})",
        name = repo.name,
        owner = repo.owner,
        repo_url = repo.url(),
    )
}

/// A pin recovered from markdown text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedPin {
    pub name: String,
    pub owner: String,
    pub image_url: String,
    pub repo_url: String,
}

/// Extract every pin from a previously rendered table.
///
/// Strict: a pin-shaped match whose URLs are inconsistent with each other is
/// an error, not a skip. The count of extracted pins feeds the
/// graceful-degradation gate, so quietly dropping malformed entries would
/// skew the baseline.
pub fn extract_pins(markdown: &str) -> Result<Vec<ExtractedPin>> {
    let pattern = Regex::new(PIN_PATTERN)
        .map_err(|e| Error::Extract(format!("pin pattern failed to compile: {e}")))?;

    let mut pins = Vec::new();

    for captures in pattern.captures_iter(markdown) {
        let name = &captures["name"];
        let image_url = &captures["image"];
        let repo_url = &captures["url"];

        let image = Url::parse(image_url)
            .map_err(|_| Error::Extract(format!("pin image URL does not parse: {image_url}")))?;

        let repo_from_image = query_param(&image, "repo").ok_or_else(|| {
            Error::Extract(format!("pin image URL has no repo query param: {image_url}"))
        })?;
        let owner_from_image = query_param(&image, "username").ok_or_else(|| {
            Error::Extract(format!(
                "pin image URL has no username query param: {image_url}"
            ))
        })?;

        if repo_from_image != name {
            return Err(Error::Extract(format!(
                "repo name in pin image URL ({repo_from_image}) does not match the alt text ({name})"
            )));
        }

        let target = Url::parse(repo_url)
            .map_err(|_| Error::Extract(format!("repo URL does not parse: {repo_url}")))?;

        if target.host_str() != Some("github.com") {
            return Err(Error::Extract(format!(
                "repo URL is not on github.com: {repo_url}"
            )));
        }

        let mut path_segments = target.path().split('/').filter(|s| !s.is_empty());
        let (owner_from_url, name_from_url) = match (path_segments.next(), path_segments.next()) {
            (Some(owner), Some(name)) => (owner, name),
            _ => {
                return Err(Error::Extract(format!(
                    "repo URL is missing owner or name: {repo_url}"
                )))
            }
        };

        if name_from_url != name || owner_from_url != owner_from_image {
            return Err(Error::Extract(format!(
                "repo URL ({repo_url}) disagrees with the pin image URL about the repository"
            )));
        }

        pins.push(ExtractedPin {
            name: name.to_string(),
            owner: owner_from_image,
            image_url: image_url.to_string(),
            repo_url: repo_url.to_string(),
        });
    }

    Ok(pins)
}

fn query_param(url: &Url, key: &str) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}
