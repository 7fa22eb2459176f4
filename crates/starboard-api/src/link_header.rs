// Parsing of the RFC 5988 `Link` response header GitHub uses for pagination.
//
// A header looks like:
//   <https://api.github.com/user/123/starred?page=2&per_page=100>; rel="next",
//   <https://api.github.com/user/123/starred?page=4&per_page=100>; rel="last"
use reqwest::Url;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum LinkHeaderError {
    #[error("Link header segment has no <url> part: {0:?}")]
    MissingUrl(String),

    #[error("Link header segment has no rel parameter: {0:?}")]
    MissingRel(String),

    #[error("Link header URL does not parse: {0:?}")]
    BadUrl(String),

    #[error("Link header URL carries no usable page number: {0:?}")]
    MissingPageNumber(String),
}

/// One pagination relation from the `Link` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLink {
    pub url: String,
    pub page: u32,
    pub per_page: Option<u32>,
}

/// The four relations GitHub emits. Any of them may be absent; the last page
/// of a listing has no `next`, the first page has no `prev`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageLinks {
    pub first: Option<PageLink>,
    pub prev: Option<PageLink>,
    pub next: Option<PageLink>,
    pub last: Option<PageLink>,
}

impl PageLinks {
    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }

    /// Last page number, when the API disclosed it upfront.
    pub fn last_page(&self) -> Option<u32> {
        self.last.as_ref().map(|link| link.page)
    }
}

/// Parse a raw `Link` header. A missing header is not an error - a listing
/// that fits one page simply has no pagination links.
pub fn parse_link_header(raw: Option<&str>) -> Result<PageLinks, LinkHeaderError> {
    let Some(raw) = raw else {
        return Ok(PageLinks::default());
    };

    let mut links = PageLinks::default();

    for segment in raw.split(',') {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }

        let (url_part, params) = segment
            .split_once(';')
            .ok_or_else(|| LinkHeaderError::MissingRel(segment.to_string()))?;

        let url_part = url_part.trim();
        let url = url_part
            .strip_prefix('<')
            .and_then(|u| u.strip_suffix('>'))
            .ok_or_else(|| LinkHeaderError::MissingUrl(segment.to_string()))?;

        let rel = params
            .split(';')
            .filter_map(|param| param.trim().split_once('='))
            .find(|(key, _)| key.trim() == "rel")
            .map(|(_, value)| value.trim().trim_matches('"'))
            .ok_or_else(|| LinkHeaderError::MissingRel(segment.to_string()))?;

        let link = parse_page_link(url)?;

        match rel {
            "first" => links.first = Some(link),
            "prev" => links.prev = Some(link),
            "next" => links.next = Some(link),
            "last" => links.last = Some(link),
            // GitHub only sends the four above; anything else is ignorable.
            _ => {}
        }
    }

    Ok(links)
}

fn parse_page_link(url: &str) -> Result<PageLink, LinkHeaderError> {
    let parsed = Url::parse(url).map_err(|_| LinkHeaderError::BadUrl(url.to_string()))?;

    let mut page = None;
    let mut per_page = None;

    for (key, value) in parsed.query_pairs() {
        match key.as_ref() {
            "page" => page = value.parse::<u32>().ok(),
            "per_page" => per_page = value.parse::<u32>().ok(),
            _ => {}
        }
    }

    let page = page.ok_or_else(|| LinkHeaderError::MissingPageNumber(url.to_string()))?;

    Ok(PageLink {
        url: url.to_string(),
        page,
        per_page,
    })
}
