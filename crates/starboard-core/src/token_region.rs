// Delimiter-bounded region replacement.
//
// The region between the first occurrence of the start token and the first
// occurrence of the end token is the only part of the document we own;
// everything outside, the tokens included, is preserved byte for byte.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegionError {
    #[error("Both markers are missing")]
    BothMarkersMissing,

    #[error("START marker is missing")]
    StartMarkerMissing,

    #[error("END marker is missing")]
    EndMarkerMissing,

    #[error("START marker appeared to be set after END marker. START marker should go first.")]
    MarkersOutOfOrder,
}

/// A start/end token pair bounding the owned region of a document.
#[derive(Debug, Clone, Copy)]
pub struct TokenRegion<'a> {
    start_token: &'a str,
    end_token: &'a str,
}

/// A document split at the region boundaries. Slices borrow the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentParts<'d> {
    pub before_with_start: &'d str,
    pub middle: &'d str,
    pub after_with_end: &'d str,
}

impl<'a> TokenRegion<'a> {
    pub fn new(start_token: &'a str, end_token: &'a str) -> Self {
        Self {
            start_token,
            end_token,
        }
    }

    /// Locate the region. Offsets are computed fresh from the document on
    /// every call; only the first occurrence of each token counts.
    pub fn split<'d>(&self, document: &'d str) -> Result<DocumentParts<'d>, RegionError> {
        let start_at = document.find(self.start_token);
        let end_at = document.find(self.end_token);

        let (start_at, end_at) = match (start_at, end_at) {
            (None, None) => return Err(RegionError::BothMarkersMissing),
            (None, Some(_)) => return Err(RegionError::StartMarkerMissing),
            (Some(_), None) => return Err(RegionError::EndMarkerMissing),
            (Some(start_at), Some(end_at)) => (start_at, end_at),
        };

        let middle_start = start_at + self.start_token.len();

        // The end token must begin after the start token ends; an overlap
        // counts as out of order too.
        if end_at < middle_start {
            return Err(RegionError::MarkersOutOfOrder);
        }

        Ok(DocumentParts {
            before_with_start: &document[..middle_start],
            middle: &document[middle_start..end_at],
            after_with_end: &document[end_at..],
        })
    }

    /// Replace the region's content with `new_middle`, discarding whatever
    /// was there. Idempotent for a fixed `new_middle`.
    pub fn replace(&self, document: &str, new_middle: &str) -> Result<String, RegionError> {
        let parts = self.split(document)?;

        Ok(format!(
            "{}{}{}",
            parts.before_with_start, new_middle, parts.after_with_end
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const START: &str = "<!--S-->";
    const END: &str = "<!--E-->";

    fn region() -> TokenRegion<'static> {
        TokenRegion::new(START, END)
    }

    #[test]
    fn replaces_only_the_region_between_the_markers() {
        let result = region().replace("A<!--S-->old<!--E-->B", "new").unwrap();
        assert_eq!(result, "A<!--S-->new<!--E-->B");
    }

    #[test]
    fn split_exposes_all_three_parts() {
        let parts = region().split("A<!--S-->old<!--E-->B").unwrap();
        assert_eq!(parts.before_with_start, "A<!--S-->");
        assert_eq!(parts.middle, "old");
        assert_eq!(parts.after_with_end, "<!--E-->B");
    }

    #[test]
    fn missing_end_marker_is_reported_as_such() {
        let err = region().replace("A<!--S-->old B", "new").unwrap_err();
        assert_eq!(err, RegionError::EndMarkerMissing);
        assert_eq!(err.to_string(), "END marker is missing");
    }

    #[test]
    fn missing_start_marker_is_reported_as_such() {
        let err = region().replace("A old<!--E-->B", "new").unwrap_err();
        assert_eq!(err, RegionError::StartMarkerMissing);
    }

    #[test]
    fn both_markers_missing_is_its_own_error() {
        let err = region().replace("no markers here", "new").unwrap_err();
        assert_eq!(err, RegionError::BothMarkersMissing);
    }

    #[test]
    fn end_marker_before_start_marker_is_an_ordering_error() {
        let err = region().replace("A<!--E-->old<!--S-->B", "new").unwrap_err();
        assert_eq!(err, RegionError::MarkersOutOfOrder);
    }

    #[test]
    fn only_first_occurrences_are_honored() {
        let doc = "A<!--S-->one<!--E-->B<!--S-->two<!--E-->C";
        let result = region().replace(doc, "new").unwrap();
        assert_eq!(result, "A<!--S-->new<!--E-->B<!--S-->two<!--E-->C");
    }

    #[test]
    fn replacing_twice_with_the_same_content_is_idempotent() {
        let once = region().replace("A<!--S-->old<!--E-->B", "new").unwrap();
        let twice = region().replace(&once, "new").unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn empty_middle_region_is_fine() {
        let result = region().replace("A<!--S--><!--E-->B", "filled").unwrap();
        assert_eq!(result, "A<!--S-->filled<!--E-->B");
    }
}
