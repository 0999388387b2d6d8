use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;

pub const MATCH_LABEL: &str = "**You have a match**";

/// Longest markers first so "Image URL:" is not read as "URL:". The word
/// boundary keeps "Hurl:" or "Curl:" from counting as a marker.
static URL_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(url for more information|more information|image url|url)\s*:\s*")
        .expect("marker pattern is valid")
});

const IMAGE_EXTENSIONS: &[&str] = &[".png", ".jpg", ".jpeg", ".gif", ".webp"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkKind {
    Page,
    Image,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub url: String,
    pub kind: LinkKind,
}

/// One non-empty line of a model answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchLine {
    pub text: String,
    pub link: Option<Link>,
}

impl fmt::Display for MatchLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", MATCH_LABEL, self.text)
    }
}

/// Split an answer into match lines, dropping blank ones.
pub fn match_lines(response: &str) -> Vec<MatchLine> {
    response
        .split('\n')
        .filter(|line| !line.is_empty())
        .map(|line| MatchLine {
            text: line.to_string(),
            link: extract_link(line),
        })
        .collect()
}

/// Find a URL introduced by a recognised marker such as
/// `URL for more information:`.
///
/// Text after a marker only counts when it looks like a web address, so
/// "More information: Not available" yields no link.
pub fn extract_link(line: &str) -> Option<Link> {
    URL_MARKER.captures_iter(line).find_map(|marker| {
        let whole = marker.get(0)?;
        let url = line[whole.end()..]
            .trim()
            .trim_end_matches(['*', '_', ')', ']', '.', ','])
            .trim_start_matches(['(', '[', '<'])
            .trim_end_matches('>');
        if !looks_like_url(url) {
            return None;
        }

        let named_image = marker
            .get(1)
            .is_some_and(|m| m.as_str().eq_ignore_ascii_case("image url"));
        let lower = url.to_ascii_lowercase();
        let kind = if named_image || IMAGE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
            LinkKind::Image
        } else {
            LinkKind::Page
        };

        Some(Link {
            url: url.to_string(),
            kind,
        })
    })
}

fn looks_like_url(text: &str) -> bool {
    let lower = text.to_ascii_lowercase();
    ["http://", "https://", "www."]
        .iter()
        .any(|scheme| lower.len() > scheme.len() && lower.starts_with(scheme))
}
