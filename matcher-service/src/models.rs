use matcher::filters::{BOOK_GENRES, LANGUAGES, MAX_YEAR, MIN_YEAR, MOODS, STORY_PREMISES};
use matcher::{
    AgeGroup, Era, FilterSelection, LengthBucket, Link, MatchLine, MediaType, Notice,
};
use serde::{Deserialize, Serialize};

pub const MEDIA_HEADING: &str = "Your movie/series:";
pub const BOOK_HEADING: &str = "Your book:";
pub const CUSTOM_HEADING: &str = "Your custom search results:";

fn default_mood() -> String {
    MOODS[0].to_string()
}

fn default_languages() -> Vec<String> {
    vec!["English".to_string()]
}

#[derive(Debug, Deserialize)]
pub struct BookSearchRequest {
    #[serde(default = "default_mood")]
    pub mood: String,
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,
    pub preset: usize,
}

#[derive(Debug, Deserialize)]
pub struct PresetQuery {
    pub mood: Option<String>,
    /// Comma separated
    pub languages: Option<String>,
}

impl PresetQuery {
    pub fn mood(&self) -> String {
        self.mood.clone().unwrap_or_else(default_mood)
    }

    pub fn languages(&self) -> Vec<String> {
        match &self.languages {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect(),
            None => default_languages(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CustomSearchRequest {
    #[serde(default)]
    pub prompt: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchStatus {
    Completed,
    Unavailable,
    Skipped,
}

#[derive(Debug, Serialize)]
pub struct MatchView {
    pub text: String,
    pub display: String,
    pub link: Option<Link>,
}

impl From<MatchLine> for MatchView {
    fn from(line: MatchLine) -> Self {
        Self {
            display: line.to_string(),
            text: line.text,
            link: line.link,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub status: SearchStatus,
    pub heading: &'static str,
    pub prompt: Option<String>,
    pub matches: Vec<MatchView>,
    pub notices: Vec<Notice>,
}

impl SearchResponse {
    pub fn skipped(heading: &'static str) -> Self {
        Self {
            status: SearchStatus::Skipped,
            heading,
            prompt: None,
            matches: Vec::new(),
            notices: Vec::new(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LabelledOption {
    pub value: serde_json::Value,
    pub label: &'static str,
}

/// Everything a client needs to draw the search form
#[derive(Debug, Serialize)]
pub struct FilterOptions {
    pub moods: &'static [&'static str],
    pub age_groups: Vec<&'static str>,
    pub media_types: Vec<&'static str>,
    pub languages: &'static [&'static str],
    pub story_premises: &'static [&'static str],
    pub book_genres: &'static [&'static str],
    pub screen_lengths: Vec<LabelledOption>,
    pub book_lengths: Vec<LabelledOption>,
    pub eras: Vec<&'static str>,
    pub min_year: u16,
    pub max_year: u16,
    pub defaults: FilterSelection,
}

impl FilterOptions {
    pub fn new() -> Self {
        let lengths = |media: MediaType| -> Vec<LabelledOption> {
            LengthBucket::ALL
                .iter()
                .map(|bucket| LabelledOption {
                    value: serde_json::to_value(bucket).unwrap_or_default(),
                    label: bucket.label(media),
                })
                .collect()
        };
        Self {
            moods: MOODS,
            age_groups: AgeGroup::ALL.iter().map(AgeGroup::label).collect(),
            media_types: MediaType::ALL.iter().map(MediaType::label).collect(),
            languages: LANGUAGES,
            story_premises: STORY_PREMISES,
            book_genres: BOOK_GENRES,
            screen_lengths: lengths(MediaType::Movies),
            book_lengths: lengths(MediaType::Books),
            eras: Era::ALL.iter().map(Era::label).collect(),
            min_year: MIN_YEAR,
            max_year: MAX_YEAR,
            defaults: FilterSelection::default(),
        }
    }
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self::new()
    }
}
