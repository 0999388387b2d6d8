use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{MatcherError, Result};

pub const MOODS: &[&str] = &[
    "😊 Happy",
    "😢 Sad",
    "😃 Excited",
    "😌 Relaxed",
    "😐 Bored",
    "😟 Anxious",
];

pub const LANGUAGES: &[&str] = &[
    "English", "Spanish", "French", "German", "Chinese", "Japanese", "Korean", "Other",
];

pub const STORY_PREMISES: &[&str] = &[
    "❤️ Love",
    "🏞️ Adventure",
    "🔍 Mystery",
    "😱 Horror",
    "😂 Comedy",
    "🚀 Sci-Fi",
    "🧙‍♂️ Fantasy",
    "🔪 Thriller",
    "🎭 Drama",
    "🔥 Action",
];

pub const BOOK_GENRES: &[&str] = &[
    "Action", "Comedy", "Drama", "Fantasy", "Horror", "Mystery", "Romance", "Sci-Fi", "Thriller",
];

pub const MIN_YEAR: u16 = 1900;
pub const MAX_YEAR: u16 = 2024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AgeGroup {
    Children,
    Teens,
    #[default]
    Adults,
}

impl AgeGroup {
    pub const ALL: [AgeGroup; 3] = [AgeGroup::Children, AgeGroup::Teens, AgeGroup::Adults];

    pub fn label(&self) -> &'static str {
        match self {
            AgeGroup::Children => "Children",
            AgeGroup::Teens => "Teens",
            AgeGroup::Adults => "Adults",
        }
    }
}

/// What kind of work the user is looking for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MediaType {
    #[default]
    Movies,
    Series,
    Books,
}

impl MediaType {
    pub const ALL: [MediaType; 3] = [MediaType::Movies, MediaType::Series, MediaType::Books];

    pub fn label(&self) -> &'static str {
        match self {
            MediaType::Movies => "Movies",
            MediaType::Series => "Series",
            MediaType::Books => "Books",
        }
    }

    /// Movies and series share a form; books have their own vocabulary
    pub fn is_screen(&self) -> bool {
        !matches!(self, MediaType::Books)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LengthBucket {
    #[default]
    Short,
    Long,
}

impl LengthBucket {
    pub const ALL: [LengthBucket; 2] = [LengthBucket::Short, LengthBucket::Long];

    /// The label depends on the medium: minutes for screen, pages for books.
    pub fn label(&self, media: MediaType) -> &'static str {
        match (self, media.is_screen()) {
            (LengthBucket::Short, true) => "🕒 Short (< 90 mins)",
            (LengthBucket::Long, true) => "📚 Long (> 90 mins)",
            (LengthBucket::Short, false) => "🕒 Short (< 300 pages)",
            (LengthBucket::Long, false) => "📚 Long (> 300 pages)",
        }
    }
}

/// Preferred time period of the story
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Era {
    Past,
    #[default]
    Present,
    Future,
}

impl Era {
    pub const ALL: [Era; 3] = [Era::Past, Era::Present, Era::Future];

    pub fn label(&self) -> &'static str {
        match self {
            Era::Past => "Past",
            Era::Present => "Present",
            Era::Future => "Future",
        }
    }
}

/// Inclusive release-year window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    pub start: u16,
    pub end: u16,
}

impl YearRange {
    pub fn new(start: u16, end: u16) -> Result<Self> {
        let range = Self { start, end };
        range.validate()?;
        Ok(range)
    }

    pub fn validate(&self) -> Result<()> {
        if self.start < MIN_YEAR || self.end > MAX_YEAR {
            return Err(MatcherError::InvalidSelection(format!(
                "release years must lie within {}-{}, got {}",
                MIN_YEAR, MAX_YEAR, self
            )));
        }
        if self.start > self.end {
            return Err(MatcherError::InvalidSelection(format!(
                "release year range is inverted: {}",
                self
            )));
        }
        Ok(())
    }
}

impl Default for YearRange {
    fn default() -> Self {
        Self {
            start: 2000,
            end: MAX_YEAR,
        }
    }
}

impl fmt::Display for YearRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Structured search criteria chosen by the user for a single search.
///
/// Missing fields in a JSON body fall back to the form defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSelection {
    pub mood: String,
    pub age_group: AgeGroup,
    pub media: MediaType,
    pub languages: Vec<String>,
    pub country: String,
    pub premises: Vec<String>,
    /// Favourite director (screen) or author (books)
    pub creator: String,
    /// Favourite actor (screen) or character (books)
    pub people: String,
    pub length: LengthBucket,
    pub years: YearRange,
    /// Only rendered for books
    pub genres: Vec<String>,
    pub era: Era,
}

impl Default for FilterSelection {
    fn default() -> Self {
        Self {
            mood: MOODS[0].to_string(),
            age_group: AgeGroup::default(),
            media: MediaType::default(),
            languages: vec!["English".to_string()],
            country: "USA".to_string(),
            premises: vec![STORY_PREMISES[0].to_string(), STORY_PREMISES[1].to_string()],
            creator: String::new(),
            people: String::new(),
            length: LengthBucket::default(),
            years: YearRange::default(),
            genres: Vec::new(),
            era: Era::default(),
        }
    }
}

impl FilterSelection {
    pub fn validate(&self) -> Result<()> {
        validate_mood(&self.mood)?;
        check_single_line("country", &self.country)?;
        check_single_line("favourite creator", &self.creator)?;
        check_single_line("favourite people", &self.people)?;
        self.years.validate()?;
        validate_languages(&self.languages)?;
        check_vocabulary("story premise", &self.premises, STORY_PREMISES)?;
        check_vocabulary("genre", &self.genres, BOOK_GENRES)?;
        Ok(())
    }

    /// The criteria in prompt order, keyed the way the model sees them.
    pub fn criteria(&self) -> Vec<(&'static str, String)> {
        let screen = self.media.is_screen();
        let mut criteria = vec![
            ("user_mood", self.mood.clone()),
            ("age_group", self.age_group.label().to_string()),
        ];
        if screen {
            criteria.push(("search_type", self.media.label().to_string()));
        }
        criteria.extend([
            ("search_language", self.languages.join(", ")),
            ("search_location", self.country.clone()),
            ("story_premise", self.premises.join(", ")),
            (
                if screen { "director_author" } else { "author" },
                self.creator.clone(),
            ),
            ("length_of_story", self.length.label(self.media).to_string()),
            ("release_year", self.years.to_string()),
            (
                if screen {
                    "actors_characters"
                } else {
                    "characters_books"
                },
                self.people.clone(),
            ),
        ]);
        if !screen {
            criteria.push(("favorite_genre", self.genres.join(", ")));
        }
        criteria.push(("time_period", self.era.label().to_string()));
        criteria
    }
}

/// The mood must be one of [`MOODS`].
pub fn validate_mood(mood: &str) -> Result<()> {
    if MOODS.contains(&mood) {
        Ok(())
    } else {
        Err(MatcherError::InvalidSelection(format!("unknown mood: {:?}", mood)))
    }
}

pub fn validate_languages(languages: &[String]) -> Result<()> {
    check_vocabulary("language", languages, LANGUAGES)
}

/// Every criterion renders as one `key: value` line of the prompt.
fn check_single_line(kind: &str, value: &str) -> Result<()> {
    if value.contains(['\n', '\r']) {
        return Err(MatcherError::InvalidSelection(format!(
            "{} must fit on one line",
            kind
        )));
    }
    Ok(())
}

fn check_vocabulary(kind: &str, values: &[String], allowed: &[&str]) -> Result<()> {
    match values.iter().find(|v| !allowed.contains(&v.as_str())) {
        Some(unknown) => Err(MatcherError::InvalidSelection(format!(
            "unknown {}: {:?}",
            kind, unknown
        ))),
        None => Ok(()),
    }
}
