use serde::Serialize;

use crate::filters::{AgeGroup, Era, FilterSelection, LengthBucket, MediaType, YearRange};

const CLOSING_INSTRUCTION: &str = "Please include the title in bold, a brief description, and omit the URL for more information for each result.";

impl FilterSelection {
    /// Render the selection as the prompt sent to the model.
    ///
    /// Same selection, same text: nothing here depends on time or randomness.
    pub fn to_prompt(&self) -> String {
        let subject = match self.media {
            MediaType::Books => "book",
            screen => screen.label(),
        };
        render(subject, &self.criteria())
    }
}

fn render(subject: &str, criteria: &[(&'static str, String)]) -> String {
    let mut prompt = format!("Find a {subject} based on the following premise:\n");
    for (key, value) in criteria {
        prompt.push_str(key);
        prompt.push_str(": ");
        prompt.push_str(value);
        prompt.push('\n');
    }
    prompt.push_str(CLOSING_INSTRUCTION);
    prompt.push('\n');
    prompt
}

/// A canned book search the user can pick instead of filling the form
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookPreset {
    pub id: usize,
    pub title: &'static str,
    pub prompt: String,
}

/// The book presets for the current mood, in a stable order.
///
/// Only the first preset honours the user's language choice.
pub fn book_presets(mood: &str, languages: &[String]) -> Vec<BookPreset> {
    let historical = FilterSelection {
        mood: mood.to_string(),
        age_group: AgeGroup::Adults,
        media: MediaType::Books,
        languages: languages.to_vec(),
        country: "UK".to_string(),
        premises: vec!["❤️ Love".to_string(), "🔍 Mystery".to_string()],
        creator: "Ken Follett".to_string(),
        people: "None".to_string(),
        length: LengthBucket::Long,
        years: YearRange {
            start: 1990,
            end: 2024,
        },
        genres: vec!["Drama".to_string(), "Romance".to_string()],
        era: Era::Past,
    };
    let fantasy = FilterSelection {
        mood: mood.to_string(),
        age_group: AgeGroup::Teens,
        media: MediaType::Books,
        languages: vec!["English".to_string()],
        country: "USA".to_string(),
        premises: vec!["🧙‍♂️ Fantasy".to_string(), "🏞️ Adventure".to_string()],
        creator: "J.K. Rowling".to_string(),
        people: "Harry Potter".to_string(),
        length: LengthBucket::Long,
        years: YearRange {
            start: 2000,
            end: 2024,
        },
        genres: vec!["Fantasy".to_string(), "Adventure".to_string()],
        era: Era::Past,
    };

    [
        ("Historical fiction", "historical fiction book", historical),
        ("Fantasy adventure", "fantasy adventure book", fantasy),
    ]
    .into_iter()
    .enumerate()
    .map(|(id, (title, subject, selection))| BookPreset {
        id,
        title,
        prompt: render(subject, &selection.criteria()),
    })
    .collect()
}

/// Free-text search. Blank input yields `None` and must not reach the model.
pub fn custom_prompt(input: &str) -> Option<&str> {
    if input.trim().is_empty() {
        None
    } else {
        Some(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn movie_prompt_layout() {
        let prompt = FilterSelection::default().to_prompt();
        let expected = "Find a Movies based on the following premise:\n\
            user_mood: 😊 Happy\n\
            age_group: Adults\n\
            search_type: Movies\n\
            search_language: English\n\
            search_location: USA\n\
            story_premise: ❤️ Love, 🏞️ Adventure\n\
            director_author: \n\
            length_of_story: 🕒 Short (< 90 mins)\n\
            release_year: 2000-2024\n\
            actors_characters: \n\
            time_period: Present\n\
            Please include the title in bold, a brief description, and omit the URL for more information for each result.\n";
        assert_eq!(prompt, expected);
    }

    #[test]
    fn prompt_is_deterministic() {
        let selection = FilterSelection {
            media: MediaType::Series,
            languages: vec!["Korean".to_string(), "Japanese".to_string()],
            creator: "Bong Joon-ho".to_string(),
            era: Era::Future,
            ..Default::default()
        };
        assert_eq!(selection.to_prompt(), selection.clone().to_prompt());
        assert!(selection.to_prompt().contains("search_language: Korean, Japanese\n"));
        assert!(selection.to_prompt().starts_with("Find a Series based"));
    }

    #[test]
    fn book_prompt_lists_genres() {
        let selection = FilterSelection {
            media: MediaType::Books,
            genres: vec!["Mystery".to_string()],
            ..Default::default()
        };
        let prompt = selection.to_prompt();
        assert!(prompt.starts_with("Find a book based"));
        assert!(prompt.contains("favorite_genre: Mystery\ntime_period: Present\n"));
    }

    #[test]
    fn presets_follow_mood_and_languages() {
        let languages = vec!["French".to_string()];
        let presets = book_presets("😢 Sad", &languages);
        assert_eq!(presets.len(), 2);
        assert_eq!(presets[0].id, 0);
        assert!(presets[0].prompt.starts_with("Find a historical fiction book"));
        assert!(presets[0].prompt.contains("user_mood: 😢 Sad\n"));
        assert!(presets[0].prompt.contains("search_language: French\n"));
        assert!(presets[1].prompt.contains("search_language: English\n"));
        assert!(presets[1].prompt.contains("characters_books: Harry Potter\n"));
    }

    #[test]
    fn blank_custom_prompt_is_skipped() {
        assert_eq!(custom_prompt(""), None);
        assert_eq!(custom_prompt("  \n\t "), None);
        assert_eq!(custom_prompt(" noir films "), Some(" noir films "));
    }
}
