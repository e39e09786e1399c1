use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{Chapter, ChapterNumber};

/// Alternative title of a comic
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct AltName {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub language: String,
}

/// A catalog entry, normalized as published by the remote catalog.
///
/// `pinned`, `favorites` and `following` are owned by the local user and are
/// never overwritten by a catalog refresh. Attributes without a dedicated
/// field are kept in `extra` so the cached record round-trips verbatim.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct Comic {
    pub id: i64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub author: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub createtime: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mangadex_url: Option<String>,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub favorites: bool,
    #[serde(default)]
    pub following: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alt_names: Vec<AltName>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub chapters: Vec<Chapter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publication_year: Option<i32>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_rating: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub star: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub demographics: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arts: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genres: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub themes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formats: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artists: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_chapter_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChapterOrder {
    #[default]
    Ascending,
    Descending,
}

impl Comic {
    pub fn new(id: i64, title: &str) -> Self {
        Self {
            id,
            title: title.to_string(),
            ..Default::default()
        }
    }

    /// Case-insensitive match against title, author, artists, genres and alternative names
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }

        let contains = |s: &str| s.to_lowercase().contains(&query);

        contains(&self.title)
            || contains(&self.author)
            || self.artists.iter().flatten().any(|a| contains(a))
            || self.genres.iter().flatten().any(|g| contains(g))
            || self.alt_names.iter().any(|alt| contains(&alt.name))
    }

    pub fn chapter_by_number(&self, number: f64) -> Option<&Chapter> {
        self.chapters.iter().find(|ch| ch.chap == number)
    }

    pub fn chapter_by_id(&self, chapter_id: &str) -> Option<&Chapter> {
        let ChapterNumber(number) = chapter_id.parse().ok()?;
        self.chapter_by_number(number)
    }

    /// Chapters sorted by number, restricted to `language` when given
    pub fn sorted_chapters(&self, order: ChapterOrder, language: Option<&str>) -> Vec<&Chapter> {
        let mut chapters: Vec<&Chapter> = self
            .chapters
            .iter()
            .filter(|ch| language.is_none_or(|lang| ch.language == lang))
            .collect();

        chapters.sort_by(|a, b| {
            let ord = a.chap.partial_cmp(&b.chap).unwrap_or(Ordering::Equal);
            match order {
                ChapterOrder::Ascending => ord,
                ChapterOrder::Descending => ord.reverse(),
            }
        });

        chapters
    }

    /// Distinct chapter languages in catalog order
    pub fn languages(&self) -> Vec<&str> {
        let mut languages: Vec<&str> = vec![];
        for chapter in &self.chapters {
            if !languages.contains(&chapter.language.as_str()) {
                languages.push(&chapter.language);
            }
        }
        languages
    }

    /// Previous and next chapter of `number` in ascending chapter order
    pub fn adjacent_chapters(&self, number: f64) -> (Option<&Chapter>, Option<&Chapter>) {
        let sorted = self.sorted_chapters(ChapterOrder::Ascending, None);
        match sorted.iter().position(|ch| ch.chap == number) {
            Some(index) => (
                index.checked_sub(1).and_then(|i| sorted.get(i).copied()),
                sorted.get(index + 1).copied(),
            ),
            None => (None, None),
        }
    }
}
