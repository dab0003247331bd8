use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};

/// Top-level dataset document as served by the static site.
#[derive(Debug, Clone, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub metadata: Option<Metadata>,
    pub shows: Vec<Show>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Metadata {
    #[serde(default)]
    pub last_updated: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Show {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub original_name: String,
    #[serde(default)]
    pub genres: Vec<Tag>,
    #[serde(default)]
    pub networks: Vec<Tag>,
    #[serde(default)]
    pub seasons: Vec<Season>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Tag {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Season {
    /// Seasons without an air date are dropped during normalization.
    #[serde(default)]
    pub air_date: Option<NaiveDate>,
    #[serde(default)]
    pub season_number: u32,
    #[serde(default)]
    pub name: String,
    /// Upstream emits this as either a JSON number or a numeric string.
    #[serde(default, deserialize_with = "rating_opt")]
    pub douban_rating: Option<f64>,
    #[serde(default)]
    pub douban_link_verified: bool,
}

fn rating_opt<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumOrStr {
        Num(f64),
        Str(String),
    }

    match Option::<NumOrStr>::deserialize(deserializer)? {
        Some(NumOrStr::Num(n)) => Ok(Some(n)),
        Some(NumOrStr::Str(s)) => Ok(s.trim().parse::<f64>().ok()),
        None => Ok(None),
    }
}

impl Show {
    pub fn has_genre(&self, name: &str) -> bool {
        self.genres.iter().any(|g| g.name == name)
    }
}

/// One season flattened out of its show, carrying a shared back-reference
/// to the parent. This is the unit everything downstream filters, sorts
/// and renders.
#[derive(Debug, Clone)]
pub struct SeasonRecord {
    pub show: Arc<Show>,
    pub season: Season,
}

impl SeasonRecord {
    /// Guaranteed by normalization; seasons without an air date never
    /// become records.
    pub fn air_date(&self) -> NaiveDate {
        self.season.air_date.unwrap_or_default()
    }

    /// Missing or non-positive ratings count as unrated (0.0).
    pub fn rating(&self) -> f64 {
        self.season.douban_rating.unwrap_or(0.0).max(0.0)
    }

    pub fn is_rated(&self) -> bool {
        self.rating() > 0.0
    }

    pub fn year(&self) -> i32 {
        use chrono::Datelike;
        self.air_date().year()
    }

    /// Grouping key for month headers: (year, month).
    pub fn month_key(&self) -> (i32, u32) {
        use chrono::Datelike;
        let d = self.air_date();
        (d.year(), d.month())
    }

    /// Render identity: a show can have several seasons on screen at once.
    pub fn identity(&self) -> (u64, u32) {
        (self.show.id, self.season.season_number)
    }

    pub fn display_title(&self) -> String {
        if !self.show.original_name.is_empty() && self.show.original_name != self.show.name {
            format!(
                "{} ({}) - {}",
                self.show.name, self.show.original_name, self.season.name
            )
        } else {
            format!("{} - {}", self.show.name, self.season.name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_from_number() {
        let s: Season = serde_json::from_str(r#"{"douban_rating": 8.5}"#).unwrap();
        assert_eq!(s.douban_rating, Some(8.5));
    }

    #[test]
    fn test_rating_from_string() {
        let s: Season = serde_json::from_str(r#"{"douban_rating": "7.2"}"#).unwrap();
        assert_eq!(s.douban_rating, Some(7.2));
    }

    #[test]
    fn test_rating_unparseable_string() {
        let s: Season = serde_json::from_str(r#"{"douban_rating": "暂无"}"#).unwrap();
        assert_eq!(s.douban_rating, None);
    }

    #[test]
    fn test_rating_absent() {
        let s: Season = serde_json::from_str(r#"{"name": "Season 1"}"#).unwrap();
        assert_eq!(s.douban_rating, None);
    }
}
