pub mod models;

use std::sync::Arc;

use tracing::info;

pub use models::{Dataset, Season, SeasonRecord, Show, Tag};

use crate::error::{Error, Result};

impl Dataset {
    /// Parse a dataset document. A document that is not an object with a
    /// `shows` array is a validation error, surfaced to the status line by
    /// the caller rather than crashing anything.
    pub fn parse(text: &str) -> Result<Dataset> {
        serde_json::from_str(text).map_err(|e| Error::MalformedDataset(e.to_string()))
    }
}

/// Flatten shows into season records. Seasons lacking an air date are
/// excluded here, as a hard filter rather than a sort-order concern.
pub fn normalize(dataset: &Dataset) -> Vec<SeasonRecord> {
    let mut records = Vec::new();
    for show in &dataset.shows {
        if show.seasons.is_empty() {
            continue;
        }
        let parent = Arc::new(Show {
            seasons: Vec::new(),
            ..show.clone()
        });
        for season in &show.seasons {
            if season.air_date.is_some() {
                records.push(SeasonRecord {
                    show: Arc::clone(&parent),
                    season: season.clone(),
                });
            }
        }
    }
    info!(
        shows = dataset.shows.len(),
        seasons = records.len(),
        "Normalized dataset"
    );
    records
}


#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"{
        "metadata": { "last_updated": "2025-06-01T00:00:00Z" },
        "shows": [
            {
                "id": 1,
                "name": "Severance",
                "original_name": "Severance",
                "genres": [{ "name": "剧情" }],
                "networks": [{ "name": "Apple TV+" }],
                "seasons": [
                    { "air_date": "2022-02-18", "season_number": 1, "name": "Season 1", "douban_rating": "8.9" },
                    { "season_number": 2, "name": "Season 2" }
                ]
            },
            {
                "id": 2,
                "name": "Empty Show",
                "original_name": "",
                "genres": [],
                "networks": [],
                "seasons": []
            }
        ]
    }"#;

    #[test]
    fn test_normalize_drops_seasons_without_air_date() {
        let dataset = Dataset::parse(DOC).unwrap();
        let records = normalize(&dataset);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].identity(), (1, 1));
        assert_eq!(records[0].rating(), 8.9);
    }

    #[test]
    fn test_parent_back_reference() {
        let dataset = Dataset::parse(DOC).unwrap();
        let records = normalize(&dataset);
        assert_eq!(records[0].show.name, "Severance");
        assert!(records[0].show.has_genre("剧情"));
    }

    #[test]
    fn test_parse_rejects_missing_shows() {
        let err = Dataset::parse(r#"{ "metadata": {} }"#).unwrap_err();
        assert!(matches!(err, Error::MalformedDataset(_)));
    }

    #[test]
    fn test_parse_rejects_wrong_type() {
        assert!(Dataset::parse(r#"{ "shows": "not a list" }"#).is_err());
        assert!(Dataset::parse("[]").is_err());
        assert!(Dataset::parse("not json at all").is_err());
    }
}
