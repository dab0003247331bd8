use chrono::NaiveDate;

use crate::catalog::SeasonRecord;

/// Genre labels that mark a show as animation for the unrated-animation
/// suppression rule. Literal tag match, applied regardless of what the
/// user selected.
pub const ANIMATION_GENRES: &[&str] = &["动画", "Animation"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingFilter {
    All,
    AtLeast(u8),
}

impl RatingFilter {
    pub fn as_display(&self) -> String {
        match self {
            RatingFilter::All => "All".to_string(),
            RatingFilter::AtLeast(n) => format!("> {}", n),
        }
    }

    pub fn next(&self) -> Self {
        match self {
            RatingFilter::All => RatingFilter::AtLeast(9),
            RatingFilter::AtLeast(9) => RatingFilter::AtLeast(8),
            RatingFilter::AtLeast(8) => RatingFilter::AtLeast(7),
            RatingFilter::AtLeast(7) => RatingFilter::AtLeast(6),
            RatingFilter::AtLeast(_) => RatingFilter::All,
        }
    }
}

impl Default for RatingFilter {
    fn default() -> Self {
        RatingFilter::All
    }
}

/// Alternate filter preset: high-rated seasons within a recent window.
/// Mutually exclusive with the plain rating threshold; while active it
/// also disables the future/past partition (no upcoming concept).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpecialMode {
    pub min_rating: f64,
    pub window_years: i32,
}

impl Default for SpecialMode {
    fn default() -> Self {
        Self {
            min_rating: 8.0,
            window_years: 5,
        }
    }
}

/// Current facet selections. Within a facet the selected values are
/// OR-combined; facets are AND-combined. An empty list means "all" for
/// that facet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSelection {
    pub special: Option<SpecialMode>,
    pub rating: RatingFilter,
    pub genres: Vec<String>,
    pub networks: Vec<String>,
    /// Index into the configured dataset sources.
    pub source: usize,
}

impl FilterSelection {
    pub fn toggle_genre(&mut self, name: &str) {
        toggle(&mut self.genres, name);
    }

    pub fn toggle_network(&mut self, name: &str) {
        toggle(&mut self.networks, name);
    }

    pub fn clear_genres(&mut self) {
        self.genres.clear();
    }

    pub fn clear_networks(&mut self) {
        self.networks.clear();
    }

    pub fn toggle_special(&mut self) {
        self.special = match self.special {
            Some(_) => None,
            None => Some(SpecialMode::default()),
        };
    }
}

fn toggle(list: &mut Vec<String>, value: &str) {
    if let Some(pos) = list.iter().position(|v| v == value) {
        list.remove(pos);
    } else {
        list.push(value.to_string());
    }
}

/// Apply the filter stages in their contractual order. The order matters:
/// the unrated-animation suppression runs after the genre stage and cannot
/// be bypassed by any user selection.
pub fn apply(
    all: &[SeasonRecord],
    selection: &FilterSelection,
    today: NaiveDate,
) -> Vec<SeasonRecord> {
    let mut result: Vec<SeasonRecord> = all.to_vec();

    // Stage 1: special-mode base filter. Overrides the rating threshold.
    if let Some(special) = selection.special {
        let window_start = window_start(today, special.window_years);
        result.retain(|r| {
            let d = r.air_date();
            d >= window_start && d <= today && r.rating() >= special.min_rating
        });
    } else if let RatingFilter::AtLeast(threshold) = selection.rating {
        // Stage 2: plain rating threshold; unrated counts as 0.
        result.retain(|r| r.rating() >= threshold as f64);
    }

    // Stage 3: genre intersection (exact tag-name match).
    if !selection.genres.is_empty() {
        result.retain(|r| selection.genres.iter().any(|g| r.show.has_genre(g)));
    }

    // Stage 4: unconditional unrated-animation suppression.
    result.retain(|r| {
        let is_animation = ANIMATION_GENRES.iter().any(|g| r.show.has_genre(g));
        !(is_animation && !r.is_rated())
    });

    // Stage 5: network substring match, case-insensitive.
    if !selection.networks.is_empty() {
        result.retain(|r| {
            r.show.networks.iter().any(|n| {
                let name = n.name.to_lowercase();
                selection
                    .networks
                    .iter()
                    .any(|sel| name.contains(&sel.to_lowercase()))
            })
        });
    }

    result
}

fn window_start(today: NaiveDate, years: i32) -> NaiveDate {
    use chrono::Datelike;
    today
        .with_year(today.year() - years)
        .unwrap_or(NaiveDate::MIN)
}
