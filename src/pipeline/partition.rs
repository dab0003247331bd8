use chrono::NaiveDate;

use crate::catalog::SeasonRecord;

/// Filtered seasons split around "today". Recomputed wholesale on every
/// filter change or dataset replacement, never mutated in place.
#[derive(Debug, Clone, Default)]
pub struct CatalogView {
    /// air_date > today, soonest first.
    pub future: Vec<SeasonRecord>,
    /// air_date <= today, newest month first, rating descending within a
    /// month (pure rating order in special mode).
    pub past_and_present: Vec<SeasonRecord>,
}

/// Split the filtered list around `today` and sort both halves. `today`
/// is caller-supplied and expected to be a plain date (midnight), so
/// same-day comparisons are stable across the session.
pub fn partition_and_sort(
    filtered: Vec<SeasonRecord>,
    today: NaiveDate,
    special: bool,
) -> CatalogView {
    if special {
        // No upcoming concept in special mode; everything sorts by rating.
        let mut past: Vec<SeasonRecord> = filtered;
        past.sort_by(|a, b| b.rating().total_cmp(&a.rating()));
        return CatalogView {
            future: Vec::new(),
            past_and_present: past,
        };
    }

    let (future, past): (Vec<_>, Vec<_>) =
        filtered.into_iter().partition(|r| r.air_date() > today);

    let mut future = future;
    future.sort_by_key(|r| r.air_date());

    let mut past = past;
    past.sort_by(|a, b| {
        b.month_key()
            .cmp(&a.month_key())
            .then_with(|| b.rating().total_cmp(&a.rating()))
    });

    CatalogView {
        future,
        past_and_present: past,
    }
}
