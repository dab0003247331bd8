use std::fmt;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::pipeline::partition::CatalogView;

/// How long scroll-driven resynchronization stays suppressed after a
/// programmatic jump starts its smooth scroll.
pub const SCROLL_COOLDOWN: Duration = Duration::from_secs(1);

const INITIAL_VISIBLE: usize = 3;
const GROWTH_STEP: usize = 2;

/// One entry of the year index: a 4-digit year, or the synthetic marker
/// for the upcoming strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YearMark {
    Upcoming,
    Year(i32),
}

impl fmt::Display for YearMark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            YearMark::Upcoming => write!(f, "即将上映"),
            YearMark::Year(y) => write!(f, "{}", y),
        }
    }
}

/// Keeps the year navigation in step with what has been rendered and where
/// the viewport sits. Always rebuilt from scratch when the filtered view
/// changes; never patched incrementally.
#[derive(Debug, Default)]
pub struct Timeline {
    years: Vec<YearMark>,
    active: Option<YearMark>,
    visible: usize,
    suppressed_until: Option<Instant>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute the year index from the current view. Distinct years in
    /// the order the sorted view produces them, with the upcoming marker
    /// in front whenever there are future seasons.
    pub fn rebuild(&mut self, view: &CatalogView) {
        let mut years: Vec<YearMark> = Vec::new();
        if !view.future.is_empty() {
            years.push(YearMark::Upcoming);
        }
        for record in &view.past_and_present {
            let mark = YearMark::Year(record.year());
            if !years.contains(&mark) {
                years.push(mark);
            }
        }
        self.visible = INITIAL_VISIBLE.min(years.len());
        self.active = years.first().copied();
        self.years = years;
        self.suppressed_until = None;
        debug!(years = self.years.len(), "Rebuilt year index");
    }

    /// Recompute the year index for an assimilated (complete) dataset
    /// without disturbing what the user is looking at: the active mark
    /// survives if it still exists and the visible window never shrinks
    /// below its current size.
    pub fn assimilate(&mut self, view: &CatalogView) {
        let active = self.active;
        let visible = self.visible;
        self.rebuild(view);
        if let Some(mark) = active {
            if self.years.contains(&mark) {
                self.active = Some(mark);
            }
        }
        self.visible = visible.max(self.visible).min(self.years.len());
    }

    pub fn marks(&self) -> &[YearMark] {
        &self.years
    }

    pub fn visible_marks(&self) -> &[YearMark] {
        &self.years[..self.visible]
    }

    pub fn active(&self) -> Option<YearMark> {
        self.active
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    pub fn is_suppressed(&self, now: Instant) -> bool {
        self.suppressed_until.is_some_and(|until| now < until)
    }

    /// Suppress scroll-driven sync for the cool-down window so the smooth
    /// scroll kicked off by a year jump cannot fight its own target.
    pub fn begin_programmatic_scroll(&mut self, now: Instant) {
        self.suppressed_until = Some(now + SCROLL_COOLDOWN);
    }

    /// Adopt `top_visible` as the active mark following an ordinary
    /// (non-programmatic) scroll. Growing past the edge of the visible
    /// window reveals more year marks. Returns whether anything changed.
    pub fn sync(&mut self, top_visible: Option<YearMark>, now: Instant) -> bool {
        if self.is_suppressed(now) {
            return false;
        }
        let Some(mark) = top_visible else {
            return false;
        };
        if Some(mark) == self.active {
            return false;
        }
        let Some(index) = self.years.iter().position(|m| *m == mark) else {
            return false;
        };
        self.active = Some(mark);
        if index + 1 >= self.visible && self.visible < self.years.len() {
            self.visible = (index + GROWTH_STEP).min(self.years.len());
        }
        true
    }

    /// User picked a mark directly. Picking the last visible one while
    /// more remain widens the window first, then the caller jumps.
    pub fn select(&mut self, mark: YearMark) {
        let last_visible = self.visible_marks().last().copied();
        if last_visible == Some(mark) && self.visible < self.years.len() {
            self.visible = (self.visible + GROWTH_STEP).min(self.years.len());
        }
        self.active = Some(mark);
    }

    /// The mark after `mark` in the index, for speculative preloading.
    pub fn next_after(&self, mark: YearMark) -> Option<YearMark> {
        let index = self.years.iter().position(|m| *m == mark)?;
        self.years.get(index + 1).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::test_support::{record, show};
    use crate::pipeline::partition::partition_and_sort;

    fn view_for(dates: &[&str], futures: &[&str]) -> CatalogView {
        let s = show(1, "Show", &[], &[]);
        let mut records = Vec::new();
        let mut n = 0;
        for d in dates.iter().chain(futures) {
            n += 1;
            records.push(record(&s, n, d, Some(7.0)));
        }
        partition_and_sort(records, "2025-06-15".parse().unwrap(), false)
    }

    #[test]
    fn test_rebuild_distinct_years_in_view_order() {
        let view = view_for(&["2025-05-01", "2025-02-01", "2024-11-01", "2024-03-01"], &[]);
        let mut tl = Timeline::new();
        tl.rebuild(&view);
        assert_eq!(tl.marks(), &[YearMark::Year(2025), YearMark::Year(2024)]);
        assert_eq!(tl.active(), Some(YearMark::Year(2025)));
    }

    #[test]
    fn test_upcoming_mark_prepended_when_future_nonempty() {
        let view = view_for(&["2025-05-01"], &["2025-09-01"]);
        let mut tl = Timeline::new();
        tl.rebuild(&view);
        assert_eq!(tl.marks()[0], YearMark::Upcoming);
        assert_eq!(tl.active(), Some(YearMark::Upcoming));
    }

    #[test]
    fn test_initial_window_is_three_capped_by_length() {
        let view = view_for(&["2025-05-01", "2024-05-01"], &[]);
        let mut tl = Timeline::new();
        tl.rebuild(&view);
        assert_eq!(tl.visible_marks().len(), 2);

        let view = view_for(
            &["2025-05-01", "2024-05-01", "2023-05-01", "2022-05-01", "2021-05-01"],
            &[],
        );
        tl.rebuild(&view);
        assert_eq!(tl.visible_marks().len(), 3);
    }

    #[test]
    fn test_sync_adopts_mark_and_grows_window() {
        let view = view_for(
            &["2025-05-01", "2024-05-01", "2023-05-01", "2022-05-01", "2021-05-01"],
            &[],
        );
        let mut tl = Timeline::new();
        tl.rebuild(&view);
        let now = Instant::now();

        // Scrolling down to 2023, the last visible slot, reveals two more.
        assert!(tl.sync(Some(YearMark::Year(2023)), now));
        assert_eq!(tl.active(), Some(YearMark::Year(2023)));
        assert_eq!(tl.visible_marks().len(), 4);

        // Same mark again: no change.
        assert!(!tl.sync(Some(YearMark::Year(2023)), now));
    }

    #[test]
    fn test_sync_suppressed_during_programmatic_scroll() {
        let view = view_for(&["2025-05-01", "2024-05-01"], &[]);
        let mut tl = Timeline::new();
        tl.rebuild(&view);
        let now = Instant::now();

        tl.begin_programmatic_scroll(now);
        assert!(!tl.sync(Some(YearMark::Year(2024)), now));
        assert_eq!(tl.active(), Some(YearMark::Year(2025)));

        // After the cool-down the handler works again.
        let later = now + SCROLL_COOLDOWN + Duration::from_millis(1);
        assert!(tl.sync(Some(YearMark::Year(2024)), later));
        assert_eq!(tl.active(), Some(YearMark::Year(2024)));
    }

    #[test]
    fn test_select_last_visible_grows_window() {
        let view = view_for(
            &["2025-05-01", "2024-05-01", "2023-05-01", "2022-05-01", "2021-05-01"],
            &[],
        );
        let mut tl = Timeline::new();
        tl.rebuild(&view);
        tl.select(YearMark::Year(2023));
        assert_eq!(tl.visible_marks().len(), 5);
        assert_eq!(tl.active(), Some(YearMark::Year(2023)));
    }

    #[test]
    fn test_next_after_for_preload() {
        let view = view_for(&["2025-05-01", "2024-05-01"], &["2025-09-01"]);
        let mut tl = Timeline::new();
        tl.rebuild(&view);
        assert_eq!(tl.next_after(YearMark::Upcoming), Some(YearMark::Year(2025)));
        assert_eq!(
            tl.next_after(YearMark::Year(2025)),
            Some(YearMark::Year(2024))
        );
        assert_eq!(tl.next_after(YearMark::Year(2024)), None);
    }

    #[test]
    fn test_assimilate_keeps_active_and_window() {
        let view = view_for(
            &["2025-05-01", "2024-05-01", "2023-05-01", "2022-05-01", "2021-05-01"],
            &[],
        );
        let mut tl = Timeline::new();
        tl.rebuild(&view);
        tl.sync(Some(YearMark::Year(2023)), Instant::now());
        assert_eq!(tl.visible_marks().len(), 4);

        // Complete dataset adds older years; the user's position holds.
        let wider = view_for(
            &[
                "2025-05-01", "2024-05-01", "2023-05-01", "2022-05-01", "2021-05-01",
                "2020-05-01", "2019-05-01",
            ],
            &[],
        );
        tl.assimilate(&wider);
        assert_eq!(tl.active(), Some(YearMark::Year(2023)));
        assert_eq!(tl.marks().len(), 7);
        assert_eq!(tl.visible_marks().len(), 4);
    }

    #[test]
    fn test_rebuild_matches_distinct_years_after_filter_change() {
        // Rebuilding from a narrower view must equal the distinct years of
        // that view, not a patch of the previous index.
        let wide = view_for(&["2025-05-01", "2024-05-01", "2023-05-01"], &["2026-01-01"]);
        let mut tl = Timeline::new();
        tl.rebuild(&wide);
        assert_eq!(tl.marks().len(), 4);

        let narrow = view_for(&["2024-05-01"], &[]);
        tl.rebuild(&narrow);
        assert_eq!(tl.marks(), &[YearMark::Year(2024)]);
        assert_eq!(tl.active(), Some(YearMark::Year(2024)));
    }
}
