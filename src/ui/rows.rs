use crate::catalog::SeasonRecord;
use crate::pipeline::{RenderSink, ScrollTarget, YearMark};

/// One line of the results list.
#[derive(Debug, Clone)]
pub enum Row {
    UpcomingHeader,
    MonthHeader { year: i32, month: u32 },
    Card(SeasonRecord),
}

/// The app-side implementation of the render-sink contract: batches become
/// rows, with a month header inserted whenever the group key changes from
/// the last one seen. In special mode there is no grouping and no headers.
#[derive(Debug, Default)]
pub struct ResultRows {
    pub rows: Vec<Row>,
    last_group_key: Option<(i32, u32)>,
    group_by_month: bool,
    /// Latest timeline snapshot handed over by the synchronizer.
    pub timeline: (Vec<YearMark>, Option<YearMark>),
    /// Pending programmatic scroll, consumed by the event loop.
    pub scroll_request: Option<ScrollTarget>,
}

impl ResultRows {
    /// Wipe everything for a fresh view. Clearing the group key here is
    /// what makes the first batch after a filter change re-emit its
    /// header.
    pub fn reset(&mut self, group_by_month: bool) {
        self.rows.clear();
        self.last_group_key = None;
        self.group_by_month = group_by_month;
        self.scroll_request = None;
    }

    /// The upcoming strip sits above the paginated results and is rebuilt
    /// in full on every reset.
    pub fn set_upcoming(&mut self, future: &[SeasonRecord]) {
        if future.is_empty() {
            return;
        }
        self.rows.push(Row::UpcomingHeader);
        for record in future {
            self.rows.push(Row::Card(record.clone()));
        }
    }

    /// Row index a programmatic scroll should land on.
    pub fn target_index(&self, target: ScrollTarget) -> Option<usize> {
        self.rows.iter().position(|row| match (target, row) {
            (ScrollTarget::Upcoming, Row::UpcomingHeader) => true,
            (ScrollTarget::Year(y), Row::MonthHeader { year, .. }) => *year == y,
            _ => false,
        })
    }

    /// Topmost mark within the qualifying viewport band, for scroll-driven
    /// resynchronization: the last header at or above the band's bottom
    /// edge wins, so the section currently under the band is the one
    /// reported.
    pub fn top_visible_mark(&self, scroll_offset: usize, band: usize) -> Option<YearMark> {
        let limit = (scroll_offset + band.max(1)).min(self.rows.len());
        let mut top = None;
        for row in &self.rows[..limit] {
            match row {
                Row::UpcomingHeader => top = Some(YearMark::Upcoming),
                Row::MonthHeader { year, .. } => top = Some(YearMark::Year(*year)),
                Row::Card(_) => {}
            }
        }
        top
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl RenderSink for ResultRows {
    fn render_batch(&mut self, batch: &[SeasonRecord]) {
        for record in batch {
            if self.group_by_month {
                let key = record.month_key();
                if self.last_group_key != Some(key) {
                    self.last_group_key = Some(key);
                    self.rows.push(Row::MonthHeader {
                        year: key.0,
                        month: key.1,
                    });
                }
            }
            self.rows.push(Row::Card(record.clone()));
        }
    }

    fn render_timeline(&mut self, marks: &[YearMark], active: Option<YearMark>) {
        self.timeline = (marks.to_vec(), active);
    }

    fn scroll_to(&mut self, target: ScrollTarget) {
        self.scroll_request = Some(target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::test_support::{record, show};
    use crate::pipeline::RenderSink;

    #[test]
    fn test_month_header_inserted_on_group_change() {
        let s = show(1, "Show", &[], &[]);
        let batch = vec![
            record(&s, 1, "2025-05-20", Some(8.0)),
            record(&s, 2, "2025-05-02", Some(7.0)),
            record(&s, 3, "2025-04-10", Some(9.0)),
        ];
        let mut rows = ResultRows::default();
        rows.reset(true);
        rows.render_batch(&batch);

        let headers: Vec<(i32, u32)> = rows
            .rows
            .iter()
            .filter_map(|r| match r {
                Row::MonthHeader { year, month } => Some((*year, *month)),
                _ => None,
            })
            .collect();
        assert_eq!(headers, vec![(2025, 5), (2025, 4)]);
        assert_eq!(rows.len(), 5);
    }

    #[test]
    fn test_header_not_repeated_across_batches() {
        let s = show(1, "Show", &[], &[]);
        let mut rows = ResultRows::default();
        rows.reset(true);
        rows.render_batch(&[record(&s, 1, "2025-05-20", Some(8.0))]);
        rows.render_batch(&[record(&s, 2, "2025-05-02", Some(7.0))]);
        assert_eq!(rows.len(), 3); // one header, two cards
    }

    #[test]
    fn test_reset_clears_group_key() {
        let s = show(1, "Show", &[], &[]);
        let mut rows = ResultRows::default();
        rows.reset(true);
        rows.render_batch(&[record(&s, 1, "2025-05-20", Some(8.0))]);
        rows.reset(true);
        rows.render_batch(&[record(&s, 1, "2025-05-20", Some(8.0))]);
        assert_eq!(rows.len(), 2); // header re-emitted after reset
    }

    #[test]
    fn test_no_headers_in_special_mode() {
        let s = show(1, "Show", &[], &[]);
        let mut rows = ResultRows::default();
        rows.reset(false);
        rows.render_batch(&[
            record(&s, 1, "2025-05-20", Some(9.0)),
            record(&s, 2, "2024-03-02", Some(8.5)),
        ]);
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_top_visible_mark_tracks_sections() {
        let s = show(1, "Show", &[], &[]);
        let mut rows = ResultRows::default();
        rows.reset(true);
        rows.set_upcoming(&[record(&s, 9, "2026-01-01", None)]);
        rows.render_batch(&[
            record(&s, 1, "2025-05-20", Some(8.0)),
            record(&s, 2, "2024-03-02", Some(7.0)),
        ]);
        // rows: [UpcomingHeader, Card, Header(2025-05), Card, Header(2024-03), Card]
        assert_eq!(rows.top_visible_mark(0, 2), Some(YearMark::Upcoming));
        assert_eq!(rows.top_visible_mark(1, 2), Some(YearMark::Year(2025)));
        assert_eq!(rows.top_visible_mark(4, 2), Some(YearMark::Year(2024)));
    }

    #[test]
    fn test_target_index_finds_first_year_header() {
        let s = show(1, "Show", &[], &[]);
        let mut rows = ResultRows::default();
        rows.reset(true);
        rows.set_upcoming(&[record(&s, 9, "2026-01-01", None)]);
        rows.render_batch(&[
            record(&s, 1, "2025-05-20", Some(8.0)),
            record(&s, 2, "2025-04-02", Some(7.0)),
            record(&s, 3, "2024-03-02", Some(7.0)),
        ]);
        assert_eq!(rows.target_index(ScrollTarget::Upcoming), Some(0));
        assert_eq!(rows.target_index(ScrollTarget::Year(2025)), Some(2));
        assert_eq!(rows.target_index(ScrollTarget::Year(2024)), Some(6));
        assert_eq!(rows.target_index(ScrollTarget::Year(1999)), None);
    }
}
