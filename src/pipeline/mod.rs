pub mod filter;
pub mod pager;
pub mod partition;
pub mod timeline;

pub use filter::{FilterSelection, RatingFilter, SpecialMode};
pub use pager::{PAGE_SIZE, Pager};
pub use partition::{CatalogView, partition_and_sort};
pub use timeline::{SCROLL_COOLDOWN, Timeline, YearMark};

use crate::catalog::SeasonRecord;

/// Where a programmatic scroll should land.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollTarget {
    Upcoming,
    Year(i32),
}

/// The presentation side of the pipeline. The core never touches widgets;
/// it hands ordered batches and timeline state to whatever implements
/// this. The sink owns group-header insertion: a header goes in whenever
/// the month key changes from the last one it saw (no grouping in special
/// mode).
pub trait RenderSink {
    fn render_batch(&mut self, batch: &[SeasonRecord]);
    fn render_timeline(&mut self, marks: &[YearMark], active: Option<YearMark>);
    fn scroll_to(&mut self, target: ScrollTarget);
}

/// Index of the first item of `year` in the sorted past/present view.
pub fn first_index_of_year(view: &[SeasonRecord], year: i32) -> Option<usize> {
    view.iter().position(|r| r.year() == year)
}

/// Keep disclosing pages until the first item of `mark`'s year has been
/// handed to the sink, or the view runs out. Callers hold the pager's
/// advance guard around this, since one jump can disclose several pages.
/// Returns whether the target exists in the rendered output.
pub fn ensure_year_loaded(
    mark: YearMark,
    view: &[SeasonRecord],
    pager: &mut Pager,
    sink: &mut dyn RenderSink,
) -> bool {
    let year = match mark {
        // The upcoming strip is always rendered; nothing to page in.
        YearMark::Upcoming => return true,
        YearMark::Year(y) => y,
    };
    let Some(index) = first_index_of_year(view, year) else {
        return false;
    };
    while index >= pager.loaded_count() {
        if pager.load_next_page_locked(view, sink) == 0 {
            return false;
        }
    }
    true
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Records everything the pipeline hands to the presentation layer.
    #[derive(Debug, Default)]
    pub struct RecordingSink {
        pub rendered: Vec<(u64, u32)>,
        pub timeline_renders: Vec<(Vec<YearMark>, Option<YearMark>)>,
        pub scrolls: Vec<ScrollTarget>,
    }

    impl RenderSink for RecordingSink {
        fn render_batch(&mut self, batch: &[SeasonRecord]) {
            self.rendered.extend(batch.iter().map(|r| r.identity()));
        }

        fn render_timeline(&mut self, marks: &[YearMark], active: Option<YearMark>) {
            self.timeline_renders.push((marks.to_vec(), active));
        }

        fn scroll_to(&mut self, target: ScrollTarget) {
            self.scrolls.push(target);
        }
    }
}
