use tracing::debug;

use crate::catalog::SeasonRecord;
use crate::pipeline::RenderSink;

pub const PAGE_SIZE: usize = 18;

/// Incremental disclosure over the past/present view. The page counter is
/// 1-based; the set of items handed to the sink so far is always exactly
/// the first `(page - 1) * PAGE_SIZE` items of the current view.
#[derive(Debug)]
pub struct Pager {
    page: usize,
    busy: bool,
}

impl Default for Pager {
    fn default() -> Self {
        Self {
            page: 1,
            busy: false,
        }
    }
}

impl Pager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Back to page 1. Callers reset the sink's group-key tracking in the
    /// same breath; see the recompute chain in `App::refresh_view`.
    pub fn reset(&mut self) {
        self.page = 1;
        self.busy = false;
    }

    /// Claim the advance guard for a multi-step disclosure (a year jump
    /// that loads several pages across await points). While held, other
    /// triggers are dropped rather than queued.
    pub fn try_begin(&mut self) -> bool {
        if self.busy {
            return false;
        }
        self.busy = true;
        true
    }

    pub fn finish(&mut self) {
        self.busy = false;
    }

    /// Hand the next page slice to the sink. An empty slice is the natural
    /// "no more data" terminal state and a no-op, not an error. Returns
    /// the number of items disclosed.
    pub fn load_next_page(&mut self, view: &[SeasonRecord], sink: &mut dyn RenderSink) -> usize {
        if self.busy {
            debug!("load_next_page dropped, disclosure already in flight");
            return 0;
        }
        self.busy = true;
        let count = self.load_next_page_locked(view, sink);
        self.busy = false;
        count
    }

    /// Variant for callers that already hold the guard via `try_begin`.
    pub fn load_next_page_locked(
        &mut self,
        view: &[SeasonRecord],
        sink: &mut dyn RenderSink,
    ) -> usize {
        let start = (self.page - 1) * PAGE_SIZE;
        let end = (start + PAGE_SIZE).min(view.len());
        if start >= end {
            return 0;
        }
        sink.render_batch(&view[start..end]);
        self.page += 1;
        end - start
    }

    /// View items covered by the disclosed pages. Overshoots the view
    /// length once a short final page has gone out; callers only compare
    /// against it, never index with it.
    pub fn loaded_count(&self) -> usize {
        (self.page - 1) * PAGE_SIZE
    }

    pub fn exhausted(&self, view_len: usize) -> bool {
        self.loaded_count() >= view_len
    }
}
