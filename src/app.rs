use std::collections::HashMap;
use std::io;
use std::time::{Duration, Instant};

use chrono::Local;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::{
    DefaultTerminal, Frame,
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::catalog::{self, Dataset, SeasonRecord};
use crate::config::Config;
use crate::error::Result;
use crate::fetch::Fetcher;
use crate::pipeline::{
    CatalogView, FilterSelection, Pager, RenderSink, ScrollTarget, Timeline, YearMark,
    ensure_year_loaded, filter, partition_and_sort,
};
use crate::ui::filters::{FilterEntry, GENRE_OPTIONS, NETWORK_OPTIONS, filter_entries};
use crate::ui::rows::ResultRows;
use crate::ui::{render_filters_view, render_results_view, render_timeline_view, widgets};

/// Quiet period before a scroll position change is resynchronized with
/// the timeline.
const SCROLL_DEBOUNCE: Duration = Duration::from_millis(50);

/// Start loading the next page when the viewport gets this close to the
/// bottom of the rendered rows.
const AUTO_LOAD_MARGIN: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum View {
    Browse,
    Filters,
}

pub enum AppMessage {
    DatasetLoaded {
        source: String,
        dataset: Dataset,
        complete: bool,
    },
    DatasetFailed {
        source: String,
        error: String,
    },
}

pub struct App {
    pub config: Config,
    pub running: bool,
    pub view: View,
    pub accent: Color,

    /// Working season set for the active source, replaced wholesale on
    /// every load; never merged.
    all_seasons: Vec<SeasonRecord>,
    /// Normalized datasets per source, kept so a stale background load or
    /// a region switch does not refetch.
    source_cache: HashMap<String, Vec<SeasonRecord>>,
    pub selection: FilterSelection,

    catalog_view: CatalogView,
    pager: Pager,
    timeline: Timeline,
    rows: ResultRows,

    scroll_offset: usize,
    viewport_height: usize,
    timeline_cursor: usize,
    filter_cursor: usize,
    pending_sync_at: Option<Instant>,

    status: Option<String>,
    last_updated: Option<String>,
    initial_loading: bool,

    msg_tx: mpsc::UnboundedSender<AppMessage>,
    msg_rx: mpsc::UnboundedReceiver<AppMessage>,
    fetcher: Fetcher,
}

impl App {
    pub fn new(config: Config) -> Self {
        let accent = widgets::parse_accent_color(&config.ui.accent_color);
        let (msg_tx, msg_rx) = mpsc::unbounded_channel();

        Self {
            config,
            running: true,
            view: View::Browse,
            accent,
            all_seasons: Vec::new(),
            source_cache: HashMap::new(),
            selection: FilterSelection::default(),
            catalog_view: CatalogView::default(),
            pager: Pager::new(),
            timeline: Timeline::new(),
            rows: ResultRows::default(),
            scroll_offset: 0,
            viewport_height: 0,
            timeline_cursor: 0,
            filter_cursor: 0,
            pending_sync_at: None,
            status: None,
            last_updated: None,
            initial_loading: true,
            msg_tx,
            msg_rx,
            fetcher: Fetcher::new(),
        }
    }

    /// Replace the dataset with a locally supplied document (file import).
    /// A parse failure upstream never reaches here; the prior state stays
    /// untouched in that case.
    pub fn import_dataset(&mut self, dataset: Dataset, label: &str) {
        self.take_last_updated(&dataset);
        let records = catalog::normalize(&dataset);
        self.all_seasons = records;
        self.initial_loading = false;
        self.refresh_view();
        self.status = Some(format!("已加载文件: {}", label));
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status = Some(message.into());
    }

    pub async fn run(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        if self.all_seasons.is_empty() {
            self.spawn_initial_fetch();
        }

        while self.running {
            terminal.draw(|frame| self.render(frame))?;
            self.handle_events()?;
            self.process_messages();
            self.run_pending_sync();
        }
        Ok(())
    }

    fn active_source_name(&self) -> String {
        self.config
            .sources
            .get(self.selection.source)
            .map(|s| s.name.clone())
            .unwrap_or_default()
    }

    // ---- derived-state recomputation ----

    /// The one place the recompute chain lives, in its fixed order:
    /// filter, partition/sort, pager reset, year index, timeline render.
    /// Every mutation of the season set or the selection funnels through
    /// here.
    fn refresh_view(&mut self) {
        let today = Local::now().date_naive();
        let special = self.selection.special.is_some();

        let filtered = filter::apply(&self.all_seasons, &self.selection, today);
        self.catalog_view = partition_and_sort(filtered, today, special);

        self.pager.reset();
        self.rows.reset(!special);
        self.rows.set_upcoming(&self.catalog_view.future);
        self.timeline.rebuild(&self.catalog_view);

        self.scroll_offset = 0;
        self.timeline_cursor = 0;
        self.pending_sync_at = None;

        if !self.timeline.is_empty() {
            self.pager
                .load_next_page(&self.catalog_view.past_and_present, &mut self.rows);
        }
        // Unconditional: an emptied view must also empty the sidebar, or a
        // stale mark could be jumped to.
        self.rows
            .render_timeline(self.timeline.visible_marks(), self.timeline.active());
    }

    /// Fold in the complete dataset without touching what is already on
    /// screen: season set and derived view are replaced, the year index
    /// is recomputed, but rendered rows and the pagination cursor stay.
    fn assimilate(&mut self, records: Vec<SeasonRecord>) {
        let today = Local::now().date_naive();
        let special = self.selection.special.is_some();

        self.all_seasons = records;
        let filtered = filter::apply(&self.all_seasons, &self.selection, today);
        self.catalog_view = partition_and_sort(filtered, today, special);

        self.timeline.assimilate(&self.catalog_view);
        self.rows
            .render_timeline(self.timeline.visible_marks(), self.timeline.active());
        self.status = Some("完整数据已加载".to_string());
        info!(
            seasons = self.all_seasons.len(),
            "Assimilated complete dataset"
        );
    }

    fn take_last_updated(&mut self, dataset: &Dataset) {
        if let Some(meta) = &dataset.metadata {
            if let Some(ts) = &meta.last_updated {
                self.last_updated = Some(ts.chars().take(10).collect());
            }
        }
    }

    // ---- background loads ----

    fn spawn_initial_fetch(&mut self) {
        let Some(source) = self.config.sources.get(self.selection.source).cloned() else {
            self.status = Some("没有配置数据源".to_string());
            return;
        };
        self.initial_loading = true;
        let fetcher = self.fetcher.clone();
        let tx = self.msg_tx.clone();
        tokio::spawn(async move {
            match fetcher.fetch_initial(&source).await {
                Ok(dataset) => {
                    let _ = tx.send(AppMessage::DatasetLoaded {
                        source: source.name.clone(),
                        dataset,
                        complete: false,
                    });
                }
                Err(e) => {
                    let _ = tx.send(AppMessage::DatasetFailed {
                        source: source.name.clone(),
                        error: e.to_string(),
                    });
                }
            }
        });
    }

    /// Silent background load of the full document. Failure is logged and
    /// the latest dataset simply stays in use.
    fn spawn_complete_fetch(&self) {
        let Some(source) = self.config.sources.get(self.selection.source).cloned() else {
            return;
        };
        let fetcher = self.fetcher.clone();
        let tx = self.msg_tx.clone();
        tokio::spawn(async move {
            match fetcher.fetch_complete(&source).await {
                Ok(dataset) => {
                    let _ = tx.send(AppMessage::DatasetLoaded {
                        source: source.name.clone(),
                        dataset,
                        complete: true,
                    });
                }
                Err(e) => {
                    warn!(source = %source.name, error = %e, "Background dataset load failed");
                }
            }
        });
    }

    fn process_messages(&mut self) {
        while let Ok(msg) = self.msg_rx.try_recv() {
            match msg {
                AppMessage::DatasetLoaded {
                    source,
                    dataset,
                    complete,
                } => {
                    let records = catalog::normalize(&dataset);
                    if source != self.active_source_name() {
                        // Stale response after a source switch: keep it
                        // for later activation instead of dropping it.
                        info!(source = %source, "Caching dataset for inactive source");
                        self.source_cache.insert(source, records);
                    } else if complete {
                        self.source_cache.insert(source, records.clone());
                        self.assimilate(records);
                    } else {
                        self.take_last_updated(&dataset);
                        self.source_cache.insert(source, records.clone());
                        self.all_seasons = records;
                        self.initial_loading = false;
                        self.refresh_view();
                        self.spawn_complete_fetch();
                    }
                }
                AppMessage::DatasetFailed { source, error } => {
                    error!(source = %source, error = %error, "Dataset load failed");
                    if source == self.active_source_name() {
                        // Terminal for the initial load; the placeholder
                        // state stays, nothing partial is rendered.
                        self.status = Some("加载数据失败或文件格式无效。".to_string());
                        self.initial_loading = false;
                    }
                }
            }
        }
    }

    // ---- input ----

    fn handle_events(&mut self) -> Result<()> {
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    return Ok(());
                }
                if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
                    self.running = false;
                    return Ok(());
                }
                match self.view {
                    View::Browse => self.handle_browse_input(key.code),
                    View::Filters => self.handle_filters_input(key.code),
                }
            }
        }
        Ok(())
    }

    fn handle_browse_input(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('q') => self.running = false,
            KeyCode::Char('j') | KeyCode::Down => self.scroll_by(1),
            KeyCode::Char('k') | KeyCode::Up => self.scroll_by(-1),
            KeyCode::Char('d') | KeyCode::PageDown => {
                self.scroll_by(self.viewport_height as isize)
            }
            KeyCode::Char('u') | KeyCode::PageUp => {
                self.scroll_by(-(self.viewport_height as isize))
            }
            KeyCode::Char('g') | KeyCode::Home => {
                self.scroll_offset = 0;
                self.pending_sync_at = Some(Instant::now());
            }
            KeyCode::Char('G') | KeyCode::End => {
                self.scroll_offset = self.rows.len().saturating_sub(1);
                self.pending_sync_at = Some(Instant::now());
            }
            KeyCode::Char('h') | KeyCode::Left => self.move_timeline_cursor(-1),
            KeyCode::Char('l') | KeyCode::Right => self.move_timeline_cursor(1),
            KeyCode::Enter => {
                let marks = self.rows.timeline.0.clone();
                if let Some(mark) = marks.get(self.timeline_cursor).copied() {
                    self.jump_to_year(mark);
                }
            }
            KeyCode::Char('s') => {
                self.selection.toggle_special();
                self.refresh_view();
            }
            KeyCode::Char('r') => {
                self.selection.rating = self.selection.rating.next();
                self.refresh_view();
            }
            KeyCode::Tab => self.switch_source(),
            KeyCode::Char('f') => self.view = View::Filters,
            _ => {}
        }
    }

    fn handle_filters_input(&mut self, key: KeyCode) {
        let entries = filter_entries();
        match key {
            KeyCode::Char('q') => self.running = false,
            KeyCode::Char('f') | KeyCode::Esc => self.view = View::Browse,
            KeyCode::Char('j') | KeyCode::Down => {
                self.filter_cursor = (self.filter_cursor + 1).min(entries.len() - 1);
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.filter_cursor = self.filter_cursor.saturating_sub(1);
            }
            KeyCode::Char(' ') | KeyCode::Enter => {
                if let Some(entry) = entries.get(self.filter_cursor) {
                    self.toggle_filter_entry(*entry);
                    self.refresh_view();
                }
            }
            _ => {}
        }
    }

    fn toggle_filter_entry(&mut self, entry: FilterEntry) {
        match entry {
            FilterEntry::Special => self.selection.toggle_special(),
            FilterEntry::Rating => self.selection.rating = self.selection.rating.next(),
            FilterEntry::AllGenres => self.selection.clear_genres(),
            FilterEntry::Genre(i) => self.selection.toggle_genre(GENRE_OPTIONS[i].1),
            FilterEntry::AllNetworks => self.selection.clear_networks(),
            FilterEntry::Network(i) => self.selection.toggle_network(NETWORK_OPTIONS[i]),
            FilterEntry::Source => self.switch_source(),
        }
    }

    fn switch_source(&mut self) {
        if self.config.sources.len() <= 1 {
            return;
        }
        self.selection.source = (self.selection.source + 1) % self.config.sources.len();
        let name = self.active_source_name();
        info!(source = %name, "Switched dataset source");
        if let Some(records) = self.source_cache.get(&name).cloned() {
            self.all_seasons = records;
            self.initial_loading = false;
            self.refresh_view();
        } else {
            self.spawn_initial_fetch();
        }
        self.status = Some(format!("Region: {}", name));
    }

    // ---- scrolling & synchronization ----

    fn scroll_by(&mut self, delta: isize) {
        let max = self.rows.len().saturating_sub(1);
        let next = self.scroll_offset.saturating_add_signed(delta).min(max);
        if next != self.scroll_offset {
            self.scroll_offset = next;
            self.pending_sync_at = Some(Instant::now());
        }
    }

    /// Debounced tail of a scroll burst: resynchronize the timeline and
    /// auto-load the next page when near the bottom.
    fn run_pending_sync(&mut self) {
        let Some(at) = self.pending_sync_at else {
            return;
        };
        if at.elapsed() < SCROLL_DEBOUNCE {
            return;
        }
        self.pending_sync_at = None;

        self.sync_timeline();

        let near_bottom = self.scroll_offset + self.viewport_height + AUTO_LOAD_MARGIN
            >= self.rows.len();
        if near_bottom && !self.pager.exhausted(self.catalog_view.past_and_present.len()) {
            let loaded = self
                .pager
                .load_next_page(&self.catalog_view.past_and_present, &mut self.rows);
            if loaded > 0 {
                self.sync_timeline();
            }
        }
    }

    fn sync_timeline(&mut self) {
        let band = (self.viewport_height * 2 / 5).max(1);
        let top = self.rows.top_visible_mark(self.scroll_offset, band);
        if self.timeline.sync(top, Instant::now()) {
            self.rows
                .render_timeline(self.timeline.visible_marks(), self.timeline.active());
            self.clamp_timeline_cursor();
        }
    }

    fn move_timeline_cursor(&mut self, delta: isize) {
        let len = self.rows.timeline.0.len();
        if len == 0 {
            return;
        }
        self.timeline_cursor = self
            .timeline_cursor
            .saturating_add_signed(delta)
            .min(len - 1);
    }

    fn clamp_timeline_cursor(&mut self) {
        let len = self.rows.timeline.0.len();
        self.timeline_cursor = self.timeline_cursor.min(len.saturating_sub(1));
    }

    /// Explicit year jump: mark the target active right away, load pages
    /// until its first item exists, scroll there, and speculatively
    /// preload the following year. Scroll sync stays suppressed for the
    /// cool-down so it cannot fight the jump.
    fn jump_to_year(&mut self, mark: YearMark) {
        let now = Instant::now();
        self.timeline.select(mark);
        self.timeline.begin_programmatic_scroll(now);
        self.rows
            .render_timeline(self.timeline.visible_marks(), Some(mark));
        self.clamp_timeline_cursor();

        if self.pager.try_begin() {
            let found = ensure_year_loaded(
                mark,
                &self.catalog_view.past_and_present,
                &mut self.pager,
                &mut self.rows,
            );
            if found {
                let target = match mark {
                    YearMark::Upcoming => ScrollTarget::Upcoming,
                    YearMark::Year(y) => ScrollTarget::Year(y),
                };
                self.rows.scroll_to(target);
            }
            if let Some(next) = self.timeline.next_after(mark) {
                // Lookahead only; no scroll for the preloaded year.
                ensure_year_loaded(
                    next,
                    &self.catalog_view.past_and_present,
                    &mut self.pager,
                    &mut self.rows,
                );
            }
            self.pager.finish();
        }

        if let Some(target) = self.rows.scroll_request.take() {
            if let Some(index) = self.rows.target_index(target) {
                self.scroll_offset = index;
            }
        }
    }

    // ---- rendering ----

    fn render(&mut self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(3),
                Constraint::Length(1),
            ])
            .split(frame.area());

        self.render_title(frame, chunks[0]);
        self.viewport_height = chunks[1].height.saturating_sub(2) as usize;

        match self.view {
            View::Browse => {
                let cols = Layout::default()
                    .direction(Direction::Horizontal)
                    .constraints([Constraint::Min(40), Constraint::Length(16)])
                    .split(chunks[1]);

                render_results_view(frame, cols[0], &self.rows, self.scroll_offset, self.accent);
                let (marks, active) = &self.rows.timeline;
                render_timeline_view(
                    frame,
                    cols[1],
                    marks,
                    *active,
                    self.timeline_cursor,
                    self.accent,
                );
            }
            View::Filters => {
                render_filters_view(
                    frame,
                    chunks[1],
                    &self.selection,
                    &self.config,
                    self.filter_cursor,
                    self.accent,
                );
            }
        }

        let hints: &[(&str, &str)] = match self.view {
            View::Browse => &[
                ("j/k", "scroll"),
                ("h/l+Enter", "year"),
                ("f", "filters"),
                ("r", "rating"),
                ("s", "高分"),
                ("Tab", "region"),
                ("q", "quit"),
            ],
            View::Filters => &[
                ("j/k", "move"),
                ("Space", "toggle"),
                ("Esc", "back"),
                ("q", "quit"),
            ],
        };
        frame.render_widget(widgets::help_bar(hints), chunks[2]);
    }

    fn render_title(&self, frame: &mut Frame, area: ratatui::layout::Rect) {
        let mut spans = vec![Span::styled(
            " terebi ",
            Style::default().fg(self.accent),
        )];
        if let Some(updated) = &self.last_updated {
            spans.push(Span::styled(
                format!("updated {} ", updated),
                Style::default().fg(Color::DarkGray),
            ));
        }
        if self.initial_loading {
            spans.push(Span::styled(
                "加载中...",
                Style::default().fg(Color::Yellow),
            ));
        } else if let Some(status) = &self.status {
            spans.push(Span::styled(
                status.clone(),
                Style::default().fg(Color::DarkGray),
            ));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }
}

pub fn init_terminal() -> io::Result<DefaultTerminal> {
    crossterm::terminal::enable_raw_mode()?;
    crossterm::execute!(io::stdout(), crossterm::terminal::EnterAlternateScreen)?;
    Ok(ratatui::init())
}

pub fn restore_terminal() -> io::Result<()> {
    ratatui::restore();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::test_support::{record, show};
    use crate::pipeline::RatingFilter;

    fn app_with_seasons(records: Vec<SeasonRecord>) -> App {
        let mut app = App::new(Config::default());
        app.all_seasons = records;
        app.initial_loading = false;
        app.refresh_view();
        app
    }

    fn seasons_over_years() -> Vec<SeasonRecord> {
        let s = show(1, "Show", &["剧情"], &["HBO"]);
        let mut all = Vec::new();
        let mut n = 0;
        for year in [2025, 2024, 2023, 2022] {
            for month in [9, 5, 2] {
                for _ in 0..3 {
                    n += 1;
                    all.push(record(
                        &s,
                        n,
                        &format!("{}-{:02}-10", year, month),
                        Some(7.0),
                    ));
                }
            }
        }
        all
    }

    #[test]
    fn test_refresh_runs_full_chain() {
        let app = app_with_seasons(seasons_over_years());
        // 2025-09 entries are future relative to any plausible test date
        // only if today < 2025-09; the chain itself is what we check here.
        assert_eq!(app.pager.loaded_count(), 18);
        assert!(!app.rows.is_empty());
        assert!(!app.timeline.is_empty());
        assert_eq!(app.scroll_offset, 0);
    }

    #[test]
    fn test_filter_change_resets_pagination_and_rows() {
        let mut app = app_with_seasons(seasons_over_years());
        app.selection.rating = RatingFilter::AtLeast(9);
        app.refresh_view();
        assert_eq!(app.pager.loaded_count(), 0);
        assert!(app.rows.is_empty());
        assert!(app.timeline.is_empty());
    }

    #[test]
    fn test_emptying_filter_clears_timeline_sidebar() {
        let mut app = app_with_seasons(seasons_over_years());
        assert!(!app.rows.timeline.0.is_empty());

        app.selection.rating = RatingFilter::AtLeast(9);
        app.refresh_view();

        // The rendered sidebar empties with the index; no stale marks
        // survive for a jump to pick up.
        assert!(app.timeline.is_empty());
        assert!(app.rows.timeline.0.is_empty());
        assert_eq!(app.rows.timeline.1, None);
    }

    #[test]
    fn test_jump_to_year_loads_and_scrolls() {
        let mut app = app_with_seasons(seasons_over_years());
        app.jump_to_year(YearMark::Year(2023));
        assert_eq!(app.timeline.active(), Some(YearMark::Year(2023)));
        // Enough pages for 2023's first item, plus the 2022 lookahead.
        let first_2023 = crate::pipeline::first_index_of_year(
            &app.catalog_view.past_and_present,
            2023,
        )
        .unwrap();
        assert!(app.pager.loaded_count() > first_2023);
        assert!(app.scroll_offset > 0);
    }

    #[test]
    fn test_jump_suppresses_scroll_sync() {
        let mut app = app_with_seasons(seasons_over_years());
        app.jump_to_year(YearMark::Year(2023));
        let active = app.timeline.active();

        // A scroll burst right after the jump must not steal the active
        // mark back.
        app.scroll_offset = 0;
        app.sync_timeline();
        assert_eq!(app.timeline.active(), active);
    }

    #[test]
    fn test_assimilate_preserves_rendered_rows() {
        let mut app = app_with_seasons(seasons_over_years());
        let rows_before = app.rows.len();
        let loaded_before = app.pager.loaded_count();

        let s = show(2, "New Show", &["剧情"], &["HBO"]);
        let mut bigger = seasons_over_years();
        bigger.push(record(&s, 1, "2019-03-10", Some(8.0)));
        app.assimilate(bigger);

        assert_eq!(app.rows.len(), rows_before);
        assert_eq!(app.pager.loaded_count(), loaded_before);
        assert!(app.timeline.marks().contains(&YearMark::Year(2019)));
    }

    #[test]
    fn test_import_replaces_dataset() {
        let mut app = app_with_seasons(seasons_over_years());
        let doc = r#"{ "shows": [ {
            "id": 7, "name": "Imported", "original_name": "Imported",
            "genres": [], "networks": [],
            "seasons": [ { "air_date": "2024-02-01", "season_number": 1, "name": "Season 1", "douban_rating": 8.0 } ]
        } ] }"#;
        let dataset = Dataset::parse(doc).unwrap();
        app.import_dataset(dataset, "local.json");
        assert_eq!(app.all_seasons.len(), 1);
        assert_eq!(app.timeline.marks(), &[YearMark::Year(2024)]);
    }
}
