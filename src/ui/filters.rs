use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem},
};

use crate::config::Config;
use crate::pipeline::FilterSelection;

use super::widgets::titled_block;

/// Curated facet lists in display order, mirroring the upstream site.
/// The second genre element is the actual tag value in the dataset.
pub const GENRE_OPTIONS: &[(&str, &str)] = &[
    ("剧情", "剧情"),
    ("喜剧", "喜剧"),
    ("悬疑", "悬疑"),
    ("犯罪", "犯罪"),
    ("动作冒险", "动作冒险"),
    ("科幻|奇幻", "Sci-Fi & Fantasy"),
    ("儿童", "儿童"),
    ("动画", "动画"),
];

pub const NETWORK_OPTIONS: &[&str] = &[
    "Netflix",
    "Apple TV",
    "Hulu",
    "Disney",
    "Paramount",
    "HBO",
    "ABC",
];

/// One selectable line of the filter panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterEntry {
    Special,
    Rating,
    AllGenres,
    Genre(usize),
    AllNetworks,
    Network(usize),
    Source,
}

pub fn filter_entries() -> Vec<FilterEntry> {
    let mut entries = vec![FilterEntry::Special, FilterEntry::Rating, FilterEntry::AllGenres];
    entries.extend((0..GENRE_OPTIONS.len()).map(FilterEntry::Genre));
    entries.push(FilterEntry::AllNetworks);
    entries.extend((0..NETWORK_OPTIONS.len()).map(FilterEntry::Network));
    entries.push(FilterEntry::Source);
    entries
}

pub fn render_filters_view(
    frame: &mut Frame,
    area: Rect,
    selection: &FilterSelection,
    config: &Config,
    cursor: usize,
    accent: Color,
) {
    let entries = filter_entries();
    let items: Vec<ListItem> = entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let (label, on) = entry_label(entry, selection, config);
            let marker = if on { "[x]" } else { "[ ]" };
            let mut style = if on {
                Style::default().fg(accent)
            } else {
                Style::default().fg(Color::Gray)
            };
            if i == cursor {
                style = style.add_modifier(Modifier::REVERSED);
            }
            ListItem::new(Line::from(Span::styled(
                format!("{} {}", marker, label),
                style,
            )))
        })
        .collect();

    frame.render_widget(List::new(items).block(titled_block("Filters", accent)), area);
}

fn entry_label(
    entry: &FilterEntry,
    selection: &FilterSelection,
    config: &Config,
) -> (String, bool) {
    match entry {
        FilterEntry::Special => ("豆瓣高分 (recent high-rated)".to_string(), selection.special.is_some()),
        FilterEntry::Rating => (
            format!("Rating: {}", selection.rating.as_display()),
            selection.rating != crate::pipeline::RatingFilter::All,
        ),
        FilterEntry::AllGenres => ("Genres: 全部".to_string(), selection.genres.is_empty()),
        FilterEntry::Genre(i) => {
            let (display, value) = GENRE_OPTIONS[*i];
            (
                format!("  {}", display),
                selection.genres.iter().any(|g| g == value),
            )
        }
        FilterEntry::AllNetworks => ("Networks: 全部".to_string(), selection.networks.is_empty()),
        FilterEntry::Network(i) => {
            let name = NETWORK_OPTIONS[*i];
            (
                format!("  {}", name),
                selection.networks.iter().any(|n| n == name),
            )
        }
        FilterEntry::Source => {
            let name = config
                .sources
                .get(selection.source)
                .map(|s| s.name.as_str())
                .unwrap_or("?");
            (format!("Region: {}", name), true)
        }
    }
}
