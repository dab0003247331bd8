use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem, Paragraph},
};

use super::rows::{ResultRows, Row};
use super::widgets::{format_rating, titled_block};

/// Render the scrollable results list: month headers with rating-ordered
/// cards underneath, and the upcoming strip at the top when present.
pub fn render_results_view(
    frame: &mut Frame,
    area: Rect,
    rows: &ResultRows,
    scroll_offset: usize,
    accent: Color,
) {
    let block = titled_block("Seasons", accent);
    let inner_height = area.height.saturating_sub(2) as usize;

    if rows.is_empty() {
        let empty = Paragraph::new("没有找到匹配的剧集")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let end = (scroll_offset + inner_height).min(rows.len());
    let items: Vec<ListItem> = rows.rows[scroll_offset..end]
        .iter()
        .map(|row| ListItem::new(render_row(row, accent)))
        .collect();

    frame.render_widget(List::new(items).block(block), area);
}

fn render_row<'a>(row: &'a Row, accent: Color) -> Line<'a> {
    match row {
        Row::UpcomingHeader => Line::from(Span::styled(
            "── 即将上映 ──",
            Style::default().fg(accent).add_modifier(Modifier::BOLD),
        )),
        Row::MonthHeader { year, month } => Line::from(Span::styled(
            format!("── {}年 {}月 ──", year, month),
            Style::default().fg(accent).add_modifier(Modifier::BOLD),
        )),
        Row::Card(record) => {
            let rating_style = if record.is_rated() {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            let mut spans = vec![
                Span::raw("  "),
                Span::styled(format!("{:<7}", format_rating(record.rating())), rating_style),
                Span::raw(" "),
                Span::raw(record.display_title()),
                Span::styled(
                    format!("  {}", record.air_date()),
                    Style::default().fg(Color::DarkGray),
                ),
            ];
            if record.season.douban_link_verified {
                spans.push(Span::styled(" 豆", Style::default().fg(Color::Green)));
            }
            Line::from(spans)
        }
    }
}
