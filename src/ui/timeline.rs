use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::List,
    widgets::ListItem,
};

use crate::pipeline::YearMark;

use super::widgets::titled_block;

/// Year navigation sidebar: only the visible window of marks is shown,
/// the active one highlighted, the keyboard cursor underlined.
pub fn render_timeline_view(
    frame: &mut Frame,
    area: Rect,
    marks: &[YearMark],
    active: Option<YearMark>,
    cursor: usize,
    accent: Color,
) {
    let items: Vec<ListItem> = marks
        .iter()
        .enumerate()
        .map(|(i, mark)| {
            let is_active = Some(*mark) == active;
            let dot = if is_active { "●" } else { "○" };
            let mut style = if is_active {
                Style::default().fg(accent).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            if i == cursor {
                style = style.add_modifier(Modifier::UNDERLINED);
            }
            ListItem::new(Line::from(Span::styled(
                format!("{} {}", dot, mark),
                style,
            )))
        })
        .collect();

    frame.render_widget(List::new(items).block(titled_block("Years", accent)), area);
}
