use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Tabs},
};
use unicode_width::UnicodeWidthStr;

use crate::search::Tab;
use crate::tui::state::{HitAreas, RenderPlan, RowPlan, TuiApp, build_render_plan, truncate_display};
use crate::tui::theme::Theme;

const TAB_DIVIDER: &str = " | ";

impl TuiApp {
    pub fn view(&mut self, f: &mut Frame) {
        let size = f.area();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Header
                Constraint::Length(3), // Input
                Constraint::Length(1), // Tabs
                Constraint::Min(3),    // Dropdown
                Constraint::Length(1), // Footer
            ])
            .split(size);

        let plan = build_render_plan(
            &self.title,
            &self.controller,
            self.selected.as_ref(),
            self.spinner_state,
            size.width,
        );

        let mut hit = HitAreas {
            input: chunks[1],
            ..HitAreas::default()
        };

        f.render_widget(
            Paragraph::new(plan.header.clone()).style(self.theme.header_style),
            chunks[0],
        );
        self.render_input(f, chunks[1], &plan);
        hit.tabs = render_tabs(f, chunks[2], &plan, &self.theme);
        hit.rows = self.render_dropdown(f, chunks[3], &plan);
        f.render_widget(
            Paragraph::new(plan.footer.clone()).style(self.theme.footer_style),
            chunks[4],
        );

        self.hit = hit;
    }

    fn render_input(&self, f: &mut Frame, area: Rect, plan: &RenderPlan) {
        let style = if plan.show_placeholder {
            self.theme.placeholder_style
        } else {
            self.theme.input_style
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!("Symbol ({})", self.controller.session().active_market));
        let inner_width = area.width.saturating_sub(2) as usize;
        let text = truncate_display(&plan.input_text, inner_width);
        f.render_widget(Paragraph::new(text).style(style).block(block), area);

        let typed = if plan.show_placeholder {
            0
        } else {
            cursor_column(&plan.input_text, inner_width)
        };
        f.set_cursor_position(Position::new(
            area.x + 1 + typed.min(area.width.saturating_sub(3)),
            area.y + 1,
        ));
    }

    /// Returns the list's inner area and scroll offset when rows were drawn.
    fn render_dropdown(&mut self, f: &mut Frame, area: Rect, plan: &RenderPlan) -> Option<(Rect, usize)> {
        if !self.controller.session().is_open {
            let hint = Paragraph::new("Press ↓ or start typing to search")
                .style(self.theme.muted_style);
            f.render_widget(hint, area);
            return None;
        }

        let block = Block::default().borders(Borders::ALL).title(plan.status.clone());
        f.render_widget(Clear, area);

        if let Some(message) = &plan.message {
            f.render_widget(
                Paragraph::new(message.clone())
                    .style(self.theme.muted_style)
                    .block(block),
                area,
            );
            return None;
        }

        let inner = block.inner(area);
        let items: Vec<ListItem> = plan
            .rows
            .iter()
            .map(|row| ListItem::new(row_line(row, inner.width, &self.theme)))
            .collect();
        let list = List::new(items)
            .block(block)
            .style(self.theme.row_style)
            .highlight_style(self.theme.row_selected_style);

        self.list_state.select(plan.highlighted);
        f.render_stateful_widget(list, area, &mut self.list_state);
        Some((inner, self.list_state.offset()))
    }
}

fn render_tabs(f: &mut Frame, area: Rect, plan: &RenderPlan, theme: &Theme) -> Vec<(Rect, Tab)> {
    let tabs = Tabs::new(Tab::ALL.iter().map(|t| t.title()))
        .select(plan.tab_index)
        .style(theme.tab_style)
        .highlight_style(theme.tab_selected_style)
        .divider(TAB_DIVIDER)
        .padding("", "");
    f.render_widget(tabs, area);
    tab_regions(area)
}

/// Mirrors how `Tabs` lays out titles with no padding and `TAB_DIVIDER`.
pub fn tab_regions(area: Rect) -> Vec<(Rect, Tab)> {
    let mut regions = Vec::new();
    let mut x = area.x;
    let right = area.x.saturating_add(area.width);
    for tab in Tab::ALL {
        if x >= right {
            break;
        }
        let width = (tab.title().len() as u16).min(right - x);
        regions.push((Rect::new(x, area.y, width, 1), tab));
        x = x.saturating_add(width + TAB_DIVIDER.len() as u16);
    }
    regions
}

/// Display columns taken by the visible part of the typed query.
fn cursor_column(text: &str, max: usize) -> u16 {
    UnicodeWidthStr::width(truncate_display(text, max).as_str()) as u16
}

fn row_line(row: &RowPlan, width: u16, theme: &Theme) -> Line<'static> {
    let w = width as usize;
    let symbol = format!("{:<20}", truncate_display(&row.symbol, 20));
    let exchange = format!("{:>8}", truncate_display(&row.exchange, 8));
    // badge + spaces + symbol + exchange
    let fixed = 6 + 1 + 20 + 1 + 8;
    let desc_width = w.saturating_sub(fixed + 1);
    let description = format!(
        "{:<desc_width$}",
        truncate_display(&row.description, desc_width)
    );
    Line::from(vec![
        Span::styled(format!("[{:<3}] ", row.badge), theme.badge_style),
        Span::styled(symbol, Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(" "),
        Span::raw(description),
        Span::raw(" "),
        Span::styled(exchange, theme.muted_style),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tab_regions_follow_strip_order() {
        let regions = tab_regions(Rect::new(0, 5, 200, 1));
        assert_eq!(regions.len(), Tab::ALL.len());
        assert_eq!(regions[0], (Rect::new(0, 5, 3, 1), Tab::All));
        // "All" + " | "
        assert_eq!(regions[1].0.x, 6);
        assert_eq!(regions[1].1, Tab::Stocks);
    }

    #[test]
    fn tab_regions_clip_to_narrow_area() {
        let regions = tab_regions(Rect::new(0, 0, 12, 1));
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[1].0.width, 6);
    }

    #[test]
    fn cursor_column_counts_display_width() {
        assert_eq!(cursor_column("RELI", 40), 4);
        assert_eq!(cursor_column("日経", 40), 4);
        assert_eq!(cursor_column("日経平均", 5), 4);
    }

    #[test]
    fn row_line_pads_columns() {
        let row = RowPlan {
            badge: "STK".into(),
            symbol: "NSE:RELIANCE".into(),
            description: "Reliance Industries".into(),
            exchange: "NSE".into(),
        };
        let line = row_line(&row, 80, &Theme::dark());
        let text: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
        assert!(text.starts_with("[STK] NSE:RELIANCE"));
        assert!(text.ends_with("     NSE"));
    }
}
