// src/ui.rs
use crate::app::{App, FeedState};
use crate::pipeline::{MagnitudeBand, Marker};
use crate::widgets::magnitude_slider::MagnitudeSlider;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{
        Block, Borders, Clear, List, ListItem, Paragraph, Wrap,
        canvas::{Canvas, Circle, Map, MapResolution},
    },
};
use std::rc::Rc;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

pub const TITLE: &str = "Earthquake Visualizer";
pub const SUBTITLE: &str = "Recent earthquakes (past 24 hours) — USGS feed";
pub const DATA_SOURCE: &str = "Data source: USGS Earthquake Hazards Program (past day)";

/// Cuts `text` to at most `max_width` terminal columns, ending in '…' when shortened.
pub fn truncate_to_width(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }
    if max_width == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > max_width - 1 {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}

pub struct LayoutChunks {
    pub header_chunk: Rect,
    pub map_chunk: Rect,
    pub events_chunk: Rect,
    pub legend_chunk: Rect,
    pub hint_chunk: Rect,
}

pub fn compute_layout(frame_size: Rect) -> LayoutChunks {
    let main_chunks: Rc<[Rect]> = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Min(0), Constraint::Length(1)])
        .split(frame_size);

    let content_columns: Rc<[Rect]> = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
        .split(main_chunks[1]);

    let side_rows: Rc<[Rect]> = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(8)])
        .split(content_columns[1]);

    LayoutChunks {
        header_chunk: main_chunks[0],
        map_chunk: content_columns[0],
        events_chunk: side_rows[0],
        legend_chunk: side_rows[1],
        hint_chunk: main_chunks[2],
    }
}

fn map_block(app: &App) -> Block<'static> {
    let title = match &app.feed_state {
        FeedState::Loaded(_) => format!("Map ({} shown)", app.markers.len()),
        _ => "Map".to_string(),
    };
    Block::default().title(title).borders(Borders::ALL).border_style(Style::default().fg(Color::DarkGray))
}

/// Tells the camera how large the map panel is before anything is drawn.
pub fn prepare_ui_layout(app: &mut App, frame_size: Rect) {
    let layout_chunks: LayoutChunks = compute_layout(frame_size);
    let inner_area: Rect = map_block(app).inner(layout_chunks.map_chunk);
    app.map_view.set_area(inner_area);
}

/// Centered rectangle of `percent_x` by `height` rows inside `area`.
fn popup_area(area: Rect, percent_x: u16, height: u16) -> Rect {
    // u32 so wide terminals cannot overflow the product
    let width = (u32::from(area.width) * u32::from(percent_x.min(100)) / 100) as u16;
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn marker_row(marker: &Marker, width: usize) -> String {
    let text = format!("M{:<4} {}", marker.magnitude, marker.place);
    truncate_to_width(&text, width)
}

pub fn ui(f: &mut Frame, app: &mut App) {
    let layout_chunks: LayoutChunks = compute_layout(f.size());

    let default_style: Style = Style::default().fg(Color::White);
    let hint_style: Style = Style::default().fg(Color::DarkGray);
    let selected_item_style: Style = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);

    // =================================== Header ==================================================
    let header_block: Block = Block::default()
        .title(Span::styled(TITLE, Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)))
        .borders(Borders::ALL);
    let header_inner: Rect = header_block.inner(layout_chunks.header_chunk);
    f.render_widget(header_block, layout_chunks.header_chunk);

    let header_rows: Rc<[Rect]> = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1), Constraint::Length(1)])
        .split(header_inner);

    f.render_widget(Paragraph::new(SUBTITLE).style(hint_style), header_rows[0]);
    f.render_widget(MagnitudeSlider::new(app.threshold), header_rows[1]);

    let status_style: Style = match &app.feed_state {
        FeedState::Failed(_) => Style::default().fg(Color::Red),
        _ => default_style,
    };
    f.render_widget(Paragraph::new(app.status_text()).style(status_style), header_rows[2]);

    // =================================== Map =====================================================
    let ([west, east], [south, north]) = app.map_view.visible_bounds();
    let degrees_per_px: f64 = app.map_view.degrees_per_px();
    let markers: &[Marker] = &app.markers;
    let selected: Option<&Marker> = app.selected_marker();

    let map_widget = Canvas::default()
        .block(map_block(app))
        .marker(symbols::Marker::Braille)
        .x_bounds([west, east])
        .y_bounds([south, north])
        .paint(|ctx| {
            ctx.draw(&Map { color: Color::DarkGray, resolution: MapResolution::High });
            ctx.layer();
            for marker in markers {
                ctx.draw(&Circle {
                    x: marker.position.lon,
                    y: marker.position.lat,
                    radius: marker.radius * degrees_per_px,
                    color: marker.band.color(),
                });
            }
            if let Some(marker) = selected {
                ctx.print(
                    marker.position.lon,
                    marker.position.lat,
                    Line::from(vec![
                        Span::styled("◉ ", Style::default().fg(Color::White).add_modifier(Modifier::BOLD)),
                        Span::styled(marker.place.clone(), Style::default().fg(Color::White)),
                    ]),
                );
            }
        });
    f.render_widget(map_widget, layout_chunks.map_chunk);

    // =================================== Events list =============================================
    let events_block: Block = Block::default().title("Events").borders(Borders::ALL);
    let row_width: usize = usize::from(events_block.inner(layout_chunks.events_chunk).width).saturating_sub(3);
    let event_items: Vec<ListItem> = match &app.feed_state {
        FeedState::Pending => vec![ListItem::new("Loading…").style(hint_style)],
        FeedState::Failed(_) => vec![ListItem::new("No data").style(hint_style)],
        FeedState::Loaded(_) if app.markers.is_empty() => {
            vec![ListItem::new("No events at this magnitude").style(hint_style)]
        }
        FeedState::Loaded(_) => app
            .markers
            .iter()
            .map(|marker| {
                ListItem::new(marker_row(marker, row_width)).style(Style::default().fg(marker.band.color()))
            })
            .collect(),
    };
    let events_widget: List = List::new(event_items)
        .block(events_block)
        .highlight_style(selected_item_style)
        .highlight_symbol(">> ");
    f.render_stateful_widget(events_widget, layout_chunks.events_chunk, &mut app.markers_list_state);

    // =================================== Legend ==================================================
    let legend_lines: Vec<Line> = MagnitudeBand::ALL
        .iter()
        .map(|band| {
            Line::from(vec![
                Span::styled("● ", Style::default().fg(band.color())),
                Span::styled(band.legend_label(), default_style),
            ])
        })
        .collect();
    let legend_widget: Paragraph =
        Paragraph::new(legend_lines).block(Block::default().title("Magnitude").borders(Borders::ALL));
    f.render_widget(legend_widget, layout_chunks.legend_chunk);

    // =================================== Hint bar ================================================
    let hint_text: String = match app.selected_marker() {
        Some(marker) if !app.show_details => format!("{} | {} | [Enter] Details | [Q] Quit", marker.place, marker.tooltip()),
        _ => format!(
            "[←/→] Magnitude | [↑/↓] Select | [Enter] Details | [+/-/hjkl] Zoom/Pan | [F] Fit | [Q] Quit — {}",
            DATA_SOURCE
        ),
    };
    let hint_widget: Paragraph = Paragraph::new(truncate_to_width(&hint_text, usize::from(layout_chunks.hint_chunk.width)))
        .style(hint_style)
        .alignment(Alignment::Center);
    f.render_widget(hint_widget, layout_chunks.hint_chunk);

    // =================================== Detail popup ============================================
    if app.show_details {
        if let Some(marker) = app.selected_marker() {
            let lines: Vec<Line> = marker
                .detail_lines()
                .into_iter()
                .map(|(label, value)| {
                    Line::from(vec![
                        Span::styled(format!("{}: ", label), Style::default().add_modifier(Modifier::BOLD)),
                        Span::raw(value),
                    ])
                })
                .collect();
            let area: Rect = popup_area(f.size(), 60, lines.len() as u16 + 2);
            let popup: Paragraph = Paragraph::new(lines).wrap(Wrap { trim: true }).block(
                Block::default()
                    .title(Span::styled(marker.place.clone(), Style::default().fg(marker.band.color())))
                    .borders(Borders::ALL),
            );
            f.render_widget(Clear, area);
            f.render_widget(popup, area);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::AppEvent;
    use crate::map_view::CELL_WIDTH_PX;
    use crate::quake::{Epicenter, Feed, FeedURL, Quake, QuakeID};
    use chrono::Utc;
    use ratatui::{Terminal, backend::TestBackend};

    fn loaded_app() -> App {
        let quake = Quake::new(
            QuakeID::new("us7000"),
            Some(Epicenter::new(142.1, 38.3, Some(10.0))),
            Some(6.2),
            "off the east coast of Honshu, Japan".to_string(),
            None,
            Some("https://example.com/us7000".to_string()),
        );
        let feed = Feed::new(FeedURL::new("http://example.com/feed"), None, None, vec![quake]);
        let mut app = App::new();
        app.handle_event(AppEvent::FeedLoaded { feed, timestamp: Utc::now() });
        app
    }

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        buffer.content().iter().map(|cell| cell.symbol()).collect()
    }

    #[test]
    fn test_truncate_to_width() {
        assert_eq!(truncate_to_width("Honshu", 10), "Honshu");
        assert_eq!(truncate_to_width("Honshu, Japan", 8), "Honshu,…");
        assert_eq!(truncate_to_width("abc", 0), "");
        assert_eq!(truncate_to_width("日本の地震", 5), "日本…");
    }

    #[test]
    fn test_popup_area_on_very_wide_terminal() {
        let area = Rect::new(0, 0, 2000, 50);
        let popup = popup_area(area, 60, 7);
        assert_eq!(popup.width, 1200);
        assert_eq!(popup.x, 400);
        assert_eq!(popup.height, 7);
        assert_eq!(popup.y, 21);
    }

    #[test]
    fn test_prepare_layout_sizes_camera() {
        let mut app = App::new();
        prepare_ui_layout(&mut app, Rect::new(0, 0, 100, 40));
        let map_inner = map_block(&app).inner(compute_layout(Rect::new(0, 0, 100, 40)).map_chunk);
        assert_eq!(app.map_view.size_px().0, f64::from(map_inner.width) * CELL_WIDTH_PX);
    }

    #[test]
    fn test_draw_loaded_feed() {
        let mut app = loaded_app();
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        prepare_ui_layout(&mut app, Rect::new(0, 0, 120, 40));
        terminal.draw(|f| ui(f, &mut app)).unwrap();

        let text = buffer_text(&terminal);
        assert!(text.contains(TITLE));
        assert!(text.contains("Minimum magnitude: 0.0"));
        assert!(text.contains("Loaded 1 events"));
        assert!(text.contains("Map (1 shown)"));
    }

    #[test]
    fn test_draw_error_state() {
        let mut app = App::new();
        app.handle_event(AppEvent::FeedFailed { reason: "timed out".to_string(), timestamp: Utc::now() });
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| ui(f, &mut app)).unwrap();

        let text = buffer_text(&terminal);
        assert!(text.contains("Error: timed out"));
        assert!(text.contains("No data"));
    }

    #[test]
    fn test_draw_details_popup() {
        let mut app = loaded_app();
        app.toggle_details();
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        terminal.draw(|f| ui(f, &mut app)).unwrap();

        let text = buffer_text(&terminal);
        assert!(text.contains("Magnitude: 6.2"));
        assert!(text.contains("Depth: 10 km"));
    }
}
