//! TUI rendering functions.

use std::ops::Range;

use pvligne_core::mention;
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use unicode_width::UnicodeWidthStr;

use super::text_layout;
use crate::app::{App, Field};
use crate::autocomplete::panel;

const MENTION_STYLE: Style = Style::new().fg(Color::Cyan).add_modifier(Modifier::BOLD);

fn to_u16(n: usize) -> u16 {
    u16::try_from(n).unwrap_or(u16::MAX)
}

/// Draw the full UI. Records field and panel areas for pointer hit testing.
pub fn draw(frame: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Header
            Constraint::Min(8),    // Form
            Constraint::Length(6), // Preview
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    draw_header(frame, chunks[0]);
    draw_fields(frame, app, chunks[1]);
    draw_preview(frame, app, chunks[2]);
    draw_status_bar(frame, app, chunks[3]);

    // Panels last so they float over everything else.
    draw_panels(frame, app);
}

fn draw_header(frame: &mut Frame, area: Rect) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            "PV en Ligne",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" | Nouvelle action"),
    ]));
    frame.render_widget(header, area);
}

fn draw_fields(frame: &mut Frame, app: &mut App, area: Rect) {
    let constraints: Vec<Constraint> = app
        .fields
        .iter()
        .map(|f| {
            if f.spec.multiline {
                Constraint::Fill(1)
            } else {
                Constraint::Length(3)
            }
        })
        .collect();
    let rects = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    let focus = app.focus;
    for (i, (field, rect)) in app.fields.iter_mut().zip(rects.iter()).enumerate() {
        draw_field(frame, field, *rect, i == focus);
    }
}

fn draw_field(frame: &mut Frame, field: &mut Field, area: Rect, focused: bool) {
    field.area = area;

    let border = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let mut title = field.spec.label.to_string();
    if field.autocomplete.is_some() {
        title.push_str(" (@ pour mentionner)");
    }
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border)
        .title(title);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.width == 0 || inner.height == 0 {
        return;
    }

    let width = usize::from(inner.width);
    let height = usize::from(inner.height);
    let lines = text_layout::wrap_lines(&field.text, width);
    let (row, col) = text_layout::caret_cell(&field.text, field.caret, width);

    // Keep the caret row in view.
    let mut scroll = usize::from(field.scroll).min(lines.len().saturating_sub(1));
    if row < scroll {
        scroll = row;
    } else if row >= scroll + height {
        scroll = row + 1 - height;
    }
    field.scroll = to_u16(scroll);

    let mentions = if field.spec.mention {
        mention_ranges(&field.text)
    } else {
        Vec::new()
    };
    let visible: Vec<Line> = lines
        .iter()
        .skip(scroll)
        .take(height)
        .map(|line| styled_line(&field.text, line.clone(), &mentions))
        .collect();
    frame.render_widget(Paragraph::new(visible), inner);

    if focused {
        let x = inner
            .x
            .saturating_add(to_u16(col))
            .min(inner.right().saturating_sub(1));
        let y = inner.y.saturating_add(to_u16(row - scroll));
        frame.set_cursor_position(Position::new(x, y));
    }
}

fn mention_ranges(text: &str) -> Vec<Range<usize>> {
    mention::extract_mentions(text)
        .into_iter()
        .map(|span| span.range)
        .collect()
}

/// One row of `text`, with mention tokens highlighted.
fn styled_line<'a>(text: &'a str, line: Range<usize>, mentions: &[Range<usize>]) -> Line<'a> {
    let mut spans = Vec::new();
    let mut pos = line.start;
    for m in mentions {
        let start = m.start.max(line.start);
        let end = m.end.min(line.end);
        if start >= end {
            continue;
        }
        if pos < start {
            spans.push(Span::raw(&text[pos..start]));
        }
        spans.push(Span::styled(&text[start..end], MENTION_STYLE));
        pos = end;
    }
    if pos < line.end {
        spans.push(Span::raw(&text[pos..line.end]));
    }
    Line::from(spans)
}

fn draw_preview(frame: &mut Frame, app: &App, area: Rect) {
    let Some(field) = app.fields.get(app.preview.host) else {
        return;
    };
    let mentions = if field.spec.mention {
        mention_ranges(&field.text)
    } else {
        Vec::new()
    };

    let mut lines: Vec<Line> = Vec::new();
    let mut start = 0;
    for hard in field.text.split('\n') {
        lines.push(styled_line(&field.text, start..start + hard.len(), &mentions));
        start += hard.len() + 1;
    }

    let summary = if app.preview.mentions.is_empty() {
        Line::styled(
            "Aucune personne mentionnée",
            Style::default().fg(Color::DarkGray),
        )
    } else {
        let names: Vec<String> = app.preview.mentions.iter().map(|u| format!("@{u}")).collect();
        Line::from(vec![
            Span::styled("Mentionnés: ", Style::default().fg(Color::DarkGray)),
            Span::styled(names.join(", "), MENTION_STYLE),
        ])
    };
    lines.insert(0, summary);

    let preview = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Aperçu: {}", field.spec.label)),
        )
        .wrap(Wrap { trim: false });
    frame.render_widget(preview, area);
}

fn draw_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let searching = app
        .fields
        .iter()
        .filter_map(|f| f.autocomplete.as_ref())
        .any(crate::autocomplete::MentionAutocomplete::lookup_pending);

    let mut spans = vec![Span::styled(
        app.status.as_str(),
        Style::default().fg(Color::Gray),
    )];
    if searching {
        spans.push(Span::styled(
            " | recherche...",
            Style::default().fg(Color::Yellow),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_panels(frame: &mut Frame, app: &mut App) {
    let screen = frame.area();
    let config = app.panel_config.clone();

    for field in &mut app.fields {
        let inner = field.text_area();
        let (row, _) = text_layout::caret_cell(&field.text, field.caret, usize::from(inner.width));
        let caret_row = to_u16(row.saturating_sub(usize::from(field.scroll)));

        let Some(ac) = field.autocomplete.as_mut() else {
            continue;
        };
        if !ac.is_open() || inner.width == 0 {
            if let Some(p) = ac.panel_mut() {
                p.set_area(None);
            }
            continue;
        }
        let Some(window) = ac.panel().map(|p| p.window(ac.candidates().len())) else {
            continue;
        };

        let visible = &ac.candidates()[window.clone()];
        let name_width = visible
            .iter()
            .map(|u| UnicodeWidthStr::width(u.username.as_str()))
            .max()
            .unwrap_or(0);
        let role_width = visible
            .iter()
            .map(|u| UnicodeWidthStr::width(u.role_display.as_str()))
            .max()
            .unwrap_or(0);

        let selected = ac.selected_index();
        let rows: Vec<Line> = visible
            .iter()
            .enumerate()
            .map(|(i, user)| {
                let pad = name_width - UnicodeWidthStr::width(user.username.as_str());
                let name = format!(" {}{}  ", user.username, " ".repeat(pad));
                let role = format!("{} ", user.role_display);
                if selected == Some(window.start + i) {
                    let style = Style::default().fg(Color::Black).bg(Color::Cyan);
                    Line::from(vec![
                        Span::styled(name, style.add_modifier(Modifier::BOLD)),
                        Span::styled(role, style),
                    ])
                    .style(style)
                } else {
                    Line::from(vec![
                        Span::styled(name, Style::default().add_modifier(Modifier::BOLD)),
                        Span::styled(role, Style::default().fg(Color::DarkGray)),
                    ])
                }
            })
            .collect();

        let content_width = to_u16(name_width + role_width + 4);
        let rect = panel::place(
            inner,
            caret_row,
            to_u16(rows.len()),
            content_width,
            &config,
            screen,
        );

        frame.render_widget(Clear, rect);
        frame.render_widget(
            Paragraph::new(rows).block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Cyan)),
            ),
            rect,
        );
        if let Some(p) = ac.panel_mut() {
            p.set_area(Some(rect));
        }
    }
}
