use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph};
use ratatui::Frame;

use super::mode::TuiState;
use crate::shared::DisplayState;

const LABEL_WIDTH: usize = 8;

// one row per track, one cell per step; the playing column is highlighted
pub fn draw_step_grid(frame: &mut Frame, area: Rect, ds: &DisplayState, ts: &TuiState) {
    let mut lines = Vec::with_capacity(ds.rows.len() + 1);
    lines.push(step_ruler(ds));

    for (row_idx, (track, steps)) in ds.rows.iter().enumerate() {
        let label_style = if ts.is_flashing(*track) {
            Style::default().fg(Color::Black).bg(Color::LightMagenta)
        } else {
            Style::default().fg(Color::Gray)
        };
        let mut spans = vec![
            Span::styled(format!("{:<w$}", track.name(), w = LABEL_WIDTH - 1), label_style),
            Span::raw(" "),
        ];

        for (step, &active) in steps.iter().enumerate() {
            let mut style = if active {
                Style::default().fg(Color::LightMagenta)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            if ds.current_step == Some(step) {
                style = style.bg(Color::Rgb(60, 60, 60));
            }
            if row_idx == ts.cursor_track && step == ts.cursor_step {
                style = style.add_modifier(Modifier::REVERSED);
            }
            let glyph = if active { "■ " } else { "· " };
            // a little gap every beat
            let sep = if step % 4 == 3 { " " } else { "" };
            spans.push(Span::styled(glyph, style));
            spans.push(Span::raw(sep));
        }
        lines.push(Line::from(spans));
    }

    frame.render_widget(Paragraph::new(lines).block(Block::bordered().title(" pattern ")), area);
}

fn step_ruler(ds: &DisplayState) -> Line<'static> {
    let steps = ds.rows.first().map(|(_, r)| r.len()).unwrap_or(0);
    let mut spans = vec![Span::raw(" ".repeat(LABEL_WIDTH))];
    for step in 0..steps {
        let style = if ds.current_step == Some(step) {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let mark = if step % 4 == 0 { format!("{:<2}", step / 4 + 1) } else { "  ".to_string() };
        spans.push(Span::styled(mark, style));
        if step % 4 == 3 {
            spans.push(Span::raw(" "));
        }
    }
    Line::from(spans)
}
