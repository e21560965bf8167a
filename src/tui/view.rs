use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph};
use ratatui::Frame;

use super::grid;
use super::mode::TuiState;
use crate::shared::DisplayState;

const HELP: &str =
    "space play/stop  arrows move  enter toggle  1-7 pads  -/= tempo  [/] volume  c clear  r rec  e export  esc quit";

pub fn render(frame: &mut Frame, area: Rect, ds: &DisplayState, ts: &TuiState) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // transport readout
            Constraint::Length(ds.rows.len() as u16 + 3), // step grid
            Constraint::Min(2), // status + help
        ])
        .split(area);

    draw_transport(frame, sections[0], ds);
    grid::draw_step_grid(frame, sections[1], ds, ts);
    draw_footer(frame, sections[2], ds);
}

fn draw_transport(frame: &mut Frame, area: Rect, ds: &DisplayState) {
    let play = if ds.playing {
        Span::styled("▶ PLAY", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD))
    } else {
        Span::styled("■ STOP", Style::default().fg(Color::Gray))
    };
    let rec = if ds.recording {
        Span::styled(
            format!("● REC {:.1}s", ds.captured_secs),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )
    } else {
        Span::styled("○ rec", Style::default().fg(Color::DarkGray))
    };
    let line = Line::from(vec![
        play,
        Span::raw("   "),
        Span::raw(format!("{} bpm", ds.bpm)),
        Span::raw("   "),
        Span::raw(format!("vol {:>3}%", (ds.master_volume * 100.0).round() as u32)),
        Span::raw("   "),
        rec,
    ]);
    frame.render_widget(Paragraph::new(line).block(Block::bordered().title(" stepbeat ")), area);
}

fn draw_footer(frame: &mut Frame, area: Rect, ds: &DisplayState) {
    let lines = vec![
        Line::from(Span::styled(ds.status.clone(), Style::default().fg(Color::Cyan))),
        Line::from(Span::styled(HELP, Style::default().fg(Color::DarkGray))),
    ];
    frame.render_widget(Paragraph::new(lines), area);
}
