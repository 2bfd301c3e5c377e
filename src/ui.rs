//! UI rendering helpers for the terminal user interface.
//!
//! This module contains functions to render the panel using `ratatui`.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style, Stylize},
    widgets::{Block, Borders, Gauge, List, ListItem, Padding, Paragraph, Wrap},
};
use std::{collections::BTreeMap, sync::LazyLock, time::Duration};

use bgplayer::backend::MAX_VOLUME;
use bgplayer::config::UiSettings;
use bgplayer::library::TrackStatus;

use crate::app::Panel;

static CONTROLS_MAP: LazyLock<BTreeMap<String, String>> = LazyLock::new(|| {
    let mut map: BTreeMap<String, String> = BTreeMap::new();
    map.insert("j/k".to_string(), "up/down".to_string());
    map.insert("enter".to_string(), "play selected".to_string());
    map.insert("n".to_string(), "next".to_string());
    map.insert("space".to_string(), "pause/resume".to_string());
    map.insert("+/-".to_string(), "volume".to_string());
    map.insert("f".to_string(), "fade".to_string());
    map.insert("u".to_string(), "unlock/lock time".to_string());
    // h/l is filled dynamically from config.
    map.insert("w".to_string(), "hide/show".to_string());
    map.insert("q".to_string(), "quit".to_string());
    map
});

/// Render the controls help text, incorporating scrub seconds.
fn controls_text(scrub_seconds: u64) -> String {
    let order = [
        "j/k", "enter", "n", "space", "+/-", "f", "u", "h/l", "w", "q",
    ];
    order
        .iter()
        .filter_map(|k| {
            if *k == "h/l" {
                Some(format!("[h/l] scrub -/+{}s", scrub_seconds))
            } else {
                CONTROLS_MAP.get(*k).map(|v| format!("[{}] {}", k, v))
            }
        })
        .collect::<Vec<String>>()
        .join(" | ")
}

/// Format a `Duration` as `MM:SS`.
fn format_mmss(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

fn status_color(status: TrackStatus) -> Color {
    match status {
        TrackStatus::NeverPlayed => Color::Reset,
        TrackStatus::PlayingNow => Color::Green,
        TrackStatus::PlayedToEnd => Color::Blue,
        TrackStatus::Skipped => Color::Yellow,
    }
}

fn time_label(panel: &Panel) -> String {
    let lock = if panel.is_scrubbing() { "UNLOCKED" } else { "LOCKED" };
    match panel.duration {
        Some(total) => format!(
            "{} / {} [{}]",
            format_mmss(panel.shown_position()),
            format_mmss(total),
            lock
        ),
        None => format!("{} [{}]", format_mmss(panel.shown_position()), lock),
    }
}

/// Render the entire panel into `frame`.
pub fn draw(frame: &mut Frame, panel: &Panel, ui_settings: &UiSettings) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(4),
        ])
        .split(frame.area());

    // Header
    let header = Paragraph::new(ui_settings.header_text.as_str())
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" bgplayer ")
                .title_alignment(Alignment::Center),
        );
    frame.render_widget(header, chunks[0]);

    // Status line
    let status = if panel.hidden {
        "Output hidden (w shows it again)".to_string()
    } else {
        let mut parts: Vec<String> = vec![panel.status.clone()];
        let fade = match panel.session {
            Some(s) if s.fade_enabled => "FADE: on",
            Some(_) => "FADE: off",
            None => "",
        };
        if !fade.is_empty() {
            parts.push(fade.to_string());
        }
        if let Some(dir) = &panel.current_dir {
            parts.push(format!("Dir: {}", dir));
        }
        parts.join(" • ")
    };
    let status_par = Paragraph::new(status)
        .block(
            Block::bordered()
                .padding(Padding {
                    left: 1,
                    right: 0,
                    top: 0,
                    bottom: 0,
                })
                .title(format!(" status: {} ", panel.state().label())),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(status_par, chunks[1]);

    // Volume gauge
    let volume_style = if panel.fading {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default().fg(Color::Cyan)
    };
    let volume = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(" volume "))
        .gauge_style(volume_style)
        .ratio(f64::from(panel.volume.min(MAX_VOLUME)) / f64::from(MAX_VOLUME))
        .label(panel.volume_label());
    frame.render_widget(volume, chunks[2]);

    // Time gauge
    let time_style = if panel.is_scrubbing() {
        Style::default().fg(Color::Magenta)
    } else if panel.controls.lock {
        Style::default().fg(Color::Green)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let time = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(" time "))
        .gauge_style(time_style)
        .ratio(panel.time_ratio())
        .label(time_label(panel));
    frame.render_widget(time, chunks[3]);

    // Main list
    {
        // Center the selected item when possible by creating a visible window.
        let total = panel.tracks.len();
        let list_height = chunks[4].height.saturating_sub(2) as usize;
        let sel_pos = panel.selected.min(total.saturating_sub(1));
        let (start, end, selected_pos_in_visible) = if total <= list_height || list_height == 0 {
            (0, total, sel_pos)
        } else {
            let half = list_height / 2;
            let mut start = sel_pos.saturating_sub(half);
            if start + list_height > total {
                start = total - list_height;
            }
            (start, start + list_height, sel_pos - start)
        };

        let now_playing = panel.now_playing();
        let visible_items: Vec<ListItem> = panel.tracks[start..end]
            .iter()
            .enumerate()
            .map(|(offset, row)| {
                let mut style = Style::default().fg(status_color(row.status));
                if now_playing == Some(start + offset) {
                    style = style.add_modifier(Modifier::BOLD);
                }
                ListItem::new(row.title.as_str()).style(style)
            })
            .collect();

        let list = List::new(visible_items)
            .block(Block::default().borders(Borders::ALL).title(" tracks "))
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ");
        let mut state = ratatui::widgets::ListState::default();
        if total > 0 {
            state.select(Some(selected_pos_in_visible));
        }
        frame.render_stateful_widget(list, chunks[4], &mut state);
    }

    let mut footer_text = controls_text(ui_settings.scrub_seconds);
    if !panel.controls.play {
        footer_text = format!("(no tracks) {footer_text}");
    }
    let footer = Paragraph::new(footer_text)
        .dim()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" controls ")
                .padding(Padding {
                    left: 1,
                    right: 0,
                    top: 0,
                    bottom: 0,
                }),
        )
        .wrap(Wrap { trim: true });

    frame.render_widget(footer, chunks[5]);
}
