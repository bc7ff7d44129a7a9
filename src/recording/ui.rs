//! Terminal user interface for the waveform bar display.
//!
//! Presentation glue only: paints the bar state exposed by the visualization
//! core (levels, scroll offset, sweep fraction) and translates key presses
//! into commands for the record/play loops. All waveform logic lives in
//! [`crate::viz`].

use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    prelude::*,
    style::{Color, Style},
    widgets::Paragraph,
};
use std::io::{stdout, Stdout};
use std::time::Duration;

use crate::viz::{Mode, Visualizer};

/// User input command during recording or playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputCommand {
    /// No relevant key pressed
    Continue,
    /// Exit (Escape or 'q')
    Quit,
    /// Pause/resume (Space key)
    TogglePause,
    /// Start over: clear the bars while recording, restart the sweep
    /// during playback ('r')
    Reset,
}

const BAR_COLOR: Color = Color::Rgb(206, 224, 220);
const SWEPT_COLOR: Color = Color::Rgb(224, 64, 64);
const UNSWEPT_COLOR: Color = Color::Rgb(90, 100, 98);
const FOOTER_COLOR: Color = Color::Rgb(185, 207, 212);

/// Terminal UI painting the waveform bar chart.
pub struct WaveTui {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    single_stick: bool,
}

impl WaveTui {
    /// Creates a new TUI instance and enters alternate screen mode.
    ///
    /// # Errors
    /// - If terminal cannot be initialized
    /// - If raw mode cannot be enabled
    /// - If alternate screen cannot be entered
    pub fn new(single_stick: bool) -> anyhow::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = stdout();
        execute!(stdout, crossterm::terminal::EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        Ok(WaveTui {
            terminal,
            single_stick,
        })
    }

    /// Current terminal width in columns.
    ///
    /// # Errors
    /// - If the terminal size cannot be queried
    pub fn width(&self) -> anyhow::Result<f32> {
        Ok(self.terminal.size()?.width as f32)
    }

    /// Renders the bar chart and a one-line footer.
    ///
    /// # Errors
    /// - If terminal rendering fails
    pub fn render(
        &mut self,
        viz: &Visualizer,
        elapsed: Duration,
        paused: bool,
    ) -> anyhow::Result<()> {
        let levels = viz.levels();
        let visible = viz.visible_range();
        let offset = viz.scroll_offset();
        let advance = viz.layout().advance();
        let bar_width = viz.layout().bar_width.round().max(1.0) as u16;
        let progress = viz.progress();
        let mode = viz.mode();
        let single_stick = self.single_stick;

        let detail = match (mode, progress) {
            (Mode::Read, Some(fraction)) => format!("{:.0}%", fraction * 100.0),
            _ => {
                let level = levels.last().copied().unwrap_or(0.0);
                format!("{:.0}%", level * 100.0)
            }
        };

        let indicator = match (mode, paused) {
            (_, true) => Span::styled("⏸ ", Style::default().fg(Color::Yellow)),
            (Mode::Write, false) => Span::styled("● ", Style::default().fg(Color::Red)),
            (Mode::Read, false) => Span::styled("▶ ", Style::default().fg(Color::Green)),
        };

        self.terminal.draw(|frame| {
            let area = frame.area();

            let footer_height = 1;
            let content = Rect {
                x: area.x,
                y: area.y,
                width: area.width,
                height: area.height.saturating_sub(footer_height),
            };

            // Sweep boundary in absolute columns; bars left of it use the
            // highlight color during playback.
            let sweep_x = progress.map(|fraction| content.width as f32 * fraction);

            let center_y = content.height / 2;
            let max_half = center_y.max(1);

            for (slot, index) in visible.clone().enumerate() {
                let x = offset + slot as f32 * advance;
                if x < 0.0 || x >= content.width as f32 {
                    continue;
                }

                let color = match sweep_x {
                    Some(boundary) if x < boundary => SWEPT_COLOR,
                    Some(_) => UNSWEPT_COLOR,
                    None => BAR_COLOR,
                };
                let style = Style::default().fg(color).bg(Color::Rgb(0, 0, 0));

                let level = levels[index].clamp(0.0, 1.0);
                let half = ((level * max_half as f32).round() as u16).max(1);

                let (top, bottom) = if single_stick {
                    // One contiguous stick centered on the midline.
                    (center_y.saturating_sub(half / 2), half.max(1))
                } else {
                    // Mirrored halves above and below the midline.
                    (center_y.saturating_sub(half), half * 2)
                };

                let col = x.round() as u16 + content.x;
                for dx in 0..bar_width {
                    let cx = col.saturating_add(dx);
                    if cx >= content.x + content.width {
                        break;
                    }
                    for dy in 0..bottom {
                        let cy = top.saturating_add(dy) + content.y;
                        if cy >= content.y + content.height {
                            break;
                        }
                        frame.buffer_mut().set_string(cx, cy, "█", style);
                    }
                }
            }

            let footer_area = Rect {
                x: area.x,
                y: area.y + area.height.saturating_sub(footer_height),
                width: area.width,
                height: footer_height,
            };

            let duration_secs = elapsed.as_secs();
            let minutes = duration_secs / 60;
            let secs = duration_secs % 60;

            let footer_line = Line::from(vec![
                indicator,
                Span::raw(format!("{minutes}:{secs:02}")),
                Span::raw(" / "),
                Span::raw(detail),
            ]);

            let footer = Paragraph::new(footer_line).style(
                Style::default()
                    .fg(FOOTER_COLOR)
                    .bg(Color::Rgb(0, 0, 0)),
            );

            frame.render_widget(footer, footer_area);
        })?;

        Ok(())
    }

    /// Processes user input and returns the appropriate command.
    ///
    /// Polls briefly so the caller's loop doubles as the frame cadence.
    ///
    /// # Errors
    /// - If event polling fails
    pub fn handle_input(&mut self) -> anyhow::Result<InputCommand> {
        if event::poll(Duration::from_millis(5))? {
            if let Event::Key(key) = event::read()? {
                return Ok(match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => {
                        tracing::debug!("Escape or 'q' pressed: quitting");
                        InputCommand::Quit
                    }
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        tracing::debug!("Ctrl+C pressed: quitting");
                        InputCommand::Quit
                    }
                    KeyCode::Char(' ') => {
                        tracing::debug!("Space pressed: toggling pause");
                        InputCommand::TogglePause
                    }
                    KeyCode::Char('r') => {
                        tracing::debug!("'r' pressed: reset");
                        InputCommand::Reset
                    }
                    _ => InputCommand::Continue,
                });
            }
        }
        Ok(InputCommand::Continue)
    }

    /// Cleans up terminal state and exits alternate screen mode.
    ///
    /// # Errors
    /// - If terminal mode cannot be disabled
    /// - If cursor cannot be shown
    pub fn cleanup(&mut self) -> anyhow::Result<()> {
        disable_raw_mode()?;
        execute!(
            self.terminal.backend_mut(),
            crossterm::terminal::LeaveAlternateScreen
        )?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}
