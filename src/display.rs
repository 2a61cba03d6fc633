use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen};
use std::io;
use tui::backend::CrosstermBackend;
use tui::layout::Rect;
use tui::style::{Color, Style};
use tui::symbols::Marker;
use tui::widgets::canvas::{Canvas, Points};
use tui::widgets::{Block, Borders};
use tui::Terminal;

/// Display presents the interpreter's screen. It should abstract the
/// implementation details, so a variety of kinds of screen would work.
pub trait Display {
    /// draw a packed frame: one bit per pixel, msb first, rows top to bottom
    fn draw(&mut self, frame: &[u8]) -> Result<(), io::Error>;

    /// how many bytes a packed frame should be
    fn frame_size_bytes(&self) -> usize;
}

/// size of the picture being shown, in pixels
#[derive(Debug, Clone, Copy)]
struct Resolution {
    width: usize,
    height: usize,
}

impl Resolution {
    fn pixel_count(&self) -> usize {
        self.width * self.height
    }

    fn byte_count(&self) -> usize {
        (self.pixel_count() + 7) / 8
    }

    fn x_bounds(&self) -> [f64; 2] {
        [0.0, (self.width - 1) as f64]
    }

    // the canvas puts its origin bottom left, so rows count downwards from 0
    fn y_bounds(&self) -> [f64; 2] {
        [-((self.height - 1) as f64), 0.0]
    }

    /// canvas coordinates of every lit pixel in `frame`
    fn lit_points(&self, frame: &[u8]) -> Vec<(f64, f64)> {
        (0..self.pixel_count())
            .filter(|i| frame[i / 8] & (0x80 >> (i % 8)) != 0)
            .map(|i| ((i % self.width) as f64, -((i / self.width) as f64)))
            .collect()
    }
}

/// monochrome display in a terminal, drawn with TUI over crossterm on the
/// alternate screen; the terminal is put back when it's dropped
pub struct MonoTermDisplay {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    resolution: Resolution,
    title: String,
}

impl MonoTermDisplay {
    pub fn new(width: usize, height: usize, title: &str) -> Result<MonoTermDisplay, io::Error> {
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        terminal.hide_cursor()?;
        terminal.clear()?;
        Ok(MonoTermDisplay {
            terminal,
            resolution: Resolution { width, height },
            title: title.to_string(),
        })
    }
}

impl Drop for MonoTermDisplay {
    fn drop(&mut self) {
        let _ = self.terminal.show_cursor();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

impl Display for MonoTermDisplay {
    fn draw(&mut self, frame: &[u8]) -> Result<(), io::Error> {
        let expected = self.resolution.byte_count();
        if frame.len() != expected {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("frame is {} bytes, display needs {}", frame.len(), expected),
            ));
        }

        // one terminal cell per pixel, plus the border
        let resolution = self.resolution;
        let title = self.title.as_str();
        let lit = resolution.lit_points(frame);
        self.terminal.draw(|f| {
            let area = Rect::new(
                0,
                0,
                2 + resolution.width as u16,
                2 + resolution.height as u16,
            );
            let canvas = Canvas::default()
                .block(
                    Block::default()
                        .title(title)
                        .borders(Borders::ALL)
                        .style(Style::default().bg(Color::Black)),
                )
                .x_bounds(resolution.x_bounds())
                .y_bounds(resolution.y_bounds())
                .marker(Marker::Block)
                .paint(|ctx| {
                    ctx.draw(&Points {
                        coords: &lit,
                        color: Color::White,
                    });
                });
            f.render_widget(canvas, area);
        })?;
        Ok(())
    }

    fn frame_size_bytes(&self) -> usize {
        self.resolution.byte_count()
    }
}

/// records every frame instead of showing it
#[derive(Debug, Default)]
pub struct DummyDisplay {
    pub frames: Vec<Vec<u8>>,
}

impl DummyDisplay {
    pub fn new() -> DummyDisplay {
        DummyDisplay::default()
    }
}

impl Display for DummyDisplay {
    fn draw(&mut self, frame: &[u8]) -> Result<(), io::Error> {
        self.frames.push(frame.to_vec());
        Ok(())
    }

    fn frame_size_bytes(&self) -> usize {
        crate::screen::SCREEN_PACKED_BYTES
    }
}
