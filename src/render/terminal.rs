// SPDX-License-Identifier: GPL-3.0-only

//! Terminal output
//!
//! Renders the processed frame to the terminal using Unicode half-block
//! characters for improved vertical resolution, with a one-line status bar
//! underneath. The surface and the refresh driver share a [`TerminalUi`]:
//! the driver turns key presses into chain mutations and status messages,
//! the surface shows them on the next present.

use super::{Canvas, RenderTarget};
use crate::constants::processors::{GRAYSCALE, MODULUS};
use crate::constants::timing::refresh_interval;
use crate::context::PipelineContext;
use crate::errors::{VelvetError, VelvetResult};
use crate::frame::Frame;
use crate::scheduler::RefreshDriver;
use crate::storage;
use crossterm::{
    event::{
        self, DisableFocusChange, EnableFocusChange, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal, backend::CrosstermBackend, buffer::Buffer, layout::Rect, style::Color,
    style::Style, widgets::Widget,
};
use std::cell::RefCell;
use std::io::{Stdout, stdout};
use std::path::PathBuf;
use std::rc::Rc;
use std::time::{Duration, Instant};
use tracing::{error, info};

const HELP_MESSAGE: &str = "'g' grayscale | 'm' modulus | 'p' snapshot | 'h' help | 'q' quit";

/// How a status message is shown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Notice,
    Error,
}

/// State shared between the terminal surface and its driver
#[derive(Debug)]
pub struct TerminalUi {
    message: String,
    severity: Severity,
    snapshot_requested: bool,
    snapshot_dir: PathBuf,
}

impl TerminalUi {
    pub fn new(snapshot_dir: PathBuf) -> Self {
        Self {
            message: HELP_MESSAGE.to_string(),
            severity: Severity::Notice,
            snapshot_requested: false,
            snapshot_dir,
        }
    }

    /// Wrap in the shared handle the surface and driver both hold
    pub fn shared(self) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(self))
    }

    pub fn notice(&mut self, message: impl Into<String>) {
        self.message = message.into();
        self.severity = Severity::Notice;
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.message = message.into();
        self.severity = Severity::Error;
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn request_snapshot(&mut self) {
        self.snapshot_requested = true;
    }

    /// Consume a pending snapshot request
    pub fn take_snapshot_request(&mut self) -> bool {
        std::mem::take(&mut self.snapshot_requested)
    }

    pub fn snapshot_dir(&self) -> &PathBuf {
        &self.snapshot_dir
    }

    /// Apply one key press to the context
    ///
    /// Chain errors end up in the status bar; they never stop the loop.
    pub fn handle_key(&mut self, key: KeyEvent, ctx: &mut PipelineContext) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.disable(ctx)
            }
            KeyCode::Char('q') | KeyCode::Esc => self.disable(ctx),
            KeyCode::Char('g') => self.toggle(ctx, GRAYSCALE),
            KeyCode::Char('m') => self.toggle(ctx, MODULUS),
            KeyCode::Char('p') => self.request_snapshot(),
            KeyCode::Char('h') => self.notice(HELP_MESSAGE),
            _ => {}
        }
    }

    /// Apply one terminal event to the context
    pub fn handle_event(&mut self, event: Event, ctx: &mut PipelineContext) {
        match event {
            Event::Key(key) => self.handle_key(key, ctx),
            Event::FocusLost => self.disable(ctx),
            _ => {}
        }
    }

    fn disable(&mut self, ctx: &PipelineContext) {
        ctx.kill_switch().trip();
        self.error(VelvetError::Disabled.to_string());
    }

    fn toggle(&mut self, ctx: &mut PipelineContext, name: &str) {
        match ctx.toggle_processor(name) {
            Ok(true) => self.notice(format!("{} processor enabled.", name)),
            Ok(false) => self.notice(format!("{} processor disabled.", name)),
            Err(e) => {
                error!(name, error = %e, "Failed to toggle processor");
                self.error(e.to_string());
            }
        }
    }
}

/// Output surface presented on the terminal
///
/// Pixels are kept in a [`Canvas`]; every put or clear redraws the terminal.
/// The terminal is restored when the surface is dropped.
pub struct TerminalSurface {
    canvas: Canvas,
    terminal: Terminal<CrosstermBackend<Stdout>>,
    ui: Rc<RefCell<TerminalUi>>,
    restored: bool,
}

impl TerminalSurface {
    /// Switch the terminal to raw mode on the alternate screen
    pub fn new(ui: Rc<RefCell<TerminalUi>>) -> VelvetResult<Self> {
        enable_raw_mode()?;
        let mut stdout = stdout();
        execute!(stdout, EnterAlternateScreen, EnableFocusChange)?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        Ok(Self {
            canvas: Canvas::new(0, 0),
            terminal,
            ui,
            restored: false,
        })
    }

    /// Leave the alternate screen and give the terminal back
    pub fn restore(&mut self) -> VelvetResult<()> {
        if self.restored {
            return Ok(());
        }
        self.restored = true;
        disable_raw_mode()?;
        execute!(
            self.terminal.backend_mut(),
            DisableFocusChange,
            LeaveAlternateScreen
        )?;
        self.terminal.show_cursor()?;
        Ok(())
    }

    fn present(&mut self) -> VelvetResult<()> {
        self.save_pending_snapshot();

        let canvas = &self.canvas;
        let ui = self.ui.borrow();
        self.terminal.draw(|f| {
            let area = f.area();
            let frame_area = Rect {
                height: area.height.saturating_sub(1),
                ..area
            };
            let status_area = Rect {
                y: area.y + area.height.saturating_sub(1),
                height: area.height.min(1),
                ..area
            };

            f.render_widget(FrameWidget { canvas }, frame_area);
            f.render_widget(
                StatusBar {
                    message: ui.message(),
                    severity: ui.severity(),
                },
                status_area,
            );
        })?;
        Ok(())
    }

    fn save_pending_snapshot(&mut self) {
        let mut ui = self.ui.borrow_mut();
        if !ui.take_snapshot_request() {
            return;
        }

        let result = self
            .canvas
            .snapshot()
            .and_then(|frame| storage::save_snapshot(frame, ui.snapshot_dir()));
        match result {
            Ok(path) => {
                info!(path = %path.display(), "Snapshot saved");
                ui.notice(format!("Saved: {}", path.display()));
            }
            Err(e) => {
                error!(error = %e, "Failed to save snapshot");
                ui.error(format!("Error: {}", e));
            }
        }
    }
}

impl RenderTarget for TerminalSurface {
    fn size(&self) -> (u32, u32) {
        self.canvas.size()
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.canvas.resize(width, height);
    }

    fn draw_frame(&mut self, frame: &Frame, x: u32, y: u32, w: u32, h: u32) -> VelvetResult<()> {
        self.canvas.draw_frame(frame, x, y, w, h)?;
        self.present()
    }

    fn get_pixel_bytes(&self, x: u32, y: u32, w: u32, h: u32) -> VelvetResult<Vec<u8>> {
        self.canvas.get_pixel_bytes(x, y, w, h)
    }

    fn put_pixel_bytes(
        &mut self,
        bytes: &[u8],
        x: u32,
        y: u32,
        w: u32,
        h: u32,
    ) -> VelvetResult<()> {
        self.canvas.put_pixel_bytes(bytes, x, y, w, h)?;
        self.present()
    }

    fn clear(&mut self, x: u32, y: u32, w: u32, h: u32) -> VelvetResult<()> {
        self.canvas.clear(x, y, w, h)?;
        if self.restored {
            return Ok(());
        }
        self.present()
    }
}

impl Drop for TerminalSurface {
    fn drop(&mut self) {
        if let Err(e) = self.restore() {
            error!(error = %e, "Failed to restore terminal");
        }
    }
}

/// Refresh driver that reads terminal input between frames
///
/// `q`, Esc, Ctrl+C and losing focus trip the kill switch.
pub struct TerminalDriver {
    ui: Rc<RefCell<TerminalUi>>,
    interval: Duration,
    last: Option<Instant>,
}

impl TerminalDriver {
    pub fn new(ui: Rc<RefCell<TerminalUi>>, rate_hz: u32) -> Self {
        Self {
            ui,
            interval: refresh_interval(rate_hz),
            last: None,
        }
    }
}

impl RefreshDriver for TerminalDriver {
    fn next_refresh(&mut self, ctx: &mut PipelineContext) -> VelvetResult<()> {
        let deadline = self.last.unwrap_or_else(Instant::now) + self.interval;

        loop {
            let timeout = deadline.saturating_duration_since(Instant::now());
            if !event::poll(timeout)? {
                break;
            }
            let event = event::read()?;
            self.ui.borrow_mut().handle_event(event, ctx);
            if !ctx.is_enabled() {
                break;
            }
        }

        self.last = Some(Instant::now());
        Ok(())
    }
}

/// Widget that renders a canvas using half-block characters
struct FrameWidget<'a> {
    canvas: &'a Canvas,
}

impl Widget for FrameWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let (width, height) = self.canvas.size();
        if width == 0 || height == 0 || area.width == 0 || area.height == 0 {
            let msg = "Waiting for camera...";
            let x = area.x + (area.width.saturating_sub(msg.len() as u16)) / 2;
            let y = area.y + area.height / 2;
            if y < area.y + area.height && x < area.x + area.width {
                buf.set_string(x, y, msg, Style::default());
            }
            return;
        }

        // Each terminal cell displays 2 vertical pixels
        let frame_aspect = width as f64 / height as f64;
        let term_width = area.width as f64;
        let term_height = (area.height as f64) * 2.0;

        let (display_width, display_height) = if term_width / term_height > frame_aspect {
            let h = term_height;
            ((h * frame_aspect) as u16, (h / 2.0) as u16)
        } else {
            let w = term_width;
            (w as u16, (w / frame_aspect / 2.0) as u16)
        };
        let display_width = display_width.max(1);
        let display_height = display_height.max(1);

        let x_offset = area.x + (area.width.saturating_sub(display_width)) / 2;
        let y_offset = area.y + (area.height.saturating_sub(display_height)) / 2;

        let x_scale = width as f64 / display_width as f64;
        let y_scale = height as f64 / (display_height as f64 * 2.0);

        // Upper half (▀) takes the fg color, lower half the bg color
        for ty in 0..display_height {
            for tx in 0..display_width {
                let term_x = x_offset + tx;
                let term_y = y_offset + ty;
                if term_x >= area.x + area.width || term_y >= area.y + area.height {
                    continue;
                }

                let src_x = (tx as f64 * x_scale) as u32;
                let src_y_top = (ty as f64 * 2.0 * y_scale) as u32;
                let src_y_bottom = ((ty as f64 * 2.0 + 1.0) * y_scale) as u32;

                let (r, g, b) = self.canvas.rgb_at(src_x, src_y_top);
                let top = Color::Rgb(r, g, b);
                let (r, g, b) = self.canvas.rgb_at(src_x, src_y_bottom);
                let bottom = Color::Rgb(r, g, b);

                if let Some(cell) = buf.cell_mut((term_x, term_y)) {
                    cell.set_char('▀');
                    cell.set_fg(top);
                    cell.set_bg(bottom);
                }
            }
        }
    }
}

/// One-line status bar, blue for notices and red for errors
struct StatusBar<'a> {
    message: &'a str,
    severity: Severity,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 {
            return;
        }
        let background = match self.severity {
            Severity::Notice => Color::Blue,
            Severity::Error => Color::Red,
        };

        for x in area.x..area.x + area.width {
            if let Some(cell) = buf.cell_mut((x, area.y)) {
                cell.set_char(' ');
                cell.set_bg(background);
            }
        }

        let text: String = self.message.chars().take(area.width as usize).collect();
        buf.set_string(
            area.x,
            area.y,
            text,
            Style::default().fg(Color::White).bg(background),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ui() -> TerminalUi {
        TerminalUi::new(std::env::temp_dir())
    }

    #[test]
    fn test_toggle_keys() {
        let mut ctx = PipelineContext::new();
        let mut ui = ui();

        ui.handle_key(key(KeyCode::Char('g')), &mut ctx);
        assert_eq!(ctx.active_processors(), &[GRAYSCALE.to_string()]);
        assert_eq!(ui.message(), "grayscale processor enabled.");
        assert_eq!(ui.severity(), Severity::Notice);

        ui.handle_key(key(KeyCode::Char('m')), &mut ctx);
        assert_eq!(
            ctx.active_processors(),
            &[GRAYSCALE.to_string(), MODULUS.to_string()]
        );

        ui.handle_key(key(KeyCode::Char('g')), &mut ctx);
        assert_eq!(ctx.active_processors(), &[MODULUS.to_string()]);
        assert_eq!(ui.message(), "grayscale processor disabled.");
    }

    #[test]
    fn test_quit_keys_trip_switch() {
        for event in [
            Event::Key(key(KeyCode::Char('q'))),
            Event::Key(key(KeyCode::Esc)),
            Event::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Event::FocusLost,
        ] {
            let mut ctx = PipelineContext::new();
            let mut ui = ui();
            ui.handle_event(event, &mut ctx);
            assert!(!ctx.is_enabled());
            assert_eq!(ui.severity(), Severity::Error);
            assert_eq!(ui.message(), VelvetError::Disabled.to_string());
        }
    }

    #[test]
    fn test_toggle_after_disable_reports_error() {
        let mut ctx = PipelineContext::new();
        let mut ui = ui();
        ui.handle_event(Event::FocusLost, &mut ctx);
        ui.handle_key(key(KeyCode::Char('g')), &mut ctx);
        assert!(ctx.active_processors().is_empty());
        assert_eq!(ui.severity(), Severity::Error);
    }

    #[test]
    fn test_snapshot_request_is_consumed() {
        let mut ctx = PipelineContext::new();
        let mut ui = ui();
        assert!(!ui.take_snapshot_request());
        ui.handle_key(key(KeyCode::Char('p')), &mut ctx);
        assert!(ui.take_snapshot_request());
        assert!(!ui.take_snapshot_request());
    }

    #[test]
    fn test_frame_widget_half_blocks() {
        let mut canvas = Canvas::new(1, 2);
        canvas
            .put_pixel_bytes(&[255, 0, 0, 255, 0, 0, 255, 255], 0, 0, 1, 2)
            .unwrap();

        let area = Rect::new(0, 0, 1, 1);
        let mut buf = Buffer::empty(area);
        FrameWidget { canvas: &canvas }.render(area, &mut buf);

        let cell = &buf[(0, 0)];
        assert_eq!(cell.symbol(), "▀");
        assert_eq!(cell.fg, Color::Rgb(255, 0, 0));
        assert_eq!(cell.bg, Color::Rgb(0, 0, 255));
    }

    #[test]
    fn test_frame_widget_placeholder() {
        let canvas = Canvas::new(0, 0);
        let area = Rect::new(0, 0, 30, 3);
        let mut buf = Buffer::empty(area);
        FrameWidget { canvas: &canvas }.render(area, &mut buf);

        let row: String = (0..30).map(|x| buf[(x, 1)].symbol().to_string()).collect();
        assert!(row.contains("Waiting for camera..."));
    }

    #[test]
    fn test_status_bar_colors() {
        let area = Rect::new(0, 0, 8, 1);
        let mut buf = Buffer::empty(area);
        StatusBar {
            message: "disabled and more text",
            severity: Severity::Error,
        }
        .render(area, &mut buf);
        assert_eq!(buf[(0, 0)].bg, Color::Red);
        assert_eq!(buf[(0, 0)].symbol(), "d");
        assert_eq!(buf[(7, 0)].symbol(), "d");

        let mut buf = Buffer::empty(area);
        StatusBar {
            message: "ok",
            severity: Severity::Notice,
        }
        .render(area, &mut buf);
        assert_eq!(buf[(5, 0)].bg, Color::Blue);
    }
}
