//! Text render adapter.
//!
//! The e-paper glyph driver sits outside this crate; [`LogDisplay`]
//! implements [`RenderPort`] by printing each frame to the log, one
//! line per row with the icon labels on a trailing row. It also keeps
//! the last frame so callers can inspect what would be on the panel.

use log::info;

use crate::app::ports::RenderPort;
use crate::app::screens::Screen;

#[derive(Default)]
pub struct LogDisplay {
    last: Option<Screen>,
    countdown: Option<u32>,
    frames: u32,
}

impl LogDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_screen(&self) -> Option<&Screen> {
        self.last.as_ref()
    }

    pub fn countdown(&self) -> Option<u32> {
        self.countdown
    }

    /// Full refreshes so far.
    pub fn frames(&self) -> u32 {
        self.frames
    }
}

impl RenderPort for LogDisplay {
    fn show(&mut self, screen: &Screen) {
        self.frames = self.frames.wrapping_add(1);
        self.countdown = None;
        for line in &screen.lines {
            info!("EPD | {}", line);
        }
        if !screen.icons.is_empty() {
            let labels: Vec<&str> = screen.icons.iter().map(|i| i.label()).collect();
            info!("EPD | [{}]", labels.join("] ["));
        }
        self.last = Some(screen.clone());
    }

    fn show_countdown(&mut self, minutes_left: u32) {
        self.countdown = Some(minutes_left);
        info!("EPD | ETA: {}", minutes_left);
    }
}
