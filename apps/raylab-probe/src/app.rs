//! Windowed probe run.

use anyhow::anyhow;
use tracing::{error, info};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::event_loop::ActiveEventLoop;
use winit::window::{Window, WindowId};

use crate::options::Options;
use crate::probe;

const WIDTH: u32 = 800;
const HEIGHT: u32 = 600;

/// Opens the window, then runs the probe once and leaves the event loop.
pub struct ProbeApp {
    options: Options,
    // Kept open for the whole run
    #[allow(dead_code)]
    window: Option<Window>,
    outcome: Option<anyhow::Result<()>>,
}

impl ProbeApp {
    pub fn new(options: Options) -> Self {
        Self {
            options,
            window: None,
            outcome: None,
        }
    }

    /// Result of the probe run once the event loop has returned.
    pub fn finish(self) -> anyhow::Result<()> {
        self.outcome
            .unwrap_or_else(|| Err(anyhow!("event loop exited before the probe ran")))
    }

    fn open_window(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let attrs = Window::default_attributes()
            .with_title(&self.options.app_name)
            .with_inner_size(PhysicalSize::new(WIDTH, HEIGHT));
        self.window = Some(event_loop.create_window(attrs)?);
        info!("Window created");
        Ok(())
    }
}

impl ApplicationHandler for ProbeApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.outcome.is_some() {
            return;
        }

        let outcome = self
            .open_window(event_loop)
            .and_then(|()| probe::run(&self.options));
        if let Err(e) = &outcome {
            error!("Probe failed: {e:#}");
        }
        self.outcome = Some(outcome);
        event_loop.exit();
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        if let WindowEvent::CloseRequested = event {
            info!("Close requested");
            event_loop.exit();
        }
    }
}
