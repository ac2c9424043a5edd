//! raylab GPU probe
//!
//! Acquires a Vulkan context for the ray tracing sandbox: negotiates instance
//! and device capabilities, lets the operator pick a GPU and creates a logical
//! device with the matching feature chain.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p raylab-probe -- [OPTIONS]
//! ```
//!
//! ## Examples
//!
//! ```bash
//! # Interactive selection, full ray tracing required
//! cargo run -p raylab-probe
//!
//! # Accept any GPU, no window, first device
//! cargo run -p raylab-probe -- --profile baseline --headless --device 0
//! ```
//!
//! ## Environment Variables
//!
//! - `RUST_LOG`: Set log level (e.g., info, debug, trace)

mod app;
mod chooser;
mod options;
mod probe;

use tracing_subscriber::EnvFilter;
use winit::event_loop::EventLoop;

use crate::app::ProbeApp;
use crate::options::{parse_args, print_help, Command};

fn main() -> anyhow::Result<()> {
    let options = match parse_args(std::env::args().skip(1))? {
        Command::Help => {
            print_help();
            return Ok(());
        }
        Command::Run(options) => options,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if options.headless {
        return probe::run(&options);
    }

    let event_loop = EventLoop::new()?;
    let mut app = ProbeApp::new(options);
    event_loop.run_app(&mut app)?;
    app.finish()
}
