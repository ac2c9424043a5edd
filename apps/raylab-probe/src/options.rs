//! Command-line options.

use anyhow::{anyhow, bail, Context};
use raylab_gpu::Profile;

/// Options controlling one probe run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub app_name: String,
    pub profile: Profile,
    /// Preset device index; prompt interactively when unset.
    pub device: Option<usize>,
    /// Override the build-dependent validation default.
    pub validation: Option<bool>,
    pub headless: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            app_name: "Hello Vulkan RT".to_string(),
            profile: Profile::default(),
            device: None,
            validation: None,
            headless: false,
        }
    }
}

/// What the command line asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Run(Options),
    Help,
}

/// Parse arguments, excluding the program name.
pub fn parse_args<I>(args: I) -> anyhow::Result<Command>
where
    I: IntoIterator<Item = String>,
{
    let mut options = Options::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(Command::Help),
            "--headless" => options.headless = true,
            "--validation" => options.validation = Some(true),
            "--no-validation" => options.validation = Some(false),
            "-p" | "--profile" => {
                let name = args.next().ok_or_else(|| anyhow!("{arg} needs a value"))?;
                options.profile = Profile::from_name(&name)
                    .ok_or_else(|| anyhow!("unknown profile '{name}'"))?;
            }
            "-d" | "--device" => {
                let value = args.next().ok_or_else(|| anyhow!("{arg} needs a value"))?;
                let index = value
                    .parse()
                    .with_context(|| format!("invalid device index '{value}'"))?;
                options.device = Some(index);
            }
            "--app-name" => {
                options.app_name = args.next().ok_or_else(|| anyhow!("{arg} needs a value"))?;
            }
            other => bail!("unknown argument '{other}' (see --help)"),
        }
    }

    Ok(Command::Run(options))
}

pub fn print_help() {
    eprintln!(
        "raylab GPU probe

Creates a Vulkan instance, lists the GPUs, lets you pick one and creates a
logical device with the ray tracing features the chosen profile asks for.

USAGE:
    cargo run -p raylab-probe -- [OPTIONS]

OPTIONS:
    -p, --profile <NAME>    Requirement profile (default: ray-tracing)
                              baseline     buffer device address if available
                              preferred    ray tracing extensions if available
                              ray-tracing  ray tracing extensions required
    -d, --device <INDEX>    Use this device instead of prompting
    --validation            Enable the Khronos validation layer
    --no-validation         Disable the Khronos validation layer
                            Default: enabled in debug builds
    --headless              Do not open a window
    --app-name <NAME>       Application name reported to the driver
    -h, --help              Print this help message

ENVIRONMENT VARIABLES:
    RUST_LOG                Set log level (e.g., info, debug, trace)"
    );
}
