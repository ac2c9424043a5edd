//! One acquisition run against the system Vulkan driver.

use raylab_gpu::{ContextBuilder, DeviceChooser, FixedChooser, VulkanDriver};
use tracing::info;

use crate::chooser::ConsoleChooser;
use crate::options::Options;

/// Acquire a context, report it and release it again.
pub fn run(options: &Options) -> anyhow::Result<()> {
    let driver = VulkanDriver::load()?;

    let mut builder = ContextBuilder::new()
        .app_name(&options.app_name)
        .profile(options.profile);
    if let Some(validation) = options.validation {
        builder = builder.validation(validation);
    }

    let mut chooser: Box<dyn DeviceChooser> = match options.device {
        Some(index) => Box::new(FixedChooser::new(index)),
        None => Box::new(ConsoleChooser::stdio()),
    };

    let context = builder.build(driver, chooser.as_mut())?;

    println!("Selected Physical Device Info {}", context.summary());
    println!(
        "Graphics queue family : {}",
        context.graphics_queue_family()
    );
    for extension in context.device_extensions() {
        println!("  enabled {}", extension.to_string_lossy());
    }
    println!(
        "Feature chain : {:?}",
        context.features().kinds().collect::<Vec<_>>()
    );
    if context.instance().has_debug_messenger() {
        println!("Validation messages are forwarded to the log");
    }
    println!("Logical device created successfully!");

    info!("Releasing GPU context");
    Ok(())
}
