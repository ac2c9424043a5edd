//! Validation layer messages routed into `tracing`.

use std::borrow::Cow;
use std::ffi::{c_void, CStr};

use ash::vk;

/// Debug messenger and the loader it was created with.
pub struct DebugMessenger {
    loader: ash::ext::debug_utils::Instance,
    messenger: vk::DebugUtilsMessengerEXT,
}

impl DebugMessenger {
    /// Attach a messenger reporting warnings and errors of every type.
    ///
    /// # Safety
    /// `instance` must have been created with `VK_EXT_debug_utils` enabled.
    pub unsafe fn new(
        entry: &ash::Entry,
        instance: &ash::Instance,
    ) -> ash::prelude::VkResult<Self> {
        let loader = ash::ext::debug_utils::Instance::new(entry, instance);
        let create_info = messenger_create_info();
        let messenger = unsafe { loader.create_debug_utils_messenger(&create_info, None) }?;
        Ok(Self { loader, messenger })
    }

    /// # Safety
    /// Must be called before the owning instance is destroyed, and only once.
    pub unsafe fn destroy(&self) {
        unsafe { self.loader.destroy_debug_utils_messenger(self.messenger, None) };
    }
}

fn messenger_create_info() -> vk::DebugUtilsMessengerCreateInfoEXT<'static> {
    vk::DebugUtilsMessengerCreateInfoEXT::default()
        .message_severity(
            vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
        )
        .message_type(
            vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
        )
        .pfn_user_callback(Some(validation_callback))
}

fn message_type_name(message_type: vk::DebugUtilsMessageTypeFlagsEXT) -> &'static str {
    match message_type {
        vk::DebugUtilsMessageTypeFlagsEXT::GENERAL => "general",
        vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION => "validation",
        vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE => "performance",
        _ => "unknown",
    }
}

unsafe extern "system" fn validation_callback(
    severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT<'_>,
    _user_data: *mut c_void,
) -> vk::Bool32 {
    // SAFETY: the loader passes either null or valid callback data whose message
    // is a NUL-terminated string for the duration of the call.
    let message: Cow<'_, str> = match unsafe { callback_data.as_ref() } {
        Some(data) if !data.p_message.is_null() => {
            unsafe { CStr::from_ptr(data.p_message) }.to_string_lossy()
        }
        _ => Cow::Borrowed("<no message>"),
    };
    let kind = message_type_name(message_type);

    match severity {
        vk::DebugUtilsMessageSeverityFlagsEXT::ERROR => {
            tracing::error!(target: "raylab::validation", "[{kind}] {message}");
        }
        vk::DebugUtilsMessageSeverityFlagsEXT::WARNING => {
            tracing::warn!(target: "raylab::validation", "[{kind}] {message}");
        }
        vk::DebugUtilsMessageSeverityFlagsEXT::INFO => {
            tracing::info!(target: "raylab::validation", "[{kind}] {message}");
        }
        _ => tracing::trace!(target: "raylab::validation", "[{kind}] {message}"),
    }

    vk::FALSE
}
