// Synth - minimal real-time audio output engine
// Opens the default output device and lets a caller-owned callback fill each buffer

// Module declarations
pub mod audio;
pub mod config;
pub mod engine;
pub mod error;
pub mod testing;

// Re-exports for convenience
pub use audio::{RenderStats, StreamFormat};
pub use config::{AppConfig, EngineConfig, FakeConfig, LoggingConfig};
pub use engine::{Engine, EngineState, FakeEngine};
pub use error::{AudioError, ConfigError, ErrorCode};

use std::str::FromStr;

use once_cell::sync::OnceCell;
use tracing::Level;

static LOGGING: OnceCell<()> = OnceCell::new();

fn parse_level(level: &str) -> Level {
    Level::from_str(level).unwrap_or(Level::INFO)
}

/// Install the global log subscriber
///
/// `level` is one of trace, debug, info, warn, error (unknown values fall
/// back to info). Records emitted through the `log` macros are forwarded to
/// the same subscriber. Only the first call has an effect.
#[cfg(not(target_os = "android"))]
pub fn init_logging(level: &str) {
    LOGGING.get_or_init(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(parse_level(level))
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    });
}

/// Install the global log subscriber writing to logcat
#[cfg(target_os = "android")]
pub fn init_logging(level: &str) {
    use tracing_subscriber::filter::LevelFilter;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    LOGGING.get_or_init(|| {
        if let Ok(layer) = tracing_android::layer("Synth") {
            let _ = tracing_subscriber::registry()
                .with(layer)
                .with(LevelFilter::from_level(parse_level(level)))
                .try_init();
        }
    });
}

/// JNI_OnLoad is called when the native library is loaded by Android
/// This function initializes the Android context required by oboe-rs
#[cfg(target_os = "android")]
#[no_mangle]
pub extern "system" fn JNI_OnLoad(
    vm: jni::JavaVM,
    _reserved: *mut std::ffi::c_void,
) -> jni::sys::jint {
    init_logging("debug");

    log::info!("JNI_OnLoad called - initializing Android context");

    // SAFETY: the JavaVM pointer handed to JNI_OnLoad stays valid for the
    // lifetime of the process. No Context object exists at load time.
    unsafe {
        ndk_context::initialize_android_context(
            vm.get_java_vm_pointer().cast(),
            std::ptr::null_mut(),
        );
    }

    jni::sys::JNI_VERSION_1_6
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("debug"), Level::DEBUG);
        assert_eq!(parse_level("WARN"), Level::WARN);
        assert_eq!(parse_level("nonsense"), Level::INFO);
    }

    #[test]
    fn test_init_logging_twice_is_harmless() {
        init_logging("debug");
        init_logging("trace");
        log::debug!("logging initialized");
    }
}
