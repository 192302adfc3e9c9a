/// Runtime environment checks
///
/// Playback needs a working default output. Without one the app shows a
/// static guidance screen and exits instead of starting.
use sysinfo::System;

use crate::error::AudioError;

pub const LOG_TARGET_STARTUP: &str = "fudge_judge::startup";

/// Guidance shown when no audio output can be opened
pub fn guidance(error: &AudioError) -> String {
    format!(
        "\
=====================================================
  Call the Judge: no audio output available
=====================================================

Every sound in this app is cut from the recording you
load, so it needs a working audio output to run.

  Reason: {error}

To fix this:
  1. Connect or enable a speaker or headphones.
  2. Make sure your sound server is running
     (PulseAudio / PipeWire on Linux).
  3. Start fudge-judge again.
"
    )
}

/// Log version and platform details at startup
pub fn log_runtime_environment() {
    let version = env!("CARGO_PKG_VERSION");
    let os_name = System::long_os_version()
        .or_else(System::name)
        .unwrap_or_else(|| "Unknown OS".to_string());
    let kernel = System::kernel_version().unwrap_or_else(|| "Unknown Kernel".to_string());
    let architecture = std::env::consts::ARCH;

    tracing::info!(target: LOG_TARGET_STARTUP, "Starting Fudge Judge v{} on ({})", version, architecture);
    tracing::info!(target: LOG_TARGET_STARTUP, "Operating System: {} (kernel {})", os_name, kernel);
}
