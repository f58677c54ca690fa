use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use bootsplash_core::HelperError;
use tracing::{debug, warn};

use crate::HelperLayout;

/// How long the regeneration command may run before the operation is
/// reported as failed.
pub const REBUILD_TIMEOUT: Duration = Duration::from_secs(60);

const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Regenerate the boot image by running the configured command with its
/// fixed update flag and waiting for it to finish.
pub fn rebuild_boot_image(layout: &HelperLayout) -> Result<(), HelperError> {
    rebuild_with_timeout(layout.rebuild_command(), REBUILD_TIMEOUT)
}

pub(crate) fn rebuild_with_timeout(command: &Path, timeout: Duration) -> Result<(), HelperError> {
    let command_str = command.display().to_string();
    debug!(command = %command_str, "starting boot image rebuild");

    let mut child = Command::new(command)
        .arg("-u")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|source| HelperError::StartFailed {
            command: command_str.clone(),
            source,
        })?;

    let deadline = Instant::now() + timeout;
    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                // Signal-terminated processes carry no code; fold them into
                // the generic nonzero case.
                let code = status.code().unwrap_or(-1);
                return if code == 0 {
                    debug!(command = %command_str, "boot image rebuild finished");
                    Ok(())
                } else {
                    Err(HelperError::CommandFailed {
                        command: command_str,
                        code,
                    })
                };
            }
            Ok(None) => {
                if Instant::now() >= deadline {
                    // The process is left running; the operation still
                    // reports failure.
                    warn!(command = %command_str, "boot image rebuild deadline exceeded");
                    return Err(HelperError::TimedOut {
                        command: command_str,
                        seconds: timeout.as_secs(),
                    });
                }
                thread::sleep(POLL_INTERVAL);
            }
            Err(source) => {
                return Err(HelperError::Io {
                    context: format!("failed to poll {command_str}"),
                    source,
                })
            }
        }
    }
}
