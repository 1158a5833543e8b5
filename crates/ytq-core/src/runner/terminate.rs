//! Process termination: polite signal first, forced kill as the escalation.
//!
//! On unix the downloader runs in its own process group so the signal also
//! reaches helpers it spawned (ffmpeg); otherwise they could keep the output
//! pipes open after the downloader is gone.

use tokio::process::{Child, Command};

/// Puts the child in its own process group (unix) and hides console windows (Windows).
pub(super) fn configure(cmd: &mut Command) {
    #[cfg(unix)]
    {
        cmd.process_group(0);
    }
    #[cfg(windows)]
    {
        // Prevent console windows from stealing focus on Windows while running tools.
        const CREATE_NO_WINDOW: u32 = 0x0800_0000;
        cmd.creation_flags(CREATE_NO_WINDOW);
    }
}

/// Asks the child to exit. Returns false when no graceful mechanism applies,
/// in which case the caller goes straight to [`force_kill`].
pub(super) fn request_graceful(child: &Child) -> bool {
    #[cfg(unix)]
    {
        signal_group(child, libc::SIGTERM)
    }
    #[cfg(not(unix))]
    {
        let _ = child;
        false
    }
}

/// Kills the child (and on unix its whole process group). Errors are logged only.
pub(super) fn force_kill(child: &mut Child) {
    #[cfg(unix)]
    {
        signal_group(child, libc::SIGKILL);
    }
    if let Err(e) = child.start_kill() {
        tracing::warn!("forced kill failed: {}", e);
    }
}

#[cfg(unix)]
fn signal_group(child: &Child, signal: libc::c_int) -> bool {
    // None once the child has been reaped; its pid may already be reused.
    let Some(pid) = child.id() else {
        return false;
    };
    let Ok(pgid) = libc::pid_t::try_from(pid) else {
        return false;
    };
    // SAFETY: kill(2) only sends a signal; a negative pid targets the group
    // created for this child by `configure`.
    let rc = unsafe { libc::kill(-pgid, signal) };
    if rc != 0 {
        tracing::debug!(pid, signal, "kill: {}", std::io::Error::last_os_error());
    }
    rc == 0
}
