//! Opens a folder in the desktop's file manager.

use std::io;
use std::path::Path;
use std::process::{Command, Stdio};

fn opener() -> &'static str {
    if cfg!(target_os = "windows") {
        "explorer"
    } else if cfg!(target_os = "macos") {
        "open"
    } else {
        "xdg-open"
    }
}

/// Spawns the platform opener for `path` without waiting for it.
///
/// The child is reaped on a background thread so it does not linger as a zombie.
pub fn reveal_folder(path: &Path) -> io::Result<()> {
    let mut child = Command::new(opener())
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    tracing::debug!(path = %path.display(), opener = opener(), "revealing folder");
    std::thread::spawn(move || {
        let _ = child.wait();
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opener_matches_platform() {
        let name = opener();
        #[cfg(target_os = "linux")]
        assert_eq!(name, "xdg-open");
        #[cfg(target_os = "macos")]
        assert_eq!(name, "open");
        #[cfg(target_os = "windows")]
        assert_eq!(name, "explorer");
        assert!(!name.is_empty());
    }
}
