//! Output plumbing: the downloader's stdout and stderr share one pipe so
//! progress and diagnostic lines are read in the order they were written.

use std::io;
use std::process::Stdio;
use tokio::io::AsyncRead;
use tokio::process::{Child, Command};

pub(super) type OutputStream = Box<dyn AsyncRead + Unpin + Send>;

/// Read side of the child's output, set up before spawning.
pub(super) struct OutputPipe {
    #[cfg(unix)]
    merged: tokio::net::unix::pipe::Receiver,
}

impl OutputPipe {
    /// Points both output streams of `cmd` at one pipe.
    ///
    /// The write ends live in `cmd`; drop it after spawning or the reader
    /// never sees end of file.
    #[cfg(unix)]
    pub(super) fn attach(cmd: &mut Command) -> io::Result<Self> {
        use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};

        let mut fds: [libc::c_int; 2] = [-1, -1];
        // SAFETY: pipe(2) fills `fds` with two new descriptors on success.
        if unsafe { libc::pipe(fds.as_mut_ptr()) } != 0 {
            return Err(io::Error::last_os_error());
        }
        // SAFETY: both descriptors were just created and are owned by nobody else.
        let (read_end, write_end) =
            unsafe { (OwnedFd::from_raw_fd(fds[0]), OwnedFd::from_raw_fd(fds[1])) };
        for fd in [&read_end, &write_end] {
            // Other children spawned meanwhile must not inherit the pipe.
            // SAFETY: fcntl on a descriptor we own.
            if unsafe { libc::fcntl(fd.as_raw_fd(), libc::F_SETFD, libc::FD_CLOEXEC) } != 0 {
                return Err(io::Error::last_os_error());
            }
        }
        let write_dup = write_end.try_clone()?;
        cmd.stdout(Stdio::from(write_end)).stderr(Stdio::from(write_dup));
        let merged = tokio::net::unix::pipe::Receiver::from_owned_fd(read_end)?;
        Ok(Self { merged })
    }

    #[cfg(not(unix))]
    pub(super) fn attach(cmd: &mut Command) -> io::Result<Self> {
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
        Ok(Self {})
    }

    /// The streams to read, primary first. On unix the second slot is empty.
    #[cfg(unix)]
    pub(super) fn streams(self, _child: &mut Child) -> (Option<OutputStream>, Option<OutputStream>) {
        (Some(Box::new(self.merged)), None)
    }

    #[cfg(not(unix))]
    pub(super) fn streams(self, child: &mut Child) -> (Option<OutputStream>, Option<OutputStream>) {
        let out = child.stdout.take().map(|s| Box::new(s) as OutputStream);
        let err = child.stderr.take().map(|s| Box::new(s) as OutputStream);
        (out, err)
    }
}
