use crate::error::SysError;
use nix::errno::Errno;
use nix::fcntl::{self, OFlag};
use nix::sys::stat::Mode;
use nix::sys::wait::{self, WaitStatus};
use nix::unistd::{self, ForkResult, Pid};
use std::ffi::{CStr, CString};
use std::io::{self, Write};
use std::os::unix::io::RawFd;

/// Which standard descriptor a redirection replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StdStream {
    Input,
    Output,
}

impl StdStream {
    fn fd(self) -> RawFd {
        match self {
            StdStream::Input => libc::STDIN_FILENO,
            StdStream::Output => libc::STDOUT_FILENO,
        }
    }
}

/// Result of a successful fork, seen from each side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Forked {
    Parent(Pid),
    Child,
}

/// Process creation and image replacement, as used by the executor.
///
/// After [`fork`](ProcessControl::fork) returns [`Forked::Child`], only `redirect`,
/// `exec`, `report` and `exit_child` are called on that side. Everything they take
/// is prepared before the fork, so the child does not allocate.
pub trait ProcessControl {
    fn fork(&mut self) -> Result<Forked, Errno>;

    /// Open `path` and install it as the given standard descriptor. Output files are
    /// created or truncated with mode 0644.
    fn redirect(&mut self, stream: StdStream, path: &CStr) -> Result<(), Errno>;

    /// Replace the current program image, searching `PATH` for `argv[0]` unless it
    /// contains a `/`. The real implementation only returns on failure; `Ok` is only
    /// ever produced by stand-ins that cannot replace themselves.
    fn exec(&mut self, argv: &[CString]) -> Result<(), Errno>;

    /// Block until `child` terminates.
    fn wait(&mut self, child: Pid) -> Result<WaitStatus, Errno>;

    /// Write a failure to the child's standard output (descriptor 1, which may
    /// already point at a redirect target).
    fn report(&mut self, error: &SysError);

    /// Terminate the forked child without running any of the parent's cleanup.
    fn exit_child(&mut self, status: i32);
}

/// [`ProcessControl`] on top of the POSIX calls.
#[derive(Debug, Default, Clone, Copy)]
pub struct NixProcess;

impl ProcessControl for NixProcess {
    fn fork(&mut self) -> Result<Forked, Errno> {
        // SAFETY: the child only opens files, moves descriptors, execs or exits.
        match unsafe { unistd::fork() }? {
            ForkResult::Parent { child } => Ok(Forked::Parent(child)),
            ForkResult::Child => Ok(Forked::Child),
        }
    }

    fn redirect(&mut self, stream: StdStream, path: &CStr) -> Result<(), Errno> {
        let fd = match stream {
            StdStream::Input => fcntl::open(path, OFlag::O_RDONLY, Mode::empty())?,
            StdStream::Output => fcntl::open(
                path,
                OFlag::O_WRONLY | OFlag::O_CREAT | OFlag::O_TRUNC,
                Mode::S_IRUSR | Mode::S_IWUSR | Mode::S_IRGRP | Mode::S_IROTH,
            )?,
        };
        let target = stream.fd();
        if fd != target {
            unistd::dup2(fd, target)?;
            unistd::close(fd)?;
        }
        Ok(())
    }

    fn exec(&mut self, argv: &[CString]) -> Result<(), Errno> {
        let program = argv.first().ok_or(Errno::EINVAL)?;
        match unistd::execvp(program, argv) {
            Ok(never) => match never {},
            Err(errno) => Err(errno),
        }
    }

    fn wait(&mut self, child: Pid) -> Result<WaitStatus, Errno> {
        wait::waitpid(child, None)
    }

    fn report(&mut self, error: &SysError) {
        let mut stdout = io::stdout().lock();
        let _ = writeln!(stdout, "{}", error);
        let _ = stdout.flush();
    }

    fn exit_child(&mut self, status: i32) {
        // SAFETY: _exit only ends the calling process.
        unsafe { libc::_exit(status) }
    }
}
