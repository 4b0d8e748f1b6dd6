use nix::errno::Errno;

/// A failed system call, rendered the way the shell reports it to the user:
/// `Error <code> (<description>)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Error {} ({})", code(.0), .0.desc())]
pub struct SysError(pub Errno);

fn code(errno: &Errno) -> i32 {
    *errno as i32
}

impl From<Errno> for SysError {
    fn from(errno: Errno) -> Self {
        SysError(errno)
    }
}
