use crate::env::Environment;
use crate::error::SysError;
use anyhow::Result;
use std::ffi::{OsStr, OsString};
use std::io::Write;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

/// Commands handled inside the shell process itself.
///
/// `args` is the full argument vector, `args[0]` being the built-in's own name.
/// Failures the user caused are written to the streams and are not errors here;
/// an `Err` means the streams themselves could not be written.
pub trait BuiltinCommand {
    /// Name the user types to invoke the command.
    fn name(&self) -> &'static str;

    fn execute(
        &self,
        args: &[OsString],
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<()>;
}

/// Terminate the shell with status 0. Arguments are ignored.
pub struct Exit;

impl BuiltinCommand for Exit {
    fn name(&self) -> &'static str {
        "exit"
    }

    fn execute(
        &self,
        _args: &[OsString],
        _stdout: &mut dyn Write,
        _stderr: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<()> {
        env.should_exit = true;
        Ok(())
    }
}

/// Change the working directory to `args[1]`. Further arguments are ignored.
pub struct Cd;

impl BuiltinCommand for Cd {
    fn name(&self) -> &'static str {
        "cd"
    }

    fn execute(
        &self,
        args: &[OsString],
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<()> {
        let Some(target) = args.get(1) else {
            writeln!(stderr, "cd: missing argument")?;
            return Ok(());
        };
        if let Err(errno) = env.change_dir(Path::new(target)) {
            log::debug!("cd {}: {}", target.to_string_lossy(), errno);
            writeln!(stdout, "{}", SysError(errno))?;
        }
        Ok(())
    }
}

/// Look up a built-in by the name in `arguments[0]`.
pub fn match_builtin(name: &OsStr) -> Option<&'static dyn BuiltinCommand> {
    match name.as_bytes() {
        b"exit" => Some(&Exit),
        b"cd" => Some(&Cd),
        _ => None,
    }
}
