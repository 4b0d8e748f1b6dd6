use crate::builtin::match_builtin;
use crate::command::Command;
use crate::env::Environment;
use crate::error::SysError;
use crate::external::{Forked, NixProcess, ProcessControl, StdStream};
use anyhow::Result;
use nix::errno::Errno;
use std::ffi::{CString, OsStr};
use std::io::Write;
use std::os::unix::ffi::OsStrExt;

/// Exit status of a child that could not set up its redirections or start its program.
pub const CHILD_FAILURE: i32 = 1;

fn c_string(s: &OsStr) -> Result<CString, Errno> {
    CString::new(s.as_bytes()).map_err(|_| Errno::EINVAL)
}

/// A command converted to what the exec and open calls take.
struct Prepared {
    argv: Vec<CString>,
    input: Option<CString>,
    output: Option<CString>,
}

impl Prepared {
    /// Fails with `EINVAL` when an argument or path contains a NUL byte.
    fn from(command: &Command) -> Result<Self, Errno> {
        Ok(Prepared {
            argv: command
                .arguments
                .iter()
                .map(|a| c_string(a))
                .collect::<Result<_, _>>()?,
            input: command.input_path().map(c_string).transpose()?,
            output: command.output_path().map(c_string).transpose()?,
        })
    }
}

/// Runs parsed commands: built-ins in-process, everything else in a forked child.
pub struct Executor {
    process: Box<dyn ProcessControl>,
}

impl Executor {
    pub fn new(process: Box<dyn ProcessControl>) -> Self {
        Self { process }
    }

    /// Execute one command and return once it has finished.
    ///
    /// User-facing failures (bad `cd` target, unreadable redirect file, unknown
    /// program) are reported on the streams and do not produce an `Err`.
    pub fn execute(
        &mut self,
        command: &Command,
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<()> {
        let Some(name) = command.name() else {
            return Ok(());
        };
        if let Some(builtin) = match_builtin(name) {
            log::debug!("builtin: {}", command);
            return builtin.execute(&command.arguments, stdout, stderr, env);
        }
        self.spawn(command, stdout, stderr)
    }

    fn spawn(&mut self, command: &Command, stdout: &mut dyn Write, stderr: &mut dyn Write) -> Result<()> {
        let prepared = match Prepared::from(command) {
            Ok(prepared) => prepared,
            Err(errno) => {
                log::debug!("cannot pass {} to exec: {}", command, errno);
                writeln!(stdout, "{}", SysError(errno))?;
                return Ok(());
            }
        };

        // anything still buffered would otherwise be written twice
        stdout.flush()?;
        stderr.flush()?;

        match self.process.fork() {
            Err(errno) => {
                log::debug!("fork failed for {}: {}", command, errno);
                writeln!(stderr, "fork: {}", errno.desc())?;
            }
            Ok(Forked::Child) => {
                if let Err(err) = self.run_child(&prepared) {
                    self.process.report(&err);
                    self.process.exit_child(CHILD_FAILURE);
                }
            }
            Ok(Forked::Parent(pid)) => {
                log::debug!("spawned {} as pid {}", command, pid);
                match self.process.wait(pid) {
                    Ok(status) => log::debug!("pid {} finished: {:?}", pid, status),
                    Err(errno) => log::warn!("waiting for pid {} failed: {}", pid, errno),
                }
            }
        }
        Ok(())
    }

    /// The child's half: redirect, then replace the program image.
    fn run_child(&mut self, prepared: &Prepared) -> Result<(), SysError> {
        if let Some(path) = &prepared.input {
            self.process.redirect(StdStream::Input, path)?;
        }
        if let Some(path) = &prepared.output {
            self.process.redirect(StdStream::Output, path)?;
        }
        self.process.exec(&prepared.argv)?;
        Ok(())
    }
}

impl Default for Executor {
    fn default() -> Self {
        Self::new(Box::new(NixProcess))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::env::MemoryWorkingDir;
    use crate::parser::parse_line;
    use nix::sys::wait::WaitStatus;
    use nix::unistd::Pid;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::ffi::CStr;
    use std::path::PathBuf;
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub(crate) enum Call {
        Fork,
        Redirect(StdStream, String),
        Exec(Vec<String>),
        Wait(Pid),
        Report(String),
        ExitChild(i32),
    }

    /// Scripted stand-in for the real process calls.
    #[derive(Clone)]
    pub(crate) struct FakeProcess {
        pub calls: Rc<RefCell<Vec<Call>>>,
        pub fork_result: Result<Forked, Errno>,
        pub failing_paths: HashMap<String, Errno>,
        pub exec_error: Option<Errno>,
    }

    impl FakeProcess {
        pub fn parent() -> Self {
            FakeProcess {
                calls: Rc::new(RefCell::new(Vec::new())),
                fork_result: Ok(Forked::Parent(Pid::from_raw(4242))),
                failing_paths: HashMap::new(),
                exec_error: None,
            }
        }

        pub fn child() -> Self {
            FakeProcess {
                fork_result: Ok(Forked::Child),
                ..Self::parent()
            }
        }

        pub fn calls(&self) -> Vec<Call> {
            self.calls.borrow().clone()
        }
    }

    impl ProcessControl for FakeProcess {
        fn fork(&mut self) -> Result<Forked, Errno> {
            self.calls.borrow_mut().push(Call::Fork);
            self.fork_result
        }

        fn redirect(&mut self, stream: StdStream, path: &CStr) -> Result<(), Errno> {
            let path = path.to_string_lossy().into_owned();
            let result = match self.failing_paths.get(&path) {
                Some(errno) => Err(*errno),
                None => Ok(()),
            };
            self.calls.borrow_mut().push(Call::Redirect(stream, path));
            result
        }

        fn exec(&mut self, argv: &[CString]) -> Result<(), Errno> {
            let argv = argv.iter().map(|a| a.to_string_lossy().into_owned()).collect();
            self.calls.borrow_mut().push(Call::Exec(argv));
            match self.exec_error {
                Some(errno) => Err(errno),
                None => Ok(()),
            }
        }

        fn wait(&mut self, child: Pid) -> Result<WaitStatus, Errno> {
            self.calls.borrow_mut().push(Call::Wait(child));
            Ok(WaitStatus::Exited(child, 0))
        }

        fn report(&mut self, error: &SysError) {
            self.calls.borrow_mut().push(Call::Report(error.to_string()));
        }

        fn exit_child(&mut self, status: i32) {
            self.calls.borrow_mut().push(Call::ExitChild(status));
        }
    }

    fn test_env() -> Environment {
        Environment::with_working_dir(Box::new(MemoryWorkingDir::new("/home/user")))
    }

    fn run(process: &FakeProcess, line: impl AsRef<[u8]>) -> (String, String, Environment) {
        let mut executor = Executor::new(Box::new(process.clone()));
        let mut env = test_env();
        let mut out = Vec::new();
        let mut err = Vec::new();
        executor
            .execute(&parse_line(line), &mut out, &mut err, &mut env)
            .unwrap();
        (
            String::from_utf8(out).unwrap(),
            String::from_utf8(err).unwrap(),
            env,
        )
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_command_does_nothing() {
        let process = FakeProcess::parent();
        let (out, err, _) = run(&process, "  \n");
        assert!(process.calls().is_empty());
        assert_eq!((out.as_str(), err.as_str()), ("", ""));
    }

    #[test]
    fn test_redirect_only_line_does_nothing() {
        let process = FakeProcess::parent();
        run(&process, "> out.txt");
        assert!(process.calls().is_empty());
    }

    #[test]
    fn test_builtins_never_fork() {
        let process = FakeProcess::parent();
        let (_, err, env) = run(&process, "cd > ignored.txt");
        assert!(process.calls().is_empty());
        assert_eq!(err, "cd: missing argument\n");
        assert_eq!(env.current_dir(), Ok(PathBuf::from("/home/user")));

        let (_, _, env) = run(&process, "exit now");
        assert!(process.calls().is_empty());
        assert!(env.should_exit);
    }

    #[test]
    fn test_parent_waits_for_its_child() {
        let process = FakeProcess::parent();
        let (out, err, _) = run(&process, "ls -l");
        assert_eq!(
            process.calls(),
            vec![Call::Fork, Call::Wait(Pid::from_raw(4242))]
        );
        assert_eq!((out.as_str(), err.as_str()), ("", ""));
    }

    #[test]
    fn test_fork_failure_is_reported_and_abandoned() {
        let mut process = FakeProcess::parent();
        process.fork_result = Err(Errno::EAGAIN);
        let (out, err, env) = run(&process, "ls");
        assert_eq!(process.calls(), vec![Call::Fork]);
        assert_eq!(out, "");
        assert_eq!(err, format!("fork: {}\n", Errno::EAGAIN.desc()));
        assert!(!env.should_exit);
    }

    #[test]
    fn test_nul_byte_is_rejected_before_forking() {
        let process = FakeProcess::parent();
        let (out, err, _) = run(&process, b"echo a\0b\n");
        assert!(process.calls().is_empty());
        assert_eq!(out, "Error 22 (Invalid argument)\n");
        assert_eq!(err, "");

        let (out, _, _) = run(&process, b"echo hi > out\0.txt");
        assert!(process.calls().is_empty());
        assert_eq!(out, "Error 22 (Invalid argument)\n");
    }

    #[test]
    fn test_child_redirects_input_then_output_then_execs() {
        let process = FakeProcess::child();
        run(&process, "sort -r > out.txt < in.txt");
        assert_eq!(
            process.calls(),
            vec![
                Call::Fork,
                Call::Redirect(StdStream::Input, "in.txt".to_string()),
                Call::Redirect(StdStream::Output, "out.txt".to_string()),
                Call::Exec(strings(&["sort", "-r"])),
            ]
        );
    }

    #[test]
    fn test_child_skips_missing_redirect_target() {
        let process = FakeProcess::child();
        run(&process, "cat <");
        assert_eq!(
            process.calls(),
            vec![Call::Fork, Call::Exec(strings(&["cat"]))]
        );
    }

    #[test]
    fn test_child_input_open_failure_stops_before_exec() {
        let mut process = FakeProcess::child();
        process
            .failing_paths
            .insert("missing.txt".to_string(), Errno::ENOENT);
        let (out, _, _) = run(&process, "cat < missing.txt > out.txt");
        // the child reports on its own descriptor 1, not the shell's stream
        assert_eq!(out, "");
        assert_eq!(
            process.calls(),
            vec![
                Call::Fork,
                Call::Redirect(StdStream::Input, "missing.txt".to_string()),
                Call::Report("Error 2 (No such file or directory)".to_string()),
                Call::ExitChild(CHILD_FAILURE),
            ]
        );
    }

    #[test]
    fn test_child_output_open_failure() {
        let mut process = FakeProcess::child();
        process
            .failing_paths
            .insert("/root.txt".to_string(), Errno::EACCES);
        run(&process, "echo hi > /root.txt");
        assert_eq!(
            process.calls()[2..],
            [
                Call::Report("Error 13 (Permission denied)".to_string()),
                Call::ExitChild(CHILD_FAILURE),
            ]
        );
    }

    #[test]
    fn test_child_exec_failure_exits_nonzero() {
        let mut process = FakeProcess::child();
        process.exec_error = Some(Errno::ENOENT);
        let (out, err, _) = run(&process, "no-such-program arg");
        assert_eq!((out.as_str(), err.as_str()), ("", ""));
        assert_eq!(
            process.calls(),
            vec![
                Call::Fork,
                Call::Exec(strings(&["no-such-program", "arg"])),
                Call::Report("Error 2 (No such file or directory)".to_string()),
                Call::ExitChild(CHILD_FAILURE),
            ]
        );
    }

    #[test]
    fn test_non_utf8_arguments_reach_exec() {
        let process = FakeProcess::child();
        run(&process, b"ls /caf\xe9");
        assert_eq!(
            process.calls(),
            vec![Call::Fork, Call::Exec(strings(&["ls", "/caf\u{fffd}"]))]
        );
    }
}
