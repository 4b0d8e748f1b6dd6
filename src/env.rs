use nix::errno::Errno;
use nix::unistd;
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

/// Access to the working directory the shell and its children run in.
///
/// The real implementation talks to the operating system; tests plug in
/// [`MemoryWorkingDir`] so `cd` and the prompt can be checked without touching
/// the process state.
pub trait WorkingDir {
    /// Absolute path of the current directory.
    fn current(&self) -> Result<PathBuf, Errno>;

    /// Change the current directory. On failure the directory is left unchanged.
    fn change(&mut self, path: &Path) -> Result<(), Errno>;
}

/// The process-wide working directory, inherited by every forked child.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessWorkingDir;

impl WorkingDir for ProcessWorkingDir {
    fn current(&self) -> Result<PathBuf, Errno> {
        unistd::getcwd()
    }

    fn change(&mut self, path: &Path) -> Result<(), Errno> {
        unistd::chdir(path)
    }
}

/// An in-memory directory tree: only the registered directories exist.
#[derive(Debug, Clone)]
pub struct MemoryWorkingDir {
    current: PathBuf,
    dirs: HashSet<PathBuf>,
}

impl MemoryWorkingDir {
    /// Start in `start`, which is registered as existing along with its ancestors.
    pub fn new(start: impl Into<PathBuf>) -> Self {
        let current = start.into();
        let mut this = MemoryWorkingDir {
            current: current.clone(),
            dirs: HashSet::new(),
        };
        this.add_dir(current);
        this
    }

    /// Register `dir` (and its ancestors) as existing.
    pub fn add_dir(&mut self, dir: impl Into<PathBuf>) {
        let dir = dir.into();
        for ancestor in dir.ancestors() {
            self.dirs.insert(ancestor.to_path_buf());
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        let mut resolved = if path.is_absolute() {
            PathBuf::from("/")
        } else {
            self.current.clone()
        };
        for component in path.components() {
            match component {
                Component::ParentDir => {
                    resolved.pop();
                }
                Component::Normal(part) => resolved.push(part),
                Component::RootDir | Component::CurDir | Component::Prefix(_) => {}
            }
        }
        resolved
    }
}

impl WorkingDir for MemoryWorkingDir {
    fn current(&self) -> Result<PathBuf, Errno> {
        Ok(self.current.clone())
    }

    fn change(&mut self, path: &Path) -> Result<(), Errno> {
        if path.as_os_str().is_empty() {
            return Err(Errno::ENOENT);
        }
        let target = self.resolve(path);
        if self.dirs.contains(&target) {
            self.current = target;
            Ok(())
        } else {
            Err(Errno::ENOENT)
        }
    }
}

/// State that outlives a single command.
///
/// Only two things survive between loop iterations: the working directory and
/// whether `exit` has been requested.
pub struct Environment {
    cwd: Box<dyn WorkingDir>,
    /// Set by `exit`; the shell loop stops before printing another prompt.
    pub should_exit: bool,
}

impl Environment {
    /// Environment backed by the real process working directory.
    pub fn new() -> Self {
        Self::with_working_dir(Box::new(ProcessWorkingDir))
    }

    pub fn with_working_dir(cwd: Box<dyn WorkingDir>) -> Self {
        Self {
            cwd,
            should_exit: false,
        }
    }

    pub fn current_dir(&self) -> Result<PathBuf, Errno> {
        self.cwd.current()
    }

    pub fn change_dir(&mut self, path: &Path) -> Result<(), Errno> {
        self.cwd.change(path)
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
