//! Subprocess invocation.
//!
//! External steps (bootstrap, the build tool) are described by an
//! [`Invocation`] and executed through a [`CommandRunner`]. Environment
//! overrides live on the invocation and only ever reach that one child
//! process; the parent environment is never mutated.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::error::BuildError;

/// Number of log lines echoed when a logged command fails.
const FAILURE_TAIL_LINES: usize = 20;

/// A fully described subprocess call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    /// Variables set for the child only.
    pub env: Vec<(String, String)>,
    /// Variables removed from the child's inherited environment.
    pub env_remove: Vec<String>,
}

impl Invocation {
    pub fn new(program: impl Into<PathBuf>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            cwd: cwd.into(),
            ..Self::default()
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn env_remove(mut self, key: impl Into<String>) -> Self {
        self.env_remove.push(key.into());
        self
    }

    /// Shell-like rendering for logs.
    pub fn display(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

/// Outcome of a finished subprocess.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunStatus {
    pub success: bool,
    /// Exit code, `None` if the process was killed by a signal.
    pub code: Option<i32>,
}

impl RunStatus {
    pub fn from_code(code: i32) -> Self {
        Self {
            success: code == 0,
            code: Some(code),
        }
    }
}

impl From<std::process::ExitStatus> for RunStatus {
    fn from(status: std::process::ExitStatus) -> Self {
        Self {
            success: status.success(),
            code: status.code(),
        }
    }
}

/// Executes invocations. Implemented by [`ProcessRunner`] for real builds
/// and by recording fakes in tests.
pub trait CommandRunner {
    /// Run to completion.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Spawn`] if the process cannot be started. A
    /// nonzero exit is *not* an error here; it is reported through
    /// [`RunStatus`] so the caller can attribute it to a stage.
    fn run(&self, invocation: &Invocation) -> Result<RunStatus, BuildError>;
}

impl<T: CommandRunner + ?Sized> CommandRunner for &T {
    fn run(&self, invocation: &Invocation) -> Result<RunStatus, BuildError> {
        (**self).run(invocation)
    }
}

/// Runs invocations as real child processes.
///
/// With a log path, stdout and stderr of every invocation are appended to
/// that file and the tail is echoed when a command fails. Without one, output
/// streams to the terminal.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    log_path: Option<PathBuf>,
}

impl ProcessRunner {
    /// Stream child output to the terminal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append child output to `log_path`.
    pub fn with_log(log_path: impl Into<PathBuf>) -> Self {
        Self {
            log_path: Some(log_path.into()),
        }
    }

    pub fn log_path(&self) -> Option<&Path> {
        self.log_path.as_deref()
    }

    fn command(invocation: &Invocation) -> Command {
        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args).current_dir(&invocation.cwd);
        for key in &invocation.env_remove {
            cmd.env_remove(key);
        }
        for (key, value) in &invocation.env {
            cmd.env(key, value);
        }
        cmd
    }

    fn open_log(path: &Path) -> Result<File, BuildError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(OpenOptions::new().create(true).append(true).open(path)?)
    }
}

impl CommandRunner for ProcessRunner {
    fn run(&self, invocation: &Invocation) -> Result<RunStatus, BuildError> {
        tracing::debug!(cwd = %invocation.cwd.display(), "running {}", invocation.display());
        let mut cmd = Self::command(invocation);

        let spawn_err = |source: std::io::Error| BuildError::Spawn {
            program: invocation.program.display().to_string(),
            source,
        };

        let status = match &self.log_path {
            None => cmd.status().map_err(spawn_err)?,
            Some(log_path) => {
                let log_file = Self::open_log(log_path)?;
                cmd.stdout(Stdio::from(log_file.try_clone()?))
                    .stderr(Stdio::from(log_file))
                    .status()
                    .map_err(spawn_err)?
            }
        };

        let status = RunStatus::from(status);
        if !status.success {
            if let Some(log_path) = &self.log_path {
                if let Ok(tail) = read_last_lines(log_path, FAILURE_TAIL_LINES) {
                    tracing::error!(
                        "{} failed. Last {FAILURE_TAIL_LINES} lines:\n{tail}\nFull log: {}",
                        invocation.display(),
                        log_path.display()
                    );
                }
            }
        }
        Ok(status)
    }
}

/// Read the last N lines from a file efficiently.
///
/// Instead of loading the entire file, we seek to near the end and read a fixed-size
/// tail buffer. Build logs for the full library tree run to many megabytes.
pub fn read_last_lines(path: &Path, n: usize) -> std::io::Result<String> {
    use std::io::{Read, Seek, SeekFrom};

    // Read at most 16KB from the end (enough for ~400 lines at 40 chars each)
    const TAIL_SIZE: u64 = 16 * 1024;

    let mut file = File::open(path)?;
    let file_len = file.metadata()?.len();

    let seek_pos = file_len.saturating_sub(TAIL_SIZE);
    file.seek(SeekFrom::Start(seek_pos))?;

    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;
    let buffer = String::from_utf8_lossy(&bytes).into_owned();

    // If we seeked mid-file, skip the first (partial) line
    let content = if seek_pos > 0 {
        buffer.find('\n').map_or(&buffer[..], |idx| &buffer[idx + 1..])
    } else {
        &buffer[..]
    };

    let lines: Vec<&str> = content.lines().collect();
    let start = lines.len().saturating_sub(n);
    Ok(lines[start..].join("\n"))
}
