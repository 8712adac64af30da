//! Builder for executing external tool commands with timeout support.

use crate::{Error, Result};
use std::ffi::{OsStr, OsString};
use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Default command timeout: 5 minutes.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Interval between exit checks while waiting on a child.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Output captured from a tool execution.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Process exit status.
    pub status: ExitStatus,
    /// Captured standard output (lossy UTF-8).
    pub stdout: String,
    /// Captured standard error (lossy UTF-8).
    pub stderr: String,
}

/// A builder for constructing and executing external tool invocations.
///
/// Execution blocks the calling thread until the process exits or the
/// timeout elapses, in which case the process is killed.
///
/// # Example
///
/// ```no_run
/// use stickerforge_av::ToolCommand;
///
/// let output = ToolCommand::new("ffprobe")
///     .args(["-v", "quiet", "-print_format", "json", "-show_format"])
///     .arg("/tmp/42.webm")
///     .execute()?;
/// println!("{}", output.stdout);
/// # Ok::<(), stickerforge_av::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<OsString>,
    timeout: Duration,
}

impl ToolCommand {
    /// Create a new command for the given program path.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Append a single argument.
    pub fn arg(&mut self, s: impl AsRef<OsStr>) -> &mut Self {
        self.args.push(s.as_ref().to_os_string());
        self
    }

    /// Append multiple arguments.
    pub fn args<I, S>(&mut self, iter: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(iter.into_iter().map(|s| s.as_ref().to_os_string()));
        self
    }

    /// Set the maximum execution time.
    pub fn timeout(&mut self, d: Duration) -> &mut Self {
        self.timeout = d;
        self
    }

    /// Arguments added so far.
    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }

    /// Name of the program (file name of the executable path).
    pub fn program_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.program.to_string_lossy().to_string())
    }

    /// Execute the command, capturing stdout and stderr.
    ///
    /// # Errors
    ///
    /// - [`Error::ToolNotFound`] if the executable cannot be spawned because
    ///   it does not exist.
    /// - [`Error::ToolFailed`] if the process exits with a non-zero status;
    ///   the message carries the exit status and both captured streams.
    /// - [`Error::ToolFailed`] if the process outlives the timeout; it is
    ///   killed and the message names the timeout.
    pub fn execute(&self) -> Result<ToolOutput> {
        let program_name = self.program_name();
        tracing::trace!(tool = %program_name, args = ?self.args, "spawning");

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    Error::tool_not_found(program_name.clone())
                } else {
                    Error::tool_failed(program_name.clone(), format!("failed to spawn: {e}"))
                }
            })?;

        // drain both pipes so a chatty child never blocks on a full buffer
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = match self.wait(&mut child) {
            Ok(Some(status)) => status,
            Ok(None) => {
                tracing::warn!(tool = %program_name, timeout = ?self.timeout, "killing timed out tool");
                let _ = child.kill();
                let _ = child.wait();
                return Err(Error::tool_failed(
                    program_name,
                    format!("timed out after {:?}", self.timeout),
                ));
            }
            Err(e) => {
                let _ = child.kill();
                return Err(Error::tool_failed(
                    program_name,
                    format!("I/O error waiting for process: {e}"),
                ));
            }
        };

        let tool_output = ToolOutput {
            status,
            stdout: collect(stdout),
            stderr: collect(stderr),
        };

        if !status.success() {
            return Err(Error::tool_failed(
                program_name,
                format!(
                    "exited with {}\nstderr: {}\nstdout: {}",
                    status,
                    tool_output.stderr.trim(),
                    tool_output.stdout.trim()
                ),
            ));
        }

        Ok(tool_output)
    }

    /// Wait for the child to exit; `None` once the timeout has elapsed.
    fn wait(&self, child: &mut Child) -> std::io::Result<Option<ExitStatus>> {
        let deadline = Instant::now() + self.timeout;
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(Some(status));
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(None);
            }
            thread::sleep(POLL_INTERVAL.min(deadline - now));
        }
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<Vec<u8>>> {
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            buf
        })
    })
}

fn collect(reader: Option<JoinHandle<Vec<u8>>>) -> String {
    reader
        .and_then(|h| h.join().ok())
        .map(|buf| String::from_utf8_lossy(&buf).to_string())
        .unwrap_or_default()
}
