//! Launch the validated program and capture its merged output
//!
//! ## ProcessRunner Trait
//!
//! The controller depends on [`ProcessRunner`] rather than on
//! `std::process` directly, so selection and evaluation logic can be driven by
//! a scripted runner in tests. [`CommandRunner`] is the real implementation.
//!
//! ## Capture
//!
//! stdout and stderr share one anonymous pipe, so lines appear in the order the
//! child wrote them. Only the last `max_output_bytes` are retained: the status
//! marker lives at the end of the stream.

use std::io::{self, Read};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::registry::ResolvedArg;

/// Default retained output per case (1 MiB).
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 1024 * 1024;

/// How long to wait for the output reader once the child has been reaped.
const READER_GRACE: Duration = Duration::from_secs(5);
const POLL_INTERVAL: Duration = Duration::from_millis(20);

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("failed to launch `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to set up output capture: {0}")]
    Capture(#[source] io::Error),

    #[error("failed waiting for child: {0}")]
    Wait(#[source] io::Error),
}

/// Program identity and the fixed arguments placed before the case flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub prefix: Vec<String>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            prefix: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.prefix.push(arg.into());
        self
    }

    /// Arguments after the program name: the prefix, then `--flag value` pairs.
    ///
    /// A flag whose value is empty is passed on its own.
    pub fn argv(&self, args: &[ResolvedArg]) -> Vec<String> {
        let mut argv = self.prefix.clone();
        for arg in args {
            argv.push(format!("--{}", arg.flag));
            if !arg.value.is_empty() {
                argv.push(arg.value.clone());
            }
        }
        argv
    }

    /// Space-joined rendering for logs.
    pub fn display(&self, args: &[ResolvedArg]) -> String {
        std::iter::once(self.program.clone())
            .chain(self.argv(args))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// What a finished (or killed) child left behind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedRun {
    /// `None` only if the platform reported neither a code nor a signal.
    pub exit_code: Option<i32>,
    pub output: Vec<u8>,
    pub truncated: bool,
    pub timed_out: Option<Duration>,
}

/// Runs one case invocation to completion.
pub trait ProcessRunner {
    fn run(&self, args: &[ResolvedArg]) -> Result<CapturedRun, RunnerError>;
}

impl<T: ProcessRunner + ?Sized> ProcessRunner for &T {
    fn run(&self, args: &[ResolvedArg]) -> Result<CapturedRun, RunnerError> {
        (**self).run(args)
    }
}

/// Spawns the validated program with `std::process::Command`.
#[derive(Debug, Clone)]
pub struct CommandRunner {
    invocation: Invocation,
    timeout: Option<Duration>,
    max_output_bytes: usize,
}

impl CommandRunner {
    pub fn new(invocation: Invocation) -> Self {
        Self {
            invocation,
            timeout: None,
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_output_bytes(mut self, max: usize) -> Self {
        self.max_output_bytes = max;
        self
    }

    pub fn invocation(&self) -> &Invocation {
        &self.invocation
    }
}

impl ProcessRunner for CommandRunner {
    fn run(&self, args: &[ResolvedArg]) -> Result<CapturedRun, RunnerError> {
        tracing::debug!("CMD:{}", self.invocation.display(args));

        let (reader, writer) = io::pipe().map_err(RunnerError::Capture)?;
        let mut child = {
            // `cmd` owns both write ends; it must be dropped before reading to EOF
            let mut cmd = Command::new(&self.invocation.program);
            cmd.args(self.invocation.argv(args));
            cmd.stdin(Stdio::null());
            cmd.stdout(writer.try_clone().map_err(RunnerError::Capture)?);
            cmd.stderr(writer);
            cmd.spawn().map_err(|source| RunnerError::Spawn {
                program: self.invocation.program.clone(),
                source,
            })?
        };

        let cap = self.max_output_bytes;
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let _ = tx.send(read_tail_capped(reader, cap));
        });

        let (status, timed_out) = wait_with_timeout(&mut child, self.timeout)?;

        let (output, truncated) = match rx.recv_timeout(READER_GRACE) {
            Ok(Ok(captured)) => captured,
            Ok(Err(e)) => {
                tracing::warn!("error reading child output: {}", e);
                (Vec::new(), false)
            }
            Err(_) => {
                // A grandchild may still hold the pipe open; leave the reader behind
                tracing::warn!("output reader did not finish within {:?}", READER_GRACE);
                (Vec::new(), false)
            }
        };

        Ok(CapturedRun {
            exit_code: exit_code(status),
            output,
            truncated,
            timed_out: timed_out.then_some(self.timeout).flatten(),
        })
    }
}

fn wait_with_timeout(child: &mut Child, timeout: Option<Duration>) -> Result<(ExitStatus, bool), RunnerError> {
    let Some(limit) = timeout else {
        return child.wait().map(|s| (s, false)).map_err(RunnerError::Wait);
    };
    let deadline = Instant::now().checked_add(limit);

    loop {
        if let Some(status) = child.try_wait().map_err(RunnerError::Wait)? {
            return Ok((status, false));
        }
        if deadline.is_some_and(|d| Instant::now() >= d) {
            tracing::warn!("child exceeded {:?}, killing it", limit);
            let _ = child.kill();
            let status = child.wait().map_err(RunnerError::Wait)?;
            return Ok((status, true));
        }
        thread::sleep(POLL_INTERVAL);
    }
}

#[cfg(unix)]
fn exit_code(status: ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt as _;
    status.code().or_else(|| status.signal().map(|s| 128 + s))
}

#[cfg(not(unix))]
fn exit_code(status: ExitStatus) -> Option<i32> {
    status.code()
}

/// Read to EOF, keeping only the final `cap` bytes.
///
/// The buffer may grow to twice `cap` between compactions. If the final cut
/// lands inside a line, that partial line is dropped too.
pub fn read_tail_capped<R: Read>(mut reader: R, cap: usize) -> io::Result<(Vec<u8>, bool)> {
    let mut buf = Vec::new();
    let mut tmp = [0u8; 8192];
    let mut truncated = false;
    let mut cut_at_line_start = true;
    let compact_at = cap.saturating_mul(2);

    loop {
        let n = match reader.read(&mut tmp) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        buf.extend_from_slice(&tmp[..n]);
        if buf.len() > compact_at {
            cut_at_line_start = keep_tail(&mut buf, cap);
            truncated = true;
        }
    }

    if buf.len() > cap {
        cut_at_line_start = keep_tail(&mut buf, cap);
        truncated = true;
    }

    if !cut_at_line_start {
        let first_newline = buf.iter().position(|&b| b == b'\n').map_or(buf.len(), |p| p + 1);
        buf.drain(..first_newline);
    }

    Ok((buf, truncated))
}

/// Drop all but the last `cap` bytes; true if the dropped prefix ended a line.
fn keep_tail(buf: &mut Vec<u8>, cap: usize) -> bool {
    let excess = buf.len() - cap;
    let at_line_start = buf[excess - 1] == b'\n';
    buf.drain(..excess);
    at_line_start
}
