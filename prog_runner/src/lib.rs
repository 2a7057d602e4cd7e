// Warning groups (as of rust 1.55)
#![deny(
    future_incompatible,
    nonstandard_style,
    rust_2018_compatibility,
    rust_2021_compatibility,
    rust_2018_idioms,
    unused
)]

//! Running external step tools and keeping their console output.

mod console;

pub use console::{error_lines, prune_console_output};

use anyhow::{bail, Context, Result};
use itertools::Itertools;
use log::{debug, info, warn};
use std::env;
use std::ffi::OsString;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::sync::mpsc::{channel, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

/// How long to keep collecting output after the program exits. Output pipes
/// held open by a grandchild process are abandoned after this.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

const DEFAULT_MONITOR_INTERVAL: Duration = Duration::from_secs(2);

const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Number of error lines quoted when a program fails.
const ERROR_LINES_REPORTED: usize = 5;

/// Determines whether a path is a file and has executable permissions.
pub fn is_executable_file<P: AsRef<Path>>(path: P) -> bool {
    use libc::{access, X_OK};
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;
    if path.as_ref().is_file() {
        if let Ok(path) = CString::new(path.as_ref().as_os_str().as_bytes()) {
            return unsafe { access(path.as_c_str().as_ptr(), X_OK) } == 0;
        }
    }
    false
}

/// Resolve a program to an executable file. Paths with a directory component
/// are checked as given; bare names are searched for on PATH.
pub fn locate_program(program: impl AsRef<Path>) -> Result<PathBuf> {
    let program = program.as_ref();
    if program.is_absolute() || program.components().count() > 1 {
        if is_executable_file(program) {
            return Ok(program.to_path_buf());
        }
        bail!("{} is not an executable file", program.display());
    }
    env::var_os("PATH")
        .and_then(|paths| {
            env::split_paths(&paths)
                .map(|dir| dir.join(program))
                .find(|candidate| is_executable_file(candidate))
        })
        .with_context(|| format!("{} was not found on PATH", program.display()))
}

enum ConsoleLine {
    Stdout(String),
    Stderr(String),
}

fn spawn_reader<R>(reader: R, send: Sender<ConsoleLine>, wrap: fn(String) -> ConsoleLine)
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) | Err(_) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf)
                        .trim_end_matches(|c| c == '\r' || c == '\n')
                        .to_string();
                    if send.send(wrap(line)).is_err() {
                        break;
                    }
                }
            }
        }
    });
}

/// What happened when a program ran.
#[derive(Debug)]
pub struct RunOutcome {
    pub program: PathBuf,
    /// None if the program was ended by a signal.
    pub exit_code: Option<i32>,
    pub timed_out: bool,
    pub elapsed: Duration,
    /// Standard output and standard error, in the order they arrived.
    pub lines: Vec<String>,
    pub stderr: Vec<String>,
}

impl RunOutcome {
    pub fn success(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }

    /// Return an error describing the failure if the program did not succeed.
    pub fn check(&self, tool: &str) -> Result<()> {
        if self.timed_out {
            bail!(
                "{tool} was stopped after running for {} seconds",
                self.elapsed.as_secs()
            );
        }
        if self.success() {
            return Ok(());
        }

        let status = match self.exit_code {
            Some(code) => format!("exit code {code}"),
            None => "a signal".to_string(),
        };
        let mut reported = error_lines(&self.lines);
        if reported.is_empty() {
            reported = self.stderr.iter().map(String::as_str).collect();
        }
        let skip = reported.len().saturating_sub(ERROR_LINES_REPORTED);
        let details = reported[skip..].join("\n  ");
        if details.is_empty() {
            bail!("{tool} ({}) failed with {status}", self.program.display())
        }
        bail!(
            "{tool} ({}) failed with {status}:\n  {details}",
            self.program.display()
        )
    }
}

/// Builder for launching an external program.
#[derive(Debug, Clone)]
pub struct ProgRunner {
    program: PathBuf,
    args: Vec<OsString>,
    working_dir: Option<PathBuf>,
    console_output: Option<PathBuf>,
    timeout: Option<Duration>,
    monitor_interval: Duration,
}

impl ProgRunner {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        ProgRunner {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
            console_output: None,
            timeout: None,
            monitor_interval: DEFAULT_MONITOR_INTERVAL,
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Write every console line to this file as it arrives.
    pub fn console_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.console_output = Some(path.into());
        self
    }

    /// Kill the program if it runs longer than this.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn monitor_interval(mut self, interval: Duration) -> Self {
        self.monitor_interval = interval;
        self
    }

    /// The command line, quoted for logging.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_os_str())
            .chain(self.args.iter().map(OsString::as_os_str))
            .map(|arg| {
                let arg = arg.to_string_lossy();
                if arg.contains(char::is_whitespace) {
                    format!("\"{arg}\"")
                } else {
                    arg.into_owned()
                }
            })
            .join(" ")
    }

    /// Run the program to completion, or until the timeout elapses.
    pub fn run(&self) -> Result<RunOutcome> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }

        let mut console = match &self.console_output {
            Some(path) => Some(BufWriter::new(
                File::create(path).with_context(|| path.display().to_string())?,
            )),
            None => None,
        };

        info!("running {}", self.command_line());
        let start = Instant::now();
        let mut child = command
            .spawn()
            .with_context(|| format!("failed to start {}", self.program.display()))?;

        let (send, recv) = channel();
        if let Some(stdout) = child.stdout.take() {
            spawn_reader(stdout, send.clone(), ConsoleLine::Stdout);
        }
        if let Some(stderr) = child.stderr.take() {
            spawn_reader(stderr, send.clone(), ConsoleLine::Stderr);
        }
        drop(send);

        let mut lines = Vec::new();
        let mut stderr = Vec::new();
        let mut record = |line: ConsoleLine| -> Result<()> {
            let text = match line {
                ConsoleLine::Stdout(text) => text,
                ConsoleLine::Stderr(text) => {
                    stderr.push(text.clone());
                    text
                }
            };
            if let Some(console) = console.as_mut() {
                writeln!(console, "{text}")?;
            }
            lines.push(text);
            Ok(())
        };

        let mut timed_out = false;
        let status: ExitStatus = loop {
            match recv.recv_timeout(self.monitor_interval) {
                Ok(line) => record(line)?,
                Err(RecvTimeoutError::Timeout) => {}
                // Output closed; the program is exiting or has detached from it.
                Err(RecvTimeoutError::Disconnected) => {
                    thread::sleep(self.monitor_interval.min(EXIT_POLL_INTERVAL))
                }
            }
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if self.timeout.is_some_and(|timeout| start.elapsed() > timeout) {
                warn!(
                    "{} exceeded its time limit of {:?}; stopping it",
                    self.program.display(),
                    self.timeout.unwrap_or_default()
                );
                child.kill()?;
                timed_out = true;
                break child.wait()?;
            }
        };

        let drain_until = Instant::now() + DRAIN_TIMEOUT;
        loop {
            let remaining = drain_until.saturating_duration_since(Instant::now());
            match recv.recv_timeout(remaining) {
                Ok(line) => record(line)?,
                Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => {
                    warn!(
                        "abandoning console output of {} still held open after exit",
                        self.program.display()
                    );
                    break;
                }
            }
        }
        drop(record);
        if let Some(mut console) = console {
            console.flush()?;
        }

        let elapsed = start.elapsed();
        debug!(
            "{} finished with {status} after {:.1} s",
            self.program.display(),
            elapsed.as_secs_f64()
        );
        Ok(RunOutcome {
            program: self.program.clone(),
            exit_code: status.code(),
            timed_out,
            elapsed,
            lines,
            stderr,
        })
    }
}
