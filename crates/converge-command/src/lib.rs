//! Child-process plumbing for acceptance tests that shell out to a
//! cluster CLI.
//!
//! Convergence waits observe the control plane through a client; the
//! mutations that set them up (applying manifests, deleting
//! namespaces) usually go through a CLI binary. This crate makes
//! `std::process::Command` ergonomic for that: an extension trait that
//! turns an exit status into a proper `Result`, and [`Ctl`], a thin
//! handle over the cluster CLI binary itself.

#![warn(missing_docs)]

use std::ffi::OsStr;
use std::process::{Command, Output};

use tracing::debug;

/// `Ok(Output)` when a child process runs to completion with exit code
/// `0`; every other outcome is an `Err(CommandError)`.
pub type CommandResult = Result<Output, CommandError>;

/// A failed attempt to run one child process.
#[derive(thiserror::Error, Debug)]
#[error("failed to run \"{command}\"")]
pub struct CommandError {
    /// The command line that was attempted.
    pub command: String,
    /// What went wrong with it.
    pub source: CommandErrorKind,
}

/// The ways a child process can fail.
#[derive(thiserror::Error, Debug)]
pub enum CommandErrorKind {
    /// The child was killed by a signal and has no exit code.
    #[error("child process was terminated and has no exit code")]
    Terminated,
    /// The child ran to completion with a non-zero exit code.
    #[error("\
child process completed with non-zero exit code {0}
  stdout: {stdout}
  stderr: {stderr}",
        stdout = String::from_utf8_lossy(&.1.stdout),
        stderr = String::from_utf8_lossy(&.1.stderr))]
    ExitError(i32, Output),
    /// The child could not be spawned at all.
    #[error("an error occurred while invoking child process")]
    IoError(#[from] std::io::Error),
    /// The child succeeded but wrote bytes that are not valid UTF-8.
    #[error("child process wrote non-utf8 output")]
    NonUtf8Output(#[from] std::string::FromUtf8Error),
}

/// Extension methods on `std::process::Command`.
pub trait CommandExt {
    /// Inherit both `stdout` and `stderr` from this process.
    fn inherit(&mut self) -> &mut Self;

    /// Print a stringified version of the command to the debug log.
    ///
    /// # Example
    ///
    /// ```
    /// use std::process::Command;
    /// use converge_command::CommandExt;
    /// let _ = Command::new("echo")
    ///     .arg("hello")
    ///     .log()
    ///     .spawn();
    /// ```
    fn log(&mut self) -> &mut Self;

    /// Print a stringified version of the command to stdout.
    ///
    /// # Example
    ///
    /// ```
    /// use std::process::Command;
    /// use converge_command::CommandExt;
    /// let _ = Command::new("echo")
    ///     .arg("hello")
    ///     .print()
    ///     .spawn();
    /// ```
    fn print(&mut self) -> &mut Self;

    /// Return a stringified version of the command.
    ///
    /// # Example
    ///
    /// ```
    /// use std::process::Command;
    /// use converge_command::CommandExt;
    /// let mut command = Command::new("echo");
    /// command.arg("one").arg("two three");
    /// assert_eq!(command.display(), "echo one two three");
    /// ```
    fn display(&self) -> String;

    /// Run the command and fold its exit status into the result.
    ///
    /// # Example
    ///
    /// ```
    /// use std::process::Command;
    /// use converge_command::{CommandExt, CommandErrorKind};
    ///
    /// let output = Command::new("true").result().unwrap();
    /// assert!(output.stdout.is_empty());
    ///
    /// let error = Command::new("false").result().unwrap_err();
    /// assert!(matches!(error.source, CommandErrorKind::ExitError(1, _)));
    ///
    /// let error = Command::new("no-such-binary-exists").result().unwrap_err();
    /// assert!(matches!(error.source, CommandErrorKind::IoError(_)));
    /// ```
    fn result(&mut self) -> CommandResult;
}

impl CommandExt for Command {
    fn inherit(&mut self) -> &mut Self {
        use std::process::Stdio;
        self.stdout(Stdio::inherit()).stderr(Stdio::inherit())
    }

    fn log(&mut self) -> &mut Self {
        debug!("command> {}", self.display());
        self
    }

    fn print(&mut self) -> &mut Self {
        println!("command> {}", self.display());
        self
    }

    fn display(&self) -> String {
        format!("{self:?}").replace('"', "")
    }

    fn result(&mut self) -> CommandResult {
        debug!("executing> {}", self.display());

        self.output()
            .map_err(|e| CommandError {
                command: self.display(),
                source: CommandErrorKind::IoError(e),
            })
            .and_then(|output| match output.status.code() {
                Some(0i32) => Ok(output),
                None => Err(CommandError {
                    command: self.display(),
                    source: CommandErrorKind::Terminated,
                }),
                Some(code) => Err(CommandError {
                    command: self.display(),
                    source: CommandErrorKind::ExitError(code, output),
                }),
            })
    }
}

/// Handle over the cluster CLI binary used by the test harness.
///
/// The binary defaults to `kubectl` and can be redirected with the
/// `CONVERGE_CTL` environment variable, which is how CI points the
/// harness at a pinned or wrapped binary.
#[derive(Debug, Clone)]
pub struct Ctl {
    binary: String,
    namespace: Option<String>,
}

impl Ctl {
    /// Handle using `CONVERGE_CTL`, or `kubectl` when unset.
    pub fn new() -> Self {
        let binary = std::env::var("CONVERGE_CTL").unwrap_or_else(|_| "kubectl".to_owned());
        Self::with_binary(binary)
    }

    /// Handle over an explicit binary.
    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            namespace: None,
        }
    }

    /// Scope every invocation to one namespace.
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Run the CLI with `args` and return its stdout.
    pub fn exec<I, S>(&self, args: I) -> Result<String, CommandError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut command = Command::new(&self.binary);
        if let Some(namespace) = &self.namespace {
            command.arg("--namespace").arg(namespace);
        }
        command.args(args);

        // CONVERGE_CMD echoes every invocation to stdout for CI logs
        if std::env::var_os("CONVERGE_CMD").is_some() {
            command.print();
        }
        let output = command.log().result()?;
        String::from_utf8(output.stdout).map_err(|e| CommandError {
            command: command.display(),
            source: e.into(),
        })
    }
}

impl Default for Ctl {
    fn default() -> Self {
        Self::new()
    }
}
