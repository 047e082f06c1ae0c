//! Subprocess execution for the VCS backends
//!
//! Every `git` and `hg` call goes through a [`CommandRunner`], so backends
//! can be exercised in tests with a scripted runner instead of real tools.

use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use log::debug;

use crate::error::{Error, Result};

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// A single invocation of an external VCS tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: &'static str,
    pub args: Vec<String>,
    /// Working directory, if the command operates on a local working copy
    pub cwd: Option<std::path::PathBuf>,
    /// What the command operates on, used in error messages
    pub target: String,
}

impl Invocation {
    pub fn new(program: &'static str) -> Self {
        Self {
            program,
            args: Vec::new(),
            cwd: None,
            target: ".".to_string(),
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

    /// Run inside a working copy.
    pub fn current_dir(mut self, folder: &Path) -> Self {
        self.target = folder.display().to_string();
        self.cwd = Some(folder.to_path_buf());
        self
    }

    /// Record the remote this invocation talks to.
    pub fn remote(mut self, url: &str) -> Self {
        self.target = url.to_string();
        self
    }

    /// The arguments as one line, e.g. `update --clean 1a2b`.
    pub fn describe(&self) -> String {
        self.args.join(" ")
    }

    fn command(&self) -> Command {
        let mut command = Command::new(self.program);
        command.args(&self.args);
        if let Some(cwd) = &self.cwd {
            command.current_dir(cwd);
        }
        command
    }

    fn spawn_error(&self, err: std::io::Error) -> Error {
        Error::VcsSpawn {
            tool: self.program.to_string(),
            command: self.describe(),
            message: err.to_string(),
        }
    }

    fn failure(&self, stderr: impl Into<String>) -> Error {
        Error::VcsCommand {
            tool: self.program.to_string(),
            command: self.describe(),
            location: self.target.clone(),
            stderr: stderr.into(),
        }
    }
}

/// Runs VCS invocations.
pub trait CommandRunner: Send + Sync {
    /// Run with captured output and return stdout.
    fn output(&self, invocation: &Invocation) -> Result<String>;

    /// Run with the caller's stdin/stdout/stderr so credential prompts reach
    /// the operator.
    fn interactive(&self, invocation: &Invocation) -> Result<()>;
}

/// Runs invocations as real subprocesses.
///
/// Captured invocations are killed once `timeout` expires. Interactive ones
/// are never time-limited since they may be waiting on a password prompt.
#[derive(Debug, Clone, Default)]
pub struct SystemRunner {
    timeout: Option<Duration>,
}

impl SystemRunner {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }
}

impl CommandRunner for SystemRunner {
    fn output(&self, invocation: &Invocation) -> Result<String> {
        debug!(
            "running {} {} ({})",
            invocation.program,
            invocation.describe(),
            invocation.target
        );
        let mut child = invocation
            .command()
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| invocation.spawn_error(e))?;

        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = match self.timeout {
            Some(limit) => wait_with_timeout(&mut child, limit, invocation)?,
            None => child.wait()?,
        };

        let stdout = stdout.join().unwrap_or_default();
        let stderr = stderr.join().unwrap_or_default();

        if !status.success() {
            return Err(invocation.failure(String::from_utf8_lossy(&stderr).trim()));
        }
        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }

    fn interactive(&self, invocation: &Invocation) -> Result<()> {
        debug!(
            "running {} {} ({})",
            invocation.program,
            invocation.describe(),
            invocation.target
        );
        let status = invocation
            .command()
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|e| invocation.spawn_error(e))?;

        if !status.success() {
            return Err(invocation.failure(status.to_string()));
        }
        Ok(())
    }
}

/// Read a pipe to the end on its own thread so a chatty child cannot block
/// on a full pipe while we wait for it.
fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> thread::JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buffer = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buffer);
        }
        buffer
    })
}

fn wait_with_timeout(
    child: &mut Child,
    limit: Duration,
    invocation: &Invocation,
) -> Result<ExitStatus> {
    let started = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(status);
        }
        if started.elapsed() >= limit {
            let _ = child.kill();
            let _ = child.wait();
            return Err(Error::Timeout {
                tool: invocation.program.to_string(),
                command: invocation.describe(),
                seconds: limit.as_secs(),
            });
        }
        thread::sleep(POLL_INTERVAL);
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! A scripted [`CommandRunner`] shared by the backend tests.

    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    /// Records every invocation and answers from a queue of canned results.
    /// Once the queue is empty every call succeeds with empty output.
    #[derive(Default)]
    pub struct ScriptedRunner {
        pub calls: Mutex<Vec<Invocation>>,
        responses: Mutex<VecDeque<std::result::Result<String, String>>>,
    }

    impl ScriptedRunner {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn respond(self, stdout: &str) -> Self {
            self.responses
                .lock()
                .unwrap()
                .push_back(Ok(stdout.to_string()));
            self
        }

        pub fn fail(self, stderr: &str) -> Self {
            self.responses
                .lock()
                .unwrap()
                .push_back(Err(stderr.to_string()));
            self
        }

        /// Every recorded call as `program args...`.
        pub fn lines(&self) -> Vec<String> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .map(|c| format!("{} {}", c.program, c.describe()))
                .collect()
        }

        fn next(&self, invocation: &Invocation) -> Result<String> {
            self.calls.lock().unwrap().push(invocation.clone());
            match self.responses.lock().unwrap().pop_front() {
                Some(Ok(stdout)) => Ok(stdout),
                Some(Err(stderr)) => Err(invocation.failure(stderr)),
                None => Ok(String::new()),
            }
        }
    }

    impl CommandRunner for ScriptedRunner {
        fn output(&self, invocation: &Invocation) -> Result<String> {
            self.next(invocation)
        }

        fn interactive(&self, invocation: &Invocation) -> Result<()> {
            self.next(invocation).map(|_| ())
        }
    }
}
