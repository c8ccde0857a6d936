// src/executor.rs
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use uuid::Uuid;

use crate::config::ExecutionConfig;

/// Diagnostic reported when a program fails without writing to stderr.
pub const GENERIC_FAILURE: &str = "Execution Failed";

/// One program and the text fed to its standard input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionRequest {
    pub source: String,
    pub stdin: String,
}

impl ExecutionRequest {
    pub fn new(source: impl Into<String>, stdin: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            stdin: stdin.into(),
        }
    }
}

/// Outcome of running a submitted program once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExecutionResult {
    /// Exited with status 0. `stdout` is trimmed.
    Completed { stdout: String },
    /// Exited non-zero or was killed by a signal.
    Failed { diagnostic: String },
    /// Still running at the deadline; killed, output discarded.
    TimedOut,
    /// The program could not be run at all.
    Unavailable { reason: String },
}

impl ExecutionResult {
    pub fn is_completed(&self) -> bool {
        matches!(self, ExecutionResult::Completed { .. })
    }
}

/// Source file owned by one execution. Removed on drop, whatever the exit path.
struct ScriptFile {
    path: PathBuf,
}

impl ScriptFile {
    async fn create(dir: &Path, extension: &str, source: &str) -> std::io::Result<Self> {
        let path = dir.join(format!("script_{}.{}", Uuid::new_v4().simple(), extension));

        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;
        // From here on the guard owns the path, so a failed write still cleans up.
        let script = ScriptFile { path };
        file.write_all(source.as_bytes()).await?;
        file.flush().await?;

        Ok(script)
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScriptFile {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != ErrorKind::NotFound {
                log::warn!("Failed to remove script file {}: {}", self.path.display(), e);
            }
        }
    }
}

/// Runs untrusted scripts in short-lived interpreter processes.
#[derive(Debug, Clone)]
pub struct Executor {
    interpreter: String,
    script_extension: String,
    script_dir: PathBuf,
    default_timeout: Duration,
}

impl Executor {
    pub fn new(interpreter: impl Into<String>) -> Self {
        let defaults = ExecutionConfig::default();
        Self {
            interpreter: interpreter.into(),
            script_extension: "py".to_string(),
            script_dir: std::env::temp_dir(),
            default_timeout: defaults.timeout,
        }
    }

    pub fn from_config(config: &ExecutionConfig) -> Self {
        Self::new(config.interpreter.clone()).default_timeout(config.timeout)
    }

    pub fn default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn script_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.script_dir = dir.into();
        self
    }

    pub fn script_extension(mut self, extension: impl Into<String>) -> Self {
        self.script_extension = extension.into();
        self
    }

    pub fn interpreter(&self) -> &str {
        &self.interpreter
    }

    pub fn get_default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Runs with the configured default timeout.
    pub async fn run(&self, request: &ExecutionRequest) -> ExecutionResult {
        self.execute(request, self.default_timeout).await
    }

    /// Runs `request.source` once, feeding it `request.stdin`, and reports what
    /// happened. Never returns an error: infrastructure problems come back as
    /// [`ExecutionResult::Unavailable`].
    pub async fn execute(&self, request: &ExecutionRequest, timeout: Duration) -> ExecutionResult {
        let script = match ScriptFile::create(&self.script_dir, &self.script_extension, &request.source).await {
            Ok(script) => script,
            Err(e) => {
                log::error!("Failed to write script file in {}: {}", self.script_dir.display(), e);
                return ExecutionResult::Unavailable {
                    reason: format!("could not write script file: {}", e),
                };
            }
        };

        let result = self.spawn_and_wait(script.path(), &request.stdin, timeout).await;
        drop(script);
        result
    }

    async fn spawn_and_wait(&self, script: &Path, input: &str, timeout: Duration) -> ExecutionResult {
        let mut child = match Command::new(&self.interpreter)
            .arg(script)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                log::error!("Failed to spawn interpreter '{}': {}", self.interpreter, e);
                return ExecutionResult::Unavailable {
                    reason: format!("interpreter '{}' unavailable: {}", self.interpreter, e),
                };
            }
        };
        log::debug!("Spawned '{}' as pid {:?}", self.interpreter, child.id());

        let (Some(mut stdin), Some(mut stdout), Some(mut stderr)) =
            (child.stdin.take(), child.stdout.take(), child.stderr.take())
        else {
            return ExecutionResult::Unavailable {
                reason: "child process pipes were not opened".to_string(),
            };
        };

        let mut stdout_buf = Vec::new();
        let mut stderr_buf = Vec::new();
        let start = Instant::now();

        let outcome = {
            let feed = async move {
                if !input.is_empty() {
                    if let Err(e) = stdin.write_all(input.as_bytes()).await {
                        // The program may exit without reading its input.
                        log::debug!("Could not write stdin: {}", e);
                    }
                }
                // Dropping stdin sends EOF so reads in the program return.
                drop(stdin);
            };
            let drain_stdout = stdout.read_to_end(&mut stdout_buf);
            let drain_stderr = stderr.read_to_end(&mut stderr_buf);
            let exit_status = child.wait();

            tokio::time::timeout(timeout, async {
                let ((), out, err, status) = tokio::join!(feed, drain_stdout, drain_stderr, exit_status);
                out?;
                err?;
                Ok::<_, std::io::Error>(status?)
            })
            .await
        };

        match outcome {
            Err(_) => {
                log::warn!(
                    "Execution timed out after {}ms, killing '{}'",
                    start.elapsed().as_millis(),
                    self.interpreter
                );
                if let Err(e) = child.kill().await {
                    log::warn!("Failed to kill timed-out process: {}", e);
                }
                ExecutionResult::TimedOut
            }
            Ok(Err(e)) => {
                log::error!("Failed to communicate with subprocess: {}", e);
                if let Err(e) = child.kill().await {
                    log::warn!("Failed to kill process after I/O error: {}", e);
                }
                ExecutionResult::Unavailable {
                    reason: format!("failed to communicate with subprocess: {}", e),
                }
            }
            Ok(Ok(status)) => {
                log::debug!("Process exited with {} after {}ms", status, start.elapsed().as_millis());
                if status.success() {
                    ExecutionResult::Completed {
                        stdout: String::from_utf8_lossy(&stdout_buf).trim().to_string(),
                    }
                } else {
                    let diagnostic = String::from_utf8_lossy(&stderr_buf).trim().to_string();
                    ExecutionResult::Failed {
                        diagnostic: if diagnostic.is_empty() {
                            GENERIC_FAILURE.to_string()
                        } else {
                            diagnostic
                        },
                    }
                }
            }
        }
    }
}
