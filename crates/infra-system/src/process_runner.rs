// Script process runner
// reason: tokio for async process management
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use greenearth_core::application::constants::{
    DEFAULT_SCRIPT_TIMEOUT_MS, GRACEFUL_SHUTDOWN_TIMEOUT,
};
use greenearth_core::port::{InvocationError, InvocationOutput, InvocationStatus, TimeProvider};

/// Process runner configuration
#[derive(Debug, Clone)]
pub struct ProcessRunnerConfig {
    /// Program used to run scripts (e.g. `python3`)
    pub interpreter: String,
    /// Upper bound on one invocation; `None` waits indefinitely
    pub timeout: Option<Duration>,
    /// Time between SIGTERM and SIGKILL once the timeout fires
    pub kill_grace: Duration,
    /// Environment variables passed through to scripts
    pub env_allowlist: Vec<String>,
}

impl Default for ProcessRunnerConfig {
    fn default() -> Self {
        Self {
            interpreter: "python3".to_string(),
            timeout: Some(Duration::from_millis(DEFAULT_SCRIPT_TIMEOUT_MS)),
            kill_grace: GRACEFUL_SHUTDOWN_TIMEOUT,
            env_allowlist: ["PATH", "HOME", "USER", "LANG", "PYTHONPATH", "VIRTUAL_ENV"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

/// Process runner
/// Spawns one isolated child process per invocation with environment allowlisting
pub struct ProcessRunner {
    time_provider: Arc<dyn TimeProvider>,
    config: ProcessRunnerConfig,
}

impl ProcessRunner {
    /// Create a new process runner
    ///
    /// # Example
    /// ```ignore
    /// let runner = ProcessRunner::new(
    ///     Arc::new(SystemTimeProvider),
    ///     ProcessRunnerConfig { interpreter: "python3".into(), ..Default::default() },
    /// );
    /// ```
    pub fn new(time_provider: Arc<dyn TimeProvider>, config: ProcessRunnerConfig) -> Self {
        Self {
            time_provider,
            config,
        }
    }

    /// Filter the server's environment to the allowlist only
    fn filter_env(&self, env: impl Iterator<Item = (String, String)>) -> HashMap<String, String> {
        env.filter(|(k, _)| self.config.env_allowlist.contains(k))
            .collect()
    }

    /// Run a script and return its stdout once it exits with status zero
    ///
    /// # Errors
    /// - InvocationError::SpawnFailed if the interpreter cannot be started
    /// - InvocationError::NonZeroExit on any unsuccessful exit, carrying stderr
    /// - InvocationError::Timeout if the configured bound elapses
    pub async fn run(&self, script: &Path, args: &[String]) -> Result<String, InvocationError> {
        self.execute(script, args).await?.into_stdout()
    }

    /// Run a script and capture its full output regardless of exit status
    pub async fn execute(
        &self,
        script: &Path,
        args: &[String],
    ) -> Result<InvocationOutput, InvocationError> {
        let script = absolute(script)?;
        let start_time = self.time_provider.now_millis();

        info!(
            interpreter = %self.config.interpreter,
            script = %script.display(),
            args = ?args,
            timeout_ms = ?self.config.timeout.map(|t| t.as_millis()),
            "Starting script execution"
        );

        let (status, stdout, stderr) = self.spawn_and_wait(&script, args).await?;
        let duration_ms = self.time_provider.elapsed_since(start_time);

        if !stderr.trim().is_empty() {
            debug!(script = %script.display(), stderr = %stderr.trim_end(), "Script diagnostics");
        }

        let output = InvocationOutput {
            status: if status.success() {
                InvocationStatus::Success
            } else {
                InvocationStatus::Failed
            },
            duration_ms,
            exit_code: status.code(),
            stdout,
            stderr,
        };

        info!(
            script = %script.display(),
            duration_ms = %duration_ms,
            exit_code = ?output.exit_code,
            status = ?output.status,
            "Script execution completed"
        );

        Ok(output)
    }

    /// Spawn the child, drain both pipes concurrently and wait for exit
    ///
    /// The timeout covers the exit and both pipes reaching EOF, so a background
    /// process holding stdout open cannot stall the request.
    async fn spawn_and_wait(
        &self,
        script: &Path,
        args: &[String],
    ) -> Result<(ExitStatus, String, String), InvocationError> {
        let working_dir = script
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let mut command = Command::new(&self.config.interpreter);
        command
            .arg(script)
            .args(args)
            .env_clear()
            .envs(self.filter_env(std::env::vars()))
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // Own process group so a timeout reaches everything the script forked
        #[cfg(unix)]
        command.process_group(0);

        let mut child = command.spawn().map_err(|e| {
            InvocationError::SpawnFailed(format!("{}: {}", self.config.interpreter, e))
        })?;
        let pid = child.id();

        let mut stdout_task = tokio::spawn(drain(child.stdout.take()));
        let mut stderr_task = tokio::spawn(drain(child.stderr.take()));

        let collect = async {
            let status = child
                .wait()
                .await
                .map_err(|e| InvocationError::IoError(e.to_string()))?;
            let stdout = join_pipe(&mut stdout_task).await?;
            let stderr = join_pipe(&mut stderr_task).await?;
            Ok::<_, InvocationError>((status, stdout, stderr))
        };

        let outcome = match self.config.timeout {
            Some(limit) => timeout(limit, collect).await.map_err(|_| limit),
            None => Ok(collect.await),
        };

        match outcome {
            Ok(result) => result,
            Err(limit) => {
                warn!(
                    script = %script.display(),
                    timeout_ms = limit.as_millis() as u64,
                    "Script exceeded timeout"
                );
                self.kill_graceful(&mut child, pid).await;
                stdout_task.abort();
                stderr_task.abort();
                Err(InvocationError::Timeout(limit.as_millis() as u64))
            }
        }
    }

    /// SIGTERM the script's process group, then SIGKILL whatever is left
    async fn kill_graceful(&self, child: &mut Child, pid: Option<u32>) {
        #[cfg(unix)]
        {
            use nix::sys::signal::{killpg, Signal};
            use nix::unistd::Pid;

            if let Some(pid) = pid {
                let group = Pid::from_raw(pid as i32);

                // Step 1: Send SIGTERM for graceful shutdown
                info!(pid = %pid, "Sending SIGTERM to script process group");
                if let Err(e) = killpg(group, Signal::SIGTERM) {
                    warn!(pid = %pid, error = %e, "SIGTERM failed");
                }

                // Step 2: Wait for the script to exit within the grace period
                if timeout(self.config.kill_grace, child.wait()).await.is_err() {
                    warn!(pid = %pid, "Process did not exit after SIGTERM, sending SIGKILL");
                }

                // Step 3: background children that outlived the script; ESRCH once the group is empty
                let _ = killpg(group, Signal::SIGKILL);
            }
        }

        // Step 4: force kill the script itself if it is still running
        if let Ok(None) = child.try_wait() {
            if let Err(e) = child.kill().await {
                warn!(error = %e, "Failed to kill script process");
            }
        }
    }
}

/// Resolve a script path against the server's working directory
fn absolute(script: &Path) -> Result<PathBuf, InvocationError> {
    if script.is_absolute() {
        return Ok(script.to_path_buf());
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(script))
        .map_err(|e| InvocationError::IoError(e.to_string()))
}

async fn drain<R: AsyncRead + Unpin>(pipe: Option<R>) -> std::io::Result<String> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        pipe.read_to_end(&mut buf).await?;
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

async fn join_pipe(
    task: &mut tokio::task::JoinHandle<std::io::Result<String>>,
) -> Result<String, InvocationError> {
    task.await
        .map_err(|e| InvocationError::IoError(e.to_string()))?
        .map_err(|e| InvocationError::IoError(e.to_string()))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use greenearth_core::port::time_provider::SystemTimeProvider;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_script(dir: &TempDir, name: &str, body: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(body.as_bytes()).unwrap();
        path
    }

    fn runner(timeout: Option<Duration>) -> ProcessRunner {
        ProcessRunner::new(
            Arc::new(SystemTimeProvider),
            ProcessRunnerConfig {
                interpreter: "sh".to_string(),
                timeout,
                kill_grace: Duration::from_millis(200),
                env_allowlist: vec!["PATH".to_string()],
            },
        )
    }

    #[tokio::test]
    async fn test_run_success_returns_stdout() {
        let dir = TempDir::new().unwrap();
        let script = write_script(&dir, "ok.sh", "echo hello\necho '{\"ok\": true}'\n");

        let stdout = runner(None).run(&script, &[]).await.unwrap();

        assert_eq!(stdout, "hello\n{\"ok\": true}\n");
    }

    #[tokio::test]
    async fn test_args_are_positional() {
        let dir = TempDir::new().unwrap();
        let script = write_script(&dir, "args.sh", "printf '%s|' \"$@\"\n");
        let args = vec!["70".to_string(), "hello world".to_string(), "0".to_string()];

        let stdout = runner(None).run(&script, &args).await.unwrap();

        assert_eq!(stdout, "70|hello world|0|");
    }

    #[tokio::test]
    async fn test_working_dir_is_script_dir() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("data.csv"), "pm25\n").unwrap();
        let script = write_script(&dir, "cwd.sh", "cat data.csv\n");

        let stdout = runner(None).run(&script, &[]).await.unwrap();

        assert_eq!(stdout, "pm25\n");
    }

    #[tokio::test]
    async fn test_non_zero_exit_carries_stderr() {
        let dir = TempDir::new().unwrap();
        let script = write_script(
            &dir,
            "fail.sh",
            "echo '{\"aqi_pm25\": 1}'\necho 'model missing' >&2\nexit 3\n",
        );

        let err = runner(None).run(&script, &[]).await.unwrap_err();

        match err {
            InvocationError::NonZeroExit { code, stderr } => {
                assert_eq!(code, Some(3));
                assert!(stderr.contains("model missing"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_execute_reports_failed_status() {
        let dir = TempDir::new().unwrap();
        let script = write_script(&dir, "fail.sh", "echo partial\nexit 1\n");

        let output = runner(None).execute(&script, &[]).await.unwrap();

        assert_eq!(output.status, InvocationStatus::Failed);
        assert_eq!(output.exit_code, Some(1));
        assert_eq!(output.stdout, "partial\n");
    }

    #[tokio::test]
    async fn test_timeout_kills_hung_script() {
        let dir = TempDir::new().unwrap();
        let script = write_script(&dir, "hang.sh", "exec sleep 10\n");

        let started = std::time::Instant::now();
        let err = runner(Some(Duration::from_millis(200)))
            .run(&script, &[])
            .await
            .unwrap_err();

        assert!(matches!(err, InvocationError::Timeout(200)));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_timeout_covers_background_child_holding_stdout() {
        let dir = TempDir::new().unwrap();
        let script = write_script(&dir, "detach.sh", "sleep 6 &\necho '{\"ok\": true}'\n");

        let started = std::time::Instant::now();
        let err = runner(Some(Duration::from_millis(300)))
            .run(&script, &[])
            .await
            .unwrap_err();

        assert!(matches!(err, InvocationError::Timeout(300)));
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_missing_interpreter_fails_to_spawn() {
        let dir = TempDir::new().unwrap();
        let script = write_script(&dir, "ok.sh", "echo hi\n");
        let runner = ProcessRunner::new(
            Arc::new(SystemTimeProvider),
            ProcessRunnerConfig {
                interpreter: "definitely-not-an-interpreter".to_string(),
                ..Default::default()
            },
        );

        let err = runner.run(&script, &[]).await.unwrap_err();

        assert!(matches!(err, InvocationError::SpawnFailed(_)));
    }

    #[test]
    fn test_env_filtering() {
        let runner = runner(None);

        let env = vec![
            ("PATH".to_string(), "/usr/bin".to_string()),
            ("OPENAI_API_KEY".to_string(), "secret".to_string()),
        ];
        let filtered = runner.filter_env(env.into_iter());

        assert_eq!(filtered.len(), 1);
        assert!(filtered.contains_key("PATH"));
        assert!(!filtered.contains_key("OPENAI_API_KEY"));
    }
}
