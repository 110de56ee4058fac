/// Remote command execution and the guarded delete built on it
use async_trait::async_trait;
use tracing::{info, warn};

use crate::remote::{RemoteError, RemoteResult, check_removable, shell_quote};

/// Captured result of one remote command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit status, `None` when the server never reported one
    pub status: Option<u32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl CommandOutput {
    /// Trimmed stderr text
    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).trim().to_string()
    }

    /// Stdout split into trimmed lines
    pub fn stdout_lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.stdout)
            .lines()
            .map(|line| line.trim().to_string())
            .collect()
    }
}

/// Something that runs a shell command on the remote host and waits for it
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, command: &str) -> RemoteResult<CommandOutput>;
}

/// Recursively delete `path` unless it is protected.
///
/// The delete only counts as successful when `rm` exits with status zero and
/// no stderr output, and a following `stat` no longer finds the path.
pub(crate) async fn guarded_remove(runner: &dyn CommandRunner, path: &str) -> RemoteResult<()> {
    check_removable(path)?;

    info!("Attempting to delete: {}", path);
    let output = runner.run(&format!("rm -rf {}", shell_quote(path))).await?;
    let stderr = output.stderr_text();
    if output.status != Some(0) || !stderr.is_empty() {
        return Err(RemoteError::CommandFailed {
            status: output.status,
            stderr,
        });
    }

    match runner.run(&format!("stat {}", shell_quote(path))).await {
        Ok(stat) if stat.status == Some(0) => Err(RemoteError::StillExists(path.to_string())),
        Ok(_) => Ok(()),
        Err(e) => {
            // rm already reported success; an unverifiable stat does not undo that
            warn!("Could not verify deletion of {}: {}", path, e);
            Ok(())
        }
    }
}

/// Shell history lines with `#` timestamp markers removed.
pub fn parse_history(text: &str) -> Vec<String> {
    text.lines()
        .filter(|line| !line.starts_with('#'))
        .map(|line| line.trim().to_string())
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    /// Replays canned outputs and records every command it was asked to run
    #[derive(Default)]
    pub(crate) struct RecordingRunner {
        pub commands: Mutex<Vec<String>>,
        pub outputs: Mutex<VecDeque<RemoteResult<CommandOutput>>>,
    }

    impl RecordingRunner {
        pub fn with_outputs(outputs: Vec<RemoteResult<CommandOutput>>) -> Self {
            Self {
                commands: Mutex::new(Vec::new()),
                outputs: Mutex::new(outputs.into()),
            }
        }

        pub fn commands(&self) -> Vec<String> {
            self.commands.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CommandRunner for RecordingRunner {
        async fn run(&self, command: &str) -> RemoteResult<CommandOutput> {
            self.commands.lock().unwrap().push(command.to_string());
            self.outputs
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(CommandOutput::default()))
        }
    }

    fn exited(status: u32, stderr: &str) -> RemoteResult<CommandOutput> {
        Ok(CommandOutput {
            status: Some(status),
            stdout: Vec::new(),
            stderr: stderr.as_bytes().to_vec(),
        })
    }

    #[tokio::test]
    async fn protected_paths_issue_no_remote_command() {
        let runner = RecordingRunner::default();
        for path in ["/", "/etc", "/usr/lib/x", "/var/", "/tmp/a/b", "//root"] {
            let result = guarded_remove(&runner, path).await;
            assert!(matches!(result, Err(RemoteError::ProtectedPath(_))), "{path}");
        }
        assert!(runner.commands().is_empty());
    }

    #[tokio::test]
    async fn successful_delete_is_verified_with_stat() {
        let runner = RecordingRunner::with_outputs(vec![exited(0, ""), exited(1, "No such file")]);
        guarded_remove(&runner, "/home/u/old dir").await.unwrap();
        assert_eq!(
            runner.commands(),
            vec!["rm -rf '/home/u/old dir'".to_string(), "stat '/home/u/old dir'".to_string()]
        );
    }

    #[tokio::test]
    async fn path_that_survives_rm_is_a_failure() {
        let runner = RecordingRunner::with_outputs(vec![exited(0, ""), exited(0, "")]);
        let result = guarded_remove(&runner, "/home/u/immutable").await;
        assert!(matches!(result, Err(RemoteError::StillExists(_))));
    }

    #[tokio::test]
    async fn nonzero_exit_is_a_failure_without_stat() {
        let runner = RecordingRunner::with_outputs(vec![exited(1, "")]);
        let result = guarded_remove(&runner, "/home/u/x").await;
        assert!(matches!(result, Err(RemoteError::CommandFailed { status: Some(1), .. })));
        assert_eq!(runner.commands().len(), 1);
    }

    #[tokio::test]
    async fn stderr_output_is_a_failure_even_with_zero_exit() {
        let runner = RecordingRunner::with_outputs(vec![exited(0, "rm: cannot remove: Permission denied")]);
        let result = guarded_remove(&runner, "/home/u/x").await;
        assert!(matches!(result, Err(RemoteError::CommandFailed { .. })));
    }

    #[tokio::test]
    async fn missing_exit_status_is_a_failure() {
        let runner = RecordingRunner::with_outputs(vec![Ok(CommandOutput::default())]);
        assert!(guarded_remove(&runner, "/home/u/x").await.is_err());
    }

    #[tokio::test]
    async fn unverifiable_stat_keeps_the_success() {
        let runner = RecordingRunner::with_outputs(vec![
            exited(0, ""),
            Err(RemoteError::Other("channel closed".to_string())),
        ]);
        assert!(guarded_remove(&runner, "/home/u/x").await.is_ok());
    }

    #[test]
    fn history_skips_timestamp_markers() {
        let text = "#1700000000\nls -la\n#1700000001\n  cd /srv  \nexit";
        assert_eq!(parse_history(text), vec!["ls -la", "cd /srv", "exit"]);
    }

    #[test]
    fn stdout_lines_are_trimmed() {
        let output = CommandOutput {
            status: Some(0),
            stdout: b"Filesystem Size\n/dev/sda1  20G \n".to_vec(),
            stderr: Vec::new(),
        };
        assert_eq!(output.stdout_lines(), vec!["Filesystem Size", "/dev/sda1  20G"]);
    }
}
