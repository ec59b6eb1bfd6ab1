//! 外部命令执行 — 阻塞调用，捕获文本输出

use std::io::Read;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunnerError {
    /// 可执行文件不存在或无权限启动
    #[error("无法启动 {command}: {source}")]
    Launch {
        command: String,
        #[source]
        source: std::io::Error,
    },
    /// 超过配置的超时时间，子进程已被终止
    #[error("{command} 执行超过 {limit_secs} 秒，已终止")]
    Timeout { command: String, limit_secs: u64 },
    /// 等待子进程退出失败
    #[error("等待 {command} 退出失败: {source}")]
    Wait {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

/// 命令执行结果
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    pub fn combined_output(&self) -> String {
        format!("{}\n{}", self.stdout, self.stderr)
    }
}

/// 外部命令执行器。
///
/// 默认不设超时：外部命令挂起会一直阻塞调用线程。
/// 配置 command_timeout_secs 后，到时限会杀掉子进程并返回 Timeout。
#[derive(Debug, Clone, Default)]
pub struct CommandRunner {
    timeout: Option<Duration>,
}

impl CommandRunner {
    pub fn new() -> Self {
        Self { timeout: None }
    }

    pub fn with_timeout(secs: Option<u64>) -> Self {
        Self {
            timeout: secs.map(Duration::from_secs),
        }
    }

    /// 阻塞执行命令，等待退出并捕获 stdout/stderr 文本
    pub fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput, RunnerError> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| RunnerError::Launch {
                command: program.to_string(),
                source: e,
            })?;

        // 两个流必须并发读取，否则管道写满会让子进程卡死
        let stdout_reader = spawn_reader(child.stdout.take());
        let stderr_reader = spawn_reader(child.stderr.take());

        let status = match self.timeout {
            None => child.wait().map_err(|e| RunnerError::Wait {
                command: program.to_string(),
                source: e,
            })?,
            Some(limit) => {
                let deadline = Instant::now() + limit;
                loop {
                    let polled = child.try_wait().map_err(|e| RunnerError::Wait {
                        command: program.to_string(),
                        source: e,
                    })?;
                    match polled {
                        Some(status) => break status,
                        None if Instant::now() >= deadline => {
                            let _ = child.kill();
                            let _ = child.wait();
                            return Err(RunnerError::Timeout {
                                command: program.to_string(),
                                limit_secs: limit.as_secs(),
                            });
                        }
                        None => std::thread::sleep(Duration::from_millis(50)),
                    }
                }
            }
        };

        let stdout = stdout_reader.join().unwrap_or_default();
        let stderr = stderr_reader.join().unwrap_or_default();

        Ok(CommandOutput {
            stdout,
            stderr,
            exit_code: status.code(),
        })
    }
}

/// 在后台线程把流读到底并按 UTF-8 宽松解码
fn spawn_reader(
    stream: Option<impl Read + Send + 'static>,
) -> std::thread::JoinHandle<String> {
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut reader) = stream {
            let _ = reader.read_to_end(&mut buf);
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_executable_is_a_launch_error() {
        let runner = CommandRunner::new();
        let err = runner
            .run("definitely-not-a-real-command-zzz", &[])
            .unwrap_err();
        assert!(matches!(err, RunnerError::Launch { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn captures_stdout_and_exit_code() {
        let runner = CommandRunner::new();
        let output = runner.run("sh", &["-c", "echo hello; echo warn >&2"]).unwrap();
        assert_eq!(output.stdout.trim(), "hello");
        assert_eq!(output.stderr.trim(), "warn");
        assert!(output.success());
    }

    #[cfg(unix)]
    #[test]
    fn nonzero_exit_code_is_not_success() {
        let runner = CommandRunner::new();
        let output = runner.run("sh", &["-c", "exit 3"]).unwrap();
        assert_eq!(output.exit_code, Some(3));
        assert!(!output.success());
    }

    #[cfg(unix)]
    #[test]
    fn timeout_kills_hanging_command() {
        let runner = CommandRunner::with_timeout(Some(1));
        let err = runner.run("sleep", &["30"]).unwrap_err();
        assert!(matches!(err, RunnerError::Timeout { limit_secs: 1, .. }));
    }
}
