//! winget 封装 — 升级列表查询与批量升级

pub mod parser;
pub mod types;

// 重新导出常用类型
pub use types::{UpgradeEntry, UpgradeListing, UpgradeOutcome};

use crate::runner::{CommandRunner, RunnerError};
use anyhow::{anyhow, Result};
use parser::{clean_terminal_output, has_undetermined_versions, parse_upgrade_list};

/// 固定的调用表面：winget upgrade 列表，追加 --all 执行批量升级
const WINGET_COMMAND: &str = "winget";
const LIST_ARGS: &[&str] = &["upgrade"];
const UPGRADE_ALL_ARGS: &[&str] = &["upgrade", "--all"];

#[derive(Debug, Clone)]
pub struct Winget {
    pub command: String,
    pub version: Option<String>,
}

impl Winget {
    /// 探测 winget 是否可用（winget --version 能启动即视为可用）
    pub fn detect(runner: &CommandRunner) -> Result<Self> {
        match runner.run(WINGET_COMMAND, &["--version"]) {
            Ok(output) => Ok(Winget {
                command: WINGET_COMMAND.to_string(),
                version: if output.success() {
                    Some(output.stdout.trim().to_string())
                } else {
                    None
                },
            }),
            Err(e) => Err(anyhow!("未找到 winget: {}", e)),
        }
    }

    pub fn name(&self) -> &str {
        &self.command
    }

    /// 查询可升级应用列表（不实际执行升级）。
    ///
    /// 不检查退出码：列表以 stdout 能解析出的行为准，
    /// stderr 有内容时由调用方作为警告展示。
    pub fn list_upgrades(&self, runner: &CommandRunner) -> Result<UpgradeListing, RunnerError> {
        let output = runner.run(&self.command, LIST_ARGS)?;
        log::debug!("winget upgrade 原始输出:\n{}", output.stdout);

        let cleaned = clean_terminal_output(&output.stdout);
        let entries = parse_upgrade_list(&cleaned);
        Ok(UpgradeListing { entries, output })
    }

    /// 批量升级全部应用，阻塞到命令结束
    pub fn upgrade_all(&self, runner: &CommandRunner) -> Result<UpgradeOutcome, RunnerError> {
        let output = runner.run(&self.command, UPGRADE_ALL_ARGS)?;
        log::debug!("winget upgrade --all 原始输出:\n{}", output.stdout);

        let partial_failure = has_undetermined_versions(&output.stdout);
        Ok(UpgradeOutcome {
            output,
            partial_failure,
        })
    }
}
