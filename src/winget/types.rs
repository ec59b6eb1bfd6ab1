//! winget 模块数据类型定义

use crate::runner::CommandOutput;
use serde::Serialize;

/// 可升级应用条目，对应 winget upgrade 列表中的一行
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpgradeEntry {
    pub name: String,
    pub id: String,
    pub installed_version: String,
    pub available_version: String,
    pub source: String,
}

/// 升级列表查询结果：解析出的条目 + 产生它们的原始命令输出
#[derive(Debug, Clone)]
pub struct UpgradeListing {
    pub entries: Vec<UpgradeEntry>,
    pub output: CommandOutput,
}

impl UpgradeListing {
    /// 列表命令的 stderr 只作为警告展示，不影响解析结果
    pub fn stderr_warning(&self) -> Option<&str> {
        let s = self.output.stderr.trim();
        if s.is_empty() {
            None
        } else {
            Some(s)
        }
    }
}

/// 批量升级结果。
/// partial_failure 表示命令跑完了，但 winget 提示部分应用的版本无法识别。
#[derive(Debug, Clone)]
pub struct UpgradeOutcome {
    pub output: CommandOutput,
    pub partial_failure: bool,
}

impl UpgradeOutcome {
    /// 升级命令的 stderr，非空时需要作为警告展示
    pub fn stderr_warning(&self) -> Option<&str> {
        let s = self.output.stderr.trim();
        if s.is_empty() {
            None
        } else {
            Some(s)
        }
    }
}
