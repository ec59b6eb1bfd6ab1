//! 升级检查快照的落盘保存

use crate::winget::UpgradeEntry;
use anyhow::Result;
use chrono::Local;
use std::fs;
use std::path::PathBuf;

pub struct ReportSaver {
    base_dir: PathBuf,
}

impl ReportSaver {
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// 保存一次升级检查快照：Markdown 表格 + 原始输出，旁边放一份
    /// 同名 .json 结构化数据，便于其他工具读取。
    pub fn save_listing(&self, entries: &[UpgradeEntry], raw_output: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.base_dir)?;

        let now = Local::now();

        // 目录结构: YYYY/MM/DD/
        let dir = self
            .base_dir
            .join(now.format("%Y").to_string())
            .join(now.format("%m").to_string())
            .join(now.format("%d").to_string());
        fs::create_dir_all(&dir)?;

        // 文件名: HH-mm.md
        let filename = now.format("%H-%M.md").to_string();
        let filepath = dir.join(filename);

        let mut content = String::new();
        content.push_str(&format!(
            "winget 升级检查快照\n生成时间: {}\n可升级应用: {} 个\n\n",
            now.format("%Y-%m-%d %H:%M:%S"),
            entries.len()
        ));
        content.push_str("| 名称 | Id | 当前版本 | 可用版本 | 来源 |\n");
        content.push_str("| --- | --- | --- | --- | --- |\n");
        for e in entries {
            content.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                e.name, e.id, e.installed_version, e.available_version, e.source
            ));
        }
        content.push_str("\n原始输出:\n\n```\n");
        content.push_str(raw_output.trim_end());
        content.push_str("\n```\n");

        fs::write(&filepath, content)?;

        let json_path = filepath.with_extension("json");
        fs::write(&json_path, serde_json::to_string_pretty(entries)?)?;

        Ok(filepath)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_entries() -> Vec<UpgradeEntry> {
        vec![UpgradeEntry {
            name: "Foo App".to_string(),
            id: "Foo.App".to_string(),
            installed_version: "1.0".to_string(),
            available_version: "2.0".to_string(),
            source: "winget".to_string(),
        }]
    }

    #[test]
    fn writes_markdown_and_json_sidecar() {
        let base = std::env::temp_dir().join(format!("lian-winget-report-{}", std::process::id()));
        let saver = ReportSaver::new(base.clone());

        let path = saver
            .save_listing(&sample_entries(), "raw listing text")
            .unwrap();
        assert!(path.exists());

        let md = fs::read_to_string(&path).unwrap();
        assert!(md.contains("| Foo App | Foo.App | 1.0 | 2.0 | winget |"));
        assert!(md.contains("raw listing text"));

        let json = fs::read_to_string(path.with_extension("json")).unwrap();
        assert!(json.contains("\"id\": \"Foo.App\""));

        let _ = fs::remove_dir_all(base);
    }
}
