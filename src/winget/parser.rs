//! winget upgrade 输出解析函数

use super::types::UpgradeEntry;

/// winget 在部分应用版本无法识别时打在 stdout 里的提示文本。
/// 只匹配英文输出；本地化输出下探测不到，升级仍按完成处理。
const UNDETERMINED_VERSION_MARKER: &str = "have version numbers that cannot be determined";

/// 清理终端输出中的 ANSI 转义序列、退格进度符和特殊字符
pub fn clean_terminal_output(input: &str) -> String {
    let mut result = String::new();
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\x1b' => {
                if chars.peek() == Some(&'[') {
                    chars.next();
                    while let Some(&next) = chars.peek() {
                        chars.next();
                        if next.is_ascii_alphabetic() {
                            break;
                        }
                    }
                }
            }
            '\x08' => {
                // winget 的进度旋转符靠退格就地刷新，这里真正回退一个字符
                if !result.ends_with('\n') {
                    result.pop();
                }
            }
            '\r' => {
                if chars.peek() != Some(&'\n') && !result.ends_with('\n') {
                    result.push('\n');
                }
            }
            c if c.is_control() && c != '\n' && c != '\t' => {}
            _ => result.push(c),
        }
    }

    let lines: Vec<&str> = result.lines().collect();
    let mut cleaned_lines = Vec::new();
    let mut prev_empty = false;

    for line in lines {
        let is_empty = line.trim().is_empty();
        if is_empty && prev_empty {
            continue;
        }
        cleaned_lines.push(line);
        prev_empty = is_empty;
    }

    cleaned_lines.join("\n")
}

// ========== 五列切分 ==========

/// Id 列字符类：字母、数字、点、连字符
fn is_id_token(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
}

/// 版本列字符类：数字和点
fn is_version_token(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit() || c == '.')
}

/// 按空白切分一行，记录每个 token 的起始字节偏移
fn tokenize_with_offsets(line: &str) -> Vec<(usize, &str)> {
    let mut tokens = Vec::new();
    let mut start: Option<usize> = None;

    for (i, c) in line.char_indices() {
        if c.is_whitespace() {
            if let Some(s) = start.take() {
                tokens.push((s, &line[s..i]));
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        tokens.push((s, &line[s..]));
    }
    tokens
}

/// 解析一行五列数据：名称（自由文本，可含空格）、Id、当前版本、可用版本、来源。
///
/// 名称列没有字符约束，列边界靠中间三列的窄字符类锚定：
/// 从左到右找最早一个「Id token + 两个版本 token + 后面至少还有一个 token」
/// 的切分点，名称取切分点之前的原文，来源取第四列之后直到行尾的原文，
/// 五个字段都去掉首尾空白。Id 顶格出现时名称列与 Id 之间没有分隔空白，
/// 不构成五列；行首有缩进时允许名称为空。
///
/// 不满足该形状的行（表尾统计、提示文本）返回 None，由调用方跳过。
pub fn parse_upgrade_line(line: &str) -> Option<UpgradeEntry> {
    let tokens = tokenize_with_offsets(line);
    let n = tokens.len();

    for i in 0..n {
        // 来源列至少要有一个 token
        if i + 3 >= n {
            break;
        }
        if i == 0 && tokens[0].0 == 0 {
            continue;
        }
        let (id_offset, id) = tokens[i];
        if !is_id_token(id) {
            continue;
        }
        if !is_version_token(tokens[i + 1].1) || !is_version_token(tokens[i + 2].1) {
            continue;
        }

        return Some(UpgradeEntry {
            name: line[..id_offset].trim().to_string(),
            id: id.to_string(),
            installed_version: tokens[i + 1].1.to_string(),
            available_version: tokens[i + 2].1.to_string(),
            source: line[tokens[i + 3].0..].trim().to_string(),
        });
    }
    None
}

/// 解析 winget upgrade 的完整输出。
///
/// 两阶段扫描：丢弃 "---" 分隔行之前的 banner 和表头，
/// 之后逐行尝试五列切分，解析失败的行静默跳过，保持出现顺序。
/// 任何以 "---" 开头的行本身也不产生数据。
pub fn parse_upgrade_list(output: &str) -> Vec<UpgradeEntry> {
    let mut entries = Vec::new();
    let mut past_separator = false;

    for line in output.lines() {
        if line.starts_with("---") {
            past_separator = true;
            continue;
        }
        if !past_separator || line.trim().is_empty() {
            continue;
        }
        if let Some(entry) = parse_upgrade_line(line) {
            entries.push(entry);
        }
    }

    entries
}

/// 检测批量升级输出中「版本无法确定」的部分失败提示
pub fn has_undetermined_versions(stdout: &str) -> bool {
    stdout.contains(UNDETERMINED_VERSION_MARKER)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Name                            Id                       Version        Available      Source
-----------------------------------------------------------------------------------------------
Microsoft Edge                  Microsoft.Edge           109.0.1518.61  110.0.1587.41  winget
7-Zip 22.01 (x64)               7zip.7zip                22.01          23.01          winget
Node.js LTS                     OpenJS.NodeJS.LTS        18.12.1        18.17.1        winget
3 upgrades available.
";

    #[test]
    fn parses_all_data_lines_in_order() {
        let entries = parse_upgrade_list(SAMPLE);
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].id, "Microsoft.Edge");
        assert_eq!(entries[1].id, "7zip.7zip");
        assert_eq!(entries[2].id, "OpenJS.NodeJS.LTS");
    }

    #[test]
    fn end_to_end_minimal_listing() {
        let input = "Name  Id  Version  Available  Source\n--------------------------\nFoo App  Foo.App  1.0  2.0  winget\n";
        let entries = parse_upgrade_list(input);
        assert_eq!(entries.len(), 1);
        let e = &entries[0];
        assert_eq!(
            (
                e.name.as_str(),
                e.id.as_str(),
                e.installed_version.as_str(),
                e.available_version.as_str(),
                e.source.as_str()
            ),
            ("Foo App", "Foo.App", "1.0", "2.0", "winget")
        );
    }

    #[test]
    fn name_with_internal_whitespace() {
        let line = "Microsoft Edge WebView2 Runtime  MicrosoftEdgeWebView2  109.0.1 110.0.2  winget";
        let e = parse_upgrade_line(line).unwrap();
        assert_eq!(e.name, "Microsoft Edge WebView2 Runtime");
        assert_eq!(e.id, "MicrosoftEdgeWebView2");
        assert_eq!(e.source, "winget");
    }

    #[test]
    fn multi_segment_version_kept_verbatim() {
        let e = parse_upgrade_line("Some App  Some.App  1.2.3.4  2.0.0.1  winget").unwrap();
        assert_eq!(e.installed_version, "1.2.3.4");
        assert_eq!(e.available_version, "2.0.0.1");
    }

    #[test]
    fn source_with_internal_whitespace_captured_wholly() {
        let e = parse_upgrade_line("Some App  Some.App  1.0  2.0  msstore (preview)").unwrap();
        assert_eq!(e.source, "msstore (preview)");
    }

    #[test]
    fn lines_before_separator_are_never_data() {
        // 分隔行之前即使形状完全匹配也不算数据
        let input = "Fake App  Fake.App  1.0  2.0  winget\n---\nReal App  Real.App  3.0  4.0  winget\n";
        let entries = parse_upgrade_list(input);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, "Real.App");
    }

    #[test]
    fn no_separator_means_no_data() {
        let input = "Name  Id  Version  Available  Source\nFoo App  Foo.App  1.0  2.0  winget\n";
        assert!(parse_upgrade_list(input).is_empty());
    }

    #[test]
    fn zero_matching_lines_is_empty_not_error() {
        let input = "banner\n---\nNo installed package has an available upgrade.\n";
        assert!(parse_upgrade_list(input).is_empty());
        assert!(parse_upgrade_list("").is_empty());
    }

    #[test]
    fn footer_and_summary_lines_skipped() {
        let input = "\
header
---
Foo App  Foo.App  1.0  2.0  winget
2 upgrades available.
The following packages have an upgrade available, but require explicit targeting for upgrade:
";
        let entries = parse_upgrade_list(input);
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn id_at_line_start_does_not_anchor() {
        // 顶格的 Id 前面没有分隔空白，不构成五列
        assert!(parse_upgrade_line("Foo.App 1.0 2.0 winget x").is_none());
        // 行首有缩进时允许名称为空
        let e = parse_upgrade_line("  Foo.App 1.0 2.0 winget").unwrap();
        assert_eq!(e.name, "");
        assert_eq!(e.id, "Foo.App");
    }

    #[test]
    fn earliest_anchor_wins() {
        // 第三列之后还有版本形状的 token 时，取最早的切分点，剩余并入来源
        let e = parse_upgrade_line("A B 1.0 2.0 3.0 winget").unwrap();
        assert_eq!(e.name, "A");
        assert_eq!(e.id, "B");
        assert_eq!(e.installed_version, "1.0");
        assert_eq!(e.available_version, "2.0");
        assert_eq!(e.source, "3.0 winget");
    }

    #[test]
    fn dash_inside_id_is_not_a_separator() {
        let input = "header\n---\nNode.js  OpenJS.NodeJS-LTS  18.0.0  20.1.0  winget\n";
        let entries = parse_upgrade_list(input);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, "OpenJS.NodeJS-LTS");
    }

    #[test]
    fn parse_is_deterministic_and_idempotent() {
        let first = parse_upgrade_list(SAMPLE);
        let second = parse_upgrade_list(SAMPLE);
        assert_eq!(first, second);
    }

    #[test]
    fn clean_strips_spinner_and_ansi() {
        // 退格擦掉旋转符，CSI 序列整段丢弃
        let raw = "-\x08\\\x08|\x08/\x08\x1b[32mName\x1b[0m  Id\r\nline2";
        let cleaned = clean_terminal_output(raw);
        assert_eq!(cleaned, "Name  Id\nline2");
    }

    #[test]
    fn clean_turns_bare_cr_into_newline() {
        let cleaned = clean_terminal_output("progress 10%\rprogress 99%\rdone");
        assert_eq!(cleaned, "progress 10%\nprogress 99%\ndone");
    }

    #[test]
    fn detects_undetermined_version_notice() {
        let stdout = "3 packages have version numbers that cannot be determined. Use --include-unknown.";
        assert!(has_undetermined_versions(stdout));
        assert!(!has_undetermined_versions("All apps upgraded."));
    }
}
