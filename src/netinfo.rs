//! 网络配置信息 — ipconfig 输出的采集与切分

use crate::runner::{CommandRunner, RunnerError};

const IPCONFIG_COMMAND: &str = "ipconfig";

/// 一个小节（适配器或顶部汇总），标题加若干键值字段
#[derive(Debug, Clone, PartialEq)]
pub struct AdapterSection {
    pub title: String,
    pub fields: Vec<(String, String)>,
}

/// ipconfig 查询结果，原始文本保留用于整体展示
#[derive(Debug, Clone)]
pub struct NetworkInfo {
    pub raw: String,
    pub adapters: Vec<AdapterSection>,
}

impl NetworkInfo {
    /// 执行 ipconfig（无参数）并切分输出
    pub fn query(runner: &CommandRunner) -> Result<Self, RunnerError> {
        let output = runner.run(IPCONFIG_COMMAND, &[])?;
        log::debug!("ipconfig 原始输出:\n{}", output.stdout);
        Ok(Self::parse(&output.stdout))
    }

    /// 按小节切分 ipconfig 输出。
    ///
    /// 顶格且以冒号结尾的行是小节标题（如 "Ethernet adapter Ethernet:"）；
    /// 缩进的 "Key . . . : value" 行归属当前小节，点线填充从键名中剥除；
    /// 缩进的无键行（多个 DNS 服务器）并入上一个字段的值。
    pub fn parse(raw: &str) -> Self {
        let mut adapters: Vec<AdapterSection> = Vec::new();

        for line in raw.lines() {
            let content = line.trim_end();
            if content.trim().is_empty() {
                continue;
            }

            if !line.starts_with(' ') && !line.starts_with('\t') {
                // "Windows IP Configuration" 这样的纯标语行没有冒号，直接丢弃
                if let Some(title) = content.strip_suffix(':') {
                    adapters.push(AdapterSection {
                        title: title.trim().to_string(),
                        fields: Vec::new(),
                    });
                }
                continue;
            }

            let Some(section) = adapters.last_mut() else {
                continue;
            };

            // 字段分隔总是 " : "；值里的冒号（IPv6 地址）不会带两侧空格
            if let Some(pos) = content.find(" : ") {
                let key = content[..pos]
                    .trim_matches(|c: char| c.is_whitespace() || c == '.')
                    .to_string();
                let value = content[pos + 3..].trim().to_string();
                if !key.is_empty() {
                    section.fields.push((key, value));
                }
            } else if let Some(stripped) = content.strip_suffix(':') {
                // 空值字段，行尾就是冒号
                let key = stripped
                    .trim_matches(|c: char| c.is_whitespace() || c == '.')
                    .to_string();
                if !key.is_empty() {
                    section.fields.push((key, String::new()));
                }
            } else if let Some((_, value)) = section.fields.last_mut() {
                if value.is_empty() {
                    value.push_str(content.trim());
                } else {
                    value.push_str(", ");
                    value.push_str(content.trim());
                }
            }
        }

        Self {
            raw: raw.to_string(),
            adapters,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Windows IP Configuration

Ethernet adapter Ethernet:

   Connection-specific DNS Suffix  . : example.com
   IPv4 Address. . . . . . . . . . . : 192.168.1.10
   Subnet Mask . . . . . . . . . . . : 255.255.255.0
   DNS Servers . . . . . . . . . . . : 8.8.8.8
                                       8.8.4.4
   Default Gateway . . . . . . . . . :

Wireless LAN adapter Wi-Fi:

   Media State . . . . . . . . . . . : Media disconnected
";

    #[test]
    fn splits_into_adapter_sections() {
        let info = NetworkInfo::parse(SAMPLE);
        assert_eq!(info.adapters.len(), 2);
        assert_eq!(info.adapters[0].title, "Ethernet adapter Ethernet");
        assert_eq!(info.adapters[1].title, "Wireless LAN adapter Wi-Fi");
    }

    #[test]
    fn strips_dot_padding_from_keys() {
        let info = NetworkInfo::parse(SAMPLE);
        let fields = &info.adapters[0].fields;
        assert!(fields
            .iter()
            .any(|(k, v)| k == "IPv4 Address" && v == "192.168.1.10"));
        assert!(fields
            .iter()
            .any(|(k, _)| k == "Connection-specific DNS Suffix"));
    }

    #[test]
    fn merges_continuation_lines_into_previous_value() {
        let info = NetworkInfo::parse(SAMPLE);
        let dns = info.adapters[0]
            .fields
            .iter()
            .find(|(k, _)| k == "DNS Servers")
            .map(|(_, v)| v.as_str());
        assert_eq!(dns, Some("8.8.8.8, 8.8.4.4"));
    }

    #[test]
    fn empty_value_field_is_kept() {
        let info = NetworkInfo::parse(SAMPLE);
        assert!(info.adapters[0]
            .fields
            .iter()
            .any(|(k, v)| k == "Default Gateway" && v.is_empty()));
    }

    #[test]
    fn banner_line_opens_no_section() {
        let info = NetworkInfo::parse("Windows IP Configuration\n");
        assert!(info.adapters.is_empty());
        assert_eq!(info.raw, "Windows IP Configuration\n");
    }
}
