use super::state::{App, UpgradePhase};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

const ASCII_LOGO: &str = r#"
██       ██                   
░██      ░░                   
░██       ██  ██████  ███████ 
░██      ░██ ░░░░░░██░░██░░░██
░██      ░██  ███████ ░██  ░██
░██      ░██ ██░░░░██ ░██  ░██
░████████░██░░████████░██  ░██
░░░░░░░░ ░░  ░░░░░░░░ ░░   ░░ "#;

pub fn render_dashboard(f: &mut Frame, app: &App) {
    let area = f.area();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));
    f.render_widget(block, area);

    // 构建所有行
    let mut lines: Vec<Line> = Vec::new();

    // 空行填充（顶部留白）
    lines.push(Line::from(""));

    // ASCII Logo
    for logo_line in ASCII_LOGO.lines() {
        lines.push(Line::from(vec![Span::styled(
            logo_line.to_string(),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )]));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(""));

    // 环境信息标题
    lines.push(Line::from(vec![Span::styled(
        "── 环境信息 ──",
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
    )]));
    lines.push(Line::from(""));

    // winget 状态
    if let Some(winget) = &app.winget {
        let version = winget.version.as_deref().unwrap_or("版本未知");
        lines.push(info_line("winget  ", version));
    } else if let Some(err) = &app.winget_error {
        lines.push(info_line("winget  ", err));
    } else {
        lines.push(info_line("winget  ", "检测中..."));
    }

    // 最近一次检查结果
    let upgrade_summary = match app.upgrade.phase {
        UpgradePhase::Listing | UpgradePhase::UpgradeComplete => {
            format!("{} 个", app.upgrade.entries.len())
        }
        _ => "尚未检查".to_string(),
    };
    lines.push(info_line("可升级应用  ", &upgrade_summary));

    // 网络适配器数量（进入过网络视图后可知）
    if let Some(info) = &app.network.info {
        let count = format!("{} 个小节", info.adapters.len());
        lines.push(info_line("网络适配器  ", &count));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(""));

    // 快捷键标题
    lines.push(Line::from(vec![Span::styled(
        "── 快捷键 ──",
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
    )]));
    lines.push(Line::from(""));

    // 快捷键列表
    lines.push(shortcut_line("U", " 检查 / 升级应用   "));
    lines.push(shortcut_line("N", " 网络配置信息      "));
    lines.push(shortcut_line("q", " 退出              "));

    lines.push(Line::from(""));
    lines.push(Line::from(""));

    // 版本号
    lines.push(Line::from(vec![Span::styled(
        format!("lian-winget v{}  ", env!("CARGO_PKG_VERSION")),
        Style::default().fg(Color::DarkGray),
    )]));

    let lines_count = lines.len();
    let paragraph = Paragraph::new(lines).alignment(Alignment::Center);

    // 垂直居中：计算内容高度，用 Layout 居中
    let content_height = lines_count as u16;
    let inner = area.inner(ratatui::layout::Margin {
        horizontal: 1,
        vertical: 1,
    });

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(content_height),
            Constraint::Min(0),
        ])
        .split(inner);

    f.render_widget(paragraph, vertical[1]);
}

/// 环境信息行: "  标签: 值"
fn info_line(label: &str, value: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            format!("{label}: "),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ),
        Span::styled(value.to_string(), Style::default().fg(Color::White)),
    ])
}

/// 快捷键行: "  X  描述"
fn shortcut_line<'a>(key: &'a str, desc: &'a str) -> Line<'a> {
    Line::from(vec![
        Span::styled(
            format!("  {key}"),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(desc.to_string(), Style::default().fg(Color::White)),
    ])
}
