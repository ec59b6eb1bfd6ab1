use super::layout;
use super::state::{App, AppEvent, Notice, UpgradePhase, ViewMode};
use super::theme::{BLUE, BRIGHT_WHITE, DIM, PINK, SEL_BG};
use crate::report::ReportSaver;
use crate::winget::{UpgradeListing, UpgradeOutcome};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::Margin,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
    Frame,
};
use tokio::sync::mpsc;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// 处理升级模式的按键事件，返回 true 表示已消费该按键
pub fn handle_upgrade_key(
    key: KeyEvent,
    app: &mut App,
    tx: &mpsc::Sender<AppEvent>,
    term_height: u16,
) -> bool {
    // 升级执行中禁用一切触发键，只留滚动（不允许并发批量升级）
    if app.upgrade.phase == UpgradePhase::Upgrading {
        return handle_scroll_key(key, app, term_height);
    }

    match key.code {
        KeyCode::Tab => {
            app.upgrade.view_mode = match app.upgrade.view_mode {
                ViewMode::Structured => ViewMode::RawOutput,
                ViewMode::RawOutput => ViewMode::Structured,
            };
            app.upgrade.scroll = 0;
            true
        }
        KeyCode::Enter => {
            if app.upgrade.phase == UpgradePhase::Listing && !app.upgrade.entries.is_empty() {
                spawn_upgrade_task(app, tx);
            }
            true
        }
        KeyCode::Char('r') => {
            if app.upgrade.phase != UpgradePhase::Checking {
                spawn_check_task(app, tx);
            }
            true
        }
        KeyCode::Char('s') => {
            if matches!(
                app.upgrade.phase,
                UpgradePhase::Listing | UpgradePhase::UpgradeComplete
            ) {
                spawn_save_report(app, tx);
            }
            true
        }
        _ => handle_scroll_key(key, app, term_height),
    }
}

fn handle_scroll_key(key: KeyEvent, app: &mut App, term_height: u16) -> bool {
    let table_view = app.upgrade.view_mode == ViewMode::Structured;
    match key.code {
        KeyCode::Up => {
            if table_view {
                app.upgrade.select_up();
            } else {
                app.upgrade.scroll_up();
            }
            true
        }
        KeyCode::Down => {
            if table_view {
                app.upgrade.select_down();
            } else {
                let max = app.upgrade.raw_lines().len();
                let visible = layout::visible_content_height(term_height);
                app.upgrade.scroll_down(max, visible);
            }
            true
        }
        _ => false,
    }
}

// ========== 异步任务 ==========

/// 启动升级列表检查（winget upgrade）
pub fn spawn_check_task(app: &mut App, tx: &mpsc::Sender<AppEvent>) {
    let winget = match app.winget.clone() {
        Some(w) => w,
        None => return,
    };
    let runner = app.runner();
    app.upgrade.phase = UpgradePhase::Checking;
    app.upgrade.entries.clear();
    app.upgrade.output = None;
    app.upgrade.selected = 0;
    app.upgrade.scroll = 0;
    app.error_message = None;

    let tx_clone = tx.clone();
    tokio::spawn(async move {
        let result =
            tokio::task::spawn_blocking(move || winget.list_upgrades(&runner)).await;
        match result {
            Ok(Ok(listing)) => {
                let _ = tx_clone.send(AppEvent::UpgradeListReady(listing)).await;
            }
            Ok(Err(e)) => {
                let _ = tx_clone
                    .send(AppEvent::Error(format!("检查更新失败: {}", e)))
                    .await;
            }
            Err(e) => {
                let _ = tx_clone
                    .send(AppEvent::Error(format!("检查任务中断: {}", e)))
                    .await;
            }
        }
    });
}

/// 启动批量升级（winget upgrade --all）
pub fn spawn_upgrade_task(app: &mut App, tx: &mpsc::Sender<AppEvent>) {
    let winget = match app.winget.clone() {
        Some(w) => w,
        None => return,
    };
    let runner = app.runner();
    app.upgrade.phase = UpgradePhase::Upgrading;
    app.upgrade.view_mode = ViewMode::Structured;
    app.error_message = None;

    let tx_clone = tx.clone();
    tokio::spawn(async move {
        let result = tokio::task::spawn_blocking(move || winget.upgrade_all(&runner)).await;
        match result {
            Ok(Ok(outcome)) => {
                let _ = tx_clone.send(AppEvent::UpgradeComplete(outcome)).await;
            }
            Ok(Err(e)) => {
                let _ = tx_clone
                    .send(AppEvent::Error(format!("升级失败: {}", e)))
                    .await;
            }
            Err(e) => {
                let _ = tx_clone
                    .send(AppEvent::Error(format!("升级任务中断: {}", e)))
                    .await;
            }
        }
    });
}

/// 把当前列表和原始输出保存为快照
pub fn spawn_save_report(app: &mut App, tx: &mpsc::Sender<AppEvent>) {
    let entries = app.upgrade.entries.clone();
    let raw = app
        .upgrade
        .output
        .as_ref()
        .map(|o| o.stdout.clone())
        .unwrap_or_default();
    let report_dir = app.config.report_dir.clone();

    let tx_clone = tx.clone();
    tokio::spawn(async move {
        let saver = ReportSaver::new(report_dir);
        match saver.save_listing(&entries, &raw) {
            Ok(path) => {
                let _ = tx_clone
                    .send(AppEvent::ReportSaved(path.display().to_string()))
                    .await;
            }
            Err(e) => {
                log::error!("保存快照失败: {}", e);
                let _ = tx_clone
                    .send(AppEvent::Error(format!("保存快照失败: {}", e)))
                    .await;
            }
        }
    });
}

// ========== 事件处理 ==========

/// 列表就绪：填充表格并给出通知
pub fn handle_list_ready(app: &mut App, listing: UpgradeListing) {
    let warning = listing.stderr_warning().map(|s| s.to_string());
    let count = listing.entries.len();

    app.upgrade.entries = listing.entries;
    app.upgrade.output = Some(listing.output);
    app.upgrade.selected = 0;
    app.upgrade.scroll = 0;
    app.upgrade.phase = UpgradePhase::Listing;

    if let Some(warning) = warning {
        app.notice = Some(Notice::warning("检查更新警告", warning));
    } else if count > 0 {
        app.notice = Some(Notice::info(
            "发现可用升级",
            format!("发现 {} 个可升级应用，按 Enter 全部升级。", count),
        ));
    }
}

/// 批量升级结束：清空表格，按优先级弹出通知
/// （stderr 警告 > 版本无法确定的部分失败 > 成功提示）
pub fn handle_upgrade_complete(app: &mut App, outcome: UpgradeOutcome) {
    app.upgrade.phase = UpgradePhase::UpgradeComplete;
    // 升级后清空表格，等待下一次检查重新填充
    app.upgrade.entries.clear();
    app.upgrade.selected = 0;
    app.upgrade.scroll = 0;

    if let Some(warning) = outcome.stderr_warning() {
        app.notice = Some(Notice::warning("升级警告", warning.to_string()));
    } else if outcome.partial_failure {
        app.notice = Some(Notice::warning(
            "升级警告",
            outcome.output.stdout.trim().to_string(),
        ));
    } else {
        app.notice = Some(Notice::info("升级完成", "全部应用已升级，未发现问题。"));
    }

    app.upgrade.output = Some(outcome.output);
}

// ========== 渲染 ==========

/// 渲染升级视图
pub fn render_upgrade(f: &mut Frame, app: &App) {
    let chunks = layout::main_layout(f.area());

    render_upgrade_header(f, app, chunks[0]);
    render_upgrade_content(f, app, chunks[1]);
    render_upgrade_footer(f, app, chunks[2]);
}

fn render_upgrade_header(f: &mut Frame, app: &App, area: ratatui::layout::Rect) {
    let title = match app.upgrade.phase {
        UpgradePhase::WingetCheck => "🔍 检测 winget...",
        UpgradePhase::Checking => "🔍 正在检查可用升级...",
        UpgradePhase::Listing => "📝 可升级应用列表",
        UpgradePhase::Upgrading => "⚙️  正在批量升级...",
        UpgradePhase::UpgradeComplete => "✅ 升级完成",
        UpgradePhase::Error => "❌ 错误",
    };

    let winget_info = match &app.winget {
        Some(w) => match &w.version {
            Some(v) => format!(" | winget {}", v),
            None => format!(" | {}", w.name()),
        },
        None => String::new(),
    };

    layout::render_header(f, &format!("{}{}", title, winget_info), area);
}

fn render_upgrade_content(f: &mut Frame, app: &App, area: ratatui::layout::Rect) {
    match app.upgrade.phase {
        UpgradePhase::WingetCheck => {
            layout::render_scrollable_content(
                f,
                "准备中",
                &["正在检测 winget 是否可用...".to_string()],
                0,
                area,
            );
        }
        UpgradePhase::Checking => {
            layout::render_scrollable_content(
                f,
                "检查中",
                &["正在执行 winget upgrade，请稍候...".to_string()],
                0,
                area,
            );
        }
        UpgradePhase::Upgrading => {
            let lines = vec![
                "正在执行 winget upgrade --all ...".to_string(),
                String::new(),
                "升级为阻塞执行，期间没有实时输出；".to_string(),
                "命令结束后按 Tab 可查看完整日志。".to_string(),
            ];
            layout::render_scrollable_content(f, "批量升级中", &lines, 0, area);
        }
        UpgradePhase::Error => {
            let lines = vec![app
                .error_message
                .clone()
                .unwrap_or_else(|| "发生未知错误".to_string())];
            layout::render_scrollable_content(f, "错误", &lines, 0, area);
        }
        UpgradePhase::Listing | UpgradePhase::UpgradeComplete => match app.upgrade.view_mode {
            ViewMode::Structured => render_upgrade_table(f, app, area),
            ViewMode::RawOutput => {
                let lines = app.upgrade.raw_lines();
                layout::render_scrollable_content(
                    f,
                    "原始输出 [Tab 切换回表格]",
                    &lines,
                    app.upgrade.scroll,
                    area,
                );
            }
        },
    }
}

/// 按列对齐渲染升级表格，名称列最宽 40 个显示宽度
fn render_upgrade_table(f: &mut Frame, app: &App, area: ratatui::layout::Rect) {
    let block = Block::default()
        .title(" 可升级应用 [Tab 切换原始输出] ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));

    let inner = block.inner(area);
    f.render_widget(block, area);

    let padded = inner.inner(Margin {
        horizontal: 1,
        vertical: 0,
    });

    let entries = &app.upgrade.entries;
    if entries.is_empty() {
        // 原程序在无结果时向表格插入 "No results" 占位行
        let placeholder = if app.upgrade.phase == UpgradePhase::UpgradeComplete {
            "暂无可升级应用（升级后列表已清空，按 r 重新检查）"
        } else {
            "没有可升级的应用"
        };
        let hint = Paragraph::new(placeholder).style(Style::default().fg(DIM));
        f.render_widget(hint, padded);
        return;
    }

    // 第一行是表头
    let visible_height = (padded.height as usize).saturating_sub(1);
    if visible_height == 0 {
        return;
    }
    let total = entries.len();
    let selected = app.upgrade.selected.min(total - 1);
    let scroll = if selected >= visible_height {
        selected + 1 - visible_height
    } else {
        0
    };

    // 列宽按全部条目计算，滚动时列不抖动
    let name_w = column_width(entries.iter().map(|e| e.name.as_str()), "名称", 40);
    let id_w = column_width(entries.iter().map(|e| e.id.as_str()), "Id", 36);
    let cur_w = column_width(entries.iter().map(|e| e.installed_version.as_str()), "当前版本", 20);
    let avail_w = column_width(entries.iter().map(|e| e.available_version.as_str()), "可用版本", 20);

    let mut lines: Vec<Line> = Vec::with_capacity(visible_height + 1);
    lines.push(Line::from(Span::styled(
        format!(
            "  {}  {}  {}  {}  {}",
            fit_cell("名称", name_w),
            fit_cell("Id", id_w),
            fit_cell("当前版本", cur_w),
            fit_cell("可用版本", avail_w),
            "来源"
        ),
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
    )));

    for (idx, entry) in entries.iter().enumerate().skip(scroll).take(visible_height) {
        let is_selected = idx == selected;
        let cursor = if is_selected { "> " } else { "  " };

        let name = fit_cell(&entry.name, name_w);
        let id = fit_cell(&entry.id, id_w);
        let cur = fit_cell(&entry.installed_version, cur_w);
        let avail = fit_cell(&entry.available_version, avail_w);

        if is_selected {
            let bg = Style::default().bg(SEL_BG);
            lines.push(Line::from(vec![
                Span::styled(cursor, bg.fg(BRIGHT_WHITE).add_modifier(Modifier::BOLD)),
                Span::styled(name, bg.fg(BRIGHT_WHITE).add_modifier(Modifier::BOLD)),
                Span::styled(format!("  {}", id), bg.fg(BRIGHT_WHITE)),
                Span::styled(format!("  {}", cur), bg.fg(BLUE)),
                Span::styled(format!("  {}", avail), bg.fg(PINK)),
                Span::styled(format!("  {}", entry.source), bg.fg(BRIGHT_WHITE)),
            ]));
        } else {
            lines.push(Line::from(vec![
                Span::styled(cursor, Style::default().fg(Color::White)),
                Span::styled(name, Style::default().fg(BLUE)),
                Span::styled(format!("  {}", id), Style::default().fg(Color::White)),
                Span::styled(format!("  {}", cur), Style::default().fg(DIM)),
                Span::styled(format!("  {}", avail), Style::default().fg(PINK)),
                Span::styled(format!("  {}", entry.source), Style::default().fg(DIM)),
            ]));
        }
    }

    let paragraph = Paragraph::new(lines);
    f.render_widget(paragraph, padded);

    // 滚动条
    if total > visible_height {
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("↑"))
            .end_symbol(Some("↓"));
        let mut state = ScrollbarState::new(total).position(scroll);
        f.render_stateful_widget(
            scrollbar,
            area.inner(Margin {
                horizontal: 0,
                vertical: 1,
            }),
            &mut state,
        );
    }
}

fn render_upgrade_footer(f: &mut Frame, app: &App, area: ratatui::layout::Rect) {
    let owned_text: String;
    let footer_text = match app.upgrade.phase {
        UpgradePhase::WingetCheck => "正在检测 winget...",
        UpgradePhase::Checking => "检查进行中... | Esc 返回",
        UpgradePhase::Listing => {
            if app.upgrade.entries.is_empty() {
                "r 重新检查 | Tab 原始输出 | Esc 返回"
            } else {
                "Enter 升级全部 | r 重新检查 | s 保存快照 | Tab 原始输出 | ↑↓ 移动 | Esc 返回"
            }
        }
        UpgradePhase::Upgrading => "批量升级进行中，请勿退出...",
        UpgradePhase::UpgradeComplete => {
            if let Some(path) = &app.upgrade.report_path {
                owned_text = format!("快照已保存: {} | r 重新检查 | Esc 返回", path);
                &owned_text
            } else {
                "升级完成 | r 重新检查 | s 保存快照 | Tab 查看日志 | Esc 返回"
            }
        }
        UpgradePhase::Error => {
            if let Some(msg) = &app.error_message {
                msg.as_str()
            } else {
                "发生错误 | r 重试 | Esc 返回"
            }
        }
    };

    layout::render_footer(f, footer_text, area);
}

// ========== 工具 ==========

/// 列宽 = max(表头宽, 各单元格宽)，再限制上限
fn column_width<'a>(cells: impl Iterator<Item = &'a str>, header: &str, cap: usize) -> usize {
    cells
        .map(UnicodeWidthStr::width)
        .max()
        .unwrap_or(0)
        .max(UnicodeWidthStr::width(header))
        .min(cap)
}

/// 把单元格填充或截断到固定显示宽度，超长时以 … 结尾
fn fit_cell(s: &str, width: usize) -> String {
    let w = UnicodeWidthStr::width(s);
    if w <= width {
        let mut out = s.to_string();
        out.push_str(&" ".repeat(width - w));
        return out;
    }

    let mut out = String::new();
    let mut used = 0;
    for c in s.chars() {
        let cw = UnicodeWidthChar::width(c).unwrap_or(0);
        if used + cw > width.saturating_sub(1) {
            break;
        }
        out.push(c);
        used += cw;
    }
    out.push('…');
    used += 1;
    out.push_str(&" ".repeat(width.saturating_sub(used)));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_cell_pads_short_values() {
        assert_eq!(fit_cell("abc", 5), "abc  ");
    }

    #[test]
    fn fit_cell_truncates_with_ellipsis() {
        let out = fit_cell("abcdefgh", 5);
        assert_eq!(UnicodeWidthStr::width(out.as_str()), 5);
        assert!(out.ends_with('…'));
    }

    #[test]
    fn fit_cell_respects_wide_chars() {
        // 全角字符占两个显示宽度
        let out = fit_cell("名称很长的应用", 6);
        assert_eq!(UnicodeWidthStr::width(out.as_str()), 6);
    }
}
