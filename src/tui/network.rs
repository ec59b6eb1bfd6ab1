use super::layout;
use super::state::{App, AppEvent, NetworkPhase, ViewMode};
use crate::netinfo::NetworkInfo;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use tokio::sync::mpsc;

/// 处理网络模式的按键事件，返回 true 表示已消费该按键
pub fn handle_network_key(
    key: KeyEvent,
    app: &mut App,
    tx: &mpsc::Sender<AppEvent>,
    term_height: u16,
) -> bool {
    match key.code {
        KeyCode::Tab => {
            app.network.view_mode = match app.network.view_mode {
                ViewMode::Structured => ViewMode::RawOutput,
                ViewMode::RawOutput => ViewMode::Structured,
            };
            app.network.scroll = 0;
            true
        }
        KeyCode::Char('r') => {
            if app.network.phase != NetworkPhase::Querying {
                spawn_query_task(app, tx);
            }
            true
        }
        KeyCode::Up => {
            app.network.scroll_up();
            true
        }
        KeyCode::Down => {
            let max = app.network.content_lines().len();
            let visible = layout::visible_content_height(term_height);
            app.network.scroll_down(max, visible);
            true
        }
        _ => false,
    }
}

/// 启动 ipconfig 查询
pub fn spawn_query_task(app: &mut App, tx: &mpsc::Sender<AppEvent>) {
    app.network.phase = NetworkPhase::Querying;
    app.network.info = None;
    app.network.scroll = 0;
    app.error_message = None;

    let runner = app.runner();
    let tx_clone = tx.clone();
    tokio::spawn(async move {
        let result = tokio::task::spawn_blocking(move || NetworkInfo::query(&runner)).await;
        match result {
            Ok(Ok(info)) => {
                let _ = tx_clone.send(AppEvent::NetworkInfoReady(info)).await;
            }
            Ok(Err(e)) => {
                let _ = tx_clone
                    .send(AppEvent::Error(format!("查询网络配置失败: {}", e)))
                    .await;
            }
            Err(e) => {
                let _ = tx_clone
                    .send(AppEvent::Error(format!("查询任务中断: {}", e)))
                    .await;
            }
        }
    });
}

/// 渲染网络信息视图
pub fn render_network(f: &mut Frame, app: &App) {
    let chunks = layout::main_layout(f.area());

    let title = match app.network.phase {
        NetworkPhase::Idle | NetworkPhase::Querying => "🔍 正在读取网络配置...",
        NetworkPhase::Ready => "🌐 网络配置信息",
        NetworkPhase::Error => "❌ 错误",
    };
    layout::render_header(f, title, chunks[0]);

    match app.network.phase {
        NetworkPhase::Error => {
            let lines = vec![app
                .error_message
                .clone()
                .unwrap_or_else(|| "发生未知错误".to_string())];
            layout::render_scrollable_content(f, "错误", &lines, 0, chunks[1]);
        }
        _ => {
            let content_title = match app.network.view_mode {
                ViewMode::Structured => "适配器信息 [Tab 切换原始输出]",
                ViewMode::RawOutput => "ipconfig 原始输出 [Tab 切换回适配器视图]",
            };
            let lines = app.network.content_lines();
            layout::render_scrollable_content(
                f,
                content_title,
                &lines,
                app.network.scroll,
                chunks[1],
            );
        }
    }

    let footer = match app.network.phase {
        NetworkPhase::Idle | NetworkPhase::Querying => "查询进行中... | Esc 返回",
        NetworkPhase::Ready => "r 重新查询 | Tab 切换视图 | ↑↓ 滚动 | Esc 返回",
        NetworkPhase::Error => "r 重试 | Esc 返回",
    };
    layout::render_footer(f, footer, chunks[2]);
}
