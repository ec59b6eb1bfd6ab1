mod dashboard;
mod layout;
mod network;
pub mod state;
mod theme;
mod upgrade;

use crate::config::Config;
use crate::winget::Winget;
use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Frame, Terminal};
use state::{App, AppEvent, AppMode, NetworkPhase, UpgradePhase};
use std::io;
use tokio::sync::mpsc;

pub async fn run(config: Config) -> Result<()> {
    // 终端初始化
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config);

    let (tx, mut rx) = mpsc::channel(32);

    // 探测 winget
    let tx_clone = tx.clone();
    let runner = app.runner();
    tokio::spawn(async move {
        let result = tokio::task::spawn_blocking(move || Winget::detect(&runner)).await;
        match result {
            Ok(Ok(winget)) => {
                let _ = tx_clone.send(AppEvent::WingetDetected(winget)).await;
            }
            Ok(Err(e)) => {
                let _ = tx_clone.send(AppEvent::WingetMissing(e.to_string())).await;
            }
            Err(e) => {
                let _ = tx_clone
                    .send(AppEvent::WingetMissing(format!("探测任务中断: {}", e)))
                    .await;
            }
        }
    });

    // 主循环
    loop {
        terminal.draw(|f| ui(f, &app))?;

        // 处理按键
        if event::poll(std::time::Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                // Windows 终端会同时上报按下和抬起，只处理按下
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                let term_size = terminal.size()?;

                if app.notice.is_some() {
                    // 模态通知打开时，任意键只负责关闭它
                    app.notice = None;
                } else {
                    match key.code {
                        // q 仅在 Dashboard 退出；批量升级结束前不放行
                        KeyCode::Char('q') if app.mode == AppMode::Dashboard => {
                            if app.upgrade.phase == UpgradePhase::Upgrading {
                                app.notice = Some(state::Notice::warning(
                                    "升级进行中",
                                    "批量升级尚未结束，结束前请勿退出（Ctrl+C 强制退出）。",
                                ));
                            } else {
                                app.should_quit = true;
                            }
                        }
                        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                            app.should_quit = true;
                        }
                        KeyCode::Esc => match app.mode {
                            AppMode::Dashboard => {}
                            AppMode::Upgrade => {
                                // 批量升级进行中不允许离开视图（没有取消支持）
                                if app.upgrade.phase != UpgradePhase::Upgrading {
                                    app.mode = AppMode::Dashboard;
                                }
                            }
                            AppMode::Network => {
                                app.mode = AppMode::Dashboard;
                            }
                        },
                        KeyCode::Char('U') => {
                            if app.mode != AppMode::Upgrade {
                                app.mode = AppMode::Upgrade;
                                match app.upgrade.phase {
                                    // 检查或升级仍在进行时切回来，保留现场，
                                    // 绝不重置状态机去触发第二个并发命令
                                    UpgradePhase::Checking | UpgradePhase::Upgrading => {}
                                    _ => {
                                        app.reset_upgrade_state();
                                        if app.winget.is_some() {
                                            upgrade::spawn_check_task(&mut app, &tx);
                                        } else if let Some(err) = app.winget_error.clone() {
                                            app.error_message = Some(err);
                                            app.upgrade.phase = UpgradePhase::Error;
                                        }
                                    }
                                }
                            }
                        }
                        KeyCode::Char('N') => {
                            if app.mode != AppMode::Network {
                                app.mode = AppMode::Network;
                                // 上一次查询还没回来就不再叠加新查询
                                if app.network.phase != NetworkPhase::Querying {
                                    app.reset_network_state();
                                    network::spawn_query_task(&mut app, &tx);
                                }
                            }
                        }
                        // 委托给当前模式处理
                        _ => match app.mode {
                            AppMode::Upgrade => {
                                upgrade::handle_upgrade_key(key, &mut app, &tx, term_size.height);
                            }
                            AppMode::Network => {
                                network::handle_network_key(key, &mut app, &tx, term_size.height);
                            }
                            AppMode::Dashboard => {}
                        },
                    }
                }
            }
        }

        // 处理异步事件
        while let Ok(event) = rx.try_recv() {
            match event {
                AppEvent::WingetDetected(winget) => {
                    app.winget = Some(winget);
                    // 用户已停在升级页等待探测时，自动开始检查
                    if app.mode == AppMode::Upgrade
                        && app.upgrade.phase == UpgradePhase::WingetCheck
                    {
                        upgrade::spawn_check_task(&mut app, &tx);
                    }
                }
                AppEvent::WingetMissing(msg) => {
                    app.winget_error = Some(msg.clone());
                    if app.mode == AppMode::Upgrade {
                        app.error_message = Some(msg.clone());
                        app.upgrade.phase = UpgradePhase::Error;
                    }
                    app.notice = Some(state::Notice::error("winget 不可用", msg));
                }
                AppEvent::UpgradeListReady(listing) => {
                    upgrade::handle_list_ready(&mut app, listing);
                }
                AppEvent::UpgradeComplete(outcome) => {
                    upgrade::handle_upgrade_complete(&mut app, outcome);
                }
                AppEvent::NetworkInfoReady(info) => {
                    app.network.info = Some(info);
                    app.network.phase = NetworkPhase::Ready;
                }
                AppEvent::ReportSaved(path) => {
                    app.upgrade.report_path = Some(path);
                }
                AppEvent::Error(msg) => {
                    app.error_message = Some(msg.clone());
                    match app.mode {
                        AppMode::Upgrade => {
                            app.upgrade.phase = UpgradePhase::Error;
                        }
                        AppMode::Network => {
                            app.network.phase = NetworkPhase::Error;
                        }
                        AppMode::Dashboard => {}
                    }
                    app.notice = Some(state::Notice::error("操作失败", msg));
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    // 恢复终端
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    Ok(())
}

fn ui(f: &mut Frame, app: &App) {
    match app.mode {
        AppMode::Dashboard => dashboard::render_dashboard(f, app),
        AppMode::Upgrade => upgrade::render_upgrade(f, app),
        AppMode::Network => network::render_network(f, app),
    }

    // 模态通知盖在当前视图之上
    if let Some(notice) = &app.notice {
        layout::render_notice(f, notice);
    }
}
