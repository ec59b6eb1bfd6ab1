use crate::config::Config;
use crate::netinfo::NetworkInfo;
use crate::runner::{CommandOutput, CommandRunner};
use crate::winget::{UpgradeEntry, UpgradeListing, UpgradeOutcome, Winget};

// ========== 枚举 ==========

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppMode {
    Dashboard,
    Upgrade, // Shift+U: 检查 / 批量升级应用
    Network, // Shift+N: ipconfig 网络信息
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UpgradePhase {
    WingetCheck,
    Checking,
    Listing,
    Upgrading,
    UpgradeComplete,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NetworkPhase {
    Idle,
    Querying,
    Ready,
    Error,
}

/// 内容区两种展示：结构化视图 / 原始命令输出
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewMode {
    Structured,
    RawOutput,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// 一条模态通知，任意键关闭
#[derive(Debug, Clone)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub body: String,
}

impl Notice {
    pub fn info(title: &str, body: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            title: title.to_string(),
            body: body.into(),
        }
    }

    pub fn warning(title: &str, body: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            title: title.to_string(),
            body: body.into(),
        }
    }

    pub fn error(title: &str, body: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            title: title.to_string(),
            body: body.into(),
        }
    }
}

// ========== 事件 ==========

#[derive(Debug)]
pub enum AppEvent {
    WingetDetected(Winget),
    WingetMissing(String),
    UpgradeListReady(UpgradeListing),
    UpgradeComplete(UpgradeOutcome),
    NetworkInfoReady(NetworkInfo),
    ReportSaved(String),
    Error(String),
}

// ========== 子状态结构体 ==========

pub struct UpgradeModeState {
    pub phase: UpgradePhase,
    pub view_mode: ViewMode,
    pub entries: Vec<UpgradeEntry>,
    pub output: Option<CommandOutput>,
    pub selected: usize,
    pub scroll: usize,
    pub report_path: Option<String>,
}

impl UpgradeModeState {
    pub fn new() -> Self {
        Self {
            phase: UpgradePhase::WingetCheck,
            view_mode: ViewMode::Structured,
            entries: Vec::new(),
            output: None,
            selected: 0,
            scroll: 0,
            report_path: None,
        }
    }

    /// 原始输出视图的内容行
    pub fn raw_lines(&self) -> Vec<String> {
        match &self.output {
            Some(output) => output
                .combined_output()
                .lines()
                .map(|s| s.to_string())
                .collect(),
            None => vec!["暂无命令输出".to_string()],
        }
    }

    pub fn scroll_up(&mut self) {
        self.scroll = self.scroll.saturating_sub(1);
    }

    pub fn scroll_down(&mut self, max_lines: usize, visible_height: usize) {
        let max_scroll = max_lines.saturating_sub(visible_height);
        if self.scroll < max_scroll {
            self.scroll += 1;
        }
    }

    pub fn select_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn select_down(&mut self) {
        let max = self.entries.len().saturating_sub(1);
        if self.selected < max {
            self.selected += 1;
        }
    }
}

pub struct NetworkModeState {
    pub phase: NetworkPhase,
    pub view_mode: ViewMode,
    pub info: Option<NetworkInfo>,
    pub scroll: usize,
}

impl NetworkModeState {
    pub fn new() -> Self {
        Self {
            phase: NetworkPhase::Idle,
            view_mode: ViewMode::Structured,
            info: None,
            scroll: 0,
        }
    }

    /// 结构化视图：按适配器小节展开成行
    pub fn section_lines(&self) -> Vec<String> {
        let Some(info) = &self.info else {
            return vec!["正在执行 ipconfig ...".to_string()];
        };
        if info.adapters.is_empty() {
            return vec!["未解析出适配器信息，可按 Tab 查看原始输出".to_string()];
        }

        let mut lines = Vec::new();
        for section in &info.adapters {
            lines.push(format!("▌ {}", section.title));
            for (key, value) in &section.fields {
                if value.is_empty() {
                    lines.push(format!("    {}", key));
                } else {
                    lines.push(format!("    {}: {}", key, value));
                }
            }
            lines.push(String::new());
        }
        lines
    }

    /// 原始输出视图的内容行
    pub fn raw_lines(&self) -> Vec<String> {
        match &self.info {
            Some(info) => info.raw.lines().map(|s| s.to_string()).collect(),
            None => vec!["正在执行 ipconfig ...".to_string()],
        }
    }

    pub fn content_lines(&self) -> Vec<String> {
        match self.view_mode {
            ViewMode::Structured => self.section_lines(),
            ViewMode::RawOutput => self.raw_lines(),
        }
    }

    pub fn scroll_up(&mut self) {
        self.scroll = self.scroll.saturating_sub(1);
    }

    pub fn scroll_down(&mut self, max_lines: usize, visible_height: usize) {
        let max_scroll = max_lines.saturating_sub(visible_height);
        if self.scroll < max_scroll {
            self.scroll += 1;
        }
    }
}

// ========== App ==========

pub struct App {
    pub mode: AppMode,
    pub config: Config,
    pub winget: Option<Winget>,
    pub winget_error: Option<String>,
    pub error_message: Option<String>,
    pub notice: Option<Notice>,
    pub should_quit: bool,
    // 子状态
    pub upgrade: UpgradeModeState,
    pub network: NetworkModeState,
}

impl App {
    pub fn new(config: Config) -> Self {
        Self {
            mode: AppMode::Dashboard,
            config,
            winget: None,
            winget_error: None,
            error_message: None,
            notice: None,
            should_quit: false,
            upgrade: UpgradeModeState::new(),
            network: NetworkModeState::new(),
        }
    }

    /// 按配置构建命令执行器
    pub fn runner(&self) -> CommandRunner {
        CommandRunner::with_timeout(self.config.command_timeout_secs)
    }

    /// 重置升级视图状态
    pub fn reset_upgrade_state(&mut self) {
        self.upgrade = UpgradeModeState::new();
        self.error_message = None;
    }

    /// 重置网络视图状态
    pub fn reset_network_state(&mut self) {
        self.network = NetworkModeState::new();
        self.error_message = None;
    }
}
