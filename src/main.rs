mod config;
mod netinfo;
mod report;
mod runner;
mod tui;
mod winget;

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    // 加载配置（文件缺失时使用默认值）
    let config = config::Config::load_or_default()?;

    tui::run(config).await?;

    Ok(())
}
