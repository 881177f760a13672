use anyhow::{bail, Result};
use clap::Parser;
use tokio::sync::watch;
use tracing::info;

use tiktok_streak_bot::{
    logger, BatchRunner, Config, RunLog, Scheduler, SessionStore, SystemClock, TokioSleeper,
};

/// TikTok 连胜消息机器人 - 每日定时批量发送
#[derive(Parser, Debug)]
#[command(name = "tiktok_streak_bot", version, about)]
struct Cli {
    /// 立即执行一次批量发送后退出（默认进入每日调度模式）
    #[arg(long)]
    once: bool,

    /// Cookie 文件路径（覆盖 COOKIES_FILE 环境变量）
    #[arg(long)]
    cookies: Option<String>,

    /// 用户列表文件路径（覆盖 USERS_FILE 环境变量）
    #[arg(long)]
    users: Option<String>,

    /// 以可见窗口运行浏览器（调试用）
    #[arg(long)]
    headed: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    logger::init();

    let cli = Cli::parse();

    // 加载配置（环境变量 + 命令行覆盖）
    let mut config = Config::from_env();
    if let Some(cookies) = cli.cookies {
        config.cookies_file = cookies;
    }
    if let Some(users) = cli.users {
        config.users_file = users;
    }
    if cli.headed {
        config.headless = false;
    }

    // 启动期校验：配置不合法时以非零退出码结束
    let send_time = config.send_time_of_day()?;
    if !std::path::Path::new(&config.cookies_file).exists() {
        bail!("Cookie 文件不存在: {}", config.cookies_file);
    }
    if !std::path::Path::new(&config.users_file).exists() {
        bail!("用户列表文件不存在: {}", config.users_file);
    }

    info!("📁 Cookie 文件: {}", config.cookies_file);
    info!("👥 用户列表: {}", config.users_file);
    info!("📝 运行日志: {}", config.log_file);

    let run_log = RunLog::new(&config.log_file);
    let backend = SessionStore::new(&config);
    let runner = BatchRunner::new(backend, &config, run_log.clone(), TokioSleeper);

    // 立即执行模式：同步跑一次批量发送后退出
    if cli.once {
        info!("立即执行模式：开始单次批量发送");
        let summary = runner.run_once().await?;
        info!(
            "单次运行结束: 成功 {}/{}",
            summary.success_count(),
            summary.outcomes.len()
        );
        return Ok(());
    }

    // 调度模式：Ctrl+C 通过 watch 通道转为停止信号，
    // 只在调度器休眠间隙生效，进行中的批次允许完成
    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("收到 Ctrl+C，将在当前批次结束后停止");
            let _ = stop_tx.send(true);
        }
    });

    let mut scheduler = Scheduler::new(send_time, SystemClock, TokioSleeper, run_log);
    scheduler.run(&runner, stop_rx).await?;

    info!("✓ 程序已平稳退出");
    Ok(())
}
