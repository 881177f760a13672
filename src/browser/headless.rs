use anyhow::Result;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, info};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// 启动浏览器并导航到指定 URL
///
/// `headless` 控制是否以无头模式运行；返回浏览器句柄、页面和
/// 后台事件处理任务（释放会话时需要一并清理）
pub async fn launch_browser(
    headless: bool,
    url: &str,
) -> Result<(Browser, Page, JoinHandle<()>)> {
    info!("🚀 启动浏览器 (无头模式: {})...", headless);
    debug!("目标 URL: {}", url);

    let mut builder = BrowserConfig::builder().args(vec![
        "--no-sandbox",                                 // 禁用沙盒，防止权限问题导致的崩溃
        "--disable-dev-shm-usage",                      // 防止共享内存不足
        "--disable-gpu",                                // 无头模式必须禁用 GPU
        "--disable-blink-features=AutomationControlled", // 隐藏自动化痕迹
        "--disable-infobars",
        "--window-size=1920,1080",
    ]);

    builder = if headless {
        builder.new_headless_mode()
    } else {
        builder.with_head()
    };

    let config = builder
        .arg(format!("--user-agent={}", USER_AGENT))
        .build()
        .map_err(|e| {
            error!("配置浏览器失败: {}", e);
            anyhow::anyhow!("配置浏览器失败: {}", e)
        })?;

    // 启动浏览器
    let (browser, mut handler) = Browser::launch(config).await.map_err(|e| {
        error!("启动浏览器失败: {}", e);
        anyhow::anyhow!("启动浏览器失败: {}", e)
    })?;
    debug!("浏览器启动成功");

    // 在后台处理浏览器事件
    let handler_task = tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    // 添加短暂延迟以等待浏览器状态同步
    sleep(tokio::time::Duration::from_millis(300)).await;

    // 创建新页面并导航
    let page = browser.new_page(url).await.map_err(|e| {
        error!("创建页面失败: {}", e);
        anyhow::anyhow!("创建页面失败: {}", e)
    })?;

    info!("✅ 浏览器已导航到: {}", url);

    Ok((browser, page, handler_task))
}
