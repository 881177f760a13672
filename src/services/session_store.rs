//! 会话管理 - 业务能力层
//!
//! 负责认证会话的完整生命周期：加载 Cookie、启动浏览器、注入
//! Cookie、校验登录态、运行结束后确定性释放。每次运行只获取一次
//! 会话；任何失败路径上都不会泄漏浏览器进程

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::network::{CookieParam, TimeSinceEpoch};
use chromiumoxide::Browser;
use chrono::{DateTime, Local};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::browser::launch_browser;
use crate::config::Config;
use crate::error::{AppError, AppResult, AuthError, BrowserError};
use crate::infrastructure::PageDriver;
use crate::models::cookie::{load_cookies, Cookie};
use crate::services::streak_sender::StreakSender;
use crate::workflow::retry::ActionExecutor;

const HOME_URL: &str = "https://www.tiktok.com";
const DEFAULT_COOKIE_DOMAIN: &str = ".tiktok.com";

/// 登录按钮存在说明处于未登录状态
const LOGGED_IN_JS: &str =
    r#"(() => document.querySelector('[data-e2e="top-login-button"]') === null)()"#;

/// 认证后的浏览器会话
///
/// 由 SessionStore 独占管理；认证失败的会话会被丢弃，绝不复用
pub struct Session {
    browser: Browser,
    handler_task: JoinHandle<()>,
    driver: PageDriver,
    pub created_at: DateTime<Local>,
    authenticated: bool,
}

impl Session {
    pub fn driver(&self) -> &PageDriver {
        &self.driver
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }
}

/// 一次运行期间会话生命周期的能力接口
///
/// 真实实现（SessionStore）管理浏览器；测试中用脚本化的假实现
/// 替代，使批量流程可以在没有浏览器的情况下被完整验证
#[async_trait]
pub trait SessionBackend: Send + Sync {
    type Session: Send;
    type Executor: ActionExecutor;

    /// 获取一个已认证的会话；Cookie 缺失、不合法或被站点拒绝时失败
    async fn acquire(&self) -> AppResult<Self::Session>;

    /// 为当前会话创建动作执行器
    fn executor(&self, session: &Self::Session) -> Self::Executor;

    /// 校验会话是否仍处于登录状态
    async fn is_authenticated(&self, session: &Self::Session) -> bool;

    /// 释放会话（每个会话恰好释放一次，任何退出路径上都要调用）
    async fn release(&self, session: Self::Session);
}

/// 会话仓库
pub struct SessionStore {
    config: Config,
}

impl SessionStore {
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// 注入 Cookie 并校验登录态
    async fn authenticate(&self, session: &Session, cookies: &[Cookie]) -> AppResult<bool> {
        let params = build_cookie_params(cookies);
        if params.is_empty() {
            return Err(AppError::Auth(AuthError::NoUsableCookies {
                path: self.config.cookies_file.clone(),
            }));
        }

        session
            .driver
            .page()
            .set_cookies(params)
            .await
            .map_err(|e| {
                AppError::Browser(BrowserError::CookieInjectionFailed {
                    source: Box::new(e),
                })
            })?;
        info!("✓ Cookie 已注入");

        // 重新加载首页使 Cookie 生效，再检查登录态
        session
            .driver
            .goto(HOME_URL)
            .await
            .map_err(|e| AppError::navigation_failed(HOME_URL, e))?;
        tokio::time::sleep(std::time::Duration::from_secs(2)).await;

        Ok(self.check_logged_in(&session.driver).await)
    }

    async fn check_logged_in(&self, driver: &PageDriver) -> bool {
        driver.eval_as::<bool>(LOGGED_IN_JS).await.unwrap_or(false)
    }
}

#[async_trait]
impl SessionBackend for SessionStore {
    type Session = Session;
    type Executor = StreakSender;

    async fn acquire(&self) -> AppResult<Session> {
        let cookies = load_cookies(&self.config.cookies_file).await?;

        let (browser, page, handler_task) = launch_browser(self.config.headless, HOME_URL)
            .await
            .map_err(AppError::browser_launch_failed)?;

        let mut session = Session {
            browser,
            handler_task,
            driver: PageDriver::new(page),
            created_at: Local::now(),
            authenticated: false,
        };

        match self.authenticate(&session, &cookies).await {
            Ok(true) => {
                session.authenticated = true;
                info!("✅ 会话已认证");
                Ok(session)
            }
            Ok(false) => {
                warn!("⚠️ 注入 Cookie 后站点仍显示未登录");
                self.release(session).await;
                Err(AppError::Auth(AuthError::LoginRejected))
            }
            Err(e) => {
                self.release(session).await;
                Err(e)
            }
        }
    }

    fn executor(&self, session: &Session) -> StreakSender {
        StreakSender::new(session.driver().clone(), &self.config)
    }

    async fn is_authenticated(&self, session: &Session) -> bool {
        self.check_logged_in(&session.driver).await
    }

    async fn release(&self, session: Session) {
        let Session {
            mut browser,
            handler_task,
            ..
        } = session;

        if let Err(e) = browser.close().await {
            warn!("关闭浏览器失败: {}", e);
        }
        let _ = browser.wait().await;
        handler_task.abort();
        info!("✓ 浏览器会话已释放");
    }
}

/// 把导出的 Cookie 转换为 CDP CookieParam，无法转换的条目跳过
fn build_cookie_params(cookies: &[Cookie]) -> Vec<CookieParam> {
    let mut params = Vec::with_capacity(cookies.len());
    for cookie in cookies {
        let mut builder = CookieParam::builder()
            .name(cookie.name.clone())
            .value(cookie.value.clone())
            .domain(
                cookie
                    .domain
                    .clone()
                    .unwrap_or_else(|| DEFAULT_COOKIE_DOMAIN.to_string()),
            );
        if let Some(path) = &cookie.path {
            builder = builder.path(path.clone());
        }
        if let Some(expiry) = cookie.expiration_date {
            builder = builder.expires(TimeSinceEpoch::new(expiry));
        }
        if let Some(secure) = cookie.secure {
            builder = builder.secure(secure);
        }
        if let Some(http_only) = cookie.http_only {
            builder = builder.http_only(http_only);
        }
        match builder.build() {
            Ok(param) => params.push(param),
            Err(e) => warn!("跳过无法转换的 Cookie {}: {}", cookie.name, e),
        }
    }
    params
}
