//! 连胜消息发送 - 业务能力层
//!
//! 对单个目标执行完整的发送流程并给出分类结果：
//! 1. 导航到目标个人主页
//! 2. 找到并点击私信按钮
//! 3. 在输入框中模拟人工输入一条消息并回车
//! 4. 观察发送后的 UI 状态
//!
//! 分类规则：
//! - 成功指示在超时内出现 → Success
//! - 检测到验证码 → 内部轮询 CAPTCHA_CHECK_ATTEMPTS 次尝试解除，
//!   仍未解除 → CaptchaDetected
//! - 账号不存在 / 没有私信入口（目标固有原因）→ FatalFailure
//! - 其余超时、导航错误、未预期 DOM 状态 → TransientFailure
//!
//! 无论结果如何，流程结束时按 ESC 关闭私信抽屉，保证页面可以
//! 继续导航到下一个目标

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use rand::seq::IndexedRandom;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::infrastructure::PageDriver;
use crate::models::outcome::AttemptResult;
use crate::models::target::Target;
use crate::workflow::retry::ActionExecutor;

/// 私信按钮候选选择器（按优先级排列）
const MESSAGE_BUTTON_SELECTORS: &[&str] = &[
    r#"button[data-e2e="message-button"]"#,
    r#"button[data-e2e="user-page-message-button"]"#,
];

/// 私信输入框候选选择器
const DM_INPUT_SELECTORS: &[&str] = &[
    r#"div[data-e2e="dm-input"]"#,
    r#"div[contenteditable="true"]"#,
    r#"div[role="textbox"]"#,
];

/// 页面文本中出现这些关键词即认为弹出了验证码
const CAPTCHA_INDICATORS_JS: &str = r#"(() => {
    const text = (document.body.innerText || '').toLowerCase();
    return ['drag the slider', 'verify you are human', 'puzzle', 'verification']
        .some(s => text.includes(s));
})()"#;

/// 账号不存在的页面提示
const PROFILE_MISSING_JS: &str = r#"(() => {
    const text = (document.body.innerText || '').toLowerCase();
    return text.includes("couldn't find this account");
})()"#;

/// 个人主页头部已渲染（用于区分"页面没加载"和"没有私信入口"）
const PROFILE_HEADER_JS: &str =
    r#"(() => document.querySelector('[data-e2e="user-title"]') !== null)()"#;

/// 尝试点击验证码弹窗的关闭按钮
const CLOSE_CAPTCHA_JS: &str = r#"(() => {
    const btn = document.querySelector('button[aria-label*="Close"], button.close');
    if (btn) { btn.click(); return true; }
    return false;
})()"#;

/// 连胜消息发送器
///
/// 持有页面驱动的克隆（Page 内部是 Arc，克隆安全），
/// 每次运行随会话重建
pub struct StreakSender {
    driver: PageDriver,
    wait_timeout: Duration,
    captcha_check_attempts: usize,
    captcha_poll: Duration,
    typing_delay_ms: (u64, u64),
    messages: Vec<String>,
}

impl StreakSender {
    pub fn new(driver: PageDriver, config: &Config) -> Self {
        Self {
            driver,
            wait_timeout: Duration::from_secs(config.wait_timeout_secs),
            captcha_check_attempts: config.captcha_check_attempts,
            captcha_poll: Duration::from_secs(config.captcha_poll_secs),
            typing_delay_ms: config.typing_delay_ms,
            messages: config.messages.clone(),
        }
    }

    /// 完整的单目标发送流程
    async fn try_send(&self, target: &Target) -> Result<AttemptResult> {
        info!("正在处理 {}", target);

        // 步骤 1: 导航到个人主页
        self.driver.goto(&target.profile_url()).await?;
        sleep(Duration::from_secs(2)).await;

        // 验证码检查：轮询解除，仍未解除则上报
        if self.captcha_present().await? && !self.poll_captcha().await? {
            warn!("⚠️ {} 验证码在轮询后仍未解除", target);
            return Ok(AttemptResult::CaptchaDetected);
        }

        // 账号不存在属于目标固有原因，重试无济于事
        if self.driver.eval_as::<bool>(PROFILE_MISSING_JS).await? {
            return Ok(AttemptResult::FatalFailure(format!(
                "账号 {} 不存在",
                target
            )));
        }

        // 步骤 2: 找到并点击私信按钮
        let button = match self.find_message_button().await? {
            Some(selector) => selector,
            None => {
                // 区分"主页没加载出来"和"主页正常但没有私信入口"
                let header_loaded = self
                    .driver
                    .eval_as::<bool>(PROFILE_HEADER_JS)
                    .await
                    .unwrap_or(false);
                return if header_loaded {
                    Ok(AttemptResult::FatalFailure(
                        "没有私信入口（可能未互相关注或被对方屏蔽）".to_string(),
                    ))
                } else {
                    Ok(AttemptResult::TransientFailure(
                        "个人主页加载超时".to_string(),
                    ))
                };
            }
        };

        if self.button_disabled(button).await? {
            return Ok(AttemptResult::FatalFailure(
                "私信按钮处于禁用状态".to_string(),
            ));
        }

        self.driver.click(button).await?;
        sleep(Duration::from_secs(2)).await;

        // 点击后再查一次验证码
        if self.captcha_present().await? && !self.poll_captcha().await? {
            warn!("⚠️ {} 点击后弹出验证码且未解除", target);
            return Ok(AttemptResult::CaptchaDetected);
        }

        // 步骤 3: 找到输入框，输入消息并回车
        let input = match self.find_dm_input().await? {
            Some(selector) => selector,
            None => {
                return Ok(AttemptResult::TransientFailure(
                    "未找到私信输入框".to_string(),
                ))
            }
        };

        let message = self.pick_message();
        debug!("输入消息: '{}'", message);
        self.driver
            .type_text(input, &message, self.typing_delay_ms)
            .await?;
        sleep(Duration::from_millis(500)).await;
        self.driver.press_key(input, "Enter").await?;

        // 步骤 4: 成功指示——输入框被清空说明消息已发出
        let cleared_js = format!(
            r#"(() => {{
                const el = document.querySelector('{}');
                return el !== null && el.innerText.trim().length === 0;
            }})()"#,
            input
        );
        let sent = self.driver.wait_for(&cleared_js, self.wait_timeout).await?;

        // 关闭私信抽屉，保证页面可以继续导航到下一个目标
        let _ = self.driver.press_key("body", "Escape").await;

        if sent {
            info!("✅ {} 发送成功", target);
            Ok(AttemptResult::Success)
        } else {
            Ok(AttemptResult::TransientFailure(
                "发送后输入框未清空".to_string(),
            ))
        }
    }

    /// 在超时内轮询私信按钮的候选选择器
    async fn find_message_button(&self) -> Result<Option<&'static str>> {
        debug!("🔍 查找私信按钮...");
        let predicate = format!(
            r#"(() => document.querySelector('{}') !== null)()"#,
            MESSAGE_BUTTON_SELECTORS.join(", ")
        );
        if !self.driver.wait_for(&predicate, self.wait_timeout).await? {
            return Ok(None);
        }
        for &selector in MESSAGE_BUTTON_SELECTORS {
            let present = format!(
                r#"(() => document.querySelector('{}') !== null)()"#,
                selector
            );
            if self.driver.eval_as::<bool>(present).await.unwrap_or(false) {
                debug!("✓ 找到私信按钮: {}", selector);
                return Ok(Some(selector));
            }
        }
        Ok(None)
    }

    async fn button_disabled(&self, selector: &str) -> Result<bool> {
        let js = format!(
            r#"(() => {{
                const el = document.querySelector('{}');
                return el !== null && (el.disabled || el.getAttribute('aria-disabled') === 'true');
            }})()"#,
            selector
        );
        Ok(self.driver.eval_as::<bool>(js).await.unwrap_or(false))
    }

    /// 在单个超时内轮询私信输入框的候选选择器
    async fn find_dm_input(&self) -> Result<Option<&'static str>> {
        debug!("🔍 查找私信输入框...");
        let predicate = format!(
            r#"(() => document.querySelector('{}') !== null)()"#,
            DM_INPUT_SELECTORS.join(", ")
        );
        if !self.driver.wait_for(&predicate, self.wait_timeout).await? {
            return Ok(None);
        }
        for &selector in DM_INPUT_SELECTORS {
            let present = format!(
                r#"(() => document.querySelector('{}') !== null)()"#,
                selector
            );
            if self.driver.eval_as::<bool>(present).await.unwrap_or(false) {
                debug!("✓ 找到私信输入框: {}", selector);
                return Ok(Some(selector));
            }
        }
        Ok(None)
    }

    async fn captcha_present(&self) -> Result<bool> {
        Ok(self
            .driver
            .eval_as::<bool>(CAPTCHA_INDICATORS_JS)
            .await
            .unwrap_or(false))
    }

    /// 验证码解除轮询
    ///
    /// 每轮先尝试关闭弹窗（关闭按钮，然后 ESC），再等待固定间隔
    /// 重新检查；解除返回 true。轮询不消耗重试预算
    async fn poll_captcha(&self) -> Result<bool> {
        for round in 1..=self.captcha_check_attempts {
            debug!("验证码解除尝试 {}/{}", round, self.captcha_check_attempts);
            let closed = self
                .driver
                .eval_as::<bool>(CLOSE_CAPTCHA_JS)
                .await
                .unwrap_or(false);
            if !closed {
                let _ = self.driver.press_key("body", "Escape").await;
            }
            sleep(self.captcha_poll).await;
            if !self.captcha_present().await? {
                info!("✓ 验证码已解除");
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn pick_message(&self) -> String {
        let mut rng = rand::rng();
        self.messages
            .choose(&mut rng)
            .cloned()
            .unwrap_or_else(|| "🔥".to_string())
    }
}

#[async_trait]
impl ActionExecutor for StreakSender {
    async fn perform(&self, target: &Target) -> AttemptResult {
        match self.try_send(target).await {
            Ok(result) => result,
            // 未预期的错误一律按瞬时失败处理，单个目标绝不让批次崩溃
            Err(e) => {
                warn!("{} 处理过程中发生未预期错误: {}", target, e);
                AttemptResult::TransientFailure(e.to_string())
            }
        }
    }
}
