//! 页面驱动 - 基础设施层
//!
//! 持有唯一的 page 资源，只暴露"导航 / 执行 JS / 等待条件 / 操作元素"的能力

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tokio::time::sleep;
use tracing::debug;

/// DOM 条件轮询间隔
const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// 页面驱动
///
/// 职责：
/// - 持有唯一的 Page 资源
/// - 暴露 goto / eval / wait_for / click / type_text 能力
/// - 不认识 Target / Session
/// - 不处理业务流程
#[derive(Clone)]
pub struct PageDriver {
    page: Page,
}

impl PageDriver {
    /// 创建新的页面驱动
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// 获取 page 的引用（用于其他操作）
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// 导航到指定 URL 并等待导航完成
    pub async fn goto(&self, url: &str) -> Result<()> {
        debug!("导航到: {}", url);
        self.page
            .goto(url)
            .await
            .with_context(|| format!("导航到 {} 失败", url))?;
        self.page
            .wait_for_navigation()
            .await
            .with_context(|| format!("等待 {} 导航完成失败", url))?;
        Ok(())
    }

    /// 执行 JS 代码并返回 JSON 结果
    pub async fn eval(&self, js_code: impl Into<String>) -> Result<JsonValue> {
        let result = self.page.evaluate(js_code.into()).await?;
        let json_value = result.into_value()?;
        Ok(json_value)
    }

    /// 执行 JS 代码并反序列化为指定类型
    pub async fn eval_as<T: DeserializeOwned>(&self, js_code: impl Into<String>) -> Result<T> {
        let json_value = self.eval(js_code).await?;
        let typed_value = serde_json::from_value(json_value)?;
        Ok(typed_value)
    }

    /// 有界等待一个 JS 谓词变为 true
    ///
    /// 每 500ms 轮询一次，超时返回 Ok(false)；谓词必须是一个
    /// 求值为布尔值的 JS 表达式
    pub async fn wait_for(&self, js_predicate: &str, timeout: Duration) -> Result<bool> {
        let deadline = Instant::now() + timeout;
        loop {
            let satisfied: bool = self.eval_as(js_predicate).await.unwrap_or(false);
            if satisfied {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    /// 点击匹配 CSS 选择器的第一个元素
    pub async fn click(&self, selector: &str) -> Result<()> {
        let element = self
            .page
            .find_element(selector)
            .await
            .with_context(|| format!("未找到元素: {}", selector))?;
        element
            .click()
            .await
            .with_context(|| format!("点击元素失败: {}", selector))?;
        Ok(())
    }

    /// 向匹配的元素逐字符输入文本
    ///
    /// 每个字符之间插入 `delay_ms` 范围内的随机延迟，模拟人工输入
    pub async fn type_text(
        &self,
        selector: &str,
        text: &str,
        delay_ms: (u64, u64),
    ) -> Result<()> {
        let element = self
            .page
            .find_element(selector)
            .await
            .with_context(|| format!("未找到输入元素: {}", selector))?;
        element
            .click()
            .await
            .with_context(|| format!("聚焦输入元素失败: {}", selector))?;

        for ch in text.chars() {
            element
                .type_str(ch.to_string())
                .await
                .context("输入字符失败")?;
            let delay = {
                use rand::Rng;
                rand::rng().random_range(delay_ms.0..=delay_ms.1.max(delay_ms.0))
            };
            sleep(Duration::from_millis(delay)).await;
        }
        Ok(())
    }

    /// 在匹配的元素上按下指定按键
    pub async fn press_key(&self, selector: &str, key: &str) -> Result<()> {
        let element = self
            .page
            .find_element(selector)
            .await
            .with_context(|| format!("未找到元素: {}", selector))?;
        element
            .press_key(key)
            .await
            .with_context(|| format!("按键 {} 失败", key))?;
        Ok(())
    }
}
