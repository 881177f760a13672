//! 导出 Cookie 的数据模型与加载器
//!
//! 对应浏览器插件导出的 JSON 数组格式，每个对象至少包含
//! name / value / domain 三个字段

use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::error::{AppError, AppResult, AuthError};

/// 单条导出的浏览器 Cookie
#[derive(Debug, Clone, Deserialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default, rename = "expirationDate")]
    pub expiration_date: Option<f64>,
    #[serde(default)]
    pub secure: Option<bool>,
    #[serde(default, rename = "httpOnly")]
    pub http_only: Option<bool>,
}

/// 从 JSON 文件加载 Cookie 集合
///
/// 文件缺失、JSON 不合法或没有任何可用 Cookie 时返回认证错误，
/// 调用方（SessionStore）不会拿到半成品会话
pub async fn load_cookies(path: &str) -> AppResult<Vec<Cookie>> {
    if !Path::new(path).exists() {
        return Err(AppError::Auth(AuthError::CookieFileMissing {
            path: path.to_string(),
        }));
    }

    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| AppError::file_read_failed(path, e))?;

    let cookies: Vec<Cookie> = serde_json::from_str(&content).map_err(|e| {
        AppError::Auth(AuthError::CookieFileInvalid {
            path: path.to_string(),
            source: Box::new(e),
        })
    })?;

    // 过滤掉 name 或 value 为空的条目
    let usable: Vec<Cookie> = cookies
        .into_iter()
        .filter(|c| !c.name.is_empty() && !c.value.is_empty())
        .collect();

    if usable.is_empty() {
        return Err(AppError::Auth(AuthError::NoUsableCookies {
            path: path.to_string(),
        }));
    }

    info!("✓ 从 {} 加载了 {} 条 Cookie", path, usable.len());
    Ok(usable)
}
