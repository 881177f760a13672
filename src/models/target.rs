//! 目标用户列表
//!
//! 每次运行处理的用户名序列：按文件顺序处理，单次运行内去重

use std::collections::HashSet;
use std::fmt::Display;

use tracing::info;

use crate::error::{AppError, AppResult, FileError};

/// 单个目标用户名
///
/// 不变量：非空、无前后空白、无前导 `@`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Target(String);

impl Target {
    /// 从原始行解析目标
    ///
    /// 去除首尾空白、剥掉前导 `@`；空行和 `#` 注释行返回 None
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return None;
        }
        let name = trimmed.trim_start_matches('@');
        if name.is_empty() {
            return None;
        }
        Some(Self(name.to_string()))
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    /// 目标的个人主页 URL
    pub fn profile_url(&self) -> String {
        format!("https://www.tiktok.com/@{}", self.0)
    }
}

impl Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "@{}", self.0)
    }
}

/// 一次运行的目标序列
///
/// 保持文件中的原始顺序，重复的用户名只保留第一次出现
#[derive(Debug, Clone)]
pub struct TargetList {
    targets: Vec<Target>,
}

impl TargetList {
    /// 从文本内容解析目标列表
    pub fn from_lines(content: &str) -> Self {
        let mut seen = HashSet::new();
        let mut targets = Vec::new();
        for line in content.lines() {
            if let Some(target) = Target::parse(line) {
                if seen.insert(target.clone()) {
                    targets.push(target);
                }
            }
        }
        Self { targets }
    }

    /// 从文件加载目标列表（每次运行读取一次）
    pub async fn load(path: &str) -> AppResult<Self> {
        if !std::path::Path::new(path).exists() {
            return Err(AppError::File(FileError::NotFound {
                path: path.to_string(),
            }));
        }
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| AppError::file_read_failed(path, e))?;
        let list = Self::from_lines(&content);
        info!("✓ 从 {} 加载了 {} 个目标用户", path, list.len());
        Ok(list)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Target> {
        self.targets.iter()
    }

    pub fn as_slice(&self) -> &[Target] {
        &self.targets
    }
}
