//! 运行日志服务 - 业务能力层
//!
//! 只负责"向活动日志追加一行"的能力，不关心流程。
//! 日志文件只追加、永不改写，每行带时间戳

use std::fs::OpenOptions;
use std::io::Write;

use crate::error::{AppError, AppResult};
use crate::models::outcome::{RunSummary, TargetOutcome};

/// 追加式运行日志
#[derive(Debug, Clone)]
pub struct RunLog {
    log_file_path: String,
}

impl RunLog {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            log_file_path: path.into(),
        }
    }

    /// 追加一行带时间戳的日志
    pub async fn write(&self, level: &str, message: &str) -> AppResult<()> {
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        let line = format!("[{}] {}: {}\n", timestamp, level, message);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_file_path)
            .map_err(|e| AppError::file_write_failed(&self.log_file_path, e))?;
        file.write_all(line.as_bytes())
            .map_err(|e| AppError::file_write_failed(&self.log_file_path, e))?;
        Ok(())
    }

    /// 记录运行开始
    pub async fn run_started(&self, total_targets: usize) -> AppResult<()> {
        self.write("INFO", &"=".repeat(60)).await?;
        self.write(
            "INFO",
            &format!("每日运行开始，本次共 {} 个目标用户", total_targets),
        )
        .await
    }

    /// 记录单个目标的最终结果
    pub async fn target_outcome(&self, outcome: &TargetOutcome) -> AppResult<()> {
        let level = if outcome.is_success() { "INFO" } else { "ERROR" };
        let detail = outcome
            .attempts
            .iter()
            .map(|a| a.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        self.write(
            level,
            &format!(
                "{} - {} (尝试 {} 次: {})",
                outcome.target,
                outcome.final_outcome,
                outcome.attempts.len(),
                if detail.is_empty() { "无" } else { &detail }
            ),
        )
        .await
    }

    /// 记录运行结束与统计
    pub async fn run_completed(&self, summary: &RunSummary) -> AppResult<()> {
        self.write(
            "INFO",
            &format!(
                "每日运行结束: 成功 {}, 失败 {}, 跳过 {}, 总计 {}",
                summary.success_count(),
                summary.failed_count(),
                summary.skipped_count(),
                summary.outcomes.len()
            ),
        )
        .await?;
        self.write("INFO", &"=".repeat(60)).await
    }

    /// 记录致命错误（运行级别，进程继续存活）
    pub async fn fatal(&self, message: &str) -> AppResult<()> {
        self.write("ERROR", message).await
    }

    /// 记录调度器事件
    pub async fn scheduler_event(&self, message: &str) -> AppResult<()> {
        self.write("INFO", message).await
    }

    pub fn path(&self) -> &str {
        &self.log_file_path
    }
}
