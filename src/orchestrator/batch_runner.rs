//! 批量执行器 - 编排层
//!
//! ## 职责
//!
//! 对目标列表执行一次完整的批量发送。
//!
//! ## 核心功能
//!
//! 1. **会话管理**：每次运行获取一个会话，结束时恰好释放一次
//! 2. **顺序处理**：严格按列表顺序逐个处理目标（浏览器会话不支持并发导航）
//! 3. **失败隔离**：单个目标的任何结果都不影响后续目标
//! 4. **会话重建**：运行中途检测到会话失效时重建一次，再次失效
//!    则跳过剩余目标并记录致命条目
//! 5. **结果持久化**：每个目标的结果立即写入运行日志

use std::time::Duration;

use chrono::Local;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::AppResult;
use crate::models::outcome::{RunSummary, TargetOutcome};
use crate::models::target::TargetList;
use crate::services::run_log::RunLog;
use crate::services::session_store::SessionBackend;
use crate::workflow::retry::RetryPolicy;
use crate::workflow::time::Sleeper;

/// 批量执行器
///
/// 对会话后端和休眠器泛型化，测试中注入脚本化后端即可在没有
/// 浏览器的情况下验证完整的批量流程
pub struct BatchRunner<B: SessionBackend, S: Sleeper + Clone> {
    backend: B,
    config: Config,
    run_log: RunLog,
    retry: RetryPolicy<S>,
    sleeper: S,
}

impl<B: SessionBackend, S: Sleeper + Clone> BatchRunner<B, S> {
    pub fn new(backend: B, config: &Config, run_log: RunLog, sleeper: S) -> Self {
        let retry = RetryPolicy::new(
            config.max_retries,
            Duration::from_secs(config.retry_backoff_secs),
            sleeper.clone(),
        );
        Self {
            backend,
            config: config.clone(),
            run_log,
            retry,
            sleeper,
        }
    }

    /// 执行一次完整的批量发送
    ///
    /// 会话获取失败时整次运行失败（没有认证就处理目标毫无意义），
    /// 记录一条致命日志后返回错误；调度器会等待下一个触发时刻
    pub async fn run_once(&self) -> AppResult<RunSummary> {
        let run_timestamp = Local::now();
        let targets = TargetList::load(&self.config.users_file).await?;

        if targets.is_empty() {
            warn!("⚠️ 目标列表为空，本次运行不做任何事");
            self.run_log.write("WARNING", "目标列表为空").await?;
            return Ok(RunSummary::new(run_timestamp, Vec::new()));
        }

        self.run_log.run_started(targets.len()).await?;
        log_run_start(targets.len());

        // 每次运行只获取一次会话
        let mut session = match self.backend.acquire().await {
            Ok(session) => Some(session),
            Err(e) => {
                error!("❌ 会话获取失败: {}", e);
                self.run_log
                    .fatal(&format!("会话获取失败，本次运行中止: {}", e))
                    .await
                    .ok();
                return Err(e);
            }
        };

        let total = targets.len();
        let mut outcomes = Vec::with_capacity(total);
        let mut reacquired = false;

        for (index, target) in targets.iter().enumerate() {
            log_target_start(index + 1, total);

            let outcome = match session.as_ref() {
                Some(current) => {
                    let executor = self.backend.executor(current);
                    self.retry.run(&executor, target).await
                }
                // 会话已永久失效，剩余目标记为跳过
                None => TargetOutcome::skipped(target.clone()),
            };

            if let Err(e) = self.run_log.target_outcome(&outcome).await {
                error!("写入运行日志失败: {}", e);
            }
            let succeeded = outcome.is_success();
            outcomes.push(outcome);

            // 失败之后确认会话仍然有效；失效则重建一次
            if !succeeded {
                if let Some(current) = session.as_ref() {
                    if !self.backend.is_authenticated(current).await {
                        if let Some(old) = session.take() {
                            self.backend.release(old).await;
                        }
                        if reacquired {
                            error!("❌ 会话再次失效，跳过本次运行的剩余目标");
                            self.run_log
                                .fatal("会话再次失效，跳过剩余目标")
                                .await
                                .ok();
                        } else {
                            reacquired = true;
                            warn!("⚠️ 会话已失效，尝试重建...");
                            match self.backend.acquire().await {
                                Ok(fresh) => {
                                    info!("✓ 会话重建成功");
                                    session = Some(fresh);
                                }
                                Err(e) => {
                                    error!("❌ 会话重建失败: {}", e);
                                    self.run_log
                                        .fatal(&format!("会话重建失败，跳过剩余目标: {}", e))
                                        .await
                                        .ok();
                                }
                            }
                        }
                    }
                }
            }

            // 目标间随机延迟，降低被风控的概率
            if session.is_some() && index + 1 < total {
                let delay_secs = {
                    use rand::Rng;
                    let (min, max) = self.config.user_delay_secs;
                    rand::rng().random_range(min..=max.max(min))
                };
                self.sleeper.sleep(Duration::from_secs(delay_secs)).await;
            }
        }

        // 恰好释放一次
        if let Some(current) = session.take() {
            self.backend.release(current).await;
        }

        let summary = RunSummary::new(run_timestamp, outcomes);
        self.run_log.run_completed(&summary).await?;
        log_run_complete(&summary);

        Ok(summary)
    }
}

// ========== 日志辅助函数 ==========

fn log_run_start(total: usize) {
    info!("{}", "=".repeat(60));
    info!("📦 开始批量发送，本次共 {} 个目标", total);
    info!("{}", "=".repeat(60));
}

fn log_target_start(index: usize, total: usize) {
    info!("\n{}", "─".repeat(30));
    info!("处理第 {}/{} 个目标", index, total);
}

fn log_run_complete(summary: &RunSummary) {
    info!("\n{}", "=".repeat(60));
    info!(
        "✅ 批量发送完成: 成功 {}/{}，失败 {}，跳过 {}",
        summary.success_count(),
        summary.outcomes.len(),
        summary.failed_count(),
        summary.skipped_count()
    );
    info!("{}", "=".repeat(60));
}
