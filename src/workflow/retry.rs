//! 重试策略 - 流程层
//!
//! 把"对单个目标的一次动作"包装为有界重试：
//! - 成功立即停止
//! - 致命失败立即停止（重试无济于事）
//! - 验证码已在执行器内部轮询过，残留的验证码按瞬时失败计一次重试
//! - 瞬时失败消耗一次重试机会，重试之间按固定间隔退避
//!
//! 单个目标的失败被完全隔离在本策略之内，绝不会中断整个批次

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::models::outcome::{AttemptResult, FinalOutcome, TargetOutcome};
use crate::models::target::Target;
use crate::workflow::time::Sleeper;

/// 对单个目标执行一次动作的能力接口
///
/// 真实实现驱动浏览器；测试中用脚本化的假实现替代
#[async_trait]
pub trait ActionExecutor: Send + Sync {
    async fn perform(&self, target: &Target) -> AttemptResult;
}

/// 有界重试策略
pub struct RetryPolicy<S: Sleeper> {
    max_retries: usize,
    backoff: Duration,
    sleeper: S,
}

impl<S: Sleeper> RetryPolicy<S> {
    pub fn new(max_retries: usize, backoff: Duration, sleeper: S) -> Self {
        Self {
            max_retries: max_retries.max(1),
            backoff,
            sleeper,
        }
    }

    /// 对单个目标执行动作，最多尝试 max_retries 次
    ///
    /// 无论结果如何都返回一个完整的 TargetOutcome，永不向上抛错
    pub async fn run<E: ActionExecutor + ?Sized>(
        &self,
        executor: &E,
        target: &Target,
    ) -> TargetOutcome {
        let mut attempts = Vec::new();

        for attempt in 1..=self.max_retries {
            debug!("{} 第 {}/{} 次尝试", target, attempt, self.max_retries);
            let result = executor.perform(target).await;

            match result {
                AttemptResult::Success => {
                    attempts.push(result);
                    return TargetOutcome::new(target.clone(), attempts, FinalOutcome::Success);
                }
                AttemptResult::FatalFailure(ref reason) => {
                    warn!("{} 致命失败，不再重试: {}", target, reason);
                    attempts.push(result);
                    return TargetOutcome::new(target.clone(), attempts, FinalOutcome::Exhausted);
                }
                AttemptResult::CaptchaDetected | AttemptResult::TransientFailure(_) => {
                    // 验证码轮询已在执行器内部完成，残留的验证码按瞬时失败计
                    warn!(
                        "{} 第 {}/{} 次尝试失败: {}",
                        target, attempt, self.max_retries, result
                    );
                    attempts.push(result);
                    if attempt < self.max_retries {
                        self.sleeper.sleep(self.backoff).await;
                    }
                }
            }
        }

        TargetOutcome::new(target.clone(), attempts, FinalOutcome::Exhausted)
    }
}
