//! 尝试结果与运行汇总
//!
//! 单次尝试 → 单个目标的结果 → 一次运行的汇总，逐层聚合

use std::fmt::Display;

use chrono::{DateTime, Local};

use crate::models::target::Target;

/// 单次尝试的分类结果（由执行器产出，每次尝试恰好一个）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptResult {
    /// 成功指示出现在超时之内
    Success,
    /// 超时、网络错误或未预期的 DOM 状态（可重试）
    TransientFailure(String),
    /// 验证码在轮询之后仍未解除
    CaptchaDetected,
    /// 目标固有原因导致的失败（账号不存在、无私信入口等，不重试）
    FatalFailure(String),
}

impl AttemptResult {
    pub fn is_success(&self) -> bool {
        matches!(self, AttemptResult::Success)
    }
}

impl Display for AttemptResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttemptResult::Success => write!(f, "成功"),
            AttemptResult::TransientFailure(reason) => write!(f, "瞬时失败: {}", reason),
            AttemptResult::CaptchaDetected => write!(f, "验证码未解除"),
            AttemptResult::FatalFailure(reason) => write!(f, "致命失败: {}", reason),
        }
    }
}

/// 单个目标的最终状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalOutcome {
    /// 某次尝试成功
    Success,
    /// 重试耗尽或遇到致命失败
    Exhausted,
    /// 未尝试（会话失效后跳过的剩余目标）
    Skipped,
}

impl Display for FinalOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FinalOutcome::Success => write!(f, "SUCCESS"),
            FinalOutcome::Exhausted => write!(f, "EXHAUSTED"),
            FinalOutcome::Skipped => write!(f, "SKIPPED"),
        }
    }
}

/// 单个目标在一次运行中的完整结果
///
/// 由重试策略产出，每个目标每次运行恰好一个，产出后不再修改
#[derive(Debug, Clone)]
pub struct TargetOutcome {
    pub target: Target,
    /// 按时间顺序记录的各次尝试
    pub attempts: Vec<AttemptResult>,
    pub final_outcome: FinalOutcome,
}

impl TargetOutcome {
    pub fn new(target: Target, attempts: Vec<AttemptResult>, final_outcome: FinalOutcome) -> Self {
        Self {
            target,
            attempts,
            final_outcome,
        }
    }

    /// 因会话失效而未尝试的目标
    pub fn skipped(target: Target) -> Self {
        Self {
            target,
            attempts: Vec::new(),
            final_outcome: FinalOutcome::Skipped,
        }
    }

    pub fn is_success(&self) -> bool {
        self.final_outcome == FinalOutcome::Success
    }
}

/// 一次运行的汇总
///
/// 交给 RunLog 持久化后即丢弃，不跨运行保留
#[derive(Debug)]
pub struct RunSummary {
    pub run_timestamp: DateTime<Local>,
    pub outcomes: Vec<TargetOutcome>,
}

impl RunSummary {
    pub fn new(run_timestamp: DateTime<Local>, outcomes: Vec<TargetOutcome>) -> Self {
        Self {
            run_timestamp,
            outcomes,
        }
    }

    pub fn success_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.final_outcome == FinalOutcome::Exhausted)
            .count()
    }

    pub fn skipped_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.final_outcome == FinalOutcome::Skipped)
            .count()
    }
}
