//! # TikTok Streak Bot
//!
//! 在每天固定时刻向目标用户列表批量发送连胜消息的自动化程序，
//! 使用导出的 Cookie 恢复认证会话，不做交互式登录
//!
//! ## 架构设计
//!
//! 本系统采用严格的分层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Page），只暴露能力
//! - `PageDriver` - 唯一的 page owner，提供导航 / eval / 等待能力
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个目标
//! - `SessionStore` - 会话获取 / 校验 / 释放能力
//! - `StreakSender` - 对单个目标执行发送流程的能力
//! - `RunLog` - 追加运行日志的能力
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个目标"的重试流程
//! - `RetryPolicy` - 有界重试与退避
//! - `Clock` / `Sleeper` - 可注入的时间来源，支持确定性测试
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_runner` - 批量执行器，管理会话与目标遍历
//! - `orchestrator/scheduler` - 每日调度器状态机

pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod logger;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult, AuthError};
pub use infrastructure::PageDriver;
pub use models::{AttemptResult, FinalOutcome, RunSummary, Target, TargetList, TargetOutcome};
pub use orchestrator::{BatchRunner, ScheduleState, Scheduler};
pub use services::{RunLog, SessionBackend, SessionStore, StreakSender};
pub use workflow::{ActionExecutor, Clock, RetryPolicy, Sleeper, SystemClock, TokioSleeper};
