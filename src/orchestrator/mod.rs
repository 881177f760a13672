//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量执行与每日调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_runner` - 批量执行器
//! - 每次运行获取一个认证会话（而不是每个目标一个）
//! - 按列表顺序逐个处理目标，逐个记录结果
//! - 单个目标的失败被完全隔离，绝不中断批次
//! - 运行结束时在所有退出路径上恰好释放一次会话
//! - 产出 RunSummary 交给 RunLog 持久化
//!
//! ### `scheduler` - 每日调度器
//! - Idle → Sleep-until → Fire → RunTriggered 状态机
//! - 每次触发后把下次触发时间精确推进 24 小时（不从"现在"重算）
//! - 停止信号只在休眠间隙生效，进行中的批次总是允许完成
//!
//! ## 层次关系
//!
//! ```text
//! scheduler (每日一次)
//!     ↓
//! batch_runner (处理整个目标列表)
//!     ↓
//! workflow::RetryPolicy (处理单个目标)
//!     ↓
//! services (能力层：会话 / 发送 / 运行日志)
//!     ↓
//! infrastructure (基础设施：PageDriver)
//! ```

pub mod batch_runner;
pub mod scheduler;

pub use batch_runner::BatchRunner;
pub use scheduler::{ScheduleState, Scheduler};
