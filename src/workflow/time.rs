//! 可注入的时钟与休眠器
//!
//! 重试退避、目标间延迟和调度器的等待都通过这两个接口挂起，
//! 测试中注入假实现即可做到无真实等待的确定性验证

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local};

/// 墙钟时间来源
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

/// 系统时钟
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// 挂起指定时长的能力
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// 基于 tokio 定时器的休眠器
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
