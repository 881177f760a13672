//! 每日调度器 - 编排层
//!
//! 一个常驻的控制循环，而不是一次性调用：
//!
//! - **Idle**：计算下次触发时刻（今天的 SEND_TIME；已过则用明天的）
//! - **Sleep-until**：分片休眠直到墙钟到达触发时刻，只在休眠间隙
//!   响应停止信号
//! - **Fire**：调用 BatchRunner.run_once()；无论运行成败，完成后
//!   把触发时刻精确推进 24 小时（不从"现在"重算，批次超时运行
//!   也不会漂移或当天重复触发）
//!
//! 调度器与批次共享同一个执行上下文，结构上保证不会有并发批次

use std::time::Duration;

use chrono::{DateTime, Days, Duration as ChronoDuration, Local, LocalResult, NaiveTime, TimeZone};
use tokio::sync::watch;
use tracing::{error, info};

use crate::error::AppResult;
use crate::orchestrator::batch_runner::BatchRunner;
use crate::services::run_log::RunLog;
use crate::services::session_store::SessionBackend;
use crate::workflow::time::{Clock, Sleeper};

/// 单次休眠分片的上限；停止信号只在分片之间被检查
const SLEEP_TICK: Duration = Duration::from_secs(60);

/// 心跳间隔（秒）：休眠期间定期向运行日志写一条状态
const HEARTBEAT_SECS: i64 = 900;

/// 调度状态
///
/// 进程内存中的"下次触发时刻"；进程重启后根据配置时刻和当前
/// 墙钟重新计算，不做跨重启持久化
#[derive(Debug, Clone)]
pub struct ScheduleState {
    send_time: NaiveTime,
    next_fire: DateTime<Local>,
}

impl ScheduleState {
    /// 初始化规则：今天的 SEND_TIME 已经过去则使用明天的
    ///
    /// 这同时也是每次触发之后的状态转移规则
    pub fn new(send_time: NaiveTime, now: DateTime<Local>) -> Self {
        let today = resolve_local(now.date_naive().and_time(send_time));
        let next_fire = if today <= now {
            // 滚动到明天时按明天的墙钟时刻重新解析：跨夏令时跳变
            // 直接加 24 小时会偏离配置的时刻一小时
            let tomorrow = now
                .date_naive()
                .checked_add_days(Days::new(1))
                .unwrap_or(now.date_naive());
            resolve_local(tomorrow.and_time(send_time))
        } else {
            today
        };
        Self {
            send_time,
            next_fire,
        }
    }

    pub fn next_fire(&self) -> DateTime<Local> {
        self.next_fire
    }

    pub fn send_time(&self) -> NaiveTime {
        self.send_time
    }

    /// 触发之后精确推进 24 小时
    ///
    /// 从刚刚发生的触发时刻推进，而不是从"现在"重算，保证既不
    /// 漂移也不会在批次超时后当天重复触发
    pub fn advance(&mut self) {
        self.next_fire += ChronoDuration::hours(24);
    }
}

/// 把本地朴素时间解析为带时区的时刻
///
/// 夏令时跳变导致的歧义取较早的一个；不存在的时刻顺延一小时
fn resolve_local(naive: chrono::NaiveDateTime) -> DateTime<Local> {
    match Local.from_local_datetime(&naive) {
        LocalResult::Single(t) => t,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => resolve_local(naive + ChronoDuration::hours(1)),
    }
}

/// 每日调度器
pub struct Scheduler<C: Clock, S: Sleeper> {
    state: ScheduleState,
    clock: C,
    sleeper: S,
    run_log: RunLog,
}

impl<C: Clock, S: Sleeper> Scheduler<C, S> {
    pub fn new(send_time: NaiveTime, clock: C, sleeper: S, run_log: RunLog) -> Self {
        let state = ScheduleState::new(send_time, clock.now());
        Self {
            state,
            clock,
            sleeper,
            run_log,
        }
    }

    pub fn state(&self) -> &ScheduleState {
        &self.state
    }

    /// 向运行日志写一条调度器事件
    ///
    /// 循环已经在运行，日志写入失败只记录、绝不向上传播：
    /// 运行日志不可写时调度照常进行
    async fn log_event(&self, message: &str) {
        if let Err(e) = self.run_log.scheduler_event(message).await {
            error!("写入运行日志失败: {}", e);
        }
    }

    /// 调度主循环，直到收到停止信号
    ///
    /// 停止信号只在休眠间隙生效：进行中的批次总是允许完成，
    /// 批次结束后再退出。进入循环后任何运行日志写入失败都只
    /// 记录，不会中断调度
    pub async fn run<B, S2>(
        &mut self,
        runner: &BatchRunner<B, S2>,
        mut shutdown: watch::Receiver<bool>,
    ) -> AppResult<()>
    where
        B: SessionBackend,
        S2: Sleeper + Clone,
    {
        info!(
            "🤖 调度器已启动，每日执行时间 {}，下次触发: {}",
            self.state.send_time.format("%H:%M"),
            self.state.next_fire.format("%Y-%m-%d %H:%M:%S")
        );
        self.log_event(&format!(
            "调度器已启动，下次触发: {}",
            self.state.next_fire.format("%Y-%m-%d %H:%M:%S")
        ))
        .await;

        loop {
            // ========== Sleep-until(next_fire) ==========
            let stopped = self.sleep_until_fire(&mut shutdown).await;
            if stopped {
                info!("⚠️ 收到停止信号，调度器退出");
                self.log_event("调度器已停止").await;
                return Ok(());
            }

            // ========== Fire → RunTriggered ==========
            let fired_at = self.state.next_fire;
            info!(
                "⏰ 到达触发时刻 {}，开始本日批量发送",
                fired_at.format("%Y-%m-%d %H:%M:%S")
            );

            match runner.run_once().await {
                Ok(summary) => {
                    info!(
                        "本日运行结束: 成功 {}/{}",
                        summary.success_count(),
                        summary.outcomes.len()
                    );
                }
                // 运行级别的失败不影响进程：记录后等待下一个触发时刻
                Err(e) => {
                    error!("❌ 本日运行失败: {}", e);
                }
            }

            // 无论运行成败都精确推进 24 小时
            self.state.advance();
            self.log_event(&format!(
                "下次触发: {}",
                self.state.next_fire.format("%Y-%m-%d %H:%M:%S")
            ))
            .await;

            // 批次执行期间收到的停止信号在此生效
            if *shutdown.borrow() {
                info!("⚠️ 停止信号在批次执行期间到达，批次已完成，调度器退出");
                self.log_event("调度器已停止").await;
                return Ok(());
            }
        }
    }

    /// 分片休眠直到触发时刻；收到停止信号返回 true
    async fn sleep_until_fire(&self, shutdown: &mut watch::Receiver<bool>) -> bool {
        let mut last_heartbeat = self.clock.now();

        loop {
            let now = self.clock.now();
            if now >= self.state.next_fire {
                return false;
            }

            // 定期心跳，证明调度器还活着
            if (now - last_heartbeat).num_seconds() >= HEARTBEAT_SECS {
                let remaining = self.state.next_fire - now;
                info!(
                    "✓ 调度器运行中，距下次触发还有 {}h {}m",
                    remaining.num_hours(),
                    remaining.num_minutes() % 60
                );
                self.log_event(&format!(
                    "调度器心跳，下次触发: {}",
                    self.state.next_fire.format("%Y-%m-%d %H:%M:%S")
                ))
                .await;
                last_heartbeat = now;
            }

            let remaining = (self.state.next_fire - now)
                .to_std()
                .unwrap_or(Duration::ZERO)
                .min(SLEEP_TICK);

            tokio::select! {
                _ = self.sleeper.sleep(remaining) => {}
                changed = shutdown.changed() => {
                    match changed {
                        Ok(()) => {
                            if *shutdown.borrow_and_update() {
                                return true;
                            }
                        }
                        // 发送端已丢弃：不会再有停止信号，按原计划休眠
                        Err(_) => self.sleeper.sleep(remaining).await,
                    }
                }
            }
        }
    }
}
