//! 调度状态机与调度循环的确定性测试（假时钟，无真实等待）

mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Local, NaiveTime, TimeZone};
use common::{test_config, FakeBackend, NoopSleeper};
use tempfile::tempdir;
use tokio::sync::watch;

use tiktok_streak_bot::{BatchRunner, Clock, RunLog, ScheduleState, Scheduler, Sleeper};

fn local(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Local> {
    Local
        .with_ymd_and_hms(y, mo, d, h, mi, 0)
        .single()
        .expect("测试时刻应当无歧义")
}

fn send_time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).expect("测试时间应当合法")
}

#[test]
fn next_fire_is_today_when_send_time_has_not_passed() {
    let now = local(2026, 3, 10, 9, 0);
    let state = ScheduleState::new(send_time(21, 0), now);
    assert_eq!(state.next_fire(), local(2026, 3, 10, 21, 0));
}

#[test]
fn next_fire_rolls_to_tomorrow_when_send_time_already_passed() {
    let now = local(2026, 3, 10, 22, 30);
    let state = ScheduleState::new(send_time(21, 0), now);
    assert_eq!(state.next_fire(), local(2026, 3, 11, 21, 0));
}

#[test]
fn next_fire_rolls_to_tomorrow_at_exact_send_instant() {
    let now = local(2026, 3, 10, 21, 0);
    let state = ScheduleState::new(send_time(21, 0), now);
    assert_eq!(state.next_fire(), local(2026, 3, 11, 21, 0));
}

#[test]
fn advance_moves_exactly_24_hours_from_fire_instant() {
    let now = local(2026, 3, 10, 9, 0);
    let mut state = ScheduleState::new(send_time(21, 0), now);
    let fired_at = state.next_fire();

    // 推进与批次耗时无关：不从"现在"重算
    state.advance();

    assert_eq!(state.next_fire() - fired_at, ChronoDuration::hours(24));
    assert_eq!(state.next_fire(), local(2026, 3, 11, 21, 0));
}

// ========== 调度循环 ==========

/// 可手动推进的假时钟
#[derive(Clone)]
struct FakeClock {
    now: Arc<Mutex<DateTime<Local>>>,
}

impl FakeClock {
    fn new(start: DateTime<Local>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }
}

impl Clock for FakeClock {
    fn now(&self) -> DateTime<Local> {
        *self.now.lock().unwrap()
    }
}

/// 不真实等待、而是把假时钟向前推进请求时长的休眠器
#[derive(Clone)]
struct AdvancingSleeper {
    now: Arc<Mutex<DateTime<Local>>>,
}

#[async_trait]
impl Sleeper for AdvancingSleeper {
    async fn sleep(&self, duration: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += ChronoDuration::from_std(duration).unwrap_or(ChronoDuration::zero());
    }
}

#[tokio::test]
async fn scheduler_fires_once_then_advances_24_hours() {
    let dir = tempdir().expect("创建临时目录失败");
    let users_path = dir.path().join("list.txt");
    let log_path = dir.path().join("logs.txt");
    std::fs::write(&users_path, "alice\n").expect("写入用户列表失败");
    let config = test_config(
        users_path.to_str().expect("路径应为 UTF-8"),
        log_path.to_str().expect("路径应为 UTF-8"),
    );

    // 20:59 启动，21:00 触发
    let clock = FakeClock::new(local(2026, 3, 10, 20, 59));
    let sleeper = AdvancingSleeper {
        now: clock.now.clone(),
    };

    let (stop_tx, stop_rx) = watch::channel(false);
    let backend = FakeBackend::new();
    // 批次结束释放会话时发出停止信号，循环在下一个休眠间隙退出
    backend.stop_on_release(stop_tx);
    let counters = backend.clone();
    let executor = backend.executor.clone();

    let run_log = RunLog::new(log_path.to_str().expect("路径应为 UTF-8"));
    let runner = BatchRunner::new(backend, &config, run_log.clone(), NoopSleeper::new());
    let mut scheduler = Scheduler::new(send_time(21, 0), clock, sleeper, run_log);

    tokio::time::timeout(Duration::from_secs(10), scheduler.run(&runner, stop_rx))
        .await
        .expect("调度循环应当在停止信号后退出")
        .expect("调度循环不应报错");

    // 恰好触发一次，目标被处理
    assert_eq!(counters.acquired_count(), 1);
    assert_eq!(executor.calls(), vec!["alice".to_string()]);
    // 下次触发精确推进到明天 21:00
    assert_eq!(scheduler.state().next_fire(), local(2026, 3, 11, 21, 0));

    let log = std::fs::read_to_string(&log_path).expect("读取日志失败");
    assert!(log.contains("调度器已启动"));
    assert!(log.contains("调度器已停止"));
}

#[tokio::test]
async fn run_log_failure_does_not_kill_scheduler_loop() {
    let dir = tempdir().expect("创建临时目录失败");
    let users_path = dir.path().join("list.txt");
    let runner_log_path = dir.path().join("logs.txt");
    std::fs::write(&users_path, "alice\n").expect("写入用户列表失败");
    let config = test_config(
        users_path.to_str().expect("路径应为 UTF-8"),
        runner_log_path.to_str().expect("路径应为 UTF-8"),
    );

    // 调度器的日志路径指向一个目录，每次追加都会失败
    let broken_log_path = dir.path().join("broken_log");
    std::fs::create_dir(&broken_log_path).expect("创建目录失败");

    let clock = FakeClock::new(local(2026, 3, 10, 20, 59));
    let sleeper = AdvancingSleeper {
        now: clock.now.clone(),
    };

    let (stop_tx, stop_rx) = watch::channel(false);
    let backend = FakeBackend::new();
    backend.stop_on_release(stop_tx);
    let counters = backend.clone();

    let runner = BatchRunner::new(
        backend,
        &config,
        RunLog::new(runner_log_path.to_str().expect("路径应为 UTF-8")),
        NoopSleeper::new(),
    );
    let broken_log = RunLog::new(broken_log_path.to_str().expect("路径应为 UTF-8"));
    let mut scheduler = Scheduler::new(send_time(21, 0), clock, sleeper, broken_log);

    // 日志不可写时调度照常进行：触发、推进、响应停止信号
    tokio::time::timeout(Duration::from_secs(10), scheduler.run(&runner, stop_rx))
        .await
        .expect("调度循环应当在停止信号后退出")
        .expect("日志写入失败不应中断调度循环");

    assert_eq!(counters.acquired_count(), 1);
    assert_eq!(scheduler.state().next_fire(), local(2026, 3, 11, 21, 0));
}
