//! 测试公用的假实现
//!
//! 脚本化的执行器 / 会话后端 / 休眠器，使批量流程和调度器
//! 可以在没有浏览器、没有真实等待的情况下被确定性验证

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;

use tiktok_streak_bot::{
    ActionExecutor, AppError, AppResult, AttemptResult, AuthError, Config, SessionBackend,
    Sleeper, Target,
};

/// 脚本化执行器
///
/// 按目标名依次弹出预设结果，脚本耗尽后返回 Success；
/// 记录每次调用的目标名以便断言顺序
#[derive(Clone, Default)]
pub struct ScriptedExecutor {
    script: Arc<Mutex<HashMap<String, VecDeque<AttemptResult>>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&self, name: &str, results: Vec<AttemptResult>) {
        self.script
            .lock()
            .unwrap()
            .insert(name.to_string(), results.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ActionExecutor for ScriptedExecutor {
    async fn perform(&self, target: &Target) -> AttemptResult {
        self.calls.lock().unwrap().push(target.name().to_string());
        self.script
            .lock()
            .unwrap()
            .get_mut(target.name())
            .and_then(|queue| queue.pop_front())
            .unwrap_or(AttemptResult::Success)
    }
}

/// 不真正等待的休眠器，记录每次请求的时长
#[derive(Clone, Default)]
pub struct NoopSleeper {
    slept: Arc<Mutex<Vec<Duration>>>,
}

impl NoopSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slept(&self) -> Vec<Duration> {
        self.slept.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for NoopSleeper {
    async fn sleep(&self, duration: Duration) {
        self.slept.lock().unwrap().push(duration);
    }
}

/// 脚本化会话后端
///
/// 会话就是一个自增编号；可以预设 acquire 失败序列和
/// is_authenticated 响应序列（默认成功 / 有效）
#[derive(Clone)]
pub struct FakeBackend {
    pub executor: ScriptedExecutor,
    acquire_failures: Arc<Mutex<VecDeque<bool>>>,
    auth_checks: Arc<Mutex<VecDeque<bool>>>,
    acquired: Arc<AtomicUsize>,
    released: Arc<AtomicUsize>,
    /// 释放会话时发送停止信号（调度器测试用）
    stop_on_release: Arc<Mutex<Option<watch::Sender<bool>>>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            executor: ScriptedExecutor::new(),
            acquire_failures: Arc::new(Mutex::new(VecDeque::new())),
            auth_checks: Arc::new(Mutex::new(VecDeque::new())),
            acquired: Arc::new(AtomicUsize::new(0)),
            released: Arc::new(AtomicUsize::new(0)),
            stop_on_release: Arc::new(Mutex::new(None)),
        }
    }

    /// 预设 acquire 调用序列的成败（true = 该次调用失败）
    pub fn fail_acquires(&self, failures: Vec<bool>) {
        *self.acquire_failures.lock().unwrap() = failures.into();
    }

    /// 预设 is_authenticated 的响应序列（耗尽后默认 true）
    pub fn auth_responses(&self, responses: Vec<bool>) {
        *self.auth_checks.lock().unwrap() = responses.into();
    }

    pub fn stop_on_release(&self, sender: watch::Sender<bool>) {
        *self.stop_on_release.lock().unwrap() = Some(sender);
    }

    pub fn acquired_count(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }

    pub fn released_count(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionBackend for FakeBackend {
    type Session = usize;
    type Executor = ScriptedExecutor;

    async fn acquire(&self) -> AppResult<usize> {
        let should_fail = self
            .acquire_failures
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(false);
        if should_fail {
            return Err(AppError::Auth(AuthError::LoginRejected));
        }
        Ok(self.acquired.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn executor(&self, _session: &usize) -> ScriptedExecutor {
        self.executor.clone()
    }

    async fn is_authenticated(&self, _session: &usize) -> bool {
        self.auth_checks.lock().unwrap().pop_front().unwrap_or(true)
    }

    async fn release(&self, _session: usize) {
        self.released.fetch_add(1, Ordering::SeqCst);
        if let Some(sender) = self.stop_on_release.lock().unwrap().take() {
            let _ = sender.send(true);
        }
    }
}

/// 无延迟、无退避的测试配置
pub fn test_config(users_file: &str, log_file: &str) -> Config {
    let mut config = Config::default();
    config.users_file = users_file.to_string();
    config.log_file = log_file.to_string();
    config.retry_backoff_secs = 0;
    config.user_delay_secs = (0, 0);
    config
}
