use chrono::NaiveTime;

use crate::error::{AppError, AppResult, ConfigError};

/// 程序配置文件
#[derive(Clone, Debug)]
pub struct Config {
    /// 每日执行时间（24 小时制 HH:MM）
    pub send_time: String,
    /// Cookie 导出文件路径（JSON 数组）
    pub cookies_file: String,
    /// 用户列表文件路径（每行一个用户名）
    pub users_file: String,
    /// 运行日志文件路径（只追加）
    pub log_file: String,
    /// 单个目标的最大尝试次数
    pub max_retries: usize,
    /// UI 元素等待超时（秒）
    pub wait_timeout_secs: u64,
    /// 验证码复查轮询次数
    pub captcha_check_attempts: usize,
    /// 验证码复查轮询间隔（秒）
    pub captcha_poll_secs: u64,
    /// 重试之间的退避间隔（秒）
    pub retry_backoff_secs: u64,
    /// 是否以无头模式运行浏览器
    pub headless: bool,
    /// 模拟人工输入的单字符延迟范围（毫秒）
    pub typing_delay_ms: (u64, u64),
    /// 相邻目标之间的随机延迟范围（秒）
    pub user_delay_secs: (u64, u64),
    /// 连胜消息池（随机选取一条发送）
    pub messages: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            send_time: "21:00".to_string(),
            cookies_file: "cookies.json".to_string(),
            users_file: "list.txt".to_string(),
            log_file: "tiktok_logs.txt".to_string(),
            max_retries: 3,
            wait_timeout_secs: 20,
            captcha_check_attempts: 3,
            captcha_poll_secs: 2,
            retry_backoff_secs: 5,
            headless: true,
            typing_delay_ms: (50, 150),
            user_delay_secs: (8, 15),
            messages: vec![
                "🔥🔥🔥".to_string(),
                "streak! 🔥".to_string(),
                "daily streak 🔥".to_string(),
            ],
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            send_time: std::env::var("SEND_TIME").unwrap_or(default.send_time),
            cookies_file: std::env::var("COOKIES_FILE").unwrap_or(default.cookies_file),
            users_file: std::env::var("USERS_FILE").unwrap_or(default.users_file),
            log_file: std::env::var("LOG_FILE").unwrap_or(default.log_file),
            max_retries: std::env::var("MAX_RETRIES").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_retries),
            wait_timeout_secs: std::env::var("WAIT_TIMEOUT").ok().and_then(|v| v.parse().ok()).unwrap_or(default.wait_timeout_secs),
            captcha_check_attempts: std::env::var("CAPTCHA_CHECK_ATTEMPTS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.captcha_check_attempts),
            captcha_poll_secs: std::env::var("CAPTCHA_POLL_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.captcha_poll_secs),
            retry_backoff_secs: std::env::var("RETRY_BACKOFF").ok().and_then(|v| v.parse().ok()).unwrap_or(default.retry_backoff_secs),
            headless: std::env::var("HEADLESS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.headless),
            typing_delay_ms: default.typing_delay_ms,
            user_delay_secs: default.user_delay_secs,
            messages: std::env::var("STREAK_MESSAGES")
                .map(|v| v.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect())
                .ok()
                .filter(|v: &Vec<String>| !v.is_empty())
                .unwrap_or(default.messages),
        }
    }

    /// 解析每日执行时间
    ///
    /// 格式不合法时返回配置错误（启动期校验，进程以非零退出码结束）
    pub fn send_time_of_day(&self) -> AppResult<NaiveTime> {
        NaiveTime::parse_from_str(&self.send_time, "%H:%M").map_err(|_| {
            AppError::Config(ConfigError::InvalidSendTime {
                value: self.send_time.clone(),
            })
        })
    }
}
