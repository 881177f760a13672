pub mod retry;
pub mod time;

pub use retry::{ActionExecutor, RetryPolicy};
pub use time::{Clock, Sleeper, SystemClock, TokioSleeper};
