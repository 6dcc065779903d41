//! 核心数据类型定义
//!
//! 定义倒计时与休眠流程中使用的核心数据结构和枚举

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// 倒计时状态枚举
#[derive(Debug, Clone, PartialEq)]
pub enum CountdownStatus {
    /// 空闲状态，尚未开始
    Idle,
    /// 运行中，包含剩余时间
    Running { remaining: Duration },
    /// 已完成，等待执行休眠
    Finished,
    /// 已取消
    Cancelled,
}

impl CountdownStatus {
    /// 倒计时是否已经结束（完成或取消）
    pub fn is_stopped(&self) -> bool {
        matches!(self, CountdownStatus::Finished | CountdownStatus::Cancelled)
    }
}

impl fmt::Display for CountdownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CountdownStatus::Idle => write!(f, "未开始"),
            CountdownStatus::Running { remaining } => {
                write!(f, "剩余{:.1}秒", remaining.as_secs_f64())
            },
            CountdownStatus::Finished => write!(f, "倒计时结束，准备休眠"),
            CountdownStatus::Cancelled => write!(f, "倒计时已取消"),
        }
    }
}

/// 倒计时参数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CountdownSettings {
    /// 倒计时总时长（秒），必须大于0
    pub duration_seconds: u32,
    /// 每秒刷新次数，必须大于0
    pub tick_rate_hz: u32,
    /// 是否显示一位小数的剩余秒数
    pub show_decimal_seconds: bool,
}

impl CountdownSettings {
    pub const DEFAULT_DURATION_SECONDS: u32 = 10;
    pub const DEFAULT_TICK_RATE_HZ: u32 = 20;

    /// 倒计时总时长
    pub fn duration(&self) -> Duration {
        Duration::from_secs(u64::from(self.duration_seconds))
    }

    /// 两次刷新之间的间隔
    pub fn tick_period(&self) -> Duration {
        Duration::from_secs(1) / self.tick_rate_hz.max(1)
    }
}

impl Default for CountdownSettings {
    fn default() -> Self {
        Self {
            duration_seconds: Self::DEFAULT_DURATION_SECONDS,
            tick_rate_hz: Self::DEFAULT_TICK_RATE_HZ,
            show_decimal_seconds: false,
        }
    }
}

/// 单次刷新的结果
#[derive(Debug, Clone, PartialEq)]
pub struct CountdownTick {
    /// 剩余时间
    pub remaining: Duration,
    /// 进度百分比，范围 [0, 100]
    pub progress: f64,
    /// 需要刷新的剩余时间文本；与上一次相同时为 None
    pub label: Option<String>,
}

/// 状态机一次 tick 的输出
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// 继续运行，在 `next_delay` 之后再次 tick
    Continue { tick: CountdownTick, next_delay: Duration },
    /// 剩余时间归零，这是最后一次 tick
    Completed(CountdownTick),
    /// 外部请求终止，本次 tick 不产生更新
    Terminated,
    /// 已经结束的倒计时再次被 tick，不做任何事
    Stopped,
}
