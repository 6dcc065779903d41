//! 倒计时驱动模块
//!
//! [`CountdownDriver`] 是一个显式状态机：宿主事件循环在定时器到期时调用
//! [`CountdownDriver::tick`]，由返回值决定是否以及何时安排下一次 tick。
//! [`run_countdown`] 用 tokio 定时器驱动同一个状态机。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, info};
use uuid::Uuid;

use crate::core::types::{CountdownSettings, CountdownStatus, CountdownTick, TickOutcome};

/// 终止句柄，可在倒计时运行期间从外部请求停止
#[derive(Debug, Clone, Default)]
pub struct TerminateHandle(Arc<AtomicBool>);

impl TerminateHandle {
    /// 请求终止，下一次 tick 生效
    pub fn terminate(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_terminated(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// 倒计时驱动器
#[derive(Debug)]
pub struct CountdownDriver {
    /// 唯一标识符，用于日志
    id: Uuid,
    /// 倒计时参数
    settings: CountdownSettings,
    /// 当前状态
    status: CountdownStatus,
    /// 开始时刻
    started_at: Option<Instant>,
    /// 已处理的 tick 数
    ticks: u32,
    /// 上一次显示的整数秒
    last_displayed_seconds: Option<u64>,
    /// 上一次的进度
    last_progress: f64,
    /// 终止标志
    terminated: TerminateHandle,
}

impl CountdownDriver {
    /// 创建新的倒计时驱动器
    ///
    /// 参数由配置层保证合法：时长与刷新率都大于0
    pub fn new(settings: CountdownSettings) -> Self {
        Self {
            id: Uuid::new_v4(),
            settings,
            status: CountdownStatus::Idle,
            started_at: None,
            ticks: 0,
            last_displayed_seconds: None,
            last_progress: 0.0,
            terminated: TerminateHandle::default(),
        }
    }

    /// 获取驱动器ID
    pub fn get_id(&self) -> Uuid {
        self.id
    }

    /// 获取当前状态
    pub fn get_status(&self) -> &CountdownStatus {
        &self.status
    }

    /// 已处理的 tick 数
    #[cfg(test)]
    pub fn tick_count(&self) -> u32 {
        self.ticks
    }

    /// 获取终止句柄
    pub fn terminate_handle(&self) -> TerminateHandle {
        self.terminated.clone()
    }

    /// 请求终止倒计时
    pub fn terminate(&self) {
        info!("请求终止倒计时 [{}]", self.id);
        self.terminated.terminate();
    }

    /// 记录开始时刻，第一次 tick 应立即执行
    pub fn start(&mut self, now: Instant) {
        info!(
            "开始倒计时 [{}]: {}秒, {}Hz",
            self.id, self.settings.duration_seconds, self.settings.tick_rate_hz
        );
        self.started_at = Some(now);
        self.ticks = 0;
        self.last_displayed_seconds = None;
        self.last_progress = 0.0;
        self.status = CountdownStatus::Running { remaining: self.settings.duration() };
    }

    /// 执行一次 tick
    ///
    /// 尚未调用 [`start`](Self::start) 时以 `now` 作为开始时刻
    pub fn tick(&mut self, now: Instant) -> TickOutcome {
        if self.status.is_stopped() {
            return TickOutcome::Stopped;
        }

        if self.terminated.is_terminated() {
            info!("倒计时被取消 [{}]", self.id);
            self.status = CountdownStatus::Cancelled;
            return TickOutcome::Terminated;
        }

        let start = match self.started_at {
            Some(start) => start,
            None => {
                self.start(now);
                now
            },
        };

        let duration = self.settings.duration();
        let elapsed = now.saturating_duration_since(start);
        let remaining = duration.saturating_sub(elapsed);
        self.ticks = self.ticks.saturating_add(1);

        if remaining.is_zero() {
            info!("倒计时结束 [{}]，共 {} 次 tick", self.id, self.ticks);
            self.status = CountdownStatus::Finished;
            self.last_progress = 100.0;
            let label = self.label_for(remaining);
            return TickOutcome::Completed(CountdownTick {
                remaining,
                progress: 100.0,
                label,
            });
        }

        let progress = Self::calculate_progress(elapsed, duration).max(self.last_progress);
        self.last_progress = progress;
        self.status = CountdownStatus::Running { remaining };

        let tick = CountdownTick {
            remaining,
            progress,
            label: self.label_for(remaining),
        };
        let next_delay = self.next_target(start).saturating_duration_since(now);

        TickOutcome::Continue { tick, next_delay }
    }

    /// 下一次 tick 的目标时刻：按开始时刻加上 tick 数计算，不超过结束时刻
    fn next_target(&self, start: Instant) -> Instant {
        let deadline = start + self.settings.duration();
        self.settings
            .tick_period()
            .checked_mul(self.ticks)
            .and_then(|offset| start.checked_add(offset))
            .map_or(deadline, |target| target.min(deadline))
    }

    /// 计算需要刷新的文本；整数秒模式下与上一次相同则返回 None
    fn label_for(&mut self, remaining: Duration) -> Option<String> {
        if self.settings.show_decimal_seconds {
            return Some(Self::format_remaining(remaining, true));
        }

        let seconds = remaining.as_secs();
        if self.last_displayed_seconds == Some(seconds) {
            return None;
        }
        self.last_displayed_seconds = Some(seconds);
        Some(Self::format_remaining(remaining, false))
    }

    /// 格式化剩余时间
    ///
    /// 整数模式向下取整，小数模式保留一位小数
    pub fn format_remaining(remaining: Duration, show_decimals: bool) -> String {
        if show_decimals {
            // 截断到0.1秒，避免 9.96 显示成 10.0
            let tenths = remaining.as_millis() / 100;
            format!("{}.{}", tenths / 10, tenths % 10)
        } else {
            remaining.as_secs().to_string()
        }
    }

    /// 计算进度百分比，范围 [0, 100]
    pub fn calculate_progress(elapsed: Duration, total: Duration) -> f64 {
        if total.is_zero() {
            return 100.0;
        }
        let progress = elapsed.as_secs_f64() / total.as_secs_f64() * 100.0;
        progress.clamp(0.0, 100.0)
    }
}

/// 用 tokio 定时器运行完整的倒计时
///
/// 每次 tick 调用 `on_tick`，剩余时间归零后调用一次 `on_complete`。
/// 通过 [`TerminateHandle`] 终止时不会调用 `on_complete`。返回最终状态。
pub async fn run_countdown<T, C>(
    driver: &mut CountdownDriver,
    mut on_tick: T,
    on_complete: C,
) -> CountdownStatus
where
    T: FnMut(&CountdownTick),
    C: FnOnce(),
{
    driver.start(tokio::time::Instant::now().into_std());

    loop {
        match driver.tick(tokio::time::Instant::now().into_std()) {
            TickOutcome::Continue { tick, next_delay } => {
                on_tick(&tick);
                debug!("下一次 tick 延迟 {:?}", next_delay);
                tokio::time::sleep(next_delay).await;
            },
            TickOutcome::Completed(tick) => {
                on_tick(&tick);
                on_complete();
                break;
            },
            TickOutcome::Terminated | TickOutcome::Stopped => break,
        }
    }

    driver.get_status().clone()
}
