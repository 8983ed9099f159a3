//! 帧计时器
//!
//! `Timer` 跟踪总运行时间与帧间隔，停止期间的时间不计入总时间。
//! 每秒统计一次帧率，供主循环输出日志。

use std::time::{Duration, Instant};

/// 帧计时器
#[derive(Debug, Clone)]
pub struct Timer {
    base_time: Instant,
    prev_time: Instant,
    stop_time: Option<Instant>,
    paused: Duration,
    delta: Duration,

    // 帧率统计
    frames_since_report: u32,
    last_report: Instant,
    fps: f32,
}

impl Timer {
    /// 创建并立即开始计时
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    fn starting_at(now: Instant) -> Self {
        Self {
            base_time: now,
            prev_time: now,
            stop_time: None,
            paused: Duration::ZERO,
            delta: Duration::ZERO,
            frames_since_report: 0,
            last_report: now,
            fps: 0.0,
        }
    }

    /// 重置计时器（在消息循环开始前调用）
    pub fn reset(&mut self) {
        *self = Self::starting_at(Instant::now());
    }

    /// 从停止状态恢复
    pub fn start(&mut self) {
        self.start_at(Instant::now());
    }

    fn start_at(&mut self, now: Instant) {
        if let Some(stopped_at) = self.stop_time.take() {
            self.paused += now.saturating_duration_since(stopped_at);
            self.prev_time = now;
        }
    }

    /// 停止计时
    pub fn stop(&mut self) {
        self.stop_at(Instant::now());
    }

    fn stop_at(&mut self, now: Instant) {
        if self.stop_time.is_none() {
            self.stop_time = Some(now);
        }
    }

    /// 每帧调用一次，更新帧间隔。
    ///
    /// 返回 `Some(fps)` 表示距离上次报告已超过一秒。
    pub fn tick(&mut self) -> Option<f32> {
        self.tick_at(Instant::now())
    }

    fn tick_at(&mut self, now: Instant) -> Option<f32> {
        if self.stop_time.is_some() {
            self.delta = Duration::ZERO;
            return None;
        }

        // 时钟回退时 saturating 保证间隔不为负
        self.delta = now.saturating_duration_since(self.prev_time);
        self.prev_time = now;

        self.frames_since_report += 1;
        let elapsed = now.saturating_duration_since(self.last_report);
        if elapsed >= Duration::from_secs(1) {
            self.fps = self.frames_since_report as f32 / elapsed.as_secs_f32();
            self.frames_since_report = 0;
            self.last_report = now;
            Some(self.fps)
        } else {
            None
        }
    }

    /// 自 reset 以来的运行时间（秒），不含停止期间
    pub fn total_time(&self) -> f32 {
        let end = self.stop_time.unwrap_or(self.prev_time);
        end.saturating_duration_since(self.base_time)
            .saturating_sub(self.paused)
            .as_secs_f32()
    }

    /// 上一帧的间隔（秒）
    pub fn delta_time(&self) -> f32 {
        self.delta.as_secs_f32()
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn test_tick_measures_delta() {
        let t0 = Instant::now();
        let mut timer = Timer::starting_at(t0);

        timer.tick_at(t0 + ms(16));
        assert!((timer.delta_time() - 0.016).abs() < 1e-6);

        timer.tick_at(t0 + ms(48));
        assert!((timer.delta_time() - 0.032).abs() < 1e-6);
        assert!((timer.total_time() - 0.048).abs() < 1e-6);
    }

    #[test]
    fn test_paused_time_excluded() {
        let t0 = Instant::now();
        let mut timer = Timer::starting_at(t0);

        timer.tick_at(t0 + ms(100));
        timer.stop_at(t0 + ms(100));

        // 停止期间 tick 不产生间隔
        assert!(timer.tick_at(t0 + ms(300)).is_none());
        assert_eq!(timer.delta_time(), 0.0);

        timer.start_at(t0 + ms(600));
        timer.tick_at(t0 + ms(700));
        assert!((timer.delta_time() - 0.1).abs() < 1e-6);
        assert!((timer.total_time() - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_fps_reported_once_per_second() {
        let t0 = Instant::now();
        let mut timer = Timer::starting_at(t0);

        for i in 1..60 {
            assert!(timer.tick_at(t0 + ms(i * 16)).is_none());
        }
        let fps = timer.tick_at(t0 + ms(1000)).unwrap();
        assert!((fps - 60.0).abs() < 1e-3);
    }

    #[test]
    fn test_start_without_stop_is_noop() {
        let t0 = Instant::now();
        let mut timer = Timer::starting_at(t0);
        timer.start_at(t0 + ms(50));
        timer.tick_at(t0 + ms(50));
        assert!((timer.total_time() - 0.05).abs() < 1e-6);
    }

    #[test]
    fn test_repeated_focus_loss_keeps_first_stop() {
        let t0 = Instant::now();
        let mut timer = Timer::starting_at(t0);

        timer.tick_at(t0 + ms(100));
        timer.stop_at(t0 + ms(100));
        timer.stop_at(t0 + ms(400));
        timer.start_at(t0 + ms(500));
        timer.start_at(t0 + ms(550));
        timer.tick_at(t0 + ms(600));
        assert!((timer.total_time() - 0.2).abs() < 1e-6);
    }
}
