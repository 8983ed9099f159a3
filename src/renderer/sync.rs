//! 帧同步记账
//!
//! 每个后缓冲对应一个 Fence 和一个单调递增的 Fence 值。
//! 本模块只负责值的记账，与图形 API 无关；真正的 Signal / 等待在
//! `gfx::dx12::context` 中完成。
//!
//! # 每帧流程
//!
//! 1. 提交并呈现后，对当前帧调用 [`FrameFences::advance`] 得到要 Signal 的值
//! 2. 交换链切到下一个后缓冲，调用 [`FrameFences::pending`] 得到需要等待的值
//! 3. 若 Fence 的已完成值小于该值则阻塞等待（最多 [`FENCE_WAIT_TIMEOUT_MS`]）

/// Fence 等待超时（毫秒）
pub const FENCE_WAIT_TIMEOUT_MS: u32 = 10_000;

/// Fence 值
///
/// 用于CPU-GPU同步的单调递增值。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct FenceValue(u64);

impl FenceValue {
    /// 创建新的Fence值
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// 获取内部值
    pub fn value(&self) -> u64 {
        self.0
    }

    /// 递增Fence值
    pub fn increment(&mut self) {
        self.0 += 1;
    }

    /// 下一个Fence值
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    /// GPU 已完成值是否达到本值
    pub fn is_reached_by(&self, completed: u64) -> bool {
        completed >= self.0
    }
}

/// 每个后缓冲一份的 Fence 值
#[derive(Debug, Clone)]
pub struct FrameFences {
    values: Vec<FenceValue>,
}

impl FrameFences {
    /// 所有帧从 0 开始，与创建 Fence 时的初始值一致
    pub fn new(frame_count: usize) -> Self {
        Self {
            values: vec![FenceValue::default(); frame_count],
        }
    }

    pub fn frame_count(&self) -> usize {
        self.values.len()
    }

    /// 该帧提交完成后递增并返回需要 Signal 的值
    ///
    /// # Panics
    ///
    /// `frame` 超出后缓冲数量时 panic（交换链索引总是在范围内）
    pub fn advance(&mut self, frame: usize) -> FenceValue {
        self.values[frame].increment();
        self.values[frame]
    }

    /// 复用该帧资源前需要等待的值
    pub fn pending(&self, frame: usize) -> FenceValue {
        self.values[frame]
    }

    /// 已完成值落后时才需要阻塞
    pub fn needs_wait(&self, frame: usize, completed: u64) -> bool {
        !self.values[frame].is_reached_by(completed)
    }

    /// 遍历每帧（下标, 值），用于退出前等待全部帧
    pub fn iter(&self) -> impl Iterator<Item = (usize, FenceValue)> + '_ {
        self.values.iter().copied().enumerate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fence_value() {
        let mut fence = FenceValue::new(0);
        assert_eq!(fence.value(), 0);

        fence.increment();
        assert_eq!(fence.value(), 1);

        let next = fence.next();
        assert_eq!(next.value(), 2);
        assert_eq!(fence.value(), 1); // 原值不变
    }

    #[test]
    fn test_fence_ordering() {
        let f1 = FenceValue::new(1);
        let f2 = FenceValue::new(2);
        let f3 = FenceValue::new(1);

        assert!(f1 < f2);
        assert!(f2 > f1);
        assert_eq!(f1, f3);
        assert!(f2.is_reached_by(2));
        assert!(!f2.is_reached_by(1));
    }

    #[test]
    fn test_frames_advance_independently() {
        let mut fences = FrameFences::new(2);
        assert_eq!(fences.frame_count(), 2);

        assert_eq!(fences.advance(0).value(), 1);
        assert_eq!(fences.advance(1).value(), 1);
        assert_eq!(fences.advance(0).value(), 2);

        assert_eq!(fences.pending(0).value(), 2);
        assert_eq!(fences.pending(1).value(), 1);
    }

    #[test]
    fn test_needs_wait_against_completed_value() {
        let mut fences = FrameFences::new(3);
        // 从未提交过的帧不需要等待
        assert!(!fences.needs_wait(2, 0));

        fences.advance(2);
        assert!(fences.needs_wait(2, 0));
        assert!(!fences.needs_wait(2, 1));
    }

    #[test]
    fn test_iter_covers_every_frame() {
        let mut fences = FrameFences::new(3);
        fences.advance(1);
        let all: Vec<(usize, u64)> = fences.iter().map(|(i, v)| (i, v.value())).collect();
        assert_eq!(all, vec![(0, 0), (1, 1), (2, 0)]);
    }
}
