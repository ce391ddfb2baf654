//! GPU 同步机制模块
//!
//! 提供 CPU-GPU 同步用的 fence 值管理。
//!
//! 原始 demo 每次 flush 都新建一个 fence 并 signal 固定值 0xFF，
//! 功能正确但浪费。这里改为单个长生命周期 fence 配合严格递增的
//! 目标值：每次提交取 `next_value()`，GPU 完成后 CPU 侧记录
//! 已完成值，fence 对象本身由图形后端持有并复用。

/// Fence 值
///
/// 用于 CPU-GPU 同步的单调递增值。
/// CPU 可以等待 GPU 完成特定 fence 值对应的工作。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FenceValue(u64);

impl FenceValue {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// 获取内部值
    pub fn value(&self) -> u64 {
        self.0
    }

    /// 下一个 fence 值
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

/// Fence 时间线
///
/// 跟踪一条命令队列上已签发和已完成的 fence 值。
/// 签发值严格递增，保证同一个目标值不会被 signal 两次。
#[derive(Debug)]
pub struct FenceTimeline {
    /// 最近签发的值（CPU 侧）
    issued: u64,
    /// 已确认完成的值（GPU 侧）
    completed: u64,
}

impl FenceTimeline {
    /// 创建新的时间线，签发值和完成值都从 0 开始
    pub fn new() -> Self {
        Self {
            issued: 0,
            completed: 0,
        }
    }

    /// 签发下一个 fence 值
    ///
    /// 每次提交命令列表后用这个值 signal 队列。
    pub fn next_value(&mut self) -> FenceValue {
        self.issued += 1;
        FenceValue::new(self.issued)
    }

    /// 最近签发的值
    pub fn issued_value(&self) -> FenceValue {
        FenceValue::new(self.issued)
    }

    /// 已确认完成的值
    pub fn completed_value(&self) -> FenceValue {
        FenceValue::new(self.completed)
    }

    /// 记录 GPU 已完成到某个值
    ///
    /// 完成值单调不减；传入更小的值不会回退。
    pub fn mark_completed(&mut self, value: FenceValue) {
        self.completed = self.completed.max(value.value());
    }

    /// 检查特定 fence 值是否已完成
    pub fn is_completed(&self, value: FenceValue) -> bool {
        self.completed >= value.value()
    }

    /// 是否所有已签发的工作都已完成
    pub fn is_idle(&self) -> bool {
        self.completed >= self.issued
    }
}

impl Default for FenceTimeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fence_value_ordering() {
        let f1 = FenceValue::new(1);
        let f2 = FenceValue::new(2);
        assert!(f1 < f2);
        assert_eq!(f1.next(), f2);
    }

    #[test]
    fn test_timeline_issues_strictly_increasing_values() {
        let mut timeline = FenceTimeline::new();
        let v1 = timeline.next_value();
        let v2 = timeline.next_value();
        let v3 = timeline.next_value();
        assert_eq!(v1.value(), 1);
        assert_eq!(v2.value(), 2);
        assert_eq!(v3.value(), 3);
    }

    #[test]
    fn test_timeline_completion_tracking() {
        let mut timeline = FenceTimeline::new();
        let v1 = timeline.next_value();
        let v2 = timeline.next_value();

        assert!(!timeline.is_completed(v1));
        assert!(!timeline.is_idle());

        timeline.mark_completed(v1);
        assert!(timeline.is_completed(v1));
        assert!(!timeline.is_completed(v2));

        timeline.mark_completed(v2);
        assert!(timeline.is_completed(v2));
        assert!(timeline.is_idle());
    }

    #[test]
    fn test_completed_value_never_regresses() {
        let mut timeline = FenceTimeline::new();
        let v1 = timeline.next_value();
        let v2 = timeline.next_value();

        timeline.mark_completed(v2);
        timeline.mark_completed(v1);
        assert_eq!(timeline.completed_value(), v2);
    }

    #[test]
    fn test_new_timeline_is_idle() {
        let timeline = FenceTimeline::new();
        assert!(timeline.is_idle());
    }
}
