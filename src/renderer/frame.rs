//! 帧序列状态机模块
//!
//! 跟踪帧驱动的固定循环：`Idle → Recording → Submitted → Presented → Idle`。
//! 单帧在途，严格顺序执行；任何乱序的阶段转换都是调用方的编程错误，
//! 以显式 `Result` 返回而不是 debug 断言。
//!
//! 同时跟踪两件必须配对/交替的事情：
//!
//! - 后备缓冲的资源状态：每帧必须恰好一次从可呈现切到可写渲染目标，
//!   绘制后再切回来，提交时 barrier 必须已闭合
//! - 当前后备缓冲索引：初始值来自交换链的报告值（不一定是 0），
//!   每次 present 完成后在 0/1 之间翻转

use crate::core::error::{Result, WaveVizError};

/// 帧循环阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramePhase {
    /// 等待下一帧开始
    Idle,
    /// 命令列表录制中
    Recording,
    /// 已提交到队列并等待 GPU 排空
    Submitted,
    /// 已呈现，等待索引翻转收尾
    Presented,
}

/// 后备缓冲的资源状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetState {
    /// 可呈现（PRESENT）
    Presentable,
    /// 可写渲染目标（RENDER_TARGET）
    RenderTarget,
}

/// 帧序列状态机
///
/// 图形后端在每个 GPU 调用前推进这个状态机；状态机拒绝的转换
/// 对应硬件抽象层上的未定义行为（错误状态下使用资源、重复 Reset 等）。
#[derive(Debug)]
pub struct FrameSequencer {
    phase: FramePhase,
    target_state: TargetState,
    back_buffer_index: u32,
    frames_completed: u64,
}

impl FrameSequencer {
    /// 创建状态机
    ///
    /// # 参数
    ///
    /// * `initial_index` - 交换链报告的当前后备缓冲索引（0 或 1）
    pub fn new(initial_index: u32) -> Result<Self> {
        if initial_index > 1 {
            return Err(WaveVizError::Runtime(format!(
                "Initial back buffer index out of range: {}",
                initial_index
            )));
        }
        Ok(Self {
            phase: FramePhase::Idle,
            target_state: TargetState::Presentable,
            back_buffer_index: initial_index,
            frames_completed: 0,
        })
    }

    /// 当前后备缓冲索引
    pub fn back_buffer_index(&self) -> u32 {
        self.back_buffer_index
    }

    /// 当前阶段
    pub fn phase(&self) -> FramePhase {
        self.phase
    }

    /// 已完整走完循环的帧数
    pub fn frames_completed(&self) -> u64 {
        self.frames_completed
    }

    /// 开始录制一帧（Idle → Recording）
    pub fn begin_recording(&mut self) -> Result<()> {
        self.expect_phase(FramePhase::Idle, "begin recording")?;
        self.phase = FramePhase::Recording;
        Ok(())
    }

    /// 记录"进入渲染目标状态"的 barrier（PRESENT → RENDER_TARGET）
    ///
    /// 每帧恰好一次，且必须在绘制之前。
    pub fn enter_render_target(&mut self) -> Result<()> {
        self.expect_phase(FramePhase::Recording, "transition to render target")?;
        if self.target_state != TargetState::Presentable {
            return Err(WaveVizError::Runtime(
                "Back buffer is already in render target state".to_string(),
            ));
        }
        self.target_state = TargetState::RenderTarget;
        Ok(())
    }

    /// 记录"退出渲染目标状态"的 barrier（RENDER_TARGET → PRESENT）
    pub fn exit_render_target(&mut self) -> Result<()> {
        self.expect_phase(FramePhase::Recording, "transition to presentable")?;
        if self.target_state != TargetState::RenderTarget {
            return Err(WaveVizError::Runtime(
                "Back buffer is not in render target state".to_string(),
            ));
        }
        self.target_state = TargetState::Presentable;
        Ok(())
    }

    /// 提交命令列表（Recording → Submitted）
    ///
    /// barrier 对必须已闭合，否则呈现会在错误的资源状态下进行。
    pub fn submit(&mut self) -> Result<()> {
        self.expect_phase(FramePhase::Recording, "submit")?;
        if self.target_state != TargetState::Presentable {
            return Err(WaveVizError::Runtime(
                "Cannot submit: back buffer was left in render target state".to_string(),
            ));
        }
        self.phase = FramePhase::Submitted;
        Ok(())
    }

    /// 呈现（Submitted → Presented）
    pub fn present(&mut self) -> Result<()> {
        self.expect_phase(FramePhase::Submitted, "present")?;
        self.phase = FramePhase::Presented;
        Ok(())
    }

    /// 收尾：翻转后备缓冲索引，回到 Idle（Presented → Idle）
    ///
    /// # 返回值
    ///
    /// 下一帧要使用的后备缓冲索引
    pub fn end_frame(&mut self) -> Result<u32> {
        self.expect_phase(FramePhase::Presented, "end frame")?;
        self.back_buffer_index = 1 - self.back_buffer_index;
        self.frames_completed += 1;
        self.phase = FramePhase::Idle;
        Ok(self.back_buffer_index)
    }

    fn expect_phase(&self, expected: FramePhase, action: &str) -> Result<()> {
        if self.phase != expected {
            return Err(WaveVizError::Runtime(format!(
                "Cannot {} in phase {:?} (expected {:?})",
                action, self.phase, expected
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_one_frame(seq: &mut FrameSequencer) -> u32 {
        seq.begin_recording().unwrap();
        seq.enter_render_target().unwrap();
        seq.exit_render_target().unwrap();
        seq.submit().unwrap();
        seq.present().unwrap();
        seq.end_frame().unwrap()
    }

    #[test]
    fn test_back_buffer_index_alternates() {
        let mut seq = FrameSequencer::new(0).unwrap();
        let indices: Vec<u32> = (0..6).map(|_| run_one_frame(&mut seq)).collect();
        assert_eq!(indices, vec![1, 0, 1, 0, 1, 0]);
        assert_eq!(seq.frames_completed(), 6);
    }

    #[test]
    fn test_three_frames_from_index_zero() {
        // initialize(surface, 1280, 720) 之后连续三帧，索引依次为 1, 0, 1
        let mut seq = FrameSequencer::new(0).unwrap();
        assert_eq!(run_one_frame(&mut seq), 1);
        assert_eq!(run_one_frame(&mut seq), 0);
        assert_eq!(run_one_frame(&mut seq), 1);
    }

    #[test]
    fn test_initial_index_from_swap_chain_report() {
        // 交换链报告的初始索引不一定是 0
        let mut seq = FrameSequencer::new(1).unwrap();
        assert_eq!(seq.back_buffer_index(), 1);
        assert_eq!(run_one_frame(&mut seq), 0);
    }

    #[test]
    fn test_initial_index_out_of_range() {
        assert!(FrameSequencer::new(2).is_err());
    }

    #[test]
    fn test_double_enter_render_target_rejected() {
        let mut seq = FrameSequencer::new(0).unwrap();
        seq.begin_recording().unwrap();
        seq.enter_render_target().unwrap();
        assert!(seq.enter_render_target().is_err());
    }

    #[test]
    fn test_exit_without_enter_rejected() {
        let mut seq = FrameSequencer::new(0).unwrap();
        seq.begin_recording().unwrap();
        assert!(seq.exit_render_target().is_err());
    }

    #[test]
    fn test_submit_with_open_barrier_rejected() {
        let mut seq = FrameSequencer::new(0).unwrap();
        seq.begin_recording().unwrap();
        seq.enter_render_target().unwrap();
        assert!(seq.submit().is_err());
    }

    #[test]
    fn test_out_of_order_phases_rejected() {
        let mut seq = FrameSequencer::new(0).unwrap();
        assert!(seq.submit().is_err());
        assert!(seq.present().is_err());
        assert!(seq.end_frame().is_err());

        seq.begin_recording().unwrap();
        assert!(seq.begin_recording().is_err());
        assert!(seq.present().is_err());
    }

    #[test]
    fn test_barrier_pair_required_every_frame() {
        let mut seq = FrameSequencer::new(0).unwrap();
        run_one_frame(&mut seq);

        // 第二帧重新开始录制时，barrier 状态已复位，仍需配对
        seq.begin_recording().unwrap();
        assert!(seq.exit_render_target().is_err());
        seq.enter_render_target().unwrap();
        seq.exit_render_target().unwrap();
        seq.submit().unwrap();
        seq.present().unwrap();
        seq.end_frame().unwrap();
    }
}
