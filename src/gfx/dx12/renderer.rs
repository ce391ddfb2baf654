//! DirectX 12 帧驱动实现
//!
//! 每帧执行固定的命令序列：barrier 进入渲染目标状态 → 清屏 →
//! 绘制全屏三角形对 → barrier 回到可呈现状态 → 提交 → 同步等待
//! GPU 排空 → 复位分配器和列表 → 呈现 → 翻转后备缓冲索引。
//!
//! 同步模型是有意保守的：每帧提交后立即 flush，CPU 和 GPU 不重叠。
//! 帧循环的合法性由 `FrameSequencer` 校验，fence 目标值由
//! `FenceTimeline` 管理。

use std::mem::ManuallyDrop;
use tracing::{info, trace, warn};
use windows::{
    Win32::Foundation::RECT, Win32::Graphics::Direct3D::*, Win32::Graphics::Direct3D12::*,
    Win32::Graphics::Dxgi::*, Win32::System::Threading::{WaitForSingleObject, INFINITE},
};
use winit::event_loop::EventLoop;
use winit::window::Window;

use crate::core::error::{GraphicsError, Result};
use crate::core::Config;
use crate::gfx::dx12::context::Dx12Context;
use crate::gfx::dx12::pipeline;
use crate::renderer::frame::FrameSequencer;
use crate::renderer::sync::FenceTimeline;

/// DX12 渲染器
///
/// 持有上下文、管线对象和帧循环状态，实现 demo 的逐帧驱动。
pub struct Dx12Renderer {
    /// 图形上下文
    gfx: Dx12Context,
    /// 根签名
    root_signature: ID3D12RootSignature,
    /// 管线状态对象
    pso: ID3D12PipelineState,
    /// 视口（覆盖整个后备缓冲）
    viewport: D3D12_VIEWPORT,
    /// 裁剪矩形
    scissor_rect: RECT,
    /// 帧序列状态机
    sequencer: FrameSequencer,
    /// Fence 时间线
    timeline: FenceTimeline,
    /// 清屏颜色
    clear_color: [f32; 4],
    /// Present 的同步间隔（vsync 开启时为 1）
    vsync_interval: u32,
}

impl Dx12Renderer {
    /// 创建渲染器
    ///
    /// # 参数
    ///
    /// * `event_loop` - Winit 事件循环的引用
    /// * `config` - 配置
    pub fn new(event_loop: &EventLoop<()>, config: &Config) -> Result<Self> {
        let gfx = Dx12Context::new(event_loop, config)?;
        let (root_signature, pso) = pipeline::build_pipeline(&gfx.device)?;

        let viewport = D3D12_VIEWPORT {
            TopLeftX: 0.0,
            TopLeftY: 0.0,
            Width: gfx.width as f32,
            Height: gfx.height as f32,
            MinDepth: 0.0,
            MaxDepth: 1.0,
        };
        let scissor_rect = RECT {
            left: 0,
            top: 0,
            right: gfx.width as i32,
            bottom: gfx.height as i32,
        };

        let sequencer = FrameSequencer::new(gfx.initial_back_buffer_index)?;
        let vsync_interval = if config.graphics.vsync { 1 } else { 0 };

        info!(
            initial_back_buffer = gfx.initial_back_buffer_index,
            vsync = config.graphics.vsync,
            "DX12 renderer ready"
        );

        Ok(Self {
            gfx,
            root_signature,
            pso,
            viewport,
            scissor_rect,
            sequencer,
            timeline: FenceTimeline::new(),
            clear_color: config.graphics.clear_color,
            vsync_interval,
        })
    }

    pub fn window(&self) -> &Window {
        self.gfx.window()
    }

    /// 执行一个完整的帧循环
    ///
    /// 命令列表在两帧之间保持录制状态，本函数结束时已为下一帧复位。
    pub fn draw(&mut self) -> Result<()> {
        let frame_index = self.sequencer.back_buffer_index();
        let back_buffer = &self.gfx.back_buffers[frame_index as usize];
        let list = &self.gfx.command_list;

        self.sequencer.begin_recording()?;

        unsafe {
            // 后备缓冲进入可写状态
            self.sequencer.enter_render_target()?;
            let barrier = transition_barrier(
                back_buffer,
                D3D12_RESOURCE_STATE_PRESENT,
                D3D12_RESOURCE_STATE_RENDER_TARGET,
            );
            list.ResourceBarrier(&[barrier]);

            list.SetGraphicsRootSignature(&self.root_signature);
            list.SetPipelineState(&self.pso);
            list.RSSetViewports(&[self.viewport]);
            list.RSSetScissorRects(&[self.scissor_rect]);

            let rtv = self.gfx.rtv_heap.cpu_handle(frame_index);
            list.OMSetRenderTargets(1, Some(&rtv), false, None);
            list.ClearRenderTargetView(rtv, &self.clear_color, None);

            // 全屏三角形对：6 个顶点，几何在顶点着色器里展开
            list.IASetPrimitiveTopology(D3D_PRIMITIVE_TOPOLOGY_TRIANGLELIST);
            list.DrawInstanced(6, 1, 0, 0);

            // 回到可呈现状态；barrier 必须在提交前闭合
            self.sequencer.exit_render_target()?;
            let barrier = transition_barrier(
                back_buffer,
                D3D12_RESOURCE_STATE_RENDER_TARGET,
                D3D12_RESOURCE_STATE_PRESENT,
            );
            list.ResourceBarrier(&[barrier]);

            self.sequencer.submit()?;
            list.Close().map_err(|e| {
                GraphicsError::CommandExecution(format!(
                    "Failed to close command list: {:?}",
                    e
                ))
            })?;
            self.gfx
                .command_queue
                .ExecuteCommandLists(&[Some(list.clone().into())]);
        }

        // 同步模型：提交后立即等 GPU 排空，再复位录制状态
        self.flush()?;

        unsafe {
            self.gfx.command_allocator.Reset().map_err(|e| {
                GraphicsError::CommandExecution(format!(
                    "Failed to reset command allocator: {:?}",
                    e
                ))
            })?;
            self.gfx
                .command_list
                .Reset(&self.gfx.command_allocator, None)
                .map_err(|e| {
                    GraphicsError::CommandExecution(format!(
                        "Failed to reset command list: {:?}",
                        e
                    ))
                })?;
        }

        self.sequencer.present()?;
        unsafe {
            let result = self
                .gfx
                .swap_chain
                .Present(self.vsync_interval, DXGI_PRESENT(0));
            if result.is_err() {
                return Err(self.present_error(result));
            }
        }

        let next_index = self.sequencer.end_frame()?;
        trace!(
            frame = self.sequencer.frames_completed(),
            next_back_buffer = next_index,
            "Frame presented"
        );
        Ok(())
    }

    /// 排空 GPU
    ///
    /// 签发一个新的 fence 目标值并阻塞到 GPU 越过它。
    /// fence 对象复用，目标值严格递增。
    pub fn flush(&mut self) -> Result<()> {
        let target = self.timeline.next_value();

        unsafe {
            self.gfx
                .command_queue
                .Signal(&self.gfx.fence, target.value())
                .map_err(|e| {
                    GraphicsError::CommandExecution(format!(
                        "Failed to signal fence: {:?}",
                        e
                    ))
                })?;

            if self.gfx.fence.GetCompletedValue() < target.value() {
                self.gfx
                    .fence
                    .SetEventOnCompletion(target.value(), self.gfx.fence_event)
                    .map_err(|e| {
                        GraphicsError::CommandExecution(format!(
                            "Failed to arm fence event: {:?}",
                            e
                        ))
                    })?;
                WaitForSingleObject(self.gfx.fence_event, INFINITE);
            }
        }

        self.timeline.mark_completed(target);
        Ok(())
    }

    /// 把 Present 的失败码翻译成错误变体
    ///
    /// 设备移除/重置意味着上下文整体失效，和普通命令失败区分开。
    fn present_error(&self, result: windows::core::HRESULT) -> crate::core::WaveVizError {
        if result == DXGI_ERROR_DEVICE_REMOVED || result == DXGI_ERROR_DEVICE_RESET {
            let reason = unsafe { self.gfx.device.GetDeviceRemovedReason() };
            GraphicsError::DeviceLost(format!(
                "Present failed with {:?} (removed reason: {:?})",
                result,
                reason.err()
            ))
            .into()
        } else {
            GraphicsError::CommandExecution(format!("Present failed: {:?}", result)).into()
        }
    }
}

impl Drop for Dx12Renderer {
    fn drop(&mut self) {
        // 销毁 GPU 对象之前保证队列已排空
        if let Err(e) = self.flush() {
            warn!("Failed to flush GPU on shutdown: {}", e);
        }
    }
}

/// 构造一个资源状态转换 barrier
fn transition_barrier(
    resource: &ID3D12Resource,
    before: D3D12_RESOURCE_STATES,
    after: D3D12_RESOURCE_STATES,
) -> D3D12_RESOURCE_BARRIER {
    D3D12_RESOURCE_BARRIER {
        Type: D3D12_RESOURCE_BARRIER_TYPE_TRANSITION,
        Flags: D3D12_RESOURCE_BARRIER_FLAG_NONE,
        Anonymous: D3D12_RESOURCE_BARRIER_0 {
            Transition: ManuallyDrop::new(D3D12_RESOURCE_TRANSITION_BARRIER {
                pResource: ManuallyDrop::new(Some(resource.clone())),
                Subresource: D3D12_RESOURCE_BARRIER_ALL_SUBRESOURCES,
                StateBefore: before,
                StateAfter: after,
            }),
        },
    }
}
