//! 渲染器模块
//!
//! 本模块分为两层：
//!
//! - 与具体图形 API 无关的纯逻辑组件（适配器选择、描述符偏移计算、
//!   fence 时间线、帧序列状态机），在任何平台上都可编译和测试
//! - `Renderer` 外观，封装底层 DirectX 12 后端（仅 Windows），
//!   对外暴露 demo 的三个入口：初始化、渲染一帧、关机前排空

pub mod adapter;
pub mod descriptor;
pub mod frame;
pub mod sync;

#[cfg(target_os = "windows")]
use winit::event_loop::EventLoop;

#[cfg(target_os = "windows")]
use crate::core::error::Result;
#[cfg(target_os = "windows")]
use crate::core::Config;
#[cfg(target_os = "windows")]
use crate::gfx::dx12::Dx12Renderer;

/// 统一的渲染器外观
///
/// 目前只有 DirectX 12 一个后端；保留外观层是为了让 `main` 不
/// 直接依赖 `gfx` 内部类型。
#[cfg(target_os = "windows")]
pub struct Renderer {
    backend: Dx12Renderer,
}

#[cfg(target_os = "windows")]
impl Renderer {
    /// 一次性初始化；必须在任何渲染调用之前调用，且只调用一次
    pub fn new(event_loop: &EventLoop<()>, config: &Config) -> Result<Self> {
        tracing::info!("Initializing DX12 backend");
        let backend = Dx12Renderer::new(event_loop, config)?;
        Ok(Self { backend })
    }

    /// 执行一个完整的帧循环；从消息循环中反复调用，不可重入
    pub fn draw(&mut self) -> Result<()> {
        self.backend.draw()
    }

    /// 排空 GPU；关机前保证没有未完成的工作
    pub fn flush(&mut self) -> Result<()> {
        self.backend.flush()
    }

    pub fn window(&self) -> &winit::window::Window {
        self.backend.window()
    }
}
