//! DirectX 12 图形 API 实现模块
//!
//! 本模块包含了所有 DirectX 12 相关的代码，包括：
//! - Context: 设备、命令队列、交换链等基础设施的启动序列
//! - Descriptor: 描述符堆封装
//! - Pipeline: DXC 着色器编译和图形管线装配
//! - Renderer: 帧驱动实现

pub mod context;
pub mod descriptor;
pub mod pipeline;
pub mod renderer;

// 重新导出常用类型
pub use context::Dx12Context;
pub use renderer::Dx12Renderer;
