//! wave_viz - DirectX 12 wave intrinsics 可视化 demo
//!
//! 打开一个窗口，通过全屏三角形对把每个像素所在 GPU wave 的
//! lane 布局渲染出来。架构分为三层：
//!
//! - `core`: 配置、日志、错误处理等基础设施
//! - `renderer`: 平台无关的帧循环逻辑与对外的渲染器外观
//! - `gfx`: DirectX 12 后端（仅 Windows）

pub mod core;
pub mod gfx;
pub mod renderer;

pub use crate::core::{Config, Result, WaveVizError};
