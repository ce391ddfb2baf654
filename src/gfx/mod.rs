//! 图形后端模块
//!
//! 本模块封装图形 API 的底层实现。demo 只针对 DirectX 12：
//! wave intrinsics 的能力查询、shader model 6.x 编译和资源状态
//! barrier 都按 D3D12 的模型表达，因此整个模块仅在 Windows 上编译。

#[cfg(target_os = "windows")]
pub mod dx12;
