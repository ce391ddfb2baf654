//! 描述符句柄计算模块
//!
//! 提供与具体图形 API 无关的描述符偏移计算。
//! 句柄值是 `堆基址 + 索引 * 步长` 的纯算术，步长是设备常量，
//! 初始化时查询一次并缓存，进程生命周期内不变。
//!
//! # DirectX 12 描述符堆类型
//!
//! - **RTV** (Render Target View)：渲染目标视图，本 demo 唯一实际创建的堆
//! - **DSV** (Depth Stencil View)：深度模板视图
//! - **CBV/SRV/UAV**：着色器资源类视图
//! - **Sampler**：采样器
//!
//! 四种类型的步长都会被缓存，与原始实现一致。

/// 描述符堆类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptorHeapKind {
    /// CBV/SRV/UAV 堆
    CbvSrvUav,
    /// 采样器堆
    Sampler,
    /// 渲染目标视图堆
    RenderTargetView,
    /// 深度模板视图堆
    DepthStencilView,
}

impl DescriptorHeapKind {
    /// 所有堆类型，按 D3D12_DESCRIPTOR_HEAP_TYPE 的数值顺序
    pub const ALL: [DescriptorHeapKind; 4] = [
        DescriptorHeapKind::CbvSrvUav,
        DescriptorHeapKind::Sampler,
        DescriptorHeapKind::RenderTargetView,
        DescriptorHeapKind::DepthStencilView,
    ];

    /// 在步长缓存数组中的下标
    pub fn index(self) -> usize {
        match self {
            DescriptorHeapKind::CbvSrvUav => 0,
            DescriptorHeapKind::Sampler => 1,
            DescriptorHeapKind::RenderTargetView => 2,
            DescriptorHeapKind::DepthStencilView => 3,
        }
    }

    /// 堆类型名称
    pub fn name(self) -> &'static str {
        match self {
            DescriptorHeapKind::CbvSrvUav => "CBV/SRV/UAV",
            DescriptorHeapKind::Sampler => "Sampler",
            DescriptorHeapKind::RenderTargetView => "RTV",
            DescriptorHeapKind::DepthStencilView => "DSV",
        }
    }
}

/// 每种堆类型的描述符步长缓存
///
/// 步长由硬件报告，初始化时查询一次。之后所有偏移计算
/// 都是这份缓存上的纯函数，不做 GPU 调用，不会失败。
#[derive(Debug, Clone, Copy)]
pub struct DescriptorStrides {
    strides: [u32; 4],
}

impl DescriptorStrides {
    /// 用硬件报告的步长构建缓存
    ///
    /// 数组按 `DescriptorHeapKind::ALL` 的顺序排列。
    pub fn new(strides: [u32; 4]) -> Self {
        Self { strides }
    }

    /// 指定堆类型的步长（字节）
    pub fn stride(&self, kind: DescriptorHeapKind) -> u32 {
        self.strides[kind.index()]
    }

    /// 计算 CPU 句柄：`base + index * stride`
    ///
    /// 不做边界检查；调用方必须保证 `index` 小于该堆声明的容量。
    pub fn cpu_handle(&self, kind: DescriptorHeapKind, base: usize, index: u32) -> usize {
        base + index as usize * self.stride(kind) as usize
    }

    /// 计算 GPU 句柄：`base + index * stride`
    pub fn gpu_handle(&self, kind: DescriptorHeapKind, base: u64, index: u32) -> u64 {
        base + index as u64 * self.stride(kind) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strides() -> DescriptorStrides {
        // 典型的硬件报告值
        DescriptorStrides::new([32, 32, 32, 8])
    }

    #[test]
    fn test_heap_kind_roundtrip() {
        for kind in DescriptorHeapKind::ALL {
            assert_eq!(DescriptorHeapKind::ALL[kind.index()], kind);
        }
        assert_eq!(DescriptorHeapKind::RenderTargetView.name(), "RTV");
    }

    #[test]
    fn test_cpu_handle_is_linear_in_index() {
        let s = strides();
        let kind = DescriptorHeapKind::RenderTargetView;
        let base = 0x1000;
        for i in 0..16 {
            let delta = s.cpu_handle(kind, base, i + 1) - s.cpu_handle(kind, base, i);
            assert_eq!(delta as u32, s.stride(kind));
        }
    }

    #[test]
    fn test_gpu_handle_is_linear_in_index() {
        let s = strides();
        let kind = DescriptorHeapKind::CbvSrvUav;
        let base = 0xFFFF_0000;
        for i in 0..16 {
            let delta = s.gpu_handle(kind, base, i + 1) - s.gpu_handle(kind, base, i);
            assert_eq!(delta as u32, s.stride(kind));
        }
    }

    #[test]
    fn test_index_zero_is_base() {
        let s = strides();
        assert_eq!(s.cpu_handle(DescriptorHeapKind::RenderTargetView, 0x2000, 0), 0x2000);
        assert_eq!(s.gpu_handle(DescriptorHeapKind::Sampler, 0x3000, 0), 0x3000);
    }

    #[test]
    fn test_per_kind_stride() {
        let s = strides();
        assert_eq!(s.stride(DescriptorHeapKind::DepthStencilView), 8);
        assert_eq!(
            s.cpu_handle(DescriptorHeapKind::DepthStencilView, 0, 3),
            24
        );
    }
}
