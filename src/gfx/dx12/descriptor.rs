//! DirectX 12 描述符堆封装
//!
//! 在 `renderer::descriptor` 的纯偏移计算之上包一层
//! `ID3D12DescriptorHeap`，把缓存的步长和堆基址绑定在一起。
//! demo 实际只创建一个容量为 2 的 RTV 堆。

use windows::core::PCWSTR;
use windows::Win32::Graphics::Direct3D12::*;

use crate::core::error::{GraphicsError, Result};
use crate::renderer::descriptor::{DescriptorHeapKind, DescriptorStrides};

fn heap_type(kind: DescriptorHeapKind) -> D3D12_DESCRIPTOR_HEAP_TYPE {
    match kind {
        DescriptorHeapKind::CbvSrvUav => D3D12_DESCRIPTOR_HEAP_TYPE_CBV_SRV_UAV,
        DescriptorHeapKind::Sampler => D3D12_DESCRIPTOR_HEAP_TYPE_SAMPLER,
        DescriptorHeapKind::RenderTargetView => D3D12_DESCRIPTOR_HEAP_TYPE_RTV,
        DescriptorHeapKind::DepthStencilView => D3D12_DESCRIPTOR_HEAP_TYPE_DSV,
    }
}

/// DX12 描述符堆
///
/// 封装 `ID3D12DescriptorHeap`，按索引提供 CPU/GPU 句柄。
pub struct Dx12DescriptorHeap {
    /// 底层 DX12 描述符堆
    heap: ID3D12DescriptorHeap,
    /// 堆类型
    kind: DescriptorHeapKind,
    /// 容量（描述符数量）
    capacity: u32,
    /// CPU 句柄基址
    cpu_start: usize,
    /// GPU 句柄基址（仅对着色器可见的堆）
    gpu_start: Option<u64>,
    /// 步长缓存
    strides: DescriptorStrides,
}

impl Dx12DescriptorHeap {
    /// 创建新的描述符堆
    ///
    /// # 参数
    ///
    /// * `device` - DX12 设备
    /// * `kind` - 堆类型
    /// * `capacity` - 描述符数量
    /// * `strides` - 初始化时缓存的硬件步长
    /// * `name` - 调试名称
    pub fn new(
        device: &ID3D12Device,
        kind: DescriptorHeapKind,
        capacity: u32,
        strides: DescriptorStrides,
        name: &str,
    ) -> Result<Self> {
        let shader_visible = matches!(
            kind,
            DescriptorHeapKind::CbvSrvUav | DescriptorHeapKind::Sampler
        );

        let heap_desc = D3D12_DESCRIPTOR_HEAP_DESC {
            Type: heap_type(kind),
            NumDescriptors: capacity,
            Flags: if shader_visible {
                D3D12_DESCRIPTOR_HEAP_FLAG_SHADER_VISIBLE
            } else {
                D3D12_DESCRIPTOR_HEAP_FLAG_NONE
            },
            NodeMask: 0,
        };

        unsafe {
            let heap: ID3D12DescriptorHeap =
                device.CreateDescriptorHeap(&heap_desc).map_err(|e| {
                    GraphicsError::ResourceCreation(format!(
                        "Failed to create {} descriptor heap: {:?}",
                        kind.name(),
                        e
                    ))
                })?;

            let wide_name: Vec<u16> = name.encode_utf16().chain(Some(0)).collect();
            let _ = heap.SetName(PCWSTR(wide_name.as_ptr()));

            let cpu_start = heap.GetCPUDescriptorHandleForHeapStart().ptr;
            let gpu_start = if shader_visible {
                Some(heap.GetGPUDescriptorHandleForHeapStart().ptr)
            } else {
                None
            };

            Ok(Self {
                heap,
                kind,
                capacity,
                cpu_start,
                gpu_start,
                strides,
            })
        }
    }

    /// 获取底层描述符堆
    pub fn heap(&self) -> &ID3D12DescriptorHeap {
        &self.heap
    }

    /// 堆类型
    pub fn kind(&self) -> DescriptorHeapKind {
        self.kind
    }

    /// 容量
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// 获取指定索引的 CPU 句柄
    ///
    /// 纯偏移计算，不做 GPU 调用；调用方保证 `index < capacity`。
    pub fn cpu_handle(&self, index: u32) -> D3D12_CPU_DESCRIPTOR_HANDLE {
        debug_assert!(index < self.capacity, "descriptor index out of range");
        D3D12_CPU_DESCRIPTOR_HANDLE {
            ptr: self.strides.cpu_handle(self.kind, self.cpu_start, index),
        }
    }

    /// 获取指定索引的 GPU 句柄（仅对着色器可见的堆）
    pub fn gpu_handle(&self, index: u32) -> Option<D3D12_GPU_DESCRIPTOR_HANDLE> {
        debug_assert!(index < self.capacity, "descriptor index out of range");
        self.gpu_start.map(|start| D3D12_GPU_DESCRIPTOR_HANDLE {
            ptr: self.strides.gpu_handle(self.kind, start, index),
        })
    }
}

// DX12 堆是线程安全的
unsafe impl Send for Dx12DescriptorHeap {}
unsafe impl Sync for Dx12DescriptorHeap {}
