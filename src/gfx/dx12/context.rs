//! DirectX 12 上下文启动序列
//!
//! `Dx12Context` 拥有所有进程级 GPU 对象，按固定顺序创建，
//! 每一步都硬依赖前一步成功：
//!
//! 1. 启用调试层（仅 Debug 模式，必须先于任何其他 GPU 对象）
//! 2. 创建 DXGI 工厂
//! 3. 枚举适配器并按专用显存选择（无适配器是显式错误）
//! 4. 在 FEATURE_LEVEL_12_1 创建设备
//! 5. 查询 wave intrinsics 能力，所有构建配置下缺失都直接失败
//! 6. 缓存每种描述符堆类型的硬件步长
//! 7. 创建命令队列、命令分配器、命令列表
//! 8. 创建 RTV 堆、交换链、后备缓冲视图和同步对象
//!
//! 上下文创建一次，从不重建；进程退出前由帧驱动做最后一次排空。

use std::sync::Arc;
use tracing::{debug, info, warn};
use windows::{
    core::*, Win32::Foundation::CloseHandle, Win32::Foundation::HANDLE, Win32::Foundation::HWND,
    Win32::Graphics::Direct3D::*, Win32::Graphics::Direct3D12::*,
    Win32::Graphics::Dxgi::Common::*, Win32::Graphics::Dxgi::*,
};
use raw_window_handle::{HasWindowHandle, RawWindowHandle};
use winit::dpi::LogicalSize;
use winit::event_loop::EventLoop;
use winit::window::{Window, WindowBuilder};

use crate::core::error::{GraphicsError, Result, WaveVizError};
use crate::core::Config;
use crate::gfx::dx12::descriptor::Dx12DescriptorHeap;
use crate::renderer::adapter::{self, AdapterDescriptor};
use crate::renderer::descriptor::{DescriptorHeapKind, DescriptorStrides};

/// 交换链缓冲数量；索引在 0/1 之间翻转
pub const FRAME_COUNT: usize = 2;

/// 后备缓冲颜色格式（交换链与 PSO 必须一致）
pub const BACK_BUFFER_FORMAT: DXGI_FORMAT = DXGI_FORMAT_R8G8B8A8_UNORM;

/// DirectX 12 上下文
///
/// 封装设备、命令提交管线、呈现表面和同步对象。
/// 所有字段在 `new` 中创建一次，之后只被帧驱动读取/复用。
pub struct Dx12Context {
    /// D3D12 设备
    pub device: ID3D12Device,
    /// 命令队列
    pub command_queue: ID3D12CommandQueue,
    /// 命令分配器（单个，严格串行复用）
    pub command_allocator: ID3D12CommandAllocator,
    /// 命令列表（创建后处于录制状态，每帧 Close/Reset 循环）
    pub command_list: ID3D12GraphicsCommandList,
    /// 交换链
    pub swap_chain: IDXGISwapChain3,
    /// 后备缓冲图像
    pub back_buffers: [ID3D12Resource; FRAME_COUNT],
    /// 渲染目标视图堆（容量 2）
    pub rtv_heap: Dx12DescriptorHeap,
    /// 每种堆类型的描述符步长缓存
    pub strides: DescriptorStrides,
    /// 交换链报告的初始后备缓冲索引
    pub initial_back_buffer_index: u32,
    /// 同步栅栏（长生命周期，目标值由 FenceTimeline 管理）
    pub fence: ID3D12Fence,
    /// 栅栏事件句柄
    pub fence_event: HANDLE,
    /// 窗口引用
    pub window: Arc<Window>,
    /// 表面宽度
    pub width: u32,
    /// 表面高度
    pub height: u32,
}

// DirectX 12 的对象是线程安全的
unsafe impl Send for Dx12Context {}
unsafe impl Sync for Dx12Context {}

impl Dx12Context {
    /// 创建新的 DirectX 12 上下文
    ///
    /// # 参数
    ///
    /// * `event_loop` - Winit 事件循环的引用，用于创建窗口
    /// * `config` - 配置，用于设置窗口大小、标题等参数
    pub fn new(event_loop: &EventLoop<()>, config: &Config) -> Result<Self> {
        let width = config.window.width;
        let height = config.window.height;

        // 创建窗口（交换链固定为非 resizable）
        let window = Arc::new(
            WindowBuilder::new()
                .with_title(&config.window.title)
                .with_inner_size(LogicalSize::new(width, height))
                .with_resizable(false)
                .build(event_loop)
                .map_err(|e| {
                    WaveVizError::Initialization(format!("Failed to create window: {}", e))
                })?,
        );

        unsafe {
            // 1. 启用调试层（仅 Debug 模式）
            #[cfg(debug_assertions)]
            let factory_flags = {
                let mut debug_controller: Option<ID3D12Debug> = None;
                if D3D12GetDebugInterface(&mut debug_controller).is_ok() {
                    if let Some(debug_controller) = debug_controller {
                        debug_controller.EnableDebugLayer();
                        debug!("DX12 Debug Layer enabled");
                    }
                    DXGI_CREATE_FACTORY_DEBUG
                } else {
                    warn!("Failed to enable DX12 Debug Layer");
                    DXGI_CREATE_FACTORY_FLAGS(0)
                }
            };
            #[cfg(not(debug_assertions))]
            let factory_flags = DXGI_CREATE_FACTORY_FLAGS(0);

            // 2. 创建 DXGI 工厂
            let factory: IDXGIFactory4 = CreateDXGIFactory2(factory_flags).map_err(|e| {
                GraphicsError::DeviceCreation(format!("Failed to create DXGI factory: {:?}", e))
            })?;

            // 3. 枚举适配器，按专用显存选择
            let (adapter, adapter_info) = enumerate_adapters(&factory)?;
            info!(
                adapter = %adapter_info.description,
                dedicated_video_memory = adapter_info.dedicated_video_memory,
                "Selected adapter"
            );

            // 4. 创建设备
            let mut device: Option<ID3D12Device> = None;
            D3D12CreateDevice(&adapter, D3D_FEATURE_LEVEL_12_1, &mut device).map_err(|e| {
                GraphicsError::DeviceCreation(format!("D3D12CreateDevice failed: {:?}", e))
            })?;
            let device = device.ok_or_else(|| {
                GraphicsError::DeviceCreation(
                    "D3D12CreateDevice succeeded but returned no device".to_string(),
                )
            })?;
            debug!("D3D12 device created at feature level 12_1");

            // 5. wave intrinsics 能力检查，所有构建配置下执行
            let mut options1 = D3D12_FEATURE_DATA_D3D12_OPTIONS1::default();
            device
                .CheckFeatureSupport(
                    D3D12_FEATURE_D3D12_OPTIONS1,
                    &mut options1 as *mut _ as *mut core::ffi::c_void,
                    std::mem::size_of::<D3D12_FEATURE_DATA_D3D12_OPTIONS1>() as u32,
                )
                .map_err(|e| {
                    GraphicsError::DeviceCreation(format!(
                        "CheckFeatureSupport(D3D12_OPTIONS1) failed: {:?}",
                        e
                    ))
                })?;
            if !options1.WaveOps.as_bool() {
                return Err(GraphicsError::MissingCapability(
                    "wave intrinsics (D3D12_OPTIONS1.WaveOps) are not supported by this adapter"
                        .to_string(),
                )
                .into());
            }
            info!(
                wave_lane_count_min = options1.WaveLaneCountMin,
                wave_lane_count_max = options1.WaveLaneCountMax,
                "Wave intrinsics supported"
            );

            // 6. 缓存描述符步长（设备常量，只查询一次）
            let strides = DescriptorStrides::new([
                device.GetDescriptorHandleIncrementSize(D3D12_DESCRIPTOR_HEAP_TYPE_CBV_SRV_UAV),
                device.GetDescriptorHandleIncrementSize(D3D12_DESCRIPTOR_HEAP_TYPE_SAMPLER),
                device.GetDescriptorHandleIncrementSize(D3D12_DESCRIPTOR_HEAP_TYPE_RTV),
                device.GetDescriptorHandleIncrementSize(D3D12_DESCRIPTOR_HEAP_TYPE_DSV),
            ]);

            // 7. 命令队列
            let queue_desc = D3D12_COMMAND_QUEUE_DESC {
                Type: D3D12_COMMAND_LIST_TYPE_DIRECT,
                Flags: D3D12_COMMAND_QUEUE_FLAG_NONE,
                ..Default::default()
            };
            let command_queue: ID3D12CommandQueue =
                device.CreateCommandQueue(&queue_desc).map_err(|e| {
                    GraphicsError::ResourceCreation(format!(
                        "Failed to create command queue: {:?}",
                        e
                    ))
                })?;
            let _ = command_queue.SetName(w!("graphics_queue"));

            // 命令分配器和命令列表；列表创建后即处于录制状态，
            // 帧驱动保持 Record → Close → Execute → Flush → Reset 循环
            let command_allocator: ID3D12CommandAllocator = device
                .CreateCommandAllocator(D3D12_COMMAND_LIST_TYPE_DIRECT)
                .map_err(|e| {
                    GraphicsError::ResourceCreation(format!(
                        "Failed to create command allocator: {:?}",
                        e
                    ))
                })?;
            let command_list: ID3D12GraphicsCommandList = device
                .CreateCommandList(0, D3D12_COMMAND_LIST_TYPE_DIRECT, &command_allocator, None)
                .map_err(|e| {
                    GraphicsError::ResourceCreation(format!(
                        "Failed to create command list: {:?}",
                        e
                    ))
                })?;

            // 8. RTV 堆（容量 2）
            let rtv_heap = Dx12DescriptorHeap::new(
                &device,
                DescriptorHeapKind::RenderTargetView,
                FRAME_COUNT as u32,
                strides,
                "rtv_heap",
            )?;

            // 交换链：flip-discard，8 位通道，无多重采样
            let window_handle = window.window_handle().map_err(|e| {
                WaveVizError::Initialization(format!("Failed to get window handle: {}", e))
            })?;
            let hwnd = match window_handle.as_raw() {
                RawWindowHandle::Win32(win32_handle) => {
                    HWND(win32_handle.hwnd.get() as *mut core::ffi::c_void)
                }
                _ => {
                    return Err(WaveVizError::Initialization(
                        "Expected Win32 window handle on Windows platform".to_string(),
                    ))
                }
            };
            let swap_chain_desc = DXGI_SWAP_CHAIN_DESC1 {
                Width: width,
                Height: height,
                Format: BACK_BUFFER_FORMAT,
                SampleDesc: DXGI_SAMPLE_DESC {
                    Count: 1,
                    Quality: 0,
                },
                BufferUsage: DXGI_USAGE_RENDER_TARGET_OUTPUT,
                BufferCount: FRAME_COUNT as u32,
                SwapEffect: DXGI_SWAP_EFFECT_FLIP_DISCARD,
                ..Default::default()
            };

            let swap_chain: IDXGISwapChain1 = factory
                .CreateSwapChainForHwnd(&command_queue, hwnd, &swap_chain_desc, None, None)
                .map_err(|e| {
                    GraphicsError::Swapchain(format!("Failed to create swap chain: {:?}", e))
                })?;
            let swap_chain: IDXGISwapChain3 = swap_chain.cast().map_err(|e| {
                GraphicsError::Swapchain(format!(
                    "Failed to cast swap chain to IDXGISwapChain3: {:?}",
                    e
                ))
            })?;
            info!(width, height, buffers = FRAME_COUNT, "Swap chain created");

            // 后备缓冲和渲染目标视图（RTV 堆槽位 0 和 1）
            let back_buffers = [
                create_back_buffer_rtv(&device, &swap_chain, &rtv_heap, 0)?,
                create_back_buffer_rtv(&device, &swap_chain, &rtv_heap, 1)?,
            ];

            // 初始索引来自交换链报告，不假定为 0
            let initial_back_buffer_index = swap_chain.GetCurrentBackBufferIndex();

            // 同步对象：单个长生命周期 fence，目标值严格递增
            let fence: ID3D12Fence =
                device.CreateFence(0, D3D12_FENCE_FLAG_NONE).map_err(|e| {
                    GraphicsError::ResourceCreation(format!("Failed to create fence: {:?}", e))
                })?;
            let fence_event =
                windows::Win32::System::Threading::CreateEventA(None, false, false, None)
                    .map_err(|e| {
                        GraphicsError::ResourceCreation(format!(
                            "Failed to create fence event: {:?}",
                            e
                        ))
                    })?;

            info!("DX12 context initialization complete");

            Ok(Self {
                device,
                command_queue,
                command_allocator,
                command_list,
                swap_chain,
                back_buffers,
                rtv_heap,
                strides,
                initial_back_buffer_index,
                fence,
                fence_event,
                window,
                width,
                height,
            })
        }
    }

    pub fn window(&self) -> &Window {
        &self.window
    }
}

impl Drop for Dx12Context {
    fn drop(&mut self) {
        // COM 对象自带引用计数；只有事件句柄需要手动关闭。
        // 帧驱动的 Drop 先排空队列，到这里 fence_event 已不再被等待。
        unsafe {
            if !self.fence_event.is_invalid() {
                let _ = CloseHandle(self.fence_event);
            }
        }
    }
}

/// 枚举所有适配器并选出专用显存最大的那个
///
/// 枚举在平台报告 `DXGI_ERROR_NOT_FOUND` 时停止；选择策略在
/// `renderer::adapter` 中实现并单独测试。适配器句柄在设备创建
/// 之后不再保留。
fn enumerate_adapters(factory: &IDXGIFactory4) -> Result<(IDXGIAdapter1, AdapterDescriptor)> {
    let mut adapters: Vec<IDXGIAdapter1> = Vec::new();
    let mut infos: Vec<AdapterDescriptor> = Vec::new();

    unsafe {
        let mut index = 0u32;
        loop {
            match factory.EnumAdapters1(index) {
                Ok(adapter) => {
                    let desc = adapter.GetDesc1().map_err(|e| {
                        GraphicsError::DeviceCreation(format!(
                            "Failed to query adapter description: {:?}",
                            e
                        ))
                    })?;
                    let name_len = desc
                        .Description
                        .iter()
                        .position(|&c| c == 0)
                        .unwrap_or(desc.Description.len());
                    let description = String::from_utf16_lossy(&desc.Description[..name_len]);
                    debug!(
                        index,
                        adapter = %description,
                        dedicated_video_memory = desc.DedicatedVideoMemory as u64,
                        "Enumerated adapter"
                    );
                    infos.push(AdapterDescriptor::new(
                        description,
                        desc.DedicatedVideoMemory as u64,
                    ));
                    adapters.push(adapter);
                    index += 1;
                }
                Err(e) if e.code() == DXGI_ERROR_NOT_FOUND => break,
                Err(e) => {
                    return Err(GraphicsError::DeviceCreation(format!(
                        "Adapter enumeration failed: {:?}",
                        e
                    ))
                    .into())
                }
            }
        }
    }

    let selected = adapter::select_adapter(&infos)?;
    Ok((adapters.swap_remove(selected), infos.swap_remove(selected)))
}

/// 取出一个后备缓冲并在 RTV 堆的对应槽位创建渲染目标视图
fn create_back_buffer_rtv(
    device: &ID3D12Device,
    swap_chain: &IDXGISwapChain3,
    rtv_heap: &Dx12DescriptorHeap,
    index: u32,
) -> Result<ID3D12Resource> {
    unsafe {
        let buffer: ID3D12Resource = swap_chain.GetBuffer(index).map_err(|e| {
            GraphicsError::Swapchain(format!(
                "Failed to get swap chain buffer {}: {:?}",
                index, e
            ))
        })?;

        let wide_name: Vec<u16> = format!("back_buffer_{}", index)
            .encode_utf16()
            .chain(Some(0))
            .collect();
        let _ = buffer.SetName(PCWSTR(wide_name.as_ptr()));

        device.CreateRenderTargetView(&buffer, None, rtv_heap.cpu_handle(index));
        Ok(buffer)
    }
}
