//! 着色器编译与图形管线装配模块
//!
//! wave intrinsics 需要 shader model 6.x，FXC 编译不了，所以这里
//! 通过 DXC 在运行时从 HLSL 源码编译根签名、顶点和像素着色器，
//! 再装配成固定的图形管线：无顶点输入、无混合、无深度、单 RTV。
//!
//! 三个编译产物来自同一份源文件 `shaders/wave_viz.hlsl`，
//! 任何一个编译失败都带着 DXC 的诊断文本返回错误。

use std::mem::ManuallyDrop;
use std::path::Path;
use tracing::{debug, info};
use windows::{
    core::*, Win32::Graphics::Direct3D::Dxc::*, Win32::Graphics::Direct3D12::*,
    Win32::Graphics::Dxgi::Common::*,
};

use crate::core::error::{GraphicsError, Result, WaveVizError};
use crate::gfx::dx12::context::BACK_BUFFER_FORMAT;

/// 顶点着色器入口与目标（SV_VertexID 展开全屏三角形对）
const VS_ENTRY: &str = "vs_main";
const VS_TARGET: &str = "vs_6_4";

/// 像素着色器入口与目标（wave intrinsics 可视化）
const PS_ENTRY: &str = "ps_main";
const PS_TARGET: &str = "ps_6_4";

/// 根签名入口与目标（嵌在 HLSL 源码里的空根签名）
const RS_ENTRY: &str = "rootsig";
const RS_TARGET: &str = "rootsig_1_1";

/// DXC 着色器编译器
///
/// 封装 `IDxcCompiler3`，按入口/目标对编译同一份源码。
struct ShaderCompiler {
    compiler: IDxcCompiler3,
}

impl ShaderCompiler {
    fn new() -> Result<Self> {
        unsafe {
            let compiler: IDxcCompiler3 = DxcCreateInstance(&CLSID_DxcCompiler).map_err(|e| {
                GraphicsError::ShaderCompilation(format!(
                    "Failed to create DXC compiler: {:?}",
                    e
                ))
            })?;
            Ok(Self { compiler })
        }
    }

    /// 编译 HLSL 源码
    ///
    /// # 参数
    ///
    /// * `source` - HLSL 源码文本
    /// * `entry` - 入口点名称
    /// * `target` - 目标 profile（如 `vs_6_4`）
    ///
    /// # 返回值
    ///
    /// DXIL 字节码 blob；编译失败时返回包含 DXC 诊断文本的错误。
    fn compile(&self, source: &str, entry: &str, target: &str) -> Result<IDxcBlob> {
        let buffer = DxcBuffer {
            Ptr: source.as_ptr() as *const core::ffi::c_void,
            Size: source.len(),
            Encoding: DXC_CP_UTF8.0,
        };

        let entry_w: Vec<u16> = entry.encode_utf16().chain(Some(0)).collect();
        let target_w: Vec<u16> = target.encode_utf16().chain(Some(0)).collect();
        let args = [
            w!("-E"),
            PCWSTR(entry_w.as_ptr()),
            w!("-T"),
            PCWSTR(target_w.as_ptr()),
        ];

        unsafe {
            let result: IDxcResult = self
                .compiler
                .Compile(&buffer, Some(&args), None::<&IDxcIncludeHandler>)
                .map_err(|e| {
                    GraphicsError::ShaderCompilation(format!(
                        "DXC invocation failed for {} ({}): {:?}",
                        entry, target, e
                    ))
                })?;

            let status = result.GetStatus().map_err(|e| {
                GraphicsError::ShaderCompilation(format!(
                    "Failed to query DXC status for {}: {:?}",
                    entry, e
                ))
            })?;

            if status.is_err() {
                let message = match result.GetErrorBuffer() {
                    Ok(errors) => {
                        let text = std::slice::from_raw_parts(
                            errors.GetBufferPointer() as *const u8,
                            errors.GetBufferSize(),
                        );
                        String::from_utf8_lossy(text).into_owned()
                    }
                    Err(_) => "no diagnostics available".to_string(),
                };
                return Err(GraphicsError::ShaderCompilation(format!(
                    "{} ({}): {}",
                    entry, target, message
                ))
                .into());
            }

            let blob = result.GetResult().map_err(|e| {
                GraphicsError::ShaderCompilation(format!(
                    "Failed to get compiled blob for {}: {:?}",
                    entry, e
                ))
            })?;
            debug!(entry, target, size = blob.GetBufferSize(), "Shader compiled");
            Ok(blob)
        }
    }
}

/// 编译着色器并装配图形管线
///
/// # 参数
///
/// * `device` - DX12 设备
///
/// # 返回值
///
/// 根签名和管线状态对象；两者生命周期一致，一起被帧驱动持有。
pub fn build_pipeline(
    device: &ID3D12Device,
) -> Result<(ID3D12RootSignature, ID3D12PipelineState)> {
    let shader_path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("shaders")
        .join("wave_viz.hlsl");
    let source = std::fs::read_to_string(&shader_path).map_err(|e| {
        WaveVizError::Initialization(format!(
            "Failed to read shader source {}: {}",
            shader_path.display(),
            e
        ))
    })?;

    let compiler = ShaderCompiler::new()?;
    let root_signature_blob = compiler.compile(&source, RS_ENTRY, RS_TARGET)?;
    let vs_blob = compiler.compile(&source, VS_ENTRY, VS_TARGET)?;
    let ps_blob = compiler.compile(&source, PS_ENTRY, PS_TARGET)?;

    unsafe {
        let root_signature: ID3D12RootSignature = device
            .CreateRootSignature(
                0,
                std::slice::from_raw_parts(
                    root_signature_blob.GetBufferPointer() as *const u8,
                    root_signature_blob.GetBufferSize(),
                ),
            )
            .map_err(|e| {
                GraphicsError::ResourceCreation(format!(
                    "Failed to create root signature: {:?}",
                    e
                ))
            })?;

        let mut pso_desc = D3D12_GRAPHICS_PIPELINE_STATE_DESC {
            pRootSignature: ManuallyDrop::new(Some(root_signature.clone())),
            VS: D3D12_SHADER_BYTECODE {
                pShaderBytecode: vs_blob.GetBufferPointer(),
                BytecodeLength: vs_blob.GetBufferSize(),
            },
            PS: D3D12_SHADER_BYTECODE {
                pShaderBytecode: ps_blob.GetBufferPointer(),
                BytecodeLength: ps_blob.GetBufferSize(),
            },
            BlendState: D3D12_BLEND_DESC {
                AlphaToCoverageEnable: false.into(),
                IndependentBlendEnable: false.into(),
                RenderTarget: [D3D12_RENDER_TARGET_BLEND_DESC {
                    BlendEnable: false.into(),
                    LogicOpEnable: false.into(),
                    SrcBlend: D3D12_BLEND_ONE,
                    DestBlend: D3D12_BLEND_ZERO,
                    BlendOp: D3D12_BLEND_OP_ADD,
                    SrcBlendAlpha: D3D12_BLEND_ONE,
                    DestBlendAlpha: D3D12_BLEND_ZERO,
                    BlendOpAlpha: D3D12_BLEND_OP_ADD,
                    LogicOp: D3D12_LOGIC_OP_NOOP,
                    RenderTargetWriteMask: D3D12_COLOR_WRITE_ENABLE_ALL.0 as u8,
                }; 8],
            },
            SampleMask: u32::MAX,
            RasterizerState: D3D12_RASTERIZER_DESC {
                FillMode: D3D12_FILL_MODE_SOLID,
                CullMode: D3D12_CULL_MODE_BACK,
                FrontCounterClockwise: false.into(),
                DepthBias: 0,
                DepthBiasClamp: 0.0,
                SlopeScaledDepthBias: 0.0,
                DepthClipEnable: true.into(),
                MultisampleEnable: false.into(),
                AntialiasedLineEnable: false.into(),
                ForcedSampleCount: 0,
                ConservativeRaster: D3D12_CONSERVATIVE_RASTERIZATION_MODE_OFF,
            },
            DepthStencilState: D3D12_DEPTH_STENCIL_DESC {
                DepthEnable: false.into(),
                DepthWriteMask: D3D12_DEPTH_WRITE_MASK_ZERO,
                DepthFunc: D3D12_COMPARISON_FUNC_ALWAYS,
                StencilEnable: false.into(),
                ..Default::default()
            },
            PrimitiveTopologyType: D3D12_PRIMITIVE_TOPOLOGY_TYPE_TRIANGLE,
            NumRenderTargets: 1,
            DSVFormat: DXGI_FORMAT_UNKNOWN,
            SampleDesc: DXGI_SAMPLE_DESC {
                Count: 1,
                Quality: 0,
            },
            ..Default::default()
        };
        pso_desc.RTVFormats[0] = BACK_BUFFER_FORMAT;

        let pso: ID3D12PipelineState =
            device.CreateGraphicsPipelineState(&pso_desc).map_err(|e| {
                GraphicsError::ResourceCreation(format!(
                    "Failed to create graphics pipeline state: {:?}",
                    e
                ))
            })?;

        info!("Graphics pipeline created (fullscreen pair, no depth, no blending)");
        Ok((root_signature, pso))
    }
}
