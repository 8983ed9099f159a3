//! 着色器字节码、根签名与曲面细分管线
//!
//! 着色器以预编译的 `.cso` 形式从磁盘读取，本程序不做编译。

use std::path::{Path, PathBuf};

use windows::core::{s, HSTRING};
use windows::Win32::Graphics::Direct3D::*;
use windows::Win32::Graphics::Direct3D12::*;
use windows::Win32::Graphics::Dxgi::Common::*;

use super::context::{BACK_BUFFER_FORMAT, DEPTH_FORMAT};
use super::resource_error;
use crate::core::error::{GraphicsError, Result};
use crate::teapot::FillMode;

/// 读取一个编译好的着色器
///
/// 文件不存在或为空时返回带完整路径的 `GraphicsError::ShaderLoading`。
pub fn load_shader(path: &Path) -> Result<Vec<u8>> {
    let bytes = std::fs::read(path).map_err(|e| GraphicsError::ShaderLoading {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    if bytes.is_empty() {
        return Err(GraphicsError::ShaderLoading {
            path: path.to_path_buf(),
            reason: "file is empty".to_string(),
        }
        .into());
    }
    crate::gfx_debug!(path = %path.display(), bytes = bytes.len(), "Shader loaded");
    Ok(bytes)
}

/// 顶点、外壳、域、像素四个阶段的字节码
pub struct TessellationShaders {
    pub vertex: Vec<u8>,
    pub hull: Vec<u8>,
    pub domain: Vec<u8>,
    pub pixel: Vec<u8>,
}

impl TessellationShaders {
    /// 按 VS, HS, DS, PS 顺序读取
    pub fn load(paths: &[PathBuf; 4]) -> Result<Self> {
        Ok(Self {
            vertex: load_shader(&paths[0])?,
            hull: load_shader(&paths[1])?,
            domain: load_shader(&paths[2])?,
            pixel: load_shader(&paths[3])?,
        })
    }
}

fn bytecode(blob: &[u8]) -> D3D12_SHADER_BYTECODE {
    D3D12_SHADER_BYTECODE {
        pShaderBytecode: blob.as_ptr() as *const _,
        BytecodeLength: blob.len(),
    }
}

/// 描述符范围，紧接在上一个范围之后
pub fn descriptor_range(
    range_type: D3D12_DESCRIPTOR_RANGE_TYPE,
    num_descriptors: u32,
    base_register: u32,
) -> D3D12_DESCRIPTOR_RANGE {
    D3D12_DESCRIPTOR_RANGE {
        RangeType: range_type,
        NumDescriptors: num_descriptors,
        BaseShaderRegister: base_register,
        RegisterSpace: 0,
        OffsetInDescriptorsFromTableStart: D3D12_DESCRIPTOR_RANGE_OFFSET_APPEND,
    }
}

/// 描述符表参数，`ranges` 必须活到根签名序列化之后
pub fn descriptor_table(ranges: &[D3D12_DESCRIPTOR_RANGE], visibility: D3D12_SHADER_VISIBILITY) -> D3D12_ROOT_PARAMETER {
    D3D12_ROOT_PARAMETER {
        ParameterType: D3D12_ROOT_PARAMETER_TYPE_DESCRIPTOR_TABLE,
        Anonymous: D3D12_ROOT_PARAMETER_0 {
            DescriptorTable: D3D12_ROOT_DESCRIPTOR_TABLE {
                NumDescriptorRanges: ranges.len() as u32,
                pDescriptorRanges: ranges.as_ptr(),
            },
        },
        ShaderVisibility: visibility,
    }
}

/// 32 位根常量参数
pub fn root_constants(register: u32, count: u32, visibility: D3D12_SHADER_VISIBILITY) -> D3D12_ROOT_PARAMETER {
    D3D12_ROOT_PARAMETER {
        ParameterType: D3D12_ROOT_PARAMETER_TYPE_32BIT_CONSTANTS,
        Anonymous: D3D12_ROOT_PARAMETER_0 {
            Constants: D3D12_ROOT_CONSTANTS {
                ShaderRegister: register,
                RegisterSpace: 0,
                Num32BitValues: count,
            },
        },
        ShaderVisibility: visibility,
    }
}

/// 根 CBV 参数
pub fn root_cbv(register: u32, visibility: D3D12_SHADER_VISIBILITY) -> D3D12_ROOT_PARAMETER {
    D3D12_ROOT_PARAMETER {
        ParameterType: D3D12_ROOT_PARAMETER_TYPE_CBV,
        Anonymous: D3D12_ROOT_PARAMETER_0 {
            Descriptor: D3D12_ROOT_DESCRIPTOR {
                ShaderRegister: register,
                RegisterSpace: 0,
            },
        },
        ShaderVisibility: visibility,
    }
}

/// 序列化并创建根签名
///
/// 序列化失败时错误信息包含运行时给出的说明。
pub fn create_root_signature(
    device: &ID3D12Device,
    parameters: &[D3D12_ROOT_PARAMETER],
    flags: D3D12_ROOT_SIGNATURE_FLAGS,
    name: &str,
) -> Result<ID3D12RootSignature> {
    let desc = D3D12_ROOT_SIGNATURE_DESC {
        NumParameters: parameters.len() as u32,
        pParameters: parameters.as_ptr(),
        NumStaticSamplers: 0,
        pStaticSamplers: std::ptr::null(),
        Flags: flags,
    };

    unsafe {
        let mut signature = None;
        let mut error = None;
        if let Err(e) = D3D12SerializeRootSignature(&desc, D3D_ROOT_SIGNATURE_VERSION_1, &mut signature, Some(&mut error)) {
            let detail = error
                .map(|blob: ID3DBlob| {
                    String::from_utf8_lossy(std::slice::from_raw_parts(
                        blob.GetBufferPointer() as *const u8,
                        blob.GetBufferSize(),
                    ))
                    .trim_end_matches('\0')
                    .to_string()
                })
                .unwrap_or_else(|| format!("{:?}", e));
            return Err(GraphicsError::ResourceCreation(format!(
                "Failed to serialize root signature '{}': {}",
                name, detail
            ))
            .into());
        }
        let signature = signature.ok_or_else(|| {
            GraphicsError::ResourceCreation(format!("root signature '{}' serialized to nothing", name))
        })?;

        let root_signature: ID3D12RootSignature = device
            .CreateRootSignature(
                0,
                std::slice::from_raw_parts(signature.GetBufferPointer() as *const u8, signature.GetBufferSize()),
            )
            .map_err(resource_error("CreateRootSignature"))?;
        let _ = root_signature.SetName(&HSTRING::from(name));
        Ok(root_signature)
    }
}

/// 曲面细分管线的可变部分
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TessellationPipelineDesc {
    pub fill_mode: FillMode,
    /// 开启时深度测试 LESS 并写入，格式 D32_FLOAT
    pub depth_enabled: bool,
}

/// 16 控制点面片输入、不剔除的曲面细分管线
pub fn create_tessellation_pipeline(
    device: &ID3D12Device,
    root_signature: &ID3D12RootSignature,
    shaders: &TessellationShaders,
    desc: TessellationPipelineDesc,
    name: &str,
) -> Result<ID3D12PipelineState> {
    let input_element_descs = [D3D12_INPUT_ELEMENT_DESC {
        SemanticName: s!("POSITION"),
        SemanticIndex: 0,
        Format: DXGI_FORMAT_R32G32B32_FLOAT,
        InputSlot: 0,
        AlignedByteOffset: 0,
        InputSlotClass: D3D12_INPUT_CLASSIFICATION_PER_VERTEX_DATA,
        InstanceDataStepRate: 0,
    }];

    let fill_mode = match desc.fill_mode {
        FillMode::Wireframe => D3D12_FILL_MODE_WIREFRAME,
        FillMode::Solid => D3D12_FILL_MODE_SOLID,
    };

    let mut pso_desc = D3D12_GRAPHICS_PIPELINE_STATE_DESC {
        pRootSignature: unsafe { std::mem::transmute_copy(root_signature) },
        VS: bytecode(&shaders.vertex),
        HS: bytecode(&shaders.hull),
        DS: bytecode(&shaders.domain),
        PS: bytecode(&shaders.pixel),
        InputLayout: D3D12_INPUT_LAYOUT_DESC {
            pInputElementDescs: input_element_descs.as_ptr(),
            NumElements: input_element_descs.len() as u32,
        },
        RasterizerState: D3D12_RASTERIZER_DESC {
            FillMode: fill_mode,
            CullMode: D3D12_CULL_MODE_NONE,
            FrontCounterClockwise: false.into(),
            DepthBias: 0,
            DepthBiasClamp: 0.0,
            SlopeScaledDepthBias: 0.0,
            DepthClipEnable: true.into(),
            ..Default::default()
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
        PrimitiveTopologyType: D3D12_PRIMITIVE_TOPOLOGY_TYPE_PATCH,
        NumRenderTargets: 1,
        SampleDesc: DXGI_SAMPLE_DESC { Count: 1, Quality: 0 },
        ..Default::default()
    };
    pso_desc.RTVFormats[0] = BACK_BUFFER_FORMAT;

    if desc.depth_enabled {
        pso_desc.DepthStencilState = D3D12_DEPTH_STENCIL_DESC {
            DepthEnable: true.into(),
            DepthWriteMask: D3D12_DEPTH_WRITE_MASK_ALL,
            DepthFunc: D3D12_COMPARISON_FUNC_LESS,
            StencilEnable: false.into(),
            ..Default::default()
        };
        pso_desc.DSVFormat = DEPTH_FORMAT;
    } else {
        pso_desc.DepthStencilState = D3D12_DEPTH_STENCIL_DESC {
            DepthEnable: false.into(),
            StencilEnable: false.into(),
            ..Default::default()
        };
    }

    let pso: ID3D12PipelineState = unsafe { device.CreateGraphicsPipelineState(&pso_desc) }
        .map_err(resource_error("CreateGraphicsPipelineState"))?;
    unsafe {
        let _ = pso.SetName(&HSTRING::from(name));
    }
    crate::gfx_debug!(name, fill_mode = ?desc.fill_mode, depth = desc.depth_enabled, "Pipeline state created");
    Ok(pso)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_shader_reports_path() {
        let path = Path::new("does-not-exist").join("HullShader.cso");
        let err = load_shader(&path).unwrap_err();
        let text = err.to_string();
        assert!(text.contains("HullShader.cso"), "{}", text);
    }

    #[test]
    fn test_bytecode_points_at_blob() {
        let blob = vec![0x44u8, 0x58, 0x42, 0x43];
        let code = bytecode(&blob);
        assert_eq!(code.BytecodeLength, 4);
        assert_eq!(code.pShaderBytecode as *const u8, blob.as_ptr());
    }
}
