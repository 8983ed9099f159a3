//! TeapotTutorial：一次绘制整只茶壶
//!
//! 28 个部件的控制点下标拼成一个索引缓冲，部件变换和颜色放在两个结构化缓冲里，
//! 由域着色器按面片 ID 读取。细分因子作为外壳着色器的根常量，
//! 数字键 1/2 调整因子，3/4 切换线框与实体。
//!
//! # 根参数
//!
//! | 下标 | 类型 | 寄存器 | 可见阶段 |
//! |------|------|--------|----------|
//! | 0 | CBV（MVP） | b0 | 域 |
//! | 1 | 2 个根常量（边缘、内部因子） | b0 | 外壳 |
//! | 2 | 描述符表：变换、颜色 SRV | t0-t1 | 域 |

use windows::Win32::Graphics::Direct3D::D3D_PRIMITIVE_TOPOLOGY_16_CONTROL_POINT_PATCHLIST;
use windows::Win32::Graphics::Direct3D12::*;
use winit::event_loop::EventLoop;
use winit::window::Window;

use super::constant_buffer::MappedConstantBuffer;
use super::descriptor::DescriptorHeap;
use super::pipeline::{self, TessellationPipelineDesc, TessellationShaders};
use super::upload;
use super::Dx12Context;
use crate::core::error::{Result, TeapotError};
use crate::core::Config;
use crate::math::{to_gpu_layout, GpuMatrix};
use crate::renderer::demo::Demo;
use crate::teapot::data;
use crate::teapot::parts;
use crate::teapot::{view, DemoKey, FillMode, TessellationControls};

const ROOT_PARAM_MVP: u32 = 0;
const ROOT_PARAM_TESS_FACTORS: u32 = 1;
const ROOT_PARAM_PART_DATA: u32 = 2;

pub struct TeapotTutorial {
    // 先于其余资源释放：Drop 时等待 GPU 空闲
    ctx: Dx12Context,
    root_signature: ID3D12RootSignature,
    wireframe_pso: ID3D12PipelineState,
    solid_pso: ID3D12PipelineState,
    _control_points: ID3D12Resource,
    control_points_view: D3D12_VERTEX_BUFFER_VIEW,
    _patch_indices: ID3D12Resource,
    patch_indices_view: D3D12_INDEX_BUFFER_VIEW,
    index_count: u32,
    _transforms: ID3D12Resource,
    _colors: ID3D12Resource,
    srv_heap: DescriptorHeap,
    constants: MappedConstantBuffer,
    controls: TessellationControls,
    cursor: (f64, f64),
}

impl TeapotTutorial {
    pub fn new(event_loop: &EventLoop<()>, config: &Config) -> Result<Self> {
        let shader_paths = config
            .shader_paths()
            .ok_or_else(|| TeapotError::Initialization("TeapotTutorial needs shader files".to_string()))?;
        let shaders = TessellationShaders::load(&shader_paths)?;

        let ctx = Dx12Context::new(event_loop, config, config.graphics.demo.uses_depth())?;
        let device = &ctx.device;

        let srv_ranges = [pipeline::descriptor_range(D3D12_DESCRIPTOR_RANGE_TYPE_SRV, 2, 0)];
        let root_parameters = [
            pipeline::root_cbv(0, D3D12_SHADER_VISIBILITY_DOMAIN),
            pipeline::root_constants(0, 2, D3D12_SHADER_VISIBILITY_HULL),
            pipeline::descriptor_table(&srv_ranges, D3D12_SHADER_VISIBILITY_DOMAIN),
        ];
        let root_signature = pipeline::create_root_signature(
            device,
            &root_parameters,
            D3D12_ROOT_SIGNATURE_FLAG_ALLOW_INPUT_ASSEMBLER_INPUT_LAYOUT
                | D3D12_ROOT_SIGNATURE_FLAG_DENY_VERTEX_SHADER_ROOT_ACCESS
                | D3D12_ROOT_SIGNATURE_FLAG_DENY_GEOMETRY_SHADER_ROOT_ACCESS
                | D3D12_ROOT_SIGNATURE_FLAG_DENY_PIXEL_SHADER_ROOT_ACCESS,
            "TeapotTutorial Root Signature",
        )?;

        let wireframe_pso = pipeline::create_tessellation_pipeline(
            device,
            &root_signature,
            &shaders,
            TessellationPipelineDesc {
                fill_mode: FillMode::Wireframe,
                depth_enabled: ctx.has_depth(),
            },
            "TeapotTutorial Wireframe PSO",
        )?;
        let solid_pso = pipeline::create_tessellation_pipeline(
            device,
            &root_signature,
            &shaders,
            TessellationPipelineDesc {
                fill_mode: FillMode::Solid,
                depth_enabled: ctx.has_depth(),
            },
            "TeapotTutorial Solid PSO",
        )?;

        let parts = parts::parts();
        let indices = parts::flattened_indices(&parts);
        let transforms = parts::part_transforms(&parts);
        let colors = parts::part_colors(&parts);

        let (control_points, control_points_view) =
            upload::create_vertex_buffer(device, data::control_points(), "Control Points")?;
        let (patch_indices, patch_indices_view) =
            upload::create_index_buffer(device, &indices, "Patch Indices")?;
        let transforms_buffer = upload::create_structured_buffer(device, &transforms, "Patch Transforms")?;
        let colors_buffer = upload::create_structured_buffer(device, &colors, "Patch Colors")?;

        let srv_heap = DescriptorHeap::new(device, 2, "TeapotTutorial SRV Heap")?;
        srv_heap.create_structured_srv(
            device,
            0,
            &transforms_buffer,
            transforms.len() as u32,
            std::mem::size_of::<GpuMatrix>() as u32,
        )?;
        srv_heap.create_structured_srv(
            device,
            1,
            &colors_buffer,
            colors.len() as u32,
            std::mem::size_of::<[f32; 3]>() as u32,
        )?;

        let constants = MappedConstantBuffer::new(device, ctx.frame_count(), "TeapotTutorial Constants")?;
        let controls = TessellationControls::new(config.tessellation.initial_factor);

        crate::gfx_info!(
            adapter = ctx.adapter_name(),
            indices = indices.len(),
            tess_factor = controls.factor(),
            "TeapotTutorial initialized"
        );

        Ok(Self {
            ctx,
            root_signature,
            wireframe_pso,
            solid_pso,
            _control_points: control_points,
            control_points_view,
            _patch_indices: patch_indices,
            patch_indices_view,
            index_count: indices.len() as u32,
            _transforms: transforms_buffer,
            _colors: colors_buffer,
            srv_heap,
            constants,
            controls,
            cursor: (0.0, 0.0),
        })
    }

    fn update_constants(&mut self, frame: usize) -> Result<()> {
        let (width, height) = self.ctx.size();
        let mvp = view::tutorial_mvp(self.cursor, width, height);
        self.constants.write(frame, &to_gpu_layout(&mvp))
    }

    fn active_pso(&self) -> &ID3D12PipelineState {
        match self.controls.fill_mode() {
            FillMode::Wireframe => &self.wireframe_pso,
            FillMode::Solid => &self.solid_pso,
        }
    }
}

impl Demo for TeapotTutorial {
    fn window(&self) -> &Window {
        self.ctx.window()
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        self.ctx.resize(width, height)
    }

    fn render(&mut self) -> Result<()> {
        let frame = self.ctx.frame_index();
        self.update_constants(frame)?;
        let tess_factors = self.controls.root_constants();

        let list = self.ctx.begin_frame(Some(self.active_pso()))?;
        unsafe {
            list.SetGraphicsRootSignature(&self.root_signature);
            list.IASetPrimitiveTopology(D3D_PRIMITIVE_TOPOLOGY_16_CONTROL_POINT_PATCHLIST);
            list.IASetVertexBuffers(0, Some(&[self.control_points_view]));
            list.SetGraphicsRoot32BitConstants(
                ROOT_PARAM_TESS_FACTORS,
                tess_factors.len() as u32,
                tess_factors.as_ptr() as *const _,
                0,
            );
            list.SetDescriptorHeaps(&[Some(self.srv_heap.heap().clone())]);
            list.SetGraphicsRootDescriptorTable(ROOT_PARAM_PART_DATA, self.srv_heap.gpu_handle(0));
            list.SetGraphicsRootConstantBufferView(ROOT_PARAM_MVP, self.constants.gpu_address(frame));
            list.IASetIndexBuffer(Some(&self.patch_indices_view));
            list.DrawIndexedInstanced(self.index_count, 1, 0, 0, 0);
        }
        self.ctx.end_frame()
    }

    fn on_key(&mut self, key: DemoKey) {
        if self.controls.handle_key(key) {
            crate::gfx_info!(
                tess_factor = self.controls.factor(),
                fill_mode = ?self.controls.fill_mode(),
                "Tessellation updated"
            );
        }
    }

    fn on_cursor_moved(&mut self, position: (f64, f64)) {
        self.cursor = position;
    }
}
