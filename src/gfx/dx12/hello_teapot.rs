//! HelloTeapot：每个面片一个索引缓冲，每帧 28 次绘制
//!
//! 每个部件的 MVP 放在自己的 CBV 里，通过只含一个 CBV 的描述符表交给域着色器。
//! 线框、不剔除、无深度。

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
use crate::math::{to_gpu_layout, CONSTANT_BUFFER_ALIGNMENT};
use crate::renderer::demo::Demo;
use crate::teapot::data::{self, CONTROL_POINTS_PER_PATCH, PATCHES};
use crate::teapot::parts::{self, Part};
use crate::teapot::{view, FillMode, PART_COUNT};

pub struct HelloTeapot {
    // 先于其余资源释放：Drop 时等待 GPU 空闲
    ctx: Dx12Context,
    root_signature: ID3D12RootSignature,
    pso: ID3D12PipelineState,
    _control_points: ID3D12Resource,
    control_points_view: D3D12_VERTEX_BUFFER_VIEW,
    /// 以 `PATCHES` 下标索引
    patch_index_buffers: Vec<(ID3D12Resource, D3D12_INDEX_BUFFER_VIEW)>,
    parts: Vec<Part>,
    cbv_heap: DescriptorHeap,
    constants: MappedConstantBuffer,
    cursor: (f64, f64),
}

impl HelloTeapot {
    pub fn new(event_loop: &EventLoop<()>, config: &Config) -> Result<Self> {
        let shader_paths = config
            .shader_paths()
            .ok_or_else(|| TeapotError::Initialization("HelloTeapot needs shader files".to_string()))?;
        // 在任何原生调用之前确认着色器都在
        let shaders = TessellationShaders::load(&shader_paths)?;

        let ctx = Dx12Context::new(event_loop, config, config.graphics.demo.uses_depth())?;
        let device = &ctx.device;

        let table_ranges = [pipeline::descriptor_range(D3D12_DESCRIPTOR_RANGE_TYPE_CBV, 1, 0)];
        let root_parameters = [pipeline::descriptor_table(&table_ranges, D3D12_SHADER_VISIBILITY_DOMAIN)];
        let root_signature = pipeline::create_root_signature(
            device,
            &root_parameters,
            D3D12_ROOT_SIGNATURE_FLAG_ALLOW_INPUT_ASSEMBLER_INPUT_LAYOUT
                | D3D12_ROOT_SIGNATURE_FLAG_DENY_VERTEX_SHADER_ROOT_ACCESS
                | D3D12_ROOT_SIGNATURE_FLAG_DENY_HULL_SHADER_ROOT_ACCESS
                | D3D12_ROOT_SIGNATURE_FLAG_DENY_GEOMETRY_SHADER_ROOT_ACCESS
                | D3D12_ROOT_SIGNATURE_FLAG_DENY_PIXEL_SHADER_ROOT_ACCESS,
            "HelloTeapot Root Signature",
        )?;
        let pso = pipeline::create_tessellation_pipeline(
            device,
            &root_signature,
            &shaders,
            TessellationPipelineDesc {
                fill_mode: FillMode::Wireframe,
                depth_enabled: ctx.has_depth(),
            },
            "HelloTeapot Wireframe PSO",
        )?;

        let (control_points, control_points_view) =
            upload::create_vertex_buffer(device, data::control_points(), "Control Points")?;

        let patch_index_buffers = PATCHES
            .iter()
            .enumerate()
            .map(|(i, patch)| upload::create_index_buffer(device, patch, &format!("Patch {} Indices", i)))
            .collect::<Result<Vec<_>>>()?;

        let frame_count = ctx.frame_count();
        let slot_count = frame_count * PART_COUNT;
        let cbv_heap = DescriptorHeap::new(device, slot_count as u32, "HelloTeapot CBV Heap")?;
        let constants = MappedConstantBuffer::new(device, slot_count, "HelloTeapot Constants")?;
        for slot in 0..slot_count {
            cbv_heap.create_cbv(
                device,
                slot as u32,
                constants.gpu_address(slot),
                CONSTANT_BUFFER_ALIGNMENT as u32,
            )?;
        }

        let parts = parts::parts();
        crate::gfx_info!(
            adapter = ctx.adapter_name(),
            parts = parts.len(),
            patches = patch_index_buffers.len(),
            cbvs = slot_count,
            "HelloTeapot initialized"
        );

        Ok(Self {
            ctx,
            root_signature,
            pso,
            _control_points: control_points,
            control_points_view,
            patch_index_buffers,
            parts,
            cbv_heap,
            constants,
            cursor: (0.0, 0.0),
        })
    }

    /// 把本帧每个部件的 MVP 写入本帧的槽位
    fn update_constants(&mut self, frame: usize) -> Result<()> {
        let (width, height) = self.ctx.size();
        for (i, part) in self.parts.iter().enumerate() {
            let mvp = view::part_mvp(part, self.cursor, width, height);
            self.constants.write(frame * PART_COUNT + i, &to_gpu_layout(&mvp))?;
        }
        Ok(())
    }
}

impl Demo for HelloTeapot {
    fn window(&self) -> &Window {
        self.ctx.window()
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        self.ctx.resize(width, height)
    }

    fn render(&mut self) -> Result<()> {
        let frame = self.ctx.frame_index();
        self.update_constants(frame)?;

        let list = self.ctx.begin_frame(Some(&self.pso))?;
        unsafe {
            list.SetGraphicsRootSignature(&self.root_signature);
            list.SetDescriptorHeaps(&[Some(self.cbv_heap.heap().clone())]);
            list.IASetPrimitiveTopology(D3D_PRIMITIVE_TOPOLOGY_16_CONTROL_POINT_PATCHLIST);
            list.IASetVertexBuffers(0, Some(&[self.control_points_view]));

            for (i, part) in self.parts.iter().enumerate() {
                let slot = (frame * PART_COUNT + i) as u32;
                list.SetGraphicsRootDescriptorTable(0, self.cbv_heap.gpu_handle(slot));
                list.IASetIndexBuffer(Some(&self.patch_index_buffers[part.patch].1));
                list.DrawIndexedInstanced(CONTROL_POINTS_PER_PATCH as u32, 1, 0, 0, 0);
            }
        }
        self.ctx.end_frame()
    }

    fn on_cursor_moved(&mut self, position: (f64, f64)) {
        self.cursor = position;
    }
}
