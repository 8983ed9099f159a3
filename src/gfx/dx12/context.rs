//! DirectX 12 设备上下文
//!
//! 三个演示共用的基础设施：窗口、DXGI 工厂与适配器、设备、直接命令队列、
//! 交换链与 RTV、可选的深度缓冲、每个后缓冲一份的命令分配器和 Fence。
//!
//! # 初始化流程
//!
//! 1. 创建窗口
//! 2. 启用调试层（仅 Debug 构建）并创建 DXGI 工厂
//! 3. 选择适配器（硬件优先，可强制 WARP）并创建设备
//! 4. 创建命令队列与交换链
//! 5. 创建 RTV 堆、渲染目标视图，以及可选的深度缓冲
//! 6. 创建命令分配器、命令列表与同步对象
//!
//! # 每帧流程
//!
//! [`Dx12Context::begin_frame`] 录制到清屏为止，演示录制自己的绘制命令，
//! [`Dx12Context::end_frame`] 提交、呈现，并阻塞等待下一个后缓冲的 Fence。

use std::sync::Arc;

use raw_window_handle::{HasWindowHandle, RawWindowHandle};
use windows::core::{Interface, HSTRING};
use windows::Win32::Foundation::{CloseHandle, HANDLE, HWND, RECT, WAIT_OBJECT_0};
use windows::Win32::Graphics::Direct3D::D3D_FEATURE_LEVEL_11_0;
use windows::Win32::Graphics::Direct3D12::*;
use windows::Win32::Graphics::Dxgi::Common::*;
use windows::Win32::Graphics::Dxgi::*;
use windows::Win32::System::Threading::{CreateEventA, WaitForSingleObject};
use winit::dpi::LogicalSize;
use winit::event_loop::EventLoop;
use winit::window::{Window, WindowBuilder};

use super::{command_error, resource_error, sync_error, transition_barrier};
use crate::core::error::{GraphicsError, Result, TeapotError};
use crate::core::Config;
use crate::renderer::sync::{FrameFences, FENCE_WAIT_TIMEOUT_MS};

/// 后缓冲格式
pub const BACK_BUFFER_FORMAT: DXGI_FORMAT = DXGI_FORMAT_R8G8B8A8_UNORM;
/// 深度缓冲格式
pub const DEPTH_FORMAT: DXGI_FORMAT = DXGI_FORMAT_D32_FLOAT;

/// 深度缓冲及其 DSV 堆
struct DepthBuffer {
    heap: ID3D12DescriptorHeap,
    resource: ID3D12Resource,
}

/// DirectX 12 设备上下文
///
/// # 字段说明
///
/// - `device`：D3D12 设备，用于创建资源
/// - `command_queue`：直接命令队列，渲染与呈现都提交到这里
/// - `command_list`：唯一的图形命令列表，每帧用当前帧的分配器重置
/// - `fences` / `frame_fences`：每个后缓冲一个 Fence 及其期望值
pub struct Dx12Context {
    window: Arc<Window>,
    pub device: ID3D12Device,
    pub command_queue: ID3D12CommandQueue,
    swap_chain: IDXGISwapChain3,
    rtv_heap: ID3D12DescriptorHeap,
    rtv_descriptor_size: usize,
    render_targets: Vec<ID3D12Resource>,
    depth: Option<DepthBuffer>,
    command_allocators: Vec<ID3D12CommandAllocator>,
    pub command_list: ID3D12GraphicsCommandList,
    fences: Vec<ID3D12Fence>,
    frame_fences: FrameFences,
    fence_event: HANDLE,
    frame_index: usize,
    width: u32,
    height: u32,
    clear_color: [f32; 4],
    sync_interval: u32,
    adapter_name: String,
}

impl Dx12Context {
    /// 创建窗口并完成设备初始化
    ///
    /// # 参数
    ///
    /// * `event_loop` - 用于创建窗口的事件循环
    /// * `config` - 窗口大小、缓冲数量、是否使用 WARP 等
    /// * `with_depth` - 是否创建 D32 深度缓冲
    ///
    /// # 返回值
    ///
    /// 初始化失败时返回对应步骤的图形错误
    pub fn new(event_loop: &EventLoop<()>, config: &Config, with_depth: bool) -> Result<Self> {
        let demo = config.graphics.demo;
        let window = Arc::new(
            WindowBuilder::new()
                .with_title(format!("{} [{}]", config.window.title, demo.name()))
                .with_inner_size(LogicalSize::new(config.window.width, config.window.height))
                .with_resizable(config.window.resizable)
                .build(event_loop)
                .map_err(|e| TeapotError::Initialization(format!("Failed to create window: {}", e)))?,
        );
        let size = window.inner_size();
        let (width, height) = (size.width.max(1), size.height.max(1));
        let frame_count = config.graphics.frame_count as usize;
        let hwnd = window_hwnd(&window)?;

        unsafe {
            let factory = create_factory()?;
            let adapter = select_adapter(&factory, config.graphics.use_warp)?;
            let adapter_name = adapter_description(&adapter);

            let mut device: Option<ID3D12Device> = None;
            D3D12CreateDevice(&adapter, D3D_FEATURE_LEVEL_11_0, &mut device).map_err(|e| {
                GraphicsError::DeviceCreation(format!("D3D12CreateDevice on '{}': {:?}", adapter_name, e))
            })?;
            let device = device.ok_or_else(|| {
                GraphicsError::DeviceCreation("D3D12CreateDevice returned no device".to_string())
            })?;
            crate::gfx_info!(adapter = %adapter_name, warp = config.graphics.use_warp, "D3D12 device created");

            let queue_desc = D3D12_COMMAND_QUEUE_DESC {
                Type: D3D12_COMMAND_LIST_TYPE_DIRECT,
                Flags: D3D12_COMMAND_QUEUE_FLAG_NONE,
                ..Default::default()
            };
            let command_queue: ID3D12CommandQueue = device
                .CreateCommandQueue(&queue_desc)
                .map_err(resource_error("CreateCommandQueue"))?;

            let swap_chain_desc = DXGI_SWAP_CHAIN_DESC1 {
                Width: width,
                Height: height,
                Format: BACK_BUFFER_FORMAT,
                SampleDesc: DXGI_SAMPLE_DESC { Count: 1, Quality: 0 },
                BufferUsage: DXGI_USAGE_RENDER_TARGET_OUTPUT,
                BufferCount: frame_count as u32,
                SwapEffect: DXGI_SWAP_EFFECT_FLIP_DISCARD,
                ..Default::default()
            };
            let swap_chain: IDXGISwapChain3 = factory
                .CreateSwapChainForHwnd(&command_queue, hwnd, &swap_chain_desc, None, None)
                .and_then(|swap_chain| swap_chain.cast())
                .map_err(|e| GraphicsError::SwapchainError(format!("CreateSwapChainForHwnd: {:?}", e)))?;
            factory
                .MakeWindowAssociation(hwnd, DXGI_MWA_NO_ALT_ENTER)
                .map_err(|e| GraphicsError::SwapchainError(format!("MakeWindowAssociation: {:?}", e)))?;
            crate::gfx_info!(width, height, buffers = frame_count, "Swap chain created");

            let rtv_heap: ID3D12DescriptorHeap = device
                .CreateDescriptorHeap(&D3D12_DESCRIPTOR_HEAP_DESC {
                    Type: D3D12_DESCRIPTOR_HEAP_TYPE_RTV,
                    NumDescriptors: frame_count as u32,
                    Flags: D3D12_DESCRIPTOR_HEAP_FLAG_NONE,
                    NodeMask: 0,
                })
                .map_err(resource_error("CreateDescriptorHeap (RTV)"))?;
            let rtv_descriptor_size =
                device.GetDescriptorHandleIncrementSize(D3D12_DESCRIPTOR_HEAP_TYPE_RTV) as usize;
            let render_targets =
                create_render_targets(&device, &swap_chain, &rtv_heap, rtv_descriptor_size, frame_count)?;

            let depth = if with_depth {
                let heap: ID3D12DescriptorHeap = device
                    .CreateDescriptorHeap(&D3D12_DESCRIPTOR_HEAP_DESC {
                        Type: D3D12_DESCRIPTOR_HEAP_TYPE_DSV,
                        NumDescriptors: 1,
                        Flags: D3D12_DESCRIPTOR_HEAP_FLAG_NONE,
                        NodeMask: 0,
                    })
                    .map_err(resource_error("CreateDescriptorHeap (DSV)"))?;
                let resource = create_depth_buffer(&device, &heap, width, height)?;
                crate::gfx_debug!(width, height, "Depth buffer created");
                Some(DepthBuffer { heap, resource })
            } else {
                None
            };

            let command_allocators = (0..frame_count)
                .map(|_| {
                    device
                        .CreateCommandAllocator::<ID3D12CommandAllocator>(D3D12_COMMAND_LIST_TYPE_DIRECT)
                        .map_err(resource_error("CreateCommandAllocator"))
                })
                .collect::<Result<Vec<_>>>()?;
            let command_list: ID3D12GraphicsCommandList = device
                .CreateCommandList(
                    0,
                    D3D12_COMMAND_LIST_TYPE_DIRECT,
                    &command_allocators[0],
                    None::<&ID3D12PipelineState>,
                )
                .map_err(resource_error("CreateCommandList"))?;
            command_list.Close().map_err(command_error("Close initial command list"))?;

            let fences = (0..frame_count)
                .map(|_| {
                    device
                        .CreateFence::<ID3D12Fence>(0, D3D12_FENCE_FLAG_NONE)
                        .map_err(sync_error("CreateFence"))
                })
                .collect::<Result<Vec<_>>>()?;
            let fence_event = CreateEventA(None, false, false, None).map_err(sync_error("CreateEvent"))?;
            let frame_index = swap_chain.GetCurrentBackBufferIndex() as usize;

            crate::gfx_debug!(frame_index, "Synchronization objects created");

            Ok(Self {
                window,
                device,
                command_queue,
                swap_chain,
                rtv_heap,
                rtv_descriptor_size,
                render_targets,
                depth,
                command_allocators,
                command_list,
                fences,
                frame_fences: FrameFences::new(frame_count),
                fence_event,
                frame_index,
                width,
                height,
                clear_color: config.graphics.clear_color,
                sync_interval: if config.graphics.vsync { 1 } else { 0 },
                adapter_name,
            })
        }
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn adapter_name(&self) -> &str {
        &self.adapter_name
    }

    /// 当前后缓冲大小（物理像素）
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn frame_index(&self) -> usize {
        self.frame_index
    }

    /// 是否创建了深度缓冲
    pub fn has_depth(&self) -> bool {
        self.depth.is_some()
    }

    pub fn frame_count(&self) -> usize {
        self.render_targets.len()
    }

    pub fn viewport(&self) -> D3D12_VIEWPORT {
        D3D12_VIEWPORT {
            TopLeftX: 0.0,
            TopLeftY: 0.0,
            Width: self.width as f32,
            Height: self.height as f32,
            MinDepth: D3D12_MIN_DEPTH,
            MaxDepth: D3D12_MAX_DEPTH,
        }
    }

    pub fn scissor_rect(&self) -> RECT {
        RECT {
            left: 0,
            top: 0,
            right: self.width as i32,
            bottom: self.height as i32,
        }
    }

    fn rtv_handle(&self, index: usize) -> D3D12_CPU_DESCRIPTOR_HANDLE {
        let start = unsafe { self.rtv_heap.GetCPUDescriptorHandleForHeapStart() };
        D3D12_CPU_DESCRIPTOR_HANDLE {
            ptr: start.ptr + index * self.rtv_descriptor_size,
        }
    }

    fn dsv_handle(&self) -> Option<D3D12_CPU_DESCRIPTOR_HANDLE> {
        self.depth
            .as_ref()
            .map(|depth| unsafe { depth.heap.GetCPUDescriptorHandleForHeapStart() })
    }

    /// 开始录制当前帧
    ///
    /// 重置当前帧的分配器和命令列表，把后缓冲转到 RENDER_TARGET，
    /// 绑定并清空渲染目标（以及深度缓冲），设置视口和裁剪矩形。
    ///
    /// # 参数
    ///
    /// * `pipeline_state` - 重置命令列表时的初始管线状态，清屏演示传 `None`
    pub fn begin_frame(&self, pipeline_state: Option<&ID3D12PipelineState>) -> Result<&ID3D12GraphicsCommandList> {
        let allocator = &self.command_allocators[self.frame_index];
        let list = &self.command_list;
        unsafe {
            allocator.Reset().map_err(command_error("Reset command allocator"))?;
            list.Reset(allocator, pipeline_state)
                .map_err(command_error("Reset command list"))?;

            list.ResourceBarrier(&[transition_barrier(
                &self.render_targets[self.frame_index],
                D3D12_RESOURCE_STATE_PRESENT,
                D3D12_RESOURCE_STATE_RENDER_TARGET,
            )]);

            let rtv = self.rtv_handle(self.frame_index);
            let dsv = self.dsv_handle();
            list.OMSetRenderTargets(1, Some(&rtv), false, dsv.as_ref().map(|h| h as *const _));
            list.ClearRenderTargetView(rtv, &self.clear_color, None);
            if let Some(dsv) = dsv {
                list.ClearDepthStencilView(dsv, D3D12_CLEAR_FLAG_DEPTH, 1.0, 0, None);
            }

            list.RSSetViewports(&[self.viewport()]);
            list.RSSetScissorRects(&[self.scissor_rect()]);
        }
        tracing::trace!(frame_index = self.frame_index, "Frame recording started");
        Ok(list)
    }

    /// 结束当前帧：转回 PRESENT，提交，呈现，Signal，并等待下一个后缓冲可用
    pub fn end_frame(&mut self) -> Result<()> {
        let frame = self.frame_index;
        unsafe {
            self.command_list.ResourceBarrier(&[transition_barrier(
                &self.render_targets[frame],
                D3D12_RESOURCE_STATE_RENDER_TARGET,
                D3D12_RESOURCE_STATE_PRESENT,
            )]);
            self.command_list.Close().map_err(command_error("Close command list"))?;

            let command_list = self
                .command_list
                .cast::<ID3D12CommandList>()
                .map_err(command_error("Cast command list"))?;
            self.command_queue.ExecuteCommandLists(&[Some(command_list)]);

            self.swap_chain
                .Present(self.sync_interval, DXGI_PRESENT(0))
                .ok()
                .map_err(|e| GraphicsError::SwapchainError(format!("Present: {:?}", e)))?;

            let value = self.frame_fences.advance(frame);
            self.command_queue
                .Signal(&self.fences[frame], value.value())
                .map_err(sync_error("Signal frame fence"))?;
            tracing::trace!(frame, fence_value = value.value(), "Presented and signaled");

            self.frame_index = self.swap_chain.GetCurrentBackBufferIndex() as usize;
        }
        self.wait_for_frame(self.frame_index)
    }

    /// 阻塞直到该帧的 Fence 达到期望值，最多等待 `FENCE_WAIT_TIMEOUT_MS`
    pub fn wait_for_frame(&self, frame: usize) -> Result<()> {
        let fence = &self.fences[frame];
        let target = self.frame_fences.pending(frame);
        unsafe {
            if !self.frame_fences.needs_wait(frame, fence.GetCompletedValue()) {
                return Ok(());
            }
            fence
                .SetEventOnCompletion(target.value(), self.fence_event)
                .map_err(sync_error("SetEventOnCompletion"))?;
            if WaitForSingleObject(self.fence_event, FENCE_WAIT_TIMEOUT_MS) != WAIT_OBJECT_0 {
                return Err(GraphicsError::Synchronization(format!(
                    "frame {} fence did not reach {} within {} ms",
                    frame,
                    target.value(),
                    FENCE_WAIT_TIMEOUT_MS
                ))
                .into());
            }
        }
        Ok(())
    }

    /// 等待所有帧的 GPU 工作完成
    pub fn wait_for_gpu(&self) -> Result<()> {
        for (frame, _) in self.frame_fences.iter() {
            self.wait_for_frame(frame)?;
        }
        Ok(())
    }

    /// 按新的客户区大小重建后缓冲、RTV 和深度缓冲
    ///
    /// 宽或高为 0（最小化）时不做任何事。
    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        if width == 0 || height == 0 || (width, height) == (self.width, self.height) {
            return Ok(());
        }
        self.wait_for_gpu()?;

        let frame_count = self.frame_count();
        self.render_targets.clear();
        unsafe {
            self.swap_chain
                .ResizeBuffers(frame_count as u32, width, height, BACK_BUFFER_FORMAT, DXGI_SWAP_CHAIN_FLAG(0))
                .map_err(|e| GraphicsError::SwapchainError(format!("ResizeBuffers: {:?}", e)))?;
            self.render_targets = create_render_targets(
                &self.device,
                &self.swap_chain,
                &self.rtv_heap,
                self.rtv_descriptor_size,
                frame_count,
            )?;
            if let Some(depth) = self.depth.as_mut() {
                depth.resource = create_depth_buffer(&self.device, &depth.heap, width, height)?;
            }
            self.frame_index = self.swap_chain.GetCurrentBackBufferIndex() as usize;
        }
        self.width = width;
        self.height = height;
        crate::gfx_debug!(width, height, "Swap chain resized");
        Ok(())
    }
}

impl Drop for Dx12Context {
    fn drop(&mut self) {
        if let Err(e) = self.wait_for_gpu() {
            crate::gfx_warn!(error = %e, "GPU did not finish before shutdown");
        }
        unsafe {
            let _ = CloseHandle(self.fence_event);
        }
        crate::gfx_debug!("DX12 context released");
    }
}

fn window_hwnd(window: &Window) -> Result<HWND> {
    let handle = window
        .window_handle()
        .map_err(|e| TeapotError::Initialization(format!("Failed to get window handle: {}", e)))?;
    match handle.as_raw() {
        RawWindowHandle::Win32(win32) => Ok(HWND(win32.hwnd.get() as *mut std::ffi::c_void)),
        _ => Err(TeapotError::Initialization(
            "Expected a Win32 window handle".to_string(),
        )),
    }
}

/// Debug 构建下启用 D3D12 调试层和 DXGI 调试工厂
unsafe fn create_factory() -> Result<IDXGIFactory4> {
    let mut factory_flags = DXGI_CREATE_FACTORY_FLAGS(0);
    if cfg!(debug_assertions) {
        let mut debug: Option<ID3D12Debug> = None;
        if let Some(debug) = D3D12GetDebugInterface(&mut debug).ok().and(debug) {
            debug.EnableDebugLayer();
            factory_flags |= DXGI_CREATE_FACTORY_DEBUG;
            crate::gfx_debug!("D3D12 debug layer enabled");
        } else {
            crate::gfx_warn!("D3D12 debug layer unavailable");
        }
    }
    CreateDXGIFactory2(factory_flags)
        .map_err(|e| GraphicsError::DeviceCreation(format!("CreateDXGIFactory2: {:?}", e)).into())
}

/// 选择第一个支持 11.0 特性级别的硬件适配器，或 WARP
unsafe fn select_adapter(factory: &IDXGIFactory4, use_warp: bool) -> Result<IDXGIAdapter1> {
    if use_warp {
        return factory
            .EnumWarpAdapter()
            .map_err(|e| GraphicsError::DeviceCreation(format!("EnumWarpAdapter: {:?}", e)).into());
    }

    for i in 0.. {
        let adapter = match factory.EnumAdapters1(i) {
            Ok(adapter) => adapter,
            Err(_) => break,
        };
        let desc = adapter
            .GetDesc1()
            .map_err(|e| GraphicsError::DeviceCreation(format!("GetDesc1: {:?}", e)))?;
        if (DXGI_ADAPTER_FLAG(desc.Flags as i32) & DXGI_ADAPTER_FLAG_SOFTWARE) != DXGI_ADAPTER_FLAG_NONE {
            continue;
        }
        let supported = D3D12CreateDevice(
            &adapter,
            D3D_FEATURE_LEVEL_11_0,
            std::ptr::null_mut::<Option<ID3D12Device>>(),
        )
        .is_ok();
        if supported {
            return Ok(adapter);
        }
    }

    Err(GraphicsError::DeviceCreation("No hardware adapter supports feature level 11.0".to_string()).into())
}

unsafe fn adapter_description(adapter: &IDXGIAdapter1) -> String {
    match adapter.GetDesc1() {
        Ok(desc) => String::from_utf16_lossy(&desc.Description)
            .trim_end_matches('\0')
            .to_string(),
        Err(_) => "unknown adapter".to_string(),
    }
}

unsafe fn create_render_targets(
    device: &ID3D12Device,
    swap_chain: &IDXGISwapChain3,
    rtv_heap: &ID3D12DescriptorHeap,
    rtv_descriptor_size: usize,
    frame_count: usize,
) -> Result<Vec<ID3D12Resource>> {
    let start = rtv_heap.GetCPUDescriptorHandleForHeapStart();
    (0..frame_count)
        .map(|i| {
            let surface: ID3D12Resource = swap_chain
                .GetBuffer(i as u32)
                .map_err(|e| GraphicsError::SwapchainError(format!("GetBuffer({}): {:?}", i, e)))?;
            let handle = D3D12_CPU_DESCRIPTOR_HANDLE {
                ptr: start.ptr + i * rtv_descriptor_size,
            };
            device.CreateRenderTargetView(&surface, None, handle);
            let _ = surface.SetName(&HSTRING::from(format!("Back Buffer {}", i)));
            Ok(surface)
        })
        .collect()
}

unsafe fn create_depth_buffer(
    device: &ID3D12Device,
    dsv_heap: &ID3D12DescriptorHeap,
    width: u32,
    height: u32,
) -> Result<ID3D12Resource> {
    let heap_props = D3D12_HEAP_PROPERTIES {
        Type: D3D12_HEAP_TYPE_DEFAULT,
        ..Default::default()
    };
    let desc = D3D12_RESOURCE_DESC {
        Dimension: D3D12_RESOURCE_DIMENSION_TEXTURE2D,
        Width: width as u64,
        Height: height,
        DepthOrArraySize: 1,
        MipLevels: 1,
        Format: DEPTH_FORMAT,
        SampleDesc: DXGI_SAMPLE_DESC { Count: 1, Quality: 0 },
        Layout: D3D12_TEXTURE_LAYOUT_UNKNOWN,
        Flags: D3D12_RESOURCE_FLAG_ALLOW_DEPTH_STENCIL,
        ..Default::default()
    };
    let clear_value = D3D12_CLEAR_VALUE {
        Format: DEPTH_FORMAT,
        Anonymous: D3D12_CLEAR_VALUE_0 {
            DepthStencil: D3D12_DEPTH_STENCIL_VALUE { Depth: 1.0, Stencil: 0 },
        },
    };

    let mut resource: Option<ID3D12Resource> = None;
    device
        .CreateCommittedResource(
            &heap_props,
            D3D12_HEAP_FLAG_NONE,
            &desc,
            D3D12_RESOURCE_STATE_DEPTH_WRITE,
            Some(&clear_value),
            &mut resource,
        )
        .map_err(resource_error("CreateCommittedResource (depth)"))?;
    let resource = resource
        .ok_or_else(|| GraphicsError::ResourceCreation("depth buffer was not created".to_string()))?;
    let _ = resource.SetName(&HSTRING::from("Depth Buffer"));

    device.CreateDepthStencilView(&resource, None, dsv_heap.GetCPUDescriptorHandleForHeapStart());
    Ok(resource)
}
