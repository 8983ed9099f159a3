//! Fence 门控的默认堆上传
//!
//! 每次上传都是一次性的：独立的命令队列、分配器、命令列表和 Fence，
//! 提交后阻塞等待 Fence 到 1，返回时数据已在默认堆中且处于目标状态。
//! 等待超时时本次上传的对象不会被释放，错误随后结束程序。

use bytemuck::Pod;
use windows::core::{Interface, HSTRING};
use windows::Win32::Foundation::{CloseHandle, HANDLE, WAIT_EVENT, WAIT_OBJECT_0};
use windows::Win32::Graphics::Direct3D12::*;
use windows::Win32::Graphics::Dxgi::Common::DXGI_FORMAT_R32_UINT;
use windows::Win32::System::Threading::{CreateEventA, WaitForSingleObject};

use super::{buffer_desc, command_error, resource_error, sync_error, transition_barrier};
use crate::core::error::{GraphicsError, Result};
use crate::renderer::sync::FENCE_WAIT_TIMEOUT_MS;

/// 上传完成时 Fence 的值
const UPLOAD_FENCE_VALUE: u64 = 1;

/// 事件句柄，离开作用域时关闭
struct EventHandle(HANDLE);

impl EventHandle {
    fn new() -> Result<Self> {
        unsafe { CreateEventA(None, false, false, None) }
            .map(Self)
            .map_err(sync_error("CreateEvent (upload)"))
    }
}

impl Drop for EventHandle {
    fn drop(&mut self) {
        unsafe {
            let _ = CloseHandle(self.0);
        }
    }
}

/// 数据的字节数，空数据直接拒绝
fn upload_size<T: Pod>(data: &[T], name: &str) -> Result<u64> {
    let size = std::mem::size_of_val(data);
    if size == 0 {
        return Err(GraphicsError::ResourceCreation(format!(
            "refusing to upload empty buffer '{}'",
            name
        ))
        .into());
    }
    Ok(size as u64)
}

/// 上传 Fence 的等待结果，超时或失败都是同步错误
fn upload_wait_result(wait: WAIT_EVENT, name: &str) -> Result<()> {
    if wait == WAIT_OBJECT_0 {
        return Ok(());
    }
    Err(GraphicsError::Synchronization(format!(
        "upload of '{}' did not finish within {} ms",
        name, FENCE_WAIT_TIMEOUT_MS
    ))
    .into())
}

unsafe fn create_committed_buffer(
    device: &ID3D12Device,
    heap_type: D3D12_HEAP_TYPE,
    size: u64,
    state: D3D12_RESOURCE_STATES,
    step: &str,
) -> Result<ID3D12Resource> {
    let heap_props = D3D12_HEAP_PROPERTIES {
        Type: heap_type,
        ..Default::default()
    };
    let mut resource: Option<ID3D12Resource> = None;
    device
        .CreateCommittedResource(
            &heap_props,
            D3D12_HEAP_FLAG_NONE,
            &buffer_desc(size),
            state,
            None,
            &mut resource,
        )
        .map_err(resource_error(step))?;
    resource.ok_or_else(|| GraphicsError::ResourceCreation(format!("{}: no resource returned", step)).into())
}

/// 创建默认堆缓冲并同步上传 `data`
///
/// # 参数
///
/// * `device` - DX12 设备
/// * `data` - 要上传的数据，不能为空
/// * `final_state` - 拷贝完成后资源所处的状态
/// * `name` - 调试名称
///
/// # 返回值
///
/// 数据已就绪的默认堆缓冲。任何一步失败都返回图形错误，不重试。
pub fn create_default_buffer<T: Pod>(
    device: &ID3D12Device,
    data: &[T],
    final_state: D3D12_RESOURCE_STATES,
    name: &str,
) -> Result<ID3D12Resource> {
    let size = upload_size(data, name)?;
    let bytes: &[u8] = bytemuck::cast_slice(data);

    unsafe {
        let default_buffer = create_committed_buffer(
            device,
            D3D12_HEAP_TYPE_DEFAULT,
            size,
            D3D12_RESOURCE_STATE_COPY_DEST,
            "CreateCommittedResource (default buffer)",
        )?;
        let _ = default_buffer.SetName(&HSTRING::from(name));

        let upload_buffer = create_committed_buffer(
            device,
            D3D12_HEAP_TYPE_UPLOAD,
            size,
            D3D12_RESOURCE_STATE_GENERIC_READ,
            "CreateCommittedResource (upload buffer)",
        )?;

        let mut mapped = std::ptr::null_mut();
        upload_buffer
            .Map(0, Some(&D3D12_RANGE { Begin: 0, End: 0 }), Some(&mut mapped))
            .map_err(resource_error("Map upload buffer"))?;
        std::ptr::copy_nonoverlapping(bytes.as_ptr(), mapped as *mut u8, bytes.len());
        upload_buffer.Unmap(0, None);

        let allocator: ID3D12CommandAllocator = device
            .CreateCommandAllocator(D3D12_COMMAND_LIST_TYPE_DIRECT)
            .map_err(resource_error("CreateCommandAllocator (upload)"))?;
        let list: ID3D12GraphicsCommandList = device
            .CreateCommandList(0, D3D12_COMMAND_LIST_TYPE_DIRECT, &allocator, None::<&ID3D12PipelineState>)
            .map_err(resource_error("CreateCommandList (upload)"))?;
        let queue: ID3D12CommandQueue = device
            .CreateCommandQueue(&D3D12_COMMAND_QUEUE_DESC {
                Type: D3D12_COMMAND_LIST_TYPE_DIRECT,
                Flags: D3D12_COMMAND_QUEUE_FLAG_NONE,
                ..Default::default()
            })
            .map_err(resource_error("CreateCommandQueue (upload)"))?;

        list.CopyBufferRegion(&default_buffer, 0, &upload_buffer, 0, size);
        list.ResourceBarrier(&[transition_barrier(
            &default_buffer,
            D3D12_RESOURCE_STATE_COPY_DEST,
            final_state,
        )]);
        list.Close().map_err(command_error("Close upload command list"))?;
        let submitted = list
            .cast::<ID3D12CommandList>()
            .map_err(command_error("Cast upload command list"))?;
        queue.ExecuteCommandLists(&[Some(submitted)]);

        let fence: ID3D12Fence = device
            .CreateFence(0, D3D12_FENCE_FLAG_NONE)
            .map_err(sync_error("CreateFence (upload)"))?;
        let event = EventHandle::new()?;
        queue
            .Signal(&fence, UPLOAD_FENCE_VALUE)
            .map_err(sync_error("Signal upload fence"))?;
        fence
            .SetEventOnCompletion(UPLOAD_FENCE_VALUE, event.0)
            .map_err(sync_error("SetEventOnCompletion (upload)"))?;
        if let Err(e) = upload_wait_result(WaitForSingleObject(event.0, FENCE_WAIT_TIMEOUT_MS), name) {
            // GPU 可能仍在读写这些对象，放弃引用而不释放
            std::mem::forget((default_buffer, upload_buffer, allocator, list, queue, fence, event));
            return Err(e);
        }

        crate::gfx_debug!(name, bytes = size, "Buffer uploaded");
        Ok(default_buffer)
    }
}

/// 顶点缓冲及其视图
pub fn create_vertex_buffer<T: Pod>(
    device: &ID3D12Device,
    data: &[T],
    name: &str,
) -> Result<(ID3D12Resource, D3D12_VERTEX_BUFFER_VIEW)> {
    let buffer = create_default_buffer(device, data, D3D12_RESOURCE_STATE_VERTEX_AND_CONSTANT_BUFFER, name)?;
    let view = D3D12_VERTEX_BUFFER_VIEW {
        BufferLocation: unsafe { buffer.GetGPUVirtualAddress() },
        SizeInBytes: std::mem::size_of_val(data) as u32,
        StrideInBytes: std::mem::size_of::<T>() as u32,
    };
    Ok((buffer, view))
}

/// 32 位索引缓冲及其视图
pub fn create_index_buffer(
    device: &ID3D12Device,
    indices: &[u32],
    name: &str,
) -> Result<(ID3D12Resource, D3D12_INDEX_BUFFER_VIEW)> {
    let buffer = create_default_buffer(device, indices, D3D12_RESOURCE_STATE_INDEX_BUFFER, name)?;
    let view = D3D12_INDEX_BUFFER_VIEW {
        BufferLocation: unsafe { buffer.GetGPUVirtualAddress() },
        SizeInBytes: std::mem::size_of_val(indices) as u32,
        Format: DXGI_FORMAT_R32_UINT,
    };
    Ok((buffer, view))
}

/// 供非像素着色器阶段读取的结构化缓冲
pub fn create_structured_buffer<T: Pod>(device: &ID3D12Device, data: &[T], name: &str) -> Result<ID3D12Resource> {
    create_default_buffer(device, data, D3D12_RESOURCE_STATE_NON_PIXEL_SHADER_RESOURCE, name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use windows::Win32::Foundation::WAIT_TIMEOUT;

    #[test]
    fn test_empty_upload_rejected() {
        let empty: [u32; 0] = [];
        let err = upload_size(&empty, "Empty").unwrap_err();
        assert!(err.to_string().contains("Empty"));
    }

    #[test]
    fn test_upload_size_in_bytes() {
        let points = [[0.0f32; 3]; 118];
        assert_eq!(upload_size(&points, "Control Points").unwrap(), 118 * 12);
        assert_eq!(upload_size(&[1u32, 2, 3], "Indices").unwrap(), 12);
    }

    #[test]
    fn test_upload_wait_timeout_is_sync_error() {
        assert!(upload_wait_result(WAIT_OBJECT_0, "Patch Indices").is_ok());

        let err = upload_wait_result(WAIT_TIMEOUT, "Patch Indices").unwrap_err();
        assert!(matches!(
            err,
            crate::core::error::TeapotError::Graphics(GraphicsError::Synchronization(_))
        ));
        assert!(err.to_string().contains("Patch Indices"));
    }
}
