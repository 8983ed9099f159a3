//! DirectX 12 实现
//!
//! - `context`：窗口、设备、交换链、每帧命令与同步
//! - `constant_buffer`：常驻映射的常量缓冲
//! - `descriptor`：描述符堆与 CBV / SRV 创建
//! - `upload`：Fence 门控的默认堆缓冲上传
//! - `pipeline`：着色器字节码、根签名、管线状态
//! - `hello_window` / `hello_teapot` / `teapot_tutorial`：三个演示

pub mod constant_buffer;
pub mod context;
pub mod descriptor;
pub mod hello_teapot;
pub mod hello_window;
pub mod pipeline;
pub mod teapot_tutorial;
pub mod upload;

pub use context::Dx12Context;
pub use hello_teapot::HelloTeapot;
pub use hello_window::HelloWindow;
pub use teapot_tutorial::TeapotTutorial;

use windows::Win32::Graphics::Direct3D12::*;

use crate::core::error::{GraphicsError, TeapotError};

/// 资源状态转换屏障
///
/// 屏障不持有资源引用，调用方需保证 `resource` 在命令列表执行完之前存活。
pub(crate) fn transition_barrier(
    resource: &ID3D12Resource,
    state_before: D3D12_RESOURCE_STATES,
    state_after: D3D12_RESOURCE_STATES,
) -> D3D12_RESOURCE_BARRIER {
    D3D12_RESOURCE_BARRIER {
        Type: D3D12_RESOURCE_BARRIER_TYPE_TRANSITION,
        Flags: D3D12_RESOURCE_BARRIER_FLAG_NONE,
        Anonymous: D3D12_RESOURCE_BARRIER_0 {
            Transition: std::mem::ManuallyDrop::new(D3D12_RESOURCE_TRANSITION_BARRIER {
                pResource: unsafe { std::mem::transmute_copy(resource) },
                StateBefore: state_before,
                StateAfter: state_after,
                Subresource: D3D12_RESOURCE_BARRIER_ALL_SUBRESOURCES,
            }),
        },
    }
}

/// 缓冲区资源描述
pub(crate) fn buffer_desc(size: u64) -> D3D12_RESOURCE_DESC {
    D3D12_RESOURCE_DESC {
        Dimension: D3D12_RESOURCE_DIMENSION_BUFFER,
        Width: size,
        Height: 1,
        DepthOrArraySize: 1,
        MipLevels: 1,
        SampleDesc: windows::Win32::Graphics::Dxgi::Common::DXGI_SAMPLE_DESC { Count: 1, Quality: 0 },
        Layout: D3D12_TEXTURE_LAYOUT_ROW_MAJOR,
        ..Default::default()
    }
}

/// 把原生错误包装成资源创建错误，消息带上失败的步骤
pub(crate) fn resource_error(step: &str) -> impl FnOnce(windows::core::Error) -> TeapotError + '_ {
    move |e| GraphicsError::ResourceCreation(format!("{}: {:?}", step, e)).into()
}

/// 把原生错误包装成命令执行错误
pub(crate) fn command_error(step: &str) -> impl FnOnce(windows::core::Error) -> TeapotError + '_ {
    move |e| GraphicsError::CommandExecution(format!("{}: {:?}", step, e)).into()
}

/// 把原生错误包装成同步错误
pub(crate) fn sync_error(step: &str) -> impl FnOnce(windows::core::Error) -> TeapotError + '_ {
    move |e| GraphicsError::Synchronization(format!("{}: {:?}", step, e)).into()
}
