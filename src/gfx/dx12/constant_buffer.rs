//! 常驻映射的上传堆常量缓冲
//!
//! 缓冲被切成若干 256 字节对齐的槽位，创建时映射，释放时解除映射。
//! 写入某一帧的槽位前，调用方必须已等待过该帧的 Fence。

use bytemuck::Pod;
use windows::core::HSTRING;
use windows::Win32::Graphics::Direct3D12::*;

use super::{buffer_desc, resource_error};
use crate::core::error::{GraphicsError, Result};
use crate::math::{align_to_constant_buffer, CONSTANT_BUFFER_ALIGNMENT};

/// 槽位在缓冲中的字节偏移
fn slot_offset(slot: usize) -> usize {
    slot * CONSTANT_BUFFER_ALIGNMENT
}

pub struct MappedConstantBuffer {
    resource: ID3D12Resource,
    data: *mut u8,
    slot_count: usize,
}

impl MappedConstantBuffer {
    /// # 参数
    ///
    /// * `device` - DX12 设备
    /// * `slot_count` - 256 字节槽位数量
    /// * `name` - 调试名称
    pub fn new(device: &ID3D12Device, slot_count: usize, name: &str) -> Result<Self> {
        let size = align_to_constant_buffer(slot_offset(slot_count)) as u64;
        if size == 0 {
            return Err(GraphicsError::ResourceCreation(format!("constant buffer '{}' has no slots", name)).into());
        }

        unsafe {
            let heap_props = D3D12_HEAP_PROPERTIES {
                Type: D3D12_HEAP_TYPE_UPLOAD,
                ..Default::default()
            };
            let mut resource: Option<ID3D12Resource> = None;
            device
                .CreateCommittedResource(
                    &heap_props,
                    D3D12_HEAP_FLAG_NONE,
                    &buffer_desc(size),
                    D3D12_RESOURCE_STATE_GENERIC_READ,
                    None,
                    &mut resource,
                )
                .map_err(resource_error("CreateCommittedResource (constant buffer)"))?;
            let resource = resource.ok_or_else(|| {
                GraphicsError::ResourceCreation(format!("constant buffer '{}' was not created", name))
            })?;
            let _ = resource.SetName(&HSTRING::from(name));

            // CPU 不读，读范围为空
            let mut data = std::ptr::null_mut();
            resource
                .Map(0, Some(&D3D12_RANGE { Begin: 0, End: 0 }), Some(&mut data))
                .map_err(resource_error("Map constant buffer"))?;

            crate::gfx_debug!(name, slot_count, bytes = size, "Constant buffer created and mapped");

            Ok(Self {
                resource,
                data: data as *mut u8,
                slot_count,
            })
        }
    }

    /// 槽位的 GPU 虚拟地址
    pub fn gpu_address(&self, slot: usize) -> u64 {
        unsafe { self.resource.GetGPUVirtualAddress() + slot_offset(slot) as u64 }
    }

    /// 把 `value` 写入槽位开头
    pub fn write<T: Pod>(&mut self, slot: usize, value: &T) -> Result<()> {
        let bytes = bytemuck::bytes_of(value);
        if slot >= self.slot_count || bytes.len() > CONSTANT_BUFFER_ALIGNMENT {
            return Err(GraphicsError::ResourceCreation(format!(
                "constant write of {} bytes to slot {} does not fit ({} slots of {} bytes)",
                bytes.len(),
                slot,
                self.slot_count,
                CONSTANT_BUFFER_ALIGNMENT
            ))
            .into());
        }
        unsafe {
            std::ptr::copy_nonoverlapping(bytes.as_ptr(), self.data.add(slot_offset(slot)), bytes.len());
        }
        Ok(())
    }
}

impl Drop for MappedConstantBuffer {
    fn drop(&mut self) {
        unsafe { self.resource.Unmap(0, None) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slots_are_constant_buffer_aligned() {
        assert_eq!(slot_offset(0), 0);
        assert_eq!(slot_offset(1), 256);
        // HelloTeapot：第 2 帧的第 1 个部件
        assert_eq!(slot_offset(28), 28 * 256);
        assert_eq!(slot_offset(7) % CONSTANT_BUFFER_ALIGNMENT, 0);
    }
}
