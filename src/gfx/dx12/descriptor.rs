//! 着色器可见的 CBV / SRV 描述符堆
//!
//! 演示只需要一个 CBV_SRV_UAV 堆：HelloTeapot 放每帧每部件的 CBV，
//! TeapotTutorial 放两个结构化缓冲的 SRV。

use windows::core::HSTRING;
use windows::Win32::Graphics::Direct3D12::*;
use windows::Win32::Graphics::Dxgi::Common::DXGI_FORMAT_UNKNOWN;

use super::resource_error;
use crate::core::error::{GraphicsError, Result};

/// 堆起始地址加上 `index` 个描述符的偏移
fn offset(start: u64, index: u32, increment_size: u32) -> u64 {
    start + index as u64 * increment_size as u64
}

/// 着色器可见的 CBV_SRV_UAV 描述符堆
pub struct DescriptorHeap {
    heap: ID3D12DescriptorHeap,
    /// 描述符增量大小
    increment_size: u32,
    /// CPU 句柄基址
    cpu_start: usize,
    /// GPU 句柄基址
    gpu_start: u64,
    /// 描述符数量
    num_descriptors: u32,
}

impl DescriptorHeap {
    /// 创建着色器可见的堆
    ///
    /// # 参数
    ///
    /// * `device` - DX12 设备
    /// * `num_descriptors` - 描述符数量，不能为 0
    /// * `name` - 调试名称
    pub fn new(device: &ID3D12Device, num_descriptors: u32, name: &str) -> Result<Self> {
        if num_descriptors == 0 {
            return Err(GraphicsError::ResourceCreation(format!(
                "descriptor heap '{}' needs at least one descriptor",
                name
            ))
            .into());
        }

        unsafe {
            let heap: ID3D12DescriptorHeap = device
                .CreateDescriptorHeap(&D3D12_DESCRIPTOR_HEAP_DESC {
                    Type: D3D12_DESCRIPTOR_HEAP_TYPE_CBV_SRV_UAV,
                    NumDescriptors: num_descriptors,
                    Flags: D3D12_DESCRIPTOR_HEAP_FLAG_SHADER_VISIBLE,
                    NodeMask: 0,
                })
                .map_err(resource_error("CreateDescriptorHeap (CBV/SRV)"))?;
            let _ = heap.SetName(&HSTRING::from(name));

            let increment_size = device.GetDescriptorHandleIncrementSize(D3D12_DESCRIPTOR_HEAP_TYPE_CBV_SRV_UAV);
            let cpu_start = heap.GetCPUDescriptorHandleForHeapStart().ptr;
            let gpu_start = heap.GetGPUDescriptorHandleForHeapStart().ptr;

            crate::gfx_debug!(name, num_descriptors, "Descriptor heap created");

            Ok(Self {
                heap,
                increment_size,
                cpu_start,
                gpu_start,
                num_descriptors,
            })
        }
    }

    /// 底层堆，用于 `SetDescriptorHeaps`
    pub fn heap(&self) -> &ID3D12DescriptorHeap {
        &self.heap
    }

    fn check_index(&self, index: u32) -> Result<()> {
        if index < self.num_descriptors {
            Ok(())
        } else {
            Err(GraphicsError::ResourceCreation(format!(
                "descriptor index {} out of range (heap holds {})",
                index, self.num_descriptors
            ))
            .into())
        }
    }

    pub fn cpu_handle(&self, index: u32) -> D3D12_CPU_DESCRIPTOR_HANDLE {
        D3D12_CPU_DESCRIPTOR_HANDLE {
            ptr: offset(self.cpu_start as u64, index, self.increment_size) as usize,
        }
    }

    /// 描述符表起点
    pub fn gpu_handle(&self, index: u32) -> D3D12_GPU_DESCRIPTOR_HANDLE {
        D3D12_GPU_DESCRIPTOR_HANDLE {
            ptr: offset(self.gpu_start, index, self.increment_size),
        }
    }

    /// 在 `index` 处创建常量缓冲区视图
    ///
    /// `size` 必须是 256 的倍数。
    pub fn create_cbv(&self, device: &ID3D12Device, index: u32, location: u64, size: u32) -> Result<()> {
        self.check_index(index)?;
        let desc = D3D12_CONSTANT_BUFFER_VIEW_DESC {
            BufferLocation: location,
            SizeInBytes: size,
        };
        unsafe { device.CreateConstantBufferView(Some(&desc), self.cpu_handle(index)) };
        Ok(())
    }

    /// 在 `index` 处创建结构化缓冲的着色器资源视图
    pub fn create_structured_srv(
        &self,
        device: &ID3D12Device,
        index: u32,
        resource: &ID3D12Resource,
        num_elements: u32,
        stride: u32,
    ) -> Result<()> {
        self.check_index(index)?;
        let desc = D3D12_SHADER_RESOURCE_VIEW_DESC {
            Format: DXGI_FORMAT_UNKNOWN,
            ViewDimension: D3D12_SRV_DIMENSION_BUFFER,
            Shader4ComponentMapping: D3D12_DEFAULT_SHADER_4_COMPONENT_MAPPING,
            Anonymous: D3D12_SHADER_RESOURCE_VIEW_DESC_0 {
                Buffer: D3D12_BUFFER_SRV {
                    FirstElement: 0,
                    NumElements: num_elements,
                    StructureByteStride: stride,
                    Flags: D3D12_BUFFER_SRV_FLAG_NONE,
                },
            },
        };
        unsafe { device.CreateShaderResourceView(resource, Some(&desc), self.cpu_handle(index)) };
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_offset() {
        assert_eq!(offset(0x1000, 0, 32), 0x1000);
        assert_eq!(offset(0x1000, 3, 32), 0x1000 + 96);
        // 28 部件 × 2 帧的最后一个槽位
        assert_eq!(offset(0, 55, 64), 55 * 64);
    }
}
