//! 图形 API 实现
//!
//! 只有 DirectX 12 一种实现，且只在 Windows 上编译。

#[cfg(target_os = "windows")]
pub mod dx12;

#[cfg(target_os = "windows")]
pub use dx12::Dx12Context;
