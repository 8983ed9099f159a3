//! 茶壶几何与交互
//!
//! 与图形 API 无关的部分：控制点数据、部件表、相机与鼠标旋转、细分控制。

pub mod controls;
pub mod data;
pub mod parts;
pub mod view;

pub use controls::{DemoKey, FillMode, TessellationControls};
pub use parts::{Part, PART_COUNT};
pub use view::MouseRotation;
