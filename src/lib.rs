//! TeapotRender - Direct3D 12 曲面细分演示
//!
//! 三个由浅入深的演示共用同一套窗口、交换链与帧同步代码：
//!
//! - `hello-window`：只清屏
//! - `hello-teapot`：按部件逐个绘制犹他茶壶的贝塞尔面片，线框
//! - `teapot-tutorial`：一次绘制整只茶壶，可调细分因子与填充模式
//!
//! # 模块结构
//!
//! - `core`: 配置、日志、错误处理、输入与计时
//! - `math`: 行向量约定的矩阵工具
//! - `teapot`: 茶壶数据、部件变换、交互状态
//! - `renderer`: 演示接口、帧 Fence 记账、按配置创建演示
//! - `gfx`: DirectX 12 实现（仅 Windows）
//!
//! # 使用示例
//!
//! ```no_run
//! use teapot_render::core::{Config, DemoKind};
//!
//! let mut config = Config::default();
//! config.apply_args(["--demo", "hello-teapot", "--warp"]);
//! assert_eq!(config.graphics.demo, DemoKind::HelloTeapot);
//! ```

pub mod core;
pub mod gfx;
pub mod math;
pub mod renderer;
pub mod teapot;
