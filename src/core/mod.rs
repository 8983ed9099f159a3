//! 核心功能模块
//!
//! 本模块提供与图形 API 无关的基础功能：日志系统、配置管理、错误处理、输入与计时。
//!
//! # 模块组织
//!
//! - `log`：日志系统，提供结构化的日志记录功能
//! - `config`：配置管理，支持从配置文件和命令行加载设置
//! - `error`：错误处理，定义统一的错误类型
//! - `input`：键盘与光标状态
//! - `timer`：帧计时与帧率统计

pub mod log;
pub mod config;
pub mod error;
pub mod input;
pub mod timer;

// 重新导出常用类型，方便使用
pub use error::{Result, TeapotError};
pub use config::{Config, DemoKind};
pub use input::InputSystem;
pub use timer::Timer;
