//! 渲染器模块
//!
//! 根据配置创建对应的演示，并把窗口事件转交给它。
//!
//! # 架构设计
//!
//! - `Renderer`：主循环使用的入口，持有一个 `Box<dyn Demo>`
//! - `demo`：三个演示共同实现的接口
//! - `sync`：与图形 API 无关的帧 Fence 记账
//! - 具体实现在 `gfx::dx12` 中，仅 Windows 可用

use winit::event_loop::EventLoop;
use winit::window::Window;

use crate::core::error::Result;
use crate::core::Config;
use crate::teapot::DemoKey;

pub mod demo;
pub mod sync;

pub use demo::Demo;

pub struct Renderer {
    demo: Box<dyn Demo>,
}

impl Renderer {
    /// 创建配置中选择的演示
    ///
    /// 非 Windows 平台返回 `TeapotError::Initialization`。
    pub fn new(event_loop: &EventLoop<()>, config: &Config) -> Result<Self> {
        crate::app_info!(demo = config.graphics.demo.name(), "Initializing demo");
        let demo = create_demo(event_loop, config)?;
        Ok(Self { demo })
    }

    pub fn window(&self) -> &Window {
        self.demo.window()
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        self.demo.resize(width, height)
    }

    pub fn render(&mut self) -> Result<()> {
        self.demo.render()
    }

    pub fn on_key(&mut self, key: DemoKey) {
        self.demo.on_key(key)
    }

    pub fn on_cursor_moved(&mut self, position: (f64, f64)) {
        self.demo.on_cursor_moved(position)
    }
}

#[cfg(target_os = "windows")]
fn create_demo(event_loop: &EventLoop<()>, config: &Config) -> Result<Box<dyn Demo>> {
    use crate::core::DemoKind;
    use crate::gfx::dx12::{HelloTeapot, HelloWindow, TeapotTutorial};

    Ok(match config.graphics.demo {
        DemoKind::HelloWindow => Box::new(HelloWindow::new(event_loop, config)?),
        DemoKind::HelloTeapot => Box::new(HelloTeapot::new(event_loop, config)?),
        DemoKind::TeapotTutorial => Box::new(TeapotTutorial::new(event_loop, config)?),
    })
}

#[cfg(not(target_os = "windows"))]
fn create_demo(_event_loop: &EventLoop<()>, config: &Config) -> Result<Box<dyn Demo>> {
    Err(crate::core::error::TeapotError::Initialization(format!(
        "{} requires Direct3D 12, which is only available on Windows",
        config.graphics.demo.name()
    )))
}
