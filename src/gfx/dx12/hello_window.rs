//! HelloWindow：只清屏

use winit::event_loop::EventLoop;
use winit::window::Window;

use super::Dx12Context;
use crate::core::error::Result;
use crate::core::Config;
use crate::renderer::demo::Demo;

pub struct HelloWindow {
    ctx: Dx12Context,
}

impl HelloWindow {
    pub fn new(event_loop: &EventLoop<()>, config: &Config) -> Result<Self> {
        let ctx = Dx12Context::new(event_loop, config, config.graphics.demo.uses_depth())?;
        crate::gfx_info!(adapter = ctx.adapter_name(), "HelloWindow initialized");
        Ok(Self { ctx })
    }
}

impl Demo for HelloWindow {
    fn window(&self) -> &Window {
        self.ctx.window()
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        self.ctx.resize(width, height)
    }

    fn render(&mut self) -> Result<()> {
        self.ctx.begin_frame(None)?;
        self.ctx.end_frame()
    }
}
