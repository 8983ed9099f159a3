//! 演示的统一接口
//!
//! 三个演示都实现 [`Demo`]，主循环只通过这个接口驱动它们。

use winit::window::Window;

use crate::core::error::Result;
use crate::teapot::DemoKey;

/// 一个可运行的演示
///
/// # 方法说明
///
/// - `window()`：演示所在的窗口
/// - `resize()`：客户区大小变化
/// - `render()`：录制、提交并呈现一帧，返回时下一帧的资源已可复用
/// - `on_key()` / `on_cursor_moved()`：输入，默认忽略
pub trait Demo {
    fn window(&self) -> &Window;

    /// 客户区大小变化时调用，宽或高为 0 表示最小化
    fn resize(&mut self, width: u32, height: u32) -> Result<()>;

    /// 渲染一帧
    ///
    /// # 返回值
    ///
    /// 任何原生调用失败或 Fence 等待超时都返回错误，调用方应结束程序
    fn render(&mut self) -> Result<()>;

    /// 处理一次演示按键
    fn on_key(&mut self, _key: DemoKey) {}

    /// 光标移动，客户区物理像素坐标
    fn on_cursor_moved(&mut self, _position: (f64, f64)) {}
}
