//! TeapotRender - Direct3D 12 曲面细分演示
//!
//! 通过配置文件或命令行参数选择要运行的演示。
//!
//! # 使用方法
//!
//! ```bash
//! # 使用配置文件
//! cargo run
//!
//! # 命令行覆盖
//! cargo run -- --demo hello-teapot --warp
//! ```
//!
//! # 架构概览
//!
//! ```text
//! ┌─────────────┐
//! │   main.rs   │  配置、日志、事件循环
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │  Renderer   │  Box<dyn Demo>
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │ Dx12Context │  设备、交换链、帧 Fence
//! └─────────────┘
//! ```

use anyhow::Context;
use winit::event::{Event, KeyEvent, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::PhysicalKey;

use teapot_render::core::{log, Config, InputSystem, Timer};
use teapot_render::renderer::Renderer;
use teapot_render::{app_error, app_info};

const CONFIG_FILE: &str = "config.toml";

/// 程序入口
///
/// 初始化失败或运行中出错时弹出错误信息，进程仍以 0 退出。
fn main() {
    if let Err(error) = run() {
        let message = format!("{:#}", error);
        app_error!(error = %message, "TeapotRender terminated");
        report_fatal(&message);
    }
}

/// # 初始化流程
///
/// 1. 加载配置文件（config.toml），缺失时使用默认值，解析失败则报错
/// 2. 应用命令行参数覆盖并验证
/// 3. 初始化日志系统
/// 4. 创建事件循环和演示
/// 5. 运行主循环，直到窗口关闭或渲染出错
fn run() -> anyhow::Result<()> {
    let mut config = Config::from_file_or_default(CONFIG_FILE)
        .with_context(|| format!("Failed to load {}", CONFIG_FILE))?;
    config.apply_args(std::env::args().skip(1));
    config.validate().context("Invalid configuration")?;

    let log_file = config
        .logging
        .file_output
        .then_some(config.logging.log_file.as_str());
    log::init_logger(config.logging.level, config.logging.file_output, log_file)
        .context("Failed to initialize logging")?;

    app_info!(version = env!("CARGO_PKG_VERSION"), "TeapotRender starting");
    app_info!(
        demo = config.graphics.demo.name(),
        width = config.window.width,
        height = config.window.height,
        frame_count = config.graphics.frame_count,
        warp = config.graphics.use_warp,
        vsync = config.graphics.vsync,
        "Configuration loaded"
    );

    let event_loop = EventLoop::new().context("Failed to create event loop")?;
    let mut renderer = Renderer::new(&event_loop, &config)
        .with_context(|| format!("Failed to initialize {}", config.graphics.demo.name()))?;

    let mut input = InputSystem::new();
    let mut timer = Timer::new();
    let mut failure: Option<anyhow::Error> = None;

    app_info!("Entering main loop");
    timer.reset();
    event_loop.set_control_flow(ControlFlow::Poll);
    event_loop
        .run(|event, elwt| match event {
            Event::AboutToWait => renderer.window().request_redraw(),
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::CloseRequested => {
                    app_info!("Close requested, shutting down");
                    elwt.exit();
                }
                WindowEvent::RedrawRequested => {
                    if let Err(error) = renderer.render() {
                        failure = Some(anyhow::Error::new(error).context("Rendering failed"));
                        elwt.exit();
                        return;
                    }
                    if let Some(fps) = timer.tick() {
                        tracing::debug!(
                            fps,
                            frame_ms = timer.delta_time() * 1000.0,
                            total_s = timer.total_time(),
                            "Frame statistics"
                        );
                    }
                }
                WindowEvent::Resized(size) => {
                    if let Err(error) = renderer.resize(size.width, size.height) {
                        failure = Some(anyhow::Error::new(error).context("Resize failed"));
                        elwt.exit();
                    }
                }
                WindowEvent::KeyboardInput {
                    event:
                        KeyEvent {
                            physical_key: PhysicalKey::Code(code),
                            state,
                            ..
                        },
                    ..
                } => {
                    if let Some(key) = input.on_keyboard_input(code, state) {
                        renderer.on_key(key);
                    }
                }
                WindowEvent::CursorMoved { position, .. } => {
                    input.on_mouse_move((position.x, position.y));
                    renderer.on_cursor_moved(input.cursor_position());
                }
                // 失去焦点期间不计时
                WindowEvent::Focused(false) => {
                    input.reset_keys();
                    timer.stop();
                }
                WindowEvent::Focused(true) => timer.start(),
                _ => (),
            },
            _ => (),
        })
        .context("Event loop terminated abnormally")?;

    // 演示在这里释放，Drop 会等待 GPU 完成所有帧
    drop(renderer);

    match failure {
        Some(error) => Err(error),
        None => {
            app_info!("TeapotRender exited cleanly");
            Ok(())
        }
    }
}

#[cfg(target_os = "windows")]
fn report_fatal(message: &str) {
    use windows::core::{w, HSTRING};
    use windows::Win32::UI::WindowsAndMessaging::{MessageBoxW, MB_ICONERROR, MB_OK};

    unsafe {
        MessageBoxW(None, &HSTRING::from(message), w!("TeapotRender"), MB_OK | MB_ICONERROR);
    }
}

#[cfg(not(target_os = "windows"))]
fn report_fatal(message: &str) {
    eprintln!("TeapotRender: {}", message);
}
