//! 配置管理模块
//!
//! 提供程序配置的加载、解析和管理功能。
//! 支持从 TOML 配置文件加载，也支持命令行参数覆盖。
//!
//! # 配置文件格式 (config.toml)
//!
//! ```toml
//! [window]
//! width = 800
//! height = 600
//! title = "Hello, Teapot!"
//! resizable = false
//!
//! [graphics]
//! demo = "teapot-tutorial"  # hello-window, hello-teapot, teapot-tutorial
//! frame_count = 2
//! use_warp = false
//! vsync = true
//! clear_color = [0.0, 0.5, 0.0, 1.0]
//!
//! [tessellation]
//! initial_factor = 8
//!
//! [shaders]
//! directory = "CompiledShaders"
//!
//! [logging]
//! level = "info"      # trace, debug, info, warn, error
//! file_output = false
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::error::{ConfigError, Result, TeapotError};
use crate::teapot::controls::{MAX_TESS_FACTOR, MIN_TESS_FACTOR};

/// 程序配置
///
/// 包含了运行一个演示所需的所有配置项。
/// 可以从配置文件加载，也可以通过代码构建。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// 窗口配置
    #[serde(default)]
    pub window: WindowConfig,

    /// 图形配置
    #[serde(default)]
    pub graphics: GraphicsConfig,

    /// 曲面细分配置
    #[serde(default)]
    pub tessellation: TessellationConfig,

    /// 着色器配置
    #[serde(default)]
    pub shaders: ShaderConfig,

    /// 日志配置
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// 窗口配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    /// 窗口宽度
    #[serde(default = "default_width")]
    pub width: u32,

    /// 窗口高度
    #[serde(default = "default_height")]
    pub height: u32,

    /// 窗口标题
    #[serde(default = "default_title")]
    pub title: String,

    /// 是否可调整大小
    #[serde(default = "default_resizable")]
    pub resizable: bool,
}

/// 图形配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphicsConfig {
    /// 运行哪个演示
    #[serde(default = "default_demo")]
    pub demo: DemoKind,

    /// 交换链缓冲区数量（同时也是每帧资源的份数）
    #[serde(default = "default_frame_count")]
    pub frame_count: u32,

    /// 使用 WARP 软件适配器
    #[serde(default)]
    pub use_warp: bool,

    /// 垂直同步
    #[serde(default = "default_vsync")]
    pub vsync: bool,

    /// 后缓冲清屏颜色 (RGBA)
    #[serde(default = "default_clear_color")]
    pub clear_color: [f32; 4],
}

/// 演示类型
///
/// 三个演示按顺序逐步增加功能。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DemoKind {
    /// 仅创建设备与交换链并清屏
    HelloWindow,
    /// 每个面片一个索引缓冲，28 次绘制
    HelloTeapot,
    /// 结构化缓冲 + 根常量 + 深度缓冲，一次绘制
    TeapotTutorial,
}

/// 曲面细分配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TessellationConfig {
    /// 初始细分因子
    #[serde(default = "default_tess_factor")]
    pub initial_factor: u32,
}

/// 着色器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShaderConfig {
    /// 预编译 `.cso` 文件所在目录
    #[serde(default = "default_shader_dir")]
    pub directory: String,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: LogLevel,

    /// 是否输出到文件
    #[serde(default = "default_file_output")]
    pub file_output: bool,

    /// 日志文件路径
    #[serde(default = "default_log_file")]
    pub log_file: String,
}

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

// 默认值函数
fn default_width() -> u32 { 800 }
fn default_height() -> u32 { 600 }
fn default_title() -> String { "Hello, Teapot!".to_string() }
fn default_resizable() -> bool { false }
fn default_demo() -> DemoKind { DemoKind::TeapotTutorial }
fn default_frame_count() -> u32 { 2 }
fn default_vsync() -> bool { true }
fn default_clear_color() -> [f32; 4] { [0.0, 0.5, 0.0, 1.0] }
fn default_tess_factor() -> u32 { 8 }
fn default_shader_dir() -> String { "CompiledShaders".to_string() }
fn default_log_level() -> LogLevel { LogLevel::Info }
fn default_file_output() -> bool { false }
fn default_log_file() -> String { "teapot_render.log".to_string() }

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            title: default_title(),
            resizable: default_resizable(),
        }
    }
}

impl Default for GraphicsConfig {
    fn default() -> Self {
        Self {
            demo: default_demo(),
            frame_count: default_frame_count(),
            use_warp: false,
            vsync: default_vsync(),
            clear_color: default_clear_color(),
        }
    }
}

impl Default for TessellationConfig {
    fn default() -> Self {
        Self {
            initial_factor: default_tess_factor(),
        }
    }
}

impl Default for ShaderConfig {
    fn default() -> Self {
        Self {
            directory: default_shader_dir(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file_output: default_file_output(),
            log_file: default_log_file(),
        }
    }
}

impl Config {
    /// 从配置文件加载
    ///
    /// # 参数
    ///
    /// * `path` - 配置文件路径
    ///
    /// # 返回值
    ///
    /// 成功返回 `Config` 实例，失败返回错误
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let contents = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ConfigError::FileNotFound(path_str.clone()).into(),
            _ => TeapotError::Io(e),
        })?;

        Self::from_toml_str(&contents)
    }

    /// 从 TOML 文本解析配置
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|e| ConfigError::ParseError(e.to_string()).into())
    }

    /// 从配置文件加载，如果文件不存在则使用默认配置
    ///
    /// # 参数
    ///
    /// * `path` - 配置文件路径
    ///
    /// # 返回值
    ///
    /// 文件存在但无法读取或解析时返回错误，不会退回默认配置
    pub fn from_file_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        match Self::from_file(path) {
            Err(TeapotError::Config(ConfigError::FileNotFound(_))) => Ok(Self::default()),
            result => result,
        }
    }

    /// 从命令行参数覆盖配置
    ///
    /// # 参数
    ///
    /// * `args` - 命令行参数迭代器
    ///
    /// # 说明
    ///
    /// 支持的参数：
    /// - `--demo <name>`: 选择演示（hello-window / hello-teapot / teapot-tutorial）
    /// - `--warp`: 使用 WARP 适配器
    /// - `--no-vsync`: 关闭垂直同步
    /// - `--width <value>`: 设置窗口宽度
    /// - `--height <value>`: 设置窗口高度
    /// - `--tess <value>`: 设置初始细分因子
    ///
    /// 无法解析的值会被忽略，保留原配置。
    pub fn apply_args<I>(&mut self, args: I)
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let args: Vec<String> = args.into_iter().map(|s| s.as_ref().to_string()).collect();

        if args.iter().any(|a| a == "--warp") {
            self.graphics.use_warp = true;
        }

        if args.iter().any(|a| a == "--no-vsync") {
            self.graphics.vsync = false;
        }

        if let Some(demo) = value_after(&args, "--demo").and_then(DemoKind::from_name) {
            self.graphics.demo = demo;
        }

        if let Some(width) = value_after(&args, "--width").and_then(|v| v.parse().ok()) {
            self.window.width = width;
        }

        if let Some(height) = value_after(&args, "--height").and_then(|v| v.parse().ok()) {
            self.window.height = height;
        }

        if let Some(tess) = value_after(&args, "--tess").and_then(|v| v.parse().ok()) {
            self.tessellation.initial_factor = tess;
        }
    }

    /// 验证配置的有效性
    ///
    /// # 返回值
    ///
    /// 配置有效返回 `Ok(())`，否则返回错误
    pub fn validate(&self) -> Result<()> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::InvalidValue {
                field: "window.width/height".to_string(),
                reason: "Window dimensions must be greater than 0".to_string(),
            }.into());
        }

        if !(2..=16).contains(&self.graphics.frame_count) {
            return Err(ConfigError::InvalidValue {
                field: "graphics.frame_count".to_string(),
                reason: "Frame count must be between 2 and 16".to_string(),
            }.into());
        }

        if self.graphics.clear_color.iter().any(|c| !c.is_finite()) {
            return Err(ConfigError::InvalidValue {
                field: "graphics.clear_color".to_string(),
                reason: "Clear color components must be finite".to_string(),
            }.into());
        }

        let tess = self.tessellation.initial_factor;
        if !(MIN_TESS_FACTOR..=MAX_TESS_FACTOR).contains(&tess) {
            return Err(ConfigError::InvalidValue {
                field: "tessellation.initial_factor".to_string(),
                reason: format!(
                    "Tessellation factor must be between {} and {}",
                    MIN_TESS_FACTOR, MAX_TESS_FACTOR
                ),
            }.into());
        }

        Ok(())
    }

    /// 当前演示所需的着色器文件完整路径（VS, HS, DS, PS）
    ///
    /// `HelloWindow` 不使用着色器，返回 `None`。
    pub fn shader_paths(&self) -> Option<[PathBuf; 4]> {
        let dir = Path::new(&self.shaders.directory);
        self.graphics
            .demo
            .shader_files()
            .map(|files| files.map(|name| dir.join(name)))
    }
}

fn value_after<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    let idx = args.iter().position(|a| a == flag)?;
    args.get(idx + 1).map(String::as_str)
}

impl DemoKind {
    /// 从命令行名称解析
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "hello-window" => Some(DemoKind::HelloWindow),
            "hello-teapot" => Some(DemoKind::HelloTeapot),
            "teapot-tutorial" => Some(DemoKind::TeapotTutorial),
            _ => None,
        }
    }

    /// 获取演示名称
    pub fn name(&self) -> &'static str {
        match self {
            DemoKind::HelloWindow => "Hello Window",
            DemoKind::HelloTeapot => "Hello Teapot",
            DemoKind::TeapotTutorial => "Teapot Tutorial",
        }
    }

    /// 是否需要深度缓冲
    pub fn uses_depth(&self) -> bool {
        matches!(self, DemoKind::TeapotTutorial)
    }

    /// 顶点、外壳、域、像素着色器的文件名
    pub fn shader_files(&self) -> Option<[&'static str; 4]> {
        match self {
            DemoKind::HelloWindow => None,
            DemoKind::HelloTeapot => Some([
                "TeapotVertexShader.cso",
                "TeapotHullShader.cso",
                "TeapotDomainShader.cso",
                "TeapotPixelShader.cso",
            ]),
            DemoKind::TeapotTutorial => Some([
                "VertexShader.cso",
                "HullShader.cso",
                "DomainShader.cso",
                "PixelShader.cso",
            ]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.window.width, 800);
        assert_eq!(config.window.height, 600);
        assert_eq!(config.graphics.demo, DemoKind::TeapotTutorial);
        assert_eq!(config.graphics.frame_count, 2);
        assert_eq!(config.graphics.clear_color, [0.0, 0.5, 0.0, 1.0]);
        assert_eq!(config.tessellation.initial_factor, 8);
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.window.width = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.graphics.frame_count = 1;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.tessellation.initial_factor = 65;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.graphics.clear_color[3] = f32::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_apply_args() {
        let mut config = Config::default();
        config.apply_args([
            "teapot_render", "--demo", "hello-teapot", "--warp", "--width", "400",
            "--height", "300", "--tess", "16", "--no-vsync",
        ]);
        assert_eq!(config.graphics.demo, DemoKind::HelloTeapot);
        assert!(config.graphics.use_warp);
        assert!(!config.graphics.vsync);
        assert_eq!(config.window.width, 400);
        assert_eq!(config.window.height, 300);
        assert_eq!(config.tessellation.initial_factor, 16);
    }

    #[test]
    fn test_apply_args_ignores_bad_values() {
        let mut config = Config::default();
        config.apply_args(["teapot_render", "--demo", "triangle", "--width", "wide"]);
        assert_eq!(config.graphics.demo, DemoKind::TeapotTutorial);
        assert_eq!(config.window.width, 800);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = Config::from_toml_str("[graphics]\ndemo = \"hello-window\"\n").unwrap();
        assert_eq!(config.graphics.demo, DemoKind::HelloWindow);
        assert_eq!(config.graphics.frame_count, 2);
        assert_eq!(config.window.title, "Hello, Teapot!");
        assert!(config.shader_paths().is_none());
    }

    #[test]
    fn test_shader_paths_follow_directory() {
        let mut config = Config::default();
        config.shaders.directory = "blobs".to_string();
        let paths = config.shader_paths().unwrap();
        assert_eq!(paths[1], Path::new("blobs").join("HullShader.cso"));

        config.graphics.demo = DemoKind::HelloTeapot;
        let paths = config.shader_paths().unwrap();
        assert_eq!(paths[2], Path::new("blobs").join("TeapotDomainShader.cso"));
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let path = std::env::temp_dir().join(format!("teapot_render_missing_{}.toml", std::process::id()));
        let config = Config::from_file_or_default(&path).unwrap();
        assert_eq!(config.graphics.demo, DemoKind::TeapotTutorial);
    }

    #[test]
    fn test_malformed_file_is_reported() {
        let path = std::env::temp_dir().join(format!("teapot_render_bad_{}.toml", std::process::id()));
        std::fs::write(&path, "[graphics]\ndemo = \"hello_teapot\"\n").unwrap();
        let result = Config::from_file_or_default(&path);
        let _ = std::fs::remove_file(&path);

        match result {
            Err(TeapotError::Config(ConfigError::ParseError(msg))) => assert!(msg.contains("hello_teapot")),
            other => panic!("expected a parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_only_tutorial_uses_depth() {
        assert!(!DemoKind::HelloWindow.uses_depth());
        assert!(!DemoKind::HelloTeapot.uses_depth());
        assert!(DemoKind::TeapotTutorial.uses_depth());
    }
}
