//! 错误处理模块
//!
//! 定义了渲染程序中使用的统一错误类型。
//!
//! 所有原生图形 API 的失败都会被转换成带有上下文的 `TeapotError`，
//! 并且都是致命的：不重试，不恢复，由 `main` 统一报告后退出。

use std::fmt;
use std::path::PathBuf;

/// 统一的 Result 类型
///
/// 所有可能返回错误的函数都应该使用这个类型。
pub type Result<T> = std::result::Result<T, TeapotError>;

/// 渲染程序的错误类型
#[derive(Debug)]
pub enum TeapotError {
    /// 配置错误
    Config(ConfigError),

    /// 图形 API 错误
    Graphics(GraphicsError),

    /// IO 错误
    Io(std::io::Error),

    /// 日志系统错误
    Log(String),

    /// 初始化错误
    Initialization(String),
}

/// 配置相关的错误
#[derive(Debug)]
pub enum ConfigError {
    /// 配置文件未找到
    FileNotFound(String),

    /// 配置文件解析失败
    ParseError(String),

    /// 配置值无效
    InvalidValue { field: String, reason: String },
}

/// 图形 API 相关的错误
#[derive(Debug)]
pub enum GraphicsError {
    /// 工厂、适配器或设备创建失败
    DeviceCreation(String),

    /// 交换链错误
    SwapchainError(String),

    /// 着色器字节码读取失败
    ShaderLoading { path: PathBuf, reason: String },

    /// 资源创建失败（缓冲区、堆、根签名、PSO）
    ResourceCreation(String),

    /// 命令录制或提交失败
    CommandExecution(String),

    /// Fence 等待超时或失败
    Synchronization(String),
}

impl fmt::Display for TeapotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TeapotError::Config(e) => write!(f, "Configuration error: {}", e),
            TeapotError::Graphics(e) => write!(f, "Graphics error: {}", e),
            TeapotError::Io(e) => write!(f, "IO error: {}", e),
            TeapotError::Log(msg) => write!(f, "Log error: {}", msg),
            TeapotError::Initialization(msg) => write!(f, "Initialization error: {}", msg),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::FileNotFound(path) => write!(f, "Config file not found: {}", path),
            ConfigError::ParseError(msg) => write!(f, "Failed to parse config: {}", msg),
            ConfigError::InvalidValue { field, reason } => {
                write!(f, "Invalid value for '{}': {}", field, reason)
            }
        }
    }
}

impl fmt::Display for GraphicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphicsError::DeviceCreation(msg) => write!(f, "Device creation failed: {}", msg),
            GraphicsError::SwapchainError(msg) => write!(f, "Swapchain error: {}", msg),
            GraphicsError::ShaderLoading { path, reason } => {
                write!(f, "Failed to load shader '{}': {}", path.display(), reason)
            }
            GraphicsError::ResourceCreation(msg) => write!(f, "Resource creation failed: {}", msg),
            GraphicsError::CommandExecution(msg) => write!(f, "Command execution failed: {}", msg),
            GraphicsError::Synchronization(msg) => write!(f, "GPU synchronization failed: {}", msg),
        }
    }
}

impl std::error::Error for TeapotError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TeapotError::Io(e) => Some(e),
            TeapotError::Config(e) => Some(e),
            TeapotError::Graphics(e) => Some(e),
            _ => None,
        }
    }
}

impl std::error::Error for ConfigError {}
impl std::error::Error for GraphicsError {}

// 实现 From trait 以便于错误转换
impl From<std::io::Error> for TeapotError {
    fn from(err: std::io::Error) -> Self {
        TeapotError::Io(err)
    }
}

impl From<ConfigError> for TeapotError {
    fn from(err: ConfigError) -> Self {
        TeapotError::Config(err)
    }
}

impl From<GraphicsError> for TeapotError {
    fn from(err: GraphicsError) -> Self {
        TeapotError::Graphics(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graphics_error_display() {
        let err: TeapotError =
            GraphicsError::Synchronization("fence wait timed out after 10000 ms".to_string()).into();
        assert_eq!(
            err.to_string(),
            "Graphics error: GPU synchronization failed: fence wait timed out after 10000 ms"
        );
    }

    #[test]
    fn test_shader_loading_names_path() {
        let err = GraphicsError::ShaderLoading {
            path: PathBuf::from("CompiledShaders").join("HullShader.cso"),
            reason: "not found".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("HullShader.cso"));
        assert!(text.ends_with("not found"));
    }

    #[test]
    fn test_error_source_chain() {
        use std::error::Error;

        let err: TeapotError = ConfigError::InvalidValue {
            field: "graphics.frame_count".to_string(),
            reason: "must be between 2 and 16".to_string(),
        }
        .into();
        assert!(err.source().is_some());
        assert!(TeapotError::Initialization("x".to_string()).source().is_none());
    }
}
