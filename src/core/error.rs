//! 错误处理模块
//!
//! 定义了整个 demo 使用的统一错误类型。
//!
//! # 设计原则
//!
//! - 每个 GPU 调用边界都返回显式 `Result`，不依赖 debug 断言
//! - 为每种错误类型提供清晰的上下文信息
//! - 能力缺失（wave intrinsics）和无适配器是独立的、可模式匹配的变体
//! - 设备丢失（device removed）与普通命令失败区分开

use std::fmt;

/// 统一的 Result 类型
///
/// 所有可能返回错误的函数都应该使用这个类型。
pub type Result<T> = std::result::Result<T, WaveVizError>;

/// wave_viz 的错误类型
#[derive(Debug)]
pub enum WaveVizError {
    /// 配置错误
    Config(ConfigError),

    /// 图形 API 错误
    Graphics(GraphicsError),

    /// IO 错误
    Io(std::io::Error),

    /// 初始化错误
    Initialization(String),

    /// 运行时错误
    Runtime(String),
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
    /// 枚举不到任何可用的 GPU 适配器
    AdapterNotFound,

    /// 设备创建失败
    DeviceCreation(String),

    /// 硬件能力缺失（如 wave intrinsics 不被支持）
    MissingCapability(String),

    /// 交换链错误
    Swapchain(String),

    /// 着色器编译失败
    ShaderCompilation(String),

    /// 资源创建失败
    ResourceCreation(String),

    /// 渲染命令执行失败
    CommandExecution(String),

    /// 设备丢失，需要完整重建上下文
    DeviceLost(String),
}

impl fmt::Display for WaveVizError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaveVizError::Config(e) => write!(f, "Configuration error: {}", e),
            WaveVizError::Graphics(e) => write!(f, "Graphics error: {}", e),
            WaveVizError::Io(e) => write!(f, "IO error: {}", e),
            WaveVizError::Initialization(msg) => write!(f, "Initialization error: {}", msg),
            WaveVizError::Runtime(msg) => write!(f, "Runtime error: {}", msg),
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
            GraphicsError::AdapterNotFound => {
                write!(f, "No GPU adapter with dedicated video memory was found")
            }
            GraphicsError::DeviceCreation(msg) => write!(f, "Device creation failed: {}", msg),
            GraphicsError::MissingCapability(msg) => {
                write!(f, "Required hardware capability missing: {}", msg)
            }
            GraphicsError::Swapchain(msg) => write!(f, "Swapchain error: {}", msg),
            GraphicsError::ShaderCompilation(msg) => {
                write!(f, "Shader compilation failed: {}", msg)
            }
            GraphicsError::ResourceCreation(msg) => write!(f, "Resource creation failed: {}", msg),
            GraphicsError::CommandExecution(msg) => write!(f, "Command execution failed: {}", msg),
            GraphicsError::DeviceLost(msg) => write!(f, "Device lost: {}", msg),
        }
    }
}

impl std::error::Error for WaveVizError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WaveVizError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl std::error::Error for ConfigError {}
impl std::error::Error for GraphicsError {}

// 实现 From trait 以便于错误转换
impl From<std::io::Error> for WaveVizError {
    fn from(err: std::io::Error) -> Self {
        WaveVizError::Io(err)
    }
}

impl From<ConfigError> for WaveVizError {
    fn from(err: ConfigError) -> Self {
        WaveVizError::Config(err)
    }
}

impl From<GraphicsError> for WaveVizError {
    fn from(err: GraphicsError) -> Self {
        WaveVizError::Graphics(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adapter_not_found_display() {
        let err = WaveVizError::from(GraphicsError::AdapterNotFound);
        assert!(err.to_string().contains("No GPU adapter"));
    }

    #[test]
    fn test_missing_capability_display() {
        let err = GraphicsError::MissingCapability("wave intrinsics".to_string());
        assert!(err.to_string().contains("wave intrinsics"));
    }
}
