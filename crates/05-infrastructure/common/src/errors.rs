//! 错误类型定义

use thiserror::Error;

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件不存在: {path}")]
    FileNotFound { path: String },

    #[error("配置文件读取失败: {source}")]
    FileReadError {
        #[from]
        source: std::io::Error,
    },

    #[error("配置解析失败: {source}")]
    ParseError {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("配置序列化失败: {source}")]
    SerializationError {
        #[from]
        source: serde_json::Error,
    },

    #[error("配置键不存在: {key}")]
    KeyNotFound { key: String },

    #[error("配置类型转换失败: {message}")]
    TypeConversionError { message: String },

    #[error("不支持的配置文件格式: {path}")]
    UnsupportedFormat { path: String },
}

/// 类解析错误类型
///
/// 区分"类不存在"与"类存在但无法链接"两种情况，后者在条件过滤阶段按宽松策略处理。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClassResolutionError {
    #[error("类不存在: {class_name}")]
    NotFound { class_name: String },

    #[error("类链接失败: {class_name}, 原因: {message}")]
    Linkage { class_name: String, message: String },
}

impl ClassResolutionError {
    /// 创建类不存在错误
    pub fn not_found(class_name: impl Into<String>) -> Self {
        Self::NotFound {
            class_name: class_name.into(),
        }
    }

    /// 创建链接失败错误
    pub fn linkage(class_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Linkage {
            class_name: class_name.into(),
            message: message.into(),
        }
    }
}

/// 元数据读取错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MetadataError {
    #[error("找不到类的元数据: {class_name}")]
    NotFound { class_name: String },

    #[error("类的元数据格式错误: {class_name}, 原因: {message}")]
    Malformed { class_name: String, message: String },
}

/// 自动装配错误类型
#[derive(Error, Debug)]
pub enum AutoConfigError {
    #[error("以下类无法被排除，因为它们不是自动装配类:\n{}", format_items(.exclusions))]
    InvalidExclusions { exclusions: Vec<String> },

    #[error("找不到自动装配属性，{class_name} 是否标注了 {annotation}?")]
    MissingAttributes {
        class_name: String,
        annotation: String,
    },

    #[error("注解属性无效: {class_name} 上的 {annotation}, 原因: {message}")]
    InvalidAttribute {
        class_name: String,
        annotation: String,
        message: String,
    },

    #[error("在 {extension_point} 中找不到任何自动装配类，如果使用了自定义打包方式，请确认清单文件正确")]
    NoCandidates { extension_point: String },

    #[error("检测到自动装配循环依赖: {current} 与 {after}")]
    AutoConfigureCycle { current: String, after: String },

    #[error("无法读取类的元数据: {class_name}, 原因: {message}")]
    MetadataUnreadable { class_name: String, message: String },

    #[error("未知的扩展实现: {extension_point} -> {name}")]
    UnknownExtension {
        extension_point: String,
        name: String,
    },

    #[error("搜索策略无法使用: {class_name}, 原因: {message}")]
    InvalidSearchStrategy { class_name: String, message: String },

    #[error("监听器执行失败: {listener}, 原因: {message}")]
    ListenerFailed { listener: String, message: String },

    #[error("配置错误: {source}")]
    ConfigError {
        #[from]
        source: ConfigError,
    },
}

impl AutoConfigError {
    /// 创建注解属性无效错误
    pub fn invalid_attribute(
        class_name: impl Into<String>,
        annotation: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidAttribute {
            class_name: class_name.into(),
            annotation: annotation.into(),
            message: message.into(),
        }
    }

    /// 创建循环依赖错误
    pub fn cycle(current: impl Into<String>, after: impl Into<String>) -> Self {
        Self::AutoConfigureCycle {
            current: current.into(),
            after: after.into(),
        }
    }

    /// 是否为启动期必须中止的结构性错误
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::ListenerFailed { .. })
    }
}

fn format_items(items: &[String]) -> String {
    items.iter().map(|item| format!("\t- {}\n", item)).collect()
}

/// 基础设施错误类型
#[derive(Error, Debug)]
pub enum InfrastructureError {
    #[error("配置错误: {source}")]
    ConfigError {
        #[from]
        source: ConfigError,
    },

    #[error("自动装配错误: {source}")]
    AutoConfigError {
        #[from]
        source: AutoConfigError,
    },

    #[error("基础设施启动失败: {message}")]
    BootstrapFailed { message: String },
}

/// 结果类型别名
pub type ConfigResult<T> = Result<T, ConfigError>;
pub type AutoConfigResult<T> = Result<T, AutoConfigError>;
pub type InfrastructureResult<T> = Result<T, InfrastructureError>;
