//! # Configuration Implementation
//!
//! 属性源与运行环境的具体实现。
//!
//! ## 主要组件
//!
//! - [`StandardEnvironment`] - 按优先级组合多个属性源的运行环境
//! - [`MapPropertySource`] - 内存属性源
//! - [`SystemEnvironmentPropertySource`] - 环境变量属性源
//! - [`FlattenedPropertySource`] - TOML / JSON / properties 文件属性源
//! - [`TomlPropertySourceLoader`] 等 - 异步文件加载器

pub mod environment;
pub mod loaders;
pub mod providers;

pub use environment::*;
pub use loaders::*;
pub use providers::*;
