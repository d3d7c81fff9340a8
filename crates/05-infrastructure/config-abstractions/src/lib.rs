//! # Configuration Abstractions
//!
//! 配置抽象层，定义属性读取的核心接口和约定。
//!
//! ## 核心接口
//!
//! - [`PropertySource`] - 属性源接口
//! - [`PropertyResolver`] - 属性解析接口
//! - [`Environment`] - 运行环境接口
//! - [`PropertySourceLoader`] - 文件属性源加载接口

pub mod provider;

pub use provider::*;
