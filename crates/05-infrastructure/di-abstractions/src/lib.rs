//! # Dependency Injection Abstractions
//!
//! 依赖注入抽象层，定义条件自动装配所依赖的容器查询接口。
//!
//! ## 核心接口
//!
//! - [`BeanRegistry`] - 组件注册表接口
//! - [`ClassResolver`] - 类解析器接口
//! - [`MetadataReader`] - 类元数据读取接口
//! - [`FactoriesLoader`] - 扩展点清单加载接口

pub mod factories;
pub mod registry;
pub mod resolver;

pub use factories::*;
pub use registry::*;
pub use resolver::*;
