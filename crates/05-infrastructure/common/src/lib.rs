//! # Infrastructure Common
//!
//! 这个 crate 提供了条件自动装配子系统的公共类型。
//!
//! ## 核心组件
//!
//! - [`AutoConfigError`] - 自动装配错误分类
//! - [`ClassResolutionError`] - 类解析错误，区分不存在与链接失败
//! - [`ClassMetadata`] - 类级别注解属性
//! - [`AnnotationKind`] - 受支持的注解种类
//!
//! ## 设计原则
//!
//! - 基于 Rust 类型系统的强类型属性查询
//! - 结构性错误立即失败，并列出全部问题项

pub mod errors;
pub mod metadata;

pub use errors::*;
pub use metadata::*;
