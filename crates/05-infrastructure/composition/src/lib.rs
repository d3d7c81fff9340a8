//! # 自动装配组合层
//!
//! 这个 crate 负责把配置源、扩展点清单、元数据和组件注册表组合起来，
//! 完成一次完整的条件自动装配选择。
//!
//! ## 主要功能
//!
//! - **自动装配构建器**: 使用构建者模式收集启动所需的全部输入
//! - **配置源管理**: TOML / JSON / properties 文件与环境变量
//! - **日志初始化**: 开发与生产两套预设
//! - **启动器**: 合并多个入口的结果并通知选择过程监听器
//!
//! ## 基本使用
//!
//! ```rust,no_run
//! use infrastructure_composition::AutoConfigurationBuilder;
//! use infrastructure_common::{AnnotationAttributes, AnnotationKind, ClassMetadata};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bootstrapper = AutoConfigurationBuilder::new()
//!         .add_factories_file("META-INF/lorn.factories")?
//!         .add_config_file("application.toml")?
//!         .build()
//!         .await?;
//!
//!     let entry_point = ClassMetadata::new("app.Application")
//!         .with_annotation(AnnotationAttributes::new(AnnotationKind::EnableAutoConfiguration));
//!     let outcome = bootstrapper.run(vec![entry_point]).await?;
//!     for name in outcome.import_class_names() {
//!         println!("导入: {}", name);
//!     }
//!     Ok(())
//! }
//! ```

pub mod bootstrapper;
pub mod builder;

#[cfg(test)]
mod tests;

// 重新导出主要类型
pub use bootstrapper::{AutoConfigurationBootstrapper, SelectionOutcome};
pub use builder::{AutoConfigurationBuilder, LoggingConfig};

// 重新导出错误类型
pub use infrastructure_common::InfrastructureError;
