//! # 依赖注入具体实现
//!
//! 提供组件注册表、类解析器、元数据读取器与扩展点清单加载器的默认实现

pub mod factories;
pub mod registry;
pub mod resolver;

pub use factories::*;
pub use registry::*;
pub use resolver::*;
