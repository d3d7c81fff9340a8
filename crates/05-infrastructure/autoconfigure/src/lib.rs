//! # Lorn ADSP 条件自动装配
//!
//! 根据类路径、已注册组件、环境属性和应用类型，从扩展点清单列出的候选
//! 自动装配类中选出需要导入的类，并给出确定的导入顺序。
//!
//! ## 处理流程
//!
//! 1. 从 [`FactoriesLoader`](di_abstractions::FactoriesLoader) 读取候选类并去重
//! 2. 计算排除项（注解属性与 `lorn.autoconfigure.exclude`），校验后移除
//! 3. 依次执行过滤链：类存在性、Web 环境、属性、组件
//! 4. 触发导入事件，写入条件评估报告
//! 5. 多个入口的结果合并后排序：字典序、顺序值、before/after 拓扑
//!
//! ## 示例
//!
//! ```rust,ignore
//! let selector = AutoConfigurationImportSelector::new(context.clone());
//! let mut group = AutoConfigurationGroup::new(AutoConfigurationSorter::new(context.metadata().clone()));
//! group.process(&entry_point, &selector)?;
//! for entry in group.select_imports()? {
//!     println!("{} <- {}", entry.import_class_name, entry.source);
//! }
//! ```

pub mod condition;
pub mod context;
pub mod events;
pub mod exclusions;
pub mod extensions;
pub mod group;
pub mod metadata;
pub mod selector;
pub mod sorter;

pub use condition::{
    AutoConfigurationImportFilter, ConditionEvaluationReport, ConditionEvaluationReportSnapshot,
    ConditionMessage, ConditionOutcome, ConfigurationClassFilter, FilteringCondition,
};
pub use context::AutoConfigurationContext;
pub use events::{
    AutoConfigurationImportEvent, AutoConfigurationImportListener, ConditionEvaluationReportListener,
    SelectionListener, SelectionListeners,
};
pub use exclusions::{ExclusionResolver, EXCLUDE_PROPERTY};
pub use extensions::ExtensionRegistry;
pub use group::{AutoConfigurationGroup, Entry};
pub use metadata::{
    AutoConfigurationMetadata, AutoConfigurationMetadataCache, AutoConfigurationMetadataEntry,
    MetadataIndexLoader, PropertiesMetadataIndexLoader,
};
pub use selector::{AutoConfigurationEntry, AutoConfigurationImportSelector, ENABLED_OVERRIDE_PROPERTY};
pub use sorter::AutoConfigurationSorter;
