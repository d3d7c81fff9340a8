//! 扩展注册表
//!
//! 过滤器与导入监听器都按名称注册构造函数，扩展点清单决定启用哪些以及顺序

use crate::condition::{
    AutoConfigurationImportFilter, OnBeanCondition, OnClassCondition, OnPropertyCondition,
    OnWebApplicationCondition,
};
use crate::context::AutoConfigurationContext;
use crate::events::{AutoConfigurationImportListener, ConditionEvaluationReportListener};
use di_abstractions::{AUTO_CONFIGURATION_IMPORT_FILTER, AUTO_CONFIGURATION_IMPORT_LISTENER};
use infrastructure_common::{short_name, AutoConfigError, AutoConfigResult};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// 过滤器构造函数
pub type FilterFactory = Arc<dyn Fn(&AutoConfigurationContext) -> Arc<dyn AutoConfigurationImportFilter> + Send + Sync>;

/// 导入监听器构造函数
pub type ListenerFactory =
    Arc<dyn Fn(&AutoConfigurationContext) -> Arc<dyn AutoConfigurationImportListener> + Send + Sync>;

/// 清单中没有声明过滤器时使用的默认过滤器
pub const DEFAULT_FILTERS: [&str; 4] = [
    OnClassCondition::NAME,
    OnWebApplicationCondition::NAME,
    OnPropertyCondition::NAME,
    OnBeanCondition::NAME,
];

/// 清单中没有声明监听器时使用的默认监听器
pub const DEFAULT_LISTENERS: [&str; 1] = [ConditionEvaluationReportListener::NAME];

/// 扩展注册表
#[derive(Clone)]
pub struct ExtensionRegistry {
    filters: BTreeMap<String, FilterFactory>,
    listeners: BTreeMap<String, ListenerFactory>,
}

impl fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionRegistry")
            .field("filters", &self.filters.keys().collect::<Vec<_>>())
            .field("listeners", &self.listeners.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ExtensionRegistry {
    /// 创建空注册表
    pub fn empty() -> Self {
        Self {
            filters: BTreeMap::new(),
            listeners: BTreeMap::new(),
        }
    }

    /// 创建包含内置过滤器与监听器的注册表
    pub fn new() -> Self {
        Self::empty()
            .with_filter(OnClassCondition::NAME, |_| Arc::new(OnClassCondition::new()))
            .with_filter(OnWebApplicationCondition::NAME, |_| Arc::new(OnWebApplicationCondition))
            .with_filter(OnPropertyCondition::NAME, |_| Arc::new(OnPropertyCondition))
            .with_filter(OnBeanCondition::NAME, |_| Arc::new(OnBeanCondition))
            .with_listener(ConditionEvaluationReportListener::NAME, |context| {
                Arc::new(ConditionEvaluationReportListener::new(context.report().cloned()))
            })
    }

    /// 注册过滤器
    pub fn with_filter<F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&AutoConfigurationContext) -> Arc<dyn AutoConfigurationImportFilter> + Send + Sync + 'static,
    {
        self.filters.insert(name.into(), Arc::new(factory));
        self
    }

    /// 注册导入监听器
    pub fn with_listener<F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&AutoConfigurationContext) -> Arc<dyn AutoConfigurationImportListener> + Send + Sync + 'static,
    {
        self.listeners.insert(name.into(), Arc::new(factory));
        self
    }

    /// 按清单创建启用的过滤器
    pub fn filters(&self, context: &AutoConfigurationContext) -> AutoConfigResult<Vec<Arc<dyn AutoConfigurationImportFilter>>> {
        let names = active_names(context, AUTO_CONFIGURATION_IMPORT_FILTER, &DEFAULT_FILTERS);
        names
            .iter()
            .map(|name| {
                lookup(&self.filters, AUTO_CONFIGURATION_IMPORT_FILTER, name).map(|factory| factory(context))
            })
            .collect()
    }

    /// 按清单创建启用的导入监听器
    pub fn listeners(
        &self,
        context: &AutoConfigurationContext,
    ) -> AutoConfigResult<Vec<Arc<dyn AutoConfigurationImportListener>>> {
        let names = active_names(context, AUTO_CONFIGURATION_IMPORT_LISTENER, &DEFAULT_LISTENERS);
        names
            .iter()
            .map(|name| {
                lookup(&self.listeners, AUTO_CONFIGURATION_IMPORT_LISTENER, name).map(|factory| factory(context))
            })
            .collect()
    }
}

impl Default for ExtensionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn active_names(context: &AutoConfigurationContext, extension_point: &str, defaults: &[&str]) -> Vec<String> {
    let names = context.factories().load_factory_names(extension_point);
    if names.is_empty() {
        debug!("扩展点 {} 未声明实现，使用默认实现", extension_point);
        return defaults.iter().map(|name| name.to_string()).collect();
    }
    names
}

/// 按完整名称或简短名称查找
fn lookup<'a, T>(
    factories: &'a BTreeMap<String, T>,
    extension_point: &str,
    name: &str,
) -> AutoConfigResult<&'a T> {
    factories
        .get(name)
        .or_else(|| factories.get(short_name(name)))
        .ok_or_else(|| AutoConfigError::UnknownExtension {
            extension_point: extension_point.to_string(),
            name: name.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::test_support::TestContext;
    use di_impl::PropertiesFactoriesLoader;

    #[test]
    fn test_defaults_when_manifest_is_silent() {
        let context = TestContext::new().build();
        let registry = ExtensionRegistry::new();

        let filters = registry.filters(&context).unwrap();
        let names: Vec<&str> = filters.iter().map(|f| f.name()).collect();
        assert_eq!(names, DEFAULT_FILTERS.to_vec());
        assert_eq!(registry.listeners(&context).unwrap().len(), 1);
    }

    #[test]
    fn test_manifest_selects_and_orders_filters() {
        let mut test_context = TestContext::new();
        test_context.factories = PropertiesFactoriesLoader::new().with_factories(
            AUTO_CONFIGURATION_IMPORT_FILTER,
            ["lorn.autoconfigure.condition.OnPropertyCondition", "OnClassCondition"],
        );
        let context = test_context.build();

        let filters = ExtensionRegistry::new().filters(&context).unwrap();
        let names: Vec<&str> = filters.iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["OnPropertyCondition", "OnClassCondition"]);
    }

    #[test]
    fn test_unknown_extension_is_fatal() {
        let mut test_context = TestContext::new();
        test_context.factories =
            PropertiesFactoriesLoader::new().with_factories(AUTO_CONFIGURATION_IMPORT_LISTENER, ["x.Missing"]);
        let context = test_context.build();

        assert!(matches!(
            ExtensionRegistry::new().listeners(&context),
            Err(AutoConfigError::UnknownExtension { .. })
        ));
    }
}
