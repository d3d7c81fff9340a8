//! 自动装配导入选择器

use crate::condition::ConfigurationClassFilter;
use crate::context::AutoConfigurationContext;
use crate::events::AutoConfigurationImportEvent;
use crate::exclusions::ExclusionResolver;
use crate::extensions::ExtensionRegistry;
use di_abstractions::ENABLE_AUTO_CONFIGURATION;
use infrastructure_common::{AnnotationAttributes, AnnotationKind, AutoConfigError, AutoConfigResult, ClassMetadata};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;
use tracing::{debug, info, trace};

/// 全局开关属性，设为 `false` 时不导入任何自动装配类
pub const ENABLED_OVERRIDE_PROPERTY: &str = "lorn.boot.enableautoconfiguration";

/// 单个入口的选择结果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoConfigurationEntry {
    /// 保留的自动装配类，按候选顺序
    pub configurations: Vec<String>,
    /// 排除项
    pub exclusions: Vec<String>,
}

impl AutoConfigurationEntry {
    /// 空结果
    pub fn empty() -> Self {
        Self::default()
    }

    /// 创建结果
    pub fn new(configurations: Vec<String>, exclusions: Vec<String>) -> Self {
        Self {
            configurations,
            exclusions,
        }
    }
}

/// 自动装配导入选择器
///
/// 对一个标注了 `EnableAutoConfiguration` 的入口，依次完成：读取候选类、去重、
/// 计算并校验排除项、执行过滤链、触发导入事件
pub struct AutoConfigurationImportSelector {
    context: AutoConfigurationContext,
    extensions: ExtensionRegistry,
    exclusion_resolver: ExclusionResolver,
    filter: OnceCell<ConfigurationClassFilter>,
}

impl fmt::Debug for AutoConfigurationImportSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AutoConfigurationImportSelector")
            .field("context", &self.context)
            .field("extensions", &self.extensions)
            .field("filter", &self.filter.get().map(|filter| filter.filter_names()))
            .finish()
    }
}

impl AutoConfigurationImportSelector {
    /// 创建选择器，使用内置扩展
    pub fn new(context: AutoConfigurationContext) -> Self {
        Self {
            context,
            extensions: ExtensionRegistry::new(),
            exclusion_resolver: ExclusionResolver::new(),
            filter: OnceCell::new(),
        }
    }

    /// 使用自定义扩展注册表
    pub fn with_extensions(mut self, extensions: ExtensionRegistry) -> Self {
        self.extensions = extensions;
        self
    }

    /// 使用自定义排除项解析器
    pub fn with_exclusion_resolver(mut self, resolver: ExclusionResolver) -> Self {
        self.exclusion_resolver = resolver;
        self
    }

    /// 上下文
    pub fn context(&self) -> &AutoConfigurationContext {
        &self.context
    }

    /// 选择要导入的自动装配类
    pub fn select_imports(&self, entry_point: &ClassMetadata) -> AutoConfigResult<Vec<String>> {
        Ok(self.auto_configuration_entry(entry_point)?.configurations)
    }

    /// 自动装配是否开启
    pub fn is_enabled(&self) -> AutoConfigResult<bool> {
        Ok(self
            .context
            .environment()
            .get_bool(ENABLED_OVERRIDE_PROPERTY, true)?)
    }

    /// 计算入口的选择结果
    pub fn auto_configuration_entry(&self, entry_point: &ClassMetadata) -> AutoConfigResult<AutoConfigurationEntry> {
        if !self.is_enabled()? {
            info!("自动装配已通过 {} 关闭", ENABLED_OVERRIDE_PROPERTY);
            return Ok(AutoConfigurationEntry::empty());
        }

        let start = Instant::now();
        let attributes = self.attributes(entry_point)?;
        let candidates = remove_duplicates(self.candidate_configurations()?);
        debug!("{} 读取到 {} 个候选自动装配类", entry_point.class_name, candidates.len());

        let exclusions = self
            .exclusion_resolver
            .exclusions(attributes, self.context.environment());
        self.exclusion_resolver
            .check_excluded_classes(&candidates, &exclusions, self.context.class_resolver())?;

        let remaining: Vec<String> = candidates
            .into_iter()
            .filter(|candidate| !exclusions.contains(candidate))
            .collect();
        let configurations = self.configuration_class_filter()?.filter(remaining, &self.context)?;

        self.fire_import_events(&entry_point.class_name, &configurations, &exclusions)?;
        info!(
            "{} 选出 {} 个自动装配类，排除 {} 个，耗时 {:?}",
            entry_point.class_name,
            configurations.len(),
            exclusions.len(),
            start.elapsed()
        );
        Ok(AutoConfigurationEntry::new(configurations, exclusions))
    }

    /// 单个类是否会被过滤链排除
    pub fn should_exclude(&self, class_name: &str) -> AutoConfigResult<bool> {
        Ok(self
            .configuration_class_filter()?
            .filter(vec![class_name.to_string()], &self.context)?
            .is_empty())
    }

    /// 读取扩展点清单中的全部候选类
    pub fn candidate_configurations(&self) -> AutoConfigResult<Vec<String>> {
        let candidates = self.context.factories().load_factory_names(ENABLE_AUTO_CONFIGURATION);
        if candidates.is_empty() {
            return Err(AutoConfigError::NoCandidates {
                extension_point: ENABLE_AUTO_CONFIGURATION.to_string(),
            });
        }
        Ok(candidates)
    }

    fn attributes<'a>(&self, entry_point: &'a ClassMetadata) -> AutoConfigResult<&'a AnnotationAttributes> {
        entry_point
            .annotation(AnnotationKind::EnableAutoConfiguration)
            .ok_or_else(|| AutoConfigError::MissingAttributes {
                class_name: entry_point.class_name.clone(),
                annotation: AnnotationKind::EnableAutoConfiguration.to_string(),
            })
    }

    fn configuration_class_filter(&self) -> AutoConfigResult<&ConfigurationClassFilter> {
        self.filter.get_or_try_init(|| {
            let filters = self.extensions.filters(&self.context)?;
            let filter = ConfigurationClassFilter::new(filters);
            debug!("自动装配过滤链: {:?}", filter.filter_names());
            Ok(filter)
        })
    }

    fn fire_import_events(&self, source: &str, configurations: &[String], exclusions: &[String]) -> AutoConfigResult<()> {
        let listeners = self.extensions.listeners(&self.context)?;
        if listeners.is_empty() {
            return Ok(());
        }
        let event = AutoConfigurationImportEvent::new(source, configurations.to_vec(), exclusions.to_vec());
        for listener in listeners {
            trace!("触发自动装配导入事件: {}", listener.name());
            listener.on_auto_configuration_import_event(&event)?;
        }
        Ok(())
    }
}

/// 去重，保留第一次出现的位置
pub fn remove_duplicates(names: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    names.into_iter().filter(|name| seen.insert(name.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::test_support::TestContext;
    use di_impl::PropertiesFactoriesLoader;

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn entry_point() -> ClassMetadata {
        ClassMetadata::new("x.App").with_annotation(AnnotationAttributes::new(AnnotationKind::EnableAutoConfiguration))
    }

    fn with_candidates(candidates: &[&str]) -> TestContext {
        let mut context = TestContext::new();
        context.factories =
            PropertiesFactoriesLoader::new().with_factories(ENABLE_AUTO_CONFIGURATION, candidates.iter().copied());
        context
    }

    #[test]
    fn test_remove_duplicates_keeps_first_seen_order() {
        assert_eq!(
            remove_duplicates(names(&["B", "A", "B", "C"])),
            names(&["B", "A", "C"])
        );
    }

    #[test]
    fn test_entry_with_exclusions_and_filtering() {
        let context = with_candidates(&["x.AutoConf1", "x.AutoConf2", "x.AutoConf3"])
            .class("x.AutoConf3")
            .index("x.AutoConf1.ConditionalOnClass=com.missing.Lib\nx.AutoConf2=\n")
            .property("lorn.autoconfigure.exclude", "x.AutoConf3")
            .build();
        let selector = AutoConfigurationImportSelector::new(context);

        let entry = selector.auto_configuration_entry(&entry_point()).unwrap();
        assert_eq!(entry.configurations, names(&["x.AutoConf2"]));
        assert_eq!(entry.exclusions, names(&["x.AutoConf3"]));

        let report = selector.context().report().unwrap();
        assert_eq!(report.exclusions(), names(&["x.AutoConf3"]));
        assert!(report.condition_outcomes_for("x.AutoConf1").is_some());
    }

    #[test]
    fn test_disabled_returns_empty_entry() {
        let context = with_candidates(&["x.A"])
            .property(ENABLED_OVERRIDE_PROPERTY, "false")
            .build();
        let selector = AutoConfigurationImportSelector::new(context);

        assert!(!selector.is_enabled().unwrap());
        assert!(selector.select_imports(&entry_point()).unwrap().is_empty());
    }

    #[test]
    fn test_entry_point_must_carry_attributes() {
        let selector = AutoConfigurationImportSelector::new(with_candidates(&["x.A"]).build());
        assert!(matches!(
            selector.auto_configuration_entry(&ClassMetadata::new("x.Plain")),
            Err(AutoConfigError::MissingAttributes { .. })
        ));
    }

    #[test]
    fn test_empty_candidates_are_fatal() {
        let selector = AutoConfigurationImportSelector::new(TestContext::new().build());
        assert!(matches!(
            selector.select_imports(&entry_point()),
            Err(AutoConfigError::NoCandidates { .. })
        ));
    }

    #[test]
    fn test_invalid_exclusion() {
        let context = with_candidates(&["x.A"]).class("x.NotAuto").build();
        let selector = AutoConfigurationImportSelector::new(context);
        let entry_point = ClassMetadata::new("x.App").with_annotation(
            AnnotationAttributes::new(AnnotationKind::EnableAutoConfiguration).with("exclude", vec!["x.NotAuto"]),
        );

        assert!(matches!(
            selector.select_imports(&entry_point),
            Err(AutoConfigError::InvalidExclusions { .. })
        ));
    }

    #[test]
    fn test_should_exclude() {
        let context = with_candidates(&["x.A"])
            .index("x.Web.ConditionalOnClass=x.Missing\nx.Core=\n")
            .build();
        let selector = AutoConfigurationImportSelector::new(context);

        assert!(selector.should_exclude("x.Web").unwrap());
        assert!(!selector.should_exclude("x.Core").unwrap());
    }
}
