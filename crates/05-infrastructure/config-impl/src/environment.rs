//! 标准运行环境实现

use config_abstractions::{ApplicationKind, Environment, PropertyResolver, PropertySource};
use std::fmt;
use tracing::debug;

/// 标准运行环境
///
/// 持有按优先级排序的属性源列表，查询时返回第一个包含该键的属性源中的值。
/// 优先级相同的属性源保持添加顺序。
pub struct StandardEnvironment {
    sources: Vec<Box<dyn PropertySource>>,
    application_kind: ApplicationKind,
}

impl fmt::Debug for StandardEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StandardEnvironment")
            .field(
                "sources",
                &self.sources.iter().map(|s| s.name()).collect::<Vec<_>>(),
            )
            .field("application_kind", &self.application_kind)
            .finish()
    }
}

impl StandardEnvironment {
    /// 创建空的运行环境
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
            application_kind: ApplicationKind::Standard,
        }
    }

    /// 添加属性源
    pub fn with_source(mut self, source: impl PropertySource + 'static) -> Self {
        self.add_source(Box::new(source));
        self
    }

    /// 设置应用类型
    pub fn with_application_kind(mut self, kind: ApplicationKind) -> Self {
        self.application_kind = kind;
        self
    }

    /// 添加属性源并按优先级重新排序
    pub fn add_source(&mut self, source: Box<dyn PropertySource>) {
        debug!("添加属性源: {} (优先级: {})", source.name(), source.priority());
        self.sources.push(source);
        self.sources.sort_by_key(|s| std::cmp::Reverse(s.priority()));
    }

    /// 获取属性源名称（按查询顺序）
    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }
}

impl Default for StandardEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

impl PropertyResolver for StandardEnvironment {
    fn contains_property(&self, key: &str) -> bool {
        self.sources.iter().any(|s| s.contains_property(key))
    }

    fn get_property(&self, key: &str) -> Option<String> {
        self.sources.iter().find_map(|s| s.get_property(key))
    }
}

impl Environment for StandardEnvironment {
    fn application_kind(&self) -> ApplicationKind {
        self.application_kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::MapPropertySource;

    #[test]
    fn test_higher_priority_source_wins() {
        let environment = StandardEnvironment::new()
            .with_source(
                MapPropertySource::new("defaults")
                    .with_property("feature.enabled", "false")
                    .with_property("only.default", "yes"),
            )
            .with_source(
                MapPropertySource::new("overrides")
                    .with_property("feature.enabled", "true")
                    .with_priority(10),
            );

        assert_eq!(environment.source_names(), vec!["overrides", "defaults"]);
        assert_eq!(environment.get_property("feature.enabled").as_deref(), Some("true"));
        assert_eq!(environment.get_property("only.default").as_deref(), Some("yes"));
        assert!(!environment.contains_property("absent"));
    }

    #[test]
    fn test_equal_priority_keeps_insertion_order() {
        let environment = StandardEnvironment::new()
            .with_source(MapPropertySource::new("first").with_property("k", "1"))
            .with_source(MapPropertySource::new("second").with_property("k", "2"));

        assert_eq!(environment.get_property("k").as_deref(), Some("1"));
    }

    #[test]
    fn test_application_kind() {
        let environment = StandardEnvironment::new();
        assert_eq!(environment.application_kind(), ApplicationKind::Standard);

        let environment = environment.with_application_kind(ApplicationKind::Reactive);
        assert_eq!(environment.application_kind(), ApplicationKind::Reactive);
    }

    #[test]
    fn test_property_list_through_environment() {
        let environment = StandardEnvironment::new().with_source(
            MapPropertySource::new("m")
                .with_property("lorn.autoconfigure.exclude[0]", "a.A")
                .with_property("lorn.autoconfigure.exclude[1]", "b.B"),
        );

        assert_eq!(
            environment.get_property_list("lorn.autoconfigure.exclude"),
            Some(vec!["a.A".to_string(), "b.B".to_string()])
        );
    }
}
