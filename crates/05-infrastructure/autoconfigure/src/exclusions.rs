//! 排除项解析

use config_abstractions::PropertyResolver;
use di_abstractions::ClassResolver;
use infrastructure_common::{AnnotationAttributes, AutoConfigError, AutoConfigResult};
use tracing::{debug, error};

/// 通过环境属性声明排除项的键
pub const EXCLUDE_PROPERTY: &str = "lorn.autoconfigure.exclude";

/// 排除项解析器
///
/// 排除项来自三处：入口注解的 `exclude`、`excludeName` 属性，以及环境属性
/// [`EXCLUDE_PROPERTY`]。合并后按首次出现的顺序去重。
#[derive(Debug, Clone)]
pub struct ExclusionResolver {
    exclude_property: String,
}

impl ExclusionResolver {
    /// 创建解析器
    pub fn new() -> Self {
        Self {
            exclude_property: EXCLUDE_PROPERTY.to_string(),
        }
    }

    /// 使用其他环境属性键
    pub fn with_exclude_property(mut self, key: impl Into<String>) -> Self {
        self.exclude_property = key.into();
        self
    }

    /// 计算排除项
    pub fn exclusions<R: PropertyResolver + ?Sized>(
        &self,
        attributes: &AnnotationAttributes,
        resolver: &R,
    ) -> Vec<String> {
        let mut excluded = Vec::new();
        let sources = [
            attributes.get_string_list("exclude"),
            attributes.get_string_list("excludeName"),
            resolver.get_property_list(&self.exclude_property).unwrap_or_default(),
        ];
        for name in sources.into_iter().flatten() {
            let name = name.trim().to_string();
            if !name.is_empty() && !excluded.contains(&name) {
                excluded.push(name);
            }
        }
        if !excluded.is_empty() {
            debug!("自动装配排除项: {:?}", excluded);
        }
        excluded
    }

    /// 校验排除项
    ///
    /// 排除项是可解析的类但不在候选列表中时视为无效，一次列出全部无效项
    pub fn check_excluded_classes(
        &self,
        candidates: &[String],
        exclusions: &[String],
        class_resolver: &dyn ClassResolver,
    ) -> AutoConfigResult<()> {
        let invalid: Vec<String> = exclusions
            .iter()
            .filter(|exclusion| class_resolver.is_present(exclusion) && !candidates.contains(exclusion))
            .cloned()
            .collect();

        if invalid.is_empty() {
            return Ok(());
        }
        error!("发现 {} 个无效的自动装配排除项: {:?}", invalid.len(), invalid);
        Err(AutoConfigError::InvalidExclusions { exclusions: invalid })
    }
}

impl Default for ExclusionResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config_impl::{MapPropertySource, StandardEnvironment};
    use di_impl::StaticClassResolver;
    use infrastructure_common::AnnotationKind;

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_union_of_all_sources_keeps_first_seen_order() {
        let environment = StandardEnvironment::new().with_source(
            MapPropertySource::new("test").with_property(EXCLUDE_PROPERTY, "x.C, x.A"),
        );
        let attributes = AnnotationAttributes::new(AnnotationKind::EnableAutoConfiguration)
            .with("exclude", vec!["x.B", "x.A"])
            .with("excludeName", vec!["x.D"]);

        let exclusions = ExclusionResolver::new().exclusions(&attributes, &environment);
        assert_eq!(exclusions, names(&["x.B", "x.A", "x.D", "x.C"]));
    }

    #[test]
    fn test_indexed_property_form() {
        let environment = StandardEnvironment::new().with_source(
            MapPropertySource::new("test")
                .with_property("lorn.autoconfigure.exclude[0]", "x.A")
                .with_property("lorn.autoconfigure.exclude[1]", "x.B"),
        );
        let attributes = AnnotationAttributes::new(AnnotationKind::EnableAutoConfiguration);

        assert_eq!(
            ExclusionResolver::new().exclusions(&attributes, &environment),
            names(&["x.A", "x.B"])
        );
    }

    #[test]
    fn test_invalid_exclusions_are_all_listed() {
        let resolver = StaticClassResolver::from_classes(["x.Present1", "x.Present2", "x.Candidate"]);
        let candidates = names(&["x.Candidate"]);
        let exclusions = names(&["x.Present1", "x.Candidate", "x.Unknown", "x.Present2"]);

        let error = ExclusionResolver::new()
            .check_excluded_classes(&candidates, &exclusions, &resolver)
            .unwrap_err();

        match &error {
            AutoConfigError::InvalidExclusions { exclusions } => {
                assert_eq!(exclusions, &names(&["x.Present1", "x.Present2"]));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(error.to_string().contains("\t- x.Present2\n"));
    }

    #[test]
    fn test_unresolvable_exclusion_is_tolerated() {
        let resolver = StaticClassResolver::new();
        assert!(ExclusionResolver::new()
            .check_excluded_classes(&names(&["x.A"]), &names(&["x.Gone"]), &resolver)
            .is_ok());
    }
}
