//! 属性条件

use super::message::{ConditionMessage, ConditionOutcome, Style};
use super::FilteringCondition;
use crate::context::AutoConfigurationContext;
use crate::metadata::AutoConfigurationMetadata;
use config_abstractions::PropertyResolver;
use infrastructure_common::{AnnotationAttributes, AnnotationKind, AutoConfigError, AutoConfigResult};
use std::fmt;

/// 单个 `ConditionalOnProperty` 声明
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyConditionSpec {
    /// 属性前缀（非空时以 `.` 结尾）
    pub prefix: String,
    /// 属性名称
    pub names: Vec<String>,
    /// 期望值，为空时只要求值不为 `false`
    pub having_value: String,
    /// 属性缺失时是否视为匹配
    pub match_if_missing: bool,
}

impl PropertyConditionSpec {
    /// 创建属性条件
    pub fn new(
        class_name: &str,
        prefix: &str,
        names: Vec<String>,
        having_value: impl Into<String>,
        match_if_missing: bool,
    ) -> AutoConfigResult<Self> {
        if names.is_empty() {
            return Err(AutoConfigError::invalid_attribute(
                class_name,
                AnnotationKind::ConditionalOnProperty.to_string(),
                "必须指定 name 或 value 属性",
            ));
        }

        let prefix = prefix.trim();
        let prefix = if prefix.is_empty() || prefix.ends_with('.') {
            prefix.to_string()
        } else {
            format!("{}.", prefix)
        };

        Ok(Self {
            prefix,
            names,
            having_value: having_value.into(),
            match_if_missing,
        })
    }

    /// 从注解属性构建
    ///
    /// `value` 与 `name` 必须且只能指定其中一个
    pub fn from_attributes(class_name: &str, attributes: &AnnotationAttributes) -> AutoConfigResult<Self> {
        let value = attributes.get_string_list("value");
        let name = attributes.get_string_list("name");
        if !value.is_empty() && !name.is_empty() {
            return Err(AutoConfigError::invalid_attribute(
                class_name,
                AnnotationKind::ConditionalOnProperty.to_string(),
                "name 与 value 属性不能同时指定",
            ));
        }
        let names = if value.is_empty() { name } else { value };

        Self::new(
            class_name,
            attributes.get_string("prefix").unwrap_or_default(),
            names,
            attributes.get_string("havingValue").unwrap_or_default(),
            attributes.get_boolean("matchIfMissing").unwrap_or(false),
        )
    }

    /// 从预编译索引构建，索引中没有属性条件时返回 `None`
    pub fn from_index(class_name: &str, index: &AutoConfigurationMetadata) -> AutoConfigResult<Option<Self>> {
        let Some(names) = index.get_set(class_name, "ConditionalOnProperty.name") else {
            return Ok(None);
        };

        let match_if_missing = match index.get(class_name, "ConditionalOnProperty.matchIfMissing") {
            None => false,
            Some(value) => match value.trim().to_ascii_lowercase().as_str() {
                "true" => true,
                "false" | "" => false,
                other => {
                    return Err(AutoConfigError::invalid_attribute(
                        class_name,
                        "ConditionalOnProperty.matchIfMissing",
                        format!("'{}' 不是有效的布尔值", other),
                    ))
                }
            },
        };

        Self::new(
            class_name,
            index.get_or(class_name, "ConditionalOnProperty.prefix", ""),
            names,
            index.get_or(class_name, "ConditionalOnProperty.havingValue", ""),
            match_if_missing,
        )
        .map(Some)
    }

    /// 评估条件
    pub fn evaluate<R: PropertyResolver + ?Sized>(&self, resolver: &R) -> ConditionOutcome {
        let mut missing = Vec::new();
        let mut non_matching = Vec::new();

        for name in &self.names {
            let key = format!("{}{}", self.prefix, name);
            match resolver.get_property(&key) {
                Some(value) => {
                    if !self.is_match(&value) {
                        non_matching.push(name.clone());
                    }
                }
                None => {
                    if !self.match_if_missing {
                        missing.push(name.clone());
                    }
                }
            }
        }

        let builder = || ConditionMessage::for_condition_with_details(AnnotationKind::ConditionalOnProperty, self);
        if !missing.is_empty() {
            return ConditionOutcome::no_match(
                builder()
                    .did_not_find("property", "properties")
                    .items(Style::Quote, missing),
            );
        }
        if !non_matching.is_empty() {
            return ConditionOutcome::no_match(
                builder()
                    .found("different value in property", "different value in properties")
                    .items(Style::Quote, non_matching),
            );
        }
        ConditionOutcome::matched(builder().because("matched"))
    }

    fn is_match(&self, value: &str) -> bool {
        if self.having_value.is_empty() {
            !value.eq_ignore_ascii_case("false")
        } else {
            value.eq_ignore_ascii_case(&self.having_value)
        }
    }
}

impl fmt::Display for PropertyConditionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}", self.prefix)?;
        if self.names.len() == 1 {
            write!(f, "{}", self.names[0])?;
        } else {
            write!(f, "[{}]", self.names.join(", "))?;
        }
        if !self.having_value.is_empty() {
            write!(f, "={}", self.having_value)?;
        }
        write!(f, ")")
    }
}

/// 属性条件
///
/// 同一个类上的多个属性条件全部匹配才算匹配，遇到第一个不匹配即返回
#[derive(Debug, Clone, Copy, Default)]
pub struct OnPropertyCondition;

impl OnPropertyCondition {
    /// 条件名称
    pub const NAME: &'static str = "OnPropertyCondition";

    /// 评估一组属性条件
    pub fn determine_outcome<R: PropertyResolver + ?Sized>(
        specs: &[PropertyConditionSpec],
        resolver: &R,
    ) -> Option<ConditionOutcome> {
        if specs.is_empty() {
            return None;
        }

        let mut message = ConditionMessage::empty();
        for spec in specs {
            let outcome = spec.evaluate(resolver);
            if !outcome.is_match {
                return Some(outcome);
            }
            message = if message.is_empty() {
                outcome.message
            } else {
                ConditionMessage::of(format!("{}; {}", message, outcome.message))
            };
        }
        Some(ConditionOutcome::matched(message))
    }
}

impl FilteringCondition for OnPropertyCondition {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn get_outcomes(
        &self,
        candidates: &[Option<&str>],
        context: &AutoConfigurationContext,
    ) -> AutoConfigResult<Vec<Option<ConditionOutcome>>> {
        let mut outcomes = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let outcome = match candidate {
                Some(class_name) => context
                    .metadata()
                    .entry(class_name)?
                    .and_then(|entry| Self::determine_outcome(&entry.property_conditions, context.environment())),
                None => None,
            };
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::AutoConfigurationImportFilter;
    use crate::context::test_support::TestContext;
    use infrastructure_common::ClassMetadata;

    fn spec(prefix: &str, name: &str, having_value: &str, match_if_missing: bool) -> PropertyConditionSpec {
        PropertyConditionSpec::new("x.Conf", prefix, vec![name.to_string()], having_value, match_if_missing).unwrap()
    }

    #[test]
    fn test_prefix_is_normalised() {
        assert_eq!(spec(" feature ", "enabled", "", false).prefix, "feature.");
        assert_eq!(spec("feature.", "enabled", "", false).prefix, "feature.");
        assert_eq!(spec("", "enabled", "", false).prefix, "");
    }

    #[test]
    fn test_missing_property_without_match_if_missing() {
        let context = TestContext::new().build();
        let outcome = spec("feature.", "enabled", "", false).evaluate(context.environment());

        assert!(!outcome.is_match);
        assert_eq!(
            outcome.message.as_str(),
            "@ConditionalOnProperty (feature.enabled) did not find property 'enabled'"
        );
    }

    #[test]
    fn test_match_if_missing() {
        let context = TestContext::new().build();
        assert!(spec("feature", "enabled", "", true).evaluate(context.environment()).is_match);
    }

    #[test]
    fn test_truthy_and_having_value() {
        let context = TestContext::new()
            .property("feature.enabled", "FALSE")
            .property("feature.mode", "Fast")
            .property("feature.other", "anything")
            .build();
        let environment = context.environment();

        assert!(!spec("feature", "enabled", "", false).evaluate(environment).is_match);
        assert!(spec("feature", "other", "", false).evaluate(environment).is_match);
        assert!(spec("feature", "mode", "fast", false).evaluate(environment).is_match);

        let different = spec("feature", "mode", "slow", false).evaluate(environment);
        assert!(!different.is_match);
        assert!(different.message.as_str().contains("found different value in property 'mode'"));
    }

    #[test]
    fn test_name_and_value_are_exclusive() {
        let both = AnnotationAttributes::new(AnnotationKind::ConditionalOnProperty)
            .with("value", "a")
            .with("name", "b");
        assert!(matches!(
            PropertyConditionSpec::from_attributes("x.Conf", &both),
            Err(AutoConfigError::InvalidAttribute { .. })
        ));

        let neither = AnnotationAttributes::new(AnnotationKind::ConditionalOnProperty).with("prefix", "a");
        assert!(PropertyConditionSpec::from_attributes("x.Conf", &neither).is_err());
    }

    #[test]
    fn test_any_failing_declaration_fails_the_class() {
        let context = TestContext::new()
            .property("a.enabled", "true")
            .metadata(
                ClassMetadata::new("x.Conf")
                    .with_annotation(
                        AnnotationAttributes::new(AnnotationKind::ConditionalOnProperty)
                            .with("prefix", "a")
                            .with("name", "enabled"),
                    )
                    .with_annotation(
                        AnnotationAttributes::new(AnnotationKind::ConditionalOnProperty)
                            .with("prefix", "b")
                            .with("name", "enabled"),
                    ),
            )
            .metadata(ClassMetadata::new("x.Free"))
            .build();

        let matches = OnPropertyCondition
            .matches(&[Some("x.Conf"), Some("x.Free"), None], &context)
            .unwrap();
        assert_eq!(matches, vec![false, true, true]);
    }

    #[test]
    fn test_index_declaration() {
        let context = TestContext::new()
            .index(
                "x.Indexed.ConditionalOnProperty.prefix=feature\n\
                 x.Indexed.ConditionalOnProperty.name=enabled\n\
                 x.Indexed.ConditionalOnProperty.havingValue=on\n",
            )
            .property("feature.enabled", "on")
            .build();

        let outcomes = OnPropertyCondition.get_outcomes(&[Some("x.Indexed")], &context).unwrap();
        assert!(outcomes[0].as_ref().unwrap().is_match);
        assert_eq!(
            outcomes[0].as_ref().unwrap().message.as_str(),
            "@ConditionalOnProperty (feature.enabled=on) matched"
        );
    }
}
