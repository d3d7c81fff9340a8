//! 组件条件
//!
//! 支持三种声明：
//! - `ConditionalOnBean` 要求所有声明的类型、名称、注解都能找到组件
//! - `ConditionalOnMissingBean` 要求一个都找不到
//! - `ConditionalOnSingleCandidate` 要求找到且只有一个候选（或候选中恰好一个首选组件）

use super::message::{ConditionMessage, ConditionOutcome, Style};
use super::{presence, unresolved, FilteringCondition, Presence};
use crate::context::AutoConfigurationContext;
use crate::metadata::AutoConfigurationMetadataEntry;
use di_abstractions::{BeanRegistry, SCOPED_TARGET_PREFIX};
use infrastructure_common::{AnnotationAttributes, AnnotationKind, AutoConfigError, AutoConfigResult};
use std::fmt;
use std::sync::Arc;

/// 组件条件种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeanConditionKind {
    /// 要求组件存在
    OnBean,
    /// 要求唯一候选组件
    OnSingleCandidate,
    /// 要求组件不存在
    OnMissingBean,
}

impl BeanConditionKind {
    /// 全部种类，按评估顺序排列
    pub const ALL: [BeanConditionKind; 3] = [Self::OnBean, Self::OnSingleCandidate, Self::OnMissingBean];

    /// 对应的注解
    pub fn annotation(&self) -> AnnotationKind {
        match self {
            Self::OnBean => AnnotationKind::ConditionalOnBean,
            Self::OnSingleCandidate => AnnotationKind::ConditionalOnSingleCandidate,
            Self::OnMissingBean => AnnotationKind::ConditionalOnMissingBean,
        }
    }
}

/// 组件搜索策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchStrategy {
    /// 只搜索当前注册表
    Current,
    /// 只搜索祖先注册表
    Ancestors,
    /// 搜索整个层级
    #[default]
    All,
}

impl SearchStrategy {
    /// 解析策略名称（忽略大小写）
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "CURRENT" => Some(Self::Current),
            "ANCESTORS" => Some(Self::Ancestors),
            "ALL" | "" => Some(Self::All),
            _ => None,
        }
    }
}

/// 单个组件条件声明
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeanConditionSpec {
    /// 声明所在的类
    pub class_name: String,
    /// 种类
    pub kind: BeanConditionKind,
    /// 组件类型
    pub types: Vec<String>,
    /// 组件名称
    pub names: Vec<String>,
    /// 组件注解
    pub annotations: Vec<String>,
    /// 忽略的组件类型
    pub ignored_types: Vec<String>,
    /// 搜索策略
    pub strategy: SearchStrategy,
}

impl BeanConditionSpec {
    /// 从注解属性构建并校验
    pub fn from_attributes(
        class_name: &str,
        kind: BeanConditionKind,
        attributes: &AnnotationAttributes,
    ) -> AutoConfigResult<Self> {
        let annotation = kind.annotation().to_string();

        let mut types = merge(&[attributes.get_string_list("value"), attributes.get_string_list("type")]);
        if kind == BeanConditionKind::OnSingleCandidate {
            types.retain(|t| !t.trim().is_empty());
        }

        let strategy = match attributes.get_string("search") {
            None => SearchStrategy::All,
            Some(value) => SearchStrategy::parse(value).ok_or_else(|| {
                AutoConfigError::invalid_attribute(class_name, &annotation, format!("未知的搜索策略 '{}'", value))
            })?,
        };

        let spec = Self {
            class_name: class_name.to_string(),
            kind,
            types,
            names: attributes.get_string_list("name"),
            annotations: attributes.get_string_list("annotation"),
            ignored_types: merge(&[
                attributes.get_string_list("ignored"),
                attributes.get_string_list("ignoredType"),
            ]),
            strategy,
        };
        spec.validate()?;
        Ok(spec)
    }

    fn validate(&self) -> AutoConfigResult<()> {
        let annotation = self.kind.annotation().to_string();
        match self.kind {
            BeanConditionKind::OnSingleCandidate => {
                if self.types.len() != 1 {
                    return Err(AutoConfigError::invalid_attribute(
                        &self.class_name,
                        annotation,
                        format!("必须且只能指定一个类型（当前: {}）", self.types.join(", ")),
                    ));
                }
            }
            _ => {
                if self.types.is_empty() && self.names.is_empty() && self.annotations.is_empty() {
                    return Err(AutoConfigError::invalid_attribute(
                        &self.class_name,
                        annotation,
                        "没有通过类型、名称或注解指定任何组件",
                    ));
                }
            }
        }
        Ok(())
    }

    fn message(&self) -> super::message::ConditionMessageBuilder {
        ConditionMessage::for_condition_with_details(self.kind.annotation(), self)
    }

    fn message_after(&self, message: ConditionMessage) -> super::message::ConditionMessageBuilder {
        message.and_condition_with_details(self.kind.annotation(), self)
    }
}

impl fmt::Display for BeanConditionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if !self.names.is_empty() {
            parts.push(format!("names: {}", self.names.join(",")));
        }
        if !self.types.is_empty() {
            parts.push(format!("types: {}", self.types.join(",")));
        }
        if !self.ignored_types.is_empty() {
            parts.push(format!("ignored: {}", self.ignored_types.join(",")));
        }
        if !self.annotations.is_empty() {
            parts.push(format!("annotations: {}", self.annotations.join(",")));
        }
        let strategy = match self.strategy {
            SearchStrategy::Current => "current",
            SearchStrategy::Ancestors => "ancestors",
            SearchStrategy::All => "all",
        };
        parts.push(format!("SearchStrategy: {}", strategy));
        write!(f, "({})", parts.join("; "))
    }
}

fn merge(lists: &[Vec<String>]) -> Vec<String> {
    let mut merged = Vec::new();
    for list in lists {
        for item in list {
            if !merged.contains(item) {
                merged.push(item.clone());
            }
        }
    }
    merged
}

fn add_unique(target: &mut Vec<String>, items: impl IntoIterator<Item = String>) {
    for item in items {
        if !target.contains(&item) {
            target.push(item);
        }
    }
}

/// 组件匹配结果
#[derive(Debug, Default)]
struct MatchResult {
    matched_annotations: Vec<(String, Vec<String>)>,
    matched_names: Vec<String>,
    matched_types: Vec<(String, Vec<String>)>,
    unmatched_annotations: Vec<String>,
    unmatched_names: Vec<String>,
    unmatched_types: Vec<String>,
    names_of_all_matches: Vec<String>,
}

impl MatchResult {
    fn record_matched_name(&mut self, name: &str) {
        self.matched_names.push(name.to_string());
        add_unique(&mut self.names_of_all_matches, [name.to_string()]);
    }

    fn record_matched_annotation(&mut self, annotation: &str, names: Vec<String>) {
        add_unique(&mut self.names_of_all_matches, names.iter().cloned());
        self.matched_annotations.push((annotation.to_string(), names));
    }

    fn record_matched_type(&mut self, type_name: &str, names: Vec<String>) {
        add_unique(&mut self.names_of_all_matches, names.iter().cloned());
        self.matched_types.push((type_name.to_string(), names));
    }

    fn is_all_matched(&self) -> bool {
        self.unmatched_annotations.is_empty() && self.unmatched_names.is_empty() && self.unmatched_types.is_empty()
    }

    fn is_any_matched(&self) -> bool {
        !self.matched_annotations.is_empty() || !self.matched_names.is_empty() || !self.matched_types.is_empty()
    }

    fn on_bean_no_match_reason(&self) -> String {
        let mut reasons = Vec::new();
        let mut describe = |unmatched: &[String], description: &str| {
            if !unmatched.is_empty() {
                reasons.push(format!("did not find any beans {} {}", description, unmatched.join(", ")));
            }
        };
        describe(&self.unmatched_annotations, "annotated with");
        describe(&self.unmatched_types, "of type");
        describe(&self.unmatched_names, "named");
        reasons.join(" and ")
    }

    fn on_missing_bean_no_match_reason(&self) -> String {
        let mut reasons = Vec::new();
        for (annotation, names) in &self.matched_annotations {
            reasons.push(format!("found beans annotated with '{}' {}", annotation, names.join(", ")));
        }
        for (type_name, names) in &self.matched_types {
            reasons.push(format!("found beans of type '{}' {}", type_name, names.join(", ")));
        }
        if !self.matched_names.is_empty() {
            reasons.push(format!("found beans named {}", self.matched_names.join(", ")));
        }
        reasons.join(" and ")
    }
}

/// 组件条件
///
/// 先确认引用的组件类型可解析，再对已构建的注册表执行只读查询
#[derive(Debug, Clone, Copy, Default)]
pub struct OnBeanCondition;

impl OnBeanCondition {
    /// 条件名称
    pub const NAME: &'static str = "OnBeanCondition";

    /// 评估一组组件条件
    ///
    /// 依次评估 `OnBean`、`OnSingleCandidate`、`OnMissingBean`，任一不匹配立即返回
    pub fn evaluate(
        specs: &[BeanConditionSpec],
        context: &AutoConfigurationContext,
    ) -> AutoConfigResult<Option<ConditionOutcome>> {
        if specs.is_empty() {
            return Ok(None);
        }

        let mut message = ConditionMessage::empty();
        for kind in BeanConditionKind::ALL {
            for spec in specs.iter().filter(|s| s.kind == kind) {
                let result = get_matching_beans(spec, context.registry())?;
                message = match kind {
                    BeanConditionKind::OnBean => {
                        if !result.is_all_matched() {
                            return Ok(Some(ConditionOutcome::no_match(
                                spec.message().because(result.on_bean_no_match_reason()),
                            )));
                        }
                        spec.message_after(message)
                            .found("bean", "beans")
                            .items(Style::Quote, &result.names_of_all_matches)
                    }
                    BeanConditionKind::OnSingleCandidate => {
                        if !result.is_all_matched() {
                            return Ok(Some(ConditionOutcome::no_match(
                                spec.message().did_not_find_one("any beans").at_all(),
                            )));
                        }
                        let consider_hierarchy = spec.strategy == SearchStrategy::All;
                        if !has_single_autowire_candidate(context.registry(), &result.names_of_all_matches, consider_hierarchy) {
                            return Ok(Some(ConditionOutcome::no_match(
                                spec.message()
                                    .did_not_find_one("a primary bean from beans")
                                    .items(Style::Quote, &result.names_of_all_matches),
                            )));
                        }
                        spec.message_after(message)
                            .found_one("a primary bean from beans")
                            .items(Style::Quote, &result.names_of_all_matches)
                    }
                    BeanConditionKind::OnMissingBean => {
                        if result.is_any_matched() {
                            return Ok(Some(ConditionOutcome::no_match(
                                spec.message().because(result.on_missing_bean_no_match_reason()),
                            )));
                        }
                        spec.message_after(message).did_not_find_one("any beans").at_all()
                    }
                };
            }
        }
        Ok(Some(ConditionOutcome::matched(message)))
    }
}

impl FilteringCondition for OnBeanCondition {
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
            let Some(class_name) = candidate else {
                outcomes.push(None);
                continue;
            };
            let Some(entry) = context.metadata().entry(class_name)? else {
                outcomes.push(None);
                continue;
            };

            let outcome = match required_types(class_name, &entry, context) {
                RequiredTypes::Resolved => Self::evaluate(&entry.bean_conditions, context)?,
                RequiredTypes::Missing(outcome) => Some(outcome),
                RequiredTypes::Unresolved => None,
            };
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }
}

/// 引用组件类型的解析结果
enum RequiredTypes {
    Resolved,
    Missing(ConditionOutcome),
    Unresolved,
}

/// 引用的组件类型必须先能被解析，无法链接的类型不给出结论
fn required_types(
    class_name: &str,
    entry: &AutoConfigurationMetadataEntry,
    context: &AutoConfigurationContext,
) -> RequiredTypes {
    let declarations = [
        (&entry.on_bean_types, AnnotationKind::ConditionalOnBean),
        (&entry.on_single_candidate_types, AnnotationKind::ConditionalOnSingleCandidate),
    ];
    for (types, annotation) in declarations {
        let mut missing = Vec::new();
        for type_name in types {
            match presence(type_name, context) {
                Presence::Present => {}
                Presence::Missing => missing.push(type_name),
                Presence::Unresolved(message) => {
                    unresolved(class_name, type_name, &message, context);
                    return RequiredTypes::Unresolved;
                }
            }
        }
        if !missing.is_empty() {
            return RequiredTypes::Missing(ConditionOutcome::no_match(
                ConditionMessage::for_condition(annotation)
                    .did_not_find("required type", "required types")
                    .items(Style::Quote, missing),
            ));
        }
    }
    RequiredTypes::Resolved
}

fn get_matching_beans(spec: &BeanConditionSpec, registry: &Arc<dyn BeanRegistry>) -> AutoConfigResult<MatchResult> {
    let consider_hierarchy = spec.strategy != SearchStrategy::Current;
    let registry = if spec.strategy == SearchStrategy::Ancestors {
        registry.parent().ok_or_else(|| AutoConfigError::InvalidSearchStrategy {
            class_name: spec.class_name.clone(),
            message: "注册表没有父级，无法使用 ANCESTORS 搜索策略".to_string(),
        })?
    } else {
        registry.clone()
    };

    let mut result = MatchResult::default();
    let mut ignored = Vec::new();
    for ignored_type in &spec.ignored_types {
        add_unique(&mut ignored, bean_names_for_type(&registry, ignored_type, consider_hierarchy));
    }

    for type_name in &spec.types {
        let matches: Vec<String> = bean_names_for_type(&registry, type_name, consider_hierarchy)
            .into_iter()
            .filter(|name| !ignored.contains(name) && !name.starts_with(SCOPED_TARGET_PREFIX))
            .collect();
        if matches.is_empty() {
            result.unmatched_types.push(type_name.clone());
        } else {
            result.record_matched_type(type_name, matches);
        }
    }

    for annotation in &spec.annotations {
        let matches: Vec<String> = bean_names_for_annotation(&registry, annotation, consider_hierarchy)
            .into_iter()
            .filter(|name| !ignored.contains(name))
            .collect();
        if matches.is_empty() {
            result.unmatched_annotations.push(annotation.clone());
        } else {
            result.record_matched_annotation(annotation, matches);
        }
    }

    for name in &spec.names {
        let found = if consider_hierarchy {
            registry.contains_bean(name)
        } else {
            registry.contains_local_bean(name)
        };
        if !ignored.contains(name) && found {
            result.record_matched_name(name);
        } else {
            result.unmatched_names.push(name.clone());
        }
    }

    Ok(result)
}

/// 沿层级向上收集，先当前注册表后祖先
fn collect_hierarchy(
    registry: &Arc<dyn BeanRegistry>,
    consider_hierarchy: bool,
    lookup: impl Fn(&dyn BeanRegistry) -> Vec<String>,
) -> Vec<String> {
    let mut names = lookup(registry.as_ref());
    if consider_hierarchy {
        let mut current = registry.parent();
        while let Some(parent) = current {
            add_unique(&mut names, lookup(parent.as_ref()));
            current = parent.parent();
        }
    }
    names
}

fn bean_names_for_type(registry: &Arc<dyn BeanRegistry>, type_name: &str, consider_hierarchy: bool) -> Vec<String> {
    collect_hierarchy(registry, consider_hierarchy, |r| r.bean_names_for_type(type_name))
}

fn bean_names_for_annotation(
    registry: &Arc<dyn BeanRegistry>,
    annotation: &str,
    consider_hierarchy: bool,
) -> Vec<String> {
    collect_hierarchy(registry, consider_hierarchy, |r| r.bean_names_for_annotation(annotation))
}

fn has_single_autowire_candidate(
    registry: &Arc<dyn BeanRegistry>,
    names: &[String],
    consider_hierarchy: bool,
) -> bool {
    if names.len() == 1 {
        return true;
    }
    let primaries = names
        .iter()
        .filter(|name| {
            find_definition(registry, name, consider_hierarchy)
                .map(|d| d.primary)
                .unwrap_or(false)
        })
        .count();
    primaries == 1
}

fn find_definition(
    registry: &Arc<dyn BeanRegistry>,
    name: &str,
    consider_hierarchy: bool,
) -> Option<di_abstractions::BeanDefinitionInfo> {
    if let Some(definition) = registry.bean_definition(name) {
        return Some(definition);
    }
    if !consider_hierarchy {
        return None;
    }
    let mut current = registry.parent();
    while let Some(parent) = current {
        if let Some(definition) = parent.bean_definition(name) {
            return Some(definition);
        }
        current = parent.parent();
    }
    None
}
