//! 条件过滤
//!
//! 每个过滤器一次性接收整批候选类，返回与之等长的匹配数组。已被前面的
//! 过滤器淘汰的位置以 `None` 传入，过滤器应直接跳过。

pub mod filter;
pub mod message;
pub mod on_bean;
pub mod on_class;
pub mod on_property;
pub mod on_web_application;
pub mod report;

pub use filter::ConfigurationClassFilter;
pub use message::{ConditionMessage, ConditionOutcome, Style};
pub use on_bean::{BeanConditionKind, BeanConditionSpec, OnBeanCondition, SearchStrategy};
pub use on_class::OnClassCondition;
pub use on_property::{OnPropertyCondition, PropertyConditionSpec};
pub use on_web_application::{OnWebApplicationCondition, WebApplicationType, WebConditionSpec};
pub use report::{ConditionEvaluationReport, ConditionEvaluationReportSnapshot};

use crate::context::AutoConfigurationContext;
use infrastructure_common::{AutoConfigResult, ClassResolutionError};
use tracing::{trace, warn};

/// 自动装配导入过滤器 trait
pub trait AutoConfigurationImportFilter: Send + Sync {
    /// 过滤器名称
    fn name(&self) -> &str;

    /// 批量判断候选类是否匹配，返回数组与输入等长
    fn matches(
        &self,
        candidates: &[Option<&str>],
        context: &AutoConfigurationContext,
    ) -> AutoConfigResult<Vec<bool>>;
}

/// 基于条件结果的过滤器 trait
///
/// 实现者只需给出每个候选类的评估结果，`None` 表示没有意见（视为匹配）。
/// 不匹配的结果会记录日志并写入评估报告。
pub trait FilteringCondition: Send + Sync {
    /// 条件名称
    fn name(&self) -> &str;

    /// 批量计算评估结果，返回数组与输入等长
    fn get_outcomes(
        &self,
        candidates: &[Option<&str>],
        context: &AutoConfigurationContext,
    ) -> AutoConfigResult<Vec<Option<ConditionOutcome>>>;
}

impl<T: FilteringCondition> AutoConfigurationImportFilter for T {
    fn name(&self) -> &str {
        FilteringCondition::name(self)
    }

    fn matches(
        &self,
        candidates: &[Option<&str>],
        context: &AutoConfigurationContext,
    ) -> AutoConfigResult<Vec<bool>> {
        let outcomes = self.get_outcomes(candidates, context)?;
        let mut matches = Vec::with_capacity(outcomes.len());

        for (candidate, outcome) in candidates.iter().zip(outcomes) {
            match (candidate, outcome) {
                (Some(class_name), Some(outcome)) if !outcome.is_match => {
                    trace!("{} 条件不匹配: {}", class_name, outcome);
                    if let Some(report) = context.report() {
                        report.record_condition_evaluation(class_name, FilteringCondition::name(self), outcome);
                    }
                    matches.push(false);
                }
                _ => matches.push(true),
            }
        }

        Ok(matches)
    }
}

/// 类的解析结果
pub(crate) enum Presence {
    Present,
    Missing,
    Unresolved(String),
}

/// 解析类，区分不存在与无法链接
pub(crate) fn presence(class_name: &str, context: &AutoConfigurationContext) -> Presence {
    match context.class_resolver().resolve(class_name) {
        Ok(()) => Presence::Present,
        Err(ClassResolutionError::NotFound { .. }) => Presence::Missing,
        Err(ClassResolutionError::Linkage { message, .. }) => Presence::Unresolved(message),
    }
}

/// 解析失败时放弃给出结论，由后续阶段再次判断
pub(crate) fn unresolved(
    source_class: &str,
    class_name: &str,
    message: &str,
    context: &AutoConfigurationContext,
) -> Option<ConditionOutcome> {
    warn!("{} 的条件无法判断，{} 解析失败: {}", source_class, class_name, message);
    if let Some(report) = context.report() {
        report.record_unresolved(source_class, class_name, message);
    }
    None
}
