//! 类存在性条件

use super::message::{ConditionMessage, ConditionOutcome, Style};
use super::{presence, unresolved, FilteringCondition, Presence};
use crate::context::AutoConfigurationContext;
use infrastructure_common::{AnnotationKind, AutoConfigResult};
use tracing::trace;

/// 类存在性条件
///
/// 检查 `ConditionalOnClass` 要求的类全部存在、`ConditionalOnMissingClass`
/// 声明的类全部不存在。候选类多于一个且有多个可用处理器时，前一半在工作线程上
/// 评估，后一半在调用线程上评估，最后按原始位置合并。
#[derive(Debug, Clone)]
pub struct OnClassCondition {
    available_processors: usize,
}

impl OnClassCondition {
    /// 条件名称
    pub const NAME: &'static str = "OnClassCondition";

    /// 创建条件，并行度由可用处理器数量决定
    pub fn new() -> Self {
        Self {
            available_processors: num_cpus::get(),
        }
    }

    /// 指定可用处理器数量
    pub fn with_available_processors(mut self, processors: usize) -> Self {
        self.available_processors = processors;
        self
    }

    fn resolve_outcomes(
        &self,
        candidates: &[Option<&str>],
        context: &AutoConfigurationContext,
    ) -> AutoConfigResult<Vec<Option<ConditionOutcome>>> {
        candidates
            .iter()
            .map(|candidate| match candidate {
                Some(class_name) => outcome_for(class_name, context),
                None => Ok(None),
            })
            .collect()
    }

    fn resolve_outcomes_threaded(
        &self,
        candidates: &[Option<&str>],
        context: &AutoConfigurationContext,
    ) -> AutoConfigResult<Vec<Option<ConditionOutcome>>> {
        let split = candidates.len() / 2;
        let (first_half, second_half) = candidates.split_at(split);

        let (first, second) = std::thread::scope(|scope| {
            let worker = scope.spawn(|| self.resolve_outcomes(first_half, context));
            let second = self.resolve_outcomes(second_half, context);
            let first = worker
                .join()
                .unwrap_or_else(|payload| std::panic::resume_unwind(payload));
            (first, second)
        });

        let mut outcomes = first?;
        outcomes.extend(second?);
        Ok(outcomes)
    }
}

impl Default for OnClassCondition {
    fn default() -> Self {
        Self::new()
    }
}

impl FilteringCondition for OnClassCondition {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn get_outcomes(
        &self,
        candidates: &[Option<&str>],
        context: &AutoConfigurationContext,
    ) -> AutoConfigResult<Vec<Option<ConditionOutcome>>> {
        if candidates.len() > 1 && self.available_processors > 1 {
            trace!("并行评估 {} 个候选类的类存在性条件", candidates.len());
            self.resolve_outcomes_threaded(candidates, context)
        } else {
            self.resolve_outcomes(candidates, context)
        }
    }
}

fn outcome_for(class_name: &str, context: &AutoConfigurationContext) -> AutoConfigResult<Option<ConditionOutcome>> {
    let Some(entry) = context.metadata().entry(class_name)? else {
        return Ok(None);
    };

    for required in &entry.on_class {
        match presence(required, context) {
            Presence::Present => {}
            Presence::Missing => {
                return Ok(Some(ConditionOutcome::no_match(
                    ConditionMessage::for_condition(AnnotationKind::ConditionalOnClass)
                        .did_not_find("required class", "required classes")
                        .items(Style::Quote, [required]),
                )));
            }
            Presence::Unresolved(message) => {
                return Ok(unresolved(class_name, required, &message, context));
            }
        }
    }

    for unwanted in &entry.on_missing_class {
        match presence(unwanted, context) {
            Presence::Missing => {}
            Presence::Present => {
                return Ok(Some(ConditionOutcome::no_match(
                    ConditionMessage::for_condition(AnnotationKind::ConditionalOnMissingClass)
                        .found("unwanted class", "unwanted classes")
                        .items(Style::Quote, [unwanted]),
                )));
            }
            Presence::Unresolved(message) => {
                return Ok(unresolved(class_name, unwanted, &message, context));
            }
        }
    }

    Ok(None)
}
