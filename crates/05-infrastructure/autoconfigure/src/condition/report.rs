//! 条件评估报告

use super::message::ConditionOutcome;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 单次条件评估记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionAndOutcome {
    /// 条件名称
    pub condition: String,
    /// 评估结果
    pub outcome: ConditionOutcome,
}

/// 同一个类的全部评估记录
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionAndOutcomes {
    /// 评估记录（按记录顺序）
    pub outcomes: Vec<ConditionAndOutcome>,
}

impl ConditionAndOutcomes {
    /// 是否全部匹配
    pub fn is_full_match(&self) -> bool {
        self.outcomes.iter().all(|o| o.outcome.is_match)
    }

    fn add(&mut self, condition: &str, outcome: ConditionOutcome) {
        let record = ConditionAndOutcome {
            condition: condition.to_string(),
            outcome,
        };
        if !self.outcomes.contains(&record) {
            self.outcomes.push(record);
        }
    }
}

/// 无法解析的类（按宽松策略放行）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnresolvedClass {
    /// 声明条件的自动装配类
    pub source_class: String,
    /// 解析失败的类
    pub class_name: String,
    /// 失败原因
    pub message: String,
}

/// 报告快照
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionEvaluationReportSnapshot {
    /// 每个类的评估记录
    pub outcomes: BTreeMap<String, ConditionAndOutcomes>,
    /// 被排除的类
    pub exclusions: Vec<String>,
    /// 没有任何条件记录、直接通过的候选类
    pub unconditional_classes: Vec<String>,
    /// 宽松放行的解析失败
    pub unresolved: Vec<UnresolvedClass>,
    /// 快照时间
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct ReportState {
    outcomes: BTreeMap<String, ConditionAndOutcomes>,
    exclusions: Vec<String>,
    candidates: Vec<String>,
    unresolved: Vec<UnresolvedClass>,
}

/// 条件评估报告
///
/// 过滤器与监听器以"写后不管"的方式写入，快照用于事后展示
#[derive(Debug, Default)]
pub struct ConditionEvaluationReport {
    state: Mutex<ReportState>,
}

impl ConditionEvaluationReport {
    /// 创建空报告
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录条件评估结果
    pub fn record_condition_evaluation(&self, class_name: &str, condition: &str, outcome: ConditionOutcome) {
        self.state
            .lock()
            .outcomes
            .entry(class_name.to_string())
            .or_default()
            .add(condition, outcome);
    }

    /// 记录排除项
    pub fn record_exclusions(&self, exclusions: &[String]) {
        let mut state = self.state.lock();
        for exclusion in exclusions {
            if !state.exclusions.contains(exclusion) {
                state.exclusions.push(exclusion.clone());
            }
        }
    }

    /// 记录通过过滤的候选类
    pub fn record_evaluation_candidates(&self, candidates: &[String]) {
        let mut state = self.state.lock();
        for candidate in candidates {
            if !state.candidates.contains(candidate) {
                state.candidates.push(candidate.clone());
            }
        }
    }

    /// 记录宽松放行的解析失败
    pub fn record_unresolved(&self, source_class: &str, class_name: &str, message: &str) {
        self.state.lock().unresolved.push(UnresolvedClass {
            source_class: source_class.to_string(),
            class_name: class_name.to_string(),
            message: message.to_string(),
        });
    }

    /// 获取某个类的评估记录
    pub fn condition_outcomes_for(&self, class_name: &str) -> Option<ConditionAndOutcomes> {
        self.state.lock().outcomes.get(class_name).cloned()
    }

    /// 获取排除项
    pub fn exclusions(&self) -> Vec<String> {
        self.state.lock().exclusions.clone()
    }

    /// 生成快照
    pub fn snapshot(&self) -> ConditionEvaluationReportSnapshot {
        let state = self.state.lock();
        let unconditional_classes = state
            .candidates
            .iter()
            .filter(|c| !state.outcomes.contains_key(*c) && !state.exclusions.contains(*c))
            .cloned()
            .collect();

        ConditionEvaluationReportSnapshot {
            outcomes: state.outcomes.clone(),
            exclusions: state.exclusions.clone(),
            unconditional_classes,
            unresolved: state.unresolved.clone(),
            created_at: Some(Utc::now()),
        }
    }
}
