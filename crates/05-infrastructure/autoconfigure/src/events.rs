//! 自动装配事件与监听器

use crate::condition::ConditionEvaluationReport;
use crate::group::Entry;
use infrastructure_common::{AutoConfigError, AutoConfigResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// 自动装配导入事件
///
/// 过滤完成后针对每个入口触发一次
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoConfigurationImportEvent {
    /// 入口类
    pub source: String,
    /// 最终保留的自动装配类
    pub candidate_configurations: Vec<String>,
    /// 排除项
    pub exclusions: Vec<String>,
    /// 事件时间
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl AutoConfigurationImportEvent {
    /// 创建导入事件
    pub fn new(source: impl Into<String>, candidate_configurations: Vec<String>, exclusions: Vec<String>) -> Self {
        Self {
            source: source.into(),
            candidate_configurations,
            exclusions,
            timestamp: chrono::Utc::now(),
        }
    }
}

/// 自动装配导入监听器 trait
pub trait AutoConfigurationImportListener: Send + Sync {
    /// 监听器名称
    fn name(&self) -> &str;

    /// 处理导入事件
    fn on_auto_configuration_import_event(&self, event: &AutoConfigurationImportEvent) -> AutoConfigResult<()>;
}

/// 把导入事件写入条件评估报告的监听器
pub struct ConditionEvaluationReportListener {
    report: Option<Arc<ConditionEvaluationReport>>,
}

impl ConditionEvaluationReportListener {
    /// 监听器名称
    pub const NAME: &'static str = "ConditionEvaluationReportListener";

    /// 创建监听器，未启用报告时事件被忽略
    pub fn new(report: Option<Arc<ConditionEvaluationReport>>) -> Self {
        Self { report }
    }
}

impl fmt::Debug for ConditionEvaluationReportListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConditionEvaluationReportListener")
            .field("has_report", &self.report.is_some())
            .finish()
    }
}

impl AutoConfigurationImportListener for ConditionEvaluationReportListener {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn on_auto_configuration_import_event(&self, event: &AutoConfigurationImportEvent) -> AutoConfigResult<()> {
        if let Some(report) = &self.report {
            report.record_evaluation_candidates(&event.candidate_configurations);
            report.record_exclusions(&event.exclusions);
        }
        Ok(())
    }
}

/// 选择过程监听器 trait
///
/// 贯穿一次完整的启动选择过程，所有回调默认什么也不做
pub trait SelectionListener: Send + Sync {
    /// 监听器名称
    fn name(&self) -> &str;

    /// 开始选择
    fn starting(&self, _entry_points: &[String]) -> AutoConfigResult<()> {
        Ok(())
    }

    /// 选择完成
    fn selected(&self, _entries: &[Entry]) -> AutoConfigResult<()> {
        Ok(())
    }

    /// 选择失败
    fn failed(&self, _error: Option<&AutoConfigError>) -> AutoConfigResult<()> {
        Ok(())
    }
}

/// 选择过程监听器集合
#[derive(Default)]
pub struct SelectionListeners {
    listeners: Vec<Arc<dyn SelectionListener>>,
}

impl fmt::Debug for SelectionListeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.listeners.iter().map(|l| l.name()).collect();
        f.debug_struct("SelectionListeners").field("listeners", &names).finish()
    }
}

impl SelectionListeners {
    /// 创建空集合
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加监听器
    pub fn with_listener(mut self, listener: Arc<dyn SelectionListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    /// 添加监听器
    pub fn add(&mut self, listener: Arc<dyn SelectionListener>) {
        self.listeners.push(listener);
    }

    /// 监听器数量
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// 通知开始选择
    pub fn starting(&self, entry_points: &[String]) -> AutoConfigResult<()> {
        for listener in &self.listeners {
            listener
                .starting(entry_points)
                .map_err(|e| listener_failed(listener.as_ref(), e))?;
        }
        Ok(())
    }

    /// 通知选择完成
    pub fn selected(&self, entries: &[Entry]) -> AutoConfigResult<()> {
        for listener in &self.listeners {
            listener
                .selected(entries)
                .map_err(|e| listener_failed(listener.as_ref(), e))?;
        }
        Ok(())
    }

    /// 通知选择失败
    ///
    /// 已有错误在传播时，监听器自身的错误只记录日志；否则向上返回
    pub fn failed(&self, error: Option<&AutoConfigError>) -> AutoConfigResult<()> {
        for listener in &self.listeners {
            if let Err(e) = listener.failed(error) {
                if error.is_none() {
                    return Err(listener_failed(listener.as_ref(), e));
                }
                warn!("监听器 {} 处理失败事件时出错 ({})", listener.name(), e);
            }
        }
        debug!("已通知 {} 个监听器选择失败", self.listeners.len());
        Ok(())
    }
}

fn listener_failed(listener: &dyn SelectionListener, error: AutoConfigError) -> AutoConfigError {
    match error {
        AutoConfigError::ListenerFailed { .. } => error,
        other => AutoConfigError::ListenerFailed {
            listener: listener.name().to_string(),
            message: other.to_string(),
        },
    }
}
