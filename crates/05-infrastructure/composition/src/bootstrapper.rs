//! 自动装配启动器

use autoconfigure::{
    AutoConfigurationContext, AutoConfigurationGroup, AutoConfigurationImportSelector, AutoConfigurationSorter,
    ConditionEvaluationReport, ConditionEvaluationReportSnapshot, Entry, ExclusionResolver, ExtensionRegistry,
    SelectionListeners,
};
use infrastructure_common::{AutoConfigResult, ClassMetadata, InfrastructureError};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// 一次启动选择的结果
#[derive(Debug, Clone, Serialize)]
pub struct SelectionOutcome {
    /// 按导入顺序排列的自动装配类
    pub entries: Vec<Entry>,
    /// 条件评估报告
    pub report: Option<ConditionEvaluationReportSnapshot>,
}

impl SelectionOutcome {
    /// 导入的类名
    pub fn import_class_names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.import_class_name.as_str()).collect()
    }

    /// 序列化为 JSON
    pub fn to_json(&self) -> Result<String, InfrastructureError> {
        serde_json::to_string_pretty(self).map_err(|e| InfrastructureError::BootstrapFailed {
            message: format!("序列化选择结果失败: {}", e),
        })
    }
}

/// 自动装配启动器
///
/// 负责协调一次启动中所有入口的选择、合并与排序，并在各阶段通知监听器。
/// 启用报告时每次选择都写入一份新的条件评估报告
#[derive(Debug, Clone)]
pub struct AutoConfigurationBootstrapper {
    context: AutoConfigurationContext,
    extensions: ExtensionRegistry,
    exclusion_resolver: ExclusionResolver,
    listeners: Arc<SelectionListeners>,
}

impl AutoConfigurationBootstrapper {
    /// 创建启动器
    pub fn new(context: AutoConfigurationContext, extensions: ExtensionRegistry, listeners: SelectionListeners) -> Self {
        Self {
            context,
            extensions,
            exclusion_resolver: ExclusionResolver::new(),
            listeners: Arc::new(listeners),
        }
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

    /// 在阻塞线程池上执行选择
    pub async fn run(&self, entry_points: Vec<ClassMetadata>) -> Result<SelectionOutcome, InfrastructureError> {
        let bootstrapper = self.clone();
        tokio::task::spawn_blocking(move || bootstrapper.select(&entry_points))
            .await
            .map_err(|e| InfrastructureError::BootstrapFailed {
                message: format!("自动装配任务异常终止: {}", e),
            })?
    }

    /// 在当前线程上执行选择
    pub fn select(&self, entry_points: &[ClassMetadata]) -> Result<SelectionOutcome, InfrastructureError> {
        let start = Instant::now();
        let names: Vec<String> = entry_points.iter().map(|e| e.class_name.clone()).collect();
        info!("开始自动装配选择，入口: {:?}", names);

        let context = self.run_context();
        let selector = AutoConfigurationImportSelector::new(context.clone())
            .with_extensions(self.extensions.clone())
            .with_exclusion_resolver(self.exclusion_resolver.clone());

        let result = self
            .listeners
            .starting(&names)
            .and_then(|_| select_entries(&context, &selector, entry_points))
            .and_then(|entries| {
                self.listeners.selected(&entries)?;
                Ok(entries)
            });

        match result {
            Ok(entries) => {
                info!("自动装配选择完成，导入 {} 个类，耗时 {:?}", entries.len(), start.elapsed());
                Ok(SelectionOutcome {
                    entries,
                    report: context.report().map(|report| report.snapshot()),
                })
            }
            Err(e) => {
                error!("自动装配选择失败: {}", e);
                self.listeners.failed(Some(&e))?;
                Err(e.into())
            }
        }
    }

    /// 本次选择使用的上下文
    fn run_context(&self) -> AutoConfigurationContext {
        match self.context.report() {
            Some(_) => self
                .context
                .clone()
                .with_report(Arc::new(ConditionEvaluationReport::new())),
            None => self.context.clone(),
        }
    }
}

fn select_entries(
    context: &AutoConfigurationContext,
    selector: &AutoConfigurationImportSelector,
    entry_points: &[ClassMetadata],
) -> AutoConfigResult<Vec<Entry>> {
    let mut group = AutoConfigurationGroup::new(AutoConfigurationSorter::new(context.metadata().clone()));
    for entry_point in entry_points {
        group.process(entry_point, selector)?;
    }
    group.select_imports()
}
