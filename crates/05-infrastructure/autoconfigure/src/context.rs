//! 自动装配上下文

use crate::condition::report::ConditionEvaluationReport;
use crate::metadata::{AutoConfigurationMetadataCache, MetadataIndexLoader};
use config_abstractions::Environment;
use di_abstractions::{BeanRegistry, ClassResolver, FactoriesLoader, MetadataReader};
use std::fmt;
use std::sync::Arc;

/// 自动装配上下文
///
/// 汇集一次启动过程中条件评估需要的全部外部协作者。元数据缓存归上下文所有，
/// 在整个启动过程中只构建一次。
#[derive(Clone)]
pub struct AutoConfigurationContext {
    environment: Arc<dyn Environment>,
    registry: Arc<dyn BeanRegistry>,
    class_resolver: Arc<dyn ClassResolver>,
    metadata_reader: Arc<dyn MetadataReader>,
    factories: Arc<dyn FactoriesLoader>,
    metadata: Arc<AutoConfigurationMetadataCache>,
    report: Option<Arc<ConditionEvaluationReport>>,
}

impl fmt::Debug for AutoConfigurationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AutoConfigurationContext")
            .field("application_kind", &self.environment.application_kind())
            .field("metadata", &self.metadata)
            .field("has_report", &self.report.is_some())
            .finish()
    }
}

impl AutoConfigurationContext {
    /// 创建上下文，元数据只通过读取器获取
    pub fn new(
        environment: Arc<dyn Environment>,
        registry: Arc<dyn BeanRegistry>,
        class_resolver: Arc<dyn ClassResolver>,
        metadata_reader: Arc<dyn MetadataReader>,
        factories: Arc<dyn FactoriesLoader>,
    ) -> Self {
        let metadata = Arc::new(AutoConfigurationMetadataCache::new(metadata_reader.clone()));
        Self {
            environment,
            registry,
            class_resolver,
            metadata_reader,
            factories,
            metadata,
            report: None,
        }
    }

    /// 使用预编译索引
    pub fn with_metadata_index(mut self, loader: Box<dyn MetadataIndexLoader>) -> Self {
        self.metadata = Arc::new(AutoConfigurationMetadataCache::with_index_loader(
            self.metadata_reader.clone(),
            loader,
        ));
        self
    }

    /// 启用条件评估报告
    pub fn with_report(mut self, report: Arc<ConditionEvaluationReport>) -> Self {
        self.report = Some(report);
        self
    }

    /// 运行环境
    pub fn environment(&self) -> &dyn Environment {
        self.environment.as_ref()
    }

    /// 组件注册表
    pub fn registry(&self) -> &Arc<dyn BeanRegistry> {
        &self.registry
    }

    /// 类解析器
    pub fn class_resolver(&self) -> &dyn ClassResolver {
        self.class_resolver.as_ref()
    }

    /// 扩展点清单
    pub fn factories(&self) -> &dyn FactoriesLoader {
        self.factories.as_ref()
    }

    /// 元数据缓存
    pub fn metadata(&self) -> &Arc<AutoConfigurationMetadataCache> {
        &self.metadata
    }

    /// 条件评估报告
    pub fn report(&self) -> Option<&Arc<ConditionEvaluationReport>> {
        self.report.as_ref()
    }
}
