//! 自动装配构建器

use crate::bootstrapper::AutoConfigurationBootstrapper;
use autoconfigure::{
    AutoConfigurationContext, AutoConfigurationMetadata, ConditionEvaluationReport, ExclusionResolver,
    ExtensionRegistry, SelectionListener, SelectionListeners,
};
use config_abstractions::{ApplicationKind, PropertySource};
use config_impl::{load_property_source, StandardEnvironment, SystemEnvironmentPropertySource};
use di_abstractions::{BeanRegistry, ClassResolver, MetadataReader};
use di_impl::{DefaultBeanRegistry, InMemoryMetadataReader, PropertiesFactoriesLoader, StaticClassResolver};
use infrastructure_common::InfrastructureError;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// 自动装配构建器
///
/// 汇集扩展点清单、元数据索引、类元数据、配置文件和组件注册表，
/// 构建出可以执行选择的 [`AutoConfigurationBootstrapper`]
pub struct AutoConfigurationBuilder {
    /// 扩展点清单文件
    factories_files: Vec<PathBuf>,
    /// 内联的扩展点清单
    factories_manifests: Vec<String>,
    /// 元数据索引文件
    index_files: Vec<PathBuf>,
    /// 内联的元数据索引
    index_contents: Vec<String>,
    /// 类元数据 JSON 文件
    metadata_files: Vec<PathBuf>,
    /// 配置文件
    config_files: Vec<PathBuf>,
    /// 自定义属性源
    property_sources: Vec<Box<dyn PropertySource>>,
    /// 环境变量前缀
    env_prefix: Option<String>,
    /// 应用类型
    application_kind: ApplicationKind,
    /// 已知存在的类
    available_classes: Vec<String>,
    /// 自定义组件注册表
    registry: Option<Arc<dyn BeanRegistry>>,
    /// 自定义类解析器
    class_resolver: Option<Arc<dyn ClassResolver>>,
    /// 自定义元数据读取器
    metadata_reader: Option<Arc<dyn MetadataReader>>,
    /// 是否收集条件评估报告
    report_enabled: bool,
    /// 声明排除项的环境属性键
    exclude_property: Option<String>,
    /// 过滤器与导入监听器
    extensions: ExtensionRegistry,
    /// 选择过程监听器
    selection_listeners: SelectionListeners,
    /// 是否启用日志初始化
    logging_enabled: bool,
    /// 日志配置
    logging_config: LoggingConfig,
}

impl AutoConfigurationBuilder {
    /// 创建新的构建器
    pub fn new() -> Self {
        Self {
            factories_files: Vec::new(),
            factories_manifests: Vec::new(),
            index_files: Vec::new(),
            index_contents: Vec::new(),
            metadata_files: Vec::new(),
            config_files: Vec::new(),
            property_sources: Vec::new(),
            env_prefix: None,
            application_kind: ApplicationKind::Standard,
            available_classes: Vec::new(),
            registry: None,
            class_resolver: None,
            metadata_reader: None,
            report_enabled: true,
            exclude_property: None,
            extensions: ExtensionRegistry::new(),
            selection_listeners: SelectionListeners::new(),
            logging_enabled: false, // 默认不启用日志初始化
            logging_config: LoggingConfig::default(),
        }
    }

    /// 添加扩展点清单文件
    pub fn add_factories_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, InfrastructureError> {
        let path = existing(path.as_ref(), "扩展点清单")?;
        info!("添加扩展点清单: {}", path.display());
        self.factories_files.push(path);
        Ok(self)
    }

    /// 添加内联的扩展点清单
    pub fn add_factories_manifest(mut self, content: impl Into<String>) -> Self {
        self.factories_manifests.push(content.into());
        self
    }

    /// 添加元数据索引文件
    pub fn add_metadata_index_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, InfrastructureError> {
        let path = existing(path.as_ref(), "元数据索引")?;
        info!("添加元数据索引: {}", path.display());
        self.index_files.push(path);
        Ok(self)
    }

    /// 添加内联的元数据索引
    pub fn add_metadata_index(mut self, content: impl Into<String>) -> Self {
        self.index_contents.push(content.into());
        self
    }

    /// 添加类元数据 JSON 文件
    pub fn add_class_metadata_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, InfrastructureError> {
        let path = existing(path.as_ref(), "类元数据")?;
        info!("添加类元数据: {}", path.display());
        self.metadata_files.push(path);
        Ok(self)
    }

    /// 添加配置文件（TOML、JSON 或 properties）
    pub fn add_config_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, InfrastructureError> {
        let path = existing(path.as_ref(), "配置")?;
        info!("添加配置文件: {}", path.display());
        self.config_files.push(path);
        Ok(self)
    }

    /// 添加自定义属性源
    pub fn add_property_source<T: PropertySource + 'static>(mut self, source: T) -> Self {
        info!("添加属性源: {}", source.name());
        self.property_sources.push(Box::new(source));
        self
    }

    /// 添加环境变量配置源
    pub fn add_config_env_vars<S: Into<String>>(mut self, prefix: S) -> Self {
        let prefix = prefix.into();
        info!("添加环境变量配置源，前缀: {}", prefix);
        self.env_prefix = Some(prefix);
        self
    }

    /// 设置应用类型
    pub fn with_application_kind(mut self, kind: ApplicationKind) -> Self {
        self.application_kind = kind;
        self
    }

    /// 声明存在的类（使用内置类解析器时生效）
    pub fn with_available_classes<I, S>(mut self, classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.available_classes.extend(classes.into_iter().map(Into::into));
        self
    }

    /// 使用自定义组件注册表
    pub fn with_registry(mut self, registry: Arc<dyn BeanRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// 使用自定义类解析器
    pub fn with_class_resolver(mut self, resolver: Arc<dyn ClassResolver>) -> Self {
        self.class_resolver = Some(resolver);
        self
    }

    /// 使用自定义元数据读取器
    pub fn with_metadata_reader(mut self, reader: Arc<dyn MetadataReader>) -> Self {
        self.metadata_reader = Some(reader);
        self
    }

    /// 启用或禁用条件评估报告
    pub fn enable_report(mut self, enabled: bool) -> Self {
        self.report_enabled = enabled;
        self
    }

    /// 从其他环境属性读取排除项
    pub fn with_exclude_property(mut self, key: impl Into<String>) -> Self {
        self.exclude_property = Some(key.into());
        self
    }

    /// 使用自定义扩展注册表
    pub fn with_extensions(mut self, extensions: ExtensionRegistry) -> Self {
        self.extensions = extensions;
        self
    }

    /// 添加选择过程监听器
    pub fn add_selection_listener(mut self, listener: Arc<dyn SelectionListener>) -> Self {
        debug!("添加选择过程监听器: {}", listener.name());
        self.selection_listeners.add(listener);
        self
    }

    /// 配置日志
    pub fn with_logging(mut self, config: LoggingConfig) -> Self {
        self.logging_config = config;
        self.logging_enabled = true;
        self
    }

    /// 构建启动器
    pub async fn build(mut self) -> Result<AutoConfigurationBootstrapper, InfrastructureError> {
        // 只有在明确配置了日志时才初始化日志
        if self.logging_enabled {
            self.initialize_logging()?;
        }
        info!("开始构建自动装配");

        let property_sources = std::mem::take(&mut self.property_sources);
        let environment = self.build_environment(property_sources).await?;
        let factories = self.build_factories().await?;
        let index = self.build_index().await?;
        let metadata_reader = self.build_metadata_reader().await?;

        let class_resolver = match self.class_resolver {
            Some(resolver) => resolver,
            None => Arc::new(StaticClassResolver::from_classes(self.available_classes)),
        };
        let registry = self
            .registry
            .unwrap_or_else(|| Arc::new(DefaultBeanRegistry::new()));

        let mut context = AutoConfigurationContext::new(
            Arc::new(environment),
            registry,
            class_resolver,
            metadata_reader,
            Arc::new(factories),
        )
        .with_metadata_index(Box::new(index));
        if self.report_enabled {
            context = context.with_report(Arc::new(ConditionEvaluationReport::new()));
        }

        let mut bootstrapper = AutoConfigurationBootstrapper::new(context, self.extensions, self.selection_listeners);
        if let Some(key) = self.exclude_property {
            debug!("排除项属性: {}", key);
            bootstrapper =
                bootstrapper.with_exclusion_resolver(ExclusionResolver::new().with_exclude_property(key));
        }

        info!("自动装配构建完成");
        Ok(bootstrapper)
    }

    async fn build_environment(
        &self,
        property_sources: Vec<Box<dyn PropertySource>>,
    ) -> Result<StandardEnvironment, InfrastructureError> {
        let mut environment = StandardEnvironment::new().with_application_kind(self.application_kind);
        for source in property_sources {
            environment.add_source(source);
        }
        for path in &self.config_files {
            environment.add_source(load_property_source(path).await?);
        }
        if let Some(prefix) = &self.env_prefix {
            environment.add_source(Box::new(SystemEnvironmentPropertySource::new(prefix.clone())));
        }
        debug!("属性源顺序: {:?}", environment.source_names());
        Ok(environment)
    }

    async fn build_factories(&self) -> Result<PropertiesFactoriesLoader, InfrastructureError> {
        let factories = PropertiesFactoriesLoader::new();
        for content in &self.factories_manifests {
            factories.merge_str(content);
        }
        for path in &self.factories_files {
            factories.merge_file(path).await?;
        }
        Ok(factories)
    }

    async fn build_index(&self) -> Result<AutoConfigurationMetadata, InfrastructureError> {
        let mut index = AutoConfigurationMetadata::empty();
        for content in &self.index_contents {
            index.merge(AutoConfigurationMetadata::parse(content));
        }
        for path in &self.index_files {
            let content = tokio::fs::read_to_string(path)
                .await
                .map_err(|e| InfrastructureError::BootstrapFailed {
                    message: format!("读取元数据索引 {} 失败: {}", path.display(), e),
                })?;
            index.merge(AutoConfigurationMetadata::parse(&content));
        }
        Ok(index)
    }

    async fn build_metadata_reader(&self) -> Result<Arc<dyn MetadataReader>, InfrastructureError> {
        if let Some(reader) = &self.metadata_reader {
            if !self.metadata_files.is_empty() {
                return Err(InfrastructureError::BootstrapFailed {
                    message: "使用自定义元数据读取器时不能再添加类元数据文件".to_string(),
                });
            }
            return Ok(reader.clone());
        }

        let reader = InMemoryMetadataReader::new();
        for path in &self.metadata_files {
            let count = reader.load_json_file(path).await?;
            debug!("从 {} 读取了 {} 个类的元数据", path.display(), count);
        }
        Ok(Arc::new(reader))
    }

    /// 初始化日志系统
    fn initialize_logging(&self) -> Result<(), InfrastructureError> {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(self.logging_config.level)
            .with_target(self.logging_config.show_target)
            .with_thread_ids(self.logging_config.show_thread_ids)
            .with_file(self.logging_config.show_file)
            .with_line_number(self.logging_config.show_line_number);

        if self.logging_config.json_format {
            subscriber.json().try_init()
        } else {
            subscriber.try_init()
        }
        .map_err(|e| InfrastructureError::BootstrapFailed {
            message: format!("日志初始化失败: {}", e),
        })?;

        info!("日志系统初始化完成");
        Ok(())
    }
}

impl Default for AutoConfigurationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn existing(path: &Path, kind: &str) -> Result<PathBuf, InfrastructureError> {
    if !path.exists() {
        return Err(InfrastructureError::BootstrapFailed {
            message: format!("{}文件不存在: {}", kind, path.display()),
        });
    }
    Ok(path.to_path_buf())
}

/// 日志配置
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: tracing::Level,
    /// 是否显示目标
    pub show_target: bool,
    /// 是否显示线程ID
    pub show_thread_ids: bool,
    /// 是否显示文件名
    pub show_file: bool,
    /// 是否显示行号
    pub show_line_number: bool,
    /// 是否使用 JSON 格式
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: tracing::Level::INFO,
            show_target: true,
            show_thread_ids: false,
            show_file: false,
            show_line_number: false,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// 创建开发环境日志配置
    pub fn development() -> Self {
        Self {
            level: tracing::Level::DEBUG,
            show_target: true,
            show_thread_ids: true,
            show_file: true,
            show_line_number: true,
            json_format: false,
        }
    }

    /// 创建生产环境日志配置
    pub fn production() -> Self {
        Self {
            level: tracing::Level::INFO,
            show_target: false,
            show_thread_ids: false,
            show_file: false,
            show_line_number: false,
            json_format: true,
        }
    }
}
