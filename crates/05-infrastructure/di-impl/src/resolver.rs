//! 类解析器与元数据读取器实现

use dashmap::DashMap;
use di_abstractions::{ClassResolver, MetadataReader};
use infrastructure_common::{ClassMetadata, ClassResolutionError, ConfigError, MetadataError};
use std::path::Path;
use tracing::{debug, info};

/// 静态类解析器
///
/// 维护一份已知类清单，可将类标记为"存在但链接失败"
#[derive(Debug, Default)]
pub struct StaticClassResolver {
    /// 类标识 -> 链接失败原因（`None` 表示可正常解析）
    classes: DashMap<String, Option<String>>,
}

impl StaticClassResolver {
    /// 创建空的解析器
    pub fn new() -> Self {
        Self::default()
    }

    /// 从类标识列表创建
    pub fn from_classes<I, S>(classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let resolver = Self::new();
        for class_name in classes {
            resolver.register_class(class_name);
        }
        resolver
    }

    /// 添加可用类
    pub fn with_class(self, class_name: impl Into<String>) -> Self {
        self.register_class(class_name);
        self
    }

    /// 添加链接失败的类
    pub fn with_broken_class(self, class_name: impl Into<String>, message: impl Into<String>) -> Self {
        self.classes.insert(class_name.into(), Some(message.into()));
        self
    }

    /// 注册可用类
    pub fn register_class(&self, class_name: impl Into<String>) {
        self.classes.insert(class_name.into(), None);
    }

    /// 已知类数量
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// 是否没有任何已知类
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl ClassResolver for StaticClassResolver {
    fn resolve(&self, class_name: &str) -> Result<(), ClassResolutionError> {
        match self.classes.get(class_name) {
            None => Err(ClassResolutionError::not_found(class_name)),
            Some(entry) => match entry.value() {
                None => Ok(()),
                Some(message) => Err(ClassResolutionError::linkage(class_name, message.clone())),
            },
        }
    }
}

/// 内存元数据读取器
///
/// 类元数据可直接注册，也可从 JSON 文件批量加载
#[derive(Debug, Default)]
pub struct InMemoryMetadataReader {
    metadata: DashMap<String, ClassMetadata>,
    malformed: DashMap<String, String>,
}

impl InMemoryMetadataReader {
    /// 创建空的读取器
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加类元数据
    pub fn with_metadata(self, metadata: ClassMetadata) -> Self {
        self.register(metadata);
        self
    }

    /// 标记类元数据为格式错误
    pub fn with_malformed(self, class_name: impl Into<String>, message: impl Into<String>) -> Self {
        self.malformed.insert(class_name.into(), message.into());
        self
    }

    /// 注册类元数据
    pub fn register(&self, metadata: ClassMetadata) {
        debug!("注册类元数据: {}", metadata.class_name);
        self.metadata.insert(metadata.class_name.clone(), metadata);
    }

    /// 从 JSON 文本加载类元数据列表
    pub fn load_json_str(&self, content: &str) -> Result<usize, ConfigError> {
        let entries: Vec<ClassMetadata> = serde_json::from_str(content)?;
        let count = entries.len();
        for metadata in entries {
            self.register(metadata);
        }
        Ok(count)
    }

    /// 从 JSON 文件加载类元数据列表
    pub async fn load_json_file(&self, path: &Path) -> Result<usize, ConfigError> {
        if !tokio::fs::try_exists(path).await? {
            return Err(ConfigError::FileNotFound {
                path: path.display().to_string(),
            });
        }
        let content = tokio::fs::read_to_string(path).await?;
        let count = self.load_json_str(&content)?;
        info!("从 {} 加载了 {} 个类元数据", path.display(), count);
        Ok(count)
    }
}

impl MetadataReader for InMemoryMetadataReader {
    fn read(&self, class_name: &str) -> Result<ClassMetadata, MetadataError> {
        if let Some(message) = self.malformed.get(class_name) {
            return Err(MetadataError::Malformed {
                class_name: class_name.to_string(),
                message: message.value().clone(),
            });
        }
        self.metadata
            .get(class_name)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| MetadataError::NotFound {
                class_name: class_name.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use infrastructure_common::{AnnotationAttributes, AnnotationKind};

    #[test]
    fn test_resolve_distinguishes_missing_and_broken() {
        let resolver = StaticClassResolver::from_classes(["x.Present"])
            .with_broken_class("x.Broken", "missing dependency x.Dep");

        assert!(resolver.resolve("x.Present").is_ok());
        assert_eq!(
            resolver.resolve("x.Absent"),
            Err(ClassResolutionError::not_found("x.Absent"))
        );
        assert!(matches!(
            resolver.resolve("x.Broken"),
            Err(ClassResolutionError::Linkage { .. })
        ));
        assert!(!resolver.is_present("x.Broken"));
    }

    #[test]
    fn test_metadata_reader_errors() {
        let reader = InMemoryMetadataReader::new()
            .with_metadata(ClassMetadata::new("x.Good"))
            .with_malformed("x.Bad", "truncated");

        assert!(reader.read("x.Good").is_ok());
        assert!(matches!(reader.read("x.Bad"), Err(MetadataError::Malformed { .. })));
        assert!(matches!(reader.read("x.None"), Err(MetadataError::NotFound { .. })));
    }

    #[test]
    fn test_load_json_metadata() {
        let reader = InMemoryMetadataReader::new();
        let count = reader
            .load_json_str(
                r#"[{
                    "class_name": "x.WebAutoConfiguration",
                    "annotations": [
                        {"annotation": "ConditionalOnClass", "values": {"value": ["x.Servlet"]}},
                        {"annotation": "AutoConfigureOrder", "values": {"value": 10}}
                    ]
                }]"#,
            )
            .unwrap();

        assert_eq!(count, 1);
        let metadata = reader.read("x.WebAutoConfiguration").unwrap();
        assert_eq!(
            metadata.annotation(AnnotationKind::ConditionalOnClass),
            Some(
                &AnnotationAttributes::new(AnnotationKind::ConditionalOnClass)
                    .with("value", vec!["x.Servlet"])
            )
        );
        assert_eq!(
            metadata
                .annotation(AnnotationKind::AutoConfigureOrder)
                .and_then(|a| a.get_integer("value")),
            Some(10)
        );
    }
}
