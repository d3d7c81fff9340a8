//! 自动装配元数据
//!
//! 元数据有两个来源：构建期生成的预编译索引（properties 文本，`类名.键=值`），
//! 以及通过 [`MetadataReader`] 直接读取类上的注解属性。索引中出现过的类
//! 走快速路径，其余类回退到直接读取。每个类的解析结果只计算一次。

use crate::condition::on_bean::{BeanConditionKind, BeanConditionSpec};
use crate::condition::on_property::PropertyConditionSpec;
use crate::condition::on_web_application::WebConditionSpec;
use config_abstractions::split_comma_delimited;
use config_impl::parse_properties;
use dashmap::mapref::entry::Entry as MapEntry;
use dashmap::DashMap;
use di_abstractions::MetadataReader;
use infrastructure_common::{
    AnnotationAttributes, AnnotationKind, AutoConfigError, AutoConfigResult, ClassMetadata,
    MetadataError, DEFAULT_ORDER,
};
use once_cell::sync::OnceCell;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, trace};

/// 索引中可出现的键
pub const INDEX_KEYS: [&str; 12] = [
    "AutoConfigureOrder",
    "AutoConfigureBefore",
    "AutoConfigureAfter",
    "ConditionalOnClass",
    "ConditionalOnBean",
    "ConditionalOnSingleCandidate",
    "ConditionalOnWebApplication",
    "ConditionalOnProperty.prefix",
    "ConditionalOnProperty.name",
    "ConditionalOnProperty.havingValue",
    "ConditionalOnProperty.matchIfMissing",
    "ConditionalOnMissingClass",
];

/// 预编译的自动装配元数据索引
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AutoConfigurationMetadata {
    properties: BTreeMap<String, String>,
    processed: BTreeSet<String>,
}

impl AutoConfigurationMetadata {
    /// 创建空索引
    pub fn empty() -> Self {
        Self::default()
    }

    /// 从 properties 文本解析索引
    pub fn parse(content: &str) -> Self {
        Self::from_properties(parse_properties(content))
    }

    /// 从键值对创建索引
    pub fn from_properties(properties: BTreeMap<String, String>) -> Self {
        let processed = properties.keys().map(|key| owning_class(key).to_string()).collect();
        Self {
            properties,
            processed,
        }
    }

    /// 合并另一份索引，已存在的键保持不变
    pub fn merge(&mut self, other: AutoConfigurationMetadata) {
        for (key, value) in other.properties {
            self.properties.entry(key).or_insert(value);
        }
        self.processed.extend(other.processed);
    }

    /// 类是否出现在索引中
    pub fn was_processed(&self, class_name: &str) -> bool {
        self.processed.contains(class_name)
    }

    /// 获取原始值
    pub fn get(&self, class_name: &str, key: &str) -> Option<&str> {
        self.properties
            .get(&format!("{}.{}", class_name, key))
            .map(String::as_str)
    }

    /// 获取原始值，缺失时返回默认值
    pub fn get_or<'a>(&'a self, class_name: &str, key: &str, default: &'a str) -> &'a str {
        self.get(class_name, key).unwrap_or(default)
    }

    /// 获取整数值
    pub fn get_integer(&self, class_name: &str, key: &str) -> AutoConfigResult<Option<i32>> {
        match self.get(class_name, key) {
            None => Ok(None),
            Some(value) => value.trim().parse::<i32>().map(Some).map_err(|e| {
                AutoConfigError::invalid_attribute(class_name, key, format!("'{}' 不是有效的整数: {}", value, e))
            }),
        }
    }

    /// 获取逗号分隔的集合值，保持声明顺序
    pub fn get_set(&self, class_name: &str, key: &str) -> Option<Vec<String>> {
        self.get(class_name, key).map(split_comma_delimited)
    }

    /// 索引中的全部类
    pub fn processed_classes(&self) -> impl Iterator<Item = &str> {
        self.processed.iter().map(String::as_str)
    }

    /// 索引是否为空
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

fn owning_class(key: &str) -> &str {
    INDEX_KEYS
        .iter()
        .find_map(|suffix| {
            key.strip_suffix(suffix)
                .and_then(|rest| rest.strip_suffix('.'))
        })
        .unwrap_or(key)
}

/// 索引加载器 trait
pub trait MetadataIndexLoader: Send + Sync {
    /// 加载索引
    fn load(&self) -> AutoConfigResult<AutoConfigurationMetadata>;
}

impl MetadataIndexLoader for AutoConfigurationMetadata {
    fn load(&self) -> AutoConfigResult<AutoConfigurationMetadata> {
        Ok(self.clone())
    }
}

/// 从 properties 文本延迟解析索引
#[derive(Debug, Clone)]
pub struct PropertiesMetadataIndexLoader {
    content: String,
}

impl PropertiesMetadataIndexLoader {
    /// 创建加载器
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

impl MetadataIndexLoader for PropertiesMetadataIndexLoader {
    fn load(&self) -> AutoConfigResult<AutoConfigurationMetadata> {
        Ok(AutoConfigurationMetadata::parse(&self.content))
    }
}

/// 元数据来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataSource {
    /// 预编译索引
    Index,
    /// 直接读取
    Reader,
}

/// 单个自动装配类的元数据
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoConfigurationMetadataEntry {
    /// 类标识
    pub class_name: String,
    /// 来源
    pub source: MetadataSource,
    /// 顺序值，越小越靠前
    pub order: i32,
    /// 需在这些类之前装配
    pub before: Vec<String>,
    /// 需在这些类之后装配
    pub after: Vec<String>,
    /// 要求存在的类
    pub on_class: Vec<String>,
    /// 要求不存在的类
    pub on_missing_class: Vec<String>,
    /// `ConditionalOnBean` 引用的组件类型
    pub on_bean_types: Vec<String>,
    /// `ConditionalOnSingleCandidate` 引用的组件类型
    pub on_single_candidate_types: Vec<String>,
    /// 完整的组件条件（仅直接读取时可用）
    pub bean_conditions: Vec<BeanConditionSpec>,
    /// 属性条件
    pub property_conditions: Vec<PropertyConditionSpec>,
    /// Web 环境条件
    pub web_condition: Option<WebConditionSpec>,
}

impl AutoConfigurationMetadataEntry {
    /// 创建没有任何注解信息的条目
    pub fn empty(class_name: impl Into<String>, source: MetadataSource) -> Self {
        Self {
            class_name: class_name.into(),
            source,
            order: DEFAULT_ORDER,
            before: Vec::new(),
            after: Vec::new(),
            on_class: Vec::new(),
            on_missing_class: Vec::new(),
            on_bean_types: Vec::new(),
            on_single_candidate_types: Vec::new(),
            bean_conditions: Vec::new(),
            property_conditions: Vec::new(),
            web_condition: None,
        }
    }

    /// 从预编译索引构建
    pub fn from_index(class_name: &str, index: &AutoConfigurationMetadata) -> AutoConfigResult<Self> {
        let mut entry = Self::empty(class_name, MetadataSource::Index);
        entry.order = index
            .get_integer(class_name, "AutoConfigureOrder")?
            .unwrap_or(DEFAULT_ORDER);
        entry.before = index.get_set(class_name, "AutoConfigureBefore").unwrap_or_default();
        entry.after = index.get_set(class_name, "AutoConfigureAfter").unwrap_or_default();
        entry.on_class = index.get_set(class_name, "ConditionalOnClass").unwrap_or_default();
        entry.on_missing_class = index
            .get_set(class_name, "ConditionalOnMissingClass")
            .unwrap_or_default();
        entry.on_bean_types = index.get_set(class_name, "ConditionalOnBean").unwrap_or_default();
        entry.on_single_candidate_types = index
            .get_set(class_name, "ConditionalOnSingleCandidate")
            .unwrap_or_default();
        entry.web_condition = index
            .get(class_name, "ConditionalOnWebApplication")
            .map(|value| WebConditionSpec::from_index_value(class_name, value))
            .transpose()?;
        entry.property_conditions = PropertyConditionSpec::from_index(class_name, index)?
            .into_iter()
            .collect();
        Ok(entry)
    }

    /// 从直接读取的类元数据构建
    pub fn from_class_metadata(metadata: &ClassMetadata) -> AutoConfigResult<Self> {
        let class_name = metadata.class_name.as_str();
        let mut entry = Self::empty(class_name, MetadataSource::Reader);

        if let Some(order) = metadata
            .annotation(AnnotationKind::AutoConfigureOrder)
            .and_then(|a| a.get_integer("value"))
        {
            entry.order = i32::try_from(order).map_err(|_| {
                AutoConfigError::invalid_attribute(
                    class_name,
                    AnnotationKind::AutoConfigureOrder.to_string(),
                    format!("顺序值 {} 超出范围", order),
                )
            })?;
        }

        entry.before = class_references(metadata, AnnotationKind::AutoConfigureBefore);
        entry.after = class_references(metadata, AnnotationKind::AutoConfigureAfter);
        entry.on_class = class_references(metadata, AnnotationKind::ConditionalOnClass);
        entry.on_missing_class = class_references(metadata, AnnotationKind::ConditionalOnMissingClass);

        for kind in BeanConditionKind::ALL {
            for attributes in metadata.all_annotations(kind.annotation()) {
                let spec = BeanConditionSpec::from_attributes(class_name, kind, attributes)?;
                match kind {
                    BeanConditionKind::OnBean => entry.on_bean_types.extend(spec.types.iter().cloned()),
                    BeanConditionKind::OnSingleCandidate => entry
                        .on_single_candidate_types
                        .extend(spec.types.iter().cloned()),
                    BeanConditionKind::OnMissingBean => {}
                }
                entry.bean_conditions.push(spec);
            }
        }

        for attributes in metadata.all_annotations(AnnotationKind::ConditionalOnProperty) {
            entry
                .property_conditions
                .push(PropertyConditionSpec::from_attributes(class_name, attributes)?);
        }

        entry.web_condition = WebConditionSpec::from_class_metadata(metadata)?;
        Ok(entry)
    }
}

/// 合并同一注解所有实例上 `value` 与 `name` 声明的类
fn class_references(metadata: &ClassMetadata, kind: AnnotationKind) -> Vec<String> {
    let mut classes = Vec::new();
    for attributes in metadata.all_annotations(kind) {
        push_unique(&mut classes, attributes_classes(attributes));
    }
    classes
}

fn attributes_classes(attributes: &AnnotationAttributes) -> Vec<String> {
    let mut classes = attributes.get_string_list("value");
    classes.extend(attributes.get_string_list("name"));
    classes
}

fn push_unique(target: &mut Vec<String>, items: Vec<String>) {
    for item in items {
        if !target.contains(&item) {
            target.push(item);
        }
    }
}

/// 自动装配元数据缓存
///
/// 索引在第一次访问时加载且只加载一次；每个类的条目在第一次访问时构建，
/// 之后不再变化。并发的首次访问由分片写锁保证只构建一次。
pub struct AutoConfigurationMetadataCache {
    reader: Arc<dyn MetadataReader>,
    index_loader: Box<dyn MetadataIndexLoader>,
    index: OnceCell<AutoConfigurationMetadata>,
    entries: DashMap<String, Option<Arc<AutoConfigurationMetadataEntry>>>,
}

impl fmt::Debug for AutoConfigurationMetadataCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AutoConfigurationMetadataCache")
            .field("index_loaded", &self.index.get().is_some())
            .field("entries", &self.entries.len())
            .finish()
    }
}

impl AutoConfigurationMetadataCache {
    /// 创建只使用直接读取的缓存
    pub fn new(reader: Arc<dyn MetadataReader>) -> Self {
        Self::with_index_loader(reader, Box::new(AutoConfigurationMetadata::empty()))
    }

    /// 创建带预编译索引的缓存
    pub fn with_index_loader(reader: Arc<dyn MetadataReader>, index_loader: Box<dyn MetadataIndexLoader>) -> Self {
        Self {
            reader,
            index_loader,
            index: OnceCell::new(),
            entries: DashMap::new(),
        }
    }

    /// 获取预编译索引
    pub fn index(&self) -> AutoConfigResult<&AutoConfigurationMetadata> {
        self.index.get_or_try_init(|| {
            let index = self.index_loader.load()?;
            info!("加载自动装配元数据索引，共 {} 个类", index.processed_classes().count());
            Ok(index)
        })
    }

    /// 获取类的元数据条目
    ///
    /// 找不到任何元数据时返回 `Ok(None)`，元数据格式错误时返回
    /// [`AutoConfigError::MetadataUnreadable`]
    pub fn entry(&self, class_name: &str) -> AutoConfigResult<Option<Arc<AutoConfigurationMetadataEntry>>> {
        if let Some(cached) = self.entries.get(class_name) {
            return Ok(cached.value().clone());
        }

        match self.entries.entry(class_name.to_string()) {
            MapEntry::Occupied(occupied) => Ok(occupied.get().clone()),
            MapEntry::Vacant(vacant) => {
                let loaded = self.load_entry(class_name)?.map(Arc::new);
                vacant.insert(loaded.clone());
                Ok(loaded)
            }
        }
    }

    /// 获取类的元数据条目，找不到时返回中性条目
    pub fn entry_or_empty(&self, class_name: &str) -> AutoConfigResult<Arc<AutoConfigurationMetadataEntry>> {
        Ok(self.entry(class_name)?.unwrap_or_else(|| {
            Arc::new(AutoConfigurationMetadataEntry::empty(class_name, MetadataSource::Reader))
        }))
    }

    fn load_entry(&self, class_name: &str) -> AutoConfigResult<Option<AutoConfigurationMetadataEntry>> {
        let index = self.index()?;
        if index.was_processed(class_name) {
            trace!("从索引构建元数据: {}", class_name);
            return AutoConfigurationMetadataEntry::from_index(class_name, index).map(Some);
        }

        match self.reader.read(class_name) {
            Ok(metadata) => {
                trace!("从元数据读取器构建元数据: {}", class_name);
                AutoConfigurationMetadataEntry::from_class_metadata(&metadata).map(Some)
            }
            Err(MetadataError::NotFound { .. }) => {
                debug!("找不到类的元数据: {}", class_name);
                Ok(None)
            }
            Err(MetadataError::Malformed { class_name, message }) => {
                Err(AutoConfigError::MetadataUnreadable { class_name, message })
            }
        }
    }
}
