//! 元数据定义
//!
//! 提供类级别注解属性的强类型表示，不依赖具体的元数据来源（预编译索引或直接读取）。

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// 最高优先级
pub const HIGHEST_PRECEDENCE: i32 = i32::MIN;

/// 最低优先级
pub const LOWEST_PRECEDENCE: i32 = i32::MAX;

/// 自动装配类的默认顺序值，排在所有显式声明顺序的类之后
pub const DEFAULT_ORDER: i32 = LOWEST_PRECEDENCE;

/// 注解种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AnnotationKind {
    /// 开启自动装配的入口注解
    EnableAutoConfiguration,
    /// 自动装配顺序
    AutoConfigureOrder,
    /// 在指定类之前装配
    AutoConfigureBefore,
    /// 在指定类之后装配
    AutoConfigureAfter,
    /// 要求类存在
    ConditionalOnClass,
    /// 要求类不存在
    ConditionalOnMissingClass,
    /// 要求组件存在
    ConditionalOnBean,
    /// 要求组件不存在
    ConditionalOnMissingBean,
    /// 要求唯一候选组件
    ConditionalOnSingleCandidate,
    /// 要求属性匹配
    ConditionalOnProperty,
    /// 要求是 Web 应用
    ConditionalOnWebApplication,
    /// 要求不是 Web 应用
    ConditionalOnNotWebApplication,
}

impl AnnotationKind {
    /// 所有注解种类
    pub const ALL: [AnnotationKind; 12] = [
        Self::EnableAutoConfiguration,
        Self::AutoConfigureOrder,
        Self::AutoConfigureBefore,
        Self::AutoConfigureAfter,
        Self::ConditionalOnClass,
        Self::ConditionalOnMissingClass,
        Self::ConditionalOnBean,
        Self::ConditionalOnMissingBean,
        Self::ConditionalOnSingleCandidate,
        Self::ConditionalOnProperty,
        Self::ConditionalOnWebApplication,
        Self::ConditionalOnNotWebApplication,
    ];

    /// 注解名称，同时也是元数据索引中使用的键
    pub fn name(&self) -> &'static str {
        match self {
            Self::EnableAutoConfiguration => "EnableAutoConfiguration",
            Self::AutoConfigureOrder => "AutoConfigureOrder",
            Self::AutoConfigureBefore => "AutoConfigureBefore",
            Self::AutoConfigureAfter => "AutoConfigureAfter",
            Self::ConditionalOnClass => "ConditionalOnClass",
            Self::ConditionalOnMissingClass => "ConditionalOnMissingClass",
            Self::ConditionalOnBean => "ConditionalOnBean",
            Self::ConditionalOnMissingBean => "ConditionalOnMissingBean",
            Self::ConditionalOnSingleCandidate => "ConditionalOnSingleCandidate",
            Self::ConditionalOnProperty => "ConditionalOnProperty",
            Self::ConditionalOnWebApplication => "ConditionalOnWebApplication",
            Self::ConditionalOnNotWebApplication => "ConditionalOnNotWebApplication",
        }
    }

    /// 根据名称查找注解种类
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

impl fmt::Display for AnnotationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.name())
    }
}

/// 注解属性值
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// 布尔值
    Boolean(bool),
    /// 整数值
    Integer(i64),
    /// 字符串
    String(String),
    /// 字符串列表
    StringList(Vec<String>),
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for AttributeValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<Vec<String>> for AttributeValue {
    fn from(value: Vec<String>) -> Self {
        Self::StringList(value)
    }
}

impl From<Vec<&str>> for AttributeValue {
    fn from(value: Vec<&str>) -> Self {
        Self::StringList(value.into_iter().map(str::to_string).collect())
    }
}

/// 单个注解的属性集合
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationAttributes {
    /// 注解种类
    pub annotation: AnnotationKind,
    /// 属性值
    pub values: BTreeMap<String, AttributeValue>,
}

impl AnnotationAttributes {
    /// 创建空的注解属性
    pub fn new(annotation: AnnotationKind) -> Self {
        Self {
            annotation,
            values: BTreeMap::new(),
        }
    }

    /// 设置属性
    pub fn with(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// 获取原始属性值
    pub fn get(&self, key: &str) -> Option<&AttributeValue> {
        self.values.get(key)
    }

    /// 是否包含属性
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// 获取字符串属性
    pub fn get_string(&self, key: &str) -> Option<&str> {
        match self.values.get(key) {
            Some(AttributeValue::String(value)) => Some(value),
            _ => None,
        }
    }

    /// 获取字符串列表属性，单个字符串视为单元素列表，缺失时返回空列表
    pub fn get_string_list(&self, key: &str) -> Vec<String> {
        match self.values.get(key) {
            Some(AttributeValue::StringList(values)) => values.clone(),
            Some(AttributeValue::String(value)) if !value.is_empty() => vec![value.clone()],
            _ => Vec::new(),
        }
    }

    /// 获取整数属性
    pub fn get_integer(&self, key: &str) -> Option<i64> {
        match self.values.get(key) {
            Some(AttributeValue::Integer(value)) => Some(*value),
            _ => None,
        }
    }

    /// 获取布尔属性
    pub fn get_boolean(&self, key: &str) -> Option<bool> {
        match self.values.get(key) {
            Some(AttributeValue::Boolean(value)) => Some(*value),
            _ => None,
        }
    }
}

/// 类元数据
///
/// 由元数据读取器提供，包含类上声明的全部注解属性。可重复注解（例如多个
/// `ConditionalOnProperty`）按声明顺序保留。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassMetadata {
    /// 类标识
    pub class_name: String,
    /// 注解属性列表
    pub annotations: Vec<AnnotationAttributes>,
}

impl ClassMetadata {
    /// 创建新的类元数据
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            annotations: Vec::new(),
        }
    }

    /// 添加注解
    pub fn with_annotation(mut self, attributes: AnnotationAttributes) -> Self {
        self.annotations.push(attributes);
        self
    }

    /// 获取第一个指定种类的注解
    pub fn annotation(&self, kind: AnnotationKind) -> Option<&AnnotationAttributes> {
        self.annotations.iter().find(|a| a.annotation == kind)
    }

    /// 获取所有指定种类的注解
    pub fn all_annotations(&self, kind: AnnotationKind) -> impl Iterator<Item = &AnnotationAttributes> {
        self.annotations.iter().filter(move |a| a.annotation == kind)
    }

    /// 是否标注了指定种类的注解
    pub fn is_annotated(&self, kind: AnnotationKind) -> bool {
        self.annotation(kind).is_some()
    }

    /// 获取简短类名
    pub fn short_name(&self) -> &str {
        short_name(&self.class_name)
    }
}

/// 获取类标识的简短名称（去掉包路径或模块路径）
pub fn short_name(class_name: &str) -> &str {
    let after_module = class_name.rsplit("::").next().unwrap_or(class_name);
    after_module.rsplit('.').next().unwrap_or(after_module)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_annotation_kind_name_round_trip() {
        for kind in AnnotationKind::ALL {
            assert_eq!(AnnotationKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(AnnotationKind::from_name("Unknown"), None);
    }

    #[test]
    fn test_string_list_accepts_single_string() {
        let attributes = AnnotationAttributes::new(AnnotationKind::ConditionalOnClass)
            .with("value", "com.example.Lib")
            .with("name", vec!["a.B", "c.D"]);

        assert_eq!(attributes.get_string_list("value"), vec!["com.example.Lib"]);
        assert_eq!(attributes.get_string_list("name"), vec!["a.B", "c.D"]);
        assert!(attributes.get_string_list("missing").is_empty());
    }

    #[test]
    fn test_repeatable_annotations_keep_order() {
        let metadata = ClassMetadata::new("x.AutoConf")
            .with_annotation(
                AnnotationAttributes::new(AnnotationKind::ConditionalOnProperty).with("name", "a"),
            )
            .with_annotation(
                AnnotationAttributes::new(AnnotationKind::ConditionalOnProperty).with("name", "b"),
            );

        let names: Vec<_> = metadata
            .all_annotations(AnnotationKind::ConditionalOnProperty)
            .filter_map(|a| a.get_string("name"))
            .collect();
        assert_eq!(names, vec!["a", "b"]);
        assert!(!metadata.is_annotated(AnnotationKind::ConditionalOnBean));
    }

    #[test]
    fn test_short_name() {
        assert_eq!(short_name("com.example.DataSourceAutoConfiguration"), "DataSourceAutoConfiguration");
        assert_eq!(short_name("lorn_web::servlet::Context"), "Context");
        assert_eq!(short_name("Plain"), "Plain");
    }
}
