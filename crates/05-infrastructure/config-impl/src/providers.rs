//! 属性源实现

use config_abstractions::PropertySource;
use infrastructure_common::ConfigError;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

/// 内存属性源
#[derive(Debug, Clone)]
pub struct MapPropertySource {
    name: String,
    properties: BTreeMap<String, String>,
    priority: i32,
}

impl MapPropertySource {
    /// 创建新的内存属性源
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: BTreeMap::new(),
            priority: 0,
        }
    }

    /// 从键值对创建
    pub fn from_pairs<K, V, I>(name: impl Into<String>, pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut source = Self::new(name);
        for (key, value) in pairs {
            source.properties.insert(key.into(), value.into());
        }
        source
    }

    /// 添加属性
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// 设置优先级
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// 设置属性
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.properties.insert(key.into(), value.into());
    }
}

impl PropertySource for MapPropertySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_property(&self, key: &str) -> Option<String> {
        self.properties.get(key).cloned()
    }

    fn property_names(&self) -> Vec<String> {
        self.properties.keys().cloned().collect()
    }

    fn priority(&self) -> i32 {
        self.priority
    }
}

/// 环境变量属性源
///
/// 按宽松规则映射属性名：`feature.enabled` 对应 `PREFIX_FEATURE_ENABLED`，
/// 点号与短横线都被替换为下划线，并统一转为大写。
#[derive(Debug, Clone)]
pub struct SystemEnvironmentPropertySource {
    prefix: String,
    variables: BTreeMap<String, String>,
    priority: i32,
}

impl SystemEnvironmentPropertySource {
    /// 从当前进程环境变量创建
    pub fn new(prefix: impl Into<String>) -> Self {
        Self::from_variables(prefix, std::env::vars())
    }

    /// 从给定变量集合创建
    pub fn from_variables<I>(prefix: impl Into<String>, variables: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let prefix = prefix.into().to_ascii_uppercase();
        let variables: BTreeMap<String, String> = variables
            .into_iter()
            .filter(|(key, _)| prefix.is_empty() || key.starts_with(&format!("{}_", prefix)))
            .collect();

        debug!("加载环境变量属性源: prefix={}, count={}", prefix, variables.len());

        Self {
            prefix,
            variables,
            priority: 200,
        }
    }

    /// 设置优先级
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// 将属性名转换为环境变量名
    pub fn variable_name(&self, key: &str) -> String {
        let relaxed: String = key
            .chars()
            .map(|c| match c {
                '.' | '-' | '[' => '_',
                ']' => '\0',
                other => other.to_ascii_uppercase(),
            })
            .filter(|c| *c != '\0')
            .collect();

        if self.prefix.is_empty() {
            relaxed
        } else {
            format!("{}_{}", self.prefix, relaxed)
        }
    }
}

impl PropertySource for SystemEnvironmentPropertySource {
    fn name(&self) -> &str {
        "systemEnvironment"
    }

    fn get_property(&self, key: &str) -> Option<String> {
        self.variables.get(&self.variable_name(key)).cloned()
    }

    fn property_names(&self) -> Vec<String> {
        let strip = if self.prefix.is_empty() {
            0
        } else {
            self.prefix.len() + 1
        };
        self.variables
            .keys()
            .map(|key| key[strip..].to_ascii_lowercase().replace('_', "."))
            .collect()
    }

    fn priority(&self) -> i32 {
        self.priority
    }
}

/// 扁平化的文件属性源
///
/// TOML、JSON 与 properties 文件加载后都转换为此类型：嵌套表展开为点号键，
/// 数组展开为 `key[i]`，同时保留逗号拼接的 `key`。
#[derive(Debug, Clone)]
pub struct FlattenedPropertySource {
    name: String,
    properties: BTreeMap<String, String>,
    priority: i32,
}

impl FlattenedPropertySource {
    /// 从 TOML 文本创建
    pub fn from_toml_str(name: impl Into<String>, content: &str) -> Result<Self, ConfigError> {
        let value: toml::Value = toml::from_str(content).map_err(|e| ConfigError::ParseError {
            source: Box::new(e),
        })?;
        let json = toml_to_json(&value);
        Ok(Self::from_json_value(name, &json).with_priority(100))
    }

    /// 从 JSON 文本创建
    pub fn from_json_str(name: impl Into<String>, content: &str) -> Result<Self, ConfigError> {
        let value: Value = serde_json::from_str(content)?;
        if !value.is_object() {
            return Err(ConfigError::TypeConversionError {
                message: "JSON 配置的根节点必须是对象".to_string(),
            });
        }
        Ok(Self::from_json_value(name, &value).with_priority(90))
    }

    /// 从 `key=value` 文本创建
    pub fn from_properties_str(name: impl Into<String>, content: &str) -> Self {
        Self {
            name: name.into(),
            properties: parse_properties(content),
            priority: 80,
        }
    }

    /// 从 JSON 值创建
    pub fn from_json_value(name: impl Into<String>, value: &Value) -> Self {
        let mut properties = BTreeMap::new();
        flatten_json(String::new(), value, &mut properties);
        Self {
            name: name.into(),
            properties,
            priority: 0,
        }
    }

    /// 设置优先级
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

impl PropertySource for FlattenedPropertySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_property(&self, key: &str) -> Option<String> {
        self.properties.get(key).cloned()
    }

    fn property_names(&self) -> Vec<String> {
        self.properties.keys().cloned().collect()
    }

    fn priority(&self) -> i32 {
        self.priority
    }
}

/// 将 TOML 值转换为 JSON 值
fn toml_to_json(value: &toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s.clone()),
        toml::Value::Integer(i) => Value::Number(serde_json::Number::from(*i)),
        toml::Value::Float(f) => Value::Number(
            serde_json::Number::from_f64(*f).unwrap_or_else(|| serde_json::Number::from(0)),
        ),
        toml::Value::Boolean(b) => Value::Bool(*b),
        toml::Value::Array(arr) => Value::Array(arr.iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .iter()
                .map(|(k, v)| (k.clone(), toml_to_json(v)))
                .collect(),
        ),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
    }
}

/// 递归展开 JSON 值
fn flatten_json(prefix: String, value: &Value, out: &mut BTreeMap<String, String>) {
    match value {
        Value::Object(map) => {
            for (key, nested) in map {
                let full_key = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", prefix, key)
                };
                flatten_json(full_key, nested, out);
            }
        }
        Value::Array(items) => {
            let mut joined = Vec::with_capacity(items.len());
            for (index, item) in items.iter().enumerate() {
                if let Some(scalar) = scalar_to_string(item) {
                    joined.push(scalar);
                }
                flatten_json(format!("{}[{}]", prefix, index), item, out);
            }
            if joined.len() == items.len() && !prefix.is_empty() {
                out.insert(prefix, joined.join(","));
            }
        }
        Value::Null => {
            if !prefix.is_empty() {
                out.insert(prefix, String::new());
            }
        }
        scalar => {
            if let Some(text) = scalar_to_string(scalar) {
                out.insert(prefix, text);
            }
        }
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// 解析 `key=value` 格式文本
///
/// 支持 `#`、`!` 注释，`=` 或 `:` 分隔符，以及行尾反斜杠续行
pub fn parse_properties(content: &str) -> BTreeMap<String, String> {
    let mut properties = BTreeMap::new();
    let mut pending = String::new();

    for raw_line in content.lines() {
        let line = raw_line.trim();
        if pending.is_empty() && (line.is_empty() || line.starts_with('#') || line.starts_with('!')) {
            continue;
        }

        if let Some(continued) = line.strip_suffix('\\') {
            pending.push_str(continued);
            continue;
        }

        pending.push_str(line);
        let logical = std::mem::take(&mut pending);
        if let Some((key, value)) = split_property_line(&logical) {
            properties.insert(key, value);
        }
    }

    if !pending.is_empty() {
        if let Some((key, value)) = split_property_line(&pending) {
            properties.insert(key, value);
        }
    }

    properties
}

fn split_property_line(line: &str) -> Option<(String, String)> {
    let separator = find_separator(line)?;
    let key = line[..separator].trim();
    if key.is_empty() {
        return None;
    }
    Some((key.to_string(), line[separator + 1..].trim().to_string()))
}

/// 查找键值分隔符，`::` 属于路径名而不是分隔符
fn find_separator(line: &str) -> Option<usize> {
    let bytes = line.as_bytes();
    (0..bytes.len()).find(|&index| match bytes[index] {
        b'=' => true,
        b':' => {
            let before = index > 0 && bytes[index - 1] == b':';
            let after = bytes.get(index + 1) == Some(&b':');
            !before && !after
        }
        _ => false,
    })
}
