//! 属性源抽象接口

use async_trait::async_trait;
use infrastructure_common::ConfigError;
use std::fmt::Debug;
use std::path::Path;

/// 属性源 trait
///
/// 定义从不同数据源读取扁平化属性（`a.b.c` 形式的键）的统一接口
pub trait PropertySource: Send + Sync + Debug {
    /// 获取属性源名称
    fn name(&self) -> &str;

    /// 获取属性值
    fn get_property(&self, key: &str) -> Option<String>;

    /// 检查属性是否存在
    fn contains_property(&self, key: &str) -> bool {
        self.get_property(key).is_some()
    }

    /// 获取所有属性键
    fn property_names(&self) -> Vec<String>;

    /// 获取属性源优先级，数值越高越先被查询
    fn priority(&self) -> i32 {
        0
    }
}

/// 属性解析器 trait
///
/// 条件过滤与排除逻辑只依赖此接口读取属性
pub trait PropertyResolver: Send + Sync {
    /// 检查属性是否存在
    fn contains_property(&self, key: &str) -> bool;

    /// 获取属性值
    fn get_property(&self, key: &str) -> Option<String>;

    /// 获取字符串列表属性
    ///
    /// 支持逗号分隔的单值形式（`key=a,b`）以及索引形式（`key[0]=a`、`key[1]=b`）
    fn get_property_list(&self, key: &str) -> Option<Vec<String>> {
        if let Some(value) = self.get_property(key) {
            return Some(split_comma_delimited(&value));
        }

        let mut values = Vec::new();
        while let Some(value) = self.get_property(&format!("{}[{}]", key, values.len())) {
            values.push(value.trim().to_string());
        }

        if values.is_empty() {
            None
        } else {
            Some(values)
        }
    }

    /// 获取布尔属性，缺失时返回默认值
    fn get_bool(&self, key: &str, default: bool) -> Result<bool, ConfigError> {
        match self.get_property(key) {
            None => Ok(default),
            Some(value) => match value.trim().to_ascii_lowercase().as_str() {
                "true" => Ok(true),
                "false" => Ok(false),
                other => Err(ConfigError::TypeConversionError {
                    message: format!("属性 {} 的值 '{}' 不是有效的布尔值", key, other),
                }),
            },
        }
    }
}

/// 应用类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ApplicationKind {
    /// 非 Web 应用
    #[default]
    Standard,
    /// 基于 Servlet 的 Web 应用
    Servlet,
    /// 响应式 Web 应用
    Reactive,
}

/// 运行环境 trait
///
/// 在属性解析之外，提供应用类型信息供 Web 环境条件判断
pub trait Environment: PropertyResolver {
    /// 获取应用类型
    fn application_kind(&self) -> ApplicationKind {
        ApplicationKind::Standard
    }
}

/// 文件属性源加载器 trait
#[async_trait]
pub trait PropertySourceLoader: Send + Sync {
    /// 获取加载器名称
    fn name(&self) -> &str;

    /// 支持的文件扩展名
    fn file_extensions(&self) -> &[&'static str];

    /// 检查是否支持指定文件
    fn supports(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                self.file_extensions()
                    .iter()
                    .any(|candidate| candidate.eq_ignore_ascii_case(ext))
            })
            .unwrap_or(false)
    }

    /// 从文件加载属性源
    async fn load(&self, path: &Path) -> Result<Box<dyn PropertySource>, ConfigError>;
}

/// 按逗号拆分字符串，去除空白并丢弃空项
pub fn split_comma_delimited(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapResolver(HashMap<String, String>);

    impl PropertyResolver for MapResolver {
        fn contains_property(&self, key: &str) -> bool {
            self.0.contains_key(key)
        }

        fn get_property(&self, key: &str) -> Option<String> {
            self.0.get(key).cloned()
        }
    }

    fn resolver(pairs: &[(&str, &str)]) -> MapResolver {
        MapResolver(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_property_list_from_comma_delimited_value() {
        let resolver = resolver(&[("lorn.autoconfigure.exclude", " a.A , b.B ,,")]);
        assert_eq!(
            resolver.get_property_list("lorn.autoconfigure.exclude"),
            Some(vec!["a.A".to_string(), "b.B".to_string()])
        );
    }

    #[test]
    fn test_property_list_from_indexed_keys() {
        let resolver = resolver(&[("list[0]", "first"), ("list[1]", "second"), ("list[3]", "gap")]);
        assert_eq!(
            resolver.get_property_list("list"),
            Some(vec!["first".to_string(), "second".to_string()])
        );
        assert_eq!(resolver.get_property_list("absent"), None);
    }

    #[test]
    fn test_get_bool() {
        let resolver = resolver(&[("on", "TRUE"), ("off", "false"), ("bad", "maybe")]);
        assert!(resolver.get_bool("on", false).unwrap());
        assert!(!resolver.get_bool("off", true).unwrap());
        assert!(resolver.get_bool("missing", true).unwrap());
        assert!(matches!(
            resolver.get_bool("bad", true),
            Err(ConfigError::TypeConversionError { .. })
        ));
    }
}
