//! 扩展点清单加载器实现

use config_abstractions::split_comma_delimited;
use config_impl::parse_properties;
use di_abstractions::FactoriesLoader;
use infrastructure_common::ConfigError;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

/// 基于 properties 清单文件的扩展点加载器
///
/// 清单格式为 `扩展点=实现1,实现2`，支持反斜杠续行。多个清单按加载顺序合并，
/// 同一扩展点下重复出现的实现只保留第一次出现的位置。
#[derive(Debug, Default)]
pub struct PropertiesFactoriesLoader {
    factories: RwLock<BTreeMap<String, Vec<String>>>,
}

impl PropertiesFactoriesLoader {
    /// 创建空的加载器
    pub fn new() -> Self {
        Self::default()
    }

    /// 从清单文本创建
    pub fn from_manifest(content: &str) -> Self {
        let loader = Self::new();
        loader.merge_str(content);
        loader
    }

    /// 直接声明扩展点实现
    pub fn with_factories<I, S>(self, extension_point: impl Into<String>, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        self.merge(extension_point.into(), names);
        self
    }

    /// 合并清单文本
    pub fn merge_str(&self, content: &str) {
        for (extension_point, value) in parse_properties(content) {
            self.merge(extension_point, split_comma_delimited(&value));
        }
    }

    /// 合并清单文件
    pub async fn merge_file(&self, path: &Path) -> Result<(), ConfigError> {
        if !tokio::fs::try_exists(path).await? {
            return Err(ConfigError::FileNotFound {
                path: path.display().to_string(),
            });
        }
        let content = tokio::fs::read_to_string(path).await?;
        self.merge_str(&content);
        info!("加载扩展点清单: {}", path.display());
        Ok(())
    }

    fn merge(&self, extension_point: String, names: Vec<String>) {
        let mut factories = self.factories.write();
        let entry = factories.entry(extension_point.clone()).or_default();
        for name in names {
            if !entry.contains(&name) {
                entry.push(name);
            }
        }
        debug!("扩展点 {} 当前共有 {} 个实现", extension_point, entry.len());
    }
}

impl FactoriesLoader for PropertiesFactoriesLoader {
    fn load_factory_names(&self, extension_point: &str) -> Vec<String> {
        self.factories
            .read()
            .get(extension_point)
            .cloned()
            .unwrap_or_default()
    }
}
