//! 文件属性源加载器实现

use crate::providers::FlattenedPropertySource;
use async_trait::async_trait;
use config_abstractions::{PropertySource, PropertySourceLoader};
use infrastructure_common::ConfigError;
use std::path::Path;
use tracing::{debug, info};

async fn read_file(path: &Path) -> Result<String, ConfigError> {
    if !tokio::fs::try_exists(path).await? {
        return Err(ConfigError::FileNotFound {
            path: path.display().to_string(),
        });
    }
    let content = tokio::fs::read_to_string(path).await?;
    debug!("读取配置文件: {}, 长度: {}", path.display(), content.len());
    Ok(content)
}

/// TOML 属性源加载器
#[derive(Debug, Default)]
pub struct TomlPropertySourceLoader;

#[async_trait]
impl PropertySourceLoader for TomlPropertySourceLoader {
    fn name(&self) -> &str {
        "TomlPropertySourceLoader"
    }

    fn file_extensions(&self) -> &[&'static str] {
        &["toml"]
    }

    async fn load(&self, path: &Path) -> Result<Box<dyn PropertySource>, ConfigError> {
        let content = read_file(path).await?;
        let source = FlattenedPropertySource::from_toml_str(path.display().to_string(), &content)?;
        info!("加载 TOML 属性源: {}", path.display());
        Ok(Box::new(source))
    }
}

/// JSON 属性源加载器
#[derive(Debug, Default)]
pub struct JsonPropertySourceLoader;

#[async_trait]
impl PropertySourceLoader for JsonPropertySourceLoader {
    fn name(&self) -> &str {
        "JsonPropertySourceLoader"
    }

    fn file_extensions(&self) -> &[&'static str] {
        &["json"]
    }

    async fn load(&self, path: &Path) -> Result<Box<dyn PropertySource>, ConfigError> {
        let content = read_file(path).await?;
        let source = FlattenedPropertySource::from_json_str(path.display().to_string(), &content)?;
        info!("加载 JSON 属性源: {}", path.display());
        Ok(Box::new(source))
    }
}

/// properties 属性源加载器
#[derive(Debug, Default)]
pub struct PropertiesPropertySourceLoader;

#[async_trait]
impl PropertySourceLoader for PropertiesPropertySourceLoader {
    fn name(&self) -> &str {
        "PropertiesPropertySourceLoader"
    }

    fn file_extensions(&self) -> &[&'static str] {
        &["properties"]
    }

    async fn load(&self, path: &Path) -> Result<Box<dyn PropertySource>, ConfigError> {
        let content = read_file(path).await?;
        let source = FlattenedPropertySource::from_properties_str(path.display().to_string(), &content);
        info!("加载 properties 属性源: {}", path.display());
        Ok(Box::new(source))
    }
}

/// 按扩展名选择加载器并加载文件
pub async fn load_property_source(path: &Path) -> Result<Box<dyn PropertySource>, ConfigError> {
    let loaders: [&dyn PropertySourceLoader; 3] = [
        &TomlPropertySourceLoader,
        &JsonPropertySourceLoader,
        &PropertiesPropertySourceLoader,
    ];

    for loader in loaders {
        if loader.supports(path) {
            return loader.load(path).await;
        }
    }

    Err(ConfigError::UnsupportedFormat {
        path: path.display().to_string(),
    })
}
