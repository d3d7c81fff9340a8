//! 多入口结果合并

use crate::selector::{AutoConfigurationEntry, AutoConfigurationImportSelector};
use crate::sorter::AutoConfigurationSorter;
use infrastructure_common::{AutoConfigResult, ClassMetadata};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// 最终导入项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// 触发导入的入口类
    pub source: String,
    /// 导入的自动装配类
    pub import_class_name: String,
}

/// 自动装配结果组
///
/// 一次启动中可能有多个入口，每个入口处理一次；最后统一合并排除项、
/// 按入口顺序合并配置类、去掉排除项并排序
#[derive(Debug)]
pub struct AutoConfigurationGroup {
    sorter: AutoConfigurationSorter,
    sources: Vec<(String, String)>,
    entries: Vec<AutoConfigurationEntry>,
}

impl AutoConfigurationGroup {
    /// 创建结果组
    pub fn new(sorter: AutoConfigurationSorter) -> Self {
        Self {
            sorter,
            sources: Vec::new(),
            entries: Vec::new(),
        }
    }

    /// 已处理的入口数量
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 是否还没有处理任何入口
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 处理一个入口
    pub fn process(&mut self, entry_point: &ClassMetadata, selector: &AutoConfigurationImportSelector) -> AutoConfigResult<()> {
        let entry = selector.auto_configuration_entry(entry_point)?;
        for configuration in &entry.configurations {
            if !self.sources.iter().any(|(name, _)| name == configuration) {
                self.sources.push((configuration.clone(), entry_point.class_name.clone()));
            }
        }
        self.entries.push(entry);
        Ok(())
    }

    /// 合并并排序全部入口的结果
    pub fn select_imports(&self) -> AutoConfigResult<Vec<Entry>> {
        if self.entries.is_empty() {
            return Ok(Vec::new());
        }

        let exclusions: HashSet<&String> = self.entries.iter().flat_map(|e| e.exclusions.iter()).collect();
        let mut seen = HashSet::new();
        let processed: Vec<String> = self
            .entries
            .iter()
            .flat_map(|e| e.configurations.iter())
            .filter(|name| !exclusions.contains(name) && seen.insert(*name))
            .cloned()
            .collect();

        let sorted = self.sorter.get_in_priority_order(&processed)?;
        debug!("合并 {} 个入口，最终导入 {} 个自动装配类", self.entries.len(), sorted.len());

        Ok(sorted
            .into_iter()
            .map(|import_class_name| {
                let source = self
                    .sources
                    .iter()
                    .find(|(name, _)| name == &import_class_name)
                    .map(|(_, source)| source.clone())
                    .unwrap_or_default();
                Entry {
                    source,
                    import_class_name,
                }
            })
            .collect())
    }
}
