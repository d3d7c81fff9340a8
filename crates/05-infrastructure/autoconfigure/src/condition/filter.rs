//! 配置类过滤链

use super::AutoConfigurationImportFilter;
use crate::context::AutoConfigurationContext;
use infrastructure_common::AutoConfigResult;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, trace};

/// 配置类过滤链
///
/// 依次把整批候选类交给每个过滤器，被拒绝的位置置空，后续过滤器跳过这些位置
pub struct ConfigurationClassFilter {
    filters: Vec<Arc<dyn AutoConfigurationImportFilter>>,
}

impl ConfigurationClassFilter {
    /// 创建过滤链
    pub fn new(filters: Vec<Arc<dyn AutoConfigurationImportFilter>>) -> Self {
        Self { filters }
    }

    /// 过滤器名称（按执行顺序）
    pub fn filter_names(&self) -> Vec<&str> {
        self.filters.iter().map(|f| f.name()).collect()
    }

    /// 执行过滤
    ///
    /// 没有任何候选类被拒绝时原样返回输入
    pub fn filter(
        &self,
        configurations: Vec<String>,
        context: &AutoConfigurationContext,
    ) -> AutoConfigResult<Vec<String>> {
        let start = Instant::now();
        let mut candidates: Vec<Option<&str>> = configurations.iter().map(|c| Some(c.as_str())).collect();
        let mut skipped = false;

        for filter in &self.filters {
            let matches = filter.matches(&candidates, context)?;
            let mut rejected = 0usize;
            for (slot, matched) in candidates.iter_mut().zip(matches) {
                if !matched && slot.is_some() {
                    *slot = None;
                    rejected += 1;
                }
            }
            if rejected > 0 {
                skipped = true;
                debug!("过滤器 {} 排除了 {} 个自动装配类", filter.name(), rejected);
            }
        }

        if !skipped {
            trace!("过滤链未排除任何自动装配类，耗时 {:?}", start.elapsed());
            return Ok(configurations);
        }

        let result: Vec<String> = candidates.into_iter().flatten().map(str::to_string).collect();
        debug!(
            "过滤了 {} 个自动装配类，耗时 {:?}",
            configurations.len() - result.len(),
            start.elapsed()
        );
        Ok(result)
    }
}
