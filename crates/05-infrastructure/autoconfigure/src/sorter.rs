//! 自动装配类排序
//!
//! 三轮排序依次叠加：
//! 1. 按类名字典序，保证没有其他约束时结果确定
//! 2. 按 `AutoConfigureOrder` 稳定排序，值越小越靠前
//! 3. 按 `AutoConfigureBefore` / `AutoConfigureAfter` 做深度优先拓扑排序，
//!    `before` 声明转换为对方的 `after` 声明
//!
//! 只为排序而引入的关联类不会出现在结果中。

use crate::metadata::{AutoConfigurationMetadataCache, AutoConfigurationMetadataEntry};
use infrastructure_common::{AutoConfigError, AutoConfigResult};
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::Arc;
use tracing::{debug, trace};

/// 自动装配类排序器
#[derive(Debug, Clone)]
pub struct AutoConfigurationSorter {
    metadata: Arc<AutoConfigurationMetadataCache>,
}

impl AutoConfigurationSorter {
    /// 创建排序器
    pub fn new(metadata: Arc<AutoConfigurationMetadataCache>) -> Self {
        Self { metadata }
    }

    /// 按优先级排序
    ///
    /// 输出是输入的一个排列；存在 before/after 循环时返回
    /// [`AutoConfigError::AutoConfigureCycle`]
    pub fn get_in_priority_order(&self, class_names: &[String]) -> AutoConfigResult<Vec<String>> {
        let classes = AutoConfigurationClasses::new(&self.metadata, class_names)?;

        let mut ordered: Vec<String> = class_names.to_vec();
        ordered.sort();
        ordered.sort_by_key(|name| classes.order(name));
        trace!("按顺序值排序后: {:?}", ordered);

        let ordered = sort_by_annotation(&classes, ordered)?;
        let requested: HashSet<&String> = class_names.iter().collect();
        let result: Vec<String> = ordered.into_iter().filter(|name| requested.contains(name)).collect();
        debug!("完成 {} 个自动装配类的排序", result.len());
        Ok(result)
    }
}

/// 参与排序的类及其元数据
///
/// 输入类总是存在；通过 before/after 引用到的关联类只有在元数据可读时才加入
struct AutoConfigurationClasses {
    classes: BTreeMap<String, Arc<AutoConfigurationMetadataEntry>>,
}

impl AutoConfigurationClasses {
    fn new(metadata: &AutoConfigurationMetadataCache, class_names: &[String]) -> AutoConfigResult<Self> {
        let mut classes = BTreeMap::new();
        let mut related = Vec::new();
        for name in class_names {
            let entry = metadata.entry_or_empty(name)?;
            related.extend(entry.before.iter().cloned());
            related.extend(entry.after.iter().cloned());
            classes.insert(name.clone(), entry);
        }

        let mut sorting = Self { classes };
        sorting.add_related(metadata, related);
        Ok(sorting)
    }

    fn add_related(&mut self, metadata: &AutoConfigurationMetadataCache, mut pending: Vec<String>) {
        while let Some(name) = pending.pop() {
            if self.classes.contains_key(&name) {
                continue;
            }
            match metadata.entry(&name) {
                Ok(Some(entry)) => {
                    trace!("为排序引入关联类: {}", name);
                    pending.extend(entry.before.iter().cloned());
                    pending.extend(entry.after.iter().cloned());
                    self.classes.insert(name, entry);
                }
                Ok(None) => {}
                Err(e) => debug!("忽略元数据不可读的关联类 {}: {}", name, e),
            }
        }
    }

    fn all_names(&self) -> impl Iterator<Item = &String> {
        self.classes.keys()
    }

    fn order(&self, class_name: &str) -> i32 {
        self.classes
            .get(class_name)
            .map(|entry| entry.order)
            .unwrap_or(infrastructure_common::DEFAULT_ORDER)
    }

    /// 要求排在指定类之前的类：自身的 `after` 加上 `before` 中包含它的类
    fn classes_requested_after(&self, class_name: &str) -> Vec<String> {
        let mut after: Vec<String> = Vec::new();
        if let Some(entry) = self.classes.get(class_name) {
            for name in &entry.after {
                if !after.contains(name) {
                    after.push(name.clone());
                }
            }
        }
        for (name, entry) in &self.classes {
            if entry.before.iter().any(|b| b == class_name) && !after.contains(name) {
                after.push(name.clone());
            }
        }
        after
    }
}

struct SortState {
    to_sort: VecDeque<String>,
    pending: HashSet<String>,
    sorted: Vec<String>,
    done: HashSet<String>,
    processing: HashSet<String>,
}

fn sort_by_annotation(classes: &AutoConfigurationClasses, ordered: Vec<String>) -> AutoConfigResult<Vec<String>> {
    let mut to_sort: VecDeque<String> = ordered.into();
    for name in classes.all_names() {
        if !to_sort.contains(name) {
            to_sort.push_back(name.clone());
        }
    }

    let mut state = SortState {
        pending: to_sort.iter().cloned().collect(),
        to_sort,
        sorted: Vec::new(),
        done: HashSet::new(),
        processing: HashSet::new(),
    };

    while let Some(current) = state.to_sort.pop_front() {
        if state.done.contains(&current) {
            continue;
        }
        state.pending.remove(&current);
        visit(classes, &mut state, current)?;
    }
    Ok(state.sorted)
}

fn visit(classes: &AutoConfigurationClasses, state: &mut SortState, current: String) -> AutoConfigResult<()> {
    state.processing.insert(current.clone());
    for after in classes.classes_requested_after(&current) {
        if state.processing.contains(&after) {
            return Err(AutoConfigError::cycle(current, after));
        }
        if !state.done.contains(&after) && state.pending.remove(&after) {
            visit(classes, state, after)?;
        }
    }
    state.processing.remove(&current);
    state.done.insert(current.clone());
    state.sorted.push(current);
    Ok(())
}
