//! 组件注册表抽象接口

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// 作用域代理目标组件的名称前缀，条件匹配时忽略此类组件
pub const SCOPED_TARGET_PREFIX: &str = "scopedTarget.";

/// 组件定义信息
///
/// 条件评估只读取定义，不会触发组件实例化
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeanDefinitionInfo {
    /// 组件名称
    pub name: String,
    /// 组件的具体类型
    pub type_name: String,
    /// 可赋值的类型（实现的 trait、父类型），包含 `type_name` 本身
    pub assignable_types: Vec<String>,
    /// 标注在组件类型上的注解
    pub annotations: Vec<String>,
    /// 是否为首选组件
    pub primary: bool,
    /// 是否参与自动注入
    pub autowire_candidate: bool,
}

impl BeanDefinitionInfo {
    /// 创建新的组件定义
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        let type_name = type_name.into();
        Self {
            name: name.into(),
            assignable_types: vec![type_name.clone()],
            type_name,
            annotations: Vec::new(),
            primary: false,
            autowire_candidate: true,
        }
    }

    /// 添加可赋值类型
    pub fn with_assignable_type(mut self, type_name: impl Into<String>) -> Self {
        let type_name = type_name.into();
        if !self.assignable_types.contains(&type_name) {
            self.assignable_types.push(type_name);
        }
        self
    }

    /// 添加注解
    pub fn with_annotation(mut self, annotation: impl Into<String>) -> Self {
        self.annotations.push(annotation.into());
        self
    }

    /// 标记为首选组件
    pub fn with_primary(mut self, primary: bool) -> Self {
        self.primary = primary;
        self
    }

    /// 设置是否参与自动注入
    pub fn with_autowire_candidate(mut self, candidate: bool) -> Self {
        self.autowire_candidate = candidate;
        self
    }

    /// 是否可赋值给指定类型
    pub fn is_assignable_to(&self, type_name: &str) -> bool {
        self.assignable_types.iter().any(|t| t == type_name)
    }

    /// 是否标注了指定注解
    pub fn has_annotation(&self, annotation: &str) -> bool {
        self.annotations.iter().any(|a| a == annotation)
    }
}

/// 组件注册表 trait
///
/// 查询方法只覆盖当前注册表，层级遍历通过 [`BeanRegistry::parent`] 完成
pub trait BeanRegistry: Send + Sync {
    /// 获取可赋值给指定类型的组件名称，按注册顺序返回
    fn bean_names_for_type(&self, type_name: &str) -> Vec<String>;

    /// 获取标注了指定注解的组件名称，按注册顺序返回
    fn bean_names_for_annotation(&self, annotation: &str) -> Vec<String>;

    /// 当前注册表是否包含指定名称的组件
    fn contains_local_bean(&self, name: &str) -> bool;

    /// 获取组件定义
    fn bean_definition(&self, name: &str) -> Option<BeanDefinitionInfo>;

    /// 获取已注册的作用域名称
    fn registered_scope_names(&self) -> Vec<String>;

    /// 获取父注册表
    fn parent(&self) -> Option<Arc<dyn BeanRegistry>>;

    /// 在当前注册表及所有祖先中查找组件名称
    fn contains_bean(&self, name: &str) -> bool {
        if self.contains_local_bean(name) {
            return true;
        }
        let mut current = self.parent();
        while let Some(registry) = current {
            if registry.contains_local_bean(name) {
                return true;
            }
            current = registry.parent();
        }
        false
    }
}
