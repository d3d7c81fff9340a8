//! 默认组件注册表实现

use di_abstractions::{BeanDefinitionInfo, BeanRegistry};
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// 默认组件注册表
///
/// 按注册顺序保存组件定义，可选地挂接父注册表形成层级
pub struct DefaultBeanRegistry {
    /// 组件定义（按注册顺序）
    definitions: RwLock<Vec<BeanDefinitionInfo>>,
    /// 已注册的作用域名称
    scopes: RwLock<Vec<String>>,
    /// 父注册表
    parent: Option<Arc<dyn BeanRegistry>>,
}

impl fmt::Debug for DefaultBeanRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultBeanRegistry")
            .field("definitions", &self.definitions.read().len())
            .field("scopes", &*self.scopes.read())
            .field("has_parent", &self.parent.is_some())
            .finish()
    }
}

impl DefaultBeanRegistry {
    /// 创建新的注册表
    pub fn new() -> Self {
        Self {
            definitions: RwLock::new(Vec::new()),
            scopes: RwLock::new(Vec::new()),
            parent: None,
        }
    }

    /// 设置父注册表
    pub fn with_parent(mut self, parent: Arc<dyn BeanRegistry>) -> Self {
        self.parent = Some(parent);
        self
    }

    /// 添加组件定义
    pub fn with_definition(self, definition: BeanDefinitionInfo) -> Self {
        self.register_definition(definition);
        self
    }

    /// 添加作用域
    pub fn with_scope(self, scope: impl Into<String>) -> Self {
        self.register_scope(scope);
        self
    }

    /// 注册组件定义，同名定义会被覆盖并保持原位置
    pub fn register_definition(&self, definition: BeanDefinitionInfo) {
        let mut definitions = self.definitions.write();
        if let Some(existing) = definitions.iter_mut().find(|d| d.name == definition.name) {
            info!("覆盖组件定义: {}", definition.name);
            *existing = definition;
        } else {
            debug!("注册组件定义: {} ({})", definition.name, definition.type_name);
            definitions.push(definition);
        }
    }

    /// 注册作用域
    pub fn register_scope(&self, scope: impl Into<String>) {
        let scope = scope.into();
        let mut scopes = self.scopes.write();
        if !scopes.contains(&scope) {
            debug!("注册作用域: {}", scope);
            scopes.push(scope);
        }
    }

    /// 已注册的组件数量
    pub fn len(&self) -> usize {
        self.definitions.read().len()
    }

    /// 注册表是否为空
    pub fn is_empty(&self) -> bool {
        self.definitions.read().is_empty()
    }
}

impl Default for DefaultBeanRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl BeanRegistry for DefaultBeanRegistry {
    fn bean_names_for_type(&self, type_name: &str) -> Vec<String> {
        self.definitions
            .read()
            .iter()
            .filter(|d| d.is_assignable_to(type_name))
            .map(|d| d.name.clone())
            .collect()
    }

    fn bean_names_for_annotation(&self, annotation: &str) -> Vec<String> {
        self.definitions
            .read()
            .iter()
            .filter(|d| d.has_annotation(annotation))
            .map(|d| d.name.clone())
            .collect()
    }

    fn contains_local_bean(&self, name: &str) -> bool {
        self.definitions.read().iter().any(|d| d.name == name)
    }

    fn bean_definition(&self, name: &str) -> Option<BeanDefinitionInfo> {
        self.definitions.read().iter().find(|d| d.name == name).cloned()
    }

    fn registered_scope_names(&self) -> Vec<String> {
        self.scopes.read().clone()
    }

    fn parent(&self) -> Option<Arc<dyn BeanRegistry>> {
        self.parent.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_type_and_annotation() {
        let registry = DefaultBeanRegistry::new()
            .with_definition(
                BeanDefinitionInfo::new("primaryDs", "x.HikariDataSource")
                    .with_assignable_type("x.DataSource")
                    .with_annotation("x.Primary"),
            )
            .with_definition(
                BeanDefinitionInfo::new("secondaryDs", "x.SimpleDataSource")
                    .with_assignable_type("x.DataSource"),
            );

        assert_eq!(registry.bean_names_for_type("x.DataSource"), vec!["primaryDs", "secondaryDs"]);
        assert_eq!(registry.bean_names_for_annotation("x.Primary"), vec!["primaryDs"]);
        assert!(registry.bean_names_for_type("x.Other").is_empty());
    }

    #[test]
    fn test_redefinition_keeps_position() {
        let registry = DefaultBeanRegistry::new()
            .with_definition(BeanDefinitionInfo::new("a", "x.A"))
            .with_definition(BeanDefinitionInfo::new("b", "x.B"))
            .with_definition(BeanDefinitionInfo::new("a", "x.A2"));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.bean_definition("a").unwrap().type_name, "x.A2");
        assert_eq!(registry.bean_names_for_type("x.A2"), vec!["a"]);
    }

    #[test]
    fn test_contains_bean_walks_hierarchy() {
        let parent: Arc<dyn BeanRegistry> =
            Arc::new(DefaultBeanRegistry::new().with_definition(BeanDefinitionInfo::new("root", "x.Root")));
        let child = DefaultBeanRegistry::new().with_parent(parent);

        assert!(!child.contains_local_bean("root"));
        assert!(child.contains_bean("root"));
        assert!(!child.contains_bean("absent"));
    }

    #[test]
    fn test_scopes_are_unique() {
        let registry = DefaultBeanRegistry::new().with_scope("session").with_scope("session");
        assert_eq!(registry.registered_scope_names(), vec!["session"]);
    }
}
