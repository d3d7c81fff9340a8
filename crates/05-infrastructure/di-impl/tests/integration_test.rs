//! 依赖注入实现的集成测试

use di_abstractions::{BeanDefinitionInfo, BeanRegistry, ClassResolver, FactoriesLoader, MetadataReader};
use di_impl::{DefaultBeanRegistry, InMemoryMetadataReader, PropertiesFactoriesLoader, StaticClassResolver};
use infrastructure_common::{AnnotationAttributes, AnnotationKind, ClassMetadata};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

#[test]
fn test_registry_hierarchy_lookup() {
    let parent = Arc::new(
        DefaultBeanRegistry::new()
            .with_definition(BeanDefinitionInfo::new("cache", "x.RedisCache").with_assignable_type("x.Cache")),
    );
    let child = DefaultBeanRegistry::new()
        .with_parent(parent.clone())
        .with_definition(BeanDefinitionInfo::new("local", "x.LocalCache").with_assignable_type("x.Cache"));

    // 按类型查询只覆盖当前注册表
    assert_eq!(child.bean_names_for_type("x.Cache"), vec!["local"]);

    let parent_registry = child.parent().unwrap();
    assert_eq!(parent_registry.bean_names_for_type("x.Cache"), vec!["cache"]);
    assert!(child.contains_bean("cache"));
}

#[tokio::test]
async fn test_load_metadata_and_manifest_from_directory() {
    let temp_dir = TempDir::new().unwrap();
    let manifest = temp_dir.path().join("lorn.factories");
    let metadata = temp_dir.path().join("metadata.json");

    fs::write(
        &manifest,
        "lorn.autoconfigure.EnableAutoConfiguration=x.WebAutoConfiguration\n",
    )
    .unwrap();
    fs::write(
        &metadata,
        r#"[{"class_name":"x.WebAutoConfiguration","annotations":[{"annotation":"AutoConfigureOrder","values":{"value":-5}}]}]"#,
    )
    .unwrap();

    let loader = PropertiesFactoriesLoader::new();
    loader.merge_file(&manifest).await.unwrap();
    let reader = InMemoryMetadataReader::new();
    assert_eq!(reader.load_json_file(&metadata).await.unwrap(), 1);

    let candidates = loader.load_factory_names("lorn.autoconfigure.EnableAutoConfiguration");
    assert_eq!(candidates, vec!["x.WebAutoConfiguration"]);

    let read = reader.read(&candidates[0]).unwrap();
    assert_eq!(
        read,
        ClassMetadata::new("x.WebAutoConfiguration").with_annotation(
            AnnotationAttributes::new(AnnotationKind::AutoConfigureOrder).with("value", -5i64)
        )
    );
}

#[test]
fn test_class_resolver_registration_after_construction() {
    let resolver = StaticClassResolver::new();
    assert!(!resolver.is_present("x.Late"));

    resolver.register_class("x.Late");
    assert!(resolver.is_present("x.Late"));
    assert_eq!(resolver.len(), 1);
}
