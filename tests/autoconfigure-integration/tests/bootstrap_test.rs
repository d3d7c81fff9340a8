//! 从文件启动的端到端测试
use anyhow::Result;
use config_abstractions::ApplicationKind;
use di_abstractions::BeanDefinitionInfo;
use di_impl::DefaultBeanRegistry;
use infrastructure_common::{AnnotationAttributes, AnnotationKind, ClassMetadata};
use infrastructure_composition::AutoConfigurationBuilder;
use std::sync::Arc;
use tempfile::TempDir;

const FACTORIES: &str = "\
lorn.autoconfigure.EnableAutoConfiguration=\\
  x.JdbcTemplateAutoConfiguration,\\
  x.DataSourceAutoConfiguration,\\
  x.TransactionAutoConfiguration
";

const INDEX: &str = "\
x.DataSourceAutoConfiguration.AutoConfigureOrder=-5
";

fn class_metadata() -> Vec<ClassMetadata> {
    vec![
        ClassMetadata::new("x.JdbcTemplateAutoConfiguration").with_annotation(
            AnnotationAttributes::new(AnnotationKind::ConditionalOnMissingBean).with("value", vec!["x.JdbcTemplate"]),
        ),
        ClassMetadata::new("x.TransactionAutoConfiguration")
            .with_annotation(
                AnnotationAttributes::new(AnnotationKind::ConditionalOnSingleCandidate)
                    .with("value", vec!["x.DataSource"]),
            )
            .with_annotation(
                AnnotationAttributes::new(AnnotationKind::AutoConfigureAfter)
                    .with("value", vec!["x.JdbcTemplateAutoConfiguration"]),
            ),
    ]
}

async fn write_config(dir: &TempDir) -> Result<()> {
    tokio::fs::write(dir.path().join("lorn.factories"), FACTORIES).await?;
    tokio::fs::write(dir.path().join("index.properties"), INDEX).await?;
    tokio::fs::write(dir.path().join("metadata.json"), serde_json::to_string(&class_metadata())?).await?;
    Ok(())
}

fn entry_point() -> ClassMetadata {
    ClassMetadata::new("app.Application")
        .with_annotation(AnnotationAttributes::new(AnnotationKind::EnableAutoConfiguration))
}

#[tokio::test]
async fn test_bean_conditions_from_metadata_file() -> Result<()> {
    let dir = TempDir::new()?;
    write_config(&dir).await?;

    let registry = DefaultBeanRegistry::new()
        .with_definition(BeanDefinitionInfo::new("dataSource", "x.HikariDataSource").with_assignable_type("x.DataSource"));

    let bootstrapper = AutoConfigurationBuilder::new()
        .add_factories_file(dir.path().join("lorn.factories"))?
        .add_metadata_index_file(dir.path().join("index.properties"))?
        .add_class_metadata_file(dir.path().join("metadata.json"))?
        .with_available_classes(["x.JdbcTemplate", "x.DataSource"])
        .with_registry(Arc::new(registry))
        .build()
        .await?;

    let outcome = bootstrapper.run(vec![entry_point()]).await?;
    assert_eq!(
        outcome.import_class_names(),
        vec![
            "x.DataSourceAutoConfiguration",
            "x.JdbcTemplateAutoConfiguration",
            "x.TransactionAutoConfiguration",
        ]
    );
    Ok(())
}

#[tokio::test]
async fn test_existing_bean_backs_off() -> Result<()> {
    let dir = TempDir::new()?;
    write_config(&dir).await?;

    let registry = DefaultBeanRegistry::new()
        .with_definition(BeanDefinitionInfo::new("jdbcTemplate", "x.JdbcTemplate"))
        .with_definition(BeanDefinitionInfo::new("primary", "x.PrimaryDataSource").with_assignable_type("x.DataSource").with_primary(true))
        .with_definition(BeanDefinitionInfo::new("replica", "x.ReplicaDataSource").with_assignable_type("x.DataSource"));

    let bootstrapper = AutoConfigurationBuilder::new()
        .add_factories_file(dir.path().join("lorn.factories"))?
        .add_metadata_index_file(dir.path().join("index.properties"))?
        .add_class_metadata_file(dir.path().join("metadata.json"))?
        .with_available_classes(["x.JdbcTemplate", "x.DataSource"])
        .with_application_kind(ApplicationKind::Standard)
        .with_registry(Arc::new(registry))
        .build()
        .await?;

    let outcome = bootstrapper.run(vec![entry_point()]).await?;
    assert_eq!(
        outcome.import_class_names(),
        vec!["x.DataSourceAutoConfiguration", "x.TransactionAutoConfiguration"]
    );

    let report = outcome.report.expect("report is enabled by default");
    assert!(!report.outcomes["x.JdbcTemplateAutoConfiguration"].is_full_match());
    Ok(())
}

#[tokio::test]
async fn test_ambiguous_single_candidate_is_rejected() -> Result<()> {
    let dir = TempDir::new()?;
    write_config(&dir).await?;

    let registry = DefaultBeanRegistry::new()
        .with_definition(BeanDefinitionInfo::new("first", "x.FirstDataSource").with_assignable_type("x.DataSource"))
        .with_definition(BeanDefinitionInfo::new("second", "x.SecondDataSource").with_assignable_type("x.DataSource"));

    let bootstrapper = AutoConfigurationBuilder::new()
        .add_factories_file(dir.path().join("lorn.factories"))?
        .add_metadata_index_file(dir.path().join("index.properties"))?
        .add_class_metadata_file(dir.path().join("metadata.json"))?
        .with_available_classes(["x.JdbcTemplate", "x.DataSource"])
        .with_registry(Arc::new(registry))
        .build()
        .await?;

    let outcome = bootstrapper.run(vec![entry_point()]).await?;
    assert_eq!(
        outcome.import_class_names(),
        vec!["x.DataSourceAutoConfiguration", "x.JdbcTemplateAutoConfiguration"]
    );
    Ok(())
}
