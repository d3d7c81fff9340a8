//! 自动装配选择流程集成测试
use autoconfigure::selector::remove_duplicates;
use autoconfigure::{
    AutoConfigurationContext, AutoConfigurationGroup, AutoConfigurationImportFilter,
    AutoConfigurationImportSelector, AutoConfigurationSorter, ConditionEvaluationReport, ExtensionRegistry,
    PropertiesMetadataIndexLoader,
};
use config_impl::{MapPropertySource, StandardEnvironment};
use di_abstractions::{AUTO_CONFIGURATION_IMPORT_FILTER, ENABLE_AUTO_CONFIGURATION};
use di_impl::{DefaultBeanRegistry, InMemoryMetadataReader, PropertiesFactoriesLoader, StaticClassResolver};
use infrastructure_common::{
    AnnotationAttributes, AnnotationKind, AutoConfigError, AutoConfigResult, ClassMetadata,
};
use std::sync::Arc;

/// 测试用的启动环境
struct Fixture {
    candidates: Vec<&'static str>,
    properties: Vec<(&'static str, &'static str)>,
    classes: Vec<&'static str>,
    metadata: Vec<ClassMetadata>,
    index: Option<&'static str>,
    filters: Vec<&'static str>,
}

impl Fixture {
    fn new(candidates: &[&'static str]) -> Self {
        Self {
            candidates: candidates.to_vec(),
            properties: Vec::new(),
            classes: Vec::new(),
            metadata: Vec::new(),
            index: None,
            filters: Vec::new(),
        }
    }

    fn property(mut self, key: &'static str, value: &'static str) -> Self {
        self.properties.push((key, value));
        self
    }

    fn class(mut self, class_name: &'static str) -> Self {
        self.classes.push(class_name);
        self
    }

    fn metadata(mut self, metadata: ClassMetadata) -> Self {
        self.metadata.push(metadata);
        self
    }

    fn index(mut self, content: &'static str) -> Self {
        self.index = Some(content);
        self
    }

    fn filter(mut self, name: &'static str) -> Self {
        self.filters.push(name);
        self
    }

    fn build(self) -> AutoConfigurationContext {
        let environment = StandardEnvironment::new()
            .with_source(MapPropertySource::from_pairs("test", self.properties.iter().copied()));
        let reader = self
            .metadata
            .into_iter()
            .fold(InMemoryMetadataReader::new(), InMemoryMetadataReader::with_metadata);
        let mut factories =
            PropertiesFactoriesLoader::new().with_factories(ENABLE_AUTO_CONFIGURATION, self.candidates);
        if !self.filters.is_empty() {
            factories = factories.with_factories(AUTO_CONFIGURATION_IMPORT_FILTER, self.filters);
        }

        let context = AutoConfigurationContext::new(
            Arc::new(environment),
            Arc::new(DefaultBeanRegistry::new()),
            Arc::new(StaticClassResolver::from_classes(self.classes)),
            Arc::new(reader),
            Arc::new(factories),
        )
        .with_report(Arc::new(ConditionEvaluationReport::new()));

        match self.index {
            Some(index) => context.with_metadata_index(Box::new(PropertiesMetadataIndexLoader::new(index))),
            None => context,
        }
    }
}

fn entry_point(exclude: &[&str]) -> ClassMetadata {
    let mut attributes = AnnotationAttributes::new(AnnotationKind::EnableAutoConfiguration);
    if !exclude.is_empty() {
        attributes = attributes.with("exclude", exclude.to_vec());
    }
    ClassMetadata::new("app.Application").with_annotation(attributes)
}

fn select(context: &AutoConfigurationContext) -> AutoConfigResult<Vec<String>> {
    let selector = AutoConfigurationImportSelector::new(context.clone());
    let mut group = AutoConfigurationGroup::new(AutoConfigurationSorter::new(context.metadata().clone()));
    group.process(&entry_point(&[]), &selector)?;
    Ok(group
        .select_imports()?
        .into_iter()
        .map(|entry| entry.import_class_name)
        .collect())
}

fn names(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

#[test]
fn test_missing_library_filters_candidate() {
    let context = Fixture::new(&["x.AutoConf1", "x.AutoConf2"])
        .metadata(ClassMetadata::new("x.AutoConf1").with_annotation(
            AnnotationAttributes::new(AnnotationKind::ConditionalOnClass).with("name", vec!["com.missing.Lib"]),
        ))
        .metadata(ClassMetadata::new("x.AutoConf2"))
        .build();

    assert_eq!(select(&context).unwrap(), names(&["x.AutoConf2"]));

    let outcomes = context.report().unwrap().condition_outcomes_for("x.AutoConf1").unwrap();
    assert!(!outcomes.is_full_match());
}

#[test]
fn test_missing_property_without_match_if_missing() {
    let index = "\
x.FeatureAutoConfiguration.ConditionalOnProperty.prefix=feature.
x.FeatureAutoConfiguration.ConditionalOnProperty.name=enabled
";
    let context = Fixture::new(&["x.FeatureAutoConfiguration", "x.OtherAutoConfiguration"])
        .index(index)
        .build();
    assert_eq!(select(&context).unwrap(), names(&["x.OtherAutoConfiguration"]));

    let context = Fixture::new(&["x.FeatureAutoConfiguration", "x.OtherAutoConfiguration"])
        .index(index)
        .property("feature.enabled", "true")
        .build();
    assert_eq!(
        select(&context).unwrap(),
        names(&["x.FeatureAutoConfiguration", "x.OtherAutoConfiguration"])
    );
}

#[test]
fn test_priority_with_lexical_tiebreak() {
    let context = Fixture::new(&["x.B", "x.A", "x.C"])
        .index("x.A.AutoConfigureOrder=0\nx.B.AutoConfigureOrder=5\nx.C.AutoConfigureOrder=0\n")
        .build();
    assert_eq!(select(&context).unwrap(), names(&["x.A", "x.C", "x.B"]));
}

#[test]
fn test_sorting_is_independent_of_input_order() {
    let context = Fixture::new(&[])
        .index(
            "\
x.Web.AutoConfigureAfter=x.Jdbc
x.Jdbc.AutoConfigureAfter=x.DataSource
x.DataSource.AutoConfigureOrder=-5
x.Cache.AutoConfigureBefore=x.Jdbc
",
        )
        .build();
    let sorter = AutoConfigurationSorter::new(context.metadata().clone());

    let expected = names(&["x.DataSource", "x.Cache", "x.Jdbc", "x.Web"]);
    let permutations = [
        ["x.Web", "x.Jdbc", "x.DataSource", "x.Cache"],
        ["x.Cache", "x.DataSource", "x.Web", "x.Jdbc"],
        ["x.Jdbc", "x.Cache", "x.Web", "x.DataSource"],
    ];
    for permutation in permutations {
        let sorted = sorter.get_in_priority_order(&names(&permutation)).unwrap();
        assert_eq!(sorted, expected);
        assert_eq!(sorter.get_in_priority_order(&sorted).unwrap(), expected);
    }
}

#[test]
fn test_cycle_names_both_classes() {
    let context = Fixture::new(&["x.A", "x.B"])
        .index("x.A.AutoConfigureAfter=x.B\nx.B.AutoConfigureAfter=x.A\n")
        .build();

    let error = select(&context).unwrap_err();
    match &error {
        AutoConfigError::AutoConfigureCycle { current, after } => {
            let mut pair = [current.as_str(), after.as_str()];
            pair.sort_unstable();
            assert_eq!(pair, ["x.A", "x.B"]);
        }
        other => panic!("unexpected error: {}", other),
    }
    assert!(error.is_fatal());
}

#[test]
fn test_duplicates_keep_first_seen_order() {
    assert_eq!(
        remove_duplicates(names(&["x.B", "x.A", "x.B", "x.C"])),
        names(&["x.B", "x.A", "x.C"])
    );

    let context = Fixture::new(&["x.B", "x.A", "x.B", "x.C"]).build();
    let selector = AutoConfigurationImportSelector::new(context);
    assert_eq!(
        selector.candidate_configurations().unwrap(),
        names(&["x.B", "x.A", "x.C"])
    );
}

#[test]
fn test_invalid_exclusions_list_every_item() {
    let context = Fixture::new(&["x.A", "x.B"])
        .class("x.NotAutoConfigA")
        .class("x.NotAutoConfigB")
        .property("lorn.autoconfigure.exclude", "x.NotAutoConfigB")
        .build();
    let selector = AutoConfigurationImportSelector::new(context);

    let error = selector
        .auto_configuration_entry(&entry_point(&["x.NotAutoConfigA", "x.A"]))
        .unwrap_err();
    match &error {
        AutoConfigError::InvalidExclusions { exclusions } => {
            assert_eq!(exclusions, &names(&["x.NotAutoConfigA", "x.NotAutoConfigB"]));
        }
        other => panic!("unexpected error: {}", other),
    }
    let message = error.to_string();
    assert!(message.contains("x.NotAutoConfigA"));
    assert!(message.contains("x.NotAutoConfigB"));
}

#[test]
fn test_exclusions_are_removed_and_recorded() {
    let context = Fixture::new(&["x.A", "x.B", "x.C"]).build();
    let selector = AutoConfigurationImportSelector::new(context.clone());

    let entry = selector.auto_configuration_entry(&entry_point(&["x.B"])).unwrap();
    assert_eq!(entry.configurations, names(&["x.A", "x.C"]));
    assert_eq!(entry.exclusions, names(&["x.B"]));
    assert_eq!(context.report().unwrap().exclusions(), names(&["x.B"]));
}

/// 拒绝名称以 `Legacy` 结尾的候选类
struct LegacyFilter;

impl AutoConfigurationImportFilter for LegacyFilter {
    fn name(&self) -> &str {
        "LegacyFilter"
    }

    fn matches(
        &self,
        candidates: &[Option<&str>],
        _context: &AutoConfigurationContext,
    ) -> AutoConfigResult<Vec<bool>> {
        Ok(candidates
            .iter()
            .map(|candidate| candidate.map_or(true, |name| !name.ends_with("Legacy")))
            .collect())
    }
}

#[test]
fn test_any_filter_can_veto() {
    let context = Fixture::new(&["x.Modern", "x.Legacy", "x.Conditional"])
        .metadata(ClassMetadata::new("x.Conditional").with_annotation(
            AnnotationAttributes::new(AnnotationKind::ConditionalOnClass).with("value", vec!["x.Absent"]),
        ))
        .filter("OnClassCondition")
        .filter("LegacyFilter")
        .build();
    let extensions = ExtensionRegistry::new().with_filter("LegacyFilter", |_| Arc::new(LegacyFilter));
    let selector = AutoConfigurationImportSelector::new(context).with_extensions(extensions);

    let entry = selector.auto_configuration_entry(&entry_point(&[])).unwrap();
    assert_eq!(entry.configurations, names(&["x.Modern"]));
}

#[test]
fn test_unknown_filter_in_manifest_is_rejected() {
    let context = Fixture::new(&["x.A"]).filter("MissingFilter").build();
    let selector = AutoConfigurationImportSelector::new(context);

    let error = selector.auto_configuration_entry(&entry_point(&[])).unwrap_err();
    assert!(matches!(error, AutoConfigError::UnknownExtension { .. }));
}

#[test]
fn test_disabled_by_property() {
    let context = Fixture::new(&["x.A"])
        .property("lorn.boot.enableautoconfiguration", "false")
        .build();
    let selector = AutoConfigurationImportSelector::new(context);

    assert!(!selector.is_enabled().unwrap());
    assert!(selector.select_imports(&entry_point(&[])).unwrap().is_empty());
}
