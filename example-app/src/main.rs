//! # 示例应用程序
//!
//! 从配置目录读取扩展点清单、元数据索引与属性文件，执行一次自动装配选择，
//! 输出最终的导入顺序与条件评估报告

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use config_abstractions::ApplicationKind;
use infrastructure_common::{AnnotationAttributes, AnnotationKind, ClassMetadata};
use infrastructure_composition::{AutoConfigurationBuilder, LoggingConfig, SelectionOutcome};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const FACTORIES_FILE: &str = "lorn.factories";
const METADATA_INDEX_FILE: &str = "auto-configure-metadata.properties";
const CLASS_METADATA_FILE: &str = "metadata.json";
const CLASSES_FILE: &str = "classes.txt";
const CONFIG_FILES: [&str; 3] = ["application.toml", "application.json", "application.properties"];

/// 命令行参数
#[derive(Parser, Debug)]
#[command(name = "example-app")]
#[command(about = "Lorn ADSP 自动装配选择示例")]
struct Args {
    /// 配置目录
    #[arg(short, long, default_value = "config")]
    dir: PathBuf,

    /// 入口类，可重复指定
    #[arg(short, long, default_value = "app.Application")]
    entry: Vec<String>,

    /// 入口类上声明的排除项
    #[arg(long)]
    exclude: Vec<String>,

    /// 额外的可用类
    #[arg(long = "class")]
    classes: Vec<String>,

    /// 应用类型
    #[arg(long, value_enum, default_value_t = Kind::Standard)]
    kind: Kind,

    /// 环境变量前缀
    #[arg(long)]
    env_prefix: Option<String>,

    /// 输出完整的 JSON 结果
    #[arg(long)]
    json: bool,

    /// 日志级别
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Kind {
    Standard,
    Servlet,
    Reactive,
}

impl From<Kind> for ApplicationKind {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Standard => ApplicationKind::Standard,
            Kind::Servlet => ApplicationKind::Servlet,
            Kind::Reactive => ApplicationKind::Reactive,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let logging = LoggingConfig {
        level: parse_log_level(&args.log_level),
        ..LoggingConfig::default()
    };

    let builder = configure(&args).await?.with_logging(logging);
    let bootstrapper = builder.build().await.context("构建自动装配失败")?;
    info!("使用配置目录: {}", args.dir.display());

    let entry_points: Vec<ClassMetadata> = args.entry.iter().map(|name| entry_point(name, &args.exclude)).collect();
    let outcome = bootstrapper.run(entry_points).await.context("自动装配选择失败")?;

    if args.json {
        println!("{}", outcome.to_json()?);
    } else {
        print_summary(&outcome);
    }
    Ok(())
}

/// 根据配置目录中存在的文件配置构建器
async fn configure(args: &Args) -> Result<AutoConfigurationBuilder> {
    let dir = &args.dir;
    if !dir.is_dir() {
        anyhow::bail!("配置目录不存在: {}", dir.display());
    }
    let mut builder = AutoConfigurationBuilder::new()
        .add_factories_file(dir.join(FACTORIES_FILE))
        .context("缺少扩展点清单")?
        .with_application_kind(args.kind.into());

    let index = dir.join(METADATA_INDEX_FILE);
    if index.exists() {
        builder = builder.add_metadata_index_file(index)?;
    }

    let metadata = dir.join(CLASS_METADATA_FILE);
    if metadata.exists() {
        builder = builder.add_class_metadata_file(metadata)?;
    }

    for name in CONFIG_FILES {
        let path = dir.join(name);
        if path.exists() {
            builder = builder.add_config_file(path)?;
        }
    }

    if let Some(prefix) = &args.env_prefix {
        builder = builder.add_config_env_vars(prefix.clone());
    }

    let mut classes = read_classes(&dir.join(CLASSES_FILE)).await?;
    classes.extend(args.classes.iter().cloned());
    Ok(builder.with_available_classes(classes))
}

/// 读取可用类列表，每行一个类名，`#` 开头为注释
async fn read_classes(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("读取类列表失败: {}", path.display()))?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

fn entry_point(class_name: &str, exclude: &[String]) -> ClassMetadata {
    let mut attributes = AnnotationAttributes::new(AnnotationKind::EnableAutoConfiguration);
    if !exclude.is_empty() {
        attributes = attributes.with("exclude", exclude.to_vec());
    }
    ClassMetadata::new(class_name).with_annotation(attributes)
}

fn print_summary(outcome: &SelectionOutcome) {
    println!("导入的自动装配类 ({}):", outcome.entries.len());
    for (index, entry) in outcome.entries.iter().enumerate() {
        println!("  {:>2}. {}  <- {}", index + 1, entry.import_class_name, entry.source);
    }

    let Some(report) = &outcome.report else {
        return;
    };

    if !report.exclusions.is_empty() {
        println!("\n排除项:");
        for exclusion in &report.exclusions {
            println!("  {}", exclusion);
        }
    }

    let rejected: Vec<_> = report
        .outcomes
        .iter()
        .filter(|(_, outcomes)| !outcomes.is_full_match())
        .collect();
    if !rejected.is_empty() {
        println!("\n未匹配的自动装配类:");
        for (class_name, outcomes) in rejected {
            println!("  {}", class_name);
            for item in outcomes.outcomes.iter().filter(|o| !o.outcome.is_match) {
                println!("    - {}: {}", item.condition, item.outcome);
            }
        }
    }

    if !report.unresolved.is_empty() {
        warn!("{} 个类无法解析", report.unresolved.len());
        for unresolved in &report.unresolved {
            println!("  ! {} -> {}: {}", unresolved.source_class, unresolved.class_name, unresolved.message);
        }
    }
}

/// 解析日志级别
fn parse_log_level(level: &str) -> tracing::Level {
    match level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "warn" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    }
}
