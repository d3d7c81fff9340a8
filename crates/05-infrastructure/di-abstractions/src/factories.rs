//! 扩展点清单抽象接口

/// 自动装配候选类清单的扩展点名称
pub const ENABLE_AUTO_CONFIGURATION: &str = "lorn.autoconfigure.EnableAutoConfiguration";

/// 导入过滤器扩展点名称
pub const AUTO_CONFIGURATION_IMPORT_FILTER: &str =
    "lorn.autoconfigure.AutoConfigurationImportFilter";

/// 导入监听器扩展点名称
pub const AUTO_CONFIGURATION_IMPORT_LISTENER: &str =
    "lorn.autoconfigure.AutoConfigurationImportListener";

/// 扩展点清单加载器 trait
///
/// 按扩展点名称返回声明的实现名称，保持清单中的声明顺序
pub trait FactoriesLoader: Send + Sync {
    /// 加载扩展点的实现名称
    fn load_factory_names(&self, extension_point: &str) -> Vec<String>;
}
