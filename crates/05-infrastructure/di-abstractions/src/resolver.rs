//! 类解析与元数据读取抽象接口

use infrastructure_common::{ClassMetadata, ClassResolutionError, MetadataError};

/// 类解析器 trait
///
/// 判断类标识在当前运行时是否可用
pub trait ClassResolver: Send + Sync {
    /// 解析类
    ///
    /// 类不存在时返回 [`ClassResolutionError::NotFound`]，类存在但其依赖
    /// 无法链接时返回 [`ClassResolutionError::Linkage`]
    fn resolve(&self, class_name: &str) -> Result<(), ClassResolutionError>;

    /// 类是否可用
    fn is_present(&self, class_name: &str) -> bool {
        self.resolve(class_name).is_ok()
    }
}

/// 类元数据读取器 trait
pub trait MetadataReader: Send + Sync {
    /// 读取类上声明的注解属性
    fn read(&self, class_name: &str) -> Result<ClassMetadata, MetadataError>;
}
