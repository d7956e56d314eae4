//! 类型扫描器抽象接口

use infrastructure_common::ComponentError;

/// 类型扫描器 trait
///
/// 给定一个或多个逻辑扫描根，返回候选类型的全限定名称。
pub trait TypeScanner: Send + Sync {
    /// 扫描指定根路径下的候选类型
    fn scan(&self, roots: &[String]) -> Result<Vec<String>, ComponentError>;

    /// 获取扫描器名称
    fn name(&self) -> &str;
}
