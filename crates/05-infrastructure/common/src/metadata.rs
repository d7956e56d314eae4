//! 元数据定义
//!
//! 提供类型标识等元数据信息

use std::fmt;
use std::sync::Arc;

/// 默认组件排序权重，数值越小越靠前
pub const DEFAULT_ORDER: i32 = i32::MAX - 10000;

/// 类型标识
///
/// 组件所满足的名义类型。Rust 类型通常通过 [`TypeKey::of`] 获取，
/// 以 `std::any::type_name` 作为全限定名；也可以直接按名称构造。
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeKey(Arc<str>);

impl TypeKey {
    /// 从类型获取类型标识
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self(Arc::from(std::any::type_name::<T>()))
    }

    /// 按全限定名创建类型标识
    pub fn named(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    /// 全限定名
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 获取简短的类型名称（不包含模块路径和泛型参数）
    pub fn simple_name(&self) -> &str {
        let name = self.0.split('<').next().unwrap_or(&self.0);
        let name = name.rsplit("::").next().unwrap_or(name);
        let name = name.rsplit('.').next().unwrap_or(name);
        name.trim_start_matches("dyn ")
    }

    /// 默认组件名称：首字母小写的简短类型名
    pub fn default_component_name(&self) -> String {
        let simple = self.simple_name();
        let mut chars = simple.chars();
        match chars.next() {
            Some(first) => first.to_lowercase().chain(chars).collect(),
            None => String::new(),
        }
    }

    /// 是否位于指定扫描根之下
    ///
    /// 扫描根可以使用 `::` 或 `.` 作为路径分隔符。
    pub fn is_under(&self, root: &str) -> bool {
        let root = root.trim_end_matches("::").trim_end_matches('.');
        if root.is_empty() {
            return true;
        }
        let name = self.as_str().trim_start_matches("dyn ");
        match name.strip_prefix(root) {
            Some("") => true,
            Some(rest) => rest.starts_with("::") || rest.starts_with('.'),
            None => false,
        }
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeKey({})", self.0)
    }
}

impl From<&str> for TypeKey {
    fn from(name: &str) -> Self {
        Self::named(name)
    }
}

impl From<String> for TypeKey {
    fn from(name: String) -> Self {
        Self(Arc::from(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct UserService;
    trait Greeter {}

    #[test]
    fn test_simple_name_and_default_component_name() {
        let key = TypeKey::of::<UserService>();
        assert_eq!(key.simple_name(), "UserService");
        assert_eq!(key.default_component_name(), "userService");

        let dotted = TypeKey::named("com.example.scan.PrimaryBean");
        assert_eq!(dotted.simple_name(), "PrimaryBean");
        assert_eq!(dotted.default_component_name(), "primaryBean");
    }

    #[test]
    fn test_trait_object_simple_name() {
        let key = TypeKey::of::<dyn Greeter>();
        assert_eq!(key.simple_name(), "Greeter");
    }

    #[test]
    fn test_is_under_scan_root() {
        let key = TypeKey::named("com.example.scan.nested.Bean");
        assert!(key.is_under("com.example.scan"));
        assert!(key.is_under("com.example"));
        assert!(!key.is_under("com.example.sc"));
        assert!(!key.is_under("org.example"));

        let rust_key = TypeKey::named("my_app::services::UserService");
        assert!(rust_key.is_under("my_app::services"));
        assert!(rust_key.is_under("my_app"));
        assert!(!rust_key.is_under("my_app::serv"));
    }
}
