//! 声明式组件
//!
//! `component-macros` 为带 `#[component]`、`#[configuration]` 的结构体生成
//! [`DeclaredComponent`] 实现，为 `#[beans]` 修饰的 impl 块生成 [`BeanMethods`]
//! 实现。生成的定义只在宿主程序显式登记时进入类型目录：
//!
//! ```ignore
//! let mut catalog = TypeCatalog::new();
//! catalog
//!     .register_declared::<UserRepository>()?
//!     .register_declared::<UserService>()?;
//! ```

use crate::introspection::{FactoryMethodDef, TypeDefinition};
use infrastructure_common::{FromScalar, Value};
use std::any::Any;
use std::sync::Arc;

/// 自带类型定义的组件
pub trait DeclaredComponent: Any + Send + Sync {
    /// 该类型的完整内省信息
    fn type_definition() -> TypeDefinition;
}

/// 配置类的工厂方法
///
/// 没有工厂方法的配置类可以直接写空实现。
pub trait BeanMethods {
    /// 配置类声明的全部工厂方法
    fn bean_methods() -> Vec<FactoryMethodDef> {
        Vec::new()
    }
}

/// 生成代码使用的成员赋值辅助函数
pub mod support {
    use super::{Any, Arc, FromScalar, Value};

    /// 取出具体类型的组件值
    pub fn component_of<T: Any + Send + Sync>(value: &Value, member: &str) -> anyhow::Result<Arc<T>> {
        value
            .as_instance()
            .and_then(|instance| instance.downcast::<T>())
            .ok_or_else(|| mismatch::<T>(value, member))
    }

    /// 取出 trait 对象形式的组件值
    pub fn shared_of<T: ?Sized + Send + Sync + 'static>(
        value: &Value,
        member: &str,
    ) -> anyhow::Result<Arc<T>> {
        value
            .as_instance()
            .and_then(|instance| instance.downcast_shared::<T>())
            .ok_or_else(|| mismatch::<T>(value, member))
    }

    /// 取出标量值
    pub fn scalar_of<T: FromScalar>(value: &Value, member: &str) -> anyhow::Result<T> {
        value.as_scalar::<T>().ok_or_else(|| mismatch::<T>(value, member))
    }

    /// 成员已经赋过值
    pub fn already_injected(member: &str) -> anyhow::Error {
        anyhow::anyhow!("成员 '{}' 已经注入过", member)
    }

    fn mismatch<T: ?Sized>(value: &Value, member: &str) -> anyhow::Error {
        let actual = match value {
            Value::Unit => "空值".to_string(),
            Value::Scalar(scalar) => format!("{:?}", scalar),
            Value::Instance(instance) => instance.type_key().to_string(),
        };
        anyhow::anyhow!(
            "成员 '{}' 期望 {}, 实际为 {}",
            member,
            std::any::type_name::<T>(),
            actual
        )
    }
}
