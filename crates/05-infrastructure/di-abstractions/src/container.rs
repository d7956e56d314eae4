//! 容器门面抽象接口
//!
//! 下游协作者通过它查找组件，不参与容器内部的解析过程。

use crate::descriptor::ComponentDescriptor;
use infrastructure_common::{
    Arguments, DependencyError, DependencyResult, InfrastructureResult, Instance, TypeKey, Value,
};
use std::any::Any;
use std::sync::Arc;

/// 应用上下文 trait
pub trait ApplicationContext: Send + Sync {
    /// 上下文标识
    fn id(&self) -> &str;

    /// 按名称查找
    fn lookup(&self, name: &str) -> DependencyResult<Instance>;

    /// 按名称查找并检查类型
    fn lookup_as(&self, name: &str, required: &TypeKey) -> DependencyResult<Instance>;

    /// 按类型查找唯一组件，多个候选时使用 primary 规则
    fn lookup_unique(&self, ty: &TypeKey) -> DependencyResult<Instance>;

    /// 按类型查找所有组件，按注册表顺序
    fn lookup_all(&self, ty: &TypeKey) -> DependencyResult<Vec<Instance>>;

    /// 按类型查找描述符，按注册表顺序
    fn descriptors_of(&self, ty: &TypeKey) -> DependencyResult<Vec<Arc<ComponentDescriptor>>>;

    /// 取得实例在目标类型下的视图
    fn view(&self, instance: &Instance, target: &TypeKey) -> DependencyResult<Instance>;

    /// 调用实例上的命名操作，经过代理时会执行拦截器链
    fn invoke(&self, instance: &Instance, operation: &str, args: Arguments) -> DependencyResult<Value>;

    /// 扫描得到的候选类型名称
    fn managed_type_names(&self) -> Vec<String>;

    /// 关闭容器，幂等
    fn shutdown(&self) -> InfrastructureResult<()>;

    /// 容器是否仍可用
    fn is_active(&self) -> bool;
}

fn mismatch<T: ?Sized>(name: &str, instance: &Instance) -> DependencyError {
    DependencyError::TypeMismatch {
        name: name.to_string(),
        expected: std::any::type_name::<T>().to_string(),
        actual: instance.type_key().to_string(),
    }
}

/// 类型化查找扩展
///
/// 对所有 [`ApplicationContext`] 自动实现。`*_dyn` 方法用于 trait 对象，
/// 要求组件类型通过 `implements` 声明了对应的转型。
pub trait TypedApplicationContext: ApplicationContext {
    /// 按名称获取具体类型的组件
    fn get<T: Any + Send + Sync>(&self, name: &str) -> DependencyResult<Arc<T>> {
        let key = TypeKey::of::<T>();
        let instance = self.lookup_as(name, &key)?;
        self.view(&instance, &key)?
            .downcast::<T>()
            .ok_or_else(|| mismatch::<T>(name, &instance))
    }

    /// 按类型获取唯一组件
    fn get_unique<T: Any + Send + Sync>(&self) -> DependencyResult<Arc<T>> {
        let key = TypeKey::of::<T>();
        let instance = self.lookup_unique(&key)?;
        self.view(&instance, &key)?
            .downcast::<T>()
            .ok_or_else(|| mismatch::<T>(key.as_str(), &instance))
    }

    /// 按类型获取所有组件
    fn get_all<T: Any + Send + Sync>(&self) -> DependencyResult<Vec<Arc<T>>> {
        let key = TypeKey::of::<T>();
        self.lookup_all(&key)?
            .iter()
            .map(|instance| {
                self.view(instance, &key)?
                    .downcast::<T>()
                    .ok_or_else(|| mismatch::<T>(key.as_str(), instance))
            })
            .collect()
    }

    /// 按类型获取唯一的 trait 对象
    fn get_unique_dyn<T: ?Sized + Send + Sync + 'static>(&self) -> DependencyResult<Arc<T>> {
        let key = TypeKey::of::<T>();
        let instance = self.lookup_unique(&key)?;
        self.view(&instance, &key)?
            .downcast_shared::<T>()
            .ok_or_else(|| mismatch::<T>(key.as_str(), &instance))
    }

    /// 按类型获取所有 trait 对象
    fn get_all_dyn<T: ?Sized + Send + Sync + 'static>(&self) -> DependencyResult<Vec<Arc<T>>> {
        let key = TypeKey::of::<T>();
        self.lookup_all(&key)?
            .iter()
            .map(|instance| {
                self.view(instance, &key)?
                    .downcast_shared::<T>()
                    .ok_or_else(|| mismatch::<T>(key.as_str(), instance))
            })
            .collect()
    }
}

impl<C: ApplicationContext + ?Sized> TypedApplicationContext for C {}
