//! 组件实例句柄

use crate::metadata::TypeKey;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// 类型擦除的共享对象
pub type AnyObject = Arc<dyn Any + Send + Sync>;

/// 组件实例
///
/// 容器内部流转的实例句柄：对象本身加上它满足的名义类型。克隆代价很低，
/// 只复制引用计数。
#[derive(Clone)]
pub struct Instance {
    type_key: TypeKey,
    object: AnyObject,
}

impl Instance {
    /// 包装一个新值
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self::from_arc(Arc::new(value))
    }

    /// 包装已共享的值
    pub fn from_arc<T: Any + Send + Sync>(value: Arc<T>) -> Self {
        Self {
            type_key: TypeKey::of::<T>(),
            object: value,
        }
    }

    /// 以指定的名义类型包装任意对象
    ///
    /// 用于代理等包装值：对象的真实类型与它对外声明的类型不同。
    pub fn from_parts(type_key: TypeKey, object: AnyObject) -> Self {
        Self { type_key, object }
    }

    /// 包装 trait 对象，名义类型为 trait 本身
    ///
    /// 对象以 `Arc<T>` 的形式存放，通过 [`Instance::downcast_shared`] 取回。
    pub fn from_trait_object<T: ?Sized + Send + Sync + 'static>(value: Arc<T>) -> Self {
        Self {
            type_key: TypeKey::of::<T>(),
            object: Arc::new(value),
        }
    }

    /// 名义类型
    pub fn type_key(&self) -> &TypeKey {
        &self.type_key
    }

    /// 底层对象
    pub fn object(&self) -> &AnyObject {
        &self.object
    }

    /// 向下转型为具体类型
    ///
    /// 以 [`Instance::from_trait_object`] 包装的 `Arc<T>` 同样可以取回。
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.object
            .clone()
            .downcast::<T>()
            .ok()
            .or_else(|| self.object.downcast_ref::<Arc<T>>().cloned())
    }

    /// 以引用形式向下转型
    pub fn downcast_ref<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.object
            .downcast_ref::<T>()
            .or_else(|| self.object.downcast_ref::<Arc<T>>().map(|shared| &**shared))
    }

    /// 取回以 [`Instance::from_trait_object`] 包装的 trait 对象
    pub fn downcast_shared<T: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.object.downcast_ref::<Arc<T>>().cloned()
    }

    /// 是否指向同一个对象
    pub fn ptr_eq(&self, other: &Instance) -> bool {
        Arc::ptr_eq(&self.object, &other.object)
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Instance({}@{:p})", self.type_key, Arc::as_ptr(&self.object))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Counter(usize);

    #[test]
    fn test_downcast_and_identity() {
        let instance = Instance::new(Counter(3));
        assert_eq!(instance.type_key(), &TypeKey::of::<Counter>());
        assert_eq!(instance.downcast_ref::<Counter>().map(|c| c.0), Some(3));
        assert!(instance.downcast::<String>().is_none());

        let clone = instance.clone();
        assert!(clone.ptr_eq(&instance));
        assert!(!Instance::new(Counter(3)).ptr_eq(&instance));
    }

    trait Describe: Send + Sync {
        fn describe(&self) -> String;
    }

    impl Describe for Counter {
        fn describe(&self) -> String {
            format!("counter {}", self.0)
        }
    }

    #[test]
    fn test_trait_object_round_trip() {
        let shared: Arc<dyn Describe> = Arc::new(Counter(5));
        let instance = Instance::from_trait_object(shared);
        assert_eq!(instance.type_key(), &TypeKey::of::<dyn Describe>());
        let back = instance.downcast_shared::<dyn Describe>().unwrap();
        assert_eq!(back.describe(), "counter 5");
        assert!(instance.downcast::<Counter>().is_none());
    }

    #[test]
    fn test_from_parts_keeps_declared_type() {
        let declared = TypeKey::named("com.example.Greeter");
        let instance = Instance::from_parts(declared.clone(), Arc::new(Counter(1)));
        assert_eq!(instance.type_key(), &declared);
        assert!(instance.downcast::<Counter>().is_some());
    }

    #[test]
    fn test_shared_concrete_value_downcasts() {
        let shared = Arc::new(Counter(9));
        let instance = Instance::from_trait_object(shared.clone());
        assert_eq!(instance.type_key(), &TypeKey::of::<Counter>());
        assert!(Arc::ptr_eq(&instance.downcast::<Counter>().unwrap(), &shared));
        assert_eq!(instance.downcast_ref::<Counter>().map(|c| c.0), Some(9));
    }
}
