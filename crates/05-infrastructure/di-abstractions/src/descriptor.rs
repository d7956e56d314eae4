//! 组件描述符

use crate::catalog::TypeCatalog;
use crate::interceptor::ProxyChain;
use crate::introspection::{ConstructorDef, FactoryMethodDef, OperationDef, ParamDef};
use infrastructure_common::{DependencyError, DependencyResult, Instance, TypeKey};
use parking_lot::RwLock;
use std::cmp::Ordering;
use std::fmt;

/// 构造方式，描述符创建后不再改变
#[derive(Debug, Clone)]
pub enum ConstructionStrategy {
    /// 直接调用产出类型的构造函数
    Constructor(ConstructorDef),
    /// 调用配置组件上的工厂方法
    Factory {
        factory_name: String,
        method: FactoryMethodDef,
    },
}

impl ConstructionStrategy {
    /// 构造所需的参数定义
    pub fn params(&self) -> &[ParamDef] {
        match self {
            Self::Constructor(constructor) => &constructor.params,
            Self::Factory { method, .. } => &method.params,
        }
    }

    /// 未标记的参数是否按依赖绑定处理
    pub fn implicit_autowired(&self) -> bool {
        match self {
            Self::Constructor(constructor) => constructor.autowired,
            Self::Factory { .. } => false,
        }
    }
}

/// 生命周期钩子
#[derive(Debug, Clone)]
pub enum LifecycleHook {
    /// 直接引用的操作
    Method(OperationDef),
    /// 在调用时按名称从实例类型上查找的操作
    Named(String),
}

impl LifecycleHook {
    /// 钩子对应的操作名称
    pub fn name(&self) -> &str {
        match self {
            Self::Method(operation) => &operation.name,
            Self::Named(name) => name,
        }
    }
}

/// 组件描述符
///
/// 容器对一个可构造组件的元数据记录。结构在构建时确定，
/// 只有实例单元在启动期间被写入。
pub struct ComponentDescriptor {
    /// 组件名称，容器内唯一
    pub name: String,
    /// 组件实例满足的名义类型
    pub produced_type: TypeKey,
    /// 排序权重，数值越小越靠前
    pub order: i32,
    /// 按类型查找时优先
    pub primary: bool,
    /// 构造方式
    pub strategy: ConstructionStrategy,
    /// 属性注入后调用的钩子
    pub ready_hook: Option<LifecycleHook>,
    /// 容器关闭时调用的钩子
    pub shutdown_hook: Option<LifecycleHook>,
    /// 产出类型带配置类标记
    pub is_configuration: bool,
    /// 产出类型实现后处理器接口
    pub is_post_processor: bool,
    /// 挂载的拦截器组件名称，按拦截器排序权重升序
    pub proxy_names: Vec<String>,
    instance: RwLock<Option<Instance>>,
    original: RwLock<Option<Instance>>,
    proxy_chain: RwLock<Option<ProxyChain>>,
}

impl ComponentDescriptor {
    /// 创建描述符
    pub fn new(
        name: impl Into<String>,
        produced_type: TypeKey,
        order: i32,
        primary: bool,
        strategy: ConstructionStrategy,
    ) -> Self {
        Self {
            name: name.into(),
            produced_type,
            order,
            primary,
            strategy,
            ready_hook: None,
            shutdown_hook: None,
            is_configuration: false,
            is_post_processor: false,
            proxy_names: Vec::new(),
            instance: RwLock::new(None),
            original: RwLock::new(None),
            proxy_chain: RwLock::new(None),
        }
    }

    /// 设置生命周期钩子
    pub fn with_hooks(
        mut self,
        ready_hook: Option<LifecycleHook>,
        shutdown_hook: Option<LifecycleHook>,
    ) -> Self {
        self.ready_hook = ready_hook;
        self.shutdown_hook = shutdown_hook;
        self
    }

    /// 设置配置类与后处理器标志
    pub fn with_flags(mut self, is_configuration: bool, is_post_processor: bool) -> Self {
        self.is_configuration = is_configuration;
        self.is_post_processor = is_post_processor;
        self
    }

    /// 设置挂载的拦截器组件
    pub fn with_proxies(mut self, proxy_names: Vec<String>) -> Self {
        self.proxy_names = proxy_names;
        self
    }

    /// 工厂组件名称
    pub fn factory_name(&self) -> Option<&str> {
        match &self.strategy {
            ConstructionStrategy::Factory { factory_name, .. } => Some(factory_name),
            ConstructionStrategy::Constructor(_) => None,
        }
    }

    /// 配置类与后处理器在普通组件之前引导
    pub fn is_bootstrap(&self) -> bool {
        self.is_configuration || self.is_post_processor
    }

    /// 当前实例
    pub fn instance(&self) -> Option<Instance> {
        self.instance.read().clone()
    }

    /// 当前实例，尚未创建时报错
    pub fn required_instance(&self) -> DependencyResult<Instance> {
        self.instance().ok_or_else(|| DependencyError::InstanceNotReady {
            name: self.name.clone(),
        })
    }

    /// 实例是否已经写入
    pub fn is_settled(&self) -> bool {
        self.instance.read().is_some()
    }

    /// 写入实例，类型不符时报错
    pub fn set_instance(&self, instance: Instance, catalog: &TypeCatalog) -> DependencyResult<()> {
        if !catalog.is_assignable(instance.type_key(), &self.produced_type) {
            return Err(DependencyError::TypeMismatch {
                name: self.name.clone(),
                expected: self.produced_type.to_string(),
                actual: instance.type_key().to_string(),
            });
        }
        *self.instance.write() = Some(instance);
        Ok(())
    }

    /// 代理包装前的实例
    pub fn original_instance(&self) -> Option<Instance> {
        self.original.read().clone()
    }

    /// 挂载的拦截器链
    pub fn proxy_chain(&self) -> Option<ProxyChain> {
        self.proxy_chain.read().clone()
    }

    /// 用代理替换当前实例
    ///
    /// 代理的名义类型可以是产出类型本身或其父类型；链上的目标实例
    /// 记录为代理包装前的实例。
    pub fn set_proxy(
        &self,
        proxy: Instance,
        chain: ProxyChain,
        catalog: &TypeCatalog,
    ) -> DependencyResult<()> {
        if !catalog.is_assignable(&self.produced_type, proxy.type_key())
            && !catalog.is_assignable(proxy.type_key(), &self.produced_type)
        {
            return Err(DependencyError::TypeMismatch {
                name: self.name.clone(),
                expected: self.produced_type.to_string(),
                actual: proxy.type_key().to_string(),
            });
        }
        *self.original.write() = Some(chain.target().clone());
        *self.instance.write() = Some(proxy);
        *self.proxy_chain.write() = Some(chain);
        Ok(())
    }

    /// 清空实例单元
    pub fn clear(&self) {
        *self.instance.write() = None;
        *self.original.write() = None;
        *self.proxy_chain.write() = None;
    }

    /// 注册表排序：权重升序，其次名称升序
    pub fn registry_order(&self, other: &Self) -> Ordering {
        self.order
            .cmp(&other.order)
            .then_with(|| self.name.cmp(&other.name))
    }
}

impl fmt::Debug for ComponentDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentDescriptor")
            .field("name", &self.name)
            .field("produced_type", &self.produced_type)
            .field("order", &self.order)
            .field("primary", &self.primary)
            .field("factory", &self.factory_name())
            .field("ready_hook", &self.ready_hook.as_ref().map(LifecycleHook::name))
            .field("shutdown_hook", &self.shutdown_hook.as_ref().map(LifecycleHook::name))
            .field("is_configuration", &self.is_configuration)
            .field("is_post_processor", &self.is_post_processor)
            .field("proxy_names", &self.proxy_names)
            .field("instance", &self.instance())
            .field("proxy_chain", &self.proxy_chain())
            .finish()
    }
}

impl fmt::Display for ComponentDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' ({})", self.name, self.produced_type)
    }
}
