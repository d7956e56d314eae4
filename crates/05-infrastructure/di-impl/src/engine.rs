//! 组件构造引擎
//!
//! 解析构造参数，按需递归创建依赖，检测循环依赖，并完成后处理与代理包装。

use crate::pipeline::PostProcessorPipeline;
use crate::proxy;
use crate::registry::ComponentRegistry;
use config_abstractions::PropertySource;
use di_abstractions::{Binding, ComponentDescriptor, ConstructionStrategy, ProxyChain};
use infrastructure_common::{
    Arguments, DependencyError, DependencyResult, Instance, TypeKey, Value,
};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

/// 构造引擎
pub struct ConstructionEngine<'a> {
    registry: &'a ComponentRegistry,
    config: &'a dyn PropertySource,
    pipeline: &'a PostProcessorPipeline,
    /// 正在构造的组件名称，按进入顺序
    in_flight: Mutex<Vec<String>>,
}

/// 离开作用域时把组件移出构造栈
struct InFlightGuard<'a> {
    stack: &'a Mutex<Vec<String>>,
    name: String,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut stack = self.stack.lock();
        if let Some(position) = stack.iter().rposition(|name| *name == self.name) {
            stack.remove(position);
        }
    }
}

impl<'a> ConstructionEngine<'a> {
    /// 在注册表、属性源和后处理器流水线之上创建构建引擎
    pub fn new(
        registry: &'a ComponentRegistry,
        config: &'a dyn PropertySource,
        pipeline: &'a PostProcessorPipeline,
    ) -> Self {
        Self {
            registry,
            config,
            pipeline,
            in_flight: Mutex::new(Vec::new()),
        }
    }

    /// 构造组件，已有实例时直接返回
    pub fn construct(&self, descriptor: &Arc<ComponentDescriptor>) -> DependencyResult<Instance> {
        if let Some(instance) = descriptor.instance() {
            return Ok(instance);
        }
        let _guard = self.enter(&descriptor.name)?;
        debug!("创建组件: {}", descriptor);

        let args = self.resolve_arguments(descriptor)?;
        let raw = self.invoke_strategy(descriptor, args)?;
        descriptor.set_instance(raw, self.registry.catalog())?;

        self.pipeline
            .after_construction(descriptor, self.registry.catalog())?;
        self.apply_proxies(descriptor)?;
        descriptor.required_instance()
    }

    /// 标记组件正在构造；已被标记时报告循环依赖
    fn enter(&self, name: &str) -> DependencyResult<InFlightGuard<'_>> {
        let mut stack = self.in_flight.lock();
        if let Some(position) = stack.iter().position(|entry| entry == name) {
            let mut chain = stack[position..].to_vec();
            chain.push(name.to_string());
            return Err(DependencyError::CircularDependency {
                name: name.to_string(),
                chain: chain.join(" -> "),
            });
        }
        stack.push(name.to_string());
        Ok(InFlightGuard {
            stack: &self.in_flight,
            name: name.to_string(),
        })
    }

    fn resolve_arguments(&self, descriptor: &ComponentDescriptor) -> DependencyResult<Arguments> {
        let implicit_autowired = descriptor.strategy.implicit_autowired();
        descriptor
            .strategy
            .params()
            .iter()
            .map(|param| {
                let binding = param.binding(&descriptor.name, implicit_autowired)?;
                self.resolve_binding(descriptor, &binding)
            })
            .collect::<DependencyResult<Vec<_>>>()
            .map(Arguments::new)
    }

    /// 解析一个绑定
    ///
    /// 可选依赖缺失时返回 [`Value::Unit`]。
    pub fn resolve_binding(
        &self,
        descriptor: &ComponentDescriptor,
        binding: &Binding,
    ) -> DependencyResult<Value> {
        match binding {
            Binding::Value { expression, ty } => self
                .config
                .resolve_binding(expression, *ty)
                .map(Value::Scalar)
                .map_err(|source| DependencyError::Configuration {
                    component: descriptor.name.clone(),
                    source,
                }),
            Binding::Dependency { name, ty, required } => {
                self.resolve_dependency(descriptor, name.as_deref(), ty, *required)
            }
        }
    }

    fn resolve_dependency(
        &self,
        descriptor: &ComponentDescriptor,
        name: Option<&str>,
        ty: &TypeKey,
        required: bool,
    ) -> DependencyResult<Value> {
        let target = match name {
            Some(name) => self.registry.find_named(name, ty)?,
            None => self.registry.find_unique(ty)?,
        };
        let dependency = || name.map_or_else(|| ty.to_string(), str::to_string);

        let Some(target) = target else {
            if required {
                return Err(DependencyError::MissingDependency {
                    component: descriptor.name.clone(),
                    dependency: dependency(),
                });
            }
            debug!("组件 {} 的可选依赖 {} 不存在", descriptor.name, dependency());
            return Ok(Value::Unit);
        };

        let instance = match target.instance() {
            Some(instance) => instance,
            None if descriptor.is_bootstrap() => {
                if required {
                    return Err(DependencyError::BootstrapDependency {
                        component: descriptor.name.clone(),
                        dependency: target.name.clone(),
                    });
                }
                debug!(
                    "引导组件 {} 的可选依赖 {} 尚未创建, 按缺失处理",
                    descriptor.name, target.name
                );
                return Ok(Value::Unit);
            }
            None => self.construct(&target)?,
        };

        // 未声明类型化代理的实例无法转型，原样传递给命名操作调用
        let view = self
            .registry
            .catalog()
            .view(&instance, ty)
            .unwrap_or(instance);
        Ok(Value::Instance(view))
    }

    fn invoke_strategy(
        &self,
        descriptor: &ComponentDescriptor,
        args: Arguments,
    ) -> DependencyResult<Instance> {
        match &descriptor.strategy {
            ConstructionStrategy::Constructor(constructor) => (constructor.construct)(args)
                .map_err(|e| DependencyError::creation_failed(&descriptor.name, "构造", e)),
            ConstructionStrategy::Factory {
                factory_name,
                method,
            } => {
                let owner =
                    self.registry
                        .get(factory_name)
                        .ok_or_else(|| DependencyError::NotFound {
                            name: factory_name.clone(),
                        })?;
                self.construct(owner)?;
                let owner_instance = match owner.original_instance() {
                    Some(original) => original,
                    None => owner.required_instance()?,
                };
                (method.invoke)(&owner_instance, args).map_err(|e| {
                    DependencyError::creation_failed(
                        &descriptor.name,
                        format!("工厂方法 {}.{}", factory_name, method.name),
                        e,
                    )
                })
            }
        }
    }

    /// 把挂载的拦截器组合成代理，包装当前实例
    fn apply_proxies(&self, descriptor: &ComponentDescriptor) -> DependencyResult<()> {
        if descriptor.proxy_names.is_empty() {
            return Ok(());
        }
        let catalog = self.registry.catalog();
        let target = descriptor.required_instance()?;

        let mut interceptors = Vec::with_capacity(descriptor.proxy_names.len());
        for name in &descriptor.proxy_names {
            let proxy_descriptor =
                self.registry
                    .get(name)
                    .ok_or_else(|| DependencyError::NotFound { name: name.clone() })?;
            let instance = self.construct(proxy_descriptor)?;
            let instance = proxy_descriptor.original_instance().unwrap_or(instance);
            let interceptor = catalog.as_interceptor(&instance).ok_or_else(|| {
                DependencyError::InvalidInterceptor {
                    component: descriptor.name.clone(),
                    interceptor: name.clone(),
                }
            })?;
            interceptors.push(interceptor);
        }

        debug!(
            "组件 {} 挂载拦截器: {}",
            descriptor.name,
            descriptor.proxy_names.join(", ")
        );
        let chain = ProxyChain::new(&descriptor.name, target, interceptors, catalog.clone());
        let proxy = proxy::wrap(catalog, descriptor, &chain)?;
        descriptor.set_proxy(proxy, chain, catalog)
    }
}
