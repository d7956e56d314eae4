//! 拦截代理
//!
//! 挂载了拦截器的组件以代理的形式对外提供。产出类型声明了类型化代理时，
//! 代理是实现同一接口的包装对象，可以直接作为依赖注入；否则代理就是以
//! 目标名义类型出现的拦截器链，只能通过命名操作调用。

use di_abstractions::{ComponentDescriptor, ProxyChain, TypeCatalog};
use infrastructure_common::{Arguments, DependencyError, DependencyResult, Instance, Value};
use std::sync::Arc;
use tracing::debug;

/// 用拦截器链包装组件实例
///
/// 先查找实例类型声明的类型化代理，再查找产出类型的。
pub fn wrap(
    catalog: &TypeCatalog,
    descriptor: &ComponentDescriptor,
    chain: &ProxyChain,
) -> DependencyResult<Instance> {
    let target_key = chain.target().type_key();
    let proxy = [target_key, &descriptor.produced_type]
        .into_iter()
        .find_map(|key| catalog.get(key).and_then(|definition| definition.proxy.clone()));

    let Some(proxy) = proxy else {
        debug!(
            "组件 {} 未声明类型化代理, 只能通过命名操作调用",
            descriptor.name
        );
        return Ok(Instance::from_parts(
            target_key.clone(),
            Arc::new(chain.clone()),
        ));
    };
    proxy(chain).ok_or_else(|| {
        DependencyError::creation_failed(
            &descriptor.name,
            "创建代理",
            anyhow::anyhow!("类型化代理不接受实例类型 {}", target_key),
        )
    })
}

/// 调用实例上的命名操作，实例是拦截器链时先经过拦截器
pub fn dispatch(
    catalog: &TypeCatalog,
    instance: &Instance,
    operation: &str,
    args: Arguments,
) -> anyhow::Result<Value> {
    match instance.downcast_ref::<ProxyChain>() {
        Some(chain) => chain.invoke(operation, args),
        None => catalog.invoke(instance, operation, args),
    }
}
