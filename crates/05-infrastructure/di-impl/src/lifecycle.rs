//! 生命周期驱动

use crate::pipeline::PostProcessorPipeline;
use crate::registry::ComponentRegistry;
use di_abstractions::{ComponentDescriptor, LifecycleHook, OperationDef, TypeCatalog};
use infrastructure_common::{
    Arguments, ComponentError, DependencyError, DependencyResult, Instance,
};
use tracing::{debug, warn};

/// 生命周期驱动
///
/// 就绪钩子按注册表顺序执行；关闭钩子按注册表逆序执行。
pub struct LifecycleDriver<'a> {
    catalog: &'a TypeCatalog,
    pipeline: &'a PostProcessorPipeline,
}

impl<'a> LifecycleDriver<'a> {
    /// 创建生命周期驱动器
    pub fn new(catalog: &'a TypeCatalog, pipeline: &'a PostProcessorPipeline) -> Self {
        Self { catalog, pipeline }
    }

    /// 调用所有组件的就绪钩子，然后执行就绪后处理
    pub fn ready(&self, registry: &ComponentRegistry) -> DependencyResult<()> {
        for descriptor in registry.ordered() {
            if let Some(hook) = &descriptor.ready_hook {
                let target = self.pipeline.unwrap(descriptor)?;
                self.call_hook(descriptor, hook, &target, "就绪")?;
            }
            self.pipeline.after_ready(descriptor, self.catalog)?;
        }
        Ok(())
    }

    /// 调用所有组件的关闭钩子并清空实例
    ///
    /// 每个钩子都会被尝试，失败收集后一并返回。
    pub fn shutdown(&self, registry: &ComponentRegistry) -> Vec<DependencyError> {
        let mut failures = Vec::new();
        for descriptor in registry.ordered().iter().rev() {
            let Some(hook) = &descriptor.shutdown_hook else {
                continue;
            };
            if !descriptor.is_settled() {
                continue;
            }
            let result = self
                .pipeline
                .unwrap(descriptor)
                .and_then(|target| self.call_hook(descriptor, hook, &target, "关闭"));
            if let Err(error) = result {
                warn!("组件 {} 关闭失败: {}", descriptor.name, error);
                failures.push(error);
            }
        }
        for descriptor in registry.ordered() {
            descriptor.clear();
        }
        failures
    }

    fn call_hook(
        &self,
        descriptor: &ComponentDescriptor,
        hook: &LifecycleHook,
        target: &Instance,
        phase: &str,
    ) -> DependencyResult<()> {
        let operation = match hook {
            LifecycleHook::Method(operation) => operation,
            LifecycleHook::Named(name) => self.named_operation(target, name)?,
        };
        debug!(
            "调用组件 {} 的{}方法: {}",
            descriptor.name, phase, operation.name
        );
        operation
            .invoke(target, Arguments::empty())
            .map(drop)
            .map_err(|e| {
                DependencyError::creation_failed(
                    &descriptor.name,
                    format!("{}方法 {}", phase, operation.name),
                    e,
                )
            })
    }

    /// 在实例类型上按名称查找钩子
    fn named_operation(&self, target: &Instance, name: &str) -> DependencyResult<&'a OperationDef> {
        let invalid = |reason: &str| ComponentError::InvalidLifecycleHook {
            type_name: target.type_key().to_string(),
            hook: name.to_string(),
            reason: reason.to_string(),
        };
        let operation = self
            .catalog
            .operation(target.type_key(), name)
            .ok_or_else(|| invalid("实例类型上不存在该操作"))?;
        if operation.param_count != 0 {
            return Err(invalid("生命周期方法不能带参数").into());
        }
        Ok(operation)
    }
}
