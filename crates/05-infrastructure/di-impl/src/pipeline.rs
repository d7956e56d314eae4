//! 后处理器流水线

use di_abstractions::{ComponentDescriptor, PostProcessor, TypeCatalog};
use infrastructure_common::{DependencyError, DependencyResult, Instance};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::debug;

#[derive(Clone)]
struct RegisteredProcessor {
    name: String,
    order: i32,
    processor: Arc<dyn PostProcessor>,
}

/// 后处理器流水线
///
/// 后处理器在引导阶段逐个加入，始终按排序权重、名称升序排列。
#[derive(Default)]
pub struct PostProcessorPipeline {
    processors: RwLock<Vec<RegisteredProcessor>>,
}

impl PostProcessorPipeline {
    /// 创建空流水线
    pub fn new() -> Self {
        Self::default()
    }

    /// 加入后处理器
    pub fn register(&self, name: impl Into<String>, order: i32, processor: Arc<dyn PostProcessor>) {
        let registered = RegisteredProcessor {
            name: name.into(),
            order,
            processor,
        };
        debug!("注册后处理器: {}", registered.name);
        let mut processors = self.processors.write();
        let position = processors
            .iter()
            .position(|p| (p.order, p.name.as_str()) > (registered.order, registered.name.as_str()))
            .unwrap_or(processors.len());
        processors.insert(position, registered);
    }

    /// 已注册的后处理器个数
    pub fn len(&self) -> usize {
        self.processors.read().len()
    }

    /// 是否没有后处理器
    pub fn is_empty(&self) -> bool {
        self.processors.read().is_empty()
    }

    /// 后处理器名称，按执行顺序
    pub fn names(&self) -> Vec<String> {
        self.processors.read().iter().map(|p| p.name.clone()).collect()
    }

    fn snapshot(&self) -> Vec<RegisteredProcessor> {
        self.processors.read().clone()
    }

    /// 构造完成后的处理，替换结果写回描述符
    pub fn after_construction(
        &self,
        descriptor: &ComponentDescriptor,
        catalog: &TypeCatalog,
    ) -> DependencyResult<Instance> {
        let mut current = descriptor.required_instance()?;
        for registered in self.snapshot() {
            let next = registered
                .processor
                .after_construction(current.clone(), &descriptor.name)
                .map_err(|e| DependencyError::creation_failed(&descriptor.name, "构造后处理", e))?;
            if !next.ptr_eq(&current) {
                debug!("组件 {} 被后处理器 {} 替换", descriptor.name, registered.name);
                descriptor.set_instance(next.clone(), catalog)?;
                current = next;
            }
        }
        Ok(current)
    }

    /// 就绪钩子之后的处理，替换结果写回描述符
    pub fn after_ready(
        &self,
        descriptor: &ComponentDescriptor,
        catalog: &TypeCatalog,
    ) -> DependencyResult<Instance> {
        let mut current = descriptor.required_instance()?;
        for registered in self.snapshot() {
            let next = registered
                .processor
                .after_ready(current.clone(), &descriptor.name)
                .map_err(|e| DependencyError::creation_failed(&descriptor.name, "就绪后处理", e))?;
            if !next.ptr_eq(&current) {
                debug!(
                    "组件 {} 在就绪后被后处理器 {} 替换",
                    descriptor.name, registered.name
                );
                descriptor.set_instance(next.clone(), catalog)?;
                current = next;
            }
        }
        Ok(current)
    }

    /// 取得属性注入和生命周期钩子应当作用的原始实例
    ///
    /// 从代理包装前的实例开始，按排序权重降序依次交给每个后处理器。
    pub fn unwrap(&self, descriptor: &ComponentDescriptor) -> DependencyResult<Instance> {
        let mut current = match descriptor.original_instance() {
            Some(original) => original,
            None => descriptor.required_instance()?,
        };
        for registered in self.snapshot().iter().rev() {
            current = registered
                .processor
                .before_property_set(current, &descriptor.name)
                .map_err(|e| DependencyError::creation_failed(&descriptor.name, "取得原始实例", e))?;
        }
        Ok(current)
    }
}

impl std::fmt::Debug for PostProcessorPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostProcessorPipeline")
            .field("processors", &self.names())
            .finish()
    }
}
