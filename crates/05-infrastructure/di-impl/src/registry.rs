//! 组件注册表

use di_abstractions::{ComponentDescriptor, ProxyChain, TypeCatalog};
use infrastructure_common::{
    ComponentError, ComponentResult, DependencyError, DependencyResult, Instance, TypeKey,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// 组件注册表
///
/// 按名称索引的描述符集合，以及按排序权重、名称排列的有序视图。
/// 所有需要可复现顺序的遍历都走有序视图。
pub struct ComponentRegistry {
    catalog: Arc<TypeCatalog>,
    by_name: HashMap<String, Arc<ComponentDescriptor>>,
    ordered: Vec<Arc<ComponentDescriptor>>,
}

impl ComponentRegistry {
    /// 创建注册表，名称重复时报错
    pub fn new(
        catalog: Arc<TypeCatalog>,
        descriptors: Vec<ComponentDescriptor>,
    ) -> ComponentResult<Self> {
        let mut by_name = HashMap::with_capacity(descriptors.len());
        let mut ordered = Vec::with_capacity(descriptors.len());

        for descriptor in descriptors {
            let descriptor = Arc::new(descriptor);
            if by_name
                .insert(descriptor.name.clone(), descriptor.clone())
                .is_some()
            {
                return Err(ComponentError::DuplicateName {
                    name: descriptor.name.clone(),
                });
            }
            ordered.push(descriptor);
        }
        ordered.sort_by(|a, b| a.registry_order(b));
        debug!("注册表包含 {} 个组件", ordered.len());

        Ok(Self {
            catalog,
            by_name,
            ordered,
        })
    }

    /// 描述符引用的类型目录
    pub fn catalog(&self) -> &Arc<TypeCatalog> {
        &self.catalog
    }

    /// 按名称查找
    pub fn get(&self, name: &str) -> Option<&Arc<ComponentDescriptor>> {
        self.by_name.get(name)
    }

    /// 是否存在该名称的组件
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// 有序视图：权重升序，其次名称升序
    pub fn ordered(&self) -> &[Arc<ComponentDescriptor>] {
        &self.ordered
    }

    /// 组件个数
    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    /// 是否没有任何组件
    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    /// 产出类型可赋值给 `ty` 的所有描述符，按有序视图排列
    pub fn find_by_type(&self, ty: &TypeKey) -> Vec<Arc<ComponentDescriptor>> {
        self.ordered
            .iter()
            .filter(|descriptor| self.catalog.is_assignable(&descriptor.produced_type, ty))
            .cloned()
            .collect()
    }

    /// 按类型查找唯一描述符
    ///
    /// 没有候选时返回 `None`；多个候选时要求恰好一个声明了 primary。
    pub fn find_unique(&self, ty: &TypeKey) -> DependencyResult<Option<Arc<ComponentDescriptor>>> {
        let mut candidates = self.find_by_type(ty);
        if candidates.len() <= 1 {
            return Ok(candidates.pop());
        }

        let primaries: Vec<&Arc<ComponentDescriptor>> =
            candidates.iter().filter(|descriptor| descriptor.primary).collect();
        let reason = match primaries.as_slice() {
            [primary] => return Ok(Some(Arc::clone(primary))),
            [] => "均未声明 Primary",
            _ => "声明了多个 Primary",
        };
        Err(DependencyError::NoUniqueComponent {
            type_name: ty.to_string(),
            candidates: candidates
                .iter()
                .map(|descriptor| descriptor.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            reason: reason.to_string(),
        })
    }

    /// 实例是某个组件的代理时，返回该组件的拦截器链
    pub fn proxy_chain_of(&self, instance: &Instance) -> Option<ProxyChain> {
        self.ordered
            .iter()
            .find(|descriptor| {
                descriptor
                    .instance()
                    .is_some_and(|current| current.ptr_eq(instance))
            })
            .and_then(|descriptor| descriptor.proxy_chain())
    }

    /// 按名称查找并检查类型
    ///
    /// 名称不存在时返回 `None`；存在但类型不符时报错。
    pub fn find_named(
        &self,
        name: &str,
        ty: &TypeKey,
    ) -> DependencyResult<Option<Arc<ComponentDescriptor>>> {
        let Some(descriptor) = self.by_name.get(name) else {
            return Ok(None);
        };
        if !self.catalog.is_assignable(&descriptor.produced_type, ty) {
            return Err(DependencyError::TypeMismatch {
                name: name.to_string(),
                expected: ty.to_string(),
                actual: descriptor.produced_type.to_string(),
            });
        }
        Ok(Some(descriptor.clone()))
    }
}

impl std::fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field("components", &self.ordered.iter().map(|d| &d.name).collect::<Vec<_>>())
            .finish()
    }
}
