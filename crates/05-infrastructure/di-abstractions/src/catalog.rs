//! 类型目录

use crate::declared::DeclaredComponent;
use crate::interceptor::Interceptor;
use crate::introspection::{OperationDef, TypeDefinition};
use crate::markers::MarkerDefinition;
use crate::processor::PostProcessor;
use infrastructure_common::{
    Arguments, ComponentError, ComponentResult, Instance, TypeKey, Value,
};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

/// 类型目录
///
/// 宿主程序登记的全部候选类型及复合标记，是容器唯一的内省来源。
#[derive(Debug, Default, Clone)]
pub struct TypeCatalog {
    types: BTreeMap<TypeKey, Arc<TypeDefinition>>,
    markers: HashMap<String, MarkerDefinition>,
}

impl TypeCatalog {
    /// 创建空目录
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记类型
    pub fn register(&mut self, definition: TypeDefinition) -> ComponentResult<&mut Self> {
        if self.types.contains_key(&definition.key) {
            return Err(ComponentError::DuplicateType {
                type_name: definition.key.to_string(),
            });
        }
        debug!("登记类型: {}", definition.key);
        self.types
            .insert(definition.key.clone(), Arc::new(definition));
        Ok(self)
    }

    /// 登记自带类型定义的组件
    pub fn register_declared<T: DeclaredComponent>(&mut self) -> ComponentResult<&mut Self> {
        self.register(T::type_definition())
    }

    /// 登记复合标记
    pub fn register_marker(&mut self, definition: MarkerDefinition) -> ComponentResult<&mut Self> {
        if self.markers.contains_key(&definition.key) {
            return Err(ComponentError::DuplicateType {
                type_name: definition.key,
            });
        }
        debug!("登记复合标记: {}", definition.key);
        self.markers.insert(definition.key.clone(), definition);
        Ok(self)
    }

    /// 按类型标识查找
    pub fn get(&self, key: &TypeKey) -> Option<&Arc<TypeDefinition>> {
        self.types.get(key)
    }

    /// 按全限定名查找
    pub fn get_by_name(&self, name: &str) -> Option<&Arc<TypeDefinition>> {
        self.types.get(&TypeKey::named(name))
    }

    /// 查找复合标记
    pub fn marker(&self, key: &str) -> Option<&MarkerDefinition> {
        self.markers.get(key)
    }

    /// 所有登记的类型名称，按名称排序
    pub fn type_names(&self) -> Vec<String> {
        self.types.keys().map(ToString::to_string).collect()
    }

    /// 已登记的类型数
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// 是否没有登记任何类型
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// `from` 类型的实例能否当作 `to` 类型使用
    pub fn is_assignable(&self, from: &TypeKey, to: &TypeKey) -> bool {
        let mut visited = HashSet::new();
        self.is_assignable_inner(from, to, &mut visited)
    }

    fn is_assignable_inner<'a>(
        &'a self,
        from: &'a TypeKey,
        to: &TypeKey,
        visited: &mut HashSet<&'a TypeKey>,
    ) -> bool {
        if from == to {
            return true;
        }
        if !visited.insert(from) {
            return false;
        }
        self.types.get(from).is_some_and(|definition| {
            definition
                .supertypes
                .iter()
                .any(|supertype| self.is_assignable_inner(&supertype.key, to, visited))
        })
    }

    /// 取得实例在目标类型下的视图
    ///
    /// 目标类型与实例类型相同时返回实例本身；否则沿父类型的转型函数逐级转换。
    pub fn view(&self, instance: &Instance, target: &TypeKey) -> Option<Instance> {
        if instance.type_key() == target {
            return Some(instance.clone());
        }
        let definition = self.types.get(instance.type_key())?;
        definition.supertypes.iter().find_map(|supertype| {
            if !self.is_assignable(&supertype.key, target) {
                return None;
            }
            let upcast = supertype.upcast.as_ref()?;
            let parent = upcast(instance)?;
            self.view(&parent, target)
        })
    }

    /// 实例类型及其所有可到达的祖先，按由近及远的顺序
    pub fn ancestors(&self, instance: &Instance) -> Vec<(Arc<TypeDefinition>, Instance)> {
        let mut result = Vec::new();
        let mut visited = HashSet::new();
        self.collect_ancestors(instance, &mut visited, &mut result);
        result
    }

    fn collect_ancestors(
        &self,
        instance: &Instance,
        visited: &mut HashSet<TypeKey>,
        result: &mut Vec<(Arc<TypeDefinition>, Instance)>,
    ) {
        if !visited.insert(instance.type_key().clone()) {
            return;
        }
        let Some(definition) = self.types.get(instance.type_key()) else {
            return;
        };
        result.push((definition.clone(), instance.clone()));
        for supertype in &definition.supertypes {
            let parent = supertype.upcast.as_ref().and_then(|upcast| upcast(instance));
            match parent {
                Some(parent) => self.collect_ancestors(&parent, visited, result),
                None => debug!("父类型 {} 无法转型, 跳过其成员", supertype.key),
            }
        }
    }

    /// 按名称查找实例类型上的操作
    pub fn operation(&self, ty: &TypeKey, name: &str) -> Option<&OperationDef> {
        self.types.get(ty)?.operation_named(name)
    }

    /// 调用实例上的命名操作
    pub fn invoke(&self, instance: &Instance, operation: &str, args: Arguments) -> anyhow::Result<Value> {
        let op = self.operation(instance.type_key(), operation).ok_or_else(|| {
            anyhow::anyhow!("类型 {} 上不存在操作 '{}'", instance.type_key(), operation)
        })?;
        op.invoke(instance, args)
    }

    /// 实例是否实现后处理器接口
    pub fn as_post_processor(&self, instance: &Instance) -> Option<Arc<dyn PostProcessor>> {
        let cast = self.types.get(instance.type_key())?.post_processor.as_ref()?;
        cast(instance)
    }

    /// 实例是否实现拦截器接口
    pub fn as_interceptor(&self, instance: &Instance) -> Option<Arc<dyn Interceptor>> {
        let cast = self.types.get(instance.type_key())?.interceptor.as_ref()?;
        cast(instance)
    }
}
