//! 应用上下文
//!
//! 容器门面的实现：一次性完成扫描、描述、构造、注入、就绪，
//! 之后只提供查找，直到关闭。

use crate::builder::DescriptorBuilder;
use crate::engine::ConstructionEngine;
use crate::injector::PropertyInjector;
use crate::lifecycle::LifecycleDriver;
use crate::pipeline::PostProcessorPipeline;
use crate::proxy::dispatch;
use crate::registry::ComponentRegistry;
use crate::scanner::CatalogScanner;
use chrono::{DateTime, Utc};
use config_abstractions::PropertySource;
use config_impl::ConfigProperties;
use di_abstractions::{
    ApplicationContext, ComponentDescriptor, TypeCatalog, TypeDefinition, TypeScanner,
};
use infrastructure_common::{
    Arguments, ComponentError, ComponentResult, DependencyError, DependencyResult,
    InfrastructureError, InfrastructureResult, Instance, TypeKey, Value,
};
use parking_lot::{RwLock, RwLockReadGuard};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Default)]
struct ContextState {
    closed: bool,
}

/// 基于声明标记的应用上下文
pub struct AnnotationApplicationContext {
    id: String,
    started_at: DateTime<Utc>,
    catalog: Arc<TypeCatalog>,
    config: Arc<dyn PropertySource>,
    registry: ComponentRegistry,
    pipeline: PostProcessorPipeline,
    type_names: Vec<String>,
    /// 查找持有读锁，关闭持有写锁
    state: RwLock<ContextState>,
}

impl AnnotationApplicationContext {
    /// 创建上下文构建器
    pub fn builder() -> ContextBuilder {
        ContextBuilder::new()
    }

    fn start(
        catalog: Arc<TypeCatalog>,
        config: Arc<dyn PropertySource>,
        type_names: Vec<String>,
    ) -> InfrastructureResult<Self> {
        let id = Uuid::new_v4().to_string();
        let started_at = Utc::now();
        info!(
            "启动容器 {}: {} 个候选类型, 属性源 {}",
            id,
            type_names.len(),
            config.name()
        );

        let descriptors = DescriptorBuilder::new(&catalog).build(&type_names)?;
        let registry = ComponentRegistry::new(catalog.clone(), descriptors)?;
        let pipeline = PostProcessorPipeline::new();
        bootstrap(&registry, config.as_ref(), &pipeline)?;

        info!(
            "容器 {} 启动完成: {} 个组件, {} 个后处理器, 耗时 {} 毫秒",
            id,
            registry.len(),
            pipeline.len(),
            (Utc::now() - started_at).num_milliseconds()
        );
        Ok(Self {
            id,
            started_at,
            catalog,
            config,
            registry,
            pipeline,
            type_names,
            state: RwLock::new(ContextState::default()),
        })
    }

    /// 启动时间
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// 容器使用的属性源
    pub fn config(&self) -> &Arc<dyn PropertySource> {
        &self.config
    }

    /// 容器使用的类型目录
    pub fn catalog(&self) -> &Arc<TypeCatalog> {
        &self.catalog
    }

    /// 是否存在该名称的组件
    pub fn contains(&self, name: &str) -> bool {
        self.registry.contains(name)
    }

    /// 所有组件名称，按注册表顺序
    pub fn component_names(&self) -> Vec<String> {
        self.registry
            .ordered()
            .iter()
            .map(|descriptor| descriptor.name.clone())
            .collect()
    }

    /// 按名称查找描述符
    pub fn descriptor(&self, name: &str) -> DependencyResult<Arc<ComponentDescriptor>> {
        let _state = self.active()?;
        self.registry
            .get(name)
            .cloned()
            .ok_or_else(|| DependencyError::NotFound {
                name: name.to_string(),
            })
    }

    /// 代理包装前的原始实例
    pub fn lookup_original(&self, name: &str) -> DependencyResult<Instance> {
        let descriptor = self.descriptor(name)?;
        let _state = self.active()?;
        self.pipeline.unwrap(&descriptor)
    }

    fn active(&self) -> DependencyResult<RwLockReadGuard<'_, ContextState>> {
        let state = self.state.read();
        if state.closed {
            return Err(DependencyError::ContextClosed);
        }
        Ok(state)
    }
}

/// 分阶段引导：配置类、后处理器、其余组件，然后注入属性并调用就绪钩子
fn bootstrap(
    registry: &ComponentRegistry,
    config: &dyn PropertySource,
    pipeline: &PostProcessorPipeline,
) -> DependencyResult<()> {
    let catalog = registry.catalog();
    let engine = ConstructionEngine::new(registry, config, pipeline);

    for descriptor in registry.ordered().iter().filter(|d| d.is_configuration) {
        engine.construct(descriptor)?;
    }

    for descriptor in registry.ordered().iter().filter(|d| d.is_post_processor) {
        engine.construct(descriptor)?;
        let instance = match descriptor.original_instance() {
            Some(original) => original,
            None => descriptor.required_instance()?,
        };
        let processor =
            catalog
                .as_post_processor(&instance)
                .ok_or_else(|| DependencyError::TypeMismatch {
                    name: descriptor.name.clone(),
                    expected: "PostProcessor".to_string(),
                    actual: instance.type_key().to_string(),
                })?;
        pipeline.register(descriptor.name.clone(), descriptor.order, processor);
    }

    for descriptor in registry.ordered() {
        engine.construct(descriptor)?;
    }
    debug!("全部组件创建完成");

    let injector = PropertyInjector::new(&engine, pipeline, catalog);
    for descriptor in registry.ordered() {
        injector.inject(descriptor)?;
    }
    debug!("属性注入完成");

    LifecycleDriver::new(catalog, pipeline).ready(registry)
}

impl ApplicationContext for AnnotationApplicationContext {
    fn id(&self) -> &str {
        &self.id
    }

    fn lookup(&self, name: &str) -> DependencyResult<Instance> {
        let _state = self.active()?;
        self.registry
            .get(name)
            .ok_or_else(|| DependencyError::NotFound {
                name: name.to_string(),
            })?
            .required_instance()
    }

    fn lookup_as(&self, name: &str, required: &TypeKey) -> DependencyResult<Instance> {
        let _state = self.active()?;
        self.registry
            .find_named(name, required)?
            .ok_or_else(|| DependencyError::NotFound {
                name: name.to_string(),
            })?
            .required_instance()
    }

    fn lookup_unique(&self, ty: &TypeKey) -> DependencyResult<Instance> {
        let _state = self.active()?;
        self.registry
            .find_unique(ty)?
            .ok_or_else(|| DependencyError::NoComponentOfType {
                type_name: ty.to_string(),
            })?
            .required_instance()
    }

    fn lookup_all(&self, ty: &TypeKey) -> DependencyResult<Vec<Instance>> {
        let _state = self.active()?;
        self.registry
            .find_by_type(ty)
            .iter()
            .map(|descriptor| descriptor.required_instance())
            .collect()
    }

    fn descriptors_of(&self, ty: &TypeKey) -> DependencyResult<Vec<Arc<ComponentDescriptor>>> {
        let _state = self.active()?;
        Ok(self.registry.find_by_type(ty))
    }

    fn view(&self, instance: &Instance, target: &TypeKey) -> DependencyResult<Instance> {
        self.catalog
            .view(instance, target)
            .ok_or_else(|| DependencyError::TypeMismatch {
                name: instance.type_key().to_string(),
                expected: target.to_string(),
                actual: instance.type_key().to_string(),
            })
    }

    fn invoke(&self, instance: &Instance, operation: &str, args: Arguments) -> DependencyResult<Value> {
        let _state = self.active()?;
        let result = match self.registry.proxy_chain_of(instance) {
            Some(chain) => chain.invoke(operation, args),
            None => dispatch(&self.catalog, instance, operation, args),
        };
        result.map_err(|e| {
            DependencyError::creation_failed(
                instance.type_key().to_string(),
                format!("调用操作 {}", operation),
                e,
            )
        })
    }

    fn managed_type_names(&self) -> Vec<String> {
        self.type_names.clone()
    }

    fn shutdown(&self) -> InfrastructureResult<()> {
        let mut state = self.state.write();
        if state.closed {
            debug!("容器 {} 已经关闭", self.id);
            return Ok(());
        }
        state.closed = true;

        info!("关闭容器 {}", self.id);
        let failures = LifecycleDriver::new(&self.catalog, &self.pipeline).shutdown(&self.registry);
        info!(
            "容器 {} 已关闭, 运行 {} 秒",
            self.id,
            (Utc::now() - self.started_at).num_seconds()
        );

        if failures.is_empty() {
            return Ok(());
        }
        Err(InfrastructureError::ShutdownFailed {
            message: failures
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; "),
        })
    }

    fn is_active(&self) -> bool {
        !self.state.read().closed
    }
}

impl Drop for AnnotationApplicationContext {
    fn drop(&mut self) {
        if let Err(error) = self.shutdown() {
            warn!("容器 {} 关闭时出错: {}", self.id, error);
        }
    }
}

impl std::fmt::Debug for AnnotationApplicationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnnotationApplicationContext")
            .field("id", &self.id)
            .field("started_at", &self.started_at)
            .field("registry", &self.registry)
            .field("pipeline", &self.pipeline)
            .field("active", &self.is_active())
            .finish()
    }
}

/// 上下文构建器
#[derive(Default)]
pub struct ContextBuilder {
    catalog: TypeCatalog,
    config: Option<Arc<dyn PropertySource>>,
    roots: Vec<String>,
    imports: Vec<TypeKey>,
    scanner: Option<Arc<dyn TypeScanner>>,
}

impl ContextBuilder {
    /// 创建空构建器
    pub fn new() -> Self {
        Self::default()
    }

    /// 替换类型目录
    pub fn catalog(mut self, catalog: TypeCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// 登记类型
    pub fn register(mut self, definition: TypeDefinition) -> ComponentResult<Self> {
        self.catalog.register(definition)?;
        Ok(self)
    }

    /// 属性源
    pub fn config(mut self, config: Arc<dyn PropertySource>) -> Self {
        self.config = Some(config);
        self
    }

    /// 以具体属性源作为配置
    pub fn properties(self, source: impl PropertySource + 'static) -> Self {
        self.config(Arc::new(source))
    }

    /// 扫描根，使用 `::` 或 `.` 分隔路径
    pub fn scan(mut self, root: impl Into<String>) -> Self {
        self.roots.push(root.into());
        self
    }

    /// 引入扫描根之外的类型
    pub fn import(mut self, key: impl Into<TypeKey>) -> Self {
        self.imports.push(key.into());
        self
    }

    /// 按 Rust 类型引入
    pub fn import_type<T: ?Sized + 'static>(self) -> Self {
        self.import(TypeKey::of::<T>())
    }

    /// 自定义扫描器，默认在类型目录中按前缀筛选
    pub fn scanner(mut self, scanner: Arc<dyn TypeScanner>) -> Self {
        self.scanner = Some(scanner);
        self
    }

    /// 扫描并启动容器
    ///
    /// 没有指定扫描根和引入类型时，类型目录中的全部类型都是候选类型。
    pub fn build(self) -> InfrastructureResult<AnnotationApplicationContext> {
        let catalog = Arc::new(self.catalog);
        let scanner: Arc<dyn TypeScanner> = match self.scanner {
            Some(scanner) => scanner,
            None => Arc::new(CatalogScanner::new(catalog.clone())),
        };
        let roots = if self.roots.is_empty() && self.imports.is_empty() {
            vec![String::new()]
        } else {
            self.roots
        };

        let mut scanned: BTreeSet<String> = scanner.scan(&roots)?.into_iter().collect();
        debug!("扫描器 {} 找到 {} 个类型", scanner.name(), scanned.len());
        scanned.extend(self.imports.iter().map(ToString::to_string));
        let type_names = resolve_imports(&catalog, scanned)?;

        let config: Arc<dyn PropertySource> = match self.config {
            Some(config) => config,
            None => Arc::new(ConfigProperties::new()),
        };
        AnnotationApplicationContext::start(catalog, config, type_names)
    }
}

/// 沿引入标记展开候选类型
fn resolve_imports(catalog: &TypeCatalog, scanned: BTreeSet<String>) -> ComponentResult<Vec<String>> {
    let mut names = BTreeSet::new();
    let mut pending: Vec<String> = scanned.into_iter().collect();
    while let Some(name) = pending.pop() {
        if names.contains(&name) {
            continue;
        }
        let definition = catalog
            .get_by_name(&name)
            .ok_or_else(|| ComponentError::TypeNotFound {
                type_name: name.clone(),
            })?;
        for import in definition.imports() {
            debug!("类型 {} 引入 {}", name, import);
            pending.push(import.to_string());
        }
        names.insert(name);
    }
    Ok(names.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use di_abstractions::{ConstructorDef, TypedApplicationContext};

    mod garage {
        #[derive(Default)]
        pub struct Engine;
    }

    mod parts {
        #[derive(Default)]
        pub struct Wheel;
        #[derive(Default)]
        pub struct Spare;
    }

    fn root(module: &str) -> String {
        format!("{}::{}", module_path!(), module)
    }

    fn builder() -> ContextBuilder {
        vec![
            TypeDefinition::of::<garage::Engine>()
                .component()
                .import(vec![TypeKey::of::<parts::Wheel>()])
                .constructor(ConstructorDef::default_of::<garage::Engine>()),
            TypeDefinition::of::<parts::Wheel>()
                .component()
                .constructor(ConstructorDef::default_of::<parts::Wheel>()),
            TypeDefinition::of::<parts::Spare>()
                .component()
                .constructor(ConstructorDef::default_of::<parts::Spare>()),
        ]
        .into_iter()
        .try_fold(ContextBuilder::new(), ContextBuilder::register)
        .unwrap()
    }

    #[test]
    fn test_scan_roots_and_imports() {
        let context = builder().scan(root("garage")).build().unwrap();
        assert_eq!(
            context.managed_type_names(),
            vec![
                TypeKey::of::<garage::Engine>().to_string(),
                TypeKey::of::<parts::Wheel>().to_string(),
            ]
        );
        assert!(context.contains("wheel"));
        assert!(!context.contains("spare"));
    }

    #[test]
    fn test_without_roots_everything_is_scanned() {
        let context = builder().build().unwrap();
        assert_eq!(context.component_names().len(), 3);
        assert!(context.is_active());
        assert!(Uuid::parse_str(context.id()).is_ok());
    }

    #[test]
    fn test_lookups_fail_after_shutdown() {
        let context = builder().build().unwrap();
        assert!(context.lookup("engine").is_ok());
        context.shutdown().unwrap();
        context.shutdown().unwrap();
        assert!(!context.is_active());
        assert!(matches!(context.lookup("engine"), Err(DependencyError::ContextClosed)));
        assert!(matches!(
            context.get_all::<parts::Wheel>(),
            Err(DependencyError::ContextClosed)
        ));
    }

    #[test]
    fn test_unknown_import_is_rejected() {
        let result = builder().import("parts::Missing").build();
        assert!(matches!(
            result,
            Err(InfrastructureError::ComponentError {
                source: ComponentError::TypeNotFound { .. }
            })
        ));
    }
}
