//! 组件描述符构建
//!
//! 对扫描得到的每个候选类型检查声明标记，生成组件描述符。
//! 所有定义错误都在这里发现，此时还没有任何实例存在。

use di_abstractions::{
    ComponentDescriptor, ConstructionStrategy, ConstructorDef, FactoryMethodDef, LifecycleHook,
    Marker, OperationDef, OperationMarker, ReturnType, TypeCatalog, TypeDefinition, TypeKind,
    Visibility,
};
use infrastructure_common::{ComponentError, ComponentResult, DEFAULT_ORDER};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// 解析得到的组件标记
#[derive(Debug, Clone, PartialEq, Eq)]
struct ComponentMarker {
    name: Option<String>,
    configuration: bool,
}

/// 组件描述符构建器
pub struct DescriptorBuilder<'a> {
    catalog: &'a TypeCatalog,
}

impl<'a> DescriptorBuilder<'a> {
    /// 在给定类型目录上创建构建器
    pub fn new(catalog: &'a TypeCatalog) -> Self {
        Self { catalog }
    }

    /// 为候选类型生成描述符
    ///
    /// 未带组件标记的类型被跳过；配置类的每个工厂方法额外产生一个描述符。
    pub fn build(&self, type_names: &[String]) -> ComponentResult<Vec<ComponentDescriptor>> {
        let mut descriptors = Vec::new();
        let mut names = HashSet::new();

        for type_name in type_names {
            let definition =
                self.catalog
                    .get_by_name(type_name)
                    .ok_or_else(|| ComponentError::TypeNotFound {
                        type_name: type_name.clone(),
                    })?;
            let Some(marker) = self.component_marker(definition)? else {
                debug!("跳过未标记组件的类型: {}", type_name);
                continue;
            };
            if definition.kind == TypeKind::Interface {
                debug!("跳过接口类型: {}", type_name);
                continue;
            }

            for descriptor in self.describe(definition, &marker)? {
                if !names.insert(descriptor.name.clone()) {
                    return Err(ComponentError::DuplicateName {
                        name: descriptor.name.clone(),
                    });
                }
                debug!("定义组件: {}", descriptor);
                descriptors.push(descriptor);
            }
        }

        self.attach_proxies(descriptors)
    }

    /// 查找组件标记，复合标记递归解析
    fn component_marker(&self, definition: &TypeDefinition) -> ComponentResult<Option<ComponentMarker>> {
        let mut chain = vec![definition.key.to_string()];
        self.find_marker(definition.key.as_str(), &definition.markers, &mut chain)
    }

    fn find_marker(
        &self,
        owner: &str,
        markers: &[Marker],
        chain: &mut Vec<String>,
    ) -> ComponentResult<Option<ComponentMarker>> {
        let duplicate = || ComponentError::DuplicateMarker {
            type_name: owner.to_string(),
            marker: "Component".to_string(),
        };

        let mut direct = markers.iter().filter_map(|marker| match marker {
            Marker::Component(name) => Some(ComponentMarker {
                name: name.clone(),
                configuration: false,
            }),
            Marker::Configuration(name) => Some(ComponentMarker {
                name: name.clone(),
                configuration: true,
            }),
            _ => None,
        });
        if let Some(found) = direct.next() {
            if direct.next().is_some() {
                return Err(duplicate());
            }
            return Ok(Some(found));
        }

        let mut found = None;
        for marker in markers {
            let Marker::Stereotype { key, name } = marker else {
                continue;
            };
            if chain.contains(key) {
                return Err(ComponentError::MarkerCycle {
                    chain: format!("{} -> {}", chain.join(" -> "), key),
                });
            }
            let definition =
                self.catalog
                    .marker(key)
                    .ok_or_else(|| ComponentError::InvalidDefinition {
                        type_name: owner.to_string(),
                        reason: format!("复合标记 '{}' 未登记", key),
                    })?;

            chain.push(key.clone());
            let nested = self.find_marker(key, &definition.markers, chain)?;
            chain.pop();

            if let Some(mut nested) = nested {
                if found.is_some() {
                    return Err(duplicate());
                }
                if name.is_some() {
                    nested.name = name.clone();
                }
                found = Some(nested);
            }
        }
        Ok(found)
    }

    fn describe(
        &self,
        definition: &TypeDefinition,
        marker: &ComponentMarker,
    ) -> ComponentResult<Vec<ComponentDescriptor>> {
        let name = marker
            .name
            .clone()
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| definition.key.default_component_name());

        check_constructible(definition)?;
        let constructor = self.select_constructor(&name, definition)?;

        let is_post_processor = definition.is_post_processor();
        if marker.configuration && is_post_processor {
            return Err(ComponentError::InvalidDefinition {
                type_name: definition.key.to_string(),
                reason: "配置类不能同时实现后处理器接口".to_string(),
            });
        }

        let ready_hook = lifecycle_operation(definition, OperationMarker::PostConstruct)?;
        let shutdown_hook = lifecycle_operation(definition, OperationMarker::PreDestroy)?;

        let descriptor = ComponentDescriptor::new(
            name.clone(),
            definition.key.clone(),
            definition.declared_order(),
            definition.is_primary(),
            ConstructionStrategy::Constructor(constructor),
        )
        .with_hooks(
            ready_hook.map(LifecycleHook::Method),
            shutdown_hook.map(LifecycleHook::Method),
        )
        .with_flags(marker.configuration, is_post_processor)
        .with_proxies(definition.around_names());

        let mut descriptors = vec![descriptor];
        if marker.configuration {
            for method in definition.factory_methods.iter().filter(|m| m.bean.is_some()) {
                descriptors.push(self.describe_factory(&name, definition, method)?);
            }
        }
        Ok(descriptors)
    }

    /// 选择构造函数
    ///
    /// 带依赖绑定标记的构造函数优先，否则要求恰好一个公开构造函数。
    fn select_constructor(
        &self,
        component: &str,
        definition: &TypeDefinition,
    ) -> ComponentResult<ConstructorDef> {
        let type_name = definition.key.to_string();
        let autowired: Vec<&ConstructorDef> = definition
            .constructors
            .iter()
            .filter(|constructor| constructor.autowired)
            .collect();

        let constructor = match autowired.as_slice() {
            [single] => *single,
            [] => {
                let public: Vec<&ConstructorDef> = definition
                    .constructors
                    .iter()
                    .filter(|constructor| constructor.visibility == Visibility::Public)
                    .collect();
                match public.as_slice() {
                    [single] => *single,
                    [] => {
                        return Err(ComponentError::NotConstructible {
                            type_name,
                            reason: "没有公开的构造函数".to_string(),
                        })
                    }
                    _ => {
                        return Err(ComponentError::AmbiguousConstructor {
                            type_name,
                            reason: format!("存在 {} 个公开构造函数", public.len()),
                        })
                    }
                }
            }
            _ => {
                return Err(ComponentError::AmbiguousConstructor {
                    type_name,
                    reason: format!("{} 个构造函数带有依赖绑定标记", autowired.len()),
                })
            }
        };

        if constructor.visibility != Visibility::Public {
            return Err(ComponentError::NotConstructible {
                type_name,
                reason: "构造函数不是公开的".to_string(),
            });
        }
        for param in &constructor.params {
            param.binding(component, constructor.autowired)?;
        }
        Ok(constructor.clone())
    }

    fn describe_factory(
        &self,
        owner_name: &str,
        owner: &TypeDefinition,
        method: &FactoryMethodDef,
    ) -> ComponentResult<ComponentDescriptor> {
        let invalid = |reason: String| ComponentError::InvalidFactoryMethod {
            type_name: owner.key.to_string(),
            method: method.name.clone(),
            reason,
        };

        if method.is_abstract {
            return Err(invalid("工厂方法不能是抽象方法".to_string()));
        }
        if method.is_final {
            return Err(invalid("工厂方法不能是 final 方法".to_string()));
        }
        if method.visibility == Visibility::Private {
            return Err(invalid("工厂方法不能是私有方法".to_string()));
        }
        let produced_type = match &method.returns {
            ReturnType::Type(key) => key.clone(),
            ReturnType::Unit => return Err(invalid("工厂方法必须有返回值".to_string())),
            ReturnType::Scalar(ty) => {
                return Err(invalid(format!("工厂方法不能返回标量类型 {}", ty)))
            }
        };

        let name = method.component_name();
        for param in &method.params {
            param.binding(&name, false)?;
        }

        let produced = self.catalog.get(&produced_type);
        let is_post_processor = produced.is_some_and(|def| def.is_post_processor());
        let proxies = produced.map(|def| def.around_names()).unwrap_or_default();
        let bean = method.bean.clone().unwrap_or_default();

        Ok(ComponentDescriptor::new(
            name,
            produced_type,
            method.effective_order(),
            method.primary,
            ConstructionStrategy::Factory {
                factory_name: owner_name.to_string(),
                method: method.clone(),
            },
        )
        .with_hooks(
            bean.init.map(LifecycleHook::Named),
            bean.destroy.map(LifecycleHook::Named),
        )
        .with_flags(false, is_post_processor)
        .with_proxies(proxies))
    }

    /// 校验拦截器名称，并按拦截器组件的排序权重排列
    fn attach_proxies(
        &self,
        mut descriptors: Vec<ComponentDescriptor>,
    ) -> ComponentResult<Vec<ComponentDescriptor>> {
        let orders: HashMap<String, i32> = descriptors
            .iter()
            .map(|descriptor| (descriptor.name.clone(), descriptor.order))
            .collect();

        for descriptor in &mut descriptors {
            if let Some(unknown) = descriptor
                .proxy_names
                .iter()
                .find(|name| !orders.contains_key(*name))
            {
                return Err(ComponentError::UnknownInterceptor {
                    component: descriptor.name.clone(),
                    interceptor: unknown.clone(),
                });
            }
            descriptor.proxy_names.sort_by_cached_key(|name| {
                (orders.get(name).copied().unwrap_or(DEFAULT_ORDER), name.clone())
            });
            descriptor.proxy_names.dedup();
        }
        Ok(descriptors)
    }
}

fn check_constructible(definition: &TypeDefinition) -> ComponentResult<()> {
    let reason = match (definition.kind, definition.visibility) {
        (TypeKind::Abstract, _) => "抽象类型不能实例化",
        (TypeKind::Interface, _) => return Ok(()),
        (TypeKind::Concrete, Visibility::Private) => "类型不是公开的",
        (TypeKind::Concrete, Visibility::Public) => return Ok(()),
    };
    Err(ComponentError::NotConstructible {
        type_name: definition.key.to_string(),
        reason: reason.to_string(),
    })
}

/// 查找带指定标记的生命周期操作，最多一个且不带参数
fn lifecycle_operation(
    definition: &TypeDefinition,
    marker: OperationMarker,
) -> ComponentResult<Option<OperationDef>> {
    let operations: Vec<&OperationDef> = definition
        .operations
        .iter()
        .filter(|operation| operation.has_marker(marker))
        .collect();

    match operations.as_slice() {
        [] => Ok(None),
        [operation] if operation.param_count == 0 => Ok(Some((*operation).clone())),
        [operation] => Err(ComponentError::InvalidLifecycleHook {
            type_name: definition.key.to_string(),
            hook: operation.name.clone(),
            reason: format!("{} 方法不能带参数", marker),
        }),
        _ => Err(ComponentError::InvalidLifecycleHook {
            type_name: definition.key.to_string(),
            hook: operations
                .iter()
                .map(|operation| operation.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            reason: format!("{} 方法只能有一个", marker),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use di_abstractions::{MarkerDefinition, ParamDef, PostProcessor};
    use infrastructure_common::{Arguments, Instance, ScalarType, TypeKey, Value};
    use std::sync::Arc;

    struct Repo;
    struct Service;
    struct AppConfig;
    struct Tracer;

    impl PostProcessor for Tracer {}

    fn repo_def() -> TypeDefinition {
        TypeDefinition::of::<Repo>()
            .component()
            .constructor(ConstructorDef::new(vec![], |_| Ok(Repo)))
    }

    fn build(catalog: &TypeCatalog) -> ComponentResult<Vec<ComponentDescriptor>> {
        DescriptorBuilder::new(catalog).build(&catalog.type_names())
    }

    fn catalog_of(definitions: Vec<TypeDefinition>) -> TypeCatalog {
        let mut catalog = TypeCatalog::new();
        for definition in definitions {
            catalog.register(definition).unwrap();
        }
        catalog
    }

    #[test]
    fn test_default_name_and_unmarked_types() {
        let catalog = catalog_of(vec![
            repo_def(),
            TypeDefinition::of::<Service>().constructor(ConstructorDef::new(vec![], |_| Ok(Service))),
        ]);
        let descriptors = build(&catalog).unwrap();
        assert_eq!(descriptors.len(), 1);
        assert_eq!(descriptors[0].name, "repo");
        assert_eq!(descriptors[0].order, DEFAULT_ORDER);
    }

    #[test]
    fn test_marked_interface_is_skipped() {
        let catalog = catalog_of(vec![
            repo_def(),
            TypeDefinition::of::<Service>()
                .kind(TypeKind::Interface)
                .component(),
        ]);
        let descriptors = build(&catalog).unwrap();
        assert_eq!(descriptors.len(), 1);
        assert_eq!(descriptors[0].name, "repo");
    }

    #[test]
    fn test_stereotype_is_resolved_transitively() {
        let mut catalog = catalog_of(vec![TypeDefinition::of::<Service>()
            .marker(Marker::stereotype_named("RestController", "homeController"))
            .constructor(ConstructorDef::new(vec![], |_| Ok(Service)))]);
        catalog
            .register_marker(MarkerDefinition::new("Controller").marked(Marker::component()))
            .unwrap();
        catalog
            .register_marker(
                MarkerDefinition::new("RestController").marked(Marker::stereotype("Controller")),
            )
            .unwrap();

        let descriptors = build(&catalog).unwrap();
        assert_eq!(descriptors[0].name, "homeController");
        assert!(!descriptors[0].is_configuration);
    }

    #[test]
    fn test_marker_cycle_and_duplicates_are_rejected() {
        let mut catalog = catalog_of(vec![TypeDefinition::of::<Service>()
            .marker(Marker::stereotype("A"))
            .constructor(ConstructorDef::new(vec![], |_| Ok(Service)))]);
        catalog
            .register_marker(MarkerDefinition::new("A").marked(Marker::stereotype("B")))
            .unwrap();
        catalog
            .register_marker(MarkerDefinition::new("B").marked(Marker::stereotype("A")))
            .unwrap();
        assert!(matches!(build(&catalog), Err(ComponentError::MarkerCycle { .. })));

        let catalog = catalog_of(vec![repo_def().configuration()]);
        assert!(matches!(build(&catalog), Err(ComponentError::DuplicateMarker { .. })));
    }

    #[test]
    fn test_constructor_selection() {
        let two_public = TypeDefinition::of::<Repo>()
            .component()
            .constructor(ConstructorDef::new(vec![], |_| Ok(Repo)))
            .constructor(ConstructorDef::new(
                vec![ParamDef::value("size", ScalarType::Usize, "repo.size:1")],
                |_| Ok(Repo),
            ));
        assert!(matches!(
            build(&catalog_of(vec![two_public])),
            Err(ComponentError::AmbiguousConstructor { .. })
        ));

        let one_private = TypeDefinition::of::<Repo>()
            .component()
            .constructor(ConstructorDef::new(vec![], |_| Ok(Repo)).private())
            .constructor(ConstructorDef::new(vec![], |_| Ok(Repo)));
        assert!(build(&catalog_of(vec![one_private])).is_ok());

        let unbound = TypeDefinition::of::<Service>()
            .component()
            .constructor(ConstructorDef::new(
                vec![ParamDef::dependency::<Repo>("repo")],
                |_| Ok(Service),
            ));
        assert!(matches!(
            build(&catalog_of(vec![repo_def(), unbound])),
            Err(ComponentError::InvalidBinding { .. })
        ));

        let abstract_type = repo_def().kind(TypeKind::Abstract);
        assert!(matches!(
            build(&catalog_of(vec![abstract_type])),
            Err(ComponentError::NotConstructible { .. })
        ));
    }

    #[test]
    fn test_configuration_produces_factory_descriptors() {
        let config = TypeDefinition::of::<AppConfig>()
            .configuration()
            .constructor(ConstructorDef::new(vec![], |_| Ok(AppConfig)))
            .factory_method(
                FactoryMethodDef::new("createRepo", vec![], |_: &AppConfig, _| Ok(Repo))
                    .bean_name("repository")
                    .order(3)
                    .init("open"),
            )
            .factory_method(
                FactoryMethodDef::new("helper", vec![], |_: &AppConfig, _| Ok(Service)).unmarked(),
            );
        let descriptors = build(&catalog_of(vec![config])).unwrap();
        assert_eq!(descriptors.len(), 2);
        assert!(descriptors[0].is_configuration);

        let factory = &descriptors[1];
        assert_eq!(factory.name, "repository");
        assert_eq!(factory.order, 3);
        assert_eq!(factory.factory_name(), Some("appConfig"));
        assert_eq!(factory.produced_type, TypeKey::of::<Repo>());
        assert!(matches!(&factory.ready_hook, Some(LifecycleHook::Named(name)) if name == "open"));
    }

    #[test]
    fn test_invalid_factory_methods() {
        let with_method = |method: FactoryMethodDef| {
            catalog_of(vec![TypeDefinition::of::<AppConfig>()
                .configuration()
                .constructor(ConstructorDef::new(vec![], |_| Ok(AppConfig)))
                .factory_method(method)])
        };
        let repo = || FactoryMethodDef::new("createRepo", vec![], |_: &AppConfig, _| Ok(Repo));

        for method in [repo().private(), repo().final_method(), repo().abstract_method()] {
            assert!(matches!(
                build(&with_method(method)),
                Err(ComponentError::InvalidFactoryMethod { .. })
            ));
        }

        let unit = FactoryMethodDef::raw(
            "nothing",
            vec![],
            ReturnType::Unit,
            Arc::new(|_: &Instance, _: Arguments| -> anyhow::Result<Instance> { Ok(Instance::new(())) }),
        );
        assert!(matches!(
            build(&with_method(unit)),
            Err(ComponentError::InvalidFactoryMethod { .. })
        ));
    }

    #[test]
    fn test_duplicate_names_are_rejected() {
        let service = TypeDefinition::of::<Service>()
            .component_named("repo")
            .constructor(ConstructorDef::new(vec![], |_| Ok(Service)));
        assert!(matches!(
            build(&catalog_of(vec![repo_def(), service])),
            Err(ComponentError::DuplicateName { name }) if name == "repo"
        ));
    }

    #[test]
    fn test_configuration_cannot_be_post_processor() {
        let tracer = TypeDefinition::of::<Tracer>()
            .configuration()
            .post_processor::<Tracer>()
            .constructor(ConstructorDef::new(vec![], |_| Ok(Tracer)));
        assert!(matches!(
            build(&catalog_of(vec![tracer])),
            Err(ComponentError::InvalidDefinition { .. })
        ));
    }

    #[test]
    fn test_lifecycle_operations_are_validated() {
        let two_hooks = repo_def()
            .operation(OperationDef::hook("a", |_: &Repo| Ok(())).post_construct())
            .operation(OperationDef::hook("b", |_: &Repo| Ok(())).post_construct());
        assert!(matches!(
            build(&catalog_of(vec![two_hooks])),
            Err(ComponentError::InvalidLifecycleHook { .. })
        ));

        let with_param = repo_def().operation(
            OperationDef::new("close", 1, |_: &Repo, _| Ok(Value::Unit))
                .pre_destroy(),
        );
        assert!(matches!(
            build(&catalog_of(vec![with_param])),
            Err(ComponentError::InvalidLifecycleHook { .. })
        ));
    }

    #[test]
    fn test_proxies_are_resolved_and_ordered() {
        let catalog = catalog_of(vec![
            repo_def().around(["slow", "fast"]),
            TypeDefinition::of::<Service>()
                .component_named("slow")
                .order(20)
                .constructor(ConstructorDef::new(vec![], |_| Ok(Service))),
            TypeDefinition::of::<Tracer>()
                .component_named("fast")
                .order(10)
                .constructor(ConstructorDef::new(vec![], |_| Ok(Tracer))),
        ]);
        let descriptors = build(&catalog).unwrap();
        let repo = descriptors.iter().find(|d| d.name == "repo").unwrap();
        assert_eq!(repo.proxy_names, vec!["fast".to_string(), "slow".to_string()]);

        let catalog = catalog_of(vec![repo_def().around(["missing"])]);
        assert!(matches!(
            build(&catalog),
            Err(ComponentError::UnknownInterceptor { .. })
        ));
    }
}
