//! 组件容器的端到端集成测试
//!
//! 通过 `dyn ApplicationContext` 使用容器，覆盖复合标记、工厂产物、拦截器链、
//! 引入类型和 YAML 属性源。

use config_impl::ConfigProperties;
use di_abstractions::{
    ApplicationContext, ConstructorDef, FactoryMethodDef, Interceptor, Invocation, Marker,
    MarkerDefinition, OperationDef, ParamDef, TypeCatalog, TypeDefinition,
    TypedApplicationContext,
};
use di_impl::ContextBuilder;
use infrastructure_common::{
    Arguments, ComponentError, DependencyError, InfrastructureError, ScalarType, TypeKey, Value,
};
use parking_lot::Mutex;
use std::sync::{Arc, Once};

static INIT: Once = Once::new();

fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("debug")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

fn catalog_of(definitions: Vec<TypeDefinition>) -> TypeCatalog {
    let mut catalog = TypeCatalog::new();
    for definition in definitions {
        catalog.register(definition).unwrap();
    }
    catalog
}

fn start(
    catalog: TypeCatalog,
    config: ConfigProperties,
) -> Result<Arc<dyn ApplicationContext>, InfrastructureError> {
    init_tracing();
    let context = ContextBuilder::new()
        .catalog(catalog)
        .properties(config)
        .build()?;
    Ok(Arc::new(context))
}

// 复合标记

mod web {
    #[derive(Default)]
    pub struct HomeController;

    #[derive(Default)]
    pub struct AdminController;
}

#[test]
fn test_nested_stereotypes_mark_components() {
    let mut catalog = catalog_of(vec![
        TypeDefinition::of::<web::HomeController>()
            .marker(Marker::stereotype("RestController"))
            .constructor(ConstructorDef::default_of::<web::HomeController>()),
        TypeDefinition::of::<web::AdminController>()
            .marker(Marker::stereotype_named("Controller", "admin"))
            .constructor(ConstructorDef::default_of::<web::AdminController>()),
    ]);
    catalog
        .register_marker(MarkerDefinition::new("Controller").marked(Marker::component()))
        .unwrap()
        .register_marker(
            MarkerDefinition::new("RestController").marked(Marker::stereotype("Controller")),
        )
        .unwrap();

    let context = start(catalog, ConfigProperties::new()).unwrap();
    assert!(context.get::<web::HomeController>("homeController").is_ok());
    assert!(context.get::<web::AdminController>("admin").is_ok());
    assert!(matches!(
        context.lookup("adminController"),
        Err(DependencyError::NotFound { .. })
    ));
}

#[test]
fn test_marker_cycle_is_a_definition_error() {
    let mut catalog = catalog_of(vec![TypeDefinition::of::<web::HomeController>()
        .marker(Marker::stereotype("Alpha"))
        .constructor(ConstructorDef::default_of::<web::HomeController>())]);
    catalog
        .register_marker(MarkerDefinition::new("Alpha").marked(Marker::stereotype("Beta")))
        .unwrap()
        .register_marker(MarkerDefinition::new("Beta").marked(Marker::stereotype("Alpha")))
        .unwrap();

    assert!(matches!(
        start(catalog, ConfigProperties::new()),
        Err(InfrastructureError::ComponentError {
            source: ComponentError::MarkerCycle { .. }
        })
    ));
}

// 工厂产物

mod data {
    use std::sync::Arc;

    pub struct DataConfig;

    pub struct Database {
        pub url: String,
    }

    pub struct ReportService {
        pub primary: Arc<Database>,
        pub replica: Arc<Database>,
    }
}

fn database_factory(name: &str, expression: &str) -> FactoryMethodDef {
    FactoryMethodDef::new(
        name,
        vec![ParamDef::value("url", ScalarType::String, expression)],
        |_: &data::DataConfig, args| {
            Ok(data::Database {
                url: args.scalar::<String>(0)?,
            })
        },
    )
}

fn database_catalog() -> TypeCatalog {
    catalog_of(vec![
        TypeDefinition::of::<data::DataConfig>()
            .configuration()
            .constructor(ConstructorDef::new(vec![], |_| Ok(data::DataConfig)))
            .factory_method(database_factory("primaryDatabase", "db.primary.url").primary())
            .factory_method(database_factory(
                "replicaDatabase",
                "${db.replica.url:postgres://fallback}",
            )),
        TypeDefinition::of::<data::ReportService>()
            .component()
            .constructor(ConstructorDef::new(
                vec![
                    ParamDef::autowired::<data::Database>("primary"),
                    ParamDef::autowired::<data::Database>("replica").named("replicaDatabase"),
                ],
                |args| {
                    Ok(data::ReportService {
                        primary: args.component::<data::Database>(0)?,
                        replica: args.component::<data::Database>(1)?,
                    })
                },
            )),
    ])
}

#[test]
fn test_named_and_primary_factory_products_from_yaml() {
    let config = ConfigProperties::from_yaml_str(
        "db:\n  primary:\n    url: postgres://primary\n  replica:\n    url: postgres://replica\n",
    )
    .unwrap();
    let context = start(database_catalog(), config).unwrap();

    let report = context.get_unique::<data::ReportService>().unwrap();
    assert_eq!(report.primary.url, "postgres://primary");
    assert_eq!(report.replica.url, "postgres://replica");

    let databases = context.get_all::<data::Database>().unwrap();
    assert_eq!(databases.len(), 2);
    let names: Vec<String> = context
        .descriptors_of(&TypeKey::of::<data::Database>())
        .unwrap()
        .iter()
        .map(|descriptor| descriptor.name.clone())
        .collect();
    assert_eq!(names, vec!["primaryDatabase", "replicaDatabase"]);
}

#[test]
fn test_value_default_applies_when_key_is_missing() {
    let config = ConfigProperties::from_map([("db.primary.url", "postgres://primary")]);
    let context = start(database_catalog(), config).unwrap();

    let replica = context.get::<data::Database>("replicaDatabase").unwrap();
    assert_eq!(replica.url, "postgres://fallback");
}

#[test]
fn test_missing_required_value_fails_startup() {
    let result = start(database_catalog(), ConfigProperties::new());
    assert!(matches!(
        result,
        Err(InfrastructureError::DependencyError {
            source: DependencyError::Configuration { .. }
        })
    ));
}

// 拦截器链

mod billing {
    use super::*;

    #[derive(Default)]
    pub struct Ledger;

    pub struct Tracer {
        pub label: &'static str,
        pub log: Arc<Mutex<Vec<String>>>,
    }

    impl Interceptor for Tracer {
        fn before(&self, call: &Invocation<'_>) -> anyhow::Result<()> {
            self.log
                .lock()
                .push(format!("{} before {}", self.label, call.operation));
            Ok(())
        }

        fn after(&self, _call: &Invocation<'_>, result: Value) -> anyhow::Result<Value> {
            self.log.lock().push(format!("{} after", self.label));
            Ok(result)
        }

        fn finally(&self, _call: &Invocation<'_>) {
            self.log.lock().push(format!("{} finally", self.label));
        }
    }

    #[derive(Default)]
    pub struct Fallback;

    impl Interceptor for Fallback {
        fn on_error(&self, _call: &Invocation<'_>, error: anyhow::Error) -> anyhow::Result<Value> {
            Ok(Value::from(format!("recovered: {}", error)))
        }
    }

    pub struct Audit(pub Tracer);

    impl Interceptor for Audit {
        fn before(&self, call: &Invocation<'_>) -> anyhow::Result<()> {
            self.0.before(call)
        }

        fn after(&self, call: &Invocation<'_>, result: Value) -> anyhow::Result<Value> {
            self.0.after(call, result)
        }

        fn finally(&self, call: &Invocation<'_>) {
            self.0.finally(call)
        }
    }
}

fn billing_catalog(log: &Arc<Mutex<Vec<String>>>) -> TypeCatalog {
    let timing_log = log.clone();
    let audit_log = log.clone();
    catalog_of(vec![
        TypeDefinition::of::<billing::Ledger>()
            .component()
            .around(["timing", "audit", "fallback"])
            .constructor(ConstructorDef::default_of::<billing::Ledger>())
            .operation(OperationDef::new("post", 1, |_: &billing::Ledger, args| {
                Ok(Value::from(format!("posted {}", args.scalar::<String>(0)?)))
            }))
            .operation(OperationDef::new("reject", 0, |_: &billing::Ledger, _| {
                Err(anyhow::anyhow!("ledger closed"))
            })),
        TypeDefinition::of::<billing::Tracer>()
            .component_named("timing")
            .order(20)
            .interceptor::<billing::Tracer>()
            .constructor(ConstructorDef::new(vec![], move |_| {
                Ok(billing::Tracer {
                    label: "timing",
                    log: timing_log.clone(),
                })
            })),
        TypeDefinition::of::<billing::Audit>()
            .component_named("audit")
            .order(10)
            .interceptor::<billing::Audit>()
            .constructor(ConstructorDef::new(vec![], move |_| {
                Ok(billing::Audit(billing::Tracer {
                    label: "audit",
                    log: audit_log.clone(),
                }))
            })),
        TypeDefinition::of::<billing::Fallback>()
            .component_named("fallback")
            .order(30)
            .interceptor::<billing::Fallback>()
            .constructor(ConstructorDef::default_of::<billing::Fallback>()),
    ])
}

#[test]
fn test_interceptors_wrap_in_order() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let context = start(billing_catalog(&log), ConfigProperties::new()).unwrap();

    let ledger = context.lookup("ledger").unwrap();
    let result = context
        .invoke(&ledger, "post", Arguments::new(vec![Value::from("invoice-7")]))
        .unwrap();
    assert_eq!(result.as_scalar::<String>().as_deref(), Some("posted invoice-7"));
    assert_eq!(
        *log.lock(),
        vec![
            "audit before post",
            "timing before post",
            "timing after",
            "timing finally",
            "audit after",
            "audit finally",
        ]
    );
}

#[test]
fn test_on_error_can_recover_and_finally_always_runs() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let context = start(billing_catalog(&log), ConfigProperties::new()).unwrap();

    let ledger = context.lookup("ledger").unwrap();
    let result = context
        .invoke(&ledger, "reject", Arguments::empty())
        .unwrap();
    assert_eq!(
        result.as_scalar::<String>().as_deref(),
        Some("recovered: ledger closed")
    );
    assert_eq!(
        *log.lock(),
        vec![
            "audit before reject",
            "timing before reject",
            "timing after",
            "timing finally",
            "audit after",
            "audit finally",
        ]
    );
}

// 引入类型

mod app {
    use std::sync::Arc;

    pub struct Scheduler {
        pub clock: Arc<super::extras::Clock>,
    }
}

mod extras {
    #[derive(Default)]
    pub struct Clock;

    #[derive(Default)]
    pub struct Unused;
}

#[test]
fn test_imported_types_join_a_scanned_root() {
    init_tracing();
    let catalog = catalog_of(vec![
        TypeDefinition::of::<app::Scheduler>()
            .component()
            .import(vec![TypeKey::of::<extras::Clock>()])
            .constructor(ConstructorDef::new(
                vec![ParamDef::autowired::<extras::Clock>("clock")],
                |args| {
                    Ok(app::Scheduler {
                        clock: args.component::<extras::Clock>(0)?,
                    })
                },
            )),
        TypeDefinition::of::<extras::Clock>()
            .component()
            .constructor(ConstructorDef::default_of::<extras::Clock>()),
        TypeDefinition::of::<extras::Unused>()
            .component()
            .constructor(ConstructorDef::default_of::<extras::Unused>()),
    ]);

    let context: Arc<dyn ApplicationContext> = Arc::new(
        ContextBuilder::new()
            .catalog(catalog)
            .scan(format!("{}::app", module_path!()))
            .build()
            .unwrap(),
    );

    let scheduler = context.get::<app::Scheduler>("scheduler").unwrap();
    let clock = context.get::<extras::Clock>("clock").unwrap();
    assert!(Arc::ptr_eq(&scheduler.clock, &clock));
    assert!(matches!(
        context.lookup("unused"),
        Err(DependencyError::NotFound { .. })
    ));
    assert_eq!(context.managed_type_names().len(), 2);
}

#[test]
fn test_shutdown_through_the_facade() {
    let context = start(database_catalog(), ConfigProperties::from_map([("db.primary.url", "x")]))
        .unwrap();
    assert!(context.is_active());

    context.shutdown().unwrap();
    assert!(!context.is_active());
    assert!(matches!(
        context.lookup("primaryDatabase"),
        Err(DependencyError::ContextClosed)
    ));
    context.shutdown().unwrap();
}
