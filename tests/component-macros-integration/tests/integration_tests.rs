//! 声明式组件宏的端到端集成测试
//!
//! 类型定义全部由宏生成，再显式登记到类型目录中启动容器。

use component_macros::{beans, component, configuration};
use config_impl::ConfigProperties;
use di_abstractions::{
    ApplicationContext, DeclaredComponent, Interceptor, Invocation, OperationDef, ProxyChain,
    TypeCatalog, TypeDefinition, TypedApplicationContext,
};
use di_impl::{AnnotationApplicationContext, ContextBuilder};
use infrastructure_common::{Arguments, InfrastructureError, TypeKey, Value};
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Once};

static TRACING: Once = Once::new();

fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_env_filter("debug")
            .try_init();
    });
}

// 定价

pub trait Pricing: Send + Sync {
    fn quote(&self, amount: i64) -> anyhow::Result<i64>;
}

#[component]
pub struct RateTable {
    #[value("pricing.surcharge:1")]
    surcharge: i64,
}

#[component(around("doubler"), implements(dyn Pricing), proxied_as = PricingProxy::wrap)]
pub struct FlatPricing {
    #[autowired]
    rates: OnceCell<Arc<RateTable>>,
}

impl Pricing for FlatPricing {
    fn quote(&self, amount: i64) -> anyhow::Result<i64> {
        let rates = self
            .rates
            .get()
            .ok_or_else(|| anyhow::anyhow!("费率表尚未注入"))?;
        Ok(amount + rates.surcharge)
    }
}

pub struct PricingProxy {
    target: Arc<FlatPricing>,
    chain: ProxyChain,
}

impl PricingProxy {
    fn wrap(target: Arc<FlatPricing>, chain: ProxyChain) -> Arc<dyn Pricing> {
        Arc::new(Self { target, chain })
    }
}

impl Pricing for PricingProxy {
    fn quote(&self, amount: i64) -> anyhow::Result<i64> {
        let args = Arguments::new(vec![Value::from(amount)]);
        let value = self.chain.call("quote", args, |call: &Invocation<'_>| {
            Ok(Value::from(self.target.quote(call.args.scalar::<i64>(0)?)?))
        })?;
        value
            .as_scalar::<i64>()
            .ok_or_else(|| anyhow::anyhow!("quote 返回值不是整数"))
    }
}

#[component(interceptor)]
pub struct Doubler {
    calls: Mutex<Vec<String>>,
}

impl Interceptor for Doubler {
    fn before(&self, call: &Invocation<'_>) -> anyhow::Result<()> {
        self.calls
            .lock()
            .push(format!("{}.{}", call.component, call.operation));
        Ok(())
    }

    fn after(&self, _call: &Invocation<'_>, result: Value) -> anyhow::Result<Value> {
        let value = result.as_scalar::<i64>().unwrap_or_default();
        Ok(Value::from(value * 2))
    }
}

// 结算

pub struct Connection {
    url: String,
    closed: AtomicBool,
}

impl Connection {
    fn close(&self) -> anyhow::Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

pub struct AuditLog {
    prefix: String,
}

#[configuration]
pub struct StoreConfig;

#[beans]
impl StoreConfig {
    #[bean(destroy = "close")]
    fn connection(&self, #[value("db.url:memory://store")] url: String) -> anyhow::Result<Connection> {
        if url.is_empty() {
            anyhow::bail!("数据库地址为空");
        }
        Ok(Connection {
            url,
            closed: AtomicBool::new(false),
        })
    }

    #[bean(name = "auditLog", primary)]
    fn audit(&self, #[autowired] connection: Arc<Connection>) -> AuditLog {
        AuditLog {
            prefix: format!("audit@{}", connection.url),
        }
    }
}

#[component(name = "checkout", order = 10)]
#[lifecycle(post_construct = "open", pre_destroy = "close")]
pub struct Checkout {
    #[autowired]
    pricing: Arc<dyn Pricing>,
    #[value("checkout.currency:EUR")]
    currency: String,
    #[value("checkout.max-items")]
    max_items: usize,
    #[autowired(optional)]
    coupons: Option<Arc<CouponBook>>,
    #[autowired]
    audit: OnceCell<Arc<AuditLog>>,
    events: Mutex<Vec<String>>,
}

impl Checkout {
    fn open(&self) -> anyhow::Result<()> {
        let audit = self
            .audit
            .get()
            .ok_or_else(|| anyhow::anyhow!("审计日志尚未注入"))?;
        self.events.lock().push(format!("open {}", audit.prefix));
        Ok(())
    }

    fn close(&self) -> anyhow::Result<()> {
        self.events.lock().push("close".to_string());
        Ok(())
    }
}

/// 不参与登记，只用于验证可选依赖
pub struct CouponBook;

fn connection_def() -> TypeDefinition {
    TypeDefinition::of::<Connection>()
        .operation(OperationDef::hook("close", |this: &Connection| this.close()))
}

fn store_catalog() -> Result<TypeCatalog, InfrastructureError> {
    let mut catalog = TypeCatalog::new();
    catalog
        .register_declared::<RateTable>()?
        .register_declared::<FlatPricing>()?
        .register_declared::<Doubler>()?
        .register_declared::<StoreConfig>()?
        .register_declared::<Checkout>()?
        .register(connection_def())?;
    Ok(catalog)
}

fn start(config: ConfigProperties) -> Result<AnnotationApplicationContext, InfrastructureError> {
    init_tracing();
    ContextBuilder::new()
        .catalog(store_catalog()?)
        .properties(config)
        .build()
}

fn store_config() -> ConfigProperties {
    ConfigProperties::from_map([("checkout.max-items", "3"), ("pricing.surcharge", "2")])
}

#[test]
fn test_declared_components_are_wired() {
    let context = start(store_config()).unwrap();

    let checkout = context.get::<Checkout>("checkout").unwrap();
    assert_eq!(checkout.currency, "EUR");
    assert_eq!(checkout.max_items, 3);
    assert!(checkout.coupons.is_none());
    assert_eq!(*checkout.events.lock(), vec!["open audit@memory://store"]);

    let audit = context.get_unique::<AuditLog>().unwrap();
    assert!(Arc::ptr_eq(checkout.audit.get().unwrap(), &audit));
    assert!(context.contains("connection"));
    assert!(context.contains("storeConfig"));
}

#[test]
fn test_declared_proxy_is_injected_through_its_trait() {
    let context = start(store_config()).unwrap();

    let checkout = context.get::<Checkout>("checkout").unwrap();
    assert_eq!(checkout.pricing.quote(4).unwrap(), 12);
    let doubler = context.get::<Doubler>("doubler").unwrap();
    assert_eq!(*doubler.calls.lock(), vec!["flatPricing.quote"]);

    let proxy = context.lookup("flatPricing").unwrap();
    assert_eq!(proxy.type_key(), &TypeKey::of::<dyn Pricing>());

    // 成员注入发生在原始实例上，代理调用时可见
    let original = context
        .lookup_original("flatPricing")
        .unwrap()
        .downcast::<FlatPricing>()
        .unwrap();
    let rates = context.get_unique::<RateTable>().unwrap();
    assert!(Arc::ptr_eq(original.rates.get().unwrap(), &rates));
    assert_eq!(original.quote(1).unwrap(), 3);
    assert_eq!(doubler.calls.lock().len(), 1);
}

#[test]
fn test_shutdown_runs_declared_destroy_hooks() {
    let context = start(store_config()).unwrap();
    let checkout = context.get::<Checkout>("checkout").unwrap();
    let connection = context.get::<Connection>("connection").unwrap();

    context.shutdown().unwrap();
    assert!(!context.is_active());
    assert_eq!(checkout.events.lock().last().map(String::as_str), Some("close"));
    assert!(connection.closed.load(Ordering::SeqCst));
}

#[test]
fn test_missing_required_value_fails_startup() {
    let result = start(ConfigProperties::new());
    assert!(result.is_err());
}

#[test]
fn test_generated_definitions() {
    let checkout = Checkout::type_definition();
    assert_eq!(checkout.key, TypeKey::of::<Checkout>());
    assert_eq!(checkout.declared_order(), 10);
    assert_eq!(checkout.constructors[0].params.len(), 4);
    assert_eq!(checkout.members.len(), 1);
    assert!(checkout.operation_named("open").is_some());

    let pricing = FlatPricing::type_definition();
    assert!(pricing.is_proxied());
    assert_eq!(pricing.around_names(), vec!["doubler"]);

    let config = StoreConfig::type_definition();
    assert!(config.is_configuration());
    let names: Vec<String> = config
        .factory_methods
        .iter()
        .map(|method| method.component_name())
        .collect();
    assert_eq!(names, vec!["connection", "auditLog"]);
}
