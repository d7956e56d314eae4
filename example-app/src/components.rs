//! 示例组件
//!
//! 一个小型下单流程：仓储、下单服务、审计拦截器、通知器和连接池。

use di_abstractions::{
    ConstructorDef, FactoryMethodDef, Interceptor, Invocation, MemberDef, OperationDef, ParamDef,
    ParamType, PostProcessor, TypeCatalog, TypeDefinition,
};
use infrastructure_common::{ComponentResult, Instance, ScalarType, TypeKey, Value};
use once_cell::sync::OnceCell;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 订单仓储
pub trait OrderRepository: Send + Sync {
    fn save(&self, item: &str, quantity: i64) -> u64;
    fn count(&self) -> usize;
}

/// 内存仓储
#[derive(Default)]
pub struct InMemoryOrderRepository {
    next_id: AtomicU64,
    orders: Mutex<Vec<(u64, String, i64)>>,
}

impl OrderRepository for InMemoryOrderRepository {
    fn save(&self, item: &str, quantity: i64) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.orders.lock().push((id, item.to_string(), quantity));
        id
    }

    fn count(&self) -> usize {
        self.orders.lock().len()
    }
}

/// 通知器
pub struct Notifier {
    channel: OnceCell<String>,
}

impl Notifier {
    pub fn notify(&self, message: &str) {
        let channel = self.channel.get().map(String::as_str).unwrap_or("stdout");
        info!("[{}] {}", channel, message);
    }
}

/// 下单服务
pub struct OrderService {
    repository: Arc<dyn OrderRepository>,
    currency: String,
    unit_price: i64,
    notifier: OnceCell<Arc<Notifier>>,
}

impl OrderService {
    /// 下单，返回订单号
    pub fn place(&self, item: &str, quantity: i64) -> anyhow::Result<u64> {
        if quantity <= 0 {
            anyhow::bail!("数量必须为正数: {}", quantity);
        }
        let id = self.repository.save(item, quantity);
        if let Some(notifier) = self.notifier.get() {
            notifier.notify(&format!(
                "订单 #{} {} x{} 共 {} {}",
                id,
                item,
                quantity,
                quantity * self.unit_price,
                self.currency
            ));
        }
        Ok(id)
    }

    pub fn order_count(&self) -> usize {
        self.repository.count()
    }
}

/// 审计拦截器
#[derive(Default)]
pub struct AuditInterceptor {
    calls: AtomicUsize,
}

impl AuditInterceptor {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Interceptor for AuditInterceptor {
    fn before(&self, call: &Invocation<'_>) -> anyhow::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        debug!("审计: 调用 {}.{}", call.component, call.operation);
        Ok(())
    }

    fn on_error(&self, call: &Invocation<'_>, error: anyhow::Error) -> anyhow::Result<Value> {
        warn!("审计: {}.{} 失败: {}", call.component, call.operation, error);
        Err(error)
    }
}

/// 统计组件创建数量的后处理器
#[derive(Default)]
pub struct CreationCounter {
    created: AtomicUsize,
}

impl CreationCounter {
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

impl PostProcessor for CreationCounter {
    fn after_construction(&self, instance: Instance, name: &str) -> anyhow::Result<Instance> {
        self.created.fetch_add(1, Ordering::SeqCst);
        debug!("组件已创建: {} ({})", name, instance.type_key().simple_name());
        Ok(instance)
    }
}

/// 连接池
pub struct ConnectionPool {
    pub url: String,
    pub size: usize,
    open: AtomicUsize,
}

/// 存储配置类
pub struct StorageConfig;

/// 登记全部示例类型
pub fn catalog() -> ComponentResult<TypeCatalog> {
    let mut catalog = TypeCatalog::new();
    catalog
        .register(
            TypeDefinition::of::<InMemoryOrderRepository>()
                .component_named("orderRepository")
                .implements(|this: Arc<InMemoryOrderRepository>| this as Arc<dyn OrderRepository>)
                .constructor(ConstructorDef::default_of::<InMemoryOrderRepository>()),
        )?
        .register(
            TypeDefinition::of::<Notifier>()
                .component()
                .constructor(ConstructorDef::new(vec![], |_| {
                    Ok(Notifier {
                        channel: OnceCell::new(),
                    })
                }))
                .member(
                    MemberDef::setter(
                        "set_channel",
                        ParamType::Scalar(ScalarType::String),
                        |this: &Notifier, value| {
                            let channel = value
                                .as_scalar::<String>()
                                .ok_or_else(|| anyhow::anyhow!("channel 必须是字符串"))?;
                            this.channel
                                .set(channel)
                                .map_err(|_| anyhow::anyhow!("channel 已设置"))
                        },
                    )
                    .with_value("notifier.channel:stdout"),
                ),
        )?
        .register(
            TypeDefinition::of::<OrderService>()
                .component()
                .around(["auditInterceptor"])
                .constructor(ConstructorDef::new(
                    vec![
                        ParamDef::autowired::<dyn OrderRepository>("repository"),
                        ParamDef::value("currency", ScalarType::String, "orders.currency:EUR"),
                        ParamDef::value("unit_price", ScalarType::I64, "${orders.unit-price:10}"),
                    ],
                    |args| {
                        Ok(OrderService {
                            repository: args.shared::<dyn OrderRepository>(0)?,
                            currency: args.scalar::<String>(1)?,
                            unit_price: args.scalar::<i64>(2)?,
                            notifier: OnceCell::new(),
                        })
                    },
                ))
                .member(
                    MemberDef::field(
                        "notifier",
                        ParamType::Component(TypeKey::of::<Notifier>()),
                        |this: &OrderService, value| {
                            let notifier = value
                                .as_instance()
                                .and_then(|instance| instance.downcast::<Notifier>())
                                .ok_or_else(|| anyhow::anyhow!("notifier 类型不符"))?;
                            this.notifier
                                .set(notifier)
                                .map_err(|_| anyhow::anyhow!("notifier 已设置"))
                        },
                    )
                    .autowired(),
                )
                .operation(OperationDef::new("place", 2, |this: &OrderService, args| {
                    let id = this.place(&args.scalar::<String>(0)?, args.scalar::<i64>(1)?)?;
                    Ok(Value::from(id as i64))
                }))
                .operation(OperationDef::new("count", 0, |this: &OrderService, _| {
                    Ok(Value::from(this.order_count() as i64))
                })),
        )?
        .register(
            TypeDefinition::of::<AuditInterceptor>()
                .component()
                .interceptor::<AuditInterceptor>()
                .constructor(ConstructorDef::default_of::<AuditInterceptor>()),
        )?
        .register(
            TypeDefinition::of::<CreationCounter>()
                .component()
                .order(0)
                .post_processor::<CreationCounter>()
                .constructor(ConstructorDef::default_of::<CreationCounter>()),
        )?
        .register(
            TypeDefinition::of::<StorageConfig>()
                .configuration()
                .constructor(ConstructorDef::new(vec![], |_| Ok(StorageConfig)))
                .factory_method(
                    FactoryMethodDef::new(
                        "connectionPool",
                        vec![
                            ParamDef::value("url", ScalarType::String, "storage.url:memory://orders"),
                            ParamDef::value("size", ScalarType::Usize, "storage.pool-size:4"),
                        ],
                        |_: &StorageConfig, args| {
                            Ok(ConnectionPool {
                                url: args.scalar::<String>(0)?,
                                size: args.scalar::<usize>(1)?,
                                open: AtomicUsize::new(0),
                            })
                        },
                    )
                    .init("open")
                    .destroy("close"),
                ),
        )?
        .register(
            TypeDefinition::of::<ConnectionPool>()
                .operation(OperationDef::hook("open", |this: &ConnectionPool| {
                    this.open.store(this.size, Ordering::SeqCst);
                    info!("连接池已打开: {} ({} 个连接)", this.url, this.size);
                    Ok(())
                }))
                .operation(OperationDef::hook("close", |this: &ConnectionPool| {
                    let open = this.open.swap(0, Ordering::SeqCst);
                    info!("连接池已关闭: {} (释放 {} 个连接)", this.url, open);
                    Ok(())
                })),
        )?;
    Ok(catalog)
}
