//! # 示例应用程序
//!
//! 演示如何用声明式组件容器组装一个小型下单流程。

mod components;

use clap::Parser;
use components::{AuditInterceptor, ConnectionPool, CreationCounter, OrderService};
use di_abstractions::ApplicationContext;
use infrastructure_common::{Arguments, Value};
use infrastructure_composition::{Application, ApplicationBuilder, LoggingConfig};
use tracing::{error, info};

/// 命令行参数
#[derive(Parser, Debug)]
#[command(name = "example-app")]
#[command(about = "Lorn 组件容器示例应用")]
struct Args {
    /// 配置文件路径（TOML、JSON、YAML）
    #[arg(short, long)]
    config: Option<String>,

    /// 额外属性，形如 key=value，可重复
    #[arg(short = 'D', long = "define", value_parser = parse_property)]
    properties: Vec<(String, String)>,

    /// 要下的订单，形如 item:quantity，可重复
    #[arg(short, long = "order", default_value = "book:2")]
    orders: Vec<String>,

    /// 日志级别
    #[arg(long, default_value = "info")]
    log_level: String,

    /// 使用 JSON 格式输出日志
    #[arg(long)]
    json_logs: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let application = build_application(&args)?;
    info!("组件: {}", application.component_names().join(", "));

    place_orders(&application, &args.orders)?;
    report(&application)?;

    application.stop()?;
    info!("应用已关闭");
    Ok(())
}

/// 构建应用
fn build_application(args: &Args) -> anyhow::Result<Application> {
    let logging = if args.json_logs {
        LoggingConfig::production()
    } else {
        LoggingConfig::default()
    }
    .with_filter(args.log_level.clone());

    let mut builder = ApplicationBuilder::new()
        .with_logging(logging)
        .catalog(components::catalog()?);

    match &args.config {
        Some(path) => builder = builder.add_config_file(path)?,
        None => info!("未指定配置文件，使用默认值和环境变量"),
    }
    builder = builder.add_config_env_vars("LORN");
    for (key, value) in &args.properties {
        builder = builder.property(key.clone(), value.clone());
    }

    Ok(builder.scan(module_path!()).build()?)
}

/// 通过容器调用下单服务，调用经过审计拦截器
fn place_orders(application: &Application, orders: &[String]) -> anyhow::Result<()> {
    let context = application.context();
    let service = context.lookup("orderService")?;

    for order in orders {
        let (item, quantity) = order
            .split_once(':')
            .ok_or_else(|| anyhow::anyhow!("订单格式应为 item:quantity: {}", order))?;
        let quantity: i64 = quantity.trim().parse()?;
        let args = Arguments::new(vec![Value::from(item.trim()), Value::from(quantity)]);
        match context.invoke(&service, "place", args) {
            Ok(id) => info!("下单成功: {} -> #{}", order, id.as_scalar::<i64>().unwrap_or_default()),
            Err(e) => error!("下单失败: {}: {}", order, e),
        }
    }

    let original = context.lookup_original("orderService")?;
    if let Some(service) = original.downcast::<OrderService>() {
        info!("订单总数: {}", service.order_count());
    }
    Ok(())
}

/// 输出运行信息
fn report(application: &Application) -> anyhow::Result<()> {
    let audit = application.get::<AuditInterceptor>("auditInterceptor")?;
    let counter = application.resolve::<CreationCounter>()?;
    let pool = application.get::<ConnectionPool>("connectionPool")?;
    info!(
        "审计调用 {} 次, 后处理组件 {} 个, 连接池 {} ({} 个连接)",
        audit.calls(),
        counter.created(),
        pool.url,
        pool.size
    );
    info!("运行信息: {}", serde_json::to_string_pretty(&application.metrics())?);
    Ok(())
}

fn parse_property(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .ok_or_else(|| format!("属性格式应为 key=value: {}", raw))
}
