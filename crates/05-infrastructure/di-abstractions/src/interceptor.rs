//! 调用拦截接口

use crate::catalog::TypeCatalog;
use infrastructure_common::{Arguments, Instance, Value};
use std::fmt;
use std::sync::Arc;

/// 一次被拦截的调用
#[derive(Debug)]
pub struct Invocation<'a> {
    /// 目标组件名称
    pub component: &'a str,
    /// 被代理的目标实例
    pub target: &'a Instance,
    /// 操作名称
    pub operation: &'a str,
    /// 调用参数
    pub args: &'a Arguments,
}

/// 链末端：调用目标操作
pub type ChainTerminal<'a> = dyn Fn(&Invocation<'_>) -> anyhow::Result<Value> + 'a;

/// 拦截器链
///
/// 依次把调用交给下一个拦截器，最后一个拦截器之后调用目标操作。
pub struct InterceptorChain<'a> {
    interceptors: &'a [Arc<dyn Interceptor>],
    terminal: &'a ChainTerminal<'a>,
}

impl<'a> InterceptorChain<'a> {
    /// 以拦截器切片和链末端创建链
    pub fn new(interceptors: &'a [Arc<dyn Interceptor>], terminal: &'a ChainTerminal<'a>) -> Self {
        Self {
            interceptors,
            terminal,
        }
    }

    /// 继续执行链上的下一个环节
    pub fn proceed(&self, call: &Invocation<'_>) -> anyhow::Result<Value> {
        match self.interceptors.split_first() {
            Some((head, rest)) => {
                let next = InterceptorChain {
                    interceptors: rest,
                    terminal: self.terminal,
                };
                head.intercept(call, &next)
            }
            None => (self.terminal)(call),
        }
    }
}

/// 组件的拦截器链
///
/// 持有代理包装前的目标实例和排好序的拦截器。类型化代理对象保存一份克隆，
/// 在每个方法里通过 [`ProxyChain::call`] 把真实调用交给链末端。
#[derive(Clone)]
pub struct ProxyChain {
    component: Arc<str>,
    target: Instance,
    interceptors: Arc<[Arc<dyn Interceptor>]>,
    catalog: Arc<TypeCatalog>,
}

impl ProxyChain {
    /// 为组件创建拦截器链，拦截器按执行顺序排列
    pub fn new(
        component: &str,
        target: Instance,
        interceptors: Vec<Arc<dyn Interceptor>>,
        catalog: Arc<TypeCatalog>,
    ) -> Self {
        Self {
            component: Arc::from(component),
            target,
            interceptors: interceptors.into(),
            catalog,
        }
    }

    /// 目标组件名称
    pub fn component(&self) -> &str {
        &self.component
    }

    /// 代理包装前的目标实例
    pub fn target(&self) -> &Instance {
        &self.target
    }

    /// 挂载的拦截器个数
    pub fn interceptor_count(&self) -> usize {
        self.interceptors.len()
    }

    /// 经过拦截器链调用目标类型上登记的命名操作
    pub fn invoke(&self, operation: &str, args: Arguments) -> anyhow::Result<Value> {
        self.call(operation, args, |call: &Invocation<'_>| {
            self.catalog
                .invoke(call.target, call.operation, call.args.clone())
        })
    }

    /// 经过拦截器链执行 `body`
    ///
    /// `operation` 与 `args` 只用于拦截器观察，真实调用由 `body` 完成。
    pub fn call<F>(&self, operation: &str, args: Arguments, body: F) -> anyhow::Result<Value>
    where
        F: Fn(&Invocation<'_>) -> anyhow::Result<Value>,
    {
        let terminal: &ChainTerminal<'_> = &body;
        InterceptorChain::new(&self.interceptors, terminal).proceed(&Invocation {
            component: &self.component,
            target: &self.target,
            operation,
            args: &args,
        })
    }
}

impl fmt::Debug for ProxyChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyChain")
            .field("component", &self.component)
            .field("target", &self.target)
            .field("interceptors", &self.interceptors.len())
            .finish()
    }
}

/// 拦截器 trait
///
/// 默认的 [`Interceptor::intercept`] 依次调用 `before`、链上后续环节、`after`，
/// 任一步失败时交给 `on_error`，最后总会调用 `finally`。
pub trait Interceptor: Send + Sync {
    /// 调用目标之前执行，返回错误时跳过目标调用
    fn before(&self, _call: &Invocation<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// 目标返回后执行，可以替换返回值
    fn after(&self, _call: &Invocation<'_>, result: Value) -> anyhow::Result<Value> {
        Ok(result)
    }

    /// 默认原样抛出错误
    fn on_error(&self, _call: &Invocation<'_>, error: anyhow::Error) -> anyhow::Result<Value> {
        Err(error)
    }

    /// 无论成功与否最后执行
    fn finally(&self, _call: &Invocation<'_>) {}

    /// 包裹一次调用的完整流程
    fn intercept(&self, call: &Invocation<'_>, chain: &InterceptorChain<'_>) -> anyhow::Result<Value> {
        let result = self
            .before(call)
            .and_then(|()| chain.proceed(call))
            .and_then(|value| self.after(call, value));
        let result = match result {
            Ok(value) => Ok(value),
            Err(error) => self.on_error(call, error),
        };
        self.finally(call);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    struct Recorder {
        label: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl Interceptor for Recorder {
        fn before(&self, call: &Invocation<'_>) -> anyhow::Result<()> {
            self.log.lock().push(format!("{} before {}", self.label, call.operation));
            Ok(())
        }

        fn after(&self, _call: &Invocation<'_>, result: Value) -> anyhow::Result<Value> {
            self.log.lock().push(format!("{} after", self.label));
            Ok(result)
        }

        fn on_error(&self, _call: &Invocation<'_>, error: anyhow::Error) -> anyhow::Result<Value> {
            self.log.lock().push(format!("{} error", self.label));
            Err(error)
        }

        fn finally(&self, _call: &Invocation<'_>) {
            self.log.lock().push(format!("{} finally", self.label));
        }
    }

    fn chain_of(log: &Arc<Mutex<Vec<String>>>) -> Vec<Arc<dyn Interceptor>> {
        vec![
            Arc::new(Recorder {
                label: "outer",
                log: log.clone(),
            }),
            Arc::new(Recorder {
                label: "inner",
                log: log.clone(),
            }),
        ]
    }

    #[test]
    fn test_chain_runs_interceptors_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let interceptors = chain_of(&log);
        let target = Instance::new(1_u32);
        let args = Arguments::empty();
        let call = Invocation {
            component: "counter",
            target: &target,
            operation: "get",
            args: &args,
        };
        let terminal: &ChainTerminal<'_> = &|_: &Invocation<'_>| -> anyhow::Result<Value> { Ok(Value::from(7_i64)) };
        let chain = InterceptorChain::new(&interceptors, terminal);

        let value = chain.proceed(&call).unwrap();
        assert_eq!(value.as_scalar::<i64>(), Some(7));
        assert_eq!(
            *log.lock(),
            vec![
                "outer before get",
                "inner before get",
                "inner after",
                "inner finally",
                "outer after",
                "outer finally",
            ]
        );
    }

    #[test]
    fn test_chain_propagates_errors_through_on_error() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let interceptors = chain_of(&log);
        let target = Instance::new(1_u32);
        let args = Arguments::empty();
        let call = Invocation {
            component: "counter",
            target: &target,
            operation: "fail",
            args: &args,
        };
        let terminal: &ChainTerminal<'_> = &|_: &Invocation<'_>| -> anyhow::Result<Value> { Err(anyhow::anyhow!("boom")) };
        let chain = InterceptorChain::new(&interceptors, terminal);

        let error = chain.proceed(&call).unwrap_err();
        assert_eq!(error.to_string(), "boom");
        assert!(log.lock().contains(&"inner error".to_string()));
        assert_eq!(log.lock().last().map(String::as_str), Some("outer finally"));
    }

    #[test]
    fn test_proxy_chain_runs_typed_body() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let chain = ProxyChain::new(
            "counter",
            Instance::new(20_u32),
            chain_of(&log),
            Arc::new(TypeCatalog::new()),
        );
        assert_eq!(chain.interceptor_count(), 2);

        let target = chain.target().downcast::<u32>().unwrap();
        let args = Arguments::new(vec![Value::from(2_i64)]);
        let value = chain
            .call("add", args, |call: &Invocation<'_>| {
                Ok(Value::from(i64::from(*target) + call.args.scalar::<i64>(0)?))
            })
            .unwrap();
        assert_eq!(value.as_scalar::<i64>(), Some(22));
        assert_eq!(log.lock().first().map(String::as_str), Some("outer before add"));

        let error = chain.invoke("missing", Arguments::empty()).unwrap_err();
        assert!(error.to_string().contains("missing"));
    }
}
