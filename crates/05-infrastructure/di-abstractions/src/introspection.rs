//! 类型内省注册表
//!
//! Rust 没有运行时反射，组件类型通过 [`TypeDefinition`] 显式声明自己的
//! 标记、构造函数、工厂方法、可注入成员和命名操作。

use crate::interceptor::{Interceptor, ProxyChain};
use crate::markers::{BeanMarker, Marker, OperationMarker};
use crate::processor::PostProcessor;
use infrastructure_common::{
    Arguments, ComponentError, Instance, ScalarType, TypeKey, Value, DEFAULT_ORDER,
};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// 构造函数
pub type ConstructFn = Arc<dyn Fn(Arguments) -> anyhow::Result<Instance> + Send + Sync>;
/// 工厂方法，第一个参数为所属配置组件的实例
pub type FactoryFn = Arc<dyn Fn(&Instance, Arguments) -> anyhow::Result<Instance> + Send + Sync>;
/// 成员赋值函数
pub type AssignFn = Arc<dyn Fn(&Instance, Value) -> anyhow::Result<()> + Send + Sync>;
/// 命名操作
pub type OperationFn = Arc<dyn Fn(&Instance, Arguments) -> anyhow::Result<Value> + Send + Sync>;
/// 向上转型：取得实例在父类型下的视图
pub type UpcastFn = Arc<dyn Fn(&Instance) -> Option<Instance> + Send + Sync>;
/// 后处理器转换
pub type PostProcessorCast = Arc<dyn Fn(&Instance) -> Option<Arc<dyn PostProcessor>> + Send + Sync>;
/// 拦截器转换
pub type InterceptorCast = Arc<dyn Fn(&Instance) -> Option<Arc<dyn Interceptor>> + Send + Sync>;
/// 类型化代理构造：目标实例类型不符时返回 `None`
pub type ProxyFn = Arc<dyn Fn(&ProxyChain) -> Option<Instance> + Send + Sync>;

fn downcast_error<T: Any>(instance: &Instance) -> anyhow::Error {
    anyhow::anyhow!(
        "实例类型为 {}, 期望 {}",
        instance.type_key(),
        std::any::type_name::<T>()
    )
}

/// 类型种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    /// 普通结构体，可以直接构造
    Concrete,
    /// 抽象类型，只能作为父类型
    Abstract,
    /// 接口类型，只能通过实现类型得到实例
    Interface,
}

/// 可见性
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// 公开
    Public,
    /// 私有，容器不会使用
    Private,
}

/// 父类型
#[derive(Clone)]
pub struct SuperType {
    /// 父类型标识
    pub key: TypeKey,
    /// 取得父类型视图的转换函数
    pub upcast: Option<UpcastFn>,
}

impl fmt::Debug for SuperType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SuperType")
            .field("key", &self.key)
            .field("upcast", &self.upcast.is_some())
            .finish()
    }
}

/// 参数或成员的声明类型
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamType {
    /// 标量，来自配置
    Scalar(ScalarType),
    /// 组件，来自容器
    Component(TypeKey),
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(ty) => write!(f, "{}", ty),
            Self::Component(key) => write!(f, "{}", key),
        }
    }
}

/// 依赖绑定标记
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Autowired {
    /// 按名称查找；为空时按类型查找
    pub name: Option<String>,
    /// 找不到候选时报错
    pub required: bool,
}

impl Default for Autowired {
    fn default() -> Self {
        Self {
            name: None,
            required: true,
        }
    }
}

/// 解析后的绑定方式
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    /// 值绑定：配置表达式与目标标量类型
    Value { expression: String, ty: ScalarType },
    /// 依赖绑定
    Dependency {
        name: Option<String>,
        ty: TypeKey,
        required: bool,
    },
}

/// 根据声明的标记确定绑定方式
///
/// 值绑定与依赖绑定必须恰好出现一个；`implicit_autowired` 为真时
/// 未标记的参数视为必需的依赖绑定。
fn resolve_binding(
    component: &str,
    target: &str,
    ty: &ParamType,
    value: Option<&String>,
    autowired: Option<&Autowired>,
    implicit_autowired: bool,
) -> Result<Binding, ComponentError> {
    let invalid = |reason: &str| ComponentError::InvalidBinding {
        component: component.to_string(),
        target: target.to_string(),
        reason: reason.to_string(),
    };
    let implicit = Autowired::default();
    let autowired = match (value, autowired) {
        (Some(_), Some(_)) => return Err(invalid("不能同时声明值绑定和依赖绑定")),
        (None, None) if implicit_autowired => Some(&implicit),
        (None, None) => return Err(invalid("必须声明值绑定或依赖绑定")),
        (_, autowired) => autowired,
    };
    match (value, autowired, ty) {
        (Some(expression), _, ParamType::Scalar(scalar)) => Ok(Binding::Value {
            expression: expression.clone(),
            ty: *scalar,
        }),
        (Some(_), _, ParamType::Component(_)) => Err(invalid("值绑定的目标必须是标量类型")),
        (None, Some(autowired), ParamType::Component(key)) => Ok(Binding::Dependency {
            name: autowired.name.clone(),
            ty: key.clone(),
            required: autowired.required,
        }),
        (None, _, ParamType::Scalar(_)) => Err(invalid("依赖绑定的目标必须是组件类型")),
        (None, None, ParamType::Component(_)) => Err(invalid("必须声明值绑定或依赖绑定")),
    }
}

/// 构造参数或工厂方法参数
#[derive(Debug, Clone)]
pub struct ParamDef {
    /// 参数名称
    pub name: String,
    /// 声明类型
    pub ty: ParamType,
    /// 值绑定表达式
    pub value: Option<String>,
    /// 依赖绑定
    pub autowired: Option<Autowired>,
}

impl ParamDef {
    /// 值绑定参数，表达式形如 `key`、`key:default` 或 `${key:default}`
    pub fn value(name: impl Into<String>, ty: ScalarType, expression: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ParamType::Scalar(ty),
            value: Some(expression.into()),
            autowired: None,
        }
    }

    /// 依赖绑定参数，按类型查找
    pub fn autowired<T: ?Sized + 'static>(name: impl Into<String>) -> Self {
        Self::dependency::<T>(name).with_autowired(Autowired::default())
    }

    /// 未标记的组件参数，只在构造函数带依赖绑定标记时合法
    pub fn dependency<T: ?Sized + 'static>(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ParamType::Component(TypeKey::of::<T>()),
            value: None,
            autowired: None,
        }
    }

    /// 未标记的标量参数
    pub fn scalar(name: impl Into<String>, ty: ScalarType) -> Self {
        Self {
            name: name.into(),
            ty: ParamType::Scalar(ty),
            value: None,
            autowired: None,
        }
    }

    /// 添加依赖绑定标记
    pub fn with_autowired(mut self, autowired: Autowired) -> Self {
        self.autowired = Some(autowired);
        self
    }

    /// 添加值绑定标记
    pub fn with_value(mut self, expression: impl Into<String>) -> Self {
        self.value = Some(expression.into());
        self
    }

    /// 依赖按名称查找
    pub fn named(mut self, component: impl Into<String>) -> Self {
        let mut autowired = self.autowired.take().unwrap_or_default();
        autowired.name = Some(component.into());
        self.autowired = Some(autowired);
        self
    }

    /// 可选依赖
    pub fn optional(mut self) -> Self {
        let mut autowired = self.autowired.take().unwrap_or_default();
        autowired.required = false;
        self.autowired = Some(autowired);
        self
    }

    /// 确定绑定方式
    pub fn binding(&self, component: &str, implicit_autowired: bool) -> Result<Binding, ComponentError> {
        resolve_binding(
            component,
            &format!("参数 '{}'", self.name),
            &self.ty,
            self.value.as_ref(),
            self.autowired.as_ref(),
            implicit_autowired,
        )
    }
}

/// 构造函数定义
#[derive(Clone)]
pub struct ConstructorDef {
    /// 参数列表
    pub params: Vec<ParamDef>,
    /// 构造函数本身带依赖绑定标记
    pub autowired: bool,
    /// 可见性
    pub visibility: Visibility,
    /// 构造函数本身
    pub construct: ConstructFn,
}

impl ConstructorDef {
    /// 以参数列表和构造闭包创建
    pub fn new<T, F>(params: Vec<ParamDef>, construct: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(Arguments) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        Self {
            params,
            autowired: false,
            visibility: Visibility::Public,
            construct: Arc::new(move |args| construct(args).map(Instance::new)),
        }
    }

    /// 无参构造
    pub fn default_of<T: Any + Send + Sync + Default>() -> Self {
        Self::new(Vec::new(), |_| Ok(T::default()))
    }

    /// 构造函数带依赖绑定标记，未标记的参数按类型注入
    pub fn autowired(mut self) -> Self {
        self.autowired = true;
        self
    }

    /// 标记为私有构造函数
    pub fn private(mut self) -> Self {
        self.visibility = Visibility::Private;
        self
    }
}

impl fmt::Debug for ConstructorDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorDef")
            .field("params", &self.params)
            .field("autowired", &self.autowired)
            .field("visibility", &self.visibility)
            .finish()
    }
}

/// 工厂方法的返回类型
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnType {
    /// 无返回值
    Unit,
    /// 返回标量
    Scalar(ScalarType),
    /// 返回组件实例
    Type(TypeKey),
}

/// 工厂方法定义
#[derive(Clone)]
pub struct FactoryMethodDef {
    /// 方法名称
    pub name: String,
    /// 返回类型
    pub returns: ReturnType,
    /// 可见性
    pub visibility: Visibility,
    /// 抽象方法
    pub is_abstract: bool,
    /// 不可覆盖的方法
    pub is_final: bool,
    /// 工厂标记；未标记的方法不产生组件
    pub bean: Option<BeanMarker>,
    /// 产生组件的排序权重
    pub order: Option<i32>,
    /// 产生的组件按类型查找时优先
    pub primary: bool,
    /// 参数列表
    pub params: Vec<ParamDef>,
    /// 方法本身
    pub invoke: FactoryFn,
}

impl FactoryMethodDef {
    /// 带工厂标记的方法
    pub fn new<O, R, F>(name: impl Into<String>, params: Vec<ParamDef>, invoke: F) -> Self
    where
        O: Any + Send + Sync,
        R: Any + Send + Sync,
        F: Fn(&O, Arguments) -> anyhow::Result<R> + Send + Sync + 'static,
    {
        let invoke: FactoryFn = Arc::new(move |owner: &Instance, args| {
            let owner_ref = owner
                .downcast_ref::<O>()
                .ok_or_else(|| downcast_error::<O>(owner))?;
            invoke(owner_ref, args).map(Instance::new)
        });
        Self::raw(name, params, ReturnType::Type(TypeKey::of::<R>()), invoke)
    }

    /// 以原始形式声明，返回类型由调用方给出
    pub fn raw(
        name: impl Into<String>,
        params: Vec<ParamDef>,
        returns: ReturnType,
        invoke: FactoryFn,
    ) -> Self {
        Self {
            name: name.into(),
            returns,
            visibility: Visibility::Public,
            is_abstract: false,
            is_final: false,
            bean: Some(BeanMarker::default()),
            order: None,
            primary: false,
            params,
            invoke,
        }
    }

    /// 显式组件名称
    pub fn bean_name(mut self, name: impl Into<String>) -> Self {
        self.bean.get_or_insert_with(BeanMarker::default).name = Some(name.into());
        self
    }

    /// 就绪钩子操作名
    pub fn init(mut self, operation: impl Into<String>) -> Self {
        self.bean.get_or_insert_with(BeanMarker::default).init = Some(operation.into());
        self
    }

    /// 关闭钩子操作名
    pub fn destroy(mut self, operation: impl Into<String>) -> Self {
        self.bean.get_or_insert_with(BeanMarker::default).destroy = Some(operation.into());
        self
    }

    /// 产生组件的排序权重
    pub fn order(mut self, order: i32) -> Self {
        self.order = Some(order);
        self
    }

    /// 产生的组件按类型查找时优先
    pub fn primary(mut self) -> Self {
        self.primary = true;
        self
    }

    /// 去掉工厂标记，作为普通方法存在
    pub fn unmarked(mut self) -> Self {
        self.bean = None;
        self
    }

    /// 标记为抽象方法
    pub fn abstract_method(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    /// 标记为不可覆盖
    pub fn final_method(mut self) -> Self {
        self.is_final = true;
        self
    }

    /// 标记为私有方法
    pub fn private(mut self) -> Self {
        self.visibility = Visibility::Private;
        self
    }

    /// 产生的组件名称
    pub fn component_name(&self) -> String {
        self.bean
            .as_ref()
            .and_then(|bean| bean.name.clone())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| self.name.clone())
    }

    /// 产生的组件排序权重
    pub fn effective_order(&self) -> i32 {
        self.order.unwrap_or(DEFAULT_ORDER)
    }
}

impl fmt::Debug for FactoryMethodDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FactoryMethodDef")
            .field("name", &self.name)
            .field("returns", &self.returns)
            .field("bean", &self.bean)
            .field("order", &self.order)
            .field("primary", &self.primary)
            .field("params", &self.params)
            .finish()
    }
}

/// 成员种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    /// 字段
    Field,
    /// 方法，注入时要求恰好一个参数
    Method { param_count: usize },
}

/// 可注入成员定义
#[derive(Clone)]
pub struct MemberDef {
    /// 成员名称
    pub name: String,
    /// 成员种类
    pub kind: MemberKind,
    /// 静态成员，不能注入
    pub is_static: bool,
    /// 不可变成员
    pub is_final: bool,
    /// 声明类型
    pub ty: ParamType,
    /// 值绑定表达式
    pub value: Option<String>,
    /// 依赖绑定
    pub autowired: Option<Autowired>,
    /// 赋值函数
    pub assign: AssignFn,
}

impl MemberDef {
    fn typed<T, F>(name: impl Into<String>, kind: MemberKind, ty: ParamType, assign: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&T, Value) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            kind,
            is_static: false,
            is_final: false,
            ty,
            value: None,
            autowired: None,
            assign: Arc::new(move |instance: &Instance, value| {
                let this = instance
                    .downcast_ref::<T>()
                    .ok_or_else(|| downcast_error::<T>(instance))?;
                assign(this, value)
            }),
        }
    }

    /// 字段；Rust 中以内部可变的单元承载
    pub fn field<T, F>(name: impl Into<String>, ty: ParamType, assign: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&T, Value) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self::typed(name, MemberKind::Field, ty, assign)
    }

    /// 单参数 setter
    pub fn setter<T, F>(name: impl Into<String>, ty: ParamType, assign: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&T, Value) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self::typed(name, MemberKind::Method { param_count: 1 }, ty, assign)
    }

    /// 任意参数个数的方法
    pub fn method<T, F>(name: impl Into<String>, param_count: usize, ty: ParamType, assign: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&T, Value) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self::typed(name, MemberKind::Method { param_count }, ty, assign)
    }

    /// 值绑定
    pub fn with_value(mut self, expression: impl Into<String>) -> Self {
        self.value = Some(expression.into());
        self
    }

    /// 依赖绑定
    pub fn with_autowired(mut self, autowired: Autowired) -> Self {
        self.autowired = Some(autowired);
        self
    }

    /// 按类型的必需依赖绑定
    pub fn autowired(self) -> Self {
        self.with_autowired(Autowired::default())
    }

    /// 标记为静态成员
    pub fn static_member(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// 标记为不可变
    pub fn final_member(mut self) -> Self {
        self.is_final = true;
        self
    }

    /// 是否带有任何绑定标记
    pub fn is_injectable(&self) -> bool {
        self.value.is_some() || self.autowired.is_some()
    }

    /// 确定绑定方式
    pub fn binding(&self, component: &str) -> Result<Binding, ComponentError> {
        resolve_binding(
            component,
            &format!("成员 '{}'", self.name),
            &self.ty,
            self.value.as_ref(),
            self.autowired.as_ref(),
            false,
        )
    }
}

impl fmt::Debug for MemberDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberDef")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("is_static", &self.is_static)
            .field("is_final", &self.is_final)
            .field("ty", &self.ty)
            .field("value", &self.value)
            .field("autowired", &self.autowired)
            .finish()
    }
}

/// 命名操作定义
#[derive(Clone)]
pub struct OperationDef {
    /// 操作名称
    pub name: String,
    /// 参数个数
    pub param_count: usize,
    /// 生命周期标记
    pub markers: Vec<OperationMarker>,
    /// 操作本身
    pub call: OperationFn,
}

impl OperationDef {
    /// 以参数个数和调用闭包创建
    pub fn new<T, F>(name: impl Into<String>, param_count: usize, call: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&T, Arguments) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            param_count,
            markers: Vec::new(),
            call: Arc::new(move |instance: &Instance, args| {
                let this = instance
                    .downcast_ref::<T>()
                    .ok_or_else(|| downcast_error::<T>(instance))?;
                call(this, args)
            }),
        }
    }

    /// 无参数、无返回值的操作，适用于生命周期钩子
    pub fn hook<T, F>(name: impl Into<String>, call: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&T) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self::new(name, 0, move |this: &T, _| call(this).map(|()| Value::Unit))
    }

    /// 标记为属性注入后调用
    pub fn post_construct(mut self) -> Self {
        self.markers.push(OperationMarker::PostConstruct);
        self
    }

    /// 标记为容器关闭时调用
    pub fn pre_destroy(mut self) -> Self {
        self.markers.push(OperationMarker::PreDestroy);
        self
    }

    /// 是否带有指定标记
    pub fn has_marker(&self, marker: OperationMarker) -> bool {
        self.markers.contains(&marker)
    }

    /// 调用操作
    pub fn invoke(&self, instance: &Instance, args: Arguments) -> anyhow::Result<Value> {
        (self.call)(instance, args)
    }
}

impl fmt::Debug for OperationDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationDef")
            .field("name", &self.name)
            .field("param_count", &self.param_count)
            .field("markers", &self.markers)
            .finish()
    }
}

/// 类型定义
///
/// 一个候选类型的完整内省信息。通过链式方法构建：
///
/// ```ignore
/// TypeDefinition::of::<UserService>()
///     .component()
///     .constructor(ConstructorDef::new(
///         vec![ParamDef::autowired::<UserRepository>("repository")],
///         |args| Ok(UserService::new(args.component::<UserRepository>(0)?)),
///     ))
/// ```
#[derive(Clone)]
pub struct TypeDefinition {
    /// 类型标识
    pub key: TypeKey,
    /// 类型种类
    pub kind: TypeKind,
    /// 可见性
    pub visibility: Visibility,
    /// 父类型
    pub supertypes: Vec<SuperType>,
    /// 类型级标记
    pub markers: Vec<Marker>,
    /// 构造函数
    pub constructors: Vec<ConstructorDef>,
    /// 工厂方法
    pub factory_methods: Vec<FactoryMethodDef>,
    /// 可注入成员
    pub members: Vec<MemberDef>,
    /// 命名操作
    pub operations: Vec<OperationDef>,
    /// 后处理器视图
    pub post_processor: Option<PostProcessorCast>,
    /// 拦截器视图
    pub interceptor: Option<InterceptorCast>,
    /// 挂载拦截器时使用的类型化代理
    pub proxy: Option<ProxyFn>,
}

impl TypeDefinition {
    /// 以 Rust 类型创建定义
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::named(TypeKey::of::<T>())
    }

    /// 以类型标识创建定义
    pub fn named(key: impl Into<TypeKey>) -> Self {
        Self {
            key: key.into(),
            kind: TypeKind::Concrete,
            visibility: Visibility::Public,
            supertypes: Vec::new(),
            markers: Vec::new(),
            constructors: Vec::new(),
            factory_methods: Vec::new(),
            members: Vec::new(),
            operations: Vec::new(),
            post_processor: None,
            interceptor: None,
            proxy: None,
        }
    }

    /// 简短类型名
    pub fn simple_name(&self) -> &str {
        self.key.simple_name()
    }

    /// 设置类型种类
    pub fn kind(mut self, kind: TypeKind) -> Self {
        self.kind = kind;
        self
    }

    /// 标记为私有类型
    pub fn private(mut self) -> Self {
        self.visibility = Visibility::Private;
        self
    }

    /// 添加标记
    pub fn marker(mut self, marker: Marker) -> Self {
        self.markers.push(marker);
        self
    }

    /// 添加匿名组件标记
    pub fn component(self) -> Self {
        self.marker(Marker::component())
    }

    /// 添加带名称的组件标记
    pub fn component_named(self, name: impl Into<String>) -> Self {
        self.marker(Marker::component_named(name))
    }

    /// 添加配置类标记
    pub fn configuration(self) -> Self {
        self.marker(Marker::Configuration(None))
    }

    /// 添加排序权重
    pub fn order(self, order: i32) -> Self {
        self.marker(Marker::Order(order))
    }

    /// 添加优先标记
    pub fn primary(self) -> Self {
        self.marker(Marker::Primary)
    }

    /// 挂载拦截器组件
    pub fn around<I, S>(self, interceptors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.marker(Marker::Around(interceptors.into_iter().map(Into::into).collect()))
    }

    /// 引入其他类型
    pub fn import(self, types: Vec<TypeKey>) -> Self {
        self.marker(Marker::Import(types))
    }

    /// 声明父类型，无法取得父类型视图
    pub fn supertype(mut self, key: impl Into<TypeKey>) -> Self {
        self.supertypes.push(SuperType {
            key: key.into(),
            upcast: None,
        });
        self
    }

    /// 声明实现的 trait，`upcast` 把实例转换为 trait 对象
    pub fn implements<T, S, F>(mut self, upcast: F) -> Self
    where
        T: Any + Send + Sync,
        S: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<T>) -> Arc<S> + Send + Sync + 'static,
    {
        let cast: UpcastFn = Arc::new(move |instance: &Instance| {
            instance
                .downcast::<T>()
                .map(|this| Instance::from_trait_object(upcast(this)))
        });
        self.supertypes.push(SuperType {
            key: TypeKey::of::<S>(),
            upcast: Some(cast),
        });
        self
    }

    /// 声明父结构，`parent` 返回内嵌的父对象
    pub fn extends<T, P, F>(mut self, parent: F) -> Self
    where
        T: Any + Send + Sync,
        P: Any + Send + Sync,
        F: Fn(&T) -> Arc<P> + Send + Sync + 'static,
    {
        let cast: UpcastFn = Arc::new(move |instance: &Instance| {
            instance
                .downcast_ref::<T>()
                .map(|this| Instance::from_arc(parent(this)))
        });
        self.supertypes.push(SuperType {
            key: TypeKey::of::<P>(),
            upcast: Some(cast),
        });
        self
    }

    /// 添加构造函数
    pub fn constructor(mut self, constructor: ConstructorDef) -> Self {
        self.constructors.push(constructor);
        self
    }

    /// 添加工厂方法
    pub fn factory_method(mut self, method: FactoryMethodDef) -> Self {
        self.factory_methods.push(method);
        self
    }

    /// 批量添加工厂方法
    pub fn factory_methods(mut self, methods: impl IntoIterator<Item = FactoryMethodDef>) -> Self {
        self.factory_methods.extend(methods);
        self
    }

    /// 添加可注入成员
    pub fn member(mut self, member: MemberDef) -> Self {
        self.members.push(member);
        self
    }

    /// 添加命名操作
    pub fn operation(mut self, operation: OperationDef) -> Self {
        self.operations.push(operation);
        self
    }

    /// 声明该类型实现 [`PostProcessor`]
    pub fn post_processor<T: PostProcessor + Any>(mut self) -> Self {
        self.post_processor = Some(Arc::new(|instance: &Instance| {
            instance
                .downcast::<T>()
                .map(|this| this as Arc<dyn PostProcessor>)
        }));
        self
    }

    /// 声明该类型实现 [`Interceptor`]
    pub fn interceptor<T: Interceptor + Any>(mut self) -> Self {
        self.interceptor = Some(Arc::new(|instance: &Instance| {
            instance
                .downcast::<T>()
                .map(|this| this as Arc<dyn Interceptor>)
        }));
        self
    }

    /// 声明类型化代理
    ///
    /// 组件挂载拦截器后，容器调用 `wrap` 把原始实例和拦截器链包装为
    /// 代理对象，并以 `S` 的名义存放。`S` 可以是 `T` 本身或 `T` 实现的 trait，
    /// 依赖方注入得到的就是这个代理对象。
    ///
    /// ```ignore
    /// TypeDefinition::of::<SimpleCalculator>()
    ///     .around(["auditInterceptor"])
    ///     .implements(|this: Arc<SimpleCalculator>| -> Arc<dyn Calculator> { this })
    ///     .proxied_as(|target: Arc<SimpleCalculator>, chain| -> Arc<dyn Calculator> {
    ///         Arc::new(CalculatorProxy { target, chain })
    ///     })
    /// ```
    pub fn proxied_as<T, S, F>(mut self, wrap: F) -> Self
    where
        T: Any + Send + Sync,
        S: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<T>, ProxyChain) -> Arc<S> + Send + Sync + 'static,
    {
        self.proxy = Some(Arc::new(move |chain: &ProxyChain| {
            chain
                .target()
                .downcast::<T>()
                .map(|target| Instance::from_trait_object(wrap(target, chain.clone())))
        }));
        self
    }

    /// 是否声明了类型化代理
    pub fn is_proxied(&self) -> bool {
        self.proxy.is_some()
    }

    /// 直接声明的排序权重
    pub fn declared_order(&self) -> i32 {
        self.markers
            .iter()
            .find_map(|marker| match marker {
                Marker::Order(order) => Some(*order),
                _ => None,
            })
            .unwrap_or(DEFAULT_ORDER)
    }

    /// 是否直接带有优先标记
    pub fn is_primary(&self) -> bool {
        self.markers.contains(&Marker::Primary)
    }

    /// 是否直接带有配置类标记
    pub fn is_configuration(&self) -> bool {
        self.markers
            .iter()
            .any(|marker| matches!(marker, Marker::Configuration(_)))
    }

    /// 是否实现后处理器接口
    pub fn is_post_processor(&self) -> bool {
        self.post_processor.is_some()
    }

    /// 是否实现拦截器接口
    pub fn is_interceptor(&self) -> bool {
        self.interceptor.is_some()
    }

    /// 挂载的拦截器名称
    pub fn around_names(&self) -> Vec<String> {
        self.markers
            .iter()
            .filter_map(|marker| match marker {
                Marker::Around(names) => Some(names.clone()),
                _ => None,
            })
            .flatten()
            .collect()
    }

    /// 引入的类型
    pub fn imports(&self) -> Vec<TypeKey> {
        self.markers
            .iter()
            .filter_map(|marker| match marker {
                Marker::Import(types) => Some(types.clone()),
                _ => None,
            })
            .flatten()
            .collect()
    }

    /// 按名称查找操作
    pub fn operation_named(&self, name: &str) -> Option<&OperationDef> {
        self.operations.iter().find(|op| op.name == name)
    }
}

impl fmt::Debug for TypeDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDefinition")
            .field("key", &self.key)
            .field("kind", &self.kind)
            .field("visibility", &self.visibility)
            .field("supertypes", &self.supertypes)
            .field("markers", &self.markers)
            .field("constructors", &self.constructors.len())
            .field("factory_methods", &self.factory_methods)
            .field("members", &self.members)
            .field("operations", &self.operations)
            .field("post_processor", &self.is_post_processor())
            .field("interceptor", &self.is_interceptor())
            .field("proxy", &self.is_proxied())
            .finish()
    }
}
