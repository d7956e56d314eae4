//! # Component Macros
//!
//! 这个 crate 提供了声明式组件定义的过程宏。宏只生成类型定义，
//! 不做任何全局注册：宿主程序通过 `TypeCatalog::register_declared`
//! 显式把类型登记到自己的类型目录中。
//!
//! ## 核心宏
//!
//! - [`component`] - 组件声明
//! - [`configuration`] - 配置类声明
//! - [`beans`] - 配置类的工厂方法
//!
//! `#[autowired]`、`#[value("...")]`、`#[lifecycle(...)]` 和 `#[bean]`
//! 是上述宏识别的辅助标记，展开后会被移除。
//!
//! ## 使用示例
//!
//! ```ignore
//! use component_macros::{beans, component, configuration};
//! use once_cell::sync::OnceCell;
//! use std::sync::Arc;
//!
//! #[component(name = "userService", around("auditInterceptor"))]
//! #[lifecycle(post_construct = "warm_up")]
//! pub struct UserService {
//!     #[autowired]
//!     repository: Arc<UserRepository>,
//!     #[value("users.page-size:20")]
//!     page_size: usize,
//!     #[autowired(optional)]
//!     cache: OnceCell<Arc<dyn Cache>>,
//! }
//!
//! #[configuration]
//! pub struct DataConfig;
//!
//! #[beans]
//! impl DataConfig {
//!     #[bean(init = "connect", destroy = "close")]
//!     fn connection_pool(&self, #[value("db.url")] url: String) -> anyhow::Result<Pool> {
//!         Pool::new(url)
//!     }
//! }
//!
//! let mut catalog = TypeCatalog::new();
//! catalog
//!     .register_declared::<UserService>()?
//!     .register_declared::<DataConfig>()?;
//! ```
//!
//! 生成的代码引用 `di_abstractions` 和 `infrastructure_common`，
//! 使用宏的 crate 需要直接依赖这两个 crate。

use proc_macro::TokenStream;

mod beans;
mod binding;
mod component;
mod lifecycle;
mod utils;

// Re-exports are not allowed in proc-macro crates

/// 组件声明宏
///
/// 为结构体实现 `DeclaredComponent`。带 `#[autowired]` 或 `#[value]`
/// 的字段成为构造参数；类型为 `OnceCell`/`OnceLock` 的标记字段在构造后
/// 作为成员注入；未标记的字段以 `Default::default()` 初始化。
///
/// # 参数
///
/// - `name = "custom_name"` - 组件名称，缺省为首字母小写的类型名
/// - `order = N` - 排序权重
/// - `primary` - 按类型查找时优先
/// - `stereotype = "Service"` - 使用已登记的复合标记
/// - `around("interceptorName", ...)` - 挂载拦截器
/// - `implements(dyn Trait, ...)` - 以 trait 对象形式暴露
/// - `import(Type, ...)` - 显式引入其他类型
/// - `post_processor` / `interceptor` - 组件本身是后置处理器或拦截器
/// - `proxied_as = path::to::wrap` - 挂载拦截器时的类型化代理
///
/// # 示例
///
/// ```ignore
/// #[component(order = 10, implements(dyn Clock))]
/// pub struct SystemClock;
/// ```
#[proc_macro_attribute]
pub fn component(args: TokenStream, input: TokenStream) -> TokenStream {
    component::component_impl(args, input, false)
}

/// 配置类声明宏
///
/// 参数与 [`component`] 相同（`stereotype` 除外）。配置类的工厂方法来自
/// `BeanMethods` 实现，通常由 [`beans`] 生成；没有工厂方法时写空实现即可。
#[proc_macro_attribute]
pub fn configuration(args: TokenStream, input: TokenStream) -> TokenStream {
    component::component_impl(args, input, true)
}

/// 配置类工厂方法宏
///
/// 修饰配置类的固有 impl 块，为其中带 `#[bean]` 的方法生成工厂方法定义。
///
/// # `#[bean]` 参数
///
/// - `name = "beanName"` - 组件名称，缺省为驼峰形式的方法名
/// - `init = "op"` / `destroy = "op"` - 生命周期操作
/// - `primary` - 按类型查找时优先
/// - `order = N` - 排序权重
#[proc_macro_attribute]
pub fn beans(args: TokenStream, input: TokenStream) -> TokenStream {
    if !args.is_empty() {
        return syn::Error::new(proc_macro2::Span::call_site(), "#[beans] 不接受参数")
            .to_compile_error()
            .into();
    }
    beans::beans_impl(input)
}

/// 工厂方法标记，只能出现在 [`beans`] 修饰的 impl 块中
#[proc_macro_attribute]
pub fn bean(_args: TokenStream, input: TokenStream) -> TokenStream {
    misplaced("#[bean] 必须写在 #[beans] 修饰的 impl 块中", input)
}

/// 生命周期标记，必须写在 [`component`] 或 [`configuration`] 之后
#[proc_macro_attribute]
pub fn lifecycle(_args: TokenStream, input: TokenStream) -> TokenStream {
    misplaced("#[lifecycle] 必须写在 #[component] 之后", input)
}

fn misplaced(message: &str, input: TokenStream) -> TokenStream {
    let error = syn::Error::new(proc_macro2::Span::call_site(), message).to_compile_error();
    let input = proc_macro2::TokenStream::from(input);
    quote::quote! { #error #input }.into()
}
