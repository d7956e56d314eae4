//! # Dependency Injection Abstractions
//!
//! 依赖注入抽象层，定义组件描述、类型内省和容器门面的核心接口。
//!
//! ## 核心接口
//!
//! - [`TypeDefinition`] / [`TypeCatalog`] - 类型内省注册表
//! - [`DeclaredComponent`] / [`BeanMethods`] - 由 `component-macros` 生成的类型定义
//! - [`ComponentDescriptor`] - 组件描述符
//! - [`TypeScanner`] - 类型扫描器接口
//! - [`PostProcessor`] - 组件后处理器接口
//! - [`Interceptor`] - 调用拦截接口
//! - [`ApplicationContext`] - 容器门面接口

pub mod catalog;
pub mod container;
pub mod declared;
pub mod descriptor;
pub mod interceptor;
pub mod introspection;
pub mod markers;
pub mod processor;
pub mod scanner;

pub use catalog::*;
pub use container::*;
pub use declared::{BeanMethods, DeclaredComponent};
pub use descriptor::*;
pub use interceptor::*;
pub use introspection::*;
pub use markers::*;
pub use processor::*;
pub use scanner::*;
