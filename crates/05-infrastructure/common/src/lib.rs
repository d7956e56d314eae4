//! # Infrastructure Common
//!
//! 这个 crate 提供了声明式组件容器各层共用的类型。
//!
//! ## 核心类型
//!
//! - [`TypeKey`] - 组件满足的名义类型
//! - [`Instance`] - 容器内流转的组件实例句柄
//! - [`Value`] / [`Arguments`] - 构造、工厂、生命周期调用的参数和返回值
//! - [`ComponentError`] / [`DependencyError`] / [`ConfigError`] - 分类错误
//!
//! ## 设计原则
//!
//! - 错误可区分：定义错误、解析错误、循环依赖、调用失败各自独立
//! - 不依赖全局状态：容器实例显式传递给需要它的协作者

pub mod errors;
pub mod instance;
pub mod metadata;
pub mod value;

pub use errors::*;
pub use instance::*;
pub use metadata::*;
pub use value::*;
