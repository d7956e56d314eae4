//! # Configuration Abstractions
//!
//! 配置抽象层，定义容器消费的属性源接口。
//!
//! ## 核心接口
//!
//! - [`PropertySource`] - 属性源接口，提供 `${key:default}` 展开和类型转换
//! - [`PropertyExpr`] - 占位符表达式

pub mod expression;
pub mod provider;

pub use expression::*;
pub use provider::*;
