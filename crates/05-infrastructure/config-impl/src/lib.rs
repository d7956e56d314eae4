//! # Configuration Implementation
//!
//! 属性源的具体实现。
//!
//! ## 主要组件
//!
//! - [`ConfigProperties`] - 扁平键值属性表，实现 [`config_abstractions::PropertySource`]
//! - [`parse_document`] / [`load_document`] - YAML、TOML、JSON 文档加载
//! - [`environment_properties`] - 环境变量加载

pub mod properties;
pub mod providers;

pub use properties::*;
pub use providers::*;
