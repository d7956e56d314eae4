//! # 依赖注入具体实现
//!
//! 声明式组件容器：从类型目录中扫描候选类型，构建组件描述符，
//! 解析依赖并创建单例，执行后处理、属性注入和生命周期回调。
//!
//! ## 启动阶段
//!
//! 1. [`DescriptorBuilder`] 把候选类型转换为组件描述符
//! 2. [`ComponentRegistry`] 按名称和类型索引描述符
//! 3. [`ConstructionEngine`] 先创建配置类，再创建后处理器，最后创建其余组件
//! 4. [`PropertyInjector`] 注入字段和 setter
//! 5. [`LifecycleDriver`] 调用就绪钩子
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! use di_impl::AnnotationApplicationContext;
//! use di_abstractions::TypedApplicationContext;
//!
//! let context = AnnotationApplicationContext::builder()
//!     .catalog(catalog)
//!     .scan("my_app::services")
//!     .build()?;
//! let service = context.get_unique::<OrderService>()?;
//! ```

pub mod builder;
pub mod context;
pub mod engine;
pub mod injector;
pub mod lifecycle;
pub mod pipeline;
pub mod proxy;
pub mod registry;
pub mod scanner;

pub use builder::DescriptorBuilder;
pub use context::{AnnotationApplicationContext, ContextBuilder};
pub use engine::ConstructionEngine;
pub use injector::PropertyInjector;
pub use lifecycle::LifecycleDriver;
pub use pipeline::PostProcessorPipeline;
pub use proxy::{dispatch, wrap};
pub use registry::ComponentRegistry;
pub use scanner::CatalogScanner;
