//! # 基础设施组合层
//!
//! 把属性源、类型目录和组件容器组合成一个可运行的应用。
//!
//! ## 主要功能
//!
//! - **应用构建器**: 使用构建者模式组装配置源、类型和扫描根
//! - **分层配置源**: 配置文件、环境变量、显式属性按顺序叠加
//! - **日志初始化**: 开发和生产两套预设
//! - **生命周期管理**: 启动时完成全部组件的创建，停止时调用关闭钩子
//!
//! ## 基本使用
//!
//! ```rust,no_run
//! use infrastructure_composition::{ApplicationBuilder, LoggingConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let application = ApplicationBuilder::new()
//!         .add_config_file("application.yaml")?
//!         .add_config_env_vars("APP")
//!         .with_logging(LoggingConfig::development())
//!         .scan("my_app::services")
//!         .build()?;
//!
//!     println!("组件: {:?}", application.component_names());
//!
//!     application.stop()?;
//!     Ok(())
//! }
//! ```

pub mod application;
pub mod builder;
pub mod config_sources;

pub use application::{Application, ApplicationMetrics, ApplicationStatus};
pub use builder::{ApplicationBuilder, LoggingConfig};
pub use config_sources::{ConfigSourceDescriptor, ConfigSourceType, LayeredPropertySource};

// 重新导出错误类型
pub use infrastructure_common::InfrastructureError;
