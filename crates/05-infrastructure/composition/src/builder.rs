//! 应用构建器

use crate::application::Application;
use crate::config_sources::{ConfigSourceDescriptor, ConfigSourceType, LayeredPropertySource};
use config_abstractions::PropertySource;
use config_impl::ConfigProperties;
use di_abstractions::{MarkerDefinition, TypeCatalog, TypeDefinition, TypeScanner};
use di_impl::ContextBuilder;
use infrastructure_common::{InfrastructureError, TypeKey};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// 应用构建器
///
/// 组装属性源、类型目录、扫描根和日志配置，启动组件容器。
pub struct ApplicationBuilder {
    /// 配置源，后加入的优先
    config_sources: LayeredPropertySource,
    /// 显式设置的属性，优先级最高
    overrides: ConfigProperties,
    catalog: TypeCatalog,
    scan_roots: Vec<String>,
    imports: Vec<TypeKey>,
    scanner: Option<Arc<dyn TypeScanner>>,
    /// 是否启用日志初始化
    logging_enabled: bool,
    logging_config: LoggingConfig,
}

impl ApplicationBuilder {
    /// 创建构建器，默认没有任何配置源
    pub fn new() -> Self {
        Self {
            config_sources: LayeredPropertySource::new(),
            overrides: ConfigProperties::new().with_name("overrides"),
            catalog: TypeCatalog::new(),
            scan_roots: Vec::new(),
            imports: Vec::new(),
            scanner: None,
            logging_enabled: false, // 默认不初始化日志，避免测试中重复初始化
            logging_config: LoggingConfig::default(),
        }
    }

    /// 添加配置文件，支持 TOML、JSON、YAML
    pub fn add_config_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, InfrastructureError> {
        self.config_sources.push_file(path)?;
        Ok(self)
    }

    /// 添加环境变量配置源
    pub fn add_config_env_vars<S: Into<String>>(mut self, prefix: S) -> Self {
        self.config_sources.push_env(&prefix.into());
        self
    }

    /// 添加自定义属性源
    pub fn add_property_source<T: PropertySource + 'static>(mut self, source: T) -> Self {
        info!("添加自定义属性源: {}", source.name());
        let descriptor = ConfigSourceDescriptor {
            source_type: ConfigSourceType::Custom,
            location: source.name().to_string(),
        };
        self.config_sources.push(descriptor, Arc::new(source));
        self
    }

    /// 设置单个属性，覆盖所有配置源
    pub fn property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.overrides.set(key, value);
        self
    }

    /// 替换类型目录
    pub fn catalog(mut self, catalog: TypeCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// 登记类型
    pub fn register_type(mut self, definition: TypeDefinition) -> Result<Self, InfrastructureError> {
        self.catalog.register(definition)?;
        Ok(self)
    }

    /// 登记复合标记
    pub fn register_marker(mut self, definition: MarkerDefinition) -> Result<Self, InfrastructureError> {
        self.catalog.register_marker(definition)?;
        Ok(self)
    }

    /// 添加扫描根
    pub fn scan<S: Into<String>>(mut self, root: S) -> Self {
        let root = root.into();
        debug!("添加扫描根: {}", root);
        self.scan_roots.push(root);
        self
    }

    /// 引入扫描根之外的类型
    pub fn import(mut self, key: impl Into<TypeKey>) -> Self {
        self.imports.push(key.into());
        self
    }

    /// 自定义类型扫描器
    pub fn with_scanner<T: TypeScanner + 'static>(mut self, scanner: T) -> Self {
        debug!("使用类型扫描器: {}", scanner.name());
        self.scanner = Some(Arc::new(scanner));
        self
    }

    /// 自动配置开发环境
    pub fn auto_configure_development(mut self) -> Result<Self, InfrastructureError> {
        info!("自动配置开发环境");
        for path in ["./config.dev.toml", "./application-dev.yaml"] {
            if Path::new(path).exists() {
                self.config_sources.push_file(path)?;
            }
        }
        Ok(self.with_logging(LoggingConfig::development()))
    }

    /// 自动配置生产环境
    pub fn auto_configure_production(mut self) -> Result<Self, InfrastructureError> {
        info!("自动配置生产环境");
        for path in ["./config.prod.toml", "./application-prod.yaml"] {
            if Path::new(path).exists() {
                self.config_sources.push_file(path)?;
            }
        }
        Ok(self.with_logging(LoggingConfig::production()))
    }

    /// 配置日志
    pub fn with_logging(mut self, config: LoggingConfig) -> Self {
        self.logging_config = config;
        self.logging_enabled = true;
        self
    }

    /// 构建并启动应用
    pub fn build(self) -> Result<Application, InfrastructureError> {
        if self.logging_enabled {
            self.logging_config.init()?;
        }
        info!("开始构建应用");

        let mut config = self.config_sources;
        if !self.overrides.is_empty() {
            config.push(
                ConfigSourceDescriptor {
                    source_type: ConfigSourceType::Memory,
                    location: "overrides".to_string(),
                },
                Arc::new(self.overrides),
            );
        }
        let source_count = config.len();

        let mut builder = ContextBuilder::new()
            .catalog(self.catalog)
            .config(Arc::new(config));
        for root in self.scan_roots {
            builder = builder.scan(root);
        }
        for key in self.imports {
            builder = builder.import(key);
        }
        if let Some(scanner) = self.scanner {
            builder = builder.scanner(scanner);
        }

        let context = builder.build()?;
        info!("应用构建完成, 配置源 {} 个", source_count);
        Ok(Application::new(Arc::new(context), source_count))
    }
}

impl Default for ApplicationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// 日志配置
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: tracing::Level,
    /// 过滤指令，形如 `di_impl=debug`，优先于 `level`
    pub filter: Option<String>,
    /// 是否显示目标
    pub show_target: bool,
    /// 是否显示线程ID
    pub show_thread_ids: bool,
    /// 是否显示文件名
    pub show_file: bool,
    /// 是否显示行号
    pub show_line_number: bool,
    /// 是否使用 JSON 格式
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: tracing::Level::INFO,
            filter: None,
            show_target: true,
            show_thread_ids: false,
            show_file: false,
            show_line_number: false,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// 创建开发环境日志配置
    pub fn development() -> Self {
        Self {
            level: tracing::Level::DEBUG,
            filter: None,
            show_target: true,
            show_thread_ids: true,
            show_file: true,
            show_line_number: true,
            json_format: false,
        }
    }

    /// 创建生产环境日志配置
    pub fn production() -> Self {
        Self {
            level: tracing::Level::INFO,
            filter: None,
            show_target: false,
            show_thread_ids: false,
            show_file: false,
            show_line_number: false,
            json_format: true,
        }
    }

    /// 日志过滤指令，例如 `info,di_impl=debug`
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// 初始化全局日志订阅器
    pub fn init(&self) -> Result<(), InfrastructureError> {
        let directive = self
            .filter
            .clone()
            .unwrap_or_else(|| self.level.to_string().to_lowercase());
        let filter = tracing_subscriber::EnvFilter::try_new(&directive).map_err(|e| {
            InfrastructureError::BootstrapFailed {
                message: format!("日志过滤指令无效 '{}': {}", directive, e),
            }
        })?;

        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(self.show_target)
            .with_thread_ids(self.show_thread_ids)
            .with_file(self.show_file)
            .with_line_number(self.show_line_number);

        if self.json_format {
            subscriber.json().try_init()
        } else {
            subscriber.try_init()
        }
        .map_err(|e| InfrastructureError::BootstrapFailed {
            message: format!("日志初始化失败: {}", e),
        })?;

        info!("日志系统初始化完成");
        Ok(())
    }
}
