//! 分层配置源
//!
//! 多个属性源按加入顺序叠加，后加入的覆盖先加入的同名键。

use config_abstractions::PropertySource;
use config_impl::ConfigProperties;
use infrastructure_common::{ConfigError, InfrastructureError};
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// 配置源类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSourceType {
    /// TOML 文件
    Toml,
    /// JSON 文件
    Json,
    /// YAML 文件
    Yaml,
    /// 环境变量
    Environment,
    /// 内存配置
    Memory,
    /// 调用方提供的属性源
    Custom,
}

impl ConfigSourceType {
    /// 按扩展名判断文件类型
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }
}

/// 配置源描述
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSourceDescriptor {
    /// 配置源种类
    pub source_type: ConfigSourceType,
    /// 文件路径、环境变量前缀或属性源名称
    pub location: String,
}

impl fmt::Display for ConfigSourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self.source_type, self.location)
    }
}

/// 分层属性源
#[derive(Default, Clone)]
pub struct LayeredPropertySource {
    layers: Vec<(ConfigSourceDescriptor, Arc<dyn PropertySource>)>,
}

impl LayeredPropertySource {
    /// 创建空的分层属性源
    pub fn new() -> Self {
        Self::default()
    }

    /// 叠加一层
    pub fn push(&mut self, descriptor: ConfigSourceDescriptor, source: Arc<dyn PropertySource>) {
        debug!("叠加配置源: {} ({} 个键)", descriptor, source.keys().len());
        self.layers.push((descriptor, source));
    }

    /// 叠加配置文件，格式由扩展名决定
    pub fn push_file(&mut self, path: impl AsRef<Path>) -> Result<(), InfrastructureError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(InfrastructureError::BootstrapFailed {
                message: format!("配置文件不存在: {}", path.display()),
            });
        }
        let source_type =
            ConfigSourceType::from_path(path).ok_or_else(|| ConfigError::ParseError {
                source: format!("不支持的配置文件格式: {}", path.display()).into(),
            })?;

        info!("添加配置文件: {}", path.display());
        let properties = ConfigProperties::from_file(path)?;
        self.push(
            ConfigSourceDescriptor {
                source_type,
                location: path.display().to_string(),
            },
            Arc::new(properties),
        );
        Ok(())
    }

    /// 叠加带前缀的环境变量
    pub fn push_env(&mut self, prefix: &str) {
        info!("添加环境变量配置源, 前缀: {}", prefix);
        let mut properties = ConfigProperties::new().with_name(format!("env:{}", prefix));
        properties.add_env_prefixed(prefix);
        self.push(
            ConfigSourceDescriptor {
                source_type: ConfigSourceType::Environment,
                location: prefix.to_string(),
            },
            Arc::new(properties),
        );
    }

    /// 已叠加的配置源，按加入顺序
    pub fn descriptors(&self) -> Vec<&ConfigSourceDescriptor> {
        self.layers.iter().map(|(descriptor, _)| descriptor).collect()
    }

    /// 层数
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// 是否没有任何层
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl PropertySource for LayeredPropertySource {
    fn name(&self) -> &str {
        "LayeredPropertySource"
    }

    fn get_raw(&self, key: &str) -> Option<String> {
        self.layers
            .iter()
            .rev()
            .find_map(|(_, source)| source.get_raw(key))
    }

    fn keys(&self) -> Vec<String> {
        self.layers
            .iter()
            .flat_map(|(_, source)| source.keys())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

impl fmt::Debug for LayeredPropertySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayeredPropertySource")
            .field("layers", &self.descriptors())
            .finish()
    }
}
