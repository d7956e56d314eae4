//! 内存属性表

use crate::providers::{environment_properties, load_document, parse_document, DocumentFormat};
use config_abstractions::PropertySource;
use infrastructure_common::ConfigResult;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// 配置属性
///
/// 扁平的键值表。后加入的来源覆盖先加入的同名键。
#[derive(Debug, Clone)]
pub struct ConfigProperties {
    name: String,
    properties: BTreeMap<String, String>,
}

impl ConfigProperties {
    /// 创建空属性表
    pub fn new() -> Self {
        Self {
            name: "ConfigProperties".to_string(),
            properties: BTreeMap::new(),
        }
    }

    /// 从键值对创建
    pub fn from_map<K, V>(map: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut properties = Self::new();
        properties.add_all(map);
        properties
    }

    /// 以全部环境变量为基础创建
    pub fn with_env() -> Self {
        let mut properties = Self::new();
        properties.add_all(environment_properties(None));
        properties
    }

    /// 从 YAML 文本创建
    pub fn from_yaml_str(content: &str) -> ConfigResult<Self> {
        Ok(Self::from_map(parse_document(content, DocumentFormat::Yaml)?))
    }

    /// 从 TOML 文本创建
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        Ok(Self::from_map(parse_document(content, DocumentFormat::Toml)?))
    }

    /// 从 JSON 文本创建
    pub fn from_json_str(content: &str) -> ConfigResult<Self> {
        Ok(Self::from_map(parse_document(content, DocumentFormat::Json)?))
    }

    /// 从文件创建，格式由扩展名决定
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let mut properties = Self::from_map(load_document(path)?);
        properties.name = path.display().to_string();
        Ok(properties)
    }

    /// 设置名称
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// 设置单个键
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// 批量加入键值对
    pub fn add_all<K, V>(&mut self, map: impl IntoIterator<Item = (K, V)>) -> &mut Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.properties
            .extend(map.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// 加入带前缀的环境变量，`PREFIX_SERVER_PORT` 映射为 `server.port`
    pub fn add_env_prefixed(&mut self, prefix: &str) -> &mut Self {
        self.add_all(environment_properties(Some(prefix)))
    }

    /// 合并另一份属性，对方的值优先
    pub fn merge(&mut self, other: &ConfigProperties) -> &mut Self {
        debug!("合并配置 {} -> {}, 共 {} 个键", other.name, self.name, other.len());
        self.add_all(other.properties.clone())
    }

    /// 键的个数
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// 是否没有任何键
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// 原始键值表
    pub fn to_map(&self) -> BTreeMap<String, String> {
        self.properties.clone()
    }
}

impl Default for ConfigProperties {
    fn default() -> Self {
        Self::new()
    }
}

impl PropertySource for ConfigProperties {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_raw(&self, key: &str) -> Option<String> {
        self.properties.get(key).cloned()
    }

    fn keys(&self) -> Vec<String> {
        self.properties.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use infrastructure_common::{ConfigError, Scalar, ScalarType};
    use std::io::Write;

    #[test]
    fn test_merge_later_source_wins() {
        let mut base = ConfigProperties::from_yaml_str("server:\n  port: 8080\n  host: localhost\n").unwrap();
        let overrides = ConfigProperties::from_map([("server.port", "9090")]);
        base.merge(&overrides);

        assert_eq!(base.get_string("server.port").unwrap().as_deref(), Some("9090"));
        assert_eq!(base.get_string("server.host").unwrap().as_deref(), Some("localhost"));
    }

    #[test]
    fn test_default_value_binding() {
        let mut props = ConfigProperties::new();
        assert_eq!(
            props.resolve_binding("x.y:default", ScalarType::String).unwrap(),
            Scalar::Str("default".into())
        );

        props.set("x.y", "configured");
        assert_eq!(
            props.resolve_binding("${x.y:default}", ScalarType::String).unwrap(),
            Scalar::Str("configured".into())
        );
    }

    #[test]
    fn test_typed_lookup_from_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[pool]\nsize = 16\nnames = [\"a\", \"b\"]").unwrap();

        let props = ConfigProperties::from_file(file.path()).unwrap();
        assert_eq!(
            props.get_required("pool.size", ScalarType::Usize).unwrap(),
            Scalar::UInt(16)
        );
        assert_eq!(
            props.get_required("pool.names", ScalarType::List).unwrap(),
            Scalar::List(vec!["a".into(), "b".into()])
        );
        assert!(matches!(
            props.get_required("pool.missing", ScalarType::I32),
            Err(ConfigError::KeyNotFound { .. })
        ));
    }

    #[test]
    fn test_env_prefixed_properties() {
        std::env::set_var("LORN_CFG_TEST_FEATURE_ENABLED", "true");
        let mut props = ConfigProperties::new();
        props.add_env_prefixed("LORN_CFG_TEST");
        assert_eq!(
            props.get("feature.enabled", ScalarType::Bool).unwrap(),
            Some(Scalar::Bool(true))
        );
    }
}
