//! 配置文档与环境变量加载

use infrastructure_common::{ConfigError, ConfigResult};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// 配置文档格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// `.yaml` / `.yml`
    Yaml,
    /// `.toml`
    Toml,
    /// `.json`
    Json,
}

impl DocumentFormat {
    /// 根据文件扩展名推断格式
    pub fn from_path(path: &Path) -> ConfigResult<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("yml" | "yaml") => Ok(Self::Yaml),
            Some("toml") => Ok(Self::Toml),
            Some("json") => Ok(Self::Json),
            _ => Err(ConfigError::parse(format!(
                "无法识别的配置文件格式: {}",
                path.display()
            ))),
        }
    }
}

/// 解析配置文档并展开为点分隔的扁平键值
///
/// 嵌套表展开为 `a.b.c`，数组以逗号连接，空值被忽略。
pub fn parse_document(content: &str, format: DocumentFormat) -> ConfigResult<BTreeMap<String, String>> {
    let document = match format {
        DocumentFormat::Yaml => {
            if content.trim().is_empty() {
                Value::Null
            } else {
                serde_yaml::from_str::<Value>(content).map_err(ConfigError::parse)?
            }
        }
        DocumentFormat::Toml => {
            let table = toml::from_str::<toml::Value>(content).map_err(ConfigError::parse)?;
            toml_to_json(&table)
        }
        DocumentFormat::Json => serde_json::from_str::<Value>(content).map_err(ConfigError::parse)?,
    };

    let mut flat = BTreeMap::new();
    flatten(&document, String::new(), &mut flat);
    Ok(flat)
}

/// 从文件加载配置文档
pub fn load_document(path: impl AsRef<Path>) -> ConfigResult<BTreeMap<String, String>> {
    let path = path.as_ref();
    let format = DocumentFormat::from_path(path)?;
    debug!("加载配置文件: {} ({:?})", path.display(), format);
    let content = std::fs::read_to_string(path)?;
    let flat = parse_document(&content, format)?;
    debug!("配置文件加载完成, 共 {} 个键", flat.len());
    Ok(flat)
}

/// 读取环境变量
///
/// 指定前缀时只保留匹配的变量，并把 `PREFIX_SERVER_PORT` 转换为 `server.port`；
/// 未指定前缀时原样保留所有变量名。
pub fn environment_properties(prefix: Option<&str>) -> BTreeMap<String, String> {
    let vars: BTreeMap<String, String> = std::env::vars()
        .filter_map(|(key, value)| match prefix {
            None => Some((key, value)),
            Some(prefix) => env_key_to_config_key(&key, prefix).map(|key| (key, value)),
        })
        .collect();
    debug!("加载了 {} 个环境变量", vars.len());
    vars
}

fn env_key_to_config_key(env_key: &str, prefix: &str) -> Option<String> {
    let key = env_key.strip_prefix(prefix)?.trim_start_matches('_');
    if key.is_empty() {
        return None;
    }
    Some(key.replace('_', ".").to_lowercase())
}

fn flatten(value: &Value, prefix: String, out: &mut BTreeMap<String, String>) {
    match value {
        Value::Null => {}
        Value::Object(map) => {
            for (key, nested) in map {
                let full_key = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", prefix, key)
                };
                flatten(nested, full_key, out);
            }
        }
        Value::Array(items) => {
            let joined = items
                .iter()
                .filter_map(scalar_to_string)
                .collect::<Vec<_>>()
                .join(",");
            out.insert(prefix, joined);
        }
        other => {
            if let Some(text) = scalar_to_string(other) {
                out.insert(prefix, text);
            }
        }
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// 将 TOML 值转换为 JSON 值
fn toml_to_json(value: &toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s.clone()),
        toml::Value::Integer(i) => Value::Number(serde_json::Number::from(*i)),
        toml::Value::Float(f) => serde_json::Number::from_f64(*f)
            .map_or_else(|| Value::String(f.to_string()), Value::Number),
        toml::Value::Boolean(b) => Value::Bool(*b),
        toml::Value::Array(arr) => Value::Array(arr.iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .iter()
                .map(|(k, v)| (k.clone(), toml_to_json(v)))
                .collect(),
        ),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
    }
}
