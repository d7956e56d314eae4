//! 配置表达式解析

use infrastructure_common::{ConfigError, ConfigResult};

/// 占位符表达式 `${key}` 或 `${key:default}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyExpr {
    /// 配置键
    pub key: String,
    /// 默认值，本身也可以是表达式
    pub default: Option<String>,
}

impl PropertyExpr {
    /// 解析占位符表达式
    ///
    /// 不是 `${...}` 形式时返回 `Ok(None)`；默认值在第一个 `:` 处切分。
    pub fn parse(s: &str) -> ConfigResult<Option<Self>> {
        let Some(body) = s.strip_prefix("${").and_then(|rest| rest.strip_suffix('}')) else {
            return Ok(None);
        };
        let (key, default) = match body.split_once(':') {
            Some((key, default)) => (key, Some(default.to_string())),
            None => (body, None),
        };
        if key.is_empty() {
            return Err(ConfigError::invalid_expression(s, "配置键为空"));
        }
        Ok(Some(Self {
            key: key.to_string(),
            default,
        }))
    }

    /// 解析值绑定表达式
    ///
    /// 除 `${key:default}` 外还接受裸写的 `key:default` 与 `key`。
    pub fn parse_binding(s: &str) -> ConfigResult<Self> {
        let normalized = if s.starts_with("${") {
            s.to_string()
        } else {
            format!("${{{}}}", s)
        };
        Self::parse(&normalized)?
            .ok_or_else(|| ConfigError::invalid_expression(s, "缺少右花括号"))
    }
}

impl std::fmt::Display for PropertyExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.default {
            Some(default) => write!(f, "${{{}:{}}}", self.key, default),
            None => write!(f, "${{{}}}", self.key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_placeholder() {
        assert_eq!(PropertyExpr::parse("plain").unwrap(), None);
        assert_eq!(
            PropertyExpr::parse("${app.name}").unwrap(),
            Some(PropertyExpr {
                key: "app.name".into(),
                default: None
            })
        );
        let expr = PropertyExpr::parse("${db.url:jdbc:h2:mem}").unwrap().unwrap();
        assert_eq!(expr.key, "db.url");
        assert_eq!(expr.default.as_deref(), Some("jdbc:h2:mem"));
    }

    #[test]
    fn test_parse_nested_default() {
        let expr = PropertyExpr::parse("${a:${b:c}}").unwrap().unwrap();
        assert_eq!(expr.key, "a");
        assert_eq!(expr.default.as_deref(), Some("${b:c}"));
    }

    #[test]
    fn test_parse_rejects_empty_key() {
        assert!(matches!(
            PropertyExpr::parse("${:x}"),
            Err(ConfigError::InvalidExpression { .. })
        ));
    }

    #[test]
    fn test_parse_binding_accepts_bare_form() {
        let expr = PropertyExpr::parse_binding("x.y:default").unwrap();
        assert_eq!(expr.key, "x.y");
        assert_eq!(expr.default.as_deref(), Some("default"));
        assert_eq!(expr.to_string(), "${x.y:default}");

        let expr = PropertyExpr::parse_binding("server.port").unwrap();
        assert_eq!(expr.default, None);
        assert!(PropertyExpr::parse_binding("${unterminated").is_err());
    }
}
