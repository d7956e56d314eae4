//! 属性源抽象接口

use crate::expression::PropertyExpr;
use infrastructure_common::{ConfigError, ConfigResult, Scalar, ScalarType};

/// 占位符递归解析的最大深度
pub const MAX_RESOLVE_DEPTH: usize = 32;

/// 属性源 trait
///
/// 容器通过它解析值绑定。实现者只需提供原始键值查找，
/// 占位符展开与类型转换由默认方法完成。
pub trait PropertySource: Send + Sync {
    /// 属性源名称
    fn name(&self) -> &str;

    /// 原始值，不展开占位符
    fn get_raw(&self, key: &str) -> Option<String>;

    /// 所有键
    fn keys(&self) -> Vec<String>;

    /// 检查配置键是否存在
    fn contains(&self, key: &str) -> bool {
        self.get_raw(key).is_some()
    }

    /// 获取字符串值
    ///
    /// `key` 可以是普通键，也可以是 `${key}` / `${key:default}` 表达式；
    /// 取到的值若本身是表达式会继续展开。
    fn get_string(&self, key: &str) -> ConfigResult<Option<String>> {
        resolve_key(self, key, 0)
    }

    /// 获取字符串值，缺失时使用默认值（默认值同样会展开）
    fn get_string_or(&self, key: &str, default: &str) -> ConfigResult<String> {
        match resolve_key(self, key, 0)? {
            Some(value) => Ok(value),
            None => resolve_value(self, default, 0),
        }
    }

    /// 获取必需的字符串值
    fn get_required_string(&self, key: &str) -> ConfigResult<String> {
        self.get_string(key)?.ok_or_else(|| ConfigError::KeyNotFound {
            key: key.to_string(),
        })
    }

    /// 获取类型化的值
    fn get(&self, key: &str, ty: ScalarType) -> ConfigResult<Option<Scalar>> {
        self.get_string(key)?
            .map(|raw| ty.convert(key, &raw))
            .transpose()
    }

    /// 获取必需的类型化值
    fn get_required(&self, key: &str, ty: ScalarType) -> ConfigResult<Scalar> {
        self.get(key, ty)?.ok_or_else(|| ConfigError::KeyNotFound {
            key: key.to_string(),
        })
    }

    /// 解析值绑定表达式并转换为目标类型
    ///
    /// 表达式可写作 `${key:default}`、`key:default` 或 `key`，
    /// 没有默认值且键缺失时返回 [`ConfigError::KeyNotFound`]。
    fn resolve_binding(&self, expression: &str, ty: ScalarType) -> ConfigResult<Scalar> {
        let expr = PropertyExpr::parse_binding(expression)?;
        let raw = resolve_expr(self, &expr, 0)?;
        ty.convert(&expr.key, &raw)
    }
}

fn check_depth(expression: &str, depth: usize) -> ConfigResult<()> {
    if depth > MAX_RESOLVE_DEPTH {
        return Err(ConfigError::invalid_expression(
            expression,
            format!("占位符嵌套超过 {} 层", MAX_RESOLVE_DEPTH),
        ));
    }
    Ok(())
}

fn resolve_key<S: PropertySource + ?Sized>(
    source: &S,
    key: &str,
    depth: usize,
) -> ConfigResult<Option<String>> {
    check_depth(key, depth)?;
    if let Some(expr) = PropertyExpr::parse(key)? {
        return resolve_expr(source, &expr, depth + 1).map(Some);
    }
    source
        .get_raw(key)
        .map(|value| resolve_value(source, &value, depth + 1))
        .transpose()
}

fn resolve_expr<S: PropertySource + ?Sized>(
    source: &S,
    expr: &PropertyExpr,
    depth: usize,
) -> ConfigResult<String> {
    check_depth(&expr.key, depth)?;
    match resolve_key(source, &expr.key, depth + 1)? {
        Some(value) => Ok(value),
        None => match &expr.default {
            Some(default) => resolve_value(source, default, depth + 1),
            None => Err(ConfigError::KeyNotFound {
                key: expr.key.clone(),
            }),
        },
    }
}

fn resolve_value<S: PropertySource + ?Sized>(
    source: &S,
    value: &str,
    depth: usize,
) -> ConfigResult<String> {
    check_depth(value, depth)?;
    match PropertyExpr::parse(value)? {
        Some(expr) => resolve_expr(source, &expr, depth + 1),
        None => Ok(value.to_string()),
    }
}
