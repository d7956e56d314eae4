//! 错误类型定义

use thiserror::Error;

/// 跨 crate 传递的装箱错误
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 配置文件无法读取
    #[error("配置文件读取失败: {source}")]
    FileReadError {
        #[from]
        source: std::io::Error,
    },

    /// 配置文档格式错误
    #[error("配置解析失败: {source}")]
    ParseError { source: BoxError },

    /// 必需的配置键缺失
    #[error("配置键不存在: {key}")]
    KeyNotFound { key: String },

    /// 属性表达式语法错误
    #[error("配置表达式无效: {expression}, 原因: {reason}")]
    InvalidExpression { expression: String, reason: String },

    /// 配置值无法转换为目标类型
    #[error("配置类型转换失败: {key} = {value:?} 无法转换为 {target}")]
    TypeConversionError {
        key: String,
        value: String,
        target: String,
    },
}

impl ConfigError {
    /// 创建解析错误
    pub fn parse(source: impl Into<BoxError>) -> Self {
        Self::ParseError {
            source: source.into(),
        }
    }

    /// 创建表达式错误
    pub fn invalid_expression(expression: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidExpression {
            expression: expression.into(),
            reason: reason.into(),
        }
    }
}

/// 组件定义错误类型
///
/// 在描述符构建或属性注入阶段，任何实例存在之前检测到，总是致命的。
#[derive(Error, Debug)]
pub enum ComponentError {
    /// 两个组件使用了同一个名称
    #[error("组件名称重复: {name}")]
    DuplicateName { name: String },

    /// 同一类型被登记两次
    #[error("类型重复注册: {type_name}")]
    DuplicateType { type_name: String },

    /// 类型目录中找不到该类型
    #[error("类型未注册: {type_name}")]
    TypeNotFound { type_name: String },

    /// 类型无法实例化
    #[error("组件类型不可实例化: {type_name}, 原因: {reason}")]
    NotConstructible { type_name: String, reason: String },

    /// 无法选出唯一的构造方式
    #[error("组件构造方式不唯一: {type_name}, 原因: {reason}")]
    AmbiguousConstructor { type_name: String, reason: String },

    /// 工厂方法声明不合法
    #[error("工厂方法无效: {type_name}.{method}, 原因: {reason}")]
    InvalidFactoryMethod {
        type_name: String,
        method: String,
        reason: String,
    },

    /// 参数或成员的绑定标记不合法
    #[error("绑定标记无效: 组件 '{component}' 的 {target}, 原因: {reason}")]
    InvalidBinding {
        component: String,
        target: String,
        reason: String,
    },

    /// 注入成员声明不合法
    #[error("注入成员无效: 组件 '{component}' 的 {member}, 原因: {reason}")]
    InvalidMember {
        component: String,
        member: String,
        reason: String,
    },

    /// 生命周期方法声明不合法
    #[error("生命周期方法无效: {type_name}.{hook}, 原因: {reason}")]
    InvalidLifecycleHook {
        type_name: String,
        hook: String,
        reason: String,
    },

    /// 同一标记重复出现
    #[error("标记 {marker} 在类型 {type_name} 上重复出现")]
    DuplicateMarker { type_name: String, marker: String },

    /// 复合标记互相引用
    #[error("检测到循环标记: {chain}")]
    MarkerCycle { chain: String },

    /// 引用了不存在的拦截器组件
    #[error("组件 '{component}' 引用的拦截器 '{interceptor}' 不存在")]
    UnknownInterceptor {
        component: String,
        interceptor: String,
    },

    /// 类型定义不合法
    #[error("组件定义无效: {type_name}, 原因: {reason}")]
    InvalidDefinition { type_name: String, reason: String },
}

/// 依赖解析错误类型
///
/// 启动期间致命；启动之后作为类型化错误返回给调用方。
#[derive(Error, Debug)]
pub enum DependencyError {
    /// 按名称找不到组件
    #[error("组件不存在: {name}")]
    NotFound { name: String },

    /// 按类型找不到组件
    #[error("类型 {type_name} 没有对应的组件")]
    NoComponentOfType { type_name: String },

    /// 组件类型与请求的类型不符
    #[error("组件类型不匹配: '{name}' 期望 {expected}, 实际 {actual}")]
    TypeMismatch {
        name: String,
        expected: String,
        actual: String,
    },

    /// 按类型查找时有多个候选且无法决出
    #[error("类型 {type_name} 存在多个组件 ({candidates}), 且{reason}")]
    NoUniqueComponent {
        type_name: String,
        candidates: String,
        reason: String,
    },

    /// 必需的依赖无法满足
    #[error("组件 '{component}' 缺少必需依赖: {dependency}")]
    MissingDependency {
        component: String,
        dependency: String,
    },

    /// 引导阶段的组件依赖了普通组件
    #[error("组件 '{component}' 在引导阶段不能依赖尚未创建的组件 '{dependency}'")]
    BootstrapDependency {
        component: String,
        dependency: String,
    },

    /// 依赖之间形成环
    #[error("循环依赖检测到: 组件 '{name}', 依赖链: {chain}")]
    CircularDependency { name: String, chain: String },

    /// 读取配置值失败
    #[error("组件 '{component}' 读取配置失败: {source}")]
    Configuration {
        component: String,
        #[source]
        source: ConfigError,
    },

    /// 构造、注入或生命周期方法执行失败
    #[error("组件 '{component}' 在 {phase} 阶段失败: {source}")]
    CreationFailed {
        component: String,
        phase: String,
        source: BoxError,
    },

    /// 组件尚未创建完成
    #[error("组件 '{name}' 在当前阶段尚未实例化")]
    InstanceNotReady { name: String },

    /// 拦截器组件没有实现拦截器接口
    #[error("组件 '{component}' 的拦截器 '{interceptor}' 未实现拦截器接口")]
    InvalidInterceptor {
        component: String,
        interceptor: String,
    },

    /// 组件定义错误
    #[error("组件定义无效: {source}")]
    Definition {
        #[from]
        source: ComponentError,
    },

    /// 容器已关闭后仍被访问
    #[error("容器已关闭")]
    ContextClosed,
}

impl DependencyError {
    /// 创建调用失败错误
    pub fn creation_failed(
        component: impl Into<String>,
        phase: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        Self::CreationFailed {
            component: component.into(),
            phase: phase.into(),
            source: source.into(),
        }
    }

    /// 是否为"未找到"类错误
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::NoComponentOfType { .. })
    }
}

/// 基础设施错误类型
#[derive(Error, Debug)]
pub enum InfrastructureError {
    /// 配置错误
    #[error("配置错误: {source}")]
    ConfigError {
        #[from]
        source: ConfigError,
    },

    /// 组件定义错误
    #[error("组件定义错误: {source}")]
    ComponentError {
        #[from]
        source: ComponentError,
    },

    /// 依赖解析错误
    #[error("依赖注入错误: {source}")]
    DependencyError {
        #[from]
        source: DependencyError,
    },

    /// 启动失败
    #[error("基础设施启动失败: {message}")]
    BootstrapFailed { message: String },

    /// 关闭失败
    #[error("基础设施关闭失败: {message}")]
    ShutdownFailed { message: String },
}

/// 结果类型别名
pub type ConfigResult<T> = Result<T, ConfigError>;
/// 组件定义结果
pub type ComponentResult<T> = Result<T, ComponentError>;
/// 依赖解析结果
pub type DependencyResult<T> = Result<T, DependencyError>;
/// 基础设施结果
pub type InfrastructureResult<T> = Result<T, InfrastructureError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dependency_error_wraps_definition_error() {
        let error: DependencyError = ComponentError::DuplicateName {
            name: "userService".to_string(),
        }
        .into();
        assert!(matches!(error, DependencyError::Definition { .. }));
        assert!(error.to_string().contains("userService"));
    }

    #[test]
    fn test_infrastructure_error_from_dependency_error() {
        let error: InfrastructureError = DependencyError::ContextClosed.into();
        assert!(matches!(error, InfrastructureError::DependencyError { .. }));
    }

    #[test]
    fn test_creation_failed_keeps_source_message() {
        let error = DependencyError::creation_failed("a", "构造", anyhow::anyhow!("boom"));
        assert!(error.to_string().contains("boom"));
        assert!(!error.is_not_found());
    }
}
