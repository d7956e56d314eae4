//! 声明式标记

use infrastructure_common::TypeKey;

/// 类型级标记
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Marker {
    /// 组件标记，可选显式名称
    Component(Option<String>),
    /// 配置类标记；配置类本身也是组件，其工厂方法会产生额外组件
    Configuration(Option<String>),
    /// 排序权重，数值越小越靠前
    Order(i32),
    /// 按类型查找时的优先候选
    Primary,
    /// 挂载到该组件上的拦截器组件名称
    Around(Vec<String>),
    /// 用户自定义的复合标记，通过 [`MarkerDefinition`] 解析
    Stereotype { key: String, name: Option<String> },
    /// 显式引入扫描根之外的类型
    Import(Vec<TypeKey>),
}

impl Marker {
    /// 匿名组件标记
    pub fn component() -> Self {
        Self::Component(None)
    }

    /// 带名称的组件标记
    pub fn component_named(name: impl Into<String>) -> Self {
        Self::Component(Some(name.into()))
    }

    /// 复合标记
    pub fn stereotype(key: impl Into<String>) -> Self {
        Self::Stereotype {
            key: key.into(),
            name: None,
        }
    }

    /// 带名称的复合标记
    pub fn stereotype_named(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Stereotype {
            key: key.into(),
            name: Some(name.into()),
        }
    }

    /// 标记名称，用于错误信息
    pub fn label(&self) -> String {
        match self {
            Self::Component(_) => "Component".to_string(),
            Self::Configuration(_) => "Configuration".to_string(),
            Self::Order(_) => "Order".to_string(),
            Self::Primary => "Primary".to_string(),
            Self::Around(_) => "Around".to_string(),
            Self::Stereotype { key, .. } => key.clone(),
            Self::Import(_) => "Import".to_string(),
        }
    }
}

/// 复合标记定义
///
/// 例如 `Controller` 标记本身带有 `Component` 标记，
/// 于是带 `Controller` 的类型也被视为组件。
#[derive(Debug, Clone)]
pub struct MarkerDefinition {
    /// 标记名称
    pub key: String,
    /// 该标记本身带有的标记
    pub markers: Vec<Marker>,
}

impl MarkerDefinition {
    /// 创建不带元标记的复合标记
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            markers: Vec::new(),
        }
    }

    /// 添加元标记
    pub fn marked(mut self, marker: Marker) -> Self {
        self.markers.push(marker);
        self
    }
}

/// 操作级标记
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationMarker {
    /// 依赖注入完成后调用
    PostConstruct,
    /// 容器关闭时调用
    PreDestroy,
}

impl std::fmt::Display for OperationMarker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PostConstruct => f.write_str("PostConstruct"),
            Self::PreDestroy => f.write_str("PreDestroy"),
        }
    }
}

/// 工厂方法标记
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BeanMarker {
    /// 组件名称，默认取方法名
    pub name: Option<String>,
    /// 就绪钩子的操作名称
    pub init: Option<String>,
    /// 关闭钩子的操作名称
    pub destroy: Option<String>,
}
