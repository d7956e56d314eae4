//! 应用主入口

use crate::builder::ApplicationBuilder;
use chrono::{DateTime, Utc};
use config_abstractions::PropertySource;
use di_abstractions::{ApplicationContext, TypedApplicationContext};
use di_impl::AnnotationApplicationContext;
use infrastructure_common::{
    DependencyError, FromScalar, InfrastructureResult, ScalarType,
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::sync::Arc;
use tracing::info;

/// 已启动的应用
///
/// 持有组件容器，提供类型化查找、配置读取和运行信息。
pub struct Application {
    context: Arc<AnnotationApplicationContext>,
    status: RwLock<ApplicationStatus>,
    metrics: RwLock<ApplicationMetrics>,
}

impl Application {
    /// 创建应用构建器
    pub fn builder() -> ApplicationBuilder {
        ApplicationBuilder::new()
    }

    pub(crate) fn new(context: Arc<AnnotationApplicationContext>, config_sources_count: usize) -> Self {
        let metrics = ApplicationMetrics {
            context_id: context.id().to_string(),
            start_time: Some(context.started_at()),
            stop_time: None,
            registered_components_count: context.component_names().len(),
            managed_types_count: context.managed_type_names().len(),
            config_sources_count,
        };
        Self {
            context,
            status: RwLock::new(ApplicationStatus::Running),
            metrics: RwLock::new(metrics),
        }
    }

    /// 组件容器
    pub fn context(&self) -> &Arc<AnnotationApplicationContext> {
        &self.context
    }

    /// 按名称获取组件
    pub fn get<T: Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>, DependencyError> {
        self.context.get::<T>(name)
    }

    /// 按类型获取唯一组件
    pub fn resolve<T: Any + Send + Sync>(&self) -> Result<Arc<T>, DependencyError> {
        self.context.get_unique::<T>()
    }

    /// 按类型获取所有组件
    pub fn resolve_all<T: Any + Send + Sync>(&self) -> Result<Vec<Arc<T>>, DependencyError> {
        self.context.get_all::<T>()
    }

    /// 读取配置值
    pub fn get_config<T: FromScalar>(&self, key: &str, ty: ScalarType) -> InfrastructureResult<Option<T>> {
        let Some(scalar) = self.context.config().get(key, ty)? else {
            return Ok(None);
        };
        Ok(T::from_scalar(&scalar))
    }

    /// 已注册的组件名称
    pub fn component_names(&self) -> Vec<String> {
        self.context.component_names()
    }

    /// 运行状态
    pub fn status(&self) -> ApplicationStatus {
        *self.status.read()
    }

    /// 统计信息
    pub fn metrics(&self) -> ApplicationMetrics {
        self.metrics.read().clone()
    }

    /// 停止应用，关闭组件容器
    pub fn stop(&self) -> InfrastructureResult<()> {
        {
            let mut status = self.status.write();
            if *status == ApplicationStatus::Stopped {
                return Ok(());
            }
            *status = ApplicationStatus::Stopping;
        }
        info!("停止应用 {}", self.context.id());

        let result = self.context.shutdown();
        self.metrics.write().stop_time = Some(Utc::now());
        *self.status.write() = match result {
            Ok(()) => ApplicationStatus::Stopped,
            Err(_) => ApplicationStatus::Failed,
        };
        result.map_err(|e| {
            tracing::error!("应用停止失败: {}", e);
            e
        })
    }
}

impl std::fmt::Debug for Application {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Application")
            .field("context", &self.context.id())
            .field("status", &self.status())
            .finish()
    }
}

/// 应用运行状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplicationStatus {
    /// 容器已启动
    Running,
    /// 正在关闭
    Stopping,
    /// 已关闭
    Stopped,
    /// 启动或关闭失败
    Failed,
}

/// 应用统计信息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationMetrics {
    /// 容器标识
    pub context_id: String,
    /// 启动时间
    pub start_time: Option<DateTime<Utc>>,
    /// 停止时间
    pub stop_time: Option<DateTime<Utc>>,
    /// 已注册的组件数量
    pub registered_components_count: usize,
    /// 扫描到的候选类型数量
    pub managed_types_count: usize,
    /// 配置源数量
    pub config_sources_count: usize,
}

impl ApplicationMetrics {
    /// 计算运行时间
    pub fn uptime(&self) -> Option<chrono::Duration> {
        match (self.start_time, self.stop_time) {
            (Some(start), Some(stop)) => Some(stop - start),
            (Some(start), None) => Some(Utc::now() - start),
            _ => None,
        }
    }
}

