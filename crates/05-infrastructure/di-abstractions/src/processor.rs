//! 组件后处理器接口

use infrastructure_common::Instance;

/// 组件后处理器 trait
///
/// 在组件生命周期的三个节点介入，每个节点都可以返回替换后的实例。
/// 多个后处理器按排序权重升序执行，`before_property_set` 按降序执行。
pub trait PostProcessor: Send + Sync {
    /// 构造完成后、代理包装之前调用
    fn after_construction(&self, instance: Instance, _name: &str) -> anyhow::Result<Instance> {
        Ok(instance)
    }

    /// 就绪钩子执行之后调用
    fn after_ready(&self, instance: Instance, _name: &str) -> anyhow::Result<Instance> {
        Ok(instance)
    }

    /// 属性注入与生命周期钩子之前调用，返回需要被修改的原始实例
    fn before_property_set(&self, instance: Instance, _name: &str) -> anyhow::Result<Instance> {
        Ok(instance)
    }
}
