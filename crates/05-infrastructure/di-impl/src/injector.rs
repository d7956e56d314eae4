//! 属性注入

use crate::engine::ConstructionEngine;
use crate::pipeline::PostProcessorPipeline;
use di_abstractions::{ComponentDescriptor, MemberDef, MemberKind, TypeCatalog};
use infrastructure_common::{ComponentError, DependencyError, DependencyResult, Instance};
use tracing::{debug, warn};

/// 属性注入器
///
/// 沿实例类型及其祖先类型查找可注入成员，把值或依赖写入原始实例。
pub struct PropertyInjector<'a> {
    engine: &'a ConstructionEngine<'a>,
    pipeline: &'a PostProcessorPipeline,
    catalog: &'a TypeCatalog,
}

impl<'a> PropertyInjector<'a> {
    /// 创建属性注入器
    pub fn new(
        engine: &'a ConstructionEngine<'a>,
        pipeline: &'a PostProcessorPipeline,
        catalog: &'a TypeCatalog,
    ) -> Self {
        Self {
            engine,
            pipeline,
            catalog,
        }
    }

    /// 为一个组件注入属性
    pub fn inject(&self, descriptor: &ComponentDescriptor) -> DependencyResult<()> {
        let target = self.pipeline.unwrap(descriptor)?;

        let mut ancestors = self.catalog.ancestors(&target);
        if ancestors.is_empty() {
            if let Some(definition) = self.catalog.get(&descriptor.produced_type) {
                ancestors.push((definition.clone(), target));
            }
        }

        for (definition, instance) in &ancestors {
            for member in definition.members.iter().filter(|m| m.is_injectable()) {
                self.inject_member(descriptor, member, instance)?;
            }
        }
        Ok(())
    }

    fn inject_member(
        &self,
        descriptor: &ComponentDescriptor,
        member: &MemberDef,
        instance: &Instance,
    ) -> DependencyResult<()> {
        let invalid = |reason: String| ComponentError::InvalidMember {
            component: descriptor.name.clone(),
            member: member.name.clone(),
            reason,
        };

        if member.is_static {
            return Err(invalid("不能注入静态成员".to_string()).into());
        }
        match member.kind {
            MemberKind::Field if member.is_final => {
                return Err(invalid("不能注入不可变字段".to_string()).into());
            }
            MemberKind::Method { param_count } if param_count != 1 => {
                return Err(invalid(format!("setter 必须恰好有一个参数, 实际为 {}", param_count)).into());
            }
            MemberKind::Method { .. } if member.is_final => {
                warn!(
                    "通过 final 方法注入属性: 组件 {} 的 {}",
                    descriptor.name, member.name
                );
            }
            _ => {}
        }

        let binding = member.binding(&descriptor.name)?;
        let value = self.engine.resolve_binding(descriptor, &binding)?;
        if value.is_unit() {
            debug!(
                "组件 {} 的成员 {} 没有可注入的值, 保持未设置",
                descriptor.name, member.name
            );
            return Ok(());
        }

        debug!("注入属性: {}.{}", descriptor.name, member.name);
        (member.assign)(instance, value).map_err(|e| {
            DependencyError::creation_failed(&descriptor.name, format!("注入成员 {}", member.name), e)
        })
    }
}
