//! 绑定标记解析
//!
//! 字段和工厂方法参数上的 `#[autowired]`、`#[value("...")]` 标记，
//! 以及由它们生成的参数定义和成员定义。

use crate::utils::{
    dependency_target, extract_generic_type, is_option_type, optional_name, scalar_type,
    DependencyTarget,
};
use proc_macro2::TokenStream;
use quote::quote;
use syn::{Attribute, Ident, LitStr, Meta, Result, Type};

/// `#[autowired]` 参数
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AutowiredArgs {
    /// 按名称查找的组件
    pub name: Option<String>,
    /// 缺失时保持为空
    pub optional: bool,
}

/// 声明的绑定方式
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingAttr {
    /// `#[autowired]`
    Autowired(AutowiredArgs),
    /// `#[value("...")]`，保存属性表达式
    Value(String),
}

fn parse_autowired(attr: &Attribute) -> Result<AutowiredArgs> {
    let mut args = AutowiredArgs::default();
    if let Meta::Path(_) = &attr.meta {
        return Ok(args);
    }
    attr.parse_nested_meta(|meta| {
        if meta.path.is_ident("name") {
            args.name = Some(meta.value()?.parse::<LitStr>()?.value());
            Ok(())
        } else if meta.path.is_ident("optional") {
            args.optional = true;
            Ok(())
        } else {
            Err(meta.error("未知的 autowired 参数"))
        }
    })?;
    Ok(args)
}

/// 取出绑定标记并从属性列表中移除
pub fn take_binding(attrs: &mut Vec<Attribute>) -> Result<Option<BindingAttr>> {
    let mut found: Option<BindingAttr> = None;
    let mut error = None;

    attrs.retain(|attr| {
        let parsed = if attr.path().is_ident("autowired") {
            parse_autowired(attr).map(BindingAttr::Autowired)
        } else if attr.path().is_ident("value") {
            attr.parse_args::<LitStr>()
                .map(|expression| BindingAttr::Value(expression.value()))
        } else {
            return true;
        };
        match parsed {
            Ok(_) if found.is_some() => {
                error.get_or_insert_with(|| {
                    syn::Error::new_spanned(attr, "不能同时声明值绑定和依赖绑定")
                });
            }
            Ok(binding) => found = Some(binding),
            Err(e) => {
                error.get_or_insert(e);
            }
        }
        false
    });

    match error {
        Some(error) => Err(error),
        None => Ok(found),
    }
}

/// 构造参数或工厂方法参数的生成结果
pub struct ParamPlan {
    /// `ParamDef` 表达式
    pub def: TokenStream,
    /// 从 `args` 中读取参数的表达式
    pub arg: TokenStream,
}

fn read_dependency(target: &DependencyTarget, optional: bool, index: usize) -> TokenStream {
    let ty = &target.ty;
    match (target.shared, optional) {
        (false, false) => quote! { args.component::<#ty>(#index)? },
        (true, false) => quote! { args.shared::<#ty>(#index)? },
        (false, true) => quote! { args.optional_component::<#ty>(#index)? },
        (true, true) => quote! { args.optional_shared::<#ty>(#index)? },
    }
}

/// 生成参数定义
///
/// 未标记的参数生成无绑定的定义，由容器在启动时报告。
pub fn plan_param(
    name: &str,
    ty: &Type,
    binding: Option<&BindingAttr>,
    index: usize,
) -> Result<ParamPlan> {
    if let Some(BindingAttr::Value(expression)) = binding {
        let scalar = scalar_type(ty)
            .ok_or_else(|| syn::Error::new_spanned(ty, "值绑定只支持标量类型"))?;
        return Ok(ParamPlan {
            def: quote! { ::di_abstractions::ParamDef::value(#name, #scalar, #expression) },
            arg: quote! { args.scalar::<#ty>(#index)? },
        });
    }

    let option = is_option_type(ty);
    let inner = if option {
        extract_generic_type(ty).unwrap_or(ty)
    } else {
        ty
    };
    let Some(target) = dependency_target(inner) else {
        if binding.is_none() {
            if let Some(scalar) = scalar_type(ty) {
                return Ok(ParamPlan {
                    def: quote! { ::di_abstractions::ParamDef::scalar(#name, #scalar) },
                    arg: quote! { args.scalar::<#ty>(#index)? },
                });
            }
        }
        return Err(syn::Error::new_spanned(
            ty,
            "依赖必须声明为 Arc<T>、Arc<dyn Trait> 或它们的 Option",
        ));
    };

    if let Some(BindingAttr::Autowired(args)) = binding {
        if args.optional && !option {
            return Err(syn::Error::new_spanned(ty, "可选依赖参数必须声明为 Option"));
        }
    }

    let target_ty = &target.ty;
    let def = match binding {
        Some(BindingAttr::Autowired(args)) => {
            let named = args.name.as_ref().map(|name| quote! { .named(#name) });
            let optional = (args.optional || option).then(|| quote! { .optional() });
            quote! { ::di_abstractions::ParamDef::autowired::<#target_ty>(#name) #named #optional }
        }
        _ => quote! { ::di_abstractions::ParamDef::dependency::<#target_ty>(#name) },
    };
    let optional = match binding {
        Some(BindingAttr::Autowired(args)) => args.optional || option,
        _ => option,
    };
    Ok(ParamPlan {
        def,
        arg: read_dependency(&target, optional, index),
    })
}

/// 为一次性赋值的字段生成成员定义
pub fn plan_member(field: &Ident, cell_ty: &Type, binding: &BindingAttr) -> Result<TokenStream> {
    let name = field.to_string();
    let value_ty = extract_generic_type(cell_ty)
        .ok_or_else(|| syn::Error::new_spanned(cell_ty, "无法确定单元中的值类型"))?;

    let (param_type, convert, marker) = match binding {
        BindingAttr::Value(expression) => {
            let scalar = scalar_type(value_ty)
                .ok_or_else(|| syn::Error::new_spanned(value_ty, "值绑定只支持标量类型"))?;
            (
                quote! { ::di_abstractions::ParamType::Scalar(#scalar) },
                quote! { ::di_abstractions::declared::support::scalar_of::<#value_ty>(&value, #name)? },
                quote! { .with_value(#expression) },
            )
        }
        BindingAttr::Autowired(args) => {
            let target = dependency_target(value_ty).ok_or_else(|| {
                syn::Error::new_spanned(value_ty, "依赖必须声明为 Arc<T> 或 Arc<dyn Trait>")
            })?;
            let target_ty = &target.ty;
            let convert = if target.shared {
                quote! { ::di_abstractions::declared::support::shared_of::<#target_ty>(&value, #name)? }
            } else {
                quote! { ::di_abstractions::declared::support::component_of::<#target_ty>(&value, #name)? }
            };
            let component_name = optional_name(args.name.as_ref());
            let required = !args.optional;
            (
                quote! {
                    ::di_abstractions::ParamType::Component(
                        ::infrastructure_common::TypeKey::of::<#target_ty>()
                    )
                },
                convert,
                quote! {
                    .with_autowired(::di_abstractions::Autowired {
                        name: #component_name,
                        required: #required,
                    })
                },
            )
        }
    };

    Ok(quote! {
        .member(
            ::di_abstractions::MemberDef::field(
                #name,
                #param_type,
                |this: &Self, value: ::infrastructure_common::Value| {
                    let converted = #convert;
                    this.#field
                        .set(converted)
                        .map_err(|_| ::di_abstractions::declared::support::already_injected(#name))
                },
            )
            #marker
        )
    })
}
