//! 工厂方法宏实现

use crate::binding::{plan_param, take_binding};
use crate::utils::{is_result_type, lit_str, to_camel_case};
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{
    parse::Parse, parse::ParseStream, punctuated::Punctuated, Attribute, Expr, FnArg, ImplItem,
    ImplItemFn, ItemImpl, Meta, Pat, Result, ReturnType, Token,
};

/// `#[bean]` 参数
#[derive(Debug, Clone, Default)]
pub struct BeanArgs {
    /// 显式组件名称，缺省为驼峰形式的方法名
    pub name: Option<String>,
    /// 属性注入后调用的操作
    pub init: Option<String>,
    /// 销毁时调用的操作
    pub destroy: Option<String>,
    /// 按类型查找时优先
    pub primary: bool,
    /// 排序权重表达式
    pub order: Option<Expr>,
}

impl Parse for BeanArgs {
    fn parse(input: ParseStream<'_>) -> Result<Self> {
        let mut args = Self::default();

        let parsed = Punctuated::<Meta, Token![,]>::parse_terminated(input)?;

        for meta in parsed {
            match meta {
                Meta::Path(path) if path.is_ident("primary") => args.primary = true,
                Meta::NameValue(nv) => {
                    if nv.path.is_ident("name") {
                        args.name = Some(lit_str(&nv.value)?);
                    } else if nv.path.is_ident("init") {
                        args.init = Some(lit_str(&nv.value)?);
                    } else if nv.path.is_ident("destroy") {
                        args.destroy = Some(lit_str(&nv.value)?);
                    } else if nv.path.is_ident("order") {
                        args.order = Some(nv.value);
                    } else {
                        return Err(syn::Error::new_spanned(nv.path, "未知的工厂方法参数"));
                    }
                }
                other => return Err(syn::Error::new_spanned(other, "未知的工厂方法参数")),
            }
        }

        Ok(args)
    }
}

fn take_bean(attrs: &mut Vec<Attribute>) -> Result<Option<BeanArgs>> {
    let Some(position) = attrs.iter().position(|attr| attr.path().is_ident("bean")) else {
        return Ok(None);
    };
    let attr = attrs.remove(position);
    match &attr.meta {
        Meta::Path(_) => Ok(Some(BeanArgs::default())),
        _ => attr.parse_args::<BeanArgs>().map(Some),
    }
}

/// 实现 `#[beans]`
pub fn beans_impl(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let item = match syn::parse::<ItemImpl>(input) {
        Ok(item) => item,
        Err(e) => return e.to_compile_error().into(),
    };

    match expand(item) {
        Ok(tokens) => tokens.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

fn factory_method(method: &mut ImplItemFn, bean: BeanArgs, owner: &syn::Type) -> Result<TokenStream> {
    let signature = &mut method.sig;
    if let Some(asyncness) = &signature.asyncness {
        return Err(syn::Error::new_spanned(asyncness, "工厂方法不能是异步函数"));
    }
    let output = match &signature.output {
        ReturnType::Type(_, ty) => (**ty).clone(),
        ReturnType::Default => {
            return Err(syn::Error::new_spanned(&signature.ident, "工厂方法必须返回组件"));
        }
    };
    match signature.inputs.first() {
        Some(FnArg::Receiver(receiver))
            if receiver.reference.is_some() && receiver.mutability.is_none() => {}
        _ => {
            return Err(syn::Error::new_spanned(
                &signature.ident,
                "工厂方法的第一个参数必须是 &self",
            ));
        }
    }

    let mut params = Vec::new();
    let mut args = Vec::new();
    for (index, input) in signature.inputs.iter_mut().skip(1).enumerate() {
        let FnArg::Typed(pat_type) = input else {
            continue;
        };
        let binding = take_binding(&mut pat_type.attrs)?;
        let name = match &*pat_type.pat {
            Pat::Ident(pat_ident) => pat_ident.ident.to_string(),
            _ => format!("arg{}", index),
        };
        let plan = plan_param(
            name.trim_start_matches('_'),
            &pat_type.ty,
            binding.as_ref(),
            index,
        )?;
        params.push(plan.def);
        args.push(plan.arg);
    }

    let ident = &signature.ident;
    let call = quote! { this.#ident(#(#args),*) };
    let body = if is_result_type(&output) {
        quote! { ::core::result::Result::Ok(#call?) }
    } else {
        quote! { ::core::result::Result::Ok(#call) }
    };
    let args_ident = if params.is_empty() {
        format_ident!("_args")
    } else {
        format_ident!("args")
    };

    let method_name = to_camel_case(&ident.to_string());
    let bean_name = bean.name.as_ref().map(|name| quote! { .bean_name(#name) });
    let init = bean.init.as_ref().map(|init| quote! { .init(#init) });
    let destroy = bean.destroy.as_ref().map(|destroy| quote! { .destroy(#destroy) });
    let order = bean.order.as_ref().map(|order| quote! { .order(#order) });
    let primary = bean.primary.then(|| quote! { .primary() });

    Ok(quote! {
        ::di_abstractions::FactoryMethodDef::new(
            #method_name,
            ::std::vec![#(#params),*],
            |this: &#owner, #args_ident: ::infrastructure_common::Arguments| #body,
        )
        #bean_name
        #init
        #destroy
        #order
        #primary
    })
}

/// 生成 impl 块及其 `BeanMethods` 实现
pub fn expand(mut item: ItemImpl) -> Result<TokenStream> {
    if let Some((_, path, _)) = &item.trait_ {
        return Err(syn::Error::new_spanned(path, "#[beans] 只能用于固有 impl 块"));
    }
    if !item.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(&item.generics, "配置类不能带泛型参数"));
    }

    let owner = (*item.self_ty).clone();
    let mut methods = Vec::new();
    for impl_item in &mut item.items {
        let ImplItem::Fn(method) = impl_item else {
            continue;
        };
        if let Some(bean) = take_bean(&mut method.attrs)? {
            methods.push(factory_method(method, bean, &owner)?);
        }
    }

    Ok(quote! {
        #item

        impl ::di_abstractions::BeanMethods for #owner {
            fn bean_methods() -> ::std::vec::Vec<::di_abstractions::FactoryMethodDef> {
                ::std::vec![#(#methods),*]
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn test_bean_args_defaults() {
        let args = BeanArgs::default();
        assert_eq!(args.name, None);
        assert_eq!(args.init, None);
        assert!(!args.primary);
    }

    #[test]
    fn test_bean_methods_are_generated() {
        let item: ItemImpl = parse_quote! {
            impl DataConfig {
                #[bean(name = "mainPool", init = "connect", primary)]
                fn connection_pool(&self, #[value("db.url")] url: String) -> anyhow::Result<Pool> {
                    Pool::open(url)
                }

                #[bean]
                fn audit_log(&self, #[autowired] pool: Arc<Pool>) -> AuditLog {
                    AuditLog::new(pool)
                }

                fn helper(&self) -> u32 {
                    1
                }
            }
        };
        let tokens = expand(item).unwrap().to_string();

        assert!(!tokens.contains("# [bean"));
        assert!(!tokens.contains("# [value"));
        assert!(tokens.contains("FactoryMethodDef :: new (\"connectionPool\""));
        assert!(tokens.contains("FactoryMethodDef :: new (\"auditLog\""));
        assert!(tokens.contains(". bean_name (\"mainPool\")"));
        assert!(tokens.contains(". init (\"connect\")"));
        assert!(tokens.contains("this . connection_pool (args . scalar :: < String > (0usize) ?) ?"));
        assert!(!tokens.contains("\"helper\""));
    }

    #[test]
    fn test_invalid_bean_methods_are_rejected() {
        let no_receiver: ItemImpl = parse_quote! {
            impl DataConfig {
                #[bean]
                fn pool() -> Pool { Pool::default() }
            }
        };
        assert!(expand(no_receiver).is_err());

        let no_output: ItemImpl = parse_quote! {
            impl DataConfig {
                #[bean]
                fn pool(&self) {}
            }
        };
        assert!(expand(no_output).is_err());

        let trait_impl: ItemImpl = parse_quote! {
            impl Default for DataConfig {
                fn default() -> Self { Self }
            }
        };
        assert!(expand(trait_impl).is_err());
    }
}
