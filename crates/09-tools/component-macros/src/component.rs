//! 组件声明宏实现

use crate::binding::{plan_member, plan_param, take_binding};
use crate::lifecycle::LifecycleArgs;
use crate::utils::{is_once_cell_type, lit_str, optional_name};
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{
    parse::Parse, parse::ParseStream, punctuated::Punctuated, Expr, Fields, ItemStruct, LitStr,
    Meta, Result, Token, Type,
};

/// 组件声明参数
#[derive(Debug, Clone, Default)]
pub struct ComponentArgs {
    /// 显式组件名称
    pub name: Option<String>,
    /// 排序权重表达式
    pub order: Option<Expr>,
    /// 按类型查找时优先
    pub primary: bool,
    /// 复合标记
    pub stereotype: Option<String>,
    /// 挂载的拦截器组件名称
    pub around: Vec<String>,
    /// 以 trait 对象形式暴露的接口
    pub implements: Vec<Type>,
    /// 显式引入的类型
    pub import: Vec<Type>,
    /// 组件实现了后置处理器
    pub post_processor: bool,
    /// 组件实现了拦截器
    pub interceptor: bool,
    /// 类型化代理构造函数
    pub proxied_as: Option<Expr>,
}

impl Parse for ComponentArgs {
    fn parse(input: ParseStream<'_>) -> Result<Self> {
        let mut args = Self::default();

        let parsed = Punctuated::<Meta, Token![,]>::parse_terminated(input)?;

        for meta in parsed {
            match meta {
                Meta::Path(path) => {
                    if path.is_ident("primary") {
                        args.primary = true;
                    } else if path.is_ident("post_processor") {
                        args.post_processor = true;
                    } else if path.is_ident("interceptor") {
                        args.interceptor = true;
                    } else {
                        return Err(syn::Error::new_spanned(path, "未知的组件参数"));
                    }
                }
                Meta::NameValue(nv) => {
                    if nv.path.is_ident("name") {
                        args.name = Some(lit_str(&nv.value)?);
                    } else if nv.path.is_ident("stereotype") {
                        args.stereotype = Some(lit_str(&nv.value)?);
                    } else if nv.path.is_ident("order") {
                        args.order = Some(nv.value);
                    } else if nv.path.is_ident("proxied_as") {
                        args.proxied_as = Some(nv.value);
                    } else {
                        return Err(syn::Error::new_spanned(nv.path, "未知的组件参数"));
                    }
                }
                Meta::List(list) => {
                    if list.path.is_ident("around") {
                        let names =
                            list.parse_args_with(Punctuated::<LitStr, Token![,]>::parse_terminated)?;
                        args.around.extend(names.iter().map(LitStr::value));
                    } else if list.path.is_ident("implements") {
                        let types =
                            list.parse_args_with(Punctuated::<Type, Token![,]>::parse_terminated)?;
                        args.implements.extend(types);
                    } else if list.path.is_ident("import") {
                        let types =
                            list.parse_args_with(Punctuated::<Type, Token![,]>::parse_terminated)?;
                        args.import.extend(types);
                    } else {
                        return Err(syn::Error::new_spanned(list.path, "未知的组件参数"));
                    }
                }
            }
        }

        Ok(args)
    }
}

/// 实现 `#[component]` 和 `#[configuration]`
pub fn component_impl(
    args: proc_macro::TokenStream,
    input: proc_macro::TokenStream,
    configuration: bool,
) -> proc_macro::TokenStream {
    let component_args = if args.is_empty() {
        ComponentArgs::default()
    } else {
        match syn::parse::<ComponentArgs>(args) {
            Ok(args) => args,
            Err(e) => return e.to_compile_error().into(),
        }
    };

    let item = match syn::parse::<ItemStruct>(input) {
        Ok(item) => item,
        Err(e) => return e.to_compile_error().into(),
    };

    match expand(component_args, item, configuration) {
        Ok(tokens) => tokens.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

/// 生成结构体及其 `DeclaredComponent` 实现
pub fn expand(args: ComponentArgs, mut item: ItemStruct, configuration: bool) -> Result<TokenStream> {
    if !item.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(&item.generics, "组件结构体不能带泛型参数"));
    }
    if configuration && args.stereotype.is_some() {
        return Err(syn::Error::new_spanned(
            &item.ident,
            "配置类不能同时声明复合标记",
        ));
    }

    let lifecycle = LifecycleArgs::take(&mut item.attrs)?;

    let mut params = Vec::new();
    let mut inits = Vec::new();
    let mut members = Vec::new();
    let construct = match &mut item.fields {
        Fields::Unit => quote! { Self },
        Fields::Unnamed(fields) => {
            return Err(syn::Error::new_spanned(fields, "组件结构体不支持元组字段"));
        }
        Fields::Named(fields) => {
            for field in &mut fields.named {
                let binding = take_binding(&mut field.attrs)?;
                let Some(ident) = field.ident.clone() else {
                    continue;
                };
                match binding {
                    Some(binding) if is_once_cell_type(&field.ty) => {
                        members.push(plan_member(&ident, &field.ty, &binding)?);
                        inits.push(quote! { #ident: ::core::default::Default::default() });
                    }
                    Some(binding) => {
                        let name = ident.to_string();
                        let plan = plan_param(&name, &field.ty, Some(&binding), params.len())?;
                        let arg = plan.arg;
                        params.push(plan.def);
                        inits.push(quote! { #ident: #arg });
                    }
                    None => inits.push(quote! { #ident: ::core::default::Default::default() }),
                }
            }
            quote! { Self { #(#inits),* } }
        }
    };
    let args_ident = if params.is_empty() {
        format_ident!("_args")
    } else {
        format_ident!("args")
    };

    let component_name = optional_name(args.name.as_ref());
    let marker = if configuration {
        quote! { ::di_abstractions::Marker::Configuration(#component_name) }
    } else if let Some(key) = &args.stereotype {
        quote! {
            ::di_abstractions::Marker::Stereotype {
                key: ::std::string::String::from(#key),
                name: #component_name,
            }
        }
    } else {
        quote! { ::di_abstractions::Marker::Component(#component_name) }
    };

    let order = args.order.as_ref().map(|order| quote! { .order(#order) });
    let primary = args.primary.then(|| quote! { .primary() });
    let around = (!args.around.is_empty()).then(|| {
        let names = &args.around;
        quote! { .around([#(#names),*]) }
    });
    let implements = args.implements.iter().map(|ty| {
        quote! {
            .implements(|this: ::std::sync::Arc<Self>| -> ::std::sync::Arc<#ty> { this })
        }
    });
    let import = (!args.import.is_empty()).then(|| {
        let types = &args.import;
        quote! {
            .import(::std::vec![#(::infrastructure_common::TypeKey::of::<#types>()),*])
        }
    });
    let post_processor = args.post_processor.then(|| quote! { .post_processor::<Self>() });
    let interceptor = args.interceptor.then(|| quote! { .interceptor::<Self>() });
    let proxied_as = args.proxied_as.as_ref().map(|wrap| quote! { .proxied_as(#wrap) });
    let beans = configuration.then(|| {
        quote! {
            .factory_methods(<Self as ::di_abstractions::BeanMethods>::bean_methods())
        }
    });
    let operations = lifecycle.operations();

    let struct_name = &item.ident;
    Ok(quote! {
        #item

        impl ::di_abstractions::DeclaredComponent for #struct_name {
            fn type_definition() -> ::di_abstractions::TypeDefinition {
                ::di_abstractions::TypeDefinition::of::<Self>()
                    .marker(#marker)
                    #order
                    #primary
                    #around
                    #(#implements)*
                    #import
                    #post_processor
                    #interceptor
                    #proxied_as
                    .constructor(::di_abstractions::ConstructorDef::new(
                        ::std::vec![#(#params),*],
                        |#args_ident: ::infrastructure_common::Arguments| {
                            ::core::result::Result::Ok(#construct)
                        },
                    ))
                    #beans
                    #(#members)*
                    #operations
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn test_component_args_defaults() {
        let args = ComponentArgs::default();
        assert_eq!(args.name, None);
        assert!(args.order.is_none());
        assert!(!args.primary);
        assert!(args.around.is_empty());
        assert!(args.proxied_as.is_none());
    }

    #[test]
    fn test_component_args_parse() {
        let args: ComponentArgs = syn::parse_quote!(
            name = "orderService",
            order = 5,
            primary,
            around("auditInterceptor", "timingInterceptor"),
            implements(dyn OrderApi),
            proxied_as = OrderProxy::wrap
        );
        assert_eq!(args.name.as_deref(), Some("orderService"));
        assert!(args.order.is_some());
        assert!(args.primary);
        assert_eq!(args.around, vec!["auditInterceptor", "timingInterceptor"]);
        assert_eq!(args.implements.len(), 1);
        assert!(args.proxied_as.is_some());

        assert!(syn::parse_str::<ComponentArgs>("singleton").is_err());
    }

    #[test]
    fn test_fields_become_params_and_members() {
        let item: ItemStruct = parse_quote! {
            #[lifecycle(post_construct = "open")]
            pub struct OrderService {
                #[autowired]
                repository: Arc<OrderRepository>,
                #[value("orders.page-size:20")]
                page_size: usize,
                #[autowired(optional)]
                clock: OnceCell<Arc<dyn Clock>>,
                hits: AtomicUsize,
            }
        };
        let tokens = expand(ComponentArgs::default(), item, false).unwrap().to_string();

        assert!(!tokens.contains("# [autowired"));
        assert!(!tokens.contains("# [lifecycle"));
        assert!(tokens.contains("ParamDef :: autowired :: < OrderRepository >"));
        assert!(tokens.contains("ParamDef :: value (\"page_size\""));
        assert!(tokens.contains("MemberDef :: field (\"clock\""));
        assert!(tokens.contains("required : false"));
        assert!(tokens.contains("hits : :: core :: default :: Default :: default ()"));
        assert!(tokens.contains("OperationDef :: hook (\"open\""));
        assert!(tokens.contains("Marker :: Component (:: core :: option :: Option :: None)"));
    }

    #[test]
    fn test_configuration_collects_bean_methods() {
        let item: ItemStruct = parse_quote! {
            pub struct DataConfig;
        };
        let tokens = expand(ComponentArgs::default(), item, true).unwrap().to_string();
        assert!(tokens.contains("Marker :: Configuration"));
        assert!(tokens.contains("BeanMethods > :: bean_methods ()"));
        assert!(tokens.contains("| _args :"));
    }

    #[test]
    fn test_unsupported_structs_are_rejected() {
        let generic: ItemStruct = parse_quote! { struct Holder<T> { value: T } };
        assert!(expand(ComponentArgs::default(), generic, false).is_err());

        let tuple: ItemStruct = parse_quote! { struct Wrapper(u32); };
        assert!(expand(ComponentArgs::default(), tuple, false).is_err());

        let stereotyped = ComponentArgs {
            stereotype: Some("Service".to_string()),
            ..ComponentArgs::default()
        };
        let item: ItemStruct = parse_quote! { struct DataConfig; };
        assert!(expand(stereotyped, item, true).is_err());
    }
}
