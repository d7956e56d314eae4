//! 宏工具函数

use proc_macro2::TokenStream;
use quote::quote;
use syn::{Expr, GenericArgument, Ident, Lit, PathArguments, Result, Type};

/// 类型路径最后一段的标识符
pub fn last_segment_ident(ty: &Type) -> Option<&Ident> {
    match ty {
        Type::Path(type_path) => type_path.path.segments.last().map(|segment| &segment.ident),
        _ => None,
    }
}

fn last_segment_is(ty: &Type, names: &[&str]) -> bool {
    last_segment_ident(ty).is_some_and(|ident| names.iter().any(|name| ident == name))
}

/// 从类型中提取第一个泛型参数
pub fn extract_generic_type(ty: &Type) -> Option<&Type> {
    let Type::Path(type_path) = ty else {
        return None;
    };
    let segment = type_path.path.segments.last()?;
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    match args.args.first() {
        Some(GenericArgument::Type(inner)) => Some(inner),
        _ => None,
    }
}

/// 检查类型是否为 Option<T>
pub fn is_option_type(ty: &Type) -> bool {
    last_segment_is(ty, &["Option"])
}

/// 检查类型是否为 Result<T> 或 Result<T, E>
pub fn is_result_type(ty: &Type) -> bool {
    last_segment_is(ty, &["Result"])
}

/// 检查类型是否为一次性赋值的单元
pub fn is_once_cell_type(ty: &Type) -> bool {
    last_segment_is(ty, &["OnceCell", "OnceLock"])
}

/// 依赖的目标类型
#[derive(Debug, Clone)]
pub struct DependencyTarget {
    /// `Arc` 内部的类型
    pub ty: Type,
    /// 目标是 trait 对象
    pub shared: bool,
}

/// 解析 `Arc<T>` 或 `Arc<dyn Trait>`
pub fn dependency_target(ty: &Type) -> Option<DependencyTarget> {
    if !last_segment_is(ty, &["Arc"]) {
        return None;
    }
    let inner = extract_generic_type(ty)?;
    Some(DependencyTarget {
        ty: inner.clone(),
        shared: matches!(inner, Type::TraitObject(_)),
    })
}

/// 值绑定支持的标量类型
pub fn scalar_type(ty: &Type) -> Option<TokenStream> {
    let ident = last_segment_ident(ty)?.to_string();
    let variant = match ident.as_str() {
        "String" => quote! { String },
        "bool" => quote! { Bool },
        "i32" => quote! { I32 },
        "i64" => quote! { I64 },
        "u16" => quote! { U16 },
        "u32" => quote! { U32 },
        "u64" => quote! { U64 },
        "usize" => quote! { Usize },
        "f32" => quote! { F32 },
        "f64" => quote! { F64 },
        "Vec" if extract_generic_type(ty).is_some_and(|inner| last_segment_is(inner, &["String"])) => {
            quote! { List }
        }
        _ => return None,
    };
    Some(quote! { ::infrastructure_common::ScalarType::#variant })
}

/// 读取字符串字面量
pub fn lit_str(expr: &Expr) -> Result<String> {
    match expr {
        Expr::Lit(expr_lit) => match &expr_lit.lit {
            Lit::Str(lit_str) => Ok(lit_str.value()),
            _ => Err(syn::Error::new_spanned(expr, "期望字符串字面量")),
        },
        _ => Err(syn::Error::new_spanned(expr, "期望字符串字面量")),
    }
}

/// 将蛇形命名转换为驼峰命名
pub fn to_camel_case(s: &str) -> String {
    let mut result = String::new();
    let mut capitalize_next = false;

    for ch in s.trim_start_matches('_').chars() {
        if ch == '_' {
            capitalize_next = true;
        } else if capitalize_next {
            result.extend(ch.to_uppercase());
            capitalize_next = false;
        } else {
            result.push(ch);
        }
    }

    result
}

/// `Option<String>` 形式的名称
pub fn optional_name(name: Option<&String>) -> TokenStream {
    match name {
        Some(name) => quote! { ::core::option::Option::Some(::std::string::String::from(#name)) },
        None => quote! { ::core::option::Option::None },
    }
}
