//! 生命周期标记

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{Attribute, LitStr, Result};

/// `#[lifecycle]` 参数
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LifecycleArgs {
    /// 属性注入完成后调用的方法
    pub post_construct: Option<String>,
    /// 容器关闭时调用的方法
    pub pre_destroy: Option<String>,
}

impl LifecycleArgs {
    /// 取出结构体上的 `#[lifecycle(...)]` 并从属性列表中移除
    pub fn take(attrs: &mut Vec<Attribute>) -> Result<Self> {
        let mut args = Self::default();
        let mut error = None;
        attrs.retain(|attr| {
            if !attr.path().is_ident("lifecycle") {
                return true;
            }
            let parsed = attr.parse_nested_meta(|meta| {
                let method = meta.value()?.parse::<LitStr>()?.value();
                if meta.path.is_ident("post_construct") {
                    args.post_construct = Some(method);
                } else if meta.path.is_ident("pre_destroy") {
                    args.pre_destroy = Some(method);
                } else {
                    return Err(meta.error("未知的生命周期参数"));
                }
                Ok(())
            });
            if let Err(e) = parsed {
                error.get_or_insert(e);
            }
            false
        });
        match error {
            Some(error) => Err(error),
            None => Ok(args),
        }
    }

    /// 生成带生命周期标记的操作定义
    ///
    /// 方法签名须为 `fn(&self) -> anyhow::Result<()>`。
    pub fn operations(&self) -> TokenStream {
        let hook = |method: &String, marker: TokenStream| {
            let ident = format_ident!("{}", method);
            quote! {
                .operation(
                    ::di_abstractions::OperationDef::hook(#method, |this: &Self| this.#ident())
                        #marker
                )
            }
        };
        let post_construct = self
            .post_construct
            .as_ref()
            .map(|method| hook(method, quote! { .post_construct() }));
        let pre_destroy = self
            .pre_destroy
            .as_ref()
            .map(|method| hook(method, quote! { .pre_destroy() }));
        quote! { #post_construct #pre_destroy }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn test_lifecycle_args_defaults() {
        let args = LifecycleArgs::default();
        assert_eq!(args.post_construct, None);
        assert_eq!(args.pre_destroy, None);
        assert!(args.operations().is_empty());
    }

    #[test]
    fn test_lifecycle_attribute_is_consumed() {
        let mut attrs: Vec<Attribute> = vec![
            parse_quote!(#[derive(Default)]),
            parse_quote!(#[lifecycle(post_construct = "open", pre_destroy = "close")]),
        ];
        let args = LifecycleArgs::take(&mut attrs).unwrap();
        assert_eq!(args.post_construct.as_deref(), Some("open"));
        assert_eq!(args.pre_destroy.as_deref(), Some("close"));
        assert_eq!(attrs.len(), 1);

        let operations = args.operations().to_string();
        assert!(operations.contains("post_construct"));
        assert!(operations.contains("this . close ()"));
    }

    #[test]
    fn test_unknown_lifecycle_argument_is_rejected() {
        let mut attrs: Vec<Attribute> = vec![parse_quote!(#[lifecycle(on_start = "run")])];
        assert!(LifecycleArgs::take(&mut attrs).is_err());
    }
}
