//! `#[derive(Wireable)]` 宏实现

use crate::utils::{find_field_attribute, is_exported, lit_to_string, meta_to_token};
use proc_macro::TokenStream;
use quote::quote;
use syn::{
    ext::IdentExt, parse::Parse, parse::ParseStream, punctuated::Punctuated, Attribute, Data,
    DeriveInput, Expr, Fields, Ident, LitStr, Meta, Result, Token, Type,
};

const INJECT_ATTRIBUTE: &str = "inject";

/// 带注入指令的字段
struct InjectField {
    ident: Ident,
    name: String,
    ty: Type,
    directive: String,
    exported: bool,
}

/// `#[inject(...)]` 中的一个参数
enum DirectivePart {
    /// 原样的指令文本，例如 `"optional,qualifier=a"`
    Raw(LitStr),
    Meta(Meta),
}

impl Parse for DirectivePart {
    fn parse(input: ParseStream<'_>) -> Result<Self> {
        if input.peek(LitStr) {
            input.parse().map(DirectivePart::Raw)
        } else {
            input.parse().map(DirectivePart::Meta)
        }
    }
}

/// 从属性还原指令文本
///
/// 支持以下写法，结果都与 `"optional,qualifier=a"` 等价：
///
/// - `#[inject(optional, qualifier = "a")]`
/// - `#[inject("optional,qualifier=a")]`
/// - `#[inject = "optional,qualifier=a"]`
///
/// 单独的 `#[inject]` 表示必需且无限定符的注入。
fn parse_directive(attr: &Attribute) -> Result<String> {
    match &attr.meta {
        Meta::Path(_) => Ok(String::new()),
        Meta::NameValue(nv) => match &nv.value {
            Expr::Lit(expr_lit) => lit_to_string(&expr_lit.lit)
                .ok_or_else(|| syn::Error::new_spanned(&nv.value, "注入指令必须是字符串")),
            other => Err(syn::Error::new_spanned(other, "注入指令必须是字符串")),
        },
        Meta::List(_) => {
            let parts =
                attr.parse_args_with(Punctuated::<DirectivePart, Token![,]>::parse_terminated)?;
            let tokens = parts
                .iter()
                .map(|part| match part {
                    DirectivePart::Raw(lit) => Ok(lit.value()),
                    DirectivePart::Meta(meta) => meta_to_token(meta),
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(tokens.join(","))
        }
    }
}

fn inject_fields(input: &DeriveInput) -> Result<Vec<InjectField>> {
    let fields = match &input.data {
        Data::Struct(data) => &data.fields,
        _ => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "Wireable 只能用于结构体",
            ))
        }
    };

    match fields {
        Fields::Named(named) => named
            .named
            .iter()
            .filter_map(|field| {
                let attr = find_field_attribute(field, INJECT_ATTRIBUTE)?;
                let ident = field.ident.clone()?;
                Some(parse_directive(attr).map(|directive| InjectField {
                    name: ident.unraw().to_string(),
                    ident,
                    ty: field.ty.clone(),
                    directive,
                    exported: is_exported(&field.vis),
                }))
            })
            .collect(),
        Fields::Unit => Ok(Vec::new()),
        Fields::Unnamed(unnamed) => {
            if unnamed
                .unnamed
                .iter()
                .any(|field| find_field_attribute(field, INJECT_ATTRIBUTE).is_some())
            {
                Err(syn::Error::new_spanned(
                    unnamed,
                    "注入字段必须是具名字段",
                ))
            } else {
                Ok(Vec::new())
            }
        }
    }
}

/// 实现 `#[derive(Wireable)]`
pub fn derive_wireable_impl(input: DeriveInput) -> TokenStream {
    let fields = match inject_fields(&input) {
        Ok(fields) => fields,
        Err(e) => return e.to_compile_error().into(),
    };

    let struct_name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let injections = fields.iter().map(|field| {
        let ty = &field.ty;
        let name = &field.name;
        let directive = &field.directive;
        let exported = field.exported;
        quote! {
            ::di_abstractions::Injection::new::<#ty>(#name, #directive, #exported)
        }
    });
    let accessors = fields.iter().map(|field| {
        let ident = &field.ident;
        let name = &field.name;
        quote! {
            #name => ::std::option::Option::Some(&mut self.#ident as &mut dyn ::std::any::Any),
        }
    });

    let expanded = quote! {
        impl #impl_generics ::di_abstractions::Wireable for #struct_name #ty_generics #where_clause {
            fn injections() -> ::std::vec::Vec<::di_abstractions::Injection> {
                ::std::vec![#(#injections),*]
            }

            fn field_mut(&mut self, name: &str) -> ::std::option::Option<&mut dyn ::std::any::Any> {
                match name {
                    #(#accessors)*
                    _ => ::std::option::Option::None,
                }
            }
        }
    };

    TokenStream::from(expanded)
}
