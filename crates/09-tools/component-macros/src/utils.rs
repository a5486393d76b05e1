//! 宏工具函数

use syn::{Attribute, Expr, Field, Lit, Meta, Result, Visibility};

/// 查找字段上指定名称的属性
pub fn find_field_attribute<'a>(field: &'a Field, attr_name: &str) -> Option<&'a Attribute> {
    field.attrs.iter().find(|attr| attr.path().is_ident(attr_name))
}

/// 字段是否对外可见，只有 `pub` 算作导出
pub fn is_exported(vis: &Visibility) -> bool {
    matches!(vis, Visibility::Public(_))
}

/// 将字面量转换为指令文本
pub fn lit_to_string(lit: &Lit) -> Option<String> {
    match lit {
        Lit::Str(lit_str) => Some(lit_str.value()),
        Lit::Int(lit_int) => Some(lit_int.to_string()),
        Lit::Bool(lit_bool) => Some(lit_bool.value.to_string()),
        _ => None,
    }
}

/// 将单个参数转换为指令片段
///
/// - `optional` 转换为 `optional`
/// - `qualifier = "a"` 转换为 `qualifier=a`
pub fn meta_to_token(meta: &Meta) -> Result<String> {
    match meta {
        Meta::Path(path) => path
            .get_ident()
            .map(|ident| ident.to_string())
            .ok_or_else(|| syn::Error::new_spanned(path, "注入参数必须是简单标识符")),
        Meta::NameValue(nv) => {
            let name = nv
                .path
                .get_ident()
                .ok_or_else(|| syn::Error::new_spanned(&nv.path, "注入参数必须是简单标识符"))?;
            let value = match &nv.value {
                Expr::Lit(expr_lit) => lit_to_string(&expr_lit.lit),
                _ => None,
            }
            .ok_or_else(|| syn::Error::new_spanned(&nv.value, "注入参数的值必须是字面量"))?;
            Ok(format!("{}={}", name, value))
        }
        Meta::List(list) => Err(syn::Error::new_spanned(list, "不支持嵌套的注入参数")),
    }
}
