//! Pagewright Derive Macros: declarative page objects
//!
//! Page objects declare how each member is located with field attributes;
//! the derives generate the `PageObject` / `Component` impls that hand each
//! member's `FieldSpec` to the populator.
//!
//! # Available Macros
//!
//! - [`PageObject`] - populate a page from the document root
//! - [`Component`] - populate a composite element below its own root
//!
//! # Field attributes
//!
//! `#[find(...)]` takes at most one selector and any of the modifiers:
//!
//! | Key | Meaning |
//! |-----|---------|
//! | `css`, `id`, `by_name`, `class`, `tag`, `xpath`, `link_text`, `partial_link_text`, `id_or_name` | selector |
//! | `label = "..."` | human name used in logs |
//! | `cache` | resolve once and reuse the handle |
//! | `timeout_ms = N` | per-member locate timeout |
//! | `root` | component only: receives the component's root element |
//! | `skip` | not located; filled with `Default::default()` |
//!
//! Members without `#[find]` fall back to the component type's default
//! selector, or to id-or-name matching on the field name.
//!
//! # Example
//!
//! ```ignore
//! use pagewright::prelude::*;
//!
//! #[derive(Component)]
//! #[component(css = "nav.main", label = "Main menu")]
//! struct Menu {
//!     #[find(link_text = "Orders")]
//!     orders: Link,
//! }
//!
//! #[derive(PageObject)]
//! struct Dashboard {
//!     menu: Menu,
//!     #[find(css = "table.orders", timeout_ms = 5000)]
//!     orders: Table,
//!     #[find(id = "greeting", cache)]
//!     greeting: TextBlock,
//! }
//! ```

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, Attribute, Data, DeriveInput, Fields, LitInt, LitStr};

/// Derive macro for page objects.
///
/// Generates `pagewright::page_object::PageObject`, building every named
/// field through `Populator::field`.
///
/// ```ignore
/// #[derive(PageObject)]
/// struct LoginPage {
///     #[find(id = "user")]
///     user: TextInput,
///     #[find(css = "button[type=submit]", label = "Sign in")]
///     submit: Button,
/// }
/// ```
#[proc_macro_derive(PageObject, attributes(find))]
pub fn derive_page_object(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand_page_object(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// Derive macro for composite elements.
///
/// Generates `pagewright::page_object::Component` and
/// `pagewright::page_object::Decorate`, so the type can be a member of a
/// page object or of another component.
///
/// ```ignore
/// #[derive(Component)]
/// #[component(css = "form#search", label = "Search form")]
/// struct SearchForm {
///     #[find(root)]
///     root: LazyElement,
///     #[find(by_name = "q")]
///     query: TextInput,
/// }
/// ```
#[proc_macro_derive(Component, attributes(find, component))]
pub fn derive_component(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand_component(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

// ============================================================================
// Expansion
// ============================================================================

fn expand_page_object(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let members = parse_members(input, false)?;
    let inits = members.iter().map(Member::init);

    Ok(quote! {
        impl #impl_generics ::pagewright::page_object::PageObject for #name #ty_generics #where_clause {
            fn populate(
                populator: &mut ::pagewright::page_object::Populator<'_>,
            ) -> ::pagewright::result::PagewrightResult<Self> {
                ::core::result::Result::Ok(Self {
                    #(#inits,)*
                })
            }
        }
    })
}

fn expand_component(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let members = parse_members(input, true)?;
    let inits = members.iter().map(Member::init);
    let defaults = parse_component_attributes(&input.attrs)?;

    let default_selector = match &defaults.selector {
        Some(selector) => {
            let by = selector.tokens();
            quote! { ::core::option::Option::Some(#by) }
        }
        None => quote! { ::core::option::Option::None },
    };
    let label = match &defaults.label {
        Some(label) => quote! { ::core::option::Option::Some(#label) },
        None => quote! { ::core::option::Option::None },
    };

    Ok(quote! {
        impl #impl_generics ::pagewright::page_object::Component for #name #ty_generics #where_clause {
            fn default_selector() -> ::core::option::Option<::pagewright::by::By> {
                #default_selector
            }

            fn label() -> ::core::option::Option<&'static str> {
                #label
            }

            fn from_root(
                root: ::pagewright::element::LazyElement,
                populator: &mut ::pagewright::page_object::Populator<'_>,
            ) -> ::pagewright::result::PagewrightResult<Self> {
                let _ = &root;
                ::core::result::Result::Ok(Self {
                    #(#inits,)*
                })
            }
        }

        impl #impl_generics ::pagewright::page_object::Decorate for #name #ty_generics #where_clause {
            fn decorate(
                populator: &mut ::pagewright::page_object::Populator<'_>,
                spec: &::pagewright::page_object::FieldSpec,
            ) -> ::pagewright::result::PagewrightResult<::core::option::Option<Self>> {
                populator.component(spec)
            }
        }
    })
}

// ============================================================================
// Attribute model
// ============================================================================

/// A selector declared in `#[find]` or `#[component]`
#[derive(Debug, Clone, PartialEq, Eq)]
struct Selector {
    /// Constructor on `By`
    constructor: &'static str,
    value: String,
}

impl Selector {
    fn from_key(key: &str, value: String) -> Option<Self> {
        let constructor = match key {
            "css" => "css",
            "id" => "id",
            "by_name" => "name",
            "class" => "class_name",
            "tag" => "tag_name",
            "xpath" => "xpath",
            "link_text" => "link_text",
            "partial_link_text" => "partial_link_text",
            "id_or_name" => "id_or_name",
            _ => return None,
        };
        Some(Self { constructor, value })
    }

    fn tokens(&self) -> TokenStream2 {
        let constructor = syn::Ident::new(self.constructor, proc_macro2::Span::call_site());
        let value = &self.value;
        quote! { ::pagewright::by::By::#constructor(#value) }
    }
}

/// Parsed `#[find(...)]` of one field
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct FindAttr {
    selector: Option<Selector>,
    label: Option<String>,
    cache: bool,
    timeout_ms: Option<u64>,
    root: bool,
    skip: bool,
}

#[derive(Debug)]
enum MemberKind {
    Located(FindAttr),
    Root,
    Skip,
}

#[derive(Debug)]
struct Member {
    ident: syn::Ident,
    kind: MemberKind,
}

impl Member {
    fn init(&self) -> TokenStream2 {
        let ident = &self.ident;
        match &self.kind {
            MemberKind::Skip => quote! { #ident: ::core::default::Default::default() },
            MemberKind::Root => quote! { #ident: ::core::clone::Clone::clone(&root) },
            MemberKind::Located(find) => {
                let field = ident.to_string();
                let field = field.strip_prefix("r#").unwrap_or(&field).to_string();
                let mut spec = quote! { ::pagewright::page_object::FieldSpec::new(#field) };
                if let Some(selector) = &find.selector {
                    let by = selector.tokens();
                    spec = quote! { #spec.by(#by) };
                }
                if let Some(label) = &find.label {
                    spec = quote! { #spec.label(#label) };
                }
                if find.cache {
                    spec = quote! { #spec.cached() };
                }
                if let Some(ms) = find.timeout_ms {
                    spec = quote! { #spec.timeout(::std::time::Duration::from_millis(#ms)) };
                }
                quote! { #ident: populator.field(#spec)? }
            }
        }
    }
}

fn parse_members(input: &DeriveInput, component: bool) -> syn::Result<Vec<Member>> {
    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "page objects and components must be structs",
        ));
    };
    let Fields::Named(fields) = &data.fields else {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "page objects and components need named fields",
        ));
    };

    let mut members = Vec::new();
    for field in &fields.named {
        let Some(ident) = field.ident.clone() else {
            continue;
        };
        let find = parse_find_attributes(&field.attrs)?;
        let kind = if find.skip {
            MemberKind::Skip
        } else if find.root {
            if !component {
                return Err(syn::Error::new_spanned(
                    &ident,
                    "`root` is only available inside a Component",
                ));
            }
            MemberKind::Root
        } else {
            MemberKind::Located(find)
        };
        members.push(Member { ident, kind });
    }
    Ok(members)
}

/// Merge every `#[find(...)]` on a field
fn parse_find_attributes(attrs: &[Attribute]) -> syn::Result<FindAttr> {
    let mut find = FindAttr::default();
    for attr in attrs.iter().filter(|a| a.path().is_ident("find")) {
        attr.parse_nested_meta(|meta| {
            let key = meta
                .path
                .get_ident()
                .map(ToString::to_string)
                .unwrap_or_default();
            match key.as_str() {
                "label" => {
                    let value: LitStr = meta.value()?.parse()?;
                    find.label = Some(value.value());
                }
                "cache" => find.cache = true,
                "root" => find.root = true,
                "skip" => find.skip = true,
                "timeout_ms" => {
                    let value: LitInt = meta.value()?.parse()?;
                    find.timeout_ms = Some(value.base10_parse()?);
                }
                _ => {
                    let value: LitStr = meta.value()?.parse()?;
                    let Some(selector) = Selector::from_key(&key, value.value()) else {
                        return Err(meta.error(format!("unsupported find key `{key}`")));
                    };
                    if find.selector.is_some() {
                        return Err(meta.error("only one selector per member"));
                    }
                    find.selector = Some(selector);
                }
            }
            Ok(())
        })?;
    }
    Ok(find)
}

/// Parsed `#[component(...)]` of a component type
#[derive(Debug, Default, PartialEq, Eq)]
struct ComponentAttr {
    selector: Option<Selector>,
    label: Option<String>,
}

fn parse_component_attributes(attrs: &[Attribute]) -> syn::Result<ComponentAttr> {
    let mut component = ComponentAttr::default();
    for attr in attrs.iter().filter(|a| a.path().is_ident("component")) {
        attr.parse_nested_meta(|meta| {
            let key = meta
                .path
                .get_ident()
                .map(ToString::to_string)
                .unwrap_or_default();
            let value: LitStr = meta.value()?.parse()?;
            if key == "label" {
                component.label = Some(value.value());
                return Ok(());
            }
            let Some(selector) = Selector::from_key(&key, value.value()) else {
                return Err(meta.error(format!("unsupported component key `{key}`")));
            };
            component.selector = Some(selector);
            Ok(())
        })?;
    }
    Ok(component)
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    fn field_attrs(field: &syn::Field) -> syn::Result<FindAttr> {
        parse_find_attributes(&field.attrs)
    }

    #[test]
    fn test_find_full() {
        let field: syn::Field = parse_quote! {
            #[find(css = "button.go", label = "Go", cache, timeout_ms = 1500)]
            go: Button
        };
        let find = field_attrs(&field).unwrap();
        assert_eq!(
            find.selector,
            Some(Selector {
                constructor: "css",
                value: "button.go".into()
            })
        );
        assert_eq!(find.label.as_deref(), Some("Go"));
        assert!(find.cache);
        assert_eq!(find.timeout_ms, Some(1500));
    }

    #[test]
    fn test_find_by_name_maps_to_name() {
        let field: syn::Field = parse_quote! {
            #[find(by_name = "q")]
            query: TextInput
        };
        let find = field_attrs(&field).unwrap();
        assert_eq!(find.selector.unwrap().constructor, "name");
    }

    #[test]
    fn test_two_selectors_rejected() {
        let field: syn::Field = parse_quote! {
            #[find(id = "a", css = "b")]
            x: Button
        };
        assert!(field_attrs(&field).is_err());
    }

    #[test]
    fn test_unknown_key_rejected() {
        let field: syn::Field = parse_quote! {
            #[find(selector = "a")]
            x: Button
        };
        assert!(field_attrs(&field).is_err());
    }

    #[test]
    fn test_no_attribute_is_default() {
        let field: syn::Field = parse_quote! { search: Button };
        assert_eq!(field_attrs(&field).unwrap(), FindAttr::default());
    }

    #[test]
    fn test_component_attribute() {
        let input: DeriveInput = parse_quote! {
            #[component(css = "nav", label = "Menu")]
            struct Menu { home: Link }
        };
        let component = parse_component_attributes(&input.attrs).unwrap();
        assert_eq!(component.label.as_deref(), Some("Menu"));
        assert_eq!(component.selector.unwrap().value, "nav");
    }

    #[test]
    fn test_root_outside_component_rejected() {
        let input: DeriveInput = parse_quote! {
            struct Page {
                #[find(root)]
                root: LazyElement,
            }
        };
        assert!(parse_members(&input, false).is_err());
        assert!(parse_members(&input, true).is_ok());
    }

    #[test]
    fn test_enum_rejected() {
        let input: DeriveInput = parse_quote! { enum Page { A } };
        assert!(expand_page_object(&input).is_err());
    }

    #[test]
    fn test_expansion_mentions_field_spec() {
        let input: DeriveInput = parse_quote! {
            struct Page {
                #[find(id = "go", timeout_ms = 10)]
                go: Button,
                #[find(skip)]
                note: String,
            }
        };
        let tokens = expand_page_object(&input).unwrap().to_string();
        assert!(tokens.contains("FieldSpec :: new (\"go\")"));
        assert!(tokens.contains("By :: id (\"go\")"));
        assert!(tokens.contains("from_millis (10u64)"));
        assert!(tokens.contains("Default :: default ()"));
    }
}
