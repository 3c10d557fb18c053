use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::quote;
use syn::{parse_macro_input, Ident, ItemFn, LitStr, ReturnType};

/// Turn a render function into a stable component handle.
///
/// ```ignore
/// #[component]
/// fn Counter(hooks: &mut Hooks<'_>, props: &Props) -> Node { ... }
///
/// root.render(Element::component(&Counter()))?;
/// ```
///
/// The annotated function keeps its name but takes no arguments and returns
/// a `fiber_core::Component`. The handle is created once per thread, so every
/// call yields the same component type and state survives re-renders. An
/// optional string literal overrides the display name:
/// `#[component("Counter")]`.
#[proc_macro_attribute]
pub fn component(attr: TokenStream, item: TokenStream) -> TokenStream {
    let attr_tokens = TokenStream2::from(attr);
    let func = parse_macro_input!(item as ItemFn);

    let name = if attr_tokens.is_empty() {
        LitStr::new(&func.sig.ident.to_string(), func.sig.ident.span())
    } else {
        match syn::parse2::<LitStr>(attr_tokens) {
            Ok(name) => name,
            Err(err) => return err.to_compile_error().into(),
        }
    };

    if func.sig.inputs.len() != 2 {
        return syn::Error::new_spanned(
            &func.sig.inputs,
            "a component takes exactly `(hooks: &mut Hooks<'_>, props: &Props)`",
        )
        .to_compile_error()
        .into();
    }
    if matches!(func.sig.output, ReturnType::Default) {
        return syn::Error::new_spanned(&func.sig, "a component must return `Node`")
            .to_compile_error()
            .into();
    }
    if !func.sig.generics.params.is_empty() || func.sig.asyncness.is_some() {
        return syn::Error::new_spanned(
            &func.sig,
            "a component cannot be generic or async",
        )
        .to_compile_error()
        .into();
    }

    let vis = &func.vis;
    let attrs = &func.attrs;
    let ident = &func.sig.ident;
    let render_ident = Ident::new(&format!("__render_{}", ident), Span::call_site());

    let mut render_fn = func.clone();
    render_fn.attrs = vec![syn::parse_quote!(#[allow(non_snake_case)])];
    render_fn.vis = syn::Visibility::Inherited;
    render_fn.sig.ident = render_ident.clone();

    let expanded = quote! {
        #(#attrs)*
        #[allow(non_snake_case)]
        #vis fn #ident() -> ::fiber_core::Component {
            #render_fn

            ::std::thread_local! {
                static COMPONENT: ::fiber_core::Component =
                    ::fiber_core::Component::new(#name, #render_ident);
            }
            COMPONENT.with(::std::clone::Clone::clone)
        }
    };

    expanded.into()
}
