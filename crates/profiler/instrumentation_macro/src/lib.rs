extern crate proc_macro;
use proc_macro::TokenStream;
use quote::quote;
use syn::{
    parse::{Parse, ParseStream},
    parse_macro_input, parse_quote, Ident, ItemFn, LitStr, Result, Token,
};

/// Arguments of `#[profiler::function(...)]`.
///  - `pinned`        - statistic record of this function starts pinned.
///  - `name = "..."`  - overrides the scope name (default is `module_path::function_name`).
struct FunctionArgs {
    pinned: bool,
    name:   Option<LitStr>,
}

impl Parse for FunctionArgs {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut args = FunctionArgs { pinned: false, name: None };

        while !input.is_empty() {
            let ident: Ident = input.parse()?;
            if ident == "pinned" {
                args.pinned = true;
            } else if ident == "name" {
                input.parse::<Token![=]>()?;
                args.name = Some(input.parse()?);
            } else {
                return Err(syn::Error::new(ident.span(), "Expected `pinned` or `name = \"...\"`"));
            }

            if !input.is_empty() {
                input.parse::<Token![,]>()?;
            }
        }

        Ok(args)
    }
}

/// Wraps the body of a function into a profiler scope named after the function.
#[proc_macro_attribute]
pub fn function(attr: TokenStream, item: TokenStream) -> TokenStream {
    let mut function = parse_macro_input!(item as ItemFn);
    let args = parse_macro_input!(attr as FunctionArgs);

    let scope_name = match args.name {
        Some(name) => quote! { #name },
        None => {
            let function_name = function.sig.ident.to_string();
            quote! { concat!(module_path!(), "::", #function_name) }
        }
    };

    let body = &function.block;
    let new_body = if args.pinned {
        parse_quote! {
            {
                profiler::scope!(#scope_name, pinned);
                #body
            }
        }
    } else {
        parse_quote! {
            {
                profiler::scope!(#scope_name);
                #body
            }
        }
    };

    function.block = Box::new(new_body);

    (quote! {
        #function
    })
    .into()
}
