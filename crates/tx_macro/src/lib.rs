extern crate proc_macro;

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, FnArg, ItemFn, PatType, Receiver};

/// Runs the annotated service method inside a MongoDB transaction bound to
/// its `session` argument. The body is moved into `<name>_inner`, which can
/// be called directly from code already running in a transaction.
///
/// The method error type must implement `From<mongodb::error::Error>`.
#[proc_macro_attribute]
pub fn tx(_args: TokenStream, input: TokenStream) -> TokenStream {
    let input_fn = parse_macro_input!(input as ItemFn);
    let vis = &input_fn.vis;
    let attrs = &input_fn.attrs;
    let block = &input_fn.block;
    let fn_name = &input_fn.sig.ident;
    let fn_args = &input_fn.sig.inputs;
    let fn_return = &input_fn.sig.output;
    let (impl_generics, _, where_clause) = input_fn.sig.generics.split_for_impl();

    let arg_list: Vec<_> = fn_args
        .iter()
        .map(|arg| match arg {
            FnArg::Typed(PatType { pat, .. }) => quote! { #pat },
            FnArg::Receiver(Receiver { reference, .. }) => {
                if reference.is_some() {
                    quote!(&self)
                } else {
                    quote!(self)
                }
            }
        })
        .collect();

    let name = fn_name.to_string();
    let inner_fn_name = quote::format_ident!("{}_inner", fn_name);
    let gen = quote! {
        #vis async fn #inner_fn_name #impl_generics (#fn_args) #fn_return #where_clause {
            #block
        }

        #(#attrs)*
        #vis async fn #fn_name #impl_generics (#fn_args) #fn_return #where_clause {
            session.start_transaction().await?;
            match Self::#inner_fn_name(#(#arg_list),*).await {
                Ok(result) => {
                    session.commit_transaction().await?;
                    Ok(result)
                }
                Err(err) => {
                    ::log::debug!("{}: transaction aborted", #name);
                    session.abort_transaction().await?;
                    Err(err)
                }
            }
        }
    };

    TokenStream::from(gen)
}
