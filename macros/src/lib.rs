use proc_macro::TokenStream;
use quote::quote;
use syn::{Ident, ItemFn, LitStr, parse_macro_input, spanned::Spanned};

const USAGE: &str = "rxcore_macro::test only accepts: #[rxcore_macro::test], \
                     #[rxcore_macro::test(local)], #[rxcore_macro::test(shared)], or string \
                     equivalents";

fn flavor(name: &str) -> Option<proc_macro2::TokenStream> {
  match name {
    "local" => Some(quote!(flavor = "current_thread")),
    "shared" => Some(quote!(flavor = "multi_thread", worker_threads = 2)),
    _ => None,
  }
}

/// Marks a test function.
///
/// Sync functions become plain `#[test]`s. Async functions run on a tokio
/// runtime; `local` selects a current-thread runtime and `shared` a
/// multi-threaded one.
#[proc_macro_attribute]
pub fn test(attr: TokenStream, item: TokenStream) -> TokenStream {
  let input = parse_macro_input!(item as ItemFn);
  let is_async = input.sig.asyncness.is_some();

  let raw_args = proc_macro2::TokenStream::from(attr);
  let tokio_args = if raw_args.is_empty() {
    proc_macro2::TokenStream::new()
  } else {
    if !is_async {
      return TokenStream::from(
        syn::Error::new(
          raw_args.span(),
          "rxcore_macro::test flavor args are only supported for async tests",
        )
        .to_compile_error(),
      );
    }

    let parsed = if let Ok(ident) = syn::parse2::<Ident>(raw_args.clone()) {
      flavor(&ident.to_string()).ok_or_else(|| syn::Error::new(ident.span(), USAGE))
    } else if let Ok(lit) = syn::parse2::<LitStr>(raw_args.clone()) {
      flavor(&lit.value()).ok_or_else(|| syn::Error::new(lit.span(), USAGE))
    } else {
      Err(syn::Error::new(raw_args.span(), USAGE))
    };

    match parsed {
      Ok(args) => args,
      Err(err) => return TokenStream::from(err.to_compile_error()),
    }
  };

  let attr = match (is_async, tokio_args.is_empty()) {
    (false, _) => quote!(#[test]),
    (true, true) => quote!(#[tokio::test]),
    (true, false) => quote!(#[tokio::test(#tokio_args)]),
  };

  let expanded = quote! {
    #attr
    #input
  };

  TokenStream::from(expanded)
}
