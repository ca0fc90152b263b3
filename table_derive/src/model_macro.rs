use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Error};

/// Re-emit the struct with the derives every stored model needs
///
/// Serde is routed through `vitrine`'s re-export so models compile without a
/// direct serde dependency.
pub fn model_attribute(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);

    if !matches!(input.data, Data::Struct(_)) {
        return Error::new_spanned(&input.ident, "model can only be used on structs")
            .to_compile_error()
            .into();
    }

    let expanded = quote! {
        #[derive(
            Debug,
            Clone,
            ::vitrine::serde::Serialize,
            ::vitrine::serde::Deserialize,
            ::vitrine::table_derive::TableMetadata
        )]
        #[serde(crate = "::vitrine::serde")]
        #input
    };

    TokenStream::from(expanded)
}
