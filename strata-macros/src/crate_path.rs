//! Crate path resolution for generated code.
//!
//! Detects whether the user depends on `strata` (facade) or `strata-data`
//! directly, and returns the appropriate path prefix for generated code.

use proc_macro2::TokenStream;
use proc_macro_crate::{crate_name, FoundCrate};
use quote::quote;

/// Returns the token stream for accessing `strata_data` types.
///
/// If the user depends on `strata`, returns `::strata::strata_data`.
/// Otherwise returns `::strata_data`.
pub fn strata_data_path() -> TokenStream {
    if let Ok(found) = crate_name("strata") {
        match found {
            FoundCrate::Itself => quote!(crate::strata_data),
            FoundCrate::Name(name) => {
                let ident = syn::Ident::new(&name, proc_macro2::Span::call_site());
                quote!(::#ident::strata_data)
            }
        }
    } else if let Ok(found) = crate_name("strata-data") {
        match found {
            FoundCrate::Itself => quote!(crate),
            FoundCrate::Name(name) => {
                let ident = syn::Ident::new(&name, proc_macro2::Span::call_site());
                quote!(::#ident)
            }
        }
    } else {
        // Fallback - assume strata_data is available (for error messages)
        quote!(::strata_data)
    }
}
