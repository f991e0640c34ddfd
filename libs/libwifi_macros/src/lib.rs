use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

mod inner;

/// A little helper derive macro to implement the `libwifi::Addresses` and `libwifi::Header`
/// traits for frames that carry their header in a field called `header`.
///
/// This macro is only designed for internal usage in the libwifi crate.
///
/// How to use:
/// ```rust,ignore
/// #[derive(Clone, Debug, AddressHeader)]
/// pub struct AssociationRequest {
///     pub header: ManagementHeader,
///     pub capability_info: CapabilityInfo,
///     pub listen_interval: u16,
///     pub station_info: StationInfo,
/// }
/// ```
///
/// Both generated impls simply delegate to the header, which knows how to interpret
/// its addresses depending on the `to_ds`/`from_ds` flags.
#[proc_macro_derive(AddressHeader)]
pub fn address_header(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let toks = inner::address_header_inner(&input).unwrap_or_else(|err| err.to_compile_error());

    toks.into()
}
