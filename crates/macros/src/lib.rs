//! Marker macros for remote functions.
//!
//! Neither macro generates code. They check their arguments at compile time,
//! with the same parser the `relay-codegen` build step uses, and hand the item
//! back unchanged:
//! * `#[remote_function]` - marks a function for adapter generation
//! * `default_access!` - declares the program-wide default access level

use proc_macro::TokenStream;

/// Marker argument validation.
mod marker;

/// Marks a function or method to be exposed through a generated adapter.
///
/// ```ignore
/// #[remote_function(name = "GrantReward", access = Open)]
/// pub async fn grant_reward(client: ServiceClient, player: String, request: GrantRequest) -> Reward {
///     // ...
/// }
/// ```
///
/// Both arguments are optional. `name` overrides the exposed name (default: the
/// function name) and `access` is one of `Unspecified`, `Restricted` or `Open`.
#[proc_macro_attribute]
pub fn remote_function(attr: TokenStream, item: TokenStream) -> TokenStream {
	marker::remote_function(attr.into(), item.into()).into()
}

/// Declares the default access level. Exactly one is expected per program.
///
/// ```ignore
/// relay_macros::default_access!(Restricted);
/// ```
#[proc_macro]
pub fn default_access(input: TokenStream) -> TokenStream {
	marker::default_access(input.into()).into()
}
