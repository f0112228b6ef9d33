mod ident;
mod symbol;

pub use ident::{is_identifier, is_qualified_name};
pub use symbol::{IntoSymbol, Symbol};
