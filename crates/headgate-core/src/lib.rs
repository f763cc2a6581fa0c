pub mod codec;
pub mod constants;
pub mod currency;
pub mod error;
pub mod transaction;
pub mod types;
pub mod value;

pub use constants::*;
pub use currency::{Currency, CurrencyId, FungibleAssetValue};
pub use error::{HeadgateError, InvalidTxError};
pub use transaction::*;
pub use types::*;
pub use value::Value;
