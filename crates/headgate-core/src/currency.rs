use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::constants::{
    CURRENCY_DECIMALS_KEY, CURRENCY_MINTERS_KEY, CURRENCY_TICKER_KEY, HASH_LEN,
    MAX_CURRENCY_BYTES,
};
use crate::error::HeadgateError;
use crate::types::Address;
use crate::value::Value;

/// A token denomination.
///
/// Two currencies are the same only if every field matches, decimal places
/// and minter set included. Balances are keyed by `CurrencyId`, the BLAKE3 of
/// the serialized descriptor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    pub ticker: String,
    pub decimal_places: u8,
    /// `None` means anyone may mint; `Some(empty)` means nobody can.
    pub minters: Option<BTreeSet<Address>>,
}

/// 32-byte currency identity.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CurrencyId(pub [u8; HASH_LEN]);

impl fmt::Debug for CurrencyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CurrencyId({}…)", &hex::encode(self.0)[..16])
    }
}

impl Currency {
    pub fn new(ticker: impl Into<String>, decimal_places: u8) -> Self {
        Self {
            ticker: ticker.into(),
            decimal_places,
            minters: None,
        }
    }

    pub fn with_minters(mut self, minters: impl IntoIterator<Item = Address>) -> Self {
        self.minters = Some(minters.into_iter().collect());
        self
    }

    pub fn to_value(&self) -> Value {
        let minters = match &self.minters {
            None => Value::Null,
            Some(set) => Value::List(
                set.iter()
                    .map(|a| Value::Binary(a.as_bytes().to_vec()))
                    .collect(),
            ),
        };
        let mut dict = BTreeMap::new();
        dict.insert(CURRENCY_TICKER_KEY.to_string(), Value::Text(self.ticker.clone()));
        dict.insert(
            CURRENCY_DECIMALS_KEY.to_string(),
            Value::Integer(i128::from(self.decimal_places)),
        );
        dict.insert(CURRENCY_MINTERS_KEY.to_string(), minters);
        Value::Dictionary(dict)
    }

    pub fn from_value(value: &Value) -> Result<Self, HeadgateError> {
        let dict = value
            .as_dictionary()
            .ok_or_else(|| HeadgateError::Decode("currency must be a dictionary".into()))?;

        let ticker = dict
            .get(CURRENCY_TICKER_KEY)
            .and_then(Value::as_text)
            .ok_or_else(|| HeadgateError::Decode("currency ticker missing".into()))?
            .to_string();

        let decimal_places = dict
            .get(CURRENCY_DECIMALS_KEY)
            .and_then(Value::as_integer)
            .and_then(|d| u8::try_from(d).ok())
            .ok_or_else(|| HeadgateError::Decode("currency decimals missing or out of range".into()))?;

        let minters = match dict.get(CURRENCY_MINTERS_KEY) {
            None | Some(Value::Null) => None,
            Some(Value::List(items)) => {
                let mut set = BTreeSet::new();
                for item in items {
                    let Value::Binary(bytes) = item else {
                        return Err(HeadgateError::Decode("minter must be binary".into()));
                    };
                    set.insert(Address::from_slice(bytes)?);
                }
                Some(set)
            }
            Some(_) => return Err(HeadgateError::Decode("minters must be a list".into())),
        };

        Ok(Self {
            ticker,
            decimal_places,
            minters,
        })
    }

    pub fn encode(&self) -> Result<Vec<u8>, HeadgateError> {
        self.to_value().encode()
    }

    /// Decode a client-supplied currency descriptor.
    pub fn decode(bytes: &[u8]) -> Result<Self, HeadgateError> {
        if bytes.len() > MAX_CURRENCY_BYTES {
            return Err(HeadgateError::Decode(format!(
                "currency descriptor exceeds {MAX_CURRENCY_BYTES} bytes"
            )));
        }
        Self::from_value(&Value::decode(bytes)?)
    }

    pub fn id(&self) -> Result<CurrencyId, HeadgateError> {
        Ok(CurrencyId(*blake3::hash(&self.encode()?).as_bytes()))
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} dp)", self.ticker, self.decimal_places)
    }
}

/// A balance: raw integer amount in the currency's smallest unit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FungibleAssetValue {
    pub currency: Currency,
    pub raw_value: i128,
}

impl FungibleAssetValue {
    pub fn new(currency: Currency, raw_value: i128) -> Self {
        Self { currency, raw_value }
    }

    pub fn zero(currency: Currency) -> Self {
        Self::new(currency, 0)
    }

    /// Wire form: a two-element list `[currency, amount]`.
    pub fn to_value(&self) -> Value {
        Value::List(vec![
            self.currency.to_value(),
            Value::Integer(self.raw_value),
        ])
    }

    pub fn encode(&self) -> Result<Vec<u8>, HeadgateError> {
        self.to_value().encode()
    }
}
