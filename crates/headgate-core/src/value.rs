use serde::de::{self, DeserializeSeed, EnumAccess, MapAccess, SeqAccess, VariantAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::codec;
use crate::constants::MAX_VALUE_DEPTH;
use crate::error::HeadgateError;

/// Opaque state value stored per address and carried across the wire.
///
/// `Null` must stay the first variant: its encoding is `ABSENT_STATE_BYTES`.
/// Decoding refuses `List`/`Dictionary` nesting deeper than `MAX_VALUE_DEPTH`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum Value {
    /// No state recorded.
    Null,
    Bool(bool),
    Integer(i128),
    Binary(Vec<u8>),
    Text(String),
    List(Vec<Value>),
    Dictionary(BTreeMap<String, Value>),
}

impl Value {
    /// The sentinel returned when an address has no state.
    pub const ABSENT: Value = Value::Null;

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn encode(&self) -> Result<Vec<u8>, HeadgateError> {
        codec::encode(self)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, HeadgateError> {
        codec::decode(bytes)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i128> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_dictionary(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Dictionary(d) => Some(d),
            _ => None,
        }
    }
}

impl From<Option<Value>> for Value {
    fn from(v: Option<Value>) -> Self {
        v.unwrap_or(Value::ABSENT)
    }
}

// ── Depth-limited decoding ───────────────────────────────────────────────────

const VARIANTS: &[&str] = &["Null", "Bool", "Integer", "Binary", "Text", "List", "Dictionary"];

/// Largest capacity reserved up front from an untrusted length prefix.
const MAX_PREALLOC: usize = 4096;

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        ValueSeed { depth: 0 }.deserialize(deserializer)
    }
}

/// Variant index, accepted as a number (bincode) or a name.
struct Tag(u32);

impl<'de> Deserialize<'de> for Tag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TagVisitor;

        impl<'de> Visitor<'de> for TagVisitor {
            type Value = Tag;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a Value variant")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Tag, E> {
                u32::try_from(v)
                    .ok()
                    .filter(|i| (*i as usize) < VARIANTS.len())
                    .map(Tag)
                    .ok_or_else(|| E::invalid_value(de::Unexpected::Unsigned(v), &self))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Tag, E> {
                VARIANTS
                    .iter()
                    .position(|name| *name == v)
                    .map(|i| Tag(i as u32))
                    .ok_or_else(|| E::unknown_variant(v, VARIANTS))
            }
        }

        deserializer.deserialize_identifier(TagVisitor)
    }
}

/// Decodes one `Value` found `depth` containers below the root.
#[derive(Clone, Copy)]
struct ValueSeed {
    depth: usize,
}

impl ValueSeed {
    fn child<E: de::Error>(self) -> Result<Self, E> {
        if self.depth >= MAX_VALUE_DEPTH {
            return Err(E::custom(format!("value nested deeper than {MAX_VALUE_DEPTH}")));
        }
        Ok(ValueSeed { depth: self.depth + 1 })
    }
}

impl<'de> DeserializeSeed<'de> for ValueSeed {
    type Value = Value;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<Value, D::Error> {
        deserializer.deserialize_enum("Value", VARIANTS, self)
    }
}

impl<'de> Visitor<'de> for ValueSeed {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("enum Value")
    }

    fn visit_enum<A: EnumAccess<'de>>(self, data: A) -> Result<Value, A::Error> {
        let (Tag(tag), variant) = data.variant::<Tag>()?;
        match tag {
            0 => variant.unit_variant().map(|()| Value::Null),
            1 => variant.newtype_variant().map(Value::Bool),
            2 => variant.newtype_variant().map(Value::Integer),
            3 => variant.newtype_variant().map(Value::Binary),
            4 => variant.newtype_variant().map(Value::Text),
            5 => variant
                .newtype_variant_seed(ListSeed(self.child()?))
                .map(Value::List),
            _ => variant
                .newtype_variant_seed(DictionarySeed(self.child()?))
                .map(Value::Dictionary),
        }
    }
}

/// Elements of a `List`, each decoded with the carried seed.
struct ListSeed(ValueSeed);

impl<'de> DeserializeSeed<'de> for ListSeed {
    type Value = Vec<Value>;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<Vec<Value>, D::Error> {
        deserializer.deserialize_seq(self)
    }
}

impl<'de> Visitor<'de> for ListSeed {
    type Value = Vec<Value>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a list of values")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Vec<Value>, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0).min(MAX_PREALLOC));
        while let Some(item) = seq.next_element_seed(self.0)? {
            items.push(item);
        }
        Ok(items)
    }
}

/// Entries of a `Dictionary`, values decoded with the carried seed.
struct DictionarySeed(ValueSeed);

impl<'de> DeserializeSeed<'de> for DictionarySeed {
    type Value = BTreeMap<String, Value>;

    fn deserialize<D: Deserializer<'de>>(
        self,
        deserializer: D,
    ) -> Result<BTreeMap<String, Value>, D::Error> {
        deserializer.deserialize_map(self)
    }
}

impl<'de> Visitor<'de> for DictionarySeed {
    type Value = BTreeMap<String, Value>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a dictionary of values")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<BTreeMap<String, Value>, A::Error> {
        let mut entries = BTreeMap::new();
        while let Some(key) = map.next_key::<String>()? {
            let value = map.next_value_seed(self.0)?;
            entries.insert(key, value);
        }
        Ok(entries)
    }
}
