//! JSON-Cadence: the wire format for script/transaction arguments and
//! for script results.

use std::fmt;
use std::str::FromStr;

use serde_json::{json, Value as Json};

use crate::error::{Error, Result};
use crate::transaction::Address;

/// A typed argument passed to a script or transaction.
#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
	Int(String),
	UInt64(u64),
	/// Normalised to eight decimal places.
	UFix64(String),
	String(String),
	Address(Address),
	Bool(bool),
}

impl Argument {
	pub fn to_json(&self) -> Json {
		match self {
			Self::Int(v) => json!({ "type": "Int", "value": v }),
			Self::UInt64(v) => json!({ "type": "UInt64", "value": v.to_string() }),
			Self::UFix64(v) => json!({ "type": "UFix64", "value": v }),
			Self::String(v) => json!({ "type": "String", "value": v }),
			Self::Address(v) => json!({ "type": "Address", "value": v.to_string() }),
			Self::Bool(v) => json!({ "type": "Bool", "value": v }),
		}
	}

	/// Bytes as they appear in a transaction's argument list.
	pub fn encode(&self) -> Vec<u8> {
		self.to_json().to_string().into_bytes()
	}
}

impl FromStr for Argument {
	type Err = Error;

	/// Parse `Type:value`, e.g. `Int:10` or `Address:0x01cf0e2f2f715450`.
	fn from_str(s: &str) -> Result<Self> {
		let invalid = || Error::InvalidArgument(s.to_owned());
		let (ty, value) = s.split_once(':').ok_or_else(invalid)?;

		match ty {
			"Int" => {
				let digits = value.strip_prefix('-').unwrap_or(value);
				if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
					return Err(invalid());
				}
				Ok(Self::Int(value.to_owned()))
			}
			"UInt64" => value.parse().map(Self::UInt64).map_err(|_| invalid()),
			"UFix64" => normalise_ufix64(value).map(Self::UFix64).ok_or_else(invalid),
			"String" => Ok(Self::String(value.to_owned())),
			"Address" => value.parse().map(Self::Address).map_err(|_| invalid()),
			"Bool" => value.parse().map(Self::Bool).map_err(|_| invalid()),
			_ => Err(invalid()),
		}
	}
}

fn normalise_ufix64(value: &str) -> Option<String> {
	let (int, frac) = value.split_once('.').unwrap_or((value, ""));
	let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
	if int.is_empty() || !all_digits(int) || !all_digits(frac) || frac.len() > 8 {
		return None;
	}
	Some(format!("{int}.{frac:0<8}"))
}

/// A decoded Cadence value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
	Void,
	Optional(Option<Box<Value>>),
	Bool(bool),
	String(String),
	Address(String),
	/// Any integer or fixed-point type; `kind` is the Cadence type name.
	Number { kind: String, value: String },
	Array(Vec<Value>),
	Dictionary(Vec<(Value, Value)>),
	/// Struct, Resource, Event, Contract or Enum.
	Composite {
		kind: String,
		id: String,
		fields: Vec<(String, Value)>,
	},
	Path { domain: String, identifier: String },
	Type(String),
	/// Kinds this client does not interpret (capabilities, functions...).
	Other(Json),
}

const NUMBER_KINDS: &[&str] = &[
	"Int", "Int8", "Int16", "Int32", "Int64", "Int128", "Int256", "UInt", "UInt8", "UInt16",
	"UInt32", "UInt64", "UInt128", "UInt256", "Word8", "Word16", "Word32", "Word64", "Fix64",
	"UFix64",
];

const COMPOSITE_KINDS: &[&str] = &["Struct", "Resource", "Event", "Contract", "Enum"];

impl Value {
	/// Decode raw JSON-Cadence bytes.
	pub fn decode(bytes: &[u8]) -> Result<Self> {
		let json: Json = serde_json::from_slice(bytes).map_err(|e| Error::Decode(e.to_string()))?;
		Self::from_json(&json)
	}

	pub fn from_json(json: &Json) -> Result<Self> {
		let kind = json
			.get("type")
			.and_then(Json::as_str)
			.ok_or_else(|| Error::Decode(format!("missing `type` in {json}")))?;
		let value = json.get("value").unwrap_or(&Json::Null);

		let decoded = match kind {
			"Void" => Self::Void,
			"Optional" => match value {
				Json::Null => Self::Optional(None),
				inner => Self::Optional(Some(Box::new(Self::from_json(inner)?))),
			},
			"Bool" => Self::Bool(value.as_bool().ok_or_else(|| bad(kind, value))?),
			"String" | "Character" => Self::String(as_string(kind, value)?),
			"Address" => Self::Address(as_string(kind, value)?),
			k if NUMBER_KINDS.contains(&k) => Self::Number {
				kind: k.to_owned(),
				value: as_string(kind, value)?,
			},
			"Array" => Self::Array(
				value
					.as_array()
					.ok_or_else(|| bad(kind, value))?
					.iter()
					.map(Self::from_json)
					.collect::<Result<_>>()?,
			),
			"Dictionary" => Self::Dictionary(
				value
					.as_array()
					.ok_or_else(|| bad(kind, value))?
					.iter()
					.map(|entry| -> Result<(Value, Value)> {
						let k = entry.get("key").ok_or_else(|| bad(kind, entry))?;
						let v = entry.get("value").ok_or_else(|| bad(kind, entry))?;
						Ok((Self::from_json(k)?, Self::from_json(v)?))
					})
					.collect::<Result<_>>()?,
			),
			k if COMPOSITE_KINDS.contains(&k) => {
				let id = value
					.get("id")
					.and_then(Json::as_str)
					.ok_or_else(|| bad(kind, value))?
					.to_owned();
				let fields = value
					.get("fields")
					.and_then(Json::as_array)
					.map(Vec::as_slice)
					.unwrap_or_default()
					.iter()
					.map(|f| -> Result<(String, Value)> {
						let name = f.get("name").and_then(Json::as_str).ok_or_else(|| bad(kind, f))?;
						let v = f.get("value").ok_or_else(|| bad(kind, f))?;
						Ok((name.to_owned(), Self::from_json(v)?))
					})
					.collect::<Result<_>>()?;
				Self::Composite {
					kind: k.to_owned(),
					id,
					fields,
				}
			}
			"Path" => Self::Path {
				domain: value.get("domain").and_then(Json::as_str).unwrap_or_default().to_owned(),
				identifier: value
					.get("identifier")
					.and_then(Json::as_str)
					.unwrap_or_default()
					.to_owned(),
			},
			"Type" => {
				let st = value.get("staticType").unwrap_or(&Json::Null);
				let id = st
					.as_str()
					.or_else(|| st.get("typeID").and_then(Json::as_str))
					.map(str::to_owned)
					.unwrap_or_else(|| st.to_string());
				Self::Type(id)
			}
			_ => Self::Other(json.clone()),
		};

		Ok(decoded)
	}
}

fn as_string(kind: &str, value: &Json) -> Result<String> {
	value
		.as_str()
		.map(str::to_owned)
		.ok_or_else(|| bad(kind, value))
}

fn bad(kind: &str, value: &Json) -> Error {
	Error::Decode(format!("malformed {kind} value: {value}"))
}

impl fmt::Display for Value {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Void => write!(f, "()"),
			Self::Optional(None) => write!(f, "nil"),
			Self::Optional(Some(v)) => write!(f, "{v}"),
			Self::Bool(b) => write!(f, "{b}"),
			Self::String(s) => write!(f, "{s:?}"),
			Self::Address(a) => write!(f, "{a}"),
			Self::Number { value, .. } => write!(f, "{value}"),
			Self::Array(items) => {
				write!(f, "[")?;
				for (i, v) in items.iter().enumerate() {
					if i > 0 {
						write!(f, ", ")?;
					}
					write!(f, "{v}")?;
				}
				write!(f, "]")
			}
			Self::Dictionary(entries) => {
				write!(f, "{{")?;
				for (i, (k, v)) in entries.iter().enumerate() {
					if i > 0 {
						write!(f, ", ")?;
					}
					write!(f, "{k}: {v}")?;
				}
				write!(f, "}}")
			}
			Self::Composite { id, fields, .. } => {
				write!(f, "{id}(")?;
				for (i, (name, v)) in fields.iter().enumerate() {
					if i > 0 {
						write!(f, ", ")?;
					}
					write!(f, "{name}: {v}")?;
				}
				write!(f, ")")
			}
			Self::Path { domain, identifier } => write!(f, "/{domain}/{identifier}"),
			Self::Type(id) => write!(f, "Type<{id}>()"),
			Self::Other(json) => write!(f, "{json}"),
		}
	}
}
