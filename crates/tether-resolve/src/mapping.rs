//! The mapping table from schema types to their cross-boundary representation.

use std::fmt;

use serde::Serialize;
use tether_syntax::{Primitive, TypeRef};

/// A schema type after resolution, as it crosses the boundary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "of", rename_all = "snake_case")]
pub enum CanonicalType {
    Boolean,
    /// Always a 64-bit float.
    Number,
    String,
    ArrayBuffer,
    Void,
    Array(Box<CanonicalType>),
    Nullable(Box<CanonicalType>),
    Promise(Box<CanonicalType>),
    /// Generated record, by Rust type name.
    Record(String),
    /// Generated enum, by Rust type name.
    Enum(String),
}

impl CanonicalType {
    /// Map a schema type, naming records and enums through `name_of`.
    ///
    /// Returns `None` for a notification type, which never crosses the boundary
    /// as a value, and for references `name_of` does not know.
    pub fn map(ty: &TypeRef, name_of: &impl Fn(&str) -> Option<String>) -> Option<CanonicalType> {
        let mapped = match ty {
            TypeRef::Primitive(Primitive::Boolean) => CanonicalType::Boolean,
            TypeRef::Primitive(Primitive::Number) => CanonicalType::Number,
            TypeRef::Primitive(Primitive::String) => CanonicalType::String,
            TypeRef::Primitive(Primitive::ArrayBuffer) => CanonicalType::ArrayBuffer,
            TypeRef::Void => CanonicalType::Void,
            TypeRef::Array(inner) => CanonicalType::Array(Box::new(Self::map(inner, name_of)?)),
            TypeRef::Nullable(inner) => CanonicalType::Nullable(Box::new(Self::map(inner, name_of)?)),
            TypeRef::Deferred(inner) => CanonicalType::Promise(Box::new(Self::map(inner, name_of)?)),
            TypeRef::Record(name) => CanonicalType::Record(name_of(name)?),
            TypeRef::Enum(name) => CanonicalType::Enum(name_of(name)?),
            TypeRef::Notification(_) => return None,
        };
        Some(mapped)
    }

    /// The Rust type generated code uses for this value.
    pub fn rust_type(&self) -> String {
        match self {
            CanonicalType::Boolean => "bool".into(),
            CanonicalType::Number => "f64".into(),
            CanonicalType::String => "String".into(),
            CanonicalType::ArrayBuffer => "tether_rt::ArrayBuffer".into(),
            CanonicalType::Void => "()".into(),
            CanonicalType::Array(inner) => format!("Vec<{}>", inner.rust_type()),
            CanonicalType::Nullable(inner) => format!("tether_rt::Nullable<{}>", inner.rust_type()),
            CanonicalType::Promise(inner) => format!("tether_rt::Promise<{}>", inner.rust_type()),
            CanonicalType::Record(name) | CanonicalType::Enum(name) => name.clone(),
        }
    }

    /// The value carried by a `Promise`, or the type itself.
    pub fn settled(&self) -> &CanonicalType {
        match self {
            CanonicalType::Promise(inner) => inner,
            other => other,
        }
    }

    pub fn is_promise(&self) -> bool {
        matches!(self, CanonicalType::Promise(_))
    }

    pub fn is_void(&self) -> bool {
        matches!(self, CanonicalType::Void)
    }

    /// Every record this type contains, through arrays and nullables.
    pub fn records(&self) -> Vec<&str> {
        match self {
            CanonicalType::Record(name) => vec![name.as_str()],
            CanonicalType::Array(inner) | CanonicalType::Nullable(inner) | CanonicalType::Promise(inner) => {
                inner.records()
            }
            _ => Vec::new(),
        }
    }
}

impl fmt::Display for CanonicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.rust_type())
    }
}

/// The typed channel a notification payload travels through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// No payload.
    Unit,
    /// A scalar, record, enum or nullable payload, marshalled as a host value.
    Value,
    NumberArray,
    StringArray,
    Bytes,
}

impl Channel {
    pub fn for_payload(payload: Option<&CanonicalType>) -> Channel {
        match payload {
            None => Channel::Unit,
            Some(CanonicalType::ArrayBuffer) => Channel::Bytes,
            Some(CanonicalType::Array(inner)) => match **inner {
                CanonicalType::Number => Channel::NumberArray,
                CanonicalType::String => Channel::StringArray,
                _ => Channel::Value,
            },
            Some(_) => Channel::Value,
        }
    }

    /// Name of the matching runtime `PayloadKind` variant.
    pub fn variant(self) -> &'static str {
        match self {
            Channel::Unit => "Unit",
            Channel::Value => "Value",
            Channel::NumberArray => "NumberArray",
            Channel::StringArray => "StringArray",
            Channel::Bytes => "Bytes",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(name: &str) -> Option<String> {
        (name == "ProgressEvent").then(|| "ProgressEvent".to_string())
    }

    #[test]
    fn test_mapping_table() {
        let cases = [
            (TypeRef::Primitive(Primitive::Boolean), "bool"),
            (TypeRef::Primitive(Primitive::Number), "f64"),
            (TypeRef::Primitive(Primitive::String), "String"),
            (TypeRef::Primitive(Primitive::ArrayBuffer), "tether_rt::ArrayBuffer"),
            (TypeRef::Void, "()"),
            (TypeRef::array(TypeRef::Primitive(Primitive::Number)), "Vec<f64>"),
            (
                TypeRef::nullable(TypeRef::Record("ProgressEvent".into())),
                "tether_rt::Nullable<ProgressEvent>",
            ),
            (
                TypeRef::deferred(TypeRef::array(TypeRef::Primitive(Primitive::String))),
                "tether_rt::Promise<Vec<String>>",
            ),
        ];
        for (ty, expected) in cases {
            let mapped = CanonicalType::map(&ty, &names).unwrap();
            assert_eq!(mapped.rust_type(), expected, "{ty}");
        }
    }

    #[test]
    fn test_unmappable() {
        assert_eq!(CanonicalType::map(&TypeRef::Notification(None), &names), None);
        assert_eq!(CanonicalType::map(&TypeRef::Record("Missing".into()), &names), None);
    }

    #[test]
    fn test_channels() {
        let number_array = CanonicalType::Array(Box::new(CanonicalType::Number));
        let record_array = CanonicalType::Array(Box::new(CanonicalType::Record("P".into())));
        assert_eq!(Channel::for_payload(None), Channel::Unit);
        assert_eq!(Channel::for_payload(Some(&number_array)), Channel::NumberArray);
        assert_eq!(Channel::for_payload(Some(&record_array)), Channel::Value);
        assert_eq!(Channel::for_payload(Some(&CanonicalType::ArrayBuffer)), Channel::Bytes);
        assert_eq!(Channel::for_payload(Some(&CanonicalType::Number)), Channel::Value);
    }
}
