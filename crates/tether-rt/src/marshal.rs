//! Conversions between [`HostValue`] and the Rust types generated code uses.
//!
//! Every conversion is total: a value either converts or yields a
//! [`MarshalError`] naming what was expected and where.

use indexmap::IndexMap;

use crate::error::MarshalError;
use crate::value::{ArrayBuffer, HostValue, Nullable};

/// Decode a host value into `Self`.
pub trait FromHost: Sized {
    fn from_host(value: HostValue) -> Result<Self, MarshalError>;
}

/// Encode `self` as a host value.
pub trait IntoHost {
    fn into_host(self) -> HostValue;
}

impl FromHost for HostValue {
    fn from_host(value: HostValue) -> Result<Self, MarshalError> {
        Ok(value)
    }
}

impl IntoHost for HostValue {
    fn into_host(self) -> HostValue {
        self
    }
}

impl FromHost for bool {
    fn from_host(value: HostValue) -> Result<Self, MarshalError> {
        match value {
            HostValue::Bool(b) => Ok(b),
            other => Err(MarshalError::mismatch("boolean", &other)),
        }
    }
}

impl IntoHost for bool {
    fn into_host(self) -> HostValue {
        HostValue::Bool(self)
    }
}

impl FromHost for f64 {
    fn from_host(value: HostValue) -> Result<Self, MarshalError> {
        match value {
            HostValue::Number(n) => Ok(n),
            other => Err(MarshalError::mismatch("number", &other)),
        }
    }
}

impl IntoHost for f64 {
    fn into_host(self) -> HostValue {
        HostValue::Number(self)
    }
}

impl FromHost for String {
    fn from_host(value: HostValue) -> Result<Self, MarshalError> {
        match value {
            HostValue::String(s) => Ok(s),
            other => Err(MarshalError::mismatch("string", &other)),
        }
    }
}

impl IntoHost for String {
    fn into_host(self) -> HostValue {
        HostValue::String(self)
    }
}

impl FromHost for () {
    fn from_host(value: HostValue) -> Result<Self, MarshalError> {
        match value {
            HostValue::Undefined | HostValue::Null => Ok(()),
            other => Err(MarshalError::mismatch("undefined", &other)),
        }
    }
}

impl IntoHost for () {
    fn into_host(self) -> HostValue {
        HostValue::Undefined
    }
}

impl FromHost for ArrayBuffer {
    fn from_host(value: HostValue) -> Result<Self, MarshalError> {
        match value {
            HostValue::ArrayBuffer(bytes) => Ok(ArrayBuffer::new(bytes)),
            other => Err(MarshalError::mismatch("ArrayBuffer", &other)),
        }
    }
}

impl IntoHost for ArrayBuffer {
    fn into_host(self) -> HostValue {
        HostValue::ArrayBuffer(self.into_vec())
    }
}

impl<T: FromHost> FromHost for Vec<T> {
    fn from_host(value: HostValue) -> Result<Self, MarshalError> {
        match value {
            HostValue::Array(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| T::from_host(item).map_err(|e| e.at_index(i)))
                .collect(),
            other => Err(MarshalError::mismatch("array", &other)),
        }
    }
}

impl<T: IntoHost> IntoHost for Vec<T> {
    fn into_host(self) -> HostValue {
        HostValue::Array(self.into_iter().map(IntoHost::into_host).collect())
    }
}

/// `null` and `undefined` both decode to an absent value.
impl<T: FromHost> FromHost for Nullable<T> {
    fn from_host(value: HostValue) -> Result<Self, MarshalError> {
        if value.is_nullish() {
            Ok(Nullable::none())
        } else {
            T::from_host(value).map(Nullable::some)
        }
    }
}

impl<T: IntoHost> IntoHost for Nullable<T> {
    fn into_host(self) -> HostValue {
        match self.into_value() {
            Some(value) => value.into_host(),
            None => HostValue::Null,
        }
    }
}

/// Decode a number that must carry an integral value, as numeric enums do.
pub fn integral(value: HostValue) -> Result<i64, MarshalError> {
    let n = f64::from_host(value)?;
    if n.is_finite() && n.fract() == 0.0 && n.abs() <= i64::MAX as f64 {
        Ok(n as i64)
    } else {
        Err(MarshalError::NotIntegral(n))
    }
}

/// Positional arguments of one call.
#[derive(Debug)]
pub struct Args {
    values: std::vec::IntoIter<HostValue>,
    index: usize,
}

impl Args {
    /// Fails when the host passed more arguments than the method declares.
    pub fn new(values: Vec<HostValue>, expected: usize) -> Result<Self, MarshalError> {
        if values.len() > expected {
            return Err(MarshalError::ArgumentCount { expected, found: values.len() });
        }
        Ok(Args { values: values.into_iter(), index: 0 })
    }

    /// Decode the next argument. A missing trailing argument is only
    /// accepted when its type admits `undefined`.
    pub fn next<T: FromHost>(&mut self, name: &'static str) -> Result<T, MarshalError> {
        let index = self.index;
        self.index += 1;
        match self.values.next() {
            Some(value) => T::from_host(value).map_err(|e| e.in_argument(name)),
            None => T::from_host(HostValue::Undefined)
                .map_err(|_| MarshalError::MissingArgument { index, name }),
        }
    }
}

/// Properties of one record being decoded.
#[derive(Debug)]
pub struct Fields {
    map: IndexMap<String, HostValue>,
}

impl Fields {
    pub fn new(value: HostValue) -> Result<Self, MarshalError> {
        match value {
            HostValue::Object(map) => Ok(Fields { map }),
            other => Err(MarshalError::mismatch("object", &other)),
        }
    }

    /// Decode a field. Absent fields are only accepted for nullable types.
    pub fn take<T: FromHost>(&mut self, name: &'static str) -> Result<T, MarshalError> {
        match self.map.shift_remove(name) {
            Some(value) => T::from_host(value).map_err(|e| e.in_field(name)),
            None => T::from_host(HostValue::Undefined).map_err(|_| MarshalError::MissingField(name)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nullable_round_trip() {
        let present: Nullable<String> = Nullable::some("x".to_string());
        assert_eq!(present.clone().into_host(), HostValue::from("x"));
        assert_eq!(Nullable::<String>::from_host(present.into_host()), Ok(Nullable::some("x".to_string())));

        let absent: Nullable<String> = Nullable::none();
        assert_eq!(absent.clone().into_host(), HostValue::Null);
        assert_eq!(Nullable::<String>::from_host(HostValue::Null), Ok(absent.clone()));
        assert_eq!(Nullable::<String>::from_host(HostValue::Undefined), Ok(absent));
    }

    #[test]
    fn test_nullable_rejects_wrong_inner_type() {
        let err = Nullable::<f64>::from_host(HostValue::from("1")).unwrap_err();
        assert_eq!(err, MarshalError::TypeMismatch { expected: "number", found: "string" });
    }

    #[test]
    fn test_array_reports_index() {
        let value = HostValue::Array(vec![HostValue::Number(1.0), HostValue::Bool(true)]);
        let err = Vec::<f64>::from_host(value).unwrap_err();
        assert_eq!(err.to_string(), "at index 1: expected number, found boolean");
    }

    #[test]
    fn test_integral() {
        assert_eq!(integral(HostValue::Number(5.0)), Ok(5));
        assert_eq!(integral(HostValue::Number(-2.0)), Ok(-2));
        assert_eq!(integral(HostValue::Number(1.5)), Err(MarshalError::NotIntegral(1.5)));
        assert!(integral(HostValue::Number(f64::NAN)).is_err());
    }

    #[test]
    fn test_args_arity() {
        let err = Args::new(vec![HostValue::Null; 3], 2).unwrap_err();
        assert_eq!(err, MarshalError::ArgumentCount { expected: 2, found: 3 });

        let mut args = Args::new(vec![HostValue::Number(1.0)], 3).unwrap();
        assert_eq!(args.next::<f64>("a"), Ok(1.0));
        assert_eq!(args.next::<Nullable<f64>>("b"), Ok(Nullable::none()));
        assert_eq!(args.next::<f64>("c"), Err(MarshalError::MissingArgument { index: 2, name: "c" }));
    }

    #[test]
    fn test_fields() {
        let value = HostValue::object([("x", HostValue::Number(1.0)), ("label", HostValue::Bool(false))]);
        let mut fields = Fields::new(value).unwrap();
        assert_eq!(fields.take::<f64>("x"), Ok(1.0));
        assert_eq!(fields.take::<Nullable<String>>("note"), Ok(Nullable::none()));
        assert_eq!(fields.take::<f64>("y"), Err(MarshalError::MissingField("y")));
        assert_eq!(
            fields.take::<String>("label").unwrap_err().to_string(),
            "in field `label`: expected string, found boolean"
        );

        assert!(Fields::new(HostValue::Number(0.0)).is_err());
    }
}
