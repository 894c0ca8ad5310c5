//! Static descriptions of a module's interface, emitted by the generator
//! so hosts can inspect an interface without reflection.

use std::fmt;

use crate::notify::PayloadKind;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TypeDecl {
    Boolean,
    Number,
    String,
    ArrayBuffer,
    Void,
    Array(&'static TypeDecl),
    Nullable(&'static TypeDecl),
    Promise(&'static TypeDecl),
    Record(&'static RecordDecl),
    Enum(&'static EnumDecl),
}

#[derive(Debug, PartialEq)]
pub struct RecordDecl {
    pub name: &'static str,
    pub fields: &'static [FieldDecl],
}

#[derive(Debug, PartialEq)]
pub struct FieldDecl {
    pub name: &'static str,
    pub ty: TypeDecl,
}

#[derive(Debug, PartialEq)]
pub struct EnumDecl {
    pub name: &'static str,
    pub values: EnumValues,
}

#[derive(Debug, PartialEq)]
pub enum EnumValues {
    Str(&'static [&'static str]),
    Int(&'static [i64]),
}

#[derive(Debug, PartialEq)]
pub struct ParamDecl {
    pub name: &'static str,
    pub ty: TypeDecl,
}

#[derive(Debug, PartialEq)]
pub struct MethodDecl {
    pub name: &'static str,
    pub params: &'static [ParamDecl],
    pub returns: TypeDecl,
}

impl MethodDecl {
    pub fn is_async(&self) -> bool {
        matches!(self.returns, TypeDecl::Promise(_))
    }
}

#[derive(Debug, PartialEq)]
pub struct NotificationDecl {
    pub name: &'static str,
    pub payload: Option<TypeDecl>,
    pub kind: PayloadKind,
}

#[derive(Debug, PartialEq)]
pub struct ModuleDecl {
    pub name: &'static str,
    pub methods: &'static [MethodDecl],
    pub notifications: &'static [NotificationDecl],
}

impl ModuleDecl {
    pub fn method(&self, name: &str) -> Option<&'static MethodDecl> {
        self.methods.iter().find(|m| m.name == name)
    }

    pub fn notification(&self, name: &str) -> Option<&'static NotificationDecl> {
        self.notifications.iter().find(|n| n.name == name)
    }
}

/// Schema spelling, as the host would write it.
impl fmt::Display for TypeDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDecl::Boolean => f.write_str("boolean"),
            TypeDecl::Number => f.write_str("number"),
            TypeDecl::String => f.write_str("string"),
            TypeDecl::ArrayBuffer => f.write_str("ArrayBuffer"),
            TypeDecl::Void => f.write_str("void"),
            TypeDecl::Array(inner) => match inner {
                TypeDecl::Nullable(_) => write!(f, "({inner})[]"),
                _ => write!(f, "{inner}[]"),
            },
            TypeDecl::Nullable(inner) => write!(f, "{inner} | null"),
            TypeDecl::Promise(inner) => write!(f, "Promise<{inner}>"),
            TypeDecl::Record(record) => f.write_str(record.name),
            TypeDecl::Enum(decl) => f.write_str(decl.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static MODE: EnumDecl = EnumDecl { name: "Mode", values: EnumValues::Str(&["fast", "slow"]) };
    static POINT: RecordDecl = RecordDecl {
        name: "Point",
        fields: &[
            FieldDecl { name: "x", ty: TypeDecl::Number },
            FieldDecl { name: "label", ty: TypeDecl::Nullable(&TypeDecl::String) },
            FieldDecl { name: "mode", ty: TypeDecl::Enum(&MODE) },
        ],
    };
    static POINT_TY: TypeDecl = TypeDecl::Record(&POINT);

    static CANVAS: ModuleDecl = ModuleDecl {
        name: "Canvas",
        methods: &[
            MethodDecl { name: "origin", params: &[], returns: TypeDecl::Record(&POINT) },
            MethodDecl {
                name: "scale",
                params: &[ParamDecl { name: "by", ty: TypeDecl::Number }],
                returns: TypeDecl::Promise(&POINT_TY),
            },
        ],
        notifications: &[NotificationDecl { name: "onMove", payload: Some(TypeDecl::Record(&POINT)), kind: PayloadKind::Value }],
    };

    #[test]
    fn test_module_lookup() {
        assert!(!CANVAS.method("origin").unwrap().is_async());
        assert!(CANVAS.method("scale").unwrap().is_async());
        assert!(CANVAS.method("Scale").is_none());
        assert_eq!(CANVAS.notification("onMove").unwrap().kind, PayloadKind::Value);
        assert!(CANVAS.notification("onResize").is_none());
    }

    #[test]
    fn test_display() {
        assert_eq!(TypeDecl::Array(&TypeDecl::Nullable(&TypeDecl::Number)).to_string(), "(number | null)[]");
        assert_eq!(TypeDecl::Promise(&POINT_TY).to_string(), "Promise<Point>");
    }
}
