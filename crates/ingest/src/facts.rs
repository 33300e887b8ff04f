use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;

/// Atomic structural fact about one source unit.
///
/// `class` on method-scoped facts is the declaring class of the method. It
/// only affects the method's key when methods are keyed per class.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "fact", rename_all = "snake_case")]
pub enum Fact {
    ClassDeclared {
        name: String,
    },
    MethodDeclared {
        class: String,
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        visibility: Option<String>,
    },
    MethodCall {
        class: String,
        caller: String,
        callee: String,
    },
    ControlFlow {
        class: String,
        method: String,
        kind: String,
        condition: String,
    },
    Inherits {
        class: String,
        parent: String,
    },
    Implements {
        class: String,
        interface: String,
    },
    FieldDeclared {
        class: String,
        name: String,
        #[serde(rename = "type")]
        type_name: String,
        visibility: String,
    },
    Imports {
        class: String,
        imported: String,
    },
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClassDeclared { name } => write!(f, "ClassDeclared({name})"),
            Self::MethodDeclared {
                class,
                name,
                visibility,
            } => match visibility {
                Some(v) => write!(f, "MethodDeclared({class}, {name}, {v})"),
                None => write!(f, "MethodDeclared({class}, {name})"),
            },
            Self::MethodCall {
                caller, callee, ..
            } => write!(f, "MethodCall({caller}, {callee})"),
            Self::ControlFlow {
                method,
                kind,
                condition,
                ..
            } => write!(f, "ControlFlow({method}, {kind}, {condition})"),
            Self::Inherits { class, parent } => write!(f, "Inherits({class}, {parent})"),
            Self::Implements { class, interface } => {
                write!(f, "Implements({class}, {interface})")
            }
            Self::FieldDeclared {
                class,
                name,
                type_name,
                visibility,
            } => write!(f, "FieldDeclared({class}, {name}, {type_name}, {visibility})"),
            Self::Imports { class, imported } => write!(f, "Imports({class}, {imported})"),
        }
    }
}

/// Receiver of facts pushed by a fact provider
pub trait FactSink {
    type Error;

    fn accept(&mut self, fact: Fact) -> std::result::Result<(), Self::Error>;
}

impl FactSink for Vec<Fact> {
    type Error = Infallible;

    fn accept(&mut self, fact: Fact) -> std::result::Result<(), Self::Error> {
        self.push(fact);
        Ok(())
    }
}
