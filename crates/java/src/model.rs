use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared access level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Visibility {
    Public,
    Protected,
    Private,
    PackagePrivate,
}

impl Visibility {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Protected => "protected",
            Self::Private => "private",
            Self::PackagePrivate => "package-private",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeKind {
    Class,
    Interface,
    Enum,
    Record,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Import {
    /// Dotted path without the trailing `.*`
    pub path: String,
    pub is_static: bool,
    pub is_wildcard: bool,
}

impl Import {
    /// Import as written, e.g. `java.util.*`
    #[must_use]
    pub fn display_name(&self) -> String {
        if self.is_wildcard {
            format!("{}.*", self.path)
        } else {
            self.path.clone()
        }
    }

    /// Last path segment of a single-name import
    #[must_use]
    pub fn simple_name(&self) -> Option<&str> {
        if self.is_wildcard {
            return None;
        }
        self.path.rsplit('.').next()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    /// Erased type as written (`List<String>` becomes `List`)
    pub type_name: String,
    pub varargs: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    /// Declared type as written, whitespace collapsed
    pub type_name: String,
    pub visibility: Visibility,
    pub is_static: bool,
}

/// Local variable visible somewhere in a method body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalVar {
    pub name: String,
    pub type_name: String,
}

/// What a call is invoked on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Receiver {
    /// `foo()`
    Implicit,
    /// `this.foo()`
    This,
    /// `super.foo()`
    Super,
    /// `x.foo()`, where `x` is a variable or a type name
    Name(String),
    /// `this.x.foo()`
    ThisField(String),
    /// `new T(..).foo()`, holding the erased `T`
    New(String),
    /// `((T) x).foo()`, holding the erased `T`
    Cast(String),
    /// Anything else: chained calls, array elements, ...
    Expression(String),
}

/// What the source shows about an argument's static type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArgType {
    /// Literal, `new T(..)` or cast: erased type as written
    Known(String),
    /// Bare identifier, typed by whatever variable it names
    Variable(String),
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSite {
    pub name: String,
    pub receiver: Receiver,
    pub args: Vec<ArgType>,
    /// 1-based
    pub line: usize,
}

impl CallSite {
    #[must_use]
    pub fn arg_count(&self) -> usize {
        self.args.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlFlowEntry {
    pub kind: String,
    pub condition: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDecl {
    pub name: String,
    pub visibility: Visibility,
    pub is_static: bool,
    pub params: Vec<Param>,
    pub calls: Vec<CallSite>,
    pub locals: Vec<LocalVar>,
    pub control_flow: Vec<ControlFlowEntry>,
}

impl MethodDecl {
    pub const INITIALIZER_NAME: &'static str = "<init>";

    /// Empty body collecting a type's initializer code
    #[must_use]
    pub fn initializer() -> Self {
        Self {
            name: Self::INITIALIZER_NAME.to_string(),
            visibility: Visibility::Private,
            is_static: false,
            params: Vec::new(),
            calls: Vec::new(),
            locals: Vec::new(),
            control_flow: Vec::new(),
        }
    }

    /// Whether a call with `arg_count` arguments can bind to this method
    #[must_use]
    pub fn accepts(&self, arg_count: usize) -> bool {
        match self.params.last() {
            Some(last) if last.varargs => arg_count + 1 >= self.params.len(),
            _ => arg_count == self.params.len(),
        }
    }

    /// Declared type of a parameter or local named `name`.
    ///
    /// Locals shadow parameters; the last declaration wins.
    #[must_use]
    pub fn variable_type(&self, name: &str) -> Option<&str> {
        self.locals
            .iter()
            .rev()
            .find(|l| l.name == name)
            .map(|l| l.type_name.as_str())
            .or_else(|| {
                self.params
                    .iter()
                    .find(|p| p.name == name)
                    .map(|p| p.type_name.as_str())
            })
    }
}

/// Class, interface, enum or record declaration, nested ones included
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDecl {
    pub name: String,
    /// Enclosing type names followed by `name`
    pub path: Vec<String>,
    pub kind: TypeKind,
    /// Erased superclass as written
    pub superclass: Option<String>,
    /// Implemented interfaces, or extended interfaces for an interface
    pub interfaces: Vec<String>,
    pub fields: Vec<FieldDecl>,
    pub methods: Vec<MethodDecl>,
    pub constructors: Vec<MethodDecl>,
    /// Field initializers, initializer blocks and enum constant arguments,
    /// gathered into one body named `<init>`. Never reported as a method.
    pub initializer: MethodDecl,
}

impl TypeDecl {
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldDecl> {
        self.fields.iter().find(|f| f.name == name)
    }

    #[must_use]
    pub fn has_private_method(&self, name: &str) -> bool {
        self.methods
            .iter()
            .any(|m| m.name == name && m.visibility == Visibility::Private)
    }

    /// Every body that can contain calls: methods, constructors, initializers
    pub fn bodies(&self) -> impl Iterator<Item = &MethodDecl> {
        self.methods
            .iter()
            .chain(self.constructors.iter())
            .chain(std::iter::once(&self.initializer))
    }
}

/// Structure of one Java source file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilationUnit {
    pub package: Option<String>,
    pub imports: Vec<Import>,
    pub types: Vec<TypeDecl>,
}

impl CompilationUnit {
    /// Declaration whose path is exactly `path`
    #[must_use]
    pub fn type_by_path(&self, path: &[String]) -> Option<(usize, &TypeDecl)> {
        self.types.iter().enumerate().find(|(_, t)| t.path == path)
    }

    /// Innermost declaration named `name`, searching from `scope` outwards
    #[must_use]
    pub fn visible_type(&self, scope: &[String], name: &str) -> Option<&TypeDecl> {
        (0..=scope.len()).rev().find_map(|depth| {
            let mut path: Vec<String> = scope[..depth].to_vec();
            path.push(name.to_string());
            self.type_by_path(&path).map(|(_, t)| t)
        })
    }
}
