use archgraph_java::{CompilationUnit, JavaParser, TypeDecl};
use log::debug;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Method of a built-in type, parameter types fully qualified
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuiltinMethod {
    pub name: &'static str,
    pub params: &'static [&'static str],
}

/// Standard-library type known without sources
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuiltinType {
    pub qualified: &'static str,
    pub superclass: Option<&'static str>,
    pub methods: &'static [BuiltinMethod],
}

impl BuiltinType {
    pub fn candidates(&self, name: &str, arg_count: usize) -> impl Iterator<Item = &BuiltinMethod> {
        let name = name.to_string();
        self.methods
            .iter()
            .filter(move |m| m.name == name && m.params.len() == arg_count)
    }

    #[must_use]
    pub fn signature(&self, method: &BuiltinMethod) -> String {
        format!("{}.{}({})", self.qualified, method.name, method.params.join(", "))
    }
}

/// A type found by a [`ResolutionContext`]
#[derive(Debug, Clone)]
pub enum TypeInfo {
    Source {
        unit: Arc<CompilationUnit>,
        index: usize,
    },
    Builtin(&'static BuiltinType),
}

impl TypeInfo {
    #[must_use]
    pub fn declaration(&self) -> Option<(&CompilationUnit, &TypeDecl)> {
        match self {
            Self::Source { unit, index } => unit.types.get(*index).map(|t| (unit.as_ref(), t)),
            Self::Builtin(_) => None,
        }
    }
}

/// Lookup of type declarations by qualified name.
///
/// Contexts keep lookup caches, so each worker owns its own set.
pub trait ResolutionContext: Send {
    fn find_type(&mut self, qualified: &str) -> Option<TypeInfo>;
}

/// Finds `a.b.C` as `<root>/a/b/C.java`, nested types as `<root>/a/b/Outer.java`
pub struct SourceDirContext {
    root: PathBuf,
    parser: Option<JavaParser>,
    units: HashMap<PathBuf, Option<Arc<CompilationUnit>>>,
}

impl SourceDirContext {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            parser: None,
            units: HashMap::new(),
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn load(&mut self, path: PathBuf) -> Option<Arc<CompilationUnit>> {
        if let Some(cached) = self.units.get(&path) {
            return cached.clone();
        }
        let unit = if path.is_file() {
            self.parse(&path)
        } else {
            None
        };
        self.units.insert(path, unit.clone());
        unit
    }

    fn parse(&mut self, path: &Path) -> Option<Arc<CompilationUnit>> {
        if self.parser.is_none() {
            match JavaParser::new() {
                Ok(parser) => self.parser = Some(parser),
                Err(err) => {
                    debug!("No parser for {}: {err}", self.root.display());
                    return None;
                }
            }
        }
        let parser = self.parser.as_mut()?;
        match parser.parse_file(path) {
            Ok(unit) => Some(Arc::new(unit)),
            Err(err) => {
                debug!("Cannot load declarations from {}: {err}", path.display());
                None
            }
        }
    }
}

impl ResolutionContext for SourceDirContext {
    fn find_type(&mut self, qualified: &str) -> Option<TypeInfo> {
        let segments: Vec<&str> = qualified.split('.').collect();
        // Try `a/b/C.java` first, then treat trailing segments as nested types
        for file_len in (1..=segments.len()).rev() {
            let mut path = self.root.clone();
            for segment in &segments[..file_len - 1] {
                path.push(segment);
            }
            path.push(format!("{}.java", segments[file_len - 1]));

            let Some(unit) = self.load(path) else {
                continue;
            };
            let package_len = unit.package.as_ref().map_or(0, |p| p.split('.').count());
            if package_len + 1 != file_len {
                continue;
            }
            let type_path: Vec<String> = segments[file_len - 1..]
                .iter()
                .map(|s| (*s).to_string())
                .collect();
            if let Some((index, _)) = unit.type_by_path(&type_path) {
                return Some(TypeInfo::Source { unit, index });
            }
        }
        None
    }
}

const OBJECT_METHODS: &[BuiltinMethod] = &[
    BuiltinMethod {
        name: "toString",
        params: &[],
    },
    BuiltinMethod {
        name: "equals",
        params: &["java.lang.Object"],
    },
    BuiltinMethod {
        name: "hashCode",
        params: &[],
    },
    BuiltinMethod {
        name: "getClass",
        params: &[],
    },
];

static BUILTINS: &[BuiltinType] = &[
    BuiltinType {
        qualified: "java.lang.Object",
        superclass: None,
        methods: OBJECT_METHODS,
    },
    BuiltinType {
        qualified: "java.lang.String",
        superclass: Some("java.lang.Object"),
        methods: &[
            BuiltinMethod {
                name: "length",
                params: &[],
            },
            BuiltinMethod {
                name: "equals",
                params: &["java.lang.Object"],
            },
            BuiltinMethod {
                name: "isEmpty",
                params: &[],
            },
            BuiltinMethod {
                name: "substring",
                params: &["int"],
            },
            BuiltinMethod {
                name: "substring",
                params: &["int", "int"],
            },
            BuiltinMethod {
                name: "charAt",
                params: &["int"],
            },
            BuiltinMethod {
                name: "trim",
                params: &[],
            },
        ],
    },
    BuiltinType {
        qualified: "java.lang.Integer",
        superclass: Some("java.lang.Number"),
        methods: &[
            BuiltinMethod {
                name: "parseInt",
                params: &["java.lang.String"],
            },
            BuiltinMethod {
                name: "valueOf",
                params: &["int"],
            },
        ],
    },
    BuiltinType {
        qualified: "java.lang.Number",
        superclass: Some("java.lang.Object"),
        methods: &[],
    },
    BuiltinType {
        qualified: "java.lang.Math",
        superclass: Some("java.lang.Object"),
        methods: &[
            BuiltinMethod {
                name: "max",
                params: &["int", "int"],
            },
            BuiltinMethod {
                name: "min",
                params: &["int", "int"],
            },
            BuiltinMethod {
                name: "abs",
                params: &["int"],
            },
        ],
    },
    BuiltinType {
        qualified: "java.lang.StringBuilder",
        superclass: Some("java.lang.Object"),
        methods: &[
            BuiltinMethod {
                name: "append",
                params: &["java.lang.String"],
            },
            BuiltinMethod {
                name: "toString",
                params: &[],
            },
        ],
    },
];

/// Small table of `java.lang` types, always consulted last
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinContext;

impl BuiltinContext {
    #[must_use]
    pub fn object() -> Option<&'static BuiltinType> {
        BUILTINS.iter().find(|t| t.qualified == "java.lang.Object")
    }
}

impl ResolutionContext for BuiltinContext {
    fn find_type(&mut self, qualified: &str) -> Option<TypeInfo> {
        BUILTINS
            .iter()
            .find(|t| t.qualified == qualified)
            .map(TypeInfo::Builtin)
    }
}
