//! Fully-qualified method signatures.
//!
//! Both the fact provider and the call-frequency analyzer name methods with
//! [`method_signature`], so a declaration and the calls resolving to it always
//! produce the same text: `pkg.Outer.Inner.method(java.lang.String, int[])`.

use crate::model::{CompilationUnit, MethodDecl, TypeDecl};
use crate::parser::erase_type;

const PRIMITIVES: &[&str] = &[
    "boolean", "byte", "char", "short", "int", "long", "float", "double", "void",
];

/// `java.lang` types assumed when a name is neither imported nor declared locally
const JAVA_LANG: &[&str] = &[
    "Boolean",
    "Byte",
    "CharSequence",
    "Character",
    "Class",
    "Comparable",
    "Double",
    "Enum",
    "Error",
    "Exception",
    "Float",
    "IllegalArgumentException",
    "IllegalStateException",
    "Integer",
    "Iterable",
    "Long",
    "Math",
    "Number",
    "Object",
    "Runnable",
    "RuntimeException",
    "Short",
    "String",
    "StringBuilder",
    "System",
    "Thread",
    "Throwable",
    "Void",
];

#[must_use]
pub fn is_primitive(name: &str) -> bool {
    PRIMITIVES.contains(&name)
}

#[must_use]
pub fn is_java_lang(name: &str) -> bool {
    JAVA_LANG.contains(&name)
}

/// Dotted name of a declaration: package, enclosing types, own name
#[must_use]
pub fn type_path(unit: &CompilationUnit, decl: &TypeDecl) -> String {
    let local = decl.path.join(".");
    match &unit.package {
        Some(package) => format!("{package}.{local}"),
        None => local,
    }
}

/// Split `Foo[][]` / `Foo...` into the base name and its array suffix
fn split_suffix(erased: &str) -> (&str, &str) {
    let base_len = erased
        .trim_end_matches(|c| matches!(c, '[' | ']' | '.'))
        .len();
    erased.split_at(base_len)
}

/// Possible qualified names for a type written in `unit`, most likely first.
///
/// Primitives and already-dotted names are returned as-is.
#[must_use]
pub fn type_candidates(unit: &CompilationUnit, scope: &[String], written: &str) -> Vec<String> {
    let erased = erase_type(written);
    let (base, _) = split_suffix(&erased);
    if base.is_empty() || is_primitive(base) || base.contains('.') {
        return vec![base.to_string()];
    }

    if let Some(import) = unit
        .imports
        .iter()
        .find(|i| !i.is_static && i.simple_name() == Some(base))
    {
        return vec![import.path.clone()];
    }

    if let Some(decl) = unit.visible_type(scope, base) {
        return vec![type_path(unit, decl)];
    }

    let mut candidates = Vec::new();
    match &unit.package {
        Some(package) => candidates.push(format!("{package}.{base}")),
        None => candidates.push(base.to_string()),
    }
    candidates.extend(
        unit.imports
            .iter()
            .filter(|i| i.is_wildcard && !i.is_static)
            .map(|i| format!("{}.{base}", i.path)),
    );
    let lang = format!("java.lang.{base}");
    if is_java_lang(base) {
        candidates.insert(0, lang);
    } else {
        candidates.push(lang);
    }
    candidates
}

/// Qualified form of a type written in `unit`, keeping array and varargs suffixes
#[must_use]
pub fn qualify_type(unit: &CompilationUnit, scope: &[String], written: &str) -> String {
    let erased = erase_type(written);
    let (_, suffix) = split_suffix(&erased);
    let base = type_candidates(unit, scope, written)
        .into_iter()
        .next()
        .unwrap_or_default();
    format!("{base}{suffix}")
}

/// Unqualified erased type used to compare arguments with parameters:
/// `java.util.List<String>` becomes `List`, a varargs `String...` becomes `String`
#[must_use]
pub fn simple_type(written: &str) -> String {
    let erased = erase_type(written);
    let (base, suffix) = split_suffix(&erased);
    let simple = base.rsplit('.').next().unwrap_or(base);
    if suffix == "..." {
        simple.to_string()
    } else {
        format!("{simple}{suffix}")
    }
}

/// `pkg.Type.method(ParamType1, ParamType2)` for a declared method
#[must_use]
pub fn method_signature(unit: &CompilationUnit, decl: &TypeDecl, method: &MethodDecl) -> String {
    let params: Vec<String> = method
        .params
        .iter()
        .map(|p| {
            let qualified = qualify_type(unit, &decl.path, &p.type_name);
            if p.varargs {
                format!("{qualified}...")
            } else {
                qualified
            }
        })
        .collect();
    format!(
        "{}.{}({})",
        type_path(unit, decl),
        method.name,
        params.join(", ")
    )
}
