use crate::context::{BuiltinContext, BuiltinType, ResolutionContext, SourceDirContext, TypeInfo};
use crate::scope::ResolutionScope;
use archgraph_java::signature::{
    is_primitive, method_signature, simple_type, type_candidates, type_path,
};
use archgraph_java::{ArgType, CallSite, CompilationUnit, MethodDecl, Receiver, TypeDecl};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Supertype chains deeper than this are treated as cyclic
const MAX_HIERARCHY_DEPTH: usize = 32;

/// Outcome of resolving one call site
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved(String),
    Unresolved(String),
}

/// The method a call site appears in
#[derive(Clone, Copy)]
pub struct CallScope<'a> {
    pub unit: &'a Arc<CompilationUnit>,
    /// Index of the enclosing declaration in `unit.types`
    pub index: usize,
    pub method: &'a MethodDecl,
}

enum Found {
    Signature(String),
    Ambiguous,
    Missing,
}

/// Resolves call sites to qualified signatures.
///
/// Owns its contexts and a type cache; build one per worker.
pub struct CallResolver {
    contexts: Vec<Box<dyn ResolutionContext>>,
    types: HashMap<String, Option<TypeInfo>>,
}

impl CallResolver {
    /// One source context per scope directory, then the built-in table
    #[must_use]
    pub fn for_scope(scope: &ResolutionScope) -> Self {
        let mut contexts: Vec<Box<dyn ResolutionContext>> = scope
            .roots()
            .iter()
            .map(|root| Box::new(SourceDirContext::new(root.clone())) as Box<dyn ResolutionContext>)
            .collect();
        contexts.push(Box::new(BuiltinContext));
        Self::with_contexts(contexts)
    }

    #[must_use]
    pub fn with_contexts(contexts: Vec<Box<dyn ResolutionContext>>) -> Self {
        Self {
            contexts,
            types: HashMap::new(),
        }
    }

    /// First context that knows `qualified`
    pub fn find_type(&mut self, qualified: &str) -> Option<TypeInfo> {
        if let Some(cached) = self.types.get(qualified) {
            return cached.clone();
        }
        let found = self
            .contexts
            .iter_mut()
            .find_map(|ctx| ctx.find_type(qualified));
        self.types.insert(qualified.to_string(), found.clone());
        found
    }

    /// Resolve a type as written inside `decl` of `unit`
    fn resolve_written(
        &mut self,
        unit: &CompilationUnit,
        decl: &TypeDecl,
        written: &str,
    ) -> Option<TypeInfo> {
        let candidates = type_candidates(unit, &decl.path, written);
        if candidates.first().is_some_and(|c| is_primitive(c)) || written.ends_with(']') {
            return None;
        }
        candidates.iter().find_map(|c| self.find_type(c))
    }

    pub fn resolve(&mut self, scope: CallScope<'_>, call: &CallSite) -> Resolution {
        let CallScope {
            unit,
            index,
            method,
        } = scope;
        let Some(decl) = unit.types.get(index) else {
            return Resolution::Unresolved(format!("no enclosing type for `{}`", call.name));
        };

        let args = argument_types(unit, decl, method, call);
        let target = match &call.receiver {
            Receiver::Implicit => {
                return self.resolve_implicit(unit, decl, call, &args);
            }
            Receiver::This => Some(TypeInfo::Source {
                unit: Arc::clone(unit),
                index,
            }),
            Receiver::Super => match &decl.superclass {
                Some(parent) => self.resolve_written(unit, decl, parent),
                None => self.find_type("java.lang.Object"),
            },
            Receiver::ThisField(field) => decl
                .field(field)
                .map(|f| f.type_name.clone())
                .and_then(|t| self.resolve_written(unit, decl, &t)),
            Receiver::Name(name) => self.resolve_name(unit, decl, method, name),
            Receiver::New(written) | Receiver::Cast(written) => {
                self.resolve_written(unit, decl, written)
            }
            Receiver::Expression(expr) => {
                return Resolution::Unresolved(format!("untyped receiver `{expr}`"));
            }
        };

        let Some(target) = target else {
            return Resolution::Unresolved(format!("unknown receiver type for `{}`", call.name));
        };
        match self.lookup_method(&target, &call.name, &args) {
            Found::Signature(signature) => Resolution::Resolved(signature),
            Found::Ambiguous => Resolution::Unresolved(format!("ambiguous call `{}`", call.name)),
            Found::Missing => Resolution::Unresolved(format!("no method `{}`", call.name)),
        }
    }

    /// `foo()`: enclosing types innermost first, then static imports
    fn resolve_implicit(
        &mut self,
        unit: &Arc<CompilationUnit>,
        decl: &TypeDecl,
        call: &CallSite,
        args: &[Option<String>],
    ) -> Resolution {
        for depth in (1..=decl.path.len()).rev() {
            let Some((index, _)) = unit.type_by_path(&decl.path[..depth]) else {
                continue;
            };
            let target = TypeInfo::Source {
                unit: Arc::clone(unit),
                index,
            };
            match self.lookup_method(&target, &call.name, args) {
                Found::Signature(signature) => return Resolution::Resolved(signature),
                Found::Ambiguous => {
                    return Resolution::Unresolved(format!("ambiguous call `{}`", call.name));
                }
                Found::Missing => {}
            }
        }

        for import in unit.imports.iter().filter(|i| i.is_static) {
            let owner = if import.is_wildcard {
                Some(import.path.as_str())
            } else if import.simple_name() == Some(call.name.as_str()) {
                import.path.rsplit_once('.').map(|(owner, _)| owner)
            } else {
                None
            };
            let Some(target) = owner.and_then(|o| self.find_type(o)) else {
                continue;
            };
            if let Found::Signature(signature) = self.lookup_method(&target, &call.name, args) {
                return Resolution::Resolved(signature);
            }
        }

        Resolution::Unresolved(format!("no method `{}` in scope", call.name))
    }

    /// `x.foo()`: a local, parameter or field, else a type name
    fn resolve_name(
        &mut self,
        unit: &CompilationUnit,
        decl: &TypeDecl,
        method: &MethodDecl,
        name: &str,
    ) -> Option<TypeInfo> {
        if !name.contains('.') {
            if let Some(declared) = variable_type(unit, decl, method, name) {
                return self.resolve_written(unit, decl, &declared);
            }
        }

        let first = name.split('.').next().unwrap_or(name);
        if first.starts_with(|c: char| c.is_uppercase()) || name.contains('.') {
            return self.resolve_written(unit, decl, name);
        }
        None
    }

    /// Find `name` taking `args` on `target` or its supertypes
    fn lookup_method(&mut self, target: &TypeInfo, name: &str, args: &[Option<String>]) -> Found {
        let arg_count = args.len();
        let mut queue = vec![(target.clone(), 0usize)];
        let mut seen = HashSet::new();

        while let Some((current, depth)) = queue.pop() {
            if depth > MAX_HIERARCHY_DEPTH {
                break;
            }
            match &current {
                TypeInfo::Builtin(builtin) => {
                    if !seen.insert(builtin.qualified.to_string()) {
                        continue;
                    }
                    match builtin_match(builtin, name, args) {
                        Found::Missing => {}
                        found => return found,
                    }
                    if let Some(parent) = builtin.superclass.and_then(|p| self.find_type(p)) {
                        queue.push((parent, depth + 1));
                    }
                }
                TypeInfo::Source { unit, index } => {
                    let Some(decl) = unit.types.get(*index) else {
                        continue;
                    };
                    if !seen.insert(type_path(unit, decl)) {
                        continue;
                    }

                    let matches: Vec<&MethodDecl> = decl
                        .methods
                        .iter()
                        .filter(|m| m.name == name && m.accepts(arg_count))
                        .collect();
                    match matches.as_slice() {
                        [single] => {
                            return Found::Signature(method_signature(unit, decl, single));
                        }
                        [] => {}
                        overloads => {
                            let params: Vec<Vec<&str>> = overloads
                                .iter()
                                .map(|m| m.params.iter().map(|p| p.type_name.as_str()).collect())
                                .collect();
                            return match best_overload(&params, args) {
                                Some(i) => {
                                    Found::Signature(method_signature(unit, decl, overloads[i]))
                                }
                                None => Found::Ambiguous,
                            };
                        }
                    }

                    // Interfaces pushed first so the superclass is searched next
                    let supertypes: Vec<String> = decl
                        .interfaces
                        .iter()
                        .rev()
                        .chain(decl.superclass.iter())
                        .cloned()
                        .collect();
                    let mut parents = Vec::new();
                    for written in &supertypes {
                        if let Some(parent) = self.resolve_written(unit, decl, written) {
                            parents.push(parent);
                        }
                    }
                    if decl.superclass.is_none() {
                        if let Some(object) = BuiltinContext::object() {
                            parents.insert(0, TypeInfo::Builtin(object));
                        }
                    }
                    queue.extend(parents.into_iter().map(|p| (p, depth + 1)));
                }
            }
        }
        Found::Missing
    }
}

fn builtin_match(builtin: &BuiltinType, name: &str, args: &[Option<String>]) -> Found {
    let matches: Vec<_> = builtin.candidates(name, args.len()).collect();
    match matches.as_slice() {
        [single] => Found::Signature(builtin.signature(single)),
        [] => Found::Missing,
        overloads => {
            let params: Vec<Vec<&str>> = overloads.iter().map(|m| m.params.to_vec()).collect();
            best_overload(&params, args)
                .map_or(Found::Ambiguous, |i| Found::Signature(builtin.signature(overloads[i])))
        }
    }
}

/// Declared type of a local, parameter or field of an enclosing type
fn variable_type(
    unit: &CompilationUnit,
    decl: &TypeDecl,
    method: &MethodDecl,
    name: &str,
) -> Option<String> {
    method.variable_type(name).map(str::to_string).or_else(|| {
        (1..=decl.path.len()).rev().find_map(|depth| {
            unit.type_by_path(&decl.path[..depth])
                .and_then(|(_, t)| t.field(name))
                .map(|f| f.type_name.clone())
        })
    })
}

/// Simple type names of the arguments whose type the source shows
fn argument_types(
    unit: &CompilationUnit,
    decl: &TypeDecl,
    method: &MethodDecl,
    call: &CallSite,
) -> Vec<Option<String>> {
    call.args
        .iter()
        .map(|arg| match arg {
            ArgType::Known(written) => Some(simple_type(written)),
            ArgType::Variable(name) => {
                variable_type(unit, decl, method, name).map(|t| simple_type(&t))
            }
            ArgType::Unknown => None,
        })
        .collect()
}

/// Overload whose parameters agree with the most known argument types.
///
/// `None` when no single candidate scores highest.
fn best_overload(params: &[Vec<&str>], args: &[Option<String>]) -> Option<usize> {
    let scores: Vec<usize> = params
        .iter()
        .map(|candidate| {
            args.iter()
                .enumerate()
                .filter(|(i, arg)| {
                    // Varargs tail arguments compare against the last parameter
                    let param = candidate.get(*i).or_else(|| candidate.last());
                    matches!((arg, param), (Some(arg), Some(param)) if simple_type(param) == *arg)
                })
                .count()
        })
        .collect();

    let best = scores.iter().copied().max()?;
    let mut winners = scores.iter().enumerate().filter(|(_, s)| **s == best);
    let (index, _) = winners.next()?;
    winners.next().is_none().then_some(index)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn known(types: &[&str]) -> Vec<Option<String>> {
        types
            .iter()
            .map(|t| (!t.is_empty()).then(|| (*t).to_string()))
            .collect()
    }

    #[test]
    fn test_best_overload_prefers_matching_literal() {
        let params = vec![vec!["String"], vec!["int"]];
        assert_eq!(best_overload(&params, &known(&["String"])), Some(0));
        assert_eq!(best_overload(&params, &known(&["int"])), Some(1));
    }

    #[test]
    fn test_best_overload_compares_simple_names() {
        let params = vec![vec!["java.lang.String", "int"], vec!["java.lang.Object", "int"]];
        assert_eq!(best_overload(&params, &known(&["String", "int"])), Some(0));
    }

    #[test]
    fn test_best_overload_unknown_arguments_stay_ambiguous() {
        let params = vec![vec!["String"], vec!["int"]];
        assert_eq!(best_overload(&params, &known(&[""])), None);
        assert_eq!(best_overload(&params, &known(&["Item"])), None);
    }

    #[test]
    fn test_best_overload_varargs_tail() {
        let params = vec![vec!["String", "Object..."], vec!["String", "int..."]];
        assert_eq!(best_overload(&params, &known(&["", "int", "int"])), Some(1));
    }
}
