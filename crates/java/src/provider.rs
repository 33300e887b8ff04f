use crate::config::ExtractionConfig;
use crate::error::{JavaError, Result};
use crate::model::{CompilationUnit, Receiver, TypeDecl, TypeKind, Visibility};
use crate::parser::JavaParser;
use crate::signature::method_signature;
use archgraph_ingest::{Fact, FactSink};
use log::debug;
use std::collections::HashSet;
use std::fmt::Display;
use std::path::Path;

/// Qualified signatures of the methods worth ingesting
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignificantMethods(HashSet<String>);

impl SignificantMethods {
    #[must_use]
    pub fn contains(&self, signature: &str) -> bool {
        self.0.contains(signature)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<String> for SignificantMethods {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Emits structural facts for Java compilation units
pub struct JavaFactProvider {
    parser: JavaParser,
    config: ExtractionConfig,
    significant: Option<SignificantMethods>,
}

impl JavaFactProvider {
    pub fn new(config: ExtractionConfig) -> Result<Self> {
        Ok(Self {
            parser: JavaParser::new()?,
            config,
            significant: None,
        })
    }

    /// Only report methods whose qualified signature is in `methods`
    #[must_use]
    pub fn with_significant_methods(mut self, methods: SignificantMethods) -> Self {
        self.significant = Some(methods);
        self
    }

    #[must_use]
    pub const fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Parse `source` and push its facts into `sink`; returns the number pushed
    pub fn emit<S>(&mut self, source: &str, sink: &mut S) -> Result<usize>
    where
        S: FactSink,
        S::Error: Display,
    {
        let unit = self.parser.parse(source)?;
        self.push(&unit, sink)
    }

    /// Like [`Self::emit`], reading the source from `path`
    pub fn emit_file<S>(&mut self, path: &Path, sink: &mut S) -> Result<usize>
    where
        S: FactSink,
        S::Error: Display,
    {
        let unit = self.parser.parse_file(path)?;
        self.push(&unit, sink)
    }

    fn push<S>(&self, unit: &CompilationUnit, sink: &mut S) -> Result<usize>
    where
        S: FactSink,
        S::Error: Display,
    {
        let facts = self.facts(unit);
        let count = facts.len();
        for fact in facts {
            let described = fact.to_string();
            sink.accept(fact).map_err(|e| JavaError::Sink {
                fact: described,
                reason: e.to_string(),
            })?;
        }
        Ok(count)
    }

    /// Facts of an already parsed unit, in declaration order
    #[must_use]
    pub fn facts(&self, unit: &CompilationUnit) -> Vec<Fact> {
        let mut facts = Vec::new();
        for decl in &unit.types {
            self.type_facts(unit, decl, &mut facts);
        }
        facts
    }

    fn type_facts(&self, unit: &CompilationUnit, decl: &TypeDecl, facts: &mut Vec<Fact>) {
        let class = decl.name.clone();
        debug!("Extracting facts for {class}");
        facts.push(Fact::ClassDeclared {
            name: class.clone(),
        });

        if self.config.inheritance {
            // An interface's extended interfaces are its parents
            let extended: &[String] = match decl.kind {
                TypeKind::Interface => &decl.interfaces,
                TypeKind::Class | TypeKind::Enum | TypeKind::Record => &[],
            };
            for parent in decl.superclass.iter().chain(extended) {
                facts.push(Fact::Inherits {
                    class: class.clone(),
                    parent: simple_name(parent),
                });
            }
        }

        if self.config.interface_implementations && decl.kind != TypeKind::Interface {
            for interface in &decl.interfaces {
                facts.push(Fact::Implements {
                    class: class.clone(),
                    interface: simple_name(interface),
                });
            }
        }

        if self.config.imports {
            for import in &unit.imports {
                facts.push(Fact::Imports {
                    class: class.clone(),
                    imported: import.display_name(),
                });
            }
        }

        if self.config.class_fields {
            for field in &decl.fields {
                facts.push(Fact::FieldDeclared {
                    class: class.clone(),
                    name: field.name.clone(),
                    type_name: field.type_name.clone(),
                    visibility: field.visibility.to_string(),
                });
            }
        }

        if self.config.methods {
            self.method_facts(unit, decl, facts);
        }
    }

    fn method_facts(&self, unit: &CompilationUnit, decl: &TypeDecl, facts: &mut Vec<Fact>) {
        let class = &decl.name;
        for method in &decl.methods {
            if let Some(significant) = &self.significant {
                let signature = method_signature(unit, decl, method);
                if !significant.contains(&signature) {
                    debug!("Skipping method without significant calls: {signature}");
                    continue;
                }
            }
            if self.config.only_public_methods && method.visibility != Visibility::Public {
                debug!("Skipping non-public method {class}.{}", method.name);
                continue;
            }

            facts.push(Fact::MethodDeclared {
                class: class.clone(),
                name: method.name.clone(),
                visibility: Some(method.visibility.to_string()),
            });

            if self.config.method_calls {
                for call in &method.calls {
                    let own_private = matches!(call.receiver, Receiver::Implicit | Receiver::This)
                        && decl.has_private_method(&call.name);
                    if self.config.omit_private_method_calls && own_private {
                        debug!(
                            "Skipping private call {class}.{} -> {}",
                            method.name, call.name
                        );
                        continue;
                    }
                    facts.push(Fact::MethodCall {
                        class: class.clone(),
                        caller: method.name.clone(),
                        callee: call.name.clone(),
                    });
                }
            }

            if self.config.control_flow {
                for flow in &method.control_flow {
                    facts.push(Fact::ControlFlow {
                        class: class.clone(),
                        method: method.name.clone(),
                        kind: flow.kind.clone(),
                        condition: flow.condition.clone(),
                    });
                }
            }
        }
    }
}

/// `java.util.AbstractList` becomes `AbstractList`
fn simple_name(written: &str) -> String {
    written
        .rsplit('.')
        .next()
        .unwrap_or(written)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_name() {
        assert_eq!(simple_name("java.util.AbstractList"), "AbstractList");
        assert_eq!(simple_name("Base"), "Base");
    }

    #[test]
    fn test_significant_methods_from_iter() {
        let methods: SignificantMethods = ["a.B.c()".to_string()].into_iter().collect();
        assert!(methods.contains("a.B.c()"));
        assert!(!methods.contains("a.B.d()"));
        assert_eq!(methods.len(), 1);
    }
}
