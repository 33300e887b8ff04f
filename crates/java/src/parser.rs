use crate::error::{JavaError, Result};
use crate::model::{
    ArgType, CallSite, CompilationUnit, ControlFlowEntry, FieldDecl, Import, LocalVar, MethodDecl,
    Param, Receiver, TypeDecl, TypeKind, Visibility,
};
use std::fs;
use std::path::Path;
use tree_sitter::{Node, Parser};

/// Java source parser producing a [`CompilationUnit`]
pub struct JavaParser {
    parser: Parser,
}

impl JavaParser {
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        let language: tree_sitter::Language = tree_sitter_java::LANGUAGE.into();
        parser
            .set_language(&language)
            .map_err(|e| JavaError::Language(e.to_string()))?;
        Ok(Self { parser })
    }

    pub fn parse(&mut self, source: &str) -> Result<CompilationUnit> {
        self.parse_named(source, "<input>")
    }

    pub fn parse_file(&mut self, path: &Path) -> Result<CompilationUnit> {
        let source = fs::read_to_string(path).map_err(|source| JavaError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.parse_named(&source, &path.display().to_string())
    }

    /// Parse `source`, naming it `origin` in errors
    pub fn parse_named(&mut self, source: &str, origin: &str) -> Result<CompilationUnit> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or_else(|| JavaError::Parse {
                origin: origin.to_string(),
                reason: "parser produced no tree".to_string(),
            })?;

        let root = tree.root_node();
        if root.has_error() {
            let line = first_error(root).map_or(0, |n| n.start_position().row + 1);
            return Err(JavaError::Parse {
                origin: origin.to_string(),
                reason: format!("syntax error at line {line}"),
            });
        }

        let mut unit = CompilationUnit::default();
        let mut cursor = root.walk();
        for child in root.named_children(&mut cursor) {
            match child.kind() {
                "package_declaration" => {
                    unit.package = qualified_name_child(child, source);
                }
                "import_declaration" => {
                    if let Some(import) = extract_import(child, source) {
                        unit.imports.push(import);
                    }
                }
                kind if is_type_declaration(kind) => {
                    extract_type(child, source, &[], &mut unit.types);
                }
                _ => {}
            }
        }

        log::debug!(
            "Parsed {origin}: {} types, {} imports",
            unit.types.len(),
            unit.imports.len()
        );
        Ok(unit)
    }
}

fn first_error(node: Node) -> Option<Node> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();
    children
        .into_iter()
        .filter(|c| c.has_error())
        .find_map(first_error)
}

fn is_type_declaration(kind: &str) -> bool {
    matches!(
        kind,
        "class_declaration" | "interface_declaration" | "enum_declaration" | "record_declaration"
    )
}

fn text<'a>(node: Node, source: &'a str) -> &'a str {
    &source[node.start_byte()..node.end_byte()]
}

/// Collapse every whitespace run to a single space
pub(crate) fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Drop type arguments and whitespace: `Map<K, List<V>>[]` becomes `Map[]`
pub(crate) fn erase_type(written: &str) -> String {
    let mut out = String::with_capacity(written.len());
    let mut depth = 0usize;
    for ch in written.chars() {
        match ch {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            c if depth == 0 && !c.is_whitespace() => out.push(c),
            _ => {}
        }
    }
    out
}

fn qualified_name_child(node: Node, source: &str) -> Option<String> {
    let mut cursor = node.walk();
    let found = node
        .named_children(&mut cursor)
        .find(|c| matches!(c.kind(), "scoped_identifier" | "identifier"))
        .map(|c| text(c, source).to_string());
    found
}

fn extract_import(node: Node, source: &str) -> Option<Import> {
    let path = qualified_name_child(node, source)?;
    let mut cursor = node.walk();
    let mut is_static = false;
    let mut is_wildcard = false;
    for child in node.children(&mut cursor) {
        match child.kind() {
            "static" => is_static = true,
            "asterisk" => is_wildcard = true,
            _ => {}
        }
    }
    Some(Import {
        path,
        is_static,
        is_wildcard,
    })
}

#[derive(Default)]
struct Modifiers {
    visibility: Option<Visibility>,
    is_static: bool,
}

fn modifiers(node: Node) -> Modifiers {
    let mut result = Modifiers::default();
    let mut cursor = node.walk();
    let Some(mods) = node
        .children(&mut cursor)
        .find(|c| c.kind() == "modifiers")
    else {
        return result;
    };

    let mut cursor = mods.walk();
    for child in mods.children(&mut cursor) {
        match child.kind() {
            "public" if result.visibility.is_none() => {
                result.visibility = Some(Visibility::Public);
            }
            "protected" if result.visibility.is_none() => {
                result.visibility = Some(Visibility::Protected);
            }
            "private" if result.visibility.is_none() => {
                result.visibility = Some(Visibility::Private);
            }
            "static" => result.is_static = true,
            _ => {}
        }
    }
    result
}

/// Type nodes of a `type_list` nested under `node`
fn type_list(node: Node, source: &str) -> Vec<String> {
    let mut cursor = node.walk();
    let Some(list) = node
        .named_children(&mut cursor)
        .find(|c| c.kind() == "type_list")
    else {
        return Vec::new();
    };
    let mut cursor = list.walk();
    let types = list
        .named_children(&mut cursor)
        .map(|t| erase_type(text(t, source)))
        .collect();
    types
}

fn extract_type(node: Node, source: &str, outer: &[String], types: &mut Vec<TypeDecl>) {
    let Some(name) = node
        .child_by_field_name("name")
        .map(|n| text(n, source).to_string())
    else {
        return;
    };

    let kind = match node.kind() {
        "interface_declaration" => TypeKind::Interface,
        "enum_declaration" => TypeKind::Enum,
        "record_declaration" => TypeKind::Record,
        _ => TypeKind::Class,
    };

    let mut path = outer.to_vec();
    path.push(name.clone());

    let superclass = node.child_by_field_name("superclass").and_then(|sc| {
        let mut cursor = sc.walk();
        let found = sc
            .named_children(&mut cursor)
            .next()
            .map(|t| erase_type(text(t, source)));
        found
    });

    let interfaces = match kind {
        TypeKind::Interface => {
            let mut cursor = node.walk();
            let extends = node
                .children(&mut cursor)
                .find(|c| c.kind() == "extends_interfaces");
            extends.map(|n| type_list(n, source)).unwrap_or_default()
        }
        _ => node
            .child_by_field_name("interfaces")
            .map(|n| type_list(n, source))
            .unwrap_or_default(),
    };

    // Interface members are implicitly public
    let default_visibility = match kind {
        TypeKind::Interface => Visibility::Public,
        _ => Visibility::PackagePrivate,
    };

    let mut decl = TypeDecl {
        name,
        path,
        kind,
        superclass,
        interfaces,
        fields: Vec::new(),
        methods: Vec::new(),
        constructors: Vec::new(),
        initializer: MethodDecl::initializer(),
    };
    let mut nested = Vec::new();

    if kind == TypeKind::Record {
        if let Some(components) = node.child_by_field_name("parameters") {
            extract_components(components, source, &mut decl.fields);
        }
    }
    if let Some(body) = node.child_by_field_name("body") {
        extract_members(body, source, default_visibility, &mut decl, &mut nested);
    }

    types.push(decl);
    types.append(&mut nested);
}

/// Members of a class, interface, enum or record body
fn extract_members(
    body: Node,
    source: &str,
    default_visibility: Visibility,
    decl: &mut TypeDecl,
    nested: &mut Vec<TypeDecl>,
) {
    let mut cursor = body.walk();
    for member in body.named_children(&mut cursor) {
        match member.kind() {
            "field_declaration" | "constant_declaration" => {
                extract_fields(member, source, default_visibility, &mut decl.fields);
                let mut declarators = member.walk();
                for declarator in member.children_by_field_name("declarator", &mut declarators) {
                    if let Some(value) = declarator.child_by_field_name("value") {
                        walk_body(value, source, &mut decl.initializer);
                    }
                }
            }
            "method_declaration" => {
                if let Some(method) = extract_method(member, source, default_visibility) {
                    decl.methods.push(method);
                }
            }
            "constructor_declaration" | "compact_constructor_declaration" => {
                if let Some(ctor) = extract_method(member, source, default_visibility) {
                    decl.constructors.push(ctor);
                }
            }
            // `static { .. }`, `{ .. }` and `CONSTANT(args) { .. }`
            "static_initializer" | "block" | "enum_constant" => {
                walk_body(member, source, &mut decl.initializer);
            }
            "enum_body_declarations" => {
                extract_members(member, source, default_visibility, decl, nested);
            }
            kind if is_type_declaration(kind) => {
                extract_type(member, source, &decl.path, nested);
            }
            _ => {}
        }
    }
}

/// Record components, which are private fields
fn extract_components(node: Node, source: &str, fields: &mut Vec<FieldDecl>) {
    let mut cursor = node.walk();
    for component in node.named_children(&mut cursor) {
        let (Some(type_node), Some(name)) = (
            component.child_by_field_name("type"),
            component.child_by_field_name("name"),
        ) else {
            continue;
        };
        fields.push(FieldDecl {
            name: text(name, source).to_string(),
            type_name: collapse_whitespace(text(type_node, source)),
            visibility: Visibility::Private,
            is_static: false,
        });
    }
}

fn extract_fields(
    node: Node,
    source: &str,
    default_visibility: Visibility,
    fields: &mut Vec<FieldDecl>,
) {
    let Some(type_node) = node.child_by_field_name("type") else {
        return;
    };
    let type_name = collapse_whitespace(text(type_node, source));
    let mods = modifiers(node);
    let visibility = mods.visibility.unwrap_or(default_visibility);

    let mut cursor = node.walk();
    for declarator in node.children_by_field_name("declarator", &mut cursor) {
        if let Some(name) = declarator.child_by_field_name("name") {
            fields.push(FieldDecl {
                name: text(name, source).to_string(),
                type_name: type_name.clone(),
                visibility,
                is_static: mods.is_static,
            });
        }
    }
}

fn extract_method(node: Node, source: &str, default_visibility: Visibility) -> Option<MethodDecl> {
    let name = text(node.child_by_field_name("name")?, source).to_string();
    let mods = modifiers(node);

    let params = node
        .child_by_field_name("parameters")
        .map(|p| extract_params(p, source))
        .unwrap_or_default();

    let mut method = MethodDecl {
        name,
        visibility: mods.visibility.unwrap_or(default_visibility),
        is_static: mods.is_static,
        params,
        calls: Vec::new(),
        locals: Vec::new(),
        control_flow: Vec::new(),
    };

    if let Some(body) = node.child_by_field_name("body") {
        walk_body(body, source, &mut method);
    }
    Some(method)
}

fn extract_params(node: Node, source: &str) -> Vec<Param> {
    let mut params = Vec::new();
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "formal_parameter" => {
                let (Some(type_node), Some(name)) = (
                    child.child_by_field_name("type"),
                    child.child_by_field_name("name"),
                ) else {
                    continue;
                };
                let mut type_name = erase_type(text(type_node, source));
                // `String args[]`
                if let Some(dims) = child.child_by_field_name("dimensions") {
                    type_name.push_str(&erase_type(text(dims, source)));
                }
                params.push(Param {
                    name: text(name, source).to_string(),
                    type_name,
                    varargs: false,
                });
            }
            "spread_parameter" => {
                let mut inner = child.walk();
                let parts: Vec<Node> = child.named_children(&mut inner).collect();
                let type_node = parts
                    .iter()
                    .find(|n| !matches!(n.kind(), "modifiers" | "variable_declarator"));
                let name = parts
                    .iter()
                    .find(|n| n.kind() == "variable_declarator")
                    .and_then(|d| d.child_by_field_name("name"));
                if let (Some(type_node), Some(name)) = (type_node, name) {
                    params.push(Param {
                        name: text(name, source).to_string(),
                        type_name: erase_type(text(*type_node, source)),
                        varargs: true,
                    });
                }
            }
            _ => {}
        }
    }
    params
}

fn walk_body(node: Node, source: &str, method: &mut MethodDecl) {
    match node.kind() {
        // Local types are not part of the enclosing method
        kind if is_type_declaration(kind) => return,
        "method_invocation" => {
            if let Some(call) = extract_call(node, source) {
                method.calls.push(call);
            }
        }
        "local_variable_declaration" => {
            if let Some(type_node) = node.child_by_field_name("type") {
                let type_name = erase_type(text(type_node, source));
                let mut cursor = node.walk();
                for declarator in node.children_by_field_name("declarator", &mut cursor) {
                    if let Some(name) = declarator.child_by_field_name("name") {
                        method.locals.push(LocalVar {
                            name: text(name, source).to_string(),
                            type_name: type_name.clone(),
                        });
                    }
                }
            }
        }
        "if_statement" => {
            if let Some(condition) = node.child_by_field_name("condition") {
                method.control_flow.push(ControlFlowEntry {
                    kind: "if".to_string(),
                    condition: strip_parens(&collapse_whitespace(text(condition, source))),
                });
            }
        }
        "for_statement" => {
            let condition = node
                .child_by_field_name("condition")
                .map(|c| collapse_whitespace(text(c, source)))
                .unwrap_or_default();
            method.control_flow.push(ControlFlowEntry {
                kind: "for".to_string(),
                condition,
            });
        }
        "enhanced_for_statement" => {
            if let (Some(ty), Some(name), Some(value)) = (
                node.child_by_field_name("type"),
                node.child_by_field_name("name"),
                node.child_by_field_name("value"),
            ) {
                let name = text(name, source).to_string();
                method.control_flow.push(ControlFlowEntry {
                    kind: "for".to_string(),
                    condition: collapse_whitespace(&format!(
                        "{} {} : {}",
                        text(ty, source),
                        name,
                        text(value, source)
                    )),
                });
                method.locals.push(LocalVar {
                    name,
                    type_name: erase_type(text(ty, source)),
                });
            }
        }
        _ => {}
    }

    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        walk_body(child, source, method);
    }
}

fn strip_parens(condition: &str) -> String {
    condition
        .strip_prefix('(')
        .and_then(|c| c.strip_suffix(')'))
        .map_or_else(|| condition.to_string(), |c| c.trim().to_string())
}

fn extract_call(node: Node, source: &str) -> Option<CallSite> {
    let name = text(node.child_by_field_name("name")?, source).to_string();

    let receiver = match node.child_by_field_name("object") {
        None => Receiver::Implicit,
        Some(object) => match object.kind() {
            "this" => Receiver::This,
            "super" => Receiver::Super,
            "identifier" => Receiver::Name(text(object, source).to_string()),
            "field_access" => field_access_receiver(object, source),
            _ => typed_receiver(object, source)
                .unwrap_or_else(|| Receiver::Expression(collapse_whitespace(text(object, source)))),
        },
    };

    let args = node
        .child_by_field_name("arguments")
        .map(|args| {
            let mut cursor = args.walk();
            let types = args
                .named_children(&mut cursor)
                .filter(|a| !a.is_extra())
                .map(|a| argument_type(a, source))
                .collect();
            types
        })
        .unwrap_or_default();

    Some(CallSite {
        name,
        receiver,
        args,
        line: node.start_position().row + 1,
    })
}

/// `new T()` and `(T) x` receivers, possibly parenthesized
fn typed_receiver(node: Node, source: &str) -> Option<Receiver> {
    let written_type = |n: Node| {
        n.child_by_field_name("type")
            .map(|t| erase_type(text(t, source)))
    };
    match node.kind() {
        "object_creation_expression" => written_type(node).map(Receiver::New),
        "cast_expression" => written_type(node).map(Receiver::Cast),
        "parenthesized_expression" => {
            let mut cursor = node.walk();
            let inner = node.named_children(&mut cursor).find(|c| !c.is_extra());
            inner.and_then(|inner| typed_receiver(inner, source))
        }
        _ => None,
    }
}

fn argument_type(node: Node, source: &str) -> ArgType {
    let written = text(node, source);
    let known = match node.kind() {
        "string_literal" | "text_block" => "String",
        "character_literal" => "char",
        "true" | "false" => "boolean",
        "decimal_integer_literal"
        | "hex_integer_literal"
        | "octal_integer_literal"
        | "binary_integer_literal" => {
            if written.ends_with(|c| matches!(c, 'l' | 'L')) {
                "long"
            } else {
                "int"
            }
        }
        "decimal_floating_point_literal" | "hex_floating_point_literal" => {
            if written.ends_with(|c| matches!(c, 'f' | 'F')) {
                "float"
            } else {
                "double"
            }
        }
        "object_creation_expression" | "cast_expression" => {
            return node
                .child_by_field_name("type")
                .map_or(ArgType::Unknown, |t| {
                    ArgType::Known(erase_type(text(t, source)))
                });
        }
        "identifier" => return ArgType::Variable(written.to_string()),
        _ => return ArgType::Unknown,
    };
    ArgType::Known(known.to_string())
}

fn field_access_receiver(node: Node, source: &str) -> Receiver {
    let object = node.child_by_field_name("object");
    let field = node.child_by_field_name("field");
    if let (Some(object), Some(field)) = (object, field) {
        if object.kind() == "this" {
            return Receiver::ThisField(text(field, source).to_string());
        }
    }

    let written = collapse_whitespace(text(node, source));
    let is_dotted_name = written
        .chars()
        .all(|c| c.is_alphanumeric() || c == '_' || c == '$' || c == '.');
    if is_dotted_name {
        Receiver::Name(written)
    } else {
        Receiver::Expression(written)
    }
}
