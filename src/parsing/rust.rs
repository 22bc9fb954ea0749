use super::{function_or_method, push_call, push_import, push_method_call, push_type_info, LanguageParser};
use crate::model::{FileRecord, Symbol};
use crate::types::SymbolKind;
use std::path::Path;
use tree_sitter::{Node, Parser};

pub struct RustParser {
    parser: Parser,
}

impl RustParser {
    pub fn new() -> Result<Self, String> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_rust::LANGUAGE.into())
            .map_err(|e| format!("failed to set Rust grammar: {e}"))?;
        Ok(Self { parser })
    }

    fn extract_symbols(&self, node: Node, code: &str, path: &Path, out: &mut Vec<Symbol>) {
        match node.kind() {
            "function_item" => {
                let is_method = has_ancestor(node, "impl_item");
                if let Some(name_node) = node.child_by_field_name("name") {
                    out.push(self.build_symbol(
                        name_node,
                        node,
                        code,
                        path,
                        function_or_method(is_method),
                        parent_type_for(node, code),
                    ));
                }
            }
            "struct_item" => {
                if let Some(name_node) = node.child_by_field_name("name") {
                    out.push(self.build_symbol(name_node, node, code, path, SymbolKind::Class, None));
                }
            }
            "enum_item" => {
                if let Some(name_node) = node.child_by_field_name("name") {
                    out.push(self.build_symbol(name_node, node, code, path, SymbolKind::Class, None));
                }
            }
            "trait_item" => {
                if let Some(name_node) = node.child_by_field_name("name") {
                    out.push(self.build_symbol(name_node, node, code, path, SymbolKind::Interface, None));
                }
            }
            "const_item" | "static_item" => {
                if let Some(name_node) = node.child_by_field_name("name") {
                    out.push(self.build_symbol(name_node, node, code, path, SymbolKind::Variable, None));
                }
            }
            _ => {}
        }
        for child in node.children(&mut node.walk()) {
            self.extract_symbols(child, code, path, out);
        }
    }

    fn build_symbol(
        &self,
        name_node: Node,
        def_node: Node,
        code: &str,
        path: &Path,
        kind: SymbolKind,
        parent_class: Option<String>,
    ) -> Symbol {
        let name = code[name_node.byte_range()].to_string();
        let signature = signature_line(def_node, code);
        let docstring = doc_comment_above(def_node, code);
        Symbol {
            id: None,
            name,
            kind,
            file_path: path.to_path_buf(),
            start_line: def_node.start_position().row as u32 + 1,
            end_line: def_node.end_position().row as u32 + 1,
            signature,
            parent_class,
            docstring,
        }
    }

    fn extract_use_tree(&self, node: Node, code: &str, path: &Path, prefix: String, line: u32, out: &mut FileRecord) {
        if node.kind() != "use_tree" {
            return;
        }
        let mut segment_path = prefix.clone();
        for child in node.children(&mut node.walk()) {
            match child.kind() {
                "identifier" | "scoped_identifier" | "crate" | "self" | "super" => {
                    let segment = &code[child.byte_range()];
                    if !segment_path.is_empty() {
                        segment_path.push_str("::");
                    }
                    segment_path.push_str(segment);
                }
                "use_wildcard" => {
                    push_import(&mut out.imports, path, segment_path.clone(), line, vec![]);
                    return;
                }
                "use_list" => {
                    for item in child.children(&mut child.walk()) {
                        if item.kind() == "use_tree" {
                            self.extract_use_tree(item, code, path, segment_path.clone(), line, out);
                        }
                    }
                    return;
                }
                "use_as_clause" => {
                    if let Some(alias) = child.child_by_field_name("alias") {
                        let alias = code[alias.byte_range()].to_string();
                        push_import(&mut out.imports, path, segment_path.clone(), line, vec![alias]);
                        return;
                    }
                }
                _ => {}
            }
        }
        if !segment_path.is_empty() && segment_path != prefix {
            push_import(&mut out.imports, path, segment_path, line, vec![]);
        }
    }

    fn walk_for_edges(&self, node: Node, code: &str, path: &Path, out: &mut FileRecord) {
        match node.kind() {
            "use_declaration" => {
                let line = node.start_position().row as u32 + 1;
                if let Some(tree) = node.children(&mut node.walk()).find(|n| n.kind() == "use_tree") {
                    self.extract_use_tree(tree, code, path, String::new(), line, out);
                }
            }
            "call_expression" => {
                if let Some(func) = node.child_by_field_name("function") {
                    let line = node.start_position().row as u32 + 1;
                    match func.kind() {
                        "identifier" => {
                            let name = code[func.byte_range()].to_string();
                            push_call(&mut out.calls, path, name, line);
                        }
                        "field_expression" => {
                            if let Some(field) = func.child_by_field_name("field") {
                                let method = code[field.byte_range()].to_string();
                                let receiver = func
                                    .child_by_field_name("value")
                                    .map(|v| code[v.byte_range()].to_string())
                                    .unwrap_or_default();
                                push_method_call(&mut out.method_calls, path, line, receiver, method, None);
                            }
                        }
                        _ => {}
                    }
                }
            }
            "let_declaration" => {
                if let (Some(pattern), Some(ty)) = (node.child_by_field_name("pattern"), node.child_by_field_name("type")) {
                    if pattern.kind() == "identifier" {
                        let var = code[pattern.byte_range()].to_string();
                        let type_name = extract_type_name(ty, code).unwrap_or_default();
                        if !type_name.is_empty() {
                            push_type_info(
                                &mut out.type_infos,
                                path,
                                var,
                                node.start_position().row as u32 + 1,
                                type_name,
                            );
                        }
                    }
                }
            }
            _ => {}
        }
        for child in node.children(&mut node.walk()) {
            self.walk_for_edges(child, code, path, out);
        }
    }
}

fn has_ancestor(node: Node, kind: &str) -> bool {
    let mut current = node.parent();
    while let Some(n) = current {
        if n.kind() == kind {
            return true;
        }
        current = n.parent();
    }
    false
}

/// The `impl Foo` or `impl Trait for Foo` type name enclosing `node`, used
/// as a method's `parent_class`.
fn parent_type_for(node: Node, code: &str) -> Option<String> {
    let mut current = node.parent();
    while let Some(n) = current {
        if n.kind() == "impl_item" {
            if let Some(ty) = n.child_by_field_name("type") {
                return extract_type_name(ty, code);
            }
        }
        current = n.parent();
    }
    None
}

fn extract_type_name(node: Node, code: &str) -> Option<String> {
    match node.kind() {
        "type_identifier" | "primitive_type" | "scoped_type_identifier" => {
            Some(code[node.byte_range()].to_string())
        }
        "generic_type" => node
            .child_by_field_name("type")
            .and_then(|t| extract_type_name(t, code)),
        "reference_type" => node.child_by_field_name("type").and_then(|t| extract_type_name(t, code)),
        _ => node
            .children(&mut node.walk())
            .find_map(|child| extract_type_name(child, code)),
    }
}

fn signature_line(node: Node, code: &str) -> String {
    let start = node.start_byte();
    let body_start = node
        .child_by_field_name("body")
        .map(|b| b.start_byte())
        .unwrap_or(node.end_byte());
    code[start..body_start].trim().to_string()
}

/// Collects contiguous `///` / `/**` lines immediately above `node`.
fn doc_comment_above(node: Node, code: &str) -> Option<String> {
    let mut lines = Vec::new();
    let mut sibling = node.prev_sibling();
    while let Some(n) = sibling {
        if n.kind() != "line_comment" && n.kind() != "block_comment" {
            break;
        }
        let text = code[n.byte_range()].trim();
        if !text.starts_with("///") && !text.starts_with("/**") {
            break;
        }
        lines.push(text.trim_start_matches('/').trim_start_matches('*').trim().to_string());
        sibling = n.prev_sibling();
    }
    if lines.is_empty() {
        return None;
    }
    lines.reverse();
    Some(lines.join("\n"))
}

impl LanguageParser for RustParser {
    fn parse_file(&mut self, path: &Path, source: &str) -> FileRecord {
        let Some(tree) = self.parser.parse(source, None) else {
            return super::empty_record();
        };
        let root = tree.root_node();
        let mut out = super::empty_record();
        self.extract_symbols(root, source, path, &mut out.symbols);
        self.walk_for_edges(root, source, path, &mut out);
        crate::model::sort_symbols(&mut out.symbols);
        out
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["rs"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_function_and_struct() {
        let mut parser = RustParser::new().unwrap();
        let source = r#"
struct Widget;

impl Widget {
    fn render(&self) -> bool {
        helper();
        true
    }
}

fn helper() {}
"#;
        let record = parser.parse_file(Path::new("widget.rs"), source);
        let names: Vec<_> = record.symbols.iter().map(|s| s.name.as_str()).collect();
        assert!(names.contains(&"Widget"));
        assert!(names.contains(&"render"));
        assert!(names.contains(&"helper"));

        let render = record.symbols.iter().find(|s| s.name == "render").unwrap();
        assert_eq!(render.kind, SymbolKind::Method);
        assert_eq!(render.parent_class.as_deref(), Some("Widget"));

        assert!(record.calls.iter().any(|c| c.callee == "helper"));
    }

    #[test]
    fn extracts_use_declarations() {
        let mut parser = RustParser::new().unwrap();
        let source = "use std::collections::{HashMap, HashSet};\n";
        let record = parser.parse_file(Path::new("lib.rs"), source);
        let modules: Vec<_> = record.imports.iter().map(|i| i.imported_module.as_str()).collect();
        assert!(modules.contains(&"std::collections::HashMap"));
        assert!(modules.contains(&"std::collections::HashSet"));
    }

    #[test]
    fn malformed_source_yields_empty_record_not_panic() {
        let mut parser = RustParser::new().unwrap();
        let record = parser.parse_file(Path::new("broken.rs"), "fn (((( {{{{");
        // tree-sitter still returns a best-effort tree for this; the parser
        // must not panic regardless of what it finds.
        let _ = record;
    }
}
