use super::{function_or_method, push_call, push_import, push_method_call, push_type_info, LanguageParser};
use crate::model::{FileRecord, Symbol};
use crate::types::SymbolKind;
use std::path::Path;
use tree_sitter::{Node, Parser};

pub struct PythonParser {
    parser: Parser,
}

impl PythonParser {
    pub fn new() -> Result<Self, String> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_python::LANGUAGE.into())
            .map_err(|e| format!("failed to set Python grammar: {e}"))?;
        Ok(Self { parser })
    }

    fn extract_symbols(&self, node: Node, code: &str, path: &Path, out: &mut Vec<Symbol>, class: Option<&str>) {
        match node.kind() {
            "function_definition" => {
                if let Some(name_node) = node.child_by_field_name("name") {
                    out.push(self.build_symbol(
                        name_node,
                        node,
                        code,
                        path,
                        function_or_method(class.is_some()),
                        class.map(str::to_string),
                    ));
                }
                // functions can nest (closures) but do not introduce a new class scope
                for child in node.children(&mut node.walk()) {
                    self.extract_symbols(child, code, path, out, class);
                }
            }
            "class_definition" => {
                let class_name = node.child_by_field_name("name").map(|n| code[n.byte_range()].to_string());
                if let Some(name_node) = node.child_by_field_name("name") {
                    out.push(self.build_symbol(name_node, node, code, path, SymbolKind::Class, None));
                }
                for child in node.children(&mut node.walk()) {
                    self.extract_symbols(child, code, path, out, class_name.as_deref());
                }
            }
            _ => {
                for child in node.children(&mut node.walk()) {
                    self.extract_symbols(child, code, path, out, class);
                }
            }
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
        Symbol {
            id: None,
            name: code[name_node.byte_range()].to_string(),
            kind,
            file_path: path.to_path_buf(),
            start_line: def_node.start_position().row as u32 + 1,
            end_line: def_node.end_position().row as u32 + 1,
            signature: signature_line(def_node, code),
            parent_class,
            docstring: docstring_of_with_source(def_node, code),
        }
    }

    fn walk_for_edges(&self, node: Node, code: &str, path: &Path, out: &mut FileRecord) {
        match node.kind() {
            "import_statement" => {
                let line = node.start_position().row as u32 + 1;
                for child in node.children(&mut node.walk()) {
                    if child.kind() == "dotted_name" {
                        push_import(&mut out.imports, path, code[child.byte_range()].to_string(), line, vec![]);
                    } else if child.kind() == "aliased_import" {
                        if let Some(name) = child.child_by_field_name("name") {
                            push_import(&mut out.imports, path, code[name.byte_range()].to_string(), line, vec![]);
                        }
                    }
                }
            }
            "import_from_statement" => {
                let line = node.start_position().row as u32 + 1;
                let module = node
                    .child_by_field_name("module_name")
                    .map(|n| code[n.byte_range()].to_string())
                    .unwrap_or_default();
                let mut names = Vec::new();
                for child in node.children(&mut node.walk()) {
                    if child.kind() == "wildcard_import" {
                        push_import(&mut out.imports, path, module.clone(), line, vec![]);
                        return;
                    }
                    if child.kind() == "dotted_name" && child != node.child_by_field_name("module_name").unwrap_or(child) {
                        names.push(code[child.byte_range()].to_string());
                    }
                }
                push_import(&mut out.imports, path, module, line, names);
            }
            "call" => {
                if let Some(func) = node.child_by_field_name("function") {
                    let line = node.start_position().row as u32 + 1;
                    match func.kind() {
                        "identifier" => {
                            push_call(&mut out.calls, path, code[func.byte_range()].to_string(), line);
                        }
                        "attribute" => {
                            if let Some(attr) = func.child_by_field_name("attribute") {
                                let method = code[attr.byte_range()].to_string();
                                let receiver = func
                                    .child_by_field_name("object")
                                    .map(|o| code[o.byte_range()].to_string())
                                    .unwrap_or_default();
                                push_method_call(&mut out.method_calls, path, line, receiver, method, None);
                            }
                        }
                        _ => {}
                    }
                }
            }
            "assignment" => {
                if let (Some(target), Some(ty)) = (node.child_by_field_name("left"), node.child_by_field_name("type")) {
                    if target.kind() == "identifier" {
                        let type_name = code[ty.byte_range()].to_string();
                        push_type_info(
                            &mut out.type_infos,
                            path,
                            code[target.byte_range()].to_string(),
                            node.start_position().row as u32 + 1,
                            type_name,
                        );
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

fn signature_line(node: Node, code: &str) -> String {
    let start = node.start_byte();
    let body_start = node
        .child_by_field_name("body")
        .map(|b| b.start_byte())
        .unwrap_or(node.end_byte());
    code[start..body_start].trim().trim_end_matches(':').to_string()
}

/// The first statement's string-literal body, if the definition opens with
/// a docstring (Python's convention for doc comments).
fn docstring_of_with_source<'a>(def_node: Node, code: &'a str) -> Option<String> {
    let body = def_node.child_by_field_name("body")?;
    let first = body.children(&mut body.walk()).next()?;
    if first.kind() != "expression_statement" {
        return None;
    }
    let expr = first.children(&mut first.walk()).next()?;
    if expr.kind() != "string" {
        return None;
    }
    let text = code[expr.byte_range()].trim();
    let trimmed = text
        .trim_start_matches("\"\"\"")
        .trim_end_matches("\"\"\"")
        .trim_start_matches("'''")
        .trim_end_matches("'''")
        .trim_start_matches('"')
        .trim_end_matches('"')
        .trim();
    Some(trimmed.to_string())
}

impl LanguageParser for PythonParser {
    fn parse_file(&mut self, path: &Path, source: &str) -> FileRecord {
        let Some(tree) = self.parser.parse(source, None) else {
            return super::empty_record();
        };
        let root = tree.root_node();
        let mut out = super::empty_record();
        self.extract_symbols(root, source, path, &mut out.symbols, None);
        self.walk_for_edges(root, source, path, &mut out);
        crate::model::sort_symbols(&mut out.symbols);
        out
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["py", "pyi"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_class_and_methods() {
        let mut parser = PythonParser::new().unwrap();
        let source = r#"
class Widget:
    def render(self):
        helper()
        return True

def helper():
    pass
"#;
        let record = parser.parse_file(Path::new("widget.py"), source);
        let names: Vec<_> = record.symbols.iter().map(|s| s.name.as_str()).collect();
        assert!(names.contains(&"Widget"));
        assert!(names.contains(&"render"));
        assert!(names.contains(&"helper"));

        let render = record.symbols.iter().find(|s| s.name == "render").unwrap();
        assert_eq!(render.kind, SymbolKind::Method);
        assert_eq!(render.parent_class.as_deref(), Some("Widget"));
    }

    #[test]
    fn extracts_imports() {
        let mut parser = PythonParser::new().unwrap();
        let source = "from collections import OrderedDict, defaultdict\nimport os\n";
        let record = parser.parse_file(Path::new("mod.py"), source);
        assert!(record.imports.iter().any(|i| i.imported_module == "collections"));
        assert!(record.imports.iter().any(|i| i.imported_module == "os"));
    }
}
