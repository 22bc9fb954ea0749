//! Post-edit syntax validation (spec.md §4.8 step 4).

use crate::parsing::parser_for;
use std::path::Path;
use tree_sitter::Parser;

/// Re-parses `rewritten` with the language grammar for `path`'s extension
/// and fails if the tree contains any error/missing node. Files whose
/// extension has no grammar fall back to a balanced-delimiter heuristic.
pub fn validate_syntax(path: &Path, rewritten: &str) -> Result<(), String> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    match extension {
        "rs" => validate_with_grammar(&tree_sitter_rust::LANGUAGE.into(), rewritten),
        "py" | "pyi" => validate_with_grammar(&tree_sitter_python::LANGUAGE.into(), rewritten),
        _ => validate_balanced_delimiters(rewritten),
    }
}

fn validate_with_grammar(language: &tree_sitter::Language, source: &str) -> Result<(), String> {
    let mut parser = Parser::new();
    parser.set_language(language).map_err(|e| e.to_string())?;
    let tree = parser.parse(source, None).ok_or("parser produced no tree")?;
    if tree.root_node().has_error() {
        return Err("parse tree contains a syntax error".to_string());
    }
    Ok(())
}

fn validate_balanced_delimiters(source: &str) -> Result<(), String> {
    let mut stack = Vec::new();
    for c in source.chars() {
        match c {
            '(' | '[' | '{' => stack.push(c),
            ')' => expect(&mut stack, '(')?,
            ']' => expect(&mut stack, '[')?,
            '}' => expect(&mut stack, '{')?,
            _ => {}
        }
    }
    if !stack.is_empty() {
        return Err(format!("unbalanced delimiters: {} unclosed", stack.len()));
    }
    Ok(())
}

fn expect(stack: &mut Vec<char>, opener: char) -> Result<(), String> {
    match stack.pop() {
        Some(c) if c == opener => Ok(()),
        _ => Err(format!("unmatched closing delimiter for '{opener}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn rejects_unbalanced_rust_source() {
        let path = PathBuf::from("a.rs");
        let result = validate_syntax(&path, "fn a( {}");
        assert!(result.is_err());
    }

    #[test]
    fn accepts_well_formed_rust_source() {
        let path = PathBuf::from("a.rs");
        let result = validate_syntax(&path, "fn a() {}\n");
        assert!(result.is_ok());
    }

    #[test]
    fn balanced_delimiter_fallback_rejects_mismatch() {
        let path = PathBuf::from("a.txt");
        assert!(validate_syntax(&path, "(a]").is_err());
        assert!(validate_syntax(&path, "(a)").is_ok());
    }
}
