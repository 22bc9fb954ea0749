//! Import resolution: matching an `ImportLink`'s module path against
//! scanned files so `graph`/`context` can hop across module boundaries
//! (spec.md §4.7).

use crate::model::ImportLink;
use crate::store::Store;
use std::path::{Path, PathBuf};

/// Resolves every unresolved `ImportLink` in the store against its own
/// scanned files, writing back `(definition_file, definition_symbol)`
/// where a match is found. Returns the count actually resolved.
pub fn resolve_imports(store: &Store) -> crate::error::CoreResult<usize> {
    let links = store.query_import_links(None)?;
    let mut resolved = 0;

    for link in links.into_iter().filter(|l| !l.is_resolved()) {
        if let Some((file, symbol)) = resolve_one(store, &link)? {
            let importer = link.importer_file.to_string_lossy();
            let definition = file.to_string_lossy();
            store.update_import_link(&importer, link.import_line, Some(&definition), symbol.as_deref())?;
            resolved += 1;
        }
    }

    Ok(resolved)
}

fn resolve_one(store: &Store, link: &ImportLink) -> crate::error::CoreResult<Option<(PathBuf, Option<String>)>> {
    let candidate = module_to_path(&link.importer_file, &link.imported_module);
    let Some(candidate) = candidate else { return Ok(None) };

    let symbols = store.query_symbols(&crate::store::SymbolFilter {
        file_path: Some(candidate.to_string_lossy().to_string()),
        ..Default::default()
    })?;
    if symbols.is_empty() {
        return Ok(None);
    }

    if link.imported_symbols.is_empty() {
        return Ok(Some((candidate, None)));
    }

    let first_match = link
        .imported_symbols
        .iter()
        .find(|wanted| symbols.iter().any(|s| &s.name == *wanted));
    Ok(Some((candidate, first_match.cloned())))
}

/// Turns a module string (`foo.bar`, `crate::foo::bar`, `./sibling`) into a
/// plausible source file relative to the importer, without touching disk —
/// callers confirm existence via the store's own scanned file set.
fn module_to_path(importer_file: &Path, module: &str) -> Option<PathBuf> {
    let base = importer_file.parent().unwrap_or_else(|| Path::new(""));

    if let Some(rest) = module.strip_prefix("./").or_else(|| module.strip_prefix("../")) {
        return Some(base.join(rest).with_extension(extension_of(importer_file)));
    }

    let segments: Vec<&str> = module.split(['.', ':']).filter(|s| !s.is_empty() && *s != "crate").collect();
    if segments.is_empty() {
        return None;
    }
    let joined: PathBuf = segments.iter().collect();
    Some(base.join(joined).with_extension(extension_of(importer_file)))
}

fn extension_of(file: &Path) -> &str {
    file.extension().and_then(|e| e.to_str()).unwrap_or("rs")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_to_path_handles_dotted_python_module() {
        let importer = PathBuf::from("pkg/app.py");
        let path = module_to_path(&importer, "pkg.utils").unwrap();
        assert_eq!(path, PathBuf::from("pkg/pkg/utils.py"));
    }

    #[test]
    fn module_to_path_handles_relative_import() {
        let importer = PathBuf::from("pkg/app.py");
        let path = module_to_path(&importer, "./sibling").unwrap();
        assert_eq!(path, PathBuf::from("pkg/sibling.py"));
    }
}
