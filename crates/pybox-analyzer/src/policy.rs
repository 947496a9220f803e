//! Import denylist policy
//!
//! A denylist is the weaker cousin of an allowlist, but it is the contract
//! this service exposes: block the modules that reach the host (filesystem,
//! processes, threads, network, FFI) and the GUI toolkits that would hang a
//! headless worker. Everything else is left to the subprocess boundary.

use std::collections::HashSet;

use rustpython_parser::{ast, parse, Mode};
use tracing::debug;

use crate::Verdict;

/// Modules refused by the stock policy.
const DEFAULT_DENYLIST: &[&str] = &[
    // GUI / game toolkits
    "pygame", "tkinter", "kivy", "turtle",
    "PyQt5", "PySide2", "PyQt6", "PySide6",
    "wx", "arcade", "pyglet",
    // host access
    "os", "subprocess", "shutil", "sys",
    // threads and processes
    "_thread", "threading", "multiprocessing",
    // network
    "socket", "requests", "urllib",
    // FFI
    "ctypes",
];

/// Immutable import policy, constructed once at startup.
///
/// There is deliberately no global here: the set is an explicit value handed
/// to whoever screens snippets, which also makes alternate denylists trivial
/// to test.
pub struct ImportPolicy {
    denied: HashSet<String>,
}

impl Default for ImportPolicy {
    fn default() -> Self {
        let mut policy = Self::empty();
        for module in DEFAULT_DENYLIST {
            policy.deny(module);
        }
        policy
    }
}

impl ImportPolicy {
    /// A policy that denies nothing
    pub fn empty() -> Self {
        Self {
            denied: HashSet::new(),
        }
    }

    /// Add a module to the denylist (builder-time only; the policy is not
    /// mutated once requests are being served)
    pub fn deny(&mut self, module: &str) {
        self.denied.insert(module.to_string());
    }

    /// Remove a module from the denylist
    pub fn allow(&mut self, module: &str) {
        self.denied.remove(module);
    }

    /// Exact, case-sensitive membership test on the dotted name as written
    pub fn is_denied(&self, module: &str) -> bool {
        self.denied.contains(module)
    }

    /// Screen a snippet without executing it.
    ///
    /// A parse failure is a safety rejection, not a server error: the caller
    /// renders it the same way as any other refused snippet.
    pub fn check(&self, source: &str) -> Verdict {
        let module = match parse(source, Mode::Module, "<snippet>") {
            Ok(ast::Mod::Module(module)) => module,
            Ok(_) => return Verdict::parse_failure("expected a module body"),
            Err(e) => {
                debug!(error = %e, "snippet failed to parse");
                return Verdict::parse_failure(e.to_string());
            }
        };

        match self.scan(&module.body) {
            Some(found) => {
                debug!(module = %found, "snippet names a denylisted module");
                Verdict::violation(found)
            }
            None => Verdict::approved(),
        }
    }

    /// Depth-first, declaration-order walk over every statement, stopping at
    /// the first denylisted import.
    ///
    /// Import statements can hide inside any compound statement body, so
    /// each variant that carries one recurses; node kinds without nested
    /// statements fall through the default arm and are skipped.
    fn scan(&self, body: &[ast::Stmt]) -> Option<String> {
        for stmt in body {
            match stmt {
                ast::Stmt::Import(node) => {
                    for alias in &node.names {
                        if self.is_denied(alias.name.as_str()) {
                            return Some(alias.name.to_string());
                        }
                    }
                }
                // `from . import x` has no module name; relative imports are
                // skipped, as are submodule prefixes (`os.path` is not `os`)
                ast::Stmt::ImportFrom(node) => {
                    if let Some(module) = &node.module {
                        if self.is_denied(module.as_str()) {
                            return Some(module.to_string());
                        }
                    }
                }
                ast::Stmt::FunctionDef(node) => {
                    if let Some(found) = self.scan(&node.body) {
                        return Some(found);
                    }
                }
                ast::Stmt::AsyncFunctionDef(node) => {
                    if let Some(found) = self.scan(&node.body) {
                        return Some(found);
                    }
                }
                ast::Stmt::ClassDef(node) => {
                    if let Some(found) = self.scan(&node.body) {
                        return Some(found);
                    }
                }
                ast::Stmt::If(node) => {
                    if let Some(found) = self
                        .scan(&node.body)
                        .or_else(|| self.scan(&node.orelse))
                    {
                        return Some(found);
                    }
                }
                ast::Stmt::While(node) => {
                    if let Some(found) = self
                        .scan(&node.body)
                        .or_else(|| self.scan(&node.orelse))
                    {
                        return Some(found);
                    }
                }
                ast::Stmt::For(node) => {
                    if let Some(found) = self
                        .scan(&node.body)
                        .or_else(|| self.scan(&node.orelse))
                    {
                        return Some(found);
                    }
                }
                ast::Stmt::AsyncFor(node) => {
                    if let Some(found) = self
                        .scan(&node.body)
                        .or_else(|| self.scan(&node.orelse))
                    {
                        return Some(found);
                    }
                }
                ast::Stmt::With(node) => {
                    if let Some(found) = self.scan(&node.body) {
                        return Some(found);
                    }
                }
                ast::Stmt::AsyncWith(node) => {
                    if let Some(found) = self.scan(&node.body) {
                        return Some(found);
                    }
                }
                ast::Stmt::Try(node) => {
                    if let Some(found) = self
                        .scan(&node.body)
                        .or_else(|| self.scan_handlers(&node.handlers))
                        .or_else(|| self.scan(&node.orelse))
                        .or_else(|| self.scan(&node.finalbody))
                    {
                        return Some(found);
                    }
                }
                ast::Stmt::TryStar(node) => {
                    if let Some(found) = self
                        .scan(&node.body)
                        .or_else(|| self.scan_handlers(&node.handlers))
                        .or_else(|| self.scan(&node.orelse))
                        .or_else(|| self.scan(&node.finalbody))
                    {
                        return Some(found);
                    }
                }
                ast::Stmt::Match(node) => {
                    for case in &node.cases {
                        if let Some(found) = self.scan(&case.body) {
                            return Some(found);
                        }
                    }
                }
                // Expressions, assignments, etc. cannot carry an import
                // statement; unfamiliar node kinds are skipped, not refused
                _ => {}
            }
        }
        None
    }

    fn scan_handlers(&self, handlers: &[ast::ExceptHandler]) -> Option<String> {
        for handler in handlers {
            let ast::ExceptHandler::ExceptHandler(node) = handler;
            if let Some(found) = self.scan(&node.body) {
                return Some(found);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_code_is_approved() {
        let policy = ImportPolicy::default();
        let verdict = policy.check("print('hi')");
        assert!(verdict.approved);
        assert_eq!(verdict.violating_module, None);
        assert_eq!(verdict.diagnostic, None);
    }

    #[test]
    fn plain_import_is_blocked() {
        let policy = ImportPolicy::default();
        let verdict = policy.check("import os");
        assert!(!verdict.approved);
        assert_eq!(verdict.violating_module.as_deref(), Some("os"));
    }

    #[test]
    fn from_import_is_blocked() {
        let policy = ImportPolicy::default();
        let verdict = policy.check("from socket import create_connection");
        assert!(!verdict.approved);
        assert_eq!(verdict.violating_module.as_deref(), Some("socket"));
    }

    #[test]
    fn aliased_import_still_names_the_module() {
        let policy = ImportPolicy::default();
        let verdict = policy.check("import subprocess as sp");
        assert!(!verdict.approved);
        assert_eq!(verdict.violating_module.as_deref(), Some("subprocess"));
    }

    #[test]
    fn dotted_name_is_not_prefix_matched() {
        // `os` is denied but `os.path` is compared as written, so the
        // dotted form passes the stock policy
        let policy = ImportPolicy::default();
        assert!(policy.check("import os.path").approved);

        let mut strict = ImportPolicy::default();
        strict.deny("os.path");
        let verdict = strict.check("import os.path");
        assert!(!verdict.approved);
        assert_eq!(verdict.violating_module.as_deref(), Some("os.path"));
    }

    #[test]
    fn matching_is_case_sensitive() {
        let policy = ImportPolicy::default();
        assert!(policy.check("import OS").approved);
    }

    #[test]
    fn relative_import_is_skipped() {
        let policy = ImportPolicy::default();
        assert!(policy.check("from . import helpers").approved);
    }

    #[test]
    fn nested_import_is_found() {
        let policy = ImportPolicy::default();
        let code = "def sneaky():\n    if True:\n        import shutil\n";
        let verdict = policy.check(code);
        assert!(!verdict.approved);
        assert_eq!(verdict.violating_module.as_deref(), Some("shutil"));
    }

    #[test]
    fn import_inside_try_handler_is_found() {
        let policy = ImportPolicy::default();
        let code = "try:\n    pass\nexcept ImportError:\n    import ctypes\n";
        let verdict = policy.check(code);
        assert!(!verdict.approved);
        assert_eq!(verdict.violating_module.as_deref(), Some("ctypes"));
    }

    #[test]
    fn first_violation_wins() {
        let policy = ImportPolicy::default();
        let verdict = policy.check("import socket\nimport os\n");
        assert_eq!(verdict.violating_module.as_deref(), Some("socket"));
    }

    #[test]
    fn syntax_error_is_rejected_with_diagnostic() {
        let policy = ImportPolicy::default();
        let verdict = policy.check("def broken(:\n");
        assert!(!verdict.approved);
        assert_eq!(verdict.violating_module, None);
        assert!(!verdict.diagnostic.as_deref().unwrap_or("").is_empty());
    }

    #[test]
    fn empty_policy_approves_everything() {
        let policy = ImportPolicy::empty();
        assert!(policy.check("import os\nimport socket").approved);
    }

    #[test]
    fn allow_removes_a_default_entry() {
        let mut policy = ImportPolicy::default();
        policy.allow("os");
        assert!(policy.check("import os").approved);
        assert!(!policy.check("import sys").approved);
    }
}
