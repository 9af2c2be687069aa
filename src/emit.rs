//! Indentation-tracking text builder for generated source files.
//!
//! Nested regions are opened with [`CodeBuilder::begin_scope`], which returns
//! a [`Scope`] guard. The guard mutably borrows the builder, so inner scopes
//! can only be opened through it and must be dropped before the outer one;
//! dropping a guard writes the closing brace and restores the indent.

use std::fmt::{self, Write as _};
use std::ops::{Deref, DerefMut};

use crate::error::{GenerateError, Result};

/// Columns per indent level.
pub const INDENT_WIDTH: usize = 4;

#[derive(Debug, Default)]
pub struct CodeBuilder {
    buf: String,
    level: usize,
}

impl CodeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn write_indent(&mut self) {
        self.buf
            .extend(std::iter::repeat_n(' ', self.level * INDENT_WIDTH));
    }

    /// Write one line at the current indent. Empty text gives an empty line.
    pub fn append_line(&mut self, text: &str) {
        if !text.is_empty() {
            self.write_indent();
            self.buf.push_str(text);
        }
        self.buf.push('\n');
    }

    /// Write one formatted line at the current indent.
    pub fn append_fmt(&mut self, args: fmt::Arguments<'_>) {
        self.write_indent();
        // writing into a String cannot fail
        let _ = self.buf.write_fmt(args);
        self.buf.push('\n');
    }

    pub fn append_blank(&mut self) {
        self.buf.push('\n');
    }

    /// Three-line `<summary>` block; nothing for an empty summary.
    pub fn append_doc_comment(&mut self, summary: &str) {
        if summary.is_empty() {
            return;
        }
        self.append_line("/// <summary>");
        self.append_fmt(format_args!("/// {summary}"));
        self.append_line("/// </summary>");
    }

    /// Write `header` and an opening brace, then indent until the returned
    /// guard is dropped.
    pub fn begin_scope(&mut self, header: &str, doc: Option<&str>) -> Scope<'_> {
        if let Some(summary) = doc {
            self.append_doc_comment(summary);
        }
        self.append_line(header);
        self.open("{", "}")
    }

    /// A scope without a doc comment.
    pub fn begin_brace(&mut self, header: &str) -> Scope<'_> {
        self.begin_scope(header, None)
    }

    /// An initializer block closed by `};`.
    pub fn begin_initializer(&mut self, header: &str) -> Scope<'_> {
        self.append_line(header);
        self.open("{", "};")
    }

    fn open(&mut self, opener: &str, closer: &'static str) -> Scope<'_> {
        self.append_line(opener);
        self.level += 1;
        Scope {
            builder: self,
            closer,
        }
    }

    /// `public {ty} {name} { get; set; }` followed by a blank line.
    pub fn append_property(&mut self, ty: &str, name: &str) {
        self.append_fmt(format_args!("public {ty} {name} {{ get; set; }}"));
        self.append_blank();
    }

    /// Overridable navigation property followed by a blank line.
    pub fn append_virtual_property(&mut self, ty: &str, name: &str) {
        self.append_fmt(format_args!("public virtual {ty} {name} {{ get; set; }}"));
        self.append_blank();
    }

    /// Collection property with a restricted setter, followed by a blank line.
    pub fn append_collection_property(&mut self, ty: &str, name: &str, protected_setter: bool) {
        let setter = if protected_setter { "protected" } else { "private" };
        self.append_fmt(format_args!(
            "public virtual {ty} {name} {{ get; {setter} set; }}"
        ));
        self.append_blank();
    }

    /// Number of scopes currently open.
    pub fn depth(&self) -> usize {
        self.level
    }

    /// Text written so far, including lines of scopes still open.
    pub fn as_str(&self) -> &str {
        &self.buf
    }

    /// Take the text of a finished unit. Fails if a scope guard was leaked.
    pub fn finish(self) -> Result<String> {
        if self.level != 0 {
            return Err(GenerateError::UnbalancedScope { depth: self.level });
        }
        Ok(self.buf)
    }
}

/// An open brace-delimited region. Closing happens on drop.
#[derive(Debug)]
pub struct Scope<'a> {
    builder: &'a mut CodeBuilder,
    closer: &'static str,
}

impl Deref for Scope<'_> {
    type Target = CodeBuilder;

    fn deref(&self) -> &CodeBuilder {
        self.builder
    }
}

impl DerefMut for Scope<'_> {
    fn deref_mut(&mut self) -> &mut CodeBuilder {
        self.builder
    }
}

impl Drop for Scope<'_> {
    fn drop(&mut self) {
        self.builder.level -= 1;
        let closer = self.closer;
        self.builder.append_line(closer);
    }
}
