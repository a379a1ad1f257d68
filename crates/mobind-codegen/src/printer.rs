//! Indented text output.

/// Accumulates lines of generated source with a running indentation.
pub struct Printer {
    buf: String,
    depth: usize,
    indent: &'static str,
}

impl Printer {
    /// A printer indenting with tabs.
    pub fn tabs() -> Self {
        Self::with_indent("\t")
    }

    pub fn with_indent(indent: &'static str) -> Self {
        Printer {
            buf: String::new(),
            depth: 0,
            indent,
        }
    }

    pub fn line(&mut self, text: impl AsRef<str>) {
        let text = text.as_ref();
        if !text.is_empty() {
            for _ in 0..self.depth {
                self.buf.push_str(self.indent);
            }
            self.buf.push_str(text);
        }
        self.buf.push('\n');
    }

    pub fn blank(&mut self) {
        self.buf.push('\n');
    }

    pub fn indent(&mut self) {
        self.depth += 1;
    }

    pub fn dedent(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Prints `open`, runs `body` one level deeper, then prints `close`.
    pub fn block(&mut self, open: impl AsRef<str>, close: &str, body: impl FnOnce(&mut Printer)) {
        self.line(open);
        self.indent();
        body(self);
        self.dedent();
        self.line(close);
    }

    /// A `/** ... */` comment, one source line per line. Empty docs print
    /// nothing.
    pub fn doc_block(&mut self, doc: &str) {
        if doc.is_empty() {
            return;
        }
        self.line("/**");
        for line in doc.lines() {
            let line = line.replace("*/", "* /");
            if line.is_empty() {
                self.line(" *");
            } else {
                self.line(format!(" * {}", line));
            }
        }
        self.line(" */");
    }

    /// A run of `//` comment lines.
    pub fn doc_lines(&mut self, doc: &str) {
        for line in doc.lines() {
            if line.is_empty() {
                self.line("//");
            } else {
                self.line(format!("// {}", line));
            }
        }
    }

    pub fn finish(self) -> String {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indents_blocks_and_docs() {
        let mut p = Printer::with_indent("    ");
        p.doc_block("First line.\n\nEnds with */ here.");
        p.block("class A {", "}", |p| {
            p.line("int x;");
            p.blank();
            p.doc_lines("Go style.");
        });
        assert_eq!(
            p.finish(),
            "/**\n * First line.\n *\n * Ends with * / here.\n */\nclass A {\n    int x;\n\n    // Go style.\n}\n"
        );
    }
}
