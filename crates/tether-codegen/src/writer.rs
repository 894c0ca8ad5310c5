/// Line-oriented builder for emitted Rust source.
#[derive(Debug, Default)]
pub struct CodeWriter {
    buf: String,
    indent: usize,
}

const INDENT: &str = "    ";

impl CodeWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write one line at the current indentation. Empty lines carry no
    /// trailing whitespace.
    pub fn line(&mut self, text: impl AsRef<str>) -> &mut Self {
        let text = text.as_ref();
        if !text.is_empty() {
            for _ in 0..self.indent {
                self.buf.push_str(INDENT);
            }
            self.buf.push_str(text);
        }
        self.buf.push('\n');
        self
    }

    pub fn blank(&mut self) -> &mut Self {
        self.line("")
    }

    /// `open {` ... `}` with the body indented one level.
    pub fn block(&mut self, open: impl AsRef<str>, body: impl FnOnce(&mut Self)) -> &mut Self {
        self.block_with(format!("{} {{", open.as_ref()), "}", body)
    }

    /// Like [`block`](Self::block) with explicit opening and closing lines.
    pub fn block_with(&mut self, open: impl AsRef<str>, close: &str, body: impl FnOnce(&mut Self)) -> &mut Self {
        self.line(open);
        self.indent += 1;
        body(self);
        self.indent -= 1;
        self.line(close)
    }

    /// Write `items` with `each`, separated by blank lines.
    pub fn separated<T>(&mut self, items: impl IntoIterator<Item = T>, mut each: impl FnMut(&mut Self, T)) -> &mut Self {
        for (i, item) in items.into_iter().enumerate() {
            if i > 0 {
                self.blank();
            }
            each(self, item);
        }
        self
    }

    pub fn finish(self) -> String {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocks_indent() {
        let mut w = CodeWriter::new();
        w.block("impl Foo", |w| {
            w.block("fn a(&self)", |w| {
                w.line("1");
            });
            w.blank();
            w.block_with("const X: &[u8] = &[", "];", |w| {
                w.line("0,");
            });
        });
        assert_eq!(
            w.finish(),
            "impl Foo {\n    fn a(&self) {\n        1\n    }\n\n    const X: &[u8] = &[\n        0,\n    ];\n}\n"
        );
    }

    #[test]
    fn test_separated() {
        let mut w = CodeWriter::new();
        w.separated(["a", "b"], |w, s| {
            w.line(s);
        });
        assert_eq!(w.finish(), "a\n\nb\n");
    }
}
