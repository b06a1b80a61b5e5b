//! Comments kept beside the token stream.

use text_size::{TextRange, TextSize};

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum CommentKind {
    /// `# text` up to the end of the line.
    Line,
    /// `### text ###`, possibly spanning lines.
    Block,
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Comment {
    pub kind: CommentKind,
    pub range: TextRange,
}

impl Comment {
    pub fn new(kind: CommentKind, range: TextRange) -> Self {
        Self { kind, range }
    }

    /// Delimiter ranges and their JavaScript spelling. An unterminated
    /// block comment only has its opening delimiter.
    pub fn delimiters(self, text: &str) -> Vec<(TextRange, &'static str)> {
        let start = self.range.start();
        match self.kind {
            CommentKind::Line => vec![(TextRange::at(start, TextSize::new(1)), "//")],
            CommentKind::Block => {
                let opening = TextRange::at(start, TextSize::new(3));
                let body = &text[self.range];
                if body.len() >= 6 && body.ends_with("###") {
                    let end = self.range.end();
                    let closing = TextRange::new(end - TextSize::new(3), end);
                    vec![(opening, "/*"), (closing, "*/")]
                } else {
                    vec![(opening, "/*")]
                }
            }
        }
    }

    /// The comment spelled as a JavaScript comment.
    pub fn to_javascript(self, text: &str) -> String {
        let offset = usize::from(self.range.start());
        let mut out = text[self.range].to_owned();
        for (range, replacement) in self.delimiters(text).into_iter().rev() {
            let start = usize::from(range.start()) - offset;
            let end = usize::from(range.end()) - offset;
            out.replace_range(start..end, replacement);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment(kind: CommentKind, text: &str) -> Comment {
        Comment::new(kind, TextRange::up_to(TextSize::of(text)))
    }

    #[test]
    fn line_comments_get_slashes() {
        let text = "# note";
        assert_eq!(comment(CommentKind::Line, text).to_javascript(text), "// note");
    }

    #[test]
    fn block_comments_get_both_delimiters() {
        let text = "### one\ntwo ###";
        assert_eq!(comment(CommentKind::Block, text).to_javascript(text), "/* one\ntwo */");

        let open = "### open";
        assert_eq!(comment(CommentKind::Block, open).to_javascript(open), "/* open");
    }
}
