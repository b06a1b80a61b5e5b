mod cursor;

use cursor::{Cursor, EOF_CHAR};
use decoct_syntax::SyntaxKind::{self, *};
pub use decoct_syntax::{Comment, CommentKind, Token};
use text_size::{TextRange, TextSize};

/// Tokens of the input, layout tokens and a trailing `EOF` included, and
/// the comments between them.
#[derive(Debug, Default)]
pub struct Lexed {
    pub tokens: Vec<Token>,
    pub comments: Vec<Comment>,
}

pub fn lex(text: &str) -> Lexed {
    Tokenizer::new(text).tokenize()
}

/// Lexes the whole input, including layout tokens and a trailing `EOF`.
pub fn tokenize(text: &str) -> Vec<Token> {
    lex(text).tokens
}

fn is_name_start(c: char) -> bool {
    c == '_' || c == '$' || unicode_ident::is_xid_start(c)
}

fn is_name_continue(c: char) -> bool {
    c == '$' || unicode_ident::is_xid_continue(c)
}

pub struct Tokenizer<'a> {
    text: &'a str,
    cursor: Cursor<'a>,
    tokens: Vec<Token>,
    comments: Vec<Comment>,
    indents: Vec<u32>,
    depth: u32,
    last_end: TextSize,
}

impl<'a> Tokenizer<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            cursor: Cursor::new(text),
            tokens: Vec::new(),
            comments: Vec::new(),
            indents: Vec::new(),
            depth: 0,
            last_end: TextSize::new(0),
        }
    }

    pub fn tokenize(mut self) -> Lexed {
        let first_indent = self.line_indent().unwrap_or(0);
        self.indents.push(first_indent);

        loop {
            self.inline_trivia();
            if self.cursor.is_eof() {
                break;
            }

            if matches!(self.cursor.peek(), '\n' | '\r') {
                if self.depth > 0 {
                    self.cursor.advance();
                } else {
                    self.line_break();
                }
                continue;
            }

            let (kind, range) = self.syntax_kind();
            self.last_end = range.end();
            self.tokens.push(Token { kind, range });
        }

        while self.indents.len() > 1 {
            self.indents.pop();
            self.push_empty(OUTDENT, self.last_end);
        }
        self.push_empty(EOF, self.cursor.offset());
        Lexed { tokens: self.tokens, comments: self.comments }
    }

    fn push_empty(&mut self, kind: SyntaxKind, offset: TextSize) {
        self.tokens.push(Token { kind, range: TextRange::empty(offset) });
    }

    fn range(&self) -> TextRange {
        let end = self.cursor.offset();
        TextRange::new(end - self.cursor.pos_within_token(), end)
    }

    fn text(&self) -> &'a str {
        &self.text[self.range()]
    }

    fn inline_trivia(&mut self) {
        loop {
            match self.cursor.peek() {
                ' ' | '\t' => self.cursor.advance_while(|c| c == ' ' || c == '\t'),
                '#' => self.comment(),
                _ => return,
            }
        }
    }

    fn comment(&mut self) {
        let start = self.cursor.offset();
        let rest = self.cursor.rest();
        let kind = if rest.starts_with("###") && !rest.starts_with("####") {
            for _ in 0..3 {
                self.cursor.advance();
            }
            while !self.cursor.is_eof() && !self.cursor.rest().starts_with("###") {
                self.cursor.advance();
            }
            for _ in 0..3 {
                if self.cursor.matches('#') {
                    self.cursor.advance();
                }
            }
            CommentKind::Block
        } else {
            self.cursor.advance_while(|c| c != '\n' && c != '\r');
            CommentKind::Line
        };
        self.comments.push(Comment::new(kind, TextRange::new(start, self.cursor.offset())));
    }

    fn newline(&mut self) {
        if self.cursor.matches('\r') {
            self.cursor.advance();
        }
        if self.cursor.matches('\n') {
            self.cursor.advance();
        }
    }

    /// Measures the indentation of the next non-blank line, skipping blank
    /// and comment-only lines. Returns `None` at the end of input.
    fn line_indent(&mut self) -> Option<u32> {
        loop {
            let mut column = 0;
            while matches!(self.cursor.peek(), ' ' | '\t') {
                self.cursor.advance();
                column += 1;
            }

            match self.cursor.peek() {
                '\n' | '\r' => self.newline(),
                '#' => self.comment(),
                _ if self.cursor.is_eof() => return None,
                _ => return Some(column),
            }
        }
    }

    fn line_break(&mut self) {
        let start = self.cursor.offset();
        self.newline();
        let newline = TextRange::new(start, self.cursor.offset());

        let Some(column) = self.line_indent() else {
            return;
        };

        let current = self.indents.last().copied().unwrap_or(0);
        if column > current {
            self.indents.push(column);
            self.push_empty(INDENT, self.cursor.offset());
            return;
        }

        while self.indents.len() > 1 && self.indents.last().is_some_and(|&top| column < top) {
            self.indents.pop();
            self.push_empty(OUTDENT, self.last_end);
        }
        self.tokens.push(Token { kind: NEWLINE, range: newline });
    }

    fn syntax_kind(&mut self) -> (SyntaxKind, TextRange) {
        self.cursor.reset_pos_within_token();

        let kind = match self.cursor.advance() {
            '(' | '[' => {
                self.depth += 1;
                if self.text() == "(" { LEFT_PAREN } else { LEFT_BRACKET }
            }
            ')' | ']' => {
                self.depth = self.depth.saturating_sub(1);
                if self.text() == ")" { RIGHT_PAREN } else { RIGHT_BRACKET }
            }
            ',' => COMMA,
            '.' => DOT,
            ';' => SEMICOLON,
            '@' => AT,
            '-' if self.cursor.matches('>') => {
                self.cursor.advance();
                ARROW
            }
            '=' if self.cursor.matches('>') => {
                self.cursor.advance();
                FAT_ARROW
            }
            '=' if self.cursor.matches('=') => {
                self.cursor.advance();
                OPERATOR
            }
            '=' => EQ,
            '?' if self.cursor.matches('=') => {
                self.cursor.advance();
                EXISTS_EQ
            }
            '!' if self.cursor.matches('=') => {
                self.cursor.advance();
                OPERATOR
            }
            '!' => BANG,
            '<' | '>' => {
                if self.cursor.matches('=') {
                    self.cursor.advance();
                }
                OPERATOR
            }
            '&' if self.cursor.matches('&') => {
                self.cursor.advance();
                OPERATOR
            }
            '|' if self.cursor.matches('|') => {
                self.cursor.advance();
                OPERATOR
            }
            '+' | '-' | '*' | '/' | '%' => OPERATOR,
            quote @ ('"' | '\'') => self.string(quote),
            first_char @ '0'..='9' => self.number(first_char),
            c if is_name_start(c) => {
                self.cursor.advance_while(is_name_continue);
                SyntaxKind::from_keyword(self.text()).unwrap_or(NAME)
            }
            _ => UNKNOWN,
        };

        (kind, self.range())
    }

    fn string(&mut self, quote: char) -> SyntaxKind {
        loop {
            match self.cursor.advance() {
                '\\' => {
                    self.cursor.advance();
                }
                '\n' => return UNKNOWN,
                EOF_CHAR if self.cursor.is_eof() => return UNKNOWN,
                c if c == quote => return STRING,
                _ => {}
            }
        }
    }

    fn number(&mut self, c: char) -> SyntaxKind {
        if c == '0' && matches!(self.cursor.peek(), 'x' | 'b' | 'o') {
            let hex = self.cursor.advance() == 'x';
            self.digits(hex);
            return NUMBER;
        }

        self.digits(false);
        if self.cursor.matches('.') && self.cursor.second().is_ascii_digit() {
            self.cursor.advance();
            self.digits(false);
        }
        if self.cursor.matches('e') || self.cursor.matches('E') {
            self.cursor.advance();
            if self.cursor.matches('-') || self.cursor.matches('+') {
                self.cursor.advance();
            }
            self.digits(false);
        }
        NUMBER
    }

    fn digits(&mut self, allow_hex: bool) {
        loop {
            match self.cursor.peek() {
                '_' | '0'..='9' => {
                    self.cursor.advance();
                }
                'a'..='f' | 'A'..='F' if allow_hex => {
                    self.cursor.advance();
                }
                _ => return,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<SyntaxKind> {
        tokenize(text).into_iter().map(|token| token.kind).collect()
    }

    fn texts(text: &str) -> Vec<&str> {
        tokenize(text)
            .into_iter()
            .filter(|token| !token.kind.is_layout())
            .map(|token| &text[token.range])
            .collect()
    }

    #[test]
    fn test_assignment() {
        assert_eq!(kinds("a = 1"), vec![NAME, EQ, NUMBER, EOF]);
        assert_eq!(texts("a = 1"), vec!["a", "=", "1"]);
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            kinds("a == b != c ?= d => e -> f"),
            vec![
                NAME, OPERATOR, NAME, OPERATOR, NAME, EXISTS_EQ, NAME, FAT_ARROW, NAME, ARROW,
                NAME, EOF
            ]
        );
        assert_eq!(texts("!a && b || c <= d"), vec!["!", "a", "&&", "b", "||", "c", "<=", "d"]);
    }

    #[test]
    fn test_keywords() {
        assert_eq!(
            kinds("for x in y when z then return"),
            vec![FOR_KW, NAME, IN_KW, NAME, WHEN_KW, NAME, THEN_KW, RETURN_KW, EOF]
        );
        assert_eq!(kinds("forx"), vec![NAME, EOF]);
    }

    #[test]
    fn test_numbers_and_strings() {
        assert_eq!(texts("1.5e3 0x1f 'a\\'b' \"c\""), vec!["1.5e3", "0x1f", "'a\\'b'", "\"c\""]);
        assert_eq!(kinds("'open"), vec![UNKNOWN, EOF]);
    }

    #[test]
    fn test_this_member() {
        assert_eq!(kinds("@a"), vec![AT, NAME, EOF]);
    }

    #[test]
    fn test_comments_are_skipped() {
        assert_eq!(
            kinds("# leading\na # trailing\n# own line\nb\n"),
            vec![NAME, NEWLINE, NAME, EOF]
        );
    }

    #[test]
    fn test_comment_ranges() {
        let text = "# leading\na # trailing\n  ### block\n  b ###\nc ### open";
        let comments = lex(text)
            .comments
            .into_iter()
            .map(|comment| (comment.kind, &text[comment.range]))
            .collect::<Vec<_>>();
        assert_eq!(
            comments,
            vec![
                (CommentKind::Line, "# leading"),
                (CommentKind::Line, "# trailing"),
                (CommentKind::Block, "### block\n  b ###"),
                (CommentKind::Block, "### open"),
            ]
        );
        assert_eq!(kinds(text), vec![NAME, NEWLINE, NAME, EOF]);
    }

    #[test]
    fn test_unicode_names() {
        assert_eq!(kinds("é = 1"), vec![NAME, EQ, NUMBER, EOF]);
        assert_eq!(
            texts("f(naïve, $x_1, _ü)"),
            vec!["f", "(", "naïve", ",", "$x_1", ",", "_ü", ")"]
        );
        assert_eq!(kinds("1é"), vec![NUMBER, NAME, EOF]);
    }

    #[test]
    fn test_indent_and_outdent() {
        let text = "if a\n  b\n  c\nd\n";
        assert_eq!(
            kinds(text),
            vec![IF_KW, NAME, INDENT, NAME, NEWLINE, NAME, OUTDENT, NEWLINE, NAME, EOF]
        );

        let tokens = tokenize(text);
        assert_eq!(tokens[2].range, TextRange::empty(TextSize::new(7)));
        assert_eq!(tokens[6].range, TextRange::empty(TextSize::new(12)));
        assert_eq!(&text[tokens[7].range], "\n");
    }

    #[test]
    fn test_outdents_at_end_of_input() {
        assert_eq!(
            kinds("a ->\n  b ->\n    c\n"),
            vec![NAME, ARROW, INDENT, NAME, ARROW, INDENT, NAME, OUTDENT, OUTDENT, EOF]
        );
    }

    #[test]
    fn test_blank_lines_do_not_change_indentation() {
        assert_eq!(kinds("a\n\n   \nb"), vec![NAME, NEWLINE, NAME, EOF]);
    }

    #[test]
    fn test_newlines_inside_parens_are_ignored() {
        assert_eq!(
            kinds("f(a,\n  b)\nc"),
            vec![NAME, LEFT_PAREN, NAME, COMMA, NAME, RIGHT_PAREN, NEWLINE, NAME, EOF]
        );
    }
}
