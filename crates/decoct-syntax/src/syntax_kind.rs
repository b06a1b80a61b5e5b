#[allow(non_camel_case_types)]
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
#[repr(u16)]
pub enum SyntaxKind {
    LEFT_PAREN,
    RIGHT_PAREN,
    LEFT_BRACKET,
    RIGHT_BRACKET,
    COMMA,
    DOT,
    SEMICOLON,
    AT,
    ARROW,
    FAT_ARROW,
    EQ,
    EXISTS_EQ,
    BANG,
    OPERATOR,

    FOR_KW,
    IN_KW,
    OF_KW,
    WHEN_KW,
    THEN_KW,
    IF_KW,
    ELSE_KW,
    RETURN_KW,
    TRUE_KW,
    FALSE_KW,
    NULL_KW,
    UNDEFINED_KW,
    THIS_KW,
    AND_KW,
    OR_KW,
    NOT_KW,
    IS_KW,
    ISNT_KW,

    NAME,
    NUMBER,
    STRING,

    NEWLINE,
    INDENT,
    OUTDENT,

    UNKNOWN,
    EOF,

    PROGRAM,
    BLOCK,
    RETURN_STMT,
    FOR_EXPR,
    IF_EXPR,
    FUNCTION,
    PARAM_LIST,
    DEFAULT_PARAM,
    ASSIGN,
    EXISTS_ASSIGN,
    BINARY_EXPR,
    PREFIX_EXPR,
    CALL_EXPR,
    ARG_LIST,
    MEMBER_EXPR,
    INDEX_EXPR,
    PAREN_EXPR,
    ARRAY,
    IDENT,
    THIS_MEMBER,
    THIS,
    LITERAL,
    ERROR,
    TOMBSTONE,
}

impl SyntaxKind {
    /// Tokens that only describe line structure and never carry source text.
    pub const fn is_layout(self) -> bool {
        matches!(self, Self::NEWLINE | Self::INDENT | Self::OUTDENT | Self::EOF)
    }

    pub const fn is_keyword(self) -> bool {
        (self as u16) >= (Self::FOR_KW as u16) && (self as u16) <= (Self::ISNT_KW as u16)
    }

    pub fn from_keyword(text: &str) -> Option<Self> {
        let kind = match text {
            "for" => Self::FOR_KW,
            "in" => Self::IN_KW,
            "of" => Self::OF_KW,
            "when" => Self::WHEN_KW,
            "then" => Self::THEN_KW,
            "if" => Self::IF_KW,
            "else" => Self::ELSE_KW,
            "return" => Self::RETURN_KW,
            "true" => Self::TRUE_KW,
            "false" => Self::FALSE_KW,
            "null" => Self::NULL_KW,
            "undefined" => Self::UNDEFINED_KW,
            "this" => Self::THIS_KW,
            "and" => Self::AND_KW,
            "or" => Self::OR_KW,
            "not" => Self::NOT_KW,
            "is" => Self::IS_KW,
            "isnt" => Self::ISNT_KW,
            _ => return None,
        };
        Some(kind)
    }

    /// Human readable name used in diagnostics.
    pub fn describe(self) -> &'static str {
        match self {
            Self::PROGRAM => "program",
            Self::BLOCK => "block",
            Self::RETURN_STMT => "return statement",
            Self::FOR_EXPR => "'for' loop",
            Self::IF_EXPR => "conditional",
            Self::FUNCTION => "function",
            Self::PARAM_LIST => "parameter list",
            Self::DEFAULT_PARAM => "default parameter",
            Self::ASSIGN => "assignment",
            Self::EXISTS_ASSIGN => "existence assignment",
            Self::BINARY_EXPR => "binary expression",
            Self::PREFIX_EXPR => "prefix expression",
            Self::CALL_EXPR => "call",
            Self::MEMBER_EXPR => "member access",
            Self::INDEX_EXPR => "index access",
            Self::PAREN_EXPR => "parenthesized expression",
            Self::ARRAY => "array",
            Self::IDENT => "identifier",
            Self::THIS_MEMBER => "'this' member",
            Self::THIS => "'this'",
            Self::LITERAL => "literal",
            _ => "token",
        }
    }
}
