use decoct_errors::Diagnostic;
use decoct_syntax::{Builder, Comment, SyntaxKind, SyntaxTree, Token, TokenIndex};
use decoct_tokenizer::Lexed;
use drop_bomb::DropBomb;

pub(crate) struct Parser<'t> {
    text: &'t str,
    tokens: Vec<Token>,
    comments: Vec<Comment>,
    pos: usize,
    events: Vec<Event>,
    errors: Vec<Diagnostic>,
}

impl<'t> Parser<'t> {
    pub(crate) fn new(text: &'t str) -> Self {
        let Lexed { tokens, comments } = decoct_tokenizer::lex(text);
        Self { text, tokens, comments, pos: 0, events: Vec::new(), errors: Vec::new() }
    }

    fn token(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.pos + n)
    }

    pub(crate) fn peek_kind(&self) -> SyntaxKind {
        self.nth_kind(0)
    }

    pub(crate) fn nth_kind(&self, n: usize) -> SyntaxKind {
        self.token(n).map_or(SyntaxKind::EOF, |token| token.kind)
    }

    pub(crate) fn peek_text(&self) -> &'t str {
        self.token(0).map_or("", |token| &self.text[token.range])
    }

    /// Whether the current token starts exactly where the previous
    /// significant token ends.
    pub(crate) fn at_adjacent(&self, kind: SyntaxKind) -> bool {
        let Some(prev) = self.pos.checked_sub(1).and_then(|index| self.tokens.get(index)) else {
            return false;
        };
        self.token(0).is_some_and(|token| {
            token.kind == kind && !prev.kind.is_layout() && token.range.start() == prev.range.end()
        })
    }

    /// Whether the token after the current one is glued to it.
    pub(crate) fn next_is_adjacent(&self, kind: SyntaxKind) -> bool {
        match (self.token(0), self.token(1)) {
            (Some(current), Some(next)) => {
                next.kind == kind && next.range.start() == current.range.end()
            }
            _ => false,
        }
    }

    pub(crate) fn advance(&mut self) {
        if self.peek_kind() == SyntaxKind::EOF {
            return;
        }

        self.events.push(Event::Token(TokenIndex::new(self.pos)));
        self.pos += 1;
    }

    pub(crate) fn at(&self, kind: SyntaxKind) -> bool {
        self.peek_kind() == kind
    }

    pub(crate) fn eat(&mut self, kind: SyntaxKind) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn expect(&mut self, kind: SyntaxKind, message: &str) {
        if !self.eat(kind) {
            self.error(message);
        }
    }

    pub(crate) fn start(&mut self) -> Marker {
        let pos = self.events.len() as u32;
        self.events.push(Event::TOMBSTONE);
        Marker::new(pos)
    }

    pub(crate) fn error(&mut self, message: &str) {
        let range = self.token(0).map(|token| token.range).unwrap_or_default();
        self.errors.push(Diagnostic::error(message, range));
    }

    pub(crate) fn error_and_bump(&mut self, message: &str) {
        let m = self.start();
        self.error(message);
        self.advance();
        m.complete(self, SyntaxKind::ERROR);
    }

    pub(crate) fn build_tree(self) -> (SyntaxTree, Vec<Diagnostic>) {
        let Parser { text, tokens, comments, pos: _, mut events, errors } = self;
        let mut builder = Builder::new(text, tokens, comments);
        let mut forward_parents = Vec::new();

        for i in 0..events.len() {
            match std::mem::replace(&mut events[i], Event::TOMBSTONE) {
                Event::Start { kind, forward_parent } => {
                    if kind == SyntaxKind::TOMBSTONE {
                        continue;
                    }

                    forward_parents.push(kind);
                    let mut idx = i;
                    let mut fp = forward_parent;
                    while let Some(fwd) = fp {
                        idx += fwd as usize;

                        fp = match std::mem::replace(&mut events[idx], Event::TOMBSTONE) {
                            Event::Start { kind, forward_parent } => {
                                if kind != SyntaxKind::TOMBSTONE {
                                    forward_parents.push(kind);
                                }
                                forward_parent
                            }
                            _ => unreachable!(),
                        };
                    }

                    for kind in forward_parents.drain(..).rev() {
                        builder.start_node(kind);
                    }
                }
                Event::Finish => {
                    builder.finish_node();
                }
                Event::Token(index) => {
                    builder.token(index);
                }
            }
        }

        (builder.finish(), errors)
    }
}

enum Event {
    Start { kind: SyntaxKind, forward_parent: Option<u32> },
    Token(TokenIndex),
    Finish,
}

impl Event {
    const TOMBSTONE: Self = Event::Start { kind: SyntaxKind::TOMBSTONE, forward_parent: None };
}

pub(crate) struct Marker {
    position: u32,
    bomb: DropBomb,
}

impl Marker {
    fn new(pos: u32) -> Marker {
        Marker {
            position: pos,
            bomb: DropBomb::new("Marker must be either completed or abandoned"),
        }
    }

    pub(crate) fn complete(mut self, p: &mut Parser<'_>, kind: SyntaxKind) -> CompletedMarker {
        self.bomb.defuse();

        match &mut p.events[self.position as usize] {
            Event::Start { kind: slot, .. } => {
                *slot = kind;
            }
            _ => unreachable!(),
        }

        p.events.push(Event::Finish);
        CompletedMarker::new(self.position)
    }
}

#[derive(Clone, Copy)]
pub(crate) struct CompletedMarker {
    pos: u32,
}

impl CompletedMarker {
    fn new(pos: u32) -> Self {
        CompletedMarker { pos }
    }

    pub(crate) fn precede(self, p: &mut Parser<'_>) -> Marker {
        let new_pos = p.start();

        match &mut p.events[self.pos as usize] {
            Event::Start { forward_parent, .. } => {
                *forward_parent = Some(new_pos.position - self.pos);
            }
            _ => unreachable!(),
        }

        new_pos
    }
}
