use decoct_errors::Diagnostic;
use decoct_syntax::SyntaxTree;

mod grammar;
mod parser;
#[cfg(test)]
mod tests;

/// A syntax tree together with the errors found while building it.
#[derive(Debug)]
pub struct Parse {
    tree: SyntaxTree,
    errors: Vec<Diagnostic>,
}

impl Parse {
    pub fn tree(&self) -> &SyntaxTree {
        &self.tree
    }

    pub fn errors(&self) -> &[Diagnostic] {
        &self.errors
    }

    pub fn into_parts(self) -> (SyntaxTree, Vec<Diagnostic>) {
        (self.tree, self.errors)
    }
}

pub fn parse(text: &str) -> Parse {
    let mut parser = parser::Parser::new(text);
    grammar::stmts::program(&mut parser);
    let (tree, errors) = parser.build_tree();
    Parse { tree, errors }
}
