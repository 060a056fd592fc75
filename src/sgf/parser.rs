use log::{debug, warn};
use pest_consume::{Parser, match_nodes};

use crate::sgf::{
    coord::CoordinateCodec,
    node::{self, decode_property},
    tree::{GameTree, TreeId},
};

type Node<'i> = pest_consume::Node<'i, Rule, ()>;
type ParseResult<T> = std::result::Result<T, pest_consume::Error<Rule>>;

/// What the lexer hands to the tree builder.
#[derive(Debug, Clone, PartialEq)]
enum Token {
    TreeOpen,
    TreeClose,
    NodeOpen,
    Ident(String),
    Value(String),
}

#[derive(Parser)]
#[grammar = "sgf.pest"]
struct SGFLexer;

#[pest_consume::parser]
impl SGFLexer {
    fn EOI(_input: Node) -> ParseResult<()> {
        Ok(())
    }

    fn tree_open(_input: Node) -> ParseResult<Token> {
        Ok(Token::TreeOpen)
    }

    fn tree_close(_input: Node) -> ParseResult<Token> {
        Ok(Token::TreeClose)
    }

    fn node_open(_input: Node) -> ParseResult<Token> {
        Ok(Token::NodeOpen)
    }

    fn prop_ident(input: Node) -> ParseResult<Token> {
        Ok(Token::Ident(input.as_str().chars().filter(char::is_ascii_uppercase).collect()))
    }

    fn value_text(input: Node) -> ParseResult<String> {
        Ok(unescape(input.as_str()))
    }

    fn prop_value(input: Node) -> ParseResult<Token> {
        match_nodes!(input.into_children();
            [value_text(text)] => Ok(Token::Value(text))
        )
    }

    fn token(input: Node) -> ParseResult<Token> {
        match_nodes!(input.into_children();
            [tree_open(t)] => Ok(t),
            [tree_close(t)] => Ok(t),
            [node_open(t)] => Ok(t),
            [prop_ident(t)] => Ok(t),
            [prop_value(t)] => Ok(t),
        )
    }

    fn collection(input: Node) -> ParseResult<Vec<Token>> {
        match_nodes!(input.into_children();
            [token(tokens).., EOI(_)] => Ok(tokens.collect())
        )
    }
}

/// Drops the backslash of each escape. A line break right after the
/// backslash is a soft break and disappears with it.
fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('\n') | None => {}
                Some(escaped) => out.push(escaped),
            },
            c => out.push(c),
        }
    }
    out
}

/// `\r\n`, `\n\r` and a lone `\r` all become `\n`.
fn normalize_newlines(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' => {
                chars.next_if_eq(&'\n');
                out.push('\n');
            }
            '\n' => {
                chars.next_if_eq(&'\r');
                out.push('\n');
            }
            c => out.push(c),
        }
    }
    out
}

fn lex(input: &str) -> ParseResult<Vec<Token>> {
    let inputs = SGFLexer::parse(Rule::collection, input)?;
    let input = inputs.single()?;
    SGFLexer::collection(input)
}

// ---------------------------------------------------------------------------
// Tree building: a state machine over the token stream
// ---------------------------------------------------------------------------

struct TreeBuilder<'c, G: CoordinateCodec> {
    codec: &'c G,
    tree: GameTree<G>,
    /// `None` while outside every tree, at collection level.
    current: Option<TreeId>,
    /// The identifier the next bracketed value belongs to.
    ident: Option<String>,
}

impl<'c, G: CoordinateCodec> TreeBuilder<'c, G> {
    fn new(codec: &'c G) -> Self {
        Self { codec, tree: GameTree::new(), current: None, ident: None }
    }

    fn feed(&mut self, token: Token) {
        match token {
            Token::TreeOpen => {
                self.current = Some(self.tree.push_child(self.current));
                self.ident = None;
            }
            Token::TreeClose => {
                if let Some(id) = self.current {
                    self.current = self.tree.subtree(id).parent;
                }
                self.ident = None;
            }
            Token::NodeOpen => {
                if let Some(id) = self.current {
                    self.tree.subtree_mut(id).sequence.push(node::Node::default());
                }
                self.ident = None;
            }
            Token::Ident(ident) => self.ident = Some(ident),
            Token::Value(value) => self.add_value(&value),
        }
    }

    fn add_value(&mut self, value: &str) {
        let (Some(ident), Some(id)) = (self.ident.as_deref(), self.current) else {
            return;
        };
        let Some(node) = self.tree.trees[id].sequence.last_mut() else {
            return;
        };
        if let Some(property) = decode_property(self.codec, ident, value) {
            node.merge(property);
        }
    }

    fn finish(mut self) -> GameTree<G> {
        self.tree.hoist_empty();
        self.tree
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Reads every game tree in `input`.
///
/// This never fails. Input that does not follow the grammar is read as far as
/// it makes sense: stray characters are skipped, values without a node or an
/// identifier are dropped, and unparsable values leave their property out.
pub fn parse_sgf<G: CoordinateCodec>(input: &str, codec: &G) -> GameTree<G> {
    let normalized = normalize_newlines(input);
    let tokens = lex(&normalized).unwrap_or_else(|e| {
        warn!("SGF lexer gave up, reading nothing: {}", e);
        Vec::new()
    });

    let mut builder = TreeBuilder::new(codec);
    for token in tokens {
        builder.feed(token);
    }
    let tree = builder.finish();
    debug!("parsed {} game record(s) from {} bytes", tree.roots.len(), input.len());
    tree
}
