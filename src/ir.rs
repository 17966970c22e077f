//! Abstract syntax tree for a parsed pattern

use crate::api;
use crate::buffer::ByteBuf;
use crate::types::CaptureGroupID;
use core::fmt;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AnchorType {
    StartOfLine, // ^
    EndOfLine,   // $
    StartOfText, // \A
    EndOfText,   // \z
}

/// A Quantifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Quantifier {
    /// Zero or more: `*`.
    Star,

    /// One or more: `+`.
    Plus,

    /// Zero or one: `?`.
    Quest,

    /// A counted repetition `{min,max}`. The loopee is required `min` times
    /// and may appear up to `max` times in total.
    Range { min: u32, max: u32 },
}

/// The node types of our AST.
/// A node exclusively owns its children and payload; dropping a node drops
/// its whole subtree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Matches the empty string.
    Empty,

    /// Match a literal sequence of bytes.
    ByteSequence(ByteBuf),

    /// Match any single byte.
    MatchAny,

    /// Match any one of the bytes in the buffer.
    Bracket(ByteBuf),

    /// Match the catenation of multiple nodes.
    Cat(NodeList),

    /// Match any of multiple nodes, like a|b|c.
    Alt(NodeList),

    /// A loop like /a*/ or /a{2,3}/.
    Loop { loopee: Box<Node>, quant: Quantifier },

    /// A capturing group with its 1-based index.
    CaptureGroup(Box<Node>, CaptureGroupID),

    /// Match an anchor like ^ or \z.
    Anchor(AnchorType),

    /// Word boundary (\b or \B).
    WordBoundary { invert: bool },
}

pub type NodeList = Vec<Node>;

impl Node {
    /// \return the direct children of this node.
    pub fn children(&self) -> &[Node] {
        match self {
            Node::Cat(nodes) | Node::Alt(nodes) => nodes.as_slice(),
            Node::Loop { loopee, .. } => core::slice::from_ref(loopee.as_ref()),
            Node::CaptureGroup(contents, ..) => core::slice::from_ref(contents.as_ref()),
            Node::Empty
            | Node::ByteSequence(..)
            | Node::MatchAny
            | Node::Bracket(..)
            | Node::Anchor(..)
            | Node::WordBoundary { .. } => &[],
        }
    }
}

/// Call \p func on every Node reachable from \p n, parents before children,
/// passing each node's depth below \p n.
pub fn walk<F>(n: &Node, func: &mut F)
where
    F: FnMut(&Node, usize),
{
    fn process<F: FnMut(&Node, usize)>(n: &Node, depth: usize, func: &mut F) {
        func(n, depth);
        for child in n.children() {
            process(child, depth + 1, func);
        }
    }
    process(n, 0, func)
}

/// A pattern in AST form.
#[derive(Debug)]
pub struct Regex {
    pub node: Node,
    pub flags: api::Flags,
    pub groups: u32,
}

fn display_node(node: &Node, depth: usize, f: &mut fmt::Formatter) -> fmt::Result {
    for _ in 0..depth {
        write!(f, "..")?;
    }
    match node {
        Node::Empty => writeln!(f, "Empty"),
        Node::ByteSequence(bytes) => writeln!(f, "ByteSeq {:?}", bytes),
        Node::MatchAny => writeln!(f, "MatchAny"),
        Node::Bracket(bytes) => writeln!(f, "Bracket {:?}", bytes),
        Node::Cat(..) => writeln!(f, "Cat"),
        Node::Alt(..) => writeln!(f, "Alt"),
        Node::Loop { quant, .. } => writeln!(f, "Loop {:?}", quant),
        Node::CaptureGroup(_node, idx) => writeln!(f, "CaptureGroup {}", idx),
        Node::Anchor(anchor_type) => writeln!(f, "Anchor {:?}", anchor_type),
        &Node::WordBoundary { invert } => {
            let kind = if invert { "\\B" } else { "\\b" };
            writeln!(f, "WordBoundary {:?}", kind)
        }
    }
}

impl fmt::Display for Regex {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut result = Ok(());
        walk(&self.node, &mut |node: &Node, depth| {
            if result.is_ok() {
                result = display_node(node, depth, f)
            }
        });
        result
    }
}
