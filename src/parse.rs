//! Parser from regex patterns to IR
//!
//! The parser is a single pass over the pattern bytes driving an explicit
//! stack. Atoms are pushed as they are seen; `(` and `|` push scope markers
//! which are later collapsed into concatenation and alternation nodes.

use crate::api;
use crate::buffer::ByteBuf;
use crate::error::Error;
use crate::ir::{self, AnchorType, Node, Quantifier};
use crate::types::{CaptureGroupID, Limits, MAX_CAPTURE_GROUPS};
use log::trace;

/// An entry on the parse stack.
#[derive(Debug)]
enum StackItem {
    /// A parsed node, with the depth of its subtree.
    Node(Node, usize),

    /// An open `(`, carrying the index assigned to its group.
    CaptureOpen(CaptureGroupID),

    /// A `|` whose alternatives are still being accumulated.
    AltBar,
}

impl StackItem {
    fn is_sentinel(&self) -> bool {
        !matches!(self, StackItem::Node(..))
    }
}

fn make_cat(nodes: ir::NodeList) -> Node {
    match nodes.len() {
        0 => Node::Empty,
        1 => nodes.into_iter().next().unwrap_or(Node::Empty),
        _ => Node::Cat(nodes),
    }
}

fn make_alt(nodes: ir::NodeList) -> Node {
    match nodes.len() {
        0 => Node::Empty,
        1 => nodes.into_iter().next().unwrap_or(Node::Empty),
        _ => Node::Alt(nodes),
    }
}

/// Represents the state used to parse a regex.
struct Parser<'a> {
    /// The pattern.
    input: &'a [u8],

    /// Offset of the next byte to read.
    pos: usize,

    /// Flags used.
    flags: api::Flags,

    /// Budgets enforced while parsing.
    limits: Limits,

    /// The parse stack.
    stack: Vec<StackItem>,

    /// Number of capturing groups.
    group_count: CaptureGroupID,
}

impl<'a> Parser<'a> {
    /// \return the next byte, advancing past it.
    fn next(&mut self) -> Option<u8> {
        let b = self.input.get(self.pos).copied();
        if b.is_some() {
            self.pos += 1;
        }
        b
    }

    /// \return the next byte without consuming it.
    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    /// Check \p depth against the nesting budget.
    fn check_depth(&self, depth: usize) -> Result<usize, Error> {
        if depth > self.limits.max_nesting {
            return Err(Error::NestingTooDeep(self.limits.max_nesting));
        }
        Ok(depth)
    }

    /// If the top two stack entries are both literals, merge the upper one
    /// into the lower one.
    fn coalesce_literals(&mut self) -> Result<(), Error> {
        let n = self.stack.len();
        if n < 2 {
            return Ok(());
        }
        let both_literal = matches!(
            (&self.stack[n - 2], &self.stack[n - 1]),
            (
                StackItem::Node(Node::ByteSequence(..), _),
                StackItem::Node(Node::ByteSequence(..), _)
            )
        );
        if !both_literal {
            return Ok(());
        }
        if let Some(StackItem::Node(Node::ByteSequence(upper), _)) = self.stack.pop() {
            if let Some(StackItem::Node(Node::ByteSequence(lower), _)) = self.stack.last_mut() {
                lower.extend_from_slice(&upper)?;
            }
        }
        Ok(())
    }

    /// Push an item, first merging any adjacent literals already on the stack.
    /// The merge lags one push behind so that the most recent literal stays
    /// separate and can still be claimed by a following quantifier.
    fn push(&mut self, item: StackItem) -> Result<(), Error> {
        self.coalesce_literals()?;
        self.stack.try_reserve(1)?;
        self.stack.push(item);
        Ok(())
    }

    fn push_node(&mut self, node: Node) -> Result<(), Error> {
        self.push(StackItem::Node(node, 1))
    }

    fn push_literal(&mut self, bytes: &[u8]) -> Result<(), Error> {
        let buf = ByteBuf::from_slice(bytes)?;
        self.push_node(Node::ByteSequence(buf))
    }

    /// Pop the top operand, if the top of the stack is a node.
    fn pop_operand(&mut self) -> Option<(Node, usize)> {
        match self.stack.last() {
            Some(StackItem::Node(..)) => match self.stack.pop() {
                Some(StackItem::Node(node, depth)) => Some((node, depth)),
                _ => None,
            },
            _ => None,
        }
    }

    /// \return the index of the first entry above the topmost sentinel.
    fn span_start(&self) -> usize {
        self.stack
            .iter()
            .rposition(StackItem::is_sentinel)
            .map_or(0, |idx| idx + 1)
    }

    /// Drain the span above the topmost sentinel, flattening any node for
    /// which \p is_same returns true into its children.
    fn drain_span<F>(&mut self, is_same: F) -> Result<(ir::NodeList, usize), Error>
    where
        F: Fn(&Node) -> bool,
    {
        let start = self.span_start();
        let mut nodes = ir::NodeList::new();
        nodes.try_reserve(self.stack.len() - start)?;
        let mut depth = 0;
        for item in self.stack.drain(start..) {
            if let StackItem::Node(node, node_depth) = item {
                depth = depth.max(node_depth);
                if is_same(&node) {
                    match node {
                        Node::Cat(children) | Node::Alt(children) => nodes.extend(children),
                        other => nodes.push(other),
                    }
                } else {
                    nodes.push(node);
                }
            }
        }
        Ok((nodes, depth))
    }

    /// Collapse everything above the topmost sentinel into one concatenation.
    fn collapse_concat(&mut self) -> Result<(), Error> {
        self.coalesce_literals()?;
        let (nodes, depth) = self.drain_span(|n| matches!(n, Node::Cat(..)))?;
        trace!("collapse concat of {} nodes", nodes.len());
        let depth = match nodes.len() {
            0 | 1 => depth.max(1),
            _ => self.check_depth(depth + 1)?,
        };
        let node = make_cat(nodes);
        self.push(StackItem::Node(node, depth))
    }

    /// Collapse everything above the topmost sentinel into one alternation.
    fn collapse_alt(&mut self) -> Result<(), Error> {
        let (nodes, depth) = self.drain_span(|n| matches!(n, Node::Alt(..)))?;
        trace!("collapse alternation of {} nodes", nodes.len());
        let depth = match nodes.len() {
            0 | 1 => depth.max(1),
            _ => self.check_depth(depth + 1)?,
        };
        let node = make_alt(nodes);
        self.push(StackItem::Node(node, depth))
    }

    /// If the entry below the top is a `|` marker, swap the two.
    /// \return true if a swap was made.
    fn swap_alt_bar(&mut self) -> bool {
        let n = self.stack.len();
        if n >= 2 && matches!(self.stack[n - 2], StackItem::AltBar) {
            self.stack.swap(n - 1, n - 2);
            return true;
        }
        false
    }

    /// Resolve the innermost scope: collapse the pending concatenation and,
    /// if a `|` is active, the alternation.
    fn close_scope(&mut self) -> Result<(), Error> {
        self.collapse_concat()?;
        if self.swap_alt_bar() {
            self.stack.pop();
            self.collapse_alt()?;
        }
        Ok(())
    }

    /// Wrap the top operand in a loop.
    fn apply_quantifier(&mut self, quant: Quantifier) -> Result<(), Error> {
        let (mut loopee, depth) = self.pop_operand().ok_or(Error::InvalidRepeat)?;
        if let Quantifier::Range { .. } = quant {
            // A counted repeat takes over the bounds of a counted repeat it wraps.
            if let Node::Loop {
                quant: inner @ Quantifier::Range { .. },
                ..
            } = &mut loopee
            {
                *inner = Quantifier::Range { min: 0, max: 0 };
            }
        }
        let depth = self.check_depth(depth + 1)?;
        let node = Node::Loop {
            loopee: Box::new(loopee),
            quant,
        };
        self.push(StackItem::Node(node, depth))
    }

    /// Try to parse `{min,max}` starting at the current position, which is
    /// just past the `{`. Both bounds must be present and made of digits.
    /// \return the bounds and the position past the `}`, or None if malformed.
    fn try_parse_range(&self) -> Option<(u32, u32, usize)> {
        let mut pos = self.pos;
        let mut bounds = [0u32; 2];
        for (idx, terminator) in [b',', b'}'].iter().enumerate() {
            let start = pos;
            while let Some(&b) = self.input.get(pos) {
                if !b.is_ascii_digit() {
                    break;
                }
                bounds[idx] = bounds[idx]
                    .saturating_mul(10)
                    .saturating_add(u32::from(b - b'0'));
                pos += 1;
            }
            if pos == start || self.input.get(pos) != Some(terminator) {
                return None;
            }
            pos += 1;
        }
        Some((bounds[0], bounds[1], pos))
    }

    /// Consume a bracket, whose `[` has already been consumed.
    /// A leading `^` is accepted but not applied. The first byte is always a
    /// member, so `[]]` matches `]`.
    /// \return the member bytes, or None if the bracket is never closed.
    fn consume_bracket(&mut self) -> Result<Option<ByteBuf>, Error> {
        if self.peek() == Some(b'^') {
            self.pos += 1;
        }
        let mut members = ByteBuf::new();
        loop {
            match self.next() {
                None => return Ok(None),
                Some(b) => members.push(b)?,
            }
            if self.peek() == Some(b']') {
                self.pos += 1;
                return Ok(Some(members));
            }
        }
    }

    /// Consume an escape, whose `\` has already been consumed.
    fn consume_escape(&mut self) -> Result<(), Error> {
        match self.next() {
            None => Ok(()),
            Some(b'A') => self.push_node(Node::Anchor(AnchorType::StartOfText)),
            Some(b'z') => self.push_node(Node::Anchor(AnchorType::EndOfText)),
            Some(b'b') => self.push_node(Node::WordBoundary { invert: false }),
            Some(b'B') => self.push_node(Node::WordBoundary { invert: true }),
            Some(b) => self.push_literal(&[b]),
        }
    }

    fn consume_close_paren(&mut self) -> Result<(), Error> {
        self.close_scope()?;
        let (contents, depth) = self.pop_operand().ok_or(Error::InvalidCapture)?;
        let group = match self.stack.pop() {
            Some(StackItem::CaptureOpen(group)) => group,
            _ => return Err(Error::InvalidCapture),
        };
        let depth = self.check_depth(depth + 1)?;
        self.push(StackItem::Node(
            Node::CaptureGroup(Box::new(contents), group),
            depth,
        ))
    }

    fn consume_bar(&mut self) -> Result<(), Error> {
        self.collapse_concat()?;
        if !self.swap_alt_bar() {
            self.push(StackItem::AltBar)?;
        }
        Ok(())
    }

    fn try_parse(&mut self) -> Result<ir::Regex, Error> {
        while let Some(b) = self.next() {
            match b {
                b'.' => self.push_node(Node::MatchAny)?,
                b'^' => self.push_node(Node::Anchor(AnchorType::StartOfLine))?,
                b'$' => self.push_node(Node::Anchor(AnchorType::EndOfLine))?,
                b'[' => {
                    if let Some(members) = self.consume_bracket()? {
                        self.push_node(Node::Bracket(members))?
                    }
                }
                b'(' => {
                    if self.group_count as usize >= MAX_CAPTURE_GROUPS {
                        return Err(Error::TooManyCaptureGroups(MAX_CAPTURE_GROUPS));
                    }
                    self.group_count += 1;
                    self.push(StackItem::CaptureOpen(self.group_count))?
                }
                b')' => self.consume_close_paren()?,
                b'|' => self.consume_bar()?,
                b'*' => self.apply_quantifier(Quantifier::Star)?,
                b'+' => self.apply_quantifier(Quantifier::Plus)?,
                b'?' => self.apply_quantifier(Quantifier::Quest)?,
                // With nothing parsed yet, a brace is an error whatever follows
                // it. Elsewhere a malformed repeat is a literal.
                b'{' if self.stack.is_empty() => return Err(Error::InvalidRepeat),
                b'{' => match self.try_parse_range() {
                    Some((min, max, end)) => {
                        self.pos = end;
                        self.apply_quantifier(Quantifier::Range { min, max })?
                    }
                    None => self.push_literal(b"{")?,
                },
                b'\\' => self.consume_escape()?,
                _ => self.push_literal(&[b])?,
            }
        }

        self.close_scope()?;
        if self.stack.len() != 1 {
            // Only an unclosed group can leave extra entries behind.
            return Err(Error::InvalidCapture);
        }
        match self.stack.pop() {
            Some(StackItem::Node(node, _)) => Ok(ir::Regex {
                node,
                flags: self.flags,
                groups: u32::from(self.group_count),
            }),
            _ => Err(Error::InvalidCapture),
        }
    }
}

/// Try parsing a given pattern.
/// \return the resulting IR regex, or an error.
pub fn try_parse(pattern: &[u8], flags: api::Flags, limits: &Limits) -> Result<ir::Regex, Error> {
    let mut p = Parser {
        input: pattern,
        pos: 0,
        flags,
        limits: *limits,
        stack: Vec::new(),
        group_count: 0,
    };
    p.try_parse()
}
