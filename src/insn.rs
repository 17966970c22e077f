//! Instructions for a compiled regex
//!
//! A compiled program is an arena of instructions. Edges between
//! instructions are indexes into the arena, so loops are plain back-edges.

use crate::api;
use crate::bytesearch::ByteBitmap;
use crate::error::Error;
use crate::types::{JumpTarget, Limits, LoopID, Slot};
use core::fmt;

/// The target of an edge which has not yet been patched.
pub const UNPATCHED: JumpTarget = JumpTarget::MAX;

/// An inclusive range of bytes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ByteRange {
    pub lo: u8,
    pub hi: u8,
}

/// The contents of a bracket instruction.
#[derive(Debug, Clone, Default)]
pub struct BracketContents {
    /// The ranges, in pattern order.
    pub ranges: Vec<ByteRange>,

    /// Every byte covered by some range.
    pub bitmap: ByteBitmap,
}

impl BracketContents {
    /// Construct from a list of member bytes; each byte becomes its own range.
    pub fn from_members(members: &[u8]) -> Result<BracketContents, Error> {
        let mut ranges = Vec::new();
        ranges.try_reserve_exact(members.len())?;
        ranges.extend(members.iter().map(|&b| ByteRange { lo: b, hi: b }));
        Ok(BracketContents {
            ranges,
            bitmap: ByteBitmap::new(members),
        })
    }

    /// \return whether \p b falls in one of our ranges.
    #[inline(always)]
    pub fn contains(&self, b: u8) -> bool {
        self.bitmap.contains(b)
    }
}

/// The zero-width conditions an Assertion instruction may test.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AssertionKind {
    /// Start of subject or just after a newline; emitted by '^'.
    StartOfLine,

    /// End of subject or just before a newline; emitted by '$'.
    EndOfLine,

    /// Start of subject; emitted by '\A'.
    StartOfText,

    /// End of subject; emitted by '\z'.
    EndOfText,

    /// \b. Never checked.
    WordBoundary,

    /// \B. Never checked.
    NotWordBoundary,

    /// Always passes. Used for empty nodes.
    Empty,
}

/// Identifies one of the (at most two) outgoing edges of an instruction.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Edge {
    /// The `next` edge, or a split's primary edge.
    First,

    /// A split's secondary edge.
    Second,
}

#[derive(Debug, Clone)]
/// The list of instructions.
pub enum Insn {
    /// The match was successful.
    Goal,

    /// Match any single byte.
    MatchAny { next: JumpTarget },

    /// Match a single byte.
    Char { c: u8, next: JumpTarget },

    /// Match the next byte against the bracket contents, stored at the given
    /// index in the CompiledRegex.
    Bracket { idx: u32, next: JumpTarget },

    /// A zero-width assertion.
    Assertion {
        kind: AssertionKind,
        next: JumpTarget,
    },

    /// Record a group boundary. Recorded structurally only; matching never
    /// reports captures.
    CaptureBoundary { slot: Slot, next: JumpTarget },

    /// Continue at both edges at the same position. Executors explore the
    /// secondary edge before the primary one.
    Split {
        primary: JumpTarget,
        secondary: JumpTarget,
    },

    /// Enter a star or plus loop from outside. The loop has not yet begun
    /// an iteration from its loop-back point.
    EnterLoop { id: LoopID, next: JumpTarget },

    /// The loop-back point of a star or plus loop: a split whose secondary
    /// edge leaves the loop. Arriving here without having consumed anything
    /// since the iteration began fails, so an empty iteration is never
    /// repeated.
    LoopAgain {
        id: LoopID,
        body: JumpTarget,
        exit: JumpTarget,
    },
}

impl Insn {
    /// \return a mutable reference to the given outgoing edge, if this
    /// instruction has it.
    pub fn edge_mut(&mut self, edge: Edge) -> Option<&mut JumpTarget> {
        match (self, edge) {
            (Insn::Goal, _) => None,
            (
                Insn::MatchAny { next }
                | Insn::Char { next, .. }
                | Insn::Bracket { next, .. }
                | Insn::Assertion { next, .. }
                | Insn::CaptureBoundary { next, .. }
                | Insn::EnterLoop { next, .. },
                Edge::First,
            ) => Some(next),
            (Insn::Split { primary, .. }, Edge::First) => Some(primary),
            (Insn::Split { secondary, .. }, Edge::Second) => Some(secondary),
            (Insn::LoopAgain { body, .. }, Edge::First) => Some(body),
            (Insn::LoopAgain { exit, .. }, Edge::Second) => Some(exit),
            (_, Edge::Second) => None,
        }
    }

    /// \return the outgoing edges of this instruction.
    pub fn successors(&self) -> impl Iterator<Item = JumpTarget> {
        let (a, b) = match *self {
            Insn::Goal => (None, None),
            Insn::MatchAny { next }
            | Insn::Char { next, .. }
            | Insn::Bracket { next, .. }
            | Insn::Assertion { next, .. }
            | Insn::CaptureBoundary { next, .. }
            | Insn::EnterLoop { next, .. } => (Some(next), None),
            Insn::Split { primary, secondary } => (Some(primary), Some(secondary)),
            Insn::LoopAgain { body, exit, .. } => (Some(body), Some(exit)),
        };
        a.into_iter().chain(b)
    }
}

/// The peeled prefix start predicate.
/// This is a fast way of locating the first potential match.
#[derive(Debug, Clone)]
pub enum StartPredicate {
    /// May match an arbitrary sequence.
    Arbitrary,

    /// Look for a byte sequence.
    ByteSeq1([u8; 1]),
    ByteSeq2([u8; 2]),
    ByteSeq3([u8; 3]),
    ByteSeq4([u8; 4]),

    /// Look for the first instance of any of the given bytes.
    ByteSet2([u8; 2]),
    ByteSet3([u8; 3]),

    /// Look for a byte which matches the bitmap.
    ByteBracket(ByteBitmap),

    /// The regex is anchored to the start of the subject.
    /// This avoids searching entirely and only tries matching at the beginning.
    StartAnchored,
}

#[derive(Clone)]
pub struct CompiledRegex {
    // The instruction arena.
    pub insns: Vec<Insn>,

    // The bracket contents, indexed by the value of the `Bracket` instruction.
    pub brackets: Vec<BracketContents>,

    // Entry instruction.
    pub start: JumpTarget,

    // Number of capture groups.
    pub groups: u32,

    // Number of star and plus loops.
    pub loops: u32,

    // Predicate to rapidly find the first potential match.
    pub start_pred: StartPredicate,

    // Flags controlling matching.
    pub flags: api::Flags,

    // Budgets enforced by executors.
    pub limits: Limits,
}

impl fmt::Debug for CompiledRegex {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(
            f,
            "start: {}  groups: {}  loops: {}  flags: {}",
            self.start, self.groups, self.loops, self.flags
        )?;
        writeln!(f, "start predicate: {:?}", self.start_pred)?;
        for (idx, insn) in self.insns.iter().enumerate() {
            write!(f, "{:4}: ", idx)?;
            match insn {
                Insn::Goal => writeln!(f, "Goal")?,
                Insn::MatchAny { next } => writeln!(f, "MatchAny -> {}", next)?,
                &Insn::Char { c, next } => {
                    writeln!(f, "Char '{}' -> {}", c.escape_ascii(), next)?
                }
                &Insn::Bracket { idx, next } => {
                    write!(f, "Bracket")?;
                    if let Some(bc) = self.brackets.get(idx as usize) {
                        for r in &bc.ranges {
                            write!(f, " {}-{}", r.lo.escape_ascii(), r.hi.escape_ascii())?;
                        }
                    }
                    writeln!(f, " -> {}", next)?
                }
                Insn::Assertion { kind, next } => writeln!(f, "Assertion {:?} -> {}", kind, next)?,
                Insn::CaptureBoundary { slot, next } => {
                    writeln!(f, "CaptureBoundary {} -> {}", slot, next)?
                }
                Insn::Split { primary, secondary } => {
                    writeln!(f, "Split {} | {}", primary, secondary)?
                }
                Insn::EnterLoop { id, next } => writeln!(f, "EnterLoop {} -> {}", id, next)?,
                Insn::LoopAgain { id, body, exit } => {
                    writeln!(f, "LoopAgain {} {} | {}", id, body, exit)?
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bracket_from_members() {
        let bc = BracketContents::from_members(b"a]-").unwrap();
        assert_eq!(bc.ranges.len(), 3);
        assert_eq!(bc.ranges[1], ByteRange { lo: b']', hi: b']' });
        assert!(bc.contains(b'-'));
        assert!(!bc.contains(b'b'));

        let empty = BracketContents::from_members(b"").unwrap();
        assert!(empty.ranges.is_empty());
    }

    #[test]
    fn loop_edges() {
        let mut insn = Insn::LoopAgain {
            id: 0,
            body: 1,
            exit: UNPATCHED,
        };
        if let Some(exit) = insn.edge_mut(Edge::Second) {
            *exit = 7;
        }
        assert_eq!(insn.successors().collect::<Vec<_>>(), vec![1, 7]);

        let mut enter = Insn::EnterLoop { id: 0, next: 2 };
        assert!(enter.edge_mut(Edge::Second).is_none());
        assert_eq!(enter.successors().collect::<Vec<_>>(), vec![2]);
    }
}
