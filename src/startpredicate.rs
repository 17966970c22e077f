//! Support for quickly finding potential match locations.
use crate::bytesearch::ByteBitmap;
use crate::insn::StartPredicate;
use crate::ir;
use crate::ir::{Node, Quantifier};
use core::convert::TryInto;

/// Check if a node is anchored to the start of the subject.
/// Returns true if the node begins with a StartOfText anchor.
fn is_start_anchored(n: &Node) -> bool {
    match n {
        Node::Anchor(ir::AnchorType::StartOfText) => true,
        Node::Cat(nodes) => nodes.first().is_some_and(is_start_anchored),
        Node::CaptureGroup(child, ..) => is_start_anchored(child),
        Node::Alt(nodes) => !nodes.is_empty() && nodes.iter().all(is_start_anchored),
        _ => false,
    }
}

/// The "IR" for a start predicate.
#[derive(Debug)]
enum AbstractStartPredicate {
    /// No predicate.
    Arbitrary,

    /// Sequence of non-empty bytes.
    Sequence(Vec<u8>),

    /// Set of bytes.
    Set(ByteBitmap),
}

impl AbstractStartPredicate {
    /// \return the disjunction of two predicates.
    /// That is, a predicate that matches x OR y.
    fn disjunction(x: Self, y: Self) -> Self {
        match (x, y) {
            (Self::Arbitrary, _) => Self::Arbitrary,
            (_, Self::Arbitrary) => Self::Arbitrary,

            (Self::Sequence(s1), Self::Sequence(s2)) => {
                // Compute the length of the shared prefix.
                let shared_len = s1.iter().zip(s2.iter()).take_while(|(a, b)| a == b).count();
                if shared_len > 0 {
                    // Use the shared prefix.
                    Self::Sequence(s1[..shared_len].to_vec())
                } else {
                    // Use a set of their first byte.
                    Self::Set(ByteBitmap::new(&[s1[0], s2[0]]))
                }
            }

            (Self::Set(mut s1), Self::Set(s2)) => {
                s1.bitor(&s2);
                Self::Set(s1)
            }

            (Self::Set(mut s1), Self::Sequence(s2)) | (Self::Sequence(s2), Self::Set(mut s1)) => {
                // Add first byte to set.
                s1.set(s2[0]);
                Self::Set(s1)
            }
        }
    }

    /// Resolve ourselves to a concrete start predicate.
    fn resolve_to_insn(self) -> StartPredicate {
        match self {
            Self::Arbitrary => StartPredicate::Arbitrary,
            Self::Sequence(vals) => {
                let resolved = match vals.len() {
                    0 => None,
                    1 => vals[..].try_into().ok().map(StartPredicate::ByteSeq1),
                    2 => vals[..].try_into().ok().map(StartPredicate::ByteSeq2),
                    3 => vals[..].try_into().ok().map(StartPredicate::ByteSeq3),
                    _ => vals[..4].try_into().ok().map(StartPredicate::ByteSeq4),
                };
                resolved.unwrap_or(StartPredicate::Arbitrary)
            }
            Self::Set(bm) => {
                let bytes = bm.to_vec();
                let resolved = match bytes.len() {
                    0 => None,
                    1 => bytes[..].try_into().ok().map(StartPredicate::ByteSeq1),
                    2 => bytes[..].try_into().ok().map(StartPredicate::ByteSet2),
                    3 => bytes[..].try_into().ok().map(StartPredicate::ByteSet3),
                    _ => Some(StartPredicate::ByteBracket(bm)),
                };
                resolved.unwrap_or(StartPredicate::Arbitrary)
            }
        }
    }
}

/// Compute any start-predicate for a node.
/// If this returns None, then the node is zero-width (e.g. an anchor) and
/// does not contribute to the predicate.
/// If this returns Arbitrary, then there is no predicate.
fn compute_start_predicate(n: &Node) -> Option<AbstractStartPredicate> {
    let arbitrary = Some(AbstractStartPredicate::Arbitrary);
    match n {
        Node::ByteSequence(bytes) if bytes.is_empty() => None,
        Node::ByteSequence(bytes) => Some(AbstractStartPredicate::Sequence(bytes.to_vec())),

        Node::Bracket(members) => Some(AbstractStartPredicate::Set(ByteBitmap::new(members))),

        // MatchAny (aka .) is too common to do a fast prefix search for.
        Node::MatchAny => arbitrary,

        // Zero-width nodes impose no start predicate.
        Node::Empty | Node::Anchor(..) | Node::WordBoundary { .. } => None,

        // Cats return the first non-None value, if any.
        Node::Cat(nodes) => nodes.iter().find_map(compute_start_predicate),

        // Capture groups delegate to their contents.
        Node::CaptureGroup(child, ..) => compute_start_predicate(child),

        Node::Loop { loopee, quant } => {
            let mandatory = match *quant {
                Quantifier::Plus => true,
                Quantifier::Range { min, .. } => min > 0,
                Quantifier::Star | Quantifier::Quest => false,
            };
            if mandatory {
                compute_start_predicate(loopee)
            } else {
                arbitrary
            }
        }

        // The disjunction of the predicates of every arm.
        Node::Alt(nodes) => {
            let mut result: Option<AbstractStartPredicate> = None;
            for node in nodes {
                let pred = match compute_start_predicate(node) {
                    Some(pred) => pred,
                    // This arm could match the empty string.
                    None => return arbitrary,
                };
                result = Some(match result {
                    None => pred,
                    Some(prev) => AbstractStartPredicate::disjunction(prev, pred),
                });
            }
            result.or(arbitrary)
        }
    }
}

/// \return the start predicate for a Regex.
pub fn predicate_for_re(re: &ir::Regex) -> StartPredicate {
    // If anchors are not enforced, \A may match anywhere.
    if !re.flags.no_anchor_checks && is_start_anchored(&re.node) {
        return StartPredicate::StartAnchored;
    }
    compute_start_predicate(&re.node)
        .unwrap_or(AbstractStartPredicate::Arbitrary)
        .resolve_to_insn()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Flags;
    use crate::parse::try_parse;
    use crate::types::Limits;

    fn pred(pattern: &str) -> StartPredicate {
        pred_with_flags(pattern, Flags::default())
    }

    fn pred_with_flags(pattern: &str, flags: Flags) -> StartPredicate {
        let re = try_parse(pattern.as_bytes(), flags, &Limits::default()).unwrap();
        predicate_for_re(&re)
    }

    #[test]
    fn test_literal_prefix() {
        assert!(matches!(pred("abc"), StartPredicate::ByteSeq3(b) if &b == b"abc"));
        assert!(matches!(pred("abcdefg"), StartPredicate::ByteSeq4(b) if &b == b"abcd"));
        assert!(matches!(pred("(ab)c"), StartPredicate::ByteSeq2(b) if &b == b"ab"));
        assert!(matches!(pred("x*"), StartPredicate::Arbitrary));
        assert!(matches!(pred("x+"), StartPredicate::ByteSeq1([b'x'])));
        assert!(matches!(pred("x{2,3}"), StartPredicate::ByteSeq1([b'x'])));
        assert!(matches!(pred("x{0,3}"), StartPredicate::Arbitrary));
    }

    #[test]
    fn test_alternation_prefix() {
        assert!(matches!(pred("abc|abd"), StartPredicate::ByteSeq2(b) if &b == b"ab"));
        assert!(matches!(pred("a|b"), StartPredicate::ByteSet2(b) if &b == b"ab"));
        assert!(matches!(pred("a|b|c"), StartPredicate::ByteSet3(b) if &b == b"abc"));
        assert!(matches!(pred("a|b|c|d"), StartPredicate::ByteBracket(..)));
        assert!(matches!(pred("a|"), StartPredicate::Arbitrary));
        assert!(matches!(pred("a|.b"), StartPredicate::Arbitrary));
        assert!(matches!(pred("(a|\\b)c"), StartPredicate::Arbitrary));
    }

    #[test]
    fn test_zero_width_skipped() {
        assert!(matches!(pred("^\\bab"), StartPredicate::ByteSeq2(b) if &b == b"ab"));
        assert!(matches!(pred("[xy]z"), StartPredicate::ByteSet2(b) if &b == b"xy"));
    }

    #[test]
    fn test_start_anchored() {
        assert!(matches!(pred("\\Aabc"), StartPredicate::StartAnchored));
        assert!(matches!(pred("(\\Aa)|\\Ab"), StartPredicate::StartAnchored));
        assert!(matches!(pred("\\Aa|b"), StartPredicate::ByteSet2(..)));
        let flags = Flags {
            no_anchor_checks: true,
            ..Flags::default()
        };
        assert!(matches!(
            pred_with_flags("\\Aabc", flags),
            StartPredicate::ByteSeq3(..)
        ));
    }
}
