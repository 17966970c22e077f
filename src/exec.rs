//! Execution engine bits.

use crate::api::Match;
use crate::bytesearch::{ByteArraySet, ByteSearcher, EmptyString};
use crate::error::Error;
use crate::insn::{CompiledRegex, StartPredicate};
use log::warn;

/// A trait for finding the next match in a regex.
/// This is broken out from Executor to avoid needing to thread lifetimes
/// around.
pub trait MatchProducer: std::fmt::Debug {
    /// \return the subject being searched.
    fn subject(&self) -> &[u8];

    /// \return the program being executed.
    fn compiled(&self) -> &CompiledRegex;

    /// Attempt a match anchored at \p pos.
    /// \return the end of the first successful path, or None if there is none.
    fn match_at(&mut self, pos: usize) -> Result<Option<usize>, Error>;

    /// \return the first position at or after \p pos where a match could
    /// start, according to the start predicate.
    fn next_candidate(&self, pos: usize) -> Option<usize> {
        let rest = self.subject().get(pos..)?;
        let found = match &self.compiled().start_pred {
            StartPredicate::Arbitrary => EmptyString {}.find_in(rest),
            StartPredicate::ByteSeq1(bytes) => bytes.find_in(rest),
            StartPredicate::ByteSeq2(bytes) => bytes.find_in(rest),
            StartPredicate::ByteSeq3(bytes) => bytes.find_in(rest),
            StartPredicate::ByteSeq4(bytes) => bytes.find_in(rest),
            &StartPredicate::ByteSet2(bytes) => ByteArraySet(bytes).find_in(rest),
            &StartPredicate::ByteSet3(bytes) => ByteArraySet(bytes).find_in(rest),
            StartPredicate::ByteBracket(bitmap) => bitmap.find_in(rest),
            StartPredicate::StartAnchored => {
                if pos == 0 {
                    Some(0)
                } else {
                    None
                }
            }
        };
        found.map(|offset| pos + offset)
    }

    /// Attempt to match at the given location, or any later location.
    /// \return either the Match and the position to start looking for the next
    /// match, or None on failure.
    fn next_match(
        &mut self,
        mut pos: usize,
        next_start: &mut Option<usize>,
    ) -> Result<Option<Match>, Error> {
        loop {
            pos = match self.next_candidate(pos) {
                Some(pos) => pos,
                None => return Ok(None),
            };
            if let Some(end) = self.match_at(pos)? {
                // If we matched the empty string, we have to increment.
                *next_start = if end != pos { Some(end) } else { Some(end + 1) };
                return Ok(Some(Match { range: pos..end }));
            }
            // Didn't find it at this position, try the next one.
            pos += 1;
        }
    }
}

/// A trait for executing a regex.
pub trait Executor<'r, 't>: MatchProducer {
    /// Construct a new Executor.
    fn new(re: &'r CompiledRegex, text: &'t [u8]) -> Self;
}

/// A struct which enables iteration over matches.
/// Iteration stops early if a match attempt exhausts a budget; the error is
/// then available from `error()`.
#[derive(Debug)]
pub struct Matches<Producer: MatchProducer> {
    mp: Producer,
    offset: Option<usize>,
    error: Option<Error>,
}

impl<Producer: MatchProducer> Matches<Producer> {
    pub fn new(mp: Producer, start: usize) -> Self {
        Matches {
            mp,
            offset: Some(start),
            error: None,
        }
    }

    /// \return the error which ended iteration, if any.
    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }
}

impl<Producer: MatchProducer> Iterator for Matches<Producer> {
    type Item = Match;
    fn next(&mut self) -> Option<Self::Item> {
        let start = self.offset.take()?;
        match self.mp.next_match(start, &mut self.offset) {
            Ok(m) => m,
            Err(err) => {
                warn!("match iteration stopped at offset {}: {}", start, err);
                self.error = Some(err);
                None
            }
        }
    }
}
