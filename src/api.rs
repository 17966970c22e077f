use crate::emit;
use crate::error::Error;
use crate::exec;
use crate::insn::CompiledRegex;
use crate::parse;
use crate::types::Limits;
use core::{fmt, str::FromStr};
use log::warn;

/// Flags used to control parsing and matching.
/// The default flags check anchors and do not memoize.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Flags {
    /// If set, `^`, `$`, `\A` and `\z` always succeed without inspecting
    /// the subject.
    pub no_anchor_checks: bool,

    /// If set, the backtracking matcher remembers which (split, position)
    /// pairs it has already explored and does not explore them again. This
    /// bounds its work by the product of program and subject size.
    pub memoize: bool,
}

impl Flags {
    /// Construct a Flags from an iterator of flag letters.
    /// 'n' disables anchor checks, 'm' enables memoization.
    /// Other letters are ignored.
    #[inline]
    pub fn new<T: Iterator<Item = char>>(chars: T) -> Self {
        let mut result = Self::default();
        for c in chars {
            match c {
                'n' => {
                    result.no_anchor_checks = true;
                }
                'm' => {
                    result.memoize = true;
                }
                _ => {
                    // Silently skip unsupported flags.
                }
            }
        }
        result
    }
}

impl From<&str> for Flags {
    /// Construct a Flags from a string of flag letters.
    ///
    /// See also: [`Flags::new`].
    #[inline]
    fn from(s: &str) -> Self {
        Self::new(s.chars())
    }
}

impl fmt::Display for Flags {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.no_anchor_checks {
            f.write_str("n")?;
        }
        if self.memoize {
            f.write_str("m")?;
        }
        Ok(())
    }
}

/// Range is used to express the extent of a match, as indexes into the
/// subject.
pub type Range = core::ops::Range<usize>;

/// An iterator type which yields `Match`es found in a subject.
pub type Matches<'r, 't> = exec::Matches<backends::DefaultExecutor<'r, 't>>;

/// A Match represents a portion of a subject which was found to match a
/// Regex. Group boundaries are not reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    /// The total range of the match. Note this may be empty, if the regex
    /// matched an empty string.
    pub range: Range,
}

impl Match {
    /// Returns the range over the starting and ending byte offsets of the
    /// match in the subject.
    #[inline]
    pub fn range(&self) -> Range {
        self.range.clone()
    }

    /// Returns the starting byte offset of the match in the subject.
    #[inline]
    pub fn start(&self) -> usize {
        self.range.start
    }

    /// Returns the ending byte offset of the match in the subject.
    #[inline]
    pub fn end(&self) -> usize {
        self.range.end
    }
}

/// A Regex is the compiled version of a pattern.
#[derive(Clone)]
pub struct Regex {
    cr: CompiledRegex,
}

impl From<CompiledRegex> for Regex {
    fn from(cr: CompiledRegex) -> Self {
        Self { cr }
    }
}

impl Regex {
    /// Construct a regex by parsing `pattern` using the default flags.
    /// An Error is returned if the syntax is invalid, or if the pattern
    /// exceeds the default limits.
    #[inline]
    pub fn new<P: AsRef<[u8]>>(pattern: P) -> Result<Regex, Error> {
        Self::with_flags(pattern, Flags::default())
    }

    /// Construct a regex by parsing `pattern` with `flags`.
    #[inline]
    pub fn with_flags<P, F>(pattern: P, flags: F) -> Result<Regex, Error>
    where
        P: AsRef<[u8]>,
        F: Into<Flags>,
    {
        Self::with_limits(pattern, flags, Limits::default())
    }

    /// Construct a regex by parsing `pattern` with `flags`, bounding the work
    /// done on its behalf by `limits`.
    /// The pattern is a byte string; NUL bytes are ordinary literal bytes.
    pub fn with_limits<P, F>(pattern: P, flags: F, limits: Limits) -> Result<Regex, Error>
    where
        P: AsRef<[u8]>,
        F: Into<Flags>,
    {
        let ire = parse::try_parse(pattern.as_ref(), flags.into(), &limits)?;
        let cr = emit::emit(ire, &limits)?;
        Ok(Regex { cr })
    }

    /// Match `text` as a prefix, anchored at its start.
    /// \return the end of the first successful path, or None.
    /// Nothing beyond the end of the match needs to be consumed.
    pub fn match_prefix<T: AsRef<[u8]> + ?Sized>(&self, text: &T) -> Result<Option<usize>, Error> {
        backends::match_prefix::<backends::DefaultExecutor>(self, text.as_ref())
    }

    /// \return whether some prefix of `text` matches.
    #[inline]
    pub fn try_is_match<T: AsRef<[u8]> + ?Sized>(&self, text: &T) -> Result<bool, Error> {
        Ok(self.match_prefix(text)?.is_some())
    }

    /// \return whether some prefix of `text` matches.
    /// A match attempt which exhausts its budget is logged and reported as
    /// no match; use `try_is_match` to observe the error.
    pub fn is_match<T: AsRef<[u8]> + ?Sized>(&self, text: &T) -> bool {
        self.try_is_match(text).unwrap_or_else(|err| {
            warn!("treating failed match attempt as no match: {}", err);
            false
        })
    }

    /// Searches `text` to find the first match, which may start anywhere.
    #[inline]
    pub fn find<T: AsRef<[u8]> + ?Sized>(&self, text: &T) -> Option<Match> {
        self.find_iter(text).next()
    }

    /// Searches `text`, returning an iterator over non-overlapping matches.
    /// Note that the resulting Iterator borrows both the regex `'r` and the
    /// subject as `'t`.
    #[inline]
    pub fn find_iter<'r, 't, T: AsRef<[u8]> + ?Sized>(&'r self, text: &'t T) -> Matches<'r, 't> {
        self.find_from(text, 0)
    }

    /// Returns an iterator for matches found in `text` starting at byte index
    /// `start`. Note this may be different from passing a sliced `text` in
    /// the case of anchors.
    /// Example:
    ///
    ///  ```rust
    ///   use retro::Regex;
    ///   let re = Regex::new(r"\Ay").unwrap();
    ///   assert!(re.find(&b"xy"[1..]).is_some());
    ///   assert!(re.find_from(b"xy", 1).next().is_none());
    ///   ```
    #[inline]
    pub fn find_from<'r, 't, T: AsRef<[u8]> + ?Sized>(
        &'r self,
        text: &'t T,
        start: usize,
    ) -> Matches<'r, 't> {
        backends::find(self, text.as_ref(), start)
    }

    /// \return the number of capture groups in the pattern.
    #[inline]
    pub fn group_count(&self) -> u32 {
        self.cr.groups
    }
}

impl FromStr for Regex {
    type Err = Error;

    /// Attempts to parse a string into a regular expression
    #[inline]
    fn from_str(s: &str) -> Result<Self, Error> {
        Self::new(s)
    }
}

impl fmt::Debug for Regex {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self.cr)
    }
}

// Support for using retro with different matching backends.
// Currently there is the classical backtracking, and the PikeVM.
#[doc(hidden)]
pub mod backends {
    use super::exec;
    use super::Regex;
    pub use crate::emit::emit;
    pub use crate::parse::try_parse;

    /// An Executor using the classical backtracking algorithm.
    pub type BacktrackExecutor<'r, 't> = crate::classicalbacktrack::BacktrackExecutor<'r, 't>;

    /// A Executor using the PikeVM executor.
    #[cfg(feature = "backend-pikevm")]
    pub type PikeVMExecutor<'r, 't> = crate::pikevm::PikeVMExecutor<'r, 't>;

    /// An alias type to the default Executor.
    pub type DefaultExecutor<'r, 't> = BacktrackExecutor<'r, 't>;

    /// Searches `text`, returning an iterator over non-overlapping matches.
    pub fn find<'r, 't, Executor: exec::Executor<'r, 't>>(
        re: &'r Regex,
        text: &'t [u8],
        start: usize,
    ) -> exec::Matches<Executor> {
        exec::Matches::new(Executor::new(&re.cr, text), start)
    }

    /// Match `text` as a prefix using the given Executor.
    pub fn match_prefix<'r, 't, Executor: exec::Executor<'r, 't>>(
        re: &'r Regex,
        text: &'t [u8],
    ) -> Result<Option<usize>, crate::Error> {
        Executor::new(&re.cr, text).match_at(0)
    }
}
