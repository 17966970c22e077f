#![allow(clippy::uninlined_format_args)]

use retro::backends as rbe;

/// Test that \p pattern fails to parse with default flags.
#[track_caller]
pub fn test_parse_fails(pattern: &str) {
    let res = retro::Regex::new(pattern);
    assert!(res.is_err(), "Pattern should not have parsed: {}", pattern);
}

pub trait VecTestHelpers {
    /// "Fluent" style helper for testing that a Vec<&str> is equal to a
    /// Vec<&str>.
    fn test_eq(&self, rhs: Vec<&str>);
}

impl VecTestHelpers for Vec<&str> {
    fn test_eq(&self, rhs: Vec<&str>) {
        assert_eq!(*self, rhs)
    }
}

/// A compiled regex which remembers a TestConfig.
#[derive(Debug, Clone)]
pub struct TestCompiledRegex {
    re: retro::Regex,
    tc: TestConfig,
}

impl TestCompiledRegex {
    /// Match self as a prefix of \p input.
    /// \return the end of the match, or the error which ended the attempt.
    pub fn try_prefix(&self, input: &str) -> Result<Option<usize>, retro::Error> {
        let input = input.as_bytes();
        match self.tc.backend {
            #[cfg(feature = "backend-pikevm")]
            Backend::PikeVM => rbe::match_prefix::<rbe::PikeVMExecutor>(&self.re, input),
            Backend::Backtracking => rbe::match_prefix::<rbe::BacktrackExecutor>(&self.re, input),
        }
    }

    /// Match self as a prefix of \p input.
    /// \return the end of the match, if any.
    #[track_caller]
    pub fn prefix(&self, input: &str) -> Option<usize> {
        match self.try_prefix(input) {
            Ok(end) => end,
            Err(err) => panic!("Match attempt failed on {:?}: {}", input, err),
        }
    }

    /// Test that \p input does not begin with a match.
    #[track_caller]
    pub fn test_fails(&self, input: &str) {
        assert!(
            self.prefix(input).is_none(),
            "Should not have matched {:?} with {:?}",
            input,
            self.tc
        )
    }

    /// Test that \p input begins with a match.
    #[track_caller]
    pub fn test_succeeds(&self, input: &str) {
        assert!(
            self.prefix(input).is_some(),
            "Should have matched {:?} with {:?}",
            input,
            self.tc
        )
    }

    /// Search for self in \p input, returning a list of all matches.
    #[track_caller]
    pub fn matches(&self, input: &str, start: usize) -> Vec<retro::Match> {
        let input = input.as_bytes();
        match self.tc.backend {
            #[cfg(feature = "backend-pikevm")]
            Backend::PikeVM => rbe::find::<rbe::PikeVMExecutor>(&self.re, input, start).collect(),
            Backend::Backtracking => {
                rbe::find::<rbe::BacktrackExecutor>(&self.re, input, start).collect()
            }
        }
    }

    /// Search for self in \p input, returning the first Match, or None if
    /// none.
    pub fn find(&self, input: &str) -> Option<retro::Match> {
        self.matches(input, 0).into_iter().next()
    }

    /// Return a list of all non-overlapping total match ranges from a given
    /// start.
    pub fn match_all_from(&self, input: &str, start: usize) -> Vec<retro::Range> {
        self.matches(input, start)
            .into_iter()
            .map(move |m| m.range())
            .collect()
    }

    /// Return a list of all non-overlapping matches.
    pub fn match_all<'b>(&self, input: &'b str) -> Vec<&'b str> {
        self.matches(input, 0)
            .into_iter()
            .map(move |m| &input[m.range()])
            .collect()
    }

    /// Search for self in \p input, returning the text of the first match.
    #[track_caller]
    pub fn match1f<'b>(&self, input: &'b str) -> &'b str {
        match self.find(input) {
            Some(m) => &input[m.range()],
            None => panic!("Failed to match {}", input),
        }
    }
}

/// Our backend types.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Backend {
    #[cfg(feature = "backend-pikevm")]
    PikeVM,
    Backtracking,
}

/// Description of how to test a regex.
#[derive(Debug, Copy, Clone)]
pub struct TestConfig {
    // Whether the backtracker memoizes.
    memoize: bool,

    // Which backend to use.
    backend: Backend,
}

impl TestConfig {
    /// \return whether this config can get stuck on patterns whose matching
    /// is exponential.
    pub fn is_exponential(&self) -> bool {
        self.backend == Backend::Backtracking && !self.memoize
    }

    /// Compile a pattern to a regex, with default flags.
    #[track_caller]
    pub fn compile(&self, pattern: &str) -> TestCompiledRegex {
        self.compilef(pattern, "")
    }

    /// Compile a pattern to a regex, with given flags.
    #[track_caller]
    pub fn compilef(&self, pattern: &str, flags_str: &str) -> TestCompiledRegex {
        let mut flags = retro::Flags::from(flags_str);
        flags.memoize |= self.memoize;

        let re = retro::Regex::with_flags(pattern, flags);
        assert!(
            re.is_ok(),
            "Failed to parse! flags: {} pattern: {}, error: {}",
            flags_str,
            pattern,
            re.unwrap_err()
        );
        TestCompiledRegex {
            re: re.unwrap(),
            tc: *self,
        }
    }

    /// Compile a pattern with given flags and limits.
    #[track_caller]
    pub fn compile_limited(
        &self,
        pattern: &str,
        flags_str: &str,
        limits: retro::Limits,
    ) -> TestCompiledRegex {
        let mut flags = retro::Flags::from(flags_str);
        flags.memoize |= self.memoize;
        let re = retro::Regex::with_limits(pattern, flags, limits);
        assert!(
            re.is_ok(),
            "Failed to parse! pattern: {}, error: {}",
            pattern,
            re.unwrap_err()
        );
        TestCompiledRegex {
            re: re.unwrap(),
            tc: *self,
        }
    }

    /// Test that \p pattern and \p flags successfully parses, and matches
    /// a prefix of \p input.
    #[track_caller]
    pub fn test_match_succeeds(&self, pattern: &str, flags_str: &str, input: &str) {
        let cr = self.compilef(pattern, flags_str);
        cr.test_succeeds(input)
    }

    /// Test that \p pattern and \p flags successfully parses, and does not
    /// match any prefix of \p input.
    #[track_caller]
    pub fn test_match_fails(&self, pattern: &str, flags_str: &str, input: &str) {
        let cr = self.compilef(pattern, flags_str);
        cr.test_fails(input)
    }
}

/// Invoke \p F with each test config, in turn.
pub fn test_with_configs<F>(func: F)
where
    F: Fn(TestConfig),
{
    func(TestConfig {
        memoize: false,
        backend: Backend::Backtracking,
    });
    func(TestConfig {
        memoize: true,
        backend: Backend::Backtracking,
    });
    #[cfg(feature = "backend-pikevm")]
    func(TestConfig {
        memoize: false,
        backend: Backend::PikeVM,
    });
}
