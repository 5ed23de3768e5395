/// Generation settings.

/// Extra iterations allowed past `min` for unbounded repeats, and the
/// overshoot range used when an invalid repeat goes above `max`.
pub const DEFAULT_REPEAT_SLACK: usize = 10;

/// How a backreference such as `\1` produces its text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum BackrefMode {
    /// Repeat the text the referenced group produced earlier in the same string.
    #[default]
    Replay,
    /// Generate the referenced group again; the two occurrences may differ.
    Regenerate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenConfig {
    pub repeat_slack: usize,
    pub backrefs: BackrefMode,
    /// Re-match invalid output against the pattern and fail if it still matches.
    pub verify: bool,
}

impl Default for GenConfig {
    fn default() -> Self {
        GenConfig {
            repeat_slack: DEFAULT_REPEAT_SLACK,
            backrefs: BackrefMode::default(),
            verify: true,
        }
    }
}

impl GenConfig {
    pub fn with_repeat_slack(mut self, slack: usize) -> Self {
        self.repeat_slack = slack;
        self
    }

    pub fn with_backrefs(mut self, mode: BackrefMode) -> Self {
        self.backrefs = mode;
        self
    }

    pub fn with_verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }
}
