/// Public entry points: compiled patterns, a caching generator and one-shot helpers.

use std::collections::HashMap;
use std::sync::OnceLock;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::compiler::{self, Program};
use crate::config::GenConfig;
use crate::error::GenError;
use crate::generator::GenerationContext;
use crate::parser::{self, Compiled};
use crate::select;
use crate::vm;

/// A pattern compiled once and reusable for any number of generations.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    compiled: Compiled,
    /// Verifier bytecode, lowered on first use.
    program: OnceLock<Program>,
}

impl Pattern {
    pub fn compile(pattern: &str) -> Result<Self, GenError> {
        let compiled = parser::compile(pattern)?;
        Ok(Pattern {
            source: pattern.to_string(),
            compiled,
            program: OnceLock::new(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether the pattern carries an `\i` marker and so produces non-matching text.
    pub fn is_invalidating(&self) -> bool {
        self.compiled.has_marker
    }

    /// Whether `input` as a whole matches the pattern with markers ignored.
    pub fn is_full_match(&self, input: &str) -> bool {
        vm::full_match(self.program(), input)
    }

    fn program(&self) -> &Program {
        self.program
            .get_or_init(|| compiler::compile(&self.compiled.ast, self.compiled.root))
    }

    /// Whether the verifier program has been built yet.
    pub fn is_lowered(&self) -> bool {
        self.program.get().is_some()
    }

    /// Generate one string. With an `\i` marker the string is guaranteed not
    /// to match, provided `config.verify` is set.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        config: &GenConfig,
    ) -> Result<String, GenError> {
        let ast = &self.compiled.ast;
        if !self.compiled.has_marker {
            return GenerationContext::new(ast, config).generate(self.compiled.root, rng);
        }

        let invalid =
            select::select_invalid_node(ast, &self.compiled.candidates, &self.source, rng)?;
        let generated =
            GenerationContext::invalidating(ast, config, invalid).generate(self.compiled.root, rng)?;

        if config.verify && self.is_full_match(&generated) {
            debug!(pattern = %self.source, ?generated, "invalid output still matches");
            return Err(GenError::InvalidationFailed {
                pattern: self.source.clone(),
                generated,
            });
        }
        Ok(generated)
    }
}

/// Generator that owns its random source and caches compiled patterns.
pub struct RegexGen<R> {
    rng: R,
    config: GenConfig,
    cache: HashMap<String, Pattern>,
}

impl<R: Rng> RegexGen<R> {
    pub fn new(rng: R) -> Self {
        Self::with_config(rng, GenConfig::default())
    }

    pub fn with_config(rng: R, config: GenConfig) -> Self {
        RegexGen {
            rng,
            config,
            cache: HashMap::new(),
        }
    }

    pub fn config(&self) -> &GenConfig {
        &self.config
    }

    /// Generate a string for `pattern`, compiling it on first use.
    pub fn next_string(&mut self, pattern: &str) -> Result<String, GenError> {
        if !self.cache.contains_key(pattern) {
            let compiled = Pattern::compile(pattern)?;
            debug!(pattern, cached = self.cache.len() + 1, "caching pattern");
            self.cache.insert(pattern.to_string(), compiled);
        }
        let compiled = &self.cache[pattern];
        compiled.generate(&mut self.rng, &self.config)
    }

    /// Number of distinct patterns compiled so far.
    pub fn cached_patterns(&self) -> usize {
        self.cache.len()
    }
}

impl RegexGen<StdRng> {
    /// Deterministic generator: the same seed yields the same strings.
    pub fn from_seed(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

/// Compile `pattern` and generate one string with the default settings.
pub fn generate<R: Rng + ?Sized>(pattern: &str, rng: &mut R) -> Result<String, GenError> {
    generate_with(pattern, rng, &GenConfig::default())
}

pub fn generate_with<R: Rng + ?Sized>(
    pattern: &str,
    rng: &mut R,
    config: &GenConfig,
) -> Result<String, GenError> {
    Pattern::compile(pattern)?.generate(rng, config)
}
