/// Generator: walks a compiled AST and produces a string.
///
/// All per-call state (the invalid node, the reserved path and the captured
/// group texts) lives in a [`GenerationContext`], so the AST itself is never
/// mutated and can be reused across calls.

use std::collections::HashMap;

use rand::Rng;

use crate::ast::{Ast, NodeId, NodeKind};
use crate::charset::CharSet;
use crate::config::{BackrefMode, GenConfig};
use crate::error::GenError;
use crate::select::ReservedPath;

pub struct GenerationContext<'a> {
    ast: &'a Ast,
    config: &'a GenConfig,
    invalid: Option<NodeId>,
    path: ReservedPath,
    /// Text most recently produced by each capturing group.
    captures: HashMap<NodeId, String>,
}

impl<'a> GenerationContext<'a> {
    /// Context for generating a matching string.
    pub fn new(ast: &'a Ast, config: &'a GenConfig) -> Self {
        GenerationContext {
            ast,
            config,
            invalid: None,
            path: ReservedPath::default(),
            captures: HashMap::new(),
        }
    }

    /// Context in which `invalid` breaks its own syntax and every ancestor is
    /// forced to generate it.
    pub fn invalidating(ast: &'a Ast, config: &'a GenConfig, invalid: NodeId) -> Self {
        GenerationContext {
            ast,
            config,
            invalid: Some(invalid),
            path: ReservedPath::reserve(ast, invalid),
            captures: HashMap::new(),
        }
    }

    fn is_invalid(&self, id: NodeId) -> bool {
        self.invalid == Some(id)
    }

    pub fn generate<R: Rng + ?Sized>(&mut self, id: NodeId, rng: &mut R) -> Result<String, GenError> {
        let ast = self.ast;
        match ast.kind(id) {
            NodeKind::Text(text) => {
                if self.is_invalid(id) {
                    corrupt_text(text, rng)
                } else {
                    Ok(text.clone())
                }
            }
            NodeKind::Set(set) => set.pick(rng, self.is_invalid(id)).map(String::from),
            NodeKind::Concat(children) => {
                let mut out = String::new();
                for child in children {
                    out.push_str(&self.generate(*child, rng)?);
                }
                Ok(out)
            }
            NodeKind::Alternation(children) => {
                let branch = match self.path.branch(id) {
                    Some(reserved) => reserved,
                    None => children[rng.random_range(0..children.len())],
                };
                self.generate(branch, rng)
            }
            NodeKind::Repeat {
                child,
                min,
                max,
                same_value,
            } => {
                let count = if self.is_invalid(id) {
                    self.invalid_count(*min, *max, rng)
                } else {
                    self.valid_count(id, *min, *max, rng)
                };
                self.generate_repeat(*child, count, *same_value, rng)
            }
            NodeKind::Group { child, capture, .. } => {
                let text = self.generate(*child, rng)?;
                if capture.is_some() {
                    self.captures.insert(id, text.clone());
                }
                Ok(text)
            }
            NodeKind::Backref { target } => match self.config.backrefs {
                BackrefMode::Replay => match self.captures.get(target) {
                    Some(text) => Ok(text.clone()),
                    None => self.generate(*target, rng),
                },
                BackrefMode::Regenerate => self.generate(*target, rng),
            },
        }
    }

    /// Iteration count inside `[min, max]`. A reserved repeat never picks zero.
    fn valid_count<R: Rng + ?Sized>(
        &self,
        id: NodeId,
        min: usize,
        max: Option<usize>,
        rng: &mut R,
    ) -> usize {
        let max = max.unwrap_or(min.saturating_add(self.config.repeat_slack));
        let min = if min == 0 && self.path.is_reserved(id) {
            1
        } else {
            min
        };
        if min >= max {
            min
        } else {
            rng.random_range(min..=max)
        }
    }

    /// Iteration count outside `[min, max]`: above when bounded and the coin
    /// says so (or when nothing lies below), else below.
    fn invalid_count<R: Rng + ?Sized>(&self, min: usize, max: Option<usize>, rng: &mut R) -> usize {
        let repeat_more = rng.random_range(0..2) == 1;
        if (max.is_some() && repeat_more) || min == 0 {
            let max = max.unwrap_or(min.saturating_add(self.config.repeat_slack));
            let slack = self.config.repeat_slack.max(1);
            rng.random_range(max.saturating_add(1)..=max.saturating_add(slack))
        } else {
            rng.random_range(0..min)
        }
    }

    fn generate_repeat<R: Rng + ?Sized>(
        &mut self,
        child: NodeId,
        count: usize,
        same_value: bool,
        rng: &mut R,
    ) -> Result<String, GenError> {
        // A quantified literal run repeats only its last character.
        if let NodeKind::Text(_) = self.ast.kind(child) {
            let text = self.generate(child, rng)?;
            let mut chars = text.chars();
            let Some(last) = chars.next_back() else {
                return Ok(text);
            };
            let mut out: String = chars.collect();
            out.extend(std::iter::repeat_n(last, count));
            return Ok(out);
        }

        if count == 0 {
            return Ok(String::new());
        }
        if same_value {
            return Ok(self.generate(child, rng)?.repeat(count));
        }
        let mut out = String::new();
        for _ in 0..count {
            out.push_str(&self.generate(child, rng)?);
        }
        Ok(out)
    }
}

/// Replace one character of `text` with any other character.
fn corrupt_text<R: Rng + ?Sized>(text: &str, rng: &mut R) -> Result<String, GenError> {
    let mut chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return Ok(String::new());
    }
    let pos = rng.random_range(0..chars.len());
    chars[pos] = CharSet::excluding(chars[pos]).pick(rng, false)?;
    Ok(chars.into_iter().collect())
}
