/// Compiler: lowers a pattern AST into bytecode for the full-match VM.
///
/// The lowering follows generation semantics rather than textbook regex
/// semantics where the two differ: a quantified literal run repeats only its
/// last character, same-value repeats are matched as ordinary repeats and
/// anchors compile to nothing.

use std::collections::HashMap;

use crate::ast::{Ast, NodeId, NodeKind};
use crate::charset::CharSet;

/// VM instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inst {
    /// Match a specific character.
    Char(char),
    /// Match a character against `Program::sets[index]`.
    Set(usize),
    /// Successful match, if the whole input has been consumed.
    Match,
    /// Jump to target instruction.
    Jump(usize),
    /// Try first path, fall back to the second.
    Split(usize, usize),
    /// Save position into capture slot.
    Save(usize),
    /// Backreference: match the same text as capture group N.
    Backref(usize),
    /// Fail unless input was consumed since the position saved in the slot.
    Progress(usize),
    /// No-op (used as placeholder).
    Nop,
}

/// Compiled program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    pub insts: Vec<Inst>,
    pub sets: Vec<CharSet>,
    pub n_groups: usize,
    /// Capture slots followed by one loop-entry slot per star loop.
    pub n_slots: usize,
}

/// Compile the tree rooted at `root` into a bytecode program.
pub fn compile(ast: &Ast, root: NodeId) -> Program {
    let n_groups = (0..ast.len())
        .filter_map(|index| match ast.kind(NodeId(index)) {
            NodeKind::Group { capture, .. } => *capture,
            _ => None,
        })
        .max()
        .unwrap_or(0);
    let mut lowering = Lowering {
        ast,
        insts: Vec::new(),
        sets: Vec::new(),
        set_index: HashMap::new(),
        next_slot: (n_groups + 1) * 2,
    };
    lowering.emit(root);
    lowering.insts.push(Inst::Match);
    Program {
        insts: lowering.insts,
        sets: lowering.sets,
        n_groups,
        n_slots: lowering.next_slot,
    }
}

struct Lowering<'a> {
    ast: &'a Ast,
    insts: Vec<Inst>,
    sets: Vec<CharSet>,
    /// Each set node is stored once even when a repeat unrolls it.
    set_index: HashMap<NodeId, usize>,
    next_slot: usize,
}

impl Lowering<'_> {
    fn emit(&mut self, id: NodeId) {
        let ast = self.ast;
        match ast.kind(id) {
            NodeKind::Text(text) => {
                self.insts.extend(text.chars().map(Inst::Char));
            }
            NodeKind::Set(set) => {
                let next = self.sets.len();
                let index = *self.set_index.entry(id).or_insert(next);
                if index == next {
                    self.sets.push(set.clone());
                }
                self.insts.push(Inst::Set(index));
            }
            NodeKind::Concat(children) => {
                for child in children {
                    self.emit(*child);
                }
            }
            NodeKind::Alternation(branches) => {
                // a|b|c compiles to:
                //   split L1, L2
                //   L1: <a> jump END
                //   L2: split L3, L4
                //   L3: <b> jump END
                //   L4: <c>
                //   END:
                let Some((last, rest)) = branches.split_last() else {
                    return;
                };
                let mut fixup_jumps = Vec::new();
                for branch in rest {
                    let split_pc = self.insts.len();
                    self.insts.push(Inst::Nop); // placeholder for split
                    let branch_start = self.insts.len();
                    self.emit(*branch);
                    fixup_jumps.push(self.insts.len());
                    self.insts.push(Inst::Nop); // placeholder for jump to end
                    let next_branch = self.insts.len();
                    self.insts[split_pc] = Inst::Split(branch_start, next_branch);
                }
                self.emit(*last);
                let end = self.insts.len();
                for jpc in fixup_jumps {
                    self.insts[jpc] = Inst::Jump(end);
                }
            }
            NodeKind::Repeat {
                child, min, max, ..
            } => match ast.kind(*child) {
                NodeKind::Text(text) if !text.is_empty() => {
                    let mut chars: Vec<char> = text.chars().collect();
                    let last = chars.pop().unwrap_or_default();
                    self.insts.extend(chars.into_iter().map(Inst::Char));
                    self.emit_repeat(*min, *max, &|l: &mut Self| l.insts.push(Inst::Char(last)));
                }
                _ => {
                    let child = *child;
                    self.emit_repeat(*min, *max, &|l: &mut Self| l.emit(child));
                }
            },
            NodeKind::Group { child, capture, .. } => match capture {
                Some(index) => {
                    self.insts.push(Inst::Save(*index * 2));
                    self.emit(*child);
                    self.insts.push(Inst::Save(*index * 2 + 1));
                }
                None => self.emit(*child),
            },
            NodeKind::Backref { target } => match ast.kind(*target) {
                NodeKind::Group {
                    capture: Some(index),
                    ..
                } => self.insts.push(Inst::Backref(*index)),
                _ => self.emit(*target),
            },
        }
    }

    /// `min` required copies of `body`, then either a star loop or
    /// `max - min` optional copies.
    fn emit_repeat(&mut self, min: usize, max: Option<usize>, body: &dyn Fn(&mut Self)) {
        for _ in 0..min {
            body(self);
        }
        match max {
            None => {
                // L1: split L2, L3
                // L2: save S
                //     <body>
                //     progress S
                //     jump L1
                // L3:
                // An iteration that consumes nothing fails, so the loop ends.
                let slot = self.next_slot;
                self.next_slot += 1;
                let l1 = self.insts.len();
                self.insts.push(Inst::Nop); // placeholder
                let l2 = self.insts.len();
                self.insts.push(Inst::Save(slot));
                body(self);
                self.insts.push(Inst::Progress(slot));
                self.insts.push(Inst::Jump(l1));
                let l3 = self.insts.len();
                self.insts[l1] = Inst::Split(l2, l3);
            }
            Some(max) => {
                for _ in min..max {
                    // split L1, L2
                    // L1: <body>
                    // L2:
                    let split_pc = self.insts.len();
                    self.insts.push(Inst::Nop);
                    let l1 = self.insts.len();
                    body(self);
                    let l2 = self.insts.len();
                    self.insts[split_pc] = Inst::Split(l1, l2);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser;

    fn program(pattern: &str) -> Program {
        let compiled = parser::compile(pattern).unwrap();
        compile(&compiled.ast, compiled.root)
    }

    #[test]
    fn literal_text_becomes_chars() {
        assert_eq!(
            program("ab").insts,
            vec![Inst::Char('a'), Inst::Char('b'), Inst::Match]
        );
    }

    #[test]
    fn quantified_run_repeats_last_char() {
        assert_eq!(
            program("ab{2}").insts,
            vec![Inst::Char('a'), Inst::Char('b'), Inst::Char('b'), Inst::Match]
        );
    }

    #[test]
    fn star_loops_back() {
        assert_eq!(
            program("a*").insts,
            vec![
                Inst::Split(1, 5),
                Inst::Save(2),
                Inst::Char('a'),
                Inst::Progress(2),
                Inst::Jump(0),
                Inst::Match
            ]
        );
    }

    #[test]
    fn loop_slots_follow_capture_slots() {
        let prog = program("(a)*(b)+");
        assert_eq!(prog.n_groups, 2);
        // two groups use slots 0..6, each star loop takes the next one
        assert_eq!(prog.n_slots, 8);
        assert!(prog.insts.contains(&Inst::Progress(6)));
        assert!(prog.insts.contains(&Inst::Progress(7)));
    }

    #[test]
    fn alternation_splits() {
        assert_eq!(
            program("a|b").insts,
            vec![
                Inst::Split(1, 3),
                Inst::Char('a'),
                Inst::Jump(4),
                Inst::Char('b'),
                Inst::Match
            ]
        );
    }

    #[test]
    fn unrolled_sets_are_shared() {
        let prog = program("[a-z]{3}");
        assert_eq!(prog.sets.len(), 1);
        assert_eq!(
            prog.insts,
            vec![Inst::Set(0), Inst::Set(0), Inst::Set(0), Inst::Match]
        );
    }

    #[test]
    fn groups_save_and_backrefs_refer() {
        let prog = program("(a)(?<n>b)\\k<n>");
        assert_eq!(prog.n_groups, 2);
        assert_eq!(
            prog.insts,
            vec![
                Inst::Save(2),
                Inst::Char('a'),
                Inst::Save(3),
                Inst::Save(4),
                Inst::Char('b'),
                Inst::Save(5),
                Inst::Backref(2),
                Inst::Match
            ]
        );
    }
}
