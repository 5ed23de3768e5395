/// Full-match verifier: decides whether a generated string is accepted by
/// the pattern it came from. Backtracking state lives on an explicit stack,
/// so the length of the input never limits the search; slot writes are
/// restored from an undo log when a branch fails.

use crate::compiler::{Inst, Program};

/// An entry in the undo log: (slot_index, old_value).
type UndoEntry = (usize, Option<usize>);

/// A pending alternative left behind by a `Split`.
struct Branch {
    pc: usize,
    pos: usize,
    undo_mark: usize,
}

/// Whether the program matches the whole of `input`, anchored at both ends.
pub fn full_match(program: &Program, input: &str) -> bool {
    let chars: Vec<char> = input.chars().collect();
    let mut slots = vec![None; program.n_slots];
    let mut undo_log: Vec<UndoEntry> = Vec::new();
    let mut backtrack: Vec<Branch> = Vec::new();
    let mut pc = 0;
    let mut pos = 0;

    loop {
        let advanced = match program.insts.get(pc) {
            None => false,
            Some(Inst::Match) => {
                if pos == chars.len() {
                    return true;
                }
                false
            }
            Some(Inst::Char(expected)) => {
                if pos < chars.len() && chars[pos] == *expected {
                    pos += 1;
                    pc += 1;
                    true
                } else {
                    false
                }
            }
            Some(Inst::Set(index)) => {
                if pos < chars.len() && program.sets[*index].matches(chars[pos]) {
                    pos += 1;
                    pc += 1;
                    true
                } else {
                    false
                }
            }
            Some(Inst::Jump(target)) => {
                pc = *target;
                true
            }
            Some(Inst::Split(first, second)) => {
                backtrack.push(Branch {
                    pc: *second,
                    pos,
                    undo_mark: undo_log.len(),
                });
                pc = *first;
                true
            }
            Some(Inst::Save(slot)) => {
                // Record old value in undo log before overwriting
                undo_log.push((*slot, slots[*slot]));
                slots[*slot] = Some(pos);
                pc += 1;
                true
            }
            Some(Inst::Progress(slot)) => {
                if slots[*slot] == Some(pos) {
                    false
                } else {
                    pc += 1;
                    true
                }
            }
            Some(Inst::Backref(group_idx)) => {
                match (slots[group_idx * 2], slots[group_idx * 2 + 1]) {
                    (Some(gs), Some(ge)) if gs <= ge => {
                        let group_len = ge - gs;
                        if pos + group_len <= chars.len()
                            && chars[gs..ge] == chars[pos..pos + group_len]
                        {
                            pos += group_len;
                            pc += 1;
                            true
                        } else {
                            false
                        }
                    }
                    _ => false,
                }
            }
            Some(Inst::Nop) => {
                pc += 1;
                true
            }
        };
        if advanced {
            continue;
        }

        let Some(branch) = backtrack.pop() else {
            return false;
        };
        for (slot, old_val) in undo_log.drain(branch.undo_mark..).rev() {
            slots[slot] = old_val;
        }
        pc = branch.pc;
        pos = branch.pos;
    }
}
