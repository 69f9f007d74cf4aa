//! An interpreter for [`super::bytecode`].

use std::{collections::VecDeque, mem};

use regex_syntax::hir::Look;

use super::CompiledMatcher;
use super::bytecode::{Bytecode, Instruction::*};
use crate::util::{Char, Input, Span, find_prev_char};

/// A so-called PikeVM.
///
/// This is an interpreter for the bytecode. It holds no mutable state, so a
/// single instance can serve any number of threads.
#[derive(Debug)]
pub struct PikeVM {
    bytecode: Bytecode,
    group_count: usize,
}

/// A thread currently alive in the bytecode.
#[derive(Debug)]
struct Thread {
    pc: usize,
    capture_offset: usize,
}

impl Thread {
    fn write_reg(&self, reg: usize, value: usize, state: &mut State) {
        if reg / 2 >= state.result_len {
            return;
        }
        let offset = self.capture_offset + reg / 2;
        if reg % 2 == 0 {
            state.cg_arrays[offset].from = value;
        } else {
            state.cg_arrays[offset].to = value;
        }
    }

    fn free(self, state: &mut State) {
        state.cg_free.push(self.capture_offset);
    }

    fn dup(&self, state: &mut State) -> Self {
        let capture_offset = state.alloc_array();
        state.cg_arrays.copy_within(
            self.capture_offset..(self.capture_offset + state.result_len),
            capture_offset,
        );
        Thread {
            pc: self.pc,
            capture_offset,
        }
    }

    fn with_pc(mut self, pc: usize) -> Self {
        self.pc = pc;
        self
    }
}

/// Per-execution state.
///
/// The capture arrays of all threads live in `cg_arrays`, in slices of
/// `result_len` spans. `cg_free[0]` is the end of the used area and the
/// rest of `cg_free` lists released slices.
struct State {
    active: VecDeque<Thread>,
    next: VecDeque<Thread>,
    input_pos: usize,
    visited: Box<[usize]>,
    cg_free: Vec<usize>,
    cg_arrays: Vec<Span>,
    best_match: Option<Thread>,
    result_len: usize,
}

impl State {
    fn new(state_count: usize, result_len: usize, input_pos: usize) -> Self {
        Self {
            active: VecDeque::with_capacity(state_count),
            next: VecDeque::with_capacity(state_count),
            input_pos,
            visited: vec![0; state_count].into_boxed_slice(),
            cg_free: vec![0],
            cg_arrays: Vec::with_capacity(state_count * result_len),
            best_match: None,
            result_len,
        }
    }

    fn new_thread(&mut self, pc: usize) -> Thread {
        let capture_offset = self.alloc_array();
        self.cg_arrays[capture_offset..(capture_offset + self.result_len)].fill(Span::invalid());
        Thread { pc, capture_offset }
    }

    fn alloc_array(&mut self) -> usize {
        if self.cg_free.len() == 1 {
            let top = self.cg_free[0];
            let end = top + self.result_len;
            self.cg_free[0] = end;
            if self.cg_arrays.len() < end {
                self.cg_arrays.resize(end, Span::invalid());
            }
            top
        } else {
            self.cg_free.pop().unwrap_or_default()
        }
    }

    fn accept(&mut self, thread: Thread) {
        thread.write_reg(1, self.input_pos, self);
        if let Some(prev) = self.best_match.replace(thread) {
            prev.free(self);
        }
        let active = mem::take(&mut self.active);
        for thread in active {
            thread.free(self);
        }
    }

    fn push_active(&mut self, thread: Thread) {
        self.active.push_front(thread);
    }

    /// Pop the active queue until a thread whose pc was not visited already
    /// at this position is found, and returns it.
    fn pop_active_until_not_visited(&mut self) -> Option<Thread> {
        while let Some(thread) = self.active.pop_front() {
            if self.visit(thread.pc) {
                return Some(thread);
            }
            thread.free(self);
        }
        None
    }

    /// Mark `pc` as visited at the current position. Returns false if it
    /// already was.
    fn visit(&mut self, pc: usize) -> bool {
        let value = &mut self.visited[pc];
        if *value <= self.input_pos {
            *value = self.input_pos + 1;
            true
        } else {
            false
        }
    }

    fn push_next(&mut self, thread: Thread) {
        self.next.push_back(thread);
    }

    fn swap_and_advance_by(&mut self, step: usize) {
        self.input_pos += step;
        mem::swap(&mut self.active, &mut self.next);
    }

    fn write_best_match(&mut self, result: &mut [Span]) -> bool {
        let Some(winning_thread) = self.best_match.take() else {
            return false;
        };
        let len = self.result_len.min(result.len());
        let bounds = winning_thread.capture_offset..(winning_thread.capture_offset + len);
        result[..len].copy_from_slice(&self.cg_arrays[bounds]);
        true
    }

    /// Start a new lowest-priority thread at the current position.
    fn spawn(&mut self, at: usize) {
        let thread = self.new_thread(0);
        thread.write_reg(0, at, self);
        self.push_next(thread);
    }
}

fn assertion_holds(look: Look, prev: Char, c: Char) -> bool {
    let lf: Char = '\n'.into();
    let cr: Char = '\r'.into();
    match look {
        Look::Start => prev == Char::INPUT_BOUND,
        Look::End => c == Char::INPUT_BOUND,
        Look::StartLF => prev == Char::INPUT_BOUND || prev == lf,
        Look::EndLF => c == Char::INPUT_BOUND || c == lf,
        Look::StartCRLF => {
            prev == Char::INPUT_BOUND || prev == lf || (prev == cr && c != lf)
        }
        Look::EndCRLF => c == Char::INPUT_BOUND || c == cr || (c == lf && prev != cr),
        // Refused by the bytecode compiler
        _ => false,
    }
}

impl PikeVM {
    pub fn new(bytecode: Bytecode, group_count: usize) -> Self {
        Self {
            bytecode,
            group_count,
        }
    }

    pub fn state_count(&self) -> usize {
        self.bytecode.instructions.len()
    }

    /// Do one step of simulation, meaning stepping through all threads in the
    /// active queue and simulating them until they either die, or successfully consumed
    /// a character.
    fn step(&self, state: &mut State, prev: Char, c: Char) {
        let bytecode = self.bytecode.instructions.as_slice();
        'next_active: while let Some(mut thread) = state.pop_active_until_not_visited() {
            loop {
                match &bytecode[thread.pc] {
                    Consume(c2) if *c2 == c => {
                        thread.pc += 1;
                        state.push_next(thread);
                        break;
                    }
                    ConsumeClass(class) => {
                        for (start, end) in class.iter() {
                            if c < *start {
                                break;
                            } else if c > *end {
                                continue;
                            }
                            thread.pc += 1;
                            state.push_next(thread);
                            continue 'next_active;
                        }
                        thread.free(state);
                        break;
                    }
                    Fork2(a, b) => {
                        let new_thread = thread.dup(state).with_pc(*b);
                        state.push_active(new_thread);
                        thread.pc = *a;
                    }
                    ForkN(branches) => {
                        for pc in branches.iter().skip(1).rev() {
                            let new_thread = thread.dup(state).with_pc(*pc);
                            state.push_active(new_thread);
                        }
                        thread.pc = branches[0];
                    }
                    Jmp(target) => {
                        thread.pc = *target;
                    }
                    WriteReg(r) => {
                        thread.write_reg(*r as usize, state.input_pos, state);
                        thread.pc += 1;
                    }
                    Accept => {
                        state.accept(thread);
                        break;
                    }
                    Assertion(look) => {
                        if assertion_holds(*look, prev, c) {
                            thread.pc += 1;
                        } else {
                            thread.free(state);
                            break;
                        }
                    }
                    Consume(_) => {
                        thread.free(state);
                        break;
                    }
                }
                // Only epsilon transitions get here
                if !state.visit(thread.pc) {
                    thread.free(state);
                    continue 'next_active;
                }
            }
        }
    }
}

impl CompiledMatcher for PikeVM {
    fn group_count(&self) -> usize {
        self.group_count
    }

    fn exec(&self, input: &Input<'_>, captures: &mut [Span]) -> bool {
        if !input.valid() {
            return false;
        }
        let Input {
            subject,
            from,
            anchored,
            first_match,
        } = *input;

        // Group 0 is always tracked, it is the match itself.
        let result_len = captures.len().clamp(1, self.group_count);
        let mut state = State::new(self.state_count(), result_len, from);

        let mut prev_char = find_prev_char(subject, from);
        let first_thread = state.new_thread(0);
        first_thread.write_reg(0, from, &mut state);
        state.push_active(first_thread);

        for c in subject[from..].chars() {
            self.step(&mut state, prev_char, c.into());
            prev_char = c.into();
            let step = c.len_utf8();
            match &state.best_match {
                Some(_) if first_match || state.next.is_empty() => {
                    return state.write_best_match(captures);
                }
                Some(_) => state.swap_and_advance_by(step),
                None if anchored && state.next.is_empty() => return false,
                None => {
                    if !anchored {
                        let at = state.input_pos + step;
                        state.spawn(at);
                    }
                    state.swap_and_advance_by(step);
                }
            }
        }

        self.step(&mut state, prev_char, Char::INPUT_BOUND);
        state.write_best_match(captures)
    }
}
