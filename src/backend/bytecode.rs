//! A Thompson NFA represented in a bytecode format.
//!
//! [`Instruction`] is a bytecode whose programs are linearly proportional
//! in size to the pattern, except for counted repetitions, which are
//! unrolled. Unrolling is bounded by the quantifier limits of the options;
//! a pattern beyond them, or using an assertion the VM cannot evaluate, is
//! refused with a [`CompileError`].
use std::{error::Error, fmt};

use regex_syntax::hir::{Capture, Class, Hir, HirKind, Literal, Look, Repetition};

use crate::options::Options;
use crate::util::Char;

/// Bytecode
#[derive(Debug, Clone)]
pub enum Instruction {
    Consume(Char),
    ConsumeClass(Box<[(Char, Char)]>),
    Fork2(usize, usize),
    ForkN(Box<[usize]>),
    Jmp(usize),
    WriteReg(u32),
    Assertion(Look),
    Accept,
}

use Instruction::*;

/// Constructs the native backend does not handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    UnsupportedAssertion(Look),
    UnrollLimitExceeded { count: u32, limit: u16 },
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::UnsupportedAssertion(look) => {
                write!(f, "assertion {look:?} is not supported by the native backend")
            }
            CompileError::UnrollLimitExceeded { count, limit } => {
                write!(f, "counted repetition of {count} exceeds the unroll limit of {limit}")
            }
        }
    }
}

impl Error for CompileError {}

/// Quantifier unrolling limits.
#[derive(Debug, Clone, Copy)]
pub struct Limits {
    /// For repetitions of a single literal character or class.
    pub single_cc: u16,
    /// For any other repetition.
    pub group: u16,
}

impl From<&Options> for Limits {
    fn from(options: &Options) -> Self {
        Self {
            single_cc: options.quantifier_unroll_limit_single_cc(),
            group: options.quantifier_unroll_limit_group(),
        }
    }
}

#[derive(Debug, Default)]
pub struct Bytecode {
    pub instructions: Vec<Instruction>,
}

/// A compiler from [`regex_syntax::hir::Hir`] to
/// this bytecode representation.
#[derive(Debug)]
pub struct Compiler {
    bytecode: Bytecode,
    limits: Limits,
}

fn is_single_char(hir: &Hir) -> bool {
    match hir.kind() {
        HirKind::Class(_) => true,
        HirKind::Literal(Literal(bytes)) => {
            std::str::from_utf8(bytes).is_ok_and(|s| s.chars().count() == 1)
        }
        _ => false,
    }
}

impl Compiler {
    /// Try to compile a regex in [`regex_syntax::hir::Hir`] form to
    /// this bytecode. The hir must be UTF-8.
    pub fn compile(hir: Hir, limits: Limits) -> Result<Bytecode, CompileError> {
        let mut compiler = Compiler {
            bytecode: Bytecode::default(),
            limits,
        };
        compiler.compile_internal(hir)?;
        compiler.push(Accept);
        Ok(compiler.bytecode)
    }

    fn current_pc(&self) -> usize {
        self.bytecode.instructions.len()
    }

    fn push(&mut self, instruction: Instruction) {
        self.bytecode.instructions.push(instruction);
    }

    fn fork2(a: usize, b: usize, greedy: bool) -> Instruction {
        if greedy { Fork2(a, b) } else { Fork2(b, a) }
    }

    fn check_unroll(&self, min: u32, max: Option<u32>, sub: &Hir) -> Result<(), CompileError> {
        let count = max.unwrap_or(min);
        if count <= 1 {
            return Ok(());
        }
        let limit = if is_single_char(sub) {
            self.limits.single_cc
        } else {
            self.limits.group
        };
        if count > u32::from(limit) {
            return Err(CompileError::UnrollLimitExceeded { count, limit });
        }
        Ok(())
    }

    fn compile_internal(&mut self, hir: Hir) -> Result<(), CompileError> {
        match hir.into_kind() {
            HirKind::Empty => (),
            HirKind::Literal(Literal(bytes)) => {
                // Only called on UTF-8 hirs
                for c in String::from_utf8_lossy(&bytes).chars() {
                    self.push(Consume(c.into()));
                }
            }
            HirKind::Class(class) => {
                let class = match class {
                    Class::Unicode(class_unicode) => class_unicode
                        .iter()
                        .map(|c| (c.start().into(), c.end().into()))
                        .collect::<Box<[_]>>(),
                    Class::Bytes(class_byte) => class_byte
                        .iter()
                        .map(|c| (c.start().into(), c.end().into()))
                        .collect::<Box<[_]>>(),
                };
                self.push(ConsumeClass(class));
            }
            HirKind::Look(look) => match look {
                Look::Start
                | Look::End
                | Look::StartLF
                | Look::EndLF
                | Look::StartCRLF
                | Look::EndCRLF => self.push(Assertion(look)),
                other => return Err(CompileError::UnsupportedAssertion(other)),
            },
            HirKind::Repetition(Repetition {
                min,
                max,
                greedy,
                sub,
            }) => {
                self.check_unroll(min, max, &sub)?;
                let mut last_iter_start = None;
                for i in 0..min {
                    if i == min - 1 {
                        last_iter_start = Some(self.current_pc());
                    }
                    self.compile_internal(*sub.clone())?;
                }
                match max {
                    Some(max) => {
                        let diff = (max - min) as usize;
                        let mut forks_pc = Vec::with_capacity(diff);
                        for _ in min..max {
                            forks_pc.push(self.current_pc());
                            self.push(Fork2(0, 0));
                            self.compile_internal(*sub.clone())?;
                        }
                        let end_pc = self.current_pc();
                        for fork_pc in forks_pc {
                            self.bytecode.instructions[fork_pc] =
                                Self::fork2(fork_pc + 1, end_pc, greedy);
                        }
                    }
                    None => match last_iter_start {
                        Some(last_iter_start) => {
                            self.push(Self::fork2(last_iter_start, self.current_pc() + 1, greedy));
                        }
                        None => {
                            let fork_pc = self.current_pc();
                            self.push(Fork2(0, 0));
                            self.compile_internal(*sub)?;
                            self.push(Jmp(fork_pc));
                            self.bytecode.instructions[fork_pc] =
                                Self::fork2(fork_pc + 1, self.current_pc(), greedy);
                        }
                    },
                }
            }
            HirKind::Capture(Capture { index, sub, .. }) => {
                self.push(WriteReg(index * 2));
                self.compile_internal(*sub)?;
                self.push(WriteReg(index * 2 + 1));
            }
            HirKind::Concat(hirs) => {
                for hir in hirs {
                    self.compile_internal(hir)?;
                }
            }
            // regex-syntax calls e1|e2|e3 an alternation and e1e2e3 a
            // concatenation.
            HirKind::Alternation(hirs) => {
                let length = hirs.len();
                let mut fork_targets = Vec::with_capacity(length);
                let mut jmps = Vec::with_capacity(length - 1);
                let fork_pc = self.current_pc();
                // Patched once the branch targets are known
                self.push(Jmp(0));
                for (i, hir) in hirs.into_iter().enumerate() {
                    fork_targets.push(self.current_pc());
                    self.compile_internal(hir)?;
                    if i < length - 1 {
                        jmps.push(self.current_pc());
                        self.push(Jmp(0));
                    }
                }
                self.bytecode.instructions[fork_pc] = ForkN(fork_targets.into_boxed_slice());
                let end_pc = self.current_pc();
                for pc in jmps {
                    self.bytecode.instructions[pc] = Jmp(end_pc);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use regex_syntax::Parser;

    use super::*;

    fn compile(pattern: &str, limits: Limits) -> Result<Bytecode, CompileError> {
        Compiler::compile(Parser::new().parse(pattern).unwrap(), limits)
    }

    const LIMITS: Limits = Limits {
        single_cc: 20,
        group: 5,
    };

    #[test]
    fn unroll_limits() {
        assert!(compile(r"\d{20}", LIMITS).is_ok());
        assert_eq!(
            compile(r"\d{21}", LIMITS).unwrap_err(),
            CompileError::UnrollLimitExceeded {
                count: 21,
                limit: 20
            }
        );
        assert!(compile(r"(ab){5}", LIMITS).is_ok());
        assert!(compile(r"(ab){2,6}", LIMITS).is_err());
        assert!(compile(r"(ab){6,}", LIMITS).is_err());
        assert!(compile(r"(ab)*", LIMITS).is_ok());
    }

    #[test]
    fn word_boundaries_are_refused() {
        assert!(matches!(
            compile(r"\bfoo", LIMITS),
            Err(CompileError::UnsupportedAssertion(_))
        ));
        assert!(compile(r"(?m)^foo$", LIMITS).is_ok());
    }
}
