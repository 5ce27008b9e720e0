//! Wrap constraints and the alignment stack.
//!
//! An alignment frame is opened around every list-like construct (argument
//! lists, parameter lists, operator chains). It records where breaking is
//! allowed, which fragments have been forced onto their own line so far,
//! and the rollback point to retry from. Frames form a strict stack; the
//! innermost frame belongs to the construct currently being emitted.
//!
//! Breaking is resolved in two separate steps. [`AlignmentFrame::can_break`]
//! is a pure eligibility check; [`AlignmentStack::mark_break`] mutates only
//! the frame the overflow scan chose. The scan itself
//! ([`AlignmentStack::choose_break`]) runs three phases: innermost-first
//! over frames that prefer inner breaks, then outermost-first over frames
//! that prefer outer breaks, then innermost-first unconditionally. If no
//! frame is eligible the overflow is accepted as-is.

use bitflags::bitflags;
use smallvec::{smallvec, SmallVec};

use crate::scribe::Checkpoint;

/// Layout applied to a frame's fragments once it breaks.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WrapMode {
    /// Keep fragments inline; break only where overflow forced a mark.
    CompactSplit,
    /// The first break commits every later fragment to its own line.
    OnePerLine,
    /// Like `CompactSplit`, with wrapped lines shifted one extra indent
    /// unit so they read apart from the following block.
    NextLineShifted,
    /// Column-fill layout; marks accumulate like `CompactSplit` but
    /// wrapped fragments anchor at the column where the frame opened,
    /// directly under the first fragment.
    MultiColumn,
}

bitflags! {
    /// Indentation variants for wrapped fragments.
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct AlignFlags: u8 {
        /// Indent wrapped fragments to the column where the frame opened.
        const INDENT_ON_COLUMN = 1 << 0;
        /// Indent wrapped fragments by exactly one unit past the anchor
        /// statement, ignoring the continuation indent.
        const INDENT_BY_ONE = 1 << 1;
    }
}

/// Which end of the stack a frame prefers to see broken first when a line
/// overflows inside it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TieBreak {
    Innermost,
    Outermost,
}

/// Everything needed to open an alignment frame.
#[derive(Copy, Clone, Debug)]
pub(crate) struct AlignSpec {
    pub name: &'static str,
    pub mode: WrapMode,
    pub flags: AlignFlags,
    pub tie_break: TieBreak,
    pub fragment_count: usize,
}

#[derive(Debug)]
pub(crate) struct AlignmentFrame {
    pub mode: WrapMode,
    pub tie_break: TieBreak,
    /// Fragment currently being emitted.
    current: usize,
    /// Index the next `begin_fragment` call hands out.
    next: usize,
    broken: SmallVec<[bool; 8]>,
    pub was_broken: bool,
    /// Indentation column for wrapped fragments.
    pub break_indent: u32,
    /// Indentation column to restore when the frame closes.
    pub entry_indent: u32,
    /// Rollback point at frame creation; retries restart here.
    pub checkpoint: Checkpoint,
}

impl AlignmentFrame {
    pub fn new(
        spec: &AlignSpec,
        break_indent: u32,
        entry_indent: u32,
        checkpoint: Checkpoint,
    ) -> Self {
        AlignmentFrame {
            mode: spec.mode,
            tie_break: spec.tie_break,
            current: 0,
            next: 0,
            broken: smallvec![false; spec.fragment_count],
            was_broken: false,
            break_indent,
            entry_indent,
            checkpoint,
        }
    }

    /// Advance to the next fragment and return its index.
    pub fn begin_fragment(&mut self) -> usize {
        self.current = self.next;
        self.next += 1;
        self.current
    }

    /// Does fragment `index` start on its own line in the current attempt?
    pub fn is_broken(&self, index: usize) -> bool {
        match self.mode {
            WrapMode::OnePerLine => self.was_broken && index > 0,
            _ => self.broken.get(index).copied().unwrap_or(false),
        }
    }

    /// Pure eligibility: could this frame absorb a break right now?
    /// Breaking before the first fragment is never useful.
    pub fn can_break(&self) -> bool {
        match self.mode {
            WrapMode::OnePerLine => !self.was_broken,
            _ => {
                self.current > 0
                    && self.next > 0
                    && !self.broken.get(self.current).copied().unwrap_or(true)
            }
        }
    }

    fn mark_break(&mut self) {
        self.was_broken = true;
        if let Some(slot) = self.broken.get_mut(self.current) {
            *slot = true;
        }
    }

    /// Rewind fragment counters for a retry. Break marks survive; that is
    /// the whole point of retrying.
    pub fn reset_run(&mut self) {
        self.current = 0;
        self.next = 0;
    }
}

/// Strict stack of alignment frames; the last element is innermost.
#[derive(Debug, Default)]
pub(crate) struct AlignmentStack {
    frames: SmallVec<[AlignmentFrame; 4]>,
}

impl AlignmentStack {
    pub fn new() -> Self {
        AlignmentStack::default()
    }

    pub fn push(&mut self, frame: AlignmentFrame) {
        self.frames.push(frame);
    }

    pub fn pop(&mut self) -> Option<AlignmentFrame> {
        self.frames.pop()
    }

    pub fn innermost(&self) -> Option<&AlignmentFrame> {
        self.frames.last()
    }

    pub fn innermost_mut(&mut self) -> Option<&mut AlignmentFrame> {
        self.frames.last_mut()
    }

    /// The three-phase overflow scan. Returns the relative depth (0 =
    /// innermost) of the frame that should take the break, or `None` when
    /// the overflow has to be accepted.
    pub fn choose_break(&self) -> Option<usize> {
        // Innermost-first over frames that prefer inner breaks.
        for (rel, frame) in self.frames.iter().rev().enumerate() {
            if frame.tie_break == TieBreak::Innermost && frame.can_break() {
                return Some(rel);
            }
        }
        // Outermost-first over frames that prefer outer breaks.
        for (rel, frame) in self.frames.iter().rev().enumerate().rev() {
            if frame.tie_break == TieBreak::Outermost && frame.can_break() {
                return Some(rel);
            }
        }
        // Last resort: any frame, innermost wins.
        for (rel, frame) in self.frames.iter().rev().enumerate() {
            if frame.can_break() {
                return Some(rel);
            }
        }
        None
    }

    /// Mark the break on the chosen frame only.
    pub fn mark_break(&mut self, relative_depth: usize) {
        let index = self.frames.len() - 1 - relative_depth;
        if let Some(frame) = self.frames.get_mut(index) {
            frame.mark_break();
        }
    }
}
