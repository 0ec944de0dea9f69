//! Instruction breakpoints and memory watchpoints.
//!
//! The machine's bus consults the table only when it is non-empty, so an
//! unused table costs one branch per cycle.

use crate::core::HookAction;

/// What a breakpoint matches on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BreakKind {
    /// Instruction boundary at a matching PC.
    Instruction,
    /// CPU read cycle from a matching address.
    Read,
    /// CPU write cycle to a matching address.
    Write,
}

/// Called with the matching PC or address.
pub type BreakpointHandler = Box<dyn FnMut(u16) -> HookAction>;

/// Handle returned by [`Breakpoints::add`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BreakpointId(u32);

struct Entry {
    id: BreakpointId,
    kind: BreakKind,
    address: u16,
    mask: u16,
    one_shot: bool,
    handler: BreakpointHandler,
}

impl Entry {
    #[inline]
    fn matches(&self, kind: BreakKind, address: u16) -> bool {
        self.kind == kind && (address & self.mask) == (self.address & self.mask)
    }
}

#[derive(Default)]
pub struct Breakpoints {
    entries: Vec<Entry>,
    next_id: u32,
}

impl Breakpoints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler. `mask` selects the address bits that must match;
    /// 0xFFFF matches one address. One-shot entries are removed after their
    /// first hit.
    pub fn add(
        &mut self,
        kind: BreakKind,
        address: u16,
        mask: u16,
        one_shot: bool,
        handler: BreakpointHandler,
    ) -> BreakpointId {
        let id = BreakpointId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.entries.push(Entry {
            id,
            kind,
            address,
            mask,
            one_shot,
            handler,
        });
        id
    }

    /// Stop at `pc` every time it is reached.
    pub fn add_instruction(&mut self, pc: u16, handler: BreakpointHandler) -> BreakpointId {
        self.add(BreakKind::Instruction, pc, 0xFFFF, false, handler)
    }

    pub fn remove(&mut self, id: BreakpointId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn on_instruction(&mut self, pc: u16) -> HookAction {
        self.fire(BreakKind::Instruction, pc)
    }

    pub fn on_read(&mut self, address: u16) -> HookAction {
        self.fire(BreakKind::Read, address)
    }

    pub fn on_write(&mut self, address: u16) -> HookAction {
        self.fire(BreakKind::Write, address)
    }

    /// Run every matching handler. Stop wins if any handler asks for it.
    fn fire(&mut self, kind: BreakKind, address: u16) -> HookAction {
        let mut action = HookAction::Continue;
        let mut spent = false;
        for entry in self.entries.iter_mut().filter(|e| e.matches(kind, address)) {
            if (entry.handler)(address) == HookAction::Stop {
                action = HookAction::Stop;
            }
            spent |= entry.one_shot;
        }
        if spent {
            self.entries
                .retain(|e| !(e.one_shot && e.matches(kind, address)));
        }
        action
    }
}

impl std::fmt::Debug for Breakpoints {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|e| (e.kind, e.address, e.mask)))
            .finish()
    }
}
