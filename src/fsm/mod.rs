//! Function-pointer finite state machine engine.
//!
//! Drives the water-jet process controller:
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │  StateTable                                     │
//! │  ┌──────────────┬──────────┬──────────────────┐ │
//! │  │ StateId      │ on_enter │ on_update        │ │
//! │  ├──────────────┼──────────┼──────────────────┤ │
//! │  │ None         │ fn(ctx)  │ fn(ctx)->Option<>│ │
//! │  │ Menu         │ fn(ctx)  │ fn(ctx)->Option<>│ │
//! │  │ …            │          │                  │ │
//! │  │ Invalid      │ fn(ctx)  │ fn(ctx)->Option<>│ │
//! │  └──────────────┴──────────┴──────────────────┘ │
//! └─────────────────────────────────────────────────┘
//! ```
//!
//! Each tick the engine calls `on_update` for the **current** state.
//! If it returns `Some(next_id)` and `next_id` differs from the current
//! state, the engine moves the current pointer and runs `on_enter` for the
//! next state.  A transition to the
//! same state is a no-op.  All functions receive `&mut JetContext`.

pub mod context;
pub mod states;

use context::JetContext;
use log::info;

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Every water-jet process state.  Discriminants are the raw values the
/// menu `state <n>` action sends.
/// Must stay in sync with the state table built in [`states::build_state_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StateId {
    None = 0,
    Menu = 1,
    Prep = 2,
    DryRun = 3,
    Ready = 4,
    Running = 5,
    Watching = 6,
    Paused = 7,
    Resuming = 8,
    Ending = 9,
    IdleTooLong = 10,
    WaitFill = 11,
    Dumping = 12,
    FiltersBlocked = 13,
    LevelTooHigh = 14,
    GantryStalled = 15,
    EndstopTriggered = 16,
    Invalid = 17,
}

impl StateId {
    /// Total number of states, used to size the table array.
    pub const COUNT: usize = 18;

    /// Convert a raw value from outside (menu, console) into a state.
    /// Anything out of range maps to [`StateId::Invalid`].
    pub fn from_raw(raw: u8) -> Self {
        Self::from_index(raw as usize)
    }

    /// Convert a table index back to `StateId`; out of range is `Invalid`.
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::None,
            1 => Self::Menu,
            2 => Self::Prep,
            3 => Self::DryRun,
            4 => Self::Ready,
            5 => Self::Running,
            6 => Self::Watching,
            7 => Self::Paused,
            8 => Self::Resuming,
            9 => Self::Ending,
            10 => Self::IdleTooLong,
            11 => Self::WaitFill,
            12 => Self::Dumping,
            13 => Self::FiltersBlocked,
            14 => Self::LevelTooHigh,
            15 => Self::GantryStalled,
            16 => Self::EndstopTriggered,
            _ => Self::Invalid,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Menu => "MENU",
            Self::Prep => "PREP",
            Self::DryRun => "DRY_RUN",
            Self::Ready => "READY",
            Self::Running => "RUNNING",
            Self::Watching => "WATCHING",
            Self::Paused => "PAUSED",
            Self::Resuming => "RESUMING",
            Self::Ending => "ENDING",
            Self::IdleTooLong => "IDLE_TOO_LONG",
            Self::WaitFill => "WAIT_FILL",
            Self::Dumping => "DUMPING",
            Self::FiltersBlocked => "FILTERS_BLOCKED",
            Self::LevelTooHigh => "LEVEL_TOO_HIGH",
            Self::GantryStalled => "GANTRY_STALLED",
            Self::EndstopTriggered => "ENDSTOP_TRIGGERED",
            Self::Invalid => "INVALID",
        }
    }

    /// States between job start and job end, faults included.
    pub fn in_job(self) -> bool {
        !matches!(
            self,
            Self::None
                | Self::Menu
                | Self::Prep
                | Self::DryRun
                | Self::Ready
                | Self::Ending
                | Self::Invalid
        )
    }

    /// States in which the level interlock escalates faults.
    pub fn escalates_faults(self) -> bool {
        matches!(
            self,
            Self::Watching
                | Self::Dumping
                | Self::IdleTooLong
                | Self::WaitFill
                | Self::FiltersBlocked
                | Self::LevelTooHigh
        )
    }
}

impl core::fmt::Display for StateId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter` actions.
/// These run exactly once on each state transition.
pub type StateActionFn = fn(&mut JetContext);

/// Signature for the per-tick update handler.
/// Returns `Some(next)` to trigger a transition, or `None` to stay.
pub type StateUpdateFn = fn(&mut JetContext) -> Option<StateId>;

// ---------------------------------------------------------------------------
// State descriptor (one row in the table)
// ---------------------------------------------------------------------------

/// Static descriptor for a single FSM state.
pub struct StateDescriptor {
    pub id: StateId,
    pub name: &'static str,
    pub on_enter: Option<StateActionFn>,
    pub on_update: StateUpdateFn,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

/// A completed transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: StateId,
    pub to: StateId,
}

/// The finite state machine engine.
pub struct Fsm {
    /// Fixed-size table indexed by `StateId as usize`.
    table: [StateDescriptor; StateId::COUNT],
    current: usize,
    previous: usize,
}

impl Fsm {
    /// Construct a new FSM with the given state table, starting in `initial`.
    pub fn new(table: [StateDescriptor; StateId::COUNT], initial: StateId) -> Self {
        Self {
            table,
            current: initial as usize,
            previous: initial as usize,
        }
    }

    /// Run the initial `on_enter` for the starting state.
    /// Call once after construction, before the first `tick()`.
    pub fn start(&mut self, ctx: &mut JetContext) {
        info!("FSM starting in state: {}", self.table[self.current].name);
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }

    /// Advance the FSM by one tick.
    ///
    /// 1. Call `on_update` for the current state.
    /// 2. If it returns a different state, update the pointer and run
    ///    `on_enter(next)`.
    pub fn tick(&mut self, ctx: &mut JetContext) -> Option<Transition> {
        let next = (self.table[self.current].on_update)(ctx)?;
        self.force_transition(next, ctx)
    }

    /// Jump to `next` regardless of what `on_update` would return (external
    /// commands).  Same state is a no-op.
    pub fn force_transition(&mut self, next: StateId, ctx: &mut JetContext) -> Option<Transition> {
        if next as usize == self.current {
            return None;
        }
        Some(self.transition(next, ctx))
    }

    /// The current state's identity.
    pub fn current_state(&self) -> StateId {
        StateId::from_index(self.current)
    }

    /// The state before the last transition.
    pub fn previous_state(&self) -> StateId {
        StateId::from_index(self.previous)
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn transition(&mut self, next_id: StateId, ctx: &mut JetContext) -> Transition {
        let next_idx = next_id as usize;
        let from = self.current_state();

        info!(
            "FSM transition: {} -> {}",
            self.table[self.current].name, self.table[next_idx].name
        );

        self.previous = self.current;
        self.current = next_idx;

        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }

        Transition { from, to: next_id }
    }
}
