//! Function-pointer finite state machine engine for the boot sequence.
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  StateTable                                                       │
//! │  ┌────────────────────┬───────────┬──────────┬───────────────────┐│
//! │  │ StateId            │ on_enter  │ on_exit  │ on_update         ││
//! │  ├────────────────────┼───────────┼──────────┼───────────────────┤│
//! │  │ LoadingCredentials │ fn(ctx)   │ -        │ fn(ctx)->Option<> ││
//! │  │ Provisioning       │ fn(ctx)   │ fn(ctx)  │ fn(ctx)->Option<> ││
//! │  │ Connecting         │ fn(ctx)   │ -        │ fn(ctx)->Option<> ││
//! │  │ Synchronizing      │ fn(ctx)   │ -        │ fn(ctx)->Option<> ││
//! │  │ Steady             │ fn(ctx)   │ -        │ fn(ctx)->Option<> ││
//! │  │ RestartDevice      │ fn(ctx)   │ -        │ fn(ctx)->Option<> ││
//! │  └────────────────────┴───────────┴──────────┴───────────────────┘│
//! └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each tick the engine calls `on_update` for the **current** state.
//! If it returns `Some(next_id)`, the engine runs `on_exit` for the
//! current state, then `on_enter` for the next, and updates the
//! current pointer. All functions receive `&mut BootContext` which
//! carries the ports, the credential store, config and attempt counters.
//!
//! `Steady` and `RestartDevice` are terminal: [`run_boot`] stops ticking
//! once either is reached.

pub mod context;
pub mod states;

use core::fmt;

use context::BootContext;
use log::info;

use crate::app::events::AppEvent;
use crate::credentials::Credentials;

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Enumeration of all boot states.
/// Must stay in sync with the state table built in [`states::build_state_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StateId {
    LoadingCredentials = 0,
    Provisioning = 1,
    Connecting = 2,
    Synchronizing = 3,
    Steady = 4,
    RestartDevice = 5,
}

impl StateId {
    /// Total number of states, used to size the table array.
    pub const COUNT: usize = 6;

    /// Convert an index back to `StateId`. Out of range maps to
    /// `RestartDevice` in release builds.
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::LoadingCredentials,
            1 => Self::Provisioning,
            2 => Self::Connecting,
            3 => Self::Synchronizing,
            4 => Self::Steady,
            5 => Self::RestartDevice,
            _ => {
                debug_assert!(false, "invalid state index: {idx}");
                Self::RestartDevice
            }
        }
    }

    /// The boot sequence ends here.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Steady | Self::RestartDevice)
    }
}

// ---------------------------------------------------------------------------
// Restart reasons
// ---------------------------------------------------------------------------

/// Why the device is about to cold-restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartReason {
    /// New credentials were saved; restart to apply them.
    Reconfigured,
    /// Every boot connect attempt failed.
    ConnectExhausted,
    /// Setup mode closed without a submission.
    ProvisioningTimedOut,
    /// The access point or portal socket could not be brought up.
    PortalUnavailable,
    /// The steady-state loop hit its consecutive-failure threshold.
    ErrorThreshold,
}

impl fmt::Display for RestartReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reconfigured => write!(f, "credentials reconfigured"),
            Self::ConnectExhausted => write!(f, "connect attempts exhausted"),
            Self::ProvisioningTimedOut => write!(f, "setup mode timed out"),
            Self::PortalUnavailable => write!(f, "setup portal unavailable"),
            Self::ErrorThreshold => write!(f, "too many consecutive errors"),
        }
    }
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter` and `on_exit` actions.
/// These run exactly once on each state transition.
pub type StateActionFn = fn(&mut BootContext<'_>);

/// Signature for the per-tick update handler.
/// Returns `Some(next)` to trigger a transition, or `None` to stay.
pub type StateUpdateFn = fn(&mut BootContext<'_>) -> Option<StateId>;

// ---------------------------------------------------------------------------
// State descriptor (one row in the table)
// ---------------------------------------------------------------------------

/// Static descriptor for a single FSM state.
pub struct StateDescriptor {
    pub id: StateId,
    pub name: &'static str,
    pub on_enter: Option<StateActionFn>,
    pub on_exit: Option<StateActionFn>,
    pub on_update: StateUpdateFn,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

/// The finite state machine engine.
pub struct Fsm {
    /// Fixed-size table indexed by `StateId as usize`.
    table: [StateDescriptor; StateId::COUNT],
    current: usize,
}

impl Fsm {
    pub fn new(table: [StateDescriptor; StateId::COUNT], initial: StateId) -> Self {
        Self {
            table,
            current: initial as usize,
        }
    }

    /// Run the initial `on_enter` for the starting state.
    /// Call once after construction, before the first `tick()`.
    pub fn start(&mut self, ctx: &mut BootContext<'_>) {
        info!("FSM starting in state: {}", self.table[self.current].name);
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }

    /// Advance the FSM by one tick.
    pub fn tick(&mut self, ctx: &mut BootContext<'_>) {
        let next = (self.table[self.current].on_update)(ctx);

        if let Some(next_id) = next {
            self.transition(next_id, ctx);
        }
    }

    pub fn current_state(&self) -> StateId {
        StateId::from_index(self.current)
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn transition(&mut self, next_id: StateId, ctx: &mut BootContext<'_>) {
        let next_idx = next_id as usize;
        let from = self.current_state();

        info!(
            "FSM transition: {} -> {}",
            self.table[self.current].name, self.table[next_idx].name
        );

        if let Some(exit) = self.table[self.current].on_exit {
            exit(ctx);
        }

        self.current = next_idx;

        ctx.ports
            .events
            .emit(&AppEvent::BootStateChanged { from, to: next_id });

        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }
}

// ---------------------------------------------------------------------------
// Boot runner
// ---------------------------------------------------------------------------

/// How the boot sequence ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootOutcome {
    /// Associated and clock sync attempted; hand over to the poll loop.
    Online(Credentials),
    /// The restart primitive was invoked. On hardware this is never
    /// observed because the restart does not return.
    Restarted(RestartReason),
}

/// Drive the boot FSM from `LoadingCredentials` to a terminal state.
pub fn run_boot(ctx: &mut BootContext<'_>) -> BootOutcome {
    let mut fsm = Fsm::new(states::build_state_table(), StateId::LoadingCredentials);
    fsm.start(ctx);

    while !fsm.current_state().is_terminal() {
        fsm.tick(ctx);
    }

    match (fsm.current_state(), ctx.credentials.take()) {
        (StateId::Steady, Some(credentials)) => BootOutcome::Online(credentials),
        _ => BootOutcome::Restarted(
            ctx.restart_reason
                .unwrap_or(RestartReason::ConnectExhausted),
        ),
    }
}
