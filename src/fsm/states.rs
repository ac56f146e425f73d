//! Concrete boot state handlers and table builder.
//!
//! Each state is defined by plain `fn` pointers: no closures, no heap.
//!
//! ```text
//!  LOADING ──[no credentials]──▶ PROVISIONING ──[saved / timeout / portal down]──▶ RESTART
//!     │
//!  [found]
//!     ▼
//!  CONNECTING ──[attempts exhausted]──▶ RESTART
//!     │
//!  [connected]
//!     ▼
//!  SYNCHRONIZING ──[always]──▶ STEADY
//! ```

use log::{info, warn};

use super::context::BootContext;
use super::{RestartReason, StateDescriptor, StateId};
use crate::app::events::AppEvent;
use crate::app::ports::{ConnectOutcome, ProvisionOutcome};
use crate::app::screens;

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

pub fn build_state_table() -> [StateDescriptor; StateId::COUNT] {
    [
        StateDescriptor {
            id: StateId::LoadingCredentials,
            name: "LoadingCredentials",
            on_enter: Some(loading_enter),
            on_exit: None,
            on_update: loading_update,
        },
        StateDescriptor {
            id: StateId::Provisioning,
            name: "Provisioning",
            on_enter: Some(provisioning_enter),
            on_exit: Some(provisioning_exit),
            on_update: provisioning_update,
        },
        StateDescriptor {
            id: StateId::Connecting,
            name: "Connecting",
            on_enter: Some(connecting_enter),
            on_exit: None,
            on_update: connecting_update,
        },
        StateDescriptor {
            id: StateId::Synchronizing,
            name: "Synchronizing",
            on_enter: Some(synchronizing_enter),
            on_exit: None,
            on_update: synchronizing_update,
        },
        StateDescriptor {
            id: StateId::Steady,
            name: "Steady",
            on_enter: Some(steady_enter),
            on_exit: None,
            on_update: idle_update,
        },
        StateDescriptor {
            id: StateId::RestartDevice,
            name: "RestartDevice",
            on_enter: Some(restart_enter),
            on_exit: None,
            on_update: idle_update,
        },
    ]
}

fn idle_update(_ctx: &mut BootContext<'_>) -> Option<StateId> {
    None
}

fn restart_with(ctx: &mut BootContext<'_>, reason: RestartReason) -> Option<StateId> {
    ctx.restart_reason = Some(reason);
    Some(StateId::RestartDevice)
}

// ═══════════════════════════════════════════════════════════════════════════
//  LOADING CREDENTIALS
// ═══════════════════════════════════════════════════════════════════════════

fn loading_enter(ctx: &mut BootContext<'_>) {
    ctx.ports.display.show(&screens::initializing());
}

fn loading_update(ctx: &mut BootContext<'_>) -> Option<StateId> {
    match ctx.store.load() {
        Some(credentials) => {
            info!("BOOT | stored credentials for '{}'", credentials.name);
            ctx.credentials = Some(credentials);
            Some(StateId::Connecting)
        }
        None => {
            info!("BOOT | no stored credentials");
            Some(StateId::Provisioning)
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  PROVISIONING: one blocking tick serves the whole setup window
// ═══════════════════════════════════════════════════════════════════════════

fn provisioning_enter(ctx: &mut BootContext<'_>) {
    info!(
        "BOOT | setup mode on '{}' for {}s",
        ctx.config.ap_name, ctx.config.provisioning_window_secs
    );
}

fn provisioning_update(ctx: &mut BootContext<'_>) -> Option<StateId> {
    let cfg = ctx.config;

    if let Err(e) = ctx.ports.link.start_access_point(&cfg.ap_name, &cfg.ap_secret) {
        warn!("BOOT | access point failed: {}", e);
        ctx.ports.display.show(&screens::setup_unavailable());
        return restart_with(ctx, RestartReason::PortalUnavailable);
    }
    ctx.ports
        .display
        .show(&screens::setup_mode(&cfg.ap_name, &cfg.ap_secret, &cfg.portal_url));

    match ctx.provisioner.provision(&mut *ctx.store, cfg.provisioning_window()) {
        Ok(ProvisionOutcome::Saved(credentials)) => {
            ctx.ports.events.emit(&AppEvent::CredentialsSaved {
                name: credentials.name.clone(),
            });
            ctx.ports.display.show(&screens::setup_saved(&credentials.name));
            ctx.credentials = Some(credentials);
            restart_with(ctx, RestartReason::Reconfigured)
        }
        Ok(ProvisionOutcome::TimedOut) => {
            ctx.ports.events.emit(&AppEvent::ProvisioningTimedOut);
            ctx.ports.display.show(&screens::setup_timeout());
            restart_with(ctx, RestartReason::ProvisioningTimedOut)
        }
        Err(e) => {
            warn!("BOOT | setup portal failed: {}", e);
            ctx.ports.display.show(&screens::setup_unavailable());
            restart_with(ctx, RestartReason::PortalUnavailable)
        }
    }
}

fn provisioning_exit(ctx: &mut BootContext<'_>) {
    ctx.ports.link.stop_access_point();
}

// ═══════════════════════════════════════════════════════════════════════════
//  CONNECTING: one attempt per tick
// ═══════════════════════════════════════════════════════════════════════════

fn connecting_enter(ctx: &mut BootContext<'_>) {
    ctx.attempt = 0;
    ctx.terminal_failures = 0;
    ctx.ports.display.show(&screens::connecting());
}

fn connecting_update(ctx: &mut BootContext<'_>) -> Option<StateId> {
    let Some(credentials) = ctx.credentials.clone() else {
        return Some(StateId::Provisioning);
    };
    let cfg = ctx.config;

    ctx.attempt = ctx.attempt.saturating_add(1);
    let attempt = ctx.attempt;
    info!(
        "BOOT | connect attempt {}/{} to '{}'",
        attempt, cfg.connect_attempts, credentials.name
    );

    let reason = match ctx.ports.link.connect(&credentials) {
        ConnectOutcome::Connected => {
            ctx.ports.events.emit(&AppEvent::Connected { attempt });
            return Some(StateId::Synchronizing);
        }
        ConnectOutcome::Failed(reason) => reason,
    };

    warn!("BOOT | attempt {} failed: {}", attempt, reason);
    ctx.ports
        .events
        .emit(&AppEvent::ConnectAttemptFailed { attempt, reason });
    if reason.is_terminal() {
        ctx.terminal_failures = ctx.terminal_failures.saturating_add(1);
    }

    if attempt < cfg.connect_attempts {
        ctx.ports.display.show(&screens::attempt_failed(attempt));
        ctx.ports
            .clock
            .sleep(core::time::Duration::from_secs(u64::from(cfg.attempt_pause_secs)));
        return None;
    }

    ctx.ports.display.show(&screens::connect_exhausted());
    if cfg.reprovision_on_terminal_failure && ctx.all_failures_terminal() {
        match ctx.store.clear() {
            Ok(()) => info!("BOOT | credentials cleared, next boot enters setup mode"),
            Err(e) => warn!("BOOT | could not clear credentials: {}", e),
        }
    }
    restart_with(ctx, RestartReason::ConnectExhausted)
}

// ═══════════════════════════════════════════════════════════════════════════
//  SYNCHRONIZING: best effort, never fatal
// ═══════════════════════════════════════════════════════════════════════════

fn synchronizing_enter(ctx: &mut BootContext<'_>) {
    ctx.ports.display.show(&screens::synchronizing());
}

fn synchronizing_update(ctx: &mut BootContext<'_>) -> Option<StateId> {
    if ctx.ports.clock.sync_wall_clock() {
        if let Some(now) = ctx.ports.clock.local_now() {
            info!("BOOT | clock set to {}", now);
            ctx.ports.display.show(&screens::time_synchronized(now));
        }
    } else {
        warn!("BOOT | clock sync failed, continuing");
    }
    Some(StateId::Steady)
}

// ═══════════════════════════════════════════════════════════════════════════
//  STEADY / RESTART (terminal)
// ═══════════════════════════════════════════════════════════════════════════

fn steady_enter(_ctx: &mut BootContext<'_>) {
    info!("BOOT | online");
}

fn restart_enter(ctx: &mut BootContext<'_>) {
    let reason = *ctx
        .restart_reason
        .get_or_insert(RestartReason::ConnectExhausted);
    let delay = ctx.config.restart_delay(reason);
    warn!("BOOT | restarting in {}s: {}", delay.as_secs(), reason);

    ctx.ports.clock.sleep(delay);
    ctx.ports.events.emit(&AppEvent::RestartRequested(reason));
    ctx.ports.system.restart();
}
