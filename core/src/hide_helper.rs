//! Dispatch glue between the host's log events and the two engines.
//!
//! Appends reconcile hidden flags before the render window moves, so a new
//! node is never materialized with a stale marker. Entry points driven by log
//! events never fail: a missing collaborator or an unresolvable scope
//! degrades to doing nothing this cycle.
//!
//! Reconciled log lengths are only queued in memory. With a write-back
//! channel attached they reach the settings store once per quiet period;
//! without one they are written at the end of each reconciliation.

use std::sync::Arc;

use hide_helper_config::ConfigResolver;
use hide_helper_config::HideHelperSettings;
use hide_helper_config::RenderWindowSettings;
use hide_helper_config::ResolvedConfig;
use hide_helper_config::SettingsStore;
use hide_helper_protocol::ScopeMode;
use hide_helper_protocol::config_types::VisibilityConfig;
use hide_helper_protocol::event::LogEvent;
use tokio::sync::broadcast;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::debounce::DebouncedRequester;
use crate::error::HideHelperErr;
use crate::error::Result;
use crate::identity::EntityIdentityProvider;
use crate::log::MessageLog;
use crate::render::RenderLayer;
use crate::render_window::RenderWindowLimiter;
use crate::render_window::SettleCycle;
use crate::visibility::IncrementalOutcome;
use crate::visibility::VisibilityDelta;
use crate::visibility::full_reconcile;
use crate::visibility::incremental_reconcile;

/// Host collaborators for one call. The log and the render layer are
/// optional because events can arrive before the UI has mounted.
pub struct HostContext<'a> {
    pub log: Option<&'a mut dyn MessageLog>,
    pub render: Option<&'a mut dyn RenderLayer>,
    pub identity: &'a dyn EntityIdentityProvider,
}

impl<'a> HostContext<'a> {
    pub fn new(
        log: &'a mut dyn MessageLog,
        render: &'a mut dyn RenderLayer,
        identity: &'a dyn EntityIdentityProvider,
    ) -> Self {
        Self {
            log: Some(log),
            render: Some(render),
            identity,
        }
    }

    pub fn without_render(
        log: &'a mut dyn MessageLog,
        identity: &'a dyn EntityIdentityProvider,
    ) -> Self {
        Self {
            log: Some(log),
            render: None,
            identity,
        }
    }

    /// Neither the log nor the render layer is available yet.
    pub fn unmounted(identity: &'a dyn EntityIdentityProvider) -> Self {
        Self {
            log: None,
            render: None,
            identity,
        }
    }

    fn log_len(&self) -> Option<usize> {
        self.log.as_deref().map(MessageLog::len)
    }

    /// Mirrors the hidden flag of freshly materialized nodes.
    fn sync_markers(&mut self, keys: &[usize]) {
        let (Some(log), Some(render)) = (self.log.as_deref(), self.render.as_deref_mut()) else {
            return;
        };
        for key in keys {
            if let Some(hidden) = log.is_hidden(*key) {
                render.set_hidden_marker(*key, hidden);
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    /// The scope was already configured with this keep-count.
    Unchanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReconcilePass {
    Full,
    AfterAppend,
}

enum RenderWindow {
    Off,
    Limited(RenderWindowLimiter),
    /// Disabled while the render layer was unavailable. The complete log is
    /// rendered on the next rebuild.
    Releasing(RenderWindowLimiter),
}

pub struct HideHelper {
    settings: HideHelperSettings,
    resolver: ConfigResolver,
    window: RenderWindow,
    full_check: Option<DebouncedRequester>,
    write_back: Option<DebouncedRequester>,
}

impl HideHelper {
    pub fn new(settings: HideHelperSettings, store: Arc<dyn SettingsStore>) -> Self {
        let window = if settings.render_window.enabled {
            RenderWindow::Limited(RenderWindowLimiter::new(settings.render_window.limit))
        } else {
            RenderWindow::Off
        };
        Self {
            settings,
            resolver: ConfigResolver::new(store),
            window,
            full_check: None,
            write_back: None,
        }
    }

    /// Debounces full checks by `settings.full_check_debounce`. When one is
    /// due a tick is sent on `check_tx` and the host calls
    /// [`Self::run_full_check`]. Without a channel, checks run synchronously.
    ///
    /// Must be called within a tokio runtime.
    pub fn with_full_check_channel(mut self, check_tx: broadcast::Sender<()>) -> Self {
        self.full_check = Some(DebouncedRequester::new(
            self.settings.full_check_debounce,
            check_tx,
        ));
        self
    }

    /// Debounces writes of reconciled log lengths by
    /// `settings.write_back_debounce`. When a flush is due a tick is sent on
    /// `flush_tx` and the host calls [`Self::flush_pending_writes`].
    ///
    /// Must be called within a tokio runtime.
    pub fn with_write_back_channel(mut self, flush_tx: broadcast::Sender<()>) -> Self {
        self.write_back = Some(DebouncedRequester::new(
            self.settings.write_back_debounce,
            flush_tx,
        ));
        self
    }

    pub fn settings(&self) -> HideHelperSettings {
        self.settings
    }

    /// The active limiter, `None` when the window is disabled.
    pub fn render_window(&self) -> Option<&RenderWindowLimiter> {
        match &self.window {
            RenderWindow::Limited(limiter) => Some(limiter),
            RenderWindow::Off | RenderWindow::Releasing(_) => None,
        }
    }

    /// Applies one log event. Returns the settle cycle of a window rebuild,
    /// which the host typically spawns with a scroll-to-end callback.
    pub fn handle_event(
        &mut self,
        event: LogEvent,
        ctx: &mut HostContext<'_>,
    ) -> Option<SettleCycle> {
        debug!(?event, debounced = event.is_debounced(), "log event");
        match event {
            LogEvent::MessageAppended => {
                self.reconcile(ctx, ReconcilePass::AfterAppend);
                self.window_append(ctx);
                None
            }
            LogEvent::MessageRemoved { index } => {
                // Renumber the window first so marker updates from the full
                // check land on the right nodes.
                self.window_deletion(index, ctx);
                self.request_full_check(ctx);
                None
            }
            LogEvent::MessageEdited { .. } | LogEvent::GenerationFinished => {
                self.request_full_check(ctx);
                None
            }
            LogEvent::LogSwitched => {
                self.resolver.invalidate();
                self.reconcile(ctx, ReconcilePass::Full);
                self.rebuild_window(ctx)
            }
        }
    }

    /// Runs a full reconciliation now. The host calls this when a debounced
    /// check fires.
    pub fn run_full_check(&mut self, ctx: &mut HostContext<'_>) {
        self.reconcile(ctx, ReconcilePass::Full);
    }

    /// Initial pass once the host is ready: reconciles the loaded log and
    /// builds the render window.
    pub fn startup(&mut self, ctx: &mut HostContext<'_>) -> Option<SettleCycle> {
        self.reconcile(ctx, ReconcilePass::Full);
        self.rebuild_window(ctx)
    }

    /// Stores an explicit keep-count for the active scope and reconciles
    /// right away.
    ///
    /// A persistence failure is returned after the log was reconciled
    /// against the new value, which stays in effect in memory.
    pub fn save_keep_count(
        &mut self,
        keep_count: usize,
        ctx: &mut HostContext<'_>,
    ) -> Result<SaveOutcome> {
        let entity = ctx.identity.current_entity();
        let scope_mode = self.settings.scope_mode;
        let current = self
            .resolver
            .resolve(scope_mode, entity.as_ref())
            .ok_or(HideHelperErr::UnresolvableScope)?;
        if current.config.configured && current.config.keep_count == keep_count {
            return Ok(SaveOutcome::Unchanged);
        }

        let log_len = ctx.log_len().unwrap_or_default();
        let saved = self
            .resolver
            .save(scope_mode, entity.as_ref(), keep_count, log_len);
        self.reconcile(ctx, ReconcilePass::Full);
        let saved = saved?;
        info!(scope = %saved.scope, keep_count, "saved keep count");
        Ok(SaveOutcome::Saved)
    }

    /// Shows every hidden message and resets the active scope to
    /// `keep_count = 0`. Works while the feature is disabled.
    pub fn unhide_all(&mut self, ctx: &mut HostContext<'_>) -> Result<()> {
        let Some(log) = ctx.log.as_deref_mut() else {
            return Err(HideHelperErr::MissingCollaborator("message log"));
        };
        let show_all = VisibilityConfig {
            configured: true,
            ..VisibilityConfig::default()
        };
        let delta = full_reconcile(log, show_all);
        let log_len = log.len();
        if let Some(render) = ctx.render.as_deref_mut() {
            apply_markers(render, &delta);
        }
        info!(shown = delta.to_show.len(), "unhid all messages");

        let entity = ctx.identity.current_entity();
        self.resolver
            .save(self.settings.scope_mode, entity.as_ref(), 0, log_len)?;
        Ok(())
    }

    /// Turning the feature off leaves hidden flags as they are.
    pub fn set_enabled(&mut self, enabled: bool, ctx: &mut HostContext<'_>) {
        if self.settings.enabled == enabled {
            return;
        }
        self.settings.enabled = enabled;
        info!(enabled, "hide helper toggled");
        if enabled {
            self.request_full_check(ctx);
        }
    }

    /// Switches between per-entity and global configs. Neither config is
    /// rewritten; the log is reconciled against the newly active one.
    pub fn set_scope_mode(&mut self, scope_mode: ScopeMode, ctx: &mut HostContext<'_>) {
        if self.settings.scope_mode == scope_mode {
            return;
        }
        self.settings.scope_mode = scope_mode;
        info!(?scope_mode, "scope mode changed");
        self.reconcile(ctx, ReconcilePass::Full);
    }

    /// Enables, resizes or disables the render window. Disabling renders the
    /// complete log once, deferred to the next rebuild when the host is not
    /// mounted.
    pub fn set_render_window(
        &mut self,
        render_window: RenderWindowSettings,
        ctx: &mut HostContext<'_>,
    ) -> Option<SettleCycle> {
        self.settings.render_window = render_window;
        self.window = match std::mem::replace(&mut self.window, RenderWindow::Off) {
            RenderWindow::Limited(mut limiter) | RenderWindow::Releasing(mut limiter)
                if render_window.enabled =>
            {
                limiter.set_limit(render_window.limit);
                RenderWindow::Limited(limiter)
            }
            RenderWindow::Off if render_window.enabled => {
                RenderWindow::Limited(RenderWindowLimiter::new(render_window.limit))
            }
            RenderWindow::Limited(limiter) | RenderWindow::Releasing(limiter) => {
                RenderWindow::Releasing(limiter)
            }
            RenderWindow::Off => RenderWindow::Off,
        };
        self.rebuild_window(ctx)
    }

    /// Keep-count to display for the active scope, `None` for "none".
    pub fn current_keep_count(&mut self, identity: &dyn EntityIdentityProvider) -> Option<usize> {
        let entity = identity.current_entity();
        self.resolver
            .resolve(self.settings.scope_mode, entity.as_ref())
            .and_then(|resolved| resolved.config.display_keep_count())
    }

    /// Writes queued log lengths and retries config writes the settings
    /// store rejected earlier.
    pub fn flush_pending_writes(&mut self) -> Result<()> {
        self.resolver.flush().map_err(HideHelperErr::from)
    }

    fn active_config(&mut self, identity: &dyn EntityIdentityProvider) -> Option<ResolvedConfig> {
        if !self.settings.enabled {
            return None;
        }
        let entity = identity.current_entity();
        let Some(resolved) = self.resolver.resolve(self.settings.scope_mode, entity.as_ref())
        else {
            debug!("no character or group selected; skipping reconciliation");
            return None;
        };
        resolved.config.configured.then_some(resolved)
    }

    fn reconcile(&mut self, ctx: &mut HostContext<'_>, pass: ReconcilePass) {
        let Some(resolved) = self.active_config(ctx.identity) else {
            return;
        };
        let Some(log) = ctx.log.as_deref_mut() else {
            warn!(?pass, "message log is not available; skipping reconciliation");
            return;
        };

        let delta = match pass {
            ReconcilePass::Full => full_reconcile(log, resolved.config),
            ReconcilePass::AfterAppend => match incremental_reconcile(log, resolved.config) {
                IncrementalOutcome::Applied(delta) => delta,
                IncrementalOutcome::NeedsFullReconcile(reason) => {
                    debug!(?reason, "falling back to a full reconciliation");
                    full_reconcile(log, resolved.config)
                }
            },
        };
        let log_len = log.len();

        if let Some(render) = ctx.render.as_deref_mut() {
            apply_markers(render, &delta);
        }
        if !delta.is_empty() {
            info!(
                scope = %resolved.scope,
                hidden = delta.to_hide.len(),
                shown = delta.to_show.len(),
                ?pass,
                "reconciled hidden flags"
            );
        }
        if self.resolver.record_length(&resolved.scope, log_len) {
            self.request_write_back();
        }
    }

    fn request_write_back(&mut self) {
        if let Some(requester) = self.write_back.as_ref() {
            requester.request();
            return;
        }
        if let Err(err) = self.resolver.flush() {
            warn!(error = %err, "failed to persist the reconciled log length");
        }
    }

    fn request_full_check(&mut self, ctx: &mut HostContext<'_>) {
        if !self.settings.enabled {
            return;
        }
        if let Some(requester) = self.full_check.as_ref() {
            requester.request();
            return;
        }
        self.reconcile(ctx, ReconcilePass::Full);
    }

    fn window_append(&mut self, ctx: &mut HostContext<'_>) {
        let RenderWindow::Limited(limiter) = &mut self.window else {
            return;
        };
        let Some(log_len) = ctx.log_len() else {
            return;
        };
        let Some(render) = ctx.render.as_deref_mut() else {
            warn!("render layer is not available; skipping window update");
            return;
        };
        let change = limiter.handle_append(log_len, render);
        ctx.sync_markers(&change.materialized);
    }

    fn window_deletion(&mut self, removed_index: usize, ctx: &mut HostContext<'_>) {
        let RenderWindow::Limited(limiter) = &mut self.window else {
            return;
        };
        let Some(log_len) = ctx.log_len() else {
            return;
        };
        let Some(render) = ctx.render.as_deref_mut() else {
            warn!("render layer is not available; skipping window update");
            return;
        };
        let change = limiter.handle_deletion(removed_index, log_len, render);
        ctx.sync_markers(&change.materialized);
    }

    fn rebuild_window(&mut self, ctx: &mut HostContext<'_>) -> Option<SettleCycle> {
        if matches!(self.window, RenderWindow::Off) {
            return None;
        }
        let log_len = ctx.log_len()?;
        let Some(render) = ctx.render.as_deref_mut() else {
            warn!("render layer is not available; skipping window rebuild");
            return None;
        };
        let (rebuild, released) = match &mut self.window {
            RenderWindow::Off => return None,
            RenderWindow::Limited(limiter) => (limiter.apply_full_window(log_len, render), false),
            RenderWindow::Releasing(limiter) => (limiter.rebuild_unlimited(log_len, render), true),
        };
        if released {
            self.window = RenderWindow::Off;
            info!(log_len, "render window disabled; rendered the full log");
        }
        ctx.sync_markers(&rebuild.materialized);
        Some(rebuild.settle)
    }
}

fn apply_markers(render: &mut (dyn RenderLayer + '_), delta: &VisibilityDelta) {
    for (index, hidden) in delta.marker_updates() {
        render.set_hidden_marker(index, hidden);
    }
}

#[cfg(test)]
#[path = "hide_helper_tests.rs"]
mod tests;
