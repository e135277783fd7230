use std::sync::Arc;

use hide_helper_config::HideHelperSettings;
use hide_helper_config::InMemorySettingsStore;
use hide_helper_config::RenderWindowSettings;
use hide_helper_config::parse_keep_count;
use hide_helper_core::HideHelper;
use hide_helper_core::HideHelperErr;
use hide_helper_core::HostContext;
use hide_helper_core::identity::ConversationContext;
use hide_helper_core::log::ChatLog;
use hide_helper_core::log::MessageLog;
use hide_helper_core::render::RenderLayer;
use hide_helper_core::render::RenderList;
use hide_helper_core::render_window::SettleReport;
use hide_helper_protocol::event::LogEvent;
use hide_helper_protocol::message::ChatMessage;
use pretty_assertions::assert_eq;

fn helper(settings: HideHelperSettings) -> (HideHelper, Arc<InMemorySettingsStore>) {
    let store = Arc::new(InMemorySettingsStore::new());
    (HideHelper::new(settings, store.clone()), store)
}

fn append(log: &mut ChatLog, render: &mut RenderList, windowed: bool) {
    let index = log.push(ChatMessage::text(format!("message {}", log.len())));
    // Without a window the host renders every message itself.
    if !windowed {
        render.append(index);
    }
}

#[test]
fn keep_count_follows_appends_and_reset() -> anyhow::Result<()> {
    let mut log = ChatLog::with_len(10);
    let mut render = RenderList::new();
    for key in 0..10 {
        render.append(key);
    }
    let context = ConversationContext::character("alice.png");
    let (mut helper, _store) = helper(HideHelperSettings::default());

    // Log of 10, keep 4: indices 0..=5 hidden.
    helper.save_keep_count(
        parse_keep_count("4"),
        &mut HostContext::new(&mut log, &mut render, &context),
    )?;
    assert_eq!(log.hidden_indices(), (0..6).collect::<Vec<_>>());

    // One more message: only index 6 joins the hidden range.
    append(&mut log, &mut render, false);
    helper.handle_event(
        LogEvent::MessageAppended,
        &mut HostContext::new(&mut log, &mut render, &context),
    );
    assert_eq!(log.hidden_indices(), (0..7).collect::<Vec<_>>());
    assert_eq!(log.context_messages().count(), 4);

    // Keep 0 shows everything again.
    helper.save_keep_count(
        parse_keep_count("0"),
        &mut HostContext::new(&mut log, &mut render, &context),
    )?;
    assert!(log.hidden_indices().is_empty());
    Ok(())
}

#[test]
fn long_log_renders_only_the_window() {
    let mut log = ChatLog::with_len(1000);
    let mut render = RenderList::new();
    let context = ConversationContext::character("alice.png");
    let settings = HideHelperSettings {
        render_window: RenderWindowSettings {
            enabled: true,
            limit: 20,
        },
        ..HideHelperSettings::default()
    };
    let (mut helper, _store) = helper(settings);

    helper.startup(&mut HostContext::new(&mut log, &mut render, &context));
    assert_eq!(render.keys(), (980..1000).collect::<Vec<_>>());

    append(&mut log, &mut render, true);
    helper.handle_event(
        LogEvent::MessageAppended,
        &mut HostContext::new(&mut log, &mut render, &context),
    );
    assert_eq!(render.keys(), (981..1001).collect::<Vec<_>>());
}

#[test]
fn save_without_entity_reports_unresolvable_scope() {
    let mut log = ChatLog::with_len(10);
    let context = ConversationContext::default();
    let (mut helper, store) = helper(HideHelperSettings::default());

    let result = helper.save_keep_count(4, &mut HostContext::without_render(&mut log, &context));

    assert!(matches!(result, Err(HideHelperErr::UnresolvableScope)));
    assert!(store.snapshot().is_empty());
    assert_eq!(helper.current_keep_count(&context), None);
}

#[test]
fn hidden_flags_and_window_stay_consistent_under_churn() -> anyhow::Result<()> {
    let mut log = ChatLog::with_len(30);
    let mut render = RenderList::new();
    let context = ConversationContext::group("g-1");
    let settings = HideHelperSettings {
        render_window: RenderWindowSettings {
            enabled: true,
            limit: 8,
        },
        ..HideHelperSettings::default()
    };
    let (mut helper, _store) = helper(settings);
    helper.save_keep_count(5, &mut HostContext::new(&mut log, &mut render, &context))?;
    helper.startup(&mut HostContext::new(&mut log, &mut render, &context));

    for step in 0..40_usize {
        if step % 5 == 4 {
            let removed = (step * 7) % log.len();
            log.remove(removed);
            helper.handle_event(
                LogEvent::MessageRemoved { index: removed },
                &mut HostContext::new(&mut log, &mut render, &context),
            );
        } else {
            append(&mut log, &mut render, true);
            helper.handle_event(
                LogEvent::MessageAppended,
                &mut HostContext::new(&mut log, &mut render, &context),
            );
        }

        let log_len = log.len();
        let expected_hidden: Vec<usize> = (0..log_len.saturating_sub(5)).collect();
        assert_eq!(log.hidden_indices(), expected_hidden, "step {step}");

        let keys = render.keys();
        assert!(keys.len() <= 8, "step {step}: {keys:?}");
        assert_eq!(
            keys,
            (log_len.saturating_sub(8)..log_len).collect::<Vec<_>>(),
            "step {step}"
        );
        for key in keys {
            let marker = render.node(key).map(|node| node.hidden_marker);
            assert_eq!(marker, log.is_hidden(key), "step {step} key {key}");
        }
    }
    Ok(())
}

#[tokio::test]
async fn log_switch_settles_after_asset_loads() -> anyhow::Result<()> {
    let mut log = ChatLog::with_len(12);
    let mut render = RenderList::new();
    render.mark_has_asset(10);
    render.mark_has_asset(11);
    let context = ConversationContext::character("alice.png");
    let settings = HideHelperSettings {
        render_window: RenderWindowSettings {
            enabled: true,
            limit: 4,
        },
        ..HideHelperSettings::default()
    };
    let (mut helper, _store) = helper(settings);

    let settle = helper
        .handle_event(
            LogEvent::LogSwitched,
            &mut HostContext::new(&mut log, &mut render, &context),
        )
        .ok_or_else(|| anyhow::anyhow!("expected a window rebuild"))?;
    assert_eq!(settle.pending(), 2);

    let (scrolled_tx, scrolled_rx) = tokio::sync::oneshot::channel();
    let handle = settle.spawn(move |report| {
        let _ = scrolled_tx.send(report);
    });
    render.complete_asset(10, Ok(()));
    render.complete_asset(11, Err("broken image".to_string()));

    assert_eq!(
        scrolled_rx.await?,
        SettleReport {
            loaded: 1,
            failed: 1,
        }
    );
    handle.await?;
    Ok(())
}
