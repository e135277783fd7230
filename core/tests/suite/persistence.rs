use std::sync::Arc;

use hide_helper_config::FileSettingsStore;
use hide_helper_config::HideHelperSettings;
use hide_helper_config::LegacyMigrationStatus;
use hide_helper_config::LegacySnapshot;
use hide_helper_config::SettingsStore;
use hide_helper_config::maybe_migrate_legacy;
use hide_helper_core::HideHelper;
use hide_helper_core::HostContext;
use hide_helper_core::SaveOutcome;
use hide_helper_core::identity::ConversationContext;
use hide_helper_core::log::ChatLog;
use hide_helper_core::log::MessageLog;
use hide_helper_core::render::RenderList;
use hide_helper_protocol::EntityRef;
use hide_helper_protocol::ScopeMode;
use hide_helper_protocol::config_types::VisibilityConfig;
use hide_helper_protocol::event::LogEvent;
use hide_helper_protocol::message::ChatMessage;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn file_helper(home: &TempDir) -> anyhow::Result<(HideHelper, Arc<FileSettingsStore>)> {
    let settings = HideHelperSettings::load(home.path())?;
    let store = Arc::new(FileSettingsStore::new(home.path()));
    Ok((HideHelper::new(settings, store.clone()), store))
}

#[test]
fn keep_count_survives_a_restart() -> anyhow::Result<()> {
    let home = TempDir::new()?;
    let context = ConversationContext::character("alice.png");
    let mut log = ChatLog::with_len(10);

    {
        let (mut helper, _store) = file_helper(&home)?;
        let outcome =
            helper.save_keep_count(4, &mut HostContext::without_render(&mut log, &context))?;
        assert_eq!(outcome, SaveOutcome::Saved);
    }

    // New session: the host reloaded the log without hidden flags.
    let mut log = ChatLog::with_len(12);
    let mut render = RenderList::new();
    let (mut helper, store) = file_helper(&home)?;
    assert_eq!(helper.current_keep_count(&context), Some(4));
    helper.startup(&mut HostContext::new(&mut log, &mut render, &context));

    assert_eq!(log.hidden_indices(), (0..8).collect::<Vec<_>>());
    let scope = EntityRef::Character {
        avatar: "alice.png".to_string(),
    }
    .scope_key();
    assert_eq!(
        store.get(&scope)?,
        Some(VisibilityConfig {
            keep_count: 4,
            configured: true,
            last_known_length: 12,
        })
    );
    Ok(())
}

#[test]
fn global_mode_from_the_settings_file_shares_one_config() -> anyhow::Result<()> {
    let home = TempDir::new()?;
    let settings = HideHelperSettings {
        scope_mode: ScopeMode::Global,
        ..HideHelperSettings::default()
    };
    settings.save(home.path())?;

    let (mut helper, _store) = file_helper(&home)?;
    assert_eq!(helper.settings().scope_mode, ScopeMode::Global);

    let alice = ConversationContext::character("alice.png");
    let mut alice_log = ChatLog::with_len(6);
    helper.save_keep_count(2, &mut HostContext::without_render(&mut alice_log, &alice))?;

    let bob = ConversationContext::group("g-7");
    let mut bob_log = ChatLog::with_len(5);
    helper.handle_event(
        LogEvent::LogSwitched,
        &mut HostContext::without_render(&mut bob_log, &bob),
    );

    assert_eq!(alice_log.hidden_indices(), vec![0, 1, 2, 3]);
    assert_eq!(bob_log.hidden_indices(), vec![0, 1, 2]);
    assert_eq!(helper.current_keep_count(&bob), Some(2));
    Ok(())
}

#[tokio::test]
async fn migrated_legacy_settings_drive_the_first_startup() -> anyhow::Result<()> {
    let home = TempDir::new()?;
    let legacy: LegacySnapshot = serde_json::from_str(
        r#"{"characters": {"alice.png": {"hideLastN": 3, "userConfigured": true}}}"#,
    )?;
    let store = Arc::new(FileSettingsStore::new(home.path()));

    let status = maybe_migrate_legacy(home.path(), &legacy, store.as_ref()).await?;
    assert_eq!(status, LegacyMigrationStatus::Applied { migrated: 1 });

    let context = ConversationContext::character("alice.png");
    let mut log: ChatLog = (0..7).map(|index| ChatMessage::text(format!("{index}"))).collect();
    let mut helper = HideHelper::new(HideHelperSettings::default(), store);
    helper.startup(&mut HostContext::without_render(&mut log, &context));

    assert_eq!(log.hidden_indices(), vec![0, 1, 2, 3]);
    assert_eq!(log.len(), 7);
    Ok(())
}
