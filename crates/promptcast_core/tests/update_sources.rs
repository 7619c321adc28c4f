mod common;

use common::{init_logging, load_for, ready_state, sources};
use promptcast_core::{
    update, AppState, Effect, LoadId, Msg, Notice, PanelRowStatus, PanelStatus,
};

fn persisted(effects: &[Effect]) -> bool {
    effects
        .iter()
        .any(|effect| matches!(effect, Effect::PersistSources { .. }))
}

#[test]
fn adding_a_source_loads_and_persists_it() {
    init_logging();
    let (state, _) = ready_state(&["https://chatgpt.com/"]);

    let (state, effects) = update(
        state,
        Msg::SourceAdded {
            url: "https://grok.com/".into(),
        },
    );

    assert!(persisted(&effects));
    assert!(effects.iter().any(|effect| matches!(
        effect,
        Effect::LoadPanel { source, .. } if source.hostname() == "grok.com"
    )));
    let view = state.view();
    assert_eq!(view.sources.len(), 2);
    assert_eq!(view.sources[1].status, PanelRowStatus::Loading);
    assert_eq!(state.sources()[1].order, 1);
}

#[test]
fn invalid_source_is_rejected_without_side_effects() {
    init_logging();
    let (state, _) = ready_state(&["https://chatgpt.com/"]);

    let (state, effects) = update(
        state,
        Msg::SourceAdded {
            url: "javascript:alert(1)".into(),
        },
    );

    assert!(effects.is_empty());
    assert_eq!(state.sources().len(), 1);
    assert!(matches!(state.notice(), Some(Notice::InvalidSource { .. })));
}

#[test]
fn deleting_a_source_releases_its_panel() {
    init_logging();
    let (state, ids) = ready_state(&["https://chatgpt.com/", "https://claude.ai/"]);

    let (state, effects) = update(
        state,
        Msg::SourceDeleted {
            source_id: ids[0].clone(),
        },
    );

    assert!(effects.contains(&Effect::DropPanel {
        source_id: ids[0].clone()
    }));
    assert!(persisted(&effects));
    assert_eq!(state.sources().len(), 1);
    assert_eq!(state.sources()[0].order, 0);
    assert_eq!(state.panel_status(&ids[0]), None);
}

#[test]
fn editing_keeps_identity_and_reloads_the_panel() {
    init_logging();
    let (state, ids) = ready_state(&["https://chatgpt.com/"]);

    let (state, effects) = update(
        state,
        Msg::SourceEdited {
            source_id: ids[0].clone(),
            url: "https://claude.ai/new".into(),
        },
    );

    assert_eq!(state.sources()[0].id, ids[0]);
    assert_eq!(state.view().sources[0].hostname, "claude.ai");
    assert_eq!(
        effects.first(),
        Some(&Effect::DropPanel {
            source_id: ids[0].clone()
        })
    );
    assert!(effects.iter().any(|effect| matches!(
        effect,
        Effect::LoadPanel { source, .. } if source.id == ids[0]
    )));
    assert!(persisted(&effects));
}

#[test]
fn moving_a_source_renumbers_orders() {
    init_logging();
    let (state, ids) = ready_state(&[
        "https://chatgpt.com/",
        "https://claude.ai/",
        "https://grok.com/",
    ]);

    let (state, effects) = update(
        state,
        Msg::SourceMoved {
            source_id: ids[2].clone(),
            to_index: 0,
        },
    );

    let order: Vec<_> = state.sources().iter().map(|s| s.id.clone()).collect();
    assert_eq!(order, vec![ids[2].clone(), ids[0].clone(), ids[1].clone()]);
    assert!(state
        .sources()
        .iter()
        .enumerate()
        .all(|(index, source)| source.order == index as i64));
    assert_eq!(
        effects,
        vec![Effect::PersistSources {
            sources: state.sources().to_vec()
        }]
    );
}

#[test]
fn load_failure_evicts_and_refresh_retries() {
    init_logging();
    let list = sources(&["https://chatgpt.com/", "https://claude.ai/"]);
    let ids: Vec<_> = list.iter().map(|source| source.id.clone()).collect();
    let (state, loads) = update(AppState::new(), Msg::SourcesLoaded(list));
    let (state, _) = update(
        state,
        Msg::PanelLoaded {
            source_id: ids[0].clone(),
            load: load_for(&loads, &ids[0]),
        },
    );

    let (state, effects) = update(
        state,
        Msg::PanelLoadFailed {
            source_id: ids[1].clone(),
            load: load_for(&loads, &ids[1]),
            reason: "timeout".into(),
        },
    );
    assert!(effects.contains(&Effect::DropPanel {
        source_id: ids[1].clone()
    }));
    assert_eq!(
        state.view().sources[1].status,
        PanelRowStatus::Failed("timeout".into())
    );
    assert_eq!(
        state.notice(),
        Some(&Notice::PanelFailed {
            hostname: "claude.ai".into(),
            reason: "timeout".into()
        })
    );

    // Failed panels are not reloaded by unrelated config changes.
    let list = state.sources().to_vec();
    let (state, effects) = update(state, Msg::SourcesLoaded(list));
    assert!(effects.is_empty());

    let (state, effects) = update(
        state,
        Msg::RefreshPanel {
            source_id: ids[1].clone(),
        },
    );
    assert!(effects.iter().any(|effect| matches!(
        effect,
        Effect::LoadPanel { source, .. } if source.id == ids[1]
    )));
    assert_eq!(state.view().sources[1].status, PanelRowStatus::Loading);
}

#[test]
fn load_notifications_for_a_released_panel_are_ignored() {
    init_logging();
    let list = sources(&["https://chatgpt.com/"]);
    let id = list[0].id.clone();
    let (state, loads) = update(AppState::new(), Msg::SourcesLoaded(list));
    let first = load_for(&loads, &id);
    let (state, _) = update(
        state,
        Msg::SourceToggled {
            source_id: id.clone(),
            selected: false,
        },
    );

    let (state, effects) = update(
        state,
        Msg::PanelLoadFailed {
            source_id: id.clone(),
            load: first,
            reason: "late".into(),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.view().sources[0].status, PanelRowStatus::Hidden);

    let (state, _) = update(
        state,
        Msg::PanelLoaded {
            source_id: id.clone(),
            load: first,
        },
    );
    assert_eq!(state.panel_status(&id), None);
}

#[test]
fn outcome_of_an_abandoned_load_does_not_touch_its_replacement() {
    init_logging();
    let list = sources(&["https://chatgpt.com/"]);
    let id = list[0].id.clone();
    let (state, loads) = update(AppState::new(), Msg::SourcesLoaded(list));
    let first = load_for(&loads, &id);
    let (state, _) = update(
        state,
        Msg::SourceToggled {
            source_id: id.clone(),
            selected: false,
        },
    );
    let (state, reloads) = update(
        state,
        Msg::SourceToggled {
            source_id: id.clone(),
            selected: true,
        },
    );
    let second = load_for(&reloads, &id);
    assert_ne!(first, second);

    let (state, effects) = update(
        state,
        Msg::PanelLoadFailed {
            source_id: id.clone(),
            load: first,
            reason: "old load".into(),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.panel_status(&id), Some(PanelStatus::Loading));
    assert_eq!(state.view().sources[0].status, PanelRowStatus::Loading);

    let (state, _) = update(
        state,
        Msg::PanelLoaded {
            source_id: id.clone(),
            load: LoadId::new(9_999),
        },
    );
    assert_eq!(state.panel_status(&id), Some(PanelStatus::Loading));

    let (state, _) = update(
        state,
        Msg::PanelLoaded {
            source_id: id.clone(),
            load: second,
        },
    );
    assert_eq!(state.panel_status(&id), Some(PanelStatus::Loaded));
}

#[test]
fn composed_text_can_be_cleared() {
    init_logging();
    let (state, _) = ready_state(&[]);
    let (state, _) = update(state, Msg::ComposedEdited("draft".into()));
    let (mut state, _) = update(state, Msg::ComposedCleared);
    assert_eq!(state.composed(), "");
    assert!(state.consume_dirty());
    assert!(!state.consume_dirty());
}
