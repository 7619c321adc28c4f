mod common;

use promptcast_core::{update, LoadId, Msg, PanelReply, RequestId, SourceId};

/// Messages naming sources or requests the state does not know change nothing.
#[test]
fn messages_about_unknown_ids_are_ignored() {
    common::init_logging();
    let (state, _) = common::ready_state(&["https://chatgpt.com/"]);
    let ghost = SourceId::new("ghost");
    let messages = vec![
        Msg::SourceEdited {
            source_id: ghost.clone(),
            url: "https://claude.ai/".to_string(),
        },
        Msg::SourceDeleted {
            source_id: ghost.clone(),
        },
        Msg::SourceToggled {
            source_id: ghost.clone(),
            selected: false,
        },
        Msg::SourceMoved {
            source_id: ghost.clone(),
            to_index: 0,
        },
        Msg::PanelLoaded {
            source_id: ghost.clone(),
            load: LoadId::new(1),
        },
        Msg::PanelLoadFailed {
            source_id: ghost.clone(),
            load: LoadId::new(1),
            reason: "gone".to_string(),
        },
        Msg::RefreshPanel {
            source_id: ghost.clone(),
        },
        Msg::ReplyReceived {
            source_id: ghost,
            reply: PanelReply::last_output("ghost", Some("boo".to_string()), None),
        },
        Msg::DeadlineElapsed {
            request_id: RequestId::new("collect-404"),
        },
        Msg::TemplateActivated {
            template_id: "missing".to_string(),
        },
    ];

    for msg in messages {
        let label = format!("{msg:?}");
        let (next, effects) = update(state.clone(), msg);
        assert_eq!(next, state, "{label}");
        assert!(effects.is_empty(), "{label}");
    }
}
