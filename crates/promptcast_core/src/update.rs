use crate::{sanitize_sources, AppState, Effect, Msg};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::SourcesLoaded(sources) => state.replace_sources(sanitize_sources(sources)),
        Msg::PromptsLoaded(prompts) => {
            state.set_prompts(prompts);
            Vec::new()
        }
        Msg::LanguageChanged(language) => {
            state.set_language(language);
            Vec::new()
        }
        Msg::InputChanged(text) => {
            state.set_input(text);
            Vec::new()
        }
        Msg::SourceAdded { url } => state.add_source(&url),
        Msg::SourceEdited { source_id, url } => state.edit_source(&source_id, &url),
        Msg::SourceDeleted { source_id } => state.delete_source(&source_id),
        Msg::SourceToggled {
            source_id,
            selected,
        } => state.toggle_source(&source_id, selected),
        Msg::SourceMoved {
            source_id,
            to_index,
        } => state.move_source(&source_id, to_index),
        Msg::PanelLoaded { source_id, load } => {
            state.panel_loaded(&source_id, load);
            Vec::new()
        }
        Msg::PanelLoadFailed {
            source_id,
            load,
            reason,
        } => state.panel_failed(&source_id, load, reason),
        Msg::RefreshPanel { source_id } => state.refresh_panel(&source_id),
        Msg::BroadcastClicked => {
            let prompt = state.input().to_string();
            state.broadcast(prompt)
        }
        Msg::TemplateActivated { template_id } => state.broadcast_template(&template_id),
        Msg::PanelSendClicked { source_id } => state.send_to_panel(&source_id),
        Msg::CollectAllClicked => state.collect_all(),
        Msg::PanelCollectClicked { source_id } => state.collect_one(&source_id),
        Msg::ReplyReceived { source_id, reply } => state.receive_reply(&source_id, reply),
        Msg::DeadlineElapsed { request_id } => state.deadline_elapsed(&request_id),
        Msg::ComposedEdited(text) => {
            state.set_composed(text);
            Vec::new()
        }
        Msg::ComposedCleared => {
            state.set_composed(String::new());
            Vec::new()
        }
    };

    (state, effects)
}
