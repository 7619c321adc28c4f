#![allow(dead_code)]

use std::sync::Once;

use promptcast_core::{
    update, AppState, Effect, LoadId, Msg, PanelReply, PanelSource, RequestId, SourceId,
};

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(cast_logging::initialize_for_tests);
}

pub fn sources(urls: &[&str]) -> Vec<PanelSource> {
    urls.iter()
        .enumerate()
        .map(|(index, url)| PanelSource::new(url, index as i64).expect("valid url"))
        .collect()
}

/// Load attempts started by `effects`, in order.
pub fn started_loads(effects: &[Effect]) -> Vec<(SourceId, LoadId)> {
    effects
        .iter()
        .filter_map(|effect| match effect {
            Effect::LoadPanel { source, load } => Some((source.id.clone(), *load)),
            _ => None,
        })
        .collect()
}

/// The load attempt `effects` started for `source_id`.
pub fn load_for(effects: &[Effect], source_id: &SourceId) -> LoadId {
    started_loads(effects)
        .into_iter()
        .find_map(|(id, load)| (&id == source_id).then_some(load))
        .expect("load started")
}

/// Reports every load started by `effects` as finished.
pub fn finish_loads(mut state: AppState, effects: &[Effect]) -> AppState {
    for (source_id, load) in started_loads(effects) {
        state = update(state, Msg::PanelLoaded { source_id, load }).0;
    }
    state
}

/// State whose sources are all selected and loaded.
pub fn ready_state(urls: &[&str]) -> (AppState, Vec<SourceId>) {
    let sources = sources(urls);
    let ids = sources.iter().map(|s| s.id.clone()).collect::<Vec<_>>();
    let (state, effects) = update(AppState::new(), Msg::SourcesLoaded(sources));
    (finish_loads(state, &effects), ids)
}

pub fn scheduled_request(effects: &[Effect]) -> RequestId {
    effects
        .iter()
        .find_map(|effect| match effect {
            Effect::ScheduleDeadline { request_id, .. } => Some(request_id.clone()),
            _ => None,
        })
        .expect("deadline scheduled")
}

pub fn reply(
    state: AppState,
    source_id: &SourceId,
    host: &str,
    text: Option<&str>,
    request_id: &RequestId,
) -> (AppState, Vec<Effect>) {
    update(
        state,
        Msg::ReplyReceived {
            source_id: source_id.clone(),
            reply: PanelReply::last_output(
                host,
                text.map(str::to_string),
                Some(request_id.clone()),
            ),
        },
    )
}

pub fn finished_report(effects: &[Effect]) -> Option<promptcast_core::CollectionReport> {
    effects.iter().find_map(|effect| match effect {
        Effect::CollectionFinished { report } => Some(report.clone()),
        _ => None,
    })
}
