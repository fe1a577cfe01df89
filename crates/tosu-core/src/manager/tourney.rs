//! Tournament aggregate over the manager client and its spectator clients.

use std::sync::Arc;

use serde_json::{Value, json};

use crate::instance::{Instance, InstanceCore, answer};
use crate::memory::ChatMessage;
use crate::states::{TourneyManager, TourneyUser};

/// What the aggregate needs from one spectator client.
#[derive(Debug, Clone)]
pub(crate) struct SpectatorView {
    pub ipc_id: i32,
    pub user: TourneyUser,
    pub gameplay: Value,
}

impl SpectatorView {
    fn capture(core: &InstanceCore) -> Self {
        let states = &core.states;
        let mods = answer::current_mods(states);
        let mut gameplay = answer::gameplay_v1(states);
        gameplay["mods"] = json!({ "num": mods.bits(), "str": mods.name() });

        Self {
            ipc_id: core.info().ipc_id,
            user: states.tourney.user.clone(),
            gameplay,
        }
    }
}

/// Aggregate for every tracked instance, or `None` without a manager client.
pub fn aggregate(instances: &[Arc<Instance>]) -> Option<Value> {
    let manager = instances
        .iter()
        .find(|i| i.with_core(InstanceCore::is_tourney_manager))?
        .with_core(|core| core.states.tourney.clone());

    let spectators: Vec<SpectatorView> = instances
        .iter()
        .filter(|i| i.info().is_tourney_spectator)
        .map(|i| i.with_core(SpectatorView::capture))
        .collect();

    Some(build(&manager, spectators))
}

/// Sort spectators by ipc id; the first half plays for the left team.
pub(crate) fn build(manager: &TourneyManager, mut spectators: Vec<SpectatorView>) -> Value {
    spectators.sort_by_key(|s| s.ipc_id);
    let half = spectators.len() as f64 / 2.0;

    let clients: Vec<(&'static str, SpectatorView)> = spectators
        .into_iter()
        .enumerate()
        .map(|(index, view)| {
            let team = if (index as f64) < half { "left" } else { "right" };
            (team, view)
        })
        .collect();

    let chat: Vec<Value> = manager
        .messages
        .iter()
        .map(|message| chat_entry(message, &clients))
        .collect();

    let ipc_clients: Vec<Value> = clients
        .into_iter()
        .map(|(team, view)| {
            json!({
                "team": team,
                "spectating": answer::spectating(&view.user),
                "gameplay": view.gameplay,
            })
        })
        .collect();

    json!({
        "manager": {
            "ipcState": manager.ipc_state,
            "bestOF": manager.best_of,
            "teamName": { "left": manager.first_team_name, "right": manager.second_team_name },
            "stars": { "left": manager.left_stars, "right": manager.right_stars },
            "bools": { "scoreVisible": manager.score_visible, "starsVisible": manager.stars_visible },
            "chat": chat,
            "gameplay": {
                "score": { "left": manager.first_team_score, "right": manager.second_team_score },
            },
        },
        "ipcClients": ipc_clients,
    })
}

fn chat_entry(message: &ChatMessage, clients: &[(&'static str, SpectatorView)]) -> Value {
    let team = clients
        .iter()
        .find(|(_, view)| view.user.name == message.name)
        .map(|(team, _)| *team)
        .unwrap_or(if message.name == "BanchoBot" { "bot" } else { "unknown" });

    json!({
        "team": team,
        "time": message.time,
        "name": message.name,
        "messageBody": message.content,
    })
}
