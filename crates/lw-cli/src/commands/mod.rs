pub mod check;
pub mod list;
pub mod play;
pub mod trace;

use std::path::Path;
use std::sync::Arc;

use colored::Colorize;
use lw_content::{Catalog, ContentError, ValidationIssue};
use lw_core::SceneId;
use lw_engine::{ChoiceOutcome, ChoiceView, EngineConfig, GameSession};

/// Load a content file or directory, printing validation issues to stderr.
pub fn load_catalog(path: &Path) -> Result<Arc<Catalog>, String> {
    match Catalog::load(path) {
        Ok((catalog, warnings)) => {
            print_issues(&warnings);
            Ok(Arc::new(catalog))
        }
        Err(ContentError::Invalid(issues)) => {
            print_issues(&issues);
            let errors = issues.iter().filter(|i| i.is_error).count();
            Err(format!("{errors} error(s) in '{}'", path.display()))
        }
        Err(e) => Err(e.to_string()),
    }
}

fn print_issues(issues: &[ValidationIssue]) {
    for issue in issues {
        let line = issue.to_string();
        if issue.is_error {
            eprintln!("{}", line.red());
        } else {
            eprintln!("{}", line.yellow());
        }
    }
}

/// One executed choice during an auto-played session.
pub struct Turn {
    pub scene_name: String,
    pub situation_name: String,
    pub action_text: String,
    pub outcome: ChoiceOutcome,
}

/// Start a seeded session and play up to `steps` choices.
///
/// Each turn takes the first selectable choice of the first active scene
/// that has one. Play stops early when nothing is selectable.
pub fn autoplay(
    catalog: Arc<Catalog>,
    seed: u64,
    steps: u32,
) -> Result<(GameSession, Vec<Turn>), String> {
    let config = EngineConfig::default().with_seed(seed).with_trace(true);
    let mut session = GameSession::new(catalog, config).map_err(|e| e.to_string())?;
    session.start();

    let mut turns = Vec::new();
    for _ in 0..steps {
        let Some((scene_id, choice)) = next_choice(&session) else {
            tracing::debug!(target: "loomwright::cli", turn = session.turn(), "autoplay.stalled");
            break;
        };
        let (scene_name, situation_name) = match session.scene(scene_id) {
            Some(scene) => (
                scene.display_name.clone(),
                scene.current().map(|s| s.name.clone()).unwrap_or_default(),
            ),
            None => break,
        };
        let outcome = session
            .execute_choice(scene_id, choice.id)
            .map_err(|e| e.to_string())?;
        turns.push(Turn {
            scene_name,
            situation_name,
            action_text: choice.action_text,
            outcome,
        });
    }
    tracing::info!(target: "loomwright::cli", seed, turns = turns.len(), "autoplay.finished");
    Ok((session, turns))
}

fn next_choice(session: &GameSession) -> Option<(SceneId, ChoiceView)> {
    let scene_ids: Vec<_> = session.active_scenes().map(|s| s.id).collect();
    scene_ids.into_iter().find_map(|id| {
        let views = session.choices(id).ok()?;
        views.into_iter().find(|v| v.selectable).map(|v| (id, v))
    })
}
