use std::path::Path;

use colored::Colorize;
use lw_engine::{AppliedEffect, FlowOutcome, GameSession, SceneState};

use super::Turn;

pub fn run(path: &Path, seed: u64, steps: u32, save: Option<&Path>) -> Result<(), String> {
    let catalog = super::load_catalog(path)?;
    let (session, turns) = super::autoplay(catalog, seed, steps)?;

    println!("{}", format!("Session (seed {seed})").bold());
    println!();
    for (i, turn) in turns.iter().enumerate() {
        print_turn(i + 1, turn);
    }
    if turns.is_empty() {
        println!("  {}", "No selectable choices.".dimmed());
        println!();
    }
    print_summary(&session);

    if let Some(save_path) = save {
        let json = session.snapshot().to_json().map_err(|e| e.to_string())?;
        std::fs::write(save_path, json)
            .map_err(|e| format!("cannot write '{}': {e}", save_path.display()))?;
        println!("  Snapshot saved to '{}'.", save_path.display());
    }
    Ok(())
}

fn print_turn(number: usize, turn: &Turn) {
    println!(
        "{} {} / {}",
        format!("[{number}]").bold(),
        turn.scene_name,
        turn.situation_name.dimmed()
    );
    println!("    > {}", turn.action_text);
    if let Some(challenge) = &turn.outcome.challenge {
        let verdict = if challenge.succeeded {
            "won".green()
        } else {
            "lost".red()
        };
        println!("    challenge {verdict}: {}", challenge.summary);
    }
    for effect in &turn.outcome.receipt.effects {
        println!("    {}", describe(effect));
    }
    match turn.outcome.receipt.flow {
        FlowOutcome::Advance(_) => println!("    {}", "continues".dimmed()),
        FlowOutcome::Complete => println!("    {}", "scene complete".dimmed()),
    }
    for scene in &turn.outcome.expired {
        println!("    {} {scene}", "expired".red());
    }
    println!();
}

fn describe(effect: &AppliedEffect) -> String {
    match effect {
        AppliedEffect::Resource {
            resource,
            before,
            after,
        } => format!("{resource} {before} -> {after}"),
        AppliedEffect::FullRecovery => "fully recovered".into(),
        AppliedEffect::Stat { stat, delta } => format!("{stat} {delta:+}"),
        AppliedEffect::Bond { npc, delta, after } => format!("bond with {npc} {delta:+} (now {after})"),
        AppliedEffect::Scale { scale, delta, after } => format!("{scale} {delta:+} (now {after})"),
        AppliedEffect::StateApplied { state } => format!("now {state}"),
        AppliedEffect::StateCleared { state } => format!("no longer {state}"),
        AppliedEffect::ItemGranted { item } => format!("gained {item}"),
        AppliedEffect::ItemRemoved { item } => format!("lost {item}"),
        AppliedEffect::AchievementEarned { achievement } => {
            format!("{} {achievement}", "achievement".yellow())
        }
        AppliedEffect::TimeAdvanced { from, to } => format!("time {from} -> {to}"),
        AppliedEffect::SceneSpawned { template, .. } => format!("{} {template}", "spawned".green()),
        AppliedEffect::SpawnSkipped { template, reason } => {
            format!("{} {template}: {reason}", "spawn skipped".red())
        }
        AppliedEffect::Moved { location } => format!("moved to {location}"),
    }
}

fn print_summary(session: &GameSession) {
    let state = session.state();
    let player = &state.player;
    let r = &player.resources;
    let active = session.active_scenes().count();
    let completed = session
        .scenes()
        .iter()
        .filter(|s| s.state == SceneState::Completed)
        .count();

    println!("{}", "Summary".bold());
    println!("  Turns:      {}", session.turn());
    println!("  Clock:      {}", state.clock);
    println!(
        "  Coins {}  Health {}/{}  Stamina {}/{}  Focus {}/{}  Hunger {}/{}  Resolve {}",
        r.coins,
        r.health,
        r.max_health,
        r.stamina,
        r.max_stamina,
        r.focus,
        r.max_focus,
        r.hunger,
        r.max_hunger,
        r.resolve
    );
    println!("  Scenes:     {active} active, {completed} completed");
    println!("  Situations: {} completed", player.completed_situations);
    println!();
}
