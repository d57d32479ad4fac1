//! Trace export.

use std::fmt::Write as _;

use super::{SceneNodeId, SpawnTrace, TraceParent};

impl SpawnTrace {
    /// Export the trace as JSON.
    pub fn export_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Export the trace as a markdown outline: each root scene with its
    /// situations, executed choices, and the scenes those choices spawned.
    pub fn export_markdown(&self) -> String {
        let mut out = String::from("# Spawn Trace\n\n");
        if self.is_empty() {
            out.push_str("_No scenes recorded._\n");
            return out;
        }
        let orphans: Vec<SceneNodeId> = self
            .scenes()
            .iter()
            .filter(|n| matches!(n.parent, TraceParent::Situation(_)))
            .map(|n| n.id)
            .collect();
        for root in self.roots() {
            self.write_scene(&mut out, *root, 0);
        }
        if !orphans.is_empty() {
            out.push_str("\n## Untaken previews\n\n");
            for id in orphans {
                self.write_scene(&mut out, id, 0);
            }
        }
        out
    }

    fn write_scene(&self, out: &mut String, id: SceneNodeId, depth: usize) {
        let Some(scene) = self.scene(id) else {
            return;
        };
        let pad = "  ".repeat(depth);
        let _ = write!(
            out,
            "{pad}- **{}** `{}` ({}, {:?}, {})",
            scene.display_name, scene.template_id, scene.state, scene.trigger, scene.spawned_at
        );
        if let Some(placement) = &scene.placement {
            let _ = write!(out, " at {}", placement.name());
        }
        if scene.discarded {
            out.push_str(" _discarded_");
        }
        out.push('\n');

        for situation_id in &scene.situations {
            let Some(situation) = self.situation(*situation_id) else {
                continue;
            };
            let mark = if situation.completed { "x" } else { " " };
            let _ = writeln!(out, "{pad}  - [{mark}] {}", situation.name);
            for choice_id in &situation.choices {
                let Some(choice) = self.choice(*choice_id) else {
                    continue;
                };
                let _ = write!(out, "{pad}    - chose \"{}\"", choice.action_text);
                if let Some(challenge) = &choice.challenge {
                    let _ = write!(out, " ({})", challenge.summary);
                }
                let _ = writeln!(out, ", {} effects", choice.effects.len());
                for spawned in &choice.spawned_scenes {
                    self.write_scene(out, *spawned, depth + 3);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::SceneState;
    use crate::test_support::bare_scene;
    use lw_core::{GameClock, Player, World};

    #[test]
    fn empty_trace_says_so() {
        assert!(SpawnTrace::new().export_markdown().contains("No scenes recorded"));
    }

    #[test]
    fn markdown_nests_spawned_scenes() {
        let world = World::default();
        let parent = bare_scene(SceneState::Active);
        let mut child = bare_scene(SceneState::Active);
        child.display_name = "Aftermath".into();

        let mut trace = SpawnTrace::new();
        let parent_node = trace.record_scene_spawn(&parent, &world, TraceParent::Root, None);
        let situation = &parent.situations[0];
        let situation_node = trace.record_situation_spawn(parent_node, situation, &world, Vec::new());
        let choice_node = trace.record_choice_execution(
            situation_node,
            &situation.choices[0],
            &Player::default(),
            GameClock::default(),
        );
        let child_node = trace.record_scene_spawn(&child, &world, TraceParent::Choice(choice_node), None);
        trace.link_spawned(choice_node, child_node);

        let md = trace.export_markdown();
        assert!(md.contains(&parent.display_name));
        assert!(md.contains("chose \""));
        let child_line = md.lines().find(|l| l.contains("Aftermath")).unwrap();
        assert!(child_line.starts_with("      - "));
    }

    #[test]
    fn json_round_trip() {
        let world = World::default();
        let scene = bare_scene(SceneState::Active);
        let mut trace = SpawnTrace::new();
        trace.record_scene_spawn(&scene, &world, TraceParent::Root, None);
        let json = trace.export_json().unwrap();
        let back: SpawnTrace = serde_json::from_str(&json).unwrap();
        assert_eq!(back, trace);
    }
}
