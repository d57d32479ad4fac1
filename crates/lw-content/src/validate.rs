//! Load-time validation of content packages.
//!
//! Everything that can be checked without a live world is checked here, so
//! that the engine only ever meets malformed content through a bug.

use std::collections::HashSet;

use lw_core::PlacementKind;

use crate::consequence::{Consequence, FlowControl};
use crate::filter::{PlacementFilter, Proximity};
use crate::package::ContentPackage;
use crate::requirement::{CompoundRequirement, NumericRequirement};
use crate::template::{ActionType, ChoiceTemplate, SceneTemplate, SituationTemplate};

/// A warning or error found during content validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// What the issue is about, e.g. `scene 'inn' / situation 'arrival'`.
    pub subject: String,
    /// A human-readable description of the issue.
    pub message: String,
    /// Whether this is an error (true) or a warning (false).
    pub is_error: bool,
}

impl ValidationIssue {
    fn error(subject: &str, message: impl Into<String>) -> Self {
        Self {
            subject: subject.to_string(),
            message: message.into(),
            is_error: true,
        }
    }

    fn warning(subject: &str, message: impl Into<String>) -> Self {
        Self {
            subject: subject.to_string(),
            message: message.into(),
            is_error: false,
        }
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let level = if self.is_error { "error" } else { "warning" };
        write!(f, "{level}: {}: {}", self.subject, self.message)
    }
}

/// Whether any issue is an error.
pub fn has_errors(issues: &[ValidationIssue]) -> bool {
    issues.iter().any(|i| i.is_error)
}

/// Validate a fully merged content package.
pub fn validate_package(package: &ContentPackage) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    validate_entities(package, &mut issues);

    let known = KnownKeys::from_package(package);
    let mut seen = HashSet::new();
    for scene in &package.scene_templates {
        let subject = format!("scene '{}'", scene.id);
        if !seen.insert(scene.id.as_str()) {
            issues.push(ValidationIssue::error(&subject, "duplicate scene template id"));
        }
        validate_scene(scene, &known, &mut issues);
    }

    issues
}

/// Validate only the entity declarations of a package. Used for the
/// synthetic packages scenes generate for their dependent resources.
pub fn validate_entities(package: &ContentPackage, issues: &mut Vec<ValidationIssue>) {
    check_unique("npc", package.npcs.iter().map(|n| n.key.as_str()), issues);
    check_unique("location", package.locations.iter().map(|l| l.key.as_str()), issues);
    check_unique("route", package.routes.iter().map(|r| r.key.as_str()), issues);
    check_unique("item", package.items.iter().map(|i| i.key.as_str()), issues);
    check_unique(
        "achievement",
        package.achievements.iter().map(|a| a.id.as_str()),
        issues,
    );

    let locations: HashSet<&str> = package.locations.iter().map(|l| l.key.as_str()).collect();
    for npc in &package.npcs {
        if let Some(loc) = &npc.location
            && !locations.contains(loc.as_str())
        {
            issues.push(ValidationIssue::error(
                &format!("npc '{}'", npc.key),
                format!("unknown location '{loc}'"),
            ));
        }
    }
    for route in &package.routes {
        let subject = format!("route '{}'", route.key);
        for end in [&route.from, &route.to].into_iter().flatten() {
            if !locations.contains(end.as_str()) {
                issues.push(ValidationIssue::error(
                    &subject,
                    format!("unknown location '{end}'"),
                ));
            }
        }
    }
    for key in package.locations.iter().map(|l| &l.key).chain(package.items.iter().map(|i| &i.key)) {
        if key.trim().is_empty() {
            issues.push(ValidationIssue::error("package", "entity with an empty key"));
        }
    }
}

fn check_unique<'a>(
    kind: &str,
    keys: impl Iterator<Item = &'a str>,
    issues: &mut Vec<ValidationIssue>,
) {
    let mut seen = HashSet::new();
    for key in keys {
        if !seen.insert(key) {
            issues.push(ValidationIssue::error(
                &format!("{kind} '{key}'"),
                format!("duplicate {kind} key"),
            ));
        }
    }
}

struct KnownKeys<'a> {
    scenes: HashSet<&'a str>,
    items: HashSet<&'a str>,
    achievements: HashSet<&'a str>,
    npcs: HashSet<&'a str>,
}

impl<'a> KnownKeys<'a> {
    fn from_package(package: &'a ContentPackage) -> Self {
        Self {
            scenes: package.scene_templates.iter().map(|s| s.id.as_str()).collect(),
            items: package.items.iter().map(|i| i.key.as_str()).collect(),
            achievements: package.achievements.iter().map(|a| a.id.as_str()).collect(),
            npcs: package.npcs.iter().map(|n| n.key.as_str()).collect(),
        }
    }
}

fn validate_scene(scene: &SceneTemplate, known: &KnownKeys<'_>, issues: &mut Vec<ValidationIssue>) {
    let subject = format!("scene '{}'", scene.id);

    if scene.situation_templates.is_empty() {
        issues.push(ValidationIssue::error(&subject, "scene has no situations"));
    }
    if let Some(filter) = &scene.placement_filter {
        validate_filter(filter, None, scene, known, &subject, issues);
    }
    let conditions = &scene.spawn_conditions;
    if let (Some(min), Some(max)) = (conditions.min_day, conditions.max_day)
        && min > max
    {
        issues.push(ValidationIssue::error(
            &subject,
            format!("MinDay {min} exceeds MaxDay {max}"),
        ));
    }
    validate_requirement(&conditions.requirement, None, known, &subject, issues);

    check_unique(
        "dependent location",
        scene.dependent_locations.iter().map(|l| l.key.as_str()),
        issues,
    );
    check_unique(
        "dependent item",
        scene.dependent_items.iter().map(|i| i.key.as_str()),
        issues,
    );

    let mut seen = HashSet::new();
    let mut route_seen = false;
    for situation in &scene.situation_templates {
        let sub = format!("{subject} / situation '{}'", situation.id);
        if !seen.insert(situation.id.as_str()) {
            issues.push(ValidationIssue::error(&sub, "duplicate situation id"));
        }
        validate_situation(scene, situation, route_seen, known, &sub, issues);
        route_seen |= situation.route_filter.is_some();
    }
}

fn validate_situation(
    scene: &SceneTemplate,
    situation: &SituationTemplate,
    route_seen: bool,
    known: &KnownKeys<'_>,
    subject: &str,
    issues: &mut Vec<ValidationIssue>,
) {
    let choices = situation.choice_templates.len();
    if choices == 0 {
        issues.push(ValidationIssue::error(subject, "situation has no choices"));
    } else if !(2..=4).contains(&choices) {
        issues.push(ValidationIssue::warning(
            subject,
            format!("situation has {choices} choices; two to four are expected"),
        ));
    }

    let slots = [
        (&situation.location_filter, PlacementKind::Location, "LocationFilter"),
        (&situation.npc_filter, PlacementKind::Npc, "NpcFilter"),
        (&situation.route_filter, PlacementKind::Route, "RouteFilter"),
    ];
    for (filter, kind, slot) in slots {
        let Some(filter) = filter else { continue };
        if filter.placement_type != kind {
            issues.push(ValidationIssue::error(
                subject,
                format!("{slot} has PlacementType {}", filter.placement_type),
            ));
        }
        validate_filter(filter, Some(route_seen), scene, known, subject, issues);
    }

    let mut seen = HashSet::new();
    for choice in &situation.choice_templates {
        let sub = format!("{subject} / choice '{}'", choice.id);
        if !seen.insert(choice.id.as_str()) {
            issues.push(ValidationIssue::error(&sub, "duplicate choice id"));
        }
        validate_choice(scene, situation, choice, known, &sub, issues);
    }
}

fn validate_filter(
    filter: &PlacementFilter,
    route_seen: Option<bool>,
    scene: &SceneTemplate,
    known: &KnownKeys<'_>,
    subject: &str,
    issues: &mut Vec<ValidationIssue>,
) {
    for problem in filter.problems() {
        issues.push(ValidationIssue::error(subject, problem));
    }
    if filter.proximity == Proximity::RouteDestination && route_seen != Some(true) {
        issues.push(ValidationIssue::error(
            subject,
            "RouteDestination needs a route resolved by an earlier situation",
        ));
    }
    if let Some(dep) = &filter.dependent_location
        && !scene.has_dependent_location(dep)
    {
        issues.push(ValidationIssue::error(
            subject,
            format!("unknown dependent location '{dep}'"),
        ));
    }
    for achievement in &filter.required_achievements {
        if !known.achievements.contains(achievement.as_str()) {
            issues.push(ValidationIssue::error(
                subject,
                format!("unknown achievement '{achievement}'"),
            ));
        }
    }
}

fn validate_choice(
    scene: &SceneTemplate,
    situation: &SituationTemplate,
    choice: &ChoiceTemplate,
    known: &KnownKeys<'_>,
    subject: &str,
    issues: &mut Vec<ValidationIssue>,
) {
    let is_challenge = choice.action_type == ActionType::StartChallenge;
    if is_challenge && choice.challenge.is_none() {
        issues.push(ValidationIssue::error(
            subject,
            "StartChallenge choice has no Challenge",
        ));
    }
    if !is_challenge
        && (choice.on_success_consequence.is_some() || choice.on_failure_consequence.is_some())
    {
        issues.push(ValidationIssue::warning(
            subject,
            "success/failure consequences are ignored outside challenges",
        ));
    }
    if choice.action_type == ActionType::Navigate
        && situation.location_filter.is_none()
        && situation.route_filter.is_none()
    {
        issues.push(ValidationIssue::warning(
            subject,
            "Navigate choice in a situation with no location or route",
        ));
    }

    validate_requirement(&choice.requirement, Some(scene), known, subject, issues);
    for consequence in choice.consequences() {
        validate_consequence(scene, situation, consequence, known, subject, issues);
    }
}

fn validate_requirement(
    requirement: &CompoundRequirement,
    scene: Option<&SceneTemplate>,
    known: &KnownKeys<'_>,
    subject: &str,
    issues: &mut Vec<ValidationIssue>,
) {
    for req in requirement.iter_requirements() {
        match req {
            NumericRequirement::Achievement { context }
                if !known.achievements.contains(context.as_str()) =>
            {
                issues.push(ValidationIssue::error(
                    subject,
                    format!("requirement names unknown achievement '{context}'"),
                ));
            }
            NumericRequirement::Item { context }
                if !known.items.contains(context.as_str())
                    && !scene.is_some_and(|s| s.has_dependent_item(context)) =>
            {
                issues.push(ValidationIssue::error(
                    subject,
                    format!("requirement names unknown item '{context}'"),
                ));
            }
            NumericRequirement::BondStrength { context, .. }
                if !known.npcs.contains(context.as_str()) =>
            {
                issues.push(ValidationIssue::warning(
                    subject,
                    format!("bond requirement names NPC '{context}' that is not authored"),
                ));
            }
            _ => {}
        }
    }
}

fn validate_consequence(
    scene: &SceneTemplate,
    situation: &SituationTemplate,
    consequence: &Consequence,
    known: &KnownKeys<'_>,
    subject: &str,
    issues: &mut Vec<ValidationIssue>,
) {
    match consequence.flow() {
        FlowControl::Conflict => issues.push(ValidationIssue::error(
            subject,
            "consequence sets both NextSituationTemplateId and IsTerminal",
        )),
        FlowControl::Advance(next) if scene.situation(next).is_none() => {
            issues.push(ValidationIssue::error(
                subject,
                format!("NextSituationTemplateId '{next}' is not a situation of this scene"),
            ));
        }
        _ => {}
    }

    for spawn in &consequence.scenes_to_spawn {
        if !known.scenes.contains(spawn.scene_template_id.as_str()) {
            issues.push(ValidationIssue::error(
                subject,
                format!("spawns unknown scene template '{}'", spawn.scene_template_id),
            ));
        }
    }
    for key in consequence.item_keys() {
        if !known.items.contains(key.as_str()) && !scene.has_dependent_item(key) {
            issues.push(ValidationIssue::error(subject, format!("unknown item '{key}'")));
        }
    }
    for achievement in &consequence.achievements {
        if !known.achievements.contains(achievement.as_str()) {
            issues.push(ValidationIssue::error(
                subject,
                format!("grants unknown achievement '{achievement}'"),
            ));
        }
    }
    for bond in &consequence.bond_changes {
        match &bond.npc {
            Some(key) if !known.npcs.contains(key.as_str()) => {
                issues.push(ValidationIssue::error(
                    subject,
                    format!("bond change names unknown NPC '{key}'"),
                ));
            }
            None if situation.npc_filter.is_none() => {
                issues.push(ValidationIssue::warning(
                    subject,
                    "bond change without an NPC in a situation that has none",
                ));
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::parse_package;

    fn package(scenes: &str) -> ContentPackage {
        let json = format!(
            r#"{{
                "Achievements": [ {{ "Id": "regular", "Name": "Regular" }} ],
                "Npcs": [ {{ "Key": "elena", "Name": "Elena", "Profession": "Innkeeper" }} ],
                "Items": [ {{ "Key": "bread", "Name": "Bread" }} ],
                "SceneTemplates": {scenes}
            }}"#
        );
        parse_package(&json, "test").unwrap()
    }

    fn two_choices(first: &str) -> String {
        format!(
            r#"[ {first}, {{ "Id": "leave", "ActionText": "Leave", "Consequence": {{ "IsTerminal": true }} }} ]"#
        )
    }

    fn scene_with_choice(choice: &str) -> String {
        format!(
            r#"[ {{ "Id": "inn", "SituationTemplates": [
                {{ "Id": "arrival", "ChoiceTemplates": {} }},
                {{ "Id": "supper", "ChoiceTemplates": {} }}
            ] }} ]"#,
            two_choices(choice),
            two_choices(r#"{ "Id": "eat", "ActionText": "Eat" }"#)
        )
    }

    #[test]
    fn valid_package_has_no_errors() {
        let pkg = package(&scene_with_choice(
            r#"{ "Id": "stay", "ActionText": "Stay", "Consequence": { "NextSituationTemplateId": "supper", "ItemGrants": ["bread"] } }"#,
        ));
        let issues = validate_package(&pkg);
        assert!(!has_errors(&issues), "{issues:?}");
    }

    #[test]
    fn both_flow_fields_is_error() {
        let pkg = package(&scene_with_choice(
            r#"{ "Id": "stay", "ActionText": "Stay", "Consequence": { "NextSituationTemplateId": "supper", "IsTerminal": true } }"#,
        ));
        let issues = validate_package(&pkg);
        assert!(issues.iter().any(|i| i.is_error && i.message.contains("both")));
    }

    #[test]
    fn dangling_references_are_errors() {
        let pkg = package(&scene_with_choice(
            r#"{ "Id": "stay", "ActionText": "Stay", "Consequence": {
                "NextSituationTemplateId": "cellar",
                "ItemGrants": ["cake"],
                "Achievements": ["hero"],
                "ScenesToSpawn": [ { "SceneTemplateId": "missing" } ]
            } }"#,
        ));
        let errors: Vec<_> = validate_package(&pkg)
            .into_iter()
            .filter(|i| i.is_error)
            .collect();
        assert_eq!(errors.len(), 4, "{errors:?}");
    }

    #[test]
    fn challenge_without_spec_is_error() {
        let pkg = package(&scene_with_choice(
            r#"{ "Id": "haggle", "ActionText": "Haggle", "ActionType": "StartChallenge" }"#,
        ));
        assert!(has_errors(&validate_package(&pkg)));
    }

    #[test]
    fn route_destination_needs_earlier_route() {
        let pkg = package(
            r#"[ { "Id": "trip", "SituationTemplates": [
                { "Id": "arrive",
                  "LocationFilter": { "PlacementType": "Location", "Proximity": "RouteDestination" },
                  "ChoiceTemplates": [ { "Id": "a", "ActionText": "A" }, { "Id": "b", "ActionText": "B" } ] }
            ] } ]"#,
        );
        let issues = validate_package(&pkg);
        assert!(issues.iter().any(|i| i.message.contains("RouteDestination")));
    }

    #[test]
    fn slot_kind_mismatch_is_error() {
        let pkg = package(
            r#"[ { "Id": "s", "SituationTemplates": [
                { "Id": "x", "NpcFilter": { "PlacementType": "Location" },
                  "ChoiceTemplates": [ { "Id": "a", "ActionText": "A" }, { "Id": "b", "ActionText": "B" } ] }
            ] } ]"#,
        );
        assert!(has_errors(&validate_package(&pkg)));
    }

    #[test]
    fn single_choice_is_warning() {
        let pkg = package(
            r#"[ { "Id": "s", "SituationTemplates": [
                { "Id": "x", "ChoiceTemplates": [ { "Id": "a", "ActionText": "A" } ] }
            ] } ]"#,
        );
        let issues = validate_package(&pkg);
        assert!(!has_errors(&issues));
        assert_eq!(issues.len(), 1);
        assert_eq!(
            issues[0].to_string(),
            "warning: scene 's' / situation 'x': situation has 1 choices; two to four are expected"
        );
    }

    #[test]
    fn requirement_on_own_dependent_item_is_accepted() {
        let pkg = package(
            r#"[ { "Id": "vault", "DependentItems": [ { "Key": "key", "Name": "Vault Key" } ],
                "SituationTemplates": [
                { "Id": "door", "ChoiceTemplates": [
                    { "Id": "open", "ActionText": "Open",
                      "Requirement": { "OrPaths": [ { "Requirements": [ { "Type": "Item", "Context": "key" } ] } ] } },
                    { "Id": "grab", "ActionText": "Grab the key", "Consequence": { "ItemGrants": ["key"] } }
                ] }
            ] } ]"#,
        );
        let issues = validate_package(&pkg);
        assert!(!has_errors(&issues), "{issues:?}");

        let pkg = package(&scene_with_choice(
            r#"{ "Id": "open", "ActionText": "Open",
                 "Requirement": { "OrPaths": [ { "Requirements": [ { "Type": "Item", "Context": "key" } ] } ] } }"#,
        ));
        let issues = validate_package(&pkg);
        assert!(issues.iter().any(|i| i.is_error && i.message.contains("unknown item 'key'")));
    }

    #[test]
    fn unkeyed_bond_change_needs_a_situation_npc() {
        let pkg = package(
            r#"[ { "Id": "chat", "PlacementFilter": { "PlacementType": "NPC", "Profession": "Innkeeper" },
                "SituationTemplates": [
                { "Id": "talk", "ChoiceTemplates": [
                    { "Id": "smile", "ActionText": "Smile", "Consequence": { "BondChanges": [ { "Delta": 1 } ] } },
                    { "Id": "frown", "ActionText": "Frown" }
                ] }
            ] } ]"#,
        );
        let issues = validate_package(&pkg);
        assert!(!has_errors(&issues));
        assert!(issues.iter().any(|i| !i.is_error && i.message.contains("bond change without an NPC")));
    }

    #[test]
    fn duplicate_keys_are_errors() {
        let json = r#"{
            "Locations": [ { "Key": "square", "Name": "Square" }, { "Key": "square", "Name": "Other" } ],
            "Npcs": [ { "Key": "tom", "Name": "Tom", "Location": "docks" } ]
        }"#;
        let pkg = parse_package(json, "test").unwrap();
        let issues = validate_package(&pkg);
        assert_eq!(issues.iter().filter(|i| i.is_error).count(), 2);
    }
}
