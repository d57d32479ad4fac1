//! `{Token}` substitution in authored text.

use lw_core::{EntityId, EntityRef, World};

/// Values available to placeholder substitution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaceholderContext {
    /// `{NpcName}`
    pub npc_name: Option<String>,
    /// `{NpcProfession}`
    pub npc_profession: Option<String>,
    /// `{NpcPersonality}`
    pub npc_personality: Option<String>,
    /// `{LocationName}`
    pub location_name: Option<String>,
    /// `{LocationPurpose}`
    pub location_purpose: Option<String>,
    /// `{RouteName}`
    pub route_name: Option<String>,
    /// `{RouteDestination}`
    pub route_destination: Option<String>,
    /// `{PlayerName}`
    pub player_name: Option<String>,
}

impl PlaceholderContext {
    /// Build a context from resolved entities.
    pub fn from_entities(
        world: &World,
        npc: Option<EntityId>,
        location: Option<EntityId>,
        route: Option<EntityId>,
    ) -> Self {
        let mut ctx = Self::default();
        if let Some(npc) = npc.and_then(|id| world.npc(id)) {
            ctx.npc_name = Some(npc.name.clone());
            ctx.npc_profession = Some(npc.profession.to_string());
            ctx.npc_personality = Some(npc.personality.to_string());
        }
        if let Some(location) = location.and_then(|id| world.location(id)) {
            ctx.location_name = Some(location.name.clone());
            ctx.location_purpose = Some(location.purpose.to_string());
        }
        if let Some(route) = route.and_then(|id| world.route(id)) {
            ctx.route_name = Some(route.name.clone());
            ctx.route_destination = route
                .to
                .and_then(|to| world.location(to))
                .map(|l| l.name.clone());
        }
        ctx
    }

    /// Build a context from a scene placement. An NPC placement also brings
    /// in the NPC's location.
    pub fn from_placement(world: &World, placement: Option<EntityRef>) -> Self {
        match placement {
            Some(EntityRef::Npc(id)) => {
                let location = world.npc(id).and_then(|n| n.location);
                Self::from_entities(world, Some(id), location, None)
            }
            Some(EntityRef::Location(id)) => Self::from_entities(world, None, Some(id), None),
            Some(EntityRef::Route(id)) => Self::from_entities(world, None, None, Some(id)),
            None => Self::default(),
        }
    }

    /// Builder: set the player name.
    pub fn with_player(mut self, name: impl Into<String>) -> Self {
        self.player_name = Some(name.into());
        self
    }

    /// Fill unset values from another context.
    pub fn or(mut self, fallback: &PlaceholderContext) -> Self {
        let fill = |slot: &mut Option<String>, other: &Option<String>| {
            if slot.is_none() {
                slot.clone_from(other);
            }
        };
        fill(&mut self.npc_name, &fallback.npc_name);
        fill(&mut self.npc_profession, &fallback.npc_profession);
        fill(&mut self.npc_personality, &fallback.npc_personality);
        fill(&mut self.location_name, &fallback.location_name);
        fill(&mut self.location_purpose, &fallback.location_purpose);
        fill(&mut self.route_name, &fallback.route_name);
        fill(&mut self.route_destination, &fallback.route_destination);
        fill(&mut self.player_name, &fallback.player_name);
        self
    }

    fn value(&self, token: &str) -> Option<&str> {
        let slot = match token {
            "NpcName" => &self.npc_name,
            "NpcProfession" => &self.npc_profession,
            "NpcPersonality" => &self.npc_personality,
            "LocationName" => &self.location_name,
            "LocationPurpose" => &self.location_purpose,
            "RouteName" => &self.route_name,
            "RouteDestination" => &self.route_destination,
            "PlayerName" => &self.player_name,
            _ => return None,
        };
        slot.as_deref()
    }

    /// Replace every known token that has a value. Unknown or unbound tokens
    /// are left untouched.
    pub fn substitute(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            match after.find('}') {
                Some(close) => {
                    let token = &after[..close];
                    match self.value(token) {
                        Some(value) => out.push_str(value),
                        None => {
                            out.push('{');
                            out.push_str(token);
                            out.push('}');
                        }
                    }
                    rest = &after[close + 1..];
                }
                None => {
                    out.push_str(&rest[open..]);
                    rest = "";
                }
            }
        }
        out.push_str(rest);
        out
    }
}
