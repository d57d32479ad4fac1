use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Generate a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Generate an identifier from a caller-owned RNG, so seeded
            /// sessions produce the same ids on every run.
            pub fn from_rng<R: Rng + ?Sized>(rng: &mut R) -> Self {
                Self(uuid::Builder::from_random_bytes(rng.random()).into_uuid())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", &self.0.to_string()[..8])
            }
        }
    };
}

uuid_id! {
    /// Unique identifier for every NPC, location, route, and item in the world.
    EntityId
}

uuid_id! {
    /// Unique identifier of a live scene instance.
    SceneId
}

uuid_id! {
    /// Unique identifier of a live situation inside a scene.
    SituationId
}

uuid_id! {
    /// Unique identifier of a live choice inside a situation.
    ChoiceId
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn seeded_ids_repeat() {
        let mut a = StdRng::seed_from_u64(7);
        let mut b = StdRng::seed_from_u64(7);
        assert_eq!(SceneId::from_rng(&mut a), SceneId::from_rng(&mut b));
        assert_ne!(SceneId::from_rng(&mut a), SceneId::from_rng(&mut a));
    }

    #[test]
    fn display_is_short() {
        let id = EntityId::new();
        assert_eq!(id.to_string().len(), 8);
    }
}
