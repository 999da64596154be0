//! # Head Selection Policy
//!
//! Picks the head a spawned character wears.
//!
//! On every stage reset a [`HeadRotation`] draws a bounded, shuffled subset
//! of the selectable heads of each gender. These are the heads loaded for the
//! stage. Automatic choices walk that subset round-robin, so every active
//! head appears before any head repeats.
//!
//! The policy never owns randomness. Every call borrows the caller's stream,
//! so a fixed seed gives a fixed sequence of heads.

use rand::seq::SliceRandom;
use rand::Rng;

use mannequin_shared::{Gender, HeadId, SpawnFlags};

use crate::error::{BodyError, BodyResult};
use crate::registry::{BodyDefinition, BodyRegistry, HeadDefinition};

/// Gender buckets the rotation draws from, in draw order.
const BUCKETS: [Option<Gender>; 3] = [Some(Gender::Male), Some(Gender::Female), None];

/// The heads active on the current stage and the round-robin cursor.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HeadRotation {
    active: Vec<HeadId>,
    cursor: usize,
}

impl HeadRotation {
    /// Draws up to `per_gender` selectable heads from each gender bucket.
    pub fn new<R: Rng + ?Sized>(registry: &BodyRegistry, per_gender: usize, rng: &mut R) -> Self {
        let mut active = Vec::with_capacity(
            per_gender
                .saturating_mul(BUCKETS.len())
                .min(registry.heads().len()),
        );

        for bucket in BUCKETS {
            let mut candidates: Vec<HeadId> = registry
                .heads()
                .iter()
                .filter(|h| h.selectable && h.gender == bucket)
                .map(|h| h.id)
                .collect();
            candidates.shuffle(rng);
            candidates.truncate(per_gender);
            active.extend(candidates);
        }

        tracing::debug!(active = active.len(), per_gender, "head rotation drawn");
        Self { active, cursor: 0 }
    }

    /// Heads active on this stage, in rotation order.
    #[must_use]
    pub fn active(&self) -> &[HeadId] {
        &self.active
    }

    /// Picks a head for `body` automatically.
    ///
    /// Walks the rotation from the cursor to the next head that suits the
    /// body. When no active head suits, falls back to a random selectable head
    /// that suits, then a random selectable head of the right race, then any
    /// head of the right race.
    ///
    /// # Errors
    ///
    /// Returns `NoCompatibleHead` if no registered head fits the body's race.
    pub fn choose<R: Rng + ?Sized>(
        &mut self,
        registry: &BodyRegistry,
        body: &BodyDefinition,
        rng: &mut R,
    ) -> BodyResult<HeadId> {
        let n = self.active.len();
        for step in 0..n {
            let index = (self.cursor + step) % n;
            let suits = registry
                .head(self.active[index])
                .is_ok_and(|h| h.suits(body));
            if suits {
                self.cursor = (index + 1) % n;
                return Ok(self.active[index]);
            }
        }

        tracing::debug!(body = %body.id, "no active head suits, drawing from registry");
        fallback(registry, body, rng)
    }

    /// Resolves the head for one spawn.
    ///
    /// - bodies with an integrated head get `None`
    /// - a forced explicit head is used as is, race unchecked
    /// - an unforced explicit head is only checked to exist
    /// - players get the body's canonical head and consume no randomness
    /// - everything else goes through [`HeadRotation::choose`]
    ///
    /// # Errors
    ///
    /// `InvalidHeadId` for an unregistered explicit head, `NoCompatibleHead`
    /// when nothing fits.
    pub fn resolve<R: Rng + ?Sized>(
        &mut self,
        registry: &BodyRegistry,
        body: &BodyDefinition,
        explicit: Option<HeadId>,
        flags: SpawnFlags,
        rng: &mut R,
    ) -> BodyResult<Option<HeadId>> {
        if !body.requires_head {
            return Ok(None);
        }

        if let Some(id) = explicit {
            let head = registry.head(id)?;
            if flags.contains(SpawnFlags::FORCE_HEAD) {
                if !head.fits_race(body) {
                    tracing::debug!(body = %body.id, head = %id, "forced head bypasses race check");
                }
                return Ok(Some(id));
            }
            tracing::debug!(body = %body.id, head = %id, "explicit head not forced, choosing");
        }

        if flags.is_player() {
            return registry
                .canonical_head(body)
                .map(Some)
                .ok_or(BodyError::NoCompatibleHead {
                    body: body.id,
                    race: body.race,
                });
        }

        self.choose(registry, body, rng).map(Some)
    }
}

fn fallback<R: Rng + ?Sized>(
    registry: &BodyRegistry,
    body: &BodyDefinition,
    rng: &mut R,
) -> BodyResult<HeadId> {
    let tiers: [&dyn Fn(&HeadDefinition) -> bool; 3] = [
        &|h: &HeadDefinition| h.selectable && h.suits(body),
        &|h: &HeadDefinition| h.selectable && h.fits_race(body),
        &|h: &HeadDefinition| h.fits_race(body),
    ];

    for tier in tiers {
        let pool: Vec<HeadId> = registry
            .heads()
            .iter()
            .filter(|h| tier(h))
            .map(|h| h.id)
            .collect();
        if let Some(&id) = pool.choose(rng) {
            return Ok(id);
        }
    }

    Err(BodyError::NoCompatibleHead {
        body: body.id,
        race: body.race,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mannequin_shared::BodyId;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashSet;

    fn registry() -> BodyRegistry {
        BodyRegistry::builtin().unwrap()
    }

    #[test]
    fn test_rotation_respects_budget() {
        let reg = registry();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let rotation = HeadRotation::new(&reg, 2, &mut rng);

        // Two male, two female, and the single ungendered selectable head.
        assert_eq!(rotation.active().len(), 5);
        assert!(!rotation.active().contains(&HeadId(20)));
        assert!(!rotation.active().contains(&HeadId(21)));
    }

    #[test]
    fn test_rotation_budget_larger_than_registry() {
        let reg = registry();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let rotation = HeadRotation::new(&reg, usize::MAX, &mut rng);

        let selectable = reg.heads().iter().filter(|h| h.selectable).count();
        assert_eq!(rotation.active().len(), selectable);
    }

    #[test]
    fn test_same_seed_same_choices() {
        let reg = registry();
        let guard = reg.body(BodyId(0)).unwrap();

        let run = |seed| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut rotation = HeadRotation::new(&reg, 3, &mut rng);
            (0..10)
                .map(|_| rotation.choose(&reg, guard, &mut rng).unwrap())
                .collect::<Vec<_>>()
        };

        assert_eq!(run(42), run(42));
    }

    #[test]
    fn test_round_robin_before_repeat() {
        let reg = registry();
        let guard = reg.body(BodyId(0)).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut rotation = HeadRotation::new(&reg, 4, &mut rng);

        let first: HashSet<HeadId> = (0..4)
            .map(|_| rotation.choose(&reg, guard, &mut rng).unwrap())
            .collect();
        assert_eq!(first.len(), 4);
        for id in &first {
            let head = reg.head(*id).unwrap();
            assert!(head.suits(guard));
        }
    }

    #[test]
    fn test_fallback_outside_rotation() {
        let reg = registry();
        let grey = reg.body(BodyId(5)).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        // Empty rotation: everything goes through the fallback.
        let mut rotation = HeadRotation::new(&reg, 0, &mut rng);
        assert!(rotation.active().is_empty());
        assert_eq!(rotation.choose(&reg, grey, &mut rng), Ok(HeadId(30)));
    }

    #[test]
    fn test_no_compatible_head() {
        let reg = registry();
        let skedar = reg.body(BodyId(7)).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut rotation = HeadRotation::new(&reg, 4, &mut rng);
        assert!(matches!(
            rotation.choose(&reg, skedar, &mut rng),
            Err(BodyError::NoCompatibleHead { .. })
        ));
    }

    #[test]
    fn test_resolve_forced_and_unforced() {
        let reg = registry();
        let guard = reg.body(BodyId(0)).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut rotation = HeadRotation::new(&reg, 4, &mut rng);

        // Forced: maian head on a human body is accepted.
        let forced = rotation
            .resolve(&reg, guard, Some(HeadId(30)), SpawnFlags::FORCE_HEAD, &mut rng)
            .unwrap();
        assert_eq!(forced, Some(HeadId(30)));

        // Unforced: the same request goes through the rotation.
        let chosen = rotation
            .resolve(&reg, guard, Some(HeadId(30)), SpawnFlags::NONE, &mut rng)
            .unwrap()
            .unwrap();
        assert!(reg.head(chosen).unwrap().fits_race(guard));

        // Unforced and compatible is still a rotation choice; the named head
        // is not selectable so the rotation never hands it out.
        let named = rotation
            .resolve(&reg, guard, Some(HeadId(21)), SpawnFlags::NONE, &mut rng)
            .unwrap()
            .unwrap();
        assert_ne!(named, HeadId(21));
        assert!(rotation.active().contains(&named));

        assert_eq!(
            rotation.resolve(&reg, guard, Some(HeadId(999)), SpawnFlags::NONE, &mut rng),
            Err(BodyError::InvalidHeadId(HeadId(999)))
        );

        assert_eq!(
            rotation.resolve(&reg, guard, Some(HeadId(999)), SpawnFlags::FORCE_HEAD, &mut rng),
            Err(BodyError::InvalidHeadId(HeadId(999)))
        );
    }

    #[test]
    fn test_resolve_player_uses_canonical_head() {
        let reg = registry();
        let agent = reg.body(BodyId(4)).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut rotation = HeadRotation::new(&reg, 4, &mut rng);

        let before = rng.clone();
        let head = rotation
            .resolve(&reg, agent, None, SpawnFlags::PLAYER, &mut rng)
            .unwrap();
        assert_eq!(head, Some(HeadId(20)));
        // No randomness consumed.
        assert_eq!(rng, before);
    }

    #[test]
    fn test_resolve_integrated_head() {
        let reg = registry();
        let skedar = reg.body(BodyId(7)).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut rotation = HeadRotation::default();
        assert_eq!(
            rotation.resolve(&reg, skedar, Some(HeadId(0)), SpawnFlags::FORCE_HEAD, &mut rng),
            Ok(None)
        );
    }
}
