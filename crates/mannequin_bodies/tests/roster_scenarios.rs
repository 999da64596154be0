//! Stage roster scenarios, driven end to end through `BodiesSystem`.

use std::sync::Arc;

use mannequin_bodies::{
    AssetRef, BodiesConfig, BodiesSystem, BodyError, BodyRegistry, InMemoryAssets, PackedChr, Pad,
    Roster,
};
use mannequin_core::RandomStream;
use mannequin_shared::{BodyId, HeadId, PadId, Race, RoomId, SpawnFlags, StageId, Vec3};

const STAGE: StageId = StageId(1);

fn system_with(config: BodiesConfig) -> BodiesSystem<InMemoryAssets> {
    let registry = Arc::new(BodyRegistry::builtin().unwrap());
    let mut system = BodiesSystem::new(config, InMemoryAssets::from_registry(&registry));
    system.init(registry);
    system
}

fn system() -> BodiesSystem<InMemoryAssets> {
    system_with(BodiesConfig::default())
}

fn capacity(pool_capacity: usize) -> BodiesConfig {
    BodiesConfig {
        pool_capacity,
        ..BodiesConfig::default()
    }
}

fn record(body: u16) -> PackedChr {
    PackedChr {
        body: BodyId(body),
        head: None,
        flags: SpawnFlags::NONE,
        chr_num: body,
        pad: PadId(body),
        team: 0,
        squadron: 0,
    }
}

#[test]
fn test_mixed_roster_isolates_bad_record() {
    let mut bodies = system();
    let mut rng = RandomStream::from_seed(1);
    bodies.reset(STAGE, &mut rng).unwrap();

    let forced = PackedChr {
        head: Some(HeadId(0)),
        flags: SpawnFlags::FORCE_HEAD,
        ..record(5)
    };
    let roster = [record(0), forced, record(999)];
    let report = bodies.load_roster(STAGE, &roster, &mut rng);

    assert_eq!(report.spawned.len(), 2);
    assert_eq!(
        report.failures,
        vec![(2, BodyError::InvalidBodyId(BodyId(999)))]
    );
    assert_eq!(bodies.models().count(), 2);

    // Record 1: a head whose race set contains the body's race.
    let guard = bodies.model(report.spawned[0].1).unwrap();
    let registry = Arc::clone(bodies.registry().unwrap());
    let head = registry.head(guard.head.unwrap()).unwrap();
    assert!(head.races.contains(Race::Human));

    // Record 2: the forced human head sits on the maian body anyway.
    let grey = bodies.model(report.spawned[1].1).unwrap();
    assert_eq!(grey.head, Some(HeadId(0)));
    assert!(grey.attachment.is_some());
    assert!(!registry.head(HeadId(0)).unwrap().races.contains(Race::Maian));
}

#[test]
fn test_capacity_two_rejects_third() {
    let mut bodies = system_with(capacity(2));
    let mut rng = RandomStream::from_seed(2);
    bodies.reset(STAGE, &mut rng).unwrap();

    bodies.allocate_chr(STAGE, &record(0), 0, &mut rng).unwrap();
    bodies.allocate_chr(STAGE, &record(1), 1, &mut rng).unwrap();
    assert_eq!(bodies.free_capacity(), 0);

    assert_eq!(
        bodies.allocate_chr(STAGE, &record(2), 2, &mut rng),
        Err(BodyError::PoolExhausted {
            stage: STAGE,
            capacity: 2
        })
    );
    assert_eq!(bodies.models().count(), 2);
    assert!(bodies.chr(2).is_none());
}

#[test]
fn test_eyespy_without_record() {
    let mut bodies = system();
    let mut rng = RandomStream::from_seed(3);
    bodies.reset(STAGE, &mut rng).unwrap();

    let pad = Pad {
        id: PadId(40),
        position: Vec3::new(120.0, 0.0, -64.0),
    };
    let prop = bodies.allocate_eyespy(pad, RoomId(3), &mut rng).unwrap();

    let model = bodies.model(prop.model).unwrap();
    assert!(!model.has_head());
    assert!(model.attachment.is_none());
    assert_eq!(model.body, bodies.config().eyespy_body);
    assert_eq!((prop.pad, prop.room), (PadId(40), RoomId(3)));
    assert!(bodies.roster().unwrap().is_empty());
}

#[test]
fn test_remaining_tracks_allocations() {
    let mut bodies = system_with(capacity(6));
    let mut rng = RandomStream::from_seed(4);
    bodies.reset(STAGE, &mut rng).unwrap();

    for n in 0..6 {
        bodies
            .allocate_model(BodyId(7), None, SpawnFlags::NONE, &mut rng)
            .unwrap();
        assert_eq!(bodies.free_capacity(), 6 - (n + 1));
    }
    assert!(matches!(
        bodies.allocate_model(BodyId(7), None, SpawnFlags::NONE, &mut rng),
        Err(BodyError::PoolExhausted { .. })
    ));
    assert_eq!(bodies.free_capacity(), 0);
}

#[test]
fn test_reset_restores_capacity_and_kills_handles() {
    let mut bodies = system_with(capacity(3));
    let mut rng = RandomStream::from_seed(5);
    bodies.reset(STAGE, &mut rng).unwrap();

    let report = bodies.load_roster(STAGE, &[record(0), record(1), record(7)], &mut rng);
    assert!(report.is_clean());
    assert_eq!(bodies.free_capacity(), 0);

    bodies.reset(StageId(2), &mut rng).unwrap();
    assert_eq!(bodies.free_capacity(), 3);
    for (_, handle) in &report.spawned {
        assert!(bodies.model(*handle).is_none());
    }
    assert!(bodies.chr(0).is_none());

    // The old stage number is rejected now.
    assert!(matches!(
        bodies.allocate_chr(STAGE, &record(0), 0, &mut rng),
        Err(BodyError::StageMismatch { .. })
    ));
}

#[test]
fn test_exhaustion_short_circuits_asset_loads() {
    let mut bodies = system_with(capacity(1));
    let mut rng = RandomStream::from_seed(6);
    bodies.reset(STAGE, &mut rng).unwrap();

    bodies.allocate_chr(STAGE, &record(7), 0, &mut rng).unwrap();
    let loads = bodies.cache().loader().load_count();

    for index in 1..4 {
        assert!(matches!(
            bodies.allocate_chr(STAGE, &record(8), index, &mut rng),
            Err(BodyError::PoolExhausted { .. })
        ));
    }
    assert_eq!(bodies.cache().loader().load_count(), loads);
}

#[test]
fn test_load_failure_skips_only_that_record() {
    let mut bodies = system();
    let mut rng = RandomStream::from_seed(7);
    bodies.reset(STAGE, &mut rng).unwrap();
    bodies
        .loader_mut()
        .mark_corrupt(AssetRef::Body(BodyId(1)), "bad checksum");

    let report = bodies.load_roster(STAGE, &[record(0), record(1), record(7)], &mut rng);
    assert_eq!(report.spawned.len(), 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].0, 1);
    assert!(matches!(report.failures[0].1, BodyError::LoadFailure(_)));
    assert_eq!(bodies.free_capacity(), bodies.config().pool_capacity - 2);
}

#[test]
fn test_same_seed_same_roster() {
    let roster = Roster::from_toml_str(include_str!("../data/roster_demo.toml")).unwrap();

    let run = || {
        let mut bodies = system();
        let mut rng = RandomStream::from_seed(0xBEEF);
        bodies.reset(roster.stage, &mut rng).unwrap();
        let report = bodies.load_roster(roster.stage, &roster.chrs, &mut rng);
        report
            .spawned
            .iter()
            .map(|(_, handle)| {
                let model = bodies.model(*handle).unwrap();
                (model.body, model.head, model.eyewear, model.height_factor.to_bits())
            })
            .collect::<Vec<_>>()
    };

    let first = run();
    assert_eq!(first.len(), roster.chrs.len());
    assert_eq!(first, run());
}

#[test]
fn test_demo_roster_heads() {
    let roster = Roster::from_toml_str(include_str!("../data/roster_demo.toml")).unwrap();
    let mut bodies = system();
    let mut rng = RandomStream::from_seed(9);
    bodies.reset(roster.stage, &mut rng).unwrap();

    let report = bodies.load_roster(roster.stage, &roster.chrs, &mut rng);
    assert!(report.is_clean());

    // Forced named head, player default head, integrated skedar head.
    assert_eq!(bodies.chr(2).unwrap().head, Some(HeadId(21)));
    assert_eq!(bodies.chr(3).unwrap().head, Some(HeadId(20)));
    assert_eq!(bodies.chr(4).unwrap().head, None);
}

#[test]
fn test_stage_budget_override() {
    let config = BodiesConfig::from_toml_str(include_str!("../data/config.toml")).unwrap();
    let mut bodies = system_with(config);
    let mut rng = RandomStream::from_seed(10);

    bodies.reset(StageId(9), &mut rng).unwrap();
    assert_eq!(bodies.free_capacity(), 24);
    // Three male, three female, one ungendered.
    assert_eq!(bodies.active_heads().len(), 7);

    bodies.reset(StageId(2), &mut rng).unwrap();
    assert_eq!(bodies.free_capacity(), bodies.config().pool_capacity);
}

#[test]
fn test_roster_fits_preflight() {
    let mut bodies = system_with(capacity(4));
    let mut rng = RandomStream::from_seed(11);
    bodies.reset(STAGE, &mut rng).unwrap();

    assert!(bodies.roster_fits(4));
    assert!(!bodies.roster_fits(5));
    bodies.load_roster(STAGE, &[record(0), record(7)], &mut rng);
    assert!(bodies.roster_fits(2));
    assert!(!bodies.roster_fits(3));
}

#[test]
fn test_choose_head_only_compatible() {
    let mut bodies = system();
    let mut rng = RandomStream::from_seed(12);
    bodies.reset(STAGE, &mut rng).unwrap();
    let registry = Arc::clone(bodies.registry().unwrap());

    for body in [BodyId(0), BodyId(1), BodyId(5)] {
        let race = bodies.race(body).unwrap();
        for _ in 0..20 {
            let head = bodies.choose_head(body, &mut rng).unwrap();
            assert!(registry.head(head).unwrap().races.contains(race));
        }
    }
    assert!(matches!(
        bodies.choose_head(BodyId(7), &mut rng),
        Err(BodyError::NoCompatibleHead { .. })
    ));
}

#[test]
fn test_failed_records_keep_their_indices() {
    let mut bodies = system();
    let mut rng = RandomStream::from_seed(13);
    bodies.reset(STAGE, &mut rng).unwrap();

    let first = bodies.load_roster(STAGE, &[record(0), record(999)], &mut rng);
    assert_eq!(first.spawned.len(), 1);
    assert_eq!(first.spawned[0].0, 0);
    assert_eq!(first.failures[0].0, 1);

    // The next roster starts after the failed index, not after the last spawn.
    let second = bodies.load_roster(STAGE, &[record(1)], &mut rng);
    assert!(second.is_clean());
    assert_eq!(second.spawned[0].0, 2);
    assert!(bodies.chr(1).is_none());
    assert_eq!(bodies.chr(2).map(|c| c.body), Some(BodyId(1)));

    // A failed direct spawn moves the cursor too.
    assert!(bodies.allocate_chr(STAGE, &record(999), 7, &mut rng).is_err());
    let third = bodies.load_roster(STAGE, &[record(0)], &mut rng);
    assert_eq!(third.spawned[0].0, 8);
}

#[test]
fn test_last_command_index_ends_the_roster() {
    let mut bodies = system();
    let mut rng = RandomStream::from_seed(14);
    bodies.reset(STAGE, &mut rng).unwrap();

    bodies.allocate_chr(STAGE, &record(0), u32::MAX - 1, &mut rng).unwrap();
    let report = bodies.load_roster(STAGE, &[record(1), record(7)], &mut rng);
    assert_eq!(report.spawned.len(), 1);
    assert_eq!(report.spawned[0].0, u32::MAX);
    assert!(report.failures.is_empty());
    assert_eq!(bodies.models().count(), 2);

    // Nothing is left to hand out.
    assert!(bodies.load_roster(STAGE, &[record(1)], &mut rng).spawned.is_empty());
}
