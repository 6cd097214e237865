use laggard::network::core::queue::{PacketArena, PacketQueue};
use laggard::network::modules::{BandwidthModule, LagModule, PacketModule};
use laggard::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::rc::Rc;

fn seeded_pipeline(clock: &Rc<ManualClock>, seed: u64) -> Pipeline<Rc<ManualClock>> {
    let modules: Vec<Box<dyn PacketModule>> = vec![
        Box::new(LagModule::with_seed(seed)),
        Box::new(BandwidthModule::new()),
    ];
    Pipeline::with_modules(modules, Rc::clone(clock))
}

fn packet(tag: u8, size: usize, direction: Direction) -> PacketData {
    let mut payload = vec![0u8; size.max(1)];
    payload[0] = tag;
    PacketData::new(payload, direction)
}

#[test]
fn lag_releases_both_packets_at_sixty_ms() {
    let clock = Rc::new(ManualClock::new(0));
    let mut pipeline = seeded_pipeline(&clock, 1);
    pipeline
        .apply_settings(&SettingsBuilder::new().lag(50).build())
        .unwrap();

    pipeline.enqueue(packet(1, 60, Direction::Inbound));
    pipeline.enqueue(packet(2, 60, Direction::Inbound));
    assert!(pipeline.tick().unwrap());
    assert!(pipeline.take_outgoing().is_empty());

    clock.set(60);
    assert!(!pipeline.tick().unwrap());
    let tags: Vec<u8> = pipeline
        .take_outgoing()
        .iter()
        .map(|p| p.payload[0])
        .collect();
    assert_eq!(tags, vec![1, 2]);
}

#[test]
fn lag_never_releases_early() {
    let clock = Rc::new(ManualClock::new(500));
    let mut pipeline = seeded_pipeline(&clock, 2);
    pipeline
        .apply_settings(&SettingsBuilder::new().lag(120).build())
        .unwrap();

    pipeline.enqueue(packet(1, 10, Direction::Outbound));
    for now in 500..620 {
        clock.set(now);
        pipeline.tick().unwrap();
        assert!(pipeline.take_outgoing().is_empty(), "released at {}", now);
    }

    clock.set(620);
    pipeline.tick().unwrap();
    assert_eq!(pipeline.take_outgoing().len(), 1);
}

#[test]
fn full_ratio_jitter_stays_within_bounds() {
    let clock = Rc::new(ManualClock::new(0));
    let mut pipeline = seeded_pipeline(&clock, 42);
    let settings = SettingsBuilder::new().lag(100).with_jitter(30, 100).build();
    pipeline.apply_settings(&settings).unwrap();

    for tag in 0..200u8 {
        pipeline.enqueue(packet(tag, 10, Direction::Inbound));
    }

    let mut released_at = Vec::new();
    for now in 0..=200u32 {
        clock.set(now);
        pipeline.tick().unwrap();
        for _ in pipeline.take_outgoing() {
            released_at.push(now);
        }
    }

    assert_eq!(released_at.len(), 200);
    assert!(released_at.iter().all(|t| (70..=130).contains(t)));
    // A seeded run this size spreads over more than a couple of ticks.
    assert!(released_at.first() != released_at.last());
}

#[test]
fn zero_ceiling_never_holds_or_drops() {
    let clock = Rc::new(ManualClock::new(0));
    let mut pipeline = seeded_pipeline(&clock, 3);
    let settings = SettingsBuilder::new()
        .bandwidth(0)
        .with_bandwidth_queue(10)
        .build();
    pipeline.apply_settings(&settings).unwrap();
    assert_eq!(pipeline.running_modules(), vec!["bandwidth"]);

    for now in 0..2_000u32 {
        clock.set(now);
        for _ in 0..5 {
            pipeline.enqueue(packet(0, 1_400, Direction::Outbound));
        }
        assert!(!pipeline.tick().unwrap());
        assert_eq!(pipeline.take_outgoing().len(), 5);
    }

    let stats = pipeline.statistics();
    let stats = stats.read().unwrap();
    assert_eq!(stats.bandwidth_stats.dropped_packets(), 0);
    assert_eq!(stats.bandwidth_stats.queued_packets(), 0);
}

#[test]
fn sustained_overload_is_rejected_once_window_is_warm() {
    let clock = Rc::new(ManualClock::new(0));
    let mut pipeline = seeded_pipeline(&clock, 4);
    let settings = SettingsBuilder::new()
        .bandwidth(1)
        .with_bandwidth_directions(false, true)
        .build();
    pipeline.apply_settings(&settings).unwrap();

    // 100 bytes every millisecond, far above 1 KB/s.
    for now in 0..999u32 {
        clock.set(now);
        pipeline.enqueue(packet(0, 100, Direction::Outbound));
        assert!(!pipeline.tick().unwrap(), "rejected before warm at {}", now);
        assert_eq!(pipeline.take_outgoing().len(), 1);
    }

    let mut rejected = false;
    for now in 999..1_100u32 {
        clock.set(now);
        pipeline.enqueue(packet(0, 100, Direction::Outbound));
        rejected |= pipeline.tick().unwrap();
        pipeline.take_outgoing();
    }
    assert!(rejected);

    let stats = pipeline.statistics();
    let stats = stats.read().unwrap();
    assert!(stats.bandwidth_stats.dropped_packets() > 0);
}

#[test]
fn inbound_traffic_passes_an_outbound_only_limit() {
    let clock = Rc::new(ManualClock::new(0));
    let mut pipeline = seeded_pipeline(&clock, 5);
    let settings = SettingsBuilder::new()
        .bandwidth(1)
        .with_bandwidth_directions(false, true)
        .build();
    pipeline.apply_settings(&settings).unwrap();

    for now in 0..1_500u32 {
        clock.set(now);
        pipeline.enqueue(packet(0, 500, Direction::Inbound));
        pipeline.tick().unwrap();
        assert_eq!(pipeline.take_outgoing().len(), 1);
    }
}

#[test]
fn disabling_modules_loses_nothing() {
    let clock = Rc::new(ManualClock::new(0));
    let mut pipeline = seeded_pipeline(&clock, 6);
    let settings = SettingsBuilder::new()
        .lag(300)
        .with_jitter(50, 50)
        .bandwidth(2)
        .with_bandwidth_queue(50)
        .build();
    pipeline.apply_settings(&settings).unwrap();

    let mut enqueued = 0u64;
    let mut delivered = 0u64;
    for now in 0..1_500u32 {
        clock.set(now);
        let direction = if now % 2 == 0 {
            Direction::Inbound
        } else {
            Direction::Outbound
        };
        pipeline.enqueue(packet(0, 300, direction));
        enqueued += 1;
        pipeline.tick().unwrap();
        delivered += pipeline.take_outgoing().len() as u64;
    }
    assert!(pipeline.in_flight() > 0);

    pipeline.apply_settings(&Settings::default()).unwrap();
    assert!(pipeline.running_modules().is_empty());
    delivered += pipeline.take_outgoing().len() as u64;
    assert_eq!(pipeline.in_flight(), 0);

    let stats = pipeline.statistics();
    let dropped = stats.read().unwrap().bandwidth_stats.dropped_packets();
    assert_eq!(delivered + dropped, enqueued);
}

#[test]
fn queue_size_matches_linked_nodes_under_random_splicing() {
    let mut rng = StdRng::seed_from_u64(0x1a66);
    let mut arena = PacketArena::new();
    let mut chain = PacketQueue::new(&mut arena);
    let mut held = PacketQueue::new(&mut arena);

    for step in 0..5_000u32 {
        match rng.random_range(0..5) {
            0 | 1 => {
                let node = arena.insert(packet(step as u8, 8, Direction::Inbound));
                chain.push_back(&mut arena, node);
            }
            2 => {
                if let Some(id) = chain.first(&arena) {
                    let node = chain.pop(&mut arena, id);
                    let anchor = held.head();
                    held.insert_after(&mut arena, node, anchor);
                }
            }
            3 => {
                let tail = chain.tail();
                held.detach_before(&mut arena, &mut chain, tail);
            }
            _ => {
                if let Some(node) = held.pop_back(&mut arena) {
                    arena.destroy(node);
                }
            }
        }

        assert_eq!(chain.len(), chain.count_linked(&arena));
        assert_eq!(held.len(), held.count_linked(&arena));
        assert_eq!(arena.packet_count(), chain.len() + held.len());
    }

    let leftover = chain.dispose(&mut arena).len() + held.dispose(&mut arena).len();
    assert_eq!(arena.packet_count(), 0);
    assert!(leftover > 0);
}
