//! End-to-end combat scenarios driven through the public API.

use brawl_combat::prelude::*;
use brawl_common::{Direction, PlayerSlot, Vec2};

fn fighter(slot: PlayerSlot, x: f32, y: f32, direction: Direction) -> Fighter {
    let profile = builtin("ryu").expect("built-in profile");
    Fighter::new(slot, profile, Vec2::new(x, y), direction)
}

/// Update `me` once against `other`.
fn step(
    me: &mut Fighter,
    other: &mut Fighter,
    input: &mut dyn InputProvider,
    listener: &mut dyn CombatListener,
    tick: u64,
) {
    let arena = Arena::default();
    let mut rng = fastrand::Rng::with_seed(tick);
    let mut ctx = TickContext {
        time: FrameTime::fixed_step(tick),
        arena: &arena,
        input,
        listener,
        rng: &mut rng,
    };
    me.update(other, &mut ctx);
}

/// Resolve one attack test at tick 1.
fn strike(attacker: &mut Fighter, defender: &mut Fighter, ledger: &mut BattleLedger) -> Option<HitEvent> {
    let arena = Arena::default();
    let mut input = NoInput;
    let mut rng = fastrand::Rng::with_seed(1);
    let mut ctx = TickContext {
        time: FrameTime::fixed_step(1),
        arena: &arena,
        input: &mut input,
        listener: ledger,
        rng: &mut rng,
    };
    resolve_attack(attacker, defender, &mut ctx)
}

fn to_strike_frame(fighter: &mut Fighter) {
    let strike = fighter
        .profile()
        .geometry()
        .animation(fighter.state())
        .iter()
        .position(|frame| !frame.boxes.hit.is_empty())
        .expect("attack has a strike frame");
    fighter.force_frame(strike);
}

#[test]
fn test_light_punch_from_idle() {
    let mut one = fighter(PlayerSlot::One, 580.0, 220.0, Direction::Right);
    let mut two = fighter(PlayerSlot::Two, 720.0, 220.0, Direction::Left);
    let mut pad = ControllerState::new();
    pad.press(Control::LightPunch);

    step(&mut one, &mut two, &mut pad, &mut NullListener, 1);

    assert_eq!(one.state(), FighterState::LightPunch);
    assert_eq!(one.animation_frame(), 0);
    assert!(!one.attack_struck());
}

#[test]
fn test_body_hit_updates_ledger_once() {
    let mut one = fighter(PlayerSlot::One, 600.0, 220.0, Direction::Right);
    // Lower the defender so only the body box meets the punch.
    let mut two = fighter(PlayerSlot::Two, 640.0, 206.0, Direction::Left);
    let mut ledger = BattleLedger::new(["ryu", "ryu"], 144);

    assert!(one.change_state(FighterState::LightPunch));
    to_strike_frame(&mut one);

    let event = strike(&mut one, &mut two, &mut ledger).expect("hit");
    assert_eq!(event.location, HurtLocation::Body);
    assert_eq!(ledger.hit_points(PlayerSlot::Two), 132);
    assert_eq!(ledger.score(PlayerSlot::One), 100);
    assert_eq!(two.state(), FighterState::HurtBodyLight);
    assert_eq!(two.slide().velocity, AttackStrength::Light.data().slide_velocity);
    assert!(one.attack_struck());

    assert!(strike(&mut one, &mut two, &mut ledger).is_none());
    assert_eq!(ledger.hit_points(PlayerSlot::Two), 132);
    assert_eq!(ledger.score(PlayerSlot::One), 100);
}

#[test]
fn test_head_wins_over_body() {
    let mut one = fighter(PlayerSlot::One, 600.0, 220.0, Direction::Right);
    let mut two = fighter(PlayerSlot::Two, 640.0, 220.0, Direction::Left);
    let mut ledger = BattleLedger::new(["ryu", "ryu"], 144);

    one.change_state(FighterState::LightPunch);
    to_strike_frame(&mut one);
    let hurt = two.hurt_boxes();
    assert!(one.hit_box().overlaps(&hurt[HurtLocation::Head.index()]));
    assert!(one.hit_box().overlaps(&hurt[HurtLocation::Body.index()]));

    let event = strike(&mut one, &mut two, &mut ledger).expect("hit");
    assert_eq!(event.location, HurtLocation::Head);
    assert_eq!(two.state(), FighterState::HurtHeadLight);
    assert_eq!(ledger.hit_points(PlayerSlot::Two), 132);
}

#[test]
fn test_depleted_health_does_not_change_state() {
    let mut one = fighter(PlayerSlot::One, 600.0, 220.0, Direction::Right);
    let mut two = fighter(PlayerSlot::Two, 640.0, 220.0, Direction::Left);
    let mut ledger = BattleLedger::new(["ryu", "ryu"], 12);

    one.change_state(FighterState::LightPunch);
    to_strike_frame(&mut one);
    strike(&mut one, &mut two, &mut ledger).expect("hit");
    assert!(ledger.is_depleted(PlayerSlot::Two));

    for tick in 2..10 {
        step(&mut two, &mut one, &mut NoInput, &mut NullListener, tick);
    }
    assert_ne!(two.state(), FighterState::Ko);

    // The battle is what drives the loser down.
    let config = BattleConfig {
        seed: Some(9),
        spawn_one_x: 600.0,
        spawn_two_x: 640.0,
        max_hit_points: 12,
        ..BattleConfig::default()
    };
    let puncher = DecisionInput::new(|_: &Observation| Action::LightPunch, 100.0);
    let mut battle = Battle::from_config(config, [Box::new(puncher), Box::new(NoInput)])
        .expect("battle");
    let mut tick = 1;
    while battle.phase() == RoundPhase::Fighting {
        battle.tick(FrameTime::fixed_step(tick));
        tick += 1;
        assert!(tick < 120, "no knock out");
    }
    assert_eq!(
        battle.phase(),
        RoundPhase::KnockOut {
            loser: PlayerSlot::Two
        }
    );
    assert_eq!(battle.fighter(PlayerSlot::Two).state(), FighterState::Ko);
}

#[test]
fn test_wall_transfers_slide_to_opponent() {
    let mut one = fighter(PlayerSlot::One, 465.0, 220.0, Direction::Right);
    let mut two = fighter(PlayerSlot::Two, 700.0, 220.0, Direction::Left);
    assert!(one.receive_hit(AttackStrength::Medium, HurtLocation::Body));
    assert_eq!(two.slide(), Slide::NONE);

    let mut expected = Slide::from_strength(AttackStrength::Medium);
    expected.decay(FrameTime::fixed_step(1).seconds_passed);

    step(&mut one, &mut two, &mut NoInput, &mut NullListener, 1);

    assert!((one.push_box().x - Arena::default().viewport.x).abs() < 1e-3);
    assert_eq!(one.slide(), Slide::NONE);
    assert_eq!(two.slide(), expected);
}

#[test]
fn test_crossing_over_a_crouching_fighter() {
    let mut one = fighter(PlayerSlot::One, 580.0, 220.0, Direction::Right);
    let mut two = fighter(PlayerSlot::Two, 720.0, 220.0, Direction::Left);
    let mut pad = ControllerState::new();
    pad.press(Control::Down);
    let mut tick = 1;
    while one.state() != FighterState::Crouch {
        step(&mut one, &mut two, &mut pad, &mut NullListener, tick);
        tick += 1;
        assert!(tick < 60, "never crouched");
    }

    two.set_position(Vec2::new(500.0, 220.0));
    step(&mut one, &mut two, &mut pad, &mut NullListener, tick);

    assert_eq!(one.state(), FighterState::Crouch);
    assert_eq!(one.direction(), Direction::Left);
}

#[test]
fn test_same_state_request_is_ignored() {
    let mut one = fighter(PlayerSlot::One, 580.0, 220.0, Direction::Right);
    assert!(one.change_state(FighterState::LightKick));
    one.force_frame(1);
    assert!(!one.change_state(FighterState::LightKick));
    assert_eq!(one.animation_frame(), 1);
}

struct RandomPlayer {
    rng: fastrand::Rng,
}

impl DecisionProvider for RandomPlayer {
    fn decide(&mut self, _observation: &Observation) -> Action {
        Action::ALL[self.rng.usize(..Action::ALL.len())]
    }
}

#[test]
fn test_random_round_keeps_invariants() {
    let config = BattleConfig {
        seed: Some(42),
        ..BattleConfig::default()
    };
    let max = config.max_hit_points;
    let inputs: [Box<dyn InputProvider>; 2] = [
        Box::new(DecisionInput::new(
            RandomPlayer {
                rng: fastrand::Rng::with_seed(1),
            },
            100.0,
        )),
        Box::new(DecisionInput::new(
            RandomPlayer {
                rng: fastrand::Rng::with_seed(2),
            },
            100.0,
        )),
    ];
    let mut battle = Battle::from_config(config, inputs).expect("battle");

    for tick in 1..=6000 {
        battle.tick(FrameTime::fixed_step(tick));
        let viewport = battle.arena().viewport;
        for slot in PlayerSlot::ALL {
            let hp = battle.ledger().hit_points(slot);
            assert!((0..=max).contains(&hp));

            let push = battle.fighter(slot).push_box();
            assert!(push.x >= viewport.x - 1e-3, "tick {tick}: {push:?}");
            assert!(push.right() <= viewport.right() + 1e-3, "tick {tick}: {push:?}");
        }
        battle.events().drain();
        if battle.phase().is_over() {
            break;
        }
    }
    assert!(battle.phase().is_over());
}
