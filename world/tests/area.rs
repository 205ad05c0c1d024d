use horde_survival_core::{EndReason, HordeConfig, Location, OwnerId};
use horde_survival_sandbox::Sandbox;
use horde_survival_world::{AreaAction, AreaDenial, InstanceRegistry};

const OUTSIDE: Location = Location::new(3200, 3200);

fn setup(owners: &[OwnerId]) -> (Sandbox, InstanceRegistry) {
    let sandbox = Sandbox::new();
    for owner in owners {
        sandbox.join(*owner, OUTSIDE);
    }
    let registry = InstanceRegistry::new(HordeConfig::default(), sandbox.ports());
    (sandbox, registry)
}

#[test]
fn teleport_is_refused_only_during_a_session() {
    let owner = OwnerId::new(1);
    let (sandbox, registry) = setup(&[owner]);

    assert_eq!(registry.check_area_action(owner, AreaAction::Teleport), Ok(()));
    assert!(sandbox.notifier.messages_for(owner).is_empty());

    let _ = registry.create_instance(owner).expect("session created");
    let before = sandbox.notifier.messages_for(owner).len();
    assert_eq!(
        registry.check_area_action(owner, AreaAction::Teleport),
        Err(AreaDenial::Teleport)
    );
    assert_eq!(
        sandbox.notifier.messages_for(owner)[before..],
        [
            "You cannot teleport during a zombie horde session!".to_owned(),
            "You must complete or abandon your current session first.".to_owned(),
        ]
    );
}

#[test]
fn trading_banking_shops_and_stairs_are_always_refused() {
    let owner = OwnerId::new(2);
    let (sandbox, registry) = setup(&[owner]);
    let cases = [
        (AreaAction::Trade, AreaDenial::Trade, "You cannot trade in the Zombie Horde Arena!"),
        (
            AreaAction::Bank,
            AreaDenial::Bank,
            "You cannot access your bank during a zombie horde session!",
        ),
        (
            AreaAction::Shop,
            AreaDenial::Shop,
            "You cannot access shops during a zombie horde session!",
        ),
        (
            AreaAction::Stairs,
            AreaDenial::Stairs,
            "You cannot use stairs during a zombie horde session!",
        ),
    ];

    for (action, denial, message) in cases {
        assert_eq!(registry.check_area_action(owner, action), Err(denial));
        assert_eq!(denial.to_string(), message);
        assert_eq!(
            sandbox.notifier.messages_for(owner).last().map(String::as_str),
            Some(message)
        );
    }
}

#[test]
fn owners_cannot_attack_each_other_near_the_arena() {
    let inside = OwnerId::new(3);
    let standing = OwnerId::new(4);
    let outside = OwnerId::new(5);
    let (sandbox, registry) = setup(&[inside, standing, outside]);
    let _ = registry.create_instance(inside).expect("session created");
    sandbox
        .world
        .connect(standing, registry.config().arena.center);

    assert!(!registry.may_attack_owner(inside, outside));
    assert!(!registry.may_attack_owner(outside, inside));
    assert!(!registry.may_attack_owner(standing, outside));
    assert!(registry.may_attack_owner(outside, OwnerId::new(6)));
}

#[test]
fn logging_out_warns_only_with_a_session() {
    let owner = OwnerId::new(7);
    let (sandbox, registry) = setup(&[owner]);

    assert!(!registry.on_logout_requested(owner));
    assert!(sandbox.notifier.messages_for(owner).is_empty());

    let _ = registry.create_instance(owner).expect("session created");
    assert!(registry.on_logout_requested(owner));
    assert_eq!(
        sandbox.notifier.messages_for(owner).last().map(String::as_str),
        Some("Logging out will end your zombie horde session!")
    );
    assert!(registry.has_active_session(owner));
}

#[test]
fn owners_dying_in_the_arena_respawn_at_the_exit() {
    let (_sandbox, registry) = setup(&[]);
    assert_eq!(registry.respawn_location(), registry.config().arena.exit);
}

#[test]
fn entering_the_area_opens_one_session() {
    let owner = OwnerId::new(8);
    let (sandbox, registry) = setup(&[owner]);

    let first = registry.on_owner_entered_area(owner).expect("session opened");
    let second = registry.on_owner_entered_area(owner).expect("session kept");

    assert!(second.ptr_eq(&first));
    assert_eq!(registry.session_count(), 1);
    let messages = sandbox.notifier.messages_for(owner);
    assert_eq!(
        messages
            .iter()
            .filter(|message| *message == "You enter the Zombie Horde Arena.")
            .count(),
        2
    );
    assert!(!messages
        .iter()
        .any(|message| message.contains("already have an active")));
}

#[test]
fn leaving_the_area_ends_the_session() {
    let owner = OwnerId::new(9);
    let (sandbox, registry) = setup(&[owner]);
    let _ = registry.on_owner_entered_area(owner).expect("session opened");

    let settlement = registry.on_owner_left_area(owner).expect("session settled");

    assert_eq!(settlement.reason, EndReason::LeftArea);
    assert!(!registry.has_active_session(owner));
    assert!(sandbox
        .notifier
        .messages_for(owner)
        .contains(&"You leave the Zombie Horde Arena.".to_owned()));
    assert!(registry.on_owner_left_area(owner).is_none());
}
