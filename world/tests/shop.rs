use std::sync::Arc;

use horde_survival_core::{
    EndReason, GearError, GearPort, GearSnapshot, HordeConfig, ItemId, ItemStack, Location,
    OwnerId, Ports, ShopCategory,
};
use horde_survival_sandbox::{Sandbox, SandboxGear};
use horde_survival_world::{InstanceRegistry, PurchaseError, SessionHandle};
use parking_lot::Mutex;

type Hook = Box<dyn FnOnce() + Send>;

/// Gear that runs a hook in place of the next grant and then refuses it.
struct InterruptedGear {
    inner: Arc<SandboxGear>,
    next_grant: Mutex<Option<Hook>>,
}

impl GearPort for InterruptedGear {
    fn snapshot(&self, owner: OwnerId) -> Result<GearSnapshot, GearError> {
        self.inner.snapshot(owner)
    }

    fn reset(&self, owner: OwnerId) -> Result<(), GearError> {
        self.inner.reset(owner)
    }

    fn restore(&self, owner: OwnerId, snapshot: &GearSnapshot) -> Result<(), GearError> {
        self.inner.restore(owner, snapshot)
    }

    fn add(&self, owner: OwnerId, stack: ItemStack) -> Result<(), GearError> {
        let hook = self.next_grant.lock().take();
        match hook {
            Some(hook) => {
                hook();
                Err(GearError::Full)
            }
            None => self.inner.add(owner, stack),
        }
    }

    fn is_full(&self, owner: OwnerId) -> bool {
        self.inner.is_full(owner)
    }
}

fn open_interrupted(
    sandbox: &Sandbox,
) -> (Arc<InstanceRegistry>, Arc<InterruptedGear>, OwnerId, SessionHandle) {
    let owner = OwnerId::new(5);
    sandbox.join(owner, Location::new(3200, 3200));
    let gear = Arc::new(InterruptedGear {
        inner: sandbox.gear.clone(),
        next_grant: Mutex::new(None),
    });
    let ports = Ports::new(sandbox.world.clone(), gear.clone(), sandbox.notifier.clone());
    let registry = Arc::new(InstanceRegistry::new(HordeConfig::default(), ports));
    let handle = registry.create_instance(owner).expect("session created");
    handle.lock().begin_wave(1, 0);
    handle.lock().add_reward(100);
    (registry, gear, owner, handle)
}

fn open(sandbox: &Sandbox) -> (InstanceRegistry, OwnerId, SessionHandle) {
    let owner = OwnerId::new(5);
    sandbox.join(owner, Location::new(3200, 3200));
    let registry = InstanceRegistry::new(HordeConfig::default(), sandbox.ports());
    let handle = registry.create_instance(owner).expect("session created");
    (registry, owner, handle)
}

#[test]
fn purchase_requires_a_session() {
    let sandbox = Sandbox::new();
    let registry = InstanceRegistry::new(HordeConfig::default(), sandbox.ports());
    let owner = OwnerId::new(5);

    assert_eq!(
        registry.purchase(owner, ShopCategory::Consumables, 0),
        Err(PurchaseError::NoSession)
    );
    assert_eq!(
        sandbox.notifier.messages_for(owner),
        vec![PurchaseError::NoSession.to_string()]
    );
}

#[test]
fn wave_gate_and_balance_are_checked_before_debit() {
    let sandbox = Sandbox::new();
    let (registry, owner, handle) = open(&sandbox);

    assert_eq!(
        registry.purchase(owner, ShopCategory::Weapons, 0),
        Err(PurchaseError::WaveLocked { required: 1 })
    );

    handle.lock().begin_wave(1, 0);
    handle.lock().add_reward(30);
    assert_eq!(
        registry.purchase(owner, ShopCategory::Weapons, 0),
        Err(PurchaseError::InsufficientBalance {
            cost: 50,
            balance: 30,
        })
    );
    assert_eq!(
        registry.purchase(owner, ShopCategory::Weapons, 4),
        Err(PurchaseError::WaveLocked { required: 12 })
    );
    assert_eq!(handle.lock().total_reward(), 30);
}

#[test]
fn successful_purchase_debits_and_grants() {
    let sandbox = Sandbox::new();
    let (registry, owner, handle) = open(&sandbox);
    handle.lock().begin_wave(3, 0);
    handle.lock().add_reward(200);

    let receipt = registry
        .purchase(owner, ShopCategory::Weapons, 1)
        .expect("mithril scimitar");

    assert_eq!(receipt.item.cost, 150);
    assert_eq!(receipt.remaining_balance, 50);
    assert_eq!(handle.lock().total_reward(), 50);
    assert_eq!(sandbox.gear.amount_of(owner, ItemId::new(1339)), 1);
    assert!(sandbox
        .notifier
        .messages_for(owner)
        .iter()
        .any(|message| message.starts_with("Purchased Mithril scimitar")));
}

#[test]
fn unknown_entries_are_rejected() {
    let sandbox = Sandbox::new();
    let (registry, owner, _handle) = open(&sandbox);

    assert_eq!(
        registry.purchase(owner, ShopCategory::Upgrades, 42),
        Err(PurchaseError::InvalidSelection(ShopCategory::Upgrades))
    );
}

#[test]
fn full_inventory_blocks_purchase() {
    let sandbox = Sandbox::with_inventory_slots(3);
    let (registry, owner, handle) = open(&sandbox);
    handle.lock().begin_wave(1, 0);
    handle.lock().add_reward(500);

    assert_eq!(
        registry.purchase(owner, ShopCategory::Consumables, 0),
        Err(PurchaseError::InventoryFull)
    );
    assert_eq!(handle.lock().total_reward(), 500);
}

#[test]
fn failed_grant_refunds_the_cost() {
    let sandbox = Sandbox::new();
    let (registry, owner, handle) = open(&sandbox);
    handle.lock().begin_wave(1, 0);
    handle.lock().add_reward(100);
    sandbox.gear.refuse_grants(true);

    let result = registry.purchase(owner, ShopCategory::Consumables, 2);

    assert!(matches!(result, Err(PurchaseError::GrantFailed(_))));
    assert_eq!(handle.lock().total_reward(), 100);
}

#[test]
fn refund_after_session_end_is_paid_in_currency() {
    let sandbox = Sandbox::new();
    let (registry, gear, owner, _handle) = open_interrupted(&sandbox);
    let ending = registry.clone();
    *gear.next_grant.lock() = Some(Box::new(move || {
        let _ = ending.end_session(owner, EndReason::ManualExit);
    }));

    let result = registry.purchase(owner, ShopCategory::Consumables, 2);

    assert!(matches!(result, Err(PurchaseError::GrantFailed(_))));
    assert!(!registry.has_active_session(owner));
    let currency = registry.config().gear.currency_item;
    assert_eq!(sandbox.gear.amount_of(owner, currency), 70 + 5 + 30);
}

#[test]
fn refund_that_cannot_be_paid_is_reported() {
    let sandbox = Sandbox::new();
    let (registry, gear, owner, _handle) = open_interrupted(&sandbox);
    let ending = registry.clone();
    let refusing = sandbox.gear.clone();
    *gear.next_grant.lock() = Some(Box::new(move || {
        let _ = ending.end_session(owner, EndReason::ManualExit);
        refusing.refuse_grants(true);
    }));

    let result = registry.purchase(owner, ShopCategory::Consumables, 2);

    assert_eq!(
        result,
        Err(PurchaseError::RefundLost {
            cost: 30,
            source: GearError::Full,
        })
    );
    assert!(sandbox
        .notifier
        .messages_for(owner)
        .contains(&"The item could not be delivered and 30 reward points could not be refunded.".to_owned()));
}
