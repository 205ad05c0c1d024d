//! Reward shop purchases paid from the session balance.

use horde_survival_core::{GearError, ItemStack, OwnerId, ShopCategory, ShopItem};
use thiserror::Error;
use tracing::{info, warn};

use crate::{InstanceRegistry, SessionHandle};

/// Reasons a purchase is rejected. The display text is shown to the owner.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PurchaseError {
    /// The owner is not in a horde session.
    #[error("You need an active horde session to use the reward shop.")]
    NoSession,
    /// The index does not name an entry in the category.
    #[error("There is no such item in the {0} shop.")]
    InvalidSelection(ShopCategory),
    /// The session has not reached the entry's wave requirement.
    #[error("You must reach wave {required} to unlock this item.")]
    WaveLocked {
        /// Wave that unlocks the entry.
        required: u32,
    },
    /// The balance does not cover the cost.
    #[error("Insufficient reward balance: {cost} needed, {balance} available.")]
    InsufficientBalance {
        /// Price of the entry.
        cost: u64,
        /// Balance at the time of the attempt.
        balance: u64,
    },
    /// The inventory has no free slot.
    #[error("Your inventory is full.")]
    InventoryFull,
    /// The item could not be placed in the inventory and the cost was refunded.
    #[error("The item could not be delivered; your reward points were refunded.")]
    GrantFailed(#[source] GearError),
    /// The item could not be delivered and the session ended before the cost
    /// could be refunded in any form.
    #[error("The item could not be delivered and {cost} reward points could not be refunded.")]
    RefundLost {
        /// Price that was debited.
        cost: u64,
        /// Why the item was not delivered.
        #[source]
        source: GearError,
    },
}

/// Successful purchase.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Receipt {
    /// Entry that was bought.
    pub item: ShopItem,
    /// Balance left after the debit.
    pub remaining_balance: u64,
}

impl InstanceRegistry {
    /// Buys a catalog entry with reward currency.
    ///
    /// The wave gate, the balance, and the inventory space are checked before
    /// anything changes. The owner is notified of the outcome either way.
    pub fn purchase(
        &self,
        owner: OwnerId,
        category: ShopCategory,
        index: usize,
    ) -> Result<Receipt, PurchaseError> {
        let result = self.try_purchase(owner, category, index);
        match &result {
            Ok(receipt) => {
                info!(
                    %owner,
                    %category,
                    index,
                    cost = receipt.item.cost,
                    balance = receipt.remaining_balance,
                    "shop purchase"
                );
                self.ports.notifier.notify(
                    owner,
                    &format!(
                        "Purchased {} for {} reward points. Remaining balance: {}.",
                        receipt.item.description, receipt.item.cost, receipt.remaining_balance
                    ),
                );
            }
            Err(error) => {
                self.ports.notifier.notify(owner, &error.to_string());
            }
        }
        result
    }

    fn try_purchase(
        &self,
        owner: OwnerId,
        category: ShopCategory,
        index: usize,
    ) -> Result<Receipt, PurchaseError> {
        let handle = self.get_session(owner).ok_or(PurchaseError::NoSession)?;
        let item = self
            .config
            .shop
            .item(category, index)
            .cloned()
            .ok_or(PurchaseError::InvalidSelection(category))?;

        let remaining_balance = {
            let mut session = handle.lock();
            if session.is_ended() {
                return Err(PurchaseError::NoSession);
            }
            if session.current_wave() < item.wave_requirement {
                return Err(PurchaseError::WaveLocked {
                    required: item.wave_requirement,
                });
            }
            let balance = session.total_reward();
            if balance < item.cost {
                return Err(PurchaseError::InsufficientBalance {
                    cost: item.cost,
                    balance,
                });
            }
            if self.ports.gear.is_full(owner) {
                return Err(PurchaseError::InventoryFull);
            }
            session
                .debit(item.cost)
                .ok_or(PurchaseError::InsufficientBalance {
                    cost: item.cost,
                    balance,
                })?
        };

        if let Err(error) = self.ports.gear.add(owner, item.stack) {
            warn!(%owner, %error, item = item.stack.item.get(), "purchase grant failed; refunding");
            return Err(self.refund(owner, &handle, item.cost, error));
        }

        Ok(Receipt {
            item,
            remaining_balance,
        })
    }

    /// Returns the cost to the balance, or as currency items once the
    /// session has been settled.
    fn refund(
        &self,
        owner: OwnerId,
        handle: &SessionHandle,
        cost: u64,
        error: GearError,
    ) -> PurchaseError {
        if handle.lock().refund(cost) {
            return PurchaseError::GrantFailed(error);
        }

        let stack = ItemStack::new(self.config.gear.currency_item, cost);
        match self.ports.gear.add(owner, stack) {
            Ok(()) => PurchaseError::GrantFailed(error),
            Err(refund_error) => {
                warn!(%owner, %refund_error, cost, "refund after session end failed");
                PurchaseError::RefundLost {
                    cost,
                    source: error,
                }
            }
        }
    }
}
