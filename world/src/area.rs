//! Rules the arena imposes on owners standing inside it.

use horde_survival_core::{EndReason, Location, OwnerId};
use thiserror::Error;
use tracing::debug;

use crate::{InstanceRegistry, SessionHandle, Settlement};

/// Name shown to owners entering and leaving the arena.
pub const ARENA_NAME: &str = "Zombie Horde Arena";

/// Actions the surrounding server asks permission for while an owner is in the arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AreaAction {
    /// Teleporting out by any means.
    Teleport,
    /// Trading with another actor.
    Trade,
    /// Opening the bank.
    Bank,
    /// Opening a regular shop.
    Shop,
    /// Climbing stairs or ladders.
    Stairs,
}

/// Reasons the arena refuses an action. The display text is shown to the owner.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum AreaDenial {
    /// A live session pins the owner to the arena.
    #[error("You cannot teleport during a zombie horde session!")]
    Teleport,
    /// Trading is never allowed in the arena.
    #[error("You cannot trade in the Zombie Horde Arena!")]
    Trade,
    /// Banking is never allowed in the arena.
    #[error("You cannot access your bank during a zombie horde session!")]
    Bank,
    /// Regular shops are never allowed in the arena.
    #[error("You cannot access shops during a zombie horde session!")]
    Shop,
    /// Stairs would leave the instance.
    #[error("You cannot use stairs during a zombie horde session!")]
    Stairs,
}

impl InstanceRegistry {
    /// Decides whether an owner inside the arena may perform an action.
    ///
    /// Teleporting is refused only while the owner has a live session; the
    /// other actions are always refused. The owner is told why.
    pub fn check_area_action(
        &self,
        owner: OwnerId,
        action: AreaAction,
    ) -> Result<(), AreaDenial> {
        let denial = match action {
            AreaAction::Teleport if !self.has_active_session(owner) => return Ok(()),
            AreaAction::Teleport => AreaDenial::Teleport,
            AreaAction::Trade => AreaDenial::Trade,
            AreaAction::Bank => AreaDenial::Bank,
            AreaAction::Shop => AreaDenial::Shop,
            AreaAction::Stairs => AreaDenial::Stairs,
        };

        debug!(%owner, ?action, "area action refused");
        self.ports.notifier.notify(owner, &denial.to_string());
        if denial == AreaDenial::Teleport {
            self.ports.notifier.notify(
                owner,
                "You must complete or abandon your current session first.",
            );
        }
        Err(denial)
    }

    /// Owners never fight each other while either stands in the arena.
    #[must_use]
    pub fn may_attack_owner(&self, attacker: OwnerId, target: OwnerId) -> bool {
        !(self.is_in_arena(attacker) || self.is_in_arena(target))
    }

    fn is_in_arena(&self, owner: OwnerId) -> bool {
        self.has_active_session(owner)
            || self
                .ports
                .world
                .owner_location(owner)
                .is_some_and(|location| self.config.arena.bounds.contains(location))
    }

    /// Warns an owner about to log out that their session will end.
    ///
    /// Logging out is never refused; returns whether a warning was sent.
    pub fn on_logout_requested(&self, owner: OwnerId) -> bool {
        if !self.has_active_session(owner) {
            return false;
        }
        self.ports
            .notifier
            .notify(owner, "Logging out will end your zombie horde session!");
        true
    }

    /// Where an owner who dies in the arena comes back.
    #[must_use]
    pub fn respawn_location(&self) -> Location {
        self.config.arena.exit
    }

    /// Greets an owner walking into the arena and opens a session if they have none.
    pub fn on_owner_entered_area(&self, owner: OwnerId) -> Option<SessionHandle> {
        self.ports
            .notifier
            .notify(owner, &format!("You enter the {ARENA_NAME}."));
        match self.get_session(owner) {
            Some(handle) if !handle.is_ended() => Some(handle),
            _ => self.create_instance(owner),
        }
    }

    /// Ends the session of an owner walking out of the arena.
    pub fn on_owner_left_area(&self, owner: OwnerId) -> Option<Settlement> {
        self.ports
            .notifier
            .notify(owner, &format!("You leave the {ARENA_NAME}."));
        self.end_session(owner, EndReason::LeftArea)
    }
}
