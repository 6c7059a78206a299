//! Faction-based ally/enemy resolution.
//!
//! Every faction owns one bit of a 64-bit flag space and an enemy mask over
//! that space. Characters without a faction draw a personal flag from the top
//! of the same space, so per-character enmity and faction enmity can be tested
//! with the same mask arithmetic.

use std::collections::BTreeSet;

use tracing::debug;

use crate::config::GameConfig;
use crate::error::{ErrorSeverity, GameError};
use crate::state::EntityId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FactionId(pub u8);

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Faction {
    pub name: String,
    pub flag: u64,
    pub enemy_mask: u64,
    pub members: BTreeSet<EntityId>,
}

/// Diplomatic identity carried by each character.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Affiliation {
    pub faction: Option<FactionId>,
    /// Ad-hoc flag of a faction-less character; `0` once the flag space is exhausted.
    pub personal_flag: u64,
    /// Per-character enmity, kept in addition to any faction-wide enmity.
    pub enemy_mask: u64,
}

/// Result of [`Diplomacy::set_as_enemy`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Escalation {
    /// Both factions now treat each other as hostile.
    FactionWide,
    /// The subject's own mask now includes the other side.
    Local,
    /// The subject has no flag to point at, so the other side's mask records it.
    Reverse,
    /// Nothing to record: neither side has a flag, or both share a faction.
    Impossible,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DiplomacyError {
    #[error("faction '{0}' is already registered")]
    DuplicateFaction(String),

    #[error("no diplomacy flag left for faction '{0}'")]
    FactionLimitReached(String),

    #[error("unknown faction {0:?}")]
    UnknownFaction(FactionId),
}

impl GameError for DiplomacyError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            DiplomacyError::DuplicateFaction(_) | DiplomacyError::FactionLimitReached(_) => {
                ErrorSeverity::Validation
            }
            DiplomacyError::UnknownFaction(_) => ErrorSeverity::Internal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            DiplomacyError::DuplicateFaction(_) => "DIPLOMACY_DUPLICATE_FACTION",
            DiplomacyError::FactionLimitReached(_) => "DIPLOMACY_FACTION_LIMIT_REACHED",
            DiplomacyError::UnknownFaction(_) => "DIPLOMACY_UNKNOWN_FACTION",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Diplomacy {
    factions: Vec<Faction>,
    /// Personal flags are handed out downward from this bit.
    next_personal_bit: u32,
    personal_exhausted: bool,
}

impl Default for Diplomacy {
    fn default() -> Self {
        Self::new()
    }
}

impl Diplomacy {
    pub fn new() -> Self {
        Self {
            factions: Vec::new(),
            next_personal_bit: GameConfig::MAX_FACTIONS - 1,
            personal_exhausted: false,
        }
    }

    fn bits_in_use(&self) -> u32 {
        let personal = if self.personal_exhausted {
            GameConfig::MAX_FACTIONS
        } else {
            GameConfig::MAX_FACTIONS - 1 - self.next_personal_bit
        };
        self.factions.len() as u32 + personal
    }

    fn has_free_bit(&self) -> bool {
        self.bits_in_use() < GameConfig::MAX_FACTIONS
    }

    // ========================================================================
    // Registry
    // ========================================================================

    pub fn register_faction(&mut self, name: &str) -> Result<FactionId, DiplomacyError> {
        if self.faction_id(name).is_some() {
            return Err(DiplomacyError::DuplicateFaction(name.to_string()));
        }
        if !self.has_free_bit() {
            return Err(DiplomacyError::FactionLimitReached(name.to_string()));
        }

        let index = self.factions.len();
        self.factions.push(Faction {
            name: name.to_string(),
            flag: 1u64 << index,
            enemy_mask: 0,
            members: BTreeSet::new(),
        });
        Ok(FactionId(index as u8))
    }

    pub fn faction_id(&self, name: &str) -> Option<FactionId> {
        self.factions
            .iter()
            .position(|faction| faction.name == name)
            .map(|index| FactionId(index as u8))
    }

    pub fn faction(&self, id: FactionId) -> Option<&Faction> {
        self.factions.get(id.0 as usize)
    }

    pub fn factions(&self) -> impl Iterator<Item = (FactionId, &Faction)> + '_ {
        self.factions
            .iter()
            .enumerate()
            .map(|(index, faction)| (FactionId(index as u8), faction))
    }

    /// Returns a fresh personal flag, or `0` when no bit is left.
    pub fn allocate_personal_flag(&mut self) -> u64 {
        if !self.has_free_bit() {
            debug!("diplomacy flag space exhausted; character stays neutral");
            return 0;
        }
        let flag = 1u64 << self.next_personal_bit;
        match self.next_personal_bit.checked_sub(1) {
            Some(next) => self.next_personal_bit = next,
            None => self.personal_exhausted = true,
        }
        flag
    }

    /// Builds the affiliation of a newly placed character, registering the
    /// named faction on first use.
    pub fn affiliate(
        &mut self,
        member: EntityId,
        faction: Option<&str>,
    ) -> Result<Affiliation, DiplomacyError> {
        match faction {
            Some(name) => {
                let id = match self.faction_id(name) {
                    Some(id) => id,
                    None => self.register_faction(name)?,
                };
                let mut affiliation = Affiliation::default();
                self.join(member, &mut affiliation, id)?;
                Ok(affiliation)
            }
            None => Ok(Affiliation {
                personal_flag: self.allocate_personal_flag(),
                ..Affiliation::default()
            }),
        }
    }

    pub fn join(
        &mut self,
        member: EntityId,
        affiliation: &mut Affiliation,
        faction: FactionId,
    ) -> Result<(), DiplomacyError> {
        self.leave(member, affiliation);
        let entry = self
            .factions
            .get_mut(faction.0 as usize)
            .ok_or(DiplomacyError::UnknownFaction(faction))?;
        entry.members.insert(member);
        affiliation.faction = Some(faction);
        Ok(())
    }

    pub fn leave(&mut self, member: EntityId, affiliation: &mut Affiliation) {
        if let Some(faction) = affiliation.faction.take()
            && let Some(entry) = self.factions.get_mut(faction.0 as usize)
        {
            entry.members.remove(&member);
        }
    }

    /// Re-links a restored character to its faction's member set.
    pub fn restore_member(&mut self, member: EntityId, affiliation: &Affiliation) {
        if let Some(faction) = affiliation.faction
            && let Some(entry) = self.factions.get_mut(faction.0 as usize)
        {
            entry.members.insert(member);
        }
    }

    // ========================================================================
    // Resolution
    // ========================================================================

    /// Flag identifying `affiliation` in enemy masks.
    pub fn flag_of(&self, affiliation: &Affiliation) -> u64 {
        affiliation
            .faction
            .and_then(|id| self.faction(id))
            .map_or(affiliation.personal_flag, |faction| faction.flag)
    }

    /// Everything `affiliation` is hostile to: its own mask plus its faction's.
    fn hostility_of(&self, affiliation: &Affiliation) -> u64 {
        let faction_mask = affiliation
            .faction
            .and_then(|id| self.faction(id))
            .map_or(0, |faction| faction.enemy_mask);
        affiliation.enemy_mask | faction_mask
    }

    pub fn is_ally(&self, a: &Affiliation, b: &Affiliation) -> bool {
        a.faction.is_some() && a.faction == b.faction
    }

    /// Hostility in either direction counts, so an actor that was hit first
    /// still reads as an enemy from the attacker's side.
    pub fn is_enemy(&self, a: &Affiliation, b: &Affiliation) -> bool {
        if self.is_ally(a, b) {
            return false;
        }
        let (flag_a, flag_b) = (self.flag_of(a), self.flag_of(b));
        (self.hostility_of(a) & flag_b) != 0 || (self.hostility_of(b) & flag_a) != 0
    }

    /// Marks `subject` hostile to `other`.
    ///
    /// Faction members make it faction-wide, otherwise the enmity stays in the
    /// subject's own mask. When only `other` carries a flag the record lands in
    /// `other`'s mask instead.
    pub fn set_as_enemy(&mut self, subject: &mut Affiliation, other: &mut Affiliation) -> Escalation {
        let subject_flag = self.flag_of(subject);
        let other_flag = self.flag_of(other);

        if subject_flag == 0 && other_flag == 0 {
            debug!("cannot set enemy: neither side has a diplomacy flag");
            return Escalation::Impossible;
        }
        if self.is_ally(subject, other) {
            debug!("cannot set enemy: both sides share a faction");
            return Escalation::Impossible;
        }

        match (subject.faction, other.faction) {
            (Some(mine), Some(theirs)) => {
                let (mine, theirs) = (mine.0 as usize, theirs.0 as usize);
                let (mine_flag, theirs_flag) = (self.factions[mine].flag, self.factions[theirs].flag);
                self.factions[mine].enemy_mask |= theirs_flag;
                self.factions[theirs].enemy_mask |= mine_flag;
                Escalation::FactionWide
            }
            _ if other_flag != 0 => {
                subject.enemy_mask |= other_flag;
                Escalation::Local
            }
            _ => {
                other.enemy_mask |= subject_flag;
                Escalation::Reverse
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn faction_and_personal_flags_never_collide() {
        let mut diplomacy = Diplomacy::new();
        let raiders = diplomacy.register_faction("raiders").unwrap();
        let personal = diplomacy.allocate_personal_flag();

        assert_eq!(diplomacy.faction(raiders).unwrap().flag, 1);
        assert_eq!(personal, 1u64 << 63);
    }

    #[test]
    fn flag_space_exhaustion() {
        let mut diplomacy = Diplomacy::new();
        for index in 0..63 {
            diplomacy.register_faction(&format!("f{index}")).unwrap();
        }
        assert_ne!(diplomacy.allocate_personal_flag(), 0);
        assert_eq!(diplomacy.allocate_personal_flag(), 0);
        assert_eq!(
            diplomacy.register_faction("late"),
            Err(DiplomacyError::FactionLimitReached("late".into()))
        );
    }

    #[test]
    fn duplicate_faction_is_rejected() {
        let mut diplomacy = Diplomacy::new();
        diplomacy.register_faction("vault").unwrap();
        assert!(matches!(
            diplomacy.register_faction("vault"),
            Err(DiplomacyError::DuplicateFaction(_))
        ));
    }

    #[test]
    fn faction_members_are_allies() {
        let mut diplomacy = Diplomacy::new();
        let a = diplomacy.affiliate(EntityId(1), Some("vault")).unwrap();
        let b = diplomacy.affiliate(EntityId(2), Some("vault")).unwrap();
        let loner = diplomacy.affiliate(EntityId(3), None).unwrap();

        assert!(diplomacy.is_ally(&a, &b));
        assert!(!diplomacy.is_ally(&a, &loner));
        assert!(!diplomacy.is_ally(&loner, &loner));
        let vault = diplomacy.faction_id("vault").unwrap();
        assert_eq!(diplomacy.faction(vault).unwrap().members.len(), 2);
    }

    #[test]
    fn faction_enmity_covers_every_member() {
        let mut diplomacy = Diplomacy::new();
        let mut attacker = diplomacy.affiliate(EntityId(1), Some("raiders")).unwrap();
        let mut guard = diplomacy.affiliate(EntityId(2), Some("town")).unwrap();
        let other_guard = diplomacy.affiliate(EntityId(3), Some("town")).unwrap();

        assert_eq!(
            diplomacy.set_as_enemy(&mut attacker, &mut guard),
            Escalation::FactionWide
        );
        assert!(diplomacy.is_enemy(&other_guard, &attacker));
        assert!(diplomacy.is_enemy(&attacker, &other_guard));
    }

    #[test]
    fn faction_less_subject_records_faction_locally() {
        let mut diplomacy = Diplomacy::new();
        let mut drifter = diplomacy.affiliate(EntityId(1), None).unwrap();
        let mut guard = diplomacy.affiliate(EntityId(2), Some("town")).unwrap();
        let other_guard = diplomacy.affiliate(EntityId(3), Some("town")).unwrap();

        assert_eq!(diplomacy.set_as_enemy(&mut drifter, &mut guard), Escalation::Local);
        assert!(diplomacy.is_enemy(&other_guard, &drifter));
    }

    #[test]
    fn personal_enmity_only_touches_the_pair() {
        let mut diplomacy = Diplomacy::new();
        let mut a = diplomacy.affiliate(EntityId(1), None).unwrap();
        let mut b = diplomacy.affiliate(EntityId(2), None).unwrap();
        let c = diplomacy.affiliate(EntityId(3), None).unwrap();

        assert_eq!(diplomacy.set_as_enemy(&mut b, &mut a), Escalation::Local);
        assert_ne!(b.enemy_mask & a.personal_flag, 0);
        assert!(diplomacy.is_enemy(&a, &b));
        assert!(diplomacy.is_enemy(&b, &a));
        assert!(!diplomacy.is_enemy(&a, &c));
        assert!(!diplomacy.is_enemy(&b, &c));
    }

    #[test]
    fn escalation_without_flags_is_impossible() {
        let mut diplomacy = Diplomacy::new();
        let mut a = Affiliation::default();
        let mut b = Affiliation::default();
        assert_eq!(diplomacy.set_as_enemy(&mut a, &mut b), Escalation::Impossible);
        assert!(!diplomacy.is_enemy(&a, &b));
    }

    #[test]
    fn flagless_subject_is_recorded_on_the_other_side() {
        let mut diplomacy = Diplomacy::new();
        let mut nobody = Affiliation::default();
        let mut known = diplomacy.affiliate(EntityId(2), None).unwrap();

        assert_eq!(diplomacy.set_as_enemy(&mut nobody, &mut known), Escalation::Local);

        let mut nobody = Affiliation::default();
        let mut known = diplomacy.affiliate(EntityId(4), None).unwrap();
        assert_eq!(diplomacy.set_as_enemy(&mut known, &mut nobody), Escalation::Reverse);
        assert_ne!(nobody.enemy_mask & known.personal_flag, 0);
    }

    #[test]
    fn allies_cannot_be_made_enemies() {
        let mut diplomacy = Diplomacy::new();
        let mut a = diplomacy.affiliate(EntityId(1), Some("vault")).unwrap();
        let mut b = diplomacy.affiliate(EntityId(2), Some("vault")).unwrap();
        assert_eq!(diplomacy.set_as_enemy(&mut a, &mut b), Escalation::Impossible);
        assert!(!diplomacy.is_enemy(&a, &b));
    }
}
