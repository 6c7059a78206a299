/// Ways the player can interact with a scripted object.
///
/// Parsed from the names returned by a script's `getAvailableInteractions`.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum InteractionKind {
    TalkTo,
    Use,
    UseSkill,
    UseMagic,
    Look,
}

impl InteractionKind {
    /// Script method invoked on the target when the interaction resolves.
    pub const fn callback(self) -> &'static str {
        match self {
            InteractionKind::TalkTo => "onTalkTo",
            InteractionKind::Use => "onUse",
            InteractionKind::UseSkill => "onUseSkill",
            InteractionKind::UseMagic => "onUseMagic",
            InteractionKind::Look => "onLook",
        }
    }
}

/// Script method that handles `skill` being used on an object: `onUse` followed
/// by the skill name with its first letter capitalised.
pub fn skill_callback(skill: &str) -> String {
    let mut chars = skill.chars();
    match chars.next() {
        Some(first) => format!("onUse{}{}", first.to_uppercase(), chars.as_str()),
        None => "onUse".to_string(),
    }
}
