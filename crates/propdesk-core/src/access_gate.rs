use serde::Deserialize;
use serde::Serialize;

use crate::desktop::DesktopGrant;
use crate::sound::Cue;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeFieldSpec {
    pub id: String,
    pub label: String,
    pub secret: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessGateSpec {
    pub locked_banner: String,
    pub unlocked_banner: String,
    pub fields: Vec<CodeFieldSpec>,
    pub reward: DesktopGrant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldStatus {
    Verified,
    Pending,
}

impl FieldStatus {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Verified => "✅",
            Self::Pending => "❌",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeField {
    pub id: String,
    pub label: String,
    expected_secret: String,
    current_input: String,
    verified: bool,
}

impl CodeField {
    fn new(spec: &CodeFieldSpec) -> Self {
        Self {
            id: spec.id.clone(),
            label: spec.label.clone(),
            expected_secret: spec.secret.clone(),
            current_input: String::new(),
            verified: false,
        }
    }

    pub fn input(&self) -> &str {
        &self.current_input
    }

    pub fn verified(&self) -> bool {
        self.verified
    }

    pub fn status(&self) -> FieldStatus {
        if self.verified {
            FieldStatus::Verified
        } else {
            FieldStatus::Pending
        }
    }

    pub fn secret_len(&self) -> usize {
        self.expected_secret.chars().count()
    }
}

/// What an input change produced, for the caller to turn into feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputOutcome {
    pub cue: Option<Cue>,
    /// `all_unlocked` went from false to true on this change.
    pub rising_edge: bool,
}

/// Multi-field code check. Secrets are compared as plain strings; this is
/// a puzzle mechanic.
#[derive(Debug, Clone)]
pub struct AccessGate {
    fields: Vec<CodeField>,
    locked_banner: String,
    unlocked_banner: String,
    reward: DesktopGrant,
    all_unlocked: bool,
}

impl AccessGate {
    pub fn new(spec: &AccessGateSpec) -> Self {
        Self {
            fields: spec.fields.iter().map(CodeField::new).collect(),
            locked_banner: spec.locked_banner.clone(),
            unlocked_banner: spec.unlocked_banner.clone(),
            reward: spec.reward.clone(),
            all_unlocked: false,
        }
    }

    pub fn fields(&self) -> &[CodeField] {
        &self.fields
    }

    pub fn field(&self, id: &str) -> Option<&CodeField> {
        self.fields.iter().find(|field| field.id == id)
    }

    pub fn all_unlocked(&self) -> bool {
        self.all_unlocked
    }

    pub fn banner(&self) -> &str {
        if self.all_unlocked {
            &self.unlocked_banner
        } else {
            &self.locked_banner
        }
    }

    pub fn reward(&self) -> &DesktopGrant {
        &self.reward
    }

    /// Returns `None` for an unknown field id.
    pub fn set_input(&mut self, field_id: &str, value: &str) -> Option<InputOutcome> {
        let field = self.fields.iter_mut().find(|field| field.id == field_id)?;
        let was_verified = field.verified;
        field.current_input = value.to_string();
        field.verified = field.current_input == field.expected_secret;

        // Only complain once the entry is at least as long as the secret.
        let cue = if field.verified && !was_verified {
            Some(Cue::Success)
        } else if !field.verified && value.chars().count() >= field.secret_len() {
            Some(Cue::Error)
        } else {
            None
        };

        let was_unlocked = self.all_unlocked;
        self.all_unlocked = self.fields.iter().all(|field| field.verified);
        tracing::debug!(
            field = field_id,
            all_unlocked = self.all_unlocked,
            "gate input"
        );
        Some(InputOutcome {
            cue,
            rising_edge: self.all_unlocked && !was_unlocked,
        })
    }

    /// Clears every input, as a fresh render of the gate panel does.
    pub fn reset_inputs(&mut self) {
        for field in &mut self.fields {
            field.current_input.clear();
            field.verified = false;
        }
        self.all_unlocked = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::desktop::DesktopItem;
    use crate::desktop::ItemTarget;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    const CODES: [(&str, &str); 5] = [
        ("chemist", "qwerty123"),
        ("lawyer", "milioner123"),
        ("programmer", "hello world"),
        ("engineer", "molodci28"),
        ("guard", "admin"),
    ];

    fn gate() -> AccessGate {
        AccessGate::new(&AccessGateSpec {
            locked_banner: "ДОСТУП 2 УРОВНЯ ЗАБЛОКИРОВАН".to_string(),
            unlocked_banner: "🔓 ОТКРЫТ ДОСТУП 2 УРОВНЯ".to_string(),
            fields: CODES
                .iter()
                .map(|(id, secret)| CodeFieldSpec {
                    id: id.to_string(),
                    label: id.to_string(),
                    secret: secret.to_string(),
                })
                .collect(),
            reward: DesktopGrant {
                item: DesktopItem {
                    name: "привет".to_string(),
                    icon: None,
                    target: ItemTarget::Folder {
                        folder: "secret".to_string(),
                    },
                },
                folders: BTreeMap::new(),
                documents: BTreeMap::new(),
            },
        })
    }

    #[test]
    fn exact_secret_verifies_the_field() {
        let mut gate = gate();
        let outcome = gate.set_input("guard", "admin").expect("field");
        assert_eq!(outcome.cue, Some(Cue::Success));
        assert!(gate.field("guard").expect("field").verified());
        assert_eq!(gate.field("guard").expect("field").status().symbol(), "✅");
    }

    #[test]
    fn short_prefix_is_silent() {
        let mut gate = gate();
        let outcome = gate.set_input("chemist", "qwer").expect("field");
        assert_eq!(outcome.cue, None);
        assert!(!gate.field("chemist").expect("field").verified());
    }

    #[test]
    fn wrong_entry_at_secret_length_cues_error() {
        let mut gate = gate();
        assert_eq!(gate.set_input("guard", "admiN").expect("field").cue, Some(Cue::Error));
        assert_eq!(
            gate.set_input("guard", "admin!").expect("field").cue,
            Some(Cue::Error)
        );
        assert_eq!(gate.set_input("guard", "").expect("field").cue, None);
    }

    #[test]
    fn length_is_counted_in_characters() {
        let mut gate = AccessGate::new(&AccessGateSpec {
            fields: vec![CodeFieldSpec {
                id: "x".to_string(),
                label: "x".to_string(),
                secret: "абв".to_string(),
            }],
            ..gate_spec_shell()
        });
        assert_eq!(gate.set_input("x", "аб").expect("field").cue, None);
        assert_eq!(gate.set_input("x", "абг").expect("field").cue, Some(Cue::Error));
    }

    #[test]
    fn re_entering_a_verified_field_does_not_repeat_success() {
        let mut gate = gate();
        gate.set_input("guard", "admin");
        assert_eq!(gate.set_input("guard", "admin").expect("field").cue, None);
    }

    #[test]
    fn all_five_codes_raise_the_edge_once() {
        let mut gate = gate();
        let edges: Vec<bool> = CODES
            .iter()
            .map(|(id, secret)| gate.set_input(id, secret).expect("field").rising_edge)
            .collect();
        assert_eq!(edges, vec![false, false, false, false, true]);
        assert!(gate.all_unlocked());
        assert_eq!(gate.banner(), "🔓 ОТКРЫТ ДОСТУП 2 УРОВНЯ");
        assert!(!gate.set_input("guard", "admin").expect("field").rising_edge);
    }

    #[test]
    fn four_of_five_stays_locked() {
        let mut gate = gate();
        for (id, secret) in CODES.iter().take(4) {
            gate.set_input(id, secret);
        }
        gate.set_input("guard", "admim");
        assert!(!gate.all_unlocked());
        assert_eq!(gate.banner(), "ДОСТУП 2 УРОВНЯ ЗАБЛОКИРОВАН");
    }

    #[test]
    fn reset_clears_inputs_and_unlock_state() {
        let mut gate = gate();
        for (id, secret) in CODES {
            gate.set_input(id, secret);
        }
        gate.reset_inputs();
        assert!(!gate.all_unlocked());
        assert!(gate.fields().iter().all(|field| field.input().is_empty()));
    }

    #[test]
    fn unknown_field_is_ignored() {
        let mut gate = gate();
        assert_eq!(gate.set_input("pilot", "x"), None);
    }

    fn gate_spec_shell() -> AccessGateSpec {
        AccessGateSpec {
            locked_banner: String::new(),
            unlocked_banner: String::new(),
            fields: Vec::new(),
            reward: gate().reward().clone(),
        }
    }
}
