//! Intent pre-registration collector
//!
//! Addons call in before the client connects; the host hands the collected
//! set to the platform client at connect time.

use std::collections::BTreeSet;
use std::sync::RwLock;

#[derive(Default)]
pub struct IntentRegistry {
    intents: RwLock<BTreeSet<String>>,
}

impl IntentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self, intent: impl Into<String>) {
        if let Ok(mut intents) = self.intents.write() {
            intents.insert(intent.into());
        }
    }

    pub fn collected(&self) -> Vec<String> {
        self.intents
            .read()
            .ok()
            .map(|i| i.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.intents.read().ok().map(|i| i.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_deduplicated_intents() {
        let intents = IntentRegistry::new();
        intents.request("guild-messages");
        intents.request("guild-members");
        intents.request("guild-messages");
        assert_eq!(intents.collected(), vec!["guild-members", "guild-messages"]);
    }
}
