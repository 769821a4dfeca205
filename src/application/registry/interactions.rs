//! Interaction registry and dispatcher

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use regex_lite::Regex;
use tracing::{debug, warn};

use crate::application::errors::RegistryError;
use crate::domain::entities::{Interaction, InteractionKind, MatchStrategy};
use crate::domain::traits::{ClientHandle, InteractionDecl, InteractionHandler};

/// One routable handler owned by the registry
#[derive(Clone)]
pub struct InteractionRegistration {
    pub kind: InteractionKind,
    pub pattern: String,
    pub strategy: MatchStrategy,
    pub handler: Arc<dyn InteractionHandler>,
    pub priority: u32,
    pub source: String,
}

/// Outcome of routing one incoming interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A handler consumed the event
    Handled,
    /// Candidates were tried (or none matched); caller owns the fallback
    Unhandled,
    /// The raw subtype is not one the registry routes
    Unroutable,
}

/// Priority-ordered table of interaction handlers, keyed by kind.
///
/// Exact-match registrations are unique per (kind, pattern); prefix and
/// regex registrations may coexist and are tried in priority order.
#[derive(Default)]
pub struct InteractionRegistry {
    table: RwLock<HashMap<InteractionKind, Vec<InteractionRegistration>>>,
}

impl InteractionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module's declared handlers as one batch.
    ///
    /// Every exact-match declaration is checked against the table (and the
    /// rest of the batch) before anything is inserted, so a conflict leaves
    /// the registry untouched. The check and the inserts run under a single
    /// write lock.
    pub fn register_batch(
        &self,
        source: &str,
        priority: u32,
        decls: Vec<InteractionDecl>,
    ) -> Result<usize, RegistryError> {
        if decls.is_empty() {
            return Ok(0);
        }

        let mut table = self
            .table
            .write()
            .map_err(|_| RegistryError::Internal("lock poisoned".to_string()))?;

        for (i, decl) in decls.iter().enumerate() {
            if decl.strategy != MatchStrategy::Exact {
                continue;
            }
            let existing = table
                .get(&decl.kind)
                .and_then(|regs| {
                    regs.iter()
                        .find(|r| r.strategy == MatchStrategy::Exact && r.pattern == decl.pattern)
                })
                .map(|r| r.source.clone())
                .or_else(|| {
                    decls[..i]
                        .iter()
                        .any(|d| {
                            d.strategy == MatchStrategy::Exact
                                && d.kind == decl.kind
                                && d.pattern == decl.pattern
                        })
                        .then(|| source.to_string())
                });
            if let Some(existing_source) = existing {
                return Err(RegistryError::DuplicateInteraction {
                    kind: decl.kind.to_string(),
                    pattern: decl.pattern.clone(),
                    existing_source,
                });
            }
        }

        let count = decls.len();
        for decl in decls {
            let regs = table.entry(decl.kind).or_default();
            regs.push(InteractionRegistration {
                kind: decl.kind,
                pattern: decl.pattern,
                strategy: decl.strategy,
                handler: decl.handler,
                priority,
                source: source.to_string(),
            });
            // Stable sort keeps insertion order within a priority
            regs.sort_by(|a, b| b.priority.cmp(&a.priority));
        }

        debug!("registered {} interaction handler(s) for {}", count, source);
        Ok(count)
    }

    /// Remove every registration owned by a source label (hot reload)
    pub fn unregister_by_source(&self, source: &str) -> usize {
        let Ok(mut table) = self.table.write() else {
            return 0;
        };
        let mut removed = 0;
        for regs in table.values_mut() {
            let before = regs.len();
            regs.retain(|r| r.source != source);
            removed += before - regs.len();
        }
        removed
    }

    /// Number of registrations for a kind
    pub fn count(&self, kind: InteractionKind) -> usize {
        self.table
            .read()
            .ok()
            .and_then(|t| t.get(&kind).map(|r| r.len()))
            .unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.table
            .read()
            .ok()
            .map(|t| t.values().map(|r| r.len()).sum())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Route one incoming interaction.
    ///
    /// Candidates are tried in descending priority order; a handler error
    /// counts as "did not handle" and dispatch continues. The registry never
    /// produces user-visible output itself.
    pub async fn dispatch(
        &self,
        interaction: &Interaction,
        client: Arc<dyn ClientHandle>,
    ) -> DispatchOutcome {
        let Some(kind) = InteractionKind::from_raw(&interaction.raw_kind) else {
            warn!(
                "dropping interaction with unrecognized kind '{}'",
                interaction.raw_kind
            );
            return DispatchOutcome::Unroutable;
        };

        // Snapshot under the read lock; handlers run without it held
        let candidates: Vec<InteractionRegistration> = self
            .table
            .read()
            .ok()
            .and_then(|t| t.get(&kind).cloned())
            .unwrap_or_default();

        for candidate in candidates {
            if !matches_pattern(candidate.strategy, &candidate.pattern, &interaction.custom_id) {
                continue;
            }
            match candidate.handler.handle(interaction, client.clone()).await {
                Ok(true) => {
                    debug!(
                        "'{}' handled by {} ({} '{}')",
                        interaction.custom_id, candidate.source, kind, candidate.pattern
                    );
                    return DispatchOutcome::Handled;
                }
                Ok(false) => continue,
                Err(e) => {
                    warn!(
                        "handler from {} failed on '{}': {}",
                        candidate.source, interaction.custom_id, e
                    );
                    continue;
                }
            }
        }

        DispatchOutcome::Unhandled
    }
}

fn matches_pattern(strategy: MatchStrategy, pattern: &str, custom_id: &str) -> bool {
    match strategy {
        MatchStrategy::Exact => custom_id == pattern,
        MatchStrategy::Prefix => custom_id.starts_with(pattern),
        MatchStrategy::Regex => match Regex::new(pattern) {
            Ok(re) => re.is_match(custom_id),
            Err(e) => {
                debug!("unusable regex pattern '{}': {}", pattern, e);
                false
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use crate::application::errors::{ClientError, HostError};
    use crate::domain::entities::CommandSchema;
    use crate::domain::traits::ClientInfo;

    struct NullClient;

    #[async_trait]
    impl ClientHandle for NullClient {
        async fn send_message(&self, _channel_id: &str, _text: &str) -> Result<(), ClientError> {
            Ok(())
        }

        async fn acknowledge(
            &self,
            _interaction: &Interaction,
            _text: Option<&str>,
        ) -> Result<(), ClientError> {
            Ok(())
        }

        async fn register_command(&self, _schema: &CommandSchema) -> Result<(), ClientError> {
            Ok(())
        }

        fn client_info(&self) -> ClientInfo {
            ClientInfo {
                id: "null".to_string(),
                name: "null".to_string(),
            }
        }
    }

    /// Records its label on invocation, then reports handled/unhandled
    struct RecordingHandler {
        label: &'static str,
        handled: bool,
        calls: Arc<Mutex<Vec<&'static str>>>,
    }

    #[async_trait]
    impl InteractionHandler for RecordingHandler {
        async fn handle(
            &self,
            _interaction: &Interaction,
            _client: Arc<dyn ClientHandle>,
        ) -> Result<bool, HostError> {
            self.calls.lock().unwrap().push(self.label);
            Ok(self.handled)
        }
    }

    struct FailingHandler {
        invoked: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl InteractionHandler for FailingHandler {
        async fn handle(
            &self,
            _interaction: &Interaction,
            _client: Arc<dyn ClientHandle>,
        ) -> Result<bool, HostError> {
            self.invoked.fetch_add(1, Ordering::SeqCst);
            Err(HostError::Internal("boom".to_string()))
        }
    }

    fn decl(
        pattern: &str,
        strategy: MatchStrategy,
        handler: Arc<dyn InteractionHandler>,
    ) -> InteractionDecl {
        InteractionDecl::new(InteractionKind::Button, pattern, strategy, handler)
    }

    fn recording(
        label: &'static str,
        handled: bool,
        calls: &Arc<Mutex<Vec<&'static str>>>,
    ) -> Arc<dyn InteractionHandler> {
        Arc::new(RecordingHandler {
            label,
            handled,
            calls: calls.clone(),
        })
    }

    #[test]
    fn exact_duplicates_are_rejected_atomically() {
        let registry = InteractionRegistry::new();
        let calls = Arc::new(Mutex::new(Vec::new()));

        registry
            .register_batch(
                "module-a",
                0,
                vec![decl("confirm", MatchStrategy::Exact, recording("a", true, &calls))],
            )
            .unwrap();

        // Second batch: one fresh handler plus one conflicting one.
        // Nothing from the batch may land.
        let err = registry
            .register_batch(
                "module-b",
                0,
                vec![
                    decl("other", MatchStrategy::Exact, recording("b1", true, &calls)),
                    decl("confirm", MatchStrategy::Exact, recording("b2", true, &calls)),
                ],
            )
            .unwrap_err();

        match err {
            RegistryError::DuplicateInteraction {
                pattern,
                existing_source,
                ..
            } => {
                assert_eq!(pattern, "confirm");
                assert_eq!(existing_source, "module-a");
            }
            other => panic!("unexpected error: {}", other),
        }
        assert_eq!(registry.count(InteractionKind::Button), 1);
    }

    #[test]
    fn duplicate_exact_within_one_batch_is_rejected() {
        let registry = InteractionRegistry::new();
        let calls = Arc::new(Mutex::new(Vec::new()));
        let err = registry
            .register_batch(
                "module-a",
                0,
                vec![
                    decl("x", MatchStrategy::Exact, recording("a", true, &calls)),
                    decl("x", MatchStrategy::Exact, recording("b", true, &calls)),
                ],
            )
            .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateInteraction { .. }));
        assert!(registry.is_empty());
    }

    #[test]
    fn prefix_registrations_may_coexist() {
        let registry = InteractionRegistry::new();
        let calls = Arc::new(Mutex::new(Vec::new()));
        registry
            .register_batch(
                "a",
                0,
                vec![decl("confirm_", MatchStrategy::Prefix, recording("a", true, &calls))],
            )
            .unwrap();
        registry
            .register_batch(
                "b",
                0,
                vec![decl("confirm_", MatchStrategy::Prefix, recording("b", true, &calls))],
            )
            .unwrap();
        assert_eq!(registry.count(InteractionKind::Button), 2);
    }

    #[tokio::test]
    async fn priority_order_with_fallthrough() {
        let registry = InteractionRegistry::new();
        let calls = Arc::new(Mutex::new(Vec::new()));

        // Exact at priority 0, prefix at priority 10: the prefix handler is
        // offered the click first; it declines, the exact one consumes it.
        registry
            .register_batch(
                "low",
                0,
                vec![decl("confirm_42", MatchStrategy::Exact, recording("exact", true, &calls))],
            )
            .unwrap();
        registry
            .register_batch(
                "high",
                10,
                vec![decl("confirm_", MatchStrategy::Prefix, recording("prefix", false, &calls))],
            )
            .unwrap();

        let outcome = registry
            .dispatch(
                &Interaction::new("button", "confirm_42"),
                Arc::new(NullClient),
            )
            .await;

        assert_eq!(outcome, DispatchOutcome::Handled);
        assert_eq!(*calls.lock().unwrap(), vec!["prefix", "exact"]);
    }

    #[tokio::test]
    async fn handler_error_falls_through() {
        let registry = InteractionRegistry::new();
        let calls = Arc::new(Mutex::new(Vec::new()));
        let invoked = Arc::new(AtomicUsize::new(0));

        registry
            .register_batch(
                "broken",
                5,
                vec![decl(
                    "go",
                    MatchStrategy::Exact,
                    Arc::new(FailingHandler {
                        invoked: invoked.clone(),
                    }),
                )],
            )
            .unwrap();
        registry
            .register_batch(
                "backup",
                0,
                vec![decl("go", MatchStrategy::Prefix, recording("backup", true, &calls))],
            )
            .unwrap();

        let outcome = registry
            .dispatch(&Interaction::new("button", "go"), Arc::new(NullClient))
            .await;

        assert_eq!(outcome, DispatchOutcome::Handled);
        assert_eq!(invoked.load(Ordering::SeqCst), 1);
        assert_eq!(*calls.lock().unwrap(), vec!["backup"]);
    }

    #[tokio::test]
    async fn regex_matching_and_bad_regex_skipped() {
        let registry = InteractionRegistry::new();
        let calls = Arc::new(Mutex::new(Vec::new()));

        registry
            .register_batch(
                "bad",
                10,
                vec![decl("([unclosed", MatchStrategy::Regex, recording("bad", true, &calls))],
            )
            .unwrap();
        registry
            .register_batch(
                "good",
                0,
                vec![decl(
                    r"^page_\d+$",
                    MatchStrategy::Regex,
                    recording("good", true, &calls),
                )],
            )
            .unwrap();

        let outcome = registry
            .dispatch(&Interaction::new("button", "page_3"), Arc::new(NullClient))
            .await;

        assert_eq!(outcome, DispatchOutcome::Handled);
        // The uncompilable pattern is treated as non-matching, not fatal
        assert_eq!(*calls.lock().unwrap(), vec!["good"]);
    }

    #[tokio::test]
    async fn unmatched_reports_unhandled() {
        let registry = InteractionRegistry::new();
        let outcome = registry
            .dispatch(&Interaction::new("button", "nothing"), Arc::new(NullClient))
            .await;
        assert_eq!(outcome, DispatchOutcome::Unhandled);
    }

    #[tokio::test]
    async fn unknown_kind_is_unroutable() {
        let registry = InteractionRegistry::new();
        let outcome = registry
            .dispatch(
                &Interaction::new("autocomplete", "whatever"),
                Arc::new(NullClient),
            )
            .await;
        assert_eq!(outcome, DispatchOutcome::Unroutable);
    }

    #[tokio::test]
    async fn dispatch_is_idempotent() {
        let registry = InteractionRegistry::new();
        let calls = Arc::new(Mutex::new(Vec::new()));
        registry
            .register_batch(
                "a",
                5,
                vec![decl("id_", MatchStrategy::Prefix, recording("first", false, &calls))],
            )
            .unwrap();
        registry
            .register_batch(
                "b",
                1,
                vec![decl("id_1", MatchStrategy::Exact, recording("second", false, &calls))],
            )
            .unwrap();

        let client: Arc<dyn ClientHandle> = Arc::new(NullClient);
        for _ in 0..3 {
            let outcome = registry
                .dispatch(&Interaction::new("button", "id_1"), client.clone())
                .await;
            assert_eq!(outcome, DispatchOutcome::Unhandled);
        }
        assert_eq!(
            *calls.lock().unwrap(),
            vec!["first", "second", "first", "second", "first", "second"]
        );
    }

    #[test]
    fn unregister_by_source_removes_only_that_source() {
        let registry = InteractionRegistry::new();
        let calls = Arc::new(Mutex::new(Vec::new()));
        registry
            .register_batch(
                "keep",
                0,
                vec![decl("a_", MatchStrategy::Prefix, recording("keep", true, &calls))],
            )
            .unwrap();
        registry
            .register_batch(
                "drop",
                0,
                vec![
                    decl("b", MatchStrategy::Exact, recording("d1", true, &calls)),
                    decl("c_", MatchStrategy::Prefix, recording("d2", true, &calls)),
                ],
            )
            .unwrap();

        assert_eq!(registry.unregister_by_source("drop"), 2);
        assert_eq!(registry.count(InteractionKind::Button), 1);
    }
}
