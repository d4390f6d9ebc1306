//! The remote state registry.
//!
//! Maps each exposed name to the application's live value and, when an
//! operator has submitted the form, a pending value awaiting merge. The
//! registry is shared between the application thread and the server worker;
//! every operation is one short critical section with no I/O under the lock.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};

use crate::config::ServerConfig;
use crate::error::{ControlError, Result};
use crate::marshal::{self, FormFields};
use crate::messages::MessageLog;
use crate::value::{Kind, Value};

/// One exposed variable.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistryEntry {
    pub name: String,
    pub kind: Kind,
    /// Last value pushed by the application.
    pub live: Value,
    /// Last value submitted over HTTP, not yet seen by the application.
    pub pending: Option<Value>,
}

impl RegistryEntry {
    /// The value an operator should see: the pending submission if one is
    /// waiting to be merged, otherwise the live value.
    pub fn current(&self) -> &Value {
        self.pending.as_ref().unwrap_or(&self.live)
    }
}

#[derive(Debug, Default)]
struct RegistryState {
    entries: BTreeMap<String, RegistryEntry>,
    last_contacted: Option<DateTime<Utc>>,
    updated: bool,
}

/// Handle to the shared registry. Clones refer to the same store.
#[derive(Debug, Clone)]
pub struct Registry {
    state: Arc<Mutex<RegistryState>>,
    messages: MessageLog,
    warn_on_overwrite: bool,
}

impl Registry {
    pub fn new() -> Self {
        Self::with_messages(MessageLog::new())
    }

    /// A registry reporting its warnings into `messages`.
    pub fn with_messages(messages: MessageLog) -> Self {
        Self {
            state: Arc::new(Mutex::new(RegistryState::default())),
            messages,
            warn_on_overwrite: true,
        }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::with_messages(MessageLog::with_capacity(config.message_capacity))
            .warn_on_overwrite(config.warn_on_overwrite)
    }

    /// Whether re-registering an existing name adds a warning to the log.
    pub fn warn_on_overwrite(mut self, enabled: bool) -> Self {
        self.warn_on_overwrite = enabled;
        self
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register `value` under `name`, inferring its kind.
    ///
    /// An existing name keeps its pending submission and has its live value
    /// overwritten.
    pub fn register(&self, name: impl Into<String>, value: impl Into<Value>) {
        self.insert(name.into(), value.into());
    }

    /// Register `value` as the kind called `kind`, converting it if needed.
    ///
    /// Fails with [`ControlError::UnsupportedKind`] when `kind` names no
    /// supported kind and with [`ControlError::KindMismatch`] when the value
    /// cannot be converted.
    pub fn register_as(
        &self,
        name: impl Into<String>,
        value: impl Into<Value>,
        kind: &str,
    ) -> Result<()> {
        let kind: Kind = kind.parse()?;
        let value = value.into().coerce(kind)?;
        self.insert(name.into(), value);
        Ok(())
    }

    /// Register a JSON value, inferring the kind from its shape.
    pub fn register_json(&self, name: impl Into<String>, json: serde_json::Value) -> Result<()> {
        let value = Value::try_from(json)?;
        self.insert(name.into(), value);
        Ok(())
    }

    fn insert(&self, name: String, value: Value) {
        let kind = value.kind();
        let overwritten = {
            let mut state = self.lock();
            match state.entries.get_mut(&name) {
                Some(entry) => {
                    if entry.kind != kind {
                        entry.kind = kind;
                        entry.pending = None;
                    }
                    entry.live = value;
                    true
                },
                None => {
                    state.entries.insert(
                        name.clone(),
                        RegistryEntry {
                            name: name.clone(),
                            kind,
                            live: value,
                            pending: None,
                        },
                    );
                    false
                },
            }
        };

        crate::log_registry_operation!("register", name, kind.name());
        if overwritten && self.warn_on_overwrite {
            self.messages
                .warn(format!("{}: name already registered, overwriting", name));
        }
    }

    /// Remove `name`. Returns whether it was registered; an unknown name
    /// only logs a warning.
    pub fn unregister(&self, name: &str) -> bool {
        let removed = self.lock().entries.remove(name).is_some();
        if removed {
            crate::log_registry_operation!("unregister", name);
        } else {
            self.messages.warn(format!(
                "unregister: {}",
                ControlError::NameNotFound(name.to_string())
            ));
        }
        removed
    }

    /// Current value of `name`.
    ///
    /// Returns the pending submission if there is one, otherwise the live
    /// value. Either way the returned value becomes the new live value, so a
    /// submission wins over any `register` made since it arrived. Unknown
    /// names log a warning and yield `None`.
    pub fn get(&self, name: &str) -> Option<Value> {
        let value = {
            let mut state = self.lock();
            state.last_contacted = Some(Utc::now());
            state.entries.get_mut(name).map(|entry| {
                if let Some(pending) = entry.pending.take() {
                    entry.live = pending;
                }
                entry.live.clone()
            })
        };

        if value.is_none() {
            self.messages.warn(format!(
                "get: {}",
                ControlError::NameNotFound(name.to_string())
            ));
        }
        value
    }

    /// True once after each accepted form submission.
    pub fn updated(&self) -> bool {
        std::mem::take(&mut self.lock().updated)
    }

    /// Merge a decoded form submission into the pending values.
    ///
    /// Every registered entry is parsed against the form; fields that match
    /// no entry are ignored. Per-field failures are returned and leave that
    /// entry untouched without affecting the others.
    pub fn apply_submission(&self, form: &FormFields) -> Vec<ControlError> {
        let mut errors = Vec::new();
        let mut applied = 0;
        {
            let mut state = self.lock();
            for entry in state.entries.values_mut() {
                match marshal::parse(&entry.name, entry.kind, form) {
                    Ok(Some(value)) => {
                        entry.pending = Some(value);
                        applied += 1;
                    },
                    Ok(None) => {},
                    Err(e) => errors.push(e),
                }
            }
            state.updated = true;
            state.last_contacted = Some(Utc::now());
        }

        tracing::debug!(
            applied = applied,
            failed = errors.len(),
            "Applied form submission"
        );
        errors
    }

    /// Record a client contact, returning the previous one.
    pub fn touch(&self) -> Option<DateTime<Utc>> {
        self.lock().last_contacted.replace(Utc::now())
    }

    pub fn last_contacted(&self) -> Option<DateTime<Utc>> {
        self.lock().last_contacted
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lock().entries.contains_key(name)
    }

    pub fn kind_of(&self, name: &str) -> Option<Kind> {
        self.lock().entries.get(name).map(|entry| entry.kind)
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    /// Copy of every entry, sorted by name.
    pub fn snapshot(&self) -> Vec<RegistryEntry> {
        self.lock().entries.values().cloned().collect()
    }

    /// Add a message to the operator-visible log.
    pub fn warn(&self, text: impl Into<String>) {
        self.messages.warn(text);
    }

    pub fn messages(&self) -> &MessageLog {
        &self.messages
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
