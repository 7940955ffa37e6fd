//! WorkerHost - the diagnostic surface a running command writes to.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::diagnostic::Stream;
use super::preference::StreamPreferences;

#[derive(Debug)]
struct HostState {
    preferences: StreamPreferences,
    buffers: HashMap<Stream, Vec<String>>,
}

/// Per-context stream buffers plus the visibility preferences that gate them.
///
/// Cloned into every invocation started on the context; the watcher drains
/// the buffers at harvest.
#[derive(Debug, Clone)]
pub struct WorkerHost {
    index: usize,
    state: Arc<Mutex<HostState>>,
}

impl WorkerHost {
    pub fn new(index: usize, preferences: StreamPreferences) -> Self {
        Self {
            index,
            state: Arc::new(Mutex::new(HostState {
                preferences,
                buffers: HashMap::new(),
            })),
        }
    }

    /// Index of the worker owning this host.
    pub fn index(&self) -> usize {
        self.index
    }

    fn lock(&self) -> MutexGuard<'_, HostState> {
        // poison されても buffer 自体は壊れていないのでそのまま使う
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn preferences(&self) -> StreamPreferences {
        self.lock().preferences
    }

    pub fn apply_preferences(&self, preferences: StreamPreferences) {
        self.lock().preferences = preferences;
    }

    /// Buffer `message` on `stream` unless the stream is muted.
    pub fn write(&self, stream: Stream, message: impl Into<String>) {
        let mut state = self.lock();
        if state.preferences.allows(stream) {
            state.buffers.entry(stream).or_default().push(message.into());
        }
    }

    pub fn verbose(&self, message: impl Into<String>) {
        self.write(Stream::Verbose, message);
    }

    pub fn debug(&self, message: impl Into<String>) {
        self.write(Stream::Debug, message);
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.write(Stream::Warning, message);
    }

    pub fn information(&self, message: impl Into<String>) {
        self.write(Stream::Information, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.write(Stream::Error, message);
    }

    /// Take every buffered message in forwarding order, leaving the buffers empty.
    pub fn drain(&self) -> Vec<(Stream, String)> {
        let mut state = self.lock();
        let mut drained = Vec::new();
        for stream in Stream::FORWARD_ORDER {
            if let Some(messages) = state.buffers.remove(&stream) {
                drained.extend(messages.into_iter().map(|m| (stream, m)));
            }
        }
        drained
    }
}
