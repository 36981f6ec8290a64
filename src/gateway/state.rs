use serde::{Deserialize, Serialize};

/// The single shared generation slot. There is exactly one per gateway and
/// it is only ever touched under the gateway's mutex; the struct itself is
/// plain data.
///
/// Invariant: `generating` and `complete` are never both true. `begin`
/// establishes the in-flight shape, `finish` is the one terminal write.
#[derive(Debug, Clone, Default)]
pub struct GenerationSlot {
    pub generating: bool,
    pub answer: String,
    pub complete: bool,
    pub error: Option<String>,
}

impl GenerationSlot {
    /// Reset to the in-flight shape at admission, clearing the previous
    /// generation's results.
    pub fn begin(&mut self) {
        self.generating = true;
        self.answer.clear();
        self.complete = false;
        self.error = None;
    }

    /// Record the terminal result and re-open admission.
    pub fn finish(&mut self, answer: String, error: Option<String>) {
        self.answer = answer;
        self.error = error;
        self.complete = true;
        self.generating = false;
    }

    /// Point-in-time view for pollers.
    pub fn snapshot(&self) -> GenerationSnapshot {
        GenerationSnapshot {
            sentence: self.answer.clone(),
            is_complete: self.complete,
            error: self.error.clone(),
        }
    }
}

/// What a poll returns: the answer text so far (empty until the terminal
/// write), completion, and the degraded-mode duplicate of the answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationSnapshot {
    pub sentence: String,
    pub is_complete: bool,
    pub error: Option<String>,
}
