//! Optional on-device speech-to-text for dictating notes.
//!
//! The recognizer itself lives outside this crate. When no backend is present,
//! voice input is simply reported as unavailable.
use std::path::Path;

use log::{error, info, warn};

use crate::Result;

/// A speech-to-text backend
pub trait SpeechRecognizer {
    /// Whether the backend can run on this machine/build
    fn is_available(&self) -> bool;

    fn setup_model(&mut self, model_path: &Path) -> Result<()>;

    fn transcribe(&mut self, audio_path: &Path) -> Result<String>;
}

/// Voice input front for an optional recognizer
#[derive(Default)]
pub struct VoiceInput {
    recognizer: Option<Box<dyn SpeechRecognizer>>,
    initialized: bool,
}

impl VoiceInput {
    pub fn new(recognizer: Option<Box<dyn SpeechRecognizer>>) -> Self {
        Self {
            recognizer,
            initialized: false,
        }
    }

    /// No backend at all.
    pub fn unavailable() -> Self {
        Self::default()
    }

    /// Prepares the recognizer; `false` means voice input should not be offered.
    pub fn initialize(&mut self, model_path: Option<&Path>) -> bool {
        let Some(recognizer) = self.recognizer.as_mut() else {
            info!("No speech recognizer backend, voice input disabled");
            return false;
        };

        if !recognizer.is_available() {
            info!("Speech recognizer is not available");
            return false;
        }

        if let Some(path) = model_path {
            if let Err(e) = recognizer.setup_model(path) {
                warn!(
                    "Failed to set up speech model {}: {}",
                    path.display(),
                    e
                );
                return false;
            }
        }

        self.initialized = true;
        info!("Speech recognizer initialized");
        true
    }

    /// Transcribed text, or `None` when not initialized or the backend fails
    pub fn transcribe(&mut self, audio_path: &Path) -> Option<String> {
        if !self.initialized {
            info!("Speech recognizer not initialized or not available");
            return None;
        }

        let recognizer = self.recognizer.as_mut()?;
        match recognizer.transcribe(audio_path) {
            Ok(text) => Some(text),
            Err(e) => {
                error!("Transcription of {} failed: {}", audio_path.display(), e);
                None
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        self.initialized && self.recognizer.is_some()
    }
}
