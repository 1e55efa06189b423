#![allow(dead_code)]

use flashdeck_core::{
    AppServices, Backend, BackendConfig, ContentGenerator, GenerationError, GenerationRequest,
    GenerationResponse,
};
use std::cell::RefCell;

/// Generator returning a fixed reply and recording every request.
pub struct ScriptedGenerator {
    reply: Result<String, GenerationError>,
    requests: RefCell<Vec<GenerationRequest>>,
}

impl ScriptedGenerator {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn failing(error: GenerationError) -> Self {
        Self {
            reply: Err(error),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.borrow().clone()
    }

    pub fn reset(&self) {
        self.requests.borrow_mut().clear();
    }
}

impl ContentGenerator for ScriptedGenerator {
    fn model_name(&self) -> &str {
        "scripted"
    }

    fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, GenerationError> {
        self.requests.borrow_mut().push(request.clone());
        self.reply.clone().map(GenerationResponse::text)
    }
}

/// Runs `check` against freshly wired services on every backend.
pub fn with_each_backend(generator: &ScriptedGenerator, check: impl Fn(&AppServices<'_>)) {
    for config in [BackendConfig::SqliteMemory, BackendConfig::Documents(None)] {
        generator.reset();
        let backend = Backend::open(&config).unwrap();
        {
            let app = AppServices::wire(&backend, Box::new(generator)).unwrap();
            check(&app);
        }
        backend.close().unwrap();
    }
}
