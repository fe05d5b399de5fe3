#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use uploader_engine::{EngineEvent, EventSink, UploadConfig};

#[derive(Default, Clone)]
pub struct TestSink {
    events: Arc<Mutex<Vec<EngineEvent>>>,
}

impl TestSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&self) -> Vec<EngineEvent> {
        self.events.lock().unwrap().drain(..).collect()
    }

    pub fn progress(&self) -> Vec<f64> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|event| match event {
                EngineEvent::CompressionProgress(p) => Some(*p),
                _ => None,
            })
            .collect()
    }
}

impl EventSink for TestSink {
    fn emit(&self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}

pub fn config_for(base_url: &str) -> UploadConfig {
    UploadConfig::new(base_url, "test-secret").expect("valid config")
}
