//! Shared test fixtures.

use std::sync::Arc;

use parking_lot::Mutex;
use sy_04_remote_transfer::TransferPayload;
use sy_types::{keys, HandlerError, Message, MessageBuilder, MessageHandler};

/// Handler that records the payloads it sees, tagged with its own index.
#[derive(Debug, Clone)]
pub struct Recorder<T> {
    index: usize,
    log: Arc<Mutex<Vec<(usize, T)>>>,
}

impl<T: Clone> Recorder<T> {
    /// `count` recorders sharing one log.
    pub fn group(count: usize) -> (Vec<Recorder<T>>, Arc<Mutex<Vec<(usize, T)>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let recorders = (0..count)
            .map(|index| Recorder {
                index,
                log: Arc::clone(&log),
            })
            .collect();
        (recorders, log)
    }
}

impl<T: Clone + Send + Sync> MessageHandler<T> for Recorder<T> {
    fn handle(&self, message: &Message<T>) -> Result<Option<Message<T>>, HandlerError> {
        self.log.lock().push((self.index, message.payload().clone()));
        Ok(None)
    }
}

/// A text payload addressed to `name`.
pub fn named_text(name: &str, body: &str) -> Message<TransferPayload> {
    MessageBuilder::with_payload(TransferPayload::from(body))
        .set_header(keys::FILE_NAME, name)
        .build()
}
