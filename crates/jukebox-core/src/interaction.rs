// ── Interaction controller ──
//
// Listens on every configured device source and turns each raw event into
// exactly one `KeyInput` or `TagInput` dispatch.

use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, info, trace};

use crate::config::RemoteKeymap;
use crate::device::{DeviceEvent, InputSource};
use crate::error::CoreError;
use crate::event::{EventChannel, SubscriptionId};
use crate::input::{KeyInput, MappedInput, TagInput, map_device_event};

enum Lifecycle {
    Idle,
    Listening(Vec<(Arc<dyn InputSource>, SubscriptionId)>),
    Stopped,
}

pub struct InteractionController {
    sources: Vec<Arc<dyn InputSource>>,
    keymap: Arc<RemoteKeymap>,
    key_input: Arc<EventChannel<KeyInput>>,
    tag_input: Arc<EventChannel<TagInput>>,
    lifecycle: Mutex<Lifecycle>,
}

impl InteractionController {
    pub fn new(sources: Vec<Arc<dyn InputSource>>, keymap: RemoteKeymap) -> Self {
        Self {
            sources,
            keymap: Arc::new(keymap),
            key_input: Arc::new(EventChannel::new("key-input")),
            tag_input: Arc::new(EventChannel::new("tag-input")),
            lifecycle: Mutex::new(Lifecycle::Idle),
        }
    }

    /// Logical key stream.
    pub fn key_input(&self) -> &Arc<EventChannel<KeyInput>> {
        &self.key_input
    }

    /// RFID tag stream.
    pub fn tag_input(&self) -> &Arc<EventChannel<TagInput>> {
        &self.tag_input
    }

    pub fn sources(&self) -> &[Arc<dyn InputSource>] {
        &self.sources
    }

    pub fn is_listening(&self) -> bool {
        matches!(
            *self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner),
            Lifecycle::Listening(_)
        )
    }

    /// Begin listening on all device sources. Call once.
    pub fn start(&self) -> Result<(), CoreError> {
        let mut lifecycle = self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner);
        if !matches!(*lifecycle, Lifecycle::Idle) {
            return Err(CoreError::AlreadyStarted);
        }

        let subscriptions = self
            .sources
            .iter()
            .map(|source| {
                let id = self.listen(source);
                (Arc::clone(source), id)
            })
            .collect::<Vec<_>>();

        info!(sources = subscriptions.len(), "interaction controller listening");
        *lifecycle = Lifecycle::Listening(subscriptions);
        Ok(())
    }

    /// Unsubscribe from every device source. Further device events are
    /// no longer forwarded.
    pub fn stop(&self) {
        let mut lifecycle = self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner);
        if let Lifecycle::Listening(subscriptions) =
            std::mem::replace(&mut *lifecycle, Lifecycle::Stopped)
        {
            for (source, id) in subscriptions {
                source.notifications().unsubscribe(id);
            }
            debug!("interaction controller stopped");
        }
    }

    fn listen(&self, source: &Arc<dyn InputSource>) -> SubscriptionId {
        let name: Arc<str> = Arc::from(source.name());
        let keymap = Arc::clone(&self.keymap);
        let key_input = Arc::clone(&self.key_input);
        let tag_input = Arc::clone(&self.tag_input);

        source
            .notifications()
            .subscribe("interaction-controller", move |event: &DeviceEvent| {
                match map_device_event(event, &keymap) {
                    MappedInput::Key(key) => {
                        if key == KeyInput::Unknown {
                            debug!(source = %name, ?event, "unrecognised input forwarded as Unknown");
                        } else {
                            trace!(source = %name, %key, "key input");
                        }
                        key_input.dispatch(&key);
                    }
                    MappedInput::Tag(tag) => {
                        trace!(source = %name, %tag, "tag input");
                        tag_input.dispatch(&tag);
                    }
                }
            })
    }
}
