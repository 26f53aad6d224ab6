//! Lifecycle events and their dispatch.
//!
//! The hosting environment raises four kinds of events. [`EventHandler`]
//! is the handler table; [`Dispatcher`] is the adapter that sits at the
//! environment boundary, routes each [`Event`] to the handler and answers
//! requests the handler chose not to intercept.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use stashbox_core::{FetchContext, FetchRequest, FetchResponse, Network};
use tracing::{Instrument, debug, info_span};

use crate::error::CacheError;
use crate::lifecycle::{ActivateReport, InstallReport};
use crate::strategy::Served;

/// A message posted to the controller by a page.
///
/// The wire form is a JSON object tagged by `type`:
///
/// ```
/// use stashbox::Message;
///
/// let message = Message::from_json(r#"{"type": "CLEAR_CACHE"}"#).unwrap();
/// assert_eq!(message, Message::ClearCache);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Message {
    /// Delete every cache generation.
    ClearCache,
    /// Any message type this controller does not know.
    #[serde(other)]
    Unknown,
}

impl Message {
    /// Parses the JSON wire form.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Event raised by the hosting environment.
#[derive(Debug, Clone)]
pub enum Event {
    /// A new version should seed its caches.
    Install,
    /// A new version should take over.
    Activate,
    /// A page issued a request.
    Fetch(FetchRequest),
    /// A page posted a message.
    Message(Message),
}

/// What the handler decided to do with a request.
#[derive(Debug)]
pub enum FetchDisposition {
    /// The handler resolved the request.
    Intercepted(Served),
    /// The request is not the handler's business; send it to the network
    /// untouched.
    Passthrough(FetchRequest),
}

/// Handler table for lifecycle events.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Seeds the caches of this version.
    async fn on_install(&self) -> Result<InstallReport, CacheError>;

    /// Retires other versions and takes control of open pages.
    async fn on_activate(&self) -> Result<ActivateReport, CacheError>;

    /// Resolves or declines a request.
    async fn on_fetch(&self, request: FetchRequest) -> Result<FetchDisposition, CacheError>;

    /// Handles a posted message.
    async fn on_message(&self, message: Message) -> Result<(), CacheError>;

    /// Whether a successful install should be followed by activation right
    /// away.
    fn skip_waiting(&self) -> bool {
        false
    }
}

#[async_trait]
impl<H> EventHandler for Arc<H>
where
    H: EventHandler + ?Sized,
{
    async fn on_install(&self) -> Result<InstallReport, CacheError> {
        (**self).on_install().await
    }

    async fn on_activate(&self) -> Result<ActivateReport, CacheError> {
        (**self).on_activate().await
    }

    async fn on_fetch(&self, request: FetchRequest) -> Result<FetchDisposition, CacheError> {
        (**self).on_fetch(request).await
    }

    async fn on_message(&self, message: Message) -> Result<(), CacheError> {
        (**self).on_message(message).await
    }

    fn skip_waiting(&self) -> bool {
        (**self).skip_waiting()
    }
}

/// Outcome of a dispatched event.
#[derive(Debug)]
pub enum Dispatched {
    /// Install finished, possibly followed by activation.
    Installed {
        /// Install result.
        install: InstallReport,
        /// Activation result when the install chained into it.
        activate: Option<ActivateReport>,
    },
    /// Activation finished.
    Activated(ActivateReport),
    /// A response for a fetch event.
    Responded {
        /// The response given to the page.
        response: FetchResponse,
        /// How it was resolved; `None` for pass-through requests.
        context: Option<FetchContext>,
    },
    /// A message was processed.
    MessageHandled,
}

/// Adapter between the hosting environment and an [`EventHandler`].
#[derive(Debug, Clone)]
pub struct Dispatcher<H, N> {
    handler: H,
    network: N,
}

impl<H, N> Dispatcher<H, N>
where
    H: EventHandler,
    N: Network,
{
    /// Creates a dispatcher. `network` answers pass-through requests.
    pub fn new(handler: H, network: N) -> Self {
        Self { handler, network }
    }

    /// The wrapped handler.
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Routes `event` to the handler.
    pub async fn dispatch(&self, event: Event) -> Result<Dispatched, CacheError> {
        match event {
            Event::Install => {
                let install = self
                    .handler
                    .on_install()
                    .instrument(info_span!("install"))
                    .await?;
                let activate = if self.handler.skip_waiting() {
                    debug!("skipping waiting phase");
                    Some(self.activate().await?)
                } else {
                    None
                };
                Ok(Dispatched::Installed { install, activate })
            }
            Event::Activate => self.activate().await.map(Dispatched::Activated),
            Event::Fetch(request) => {
                let (response, context) = self.respond(request).await?;
                Ok(Dispatched::Responded { response, context })
            }
            Event::Message(message) => {
                self.handler.on_message(message).await?;
                Ok(Dispatched::MessageHandled)
            }
        }
    }

    /// Dispatches a fetch event and returns only the response.
    pub async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, CacheError> {
        self.respond(request).await.map(|(response, _)| response)
    }

    async fn respond(
        &self,
        request: FetchRequest,
    ) -> Result<(FetchResponse, Option<FetchContext>), CacheError> {
        let span = info_span!("fetch", method = %request.method(), uri = %request.uri());
        async {
            match self.handler.on_fetch(request).await? {
                FetchDisposition::Intercepted(served) => Ok((served.response, Some(served.context))),
                FetchDisposition::Passthrough(request) => {
                    let response = self.network.fetch(request).await?;
                    Ok((response, None))
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn activate(&self) -> Result<ActivateReport, CacheError> {
        self.handler
            .on_activate()
            .instrument(info_span!("activate"))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_cache_wire_form() {
        assert_eq!(
            serde_json::to_string(&Message::ClearCache).unwrap(),
            r#"{"type":"CLEAR_CACHE"}"#
        );
    }

    #[test]
    fn test_unknown_message_type() {
        assert_eq!(
            Message::from_json(r#"{"type": "SKIP_WAITING"}"#).unwrap(),
            Message::Unknown
        );
    }

    #[test]
    fn test_message_without_type_is_rejected() {
        assert!(Message::from_json(r#"{"kind": "CLEAR_CACHE"}"#).is_err());
    }
}
