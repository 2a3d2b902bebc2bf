//! Core chat session management.
//!
//! [`ChatSession`] owns the request lifecycle of one chat surface: it checks
//! the [`InputGate`], resolves the subject from the active tab, dispatches the
//! request through a [`Transport`], drives the reply into the renderer and
//! releases the gate once the send settles.

use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use futures::StreamExt;

use crate::chat::gate::{Controls, InputGate};
use crate::error::Error;
use crate::observability::{
    SESSION_FAILED, SESSION_REJECTED, SESSION_SENDS, STREAM_DURATION, STREAM_FRAGMENTS,
    STREAM_TTFF,
};
use crate::render::{Renderer, StreamHandle};
use crate::transport::Transport;
use crate::types::{ChatRequest, Sender, Subject};

/// How replies are requested.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReplyMode {
    /// Fragments are rendered as they arrive.
    #[default]
    Streaming,
    /// The complete reply is awaited and rendered as one message.
    Single,
}

/// How one send attempt ended.
#[derive(Debug, Clone)]
pub enum SendOutcome {
    /// The message was empty after trimming; nothing happened.
    Ignored,
    /// Another send held the gate; nothing happened.
    Rejected,
    /// The reply was rendered in full.
    Completed,
    /// The send ended with an error, which has already been rendered.
    Failed(Error),
}

impl SendOutcome {
    /// True if the reply was rendered in full.
    pub fn is_completed(&self) -> bool {
        matches!(self, SendOutcome::Completed)
    }

    /// True if the gate turned the send away.
    pub fn is_rejected(&self) -> bool {
        matches!(self, SendOutcome::Rejected)
    }

    /// The error that ended the send, if any.
    pub fn error(&self) -> Option<&Error> {
        match self {
            SendOutcome::Failed(err) => Some(err),
            _ => None,
        }
    }
}

/// Aggregated stats for a chat session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// The reply mode in effect.
    pub mode: ReplyMode,
    /// Sends that acquired the gate.
    pub accepted: u64,
    /// Sends turned away because another was in flight.
    pub rejected: u64,
    /// Sends whose reply was rendered in full.
    pub completed: u64,
    /// Sends that ended in an error.
    pub failed: u64,
    /// Failures that were rate-limit responses.
    pub rate_limited: u64,
    /// Streamed fragments rendered.
    pub fragments: u64,
    /// Characters of reply text rendered.
    pub characters: u64,
}

#[derive(Debug, Default)]
struct Counters {
    accepted: AtomicU64,
    rejected: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
    rate_limited: AtomicU64,
    fragments: AtomicU64,
    characters: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64, by: u64) {
        counter.fetch_add(by, Ordering::Relaxed);
    }
}

/// The reply being built by one streamed send.
struct StreamSession {
    started: Instant,
    handle: Option<StreamHandle>,
    buffer: String,
    fragments: u64,
}

impl StreamSession {
    fn new(started: Instant) -> Self {
        Self {
            started,
            handle: None,
            buffer: String::new(),
            fragments: 0,
        }
    }

    /// Renders one non-empty fragment, opening the bot bubble on the first.
    fn push<V: Renderer + ?Sized>(&mut self, view: &mut V, fragment: &str) {
        let handle = match self.handle {
            Some(handle) => handle,
            None => {
                view.remove_typing_indicator();
                let handle = view.begin_streaming_bot_message();
                STREAM_TTFF.add(self.started.elapsed().as_secs_f64());
                self.handle = Some(handle);
                handle
            }
        };
        self.buffer.push_str(fragment);
        self.fragments += 1;
        STREAM_FRAGMENTS.click();
        view.append_stream_fragment(handle, fragment);
    }
}

/// The view of one accepted send, holding the gate until the send settles.
///
/// Normal completion calls [`InFlight::settle`]. If the send is dropped
/// first (a caller's timeout, a `select!` or a panic), `Drop` takes down the
/// typing indicator and releases the gate instead, so the gate and every
/// clone of it stay usable.
struct InFlight<'a, V: Renderer + Controls + ?Sized> {
    gate: &'a InputGate,
    view: &'a mut V,
    settled: bool,
}

impl<V: Renderer + Controls + ?Sized> InFlight<'_, V> {
    fn settle(mut self) {
        self.settled = true;
        self.gate.release(&mut *self.view);
    }
}

impl<V: Renderer + Controls + ?Sized> Deref for InFlight<'_, V> {
    type Target = V;

    fn deref(&self) -> &V {
        self.view
    }
}

impl<V: Renderer + Controls + ?Sized> DerefMut for InFlight<'_, V> {
    fn deref_mut(&mut self) -> &mut V {
        self.view
    }
}

impl<V: Renderer + Controls + ?Sized> Drop for InFlight<'_, V> {
    fn drop(&mut self) {
        if !self.settled {
            self.view.remove_typing_indicator();
            self.gate.release(&mut *self.view);
        }
    }
}

/// A chat session that sends messages and renders the replies.
///
/// Every send method takes `&self`; the session's only mutable request state
/// is the shared [`InputGate`], so at most one send is in flight no matter how
/// many entry points (or clones of the gate) race for it. A send that
/// acquired the gate releases it exactly once, whether it completes, fails or
/// is dropped part way.
pub struct ChatSession<T: Transport> {
    transport: T,
    gate: InputGate,
    mode: ReplyMode,
    counters: Counters,
}

impl<T: Transport> ChatSession<T> {
    /// Creates a streaming session with its own gate.
    pub fn new(transport: T) -> Self {
        Self::with_gate(transport, InputGate::new())
    }

    /// Creates a session that shares `gate` with other entry points.
    pub fn with_gate(transport: T, gate: InputGate) -> Self {
        Self {
            transport,
            gate,
            mode: ReplyMode::default(),
            counters: Counters::default(),
        }
    }

    /// Sets the reply mode used by [`ChatSession::submit`].
    pub fn set_mode(&mut self, mode: ReplyMode) {
        self.mode = mode;
    }

    /// Sets the reply mode.
    pub fn with_mode(mut self, mode: ReplyMode) -> Self {
        self.mode = mode;
        self
    }

    /// Returns the reply mode.
    pub fn mode(&self) -> ReplyMode {
        self.mode
    }

    /// Returns the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Returns the gate.
    pub fn gate(&self) -> &InputGate {
        &self.gate
    }

    /// Returns the current session statistics snapshot.
    pub fn stats(&self) -> SessionStats {
        let load = |counter: &AtomicU64| counter.load(Ordering::Relaxed);
        SessionStats {
            mode: self.mode,
            accepted: load(&self.counters.accepted),
            rejected: load(&self.counters.rejected),
            completed: load(&self.counters.completed),
            failed: load(&self.counters.failed),
            rate_limited: load(&self.counters.rate_limited),
            fragments: load(&self.counters.fragments),
            characters: load(&self.counters.characters),
        }
    }

    /// Sends whatever is in the input field, as the activation key does.
    pub async fn submit<V>(&self, view: &mut V) -> SendOutcome
    where
        V: Renderer + Controls + ?Sized,
    {
        let text = view.input_text();
        match self.mode {
            ReplyMode::Streaming => self.send_streaming(view, &text).await,
            ReplyMode::Single => self.send(view, &text).await,
        }
    }

    /// Sends the example at `index`, as clicking it does.
    ///
    /// While a send is in flight the click is turned away without touching
    /// the view. Otherwise the example is highlighted, copied into the input
    /// field and submitted.
    pub async fn click_example<V>(&self, view: &mut V, index: usize) -> SendOutcome
    where
        V: Renderer + Controls + ?Sized,
    {
        if self.gate.is_busy() {
            self.reject();
            return SendOutcome::Rejected;
        }
        let Some(label) = view.example_label(index) else {
            return SendOutcome::Ignored;
        };
        view.highlight_example(index);
        view.set_input_text(&label);
        let outcome = self.submit(view).await;
        if outcome.is_rejected() {
            view.clear_example_highlight();
        }
        outcome
    }

    /// Sends `message` and renders the reply as it streams in.
    pub async fn send_streaming<V>(&self, view: &mut V, message: &str) -> SendOutcome
    where
        V: Renderer + Controls + ?Sized,
    {
        let Some((mut in_flight, request)) = self.acquire(view, message) else {
            return self.turned_away(message);
        };
        let outcome = self.drive_stream(&mut *in_flight, &request).await;
        in_flight.settle();
        self.record(&outcome);
        outcome
    }

    /// Sends `message` and renders the complete reply as one message.
    pub async fn send<V>(&self, view: &mut V, message: &str) -> SendOutcome
    where
        V: Renderer + Controls + ?Sized,
    {
        let Some((mut in_flight, request)) = self.acquire(view, message) else {
            return self.turned_away(message);
        };
        let view = &mut *in_flight;
        let outcome = match self.transport.send(&request).await {
            Ok(reply) => {
                view.remove_typing_indicator();
                view.append_message(&reply.response, Sender::Bot);
                Counters::bump(
                    &self.counters.characters,
                    reply.response.chars().count() as u64,
                );
                SendOutcome::Completed
            }
            Err(err) => self.fail(view, None, err),
        };
        in_flight.settle();
        self.record(&outcome);
        outcome
    }

    /// Acquires the gate and performs the on-entry steps of a send.
    ///
    /// Returns `None` without side effects when the message is blank or the
    /// gate is busy.
    fn acquire<'a, V>(
        &'a self,
        view: &'a mut V,
        message: &str,
    ) -> Option<(InFlight<'a, V>, ChatRequest)>
    where
        V: Renderer + Controls + ?Sized,
    {
        let message = message.trim();
        if message.is_empty() || !self.gate.try_set_busy(view) {
            return None;
        }
        let mut in_flight = InFlight {
            gate: &self.gate,
            view,
            settled: false,
        };
        SESSION_SENDS.click();
        Counters::bump(&self.counters.accepted, 1);
        let subject = Subject::resolve(in_flight.active_tab_label().as_deref());
        in_flight.append_message(message, Sender::User);
        in_flight.set_input_text("");
        in_flight.show_typing_indicator();
        Some((in_flight, ChatRequest::new(message, subject)))
    }

    fn turned_away(&self, message: &str) -> SendOutcome {
        if message.trim().is_empty() {
            SendOutcome::Ignored
        } else {
            self.reject();
            SendOutcome::Rejected
        }
    }

    fn reject(&self) {
        SESSION_REJECTED.click();
        Counters::bump(&self.counters.rejected, 1);
    }

    async fn drive_stream<V>(&self, view: &mut V, request: &ChatRequest) -> SendOutcome
    where
        V: Renderer + Controls + ?Sized,
    {
        let started = Instant::now();
        let mut fragments = match self.transport.stream(request).await {
            Ok(fragments) => fragments,
            Err(err) => return self.fail(view, None, err),
        };
        let mut session = StreamSession::new(started);
        while let Some(item) = fragments.next().await {
            match item {
                Ok(fragment) if fragment.is_empty() => {}
                Ok(fragment) => session.push(view, &fragment),
                Err(err) => {
                    self.tally(&session);
                    return self.fail(view, session.handle, err);
                }
            }
        }
        self.tally(&session);
        let Some(handle) = session.handle else {
            return self.fail(view, None, Error::streaming("empty response", None));
        };
        view.finish_stream(handle);
        STREAM_DURATION.add(started.elapsed().as_secs_f64());
        SendOutcome::Completed
    }

    fn tally(&self, session: &StreamSession) {
        Counters::bump(&self.counters.fragments, session.fragments);
        Counters::bump(
            &self.counters.characters,
            session.buffer.chars().count() as u64,
        );
    }

    /// Renders the terminal text for `err`.
    ///
    /// A reply that already has a bubble gets the text as its last fragment,
    /// so one send never shows two bot messages. The typing indicator is gone
    /// once a bubble exists.
    fn fail<V>(&self, view: &mut V, handle: Option<StreamHandle>, err: Error) -> SendOutcome
    where
        V: Renderer + ?Sized,
    {
        let notice = err.user_message();
        match handle {
            Some(handle) => {
                view.append_stream_fragment(handle, &format!("\n\n{notice}"));
                view.finish_stream(handle);
            }
            None => {
                view.remove_typing_indicator();
                view.append_message(notice, Sender::Bot);
            }
        }
        SendOutcome::Failed(err)
    }

    fn record(&self, outcome: &SendOutcome) {
        match outcome {
            SendOutcome::Completed => Counters::bump(&self.counters.completed, 1),
            SendOutcome::Failed(err) => {
                SESSION_FAILED.click();
                Counters::bump(&self.counters.failed, 1);
                if err.is_rate_limit() {
                    Counters::bump(&self.counters.rate_limited, 1);
                }
            }
            SendOutcome::Ignored | SendOutcome::Rejected => {}
        }
    }
}
