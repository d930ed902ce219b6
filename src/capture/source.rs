//! Listener seam between a host's event sources and a session.

use crate::session::EventSink;

/// A platform event source. The session attaches every registered source when
/// it starts and detaches it when it stops.
pub trait InputSource: Send {
    fn name(&self) -> &str;

    /// Begin delivering events into `sink`.
    fn attach(&mut self, sink: EventSink);

    /// Stop delivering events. Must be idempotent.
    fn detach(&mut self);
}
