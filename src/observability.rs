use biometrics::{Collector, Counter, Moments};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("tutorius.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter = Counter::new("tutorius.client.request_errors");
pub(crate) static CLIENT_RATE_LIMITED: Counter = Counter::new("tutorius.client.rate_limited");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("tutorius.client.request_duration_seconds");

pub(crate) static STREAM_FRAGMENTS: Counter = Counter::new("tutorius.stream.fragments");
pub(crate) static STREAM_ERRORS: Counter = Counter::new("tutorius.stream.errors");
pub(crate) static STREAM_BYTES: Counter = Counter::new("tutorius.stream.bytes");
pub(crate) static STREAM_TTFF: Moments = Moments::new("tutorius.stream.ttff_seconds");
pub(crate) static STREAM_DURATION: Moments = Moments::new("tutorius.stream.duration_seconds");

pub(crate) static SESSION_SENDS: Counter = Counter::new("tutorius.session.sends");
pub(crate) static SESSION_REJECTED: Counter = Counter::new("tutorius.session.rejected");
pub(crate) static SESSION_FAILED: Counter = Counter::new("tutorius.session.failed");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_counter(&CLIENT_RATE_LIMITED);
    collector.register_moments(&CLIENT_REQUEST_DURATION);

    collector.register_counter(&STREAM_FRAGMENTS);
    collector.register_counter(&STREAM_ERRORS);
    collector.register_counter(&STREAM_BYTES);
    collector.register_moments(&STREAM_TTFF);
    collector.register_moments(&STREAM_DURATION);

    collector.register_counter(&SESSION_SENDS);
    collector.register_counter(&SESSION_REJECTED);
    collector.register_counter(&SESSION_FAILED);
}
