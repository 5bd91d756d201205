//! Optional deadline future for bounding the readiness wait.

use std::pin::Pin;
use std::task::{Context, Poll, ready};
use std::time::Duration;
use tokio::time::{Sleep, sleep};

/// A future that resolves once the configured maximum wait elapses, or never
/// when no maximum wait is configured.
///
/// [`MaxWaitTimer`] takes its optional deadline at construction: a dispatcher
/// arms at most once and never re-arms. The unarmed timer stays pending
/// forever, which lets it sit in a `tokio::select!` branch unconditionally.
/// The inner [`Sleep`] is boxed so the timer is `Unpin` and can live as a
/// plain local in the select loop.
#[derive(Debug)]
pub struct MaxWaitTimer {
    deadline: Option<Pin<Box<Sleep>>>,
}

impl MaxWaitTimer {
    /// Creates a timer that resolves after `limit`, or never for [`None`].
    pub fn new(limit: Option<Duration>) -> Self {
        Self {
            deadline: limit.map(|limit| Box::pin(sleep(limit))),
        }
    }

    /// Returns whether a deadline is armed.
    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }
}

impl Future for MaxWaitTimer {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        let Some(deadline) = this.deadline.as_mut() else {
            return Poll::Pending;
        };

        ready!(deadline.as_mut().poll(cx));

        Poll::Ready(())
    }
}
