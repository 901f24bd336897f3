//! Channel-backed sink whose items are consumed by a spawned task

use futures::Sink;
use std::future::Future;
use std::io;
use std::pin::Pin;
use std::task::{ready, Context, Poll};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::PollSender;

/// A sink that forwards items over a bounded channel to a driver task.
///
/// The driver receives the items as a stream and runs until that stream
/// ends. Backpressure comes from the channel bound. Closing the sink closes
/// the channel and then waits for the driver, so completion is reported only
/// after the driver has finished its own work (flushing, closing files,
/// awaiting a response) and carries the driver's error if it failed.
///
/// Flushing only hands the buffered items over to the driver and reports a
/// driver that has already stopped; delivery is confirmed by closing.
///
/// Dropping the sink without closing it aborts the driver.
pub struct ChannelSink<T, E> {
    sender: PollSender<T>,
    task: Option<JoinHandle<Result<(), E>>>,
}

impl<T, E> ChannelSink<T, E>
where
    T: Send + 'static,
    E: From<io::Error> + Send + 'static,
{
    /// Spawn `drive` on the current Tokio runtime and return the sink feeding it.
    ///
    /// Fails when called outside a runtime.
    pub fn spawn<F, Fut>(capacity: usize, drive: F) -> io::Result<Self>
    where
        F: FnOnce(ReceiverStream<T>) -> Fut,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
    {
        let runtime = tokio::runtime::Handle::try_current().map_err(io::Error::other)?;
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let task = runtime.spawn(drive(ReceiverStream::new(receiver)));
        Ok(Self {
            sender: PollSender::new(sender),
            task: Some(task),
        })
    }

    fn poll_task(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), E>> {
        let Some(task) = self.task.as_mut() else {
            return Poll::Ready(Ok(()));
        };
        let joined = ready!(Pin::new(task).poll(cx));
        self.task = None;
        Poll::Ready(match joined {
            Ok(result) => result,
            Err(e) => Err(io::Error::other(e).into()),
        })
    }
}

impl<T, E> Unpin for ChannelSink<T, E> {}

impl<T, E> Sink<T> for ChannelSink<T, E>
where
    T: Send + 'static,
    E: From<io::Error> + Send + 'static,
{
    type Error = E;

    fn poll_ready(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), E>> {
        let this = self.get_mut();
        match this.sender.poll_reserve(cx) {
            Poll::Ready(Ok(())) => Poll::Ready(Ok(())),
            // The driver dropped its receiver, so it has stopped: report why.
            Poll::Ready(Err(_)) => {
                ready!(this.poll_task(cx))?;
                Poll::Ready(Err(stopped().into()))
            }
            Poll::Pending => Poll::Pending,
        }
    }

    fn start_send(self: Pin<&mut Self>, item: T) -> Result<(), E> {
        self.get_mut()
            .sender
            .send_item(item)
            .map_err(|_| stopped().into())
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), E>> {
        let this = self.get_mut();
        if !this.sender.is_closed() {
            return Poll::Ready(Ok(()));
        }
        ready!(this.poll_task(cx))?;
        Poll::Ready(Err(stopped().into()))
    }

    fn poll_close(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), E>> {
        let this = self.get_mut();
        this.sender.close();
        this.poll_task(cx)
    }
}

impl<T, E> Drop for ChannelSink<T, E> {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            tracing::warn!("Sink dropped before close; aborting its writer");
            task.abort();
        }
    }
}

fn stopped() -> io::Error {
    io::Error::new(io::ErrorKind::BrokenPipe, "sink driver stopped")
}
