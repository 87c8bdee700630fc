//! Latest-wins debouncing of async computations
//!
//! `Debouncer::call` enqueues a request and returns a receiver for its result. Calls
//! arriving within `delay` of each other collapse into one execution that uses the
//! most recent request; the receivers of superseded requests resolve with an error.
//! With `leading_edge` the first call of a burst runs immediately and later calls in
//! the same burst are collapsed into one trailing run.
//!
//! A result that resolves after a newer call has been made is discarded too, so
//! callers only ever observe the most recent completed computation.
//!
//! The worker is a single tokio task fed by an unbounded channel; it is aborted when
//! the debouncer is dropped.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::trace;

struct Request<T, R> {
    input: T,
    generation: u64,
    reply: oneshot::Sender<R>,
}

enum Command<T, R> {
    Call(Request<T, R>),
    Cancel,
}

pub struct Debouncer<T, R> {
    tx: mpsc::UnboundedSender<Command<T, R>>,
    generation: Arc<AtomicU64>,
    task: JoinHandle<()>,
}

impl<T, R> Debouncer<T, R>
where
    T: Send + 'static,
    R: Send + 'static,
{
    /// Spawn the worker; must be called inside a tokio runtime
    pub fn new<F, Fut>(delay: Duration, leading_edge: bool, handler: F) -> Self
    where
        F: FnMut(T) -> Fut + Send + 'static,
        Fut: Future<Output = R> + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let generation = Arc::new(AtomicU64::new(0));
        let task = tokio::spawn(run(rx, delay, leading_edge, generation.clone(), handler));
        Self {
            tx,
            generation,
            task,
        }
    }

    /// Request a computation; the receiver errors if the request is superseded
    pub fn call(&self, input: T) -> oneshot::Receiver<R> {
        let (reply, receiver) = oneshot::channel();
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        // A closed channel drops `reply`, which the caller observes as superseded
        let _ = self.tx.send(Command::Call(Request {
            input,
            generation,
            reply,
        }));
        receiver
    }

    /// Drop the pending request, if any, without running it
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        let _ = self.tx.send(Command::Cancel);
    }
}

impl<T, R> Drop for Debouncer<T, R> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn execute<T, R, F, Fut>(request: Request<T, R>, generation: &AtomicU64, handler: &mut F)
where
    F: FnMut(T) -> Fut,
    Fut: Future<Output = R>,
{
    let output = handler(request.input).await;
    if generation.load(Ordering::Acquire) == request.generation {
        let _ = request.reply.send(output);
    } else {
        trace!("Discarding result of superseded request {}", request.generation);
    }
}

async fn run<T, R, F, Fut>(
    mut rx: mpsc::UnboundedReceiver<Command<T, R>>,
    delay: Duration,
    leading_edge: bool,
    generation: Arc<AtomicU64>,
    mut handler: F,
) where
    F: FnMut(T) -> Fut,
    Fut: Future<Output = R>,
{
    loop {
        let first = match rx.recv().await {
            Some(Command::Call(request)) => request,
            Some(Command::Cancel) => continue,
            None => return,
        };

        let mut pending = if leading_edge {
            execute(first, &generation, &mut handler).await;
            None
        } else {
            Some(first)
        };

        let sleep = time::sleep(delay);
        tokio::pin!(sleep);
        loop {
            tokio::select! {
                command = rx.recv() => match command {
                    Some(Command::Call(request)) => {
                        // Replacing drops the superseded reply sender
                        pending = Some(request);
                        sleep.as_mut().reset(Instant::now() + delay);
                    }
                    Some(Command::Cancel) => {
                        pending = None;
                        break;
                    }
                    None => {
                        if let Some(request) = pending.take() {
                            execute(request, &generation, &mut handler).await;
                        }
                        return;
                    }
                },
                () = &mut sleep => {
                    if let Some(request) = pending.take() {
                        execute(request, &generation, &mut handler).await;
                    }
                    break;
                }
            }
        }
    }
}
