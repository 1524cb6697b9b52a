use std::future::Future;

use anyhow::{anyhow, Result};
use tokio::sync::oneshot::{self, error::TryRecvError};
use tokio::task::JoinHandle;

use spot_vision::frame::{Frame, ModelInput};

/// Black-box inference: fixed-size image in, flat prediction tensor out.
pub trait Predictor: Send + Sync + 'static {
    fn predict(&self, input: ModelInput) -> impl Future<Output = Result<Vec<f32>>> + Send;
}

/// Raw frame stream. `Ok(None)` ends the session.
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<Option<Frame>>;
}

pub(crate) type Outcome = (u64, Result<Vec<f32>>);

pub(crate) enum Poll {
    Idle,
    Pending,
    Ready(Outcome),
}

struct InFlight {
    generation: u64,
    rx: oneshot::Receiver<Result<Vec<f32>>>,
    handle: JoinHandle<()>,
}

/// Holds at most one outstanding inference task.
#[derive(Default)]
pub(crate) struct SingleFlight {
    slot: Option<InFlight>,
}

impl SingleFlight {
    pub fn is_busy(&self) -> bool {
        self.slot.is_some()
    }

    /// Spawns `fut` tagged with `generation`. Caller checks `is_busy` first.
    pub fn launch<F>(&mut self, generation: u64, fut: F)
    where
        F: Future<Output = Result<Vec<f32>>> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let handle = tokio::spawn(async move {
            let _ = tx.send(fut.await);
        });
        self.slot = Some(InFlight { generation, rx, handle });
    }

    pub fn poll(&mut self) -> Poll {
        let Some(f) = self.slot.as_mut() else { return Poll::Idle; };
        let generation = f.generation;
        let res = match f.rx.try_recv() {
            Ok(r) => r,
            Err(TryRecvError::Empty) => return Poll::Pending,
            Err(TryRecvError::Closed) => Err(anyhow!("inference task ended without a result")),
        };
        self.slot = None;
        Poll::Ready((generation, res))
    }

    pub async fn wait(&mut self) -> Option<Outcome> {
        let f = self.slot.take()?;
        let res = match f.rx.await {
            Ok(r) => r,
            Err(_) => Err(anyhow!("inference task ended without a result")),
        };
        Some((f.generation, res))
    }

    pub fn cancel(&mut self) {
        if let Some(f) = self.slot.take() {
            f.handle.abort();
        }
    }
}

impl Drop for SingleFlight {
    fn drop(&mut self) {
        self.cancel();
    }
}
