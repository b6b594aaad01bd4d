use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use eframe::egui::Context;
use tracing::debug;

use crate::data::FetchError;

type Delivery<T> = (u64, Result<T, FetchError>);

/// One outstanding background load per surface. Every request bumps the
/// generation; replies carrying an older generation are dropped on arrival.
pub(in crate::app) struct FetchSlot<T> {
    name: &'static str,
    generation: u64,
    in_flight: bool,
    tx: Sender<Delivery<T>>,
    rx: Receiver<Delivery<T>>,
}

impl<T: Send + 'static> FetchSlot<T> {
    pub(in crate::app) fn new(name: &'static str) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            name,
            generation: 0,
            in_flight: false,
            tx,
            rx,
        }
    }

    pub(in crate::app) fn is_loading(&self) -> bool {
        self.in_flight
    }

    /// Claims the next generation without spawning anything.
    pub(in crate::app) fn issue(&mut self) -> u64 {
        self.generation += 1;
        self.in_flight = true;
        self.generation
    }

    /// Forgets the outstanding request, if any. Its reply will be discarded.
    pub(in crate::app) fn cancel(&mut self) {
        self.generation += 1;
        self.in_flight = false;
    }

    pub(in crate::app) fn spawn<F>(&mut self, ctx: Option<Context>, job: F) -> u64
    where
        F: FnOnce() -> Result<T, FetchError> + Send + 'static,
    {
        let generation = self.issue();
        let tx = self.tx.clone();
        debug!(slot = self.name, generation, "starting fetch");

        thread::spawn(move || {
            let result = job();
            let _ = tx.send((generation, result));
            if let Some(ctx) = ctx {
                ctx.request_repaint();
            }
        });

        generation
    }

    pub(in crate::app) fn accept(
        &mut self,
        generation: u64,
        result: Result<T, FetchError>,
    ) -> Option<Result<T, FetchError>> {
        if generation != self.generation || !self.in_flight {
            debug!(
                slot = self.name,
                generation,
                latest = self.generation,
                "discarding stale fetch result"
            );
            return None;
        }

        self.in_flight = false;
        Some(result)
    }

    /// Drains the channel and returns the reply for the latest request.
    pub(in crate::app) fn poll(&mut self) -> Option<Result<T, FetchError>> {
        let mut latest = None;
        while let Ok((generation, result)) = self.rx.try_recv() {
            if let Some(result) = self.accept(generation, result) {
                latest = Some(result);
            }
        }
        latest
    }
}
