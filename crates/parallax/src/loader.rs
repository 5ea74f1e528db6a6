use std::sync::Arc;
use std::thread::{self, JoinHandle};

use anyhow::{anyhow, Result};
use crossbeam_channel::{unbounded, Receiver, Sender};
use tracing::{debug, warn};

use crate::error::LoadError;
use crate::source::{
    load_with_fallback, ColorSource, DefaultSources, DepthSource, Slot, SourceRequest,
    TextureLoader,
};

/// A decoded source ready to be swapped into a slot.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadedSource {
    Color(ColorSource),
    Depth(DepthSource),
}

#[derive(Debug)]
pub struct LoadOutcome {
    pub request: SourceRequest,
    pub result: Result<LoadedSource, LoadError>,
}

/// Resolves one request through `loader`, trying the bundled default for the
/// same slot and kind when the primary path fails.
pub(crate) fn load_request(
    loader: &dyn TextureLoader,
    defaults: &DefaultSources,
    request: &SourceRequest,
) -> Result<LoadedSource, LoadError> {
    let default = defaults.for_request(request.slot, request.kind);
    match request.slot {
        Slot::Color => load_with_fallback(&request.path, default, request.slot, |path| {
            loader.load_color(request.kind, path)
        })
        .map(LoadedSource::Color),
        Slot::Depth => load_with_fallback(&request.path, default, request.slot, |path| {
            loader.load_depth(request.kind, path)
        })
        .map(LoadedSource::Depth),
    }
}

enum LoaderCommand {
    Load(SourceRequest),
    Shutdown,
}

/// Decodes sources on a background thread so the frame loop never blocks on
/// image IO. Results are handed back in submission order and applied by the
/// driver between frames.
pub struct AsyncLoader {
    commands: Sender<LoaderCommand>,
    outcomes: Receiver<LoadOutcome>,
    in_flight: usize,
    join_handle: Option<JoinHandle<()>>,
}

impl AsyncLoader {
    pub fn spawn(loader: Arc<dyn TextureLoader>, defaults: DefaultSources) -> Result<Self> {
        let (command_tx, command_rx) = unbounded();
        let (outcome_tx, outcome_rx) = unbounded();
        let handle = thread::Builder::new()
            .name("depthwall-loader".into())
            .spawn(move || run_loader_thread(loader, defaults, command_rx, outcome_tx))
            .map_err(|err| anyhow!("failed to spawn loader thread: {err}"))?;

        Ok(Self {
            commands: command_tx,
            outcomes: outcome_rx,
            in_flight: 0,
            join_handle: Some(handle),
        })
    }

    pub fn submit(&mut self, request: SourceRequest) -> Result<()> {
        debug!(
            slot = request.slot.as_str(),
            kind = request.kind.as_str(),
            path = %request.path.display(),
            "queueing source load"
        );
        self.commands
            .send(LoaderCommand::Load(request))
            .map_err(|_| anyhow!("loader thread is no longer running"))?;
        self.in_flight += 1;
        Ok(())
    }

    /// Requests submitted but not yet collected.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Collects every finished load without blocking.
    pub fn try_drain(&mut self) -> Vec<LoadOutcome> {
        let outcomes: Vec<_> = self.outcomes.try_iter().collect();
        self.in_flight = self.in_flight.saturating_sub(outcomes.len());
        outcomes
    }

    /// Blocks until every submitted request has finished.
    pub fn wait_all(&mut self) -> Result<Vec<LoadOutcome>> {
        let mut outcomes = Vec::with_capacity(self.in_flight);
        while self.in_flight > 0 {
            let outcome = self
                .outcomes
                .recv()
                .map_err(|_| anyhow!("loader thread exited with loads pending"))?;
            self.in_flight -= 1;
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }

    pub fn shutdown(mut self) -> Result<()> {
        self.stop()
    }

    fn stop(&mut self) -> Result<()> {
        if let Some(handle) = self.join_handle.take() {
            let _ = self.commands.send(LoaderCommand::Shutdown);
            handle
                .join()
                .map_err(|err| anyhow!("loader thread panicked: {err:?}"))?;
        }
        Ok(())
    }
}

impl Drop for AsyncLoader {
    fn drop(&mut self) {
        if let Err(err) = self.stop() {
            warn!("{err:#}");
        }
    }
}

fn run_loader_thread(
    loader: Arc<dyn TextureLoader>,
    defaults: DefaultSources,
    commands: Receiver<LoaderCommand>,
    outcomes: Sender<LoadOutcome>,
) {
    while let Ok(LoaderCommand::Load(request)) = commands.recv() {
        let result = load_request(loader.as_ref(), &defaults, &request);
        if outcomes.send(LoadOutcome { request, result }).is_err() {
            break;
        }
    }
}
