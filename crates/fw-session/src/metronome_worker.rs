//! Metronome thread: the coarse wake-up loop around the look-ahead scheduler.

use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use fw_audio::{DeviceClock, OutputLane};
use fw_engine::{Metronome, MetronomeConfig, SharedBlock, WakeTimer};

use crate::error::{Result, SessionError};

/// Wake-up timer backed by `recv_timeout` on the command channel.
#[derive(Debug, Default)]
pub(crate) struct ChannelTimer {
    interval: Option<Duration>,
}

impl ChannelTimer {
    fn interval(&self) -> Option<Duration> {
        self.interval
    }
}

impl WakeTimer for ChannelTimer {
    fn arm(&mut self, interval: Duration) {
        self.interval = Some(interval);
    }

    fn disarm(&mut self) {
        self.interval = None;
    }
}

#[derive(Debug)]
enum Command {
    SetBpm(u32),
    Stop,
}

/// Handle to a running metronome thread.
pub(crate) struct MetronomeWorker {
    commands: Sender<Command>,
    thread: JoinHandle<OutputLane>,
}

impl MetronomeWorker {
    pub(crate) fn spawn(
        config: MetronomeConfig,
        bpm: u32,
        clock: DeviceClock,
        lane: OutputLane,
        click: SharedBlock,
    ) -> Result<Self> {
        let (commands, rx) = crossbeam_channel::unbounded();
        let mut metronome = Metronome::new(config, ChannelTimer::default());
        metronome.set_rate(bpm);

        let thread = std::thread::Builder::new()
            .name("fw-metronome".into())
            .spawn(move || run(metronome, clock, lane, click, rx))
            .map_err(|source| SessionError::Spawn {
                name: "metronome",
                source,
            })?;
        Ok(Self { commands, thread })
    }

    pub(crate) fn set_rate(&self, bpm: u32) {
        let _ = self.commands.send(Command::SetBpm(bpm));
    }

    /// Stop clicking and hand back the output lane. `None` if the thread panicked.
    pub(crate) fn shutdown(self) -> Option<OutputLane> {
        let _ = self.commands.send(Command::Stop);
        match self.thread.join() {
            Ok(lane) => Some(lane),
            Err(_) => {
                tracing::warn!("metronome thread panicked");
                None
            }
        }
    }
}

fn run(
    mut metronome: Metronome<ChannelTimer>,
    clock: DeviceClock,
    mut lane: OutputLane,
    click: SharedBlock,
    commands: Receiver<Command>,
) -> OutputLane {
    metronome.start(&clock);
    tracing::info!(
        bpm = metronome.bpm(),
        first_click = metronome.state().next_event_time,
        "metronome started"
    );

    while let Some(interval) = metronome.timer_mut().interval() {
        match commands.recv_timeout(interval) {
            Ok(Command::SetBpm(bpm)) => {
                let applied = metronome.set_rate(bpm);
                tracing::debug!(bpm = applied, "metronome rate changed");
            }
            Ok(Command::Stop) | Err(RecvTimeoutError::Disconnected) => {
                metronome.stop();
                break;
            }
            Err(RecvTimeoutError::Timeout) => {}
        }

        let outcome = metronome.on_wake(&clock, |event| {
            let beat = event.payload.beat;
            if lane.play(event.map(|_| click.clone())).is_err() {
                tracing::warn!(beat, "metronome lane full, click dropped");
            }
        });
        if outcome.skipped > 0 {
            tracing::warn!(skipped = outcome.skipped, "metronome fell behind, skipped beats");
        }
    }

    tracing::info!("metronome stopped");
    lane
}
