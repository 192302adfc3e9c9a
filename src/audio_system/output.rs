/// Rodio-backed playback device
///
/// One `Sink` on the default output stream. The whole recording is appended
/// paused; clips are played by seeking the sink and un-pausing it. Position
/// ticks come from the audio thread via `periodic_access`, so they follow
/// the real playback rate.

use std::io::Cursor;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::Sender;
use rodio::source::EmptyCallback;
use rodio::{Decoder, OutputStream, Sink, Source};

use super::blob::{BlobStore, SharedBytes};
use super::device::{DeviceSignal, PlaybackDevice};
use super::probe;
use super::source::{AudioSource, SourceId};
use crate::error::AudioError;
use crate::messaging::{AppEvent, SourceEvent};

/// Default interval between position ticks while playing
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(50);

struct Attached {
    id: SourceId,
    data: Arc<Vec<u8>>,
}

/// Default-output device
pub struct RodioDevice {
    _stream: OutputStream,
    sink: Sink,
    store: Arc<BlobStore>,
    events: Sender<AppEvent>,
    attached: Option<Attached>,
    tick_interval: Duration,
    volume: f32,
}

impl RodioDevice {
    /// Open the default output. Fails when the host has no usable device.
    pub fn open(
        store: Arc<BlobStore>,
        events: Sender<AppEvent>,
        tick_interval: Duration,
        volume: f32,
    ) -> Result<Self, AudioError> {
        let (stream, stream_handle) =
            OutputStream::try_default().map_err(|e| AudioError::StreamInitFailed(Box::new(e)))?;
        let sink =
            Sink::try_new(&stream_handle).map_err(|e| AudioError::StreamInitFailed(Box::new(e)))?;
        let volume = volume.clamp(0.0, 1.0);
        sink.pause();
        sink.set_volume(volume);

        tracing::info!("Audio output opened (tick every {:?})", tick_interval);

        Ok(Self {
            _stream: stream,
            sink,
            store,
            events,
            attached: None,
            tick_interval,
            volume,
        })
    }

    /// Make sure the sink holds the recording, appended paused
    fn ensure_loaded(&mut self) -> Result<(), AudioError> {
        if !self.sink.empty() {
            return Ok(());
        }

        let attached = self.attached.as_ref().ok_or(AudioError::NoSource)?;

        let cursor = Cursor::new(SharedBytes::from(Arc::clone(&attached.data)));
        let decoder = Decoder::new(cursor)
            .map_err(|e| AudioError::PlaybackRejected(format!("decoder: {}", e)))?;

        let ticks = self.events.clone();
        let source = decoder.periodic_access(self.tick_interval, move |_| {
            let _ = ticks.send(AppEvent::Device(DeviceSignal::TimeUpdate));
        });

        let ended = self.events.clone();
        let on_end = EmptyCallback::<i16>::new(Box::new(move || {
            let _ = ended.send(AppEvent::Device(DeviceSignal::Paused));
        }));

        self.sink.pause();
        self.sink.append(source);
        self.sink.append(on_end);
        self.sink.set_volume(self.volume);

        tracing::debug!("Appended {} to output", attached.id);
        Ok(())
    }
}

impl PlaybackDevice for RodioDevice {
    fn attach(&mut self, source: &AudioSource) {
        self.detach();

        let (id, url) = (source.id(), source.url());
        let hint = source.extension().map(str::to_ascii_lowercase);

        let Some(data) = self.store.resolve(url) else {
            tracing::error!("Cannot attach {}: {} was already revoked", id, url);
            let _ = self.events.send(AppEvent::Source(SourceEvent::Failed {
                id,
                cause: format!("{} was revoked before it could be read", url),
            }));
            return;
        };

        self.attached = Some(Attached {
            id,
            data: Arc::clone(&data),
        });

        let events = self.events.clone();
        thread::spawn(move || {
            let event = match probe::probe(data, hint.as_deref()) {
                Ok(report) => {
                    tracing::info!(
                        "{} plays through ({:.1}s at {} Hz)",
                        id,
                        report.duration_secs,
                        report.sample_rate
                    );
                    SourceEvent::Ready { id }
                }
                Err(e) => SourceEvent::Failed {
                    id,
                    cause: e.to_string(),
                },
            };
            let _ = events.send(AppEvent::Source(event));
        });
    }

    fn detach(&mut self) {
        if let Some(previous) = self.attached.take() {
            tracing::debug!("Detaching {}", previous.id);
        }
        // clear() also leaves the sink paused
        self.sink.clear();
    }

    fn is_paused(&self) -> bool {
        self.sink.is_paused() || self.sink.empty()
    }

    fn position(&self) -> f64 {
        self.sink.get_pos().as_secs_f64()
    }

    fn seek(&mut self, seconds: f64) -> Result<(), AudioError> {
        self.ensure_loaded()?;
        self.sink
            .try_seek(Duration::from_secs_f64(seconds.max(0.0)))
            .map_err(|e| AudioError::SeekFailed {
                position: seconds,
                reason: e.to_string(),
            })
    }

    fn play(&mut self) -> Result<(), AudioError> {
        self.ensure_loaded()?;
        self.sink.play();
        Ok(())
    }

    fn pause(&mut self) {
        if self.is_paused() {
            return;
        }
        self.sink.pause();
        let _ = self.events.send(AppEvent::Device(DeviceSignal::Paused));
    }
}
