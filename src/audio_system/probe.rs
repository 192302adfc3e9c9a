/// Decode probe
///
/// Decodes a whole recording once, off the loop thread, to confirm it can
/// be played through before any clip is requested.

use std::io::Cursor;
use std::sync::Arc;

use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::blob::SharedBytes;
use crate::error::AudioError;

/// What the probe learned about a playable source
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeReport {
    pub sample_rate: u32,
    pub channels: usize,
    pub duration_secs: f64,
}

/// Decode every packet of `data`. Corrupt packets are skipped the way a
/// player would skip them; a stream with no decodable audio is an error.
pub fn probe(data: Arc<Vec<u8>>, extension_hint: Option<&str>) -> Result<ProbeReport, AudioError> {
    let cursor = Cursor::new(SharedBytes::from(data));
    let mss = MediaSourceStream::new(Box::new(cursor), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = extension_hint {
        hint.with_extension(ext);
    }

    let meta_opts: MetadataOptions = Default::default();
    let fmt_opts: FormatOptions = Default::default();

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &fmt_opts, &meta_opts)
        .map_err(|e| AudioError::DecodeFailed(format!("unrecognised format: {}", e)))?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| AudioError::DecodeFailed("no supported audio tracks".to_string()))?;

    let dec_opts: DecoderOptions = Default::default();
    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &dec_opts)
        .map_err(|e| AudioError::DecodeFailed(format!("unsupported codec: {}", e)))?;

    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate.unwrap_or(0);
    let mut channels = track.codec_params.channels.map(|c| c.count()).unwrap_or(0);

    let mut frames: u64 = 0;
    let mut decoded_packets: u64 = 0;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(err)) if err.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphoniaError::ResetRequired) => {
                return Err(AudioError::DecodeFailed(
                    "track layout changed mid-stream".to_string(),
                ));
            }
            Err(err) => return Err(AudioError::DecodeFailed(err.to_string())),
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = decoded.spec();
                sample_rate = spec.rate;
                channels = spec.channels.count();
                frames += decoded.frames() as u64;
                decoded_packets += 1;
            }
            Err(SymphoniaError::IoError(_)) | Err(SymphoniaError::DecodeError(_)) => {
                tracing::trace!("Skipping undecodable packet");
                continue;
            }
            Err(err) => return Err(AudioError::DecodeFailed(err.to_string())),
        }
    }

    if decoded_packets == 0 || sample_rate == 0 {
        return Err(AudioError::DecodeFailed("no decodable audio".to_string()));
    }

    let report = ProbeReport {
        sample_rate,
        channels,
        duration_secs: frames as f64 / sample_rate as f64,
    };

    tracing::debug!(
        "Probe ok: {} Hz, {} ch, {:.3}s",
        report.sample_rate,
        report.channels,
        report.duration_secs
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_rejects_garbage() {
        let data = Arc::new(b"definitely not an mp3 file".to_vec());
        let result = probe(data, Some("mp3"));
        assert!(matches!(result, Err(AudioError::DecodeFailed(_))));
    }

    #[test]
    fn test_probe_rejects_empty() {
        let result = probe(Arc::new(Vec::new()), None);
        assert!(result.is_err());
    }
}
