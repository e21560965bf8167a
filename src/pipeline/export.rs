// Turns a captured recording into a file: merge blocks, quantize to i16,
// encode in fixed 1152-sample frames, write the bytes under a fixed name.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context};
use mp3lame_encoder::{Bitrate, FlushNoGap, MonoPcm};
use serde::{Deserialize, Serialize};

use super::recorder::CapturedRecording;

pub const ENCODE_BLOCK: usize = 1152; // samples per MP3 frame
pub const EXPORT_FILE_STEM: &str = "stepbeat-recording";
pub const DEFAULT_KBPS: u32 = 48;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Mp3,
    Wav,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Mp3 => "mp3",
            ExportFormat::Wav => "wav",
        }
    }
}

pub trait FrameEncoder {
    // One frame's worth of PCM in, whatever bytes the codec produced out
    // (may be empty while the codec is still buffering).
    fn encode(&mut self, pcm: &[i16]) -> anyhow::Result<Vec<u8>>;

    fn flush(&mut self) -> anyhow::Result<Vec<u8>>;
}

pub struct Mp3Encoder {
    inner: mp3lame_encoder::Encoder,
}

impl Mp3Encoder {
    pub fn new(sample_rate: u32, kbps: u32) -> anyhow::Result<Self> {
        let mut builder = mp3lame_encoder::Builder::new().context("failed to create LAME builder")?;
        builder
            .set_num_channels(1)
            .map_err(|e| anyhow!("LAME channels: {e:?}"))?;
        builder
            .set_sample_rate(sample_rate)
            .map_err(|e| anyhow!("LAME sample rate {sample_rate}: {e:?}"))?;
        builder
            .set_brate(bitrate(kbps)?)
            .map_err(|e| anyhow!("LAME bitrate: {e:?}"))?;
        let inner = builder.build().map_err(|e| anyhow!("LAME init: {e:?}"))?;
        Ok(Self { inner })
    }
}

impl FrameEncoder for Mp3Encoder {
    fn encode(&mut self, pcm: &[i16]) -> anyhow::Result<Vec<u8>> {
        let mut out = Vec::with_capacity(mp3lame_encoder::max_required_buffer_size(pcm.len()));
        self.inner
            .encode_to_vec(MonoPcm(pcm), &mut out)
            .map_err(|e| anyhow!("mp3 encode failed: {e:?}"))?;
        Ok(out)
    }

    fn flush(&mut self) -> anyhow::Result<Vec<u8>> {
        let mut out = Vec::with_capacity(mp3lame_encoder::max_required_buffer_size(ENCODE_BLOCK));
        self.inner
            .flush_to_vec::<FlushNoGap>(&mut out)
            .map_err(|e| anyhow!("mp3 flush failed: {e:?}"))?;
        Ok(out)
    }
}

fn bitrate(kbps: u32) -> anyhow::Result<Bitrate> {
    Ok(match kbps {
        8 => Bitrate::Kbps8,
        16 => Bitrate::Kbps16,
        24 => Bitrate::Kbps24,
        32 => Bitrate::Kbps32,
        40 => Bitrate::Kbps40,
        48 => Bitrate::Kbps48,
        64 => Bitrate::Kbps64,
        80 => Bitrate::Kbps80,
        96 => Bitrate::Kbps96,
        112 => Bitrate::Kbps112,
        128 => Bitrate::Kbps128,
        160 => Bitrate::Kbps160,
        192 => Bitrate::Kbps192,
        224 => Bitrate::Kbps224,
        256 => Bitrate::Kbps256,
        320 => Bitrate::Kbps320,
        other => bail!("unsupported mp3 bitrate {other} kbps"),
    })
}

// WAV has no framing; samples are held until flush writes the whole file
pub struct WavEncoder {
    sample_rate: u32,
    samples: Vec<i16>,
}

impl WavEncoder {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            samples: Vec::new(),
        }
    }
}

impl FrameEncoder for WavEncoder {
    fn encode(&mut self, pcm: &[i16]) -> anyhow::Result<Vec<u8>> {
        self.samples.extend_from_slice(pcm);
        Ok(Vec::new())
    }

    fn flush(&mut self) -> anyhow::Result<Vec<u8>> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
            for &s in &self.samples {
                writer.write_sample(s)?;
            }
            writer.finalize()?;
        }
        self.samples.clear();
        Ok(cursor.into_inner())
    }
}

// No clamping: `as` saturates anything outside [-1, 1] at the i16 limits.
pub fn quantize(samples: &[f32]) -> Vec<i16> {
    samples.iter().map(|&s| (s * 32767.0) as i16).collect()
}

/// One entry per 1152-sample input block; the flushed tail is appended to
/// the last entry.
pub fn encode_frames(pcm: &[i16], encoder: &mut dyn FrameEncoder) -> anyhow::Result<Vec<Vec<u8>>> {
    let mut frames = Vec::with_capacity(pcm.len().div_ceil(ENCODE_BLOCK));
    for block in pcm.chunks(ENCODE_BLOCK) {
        frames.push(encoder.encode(block)?);
    }
    let tail = encoder.flush()?;
    match frames.last_mut() {
        Some(last) => last.extend_from_slice(&tail),
        None if !tail.is_empty() => frames.push(tail),
        None => {}
    }
    Ok(frames)
}

pub struct Exporter {
    format: ExportFormat,
    dir: PathBuf,
    sample_rate: u32,
    kbps: u32,
}

impl Exporter {
    pub fn new(format: ExportFormat, dir: PathBuf, sample_rate: u32, kbps: u32) -> Self {
        Self {
            format,
            dir,
            sample_rate,
            kbps,
        }
    }

    pub fn file_path(&self) -> PathBuf {
        self.dir
            .join(format!("{EXPORT_FILE_STEM}.{}", self.format.extension()))
    }

    fn encoder(&self) -> anyhow::Result<Box<dyn FrameEncoder>> {
        Ok(match self.format {
            ExportFormat::Mp3 => Box::new(Mp3Encoder::new(self.sample_rate, self.kbps)?),
            ExportFormat::Wav => Box::new(WavEncoder::new(self.sample_rate)),
        })
    }

    /// Ok(None) when there is nothing captured. The capture is only borrowed,
    /// so a failed export can be retried.
    pub fn export(&self, capture: &CapturedRecording) -> anyhow::Result<Option<PathBuf>> {
        if capture.is_empty() {
            return Ok(None);
        }
        let mut encoder = self.encoder()?;
        self.export_with(capture, encoder.as_mut()).map(Some)
    }

    pub fn export_with(
        &self,
        capture: &CapturedRecording,
        encoder: &mut dyn FrameEncoder,
    ) -> anyhow::Result<PathBuf> {
        let pcm = quantize(&capture.merged());
        let frames = encode_frames(&pcm, encoder)?;
        let path = self.file_path();
        deliver(&path, &frames.concat())?;
        log::info!(
            "exported {} samples in {} frames to {}",
            pcm.len(),
            frames.len(),
            path.display()
        );
        Ok(path)
    }
}

fn deliver(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    std::fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // records block sizes; emits one byte per sample so lengths are checkable
    #[derive(Default)]
    struct CountingEncoder {
        blocks: Vec<usize>,
        flushed: bool,
        fail: bool,
    }

    impl FrameEncoder for CountingEncoder {
        fn encode(&mut self, pcm: &[i16]) -> anyhow::Result<Vec<u8>> {
            if self.fail {
                bail!("codec exploded");
            }
            self.blocks.push(pcm.len());
            Ok(vec![0xAB; pcm.len()])
        }

        fn flush(&mut self) -> anyhow::Result<Vec<u8>> {
            self.flushed = true;
            Ok(vec![0xFF; 3])
        }
    }

    fn capture(len: usize, block: usize) -> CapturedRecording {
        let mut c = CapturedRecording::default();
        let mut left = len;
        while left > 0 {
            let n = left.min(block);
            c.push(vec![0.25; n]);
            left -= n;
        }
        c
    }

    #[test]
    fn frame_count_is_ceil_of_len_over_1152() {
        for len in [1, 1151, 1152, 1153, 4096 * 3, 10_000] {
            let pcm = vec![0i16; len];
            let mut enc = CountingEncoder::default();
            let frames = encode_frames(&pcm, &mut enc).unwrap();
            assert_eq!(frames.len(), len.div_ceil(ENCODE_BLOCK), "len {len}");
            assert!(enc.blocks[..enc.blocks.len() - 1].iter().all(|&b| b == ENCODE_BLOCK));
            assert_eq!(*enc.blocks.last().unwrap(), len - (frames.len() - 1) * ENCODE_BLOCK);
            assert!(enc.flushed);
        }
    }

    #[test]
    fn flush_tail_lands_on_last_frame() {
        let pcm = vec![0i16; 1200];
        let mut enc = CountingEncoder::default();
        let frames = encode_frames(&pcm, &mut enc).unwrap();
        assert_eq!(frames[0].len(), 1152);
        assert_eq!(frames[1].len(), 48 + 3);
    }

    #[test]
    fn quantize_scales_by_32767() {
        assert_eq!(quantize(&[0.0, 1.0, -1.0, 0.5]), vec![0, 32767, -32767, 16383]);
        // out-of-range input saturates rather than wrapping
        assert_eq!(quantize(&[2.0, -2.0]), vec![i16::MAX, i16::MIN]);
    }

    #[test]
    fn empty_capture_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = Exporter::new(ExportFormat::Wav, dir.path().to_path_buf(), 44_100, 48);
        let out = exporter.export(&CapturedRecording::default()).unwrap();
        assert!(out.is_none());
        assert!(!exporter.file_path().exists());
    }

    #[test]
    fn export_writes_concatenated_frames_under_fixed_name() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = Exporter::new(ExportFormat::Mp3, dir.path().to_path_buf(), 44_100, 48);
        let mut enc = CountingEncoder::default();
        let path = exporter.export_with(&capture(5000, 4096), &mut enc).unwrap();
        assert_eq!(path.file_name().unwrap(), "stepbeat-recording.mp3");
        assert_eq!(std::fs::read(&path).unwrap().len(), 5000 + 3);
    }

    #[test]
    fn failed_encode_leaves_capture_for_retry() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = Exporter::new(ExportFormat::Mp3, dir.path().to_path_buf(), 44_100, 48);
        let rec = capture(2000, 4096);
        let mut broken = CountingEncoder { fail: true, ..Default::default() };
        assert!(exporter.export_with(&rec, &mut broken).is_err());
        assert!(!exporter.file_path().exists());
        assert_eq!(rec.len(), 2000);
        let mut ok = CountingEncoder::default();
        assert!(exporter.export_with(&rec, &mut ok).is_ok());
    }

    #[test]
    fn wav_export_round_trips_through_hound() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = Exporter::new(ExportFormat::Wav, dir.path().to_path_buf(), 22_050, 48);
        let path = exporter.export(&capture(3000, 1024)).unwrap().unwrap();
        let mut reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 22_050);
        let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(samples.len(), 3000);
        assert!(samples.iter().all(|&s| s == 8191));
    }

    #[test]
    fn unsupported_bitrate_is_an_error() {
        assert!(bitrate(48).is_ok());
        assert!(bitrate(50).is_err());
    }
}
