//! Scalar, histogram, image and audio summaries written as JSON lines.

use crate::error::{TrainingError, TrainingResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub const DEFAULT_AUDIO_SAMPLING_RATE: u32 = 22_050;
pub const EVENTS_FILE_NAME: &str = "events.jsonl";

/// 8-bit image in height-width-channel order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawImage")]
pub struct Image {
    height: usize,
    width: usize,
    channels: usize,
    data: Vec<u8>,
}

#[derive(Deserialize)]
struct RawImage {
    height: usize,
    width: usize,
    channels: usize,
    data: Vec<u8>,
}

impl TryFrom<RawImage> for Image {
    type Error = TrainingError;

    fn try_from(raw: RawImage) -> TrainingResult<Self> {
        Self::new(raw.height, raw.width, raw.channels, raw.data)
    }
}

impl Image {
    pub fn new(height: usize, width: usize, channels: usize, data: Vec<u8>) -> TrainingResult<Self> {
        let expected = height
            .checked_mul(width)
            .and_then(|n| n.checked_mul(channels))
            .ok_or_else(|| TrainingError::Summary(format!("image {height}x{width}x{channels} is too large")))?;
        if expected != data.len() {
            return Err(TrainingError::Summary(format!(
                "image {height}x{width}x{channels} needs {expected} bytes, got {}",
                data.len()
            )));
        }
        Ok(Self { height, width, channels, data })
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub fn channels(&self) -> usize {
        self.channels
    }

    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

// JSON has no NaN or infinity; serde_json writes them as null. Read null back as NaN.
fn non_finite_as_nan<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}

fn samples_with_nan<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<f32>, D::Error> {
    let samples = Vec::<Option<f32>>::deserialize(deserializer)?;
    Ok(samples.into_iter().map(|s| s.unwrap_or(f32::NAN)).collect())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramStats {
    pub count: usize,
    #[serde(deserialize_with = "non_finite_as_nan")]
    pub min: f64,
    #[serde(deserialize_with = "non_finite_as_nan")]
    pub max: f64,
    #[serde(deserialize_with = "non_finite_as_nan")]
    pub mean: f64,
    #[serde(deserialize_with = "non_finite_as_nan")]
    pub sum: f64,
    #[serde(deserialize_with = "non_finite_as_nan")]
    pub sum_squares: f64,
}

impl HistogramStats {
    #[must_use]
    pub fn from_values(values: &[f32]) -> Self {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        let mut sum_squares = 0.0;
        for v in values.iter().map(|v| f64::from(*v)) {
            min = min.min(v);
            max = max.max(v);
            sum += v;
            sum_squares += v * v;
        }
        if values.is_empty() {
            min = 0.0;
            max = 0.0;
        }
        let mean = if values.is_empty() { 0.0 } else { sum / values.len() as f64 };
        Self { count: values.len(), min, max, mean, sum, sum_squares }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SummaryValue {
    /// Non-finite values are stored as `null` and read back as NaN.
    Scalar {
        #[serde(deserialize_with = "non_finite_as_nan")]
        value: f64,
    },
    Histogram {
        stats: HistogramStats,
    },
    Image {
        image: Image,
    },
    Audio {
        #[serde(deserialize_with = "samples_with_nan")]
        samples: Vec<f32>,
        sample_rate: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRecord {
    pub wall_time: DateTime<Utc>,
    pub step: u64,
    pub tag: String,
    #[serde(flatten)]
    pub value: SummaryValue,
}

pub trait SummaryWriter {
    fn add_scalar(&mut self, tag: &str, value: f64, step: u64) -> TrainingResult<()>;

    fn add_histogram(&mut self, tag: &str, values: &[f32], step: u64) -> TrainingResult<()>;

    fn add_image(&mut self, tag: &str, image: &Image, step: u64) -> TrainingResult<()>;

    fn add_audio(&mut self, tag: &str, samples: &[f32], step: u64, sample_rate: u32) -> TrainingResult<()>;

    fn flush(&mut self) -> TrainingResult<()>;
}

/// Appends one record per call to `<log_dir>/events.jsonl`.
pub struct JsonlSummaryWriter {
    path: PathBuf,
    out: BufWriter<File>,
}

impl JsonlSummaryWriter {
    pub fn create(log_dir: &Path) -> TrainingResult<Self> {
        std::fs::create_dir_all(log_dir)?;
        let path = log_dir.join(EVENTS_FILE_NAME);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self { path, out: BufWriter::new(file) })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&mut self, tag: &str, step: u64, value: SummaryValue) -> TrainingResult<()> {
        let record = SummaryRecord { wall_time: Utc::now(), step, tag: tag.to_string(), value };
        serde_json::to_writer(&mut self.out, &record)?;
        self.out.write_all(b"\n")?;
        Ok(())
    }
}

impl SummaryWriter for JsonlSummaryWriter {
    fn add_scalar(&mut self, tag: &str, value: f64, step: u64) -> TrainingResult<()> {
        self.write(tag, step, SummaryValue::Scalar { value })
    }

    fn add_histogram(&mut self, tag: &str, values: &[f32], step: u64) -> TrainingResult<()> {
        self.write(tag, step, SummaryValue::Histogram { stats: HistogramStats::from_values(values) })
    }

    fn add_image(&mut self, tag: &str, image: &Image, step: u64) -> TrainingResult<()> {
        self.write(tag, step, SummaryValue::Image { image: image.clone() })
    }

    fn add_audio(&mut self, tag: &str, samples: &[f32], step: u64, sample_rate: u32) -> TrainingResult<()> {
        self.write(tag, step, SummaryValue::Audio { samples: samples.to_vec(), sample_rate })
    }

    fn flush(&mut self) -> TrainingResult<()> {
        self.out.flush()?;
        Ok(())
    }
}

impl Drop for JsonlSummaryWriter {
    fn drop(&mut self) {
        let _ = self.out.flush();
    }
}

pub fn read_summary_records(path: &Path) -> TrainingResult<Vec<SummaryRecord>> {
    let contents = std::fs::read_to_string(path)?;
    let mut records = Vec::new();
    for (idx, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let record = serde_json::from_str(line)
            .map_err(|e| TrainingError::Summary(format!("failed to parse line {}: {}", idx + 1, e)))?;
        records.push(record);
    }
    Ok(records)
}

/// One step's worth of summaries.
#[derive(Debug, Clone)]
pub struct Summary {
    pub scalars: BTreeMap<String, f64>,
    pub histograms: BTreeMap<String, Vec<f32>>,
    pub images: BTreeMap<String, Image>,
    pub audios: BTreeMap<String, Vec<f32>>,
    pub audio_sampling_rate: u32,
}

impl Default for Summary {
    fn default() -> Self {
        Self {
            scalars: BTreeMap::new(),
            histograms: BTreeMap::new(),
            images: BTreeMap::new(),
            audios: BTreeMap::new(),
            audio_sampling_rate: DEFAULT_AUDIO_SAMPLING_RATE,
        }
    }
}

pub fn summarize(writer: &mut dyn SummaryWriter, global_step: u64, summary: &Summary) -> TrainingResult<()> {
    for (tag, value) in &summary.scalars {
        writer.add_scalar(tag, *value, global_step)?;
    }
    for (tag, values) in &summary.histograms {
        writer.add_histogram(tag, values, global_step)?;
    }
    for (tag, image) in &summary.images {
        writer.add_image(tag, image, global_step)?;
    }
    for (tag, samples) in &summary.audios {
        writer.add_audio(tag, samples, global_step, summary.audio_sampling_rate)?;
    }
    Ok(())
}
