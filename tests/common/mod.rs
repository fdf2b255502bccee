#![allow(dead_code)]

use std::fs;
use std::path::Path;

use serde_json::{json, Value};

/// Low rate keeps multi-minute fixtures small
pub const SAMPLE_RATE: u32 = 100;

pub fn write_tone(path: &Path, seconds: u32) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for i in 0..seconds * SAMPLE_RATE {
        let sample = if i % 2 == 0 { 8000i16 } else { -8000i16 };
        writer.write_sample(sample).unwrap();
    }
    writer.finalize().unwrap();
}

pub fn andalusian_section(start: &str, end: &str, form: u32) -> Value {
    json!({
        "start_time": start,
        "end_time": end,
        "mizan": {"display_order": 1},
        "nawba": {"display_order": 5},
        "form": {"display_order": form}
    })
}

pub fn write_json(path: &Path, value: &Value) {
    fs::write(path, serde_json::to_string_pretty(value).unwrap()).unwrap();
}

pub fn wav_len(path: &Path) -> u32 {
    hound::WavReader::open(path).unwrap().len()
}
