use heapless::Vec;
use micro_dsp::rms;

use crate::error::VuError;
use crate::peripherals::SampleSource;

/// Largest batch one measurement can hold.
pub const MAX_SAMPLES: usize = 512;

/// Reads batches from the microphone and reduces each to an RMS value.
pub struct Sampler<S> {
    source: S,
    batch: Vec<u16, MAX_SAMPLES>,
}

impl<S: SampleSource> Sampler<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            batch: Vec::new(),
        }
    }

    /// Reads `sample_count` samples back to back (capped at [`MAX_SAMPLES`])
    /// and returns their RMS deviation from the batch mean.
    pub fn measure_loudness(&mut self, sample_count: usize) -> Result<f32, VuError> {
        self.batch.clear();
        for _ in 0..sample_count.min(MAX_SAMPLES) {
            let sample = self.source.read_sample().map_err(|_| VuError::Adc)?;
            // Capacity is guaranteed by the cap above.
            let _ = self.batch.push(sample);
        }
        Ok(rms(&self.batch))
    }

    pub fn last_batch(&self) -> &[u16] {
        &self.batch
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}
