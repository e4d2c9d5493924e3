use rand::{rngs::StdRng, Rng, SeedableRng};

pub const BATCH_SIZE: usize = 300;
pub const MIC_BIAS: f32 = 32_768.0;

/// A microphone batch: `cycles` whole sine periods of `amplitude` riding on
/// the mid-scale bias the ADC sees from an electret capsule.
pub fn sine_batch(amplitude: f32, cycles: usize) -> [u16; BATCH_SIZE] {
    let mut batch = [0u16; BATCH_SIZE];
    for (i, sample) in batch.iter_mut().enumerate() {
        let phase = i as f32 / BATCH_SIZE as f32 * cycles as f32 * 2.0 * core::f32::consts::PI;
        *sample = (MIC_BIAS + amplitude * phase.sin()).round() as u16;
    }
    batch
}

pub fn random_batches(seed: u64, count: usize) -> Vec<Vec<u16>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let len = rng.random_range(1..=BATCH_SIZE);
            let centre: u16 = rng.random_range(1_000..=64_000);
            let spread: u16 = rng.random_range(0..=1_000);
            (0..len)
                .map(|_| centre - spread / 2 + rng.random_range(0..=spread))
                .collect()
        })
        .collect()
}
