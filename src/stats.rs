//! Avalanche and bit-independence statistics for the mixing components.
//!
//! A mixer is any `Fn(&[u8], &mut [u8])` with fixed input and output sizes;
//! see [`Mixer`].  For every sampled input, each input bit is flipped in turn
//! and the resulting output bit flips are tallied.

use std::{fmt, fs::File, path::Path};

use nanorand::{Rng, WyRand};
use tracing::{debug, trace};

use crate::error::AnalysisError;

/// A mixing function and its block geometry, all sizes in bytes.
pub struct Mixer<'a> {
    pub name: &'a str,
    pub mix_function: &'a dyn Fn(&[u8], &mut [u8]),
    pub input_size: usize,
    pub output_size: usize,

    // Size of the digest of the hash `mix_function` is part of.  Only used in
    // the report.
    pub digest_size: usize,
}

pub struct Stats {
    pub input_bit_len: usize,
    pub output_bit_len: usize,
    pub digest_bit_len: usize,

    // The number of samples accumulated.  Or put another way, the number of
    // rounds used to generate the chart.
    pub sample_count: usize,

    // `input_bit_len * output_bit_len` long.  Each element is a count of the
    // number of bit flips for a given in/out bit pairing.
    pub avalanche_chart: Vec<u32>,

    // For every input bit, the BIC quadrants for each pair of output bits.
    pub bic_chart: Vec<[u32; 4]>,
}

impl Stats {
    pub fn new(
        input_bit_len: usize,
        output_bit_len: usize,
        digest_bit_len: usize,
        do_avalanche: bool,
        do_bic: bool,
    ) -> Self {
        Self {
            input_bit_len,
            output_bit_len,
            digest_bit_len,
            sample_count: 0,
            avalanche_chart: if do_avalanche {
                vec![0; input_bit_len * output_bit_len]
            } else {
                Vec::new()
            },
            bic_chart: if do_bic {
                vec![[0; 4]; input_bit_len * output_bit_len * (output_bit_len - 1)]
            } else {
                Vec::new()
            },
        }
    }

    fn accumulate(&mut self, in_bit: usize, out_bit: usize, flipped: bool) {
        self.avalanche_chart[in_bit * self.output_bit_len + out_bit] += flipped as u32;
    }

    pub fn get(&self, in_bit: usize, out_bit: usize) -> u32 {
        self.avalanche_chart[in_bit * self.output_bit_len + out_bit]
    }

    fn row(&self, in_bit: usize) -> &[u32] {
        let start = in_bit * self.output_bit_len;
        let end = start + self.output_bit_len;
        &self.avalanche_chart[start..end]
    }

    fn norm(&self) -> f64 {
        1.0 / self.sample_count as f64
    }

    pub fn row_diffusion(&self, in_bit: usize) -> f64 {
        let norm = self.norm();
        self.row(in_bit)
            .iter()
            .map(|&flips| 1.0 - p_to_bias(flips as f64 * norm))
            .sum()
    }

    pub fn row_entropy(&self, in_bit: usize) -> f64 {
        let norm = self.norm();
        self.row(in_bit)
            .iter()
            .map(|&flips| p_to_entropy(flips as f64 * norm))
            .sum()
    }

    pub fn average_bias(&self) -> f64 {
        let norm = self.norm();
        let bias_sum: f64 = self
            .avalanche_chart
            .iter()
            .map(|&flips| p_to_bias(flips as f64 * norm))
            .sum();
        bias_sum / self.avalanche_chart.len() as f64
    }

    pub fn min_bias(&self) -> f64 {
        let norm = self.norm();
        self.avalanche_chart
            .iter()
            .map(|&flips| p_to_bias(flips as f64 * norm))
            .fold(f64::INFINITY, f64::min)
    }

    pub fn max_bias(&self) -> f64 {
        let norm = self.norm();
        self.avalanche_chart
            .iter()
            .map(|&flips| p_to_bias(flips as f64 * norm))
            .fold(0.0, f64::max)
    }

    pub fn min_input_bit_diffusion(&self) -> f64 {
        (0..self.input_bit_len)
            .map(|i| self.row_diffusion(i))
            .fold(f64::INFINITY, f64::min)
    }

    pub fn avg_input_bit_diffusion(&self) -> f64 {
        let sum: f64 = (0..self.input_bit_len).map(|i| self.row_diffusion(i)).sum();
        sum / self.input_bit_len as f64
    }

    pub fn max_input_bit_diffusion(&self) -> f64 {
        (0..self.input_bit_len)
            .map(|i| self.row_diffusion(i))
            .fold(0.0, f64::max)
    }

    pub fn min_input_bit_entropy(&self) -> f64 {
        (0..self.input_bit_len)
            .map(|i| self.row_entropy(i))
            .fold(f64::INFINITY, f64::min)
    }

    pub fn avg_input_bit_entropy(&self) -> f64 {
        let sum: f64 = (0..self.input_bit_len).map(|i| self.row_entropy(i)).sum();
        sum / self.input_bit_len as f64
    }

    pub fn max_input_bit_entropy(&self) -> f64 {
        (0..self.input_bit_len)
            .map(|i| self.row_entropy(i))
            .fold(0.0, f64::max)
    }

    fn bic_row(&self, in_bit_idx: usize) -> &[[u32; 4]] {
        let stride = self.output_bit_len * (self.output_bit_len - 1);
        let start = in_bit_idx * stride;
        &self.bic_chart[start..(start + stride)]
    }

    /// Mean over all output bit pairs of `(max - min) / max` of the four
    /// quadrant counts, for one input bit.  0.0 means the quadrants are
    /// perfectly balanced; 1.0 means only one quadrant was ever hit.
    pub fn row_bic_deviation(&self, in_bit_idx: usize) -> f64 {
        let bic = self.bic_row(in_bit_idx);

        let sum: f64 = bic
            .iter()
            .map(|q| {
                let min = q.iter().copied().min().unwrap_or(0);
                let max = q.iter().copied().max().unwrap_or(0);
                f64::from(max - min) / f64::from(max.max(1))
            })
            .sum();
        sum / bic.len() as f64
    }

    pub fn min_bic_deviation(&self) -> f64 {
        (0..self.input_bit_len)
            .map(|i| self.row_bic_deviation(i))
            .fold(f64::INFINITY, f64::min)
    }

    pub fn avg_bic_deviation(&self) -> f64 {
        let sum: f64 = (0..self.input_bit_len).map(|i| self.row_bic_deviation(i)).sum();
        sum / self.input_bit_len as f64
    }

    pub fn max_bic_deviation(&self) -> f64 {
        (0..self.input_bit_len)
            .map(|i| self.row_bic_deviation(i))
            .fold(0.0, f64::max)
    }

    pub fn row_bic_avg_sorted_quadrants(&self, in_bit_idx: usize) -> [f64; 4] {
        let bic = self.bic_row(in_bit_idx);

        let mut sum = [0u64; 4];
        for mut quadrants in bic.iter().copied() {
            quadrants.sort_unstable();
            for (total, q) in sum.iter_mut().zip(quadrants) {
                *total += q as u64;
            }
        }

        let norm = (bic.len() * self.sample_count) as f64;
        sum.map(|total| total as f64 / norm)
    }

    pub fn avg_bic_sorted_quadrants(&self) -> [f64; 4] {
        let mut sum = [0.0; 4];
        for i in 0..self.input_bit_len {
            let n = self.row_bic_avg_sorted_quadrants(i);
            for (total, q) in sum.iter_mut().zip(n) {
                *total += q;
            }
        }
        sum.map(|total| total / self.input_bit_len as f64)
    }

    pub fn worst_bic_sorted_quadrants(&self) -> [f64; 4] {
        let mut worst = [f64::INFINITY, f64::INFINITY, f64::INFINITY, 0.0];
        for i in 0..self.input_bit_len {
            let n = self.row_bic_avg_sorted_quadrants(i);
            worst[0] = worst[0].min(n[0]);
            worst[1] = worst[1].min(n[1]);
            worst[2] = worst[2].min(n[2]);
            worst[3] = worst[3].max(n[3]);
        }
        worst
    }

    pub fn best_bic_sorted_quadrants(&self) -> [f64; 4] {
        let mut best = [0.0; 4];
        for i in 0..self.input_bit_len {
            let n = self.row_bic_avg_sorted_quadrants(i);
            if n[0] > best[0] {
                best = n;
            }
        }
        best
    }

    /// Writes the avalanche chart as a greyscale PNG, one row per input bit
    /// and one column per output bit.
    pub fn write_avalanche_png<P: AsRef<Path>>(&self, path: P) -> Result<(), AnalysisError> {
        if self.sample_count == 0 || self.avalanche_chart.is_empty() {
            return Err(AnalysisError::NoSamples);
        }

        let mut pixels = Vec::with_capacity(self.avalanche_chart.len() * 4);
        for flips in self.avalanche_chart.iter().copied() {
            let v = (flips as u64 * 255 / self.sample_count as u64).min(255) as u8;
            pixels.extend_from_slice(&[v, v, v, 255]);
        }

        png_encode_mini::write_rgba_from_u8(
            &mut File::create(path.as_ref())?,
            &pixels,
            self.output_bit_len as u32,
            self.input_bit_len as u32,
        )?;

        Ok(())
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.avalanche_chart.is_empty() {
            writeln!(f, "    Bias:")?;
            writeln!(f, "        Min: {:0.2}", self.min_bias())?;
            writeln!(f, "        Avg: {:0.2}", self.average_bias())?;
            writeln!(f, "        Max: {:0.2}", self.max_bias())?;
            writeln!(
                f,
                "    Input Bit Diffusion (digest size = {} bits):",
                self.digest_bit_len
            )?;
            writeln!(f, "        Min: {:0.1} bits", self.min_input_bit_diffusion())?;
            writeln!(f, "        Avg: {:0.1} bits", self.avg_input_bit_diffusion())?;
            writeln!(f, "        Max: {:0.1} bits", self.max_input_bit_diffusion())?;
            writeln!(
                f,
                "    Input Bit Diffusion Entropy (digest size = {} bits):",
                self.digest_bit_len
            )?;
            writeln!(f, "        Min: {:0.1} bits", self.min_input_bit_entropy())?;
            writeln!(f, "        Avg: {:0.1} bits", self.avg_input_bit_entropy())?;
            writeln!(f, "        Max: {:0.1} bits", self.max_input_bit_entropy())?;
        }

        if !self.bic_chart.is_empty() {
            let rows = [
                ("Wrst", self.worst_bic_sorted_quadrants()),
                (" Avg", self.avg_bic_sorted_quadrants()),
                ("Best", self.best_bic_sorted_quadrants()),
            ];
            writeln!(f, "    BIC deviation:")?;
            writeln!(f, "        Min: {:0.3}", self.min_bic_deviation())?;
            writeln!(f, "        Avg: {:0.3}", self.avg_bic_deviation())?;
            writeln!(f, "        Max: {:0.3}", self.max_bic_deviation())?;
            writeln!(f, "    BIC quadrants (sorted):")?;
            for (label, q) in rows {
                writeln!(
                    f,
                    "        {}: [{:0.4}, {:0.4}, {:0.4}, {:0.4}]",
                    label, q[0], q[1], q[2], q[3]
                )?;
            }
        }

        Ok(())
    }
}

/// Computes avalanche and/or BIC statistics for `mixer`, using a provided
/// input generator.
///
/// - `generate_input`: function that takes a seed and generates an input block.
///   The result should be deterministic based on the seed.  Note that the seed
///   starts from zero, and simply increments each round.
/// - `mixer`: the function under test.  Any data in the passed output
///   parameter should *not* be used by the mix function, it is purely an out
///   parameter.
/// - `rounds`: how many test rounds to perform to produce the estimated chart.
pub fn compute_stats<F>(
    generate_input: F,
    mixer: &Mixer<'_>,
    rounds: usize,
    do_avalanche: bool,
    do_bic: bool,
) -> Result<Stats, AnalysisError>
where
    F: Fn(usize, &mut [u8]),
{
    if rounds == 0 {
        return Err(AnalysisError::ZeroRounds);
    }
    if mixer.input_size == 0 {
        return Err(AnalysisError::EmptyBlock { which: "input" });
    }
    if mixer.output_size == 0 {
        return Err(AnalysisError::EmptyBlock { which: "output" });
    }

    let input_size = mixer.input_size;
    let output_size = mixer.output_size;
    let out_bits = output_size * 8;
    let mix = mixer.mix_function;

    debug!(
        mixer = mixer.name,
        input_size, output_size, rounds, do_avalanche, do_bic, "computing mixer statistics"
    );

    let mut chart = Stats::new(
        input_size * 8,
        out_bits,
        mixer.digest_size * 8,
        do_avalanche,
        do_bic,
    );

    let mut input = vec![0u8; input_size];
    let mut output = vec![0u8; output_size];
    let mut input_tweaked = vec![0u8; input_size];
    let mut output_tweaked = vec![0u8; output_size];

    let flipped = |a: &[u8], b: &[u8], bit: usize| {
        let mask = 1 << (bit % 8);
        (a[bit / 8] & mask) != (b[bit / 8] & mask)
    };

    for round in 0..rounds {
        trace!(round, rounds, "mixer statistics round");

        generate_input(round, &mut input[..]);

        mix(&input[..], &mut output[..]);
        for in_bit_idx in 0..(input_size * 8) {
            input_tweaked.copy_from_slice(&input[..]);
            input_tweaked[in_bit_idx / 8] ^= 1 << (in_bit_idx % 8);
            mix(&input_tweaked[..], &mut output_tweaked[..]);

            // Avalanche.
            if do_avalanche {
                for out_bit_idx in 0..out_bits {
                    chart.accumulate(
                        in_bit_idx,
                        out_bit_idx,
                        flipped(&output, &output_tweaked, out_bit_idx),
                    );
                }
            }

            // Bit independence criterion.
            if do_bic {
                let stride = out_bits * (out_bits - 1);
                for i in 0..out_bits {
                    for j in 0..(out_bits - 1) {
                        let i_b = (i + j + 1) % out_bits;

                        let flipped_a = flipped(&output, &output_tweaked, i);
                        let flipped_b = flipped(&output, &output_tweaked, i_b);

                        let k = (in_bit_idx * stride) + (i * (out_bits - 1)) + j;
                        let quadrants = &mut chart.bic_chart[k];
                        quadrants[0] += (flipped_a && flipped_b) as u32;
                        quadrants[1] += (!flipped_a && !flipped_b) as u32;
                        quadrants[2] += (flipped_a && !flipped_b) as u32;
                        quadrants[3] += (!flipped_a && flipped_b) as u32;
                    }
                }
            }
        }

        chart.sample_count += 1;
    }

    debug!(mixer = mixer.name, samples = chart.sample_count, "mixer statistics done");

    Ok(chart)
}

fn p_to_bias(p: f64) -> f64 {
    (p * 2.0 - 1.0).abs()
}

fn p_to_entropy(p: f64) -> f64 {
    if p <= 0.0 || p >= 1.0 {
        0.0
    } else {
        let q = 1.0 - p;
        -(p * p.log2()) - (q * q.log2())
    }
}

//-------------------------------------------------------------

/// Generates a random byte stream.
pub fn generate_random(seed: usize, bytes: &mut [u8]) {
    let mut rng = WyRand::new_seed(mix64(seed as u64));
    rng.fill_bytes(bytes);
}

/// Generates a byte stream with all zero bits except one.
pub fn generate_single_1_bit(index: usize, bytes: &mut [u8]) {
    let bit_idx = index % (bytes.len() * 8);
    bytes.fill(0);
    bytes[bit_idx / 8] = 1 << (bit_idx % 8);
}

// Roughly `n` random bits set to one.
fn generate_n_random_bits(seed: usize, bytes: &mut [u8], n: usize) {
    let mut rng = WyRand::new_seed(mix64(seed as u64 ^ mix64(n as u64)));

    bytes.fill(0);
    for _ in 0..n {
        let bit = rng.generate_range(0..(bytes.len() * 8));
        bytes[bit / 8] |= 1 << (bit % 8);
    }
}

/// Generates a byte stream with roughly 8 random bits set to one.
pub fn generate_8_random_bits(seed: usize, bytes: &mut [u8]) {
    generate_n_random_bits(seed, bytes, 8);
}

/// Generates a byte stream with the lowest bits simply counting up as an
/// incrementing integer.
pub fn generate_counting(index: usize, bytes: &mut [u8]) {
    let counter = (index as u64).to_le_bytes();
    let len = bytes.len().min(8);
    bytes[..len].copy_from_slice(&counter[..len]);
    bytes[len..].fill(0);
}

/// Generates all combinations of setting zero bits, then one bit, then two
/// bits, and so on, in that order.
pub fn generate_bit_combinations(index: usize, bytes: &mut [u8]) {
    let bit_len = bytes.len() * 8;

    // Compute the number of bits and the sub-index into that subsequence, for the
    // given index.
    let mut n = if bit_len < usize::BITS as usize {
        // Wrap to the total number of combinations if that's less than usize.
        index % (1 << bit_len)
    } else {
        index
    };
    let mut bits = 0;
    let mut combos = binomial(bit_len, bits);
    while n >= combos {
        n -= combos;
        bits += 1;
        combos = binomial(bit_len, bits);
    }

    // Generate the bits for the computed subsequence and sub-index.
    bytes.fill(0);
    let mut t = bit_len;
    while t > 0 && bits > 0 {
        let y = if t > bits { binomial(t - 1, bits) } else { 0 };

        if n >= y {
            bytes[(t - 1) / 8] |= 1 << ((t - 1) % 8);
            n -= y;
            bits -= 1;
        }

        t -= 1;
    }
}

// Saturates instead of overflowing; the counts involved only ever need to be
// compared against a `usize` index.
const fn binomial(n: usize, k: usize) -> usize {
    if k > n {
        return 0;
    }

    if k == 0 {
        1
    } else if k > (n / 2) {
        binomial(n, n - k)
    } else {
        match n.checked_mul(binomial(n - 1, k - 1)) {
            Some(v) => v / k,
            None => usize::MAX,
        }
    }
}

/// 64-bit bijective bit mixer.
fn mix64(mut n: u64) -> u64 {
    // Break zero sensitivity.
    n ^= 0x7be355f7c2e736d2;

    // http://zimbry.blogspot.ch/2011/09/better-bit-mixing-improving-on.html
    // (variant "Mix13")
    n ^= n >> 30;
    n = n.wrapping_mul(0xbf58476d1ce4e5b9);
    n ^= n >> 27;
    n = n.wrapping_mul(0x94d049bb133111eb);
    n ^= n >> 31;

    n
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mixers;

    fn identity(input: &[u8], output: &mut [u8]) {
        output.copy_from_slice(input);
    }

    const IDENTITY: Mixer<'static> = Mixer {
        name: "identity",
        mix_function: &identity,
        input_size: 4,
        output_size: 4,
        digest_size: 4,
    };

    #[test]
    fn identity_has_no_diffusion() {
        let stats = compute_stats(generate_random, &IDENTITY, 16, true, true).unwrap();

        assert_eq!(stats.sample_count, 16);
        for i in 0..32 {
            for o in 0..32 {
                assert_eq!(stats.get(i, o), if i == o { 16 } else { 0 });
            }
        }
        assert_eq!(stats.average_bias(), 1.0);
        assert_eq!(stats.max_input_bit_diffusion(), 0.0);
        assert_eq!(stats.max_input_bit_entropy(), 0.0);
    }

    fn narrow_spooky(input: &[u8], output: &mut [u8]) {
        output.copy_from_slice(&crate::hash64(input, 0).to_le_bytes()[..4]);
    }

    const NARROW_SPOOKY: Mixer<'static> = Mixer {
        name: "SpookyHash64, low 32 bits",
        mix_function: &narrow_spooky,
        input_size: 4,
        output_size: 4,
        digest_size: 8,
    };

    #[test]
    fn identity_bic_is_fully_skewed() {
        let stats = compute_stats(generate_random, &IDENTITY, 16, false, true).unwrap();

        assert_eq!(stats.min_bic_deviation(), 1.0);
        assert_eq!(stats.max_bic_deviation(), 1.0);
    }

    #[test]
    fn hash_bic_is_balanced() {
        let stats = compute_stats(generate_random, &NARROW_SPOOKY, 1024, false, true).unwrap();

        // Counts near 256 per quadrant vary by about 16, so the spread stays
        // well under a quarter of the largest count.
        assert!(stats.avg_bic_deviation() < 0.25, "{}", stats.avg_bic_deviation());
        assert!(stats.max_bic_deviation() < 0.4, "{}", stats.max_bic_deviation());
    }

    #[test]
    fn full_hash_avalanches() {
        let mixer = mixers::MIXERS
            .iter()
            .find(|m| m.name == "SpookyHash128, 32-byte messages")
            .unwrap();
        let stats = compute_stats(generate_random, mixer, 64, true, false).unwrap();

        assert!(stats.bic_chart.is_empty());
        assert!(stats.average_bias() < 0.2, "bias {}", stats.average_bias());
        assert!(stats.min_input_bit_diffusion() > 96.0);
    }

    #[test]
    fn rejects_degenerate_runs() {
        assert!(matches!(
            compute_stats(generate_random, &IDENTITY, 0, true, false),
            Err(AnalysisError::ZeroRounds)
        ));

        let empty = Mixer {
            input_size: 0,
            ..IDENTITY
        };
        assert!(matches!(
            compute_stats(generate_random, &empty, 1, true, false),
            Err(AnalysisError::EmptyBlock { which: "input" })
        ));

        let fresh = Stats::new(8, 8, 8, true, false);
        assert!(matches!(
            fresh.write_avalanche_png(std::env::temp_dir().join("never-written.png")),
            Err(AnalysisError::NoSamples)
        ));
    }

    #[test]
    fn writes_png() {
        let stats = compute_stats(generate_counting, &IDENTITY, 4, true, false).unwrap();
        let path = std::env::temp_dir().join(format!("spookyhash-stats-{}.png", std::process::id()));
        stats.write_avalanche_png(&path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
    }

    #[test]
    fn report_lists_sections() {
        let stats = compute_stats(generate_single_1_bit, &IDENTITY, 8, true, true).unwrap();
        let report = stats.to_string();
        assert!(report.contains("Bias:"));
        assert!(report.contains("Input Bit Diffusion Entropy"));
        assert!(report.contains("BIC deviation:"));
        assert!(report.contains("BIC quadrants"));
    }

    #[test]
    fn bit_combinations_enumerate_by_popcount() {
        let mut bytes = [0u8; 2];
        generate_bit_combinations(0, &mut bytes);
        assert_eq!(bytes, [0, 0]);

        for index in 1..=16 {
            generate_bit_combinations(index, &mut bytes);
            assert_eq!(u16::from_le_bytes(bytes).count_ones(), 1, "index {index}");
        }
        generate_bit_combinations(17, &mut bytes);
        assert_eq!(u16::from_le_bytes(bytes).count_ones(), 2);
    }

    #[test]
    fn generators_are_deterministic() {
        let mut a = [0u8; 32];
        let mut b = [0u8; 32];
        generate_random(5, &mut a);
        generate_random(5, &mut b);
        assert_eq!(a, b);

        generate_8_random_bits(9, &mut a);
        assert!(a.iter().map(|x| x.count_ones()).sum::<u32>() <= 8);

        generate_counting(0x0102, &mut a);
        assert_eq!(&a[..3], &[2, 1, 0]);
    }
}
