use std::sync::Arc;

use realfft::{num_complex::Complex, RealFftPlanner, RealToComplex};

use crate::{Result, SpectrogramError};

/// Forward FFT over one fixed-length block.
///
/// The plan and its scratch buffers are created once for the block length
/// and reused for every block of a run; they are released when the
/// transform is dropped. No window is applied (rectangular) and the output
/// is not normalized.
pub struct BlockTransform {
    plan: Arc<dyn RealToComplex<f64>>,
    input: Vec<f64>,
    scratch: Vec<Complex<f64>>,
    spectrum: Vec<Complex<f64>>,
}

impl BlockTransform {
    pub fn new(block_length: usize) -> Self {
        let mut planner = RealFftPlanner::<f64>::new();
        let plan = planner.plan_fft_forward(block_length);
        log::debug!("planned {block_length}-point forward FFT");
        BlockTransform {
            input: plan.make_input_vec(),
            scratch: plan.make_scratch_vec(),
            spectrum: plan.make_output_vec(),
            plan,
        }
    }

    /// Input buffer for the next block; fill it, then call [`process`](Self::process).
    pub fn input_mut(&mut self) -> &mut [f64] {
        &mut self.input
    }

    /// Transforms the current input buffer in place.
    ///
    /// Returns bins `0..=n/2` of the `n`-point block in natural DFT order;
    /// the bins above are the conjugate mirror and are never computed.
    pub fn process(&mut self) -> Result<&[Complex<f64>]> {
        self.plan
            .process_with_scratch(&mut self.input, &mut self.spectrum, &mut self.scratch)
            .map_err(|e| SpectrogramError::Dsp(format!("forward FFT failed: {}", e)))?;
        Ok(&self.spectrum)
    }
}
