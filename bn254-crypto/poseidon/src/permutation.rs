use num_bigint::BigUint;
use num_traits::Zero;

use crate::field::Fr;
use crate::params::PoseidonParams;
use crate::{PoseidonError, Result};

/// Applies the full permutation to `state` in place. `state.len()` must equal `t`.
pub fn permute(state: &mut [Fr], params: &PoseidonParams) {
    debug_assert_eq!(state.len(), params.t());
    let half_full = params.full_rounds() / 2;
    let partial_end = half_full + params.partial_rounds();

    for (round, constant) in params.round_constants().iter().enumerate() {
        for lane in state.iter_mut() {
            *lane = lane.add(constant);
        }
        if round < half_full || round >= partial_end {
            for lane in state.iter_mut() {
                *lane = lane.pow5();
            }
        } else {
            state[0] = state[0].pow5();
        }
        mix(state, params.mds());
    }
}

fn mix(state: &mut [Fr], mds: &[Vec<Fr>]) {
    let mixed: Vec<Fr> = mds
        .iter()
        .map(|row| {
            // accumulate unreduced, reduce once per lane
            let acc = row
                .iter()
                .zip(state.iter())
                .fold(BigUint::zero(), |acc, (m, s)| acc + m.as_biguint() * s.as_biguint());
            Fr::reduce(&acc)
        })
        .collect();
    state.clone_from_slice(&mixed);
}

/// Hashes `inputs` with a single permutation: inputs fill lanes `0..n`, the
/// remaining lanes are zero, and lane 0 of the output is returned.
///
/// Requires `1 <= inputs.len() < t`.
pub fn poseidon(inputs: &[Fr], params: &PoseidonParams) -> Result<Fr> {
    if inputs.is_empty() {
        return Err(PoseidonError::EmptyInput);
    }
    if inputs.len() >= params.t() {
        return Err(PoseidonError::TooManyInputs {
            got: inputs.len(),
            t: params.t(),
        });
    }
    let mut state = Vec::with_capacity(params.t());
    state.extend_from_slice(inputs);
    state.resize(params.t(), Fr::zero());
    permute(&mut state, params);
    Ok(state.swap_remove(0))
}
