#[cfg(test)]
mod tests {
    use crate::em::{self, EmConfig, EmStatus, Execution};
    use crate::error::BWError;
    use crate::hmm::mocks::*;
    use crate::hmm::{ModelParameters, ObservationSet, SeqTable};

    #[test]
    fn hmm_uniform_single_iteration() {
        // K=1 N=2 M=2 T=3 with observation 0 1 0
        let mut params = mock_uniform(2, 2);
        let obs = ObservationSet::from_sequences(2, &[vec![0, 1, 0]]).unwrap();
        let o = em::train(&mut params, &obs, &EmConfig::default().max_iterations(1)).unwrap();
        println!("{}", params);
        assert_eq!(o.status, EmStatus::MaxIterationsReached);
        assert_eq!(o.n_iterations(), 1);
        // every scale is 1/2
        assert_abs_diff_eq!(o.nll_trace[0], 3.0 * 2f64.ln(), epsilon = 1e-12);
        for n0 in 0..2 {
            assert_abs_diff_eq!(params.init(n0), 0.5, epsilon = 1e-12);
            for n1 in 0..2 {
                assert_abs_diff_eq!(params.trans(n0, n1), 0.5, epsilon = 1e-12);
            }
            // states are indistinguishable, so each row is the symbol frequency
            assert_abs_diff_eq!(params.emit(n0, 0), 2.0 / 3.0, epsilon = 1e-12);
            assert_abs_diff_eq!(params.emit(n0, 1), 1.0 / 3.0, epsilon = 1e-12);
        }
    }
    #[test]
    fn hmm_single_state_emission_is_frequency() {
        let mut params = mock_uniform(1, 3);
        let obs = ObservationSet::random(4, 16, 3, 0).unwrap();
        em::train(&mut params, &obs, &EmConfig::default().max_iterations(1)).unwrap();
        let freqs = obs.symbol_frequencies();
        assert_abs_diff_eq!(params.init(0), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(params.trans(0, 0), 1.0, epsilon = 1e-12);
        for (m, &f) in freqs.iter().enumerate() {
            assert_abs_diff_eq!(params.emit(0, m), f, epsilon = 1e-12);
        }

        // fixed point: another iteration changes nothing
        let before = params.clone();
        let o = em::train(&mut params, &obs, &EmConfig::default().max_iterations(1)).unwrap();
        assert!(params.diff(&before) < 1e-12);
        assert_eq!(o.n_iterations(), 1);
    }
    #[test]
    fn hmm_rejects_non_stochastic_input() {
        let mut params = mock_uniform(2, 2);
        // transition row 0 sums to 0.9
        params.set_tables(vec![0.5, 0.5], vec![0.5, 0.4, 0.5, 0.5], vec![0.5, 0.5, 0.5, 0.5]);
        let before = params.clone();
        let obs = ObservationSet::random(2, 8, 2, 0).unwrap();
        let r = em::train(&mut params, &obs, &EmConfig::default().max_iterations(3));
        match r {
            Err(BWError::NotStochastic { table, row, sum }) => {
                assert_eq!(table, "transition");
                assert_eq!(row, 0);
                assert_abs_diff_eq!(sum, 0.9, epsilon = 1e-12);
            }
            _ => panic!("non-stochastic model should be rejected"),
        }
        assert_eq!(params, before);
    }
    #[test]
    fn hmm_posterior_sums_to_one() {
        let (params, obs) = mock_random_problem(4, 5, 6, 32, 7);
        for seq in obs.sequences() {
            let mut table = SeqTable::new(params.n_states(), obs.len());
            params.run(seq, &mut table).unwrap();
            for t in 0..obs.len() {
                assert_abs_diff_eq!(table.gamma_sum(t), 1.0, epsilon = 1e-9);
            }
            for t in 0..obs.len() - 1 {
                assert_abs_diff_eq!(table.sigma_sum(t), 1.0, epsilon = 1e-9);
            }
        }
    }
    #[test]
    fn hmm_two_state_training_stays_stochastic() {
        let obs = ObservationSet::random(8, 64, 2, 3).unwrap();
        let mut params = ModelParameters::random(2, 2, 5).unwrap();
        let config = EmConfig::default()
            .max_iterations(30)
            .execution(Execution::Parallel)
            .verify(true);
        let o = em::train(&mut params, &obs, &config).unwrap();
        println!("{}", params);
        assert!(o.monotonicity_violations.is_empty());
        assert!(o.nll_trace[0] >= o.nll_trace[29]);
        params.validate(1e-9).unwrap();
    }
}
