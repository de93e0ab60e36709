use super::*;

#[test]
fn band_count_and_non_empty_bands() {
    for sr in [8_000, 22_050, 44_100, 48_000] {
        let bank = MelFilterBank::new(sr);
        assert_eq!(bank.n_mels(), N_MELS);
        for band in &bank.bands {
            assert!(!band.weights.is_empty(), "empty band at {sr} Hz");
            assert!(band.start + band.weights.len() <= N_BINS);
        }
    }
}

#[test]
fn tone_energy_lands_in_matching_band() {
    let sr = 22_050;
    let bank = MelFilterBank::new(sr);
    let bin_hz = sr as f32 / N_FFT as f32;

    let mut low = vec![0.0f32; N_BINS];
    low[(200.0 / bin_hz) as usize] = 1.0;
    let mut high = vec![0.0f32; N_BINS];
    high[(4_000.0 / bin_hz) as usize] = 1.0;

    let argmax = |v: Vec<f32>| {
        v.iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap()
    };
    assert!(argmax(bank.apply(&low)) < argmax(bank.apply(&high)));
}

#[test]
fn mel_scale_round_trips() {
    for hz in [0.0f32, 100.0, 1_000.0, 8_000.0] {
        assert!((mel_to_hz(hz_to_mel(hz)) - hz).abs() < 0.5);
    }
}
