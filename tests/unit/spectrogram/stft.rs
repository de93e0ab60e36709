use super::*;

#[test]
fn hann_window_shape() {
    assert!(hann_window(0, N_FFT).abs() < 1e-6);
    assert!((hann_window(N_FFT / 2, N_FFT) - 1.0).abs() < 1e-6);
}

#[test]
fn short_input_still_yields_a_frame() {
    let bank = MelFilterBank::new(44_100);
    let frames = mel_power_frames(&[0.5; 10], &bank);
    assert_eq!(frames.n_frames, 1);
    assert_eq!(frames.power.len(), bank.n_mels());
}

#[test]
fn frame_count_follows_hop() {
    assert_eq!(frame_count(0), 1);
    assert_eq!(frame_count(HOP - 1), 1);
    assert_eq!(frame_count(HOP * 10), 11);

    let bank = MelFilterBank::new(8_000);
    let frames = mel_power_frames(&vec![0.0; HOP * 4 + 3], &bank);
    assert_eq!(frames.n_frames, 5);
}

#[test]
fn silence_has_zero_power() {
    let bank = MelFilterBank::new(8_000);
    let frames = mel_power_frames(&vec![0.0; 4_000], &bank);
    assert!(frames.power.iter().all(|&p| p == 0.0));
}

#[test]
fn parallel_frames_are_deterministic() {
    let bank = MelFilterBank::new(16_000);
    let tone: Vec<f32> = (0..16_000)
        .map(|i| (i as f32 * 440.0 * std::f32::consts::TAU / 16_000.0).sin())
        .collect();
    let a = mel_power_frames(&tone, &bank);
    let b = mel_power_frames(&tone, &bank);
    assert_eq!(a.power, b.power);
    assert!(a.power.iter().all(|p| *p >= 0.0));
}
