use super::*;

#[test]
fn rng_is_deterministic() {
    let mut a = Rng64::new(123);
    let mut b = Rng64::new(123);
    for _ in 0..10 {
        assert_eq!(a.next_u64(), b.next_u64());
    }
}

#[test]
fn forked_streams_differ() {
    let a = Rng64::fork(7, 0).next_u64();
    let b = Rng64::fork(7, 1).next_u64();
    assert_ne!(a, b);
    assert_eq!(a, Rng64::fork(7, 0).next_u64());
}

#[test]
fn bounded_draws_stay_in_range() {
    let mut rng = Rng64::new(99);
    for _ in 0..1000 {
        assert!(rng.next_below(5) < 5);
        let s = rng.next_signed(3);
        assert!((-3..=3).contains(&s));
        let f = rng.next_f64_01();
        assert!((0.0..1.0).contains(&f));
    }
    assert_eq!(rng.next_below(0), 0);
    assert_eq!(rng.next_signed(0), 0);
}

#[test]
fn noise_is_bounded_and_deterministic() {
    for x in 0..32 {
        let v = noise01(11, x);
        assert!((0.0..1.0).contains(&v));
        assert_eq!(v, noise01(11, x));
    }
}

#[test]
fn mul_div255_variants_align() {
    for x in [0u16, 1, 127, 255] {
        for y in [0u16, 1, 127, 255] {
            assert_eq!(u16::from(mul_div255_u8(x, y)), mul_div255_u16(x, y));
        }
    }
}
