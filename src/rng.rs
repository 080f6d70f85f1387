#[derive(Clone, Debug)]
pub struct Rng {
    seed: u32,
}

impl Rng {
    pub fn new(seed: u32) -> Self {
        Self { seed }
    }

    pub fn next_u32(&mut self) -> u32 {
        self.seed = self.seed.wrapping_add(0x6d2b79f5);
        let mut t = self.seed;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        t ^ (t >> 14)
    }

    pub fn next_f32(&mut self) -> f32 {
        (self.next_u32() as f64 / 4_294_967_296.0) as f32
    }

    pub fn int(&mut self, min: i32, max: i32) -> i32 {
        if max <= min {
            return min;
        }
        let span = (i64::from(max) - i64::from(min) + 1) as f64;
        let offset = (f64::from(self.next_f32()) * span).floor() as i64;
        (i64::from(min) + offset).min(i64::from(max)) as i32
    }

    pub fn draws_zero(&mut self, bound: u32) -> bool {
        self.int(0, bound.min(i32::MAX as u32) as i32) == 0
    }

    pub fn pick_index(&mut self, len: usize) -> usize {
        if len <= 1 {
            return 0;
        }
        (self.next_f32() * len as f32).floor().min((len - 1) as f32) as usize
    }

    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        items.get(self.pick_index(items.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::Rng;

    #[test]
    fn same_seed_replays_same_sequence() {
        let mut a = Rng::new(77);
        let mut b = Rng::new(77);
        for _ in 0..100 {
            assert_eq!(a.next_f32().to_bits(), b.next_f32().to_bits());
        }
    }

    #[test]
    fn int_stays_inside_inclusive_bounds() {
        let mut rng = Rng::new(3);
        for _ in 0..2_000 {
            let v = rng.int(0, 5);
            assert!((0..=5).contains(&v));
        }
    }

    #[test]
    fn full_width_ranges_do_not_overflow() {
        let mut rng = Rng::new(21);
        for _ in 0..1_000 {
            assert!(rng.int(0, i32::MAX) >= 0);
            assert!(rng.int(i32::MIN, i32::MAX) <= i32::MAX);
            rng.draws_zero(u32::MAX);
        }
    }

    #[test]
    fn zero_bound_always_fires() {
        let mut rng = Rng::new(9);
        assert!((0..100).all(|_| rng.draws_zero(0)));
    }

    #[test]
    fn zero_draw_rate_tracks_bound() {
        let mut rng = Rng::new(12_345);
        let hits = (0..10_000).filter(|_| rng.draws_zero(4)).count();
        assert!((1_600..=2_400).contains(&hits), "hits={hits}");
    }

    #[test]
    fn pick_on_empty_slice_is_none() {
        let mut rng = Rng::new(1);
        let empty: [u8; 0] = [];
        assert!(rng.pick(&empty).is_none());
        assert_eq!(rng.pick(&[4]), Some(&4));
    }
}
