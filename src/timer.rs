#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Timer {
    time_left: f32,
    max_time: f32,
}

impl Timer {
    pub fn new(amount: f32) -> Self {
        Self {
            time_left: amount,
            max_time: amount,
        }
    }

    pub fn expired(amount: f32) -> Self {
        Self {
            time_left: 0.0,
            max_time: amount,
        }
    }

    pub fn update(&mut self, dt: f32) -> f32 {
        self.time_left = (self.time_left - dt).max(0.0);
        self.time_left
    }

    pub fn restart(&mut self) {
        self.time_left = self.max_time;
    }

    pub fn end(&mut self) {
        self.time_left = 0.0;
    }

    pub fn done(&self) -> bool {
        self.time_left <= 0.0
    }

    pub fn time_left(&self) -> f32 {
        self.time_left
    }
}

#[cfg(test)]
mod tests {
    use super::Timer;

    #[test]
    fn counts_down_and_saturates_at_zero() {
        let mut timer = Timer::new(0.3);
        timer.update(0.2);
        assert!(!timer.done());
        timer.update(0.2);
        assert!(timer.done());
        assert_eq!(timer.time_left(), 0.0);
    }

    #[test]
    fn restart_and_end() {
        let mut timer = Timer::expired(1.0);
        assert!(timer.done());
        timer.restart();
        assert_eq!(timer.time_left(), 1.0);
        timer.end();
        assert!(timer.done());
    }
}
