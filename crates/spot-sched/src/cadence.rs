/// Every-Nth-tick sampling policy. Tick 0 is always sampled.
#[derive(Debug, Clone)]
pub struct Cadence {
    every_n: u32,
    frame_counter: u64,
}

impl Cadence {
    pub fn new(every_n: u32) -> Self {
        Self { every_n: every_n.max(1), frame_counter: 0 }
    }

    /// Index the next call to `tick_should_infer` will account for.
    pub fn frame_counter(&self) -> u64 { self.frame_counter }

    pub fn every_n(&self) -> u32 { self.every_n }

    pub fn tick_should_infer(&mut self) -> bool {
        let due = self.frame_counter % self.every_n as u64 == 0;
        self.frame_counter += 1;
        due
    }

    pub fn reset(&mut self) {
        self.frame_counter = 0;
    }
}
