//! Rolling statistics for the training graphs.

use crate::reporting::GenerationReport;

/// Ring buffer that stores the last N samples of a metric.
pub struct RingBuffer {
    data: Vec<f32>,
    head: usize,
    len: usize,
    capacity: usize,
}

impl RingBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            data: vec![0.0; capacity],
            head: 0,
            len: 0,
            capacity,
        }
    }

    pub fn push(&mut self, value: f32) {
        self.data[self.head] = value;
        self.head = (self.head + 1) % self.capacity;
        if self.len < self.capacity {
            self.len += 1;
        }
    }

    /// Return samples in chronological order.
    pub fn iter(&self) -> impl Iterator<Item = f32> + '_ {
        let start = if self.len < self.capacity {
            0
        } else {
            self.head
        };
        (0..self.len).map(move |i| self.data[(start + i) % self.capacity])
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
    }

    pub fn last(&self) -> Option<f32> {
        if self.len == 0 {
            None
        } else {
            let idx = (self.head + self.capacity - 1) % self.capacity;
            Some(self.data[idx])
        }
    }
}

/// Per-generation and per-tick series shown by the viewer.
pub struct TrainingStats {
    pub best_fitness: RingBuffer,
    pub mean_fitness: RingBuffer,
    pub score: RingBuffer,
    /// Live flyers per tick of the current evaluation.
    pub alive: RingBuffer,
    pub best_ever: Option<f64>,
}

impl TrainingStats {
    pub fn new(capacity: usize) -> Self {
        Self {
            best_fitness: RingBuffer::new(capacity),
            mean_fitness: RingBuffer::new(capacity),
            score: RingBuffer::new(capacity),
            alive: RingBuffer::new(capacity),
            best_ever: None,
        }
    }

    pub fn record_tick(&mut self, alive: usize) {
        self.alive.push(alive as f32);
    }

    /// Close out a generation; the per-tick series restarts with the next one.
    pub fn record_generation(&mut self, report: &GenerationReport) {
        self.best_fitness.push(report.best() as f32);
        self.mean_fitness.push(report.fitness.mean as f32);
        self.score.push(report.score as f32);
        self.best_ever = Some(match self.best_ever {
            Some(best) => best.max(report.best()),
            None => report.best(),
        });
        self.alive.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporting::FitnessSummary;
    use crate::simulation::Status;

    #[test]
    fn ring_buffer_iterates_in_insertion_order_after_wrap() {
        let mut buf = RingBuffer::new(3);
        buf.push(1.0);
        buf.push(2.0);
        buf.push(3.0);
        buf.push(4.0);

        let values: Vec<f32> = buf.iter().collect();
        assert_eq!(values, vec![2.0, 3.0, 4.0]);
        assert_eq!(buf.last(), Some(4.0));
    }

    fn report(generation: u32, best: f64, score: u32) -> GenerationReport {
        GenerationReport {
            generation,
            status: Status::Extinct,
            score,
            ticks: 100,
            fitness: FitnessSummary {
                count: 2,
                worst: 0.0,
                best,
                mean: best / 2.0,
                p50: 0.0,
                p90: best,
                collided: 0,
            },
            collided_pct: 0.0,
        }
    }

    #[test]
    fn generations_feed_the_graphs_and_reset_tick_series() {
        let mut stats = TrainingStats::new(8);
        for alive in [50, 42, 17] {
            stats.record_tick(alive);
        }
        assert_eq!(stats.alive.len(), 3);

        stats.record_generation(&report(0, 12.0, 1));
        stats.record_generation(&report(1, 8.0, 0));

        assert!(stats.alive.is_empty());
        let best: Vec<f32> = stats.best_fitness.iter().collect();
        assert_eq!(best, vec![12.0, 8.0]);
        assert_eq!(stats.mean_fitness.last(), Some(4.0));
        assert_eq!(stats.score.last(), Some(0.0));
        assert_eq!(stats.best_ever, Some(12.0));
    }
}
