use std::io::Write;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::population::{Fate, FitnessRecord};
use crate::simulation::{EvaluationSummary, Status};

/// Distribution of final fitness across one generation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FitnessSummary {
    pub count: usize,
    pub worst: f64,
    pub best: f64,
    pub mean: f64,
    pub p50: f64,
    pub p90: f64,
    /// Members that ended on an obstacle.
    pub collided: usize,
}

impl FitnessSummary {
    pub fn from_records(records: &[FitnessRecord]) -> Self {
        if records.is_empty() {
            return Self::default();
        }
        let mut sorted: Vec<f64> = records.iter().map(|r| r.fitness).collect();
        sorted.sort_by(f64::total_cmp);

        Self {
            count: sorted.len(),
            worst: sorted[0],
            best: sorted[sorted.len() - 1],
            mean: sorted.iter().sum::<f64>() / sorted.len() as f64,
            p50: nearest_rank(&sorted, 0.50),
            p90: nearest_rank(&sorted, 0.90),
            collided: records.iter().filter(|r| r.fate == Fate::Collided).count(),
        }
    }
}

/// `sorted` must be non-empty.
fn nearest_rank(sorted: &[f64], p: f64) -> f64 {
    let rank = ((p * sorted.len() as f64).ceil() as usize).saturating_sub(1);
    sorted[rank.min(sorted.len() - 1)]
}

/// One line of the training report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerationReport {
    pub generation: u32,
    pub status: Status,
    pub score: u32,
    pub ticks: u64,
    pub fitness: FitnessSummary,
    /// Share of the population that ended on an obstacle, in percent.
    pub collided_pct: f64,
}

impl GenerationReport {
    pub fn from_summary(generation: u32, summary: &EvaluationSummary) -> Self {
        let fitness = FitnessSummary::from_records(&summary.records);
        let collided_pct = if fitness.count == 0 {
            0.0
        } else {
            fitness.collided as f64 * 100.0 / fitness.count as f64
        };
        Self {
            generation,
            status: summary.status,
            score: summary.score,
            ticks: summary.ticks,
            fitness,
            collided_pct,
        }
    }

    pub fn best(&self) -> f64 {
        self.fitness.best
    }
}

/// Writes one JSON object per line.
pub struct JsonLinesWriter<W: Write> {
    out: W,
}

impl<W: Write> JsonLinesWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn write<T: Serialize>(&mut self, record: &T) -> anyhow::Result<()> {
        serde_json::to_writer(&mut self.out, record).context("serializing report line")?;
        self.out.write_all(b"\n").context("writing report line")?;
        self.out.flush().context("flushing report")?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flyer::AgentId;

    #[test]
    fn fitness_percentiles_use_nearest_rank() {
        let records: Vec<FitnessRecord> = (1..=100)
            .map(|i| FitnessRecord {
                id: AgentId(i),
                fitness: f64::from(101 - i),
                fate: Fate::OutOfBounds,
                tick: 1,
            })
            .collect();
        let s = FitnessSummary::from_records(&records);
        assert_eq!(s.count, 100);
        assert_eq!(s.worst, 1.0);
        assert_eq!(s.best, 100.0);
        assert!((s.mean - 50.5).abs() < 1e-9);
        assert_eq!(s.p50, 50.0);
        assert_eq!(s.p90, 90.0);
        assert_eq!(s.collided, 0);
    }

    #[test]
    fn empty_generation_summarises_to_zero() {
        assert_eq!(FitnessSummary::from_records(&[]), FitnessSummary::default());
        let empty = EvaluationSummary {
            status: Status::Stopped,
            ticks: 0,
            score: 0,
            records: Vec::new(),
        };
        assert_eq!(GenerationReport::from_summary(0, &empty).collided_pct, 0.0);
    }

    fn summary() -> EvaluationSummary {
        let record = |id, fitness, fate| FitnessRecord {
            id: AgentId(id),
            fitness,
            fate,
            tick: 40,
        };
        EvaluationSummary {
            status: Status::Extinct,
            ticks: 40,
            score: 0,
            records: vec![
                record(0, -1.0, Fate::Collided),
                record(1, 4.0, Fate::OutOfBounds),
                record(2, 2.0, Fate::OutOfBounds),
                record(3, -1.0, Fate::Collided),
            ],
        }
    }

    #[test]
    fn generation_report_summarises_final_fitness() {
        let report = GenerationReport::from_summary(3, &summary());
        assert_eq!(report.generation, 3);
        assert_eq!(report.best(), 4.0);
        assert_eq!(report.fitness.mean, 1.0);
        assert_eq!(report.fitness.p50, -1.0);
        assert_eq!(report.fitness.worst, -1.0);
        assert_eq!(report.fitness.collided, 2);
        assert_eq!(report.collided_pct, 50.0);
    }

    #[test]
    fn json_lines_are_newline_delimited() {
        let mut writer = JsonLinesWriter::new(Vec::new());
        let report = GenerationReport::from_summary(0, &summary());
        writer.write(&report).unwrap();
        writer.write(&report).unwrap();
        let text = String::from_utf8(writer.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let parsed: GenerationReport = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed, report);
        assert!(lines[1].contains("\"status\":\"extinct\""));
    }
}
