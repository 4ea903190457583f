use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::RemovalMode;
use crate::error::{Result, SimError};
use crate::flyer::{AgentId, Flyer};
use crate::oracle::DecisionOracle;

/// Why a member left the population.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fate {
    Collided,
    OutOfBounds,
    /// Still flying when the evaluation was stopped.
    Survived,
}

/// A flyer, the oracle steering it and its fitness, kept as one value so
/// the three can only ever be removed together.
pub struct Member {
    pub id: AgentId,
    pub flyer: Flyer,
    pub oracle: Box<dyn DecisionOracle>,
    pub fitness: f64,
}

/// Final fitness of a member that left the population.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FitnessRecord {
    pub id: AgentId,
    pub fitness: f64,
    pub fate: Fate,
    /// Tick during which the member was removed.
    pub tick: u64,
}

/// Live members in stable order plus the records of those already removed.
pub struct Population {
    /// Sorted by id.
    members: Vec<Member>,
    finished: Vec<FitnessRecord>,
    /// Index into `finished`, by id.
    record_slot: Vec<Option<usize>>,
    mode: RemovalMode,
    enrolled: usize,
}

impl Population {
    pub fn new(mode: RemovalMode) -> Self {
        Self {
            members: Vec::new(),
            finished: Vec::new(),
            record_slot: Vec::new(),
            mode,
            enrolled: 0,
        }
    }

    /// Enroll a member. Only used while the evaluation is being built.
    pub(crate) fn enroll(&mut self, flyer: Flyer, oracle: Box<dyn DecisionOracle>) -> AgentId {
        let id = AgentId(self.enrolled as u32);
        self.members.push(Member {
            id,
            flyer,
            oracle,
            fitness: 0.0,
        });
        self.record_slot.push(None);
        self.enrolled += 1;
        id
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// The lead flyer is the first live member.
    pub fn lead(&self) -> Option<&Member> {
        self.members.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Member> + '_ {
        self.members.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Member> + '_ {
        self.members.iter_mut()
    }

    pub fn finished(&self) -> &[FitnessRecord] {
        &self.finished
    }

    /// Current fitness of `id`, live or final.
    pub fn fitness(&self, id: AgentId) -> Option<f64> {
        if let Some(member) = self.member(id) {
            return Some(member.fitness);
        }
        let slot = (*self.record_slot.get(id.0 as usize)?)?;
        self.finished.get(slot).map(|r| r.fitness)
    }

    pub fn is_alive(&self, id: AgentId) -> bool {
        self.member(id).is_some()
    }

    fn member(&self, id: AgentId) -> Option<&Member> {
        self.members
            .binary_search_by_key(&id, |m| m.id)
            .ok()
            .map(|i| &self.members[i])
    }

    /// Visit every live member in order; members for which `visit` returns
    /// a fate are removed. Returns the ids removed, in visit order.
    pub fn sweep<F>(&mut self, tick: u64, mut visit: F) -> Vec<AgentId>
    where
        F: FnMut(&mut Member) -> Option<Fate>,
    {
        let mut removed = Vec::new();
        match self.mode {
            RemovalMode::IndexSafe => {
                let fates: Vec<Option<Fate>> = self.members.iter_mut().map(&mut visit).collect();
                let members = std::mem::take(&mut self.members);
                for (member, fate) in members.into_iter().zip(fates) {
                    match fate {
                        Some(fate) => {
                            removed.push(member.id);
                            self.finish(member, fate, tick);
                        }
                        None => self.members.push(member),
                    }
                }
            }
            RemovalMode::LegacyInPlace => {
                let mut i = 0;
                while i < self.members.len() {
                    if let Some(fate) = visit(&mut self.members[i]) {
                        let member = self.members.remove(i);
                        removed.push(member.id);
                        self.finish(member, fate, tick);
                    }
                    // Advancing past a removal skips the member that shifted into `i`.
                    i += 1;
                }
            }
        }
        removed
    }

    /// Close out every live member, e.g. when an evaluation is stopped.
    pub fn finish_all(&mut self, fate: Fate, tick: u64) {
        for member in std::mem::take(&mut self.members) {
            self.finish(member, fate, tick);
        }
    }

    fn finish(&mut self, member: Member, fate: Fate, tick: u64) {
        debug!(id = %member.id, fitness = member.fitness, ?fate, tick, "member removed");
        if let Some(slot) = self.record_slot.get_mut(member.id.0 as usize) {
            *slot = Some(self.finished.len());
        }
        self.finished.push(FitnessRecord {
            id: member.id,
            fitness: member.fitness,
            fate,
            tick,
        });
    }

    /// Ids are unique, live order is stable, nothing is lost or duplicated.
    pub fn check(&self) -> Result<()> {
        for pair in self.members.windows(2) {
            if pair[0].id >= pair[1].id {
                return Err(SimError::Invariant(format!(
                    "live members out of order: {} before {}",
                    pair[0].id, pair[1].id
                )));
            }
        }
        if let Some(r) = self.finished.iter().find(|r| self.is_alive(r.id)) {
            return Err(SimError::Invariant(format!(
                "member {} is both live and finished",
                r.id
            )));
        }
        if self.members.len() + self.finished.len() != self.enrolled {
            return Err(SimError::Invariant(format!(
                "{} live + {} finished != {} enrolled",
                self.members.len(),
                self.finished.len(),
                self.enrolled
            )));
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn finished_mut(&mut self) -> &mut Vec<FitnessRecord> {
        &mut self.finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle;

    fn population(mode: RemovalMode, n: usize) -> Population {
        let mut p = Population::new(mode);
        for i in 0..n {
            p.enroll(Flyer::new(130.0, 100.0 * i as f32), oracle::constant(0.0));
        }
        p
    }

    #[test]
    fn index_safe_sweep_removes_exactly_the_marked_members() {
        let mut p = population(RemovalMode::IndexSafe, 5);
        let mut visited = Vec::new();
        let removed = p.sweep(3, |m| {
            visited.push(m.id);
            (m.id.0 % 2 == 1).then_some(Fate::OutOfBounds)
        });
        assert_eq!(visited.len(), 5);
        assert_eq!(removed, vec![AgentId(1), AgentId(3)]);
        let live: Vec<AgentId> = p.iter().map(|m| m.id).collect();
        assert_eq!(live, vec![AgentId(0), AgentId(2), AgentId(4)]);
        assert!(p.finished().iter().all(|r| r.tick == 3));
        assert!(p.check().is_ok());
    }

    #[test]
    fn legacy_sweep_skips_the_member_after_each_removal() {
        let mut p = population(RemovalMode::LegacyInPlace, 4);
        let mut visited = Vec::new();
        let removed = p.sweep(1, |m| {
            visited.push(m.id);
            Some(Fate::Collided)
        });
        // 0 removed, 1 shifts into slot 0 and is skipped; same for 3.
        assert_eq!(visited, vec![AgentId(0), AgentId(2)]);
        assert_eq!(removed, vec![AgentId(0), AgentId(2)]);
        let live: Vec<AgentId> = p.iter().map(|m| m.id).collect();
        assert_eq!(live, vec![AgentId(1), AgentId(3)]);
        assert!(p.check().is_ok());
    }

    #[test]
    fn fitness_travels_with_the_member() {
        let mut p = population(RemovalMode::IndexSafe, 3);
        for m in p.iter_mut() {
            m.fitness = m.id.0 as f64 * 10.0;
        }
        p.sweep(7, |m| (m.id == AgentId(1)).then_some(Fate::Collided));
        assert_eq!(p.fitness(AgentId(0)), Some(0.0));
        assert_eq!(p.fitness(AgentId(1)), Some(10.0));
        assert_eq!(p.fitness(AgentId(2)), Some(20.0));
        assert_eq!(p.fitness(AgentId(9)), None);
        assert!(!p.is_alive(AgentId(1)));
        assert!(p.is_alive(AgentId(2)));
    }

    #[test]
    fn lookups_stay_exact_across_a_large_sweep() {
        let mut p = population(RemovalMode::IndexSafe, 20_000);
        for m in p.iter_mut() {
            m.fitness = m.id.0 as f64;
        }
        p.sweep(24, |m| (m.id.0 % 2 == 0).then_some(Fate::OutOfBounds));
        p.sweep(25, |m| (m.id.0 % 3 == 0).then_some(Fate::Collided));
        assert!(p.check().is_ok());
        assert_eq!(p.len() + p.finished().len(), 20_000);
        for id in [0u32, 3, 9, 9_999, 12_345, 19_999] {
            let id = AgentId(id);
            assert_eq!(p.fitness(id), Some(id.0 as f64));
            assert_eq!(p.is_alive(id), id.0 % 2 == 1 && id.0 % 3 != 0);
        }
        assert_eq!(p.fitness(AgentId(20_000)), None);
        let record = p.finished().iter().find(|r| r.id == AgentId(9)).unwrap();
        assert_eq!((record.fate, record.tick), (Fate::Collided, 25));
    }

    #[test]
    fn finish_all_closes_out_live_members() {
        let mut p = population(RemovalMode::IndexSafe, 2);
        p.finish_all(Fate::Survived, 12);
        assert!(p.is_empty());
        assert_eq!(p.finished().len(), 2);
        assert!(p.finished().iter().all(|r| r.fate == Fate::Survived));
        assert!(p.check().is_ok());
    }

    #[test]
    fn check_catches_duplicated_records() {
        let mut p = population(RemovalMode::IndexSafe, 3);
        p.finished_mut().push(FitnessRecord {
            id: AgentId(1),
            fitness: 0.0,
            fate: Fate::Collided,
            tick: 0,
        });
        assert!(matches!(p.check(), Err(SimError::Invariant(_))));
    }
}
