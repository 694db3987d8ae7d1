use std::collections::{BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::gameplay::judgment::{HitPhase, Judgment, JudgmentTable, Verdict};
use crate::{Chart, LogicalTime};
use notefall_chart::ChartValidationError;

/// Index of a [`HitObject`] inside its [`ObjectPool`]; equals the note's chart index.
pub type ObjectId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectState {
    /// Not touched yet.
    Pending,
    /// Hold note whose head was hit; waiting for the release.
    Held,
    Hit,
    Missed,
    Released,
}

impl ObjectState {
    pub fn is_resolved(self) -> bool {
        matches!(self, ObjectState::Hit | ObjectState::Missed | ObjectState::Released)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HitObject {
    pub id: ObjectId,
    pub lane: u8,
    pub start: LogicalTime,
    pub end: Option<LogicalTime>,
    state: ObjectState,
}

impl HitObject {
    pub fn state(&self) -> ObjectState {
        self.state
    }

    pub fn is_hold(&self) -> bool {
        self.end.is_some()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedCounts {
    pub hit: usize,
    pub missed: usize,
    pub released: usize,
}

impl ResolvedCounts {
    pub fn total(&self) -> usize {
        self.hit + self.missed + self.released
    }
}

/// Owns every note of a session. Unresolved objects are indexed three ways:
/// per-lane queues of untouched notes, the hold currently held in each lane,
/// and a deadline set ordered by the time each object turns into a miss.
#[derive(Debug, Clone, Default)]
pub struct ObjectPool {
    objects: Vec<HitObject>,
    pending: Vec<VecDeque<ObjectId>>,
    held: Vec<Option<ObjectId>>,
    deadlines: BTreeSet<(LogicalTime, ObjectId)>,
    widest_ms: LogicalTime,
    late_release: Judgment,
    counts: ResolvedCounts,
}

impl ObjectPool {
    pub fn from_chart(chart: &Chart, table: &JudgmentTable) -> Result<Self, ChartValidationError> {
        chart.validate()?;

        let lane_count = chart.lane_count() as usize;
        let widest = table.widest();
        let mut pool = Self {
            objects: Vec::with_capacity(chart.notes.len()),
            pending: vec![VecDeque::new(); lane_count],
            held: vec![None; lane_count],
            deadlines: BTreeSet::new(),
            widest_ms: widest.tolerance_ms,
            late_release: widest.judgment,
            counts: ResolvedCounts::default(),
        };

        for (id, note) in chart.notes.iter().enumerate() {
            pool.objects.push(HitObject {
                id,
                lane: note.lane,
                start: note.start_ms,
                end: note.end_ms(),
                state: ObjectState::Pending,
            });
            pool.pending[note.lane as usize].push_back(id);
            pool.deadlines.insert((note.start_ms + pool.widest_ms, id));
        }

        Ok(pool)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn lane_count(&self) -> u8 {
        self.pending.len() as u8
    }

    pub fn get(&self, id: ObjectId) -> Option<&HitObject> {
        self.objects.get(id)
    }

    pub fn objects(&self) -> &[HitObject] {
        &self.objects
    }

    pub fn remaining(&self) -> usize {
        self.deadlines.len()
    }

    pub fn resolved(&self) -> ResolvedCounts {
        self.counts
    }

    pub fn is_complete(&self) -> bool {
        self.deadlines.is_empty()
    }

    /// Earliest untouched note in `lane`.
    pub fn front_pending(&self, lane: u8) -> Option<&HitObject> {
        let id = *self.pending.get(lane as usize)?.front()?;
        self.objects.get(id)
    }

    pub fn held_in(&self, lane: u8) -> Option<&HitObject> {
        let id = (*self.held.get(lane as usize)?)?;
        self.objects.get(id)
    }

    /// Earliest unresolved object across all lanes, held notes included.
    pub fn peek_next(&self) -> Option<&HitObject> {
        let fronts = self.pending.iter().filter_map(|q| q.front().copied());
        let held = self.held.iter().filter_map(|h| *h);
        fronts
            .chain(held)
            .map(|id| &self.objects[id])
            .min_by_key(|o| (o.start, o.id))
    }

    /// Unresolved objects starting no later than `until`, in lane order.
    pub fn upcoming(&self, until: LogicalTime) -> impl Iterator<Item = &HitObject> + '_ {
        let held = self.held.iter().filter_map(|h| *h);
        let pending = self
            .pending
            .iter()
            .flat_map(move |q| q.iter().copied().take_while(move |&id| self.objects[id].start <= until));
        held.chain(pending).map(move |id| &self.objects[id])
    }

    /// Resolves every object whose deadline is strictly before `now`, in deadline order.
    /// Untouched notes become misses (two for a hold: head and tail); holds still held
    /// past their end are released with the widest hit window.
    pub fn advance(&mut self, now: LogicalTime, out: &mut Vec<Verdict>) {
        while let Some(&(deadline, id)) = self.deadlines.first() {
            if now <= deadline {
                break;
            }
            self.deadlines.pop_first();

            let HitObject {
                lane,
                start,
                end,
                state,
                ..
            } = self.objects[id];
            match state {
                ObjectState::Pending => {
                    self.remove_pending(lane, id);
                    self.objects[id].state = ObjectState::Missed;
                    self.counts.missed += 1;
                    out.push(Verdict {
                        object: id,
                        lane,
                        phase: HitPhase::Press,
                        judgment: Judgment::Miss,
                        time: deadline,
                        offset_ms: deadline - start,
                    });
                    if let Some(end) = end {
                        out.push(Verdict {
                            object: id,
                            lane,
                            phase: HitPhase::Release,
                            judgment: Judgment::Miss,
                            time: deadline,
                            offset_ms: deadline - end,
                        });
                    }
                }
                ObjectState::Held => {
                    self.held[lane as usize] = None;
                    self.objects[id].state = ObjectState::Released;
                    self.counts.released += 1;
                    out.push(Verdict {
                        object: id,
                        lane,
                        phase: HitPhase::Release,
                        judgment: self.late_release,
                        time: deadline,
                        offset_ms: self.widest_ms,
                    });
                }
                state => {
                    log::error!("object {id} in deadline set while {state:?}");
                }
            }
        }
    }

    /// Marks the head of `id` as hit. Taps resolve, holds move to `Held`.
    pub fn press(&mut self, id: ObjectId) -> ObjectState {
        let Some(object) = self.objects.get(id) else {
            return ObjectState::Missed;
        };
        if object.state != ObjectState::Pending {
            return object.state;
        }
        let (lane, start, end) = (object.lane, object.start, object.end);

        self.remove_pending(lane, id);
        self.deadlines.remove(&(start + self.widest_ms, id));

        let state = match end {
            Some(end) => {
                self.held[lane as usize] = Some(id);
                self.deadlines.insert((end + self.widest_ms, id));
                ObjectState::Held
            }
            None => {
                self.counts.hit += 1;
                ObjectState::Hit
            }
        };
        self.objects[id].state = state;
        state
    }

    /// Finalizes the hold held in `id`'s lane.
    pub fn release(&mut self, id: ObjectId) -> ObjectState {
        let Some(object) = self.objects.get(id) else {
            return ObjectState::Missed;
        };
        if object.state != ObjectState::Held {
            return object.state;
        }
        let (lane, end) = (object.lane, object.end.unwrap_or(object.start));

        self.held[lane as usize] = None;
        self.deadlines.remove(&(end + self.widest_ms, id));
        self.objects[id].state = ObjectState::Released;
        self.counts.released += 1;
        ObjectState::Released
    }

    fn remove_pending(&mut self, lane: u8, id: ObjectId) {
        let queue = &mut self.pending[lane as usize];
        if queue.front() == Some(&id) {
            queue.pop_front();
        } else if let Some(pos) = queue.iter().position(|&o| o == id) {
            queue.remove(pos);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GameMode, Note};

    fn pool(notes: Vec<Note>) -> ObjectPool {
        ObjectPool::from_chart(&Chart::new(GameMode::Keys4, notes), &JudgmentTable::default())
            .unwrap()
    }

    #[test]
    fn advance_misses_in_deadline_order_across_lanes() {
        let mut pool = pool(vec![Note::tap(2, 100), Note::tap(0, 200), Note::tap(1, 5000)]);
        let mut out = Vec::new();

        pool.advance(250, &mut out);
        assert!(out.is_empty());

        pool.advance(351, &mut out);
        let ids: Vec<_> = out.iter().map(|v| v.object).collect();
        assert_eq!(ids, vec![0, 1]);
        assert!(out.iter().all(|v| v.judgment == Judgment::Miss));
        assert_eq!(pool.remaining(), 1);
        assert_eq!(pool.peek_next().map(|o| o.id), Some(2));
    }

    #[test]
    fn deadline_is_exclusive() {
        let mut pool = pool(vec![Note::tap(0, 1000)]);
        let mut out = Vec::new();
        pool.advance(1150, &mut out);
        assert!(out.is_empty());
        pool.advance(1151, &mut out);
        assert_eq!(out.len(), 1);
        assert!(pool.is_complete());
    }

    #[test]
    fn missed_hold_reports_head_and_tail() {
        let mut pool = pool(vec![Note::hold(3, 0, 400)]);
        let mut out = Vec::new();
        pool.advance(151, &mut out);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].phase, HitPhase::Press);
        assert_eq!(out[1].phase, HitPhase::Release);
        assert_eq!(pool.resolved().missed, 1);
    }

    #[test]
    fn held_note_moves_its_deadline_to_the_tail() {
        let mut pool = pool(vec![Note::hold(1, 0, 1000)]);
        assert_eq!(pool.press(0), ObjectState::Held);
        assert_eq!(pool.held_in(1).map(|o| o.id), Some(0));

        let mut out = Vec::new();
        pool.advance(900, &mut out);
        assert!(out.is_empty());

        pool.advance(1151, &mut out);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].judgment, Judgment::Bad);
        assert_eq!(pool.get(0).unwrap().state(), ObjectState::Released);
        assert!(pool.held_in(1).is_none());
        assert!(pool.is_complete());
    }

    #[test]
    fn upcoming_respects_horizon() {
        let pool = pool(vec![Note::tap(0, 100), Note::tap(1, 900), Note::tap(0, 2000)]);
        let ids: Vec<_> = pool.upcoming(1000).map(|o| o.id).collect();
        assert_eq!(ids, vec![0, 1]);
    }
}
