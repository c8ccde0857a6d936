// src/assessment/selector.rs
use std::collections::BTreeSet;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::bank::{BankQuestion, Difficulty, QuestionType};

/// Share of each question type's slots drawn from each difficulty in mixed mode.
pub const DIFFICULTY_RATIO: [(Difficulty, f64); 3] = [
    (Difficulty::Easy, 0.4),
    (Difficulty::Medium, 0.4),
    (Difficulty::Hard, 0.2),
];

/// Every test should touch at least one topic from each group.
pub const CORE_TOPICS: &[&[&str]] = &[
    &["Arrays"],
    &["Recursion"],
    &["Stack", "Queue"],
    &["Trees", "Graphs"],
    &["Complexity"],
];

const MAX_TIME_SWAPS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DifficultyMode {
    #[default]
    Mixed,
    Easy,
    Medium,
    Hard,
}

impl DifficultyMode {
    fn only(self) -> Option<Difficulty> {
        match self {
            DifficultyMode::Mixed => None,
            DifficultyMode::Easy => Some(Difficulty::Easy),
            DifficultyMode::Medium => Some(Difficulty::Medium),
            DifficultyMode::Hard => Some(Difficulty::Hard),
        }
    }
}

/// How many questions of each type a test contains, in selection order.
#[derive(Debug, Clone, PartialEq)]
pub struct Blueprint {
    slots: Vec<(QuestionType, usize)>,
}

impl Blueprint {
    pub fn new(slots: impl IntoIterator<Item = (QuestionType, usize)>) -> Self {
        Self {
            slots: slots.into_iter().collect(),
        }
    }

    pub fn slots(&self) -> &[(QuestionType, usize)] {
        &self.slots
    }

    pub fn total(&self) -> usize {
        self.slots.iter().map(|(_, n)| n).sum()
    }
}

impl Default for Blueprint {
    fn default() -> Self {
        Self::new([
            (QuestionType::Mcq, 1),
            (QuestionType::Msq, 1),
            (QuestionType::CodeTrace, 3),
            (QuestionType::ShortAnswer, 2),
            (QuestionType::Reasoning, 2),
        ])
    }
}

#[derive(Debug, Clone)]
pub struct Selection<'a> {
    pub questions: Vec<&'a BankQuestion>,
    pub total_time_sec: u32,
    pub difficulty_mode: DifficultyMode,
}

impl Selection<'_> {
    pub fn question_ids(&self) -> Vec<&str> {
        self.questions.iter().map(|q| q.id.as_str()).collect()
    }

    pub fn topics_covered(&self) -> BTreeSet<&str> {
        self.questions.iter().map(|q| q.topic.as_str()).collect()
    }
}

/// Picks a test from `pool` in three passes: fill the blueprint by difficulty,
/// swap in questions for uncovered core topics, then trade slow questions for
/// faster ones of the same type until the test fits `time_limit_sec`.
///
/// The time pass stops early when the slowest question has no faster
/// replacement, so the result can still exceed the limit.
pub fn select_questions<'a, R>(
    pool: &'a [BankQuestion],
    blueprint: &Blueprint,
    time_limit_sec: u32,
    mode: DifficultyMode,
    rng: &mut R,
) -> Selection<'a>
where
    R: Rng + ?Sized,
{
    let mut selected = fill_blueprint(pool, blueprint, mode, rng);
    cover_core_topics(pool, &mut selected);
    let total_time_sec = fit_time_limit(pool, &mut selected, time_limit_sec);

    log::debug!(
        "Selected {} questions ({}s of {}s)",
        selected.len(),
        total_time_sec,
        time_limit_sec
    );

    Selection {
        questions: selected,
        total_time_sec,
        difficulty_mode: mode,
    }
}

fn fill_blueprint<'a, R>(
    pool: &'a [BankQuestion],
    blueprint: &Blueprint,
    mode: DifficultyMode,
    rng: &mut R,
) -> Vec<&'a BankQuestion>
where
    R: Rng + ?Sized,
{
    let mut selected = Vec::with_capacity(blueprint.total());

    for &(question_type, count) in blueprint.slots() {
        let of_type: Vec<&BankQuestion> = pool.iter().filter(|q| q.question_type == question_type).collect();
        let mut picked: Vec<&BankQuestion> = Vec::new();

        let mut take_from = |difficulty: Difficulty, take: usize, rng: &mut R| {
            let mut level: Vec<&BankQuestion> = of_type.iter().copied().filter(|q| q.difficulty == difficulty).collect();
            level.shuffle(rng);
            picked.extend(level.into_iter().take(take));
        };

        match mode.only() {
            Some(difficulty) => take_from(difficulty, count, &mut *rng),
            None => {
                for (difficulty, ratio) in DIFFICULTY_RATIO {
                    let take = ((count as f64 * ratio).floor() as usize).max(1);
                    take_from(difficulty, take, &mut *rng);
                }
            }
        }

        if picked.len() < count {
            let mut rest: Vec<&BankQuestion> = of_type.iter().copied().filter(|q| !contains(&picked, q)).collect();
            rest.shuffle(rng);
            let missing = count - picked.len();
            picked.extend(rest.into_iter().take(missing));
        }

        picked.truncate(count);
        selected.extend(picked);
    }

    selected
}

fn cover_core_topics<'a>(pool: &'a [BankQuestion], selected: &mut Vec<&'a BankQuestion>) {
    for group in CORE_TOPICS {
        if covers(selected, group) {
            continue;
        }
        let Some(candidate) = pool.iter().find(|q| group.contains(&q.topic.as_str())) else {
            continue;
        };

        // Drop the lightest question whose removal leaves every covered group covered.
        let removable = selected
            .iter()
            .enumerate()
            .filter(|&(i, _)| {
                CORE_TOPICS
                    .iter()
                    .filter(|g| covers(selected, g))
                    .all(|g| selected.iter().enumerate().any(|(j, q)| j != i && g.contains(&q.topic.as_str())))
            })
            .min_by(|(_, a), (_, b)| a.weight().total_cmp(&b.weight()))
            .map(|(i, _)| i);

        match removable {
            Some(i) => {
                log::debug!("Swapping {} for {} to cover {:?}", selected[i].id, candidate.id, group);
                selected.remove(i);
                selected.push(candidate);
            }
            None => log::debug!("No room to cover topic group {:?}", group),
        }
    }
}

fn fit_time_limit<'a>(pool: &'a [BankQuestion], selected: &mut Vec<&'a BankQuestion>, time_limit_sec: u32) -> u32 {
    let mut total = total_time(selected);
    let mut swaps = 0;

    while total > time_limit_sec && swaps < MAX_TIME_SWAPS {
        swaps += 1;

        // First of the slowest questions.
        let Some(worst) = selected
            .iter()
            .enumerate()
            .rev()
            .max_by_key(|(_, q)| q.max_time_sec())
            .map(|(i, _)| i)
        else {
            break;
        };
        let slow = selected[worst];

        let replacement = pool
            .iter()
            .filter(|q| {
                q.question_type == slow.question_type
                    && q.max_time_sec() < slow.max_time_sec()
                    && !contains(selected, q)
            })
            .min_by_key(|q| q.max_time_sec());

        let Some(replacement) = replacement else {
            break;
        };

        selected.remove(worst);
        selected.push(replacement);
        total = total_time(selected);
    }

    total
}

fn total_time(questions: &[&BankQuestion]) -> u32 {
    questions.iter().map(|q| q.max_time_sec()).sum()
}

fn covers(questions: &[&BankQuestion], group: &[&str]) -> bool {
    questions.iter().any(|q| group.contains(&q.topic.as_str()))
}

fn contains(questions: &[&BankQuestion], question: &BankQuestion) -> bool {
    questions.iter().any(|q| q.id == question.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assessment::bank::QuestionBank;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    use crate::assessment::bank::Difficulty::{Easy, Hard, Medium};
    use crate::assessment::bank::QuestionType::{CodeTrace, Mcq, Msq};

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    fn count_of(selection: &Selection<'_>, question_type: QuestionType) -> usize {
        selection.questions.iter().filter(|q| q.question_type == question_type).count()
    }

    #[test]
    fn test_single_difficulty_mode_prefers_that_difficulty() {
        let pool = vec![
            BankQuestion::stub("m1", Mcq, Easy, "Arrays", 1.0, 60),
            BankQuestion::stub("m2", Mcq, Hard, "Arrays", 1.0, 60),
            BankQuestion::stub("m3", Mcq, Hard, "Arrays", 1.0, 60),
            BankQuestion::stub("m4", Mcq, Medium, "Arrays", 1.0, 60),
        ];

        let selection = select_questions(&pool, &Blueprint::new([(Mcq, 2)]), 1000, DifficultyMode::Hard, &mut rng());

        let ids: HashSet<&str> = selection.question_ids().into_iter().collect();
        assert_eq!(ids, HashSet::from(["m2", "m3"]));
    }

    #[test]
    fn test_short_difficulty_pool_is_topped_up_from_other_levels() {
        let pool = vec![
            BankQuestion::stub("m1", Mcq, Hard, "Arrays", 1.0, 60),
            BankQuestion::stub("m2", Mcq, Easy, "Arrays", 1.0, 60),
            BankQuestion::stub("m3", Mcq, Medium, "Arrays", 1.0, 60),
            BankQuestion::stub("s1", Msq, Hard, "Arrays", 1.0, 60),
        ];

        let selection = select_questions(&pool, &Blueprint::new([(Mcq, 3)]), 1000, DifficultyMode::Hard, &mut rng());

        assert_eq!(selection.questions.len(), 3);
        assert_eq!(count_of(&selection, Mcq), 3);
        assert_eq!(selection.questions[0].id, "m1");
    }

    #[test]
    fn test_mixed_mode_takes_every_difficulty() {
        let pool = vec![
            BankQuestion::stub("e1", CodeTrace, Easy, "Arrays", 1.0, 60),
            BankQuestion::stub("e2", CodeTrace, Easy, "Arrays", 1.0, 60),
            BankQuestion::stub("m1", CodeTrace, Medium, "Arrays", 1.0, 60),
            BankQuestion::stub("m2", CodeTrace, Medium, "Arrays", 1.0, 60),
            BankQuestion::stub("h1", CodeTrace, Hard, "Arrays", 1.0, 60),
        ];

        // floor(3 * 0.4) = 1 easy, 1 medium and at least 1 hard.
        let selection = select_questions(&pool, &Blueprint::new([(CodeTrace, 3)]), 1000, DifficultyMode::Mixed, &mut rng());

        let difficulties: Vec<Difficulty> = selection.questions.iter().map(|q| q.difficulty).collect();
        assert_eq!(difficulties, vec![Easy, Medium, Hard]);
    }

    #[test]
    fn test_missing_core_topic_is_swapped_in() {
        let pool = vec![
            BankQuestion::stub("arr", Mcq, Easy, "Arrays", 1.0, 60),
            BankQuestion::stub("stk", Mcq, Easy, "Stack", 1.0, 60),
            BankQuestion::stub("tre", Mcq, Easy, "Trees", 1.0, 60),
            BankQuestion::stub("cpx", Mcq, Easy, "Complexity", 1.0, 60),
            BankQuestion::stub("hsh", Mcq, Easy, "Hashing", 2.0, 60),
            BankQuestion::stub("rec", Msq, Easy, "Recursion", 1.0, 60),
        ];

        let selection = select_questions(&pool, &Blueprint::new([(Mcq, 5)]), 1000, DifficultyMode::Easy, &mut rng());

        let ids: HashSet<&str> = selection.question_ids().into_iter().collect();
        // Hashing is heavier, but it is the only question not holding up a core group.
        assert_eq!(ids, HashSet::from(["arr", "stk", "tre", "cpx", "rec"]));
        for group in CORE_TOPICS {
            assert!(covers(&selection.questions, group), "{:?}", group);
        }
    }

    #[test]
    fn test_slow_questions_are_traded_for_faster_ones() {
        let pool = vec![
            BankQuestion::stub("slow", CodeTrace, Easy, "Arrays", 1.0, 300),
            BankQuestion::stub("mid", CodeTrace, Easy, "Arrays", 1.0, 120),
            BankQuestion::stub("fast", CodeTrace, Easy, "Arrays", 1.0, 100),
        ];
        let blueprint = Blueprint::new([(CodeTrace, 1)]);

        for seed in 0..8 {
            let selection = select_questions(&pool, &blueprint, 100, DifficultyMode::Easy, &mut StdRng::seed_from_u64(seed));
            assert_eq!(selection.question_ids(), vec!["fast"]);
            assert_eq!(selection.total_time_sec, 100);
        }

        // Nothing is faster than "fast": the limit is reported as missed, not looped on.
        let selection = select_questions(&pool, &blueprint, 10, DifficultyMode::Easy, &mut rng());
        assert_eq!(selection.total_time_sec, 100);
    }

    #[test]
    fn test_default_blueprint_on_embedded_bank() {
        let bank = QuestionBank::embedded().unwrap();

        for seed in 0..16 {
            let selection = select_questions(
                bank.questions(),
                &Blueprint::default(),
                1500,
                DifficultyMode::Mixed,
                &mut StdRng::seed_from_u64(seed),
            );

            assert_eq!(selection.questions.len(), Blueprint::default().total());
            let ids: HashSet<&str> = selection.question_ids().into_iter().collect();
            assert_eq!(ids.len(), selection.questions.len());
            assert_eq!(
                selection.total_time_sec,
                selection.questions.iter().map(|q| q.max_time_sec()).sum::<u32>()
            );
        }
    }
}
