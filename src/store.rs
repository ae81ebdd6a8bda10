//! The `habits` and `habit_completions` collections.
//!
//! Every operation is scoped to the owning user: a habit that exists but belongs to
//! someone else is reported exactly like a missing one.

use crate::errors::StoreError;
use crate::models::{Completion, Day, Habit, HabitId, NewHabit, StoreData, UserId};
use std::collections::BTreeSet;

impl StoreData {
    pub fn select_habits(&self, user: &UserId) -> Vec<Habit> {
        let mut habits: Vec<Habit> = self
            .habits
            .iter()
            .filter(|habit| &habit.user_id == user)
            .cloned()
            .collect();
        habits.sort_by_key(|habit| habit.id);
        habits
    }

    pub fn find_habit(&self, user: &UserId, id: HabitId) -> Result<&Habit, StoreError> {
        self.habits
            .iter()
            .find(|habit| habit.id == id && &habit.user_id == user)
            .ok_or(StoreError::NotFound(id))
    }

    pub fn insert_habit(&mut self, user: &UserId, new: NewHabit) -> Habit {
        self.next_habit_id = self
            .next_habit_id
            .max(self.habits.iter().map(|habit| habit.id.0).max().unwrap_or(0));
        self.next_habit_id += 1;

        let habit = Habit {
            id: HabitId(self.next_habit_id),
            user_id: user.clone(),
            title: new.title().to_string(),
        };
        self.habits.push(habit.clone());
        habit
    }

    /// Removes the habit and every completion recorded for it.
    pub fn delete_habit(&mut self, user: &UserId, id: HabitId) -> Result<Habit, StoreError> {
        let index = self
            .habits
            .iter()
            .position(|habit| habit.id == id && &habit.user_id == user)
            .ok_or(StoreError::NotFound(id))?;
        let habit = self.habits.remove(index);
        self.habit_completions
            .retain(|completion| completion.habit_id != id);
        Ok(habit)
    }

    pub fn select_completions(
        &self,
        user: &UserId,
        habit_id: HabitId,
    ) -> Result<BTreeSet<Day>, StoreError> {
        self.find_habit(user, habit_id)?;
        Ok(self
            .habit_completions
            .iter()
            .filter(|completion| completion.habit_id == habit_id && &completion.user_id == user)
            .map(|completion| completion.completed_at)
            .collect())
    }

    pub fn insert_completion(&mut self, completion: Completion) -> Result<(), StoreError> {
        self.find_habit(&completion.user_id, completion.habit_id)?;
        let duplicate = self.habit_completions.iter().any(|existing| {
            existing.habit_id == completion.habit_id
                && existing.completed_at == completion.completed_at
        });
        if duplicate {
            return Err(StoreError::Conflict {
                habit_id: completion.habit_id,
                day: completion.completed_at,
            });
        }
        self.habit_completions.push(completion);
        Ok(())
    }

    /// Delete-by-match. Matching nothing is not an error.
    pub fn delete_completion(&mut self, matching: &Completion) -> usize {
        let before = self.habit_completions.len();
        self.habit_completions.retain(|existing| existing != matching);
        before - self.habit_completions.len()
    }
}
