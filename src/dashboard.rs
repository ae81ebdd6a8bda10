//! The habit list and habit card operations.
//!
//! Reads go through the query cache. Mutations run against the store, are persisted,
//! and are rolled back in memory when persisting fails; on success the cache is
//! refreshed from the store's post-mutation state and that state is returned.

use crate::errors::StoreError;
use crate::models::{
    Completion, Day, Habit, HabitCardView, HabitForm, HabitId, SelectionChange,
    SelectionResponse, StoreData, UserId,
};
use crate::reconcile::{completed_on, reconcile_selection, toggle, Mutation};
use crate::state::{AppState, Caches};
use crate::storage::persist_data;
use std::collections::BTreeSet;
use std::time::Instant;
use tracing::{debug, error, info};

pub fn card_view(habit: &Habit, completions: &BTreeSet<Day>, today: Day) -> HabitCardView {
    HabitCardView {
        id: habit.id,
        title: habit.title.clone(),
        completed_dates: completions.iter().copied().collect(),
        completed_today: completed_on(completions, today),
    }
}

pub async fn list_habits(
    state: &AppState,
    user: &UserId,
    today: Day,
) -> Result<Vec<HabitCardView>, StoreError> {
    let data = state.data.lock().await;
    let mut caches = state.cache.lock().await;
    let now = Instant::now();

    let habits = cached_habits(&data, &mut caches, user, now);
    let mut cards = Vec::with_capacity(habits.len());
    for habit in &habits {
        let completions = cached_completions(&data, &mut caches, habit, now)?;
        cards.push(card_view(habit, &completions, today));
    }
    Ok(cards)
}

pub async fn habit_card(
    state: &AppState,
    user: &UserId,
    id: HabitId,
    today: Day,
) -> Result<HabitCardView, StoreError> {
    let data = state.data.lock().await;
    let mut caches = state.cache.lock().await;
    let now = Instant::now();

    let habit = cached_habits(&data, &mut caches, user, now)
        .into_iter()
        .find(|habit| habit.id == id)
        .ok_or(StoreError::NotFound(id))?;
    let completions = cached_completions(&data, &mut caches, &habit, now)?;
    Ok(card_view(&habit, &completions, today))
}

pub async fn create_habit(
    state: &AppState,
    user: &UserId,
    form: &HabitForm,
    today: Day,
) -> Result<HabitCardView, StoreError> {
    let new = form.validate()?;
    let habit = mutate(
        state,
        |data| Ok(data.insert_habit(user, new)),
        |_, caches| {
            caches.habits.invalidate(user);
        },
    )
    .await?;

    info!(user = %user, habit = %habit.id, "created habit");
    Ok(card_view(&habit, &BTreeSet::new(), today))
}

pub async fn delete_habit(state: &AppState, user: &UserId, id: HabitId) -> Result<(), StoreError> {
    mutate(
        state,
        |data| data.delete_habit(user, id),
        |_, caches| {
            caches.habits.invalidate(user);
            caches.completions.invalidate(&id);
        },
    )
    .await?;

    info!(user = %user, habit = %id, "deleted habit");
    Ok(())
}

/// Flips the completion of `day`: recorded days are removed, others are recorded.
pub async fn toggle_completion(
    state: &AppState,
    user: &UserId,
    id: HabitId,
    day: Day,
    today: Day,
) -> Result<HabitCardView, StoreError> {
    let (habit, confirmed, mutation) = mutate(
        state,
        |data| {
            let habit = data.find_habit(user, id)?.clone();
            let mutation = toggle(&data.select_completions(user, id)?, day);
            apply_mutations(data, &habit, &[mutation])?;
            let confirmed = data.select_completions(user, id)?;
            Ok((habit, confirmed, mutation))
        },
        refresh_completions,
    )
    .await?;

    info!(user = %user, habit = %id, ?mutation, "toggled completion");
    Ok(card_view(&habit, &confirmed, today))
}

pub async fn apply_selection(
    state: &AppState,
    user: &UserId,
    id: HabitId,
    change: &SelectionChange,
    today: Day,
) -> Result<SelectionResponse, StoreError> {
    let (habit, confirmed, plan) = mutate(
        state,
        |data| {
            let habit = data.find_habit(user, id)?.clone();
            let completions = data.select_completions(user, id)?;
            let plan = reconcile_selection(&change.previous, &change.selected, &completions);
            debug!(habit = %id, selection = ?plan.selection, "reconciled selection");
            apply_mutations(data, &habit, &plan.mutations)?;
            let confirmed = data.select_completions(user, id)?;
            Ok((habit, confirmed, plan))
        },
        refresh_completions,
    )
    .await?;

    if !plan.mutations.is_empty() {
        info!(user = %user, habit = %id, mutations = ?plan.mutations, "applied selection change");
    }
    Ok(SelectionResponse {
        card: card_view(&habit, &confirmed, today),
        mutations: plan.mutations,
        selection: plan.selection,
    })
}

fn refresh_completions<M>((habit, confirmed, _): &(Habit, BTreeSet<Day>, M), caches: &mut Caches) {
    caches
        .completions
        .put(habit.id, confirmed.clone(), Instant::now());
}

fn apply_mutations(
    data: &mut StoreData,
    habit: &Habit,
    mutations: &[Mutation],
) -> Result<(), StoreError> {
    for mutation in mutations {
        let completion = Completion {
            habit_id: habit.id,
            user_id: habit.user_id.clone(),
            completed_at: mutation.day(),
        };
        match mutation {
            Mutation::Insert(_) => data.insert_completion(completion)?,
            Mutation::Delete(_) => {
                data.delete_completion(&completion);
            }
        }
    }
    Ok(())
}

fn cached_habits(data: &StoreData, caches: &mut Caches, user: &UserId, now: Instant) -> Vec<Habit> {
    if let Some(habits) = caches.habits.get(user, now) {
        return habits;
    }
    let habits = data.select_habits(user);
    caches.habits.put(user.clone(), habits.clone(), now);
    habits
}

fn cached_completions(
    data: &StoreData,
    caches: &mut Caches,
    habit: &Habit,
    now: Instant,
) -> Result<BTreeSet<Day>, StoreError> {
    if let Some(completions) = caches.completions.get(&habit.id, now) {
        return Ok(completions);
    }
    let completions = data.select_completions(&habit.user_id, habit.id)?;
    caches.completions.put(habit.id, completions.clone(), now);
    Ok(completions)
}

/// Applies `op` to the store and persists it. Any failure restores the store to its
/// state before `op`; `refresh` runs only after a successful write.
async fn mutate<T>(
    state: &AppState,
    op: impl FnOnce(&mut StoreData) -> Result<T, StoreError>,
    refresh: impl FnOnce(&T, &mut Caches),
) -> Result<T, StoreError> {
    let mut data = state.data.lock().await;
    let snapshot = data.clone();

    let value = match op(&mut data) {
        Ok(value) => value,
        Err(err) => {
            *data = snapshot;
            return Err(err);
        }
    };

    if let Err(err) = persist_data(&state.config.data_path, &data).await {
        error!("reverting unsaved mutation: {err}");
        *data = snapshot;
        return Err(err);
    }

    let mut caches = state.cache.lock().await;
    refresh(&value, &mut caches);
    Ok(value)
}
