use crate::auth::{CurrentUser, OptionalUser};
use crate::dashboard;
use crate::errors::AppError;
use crate::extract::{ApiJson, ApiPath, OptionalJson};
use crate::models::{
    Day, HabitCardView, HabitForm, HabitId, HabitsResponse, SelectionChange, SelectionResponse,
    ToggleRequest,
};
use crate::state::AppState;
use crate::ui::render_index;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, Redirect},
    Form, Json,
};

pub async fn index(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
) -> Result<Html<String>, AppError> {
    let today = Day::today();
    let page = match user {
        Some(user) => {
            let cards = dashboard::list_habits(&state, &user, today).await?;
            render_index(Some(&user), today, &cards)
        }
        None => render_index(None, today, &[]),
    };
    Ok(Html(page))
}

pub async fn create_form(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Form(form): Form<HabitForm>,
) -> Result<Redirect, AppError> {
    dashboard::create_habit(&state, &user, &form, Day::today()).await?;
    Ok(Redirect::to("/"))
}

pub async fn list_habits(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<HabitsResponse>, AppError> {
    let habits = dashboard::list_habits(&state, &user, Day::today()).await?;
    Ok(Json(HabitsResponse { habits }))
}

pub async fn create_habit(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(form): ApiJson<HabitForm>,
) -> Result<(StatusCode, Json<HabitCardView>), AppError> {
    let card = dashboard::create_habit(&state, &user, &form, Day::today()).await?;
    Ok((StatusCode::CREATED, Json(card)))
}

pub async fn delete_habit(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<HabitId>,
) -> Result<StatusCode, AppError> {
    dashboard::delete_habit(&state, &user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_completions(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<HabitId>,
) -> Result<Json<HabitCardView>, AppError> {
    let card = dashboard::habit_card(&state, &user, id, Day::today()).await?;
    Ok(Json(card))
}

/// An empty body toggles today; a body that does not parse is rejected.
pub async fn toggle(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<HabitId>,
    OptionalJson(request): OptionalJson<ToggleRequest>,
) -> Result<Json<HabitCardView>, AppError> {
    let today = Day::today();
    let day = request.date.unwrap_or(today);
    let card = dashboard::toggle_completion(&state, &user, id, day, today).await?;
    Ok(Json(card))
}

pub async fn selection(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<HabitId>,
    ApiJson(change): ApiJson<SelectionChange>,
) -> Result<Json<SelectionResponse>, AppError> {
    let response = dashboard::apply_selection(&state, &user, id, &change, Day::today()).await?;
    Ok(Json(response))
}
