//! Edit screens for celebrity and company records, open to admins and to
//! the verified account linked to the record.

use axum::{extract::State, Form};
use tower_sessions::Session;

use super::admin::{CelebrityFormPage, CompanyFormPage};
use crate::{
    api::AppState,
    db,
    error::AppError,
    models::{CelebrityInput, CompanyInput, VerifiedEntity},
    services::Capability,
    web::{self, flash, render, Id, PageResult},
};

pub async fn edit_celebrity_page(
    State(state): State<AppState>,
    session: Session,
    Id(celebrity_id): Id,
) -> PageResult {
    let entity = VerifiedEntity::Celebrity(celebrity_id);
    web::require(&state, &session, Capability::EditContent(entity)).await?;

    let celebrity = match db::people::get_celebrity(&state.pool, celebrity_id).await {
        Ok(Some(celebrity)) => celebrity,
        Ok(None) => return Err(web::fail(&session, "Celebrity not found.", "/").await),
        Err(e) => {
            tracing::error!(error = %e, celebrity_id, "Failed to load celebrity");
            return Err(web::fail(&session, "Error loading celebrity. Please try again.", "/").await);
        }
    };

    let page = CelebrityFormPage {
        action: format!("/celebrity/{}/edit", celebrity_id),
        cancel: format!("/celebrity/{}", celebrity_id),
        celebrity: Some(celebrity),
    };
    Ok(render(&state, &session, "celebrity_form.html", &page).await)
}

pub async fn edit_celebrity(
    State(state): State<AppState>,
    session: Session,
    Id(celebrity_id): Id,
    Form(form): Form<CelebrityInput>,
) -> PageResult {
    let entity = VerifiedEntity::Celebrity(celebrity_id);
    let viewer = web::require(&state, &session, Capability::EditContent(entity)).await?;

    let form_path = format!("/celebrity/{}/edit", celebrity_id);
    let record = match form.validate() {
        Ok(record) => record,
        Err(AppError::InvalidInput(message)) => return Err(web::fail(&session, message, &form_path).await),
        Err(e) => return Err(web::fail(&session, e.to_string(), &form_path).await),
    };

    match db::people::update_celebrity(&state.pool, celebrity_id, &record).await {
        Ok(true) => {
            tracing::info!(celebrity_id, by = viewer.user_id, "Celebrity edited");
            flash::success(&session, "Celebrity updated successfully!").await;
            Ok(web::redirect(&format!("/celebrity/{}", celebrity_id)))
        }
        Ok(false) => Err(web::fail(&session, "Celebrity not found.", "/").await),
        Err(e) => {
            tracing::error!(error = %e, celebrity_id, "Failed to update celebrity");
            Err(web::fail(&session, "Error updating celebrity. Please try again.", &form_path).await)
        }
    }
}

pub async fn edit_company_page(
    State(state): State<AppState>,
    session: Session,
    Id(company_id): Id,
) -> PageResult {
    let entity = VerifiedEntity::Company(company_id);
    web::require(&state, &session, Capability::EditContent(entity)).await?;

    let company = match db::people::get_company(&state.pool, company_id).await {
        Ok(Some(company)) => company,
        Ok(None) => return Err(web::fail(&session, "Production company not found.", "/").await),
        Err(e) => {
            tracing::error!(error = %e, company_id, "Failed to load production company");
            return Err(web::fail(&session, "Error loading company. Please try again.", "/").await);
        }
    };

    let page = CompanyFormPage {
        action: format!("/company/{}/edit", company_id),
        cancel: format!("/company/{}", company_id),
        company: Some(company),
    };
    Ok(render(&state, &session, "company_form.html", &page).await)
}

pub async fn edit_company(
    State(state): State<AppState>,
    session: Session,
    Id(company_id): Id,
    Form(form): Form<CompanyInput>,
) -> PageResult {
    let entity = VerifiedEntity::Company(company_id);
    let viewer = web::require(&state, &session, Capability::EditContent(entity)).await?;

    let form_path = format!("/company/{}/edit", company_id);
    let record = match form.validate() {
        Ok(record) => record,
        Err(AppError::InvalidInput(message)) => return Err(web::fail(&session, message, &form_path).await),
        Err(e) => return Err(web::fail(&session, e.to_string(), &form_path).await),
    };

    match db::people::update_company(&state.pool, company_id, &record).await {
        Ok(true) => {
            tracing::info!(company_id, by = viewer.user_id, "Production company edited");
            flash::success(&session, "Production company updated successfully!").await;
            Ok(web::redirect(&format!("/company/{}", company_id)))
        }
        Ok(false) => Err(web::fail(&session, "Production company not found.", "/").await),
        Err(e) => {
            tracing::error!(error = %e, company_id, "Failed to update production company");
            Err(web::fail(&session, "Error updating company. Please try again.", &form_path).await)
        }
    }
}
