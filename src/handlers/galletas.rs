//! Cookie catalog pages and the two mutating forms.
//!
//! Form posts always answer with a 303 back to the catalog. Outcomes travel
//! as flash messages; only infrastructure faults surface as error statuses.

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use sea_orm::TransactionTrait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use utoipa::ToSchema;

use crate::{
    db,
    errors::ServiceError,
    flash::{self, FlashMessage, FlashRedirect},
    forms::{shrinkage_kind_choices, Choice, KindChoice, NewCookieForm, ShrinkageForm},
    services::{
        catalog::{self, CatalogItem},
        cookies,
        shrinkage::{self, ShrinkageEntry, ShrinkageFilter},
    },
    AppState,
};

pub const ACTIVE_PAGE: &str = "galletas";
pub const COOKIE_CREATED: &str = "Cookie created in all of its packaging types";
pub const SHRINKAGE_RECORDED: &str = "Shrinkage recorded successfully.";
pub const NO_BATCH_AVAILABLE: &str = "No batches with stock available for this cookie.";
pub const INVALID_FORM: &str = "Please complete all fields correctly.";
pub const BATCH_CHANGED: &str =
    "The batch changed while recording the shrinkage. Please try again.";
pub const COOKIE_NAME_TAKEN: &str = "A cookie with that name already exists.";

pub fn insufficient_stock_message(requested: i32, available: i32) -> String {
    format!("The requested quantity ({requested}) exceeds the batch stock ({available}).")
}

/// Flash shown when cookie creation fails on a business rule. Infrastructure
/// faults are handed back as errors.
pub fn creation_error_flash(err: ServiceError) -> Result<FlashMessage, ServiceError> {
    match err {
        ServiceError::DuplicateCookie { .. } => Ok(FlashMessage::danger(COOKIE_NAME_TAKEN)),
        ServiceError::NotEligible(_) | ServiceError::ValidationError(_) => {
            Ok(FlashMessage::danger(INVALID_FORM))
        }
        err => Err(err),
    }
}

/// Flash shown when a shrinkage is refused.
pub fn shrinkage_error_flash(err: ServiceError) -> Result<FlashMessage, ServiceError> {
    match err {
        ServiceError::NoAvailableBatch { .. } => Ok(FlashMessage::warning(NO_BATCH_AVAILABLE)),
        ServiceError::InsufficientStock {
            requested,
            available,
        } => Ok(FlashMessage::danger(insufficient_stock_message(
            requested, available,
        ))),
        ServiceError::ConcurrentModification { .. } => Ok(FlashMessage::danger(BATCH_CHANGED)),
        ServiceError::NotEligible(_) | ServiceError::ValidationError(_) => {
            Ok(FlashMessage::danger(INVALID_FORM))
        }
        err => Err(err),
    }
}

pub fn galletas_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(show_catalog).post(submit_catalog))
        .route("/agregar-galleta", post(add_cookie))
        .route("/merma-galleta", post(record_shrinkage))
        .route("/mermas", get(list_shrinkages))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NewCookieFormView {
    pub receta_id: Vec<Choice>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ShrinkageFormView {
    pub galleta_id: Vec<Choice>,
    pub tipo_merma: Vec<KindChoice>,
}

/// Everything the catalog page renders.
#[derive(Debug, Serialize, ToSchema)]
pub struct CatalogPage {
    pub active_page: String,
    pub mostrar_modal: bool,
    pub nueva_form: NewCookieFormView,
    pub merma_form: ShrinkageFormView,
    pub galletas_unidad: Vec<CatalogItem>,
    pub galletas_caja_kilo: Vec<CatalogItem>,
    pub galletas_caja_medio_kilo: Vec<CatalogItem>,
    /// Cookies eligible for shrinkage.
    pub galletas: Vec<Choice>,
    pub flashes: Vec<FlashMessage>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CatalogAction {
    pub abrir_modal_galleta: Option<String>,
}

impl AppState {
    fn back_to_catalog(&self) -> FlashRedirect {
        FlashRedirect::new(
            self.config.mount_path.clone(),
            self.config.flash_cookie_name.clone(),
        )
    }
}

async fn render_catalog(
    state: &AppState,
    headers: &HeaderMap,
    mostrar_modal: bool,
) -> Result<Response, ServiceError> {
    let conn = state.db.as_ref();
    let listing = catalog::load_catalog(conn).await?;
    let eligible = listing.eligible();
    let recipes = catalog::active_recipe_choices(conn).await?;

    let cookie_name = state.config.flash_cookie_name.as_str();
    let flashes = flash::read(headers, cookie_name);
    let consumed = !flashes.is_empty();

    let page = CatalogPage {
        active_page: ACTIVE_PAGE.to_string(),
        mostrar_modal,
        nueva_form: NewCookieFormView {
            receta_id: recipes.as_slice().to_vec(),
        },
        merma_form: ShrinkageFormView {
            galleta_id: eligible.as_slice().to_vec(),
            tipo_merma: shrinkage_kind_choices(),
        },
        galletas_unidad: listing.unit,
        galletas_caja_kilo: listing.kilo_box,
        galletas_caja_medio_kilo: listing.box_700g,
        galletas: eligible.as_slice().to_vec(),
        flashes,
    };

    let mut response = Json(page).into_response();
    if consumed {
        if let Some(value) = flash::clear_cookie(cookie_name) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }
    Ok(response)
}

/// Render the cookie catalog
#[utoipa::path(
    get,
    path = "/galletas",
    tag = "Galletas",
    responses(
        (status = 200, description = "Catalog page", body = CatalogPage),
        (status = 500, description = "Database failure", body = crate::errors::ErrorResponse)
    )
)]
pub async fn show_catalog(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, ServiceError> {
    render_catalog(&state, &headers, false).await
}

/// Render the catalog, opening the creation dialog when asked to
#[utoipa::path(
    post,
    path = "/galletas",
    tag = "Galletas",
    request_body(content = CatalogAction, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Catalog page", body = CatalogPage)
    )
)]
pub async fn submit_catalog(
    State(state): State<AppState>,
    headers: HeaderMap,
    form: Option<Form<CatalogAction>>,
) -> Result<Response, ServiceError> {
    let mostrar_modal = form
        .and_then(|Form(action)| action.abrir_modal_galleta)
        .is_some();
    render_catalog(&state, &headers, mostrar_modal).await
}

/// Create a cookie in every packaging type
#[utoipa::path(
    post,
    path = "/galletas/agregar-galleta",
    tag = "Galletas",
    request_body(content = NewCookieForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Back to the catalog, with a success flash when created")
    )
)]
pub async fn add_cookie(
    State(state): State<AppState>,
    form: Option<Form<NewCookieForm>>,
) -> Result<FlashRedirect, ServiceError> {
    let redirect = state.back_to_catalog();
    let recipes = catalog::active_recipe_choices(state.db.as_ref()).await?;

    let form = form.map(|Form(f)| f).unwrap_or_default();
    let cmd = match form.clean(&recipes) {
        Ok(cmd) => cmd,
        Err(errors) => {
            debug!(%errors, "Ignoring invalid new cookie form");
            return Ok(redirect);
        }
    };

    let txn = state.db.begin().await?;
    let outcome = cookies::create_cookie(&txn, &recipes, cmd).await;
    match db::finish_transaction(txn, outcome).await {
        Ok(rows) => {
            info!(rows = rows.len(), "Cookie added to catalog");
            Ok(redirect.with(FlashMessage::success(COOKIE_CREATED)))
        }
        Err(err) => Ok(redirect.with(creation_error_flash(err)?)),
    }
}

/// Record shrinkage against the cookie's oldest stocked batch
#[utoipa::path(
    post,
    path = "/galletas/merma-galleta",
    tag = "Galletas",
    request_body(content = ShrinkageForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Back to the catalog with a success, warning or danger flash"),
        (status = 500, description = "Database failure", body = crate::errors::ErrorResponse)
    )
)]
pub async fn record_shrinkage(
    State(state): State<AppState>,
    form: Option<Form<ShrinkageForm>>,
) -> Result<FlashRedirect, ServiceError> {
    let redirect = state.back_to_catalog();
    let eligible = catalog::eligible_for_shrinkage(state.db.as_ref()).await?;

    let form = form.map(|Form(f)| f).unwrap_or_default();
    let cmd = match form.clean(&eligible) {
        Ok(cmd) => cmd,
        Err(errors) => {
            debug!(%errors, "Rejecting invalid shrinkage form");
            return Ok(redirect.with(FlashMessage::danger(INVALID_FORM)));
        }
    };

    let txn = state.db.begin().await?;
    let outcome = shrinkage::record_shrinkage(&txn, &eligible, cmd).await;
    let message = match db::finish_transaction(txn, outcome).await {
        Ok(_) => FlashMessage::success(SHRINKAGE_RECORDED),
        Err(err) => shrinkage_error_flash(err)?,
    };

    Ok(redirect.with(message))
}

/// Shrinkage history, newest first
#[utoipa::path(
    get,
    path = "/galletas/mermas",
    tag = "Galletas",
    params(ShrinkageFilter),
    responses(
        (status = 200, description = "Shrinkage records", body = [ShrinkageEntry])
    )
)]
pub async fn list_shrinkages(
    State(state): State<AppState>,
    Query(filter): Query<ShrinkageFilter>,
) -> Result<Json<Vec<ShrinkageEntry>>, ServiceError> {
    let entries = shrinkage::list_shrinkages(state.db.as_ref(), &filter).await?;
    Ok(Json(entries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flash::FlashLevel;
    use sea_orm::DbErr;

    #[test]
    fn empty_batches_warn_instead_of_failing() {
        let flash = shrinkage_error_flash(ServiceError::NoAvailableBatch { cookie_id: 4 }).unwrap();
        assert_eq!(flash, FlashMessage::warning(NO_BATCH_AVAILABLE));
        assert_eq!(flash.level, FlashLevel::Warning);
    }

    #[test]
    fn lost_update_asks_for_a_retry() {
        let flash =
            shrinkage_error_flash(ServiceError::ConcurrentModification { batch_id: 9 }).unwrap();
        assert_eq!(flash, FlashMessage::danger(BATCH_CHANGED));
    }

    #[test]
    fn oversized_quantity_names_both_amounts() {
        let flash = shrinkage_error_flash(ServiceError::InsufficientStock {
            requested: 12,
            available: 10,
        })
        .unwrap();
        assert_eq!(flash.level, FlashLevel::Danger);
        assert_eq!(flash.message, insufficient_stock_message(12, 10));
    }

    #[test]
    fn ineligible_cookie_reads_as_invalid_form() {
        let flash = shrinkage_error_flash(ServiceError::NotEligible("gone".into())).unwrap();
        assert_eq!(flash, FlashMessage::danger(INVALID_FORM));
    }

    #[test]
    fn database_faults_are_not_flashed() {
        let err = ServiceError::DatabaseError(DbErr::Custom("disk I/O error".into()));
        assert!(matches!(
            shrinkage_error_flash(err),
            Err(ServiceError::DatabaseError(_))
        ));
        let err = ServiceError::DatabaseError(DbErr::Custom("disk I/O error".into()));
        assert!(matches!(
            creation_error_flash(err),
            Err(ServiceError::DatabaseError(_))
        ));
    }

    #[test]
    fn duplicate_name_flash_does_not_echo_the_error() {
        let flash = creation_error_flash(ServiceError::DuplicateCookie {
            name: "Chocolate".into(),
        })
        .unwrap();
        assert_eq!(flash, FlashMessage::danger(COOKIE_NAME_TAKEN));
        assert!(!flash.message.contains("Invalid input"));
        assert!(!flash.message.contains("Chocolate"));
    }
}
