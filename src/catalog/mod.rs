use axum::Router;

use crate::{crud, state::AppState};

pub mod currency;
pub mod customer;
pub mod hscode;
pub mod material_category;
pub mod origin_area;
pub mod supplier;

use currency::Currency;
use customer::Customer;
use hscode::Hscode;
use material_category::MaterialCategory;
use origin_area::OriginArea;
use supplier::Supplier;

/// Collections that sit behind the session middleware.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(crud::router::<Currency>("/currencies"))
        .merge(crud::router::<Customer>("/customers"))
        .merge(crud::router::<Hscode>("/hscodes"))
        .merge(crud::router::<OriginArea>("/origin-areas"))
        .merge(crud::router::<Supplier>("/suppliers"))
}

/// Material categories are served without authentication, so their
/// mutations carry no audit stamp.
pub fn open_router() -> Router<AppState> {
    crud::router::<MaterialCategory>("/material-categories")
}
