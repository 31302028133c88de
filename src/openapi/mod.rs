use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    errors::ErrorResponse,
    flash::{FlashLevel, FlashMessage},
    forms::{Choice, KindChoice, NewCookieForm, ShrinkageForm, ShrinkageKind},
    handlers::galletas::{self, CatalogAction, CatalogPage, NewCookieFormView, ShrinkageFormView},
    services::{catalog::CatalogItem, shrinkage::ShrinkageEntry},
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Galletas API",
        description = r#"
Cookie inventory for the bakery: catalog with derived box stock, product
creation across packaging types, and batch shrinkage ("merma") recording.

Form endpoints accept `application/x-www-form-urlencoded` bodies and answer
with `303 See Other` back to the catalog. Outcomes are delivered as flash
messages on the next catalog render.

Paths are listed under the configured mount path (`/galletas` by default).
        "#
    ),
    paths(
        galletas::show_catalog,
        galletas::submit_catalog,
        galletas::add_cookie,
        galletas::record_shrinkage,
        galletas::list_shrinkages,
    ),
    components(schemas(
        CatalogPage,
        CatalogAction,
        CatalogItem,
        NewCookieFormView,
        ShrinkageFormView,
        Choice,
        KindChoice,
        ShrinkageKind,
        NewCookieForm,
        ShrinkageForm,
        ShrinkageEntry,
        FlashMessage,
        FlashLevel,
        ErrorResponse,
    )),
    tags(
        (name = "Galletas", description = "Cookie catalog and shrinkage")
    )
)]
pub struct ApiDoc;

/// Mount the handlers' path annotations are written against.
const DOCUMENTED_MOUNT: &str = "/galletas";

/// The generated document with every cookie route moved under `mount_path`.
pub fn api_doc(mount_path: &str) -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    let mount = mount_path.trim_end_matches('/');
    if mount != DOCUMENTED_MOUNT {
        doc.paths.paths = std::mem::take(&mut doc.paths.paths)
            .into_iter()
            .map(|(path, item)| match path.strip_prefix(DOCUMENTED_MOUNT) {
                Some(rest) => (format!("{mount}{rest}"), item),
                None => (path, item),
            })
            .collect();
    }
    doc
}

pub fn swagger_ui(mount_path: &str) -> SwaggerUi {
    SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api_doc(mount_path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_cookie_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/galletas",
            "/galletas/agregar-galleta",
            "/galletas/merma-galleta",
            "/galletas/mermas",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }

    #[test]
    fn paths_follow_a_custom_mount() {
        let doc = api_doc("/cookies/");
        assert!(doc.paths.paths.contains_key("/cookies"));
        assert!(doc.paths.paths.contains_key("/cookies/mermas"));
        assert!(doc.paths.paths.contains_key("/cookies/merma-galleta"));
        assert!(!doc.paths.paths.keys().any(|p| p.starts_with("/galletas")));
    }

    #[test]
    fn default_mount_keeps_documented_paths() {
        let rebased: Vec<String> = api_doc("/galletas").paths.paths.into_keys().collect();
        let documented: Vec<String> = ApiDoc::openapi().paths.paths.into_keys().collect();
        assert_eq!(rebased, documented);
    }
}
