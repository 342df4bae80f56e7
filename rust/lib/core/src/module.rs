use axum::Router;

/// A clinic department that contributes HTTP routes.
///
/// Each business module (crm, hr, inventory, ...) implements this trait
/// to register its API endpoints. The server collects all modules and
/// nests their routes under `/{name}`.
pub trait Module: Send + Sync {
    /// Module name, used for logging and route prefixes.
    fn name(&self) -> &str;

    /// Return the module's routes, to be nested under `/{name}`.
    ///
    /// Handlers read the caller from the [`crate::Principal`] extension, so
    /// the router must sit behind the server's authentication layer.
    fn routes(&self) -> Router;
}
