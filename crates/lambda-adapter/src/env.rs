//! Environment composition and provider-managed parameters.
//!
//! The decorated entry point exposes `context.env`: provider parameters
//! overlaid by the local process environment. Both sources are injected
//! capabilities so tests never have to mutate the real environment.

use crate::error::ParamsError;
use figment::{
    Figment,
    providers::{Format, Toml},
};
use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use tokio::sync::OnceCell;

/// Future returned by [`ParamsProvider::load`].
pub type ParamsFuture<'a> =
    Pin<Box<dyn Future<Output = Result<HashMap<String, String>, ParamsError>> + Send + 'a>>;

/// Source of provider-managed configuration values.
///
/// Implementations may cache internally; the adapter calls [`load`] once per
/// decorated invocation and never for raw invocations.
///
/// [`load`]: ParamsProvider::load
pub trait ParamsProvider: Send + Sync + 'static {
    /// Looks up the current parameters.
    fn load(&self) -> ParamsFuture<'_>;
}

/// Provider that supplies no parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoParams;

impl ParamsProvider for NoParams {
    fn load(&self) -> ParamsFuture<'_> {
        Box::pin(async { Ok(HashMap::new()) })
    }
}

/// Provider backed by a fixed map.
#[derive(Debug, Clone, Default)]
pub struct StaticParams(HashMap<String, String>);

impl StaticParams {
    /// Creates a provider returning `params` on every lookup.
    pub fn new(params: HashMap<String, String>) -> Self {
        Self(params)
    }
}

impl<K, V> FromIterator<(K, V)> for StaticParams
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl ParamsProvider for StaticParams {
    fn load(&self) -> ParamsFuture<'_> {
        let params = self.0.clone();
        Box::pin(async move { Ok(params) })
    }
}

/// Provider backed by a synchronous closure. See [`params_fn`].
#[derive(Clone)]
pub struct FnParams<F> {
    f: F,
}

/// Wraps a zero-argument lookup as a [`ParamsProvider`].
///
/// ```
/// use lambda_adapter::{ParamsError, params_fn};
/// use std::collections::HashMap;
///
/// let provider = params_fn(|| -> Result<HashMap<String, String>, ParamsError> {
///     Ok(HashMap::from([("SOME_SECRET".to_string(), "pssst".to_string())]))
/// });
/// # let _ = provider;
/// ```
pub fn params_fn<F>(f: F) -> FnParams<F>
where
    F: Fn() -> Result<HashMap<String, String>, ParamsError> + Send + Sync + 'static,
{
    FnParams { f }
}

impl<F> ParamsProvider for FnParams<F>
where
    F: Fn() -> Result<HashMap<String, String>, ParamsError> + Send + Sync + 'static,
{
    fn load(&self) -> ParamsFuture<'_> {
        let result = (self.f)();
        Box::pin(async move { result })
    }
}

/// Provider reading a flat TOML file of string values.
///
/// The file is read on the first successful lookup and cached for the
/// lifetime of the provider (one execution environment). A failed read is
/// not cached, so the next invocation retries.
#[derive(Debug)]
pub struct FileParams {
    path: PathBuf,
    cache: OnceCell<HashMap<String, String>>,
}

impl FileParams {
    /// Creates a provider for the given file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: OnceCell::new(),
        }
    }
}

impl ParamsProvider for FileParams {
    fn load(&self) -> ParamsFuture<'_> {
        Box::pin(async move {
            let params = self
                .cache
                .get_or_try_init(|| async {
                    tracing::debug!(path = %self.path.display(), "Loading provider parameters");
                    let params: HashMap<String, String> =
                        Figment::from(Toml::file_exact(&self.path)).extract()?;
                    Ok::<_, ParamsError>(params)
                })
                .await?;
            Ok(params.clone())
        })
    }
}

/// Where the local process environment comes from.
#[derive(Debug, Clone, Default)]
pub enum ProcessEnv {
    /// Snapshot `std::env::vars()` at each invocation.
    #[default]
    Inherit,
    /// Use a fixed map.
    Fixed(HashMap<String, String>),
}

impl ProcessEnv {
    /// Returns the current process environment.
    pub fn snapshot(&self) -> HashMap<String, String> {
        match self {
            ProcessEnv::Inherit => std::env::vars().collect(),
            ProcessEnv::Fixed(vars) => vars.clone(),
        }
    }
}

/// Merges provider parameters with the process environment.
///
/// Process values win on key collisions. Neither input is modified.
pub fn compose_env(
    process_env: &HashMap<String, String>,
    provider_params: &HashMap<String, String>,
) -> HashMap<String, String> {
    let mut env = provider_params.clone();
    env.extend(
        process_env
            .iter()
            .map(|(k, v)| (k.clone(), v.clone())),
    );
    env
}
