// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use std::{
    collections::BTreeMap,
    fmt,
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use axum::{
    Router,
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
    routing::get,
};
use prometheus::{Registry, TEXT_FORMAT, TextEncoder};
use viewstats::ViewRegistry;

use crate::{
    collector::ViewCollector,
    error::{ScrapeError, ScrapeErrors},
    rate_limit::rate_limited,
};

/// What the `/metrics` handler does when a scrape reports errors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorHandling {
    /// Respond with status 500 and the error text as the body.
    #[default]
    HttpError,
    /// Respond with status 200 and everything that exported cleanly. Errors are only logged and
    /// passed to the `on_error` callback.
    ContinueOnError,
}

type OnError = Arc<dyn Fn(&ScrapeErrors) + Send + Sync>;

struct ExporterInner {
    registry: Registry,
    collector: ViewCollector,
    error_handling: ErrorHandling,
    on_error: Option<OnError>,
    // one gather at a time, so each scrape reads its own collect errors
    scrape: Mutex<()>,
}

/// Serves the rows of a [`ViewRegistry`] in the Prometheus text exposition format.
///
/// ```
/// use viewstats::ViewRegistry;
/// use viewstats_prometheus::Exporter;
///
/// let views = ViewRegistry::new();
/// let exporter = Exporter::builder()
///     .namespace("myapp")
///     .const_label("service", "checkout")
///     .views(views)
///     .build()
///     .unwrap();
///
/// // an axum router serving GET /metrics
/// let app: axum::Router = exporter.router();
/// // no views registered, so nothing to report
/// assert_eq!(exporter.render().unwrap(), "");
/// ```
#[derive(Clone)]
pub struct Exporter(Arc<ExporterInner>);

impl fmt::Debug for Exporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Exporter")
            .field("error_handling", &self.0.error_handling)
            .finish_non_exhaustive()
    }
}

impl Exporter {
    /// Start configuring an exporter
    pub fn builder() -> ExporterBuilder {
        ExporterBuilder::default()
    }

    /// The Prometheus registry this exporter gathers from
    pub fn registry(&self) -> &Registry {
        &self.0.registry
    }

    /// Gather the registry and render the text exposition body.
    ///
    /// Scrape errors are reported to the `on_error` callback and returned; [`ScrapeErrors::body`]
    /// still holds everything that exported cleanly.
    pub fn render(&self) -> Result<String, ScrapeErrors> {
        let (families, mut errors) = {
            let _scrape = self.0.scrape.lock().unwrap_or_else(PoisonError::into_inner);
            (self.0.registry.gather(), self.0.collector.take_errors())
        };
        let body = match TextEncoder::new().encode_to_string(&families) {
            Ok(body) => body,
            Err(err) => {
                errors.push(ScrapeError::Encode(err));
                String::new()
            }
        };
        if errors.is_empty() {
            return Ok(body);
        }
        let errors = ScrapeErrors::new(errors, body);
        self.report(&errors);
        Err(errors)
    }

    fn report(&self, errors: &ScrapeErrors) {
        rate_limited!(
            Duration::from_secs(60),
            tracing::error!(%errors, "errors while serving metrics")
        );
        if let Some(on_error) = &self.0.on_error {
            on_error(errors);
        }
    }

    /// A router serving `GET /metrics`
    pub fn router(&self) -> Router {
        Router::new()
            .route("/metrics", get(metrics))
            .with_state(self.clone())
    }

    /// The response the `/metrics` route gives
    pub fn response(&self) -> (StatusCode, [(header::HeaderName, &'static str); 1], String) {
        match self.render() {
            Ok(body) => (StatusCode::OK, [(header::CONTENT_TYPE, TEXT_FORMAT)], body),
            Err(errors) => match self.0.error_handling {
                ErrorHandling::HttpError => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                    format!("An error has occurred while serving metrics:\n\n{errors}"),
                ),
                ErrorHandling::ContinueOnError => (
                    StatusCode::OK,
                    [(header::CONTENT_TYPE, TEXT_FORMAT)],
                    errors.into_body(),
                ),
            },
        }
    }
}

async fn metrics(State(exporter): State<Exporter>) -> impl IntoResponse {
    exporter.response()
}

/// Builder for [`Exporter`].
#[derive(Default)]
pub struct ExporterBuilder {
    namespace: Option<String>,
    const_labels: BTreeMap<String, String>,
    resource_labels: BTreeMap<String, String>,
    registry: Option<Registry>,
    views: Option<ViewRegistry>,
    error_handling: ErrorHandling,
    on_error: Option<OnError>,
}

impl fmt::Debug for ExporterBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExporterBuilder")
            .field("namespace", &self.namespace)
            .field("const_labels", &self.const_labels)
            .field("resource_labels", &self.resource_labels)
            .field("error_handling", &self.error_handling)
            .finish_non_exhaustive()
    }
}

impl ExporterBuilder {
    /// Prefix every metric name with `namespace` and an underscore
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Add a label to every series. Constant labels override tags with the same key.
    pub fn const_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.const_labels.insert(key.into(), value.into());
        self
    }

    /// Add several constant labels, see [`Self::const_label`]
    pub fn const_labels<K: Into<String>, V: Into<String>>(
        mut self,
        labels: impl IntoIterator<Item = (K, V)>,
    ) -> Self {
        self.const_labels
            .extend(labels.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Add a label describing the resource the process runs as. Resource labels override both
    /// tags and constant labels with the same key.
    pub fn resource_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.resource_labels.insert(key.into(), value.into());
        self
    }

    /// Add several resource labels, see [`Self::resource_label`]
    pub fn resource_labels<K: Into<String>, V: Into<String>>(
        mut self,
        labels: impl IntoIterator<Item = (K, V)>,
    ) -> Self {
        self.resource_labels
            .extend(labels.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Register with `registry`, which may hold the application's own metrics, instead of a
    /// private registry
    pub fn registry(mut self, registry: Registry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Export the views of `views` instead of [`viewstats::default_registry`]
    pub fn views(mut self, views: ViewRegistry) -> Self {
        self.views = Some(views);
        self
    }

    /// What the HTTP handler does on gather errors
    pub fn error_handling(mut self, error_handling: ErrorHandling) -> Self {
        self.error_handling = error_handling;
        self
    }

    /// Called with the errors of every failed scrape
    pub fn on_error(mut self, on_error: impl Fn(&ScrapeErrors) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(on_error));
        self
    }

    /// Apply a deserialized [`crate::ExporterConfig`]
    #[cfg(feature = "serde")]
    pub fn config(mut self, config: crate::ExporterConfig) -> Self {
        if let Some(namespace) = config.namespace {
            self.namespace = Some(namespace);
        }
        self.const_labels.extend(config.const_labels);
        self.resource_labels.extend(config.resource_labels);
        self
    }

    /// Build the exporter and register its collector with the registry.
    ///
    /// A registry takes the views of at most one exporter; a second registration fails with
    /// [`prometheus::Error::AlreadyReg`].
    pub fn build(self) -> Result<Exporter, prometheus::Error> {
        let views = self
            .views
            .unwrap_or_else(|| viewstats::default_registry().clone());
        let registry = self.registry.unwrap_or_default();
        let collector = ViewCollector::new(
            views,
            self.namespace,
            &self.const_labels,
            &self.resource_labels,
        );
        registry.register(Box::new(collector.clone()))?;
        Ok(Exporter(Arc::new(ExporterInner {
            registry,
            collector,
            error_handling: self.error_handling,
            on_error: self.on_error,
            scrape: Mutex::new(()),
        })))
    }
}
