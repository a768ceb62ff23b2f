//! Query execution on the affinity worker.

use crate::config::ServiceConfig;
use crate::error::WorkerError;
use crate::worker::AffinityWorker;
use std::fmt::Display;
use std::sync::Arc;
use tracing::debug;
use wmiquery_core::{
    load_columns, ColumnRow, DecodeMetrics, Loader, QueryError, Record, RowSource, SourceError,
};

/// Something that can execute a WQL query and hand back its result set.
///
/// Implementations live on the worker thread for their whole life.
pub trait Provider {
    fn exec_query(
        &self,
        query: &str,
        namespace: Option<&str>,
    ) -> Result<Box<dyn RowSource + '_>, SourceError>;
}

/// Runs queries against a thread-bound provider and loads the results.
///
/// Records are decoded on the worker thread into a fresh vector and then
/// appended to the caller's destination, so `R` must be `Send`.
#[derive(Debug)]
pub struct QueryService<P: Provider + 'static> {
    worker: AffinityWorker<P>,
    loader: Loader,
    config: ServiceConfig,
}

type Outcome<R> = (Vec<R>, Result<(), QueryError>);

impl<P: Provider + 'static> QueryService<P> {
    pub fn spawn<F, E>(config: ServiceConfig, init: F) -> Result<Self, WorkerError>
    where
        F: FnOnce() -> Result<P, E> + Send + 'static,
        E: Display,
    {
        let worker = AffinityWorker::spawn(config.thread_name.clone(), init)?;
        Ok(Self {
            worker,
            loader: Loader::new().mode(config.mismatch_mode),
            config,
        })
    }

    /// Report decode activity to `metrics`.
    pub fn with_metrics(mut self, metrics: Arc<dyn DecodeMetrics>) -> Self {
        self.loader = self.loader.metrics(metrics);
        self
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Execute `query` and append the decoded records to `dst`.
    ///
    /// Blocks the calling thread. Records decoded before a fatal error, and
    /// every record of a batch with field mismatches, are still appended.
    pub fn query<R: Record + Send>(&self, query: &str, dst: &mut Vec<R>) -> Result<(), QueryError> {
        let (rows, result) = self.worker.run(self.job::<R>(query))?;
        dst.extend(rows);
        result
    }

    /// Async variant of [`query`](Self::query).
    pub async fn query_async<R: Record + Send>(
        &self,
        query: &str,
        dst: &mut Vec<R>,
    ) -> Result<(), QueryError> {
        let (rows, result) = self.worker.run_async(self.job::<R>(query)).await?;
        dst.extend(rows);
        result
    }

    /// Execute `query` and return each row as a map over `columns`.
    ///
    /// Values are returned as the provider reported them. A row without one
    /// of the columns fails the call with [`QueryError::MissingColumn`].
    pub fn query_columns<S: AsRef<str>>(
        &self,
        query: &str,
        columns: &[S],
    ) -> Result<Vec<ColumnRow>, QueryError> {
        self.worker.run(self.columns_job(query, owned(columns)))?
    }

    /// Async variant of [`query_columns`](Self::query_columns).
    pub async fn query_columns_async<S: AsRef<str>>(
        &self,
        query: &str,
        columns: &[S],
    ) -> Result<Vec<ColumnRow>, QueryError> {
        self.worker
            .run_async(self.columns_job(query, owned(columns)))
            .await?
    }

    fn columns_job(
        &self,
        query: &str,
        columns: Vec<String>,
    ) -> impl FnOnce(&P) -> Result<Vec<ColumnRow>, QueryError> + Send + 'static {
        let query = query.to_string();
        let namespace = self.config.namespace.clone();
        move |provider: &P| {
            debug!(%query, namespace = ?namespace, columns = columns.len(), "executing column query");
            let source = provider.exec_query(&query, namespace.as_deref())?;
            load_columns(source.as_ref(), &columns)
        }
    }

    fn job<R: Record + Send>(&self, query: &str) -> impl FnOnce(&P) -> Outcome<R> + Send + 'static {
        let query = query.to_string();
        let namespace = self.config.namespace.clone();
        let loader = self.loader.clone();
        move |provider: &P| {
            debug!(%query, namespace = ?namespace, "executing query");
            let mut rows: Vec<R> = Vec::new();
            let result = match provider.exec_query(&query, namespace.as_deref()) {
                Ok(source) => loader.load::<R>(source.as_ref(), &mut rows),
                Err(e) => Err(e.into()),
            };
            (rows, result)
        }
    }
}

fn owned<S: AsRef<str>>(columns: &[S]) -> Vec<String> {
    columns.iter().map(|c| c.as_ref().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::marker::PhantomData;
    use std::rc::Rc;
    use std::thread::ThreadId;
    use wmiquery_core::{MemoryRow, MemoryRowSource, MismatchMode, Value};

    wmiquery_core::wmi_record! {
        #[derive(Debug, Default, Clone, PartialEq)]
        struct Share as "Win32_Share" {
            name: String = "Name",
            path: String = "Path",
            kind: u32 = "Type",
        }
    }

    /// A provider pinned to the thread that created it.
    struct FakeProvider {
        owner: ThreadId,
        shares: MemoryRowSource,
        _not_send: PhantomData<Rc<()>>,
    }

    impl Provider for FakeProvider {
        fn exec_query(
            &self,
            query: &str,
            namespace: Option<&str>,
        ) -> Result<Box<dyn RowSource + '_>, SourceError> {
            assert_eq!(std::thread::current().id(), self.owner);
            if namespace != Some(r"root\cimv2") {
                return Err(SourceError::Provider("Invalid namespace".into()));
            }
            if !query.contains("FROM Win32_Share") {
                return Err(SourceError::Provider("Invalid class".into()));
            }
            Ok(Box::new(&self.shares))
        }
    }

    fn init() -> Result<FakeProvider, String> {
        let shares = vec![
            MemoryRow::new().with("Name", "ADMIN$").with("Path", r"C:\Windows").with("Type", 2_147_483_648u32),
            MemoryRow::new().with("Name", "C$").with("Path", r"C:\").with("Type", 2_147_483_648u32),
            MemoryRow::new().with("Name", "IPC$").with("Type", 2_147_483_651u32),
        ];
        Ok(FakeProvider {
            owner: std::thread::current().id(),
            shares: shares.into_iter().collect(),
            _not_send: PhantomData,
        })
    }

    fn config() -> ServiceConfig {
        ServiceConfig::default().with_namespace(r"root\cimv2")
    }

    #[test]
    fn query_loads_on_the_worker_and_appends() {
        let service = QueryService::spawn(config(), init).unwrap();
        let mut dst = vec![Share::default()];
        let err = service
            .query(&wmiquery_core::create_query::<Share>(""), &mut dst)
            .unwrap_err();

        // IPC$ has no Path; the batch still completes.
        assert!(err.is_field_mismatch());
        assert_eq!(dst.len(), 4);
        assert_eq!(dst[1].name, "ADMIN$");
        assert_eq!(dst[2].kind, 2_147_483_648);
        assert_eq!(dst[3].path, "");
    }

    #[test]
    fn provider_errors_pass_through() {
        let service = QueryService::spawn(ServiceConfig::default(), init).unwrap();
        let mut dst: Vec<Share> = Vec::new();
        let err = service.query("SELECT Name FROM Win32_Share", &mut dst).unwrap_err();
        assert_eq!(err.to_string(), "Invalid namespace");
        assert!(dst.is_empty());
    }

    #[test]
    fn configured_mode_applies() {
        let mut cfg = config();
        cfg.mismatch_mode = MismatchMode::Throw;
        cfg.thread_name = "share-worker".into();
        let service = QueryService::spawn(cfg, init).unwrap();
        assert_eq!(service.config().thread_name, "share-worker");

        let mut dst: Vec<Share> = Vec::new();
        match service.query("SELECT Name, Path, Type FROM Win32_Share", &mut dst) {
            Err(QueryError::FieldMismatch(m)) => assert_eq!(m.field, "Path"),
            other => panic!("expected FieldMismatch, got {other:?}"),
        }
        assert_eq!(dst.len(), 2);
    }

    #[tokio::test]
    async fn query_async_matches_blocking_result() {
        let service = QueryService::spawn(config(), init).unwrap();
        let mut dst: Vec<Share> = Vec::new();
        let result = service
            .query_async("SELECT Name, Path, Type FROM Win32_Share", &mut dst)
            .await;
        assert!(result.unwrap_err().is_field_mismatch());
        let names: Vec<_> = dst.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["ADMIN$", "C$", "IPC$"]);
    }

    #[test]
    fn column_query_returns_rows_in_order() {
        let service = QueryService::spawn(config(), init).unwrap();
        let rows = service
            .query_columns("SELECT Name, Type FROM Win32_Share", &["Name", "Type"])
            .unwrap();
        let names: Vec<_> = rows.iter().map(|r| r["Name"].clone()).collect();
        assert_eq!(
            names,
            [
                Value::String("ADMIN$".into()),
                Value::String("C$".into()),
                Value::String("IPC$".into()),
            ]
        );
        assert_eq!(rows[2]["Type"], Value::from(2_147_483_651u32));
    }

    #[test]
    fn column_query_missing_property_is_fatal() {
        let service = QueryService::spawn(config(), init).unwrap();
        let err = service
            .query_columns("SELECT Name, Path FROM Win32_Share", &["Name", "Path"])
            .unwrap_err();
        assert!(matches!(
            err,
            QueryError::MissingColumn { row: 2, ref column } if column == "Path"
        ));
    }

    #[tokio::test]
    async fn column_query_async_passes_provider_errors() {
        let service = QueryService::spawn(ServiceConfig::default(), init).unwrap();
        let err = service
            .query_columns_async("SELECT Name FROM Win32_Share", &["Name"])
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid namespace");
    }

    #[test]
    fn dropped_worker_is_reported_as_query_error() {
        let err: QueryError = WorkerError::Gone.into();
        assert_eq!(err.kind(), "worker");
    }
}
