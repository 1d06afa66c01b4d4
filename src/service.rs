use std::collections::BTreeMap;
use std::fs;
use std::sync::Arc;
use std::time::{Duration, Instant};

use camino::{Utf8Path, Utf8PathBuf};
use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

use crate::dispatch::{Dispatcher, Reply};
use crate::domain::{
    Credentials, DataContainer, Dataset, Experiment, ProcessedData, RawData, Run, require_non_empty,
    resolve_date,
};
use crate::error::CidError;
use crate::formats::FormatRegistry;
use crate::session::Session;
use crate::transport::{Transport, Verb};
use crate::workspace::Workspace;

pub const GET_DATA_RESOURCE: &str = "get_data.php";
pub const PROJECTS_FIELD: &str = "projects";

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

#[derive(Debug, Clone)]
pub struct ImportRequest {
    pub data_path: Utf8PathBuf,
    pub name: String,
    pub author: String,
    pub format: String,
    pub date: String,
    pub key_value_pairs: BTreeMap<String, String>,
}

impl ImportRequest {
    pub fn new(
        data_path: impl Into<Utf8PathBuf>,
        name: &str,
        author: &str,
        format: &str,
        date: &str,
    ) -> Self {
        Self {
            data_path: data_path.into(),
            name: name.to_string(),
            author: author.to_string(),
            format: format.to_string(),
            date: resolve_date(date),
            key_value_pairs: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DirImport {
    pub dir: Utf8PathBuf,
    pub filter: String,
    pub author: String,
    pub format: String,
    pub date: String,
    // Non-empty: annotate each file with {key: directory name}.
    pub directory_tag_key: String,
}

pub struct CidMetadataService<T: Transport> {
    dispatcher: Dispatcher<T>,
    credentials: Credentials,
    session: Session,
    workspace: Workspace,
    formats: Arc<dyn FormatRegistry>,
}

impl<T: Transport> CidMetadataService<T> {
    pub const SERVICE_NAME: &'static str = "CIDMetadataService";

    pub fn connect(
        transport: T,
        credentials: Credentials,
        workspace: Workspace,
        formats: Arc<dyn FormatRegistry>,
    ) -> Result<Self, CidError> {
        let dispatcher = Dispatcher::new(&credentials.host, transport);
        let session = Session::open(&dispatcher, &credentials)?;
        Ok(Self {
            dispatcher,
            credentials,
            session,
            workspace,
            formats,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn needs_cleaning(&self) -> bool {
        true
    }

    fn send(&self, resource: &str, verb: Verb, params: &[(&str, &str)]) -> Result<Reply, CidError> {
        self.dispatcher
            .send(resource, verb, params, Some(self.session.token()))
    }

    pub fn create_experiment(
        &self,
        name: &str,
        author: &str,
        date: &str,
        keys: &[String],
        destination: &str,
    ) -> Result<Experiment, CidError> {
        require_non_empty("name", name)?;
        require_non_empty("author", author)?;
        debug!(
            name,
            author,
            date = %resolve_date(date),
            keys = keys.len(),
            destination,
            "create experiment requested"
        );
        unsupported("create_experiment")
    }

    pub fn get_workspace_experiments(
        &self,
        _workspace_uri: &str,
    ) -> Result<Vec<Experiment>, CidError> {
        unsupported("get_workspace_experiments")
    }

    pub fn get_experiment(&self, md_uri: &str) -> Result<Experiment, CidError> {
        let params = [
            ("action", "project"),
            ("parameter", "id_project"),
            ("value", md_uri),
            ("username", self.credentials.username.as_str()),
            ("password", self.credentials.password.as_str()),
        ];
        let not_found = || CidError::NotFound {
            entity: "experiment",
            md_uri: md_uri.to_string(),
        };
        let body = match self.send(GET_DATA_RESOURCE, Verb::Get, &params)? {
            Reply::NoContent => return Err(not_found()),
            reply => reply.json()?,
        };

        let project = first_project(&body).ok_or_else(not_found)?;
        let id = required_field(project, "id", md_uri)?;
        let name = required_field(project, "label", md_uri)?;
        let author = required_field(project, "owner", md_uri)?;

        // TODO: fill `datasets` once the CID project-content request is specified.
        Ok(Experiment {
            uuid: id.clone(),
            md_uri: id,
            name,
            author,
            date: text_field(project, "date"),
            keys: Vec::new(),
            datasets: Vec::new(),
        })
    }

    pub fn update_experiment(&self, experiment: &Experiment) -> Result<(), CidError> {
        require_non_empty("md_uri", &experiment.md_uri)?;
        unsupported("update_experiment")
    }

    pub fn import_data(
        &self,
        experiment: &Experiment,
        request: &ImportRequest,
    ) -> Result<RawData, CidError> {
        require_non_empty("experiment", &experiment.md_uri)?;
        require_non_empty("name", &request.name)?;
        require_non_empty("author", &request.author)?;
        let is_file = fs::metadata(request.data_path.as_std_path())
            .map(|meta| meta.is_file())
            .unwrap_or(false);
        if !is_file {
            return Err(CidError::InvalidArgument {
                field: "data_path",
                reason: format!("{} is not an accessible file", request.data_path),
            });
        }
        self.formats.require_extension(&request.format)?;
        unsupported("import_data")
    }

    pub fn import_dir(
        &self,
        experiment: &Experiment,
        options: &DirImport,
        sink: &dyn ProgressSink,
    ) -> Result<Vec<RawData>, CidError> {
        let pattern =
            Regex::new(&options.filter).map_err(|err| CidError::InvalidFilter(err.to_string()))?;
        let files = list_files(&options.dir)?
            .into_iter()
            .filter(|path| path.file_name().is_some_and(|name| pattern.is_match(name)))
            .collect::<Vec<_>>();
        let dir_name = options.dir.file_name().unwrap_or_default().to_string();

        let started = Instant::now();
        let total = files.len();
        let mut imported = Vec::with_capacity(total);
        for (index, path) in files.into_iter().enumerate() {
            sink.event(ProgressEvent {
                message: format!("phase=Import; {}/{} {}", index + 1, total, path),
                elapsed: Some(started.elapsed()),
            });
            let name = path.file_stem().unwrap_or_default().to_string();
            let mut request =
                ImportRequest::new(path, &name, &options.author, &options.format, &options.date);
            if !options.directory_tag_key.is_empty() {
                request
                    .key_value_pairs
                    .insert(options.directory_tag_key.clone(), dir_name.clone());
            }
            imported.push(self.import_data(experiment, &request)?);
        }

        sink.event(ProgressEvent {
            message: format!("phase=Done; imported {total} files"),
            elapsed: Some(started.elapsed()),
        });
        Ok(imported)
    }

    pub fn get_raw_data(&self, _md_uri: &str) -> Result<RawData, CidError> {
        unsupported("get_raw_data")
    }

    pub fn update_raw_data(&self, raw_data: &RawData) -> Result<(), CidError> {
        require_non_empty("md_uri", &raw_data.md_uri)?;
        unsupported("update_raw_data")
    }

    pub fn get_processed_data(&self, _md_uri: &str) -> Result<ProcessedData, CidError> {
        unsupported("get_processed_data")
    }

    pub fn update_processed_data(&self, processed_data: &ProcessedData) -> Result<(), CidError> {
        require_non_empty("md_uri", &processed_data.md_uri)?;
        unsupported("update_processed_data")
    }

    pub fn get_dataset(&self, _md_uri: &str) -> Result<Dataset, CidError> {
        unsupported("get_dataset")
    }

    pub fn update_dataset(&self, dataset: &Dataset) -> Result<(), CidError> {
        require_non_empty("md_uri", &dataset.md_uri)?;
        unsupported("update_dataset")
    }

    pub fn create_dataset(
        &self,
        experiment: &Experiment,
        dataset_name: &str,
    ) -> Result<Dataset, CidError> {
        require_non_empty("experiment", &experiment.md_uri)?;
        require_non_empty("dataset_name", dataset_name)?;
        unsupported("create_dataset")
    }

    pub fn get_dataset_runs(&self, _dataset: &Dataset) -> Result<Vec<Run>, CidError> {
        unsupported("get_dataset_runs")
    }

    /// `run_info.md_uri` is ignored; the service assigns it.
    pub fn create_run(&self, dataset: &Dataset, _run_info: &Run) -> Result<Run, CidError> {
        require_non_empty("dataset", &dataset.md_uri)?;
        unsupported("create_run")
    }

    pub fn get_run(&self, _md_uri: &str) -> Result<Run, CidError> {
        unsupported("get_run")
    }

    pub fn get_data_uri<D: DataContainer>(&self, data: &D) -> Result<Utf8PathBuf, CidError> {
        self.workspace
            .locate(&*self.formats, data.name(), data.format())
    }

    /// Writes the derived workspace path into `processed_data.uri` and hands
    /// the same value back.
    pub fn create_data_uri<'a>(
        &self,
        _dataset: &Dataset,
        _run: &Run,
        processed_data: &'a mut ProcessedData,
    ) -> Result<&'a mut ProcessedData, CidError> {
        let uri = self.get_data_uri(&*processed_data)?;
        processed_data.uri = uri.into_string();
        Ok(processed_data)
    }

    /// `processed_data.md_uri` is ignored; the service assigns it.
    pub fn create_data(
        &self,
        dataset: &Dataset,
        run: &Run,
        _processed_data: &ProcessedData,
    ) -> Result<ProcessedData, CidError> {
        require_non_empty("dataset", &dataset.md_uri)?;
        require_non_empty("run", &run.md_uri)?;
        unsupported("create_data")
    }

    pub fn download_data(&self, _md_uri: &str, _destination: &Utf8Path) -> Result<(), CidError> {
        unsupported("download_data")
    }
}

fn unsupported<R>(operation: &'static str) -> Result<R, CidError> {
    debug!(operation, "operation has no CID wire contract");
    Err(CidError::NotImplemented(operation))
}

// A bare object counts as a single project.
fn first_project(body: &Value) -> Option<&Value> {
    let projects = body.get(PROJECTS_FIELD)?;
    match projects {
        Value::Array(items) => items.first(),
        Value::Object(map) if !map.is_empty() => Some(projects),
        _ => None,
    }
}

fn required_field(project: &Value, key: &str, md_uri: &str) -> Result<String, CidError> {
    let value = text_field(project, key);
    if value.trim().is_empty() {
        return Err(CidError::InvalidResponse(format!(
            "project entry for {md_uri} has no {key}"
        )));
    }
    Ok(value)
}

fn text_field(value: &Value, key: &str) -> String {
    match value.get(key) {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn list_files(dir: &Utf8Path) -> Result<Vec<Utf8PathBuf>, CidError> {
    let entries = fs::read_dir(dir.as_std_path())
        .map_err(|err| CidError::Filesystem(format!("read {dir}: {err}")))?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| CidError::Filesystem(err.to_string()))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        match Utf8PathBuf::from_path_buf(path) {
            Ok(path) => files.push(path),
            Err(path) => warn!(path = %path.display(), "skipping non UTF-8 file name"),
        }
    }
    files.sort();
    Ok(files)
}
